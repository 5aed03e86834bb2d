use failure::{Error, ResultExt};
use stlkit::{
    Mesh,
    io::{Encoding, ReadOptions, Reader},
};

use crate::args::GlobalArgs;


pub mod convert;
pub mod info;


/// Read options from the global command line arguments.
fn read_options(global_args: &GlobalArgs) -> ReadOptions {
    let options = ReadOptions::default();
    match global_args.concurrency {
        Some(concurrency) => options.with_concurrency(concurrency),
        None => options,
    }
}

/// Opens and reads the file at `path`, printing progress.
fn load_file(path: &str, options: &ReadOptions) -> Result<(Encoding, Mesh), Error> {
    let reader = Reader::open(path).context(format!("failed to open '{}'", path))?;
    let encoding = reader.encoding();
    info!("Source encoding: {}", encoding);

    let mesh = progress!(["Reading '{}' with {} threads", path, options.concurrency] => {
        reader.read(options).context(format!("failed to read '{}'", path))?
    });

    Ok((encoding, mesh))
}
