//! Defines `Args` which is used to parse command line arguments.

use structopt::StructOpt;
use stlkit::io::Encoding;


#[derive(StructOpt, Debug)]
#[structopt(setting = structopt::clap::AppSettings::VersionlessSubcommands)]
pub struct Args {
    #[structopt(flatten)]
    pub global: GlobalArgs,

    #[structopt(subcommand)]
    pub command: Command,
}

#[derive(StructOpt, Debug)]
pub struct GlobalArgs {
    /// Number of threads used to decode triangles. Defaults to the number of
    /// available CPU cores.
    #[structopt(short = "j", long = "concurrency", global = true)]
    pub concurrency: Option<usize>,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Print information about an STL file.
    #[structopt(name = "info")]
    Info {
        #[structopt(flatten)]
        args: InfoArgs,
    },

    /// Converts an STL file from one encoding into the other one.
    #[structopt(name = "convert")]
    Convert {
        #[structopt(flatten)]
        args: ConvertArgs,
    },
}

#[derive(StructOpt, Debug)]
pub struct ConvertArgs {
    /// Specify the target file encoding. Valid values: 'binary' and 'ascii'.
    #[structopt(
        short = "e",
        long = "target-encoding",
        default_value = "binary",
        parse(try_from_str = parse_encoding),
    )]
    pub target_encoding: Encoding,

    /// Path to the source STL file.
    pub source: String,

    /// Path to the target STL file. Files are not overwritten by default.
    pub target: String,

    /// Overwrite the target file if it already exists.
    #[structopt(short = "f", long = "force")]
    pub force: bool,

    /// Sort the triangles by their coordinates before writing. Makes the
    /// output deterministic, no matter in which order the triangles were
    /// decoded.
    #[structopt(long = "sort", conflicts_with = "preserve-order")]
    pub sort: bool,

    /// Keep the triangles of an ASCII source file in file order. Binary
    /// files are always read in file order.
    #[structopt(long = "preserve-order")]
    pub preserve_order: bool,

    /// Replace the header (binary) or solid name (ASCII) of the mesh.
    #[structopt(long = "header")]
    pub header: Option<String>,
}

#[derive(StructOpt, Debug)]
pub struct InfoArgs {
    /// Path to the STL file.
    pub file: String,

    /// If specified, only the encoding is detected and the rest of the file
    /// is not read.
    #[structopt(long = "encoding-only")]
    pub encoding_only: bool,
}

fn parse_encoding(src: &str) -> Result<Encoding, String> {
    match src {
        "ascii" => Ok(Encoding::Ascii),
        "binary" => Ok(Encoding::Binary),
        other => Err(format!("'{}' is not a valid STL encoding (use 'ascii' or 'binary')", other)),
    }
}
