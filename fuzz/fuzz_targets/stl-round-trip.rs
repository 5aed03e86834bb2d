#![no_main]

use libfuzzer_sys::fuzz_target;
use stlkit::io::{self, Config, ReadOptions};

fuzz_target!(|data: &[u8]| {
    // Everything that decodes has to survive being written and read again in
    // both encodings.
    let options = ReadOptions::default().with_preserved_text_order(true);
    let mesh = match io::read(data, &options) {
        Ok(mesh) => mesh,
        Err(_) => return,
    };

    let binary = Config::binary().write_to_memory(&mesh).unwrap();
    if !mesh.header().starts_with("solid ") {
        let again = io::read(&binary[..], &options).unwrap();
        assert_eq!(again.triangle_count(), mesh.triangle_count());
    }

    // A line break in the header would end the `solid` line early.
    if !mesh.header().contains('\n') {
        let ascii = Config::ascii().write_to_memory(&mesh).unwrap();
        let again = io::read(&ascii[..], &options).unwrap();
        assert_eq!(again.triangle_count(), mesh.triangle_count());
    }
});
