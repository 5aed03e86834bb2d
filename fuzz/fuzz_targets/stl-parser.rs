#![no_main]

use libfuzzer_sys::fuzz_target;
use stlkit::io::{self, ReadOptions};

fuzz_target!(|data: &[u8]| {
    // We are only interested in panics, deadlocks or even worse crashes. It's
    // fine if the decoder says "this is not a valid STL file". Small units
    // and several workers make sure the pipeline is exercised even by short
    // inputs.
    let options = ReadOptions::default()
        .with_concurrency(3)
        .with_triangles_per_unit(2);
    let _ = io::read(data, &options);
});
