//! Reading and writing STL files, fast.
//!
//! STL comes in two flavors: a binary one with fixed size records and an
//! ASCII one that stores every float as text. Both are supported for reading
//! and writing. Decoding spreads the per-triangle work over a pool of worker
//! threads; encoding is sequential.
//!
//! ```no_run
//! use stlkit::io::{self, ReadOptions, Config};
//!
//! # fn main() -> Result<(), stlkit::io::Error> {
//! let mesh = io::read_file("teapot.stl", &ReadOptions::default().with_concurrency(4))?;
//! println!("{}: {} triangles", mesh.header(), mesh.triangle_count());
//!
//! Config::ascii().write_to_file(&mesh, "teapot_ascii.stl")?;
//! # Ok(())
//! # }
//! ```

pub mod io;
mod mesh;

pub use self::{
    mesh::{Coordinate, Mesh, Triangle, UnitVector},
};
