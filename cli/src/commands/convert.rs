use std::{
    path::Path,
    time::Instant,
};

use failure::{bail, Error, ResultExt};
use stlkit::{
    Mesh,
    io::{Config, Encoding},
};

use crate::{
    args::{GlobalArgs, ConvertArgs},
    commands::{load_file, read_options},
    ui,
};


pub fn run(global_args: &GlobalArgs, args: &ConvertArgs) -> Result<(), Error> {
    let start_time = Instant::now();

    if !args.force && Path::new(&args.target).exists() {
        bail!("'{}' already exists (use '--force' to overwrite it)", args.target);
    }

    let options = read_options(global_args)
        .with_preserved_text_order(args.preserve_order);

    let before_load = Instant::now();
    let (source_encoding, mesh) = load_file(&args.source, &options)
        .context("could not read source file")?;
    let load_time = before_load.elapsed();

    info!(
        "Read {} triangles ({} encoding)",
        ui::fmt_with_thousand_sep(mesh.triangle_count() as u64),
        source_encoding,
    );

    let mesh = prepare(mesh, args);
    if args.target_encoding == Encoding::Ascii && has_attributes(&mesh) {
        warn!("ASCII STL can't store attribute byte counts, they are dropped");
    }

    let before_write = Instant::now();
    progress!(["Writing {} STL to '{}'", args.target_encoding, args.target] => {
        Config::new(args.target_encoding)
            .write_to_file(&mesh, &args.target)
            .context("could not write target file")?
    });
    let write_time = before_write.elapsed();

    info!(
        "Processing time: {:.2?} ({:.2?} loading, {:.2?} writing)",
        start_time.elapsed(),
        load_time,
        write_time,
    );

    Ok(())
}

/// Applies the mesh changing options.
fn prepare(mut mesh: Mesh, args: &ConvertArgs) -> Mesh {
    if args.sort {
        mesh.sort_triangles();
    }

    match &args.header {
        Some(header) => {
            let (_, triangles) = mesh.into_parts();
            Mesh::new(header.clone(), triangles)
        }
        None => mesh,
    }
}

fn has_attributes(mesh: &Mesh) -> bool {
    mesh.triangles().iter().any(|t| t.attribute_byte_count != 0)
}


#[cfg(test)]
mod tests {
    use stlkit::{Coordinate, Triangle, UnitVector};
    use super::*;

    fn args(sort: bool, header: Option<&str>) -> ConvertArgs {
        ConvertArgs {
            target_encoding: Encoding::Binary,
            source: "in.stl".into(),
            target: "out.stl".into(),
            force: false,
            sort,
            preserve_order: false,
            header: header.map(Into::into),
        }
    }

    fn mesh() -> Mesh {
        let tri = |x: f32| Triangle::new(UnitVector::new(0.0, 0.0, 1.0), [
            Coordinate::new(x, 0.0, 0.0),
            Coordinate::new(0.0, 1.0, 0.0),
            Coordinate::new(0.0, 0.0, 1.0),
        ]);
        Mesh::new("orig", vec![tri(3.0), tri(1.0), tri(2.0)])
    }

    #[test]
    fn prepare_sorts_and_renames() {
        let out = prepare(mesh(), &args(true, Some("renamed")));
        assert_eq!(out.header(), "renamed");
        let xs: Vec<_> = out.triangles().iter().map(|t| t.vertices[0].x).collect();
        assert_eq!(xs, [1.0, 2.0, 3.0]);
    }

    #[test]
    fn prepare_keeps_mesh_by_default() {
        assert_eq!(prepare(mesh(), &args(false, None)), mesh());
    }

    #[test]
    fn attributes() {
        let mut m = mesh();
        assert!(!has_attributes(&m));

        let (header, mut triangles) = m.into_parts();
        triangles[1].attribute_byte_count = 7;
        m = Mesh::new(header, triangles);
        assert!(has_attributes(&m));
    }
}
