use std::{
    fmt,
    fs,
};

use cgmath::{Point3, Vector3};
use failure::{Error, ResultExt};
use term_painter::{Color, ToStyle};
use stlkit::{
    Mesh,
    io::{Encoding, Reader},
};

use crate::{
    args::{GlobalArgs, InfoArgs},
    commands::{load_file, read_options},
    ui,
};


pub fn run(global_args: &GlobalArgs, args: &InfoArgs) -> Result<(), Error> {
    let filename = &args.file;
    let file_size = fs::metadata(filename)
        .context(format!("failed to open file '{}'", filename))?
        .len();

    if args.encoding_only {
        let reader = Reader::open(filename).context(format!("failed to open '{}'", filename))?;
        print_field("Encoding", Color::BrightWhite.bold().paint(reader.encoding()));
        print_field("File size", ui::fmt_bytes(file_size));
        return Ok(());
    }

    let (encoding, mesh) = load_file(filename, &read_options(global_args))?;

    println!();
    MeshInfo::about_mesh(&mesh).print(encoding, file_size);

    Ok(())
}

fn print_field(name: &str, value: impl fmt::Display) {
    println!("{}: {}", Color::White.dim().paint(format!("{:>18}", name)), value);
}

/// Summary of a decoded mesh.
#[derive(Debug, Clone)]
pub struct MeshInfo {
    header: String,
    triangle_count: usize,
    bounding_box: Option<(Point3<f32>, Point3<f32>)>,
    non_finite_values: usize,
    degenerate_normals: usize,
    with_attributes: usize,
}

impl MeshInfo {
    pub fn about_mesh(mesh: &Mesh) -> Self {
        let mut bounding_box: Option<(Point3<f32>, Point3<f32>)> = None;
        let mut non_finite_values = 0;
        let mut degenerate_normals = 0;
        let mut with_attributes = 0;

        for triangle in mesh.triangles() {
            let normal = Vector3::from(triangle.normal);
            if normal == Vector3::new(0.0, 0.0, 0.0) {
                degenerate_normals += 1;
            }
            non_finite_values += triangle.normal.to_array().iter()
                .filter(|v| !v.is_finite())
                .count();

            for &vertex in &triangle.vertices {
                let p = Point3::from(vertex);
                if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                    non_finite_values += 1;
                    continue;
                }

                bounding_box = Some(match bounding_box {
                    None => (p, p),
                    Some((min, max)) => (
                        Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z)),
                        Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z)),
                    ),
                });
            }

            if triangle.attribute_byte_count != 0 {
                with_attributes += 1;
            }
        }

        Self {
            header: mesh.header().to_string(),
            triangle_count: mesh.triangle_count(),
            bounding_box,
            non_finite_values,
            degenerate_normals,
            with_attributes,
        }
    }

    pub fn print(&self, encoding: Encoding, file_size: u64) {
        let header = if self.header.is_empty() { "-" } else { self.header.as_str() };

        print_field("Encoding", Color::BrightWhite.bold().paint(encoding));
        print_field("File size", ui::fmt_bytes(file_size));
        print_field("Header", Color::BrightWhite.paint(header));
        print_field(
            "Triangles",
            Color::BrightWhite.bold().paint(ui::fmt_with_thousand_sep(self.triangle_count as u64)),
        );

        match self.bounding_box {
            Some((min, max)) => {
                print_field("Bounding box min", format!("{} {} {}", min.x, min.y, min.z));
                print_field("Bounding box max", format!("{} {} {}", max.x, max.y, max.z));
            }
            None => print_field("Bounding box", "-"),
        }

        if self.degenerate_normals > 0 {
            print_field("Zero normals", ui::fmt_with_thousand_sep(self.degenerate_normals as u64));
        }
        if self.with_attributes > 0 {
            print_field(
                "With attributes",
                ui::fmt_with_thousand_sep(self.with_attributes as u64),
            );
        }
        if self.non_finite_values > 0 {
            warn!(
                "The mesh contains {} NaN or infinite values",
                ui::fmt_with_thousand_sep(self.non_finite_values as u64),
            );
        }
    }
}
