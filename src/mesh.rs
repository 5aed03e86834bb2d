//! The in-memory representation of an STL file.

use std::cmp::Ordering;

use cgmath::{Point3, Vector3};


/// The position of one triangle corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Coordinate {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Coordinate {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self { x, y, z }
    }
}

impl From<Point3<f32>> for Coordinate {
    fn from(p: Point3<f32>) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}

impl From<Coordinate> for Point3<f32> {
    fn from(c: Coordinate) -> Self {
        Point3::new(c.x, c.y, c.z)
    }
}

/// The face normal of a triangle.
///
/// Despite the name, this is stored exactly as found in the file: it is
/// neither validated nor renormalized.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitVector {
    pub i: f32,
    pub j: f32,
    pub k: f32,
}

impl UnitVector {
    pub fn new(i: f32, j: f32, k: f32) -> Self {
        Self { i, j, k }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.i, self.j, self.k]
    }
}

impl From<[f32; 3]> for UnitVector {
    fn from([i, j, k]: [f32; 3]) -> Self {
        Self { i, j, k }
    }
}

impl From<Vector3<f32>> for UnitVector {
    fn from(v: Vector3<f32>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<UnitVector> for Vector3<f32> {
    fn from(n: UnitVector) -> Self {
        Vector3::new(n.i, n.j, n.k)
    }
}

/// One triangle (or "facet") of an STL file.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Triangle {
    /// Face normal.
    pub normal: UnitVector,

    /// The three corners in the order they are stored in the file.
    pub vertices: [Coordinate; 3],

    /// No one understands what this does. It's only stored in binary format
    /// and is usually zero. Some programs abuse it to store a 16bit color.
    /// We just pass it through.
    ///
    /// ASCII files can't store it, so this is always 0 for triangles read
    /// from an ASCII file and it is dropped when writing one.
    pub attribute_byte_count: u16,
}

impl Triangle {
    pub fn new(normal: UnitVector, vertices: [Coordinate; 3]) -> Self {
        Self {
            normal,
            vertices,
            attribute_byte_count: 0,
        }
    }

    /// Compares two triangles by content: vertex positions first, then the
    /// normal, then the attribute byte count. Floats are compared with IEEE
    /// total ordering, so this is a total order even with NaNs around.
    pub fn content_cmp(&self, other: &Self) -> Ordering {
        self.sort_key().iter()
            .zip(&other.sort_key())
            .map(|(a, b)| a.total_cmp(b))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
            .then(self.attribute_byte_count.cmp(&other.attribute_byte_count))
    }

    fn sort_key(&self) -> [f32; 12] {
        let [a, b, c] = self.vertices;
        let n = self.normal;
        [a.x, a.y, a.z, b.x, b.y, b.z, c.x, c.y, c.z, n.i, n.j, n.k]
    }
}

/// A decoded STL file: the header (or solid name) and all triangles.
///
/// The number of triangles is always `triangles().len()`. Binary files store
/// it explicitly, ASCII files don't; either way it is derived from the
/// triangle list here so the two can't disagree.
///
/// Triangle order: binary files are decoded in file order. ASCII files are
/// decoded in parallel and the triangles end up in the order the workers
/// finish, which is **not** the file order (unless
/// [`ReadOptions::preserve_text_order`][crate::io::ReadOptions] is set). Use
/// [`Mesh::sort_triangles`] if you need something deterministic.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    header: String,
    triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new(header: impl Into<String>, triangles: Vec<Triangle>) -> Self {
        Self {
            header: header.into(),
            triangles,
        }
    }

    /// The free-form header (binary) or solid name (ASCII), without
    /// surrounding whitespace.
    ///
    /// Header bytes that are not valid UTF-8 are replaced with U+FFFD when
    /// reading, so such binary headers are not written back byte for byte.
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Sorts all triangles by [`Triangle::content_cmp`].
    pub fn sort_triangles(&mut self) {
        self.triangles.sort_by(Triangle::content_cmp);
    }

    pub fn into_parts(self) -> (String, Vec<Triangle>) {
        (self.header, self.triangles)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn tri(x: f32, n: f32) -> Triangle {
        Triangle::new(
            UnitVector::new(0.0, 0.0, n),
            [
                Coordinate::new(x, 0.0, 0.0),
                Coordinate::new(1.0, 0.0, 0.0),
                Coordinate::new(0.0, 1.0, 0.0),
            ],
        )
    }

    #[test]
    fn sort_by_vertices_then_normal() {
        let mut mesh = Mesh::new("m", vec![tri(2.0, 1.0), tri(-1.0, 1.0), tri(2.0, -1.0)]);
        mesh.sort_triangles();

        assert_eq!(mesh.triangles(), &[tri(-1.0, 1.0), tri(2.0, -1.0), tri(2.0, 1.0)]);
        assert_eq!(mesh.triangle_count(), 3);
    }

    #[test]
    fn content_cmp_is_total_with_nan() {
        let a = tri(f32::NAN, 1.0);
        let b = tri(1.0, 1.0);
        assert_eq!(a.content_cmp(&a), Ordering::Equal);
        assert_ne!(a.content_cmp(&b), Ordering::Equal);
    }

    #[test]
    fn cgmath_conversions() {
        let p: Point3<f32> = Coordinate::new(1.0, 2.0, 3.0).into();
        assert_eq!(p, Point3::new(1.0, 2.0, 3.0));
        assert_eq!(Coordinate::from(p), Coordinate::new(1.0, 2.0, 3.0));

        let v: Vector3<f32> = UnitVector::new(0.0, 1.0, 0.0).into();
        assert_eq!(UnitVector::from(v), UnitVector::new(0.0, 1.0, 0.0));
    }
}
