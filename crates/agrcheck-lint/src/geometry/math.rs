//! Small vector helpers and object-to-world transforms.

use agrcheck_scene::{MeshObject, Transform};

pub type Vec3 = [f64; 3];

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn length_squared(a: Vec3) -> f64 {
    dot(a, a)
}

pub fn length(a: Vec3) -> f64 {
    length_squared(a).sqrt()
}

pub fn scale(a: Vec3, s: Vec3) -> Vec3 {
    [a[0] * s[0], a[1] * s[1], a[2] * s[2]]
}

/// Angle between two vectors in radians; zero for degenerate input.
pub fn angle(a: Vec3, b: Vec3) -> f64 {
    let denom = length(a) * length(b);
    if denom == 0.0 {
        return 0.0;
    }
    (dot(a, b) / denom).clamp(-1.0, 1.0).acos()
}

/// Rotation matrix of an XYZ Euler triple (applied X first, then Y, then Z).
pub fn rotation_matrix(euler: Vec3) -> [Vec3; 3] {
    let (sx, cx) = euler[0].sin_cos();
    let (sy, cy) = euler[1].sin_cos();
    let (sz, cz) = euler[2].sin_cos();
    [
        [cy * cz, sx * sy * cz - cx * sz, cx * sy * cz + sx * sz],
        [cy * sz, sx * sy * sz + cx * cz, cx * sy * sz - sx * cz],
        [-sy, sx * cy, cx * cy],
    ]
}

fn mul(m: &[Vec3; 3], v: Vec3) -> Vec3 {
    [dot(m[0], v), dot(m[1], v), dot(m[2], v)]
}

/// Maps object-space points to world space: scale, rotate, translate.
pub fn world_points(transform: &Transform, points: &[Vec3]) -> Vec<Vec3> {
    let m = rotation_matrix(transform.rotation);
    points
        .iter()
        .map(|p| add(mul(&m, scale(*p, transform.scale)), transform.location))
        .collect()
}

/// Object vertices with scale applied but no rotation or translation.
pub fn scaled_points(object: &MeshObject) -> Vec<Vec3> {
    object
        .mesh
        .vertices
        .iter()
        .map(|p| scale(*p, object.transform.scale))
        .collect()
}

/// Newell normal of a polygon; its length is twice the polygon area.
pub fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut n = [0.0; 3];
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        n[0] += (a[1] - b[1]) * (a[2] + b[2]);
        n[1] += (a[2] - b[2]) * (a[0] + b[0]);
        n[2] += (a[0] - b[0]) * (a[1] + b[1]);
    }
    n
}

pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f64 {
    length(cross(sub(b, a), sub(c, a))) * 0.5
}

/// Absolute polygon area in UV space (shoelace).
pub fn uv_area(points: &[[f64; 2]]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a[0] * b[1] - b[0] * a[1];
    }
    (sum * 0.5).abs()
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let mut b = Aabb {
            min: first,
            max: first,
        };
        for p in &points[1..] {
            for k in 0..3 {
                b.min[k] = b.min[k].min(p[k]);
                b.max[k] = b.max[k].max(p[k]);
            }
        }
        Some(b)
    }

    pub fn intersects(&self, other: &Aabb, eps: f64) -> bool {
        (0..3).all(|k| self.min[k] <= other.max[k] + eps && other.min[k] <= self.max[k] + eps)
    }

    pub fn center(&self) -> Vec3 {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }

    pub fn size(&self) -> Vec3 {
        sub(self.max, self.min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: Vec3, b: Vec3) -> bool {
        (0..3).all(|k| (a[k] - b[k]).abs() < 1e-9)
    }

    #[test]
    fn test_rotation_about_z() {
        let t = Transform {
            rotation: [0.0, 0.0, FRAC_PI_2],
            ..Transform::default()
        };
        let p = world_points(&t, &[[1.0, 0.0, 0.0]]);
        assert!(close(p[0], [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_world_points_order() {
        let t = Transform {
            location: [10.0, 0.0, 0.0],
            rotation: [FRAC_PI_2, 0.0, 0.0],
            scale: [1.0, 2.0, 1.0],
        };
        // scale y, then rotate about x moves +y to +z, then translate.
        let p = world_points(&t, &[[0.0, 1.0, 0.0]]);
        assert!(close(p[0], [10.0, 0.0, 2.0]));
    }

    #[test]
    fn test_areas() {
        let quad = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 3.0, 0.0], [0.0, 3.0, 0.0]];
        assert!((length(newell_normal(&quad)) * 0.5 - 6.0).abs() < 1e-12);
        assert!((uv_area(&[[0.0, 0.0], [0.5, 0.0], [0.5, 0.5], [0.0, 0.5]]) - 0.25).abs() < 1e-12);
        assert!((triangle_area(quad[0], quad[1], quad[2]) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_aabb() {
        let a = Aabb::from_points(&[[0.0; 3], [1.0; 3]]).unwrap();
        let b = Aabb::from_points(&[[2.0; 3], [3.0; 3]]).unwrap();
        assert!(!a.intersects(&b, 0.0));
        assert!(a.intersects(&a, 0.0));
        assert_eq!(a.center(), [0.5; 3]);
        assert!(Aabb::from_points(&[]).is_none());
    }
}
