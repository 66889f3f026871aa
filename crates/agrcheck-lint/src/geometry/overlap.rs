//! Intersection tests between world-space triangle sets.

use super::math::{cross, dot, length, sub, world_points, Aabb, Vec3};
use agrcheck_scene::MeshObject;
use rayon::prelude::*;

/// Projections closer than this are treated as merely touching.
const TOUCH_EPSILON: f64 = 1e-9;

type Triangle = [Vec3; 3];

/// A mesh object's faces fan-triangulated in world space.
#[derive(Debug, Clone)]
pub struct WorldMesh {
    triangles: Vec<Triangle>,
    bounds: Option<Aabb>,
}

impl WorldMesh {
    pub fn from_object(object: &MeshObject) -> Self {
        let points = world_points(&object.transform, &object.mesh.vertices);
        let triangles = object
            .mesh
            .faces
            .iter()
            .flat_map(|face| {
                let corners: Vec<Vec3> = face
                    .iter()
                    .filter_map(|&i| points.get(i as usize).copied())
                    .collect();
                (1..corners.len().saturating_sub(1))
                    .map(|k| [corners[0], corners[k], corners[k + 1]])
                    .collect::<Vec<_>>()
            })
            .collect();
        Self {
            triangles,
            bounds: Aabb::from_points(&points),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

fn project(tri: &Triangle, axis: Vec3) -> (f64, f64) {
    let a = dot(tri[0], axis);
    let b = dot(tri[1], axis);
    let c = dot(tri[2], axis);
    (a.min(b).min(c), a.max(b).max(c))
}

/// Separating axis test for two triangles. Triangles that only touch do
/// not intersect.
pub fn triangles_intersect(t1: &Triangle, t2: &Triangle) -> bool {
    let e1 = [sub(t1[1], t1[0]), sub(t1[2], t1[1]), sub(t1[0], t1[2])];
    let e2 = [sub(t2[1], t2[0]), sub(t2[2], t2[1]), sub(t2[0], t2[2])];
    let n1 = cross(e1[0], e1[1]);
    let n2 = cross(e2[0], e2[1]);

    let mut axes: Vec<Vec3> = Vec::with_capacity(17);
    axes.push(n1);
    axes.push(n2);
    for a in &e1 {
        for b in &e2 {
            axes.push(cross(*a, *b));
        }
    }
    // In-plane edge normals separate coplanar pairs.
    for e in &e1 {
        axes.push(cross(n1, *e));
    }
    for e in &e2 {
        axes.push(cross(n2, *e));
    }

    for axis in axes {
        let len = length(axis);
        if len < 1e-12 {
            continue;
        }
        let unit = [axis[0] / len, axis[1] / len, axis[2] / len];
        let (min1, max1) = project(t1, unit);
        let (min2, max2) = project(t2, unit);
        if max1 <= min2 + TOUCH_EPSILON || max2 <= min1 + TOUCH_EPSILON {
            return false;
        }
    }
    true
}

/// True when any triangle of `a` intersects any triangle of `b`.
pub fn pairwise_overlap(a: &WorldMesh, b: &WorldMesh) -> bool {
    let (Some(ba), Some(bb)) = (a.bounds, b.bounds) else {
        return false;
    };
    if !ba.intersects(&bb, TOUCH_EPSILON) {
        return false;
    }
    let boxes_b: Vec<Aabb> = b
        .triangles
        .iter()
        .filter_map(|t| Aabb::from_points(t))
        .collect();
    a.triangles.iter().any(|ta| {
        let Some(box_a) = Aabb::from_points(ta) else {
            return false;
        };
        if !box_a.intersects(&bb, TOUCH_EPSILON) {
            return false;
        }
        b.triangles
            .iter()
            .zip(&boxes_b)
            .any(|(tb, box_b)| box_a.intersects(box_b, TOUCH_EPSILON) && triangles_intersect(ta, tb))
    })
}

/// Index pairs `(i, j)`, `i < j`, of overlapping meshes in ascending order.
pub fn overlapping_pairs(meshes: &[WorldMesh]) -> Vec<(usize, usize)> {
    let n = meshes.len();
    (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..n)
                .filter(move |&j| pairwise_overlap(&meshes[i], &meshes[j]))
                .map(move |j| (i, j))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrcheck_scene::{MeshData, Transform};

    fn cube_at(name: &str, location: [f64; 3]) -> MeshObject {
        let mesh = MeshData {
            vertices: vec![
                [-1.0, -1.0, -1.0],
                [1.0, -1.0, -1.0],
                [1.0, 1.0, -1.0],
                [-1.0, 1.0, -1.0],
                [-1.0, -1.0, 1.0],
                [1.0, -1.0, 1.0],
                [1.0, 1.0, 1.0],
                [-1.0, 1.0, 1.0],
            ],
            faces: vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![1, 2, 6, 5],
                vec![2, 3, 7, 6],
                vec![3, 0, 4, 7],
            ],
            loose_edges: Vec::new(),
        };
        MeshObject::new_mesh(name, mesh).with_transform(Transform::at(location))
    }

    #[test]
    fn test_triangle_pair() {
        let a = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let crossing = [[0.5, 0.5, -1.0], [0.5, 0.5, 1.0], [0.6, 0.4, 0.0]];
        let apart = [[5.0, 5.0, -1.0], [5.0, 5.0, 1.0], [5.1, 5.1, 0.0]];
        assert!(triangles_intersect(&a, &crossing));
        assert!(!triangles_intersect(&a, &apart));
    }

    #[test]
    fn test_overlapping_cubes() {
        let a = WorldMesh::from_object(&cube_at("UCX_001", [0.0; 3]));
        let b = WorldMesh::from_object(&cube_at("UCX_002", [1.5, 0.5, 0.5]));
        let c = WorldMesh::from_object(&cube_at("UCX_003", [10.0, 0.0, 0.0]));
        assert_eq!(a.triangle_count(), 12);
        assert!(pairwise_overlap(&a, &b));
        assert!(!pairwise_overlap(&a, &c));
        assert_eq!(overlapping_pairs(&[a, b, c]), vec![(0, 1)]);
    }

    #[test]
    fn test_touching_cubes_do_not_overlap() {
        let a = WorldMesh::from_object(&cube_at("UCX_001", [0.0; 3]));
        let b = WorldMesh::from_object(&cube_at("UCX_002", [2.0, 0.0, 0.0]));
        assert!(!pairwise_overlap(&a, &b));
    }
}
