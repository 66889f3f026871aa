//! Closedness, convexity and duplicate vertex detection.

use super::math::{cross, dot, length, sub, Aabb, Vec3};
use agrcheck_scene::MeshData;
use std::collections::HashMap;

/// Fraction of the largest bounding box side a vertex may sit off a face
/// plane without counting as being on either side.
pub const CONVEX_TOLERANCE_FACTOR: f64 = 0.1;

/// A mesh is closed iff `V - E + F == 2`.
pub fn euler_closed(mesh: &MeshData) -> bool {
    euler_characteristic(mesh) == 2
}

pub fn euler_characteristic(mesh: &MeshData) -> i64 {
    mesh.vertex_count() as i64 - mesh.edge_count() as i64 + mesh.face_count() as i64
}

/// Tests convexity against every face plane.
///
/// `points` are the vertex positions to use (usually scaled object
/// coordinates); `faces` index into them. Faces with fewer than three
/// resolvable corners or a zero-length normal are skipped.
pub fn is_convex(points: &[Vec3], faces: &[Vec<u32>], tolerance_factor: f64) -> bool {
    let Some(bounds) = Aabb::from_points(points) else {
        return true;
    };
    let size = bounds.size();
    let tolerance = size[0].max(size[1]).max(size[2]) * tolerance_factor;

    for face in faces {
        let corners: Vec<Vec3> = face
            .iter()
            .filter_map(|&i| points.get(i as usize).copied())
            .collect();
        if corners.len() < 3 {
            continue;
        }
        let normal = cross(sub(corners[1], corners[0]), sub(corners[2], corners[0]));
        let norm = length(normal);
        if norm == 0.0 {
            continue;
        }

        let mut side = 0.0_f64;
        for (index, point) in points.iter().enumerate() {
            if face.contains(&(index as u32)) {
                continue;
            }
            let distance = dot(normal, sub(*point, corners[0])) / norm;
            if distance.abs() < tolerance {
                continue;
            }
            if side == 0.0 {
                side = distance.signum();
            } else if distance.signum() != side {
                return false;
            }
        }
    }
    true
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Returns true when the two sets were distinct.
    fn union(&mut self, a: usize, b: usize) -> bool {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra == rb {
            return false;
        }
        self.parent[ra.max(rb)] = ra.min(rb);
        true
    }
}

/// Number of vertices that would collapse when merging every vertex
/// within `distance` of another.
pub fn duplicate_vertex_count(points: &[Vec3], distance: f64) -> usize {
    if points.len() < 2 {
        return 0;
    }
    let cell_size = if distance > 0.0 { distance } else { f64::EPSILON };
    let cell = |p: &Vec3| -> (i64, i64, i64) {
        (
            (p[0] / cell_size).floor() as i64,
            (p[1] / cell_size).floor() as i64,
            (p[2] / cell_size).floor() as i64,
        )
    };

    let mut grid: HashMap<(i64, i64, i64), Vec<usize>> = HashMap::new();
    for (i, p) in points.iter().enumerate() {
        grid.entry(cell(p)).or_default().push(i);
    }

    let limit = distance * distance;
    let mut sets = DisjointSet::new(points.len());
    let mut merged = 0;
    for (i, p) in points.iter().enumerate() {
        let (cx, cy, cz) = cell(p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(bucket) = grid.get(&(cx + dx, cy + dy, cz + dz)) else {
                        continue;
                    };
                    for &j in bucket {
                        if j <= i {
                            continue;
                        }
                        let d = sub(points[j], *p);
                        if dot(d, d) <= limit && sets.union(i, j) {
                            merged += 1;
                        }
                    }
                }
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube() -> MeshData {
        MeshData {
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
        }
    }

    #[test]
    fn test_cube_is_closed() {
        let mesh = cube();
        assert_eq!(mesh.edge_count(), 12);
        assert!(euler_closed(&mesh));
    }

    #[test]
    fn test_open_box_is_not_closed() {
        let mut mesh = cube();
        mesh.faces.pop();
        assert_eq!(euler_characteristic(&mesh), 1);
        assert!(!euler_closed(&mesh));
    }

    fn triangulated(mesh: &MeshData) -> Vec<Vec<u32>> {
        mesh.faces
            .iter()
            .flat_map(|f| (1..f.len() - 1).map(move |k| vec![f[0], f[k], f[k + 1]]))
            .collect()
    }

    #[test]
    fn test_cube_is_convex() {
        let mesh = cube();
        assert!(is_convex(&mesh.vertices, &mesh.faces, CONVEX_TOLERANCE_FACTOR));
        assert!(is_convex(&mesh.vertices, &triangulated(&mesh), CONVEX_TOLERANCE_FACTOR));
    }

    #[test]
    fn test_dented_cube_is_not_convex() {
        let mut mesh = cube();
        // Push a top corner well below the top plane, towards the centre.
        mesh.vertices[6] = [0.2, 0.2, -0.2];
        let faces = triangulated(&mesh);
        assert!(!is_convex(&mesh.vertices, &faces, CONVEX_TOLERANCE_FACTOR));
    }

    #[test]
    fn test_small_dent_within_tolerance() {
        let mut mesh = cube();
        mesh.vertices[6] = [1.0, 1.0, 0.9];
        let faces = triangulated(&mesh);
        assert!(is_convex(&mesh.vertices, &faces, CONVEX_TOLERANCE_FACTOR));
    }

    #[test]
    fn test_degenerate_face_skipped() {
        let mut mesh = cube();
        mesh.faces.push(vec![0, 0, 0]);
        assert!(is_convex(&mesh.vertices, &mesh.faces, CONVEX_TOLERANCE_FACTOR));
    }

    #[test]
    fn test_duplicates() {
        assert!(duplicate_vertex_count(&[[0.0; 3], [0.0; 3]], 0.0015) >= 1);
        assert_eq!(duplicate_vertex_count(&[[0.0; 3], [1.0, 0.0, 0.0]], 0.0015), 0);
        let cluster = [[0.0; 3], [0.001, 0.0, 0.0], [0.0, 0.001, 0.0], [5.0; 3]];
        assert_eq!(duplicate_vertex_count(&cluster, 0.0015), 2);
    }
}
