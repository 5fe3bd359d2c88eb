//! Rotating wireframe solids for power-up artifacts and the shield cage

use glam::{EulerRot, Quat, Vec3};

use super::projection::Projector;
use super::shapes;
use super::vertex::Vertex;
use crate::sim::PowerUpKind;

/// A unit-sized solid: vertices in [-1, 1]^3 and index pairs
pub struct Solid {
    pub vertices: &'static [[f32; 3]],
    pub edges: &'static [(usize, usize)],
}

pub const CUBE: Solid = Solid {
    vertices: &[
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ],
    edges: &[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (4, 5),
        (5, 6),
        (6, 7),
        (7, 4),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ],
};

pub const OCTAHEDRON: Solid = Solid {
    vertices: &[
        [0.0, -1.0, 0.0],
        [0.0, 1.0, 0.0],
        [-1.0, 0.0, -1.0],
        [1.0, 0.0, -1.0],
        [1.0, 0.0, 1.0],
        [-1.0, 0.0, 1.0],
    ],
    edges: &[
        (0, 2),
        (0, 3),
        (0, 4),
        (0, 5),
        (1, 2),
        (1, 3),
        (1, 4),
        (1, 5),
        (2, 3),
        (3, 4),
        (4, 5),
        (5, 2),
    ],
};

/// Two square pyramids meeting at the origin
pub const HOURGLASS: Solid = Solid {
    vertices: &[
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [-1.0, -1.0, 1.0],
        [0.0, 0.0, 0.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    ],
    edges: &[
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (0, 4),
        (1, 4),
        (2, 4),
        (3, 4),
        (4, 5),
        (4, 6),
        (4, 7),
        (4, 8),
        (5, 6),
        (6, 7),
        (7, 8),
        (8, 5),
    ],
};

const PHI: f32 = 1.618_034;

/// Icosahedron on the golden-rectangle vertices (edge length 2)
pub const ICOSAHEDRON_VERTICES: [[f32; 3]; 12] = [
    [-1.0, PHI, 0.0],
    [1.0, PHI, 0.0],
    [-1.0, -PHI, 0.0],
    [1.0, -PHI, 0.0],
    [0.0, -1.0, PHI],
    [0.0, 1.0, PHI],
    [0.0, -1.0, -PHI],
    [0.0, 1.0, -PHI],
    [PHI, 0.0, -1.0],
    [PHI, 0.0, 1.0],
    [-PHI, 0.0, -1.0],
    [-PHI, 0.0, 1.0],
];

/// Icosahedron edges: every vertex pair at edge length (squared distance 4)
pub fn icosahedron_edges() -> Vec<(usize, usize)> {
    let mut edges = Vec::with_capacity(30);
    for i in 0..ICOSAHEDRON_VERTICES.len() {
        for j in (i + 1)..ICOSAHEDRON_VERTICES.len() {
            let a = Vec3::from_array(ICOSAHEDRON_VERTICES[i]);
            let b = Vec3::from_array(ICOSAHEDRON_VERTICES[j]);
            if a.distance_squared(b) < 5.0 {
                edges.push((i, j));
            }
        }
    }
    edges
}

/// Solid used for each power-up kind
pub fn solid_for(kind: PowerUpKind) -> &'static Solid {
    match kind {
        PowerUpKind::Shield => &CUBE,
        PowerUpKind::SlowMotion => &HOURGLASS,
        PowerUpKind::Multiplier => &OCTAHEDRON,
    }
}

/// Tumble rotation at animation time `t`
pub fn tumble(t: f32) -> Quat {
    Quat::from_euler(EulerRot::XYZ, t, t * 1.5, t * 0.5)
}

/// Project and stroke a set of edges.
///
/// `points` are world positions; edges with an endpoint behind the near
/// plane are skipped.
pub fn stroke_edges(
    projector: &Projector,
    points: &[Vec3],
    edges: &[(usize, usize)],
    width: f32,
    color: [f32; 4],
) -> Vec<Vertex> {
    let projected: Vec<_> = points.iter().map(|p| projector.project(*p)).collect();
    let mut vertices = Vec::with_capacity(edges.len() * 6);
    for &(a, b) in edges {
        let (Some(pa), Some(pb)) = (projected.get(a), projected.get(b)) else {
            continue;
        };
        if !pa.is_visible() || !pb.is_visible() {
            continue;
        }
        vertices.extend(shapes::line(pa.pos, pb.pos, width, color));
    }
    vertices
}

/// World-space vertices of `solid` scaled by `size`, rotated and translated
pub fn transform(vertices: &[[f32; 3]], size: f32, rotation: Quat, center: Vec3) -> Vec<Vec3> {
    vertices
        .iter()
        .map(|v| center + rotation * (Vec3::from_array(*v) * size))
        .collect()
}

/// A tumbling wireframe artifact with a soft centre glow
pub fn artifact(
    projector: &Projector,
    solid: &Solid,
    center: Vec3,
    size: f32,
    t: f32,
    color: [f32; 4],
) -> Vec<Vertex> {
    let core = projector.project(center);
    if !core.is_visible() {
        return Vec::new();
    }

    let points = transform(solid.vertices, size, tumble(t), center);
    let mut vertices = stroke_edges(projector, &points, solid.edges, 3.0, color);

    let glow = [color[0], color[1], color[2], 0.2];
    vertices.extend(shapes::circle(
        core.pos,
        size * core.scale * 0.5,
        glow,
        16,
    ));
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_icosahedron_has_thirty_edges() {
        let edges = icosahedron_edges();
        assert_eq!(edges.len(), 30);
        // Every vertex has five neighbours
        for v in 0..12 {
            let degree = edges.iter().filter(|(a, b)| *a == v || *b == v).count();
            assert_eq!(degree, 5);
        }
    }

    #[test]
    fn test_solid_edges_in_range() {
        for solid in [&CUBE, &OCTAHEDRON, &HOURGLASS] {
            for &(a, b) in solid.edges {
                assert!(a < solid.vertices.len());
                assert!(b < solid.vertices.len());
            }
        }
    }

    #[test]
    fn test_solid_for_each_kind() {
        assert_eq!(solid_for(PowerUpKind::Shield).edges.len(), 12);
        assert_eq!(solid_for(PowerUpKind::SlowMotion).edges.len(), 16);
        assert_eq!(solid_for(PowerUpKind::Multiplier).vertices.len(), 6);
    }

    #[test]
    fn test_artifact_behind_camera_is_empty() {
        let projector = Projector::new(800.0, 600.0);
        let v = artifact(
            &projector,
            &CUBE,
            Vec3::new(0.0, 0.0, -1000.0),
            80.0,
            0.0,
            [1.0; 4],
        );
        assert!(v.is_empty());
    }

    #[test]
    fn test_artifact_visible_ahead() {
        let projector = Projector::new(800.0, 600.0);
        let v = artifact(&projector, &OCTAHEDRON, Vec3::new(0.0, 0.0, 1000.0), 80.0, 1.0, [1.0; 4]);
        // 12 edges of 6 vertices plus a 16-segment glow
        assert_eq!(v.len(), 12 * 6 + 16 * 3);
    }

    #[test]
    fn test_rotation_preserves_size() {
        let points = transform(CUBE.vertices, 10.0, tumble(2.3), Vec3::ZERO);
        for p in points {
            assert!((p.length() - 10.0 * 3f32.sqrt()).abs() < 1e-3);
        }
    }
}
