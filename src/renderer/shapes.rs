//! Shape generation for 2D primitives
//!
//! Everything is tessellated into triangle lists in screen pixels.

use glam::Vec2;
use std::f32::consts::TAU;

use super::vertex::Vertex;
use crate::lerp_color;

/// Two triangles covering the quad a-b-c-d (in winding order)
pub fn quad(a: Vec2, b: Vec2, c: Vec2, d: Vec2, color: [f32; 4]) -> Vec<Vertex> {
    vec![
        Vertex::new(a.x, a.y, color),
        Vertex::new(b.x, b.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(a.x, a.y, color),
        Vertex::new(c.x, c.y, color),
        Vertex::new(d.x, d.y, color),
    ]
}

/// Axis-aligned filled rectangle from its top-left corner
pub fn rect(x: f32, y: f32, w: f32, h: f32, color: [f32; 4]) -> Vec<Vertex> {
    quad(
        Vec2::new(x, y),
        Vec2::new(x + w, y),
        Vec2::new(x + w, y + h),
        Vec2::new(x, y + h),
        color,
    )
}

/// Filled rectangle rotated by `angle` radians around `pivot`
pub fn rotated_rect(
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    pivot: Vec2,
    angle: f32,
    color: [f32; 4],
) -> Vec<Vertex> {
    let rot = Vec2::from_angle(angle);
    let corner = |p: Vec2| pivot + rot.rotate(p - pivot);
    quad(
        corner(Vec2::new(x, y)),
        corner(Vec2::new(x + w, y)),
        corner(Vec2::new(x + w, y + h)),
        corner(Vec2::new(x, y + h)),
        color,
    )
}

/// Thick line segment with square ends
pub fn line(p1: Vec2, p2: Vec2, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    gradient_line(p1, p2, width, color, color)
}

/// Thick line segment whose color fades from `c1` at `p1` to `c2` at `p2`
pub fn gradient_line(p1: Vec2, p2: Vec2, width: f32, c1: [f32; 4], c2: [f32; 4]) -> Vec<Vertex> {
    let dir = (p2 - p1).normalize_or_zero();
    if dir == Vec2::ZERO {
        return Vec::new();
    }
    let perp = dir.perp() * (width * 0.5);

    let v1a = p1 + perp;
    let v1b = p1 - perp;
    let v2a = p2 + perp;
    let v2b = p2 - perp;

    vec![
        Vertex::new(v1a.x, v1a.y, c1),
        Vertex::new(v1b.x, v1b.y, c1),
        Vertex::new(v2a.x, v2a.y, c2),
        Vertex::new(v2a.x, v2a.y, c2),
        Vertex::new(v1b.x, v1b.y, c1),
        Vertex::new(v2b.x, v2b.y, c2),
    ]
}

/// Rectangle outline
pub fn rect_outline(x: f32, y: f32, w: f32, h: f32, width: f32, color: [f32; 4]) -> Vec<Vertex> {
    let tl = Vec2::new(x, y);
    let tr = Vec2::new(x + w, y);
    let br = Vec2::new(x + w, y + h);
    let bl = Vec2::new(x, y + h);
    let mut vertices = Vec::with_capacity(24);
    vertices.extend(line(tl, tr, width, color));
    vertices.extend(line(tr, br, width, color));
    vertices.extend(line(br, bl, width, color));
    vertices.extend(line(bl, tl, width, color));
    vertices
}

/// Generate vertices for a filled ellipse
pub fn ellipse(center: Vec2, rx: f32, ry: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + rx * theta1.cos(),
            center.y + ry * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + rx * theta2.cos(),
            center.y + ry * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    ellipse(center, radius, radius, color, segments)
}

/// Generate vertices for an elliptical ring of the given stroke width
pub fn ellipse_outline(
    center: Vec2,
    rx: f32,
    ry: f32,
    width: f32,
    color: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    let half = width * 0.5;
    let mut vertices = Vec::with_capacity((segments * 6) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        let point = |theta: f32, grow: f32| {
            Vec2::new(
                center.x + (rx + grow).max(0.0) * theta.cos(),
                center.y + (ry + grow).max(0.0) * theta.sin(),
            )
        };
        let inner1 = point(theta1, -half);
        let outer1 = point(theta1, half);
        let inner2 = point(theta2, -half);
        let outer2 = point(theta2, half);

        // Two triangles per segment
        vertices.push(Vertex::new(inner1.x, inner1.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(inner2.x, inner2.y, color));

        vertices.push(Vertex::new(inner2.x, inner2.y, color));
        vertices.push(Vertex::new(outer1.x, outer1.y, color));
        vertices.push(Vertex::new(outer2.x, outer2.y, color));
    }

    vertices
}

/// Filled disc shaded top-to-bottom through three colors
pub fn gradient_disc(
    center: Vec2,
    radius: f32,
    top: [f32; 4],
    mid: [f32; 4],
    bottom: [f32; 4],
    segments: u32,
) -> Vec<Vertex> {
    // t = 0 at the top edge, 1 at the bottom edge
    let shade = |y: f32| {
        let t = ((y - (center.y - radius)) / (2.0 * radius)).clamp(0.0, 1.0);
        if t < 0.5 {
            lerp_color(top, mid, t * 2.0)
        } else {
            lerp_color(mid, bottom, (t - 0.5) * 2.0)
        }
    };

    let mut vertices = Vec::with_capacity((segments * 3) as usize);
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;
        let e1 = center + Vec2::from_angle(theta1) * radius;
        let e2 = center + Vec2::from_angle(theta2) * radius;

        vertices.push(Vertex::new(center.x, center.y, shade(center.y)));
        vertices.push(Vertex::new(e1.x, e1.y, shade(e1.y)));
        vertices.push(Vertex::new(e2.x, e2.y, shade(e2.y)));
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_covers_corners() {
        let v = rect(10.0, 20.0, 30.0, 40.0, [1.0; 4]);
        assert_eq!(v.len(), 6);
        let xs: Vec<f32> = v.iter().map(|v| v.position[0]).collect();
        let ys: Vec<f32> = v.iter().map(|v| v.position[1]).collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), 10.0);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 40.0);
        assert_eq!(ys.iter().cloned().fold(f32::MAX, f32::min), 20.0);
        assert_eq!(ys.iter().cloned().fold(f32::MIN, f32::max), 60.0);
    }

    #[test]
    fn test_degenerate_line_is_empty() {
        let p = Vec2::new(5.0, 5.0);
        assert!(line(p, p, 4.0, [1.0; 4]).is_empty());
    }

    #[test]
    fn test_line_width() {
        let v = line(Vec2::ZERO, Vec2::new(10.0, 0.0), 4.0, [1.0; 4]);
        assert_eq!(v.len(), 6);
        assert!(v.iter().all(|v| v.position[1].abs() == 2.0));
    }

    #[test]
    fn test_gradient_disc_shading() {
        let v = gradient_disc(Vec2::ZERO, 10.0, [1.0, 0.0, 0.0, 1.0], [0.0, 1.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0], 16);
        // Centre vertex carries the mid color
        assert_eq!(v[0].color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(v.len(), 48);
    }

    #[test]
    fn test_rotated_rect_zero_angle_matches_rect() {
        let a = rect(0.0, 0.0, 4.0, 2.0, [1.0; 4]);
        let b = rotated_rect(0.0, 0.0, 4.0, 2.0, Vec2::new(2.0, 1.0), 0.0, [1.0; 4]);
        for (a, b) in a.iter().zip(&b) {
            assert!((a.position[0] - b.position[0]).abs() < 1e-5);
            assert!((a.position[1] - b.position[1]).abs() < 1e-5);
        }
    }
}
