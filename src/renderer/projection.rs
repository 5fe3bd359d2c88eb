//! Single-point perspective projection
//!
//! A fixed camera sits `CAMERA_Y` above the road and `CAMERA_Z` behind the
//! player. World points map to screen pixels relative to the viewport centre.
//! `scale <= 0` is the "not visible" sentinel; callers skip such points.

use glam::{Vec2, Vec3};

use crate::consts::{CAMERA_Y, CAMERA_Z, FOV, NEAR_PLANE};

/// A projected point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Screen position in pixels (y down)
    pub pos: Vec2,
    /// Pixels per world unit at this depth; 0 when behind the near plane
    pub scale: f32,
}

impl Projected {
    pub const HIDDEN: Projected = Projected {
        pos: Vec2::ZERO,
        scale: 0.0,
    };

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.scale > 0.0
    }
}

/// Project a world point onto a viewport of `viewport` pixels
pub fn project(point: Vec3, viewport: Vec2) -> Projected {
    let rz = point.z - CAMERA_Z;
    // Negated form also rejects NaN depths
    if !(rz > NEAR_PLANE) {
        return Projected::HIDDEN;
    }

    let scale = FOV / rz;
    let center = viewport * 0.5;
    Projected {
        pos: Vec2::new(
            center.x + point.x * scale,
            center.y - (point.y - CAMERA_Y) * scale,
        ),
        scale,
    }
}

/// Projector bound to the current surface size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projector {
    pub viewport: Vec2,
}

impl Projector {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            viewport: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn project(&self, point: Vec3) -> Projected {
        project(point, self.viewport)
    }

    /// Viewport centre in pixels
    pub fn center(&self) -> Vec2 {
        self.viewport * 0.5
    }
}
