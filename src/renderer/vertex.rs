//! Vertex types for 2D rendering

use bytemuck::{Pod, Zeroable};

/// 2D vertex in screen pixels with an RGBA color
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(x: f32, y: f32, color: [f32; 4]) -> Self {
        Self {
            position: [x, y],
            color,
        }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Return `color` with its alpha multiplied by `alpha`
#[inline]
pub fn with_alpha(color: [f32; 4], alpha: f32) -> [f32; 4] {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// Colors for game elements
pub mod colors {
    pub const BACKGROUND: [f32; 4] = [0.008, 0.008, 0.02, 1.0];
    pub const LANE_MARKER: [f32; 4] = [0.0, 0.95, 1.0, 1.0];
    pub const OBSTACLE: [f32; 4] = [1.0, 0.0, 0.33, 1.0];
    pub const OBSTACLE_FILL: [f32; 4] = [1.0, 0.0, 0.2, 0.2];
    pub const COIN: [f32; 4] = [1.0, 0.84, 0.0, 1.0];
    pub const COIN_RIM: [f32; 4] = [0.72, 0.53, 0.04, 1.0];
    pub const CAR_BODY: [f32; 4] = [0.0, 0.95, 1.0, 1.0];
    pub const CAR_COCKPIT: [f32; 4] = [0.0, 0.0, 0.0, 1.0];
    pub const CAR_LIGHTS: [f32; 4] = [1.0, 0.0, 0.0, 1.0];
    pub const TRAIL: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const SHIELD: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const SUN_TOP: [f32; 4] = [1.0, 0.87, 0.0, 1.0];
    pub const SUN_MID: [f32; 4] = [1.0, 0.33, 0.0, 1.0];
    pub const SUN_BOTTOM: [f32; 4] = [0.6, 0.0, 1.0, 1.0];
    pub const BUILDING_FILL: [f32; 4] = [0.04, 0.0, 0.08, 0.8];
    pub const BUILDING_EDGE: [f32; 4] = [0.0, 1.0, 1.0, 1.0];
    pub const BUILDING_GRID: [f32; 4] = [1.0, 0.0, 1.0, 1.0];
    pub const DAMAGE_OVERLAY: [f32; 4] = [1.0, 0.0, 0.1, 0.25];
    pub const SHIELD_OVERLAY: [f32; 4] = [0.0, 1.0, 0.3, 0.2];
}
