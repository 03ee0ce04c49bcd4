//! Vertex types and layouts for the streak pass.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

/// Width and height of the unit streak quad. Instances stretch it along x.
pub const STREAK_QUAD_SIZE: (f32, f32) = (1.0, 0.05);

/// Vertex with position and UV coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], tex_coords: [f32; 2]) -> Self {
        Self { position, tex_coords }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                // Position
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // UV/Tex coords (the streak alpha map is sampled with these)
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

/// Two triangles forming the streak quad in the XY plane, centred on the origin.
/// Drawn double-sided.
pub fn streak_quad() -> [Vertex; 6] {
    let hw = STREAK_QUAD_SIZE.0 * 0.5;
    let hh = STREAK_QUAD_SIZE.1 * 0.5;
    let bl = Vertex::new([-hw, -hh, 0.0], [0.0, 1.0]);
    let br = Vertex::new([hw, -hh, 0.0], [1.0, 1.0]);
    let tr = Vertex::new([hw, hh, 0.0], [1.0, 0.0]);
    let tl = Vertex::new([-hw, hh, 0.0], [0.0, 0.0]);
    [bl, br, tr, bl, tr, tl]
}

/// Per-streak instance data.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct StreakInstance {
    /// Model matrix (4x4)
    pub model: [[f32; 4]; 4],
    /// Color tint (linear RGB, alpha 1)
    pub color: [f32; 4],
}

impl StreakInstance {
    /// Instance placed at `position`, stretched to `length` along x.
    pub fn new(position: Vec3, length: f32, color: Vec3) -> Self {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::new(length, 1.0, 1.0),
            Quat::IDENTITY,
            position,
        );
        Self {
            model: model.to_cols_array_2d(),
            color: color.extend(1.0).to_array(),
        }
    }

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StreakInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // Model matrix row 0
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix row 1
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 4,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix row 2
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Model matrix row 3
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // Color
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

impl Default for StreakInstance {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY.to_cols_array_2d(),
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}
