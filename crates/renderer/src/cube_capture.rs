//! wgpu-backed environment capture: renders the scene six times into the
//! layers of a cube texture.
//!
//! The capture owns the textures it hands out. Drawing the scene is left to
//! the host through [`SceneDrawer`], which receives the face's view-projection
//! and the capture parameters (including the objects to skip).

use crate::reflection::{CaptureParams, EnvMapId, EnvironmentCapture, ReflectionError};
use glam::{Mat4, Vec3};
use std::collections::HashMap;
use std::sync::Arc;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Look direction and up vector for each cube face, in +X, -X, +Y, -Y, +Z, -Z order.
const CUBE_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Y),
    (Vec3::NEG_X, Vec3::NEG_Y),
    (Vec3::Y, Vec3::Z),
    (Vec3::NEG_Y, Vec3::NEG_Z),
    (Vec3::Z, Vec3::NEG_Y),
    (Vec3::NEG_Z, Vec3::NEG_Y),
];

/// One face being rendered.
#[derive(Debug, Clone, Copy)]
pub struct CubeFace {
    /// Layer index in the cube texture.
    pub index: u32,
    pub view_proj: Mat4,
}

impl CubeFace {
    /// View-projection for face `index` seen from `origin`.
    pub fn new(index: u32, origin: Vec3, near: f32, far: f32) -> Self {
        let (dir, up) = CUBE_FACES[index as usize % CUBE_FACES.len()];
        let view = Mat4::look_at_rh(origin, origin + dir, up);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, near, far);
        Self {
            index,
            view_proj: proj * view,
        }
    }
}

/// Host hook that records draw calls for one cube face.
pub trait SceneDrawer {
    fn draw(
        &mut self,
        pass: &mut wgpu::RenderPass<'_>,
        face: &CubeFace,
        params: &CaptureParams<'_>,
    ) -> anyhow::Result<()>;
}

struct CubeMap {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

/// Environment capture rendering into wgpu cube textures.
pub struct CubeCapture<D: SceneDrawer> {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    drawer: D,
    resolution: u32,
    format: wgpu::TextureFormat,
    near: f32,
    far: f32,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    maps: HashMap<EnvMapId, CubeMap>,
    next_id: u64,
    disposed: bool,
}

impl<D: SceneDrawer> CubeCapture<D> {
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        drawer: D,
        resolution: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let resolution = resolution.max(1);
        let depth_texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Env Capture Depth"),
            size: wgpu::Extent3d {
                width: resolution,
                height: resolution,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor::default());

        log::debug!("Environment cube capture created at {resolution}px");

        Self {
            device,
            queue,
            drawer,
            resolution,
            format,
            near: 0.1,
            far: 1000.0,
            depth_texture,
            depth_view,
            maps: HashMap::new(),
            next_id: 0,
            disposed: false,
        }
    }

    /// Cube view of a captured map, for binding as a sampled texture.
    pub fn map_view(&self, map: EnvMapId) -> Option<&wgpu::TextureView> {
        self.maps.get(&map).map(|m| &m.view)
    }

    fn create_cube_texture(&self) -> wgpu::Texture {
        self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Env Cube Map"),
            size: wgpu::Extent3d {
                width: self.resolution,
                height: self.resolution,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: self.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        })
    }
}

impl<D: SceneDrawer> EnvironmentCapture for CubeCapture<D> {
    fn capture(&mut self, params: &CaptureParams<'_>) -> Result<EnvMapId, ReflectionError> {
        if self.disposed {
            return Err(ReflectionError::Disposed);
        }

        let texture = self.create_cube_texture();
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Env Capture Encoder"),
        });

        for index in 0..6u32 {
            let face_view = texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some("Env Capture Face"),
                dimension: Some(wgpu::TextureViewDimension::D2),
                base_array_layer: index,
                array_layer_count: Some(1),
                ..Default::default()
            });
            let face = CubeFace::new(index, params.origin, self.near, self.far);

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Env Capture Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &face_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let drawn = self.drawer.draw(&mut pass, &face, params);
            drop(pass);
            if let Err(e) = drawn {
                texture.destroy();
                return Err(ReflectionError::Capture(format!("face {index}: {e:#}")));
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Env Cube View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            array_layer_count: Some(6),
            ..Default::default()
        });

        self.next_id += 1;
        let id = EnvMapId(self.next_id);
        self.maps.insert(id, CubeMap { texture, view });
        Ok(id)
    }

    fn release(&mut self, map: EnvMapId) {
        if let Some(m) = self.maps.remove(&map) {
            m.texture.destroy();
        }
    }

    fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        for (_, m) in self.maps.drain() {
            m.texture.destroy();
        }
        self.depth_texture.destroy();
        self.disposed = true;
        log::debug!("Environment cube capture disposed");
    }
}
