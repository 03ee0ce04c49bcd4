//! Camera rig easing between a cruise framing and a boost framing.

use bytemuck::{Pod, Zeroable};
use engine_core::lerp;
use glam::{Mat4, Vec3};

/// Below this distance the rig snaps onto the target position.
const SNAP_DISTANCE: f32 = 1e-4;
/// Below this FOV difference (degrees) the rig snaps onto the target FOV.
const SNAP_FOV: f32 = 1e-3;

/// Where the camera sits, what it looks at, and how wide it sees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
}

impl CameraPose {
    pub const CRUISE: CameraPose = CameraPose {
        position: Vec3::new(0.0, 0.0, 5.0),
        look_at: Vec3::ZERO,
        fov_degrees: 75.0,
    };

    pub const BOOST: CameraPose = CameraPose {
        position: Vec3::new(2.0, 1.0, 8.0),
        look_at: Vec3::new(-4.0, 0.0, 0.0),
        fov_degrees: 100.0,
    };
}

/// Tuning for [`CameraRig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRigSettings {
    pub cruise: CameraPose,
    pub boost: CameraPose,
    /// Position blend per frame.
    pub position_ease: f32,
    /// FOV blend per frame. Kept well below `position_ease`; fast FOV swings read as a lurch.
    pub fov_ease: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraRigSettings {
    fn default() -> Self {
        Self {
            cruise: CameraPose::CRUISE,
            boost: CameraPose::BOOST,
            position_ease: 0.05,
            fov_ease: 0.02,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Camera that follows the turbo scalar. Position and FOV ease toward the
/// active framing; the look-at point switches immediately.
#[derive(Debug, Clone)]
pub struct CameraRig {
    settings: CameraRigSettings,
    pose: CameraPose,
    /// Aspect ratio (width / height).
    aspect: f32,
}

impl CameraRig {
    pub fn new(settings: CameraRigSettings) -> Self {
        Self {
            pose: settings.cruise,
            settings,
            aspect: 16.0 / 9.0,
        }
    }

    /// Update aspect ratio (call on viewport resize).
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Framing the rig is heading for at this turbo level.
    pub fn target_pose(&self, turbo: f32) -> &CameraPose {
        if turbo > 0.0 {
            &self.settings.boost
        } else {
            &self.settings.cruise
        }
    }

    /// Advance one frame.
    pub fn update(&mut self, turbo: f32) -> CameraPose {
        let target = *self.target_pose(turbo);

        let position = self.pose.position.lerp(target.position, self.settings.position_ease);
        self.pose.position = if position.distance(target.position) < SNAP_DISTANCE {
            target.position
        } else {
            position
        };

        let fov = lerp(self.pose.fov_degrees, target.fov_degrees, self.settings.fov_ease);
        self.pose.fov_degrees = if (fov - target.fov_degrees).abs() < SNAP_FOV {
            target.fov_degrees
        } else {
            fov
        };

        self.pose.look_at = target.look_at;
        self.pose
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// Get the view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.pose.position, self.pose.look_at, Vec3::Y)
    }

    /// Get the projection matrix.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.pose.fov_degrees.to_radians(),
            self.aspect,
            self.settings.near,
            self.settings.far,
        )
    }

    /// Get the combined view-projection matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

/// Camera uniform data for GPU.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub position: [f32; 4], // w unused, padding
}

impl CameraUniform {
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            view: Mat4::IDENTITY.to_cols_array_2d(),
            proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 4],
        }
    }

    pub fn update(&mut self, rig: &CameraRig) {
        self.view = rig.view_matrix().to_cols_array_2d();
        self.proj = rig.projection_matrix().to_cols_array_2d();
        self.view_proj = rig.view_projection_matrix().to_cols_array_2d();
        let pos = rig.pose().position;
        self.position = [pos.x, pos.y, pos.z, 1.0];
    }
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}
