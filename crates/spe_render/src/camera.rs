use glam::{Mat4, Vec3};
use spe_core::input::MotionIntent;

const WALK_SPEED: f32 = 2.4;
const TURN_SPEED: f32 = 1.6;
const PITCH_SPEED: f32 = 1.0;
const PITCH_LIMIT: f32 = 1.2;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// First-person walkthrough camera. The show advances along -Z, so the
/// gated passage reads `depth()` (the raw z coordinate) for its spatial
/// exit condition.
pub struct WalkCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
    pub viewport: (u32, u32),
}

impl WalkCamera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 6.0),
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 60f32.to_radians(),
            viewport: (viewport_width, viewport_height),
        }
    }

    /// Facing direction derived from yaw/pitch; yaw 0 looks down -Z.
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    /// Horizontal right vector, used for CPU-side billboard expansion.
    pub fn right(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        Vec3::new(cos_yaw, 0.0, sin_yaw)
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or(Vec3::Y)
    }

    /// Depth coordinate along the walk axis.
    pub fn depth(&self) -> f32 {
        self.position.z
    }

    /// Integrate one frame of motion intent.
    pub fn apply_motion(&mut self, intent: MotionIntent, dt: f32) {
        self.yaw += intent.yaw * TURN_SPEED * dt;
        self.pitch = (self.pitch + intent.pitch * PITCH_SPEED * dt)
            .clamp(-PITCH_LIMIT, PITCH_LIMIT);

        // Walking ignores pitch: viewers stroll, they don't fly.
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let walk_dir = Vec3::new(sin_yaw, 0.0, -cos_yaw);
        self.position += walk_dir * intent.forward * WALK_SPEED * dt;
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let aspect = self.viewport.0.max(1) as f32 / self.viewport.1.max(1) as f32;
        let proj = Mat4::perspective_rh(self.fov_y, aspect, 0.05, 200.0);
        let view = Mat4::look_to_rh(self.position, self.forward(), Vec3::Y);
        CameraUniform {
            view_proj: (proj * view).to_cols_array_2d(),
        }
    }
}
