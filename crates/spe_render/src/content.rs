//! Scene-owned draw lists and the controller's render collaborator.
//!
//! Scenes describe their visuals as an ordered list of textured, tinted
//! primitives rebuilt in place every frame; the backend expands them into
//! a CPU mesh and batches draws by texture. The controller only ever sees
//! the `StageRenderer` trait — what a frame *is* stays opaque to it.

use glam::{Vec2, Vec3};

use crate::camera::WalkCamera;

/// How a primitive's quad is oriented in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// Camera-facing quad expanded along the camera's right/up basis.
    Billboard,
    /// World-locked quad in the XY plane, facing the walk axis (door
    /// slabs, portal frames).
    WallQuad,
}

#[derive(Debug, Clone, Copy)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub center: Vec3,
    /// Full width/height in world units.
    pub size: Vec2,
    pub color: [f32; 4],
    pub texture: &'static str,
}

impl Primitive {
    pub fn billboard(center: Vec3, size: Vec2, color: [f32; 4], texture: &'static str) -> Self {
        Self {
            kind: PrimitiveKind::Billboard,
            center,
            size,
            color,
            texture,
        }
    }

    pub fn wall(center: Vec3, size: Vec2, color: [f32; 4], texture: &'static str) -> Self {
        Self {
            kind: PrimitiveKind::WallQuad,
            center,
            size,
            color,
            texture,
        }
    }
}

/// Ordered primitive list, authored back-to-front. Cleared and refilled
/// each frame; capacity is retained so steady-state frames do not
/// allocate.
#[derive(Debug, Default)]
pub struct RenderContent {
    primitives: Vec<Primitive>,
}

impl RenderContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            primitives: Vec::with_capacity(capacity),
        }
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    pub fn push(&mut self, primitive: Primitive) {
        self.primitives.push(primitive);
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Render collaborator: given a scene's content and a viewpoint, stage a
/// frame. Synchronous and fire-and-forget from the caller's perspective.
pub trait StageRenderer {
    fn render(&mut self, content: &RenderContent, camera: &WalkCamera);
}
