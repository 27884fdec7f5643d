pub mod camera;
pub mod content;
pub mod gpu_context;
pub mod pipeline;
pub mod texture;
pub mod vertex;

pub use camera::{CameraUniform, WalkCamera};
pub use content::{Primitive, PrimitiveKind, RenderContent, StageRenderer};
pub use gpu_context::GpuContext;
pub use pipeline::PrimitivePipeline;
pub use texture::Texture;
pub use vertex::PrimitiveVertex;
