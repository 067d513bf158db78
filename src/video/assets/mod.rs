pub mod image;
pub mod mesh;
pub mod shader;
pub mod surface;
pub mod texture;

pub mod prelude {
    pub use super::image::{CounterHandle, ImageFormat, ImageHandle, ImageParams, ImageValue};
    pub use super::mesh::{MeshHandle, MeshParams, MeshPrimitive, Vertex};
    pub use super::shader::{
        Blend, BlendFactor, BlendValue, Comparison, CullFace, Equation, FrontFaceOrder, Program,
        RenderState, ShaderHandle, ShaderParams, UniformVar, UniformVariable,
        UniformVariableType, VertexStage,
    };
    pub use super::surface::{BlitMask, Rect, SurfaceHandle, SurfaceParams, Target};
    pub use super::texture::{
        RenderTextureFormat, RenderTextureHandle, RenderTextureParams, TextureFilter,
        TextureFormat, TextureHandle, TextureParams, TextureWrap,
    };
}
