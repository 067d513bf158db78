use crate::video::assets::prelude::*;

#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "Backend: {}", _0)]
    Backend(String),
    #[fail(display = "The device doesn't support {}.", _0)]
    Requirement(String),
    #[fail(display = "{} is invalid.", _0)]
    SurfaceHandleInvalid(SurfaceHandle),
    #[fail(display = "{} is invalid.", _0)]
    TextureHandleInvalid(TextureHandle),
    #[fail(display = "{} is invalid.", _0)]
    RenderTextureHandleInvalid(RenderTextureHandle),
    #[fail(display = "{} is invalid.", _0)]
    ImageHandleInvalid(ImageHandle),
    #[fail(display = "{} is invalid.", _0)]
    CounterHandleInvalid(CounterHandle),
    #[fail(display = "{} is invalid.", _0)]
    ShaderHandleInvalid(ShaderHandle),
    #[fail(display = "{} is invalid.", _0)]
    MeshHandleInvalid(MeshHandle),
    #[fail(display = "Surface is incomplete: {}.", _0)]
    SurfaceIncomplete(String),
    #[fail(display = "{} is sampled while being attached to the bound surface.", _0)]
    FeedbackLoop(RenderTextureHandle),
    #[fail(display = "{} is read before a memory barrier made its writes visible.", _0)]
    MissingBarrier(ImageHandle),
    #[fail(display = "Undefined uniform {}.", _0)]
    UniformUndefined(String),
    #[fail(display = "Uniform {}.", _0)]
    UniformMismatch(String),
    #[fail(display = "Failed to create shader, errors: \n{}.", _0)]
    ShaderCreationFailure(String),
    #[fail(display = "Out of bounds.")]
    OutOfBounds,
}

pub type Result<T> = ::std::result::Result<T, Error>;
