use gl;
use gl::types::*;

use super::super::super::assets::prelude::*;

impl From<Comparison> for GLenum {
    fn from(cmp: Comparison) -> Self {
        match cmp {
            Comparison::Never => gl::NEVER,
            Comparison::Less => gl::LESS,
            Comparison::LessOrEqual => gl::LEQUAL,
            Comparison::Greater => gl::GREATER,
            Comparison::GreaterOrEqual => gl::GEQUAL,
            Comparison::Equal => gl::EQUAL,
            Comparison::NotEqual => gl::NOTEQUAL,
            Comparison::Always => gl::ALWAYS,
        }
    }
}

impl From<Equation> for GLenum {
    fn from(eq: Equation) -> Self {
        match eq {
            Equation::Add => gl::FUNC_ADD,
            Equation::Subtract => gl::FUNC_SUBTRACT,
            Equation::ReverseSubtract => gl::FUNC_REVERSE_SUBTRACT,
        }
    }
}

impl From<BlendFactor> for GLenum {
    fn from(factor: BlendFactor) -> Self {
        match factor {
            BlendFactor::Zero => gl::ZERO,
            BlendFactor::One => gl::ONE,
            BlendFactor::Value(BlendValue::SourceColor) => gl::SRC_COLOR,
            BlendFactor::Value(BlendValue::SourceAlpha) => gl::SRC_ALPHA,
            BlendFactor::Value(BlendValue::DestinationColor) => gl::DST_COLOR,
            BlendFactor::Value(BlendValue::DestinationAlpha) => gl::DST_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::SourceColor) => gl::ONE_MINUS_SRC_COLOR,
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha) => gl::ONE_MINUS_SRC_ALPHA,
            BlendFactor::OneMinusValue(BlendValue::DestinationColor) => gl::ONE_MINUS_DST_COLOR,
            BlendFactor::OneMinusValue(BlendValue::DestinationAlpha) => gl::ONE_MINUS_DST_ALPHA,
        }
    }
}

impl From<MeshPrimitive> for GLenum {
    fn from(primitive: MeshPrimitive) -> Self {
        match primitive {
            MeshPrimitive::Triangles => gl::TRIANGLES,
            MeshPrimitive::TriangleStrip => gl::TRIANGLE_STRIP,
        }
    }
}

impl From<TextureWrap> for GLenum {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Repeat => gl::REPEAT,
            TextureWrap::Clamp => gl::CLAMP_TO_EDGE,
        }
    }
}

/// Returns the `(internal format, format, type)` of client texture data.
pub fn texture_format(format: TextureFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        TextureFormat::U8U8U8 => (gl::RGB8, gl::RGB, gl::UNSIGNED_BYTE),
        TextureFormat::U8U8U8U8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
    }
}

pub fn render_texture_format(format: RenderTextureFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        RenderTextureFormat::RGBA8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        RenderTextureFormat::R8 => (gl::R8, gl::RED, gl::UNSIGNED_BYTE),
        RenderTextureFormat::RGB16F => (gl::RGB16F, gl::RGB, gl::HALF_FLOAT),
        RenderTextureFormat::RGBA16F => (gl::RGBA16F, gl::RGBA, gl::HALF_FLOAT),
        RenderTextureFormat::Depth24 => (gl::DEPTH_COMPONENT24, gl::DEPTH_COMPONENT, gl::FLOAT),
        RenderTextureFormat::Depth32F => (gl::DEPTH_COMPONENT32F, gl::DEPTH_COMPONENT, gl::FLOAT),
    }
}

/// Returns the `(internal format, format, type)` of a storage image. Signed
/// normalized images are transferred as floats, everything else as unsigned
/// integers.
pub fn image_format(format: ImageFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        ImageFormat::R32UI => (gl::R32UI, gl::RED_INTEGER, gl::UNSIGNED_INT),
        ImageFormat::RGBA32UI => (gl::RGBA32UI, gl::RGBA_INTEGER, gl::UNSIGNED_INT),
        ImageFormat::RGBA8Snorm => (gl::RGBA8_SNORM, gl::RGBA, gl::FLOAT),
        ImageFormat::RGBA16Snorm => (gl::RGBA16_SNORM, gl::RGBA, gl::FLOAT),
    }
}
