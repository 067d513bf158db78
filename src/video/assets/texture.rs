//! Sampled textures and the render textures that back surface attachments.

use crate::math::Vector2;

impl_handle!(TextureHandle);

/// The parameters of an immutable texture uploaded from client memory, like
/// the background image.
#[derive(Debug, Copy, Clone)]
pub struct TextureParams {
    /// Sets the wrap parameter for texture.
    pub wrap: TextureWrap,
    /// Specify how the texture is used whenever the pixel being sampled.
    pub filter: TextureFilter,
    /// Sets the format of data.
    pub format: TextureFormat,
    /// Sets the dimensions of texture.
    pub dimensions: Vector2<u32>,
}

impl Default for TextureParams {
    fn default() -> Self {
        TextureParams {
            format: TextureFormat::U8U8U8U8,
            wrap: TextureWrap::Clamp,
            filter: TextureFilter::Linear,
            dimensions: Vector2::new(0, 0),
        }
    }
}

impl TextureParams {
    /// Returns the number of bytes `data` must have to fill this texture.
    pub fn len(&self) -> usize {
        self.format.size() as usize * self.dimensions.x as usize * self.dimensions.y as usize
    }
}

/// List of all the possible formats of input data when uploading to texture.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextureFormat {
    U8U8U8,
    U8U8U8U8,
}

impl TextureFormat {
    /// Returns the size in bytes of a pixel of this type.
    pub fn size(self) -> u8 {
        match self {
            TextureFormat::U8U8U8 => 3,
            TextureFormat::U8U8U8U8 => 4,
        }
    }
}

/// Specify how the texture is used whenever the pixel being sampled.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextureFilter {
    /// Returns the value of the texture element that is nearest to the center
    /// of the pixel being textured.
    Nearest,
    /// Returns the weighted average of the four texture elements that are closest
    /// to the center of the pixel being textured.
    Linear,
}

/// Sets the wrap parameter for texture.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TextureWrap {
    /// Samples at coord x + 1 map to coord x.
    Repeat,
    /// Samples at coord x + 1 map to coord 1.
    Clamp,
}

impl_handle!(RenderTextureHandle);

/// A `RenderTexture` is a texture with a renderable format. It is attached to
/// surfaces as a color or depth target, and could be sampled by later passes.
#[derive(Debug, Copy, Clone)]
pub struct RenderTextureParams {
    pub format: RenderTextureFormat,
    pub filter: TextureFilter,
    pub dimensions: Vector2<u32>,
}

impl Default for RenderTextureParams {
    fn default() -> Self {
        RenderTextureParams {
            format: RenderTextureFormat::RGBA8,
            filter: TextureFilter::Nearest,
            dimensions: Vector2::new(0, 0),
        }
    }
}

/// List of all the possible formats of renderable texture which could be use as
/// attachment of framebuffer.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum RenderTextureFormat {
    /// 8-bits normalized color.
    RGBA8,
    /// Single 8-bits normalized channel.
    R8,
    /// Half-float color used by additive accumulation.
    RGB16F,
    RGBA16F,
    Depth24,
    Depth32F,
}

impl RenderTextureFormat {
    pub fn is_color(self) -> bool {
        match self {
            RenderTextureFormat::Depth24 | RenderTextureFormat::Depth32F => false,
            _ => true,
        }
    }

    /// Returns true if the stored values are clamped into [0, 1] and quantized.
    pub fn is_normalized(self) -> bool {
        match self {
            RenderTextureFormat::RGBA8 | RenderTextureFormat::R8 => true,
            _ => false,
        }
    }

    /// Returns the number of color channels stored.
    pub fn components(self) -> usize {
        match self {
            RenderTextureFormat::R8 => 1,
            RenderTextureFormat::RGB16F => 3,
            RenderTextureFormat::RGBA8 | RenderTextureFormat::RGBA16F => 4,
            RenderTextureFormat::Depth24 | RenderTextureFormat::Depth32F => 1,
        }
    }
}
