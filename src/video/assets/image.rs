//! Storage images and atomic counters. Unlike render textures, these are read
//! and written at arbitrary texels by fragment programs, with atomic
//! read-modify-write operations where programs contend for a texel.

use crate::math::Vector2;

impl_handle!(ImageHandle);

#[derive(Debug, Copy, Clone)]
pub struct ImageParams {
    pub format: ImageFormat,
    pub dimensions: Vector2<u32>,
}

impl Default for ImageParams {
    fn default() -> Self {
        ImageParams {
            format: ImageFormat::R32UI,
            dimensions: Vector2::new(0, 0),
        }
    }
}

impl ImageParams {
    /// Returns the number of texels.
    #[inline]
    pub fn texels(&self) -> usize {
        self.dimensions.x as usize * self.dimensions.y as usize
    }
}

/// Formats of storage images.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ImageFormat {
    /// One unsigned integer, supports atomic operations.
    R32UI,
    /// Four unsigned integers.
    RGBA32UI,
    /// Four 8-bits signed normalized values.
    RGBA8Snorm,
    /// Four 16-bits signed normalized values.
    RGBA16Snorm,
}

impl ImageFormat {
    pub fn components(self) -> usize {
        match self {
            ImageFormat::R32UI => 1,
            _ => 4,
        }
    }

    /// Returns the largest representable magnitude of a signed normalized
    /// format, used to quantize stores.
    pub fn snorm_scale(self) -> Option<f32> {
        match self {
            ImageFormat::RGBA8Snorm => Some(127.0),
            ImageFormat::RGBA16Snorm => Some(32767.0),
            _ => None,
        }
    }
}

/// The value every texel of an image is reset to.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ImageValue {
    Uint([u32; 4]),
    Float([f32; 4]),
}

impl_handle!(CounterHandle);
