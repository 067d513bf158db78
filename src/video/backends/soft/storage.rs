//! Texel storage of the software backend: render textures and their
//! quantization, samplers, and storage images with atomic access.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::math::Vector2;
use crate::video::assets::prelude::*;

pub type Texel = [f32; 4];

/// Quantizes a color or depth value the way an attachment of `format` stores it.
pub fn quantize(format: RenderTextureFormat, v: Texel) -> Texel {
    fn unorm(v: f32, max: f32) -> f32 {
        (v.max(0.0).min(1.0) * max).round() / max
    }

    match format {
        RenderTextureFormat::RGBA8 => [
            unorm(v[0], 255.0),
            unorm(v[1], 255.0),
            unorm(v[2], 255.0),
            unorm(v[3], 255.0),
        ],
        RenderTextureFormat::R8 => [unorm(v[0], 255.0), 0.0, 0.0, 1.0],
        RenderTextureFormat::RGB16F => [v[0], v[1], v[2], 1.0],
        RenderTextureFormat::RGBA16F => v,
        RenderTextureFormat::Depth24 => [unorm(v[0], 16_777_215.0), 0.0, 0.0, 1.0],
        RenderTextureFormat::Depth32F => [v[0].max(0.0).min(1.0), 0.0, 0.0, 1.0],
    }
}

fn factor(f: BlendFactor, src: Texel, dst: Texel, channel: usize) -> f32 {
    let value = |v: BlendValue| match v {
        BlendValue::SourceColor => src[channel],
        BlendValue::SourceAlpha => src[3],
        BlendValue::DestinationColor => dst[channel],
        BlendValue::DestinationAlpha => dst[3],
    };

    match f {
        BlendFactor::Zero => 0.0,
        BlendFactor::One => 1.0,
        BlendFactor::Value(v) => value(v),
        BlendFactor::OneMinusValue(v) => 1.0 - value(v),
    }
}

/// Blends `src` with `dst`. Normalized attachments clamp the source first.
pub fn blend(blend: Blend, src: Texel, dst: Texel, normalized: bool) -> Texel {
    let src = if normalized {
        [
            src[0].max(0.0).min(1.0),
            src[1].max(0.0).min(1.0),
            src[2].max(0.0).min(1.0),
            src[3].max(0.0).min(1.0),
        ]
    } else {
        src
    };

    let (equation, sf, df) = blend;
    let mut out = [0.0; 4];
    for (c, v) in out.iter_mut().enumerate() {
        let s = src[c] * factor(sf, src, dst, c);
        let d = dst[c] * factor(df, src, dst, c);
        *v = match equation {
            Equation::Add => s + d,
            Equation::Subtract => s - d,
            Equation::ReverseSubtract => d - s,
        };
    }

    out
}

/// A color or depth buffer. Depth values live in the first channel.
#[derive(Debug)]
pub struct Attachment {
    pub format: RenderTextureFormat,
    pub filter: TextureFilter,
    pub dimensions: Vector2<u32>,
    pub texels: Vec<Texel>,
}

impl Attachment {
    pub fn new(format: RenderTextureFormat, filter: TextureFilter, dimensions: Vector2<u32>) -> Self {
        let len = dimensions.x as usize * dimensions.y as usize;
        let init = quantize(format, if format.is_color() { [0.0; 4] } else { [1.0; 4] });

        Attachment {
            format,
            filter,
            dimensions,
            texels: vec![init; len],
        }
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.dimensions.x as usize + x as usize
    }

    pub fn fill(&mut self, v: Texel) {
        let v = quantize(self.format, v);
        for texel in &mut self.texels {
            *texel = v;
        }
    }

    pub fn sampler(&self) -> Sampler {
        Sampler {
            texels: &self.texels,
            dimensions: self.dimensions,
            filter: self.filter,
            wrap: TextureWrap::Clamp,
        }
    }
}

/// Read-only access to the texels of a texture or render texture.
#[derive(Debug, Clone, Copy)]
pub struct Sampler<'a> {
    pub texels: &'a [Texel],
    pub dimensions: Vector2<u32>,
    pub filter: TextureFilter,
    pub wrap: TextureWrap,
}

impl<'a> Sampler<'a> {
    /// Fetches a texel by integer coordinates, clamped to the edges.
    pub fn fetch(&self, x: i64, y: i64) -> Texel {
        let (w, h) = (i64::from(self.dimensions.x), i64::from(self.dimensions.y));
        if w == 0 || h == 0 {
            return [0.0; 4];
        }

        let (x, y) = match self.wrap {
            TextureWrap::Clamp => (x.max(0).min(w - 1), y.max(0).min(h - 1)),
            TextureWrap::Repeat => (x.rem_euclid(w), y.rem_euclid(h)),
        };

        self.texels[(y * w + x) as usize]
    }

    /// Samples with normalized coordinates.
    pub fn sample(&self, uv: Vector2<f32>) -> Texel {
        let u = uv.x * self.dimensions.x as f32;
        let v = uv.y * self.dimensions.y as f32;

        match self.filter {
            TextureFilter::Nearest => self.fetch(u.floor() as i64, v.floor() as i64),
            TextureFilter::Linear => {
                let (u, v) = (u - 0.5, v - 0.5);
                let (x0, y0) = (u.floor(), v.floor());
                let (fx, fy) = (u - x0, v - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);

                let t00 = self.fetch(x0, y0);
                let t10 = self.fetch(x0 + 1, y0);
                let t01 = self.fetch(x0, y0 + 1);
                let t11 = self.fetch(x0 + 1, y0 + 1);

                let mut out = [0.0; 4];
                for (c, v) in out.iter_mut().enumerate() {
                    let top = t00[c] + (t10[c] - t00[c]) * fx;
                    let bottom = t01[c] + (t11[c] - t01[c]) * fx;
                    *v = top + (bottom - top) * fy;
                }
                out
            }
        }
    }
}

/// A storage image. Integer formats keep raw values; signed normalized formats
/// keep the bits of the quantized float.
#[derive(Debug)]
pub struct ImageStorage {
    pub params: ImageParams,
    pub texels: Vec<AtomicU32>,
}

impl ImageStorage {
    pub fn new(params: ImageParams) -> Self {
        let len = params.texels() * params.format.components();
        ImageStorage {
            params,
            texels: (0..len).map(|_| AtomicU32::new(0)).collect(),
        }
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        let d = self.params.dimensions;
        if x < d.x && y < d.y {
            let index = y as usize * d.x as usize + x as usize;
            Some(index * self.params.format.components())
        } else {
            None
        }
    }

    /// Loads the components of a texel, zeros if it is out of bounds.
    pub fn load(&self, x: u32, y: u32) -> [u32; 4] {
        let mut out = [0; 4];
        if let Some(offset) = self.offset(x, y) {
            for (i, v) in out.iter_mut().take(self.params.format.components()).enumerate() {
                *v = self.texels[offset + i].load(Ordering::Relaxed);
            }
        }
        out
    }

    /// Stores the components of a texel. Out of bounds stores are ignored.
    pub fn store(&self, x: u32, y: u32, v: [u32; 4]) {
        if let Some(offset) = self.offset(x, y) {
            for i in 0..self.params.format.components() {
                self.texels[offset + i].store(v[i], Ordering::Relaxed);
            }
        }
    }

    pub fn load_f32(&self, x: u32, y: u32) -> [f32; 4] {
        let raw = self.load(x, y);
        [
            f32::from_bits(raw[0]),
            f32::from_bits(raw[1]),
            f32::from_bits(raw[2]),
            f32::from_bits(raw[3]),
        ]
    }

    pub fn store_f32(&self, x: u32, y: u32, v: [f32; 4]) {
        let mut raw = [0; 4];
        for (i, r) in raw.iter_mut().enumerate() {
            *r = self.quantize(v[i]).to_bits();
        }
        self.store(x, y, raw);
    }

    fn quantize(&self, v: f32) -> f32 {
        match self.params.format.snorm_scale() {
            Some(s) => (v.max(-1.0).min(1.0) * s).round() / s,
            None => v,
        }
    }

    /// Atomically replaces the first component and returns the previous one.
    pub fn exchange(&self, x: u32, y: u32, v: u32) -> Option<u32> {
        self.offset(x, y)
            .map(|offset| self.texels[offset].swap(v, Ordering::AcqRel))
    }

    /// Atomically replaces the first component with `v` if it equals `current`,
    /// returning the value seen either way.
    pub fn compare_exchange(&self, x: u32, y: u32, current: u32, v: u32) -> Option<u32> {
        self.offset(x, y).map(|offset| {
            match self.texels[offset].compare_exchange(current, v, Ordering::Acquire, Ordering::Relaxed) {
                Ok(prev) | Err(prev) => prev,
            }
        })
    }

    /// Atomically stores the first component, publishing the writes before it.
    pub fn release(&self, x: u32, y: u32, v: u32) {
        if let Some(offset) = self.offset(x, y) {
            self.texels[offset].store(v, Ordering::Release);
        }
    }

    pub fn clear(&self, value: ImageValue) {
        let components = self.params.format.components();
        let raw = match value {
            ImageValue::Uint(v) => v,
            ImageValue::Float(v) => {
                let mut raw = [0; 4];
                for (i, r) in raw.iter_mut().enumerate() {
                    *r = self.quantize(v[i]).to_bits();
                }
                raw
            }
        };

        for (i, texel) in self.texels.iter().enumerate() {
            texel.store(raw[i % components], Ordering::Relaxed);
        }
    }

    pub fn read(&self) -> Vec<u32> {
        self.texels.iter().map(|v| v.load(Ordering::Relaxed)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quantization() {
        let v = quantize(RenderTextureFormat::RGBA8, [0.5, 1.5, -1.0, 0.2]);
        assert_eq!(v, [128.0 / 255.0, 1.0, 0.0, 51.0 / 255.0]);

        let v = quantize(RenderTextureFormat::R8, [0.5, 1.0, 1.0, 0.0]);
        assert_eq!(v, [128.0 / 255.0, 0.0, 0.0, 1.0]);

        let v = quantize(RenderTextureFormat::RGBA16F, [-0.5, 2.0, 0.0, 1.0]);
        assert_eq!(v, [-0.5, 2.0, 0.0, 1.0]);
    }

    #[test]
    fn blending() {
        let src = [0.5, 0.0, 0.0, 0.5];
        let dst = [0.0, 0.0, 1.0, 1.0];

        let premultiplied = (
            Equation::Add,
            BlendFactor::One,
            BlendFactor::OneMinusValue(BlendValue::SourceAlpha),
        );
        assert_eq!(blend(premultiplied, src, dst, true), [0.5, 0.0, 0.5, 1.0]);

        let multiply = (
            Equation::Add,
            BlendFactor::Zero,
            BlendFactor::Value(BlendValue::SourceColor),
        );
        assert_eq!(blend(multiply, src, dst, true), [0.0, 0.0, 0.0, 0.5]);
    }

    #[test]
    fn images() {
        let params = ImageParams {
            format: ImageFormat::RGBA8Snorm,
            dimensions: Vector2::new(2, 2),
        };

        let image = ImageStorage::new(params);
        image.clear(ImageValue::Float([1.0, 1.0, 1.0, 1.0]));
        assert_eq!(image.load_f32(1, 1), [1.0; 4]);

        image.store_f32(0, 1, [0.5, -0.25, 0.0, 2.0]);
        let v = image.load_f32(0, 1);
        assert_eq!(v[0], 64.0 / 127.0);
        assert_eq!(v[1], -32.0 / 127.0);
        assert_eq!(v[3], 1.0);
        assert_eq!(image.load(5, 5), [0; 4]);

        let params = ImageParams {
            format: ImageFormat::R32UI,
            dimensions: Vector2::new(2, 2),
        };

        let lock = ImageStorage::new(params);
        assert_eq!(lock.compare_exchange(1, 0, 0, 1), Some(0));
        assert_eq!(lock.compare_exchange(1, 0, 0, 1), Some(1));
        lock.release(1, 0, 0);
        assert_eq!(lock.exchange(1, 0, 7), Some(0));
        assert_eq!(lock.exchange(3, 0, 7), None);
    }
}
