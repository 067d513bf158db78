//! The per-pixel arithmetic of the order-independent techniques, shared by
//! the software rasterizer and the tests. The GLSL programs of the OpenGL
//! backend implement exactly the same formulas.

pub mod abuffer;
pub mod visibility;
pub mod weighted;

/// Composites premultiplied `src` over `dst`.
#[inline]
pub fn over(src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    let t = 1.0 - src[3];
    [
        src[0] + dst[0] * t,
        src[1] + dst[1] * t,
        src[2] + dst[2] * t,
        src[3] + dst[3] * t,
    ]
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}
