//! Weighted blended approximations. Each one accumulates every fragment with
//! commutative blending and resolves the sums against the background.

/// Depth weight of the weighted Bavoil-McGuire variant.
#[inline]
pub fn depth_weight(depth: f32) -> f32 {
    let d = 1.0 - depth;
    (3e3 * d * d * d).max(1e-2).min(3e3)
}

/// Meshkin's contribution of a fragment, added on top of the background.
#[inline]
pub fn meshkin(color: [f32; 3], background: [f32; 3], alpha: f32) -> [f32; 4] {
    [
        (color[0] - background[0]) * alpha,
        (color[1] - background[1]) * alpha,
        (color[2] - background[2]) * alpha,
        alpha,
    ]
}

/// Resolves the sums of Bavoil and Myers: the premultiplied color sum, the
/// alpha sum and the fragment count. Returns the average color and the
/// transmittance, or `None` if no fragment was accumulated.
pub fn bavoil_myers(accum: [f32; 3], alpha_sum: f32, count: f32) -> Option<([f32; 3], f32)> {
    if count < 0.5 || alpha_sum <= 0.0 {
        return None;
    }

    let avg = [
        accum[0] / alpha_sum,
        accum[1] / alpha_sum,
        accum[2] / alpha_sum,
    ];

    let t = (1.0 - alpha_sum / count).max(0.0).powf(count);
    Some((avg, t))
}

/// Resolves the sums of Bavoil and McGuire: the (weighted) premultiplied color
/// and alpha sums, and the product of transmittances.
pub fn bavoil_mcguire(accum: [f32; 4], transmittance: f32) -> ([f32; 3], f32) {
    let a = accum[3].max(1e-5);
    ([accum[0] / a, accum[1] / a, accum[2] / a], transmittance)
}

/// Applies a resolved `(color, transmittance)` over `dst`, the way the
/// resolve pass blends with `(1 - src alpha, src alpha)`.
#[inline]
pub fn resolve_over(avg: [f32; 3], t: f32, dst: [f32; 3]) -> [f32; 3] {
    [
        avg[0] * (1.0 - t) + dst[0] * t,
        avg[1] * (1.0 - t) + dst[1] * t,
        avg[2] * (1.0 - t) + dst[2] * t,
    ]
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(lhs: [f32; 3], rhs: [f32; 3]) -> bool {
        lhs.iter().zip(rhs.iter()).all(|(a, b)| (a - b).abs() < 1e-5)
    }

    #[test]
    fn single_fragment() {
        let c = [0.8, 0.2, 0.4];
        let bg = [0.1, 0.6, 0.3];
        let a = 0.5;
        let reference = crate::oit::mix(bg, c, a);

        let m = meshkin(c, bg, a);
        assert!(close([bg[0] + m[0], bg[1] + m[1], bg[2] + m[2]], reference));

        let (avg, t) = bavoil_myers([c[0] * a, c[1] * a, c[2] * a], a, 1.0).unwrap();
        assert!(close(resolve_over(avg, t, bg), reference));

        let w = depth_weight(0.3);
        let accum = [c[0] * a * w, c[1] * a * w, c[2] * a * w, a * w];
        let (avg, t) = bavoil_mcguire(accum, 1.0 - a);
        assert!(close(resolve_over(avg, t, bg), reference));
    }

    #[test]
    fn weights() {
        assert_eq!(depth_weight(1.0), 1e-2);
        assert_eq!(depth_weight(0.0), 3e3);
        assert!(depth_weight(0.2) > depth_weight(0.8));
        assert!(bavoil_myers([0.0; 3], 0.0, 0.0).is_none());
    }
}
