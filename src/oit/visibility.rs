//! Per-pixel visibility functions of adaptive transparency.
//!
//! A pixel keeps at most `CAPACITY` breakpoints `(depth, visibility)` sorted by
//! depth, where `visibility` is the fraction of light that passes every
//! fragment up to and including the one at `depth`. Unused slots have a depth
//! of `EMPTY_DEPTH`, which is also what the depth image is cleared to.

/// Maximum number of breakpoints per pixel.
pub const CAPACITY: usize = 4;
/// The depth marking an unused breakpoint.
pub const EMPTY_DEPTH: f32 = 1.0;
/// Fragments closer than this to a breakpoint are not occluded by it.
pub const DEPTH_EPSILON: f32 = 1e-4;
/// Attempts a fragment makes to take the per-pixel lock before giving up.
pub const MAX_LOCK_RETRIES: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityCurve {
    pub depths: [f32; CAPACITY],
    pub visibilities: [f32; CAPACITY],
}

impl Default for VisibilityCurve {
    fn default() -> Self {
        VisibilityCurve {
            depths: [EMPTY_DEPTH; CAPACITY],
            visibilities: [0.0; CAPACITY],
        }
    }
}

impl VisibilityCurve {
    pub fn new(depths: [f32; CAPACITY], visibilities: [f32; CAPACITY]) -> Self {
        VisibilityCurve {
            depths,
            visibilities,
        }
    }

    /// Returns the number of breakpoints in use.
    pub fn len(&self) -> usize {
        self.depths.iter().take_while(|&&v| v < EMPTY_DEPTH).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inserts a fragment at `depth` with opacity `alpha`.
    ///
    /// Every breakpoint behind the fragment is attenuated by `1 - alpha`. When
    /// the curve overflows, the non-final breakpoint whose removal adds the
    /// least area under the curve is dropped. The final breakpoint is never
    /// dropped, so the total transmittance stays exact.
    pub fn insert(&mut self, depth: f32, alpha: f32) {
        if depth >= EMPTY_DEPTH {
            return;
        }

        let len = self.len();
        let mut d = [EMPTY_DEPTH; CAPACITY + 1];
        let mut v = [0.0; CAPACITY + 1];
        d[..len].copy_from_slice(&self.depths[..len]);
        v[..len].copy_from_slice(&self.visibilities[..len]);

        let pos = d[..len].iter().take_while(|&&x| x <= depth).count();
        let before = if pos == 0 { 1.0 } else { v[pos - 1] };

        for i in (pos..len).rev() {
            d[i + 1] = d[i];
            v[i + 1] = v[i] * (1.0 - alpha);
        }

        d[pos] = depth;
        v[pos] = before * (1.0 - alpha);

        let mut n = len + 1;
        if n > CAPACITY {
            let mut victim = 0;
            let mut least = ::std::f32::INFINITY;

            for i in 0..n - 1 {
                let prev = if i == 0 { 1.0 } else { v[i - 1] };
                let area = (prev - v[i]) * (d[i + 1] - d[i]);
                if area < least {
                    least = area;
                    victim = i;
                }
            }

            for i in victim..n - 1 {
                d[i] = d[i + 1];
                v[i] = v[i + 1];
            }

            n -= 1;
        }

        *self = VisibilityCurve::default();
        self.depths[..n].copy_from_slice(&d[..n]);
        self.visibilities[..n].copy_from_slice(&v[..n]);
    }

    /// Evaluates the visibility in front of a fragment at `depth`.
    pub fn eval(&self, depth: f32) -> f32 {
        let mut vis = 1.0;
        for i in 0..self.len() {
            if self.depths[i] < depth - DEPTH_EPSILON {
                vis = self.visibilities[i];
            } else {
                break;
            }
        }

        vis
    }

    /// Returns the visibility behind every breakpoint.
    pub fn transmittance(&self) -> f32 {
        match self.len() {
            0 => 1.0,
            n => self.visibilities[n - 1],
        }
    }

    /// Returns true if the breakpoints are sorted by depth and the visibility
    /// never increases with depth.
    pub fn is_monotonic(&self) -> bool {
        let n = self.len();
        let mut prev = (0.0, 1.0);
        for i in 0..n {
            if self.depths[i] < prev.0 || self.visibilities[i] > prev.1 + 1e-6 {
                return false;
            }

            prev = (self.depths[i], self.visibilities[i]);
        }

        true
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn exact(fragments: &[(f32, f32)], depth: f32) -> f32 {
        fragments
            .iter()
            .filter(|v| v.0 < depth - DEPTH_EPSILON)
            .fold(1.0, |acc, v| acc * (1.0 - v.1))
    }

    #[test]
    fn empty() {
        let curve = VisibilityCurve::default();
        assert!(curve.is_empty());
        assert_eq!(curve.eval(0.5), 1.0);
        assert_eq!(curve.transmittance(), 1.0);
    }

    #[test]
    fn exact_within_capacity() {
        let fragments = [(0.7, 0.5), (0.2, 0.25), (0.5, 0.5), (0.9, 0.1)];

        let mut curve = VisibilityCurve::default();
        for &(d, a) in &fragments {
            curve.insert(d, a);
            assert!(curve.is_monotonic());
        }

        assert_eq!(curve.len(), 4);
        assert_eq!(curve.depths, [0.2, 0.5, 0.7, 0.9]);

        for &(d, _) in &fragments {
            assert!((curve.eval(d) - exact(&fragments, d)).abs() < 1e-6);
        }

        assert!((curve.transmittance() - exact(&fragments, 1.0)).abs() < 1e-6);
    }

    #[test]
    fn eviction() {
        let fragments = [
            (0.1, 0.5),
            (0.11, 0.01),
            (0.5, 0.5),
            (0.6, 0.5),
            (0.8, 0.5),
            (0.3, 0.5),
        ];

        let mut curve = VisibilityCurve::default();
        for &(d, a) in &fragments {
            curve.insert(d, a);
            assert!(curve.is_monotonic());
            assert!(curve.len() <= CAPACITY);
        }

        // The nearly transparent fragment at 0.11 is the cheapest to forget.
        assert!(curve.depths.iter().all(|&v| v != 0.11));
        assert!((curve.transmittance() - exact(&fragments, 1.0)).abs() < 1e-6);
    }

    #[test]
    fn far_plane() {
        let mut curve = VisibilityCurve::default();
        curve.insert(1.0, 0.5);
        assert!(curve.is_empty());
    }
}
