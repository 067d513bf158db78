/// A RGBA `Color`. Each color component is a floating point value
/// with a range from 0 to 1.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Color<S> {
    pub r: S,
    pub g: S,
    pub b: S,
    pub a: S,
}

impl<S> Color<S> {
    #[inline]
    pub const fn new(r: S, g: S, b: S, a: S) -> Color<S> {
        Color { r, g, b, a }
    }
}

impl Color<f32> {
    #[inline]
    pub fn white() -> Self {
        Color::new(1.0, 1.0, 1.0, 1.0)
    }

    #[inline]
    pub fn black() -> Self {
        Color::new(0.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn transparent() -> Self {
        Color::new(0.0, 0.0, 0.0, 0.0)
    }

    #[inline]
    pub fn red() -> Self {
        Color::new(1.0, 0.0, 0.0, 1.0)
    }

    #[inline]
    pub fn green() -> Self {
        Color::new(0.0, 1.0, 0.0, 1.0)
    }

    #[inline]
    pub fn blue() -> Self {
        Color::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Clamps every component into [0, 1].
    #[inline]
    pub fn clip(&self) -> Self {
        Color::new(
            self.r.max(0.0).min(1.0),
            self.g.max(0.0).min(1.0),
            self.b.max(0.0).min(1.0),
            self.a.max(0.0).min(1.0),
        )
    }

    /// Returns the largest absolute difference between the rgb components.
    #[inline]
    pub fn distance_rgb(&self, rhs: &Self) -> f32 {
        (self.r - rhs.r)
            .abs()
            .max((self.g - rhs.g).abs())
            .max((self.b - rhs.b).abs())
    }

    #[inline]
    pub fn rgb(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[f32; 4]> for Color<f32> {
    fn from(v: [f32; 4]) -> Self {
        Color::new(v[0], v[1], v[2], v[3])
    }
}

impl Into<[f32; 4]> for Color<f32> {
    fn into(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color<f32> {
    fn from(v: [u8; 4]) -> Self {
        let max = 255.0;
        Color::new(
            f32::from(v[0]) / max,
            f32::from(v[1]) / max,
            f32::from(v[2]) / max,
            f32::from(v[3]) / max,
        )
    }
}

impl Into<[u8; 4]> for Color<f32> {
    fn into(self) -> [u8; 4] {
        let v = self.clip();
        let max = 255.0;
        [
            (v.r * max).round() as u8,
            (v.g * max).round() as u8,
            (v.b * max).round() as u8,
            (v.a * max).round() as u8,
        ]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bytes() {
        let c: [u8; 4] = Color::new(1.0, 0.5, 0.0, 2.0).into();
        assert_eq!(c, [255, 128, 0, 255]);

        let c = Color::<f32>::from([255, 0, 0, 255]);
        assert_eq!(c, Color::red());
    }

    #[test]
    fn distance() {
        let a = Color::new(0.25, 0.5, 0.0, 1.0);
        let b = Color::new(0.25, 0.25, 0.1, 0.0);
        assert!((a.distance_rgb(&b) - 0.25).abs() < 1e-6);
    }
}
