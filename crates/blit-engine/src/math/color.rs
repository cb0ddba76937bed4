use blit_gl::UniformValue;

/// 8-bit RGBA color, used as a multiplicative mask.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);

    #[inline]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    /// `0xRRGGBBAA`.
    #[inline]
    pub const fn from_hex(hex: u32) -> Self {
        let [r, g, b, a] = hex.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Components scaled into `[0, 1]`.
    #[inline]
    pub fn normalized(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

impl From<Color> for UniformValue {
    fn from(c: Color) -> Self {
        UniformValue::Vec4(c.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_scales_to_unit_range() {
        assert_eq!(Color::WHITE.normalized(), [1.0; 4]);
        assert_eq!(Color::rgba(0, 51, 255, 0).normalized(), [0.0, 0.2, 1.0, 0.0]);
    }

    #[test]
    fn hex_is_rgba_order() {
        assert_eq!(Color::from_hex(0x1122_33ff), Color::rgba(0x11, 0x22, 0x33, 0xff));
    }

    #[test]
    fn converts_to_vec4_uniform() {
        let v: UniformValue = Color::BLACK.into();
        assert_eq!(v, UniformValue::Vec4([0.0, 0.0, 0.0, 1.0]));
    }
}
