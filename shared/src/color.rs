// Slider position to tint mapping: black at 0, dim amber at 100.

pub const SLIDER_MAX: i32 = 100;
pub const RED_MAX: u8 = 130;
pub const GREEN_MAX: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// GDI `COLORREF` layout: 0x00BBGGRR.
    pub fn to_colorref_bits(self) -> u32 {
        ((self.b as u32) << 16) | ((self.g as u32) << 8) | self.r as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Argb {
    pub a: u8,
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Argb {
    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn with_rgb(self, rgb: Rgb) -> Self {
        Self {
            a: self.a,
            r: rgb.r,
            g: rgb.g,
            b: rgb.b,
        }
    }
}

/// Tint for a slider position in 0..=100. Red caps halfway, green ramps across the whole range.
pub fn color_for_position(position: i32) -> Rgb {
    let ratio = position.clamp(0, SLIDER_MAX) as f32 / SLIDER_MAX as f32;
    let red = (ratio * 2.0 * RED_MAX as f32).min(RED_MAX as f32);
    let green = (ratio * GREEN_MAX as f32).min(GREEN_MAX as f32);
    Rgb::new(red as u8, green as u8, 0)
}

/// Tint for a persisted color-temperature fraction.
pub fn color_for_temperature(value: f32) -> Rgb {
    color_for_position(fraction_to_position(value))
}

pub fn alpha_byte(alpha: f32) -> u8 {
    let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
    (alpha * 255.0).floor() as u8
}

/// Set the alpha channel of `rgb`. Replaces rather than multiplies, so re-applying is a no-op.
pub fn composite(rgb: Rgb, alpha: f32) -> Argb {
    Argb {
        a: alpha_byte(alpha),
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

pub fn position_to_fraction(position: i32) -> f32 {
    position.clamp(0, SLIDER_MAX) as f32 / SLIDER_MAX as f32
}

pub fn fraction_to_position(value: f32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * SLIDER_MAX as f32).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        assert_eq!(color_for_position(0), Rgb::BLACK);
        assert_eq!(color_for_position(100), Rgb::new(130, 25, 0));
    }

    #[test]
    fn red_caps_at_midpoint() {
        assert_eq!(color_for_position(25).r, 65);
        assert_eq!(color_for_position(50).r, 130);
        assert_eq!(color_for_position(75).r, 130);
    }

    #[test]
    fn channels_stay_within_caps_and_red_never_drops() {
        let mut last_red = 0;
        for position in 0..=SLIDER_MAX {
            let c = color_for_position(position);
            assert!(c.r >= last_red, "red decreased at {position}");
            assert!(c.r <= RED_MAX);
            assert!(c.g <= GREEN_MAX);
            assert_eq!(c.b, 0);
            last_red = c.r;
        }
    }

    #[test]
    fn out_of_range_positions_clamp() {
        assert_eq!(color_for_position(-20), Rgb::BLACK);
        assert_eq!(color_for_position(400), Rgb::new(130, 25, 0));
    }

    #[test]
    fn half_alpha_gives_127() {
        let c = composite(Rgb::new(130, 25, 0), 0.5);
        assert_eq!(c, Argb { a: 127, r: 130, g: 25, b: 0 });
    }

    #[test]
    fn composite_is_idempotent() {
        for alpha in [0.0, 0.13, 0.5, 0.8, 1.0] {
            let once = composite(Rgb::new(90, 12, 0), alpha);
            let twice = composite(once.rgb(), alpha);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn alpha_clamps() {
        assert_eq!(alpha_byte(-1.0), 0);
        assert_eq!(alpha_byte(2.0), 255);
        assert_eq!(alpha_byte(f32::NAN), 0);
    }

    #[test]
    fn temperature_fraction_maps_through_slider() {
        assert_eq!(color_for_temperature(0.5), color_for_position(50));
        assert_eq!(fraction_to_position(0.333), 33);
        assert_eq!(position_to_fraction(150), 1.0);
    }

    #[test]
    fn colorref_layout() {
        assert_eq!(Rgb::new(0x12, 0x34, 0x56).to_colorref_bits(), 0x0056_3412);
    }
}
