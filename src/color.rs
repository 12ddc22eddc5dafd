//! Color conversions used when editing gradients.
//!
//! Hue is expressed in degrees `[0, 360]`, saturation and value in percent
//! `[0, 100]`, all rounded to integers. Opacity gradients store opacity as a
//! gray level, see [`opacity_to_gray`].
use crate::util::{channel_to_u8, round_half_up};
use rgb::RGB8;

/// A color in hue, saturation, value form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360]`.
    pub h: u16,
    /// Saturation in percent, `[0, 100]`.
    pub s: u8,
    /// Value in percent, `[0, 100]`.
    pub v: u8,
}

/// Convert an RGB color to HSV.
pub fn rgb_to_hsv(color: RGB8) -> Hsv {
    let r = f32::from(color.r) / 255.;
    let g = f32::from(color.g) / 255.;
    let b = f32::from(color.b) / 255.;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let d = max - min;
    let s = if max == 0. { 0. } else { d / max };
    let sector = if d == 0. {
        0.
    } else if max == r {
        (g - b) / d + if g < b { 6. } else { 0. }
    } else if max == g {
        (b - r) / d + 2.
    } else {
        (r - g) / d + 4.
    };
    let h = sector / 6.;
    Hsv {
        h: round_half_up(h * 360.) as u16,
        s: round_half_up(s * 100.) as u8,
        v: round_half_up(max * 100.) as u8,
    }
}

/// Convert an HSV color to RGB.
pub fn hsv_to_rgb(hsv: Hsv) -> RGB8 {
    let h = f32::from(hsv.h) / 360.;
    let s = f32::from(hsv.s) / 100.;
    let v = f32::from(hsv.v) / 100.;
    let i = (h * 6.).floor();
    let f = h * 6. - i;
    let p = v * (1. - s);
    let q = v * (1. - f * s);
    let t = v * (1. - (1. - f) * s);
    let (r, g, b) = match (i as i32).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    RGB8::new(
        channel_to_u8(r * 255.),
        channel_to_u8(g * 255.),
        channel_to_u8(b * 255.),
    )
}

/// Format a color as six lowercase hex digits, without a leading `#`.
pub fn to_hex(color: RGB8) -> String {
    format!("{:02x}{:02x}{:02x}", color.r, color.g, color.b)
}

/// Parse six hex digits, with an optional leading `#`.
pub fn from_hex(hex: &str) -> Option<RGB8> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(RGB8::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Parse a CSS style `rgb(r, g, b)` string.
pub fn parse_rgb(text: &str) -> Option<RGB8> {
    let mut numbers = text
        .split(|c: char| !c.is_ascii_digit())
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<u8>().ok());
    let r = numbers.next()??;
    let g = numbers.next()??;
    let b = numbers.next()??;
    Some(RGB8::new(r, g, b))
}

/// Gray level encoding an opacity percentage in `[0, 100]`.
pub fn opacity_to_gray(percent: f32) -> RGB8 {
    let level = channel_to_u8(percent / 100. * 255.);
    RGB8::new(level, level, level)
}

/// Opacity percentage encoded by a gray level (its red channel).
pub fn gray_to_opacity(color: RGB8) -> u8 {
    round_half_up(f32::from(color.r) / 255. * 100.) as u8
}
