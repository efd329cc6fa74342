//! Color math shared by both extraction paths.
//!
//! Everything here works on plain `(r, g, b)` byte triples and lowercase
//! `#rrggbb` strings. The two brightness helpers are intentionally separate:
//! [`scale_brightness`] drives the pixel path and [`shift_brightness`] the DOM
//! path, and their outputs differ for the same factor.

/// An sRGB color with 8-bit channels.
pub type Rgb = (u8, u8, u8);

/// Pure black, used as contrast color on light accents.
pub const BLACK: &str = "#000000";
/// Pure white, used as contrast color on dark accents.
pub const WHITE: &str = "#ffffff";

/// Format a color as `#rrggbb` (lowercase).
pub fn rgb_to_hex((r, g, b): Rgb) -> String {
    format!("#{:02x}{:02x}{:02x}", r, g, b)
}

/// Parse a `#rrggbb` string. Returns `None` for anything else.
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// True when `s` is `#` followed by exactly six lowercase hex digits.
pub fn is_canonical_hex(s: &str) -> bool {
    s.len() == 7
        && s.starts_with('#')
        && s[1..]
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Normalize any CSS color string to `#rrggbb`.
///
/// Accepts hex notation (3, 4, 6 or 8 digits) and `rgb()`/`rgba()` in either
/// comma or space syntax. `transparent`, colors with alpha below 0.1 and
/// anything unrecognized yield `None`.
pub fn normalize_css_color(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("transparent") {
        return None;
    }
    if let Some(digits) = value.strip_prefix('#') {
        return normalize_hex_digits(digits);
    }

    let lower = value.to_ascii_lowercase();
    let inner = lower
        .strip_prefix("rgba(")
        .or_else(|| lower.strip_prefix("rgb("))?
        .strip_suffix(')')?;
    let (channels, alpha) = match inner.split_once('/') {
        Some((c, a)) => (c, Some(a)),
        None => (inner, None),
    };
    let mut parts: Vec<&str> = channels
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let alpha = match (alpha, parts.len()) {
        (Some(a), 3) => Some(a.trim()),
        (None, 4) => parts.pop(),
        (None, 3) => None,
        _ => return None,
    };
    if let Some(a) = alpha {
        if parse_alpha(a)? < 0.1 {
            return None;
        }
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        *slot = parse_channel(part)?;
    }
    Some(rgb_to_hex((rgb[0], rgb[1], rgb[2])))
}

fn normalize_hex_digits(digits: &str) -> Option<String> {
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let digits = digits.to_ascii_lowercase();
    let expanded: String = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits,
        _ => return None,
    };
    if expanded.len() == 8 {
        let alpha = u8::from_str_radix(&expanded[6..8], 16).ok()?;
        if (alpha as f64 / 255.0) < 0.1 {
            return None;
        }
    }
    Some(format!("#{}", &expanded[..6]))
}

fn parse_channel(part: &str) -> Option<u8> {
    let value = match part.strip_suffix('%') {
        Some(pct) => pct.parse::<f64>().ok()? * 2.55,
        None => part.parse::<f64>().ok()?,
    };
    Some(value.round().clamp(0.0, 255.0) as u8)
}

fn parse_alpha(part: &str) -> Option<f64> {
    match part.strip_suffix('%') {
        Some(pct) => Some(pct.parse::<f64>().ok()? / 100.0),
        None => part.parse::<f64>().ok(),
    }
}

/// WCAG relative luminance in `[0, 1]`.
pub fn relative_luminance((r, g, b): Rgb) -> f64 {
    let linear = |c: u8| {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// A color is light when its relative luminance exceeds 0.5.
pub fn is_light(rgb: Rgb) -> bool {
    relative_luminance(rgb) > 0.5
}

/// Hex variant of [`is_light`]; unparseable input counts as dark.
pub fn is_light_hex(hex: &str) -> bool {
    hex_to_rgb(hex).map(is_light).unwrap_or(false)
}

/// Black on light colors, white otherwise.
pub fn contrast_color(hex: &str) -> &'static str {
    if is_light_hex(hex) {
        BLACK
    } else {
        WHITE
    }
}

/// Multiplicative brightness: `clamp(round(c * factor))` per channel.
pub fn scale_brightness((r, g, b): Rgb, factor: f64) -> Rgb {
    let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
    (scale(r), scale(g), scale(b))
}

/// Additive brightness: `clamp(round(c + c * factor))` per channel.
///
/// Input that is not `#rrggbb` is returned unchanged.
pub fn shift_brightness(hex: &str, factor: f64) -> String {
    let Some((r, g, b)) = hex_to_rgb(hex) else {
        return hex.to_string();
    };
    let shift = |c: u8| {
        let c = c as f64;
        (c + c * factor).round().clamp(0.0, 255.0) as u8
    };
    rgb_to_hex((shift(r), shift(g), shift(b)))
}

/// Convert to HSL with every component in `[0, 1]`.
pub fn rgb_to_hsl((r, g, b): Rgb) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, 0.0, l);
    }
    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    };
    (h / 6.0, s, l)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_rgb_functions() {
        assert_eq!(normalize_css_color("rgb(255, 0, 0)").as_deref(), Some("#ff0000"));
        assert_eq!(normalize_css_color("rgba(16, 32, 48, 0.5)").as_deref(), Some("#102030"));
        assert_eq!(normalize_css_color("rgb(1 2 3 / 50%)").as_deref(), Some("#010203"));
        assert_eq!(normalize_css_color("RGB(10,20,30)").as_deref(), Some("#0a141e"));
    }

    #[test]
    fn normalizes_hex_forms() {
        assert_eq!(normalize_css_color("#FFF").as_deref(), Some("#ffffff"));
        assert_eq!(normalize_css_color("#AbCdEf").as_deref(), Some("#abcdef"));
        assert_eq!(normalize_css_color("#11223380").as_deref(), Some("#112233"));
        assert_eq!(normalize_css_color("#12345"), None);
    }

    #[test]
    fn drops_transparent_and_unknown() {
        assert_eq!(normalize_css_color("transparent"), None);
        assert_eq!(normalize_css_color("rgba(0, 0, 0, 0)"), None);
        assert_eq!(normalize_css_color("rgba(10, 10, 10, 0.05)"), None);
        assert_eq!(normalize_css_color("#11223300"), None);
        assert_eq!(normalize_css_color("hsl(0, 100%, 50%)"), None);
        assert_eq!(normalize_css_color("var(--x)"), None);
        assert_eq!(normalize_css_color(""), None);
    }

    #[test]
    fn contrast_follows_luminance() {
        assert!(relative_luminance((255, 255, 255)) > 0.99);
        assert_eq!(contrast_color("#ffffff"), BLACK);
        assert_eq!(contrast_color("#000000"), WHITE);
        let l = relative_luminance((0x33, 0x66, 0xcc));
        assert!(l < 0.5, "luminance was {}", l);
    }

    #[test]
    fn brightness_functions_differ() {
        assert_eq!(scale_brightness((200, 100, 20), 0.95), (190, 95, 19));
        assert_eq!(scale_brightness((200, 200, 200), 2.0), (255, 255, 255));
        assert_eq!(shift_brightness("#c86432", -0.2), "#a05028");
        assert_eq!(shift_brightness("#f0f0f0", 0.05), "#fcfcfc");
        assert_eq!(shift_brightness("not-a-color", 0.1), "not-a-color");
    }

    #[test]
    fn hsl_of_primaries() {
        let (h, s, l) = rgb_to_hsl((255, 0, 0));
        assert_eq!((h, s, l), (0.0, 1.0, 0.5));
        let (_, s, l) = rgb_to_hsl((128, 128, 128));
        assert_eq!(s, 0.0);
        assert!((l - 0.50196).abs() < 1e-4);
    }

    #[test]
    fn canonical_hex_check() {
        assert!(is_canonical_hex("#a0b1c2"));
        assert!(!is_canonical_hex("#A0B1C2"));
        assert!(!is_canonical_hex("a0b1c2"));
        assert_eq!(hex_to_rgb("#0a141e"), Some((10, 20, 30)));
    }
}
