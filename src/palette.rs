//! Pixel palette extraction.
//!
//! A screenshot is decoded, downscaled, and bucketed into a 15-bit color
//! histogram. Each of the six [`SwatchRole`]s then picks the bucket whose
//! saturation and lightness sit closest to the role's target, weighted by how
//! many pixels support it.

use crate::color::{rgb_to_hex, rgb_to_hsl, Rgb};
use crate::{Error, Result};
use image::imageops::FilterType;
use image::GenericImageView;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Longest side, in pixels, the image is reduced to before bucketing.
const MAX_DIMENSION: u32 = 200;
/// Significant bits kept per channel.
const SIGBITS: u32 = 5;
const RSHIFT: u32 = 8 - SIGBITS;

const WEIGHT_SATURATION: f64 = 3.0;
const WEIGHT_LUMA: f64 = 6.5;
const WEIGHT_POPULATION: f64 = 0.5;

/// The six named swatch slots, in enumeration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SwatchRole {
    Vibrant,
    DarkVibrant,
    LightVibrant,
    Muted,
    DarkMuted,
    LightMuted,
}

impl SwatchRole {
    pub const ALL: [SwatchRole; 6] = [
        SwatchRole::Vibrant,
        SwatchRole::DarkVibrant,
        SwatchRole::LightVibrant,
        SwatchRole::Muted,
        SwatchRole::DarkMuted,
        SwatchRole::LightMuted,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SwatchRole::Vibrant => "Vibrant",
            SwatchRole::DarkVibrant => "DarkVibrant",
            SwatchRole::LightVibrant => "LightVibrant",
            SwatchRole::Muted => "Muted",
            SwatchRole::DarkMuted => "DarkMuted",
            SwatchRole::LightMuted => "LightMuted",
        }
    }

    fn target(self) -> RoleTarget {
        let (luma, saturation) = match self {
            SwatchRole::Vibrant => (NORMAL_LUMA, VIBRANT_SATURATION),
            SwatchRole::LightVibrant => (LIGHT_LUMA, VIBRANT_SATURATION),
            SwatchRole::DarkVibrant => (DARK_LUMA, VIBRANT_SATURATION),
            SwatchRole::Muted => (NORMAL_LUMA, MUTED_SATURATION),
            SwatchRole::LightMuted => (LIGHT_LUMA, MUTED_SATURATION),
            SwatchRole::DarkMuted => (DARK_LUMA, MUTED_SATURATION),
        };
        RoleTarget { luma, saturation }
    }
}

/// `(min, target, max)`
type Band = (f64, f64, f64);

const DARK_LUMA: Band = (0.0, 0.26, 0.45);
const NORMAL_LUMA: Band = (0.3, 0.5, 0.7);
const LIGHT_LUMA: Band = (0.55, 0.74, 1.0);
const VIBRANT_SATURATION: Band = (0.35, 1.0, 1.0);
const MUTED_SATURATION: Band = (0.0, 0.3, 0.4);

struct RoleTarget {
    luma: Band,
    saturation: Band,
}

impl RoleTarget {
    fn accepts(&self, s: f64, l: f64) -> bool {
        (self.saturation.0..=self.saturation.2).contains(&s) && (self.luma.0..=self.luma.2).contains(&l)
    }

    fn score(&self, s: f64, l: f64, population: u32, max_population: u32) -> f64 {
        let invert_diff = |value: f64, target: f64| 1.0 - (value - target).abs();
        let population = if max_population > 0 {
            population as f64 / max_population as f64
        } else {
            0.0
        };
        let weighted = invert_diff(s, self.saturation.1) * WEIGHT_SATURATION
            + invert_diff(l, self.luma.1) * WEIGHT_LUMA
            + population * WEIGHT_POPULATION;
        weighted / (WEIGHT_SATURATION + WEIGHT_LUMA + WEIGHT_POPULATION)
    }
}

/// One quantized color cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSwatch {
    pub hex: String,
    pub rgb: Rgb,
    pub hsl: (f64, f64, f64),
    pub population: u32,
}

impl ColorSwatch {
    pub fn new(rgb: Rgb, population: u32) -> Self {
        Self {
            hex: rgb_to_hex(rgb),
            rgb,
            hsl: rgb_to_hsl(rgb),
            population,
        }
    }
}

/// Six swatch slots; any subset may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    #[serde(rename = "Vibrant")]
    pub vibrant: Option<ColorSwatch>,
    #[serde(rename = "DarkVibrant")]
    pub dark_vibrant: Option<ColorSwatch>,
    #[serde(rename = "LightVibrant")]
    pub light_vibrant: Option<ColorSwatch>,
    #[serde(rename = "Muted")]
    pub muted: Option<ColorSwatch>,
    #[serde(rename = "DarkMuted")]
    pub dark_muted: Option<ColorSwatch>,
    #[serde(rename = "LightMuted")]
    pub light_muted: Option<ColorSwatch>,
}

impl Palette {
    pub fn get(&self, role: SwatchRole) -> Option<&ColorSwatch> {
        self.slot(role).as_ref()
    }

    pub fn set(&mut self, role: SwatchRole, swatch: Option<ColorSwatch>) {
        *self.slot_mut(role) = swatch;
    }

    /// Populated slots in enumeration order.
    pub fn entries(&self) -> impl Iterator<Item = (SwatchRole, &ColorSwatch)> + '_ {
        SwatchRole::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|s| (role, s)))
    }

    pub fn populated(&self) -> usize {
        self.entries().count()
    }

    fn slot(&self, role: SwatchRole) -> &Option<ColorSwatch> {
        match role {
            SwatchRole::Vibrant => &self.vibrant,
            SwatchRole::DarkVibrant => &self.dark_vibrant,
            SwatchRole::LightVibrant => &self.light_vibrant,
            SwatchRole::Muted => &self.muted,
            SwatchRole::DarkMuted => &self.dark_muted,
            SwatchRole::LightMuted => &self.light_muted,
        }
    }

    fn slot_mut(&mut self, role: SwatchRole) -> &mut Option<ColorSwatch> {
        match role {
            SwatchRole::Vibrant => &mut self.vibrant,
            SwatchRole::DarkVibrant => &mut self.dark_vibrant,
            SwatchRole::LightVibrant => &mut self.light_vibrant,
            SwatchRole::Muted => &mut self.muted,
            SwatchRole::DarkMuted => &mut self.dark_muted,
            SwatchRole::LightMuted => &mut self.light_muted,
        }
    }
}

/// A populated palette slot, ranked by population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DominantColorEntry {
    pub name: SwatchRole,
    pub hex: String,
    pub rgb: Rgb,
    pub population: u32,
}

/// `{name, hex}` projection of a [`DominantColorEntry`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedHex {
    pub name: SwatchRole,
    pub hex: String,
}

/// Display-oriented view of a palette: hex values only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplePalette {
    pub colors: BTreeMap<SwatchRole, String>,
    pub dominant_colors: Vec<NamedHex>,
}

#[derive(Clone, Copy, Default)]
struct Bucket {
    sum: [u64; 3],
    count: u32,
}

impl Bucket {
    fn color(&self) -> Rgb {
        let n = self.count.max(1) as u64;
        (
            (self.sum[0] / n) as u8,
            (self.sum[1] / n) as u8,
            (self.sum[2] / n) as u8,
        )
    }
}

/// Decode `bytes` and derive the six-role palette.
pub fn extract_palette(bytes: &[u8]) -> Result<Palette> {
    let img = image::load_from_memory(bytes).map_err(|e| Error::DecodeError(e.to_string()))?;

    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(Error::DecodeError("Image has no pixels".into()));
    }
    let img = if width.max(height) > MAX_DIMENSION {
        img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Nearest)
    } else {
        img
    };
    let rgba = img.to_rgba8();

    let mut histogram = vec![Bucket::default(); 1 << (3 * SIGBITS)];
    let mut counted = 0u32;
    for px in rgba.pixels() {
        let [r, g, b, a] = px.0;
        if a < 125 || (r > 250 && g > 250 && b > 250) {
            continue;
        }
        let index = ((r as usize >> RSHIFT) << (2 * SIGBITS))
            | ((g as usize >> RSHIFT) << SIGBITS)
            | (b as usize >> RSHIFT);
        let bucket = &mut histogram[index];
        bucket.sum[0] += r as u64;
        bucket.sum[1] += g as u64;
        bucket.sum[2] += b as u64;
        bucket.count += 1;
        counted += 1;
    }

    let min_population = (counted / 1000).max(1);
    let candidates: Vec<(usize, Rgb, (f64, f64, f64), u32)> = histogram
        .iter()
        .enumerate()
        .filter(|(_, b)| b.count >= min_population)
        .map(|(i, b)| {
            let rgb = b.color();
            (i, rgb, rgb_to_hsl(rgb), b.count)
        })
        .collect();
    let max_population = candidates.iter().map(|c| c.3).max().unwrap_or(0);
    debug!(
        "palette: {} counted pixels, {} eligible buckets",
        counted,
        candidates.len()
    );

    let mut palette = Palette::default();
    let mut taken: Vec<usize> = Vec::new();
    for role in SwatchRole::ALL {
        let target = role.target();
        let mut best: Option<(f64, usize, Rgb, u32)> = None;
        for &(index, rgb, (_, s, l), population) in &candidates {
            if taken.contains(&index) || !target.accepts(s, l) {
                continue;
            }
            let score = target.score(s, l, population, max_population);
            if best.map_or(true, |(best_score, ..)| score > best_score) {
                best = Some((score, index, rgb, population));
            }
        }
        if let Some((_, index, rgb, population)) = best {
            taken.push(index);
            palette.set(role, Some(ColorSwatch::new(rgb, population)));
        }
    }

    Ok(palette)
}

/// Populated roles ordered by population, largest first; ties keep role order.
pub fn rank_dominant_colors(palette: &Palette) -> Vec<DominantColorEntry> {
    let mut entries: Vec<DominantColorEntry> = palette
        .entries()
        .filter(|(_, s)| s.population > 0)
        .map(|(role, s)| DominantColorEntry {
            name: role,
            hex: s.hex.clone(),
            rgb: s.rgb,
            population: s.population,
        })
        .collect();
    entries.sort_by(|a, b| b.population.cmp(&a.population));
    entries
}

pub fn simplify(palette: &Palette) -> SimplePalette {
    SimplePalette {
        colors: palette
            .entries()
            .map(|(role, s)| (role, s.hex.clone()))
            .collect(),
        dominant_colors: rank_dominant_colors(palette)
            .into_iter()
            .map(|e| NamedHex {
                name: e.name,
                hex: e.hex,
            })
            .collect(),
    }
}

/// Palette plus its population ranking, as reported by the palette endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteReport {
    pub palette: Palette,
    pub dominant_colors: Vec<DominantColorEntry>,
}

pub fn extract_color_palette(bytes: &[u8]) -> Result<PaletteReport> {
    let palette = extract_palette(bytes)?;
    let dominant_colors = rank_dominant_colors(&palette);
    Ok(PaletteReport {
        palette,
        dominant_colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Rgb as Px};
    use std::io::Cursor;

    fn png(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 3]) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| Px(f(x, y)));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    fn swatch(hex: &str, population: u32) -> ColorSwatch {
        ColorSwatch::new(crate::color::hex_to_rgb(hex).unwrap(), population)
    }

    #[test]
    fn rejects_garbage_bytes() {
        let err = extract_palette(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::DecodeError(_)));
    }

    #[test]
    fn picks_vibrant_and_light_muted() {
        // left half saturated blue, right half pale grey-blue
        let bytes = png(40, 20, |x, _| if x < 20 { [0x33, 0x66, 0xcc] } else { [0xdd, 0xe0, 0xe8] });
        let palette = extract_palette(&bytes).unwrap();

        let vibrant = palette.vibrant.as_ref().expect("vibrant swatch");
        assert_eq!(vibrant.population, 400);
        assert_eq!(vibrant.hex, "#3366cc");
        let light = palette.light_muted.as_ref().expect("light muted swatch");
        assert_eq!(light.hex, "#dde0e8");
        assert!(palette.populated() <= 6);
    }

    #[test]
    fn same_bytes_same_palette() {
        let bytes = png(300, 120, |x, y| [(x % 256) as u8, (y * 2 % 256) as u8, ((x + y) % 256) as u8]);
        let a = extract_palette(&bytes).unwrap();
        let b = extract_palette(&bytes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn white_image_has_no_swatches() {
        let bytes = png(10, 10, |_, _| [255, 255, 255]);
        let palette = extract_palette(&bytes).unwrap();
        assert_eq!(palette.populated(), 0);
        let json = serde_json::to_value(&palette).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 6);
        assert!(json["Vibrant"].is_null());
    }

    #[test]
    fn ranking_is_stable_by_population() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::Muted, Some(swatch("#808080", 10)));
        palette.set(SwatchRole::Vibrant, Some(swatch("#3366cc", 10)));
        palette.set(SwatchRole::DarkMuted, Some(swatch("#202020", 50)));
        let ranked = rank_dominant_colors(&palette);
        let names: Vec<_> = ranked.iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec![SwatchRole::DarkMuted, SwatchRole::Vibrant, SwatchRole::Muted]
        );
    }

    #[test]
    fn simplify_keeps_hex_only() {
        let mut palette = Palette::default();
        palette.set(SwatchRole::LightMuted, Some(swatch("#eeeeee", 3)));
        palette.set(SwatchRole::Vibrant, Some(swatch("#ff0000", 7)));
        let simple = simplify(&palette);
        assert_eq!(simple.colors.len(), 2);
        assert_eq!(simple.colors[&SwatchRole::Vibrant], "#ff0000");
        assert_eq!(simple.dominant_colors[0].name, SwatchRole::Vibrant);
        let json = serde_json::to_value(&simple).unwrap();
        assert_eq!(json["colors"]["LightMuted"], "#eeeeee");
        assert_eq!(json["dominantColors"][1]["hex"], "#eeeeee");
    }
}
