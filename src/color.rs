use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use subject_browser::data::audiogram::Ear;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize, saturation: f32, lightness: f32) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 300.0;
            let hsl = Hsl::new(hue, saturation, lightness);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Hearing-loss severity bands drawn behind audiograms
// ---------------------------------------------------------------------------

/// Degree-of-loss band in dB HL, `lower` exclusive.
#[derive(Debug, Clone)]
pub struct SeverityBand {
    pub name: &'static str,
    pub lower: f64,
    pub upper: f64,
    pub fill: Color32,
}

const BANDS: [(&str, f64, f64); 6] = [
    ("normal", -10.0, 25.0),
    ("mild", 25.0, 40.0),
    ("moderate", 40.0, 55.0),
    ("moderately-severe", 55.0, 70.0),
    ("severe", 70.0, 90.0),
    ("profound", 90.0, 120.0),
];

/// Bands from normal to profound, each with a translucent fill.
pub fn severity_bands() -> Vec<SeverityBand> {
    let palette = generate_palette(BANDS.len(), 0.6, 0.6);
    BANDS
        .iter()
        .zip(palette)
        .map(|(&(name, lower, upper), c)| SeverityBand {
            name,
            lower,
            upper,
            fill: Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), 48),
        })
        .collect()
}

/// Audiological convention: red for right, blue for left.
pub fn ear_color(ear: Ear) -> Color32 {
    match ear {
        Ear::Right => Color32::from_rgb(220, 40, 40),
        Ear::Left => Color32::from_rgb(40, 80, 220),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_tile_the_audiometer_range() {
        let bands = severity_bands();
        assert_eq!(bands.len(), 6);
        assert_eq!(bands[0].lower, -10.0);
        assert_eq!(bands[5].upper, 120.0);
        assert!(bands.windows(2).all(|w| w[0].upper == w[1].lower));
    }

    #[test]
    fn palette_colours_are_distinct() {
        let colors = generate_palette(6, 0.6, 0.6);
        for (i, a) in colors.iter().enumerate() {
            assert!(colors[i + 1..].iter().all(|b| b != a));
        }
        assert!(generate_palette(0, 0.5, 0.5).is_empty());
    }
}
