use std::collections::BTreeMap;

use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Muted base palette used for the first categories of every chart.
pub const PROFESSIONAL_COLORS: [&str; 10] = [
    "#003f5c", "#2f4b7c", "#665191", "#a05195", "#d45087", "#f95d6a", "#ff7c43", "#ffa600",
    "#90be6d", "#43aa8b",
];

const FALLBACK_COLOR: &str = "#8a8f9c";

/// Generates `n` colours: the professional palette first, then evenly
/// spaced hues for anything beyond it.
pub fn generate_palette(n: usize) -> Vec<String> {
    let extra = n.saturating_sub(PROFESSIONAL_COLORS.len());
    PROFESSIONAL_COLORS
        .iter()
        .take(n)
        .map(|c| c.to_string())
        .chain((0..extra).map(|i| {
            let hue = (i as f32 / extra as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.55, 0.55);
            let rgb: Srgb = hsl.into_color();
            format!(
                "#{:02x}{:02x}{:02x}",
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        }))
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: category label → hex colour
// ---------------------------------------------------------------------------

/// Maps the labels of one axis to distinct colours. Built from the labels of
/// the full dataset so a category keeps its colour while filters change.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, String>,
}

impl ColorMap {
    pub fn new<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let labels: Vec<&str> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(label, color)| (label.to_string(), color))
            .collect();
        ColorMap { mapping }
    }

    /// Look up the colour for a label.
    pub fn color_for(&self, label: &str) -> &str {
        self.mapping
            .get(label)
            .map(String::as_str)
            .unwrap_or(FALLBACK_COLOR)
    }
}
