use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
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
// Chart roles
// ---------------------------------------------------------------------------

/// Fixed colour assignment for the diagnostic charts, so "actual" and
/// "predicted" look the same in every view.
#[derive(Debug, Clone, Copy)]
pub struct ChartPalette {
    pub actual: Color32,
    pub predicted: Color32,
    pub reference: Color32,
    pub marker: Color32,
    pub band: Color32,
}

impl Default for ChartPalette {
    fn default() -> Self {
        // Six evenly spaced hues; roles pick the red/green/blue/purple slots.
        let hues = generate_palette(6);
        ChartPalette {
            actual: hues[3],    // blue
            predicted: hues[2], // green
            reference: hues[0], // red
            marker: hues[4],    // purple
            band: hues[2].gamma_multiply(0.2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_hues() {
        let colors = generate_palette(6);
        assert_eq!(colors.len(), 6);
        for pair in colors.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert!(generate_palette(0).is_empty());
    }
}
