use serde::{Deserialize, Serialize};

/// Appearance of solved symbols on the overlay canvas.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    pub color: [u8; 3],
    /// Glyph height as a fraction of the shorter cell side.
    pub height_frac: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0],
            height_frac: 0.6,
        }
    }
}

/// Screen-fixed text stamped after re-projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub enabled: bool,
    /// Top-left of the label in output pixels.
    pub position: [i32; 2],
    pub color: [u8; 3],
    /// Text height in pixels.
    pub height: f32,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            position: [40, 40],
            color: [0, 0, 255],
            height: 24.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_defaults_to_top_left_stamp() {
        let label: LabelStyle = serde_json::from_str(r#"{ "enabled": false }"#).unwrap();
        assert!(!label.enabled);
        assert_eq!(label.position, [40, 40]);

        let style: OverlayStyle = serde_json::from_str("{}").unwrap();
        assert_eq!(style, OverlayStyle::default());
    }
}
