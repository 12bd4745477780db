use serde::{Deserialize, Serialize};

/// How the photo is split into board ink and background.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Pixel is ink when darker than its local box mean minus `offset`.
    AdaptiveMean,
    /// One global Otsu level for the whole frame.
    Otsu,
}

/// Parameters for [`crate::binarize`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Gaussian pre-blur sigma; `0` disables blurring.
    pub blur_sigma: f32,
    pub mode: ThresholdMode,
    /// Half-size of the local mean window (window is `2r + 1` pixels wide).
    pub block_radius: u32,
    /// Intensity margin below the local mean required to count as ink.
    pub offset: i16,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            mode: ThresholdMode::AdaptiveMean,
            block_radius: 5,
            offset: 2,
        }
    }
}

/// Parameters for [`crate::locate_board`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorParams {
    /// Polygon approximation tolerance as a fraction of the contour perimeter.
    pub approx_epsilon_frac: f64,
    /// Skip contours enclosing less than this fraction of the image area.
    pub min_area_frac: f64,
    /// Examine at most this many candidates, largest first.
    pub max_candidates: Option<usize>,
}

impl Default for LocatorParams {
    fn default() -> Self {
        Self {
            approx_epsilon_frac: 0.01,
            min_area_frac: 0.0,
            max_candidates: None,
        }
    }
}

/// Diagnostic drawing of the accepted boundary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub outline_color: [u8; 3],
    pub outline_thickness: u32,
    pub corner_color: [u8; 3],
    pub corner_radius: i32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            outline_color: [255, 0, 0],
            outline_thickness: 3,
            corner_color: [0, 0, 255],
            corner_radius: 6,
        }
    }
}

/// Parameters for [`crate::OtsuCellCleaner`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanerParams {
    /// Fraction of the cell side trimmed from every edge to drop grid lines.
    pub margin_frac: f32,
    /// Cells whose intensity range is below this are blank.
    pub min_contrast: u8,
    /// Minimal ink fraction (after border clearing) for a cell to hold a symbol.
    pub min_fill: f32,
    /// Padding around the symbol bounding box, as a fraction of its longer side.
    pub pad_frac: f32,
    /// Side of the square image handed to the classifier.
    pub output_size: u32,
}

impl Default for CleanerParams {
    fn default() -> Self {
        Self {
            margin_frac: 0.1,
            min_contrast: 40,
            min_fill: 0.02,
            pad_frac: 0.15,
            output_size: 50,
        }
    }
}
