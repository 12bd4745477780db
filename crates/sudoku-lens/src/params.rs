//! Pipeline configuration and its JSON form.

use crate::board::{AnnotationStyle, CleanerParams, LocatorParams, ThresholdParams};
use crate::core::GridOrder;
use crate::overlay::{LabelStyle, OverlayStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Everything [`crate::Pipeline`] needs besides its injected capabilities.
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub order: GridOrder,
    pub threshold: ThresholdParams,
    pub locator: LocatorParams,
    pub cleaner: CleanerParams,
    /// Draw the accepted boundary on the output frame.
    pub annotate: bool,
    pub annotation: AnnotationStyle,
    pub overlay: OverlayStyle,
    pub label: LabelStyle,
    /// Re-project the rectified board with the overlay added on top instead
    /// of the bare overlay.
    pub keep_board: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            order: GridOrder::default(),
            threshold: ThresholdParams::default(),
            locator: LocatorParams::default(),
            cleaner: CleanerParams::default(),
            annotate: true,
            annotation: AnnotationStyle::default(),
            overlay: OverlayStyle::default(),
            label: LabelStyle::default(),
            keep_board: true,
        }
    }
}

impl PipelineParams {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
