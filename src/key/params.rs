use crate::foundation::error::{GreenkeyError, GreenkeyResult};

/// Default similarity threshold τ_s.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.4;
/// Default smoothness width τ_w.
pub const DEFAULT_SMOOTHNESS_WIDTH: f32 = 0.08;
/// Default minimum green level for [`KeyMode::Ratio`].
pub const DEFAULT_RATIO_MIN_GREEN: u8 = 100;
/// Default dominance factor for [`KeyMode::Ratio`].
pub const DEFAULT_RATIO: f32 = 1.4;

/// How pixels are classified against the green key.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KeyMode {
    /// Greenness ramp: opaque up to τ_s, linear fade over τ_w, transparent beyond.
    #[default]
    Soft,
    /// Binary key: a pixel is cleared when `g > min_green` and green exceeds both red and blue by
    /// `ratio`. Everything else is untouched.
    Ratio {
        /// Minimum green level (exclusive).
        #[serde(default = "default_ratio_min_green")]
        min_green: u8,
        /// Required dominance of green over red and blue.
        #[serde(default = "default_ratio")]
        ratio: f32,
    },
}

fn default_ratio_min_green() -> u8 {
    DEFAULT_RATIO_MIN_GREEN
}

fn default_ratio() -> f32 {
    DEFAULT_RATIO
}

fn default_similarity_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_smoothness_width() -> f32 {
    DEFAULT_SMOOTHNESS_WIDTH
}

/// Immutable keying configuration.
///
/// JSON keys are camelCase (`similarityThreshold`, `smoothnessWidth`, `cropFraction`,
/// `spillSuppression`, `mode`); missing keys take their defaults.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyingParams {
    /// τ_s in `[0, 1]`: greenness at which suppression begins.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// τ_w in `(0, 1]`: greenness range over which alpha fades to zero.
    #[serde(default = "default_smoothness_width")]
    pub smoothness_width: f32,
    /// Force green down to `max(r, b)` on soft-edge pixels.
    #[serde(default)]
    pub spill_suppression: bool,
    /// Fraction of the source's right edge to trim before keying, in `[0, 1)`.
    #[serde(default)]
    pub crop_fraction: f32,
    /// Pixel classification rule.
    #[serde(default)]
    pub mode: KeyMode,
}

impl Default for KeyingParams {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            smoothness_width: DEFAULT_SMOOTHNESS_WIDTH,
            spill_suppression: false,
            crop_fraction: 0.0,
            mode: KeyMode::Soft,
        }
    }
}

impl KeyingParams {
    /// Soft-key parameters with the given thresholds and defaults elsewhere.
    pub fn soft(similarity_threshold: f32, smoothness_width: f32) -> GreenkeyResult<Self> {
        let params = Self {
            similarity_threshold,
            smoothness_width,
            ..Self::default()
        };
        params.validate()?;
        Ok(params)
    }

    /// Return a copy with spill suppression toggled.
    pub fn with_spill_suppression(mut self, on: bool) -> Self {
        self.spill_suppression = on;
        self
    }

    /// Return a copy with a right-edge crop fraction.
    pub fn with_crop_fraction(mut self, fraction: f32) -> Self {
        self.crop_fraction = fraction;
        self
    }

    /// Return a copy using a different classification mode.
    pub fn with_mode(mut self, mode: KeyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Greenness at and beyond which pixels are fully transparent (τ_s + τ_w).
    pub fn clear_threshold(&self) -> f32 {
        self.similarity_threshold + self.smoothness_width
    }

    /// Check ranges; every constructor path into the compositor goes through this.
    pub fn validate(&self) -> GreenkeyResult<()> {
        let ts = self.similarity_threshold;
        if !ts.is_finite() || !(0.0..=1.0).contains(&ts) {
            return Err(GreenkeyError::validation(
                "similarityThreshold must be finite and within [0, 1]",
            ));
        }
        let tw = self.smoothness_width;
        if !tw.is_finite() || tw <= 0.0 || tw > 1.0 {
            return Err(GreenkeyError::validation(
                "smoothnessWidth must be finite and within (0, 1]",
            ));
        }
        let crop = self.crop_fraction;
        if !crop.is_finite() || !(0.0..1.0).contains(&crop) {
            return Err(GreenkeyError::validation(
                "cropFraction must be finite and within [0, 1)",
            ));
        }
        if let KeyMode::Ratio { ratio, .. } = self.mode
            && (!ratio.is_finite() || ratio < 1.0)
        {
            return Err(GreenkeyError::validation(
                "ratio key dominance must be finite and >= 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/key/params.rs"]
mod tests;
