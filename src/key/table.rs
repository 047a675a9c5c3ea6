use crate::foundation::math::clamp_unit_to_u8;
use crate::key::params::{KeyMode, KeyingParams};

/// Classification of a single pixel against the green key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyed {
    /// Greenness at or below τ_s: pixel is left exactly as decoded.
    Keep,
    /// Soft edge: alpha is replaced by the carried value.
    Soft(u8),
    /// Greenness at or beyond τ_s + τ_w: alpha is zero, colour untouched.
    Clear,
}

/// How strongly green dominates red and blue, normalized by the 8-bit range.
///
/// Returns a value in `[-1, 1]`.
pub fn greenness(rgba: [u8; 4]) -> f32 {
    let max_rb = rgba[0].max(rgba[2]);
    (f32::from(rgba[1]) - f32::from(max_rb)) / 255.0
}

/// Classify an arbitrary greenness value with the soft ramp.
pub fn classify_greenness(greenness: f32, params: &KeyingParams) -> Keyed {
    let ts = params.similarity_threshold;
    let tw = params.smoothness_width;
    if greenness <= ts {
        return Keyed::Keep;
    }
    let diff = greenness - ts;
    if diff < tw {
        Keyed::Soft(clamp_unit_to_u8(255.0 * (1.0 - diff / tw)))
    } else {
        Keyed::Clear
    }
}

/// Per-parameter-set lookup table for the soft ramp.
///
/// Greenness only depends on the integer difference `g - max(r, b)`, so the ramp is evaluated once
/// for each of the 256 non-negative differences. Negative differences never pass τ_s (which is
/// non-negative) and are always [`Keyed::Keep`].
#[derive(Clone, Debug)]
pub struct KeyTable {
    params: KeyingParams,
    soft: [Keyed; 256],
}

impl KeyTable {
    /// Build the table for validated parameters.
    pub fn new(params: KeyingParams) -> Self {
        let mut soft = [Keyed::Keep; 256];
        for (d, slot) in soft.iter_mut().enumerate() {
            *slot = classify_greenness(d as f32 / 255.0, &params);
        }
        Self { params, soft }
    }

    /// Parameters the table was built from.
    pub fn params(&self) -> &KeyingParams {
        &self.params
    }

    /// Classify one straight-alpha RGBA8 pixel.
    #[inline]
    pub fn classify(&self, rgba: [u8; 4]) -> Keyed {
        let [r, g, b, _] = rgba;
        match self.params.mode {
            KeyMode::Soft => {
                let max_rb = r.max(b);
                if g <= max_rb {
                    Keyed::Keep
                } else {
                    self.soft[usize::from(g - max_rb)]
                }
            }
            KeyMode::Ratio { min_green, ratio } => {
                let gf = f32::from(g);
                if g > min_green && gf > f32::from(r) * ratio && gf > f32::from(b) * ratio {
                    Keyed::Clear
                } else {
                    Keyed::Keep
                }
            }
        }
    }

    /// Key one pixel, returning the output RGBA8 value.
    #[inline]
    pub fn key_pixel(&self, rgba: [u8; 4]) -> [u8; 4] {
        match self.classify(rgba) {
            Keyed::Keep => rgba,
            Keyed::Soft(alpha) => {
                let [r, mut g, b, _] = rgba;
                if self.params.spill_suppression {
                    g = g.min(r.max(b));
                }
                [r, g, b, alpha]
            }
            Keyed::Clear => [rgba[0], rgba[1], rgba[2], 0],
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/key/table.rs"]
mod tests;
