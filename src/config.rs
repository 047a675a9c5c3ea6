use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use crate::compositor::CompositorOpts;
use crate::foundation::core::Fps;
use crate::foundation::error::{GreenkeyError, GreenkeyResult};
use crate::key::params::KeyingParams;
use crate::session::pump::{DEFAULT_REVEAL_AFTER, PumpOpts};

/// JSON-facing configuration for a keying run.
///
/// ```json
/// {
///   "keying": { "similarityThreshold": 0.4, "smoothnessWidth": 0.08, "cropFraction": 0.1 },
///   "session": { "fps": { "num": 30, "den": 1 }, "revealAfterMs": 4000 }
/// }
/// ```
///
/// Every field is optional; missing fields take their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyConfig {
    /// Keying parameters.
    #[serde(default)]
    pub keying: KeyingParams,
    /// Playback pacing.
    #[serde(default)]
    pub session: SessionConfig,
}

/// Playback pacing and threading.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SessionConfig {
    /// Clock rate used for realtime pacing and encoded output.
    #[serde(default)]
    pub fps: Fps,
    /// Reveal fallback delay; `null` disables it.
    #[serde(default = "default_reveal_after_ms")]
    pub reveal_after_ms: Option<u64>,
    /// Key rows in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_reveal_after_ms() -> Option<u64> {
    Some(DEFAULT_REVEAL_AFTER.as_millis() as u64)
}

fn default_parallel() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            reveal_after_ms: default_reveal_after_ms(),
            parallel: default_parallel(),
        }
    }
}

impl KeyConfig {
    /// Parse from a JSON string. The result is validated.
    pub fn from_json_str(s: &str) -> GreenkeyResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| GreenkeyError::validation(format!("parse keying config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse from a JSON file on disk. The result is validated.
    pub fn from_path(path: impl AsRef<Path>) -> GreenkeyResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            GreenkeyError::validation(format!("open keying config '{}': {e}", path.display()))
        })?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            GreenkeyError::validation(format!("parse keying config '{}': {e}", path.display()))
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check keying ranges and the frame rate.
    pub fn validate(&self) -> GreenkeyResult<()> {
        self.keying.validate()?;
        Fps::new(self.session.fps.num, self.session.fps.den)?;
        Ok(())
    }

    /// Compositor options derived from the session section.
    pub fn compositor_opts(&self) -> CompositorOpts {
        CompositorOpts {
            parallel: self.session.parallel,
        }
    }

    /// Pump options derived from the session section.
    pub fn pump_opts(&self) -> PumpOpts {
        PumpOpts {
            reveal_after: self.session.reveal_after_ms.map(Duration::from_millis),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
