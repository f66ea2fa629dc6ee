//! Replay configuration
//!
//! Every field has a default matching the reference ODAS setup, so a config
//! file only needs the values that differ:
//!
//! ```yaml
//! host: 192.168.1.20
//! loop_forever: true
//! pacing: fixed
//! ports:
//!   tracking: 9100
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::scheduler::PlaybackOptions;
use crate::tokenizer::TokenizerMode;
use crate::types::{HopTiming, LoopPolicy, PacingMode, RolePorts};
use crate::{ReplayError, Result};

/// Hostname Docker Desktop maps to the host machine
pub const DOCKER_HOST_ALIAS: &str = "host.docker.internal";

/// Used when no host is configured and the Docker alias does not resolve
pub const FALLBACK_HOST: &str = "localhost";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplayConfig {
    /// Viz server host; resolved automatically when unset
    pub host: Option<String>,

    /// SSL output (potential sources)
    pub potential_path: PathBuf,

    /// SST output (tracked sources)
    pub tracking_path: PathBuf,

    pub ports: RolePorts,

    /// Samples per analysis hop
    pub hop_size: u32,

    /// Sample rate of the analysed audio, in Hz
    pub sample_rate: u32,

    pub loop_forever: bool,

    /// Wait between sessions when looping, in milliseconds
    pub settle_interval_ms: u64,

    pub progress_every: usize,

    pub pacing: PacingMode,

    pub tokenizer: TokenizerMode,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            host: None,
            potential_path: PathBuf::from(Self::DEFAULT_POTENTIAL_PATH),
            tracking_path: PathBuf::from(Self::DEFAULT_TRACKING_PATH),
            ports: RolePorts::default(),
            hop_size: HopTiming::DEFAULT_HOP_SIZE,
            sample_rate: HopTiming::DEFAULT_SAMPLE_RATE,
            loop_forever: false,
            settle_interval_ms: 2000,
            progress_every: 100,
            pacing: PacingMode::default(),
            tokenizer: TokenizerMode::default(),
        }
    }
}

impl ReplayConfig {
    pub const DEFAULT_POTENTIAL_PATH: &'static str = "/odas/test_data/ssl_output.json";
    pub const DEFAULT_TRACKING_PATH: &'static str = "/odas/test_data/sst_output.json";

    /// Load and validate a YAML config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml =
            std::fs::read_to_string(path).map_err(|e| ReplayError::file_error(path, e))?;
        let config = Self::from_yaml_str(&yaml, path)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML; `origin` is only used in error messages.
    pub fn from_yaml_str(yaml: &str, origin: impl Into<PathBuf>) -> Result<Self> {
        let config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(yaml)
                .map_err(|source| ReplayError::ConfigParse { path: origin.into(), source })?
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot produce a playable session.
    pub fn validate(&self) -> Result<()> {
        self.hop_timing()?;
        if self.progress_every == 0 {
            return Err(ReplayError::invalid_config("progress_every must be positive"));
        }
        if self.ports.tracking == self.ports.potential {
            return Err(ReplayError::invalid_config(format!(
                "tracking and potential share port {}",
                self.ports.tracking
            )));
        }
        Ok(())
    }

    pub fn hop_timing(&self) -> Result<HopTiming> {
        HopTiming::new(self.hop_size, self.sample_rate)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_interval_ms)
    }

    pub fn playback_options(&self) -> PlaybackOptions {
        PlaybackOptions {
            loop_policy: LoopPolicy::from_flag(self.loop_forever),
            settle: self.settle_interval(),
            progress_every: self.progress_every,
            pacing: self.pacing,
        }
    }
}

/// Pick the viz server host.
///
/// A configured host wins. Otherwise the Docker host alias is resolved, with
/// [`FALLBACK_HOST`] used if that fails.
pub async fn resolve_host(configured: Option<&str>) -> String {
    if let Some(host) = configured {
        return host.to_string();
    }

    match tokio::net::lookup_host((DOCKER_HOST_ALIAS, 0)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => {
                debug!("Resolved {} to {}", DOCKER_HOST_ALIAS, addr.ip());
                addr.ip().to_string()
            }
            None => FALLBACK_HOST.to_string(),
        },
        Err(e) => {
            debug!("Could not resolve {}: {}; using {}", DOCKER_HOST_ALIAS, e, FALLBACK_HOST);
            FALLBACK_HOST.to_string()
        }
    }
}
