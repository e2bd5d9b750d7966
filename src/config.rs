use std::env;
use std::time::Duration;

pub const DEFAULT_FAL_BASE_URL: &str = "https://fal.run";
pub const DEFAULT_TEXT_MODEL: &str = "fal-ai/flux-2-pro";
pub const DEFAULT_EDIT_MODEL: &str = "fal-ai/flux-2-pro/edit";

/// Connection and request parameters for the Fal.ai generation API.
#[derive(Debug, Clone)]
pub struct FalConfig {
    /// `FAL_KEY`; the server lets each request override it.
    pub api_key: Option<String>,
    pub base_url: String,
    /// Model used when the request carries only a prompt.
    pub text_model: String,
    /// Model used when the request carries a reference image.
    pub edit_model: String,
    pub aspect_ratio: String,
    pub output_format: String,
    pub safety_tolerance: String,
    pub timeout: Duration,
}

impl Default for FalConfig {
    fn default() -> Self {
        FalConfig {
            api_key: None,
            base_url: DEFAULT_FAL_BASE_URL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            edit_model: DEFAULT_EDIT_MODEL.to_string(),
            aspect_ratio: "3:4".to_string(),
            output_format: "jpeg".to_string(),
            safety_tolerance: "2".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl FalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let api_key = non_empty_env("FAL_KEY").or_else(|| non_empty_env("FAL_API_KEY"));
        let base_url = non_empty_env("FAL_API_BASE")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_FAL_BASE_URL.to_string());

        FalConfig {
            api_key,
            base_url,
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_models(mut self, text_model: impl Into<String>, edit_model: impl Into<String>) -> Self {
        self.text_model = text_model.into();
        self.edit_model = edit_model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Knobs of the batch loop: how many attempts a batch may spend and how they are issued.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    /// Attempt budget multiplier: `max_attempts = ceil(target * factor)`.
    pub over_provision_factor: f64,
    /// Generation calls issued together in one wave. 1 keeps the batch strictly sequential.
    pub max_in_flight: usize,
    /// Pause after a wave that hit a transient failure.
    pub transient_backoff: Duration,
    /// Style keyword folded into every prompt of the batch.
    pub style_tag: Option<String>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings {
            over_provision_factor: 3.0,
            max_in_flight: 1,
            transient_backoff: Duration::from_secs(1),
            style_tag: None,
        }
    }
}

impl BatchSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `JEWELBENCH_OVER_PROVISION` and `JEWELBENCH_MAX_IN_FLIGHT`, keeping defaults
    /// for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let over_provision_factor = env::var("JEWELBENCH_OVER_PROVISION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.over_provision_factor);
        let max_in_flight = env::var("JEWELBENCH_MAX_IN_FLIGHT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_in_flight);

        BatchSettings {
            over_provision_factor,
            max_in_flight,
            ..defaults
        }
    }

    pub fn with_over_provision_factor(mut self, factor: f64) -> Self {
        self.over_provision_factor = factor;
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    pub fn with_transient_backoff(mut self, backoff: Duration) -> Self {
        self.transient_backoff = backoff;
        self
    }

    pub fn with_style_tag(mut self, style_tag: impl Into<String>) -> Self {
        self.style_tag = Some(style_tag.into());
        self
    }

    /// Budget for a batch of `target` images. Never below `target`.
    pub fn max_attempts(&self, target: usize) -> usize {
        let factor = if self.over_provision_factor.is_finite() {
            self.over_provision_factor.max(1.0)
        } else {
            1.0
        };
        let raw = target as f64 * factor;
        // 50 * 1.1 is 55.00000000000001 in f64
        let budget = if (raw - raw.round()).abs() < 1e-9 {
            raw.round()
        } else {
            raw.ceil()
        };
        budget as usize
    }

    /// Calls per wave, at least one.
    pub fn wave_size(&self) -> usize {
        self.max_in_flight.max(1)
    }
}

/// Top-level configuration for the server binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Listening port; the server falls back to 8080.
    pub port: Option<u16>,
    pub fal: FalConfig,
    pub batch: BatchSettings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: None,
            fal: FalConfig::default(),
            batch: BatchSettings::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load everything from the environment (`PORT`, `FAL_*`, `JEWELBENCH_*`).
    pub fn from_env() -> Self {
        let port = env::var("PORT").ok().and_then(|port| port.parse().ok());

        Config {
            port,
            fal: FalConfig::from_env(),
            batch: BatchSettings::from_env(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_fal(mut self, config: FalConfig) -> Self {
        self.fal = config;
        self
    }

    pub fn with_batch(mut self, settings: BatchSettings) -> Self {
        self.batch = settings;
        self
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
