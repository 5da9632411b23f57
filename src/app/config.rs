//! Configuration Management

use crate::intent::classifier::DEFAULT_PREVIEW_PATTERNS;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Rolling buffer capacities
    pub buffers: BufferConfig,
    /// Hover dwell settings
    pub hover: HoverConfig,
    /// Speculative preload settings
    pub preload: PreloadConfig,
    /// Cognitive-load estimation settings
    pub load: LoadConfig,
    /// Form-error tracking settings
    pub forms: FormConfig,
    /// Target patterns recognized as data previews
    #[serde(default)]
    pub patterns: PatternConfig,
}

/// Rolling buffer capacities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Mouse ring buffer capacity
    pub mouse_capacity: usize,
    /// Typing ring buffer capacity
    pub typing_capacity: usize,
    /// Completed-hover history capacity
    pub hover_history_capacity: usize,
    /// Intention log cap
    pub intention_cap: usize,
}

/// Hover dwell settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoverConfig {
    /// Dwell gate before a hover counts as intentional (ms)
    pub dwell_ms: u64,
    /// Dwell at which data-view confidence saturates at 1.0 (ms)
    pub saturation_ms: u64,
}

/// Speculative preload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Cache entry lifetime (ms)
    pub ttl_ms: u64,
    /// Minimum probability for speculative work; strict inequality
    pub confidence_threshold: f64,
    /// Collaborator endpoint for the HTTP source
    pub endpoint: String,
    /// HTTP fetch attempts before giving up
    pub max_retries: u32,
}

/// Cognitive-load estimation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Mouse sample lookback (ms)
    pub mouse_window_ms: u64,
    /// Keystroke lookback (ms)
    pub typing_window_ms: u64,
    /// Intention churn lookback (ms)
    pub nav_window_ms: u64,
    /// Pointer velocity below this counts as hesitant (px/ms)
    pub slow_velocity_px_per_ms: f64,
    /// Form errors at which error_frequency saturates
    pub error_saturation: u32,
    /// Intentions per window at which navigation_patterns saturates
    pub nav_saturation: usize,
    /// Keystroke-interval CV mapping to full typing stress
    pub interval_cv_ceiling: f64,
}

/// Form-error tracking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    /// Errors at which the empathic help gate opens
    pub help_threshold: u32,
}

/// Data-preview target patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Regexes matched against hovered element ids
    pub preview: Vec<String>,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            mouse_capacity: 200,
            typing_capacity: 200,
            hover_history_capacity: 100,
            intention_cap: 50,
        }
    }
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            dwell_ms: 500,
            saturation_ms: 2_000,
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 30_000,
            confidence_threshold: 0.9,
            endpoint: "http://localhost:8080/api/preload".to_string(),
            max_retries: 3,
        }
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            mouse_window_ms: 3_000,
            typing_window_ms: 5_000,
            nav_window_ms: 10_000,
            slow_velocity_px_per_ms: 0.05,
            error_saturation: 5,
            nav_saturation: 8,
            interval_cv_ceiling: 1.5,
        }
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self { help_threshold: 3 }
    }
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            preview: DEFAULT_PREVIEW_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Validate config values are within acceptable ranges.
    /// Returns Ok(()) if valid, or Err with a description of the first invalid field.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.buffers.mouse_capacity == 0
            || self.buffers.typing_capacity == 0
            || self.buffers.hover_history_capacity == 0
            || self.buffers.intention_cap == 0
        {
            return Err(crate::Error::Config(
                "buffer capacities must be > 0".to_string(),
            ));
        }
        if self.hover.dwell_ms == 0 {
            return Err(crate::Error::Config("hover.dwell_ms must be > 0".to_string()));
        }
        if self.hover.saturation_ms <= self.hover.dwell_ms {
            return Err(crate::Error::Config(format!(
                "hover.saturation_ms must be > dwell_ms, got {} <= {}",
                self.hover.saturation_ms, self.hover.dwell_ms
            )));
        }
        if self.preload.ttl_ms == 0 {
            return Err(crate::Error::Config("preload.ttl_ms must be > 0".to_string()));
        }
        if !(0.0..=1.0).contains(&self.preload.confidence_threshold) {
            return Err(crate::Error::Config(format!(
                "preload.confidence_threshold must be in [0, 1], got {}",
                self.preload.confidence_threshold
            )));
        }
        if self.preload.endpoint.trim().is_empty() {
            return Err(crate::Error::Config(
                "preload.endpoint must not be empty".to_string(),
            ));
        }
        if self.preload.max_retries == 0 {
            return Err(crate::Error::Config(
                "preload.max_retries must be > 0".to_string(),
            ));
        }
        if self.load.mouse_window_ms == 0
            || self.load.typing_window_ms == 0
            || self.load.nav_window_ms == 0
        {
            return Err(crate::Error::Config(
                "load windows must be > 0".to_string(),
            ));
        }
        if self.load.slow_velocity_px_per_ms <= 0.0 {
            return Err(crate::Error::Config(format!(
                "load.slow_velocity_px_per_ms must be > 0, got {}",
                self.load.slow_velocity_px_per_ms
            )));
        }
        if self.load.error_saturation == 0 || self.load.nav_saturation == 0 {
            return Err(crate::Error::Config(
                "load saturation counts must be > 0".to_string(),
            ));
        }
        if self.load.interval_cv_ceiling <= 0.0 {
            return Err(crate::Error::Config(format!(
                "load.interval_cv_ceiling must be > 0, got {}",
                self.load.interval_cv_ceiling
            )));
        }
        if self.forms.help_threshold == 0 {
            return Err(crate::Error::Config(
                "forms.help_threshold must be > 0".to_string(),
            ));
        }
        if let Err(e) = regex::RegexSet::new(&self.patterns.preview) {
            return Err(crate::Error::Config(format!(
                "invalid preview pattern: {e}"
            )));
        }
        Ok(())
    }

    /// Load config from file
    pub fn load(path: &PathBuf) -> Result<Self, crate::Error> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| crate::Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from default location
    pub fn load_default() -> Result<Self, crate::Error> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to file
    pub fn save(&self, path: &PathBuf) -> Result<(), crate::Error> {
        let content = toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

        // Create parent directories
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Save to default location
    pub fn save_default(&self) -> Result<(), crate::Error> {
        self.save(&Self::default_path())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".intention_engine").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
