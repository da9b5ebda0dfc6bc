//! Configuration Management

use crate::perception::GatingConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Gating thresholds for the perception state machine
    #[serde(default)]
    pub gating: GatingConfig,
    /// Resolution engine settings
    #[serde(default)]
    pub engine: EngineSection,
    /// Vision collaborator settings
    #[serde(default)]
    pub vision: VisionSection,
    /// Request throttle settings
    #[serde(default)]
    pub limits: LimitsSection,
}

/// Resolution engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSection {
    /// Text-search radius for named candidates (meters)
    pub named_radius_m: f64,
    /// Nearby-search radius for directional candidates (meters)
    pub nearby_radius_m: f64,
    /// Minimum composite score a directional candidate must clear
    pub min_directional_score: f64,
    /// Camera horizontal field of view (degrees)
    pub fov_deg: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            named_radius_m: 2000.0,
            nearby_radius_m: 150.0,
            min_directional_score: 0.2,
            fov_deg: 60.0,
        }
    }
}

/// Vision collaborator configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionSection {
    /// Model used for visual identification
    pub model: String,
    /// Response token cap
    pub max_tokens: u32,
}

impl Default for VisionSection {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250929".to_string(),
            max_tokens: 512,
        }
    }
}

/// Throttle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsSection {
    /// Maximum attempts per client per window
    pub max_requests: u32,
    /// Window length (seconds)
    pub window_secs: u64,
}

impl Default for LimitsSection {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_secs: 60,
        }
    }
}

impl Config {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(0.0..=1.0).contains(&self.gating.enter_threshold) {
            return Err(crate::Error::Config(format!(
                "enter_threshold must be in [0, 1], got {}",
                self.gating.enter_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.gating.lock_threshold) {
            return Err(crate::Error::Config(format!(
                "lock_threshold must be in [0, 1], got {}",
                self.gating.lock_threshold
            )));
        }
        if self.gating.lock_threshold < self.gating.enter_threshold {
            return Err(crate::Error::Config(format!(
                "lock_threshold ({}) must not be below enter_threshold ({})",
                self.gating.lock_threshold, self.gating.enter_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.gating.smoothing_alpha) {
            return Err(crate::Error::Config(format!(
                "smoothing_alpha must be in [0, 1], got {}",
                self.gating.smoothing_alpha
            )));
        }
        if self.engine.named_radius_m <= 0.0 || self.engine.nearby_radius_m <= 0.0 {
            return Err(crate::Error::Config(
                "search radii must be > 0".to_string(),
            ));
        }
        if !(10.0..=170.0).contains(&self.engine.fov_deg) {
            return Err(crate::Error::Config(format!(
                "fov_deg must be in [10, 170], got {}",
                self.engine.fov_deg
            )));
        }
        if self.vision.model.trim().is_empty() {
            return Err(crate::Error::Config("model must not be empty".to_string()));
        }
        if self.limits.max_requests == 0 || self.limits.window_secs == 0 {
            return Err(crate::Error::Config(
                "throttle window and request cap must be > 0".to_string(),
            ));
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
        let content =
            toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))?;

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
            .map(|h| h.join(".spatial_intent").join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Generate TOML representation
    pub fn to_toml(&self) -> Result<String, crate::Error> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }
}
