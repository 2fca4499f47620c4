//! Gesture settings file
//!
//! TOML with one table per surface. Every field is optional and falls back
//! to the defaults below:
//!
//! | key                               | default |
//! |-----------------------------------|---------|
//! | `gestures.swipe_threshold`        | 50      |
//! | `gestures.long_press_delay_ms`    | 500     |
//! | `gestures.tap_jitter`             | 10      |
//! | `pull_to_refresh.threshold`       | 80      |
//! | `swipeable.max_swipe`             | 120     |
//! | `swipeable.threshold`             | 80      |
//! | `pages.swipe_threshold`           | 100     |
//!
//! Each table also takes `disabled = true`.

use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bindings::pages::{Page, PAGE_SWIPE_THRESHOLD};
use crate::bindings::{PullToRefreshConfig, SwipeableConfig};
use crate::error::{Error, Result};
use crate::input::GestureConfig;

fn default_swipe_threshold() -> f64 { 50.0 }
fn default_long_press_delay_ms() -> u64 { 500 }
fn default_tap_jitter() -> f64 { 10.0 }
fn default_pull_threshold() -> f64 { 80.0 }
fn default_max_swipe() -> f64 { 120.0 }
fn default_item_threshold() -> f64 { 80.0 }
fn default_page_swipe_threshold() -> f64 { PAGE_SWIPE_THRESHOLD }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureSettings {
    #[serde(default = "default_swipe_threshold")]
    pub swipe_threshold: f64,
    #[serde(default = "default_long_press_delay_ms")]
    pub long_press_delay_ms: u64,
    #[serde(default = "default_tap_jitter")]
    pub tap_jitter: f64,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            swipe_threshold: default_swipe_threshold(),
            long_press_delay_ms: default_long_press_delay_ms(),
            tap_jitter: default_tap_jitter(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullToRefreshSettings {
    #[serde(default = "default_pull_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for PullToRefreshSettings {
    fn default() -> Self {
        Self {
            threshold: default_pull_threshold(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeableSettings {
    #[serde(default = "default_max_swipe")]
    pub max_swipe: f64,
    #[serde(default = "default_item_threshold")]
    pub threshold: f64,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for SwipeableSettings {
    fn default() -> Self {
        Self {
            max_swipe: default_max_swipe(),
            threshold: default_item_threshold(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSettings {
    #[serde(default = "default_page_swipe_threshold")]
    pub swipe_threshold: f64,
    #[serde(default)]
    pub start_page: Page,
    #[serde(default)]
    pub disabled: bool,
}

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            swipe_threshold: default_page_swipe_threshold(),
            start_page: Page::default(),
            disabled: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub gestures: GestureSettings,
    #[serde(default)]
    pub pull_to_refresh: PullToRefreshSettings,
    #[serde(default)]
    pub swipeable: SwipeableSettings,
    #[serde(default)]
    pub pages: PageSettings,
}

impl Settings {
    pub fn from_toml(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Distances must be finite and positive
    pub fn validate(&self) -> Result<()> {
        let distances = [
            ("gestures.swipe_threshold", self.gestures.swipe_threshold),
            ("gestures.tap_jitter", self.gestures.tap_jitter),
            ("pull_to_refresh.threshold", self.pull_to_refresh.threshold),
            ("swipeable.max_swipe", self.swipeable.max_swipe),
            ("swipeable.threshold", self.swipeable.threshold),
            ("pages.swipe_threshold", self.pages.swipe_threshold),
        ];
        for (key, value) in distances {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidSetting {
                    key,
                    reason: format!("{} is not a positive distance", value),
                });
            }
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let settings = Self::from_toml(&contents)?;
        tracing::info!("Loaded gesture settings from {:?}", path);
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("No gesture settings at {:?}, using defaults", path);
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        tracing::info!("Saved gesture settings to {:?}", path);
        Ok(())
    }

    /// Classifier config for a general gesture surface
    pub fn gesture_config(&self) -> GestureConfig {
        GestureConfig {
            swipe_threshold: self.gestures.swipe_threshold,
            long_press_delay: Duration::from_millis(self.gestures.long_press_delay_ms),
            tap_jitter: self.gestures.tap_jitter,
            disabled: self.gestures.disabled,
            ..GestureConfig::default()
        }
    }

    /// Classifier config for the page container
    pub fn page_config(&self) -> GestureConfig {
        GestureConfig {
            swipe_threshold: self.pages.swipe_threshold,
            disabled: self.gestures.disabled || self.pages.disabled,
            ..self.gesture_config()
        }
    }

    pub fn pull_to_refresh_config(&self) -> PullToRefreshConfig {
        PullToRefreshConfig {
            threshold: self.pull_to_refresh.threshold,
            disabled: self.pull_to_refresh.disabled,
        }
    }

    pub fn swipeable_config(&self) -> SwipeableConfig {
        SwipeableConfig {
            max_swipe: self.swipeable.max_swipe,
            threshold: self.swipeable.threshold,
            disabled: self.swipeable.disabled,
        }
    }
}
