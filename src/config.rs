// src/config.rs
//! Button configuration, loaded once from a JSON file at startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::button::press_content_type;
use crate::error::{ButtonError, Result};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_GPIO_ROOT: &str = "/sys/class/gpio";
/// AMQP shortstr limit, which bounds the content type property.
pub const MAX_CONTENT_TYPE_LEN: usize = 255;

/// Field names match the JSON files already deployed next to the buttons.
#[derive(Debug, Clone, Deserialize)]
pub struct ButtonConfig {
    #[serde(rename = "I2CAddress")]
    pub i2c_address: u8,
    #[serde(rename = "I2CLane")]
    pub i2c_lane: i32,
    #[serde(rename = "GpioPin")]
    pub gpio_pin: u32,
    #[serde(rename = "RmqServer")]
    pub rmq_server: String,
    #[serde(rename = "ButtonName")]
    pub button_name: String,

    #[serde(rename = "PollIntervalMs", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Presses shorter than this are dropped. Zero disables the threshold.
    #[serde(rename = "MinPressMs", default)]
    pub min_press_ms: u64,
    #[serde(rename = "ActiveLow", default)]
    pub active_low: bool,
    #[serde(rename = "GpioRoot", default = "default_gpio_root")]
    pub gpio_root: PathBuf,
    #[serde(rename = "LogDir", default)]
    pub log_dir: Option<PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_gpio_root() -> PathBuf {
    PathBuf::from(DEFAULT_GPIO_ROOT)
}

impl ButtonConfig {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let config: ButtonConfig = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.button_name.is_empty() {
            return Err(ButtonError::Config("ButtonName must not be empty".into()));
        }
        if let Some(bad) = self.button_name.chars().find(|c| c.is_control()) {
            return Err(ButtonError::Config(format!(
                "ButtonName contains control character {:?}",
                bad
            )));
        }
        let tag_len = self.content_type().len();
        if tag_len > MAX_CONTENT_TYPE_LEN {
            return Err(ButtonError::Config(format!(
                "ButtonName too long: content type is {} bytes, limit is {}",
                tag_len, MAX_CONTENT_TYPE_LEN
            )));
        }
        if self.rmq_server.trim().is_empty() {
            return Err(ButtonError::Config("RmqServer must not be empty".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ButtonError::Config("PollIntervalMs must be at least 1".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn min_press(&self) -> Duration {
        Duration::from_millis(self.min_press_ms)
    }

    /// Content type tag carried by every press event of this button.
    pub fn content_type(&self) -> String {
        press_content_type(&self.button_name)
    }
}
