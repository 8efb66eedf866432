// src/util/io/gpio.rs
//! GPIO input lines. The poller only sees [`GpioInput`]; the sysfs backend is
//! what runs on the board, the scripted one drives tests.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{ButtonError, Result};
use crate::{log_info, log_warn};

#[async_trait]
pub trait GpioInput: Send {
    /// Current logical level of the line, `true` meaning pressed.
    async fn sample(&mut self) -> Result<bool>;
}

/// Input line driven through the Linux sysfs GPIO interface.
#[derive(Debug)]
pub struct SysfsGpio {
    root: PathBuf,
    pin: u32,
    value_path: PathBuf,
    active_low: bool,
    exported: bool,
}

impl SysfsGpio {
    /// Export the line if needed and configure it as an input.
    pub fn open(root: &Path, pin: u32, active_low: bool) -> Result<Self> {
        let line_dir = root.join(format!("gpio{}", pin));
        let mut exported = false;

        if !line_dir.exists() {
            std::fs::write(root.join("export"), pin.to_string()).map_err(|e| {
                ButtonError::Gpio(format!("failed to export gpio{}: {}", pin, e))
            })?;
            exported = true;
            log_info!("Exported gpio{}", pin);
        }

        if let Err(e) = std::fs::write(line_dir.join("direction"), "in") {
            if exported {
                unexport(root, pin);
            }
            return Err(ButtonError::Gpio(format!(
                "failed to set gpio{} as input: {}",
                pin, e
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            pin,
            value_path: line_dir.join("value"),
            active_low,
            exported,
        })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

fn unexport(root: &Path, pin: u32) {
    if let Err(e) = std::fs::write(root.join("unexport"), pin.to_string()) {
        log_warn!("Failed to unexport gpio{}: {}", pin, e);
    }
}

fn parse_level(raw: &str) -> Result<bool> {
    match raw.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(ButtonError::Gpio(format!("unexpected line value {:?}", other))),
    }
}

#[async_trait]
impl GpioInput for SysfsGpio {
    async fn sample(&mut self) -> Result<bool> {
        let raw = tokio::fs::read_to_string(&self.value_path)
            .await
            .map_err(|e| ButtonError::Gpio(format!("read gpio{}: {}", self.pin, e)))?;
        let level = parse_level(&raw)?;
        Ok(level != self.active_low)
    }
}

impl Drop for SysfsGpio {
    fn drop(&mut self) {
        if self.exported {
            unexport(&self.root, self.pin);
        }
    }
}

/// Replays a fixed sequence of samples. `None` entries fail the read.
/// Once the script runs out the last entry repeats.
#[derive(Debug, Clone)]
pub struct ScriptedGpio {
    script: Vec<Option<bool>>,
    reads: Arc<AtomicUsize>,
}

impl ScriptedGpio {
    pub fn new(script: Vec<Option<bool>>) -> Self {
        Self {
            script,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_levels(levels: &[bool]) -> Self {
        Self::new(levels.iter().copied().map(Some).collect())
    }

    /// Shared read counter, still readable after the input is moved away.
    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }
}

#[async_trait]
impl GpioInput for ScriptedGpio {
    async fn sample(&mut self) -> Result<bool> {
        let index = self.reads.fetch_add(1, Ordering::SeqCst);
        let entry = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .copied()
            .unwrap_or(Some(false));

        entry.ok_or_else(|| ButtonError::Gpio(format!("scripted read failure at tick {}", index + 1)))
    }
}
