use std::{path::Path, time::Duration};

use anyhow::{ensure, Context};
use gridsearch::DEFAULT_GRID_SIZE;
use log::info;

/// Environment variable naming an optional JSON settings file
pub const SETTINGS_ENV: &str = "GRIDSEARCH_SETTINGS";

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)] // missing fields fall back to their defaults
pub struct Settings {
    /// Cells along each side of the square grid
    pub grid_size: usize,
    /// Side length of one cell on screen, in points
    pub cell_size: f32,
    /// Pause between two automatic search steps
    pub step_delay_ms: u64,
    pub auto_step: bool,
    pub draw_grid_lines: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            cell_size: 30.0,
            step_delay_ms: 100,
            auto_step: true,
            draw_grid_lines: true,
        }
    }
}

impl Settings {
    /// Reads the file named by [`SETTINGS_ENV`], or returns the defaults when
    /// the variable is not set
    pub fn load() -> Result<Self, anyhow::Error> {
        match std::env::var_os(SETTINGS_ENV) {
            Some(path) => {
                let settings = Self::from_file(Path::new(&path))?;
                info!("loaded settings from {}", Path::new(&path).display());
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, anyhow::Error> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self, anyhow::Error> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        ensure!(self.grid_size > 0, "grid_size must be at least 1");
        ensure!(
            self.cell_size.is_finite() && self.cell_size > 0.0,
            "cell_size must be a positive number, got {}",
            self.cell_size
        );
        Ok(())
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    /// Side length of the whole grid on screen
    pub fn grid_extent(&self) -> f32 {
        self.grid_size as f32 * self.cell_size
    }
}
