use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::schedule::{GridGeometry, WorkingHours};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockFormat {
    #[default]
    Hour24,      // "14:30"
    Hour12,      // "2:30pm"
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ViewMode {
    #[default]
    Month,
    Day,
    Timeline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_work_start_hour")]
    pub work_start_hour: u8,
    #[serde(default = "default_work_end_hour")]
    pub work_end_hour: u8,
    #[serde(default = "default_grid_start_hour")]
    pub grid_start_hour: u8,
    #[serde(default = "default_grid_end_hour")]
    pub grid_end_hour: u8,
    #[serde(default = "default_slot_height")]
    pub slot_height_px: f32,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default)]
    pub clock_format: ClockFormat,
    #[serde(default)]
    pub view_mode: ViewMode,
    #[serde(default = "default_timeline_days")]
    pub timeline_days: usize,
}

fn default_work_start_hour() -> u8 {
    9
}

fn default_work_end_hour() -> u8 {
    17
}

fn default_grid_start_hour() -> u8 {
    6
}

fn default_grid_end_hour() -> u8 {
    23
}

fn default_slot_height() -> f32 {
    28.0
}

fn default_font_scale() -> f32 {
    1.0
}

fn default_timeline_days() -> usize {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_start_hour: 9,
            work_end_hour: 17,
            grid_start_hour: 6,
            grid_end_hour: 23,
            slot_height_px: 28.0,
            font_scale: 1.0,
            clock_format: ClockFormat::Hour24,
            view_mode: ViewMode::Month,
            timeline_days: 30,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = serde_json::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config.sanitized())
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        // Ensure directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, contents)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "tempo", "tempo")
            .context("Could not determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Clamp hand-edited hour settings back into a drawable range: hours in
    /// 0..=24, end after start, working hours inside the grid.
    pub fn sanitized(mut self) -> Self {
        self.grid_start_hour = self.grid_start_hour.min(23);
        self.grid_end_hour = self.grid_end_hour.clamp(self.grid_start_hour + 1, 24);
        self.work_start_hour = self
            .work_start_hour
            .clamp(self.grid_start_hour, self.grid_end_hour);
        self.work_end_hour = self.work_end_hour.clamp(self.work_start_hour, self.grid_end_hour);
        self.slot_height_px = self.slot_height_px.clamp(16.0, 64.0);
        self.font_scale = self.font_scale.clamp(0.75, 2.0);
        if self.timeline_days == 0 {
            self.timeline_days = default_timeline_days();
        }
        self
    }

    pub fn working_hours(&self) -> WorkingHours {
        WorkingHours::new(self.work_start_hour, self.work_end_hour)
    }

    pub fn grid_geometry(&self) -> GridGeometry {
        GridGeometry {
            start_hour: self.grid_start_hour,
            end_hour: self.grid_end_hour,
            slot_height_px: self.slot_height_px,
            ..GridGeometry::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_repairs_inverted_hours() {
        let config = Config {
            grid_start_hour: 8,
            grid_end_hour: 7,
            work_start_hour: 2,
            work_end_hour: 30,
            ..Config::default()
        }
        .sanitized();
        assert!(config.grid_end_hour > config.grid_start_hour);
        assert!(config.work_start_hour >= config.grid_start_hour);
        assert!(config.work_end_hour <= config.grid_end_hour);
    }

    #[test]
    fn sanitize_pulls_work_hours_inside_the_grid() {
        let config = Config {
            grid_start_hour: 6,
            grid_end_hour: 12,
            work_start_hour: 30,
            work_end_hour: 2,
            ..Config::default()
        }
        .sanitized();
        assert_eq!(config.work_start_hour, 12);
        assert_eq!(config.work_end_hour, 12);
    }

    #[test]
    fn defaults_match_engine_defaults() {
        let config = Config::default();
        assert_eq!(config.working_hours(), WorkingHours::default());
        assert_eq!(config.grid_geometry(), GridGeometry::default());
    }
}
