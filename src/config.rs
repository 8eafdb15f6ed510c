use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::chart::ChartOptions;
use crate::sunburst::layout::LayoutOptions;
use crate::sunburst::node::Point;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub chart: ChartConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub default_metric: String,
    pub cpu_interval_ms: u64,
    pub refresh_rate_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            default_metric: "ram".to_string(),
            cpu_interval_ms: 200,
            refresh_rate_ms: 2000,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub theme: String,
    pub ring_width: f64,
    pub alpha_falloff: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            theme: "spectral".to_string(),
            ring_width: 0.1,
            alpha_falloff: 0.8,
            center_x: 0.5,
            center_y: 0.5,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub max_name_width: usize,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig { max_name_width: 24 }
    }
}

impl Config {
    pub fn cpu_interval(&self) -> Duration {
        Duration::from_millis(self.general.cpu_interval_ms)
    }

    pub fn chart_options(&self) -> ChartOptions {
        ChartOptions {
            theme: self.chart.theme.clone(),
            layout: LayoutOptions {
                ring_width: self.chart.ring_width,
                alpha_falloff: self.chart.alpha_falloff,
            },
            center: Point::new(self.chart.center_x, self.chart.center_y),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("radialtop").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), %err, "ignoring invalid config file");
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}
