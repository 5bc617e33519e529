//! Baseline configuration from `.impactmap.toml`.
//!
//! The file supplies deployment-wide defaults (thresholds, parallelism)
//! applied before any per-project settings blob. Like the per-project
//! resolver, loading never fails: a missing or malformed file falls back to
//! the compiled-in defaults.

use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::parallel::ParallelConfig;
use super::settings::ProjectSettings;

pub const CONFIG_FILE_NAME: &str = ".impactmap.toml";

/// Deployment-wide baseline configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImpactmapConfig {
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub parallel: ParallelConfig,
}

/// Pure function to read a config file's contents.
pub(crate) fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

/// Pure function to parse and sanitize config from a TOML string.
pub fn parse_and_validate_config(contents: &str) -> Result<ImpactmapConfig, String> {
    let mut config = toml::from_str::<ImpactmapConfig>(contents)
        .map_err(|e| format!("failed to parse {CONFIG_FILE_NAME}: {e}"))?;

    for complaint in config.settings.sanitize() {
        log::warn!("{CONFIG_FILE_NAME}: {complaint}");
    }

    Ok(config)
}

fn try_load_config_from_path(config_path: &Path) -> Option<ImpactmapConfig> {
    let contents = match read_config_file(config_path) {
        Ok(contents) => contents,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("failed to read {}: {e}", config_path.display());
            }
            return None;
        }
    };

    match parse_and_validate_config(&contents) {
        Ok(config) => {
            log::debug!("loaded config from {}", config_path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("{e}; using defaults");
            None
        }
    }
}

fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load the baseline config by walking up from the current directory.
pub fn load_config() -> ImpactmapConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("failed to get current directory: {e}; using default config");
            return ImpactmapConfig::default();
        }
    };

    directory_ancestors(current, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_default()
}

/// Template written by `impactmap init`.
pub fn config_template() -> &'static str {
    r#"# impactmap baseline configuration
#
# Deployment-wide defaults; per-project settings stored in the dashboard
# override these field by field.

[settings]
hourly_rate_default = 50.0
evidence_completeness_threshold = 60.0
stakeholder_high_targeting_threshold = 3
stakeholder_low_response_ratio_threshold = 0.25
uptake_no_exploitation_days = 180
inefficient_channel_effort_hours_threshold = 40.0
objective_on_track_progress_threshold = 0.7
objective_evidence_coverage_threshold = 0.6

[parallel]
enabled = true
# max_threads = 4
"#
}
