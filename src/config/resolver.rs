//! Settings Resolver: per-project thresholds with never-fail defaulting.

use crate::config::ProjectSettings;
use crate::store::ProjectStore;

/// Resolve the settings for a project.
///
/// A missing blob, malformed JSON, out-of-range values or even a store
/// failure all resolve to the compiled-in defaults (with a warning); this
/// function never errors because every downstream calculator needs usable
/// thresholds.
pub fn resolve_settings(store: &dyn ProjectStore, project: &str) -> ProjectSettings {
    let blob = match store.settings_blob(project) {
        Ok(blob) => blob,
        Err(e) => {
            log::warn!("failed to load settings for project {project}: {e}; using defaults");
            return ProjectSettings::default();
        }
    };

    let Some(blob) = blob else {
        log::debug!("no settings stored for project {project}; using defaults");
        return ProjectSettings::default();
    };

    parse_settings(project, blob)
}

/// Pure function to parse and sanitize a settings blob.
fn parse_settings(project: &str, blob: serde_json::Value) -> ProjectSettings {
    match serde_json::from_value::<ProjectSettings>(blob) {
        Ok(mut settings) => {
            for complaint in settings.sanitize() {
                log::warn!("settings for project {project}: {complaint}");
            }
            settings
        }
        Err(e) => {
            log::warn!("malformed settings blob for project {project}: {e}; using defaults");
            ProjectSettings::default()
        }
    }
}
