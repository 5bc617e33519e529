//! Configuration: baseline file, per-project settings, parallelism.

pub mod loader;
pub mod parallel;
pub mod resolver;
pub mod settings;

pub use loader::{load_config, parse_and_validate_config, ImpactmapConfig, CONFIG_FILE_NAME};
pub use parallel::ParallelConfig;
pub use resolver::resolve_settings;
pub use settings::ProjectSettings;
