pub mod capabilities;
pub mod path_matcher;
pub mod remod_config;
pub mod settings;

pub use capabilities::{InitializationOptions, SCHEMA_VERSION};
pub use path_matcher::PathMatcher;
pub use remod_config::{DiagnosticsConfig, RemodConfig, CONFIG_FILE_NAME, DEFAULT_PREFIX};
pub use settings::Settings;
