use super::capabilities::InitializationOptions;
use super::path_matcher::PathMatcher;
use super::remod_config::{DiagnosticsConfig, RemodConfig, DEFAULT_PREFIX};

/// サーバーが実際に使う設定
///
/// 優先順位: initializationOptions > .remodrc > デフォルト
#[derive(Debug, Clone)]
pub struct Settings {
    pub identification_prefix: String,
    pub diagnostics: DiagnosticsConfig,
    pub path_matcher: Option<PathMatcher>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            identification_prefix: DEFAULT_PREFIX.to_string(),
            diagnostics: DiagnosticsConfig::default(),
            path_matcher: None,
        }
    }
}

impl Settings {
    pub fn resolve(config: &RemodConfig, options: Option<&InitializationOptions>) -> Self {
        let identification_prefix = options
            .and_then(|o| o.identification_prefix.clone())
            .unwrap_or_else(|| config.prefix().to_string());

        let path_matcher = match config.create_path_matcher() {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                tracing::warn!("Ignoring include/exclude patterns: {}", e);
                None
            }
        };

        Self {
            identification_prefix,
            diagnostics: config.diagnostics.clone(),
            path_matcher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization_options_override_config() {
        let config: RemodConfig =
            serde_json::from_str(r#"{ "display_name_prefix": "FILE_" }"#).unwrap();
        let options = InitializationOptions {
            schema_version: 1,
            identification_prefix: Some("INIT_".to_string()),
        };
        assert_eq!(
            Settings::resolve(&config, Some(&options)).identification_prefix,
            "INIT_"
        );
        assert_eq!(Settings::resolve(&config, None).identification_prefix, "FILE_");
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve(&RemodConfig::default(), None);
        assert_eq!(settings.identification_prefix, DEFAULT_PREFIX);
        assert!(settings.path_matcher.is_some());
    }

    #[test]
    fn test_invalid_patterns_disable_matcher() {
        let config: RemodConfig = serde_json::from_str(r#"{ "include": ["src/[.tsx"] }"#).unwrap();
        assert!(Settings::resolve(&config, None).path_matcher.is_none());
    }
}
