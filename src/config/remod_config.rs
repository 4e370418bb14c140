use std::fs;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::path_matcher::PathMatcher;
use crate::error::ConfigError;

/// 設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".remodrc";

/// displayName のデフォルトプレフィックス
pub const DEFAULT_PREFIX: &str = "REMOD_";

/// .remodrc の設定
#[derive(Debug, Clone, Deserialize)]
pub struct RemodConfig {
    /// displayName に付けるプレフィックス
    #[serde(default)]
    pub display_name_prefix: Option<String>,
    /// ワークスペース一括適用の対象globパターン（空の場合は全TSXファイル対象）
    #[serde(default, alias = "glob", deserialize_with = "one_or_many")]
    pub include: Vec<String>,
    /// 追加の除外globパターン（node_modules などの既定の除外に加わる）
    #[serde(default, alias = "ignore", deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,
    /// 診断（構文エラー表示）設定
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// 診断（構文エラー表示）設定
#[derive(Debug, Clone, Deserialize)]
pub struct DiagnosticsConfig {
    /// 診断機能を有効にする（デフォルト: true）
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// 診断の重要度: "error", "warning", "hint", "information"（デフォルト: "warning"）
    #[serde(default = "default_severity")]
    pub severity: String,
}

fn default_true() -> bool {
    true
}

fn default_severity() -> String {
    "warning".to_string()
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            severity: default_severity(),
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec![
        "**/node_modules".to_string(),
        "**/node_modules/**".to_string(),
        "**/dist".to_string(),
        "**/dist/**".to_string(),
        "**/build".to_string(),
        "**/build/**".to_string(),
        "**/.*".to_string(),
        "**/.*/**".to_string(),
    ]
}

/// `"glob"` 単体の文字列と配列の両方を受け付ける
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(pattern) => vec![pattern],
        OneOrMany::Many(patterns) => patterns,
    })
}

impl Default for RemodConfig {
    fn default() -> Self {
        Self {
            display_name_prefix: None,
            include: Vec::new(),
            exclude: Vec::new(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

impl RemodConfig {
    /// 指定ディレクトリから.remodrcを読み込む
    pub fn load_from_dir(dir: &Path) -> Self {
        let config_path = dir.join(CONFIG_FILE_NAME);
        Self::load_from_path(&config_path)
    }

    /// 指定パスから.remodrcを読み込む
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse .remodrc: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read .remodrc: {}", e);
                Self::default()
            }
        }
    }

    /// 実際に使うプレフィックス
    pub fn prefix(&self) -> &str {
        self.display_name_prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    /// 既定の除外パターンにユーザー指定分を足したもの
    pub fn excludes(&self) -> Vec<String> {
        let mut excludes = default_exclude();
        excludes.extend(self.exclude.iter().cloned());
        excludes
    }

    /// PathMatcherを作成
    pub fn create_path_matcher(&self) -> Result<PathMatcher, ConfigError> {
        PathMatcher::new(&self.include, &self.excludes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RemodConfig::default();
        assert_eq!(config.prefix(), "REMOD_");
        assert!(config.include.is_empty());
        assert!(config.exclude.is_empty());
        assert!(config.excludes().contains(&"**/node_modules/**".to_string()));
    }

    #[test]
    fn test_parse_original_remodrc() {
        let json = r#"{
            "root_dir": "./",
            "glob": "src/**/*.tsx",
            "typescript": true,
            "display_name_prefix": "React_MOD_",
            "ignore": ["**/*.stories.tsx"]
        }"#;
        let config: RemodConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.prefix(), "React_MOD_");
        assert_eq!(config.include, vec!["src/**/*.tsx".to_string()]);
        assert_eq!(config.exclude, vec!["**/*.stories.tsx".to_string()]);
    }

    #[test]
    fn test_ignore_list_adds_to_default_excludes() {
        let json = r#"{ "ignore": "**/*.stories.tsx" }"#;
        let config: RemodConfig = serde_json::from_str(json).unwrap();
        let excludes = config.excludes();
        assert!(excludes.contains(&"**/*.stories.tsx".to_string()));
        assert!(excludes.contains(&"**/node_modules/**".to_string()));

        let matcher = config.create_path_matcher().unwrap();
        assert!(!matcher.is_target_file(Path::new("src/Button.stories.tsx")));
        assert!(!matcher.is_target_file(Path::new("node_modules/lib/Button.tsx")));
        assert!(!matcher.should_traverse_dir(Path::new("node_modules")));
        assert!(matcher.is_target_file(Path::new("src/Button.tsx")));
    }

    #[test]
    fn test_include_array() {
        let json = r#"{ "include": ["src/**/*.tsx", "lib/**/*.tsx"] }"#;
        let config: RemodConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.include.len(), 2);
    }

    #[test]
    fn test_empty_config() {
        let config: RemodConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.prefix(), DEFAULT_PREFIX);
        assert!(config.diagnostics.enabled);
    }

    #[test]
    fn test_diagnostics_default() {
        let config = DiagnosticsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.severity, "warning");
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"{ "display_name_prefix": "X_" }"#,
        )
        .unwrap();
        assert_eq!(RemodConfig::load_from_dir(dir.path()).prefix(), "X_");
    }

    #[test]
    fn test_malformed_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{ not json").unwrap();
        assert_eq!(RemodConfig::load_from_dir(dir.path()).prefix(), DEFAULT_PREFIX);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = RemodConfig::load_from_dir(dir.path());
        assert!(config.display_name_prefix.is_none());
    }
}
