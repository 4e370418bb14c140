use serde::Deserialize;
use serde_json::Value;

use crate::error::ConfigError;

/// サポートする初期化オプションのスキーマバージョン
pub const SCHEMA_VERSION: u32 = 1;

/// `initialize` の initializationOptions で受け取る設定
///
/// ```json
/// { "schemaVersion": 1, "identificationPrefix": "REMOD_" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InitializationOptions {
    pub schema_version: u32,
    #[serde(default)]
    pub identification_prefix: Option<String>,
}

impl InitializationOptions {
    /// JSON値を検証して読み込む。未指定なら None
    pub fn from_value(value: Option<Value>) -> Result<Option<Self>, ConfigError> {
        let value = match value {
            None | Some(Value::Null) => return Ok(None),
            Some(value) => value,
        };
        let options: Self = serde_json::from_value(value)?;
        if options.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema {
                found: options.schema_version,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(Some(options))
    }
}
