use std::borrow::Cow;

use thiserror::Error;
use tower_lsp::jsonrpc::{self, ErrorCode};
use tower_lsp::lsp_types::Url;

use crate::model::TextRange;

/// アナライザー解析エラー
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("Failed to load TSX grammar: {0}")]
    Grammar(String),

    /// ソースが構文解析できない（ParseFailure）
    #[error("Parse error: {message}")]
    Parse { message: String, range: TextRange },
}

/// 設定・初期化オプションのエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid initialization options: {0}")]
    InvalidOptions(#[from] serde_json::Error),

    #[error("Unsupported capability schema version {found} (expected {expected})")]
    UnsupportedSchema { found: u32, expected: u32 },

    #[error("Invalid glob pattern '{pattern}': {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// コマンド実行・プロトコル処理のエラー
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid command arguments: {0}")]
    InvalidArguments(String),

    #[error("Document is not open: {0}")]
    DocumentNotOpen(Url),

    /// クライアントが見たバージョンと現在のバージョンが異なる
    #[error("document changed: client saw version {expected}, current version is {actual}")]
    StaleRequest { expected: i32, actual: i32 },

    #[error("No component named '{0}' in the current document")]
    UnknownComponent(String),

    #[error("Document cannot be parsed: {0}")]
    ParseFailure(#[from] AnalyzerError),

    /// クライアントが編集の適用を拒否した
    #[error("Edit was not applied: {0}")]
    EditConflict(String),

    #[error("Client request failed: {0}")]
    Client(String),

    #[error("Analysis task failed: {0}")]
    Task(String),
}

impl From<ServerError> for jsonrpc::Error {
    fn from(err: ServerError) -> Self {
        let code = match err {
            ServerError::StaleRequest { .. } => ErrorCode::ContentModified,
            ServerError::InvalidArguments(_) => ErrorCode::InvalidParams,
            ServerError::DocumentNotOpen(_) | ServerError::UnknownComponent(_) => {
                ErrorCode::InvalidRequest
            }
            ServerError::ParseFailure(_) | ServerError::EditConflict(_) => {
                ErrorCode::ServerError(-32000)
            }
            ServerError::Client(_) | ServerError::Task(_) => ErrorCode::InternalError,
        };
        jsonrpc::Error {
            code,
            message: Cow::Owned(err.to_string()),
            data: None,
        }
    }
}
