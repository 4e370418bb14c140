use std::sync::Arc;

use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, Range, Url};
use tracing::debug;

use crate::config::DiagnosticsConfig;
use crate::document::DocumentStore;
use crate::error::AnalyzerError;

const SOURCE: &str = "remod";

/// 診断ハンドラー
///
/// 構文エラーでコンポーネント解析が止まっていることを知らせる
pub struct DiagnosticsHandler {
    store: Arc<DocumentStore>,
    config: DiagnosticsConfig,
}

impl DiagnosticsHandler {
    pub fn new(store: Arc<DocumentStore>, config: DiagnosticsConfig) -> Self {
        Self { store, config }
    }

    /// 重要度文字列をDiagnosticSeverityに変換
    fn parse_severity(&self) -> DiagnosticSeverity {
        match self.config.severity.to_lowercase().as_str() {
            "error" => DiagnosticSeverity::ERROR,
            "warning" => DiagnosticSeverity::WARNING,
            "hint" => DiagnosticSeverity::HINT,
            "information" | "info" => DiagnosticSeverity::INFORMATION,
            _ => DiagnosticSeverity::WARNING,
        }
    }

    /// TSXファイルの診断を実行
    pub fn diagnose(&self, uri: &Url) -> Vec<Diagnostic> {
        if !self.config.enabled {
            return Vec::new();
        }
        let Some(analysis) = self.store.analyze(uri) else {
            return Vec::new();
        };
        let Some(err) = analysis.parse_error() else {
            return Vec::new();
        };
        debug!("diagnose: {} version {} has a parse failure", uri, analysis.version);

        let range = match err {
            AnalyzerError::Parse { range, .. } => analysis.line_index.range(*range),
            AnalyzerError::Grammar(_) => Range::default(),
        };
        vec![Diagnostic {
            range,
            severity: Some(self.parse_severity()),
            source: Some(SOURCE.to_string()),
            message: format!("{}; displayName actions are unavailable until it parses", err),
            ..Default::default()
        }]
    }
}
