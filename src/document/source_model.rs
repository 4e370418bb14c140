use std::sync::Arc;

use tower_lsp::lsp_types::Url;
use tracing::{debug, warn};
use tree_sitter::Tree;

use crate::analyzer::{ComponentAnalyzer, TsxParser};
use crate::error::AnalyzerError;
use crate::model::{ComponentCandidate, LineIndex};

/// ドキュメントの解析状態
///
/// 未オープン / クローズ済みのドキュメントはストアに存在しない
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Opened,
    Analyzed,
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Components(Vec<ComponentCandidate>),
    ParseFailure(AnalyzerError),
}

/// あるバージョンに対する解析結果のスナップショット
#[derive(Debug)]
pub struct DocumentAnalysis {
    pub uri: Url,
    pub version: i32,
    pub line_index: LineIndex,
    pub outcome: AnalysisOutcome,
}

impl DocumentAnalysis {
    /// 候補一覧（ParseFailure の場合は空）
    pub fn candidates(&self) -> &[ComponentCandidate] {
        match &self.outcome {
            AnalysisOutcome::Components(candidates) => candidates,
            AnalysisOutcome::ParseFailure(_) => &[],
        }
    }

    pub fn candidate(&self, binding_name: &str) -> Option<&ComponentCandidate> {
        self.candidates()
            .iter()
            .find(|c| c.binding_name == binding_name)
    }

    pub fn parse_error(&self) -> Option<&AnalyzerError> {
        match &self.outcome {
            AnalysisOutcome::ParseFailure(err) => Some(err),
            AnalysisOutcome::Components(_) => None,
        }
    }
}

/// 1つのオープン中ドキュメント
pub struct SourceModel {
    uri: Url,
    version: i32,
    text: Arc<str>,
    /// TSXとして解析対象かどうか
    analyzable: bool,
    tree: Option<Tree>,
    analysis: Option<Arc<DocumentAnalysis>>,
    state: DocumentState,
}

impl SourceModel {
    pub fn new(uri: Url, version: i32, text: &str, analyzable: bool) -> Self {
        Self {
            uri,
            version,
            text: Arc::from(text),
            analyzable,
            tree: None,
            analysis: None,
            state: DocumentState::Opened,
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// テキストを丸ごと置き換え、構文木と解析キャッシュを破棄する
    pub fn replace_text(&mut self, version: i32, text: &str) {
        if version <= self.version {
            warn!(
                "{}: version went from {} to {}",
                self.uri, self.version, version
            );
        }
        self.version = version;
        self.text = Arc::from(text);
        self.tree = None;
        self.analysis = None;
        if self.state == DocumentState::Analyzed {
            self.state = DocumentState::Stale;
        }
    }

    /// 現在のバージョンを解析する（同一バージョンならキャッシュを返す）
    pub fn analyze(&mut self, analyzer: &ComponentAnalyzer) -> Arc<DocumentAnalysis> {
        if let Some(analysis) = &self.analysis {
            if analysis.version == self.version {
                debug!("{}: analysis cache hit (version {})", self.uri, self.version);
                return Arc::clone(analysis);
            }
        }

        let outcome = if self.analyzable {
            match self.ensure_tree() {
                Ok(()) => match &self.tree {
                    Some(tree) => analyzer.analyze_tree(tree, &self.text),
                    None => Ok(Vec::new()),
                },
                Err(err) => Err(err),
            }
        } else {
            Ok(Vec::new())
        };

        let outcome = match outcome {
            Ok(candidates) => AnalysisOutcome::Components(candidates),
            Err(err) => {
                warn!("{}: {}", self.uri, err);
                AnalysisOutcome::ParseFailure(err)
            }
        };

        let analysis = Arc::new(DocumentAnalysis {
            uri: self.uri.clone(),
            version: self.version,
            line_index: LineIndex::new(Arc::clone(&self.text)),
            outcome,
        });
        self.analysis = Some(Arc::clone(&analysis));
        self.state = DocumentState::Analyzed;
        analysis
    }

    fn ensure_tree(&mut self) -> Result<(), AnalyzerError> {
        if self.tree.is_none() {
            let mut parser = TsxParser::new()?;
            self.tree = Some(parser.parse(&self.text)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(text: &str) -> SourceModel {
        let uri = Url::parse("file:///app/Button.tsx").unwrap();
        SourceModel::new(uri, 1, text, true)
    }

    #[test]
    fn test_state_transitions() {
        let analyzer = ComponentAnalyzer::new();
        let mut doc = model("const A = () => <div/>;");
        assert_eq!(doc.state(), DocumentState::Opened);

        doc.analyze(&analyzer);
        assert_eq!(doc.state(), DocumentState::Analyzed);

        doc.replace_text(2, "const B = () => <div/>;");
        assert_eq!(doc.state(), DocumentState::Stale);

        let analysis = doc.analyze(&analyzer);
        assert_eq!(doc.state(), DocumentState::Analyzed);
        assert_eq!(analysis.version, 2);
        assert_eq!(analysis.candidates()[0].binding_name, "B");
    }

    #[test]
    fn test_change_before_analysis_stays_opened() {
        let mut doc = model("const A = () => <div/>;");
        doc.replace_text(2, "const B = () => <div/>;");
        assert_eq!(doc.state(), DocumentState::Opened);
    }

    #[test]
    fn test_same_version_reuses_cache() {
        let analyzer = ComponentAnalyzer::new();
        let mut doc = model("const A = () => <div/>;");
        let first = doc.analyze(&analyzer);
        let second = doc.analyze(&analyzer);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_parse_failure_yields_no_candidates() {
        let analyzer = ComponentAnalyzer::new();
        let mut doc = model("const A = () => { return <div>; ");
        let analysis = doc.analyze(&analyzer);
        assert!(analysis.candidates().is_empty());
        assert!(analysis.parse_error().is_some());
    }

    #[test]
    fn test_non_tsx_document_has_no_candidates() {
        let analyzer = ComponentAnalyzer::new();
        let uri = Url::parse("file:///app/readme.md").unwrap();
        let mut doc = SourceModel::new(uri, 1, "const A = () => <div/>;", false);
        let analysis = doc.analyze(&analyzer);
        assert!(analysis.candidates().is_empty());
        assert!(analysis.parse_error().is_none());
    }
}
