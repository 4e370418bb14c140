use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_lsp::lsp_types::{
    DocumentChanges, OneOf, OptionalVersionedTextDocumentIdentifier, TextDocumentEdit, TextEdit,
    Url, WorkspaceEdit,
};
use tracing::{debug, warn};

use crate::document::{DocumentAnalysis, DocumentStore};
use crate::edit::{generate, generate_all, synthesize};
use crate::error::ServerError;

pub const APPLY_IDENTIFICATION: &str = "remod.applyIdentification";
pub const APPLY_ALL_IDENTIFICATIONS: &str = "remod.applyAllIdentifications";
pub const APPLY_WORKSPACE_IDENTIFICATIONS: &str = "remod.applyWorkspaceIdentifications";

/// executeCommand で公開するコマンド一覧
pub fn command_names() -> Vec<String> {
    vec![
        APPLY_IDENTIFICATION.to_string(),
        APPLY_ALL_IDENTIFICATIONS.to_string(),
        APPLY_WORKSPACE_IDENTIFICATIONS.to_string(),
    ]
}

/// `remod.applyIdentification` の引数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyIdentificationArgs {
    pub uri: Url,
    pub binding_name: String,
    /// CodeLens を作ったときのドキュメントバージョン
    pub version: i32,
}

/// `remod.applyAllIdentifications` の引数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyAllArgs {
    pub uri: Url,
    pub version: i32,
}

/// コマンド引数の先頭要素をデシリアライズする
pub fn parse_arguments<T: DeserializeOwned>(arguments: &[Value]) -> Result<T, ServerError> {
    let first = arguments
        .first()
        .ok_or_else(|| ServerError::InvalidArguments("missing argument object".to_string()))?;
    serde_json::from_value(first.clone()).map_err(|e| ServerError::InvalidArguments(e.to_string()))
}

/// 1ドキュメント分の TextDocumentEdit を作る
///
/// `version` を付けるとクライアント側でバージョン不一致の編集が拒否される
pub fn document_edit(uri: Url, version: Option<i32>, edits: Vec<TextEdit>) -> TextDocumentEdit {
    TextDocumentEdit {
        text_document: OptionalVersionedTextDocumentIdentifier { uri, version },
        edits: edits.into_iter().map(OneOf::Left).collect(),
    }
}

pub fn workspace_edit(document_edits: Vec<TextDocumentEdit>) -> WorkspaceEdit {
    WorkspaceEdit {
        changes: None,
        document_changes: Some(DocumentChanges::Edits(document_edits)),
        change_annotations: None,
    }
}

/// displayName 適用コマンドのハンドラー
pub struct IdentificationCommandHandler {
    store: Arc<DocumentStore>,
    prefix: String,
}

impl IdentificationCommandHandler {
    pub fn new(store: Arc<DocumentStore>, prefix: String) -> Self {
        Self { store, prefix }
    }

    /// 指定コンポーネント1つ分の編集を計算する
    ///
    /// 既に最新なら `None`
    pub fn apply_identification(
        &self,
        args: &ApplyIdentificationArgs,
    ) -> Result<Option<WorkspaceEdit>, ServerError> {
        let analysis = self.current_analysis(&args.uri, args.version)?;
        let candidate = analysis
            .candidate(&args.binding_name)
            .ok_or_else(|| ServerError::UnknownComponent(args.binding_name.clone()))?;

        let identification = synthesize(&candidate.binding_name, &self.prefix);
        let line_ending = analysis.line_index.line_ending();
        let Some(edit) = generate(candidate, &identification, line_ending).into_edit() else {
            debug!("{}: '{}' is up to date", args.uri, args.binding_name);
            return Ok(None);
        };

        Ok(Some(workspace_edit(vec![document_edit(
            args.uri.clone(),
            Some(analysis.version),
            vec![edit.to_text_edit(&analysis.line_index)],
        )])))
    }

    /// ドキュメント内の全コンポーネントの編集をまとめて計算する
    pub fn apply_all(&self, args: &ApplyAllArgs) -> Result<Option<WorkspaceEdit>, ServerError> {
        let analysis = self.current_analysis(&args.uri, args.version)?;
        let edits = generate_all(
            analysis.candidates(),
            &self.prefix,
            analysis.line_index.line_ending(),
        );
        if edits.is_empty() {
            return Ok(None);
        }

        let text_edits = edits
            .iter()
            .map(|edit| edit.to_text_edit(&analysis.line_index))
            .collect();
        Ok(Some(workspace_edit(vec![document_edit(
            args.uri.clone(),
            Some(analysis.version),
            text_edits,
        )])))
    }

    /// ドキュメントがクライアントの見たバージョンのままか確認する
    ///
    /// 編集の計算前と、計算後にクライアントへ送る直前の両方で呼ぶ
    pub fn ensure_current(&self, uri: &Url, version: i32) -> Result<(), ServerError> {
        let current = self
            .store
            .version(uri)
            .ok_or_else(|| ServerError::DocumentNotOpen(uri.clone()))?;
        if current != version {
            warn!("{}: stale command for version {} (current {})", uri, version, current);
            return Err(ServerError::StaleRequest {
                expected: version,
                actual: current,
            });
        }
        Ok(())
    }

    /// クライアントが見たバージョンの解析結果を取得する
    ///
    /// バージョンが変わっていれば StaleRequest
    fn current_analysis(&self, uri: &Url, version: i32) -> Result<Arc<DocumentAnalysis>, ServerError> {
        self.ensure_current(uri, version)?;

        let analysis = self
            .store
            .analyze(uri)
            .ok_or_else(|| ServerError::DocumentNotOpen(uri.clone()))?;
        if analysis.version != version {
            return Err(ServerError::StaleRequest {
                expected: version,
                actual: analysis.version,
            });
        }
        if let Some(err) = analysis.parse_error() {
            return Err(ServerError::ParseFailure(err.clone()));
        }
        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn uri() -> Url {
        Url::parse("file:///src/Foo.tsx").unwrap()
    }

    fn handler(text: &str) -> IdentificationCommandHandler {
        let store = Arc::new(DocumentStore::new());
        store.open(uri(), 7, text, "typescriptreact");
        IdentificationCommandHandler::new(store, "X_".to_string())
    }

    fn handler_with_store(text: &str) -> (IdentificationCommandHandler, Arc<DocumentStore>) {
        let store = Arc::new(DocumentStore::new());
        store.open(uri(), 7, text, "typescriptreact");
        (IdentificationCommandHandler::new(Arc::clone(&store), "X_".to_string()), store)
    }

    fn text_edits(edit: &WorkspaceEdit) -> Vec<TextEdit> {
        match &edit.document_changes {
            Some(DocumentChanges::Edits(docs)) => docs
                .iter()
                .flat_map(|doc| doc.edits.iter())
                .map(|e| match e {
                    OneOf::Left(edit) => edit.clone(),
                    OneOf::Right(annotated) => annotated.text_edit.clone(),
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    fn args(name: &str, version: i32) -> ApplyIdentificationArgs {
        ApplyIdentificationArgs {
            uri: uri(),
            binding_name: name.to_string(),
            version,
        }
    }

    #[test]
    fn test_insert_edit_is_versioned() {
        let handler = handler("const Foo = (props) => { return <div/>; };");
        let edit = handler.apply_identification(&args("Foo", 7)).unwrap().unwrap();

        let Some(DocumentChanges::Edits(docs)) = &edit.document_changes else {
            panic!("expected document edits");
        };
        assert_eq!(docs[0].text_document.version, Some(7));

        let edits = text_edits(&edit);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].new_text, "\nFoo.displayName = \"X_Foo\";");
        assert_eq!(edits[0].range.start, edits[0].range.end);
    }

    #[test]
    fn test_stale_version_is_rejected() {
        let handler = handler("const Foo = () => <div/>;");
        let err = handler.apply_identification(&args("Foo", 6)).unwrap_err();
        assert!(matches!(
            err,
            ServerError::StaleRequest {
                expected: 6,
                actual: 7
            }
        ));
    }

    #[test]
    fn test_edit_computed_before_change_is_stale() {
        let (handler, store) = handler_with_store("const Foo = () => <div/>;");
        let edit = handler.apply_identification(&args("Foo", 7)).unwrap();
        assert!(edit.is_some());
        handler.ensure_current(&uri(), 7).unwrap();

        assert!(store.change(&uri(), 8, "const Foo = () => <span/>;"));
        let err = handler.ensure_current(&uri(), 7).unwrap_err();
        assert!(matches!(
            err,
            ServerError::StaleRequest {
                expected: 7,
                actual: 8
            }
        ));

        store.close(&uri());
        let err = handler.ensure_current(&uri(), 8).unwrap_err();
        assert!(matches!(err, ServerError::DocumentNotOpen(_)));
    }

    #[test]
    fn test_unknown_component() {
        let handler = handler("const Foo = () => <div/>;");
        let err = handler.apply_identification(&args("Bar", 7)).unwrap_err();
        assert!(matches!(err, ServerError::UnknownComponent(name) if name == "Bar"));
    }

    #[test]
    fn test_up_to_date_component_yields_no_edit() {
        let handler = handler("const Foo = () => <div/>;\nFoo.displayName = \"X_Foo\";\n");
        assert!(handler.apply_identification(&args("Foo", 7)).unwrap().is_none());
    }

    #[test]
    fn test_parse_failure_is_reported() {
        let handler = handler("const Foo = () => { return <div>; ");
        let err = handler.apply_identification(&args("Foo", 7)).unwrap_err();
        assert!(matches!(err, ServerError::ParseFailure(_)));
    }

    #[test]
    fn test_closed_document() {
        let store = Arc::new(DocumentStore::new());
        let handler = IdentificationCommandHandler::new(store, "X_".to_string());
        let err = handler.apply_identification(&args("Foo", 1)).unwrap_err();
        assert!(matches!(err, ServerError::DocumentNotOpen(_)));
    }

    #[test]
    fn test_apply_all_batches_edits() {
        let handler = handler(
            "const A = () => <a/>;\nfunction B() { return <b/>; }\nB.displayName = \"OLD\";\n",
        );
        let edit = handler
            .apply_all(&ApplyAllArgs { uri: uri(), version: 7 })
            .unwrap()
            .unwrap();
        let edits = text_edits(&edit);
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0].new_text, "\nA.displayName = \"X_A\";");
        assert_eq!(edits[1].new_text, "\"X_B\"");
    }

    #[test]
    fn test_parse_arguments() {
        let parsed: ApplyIdentificationArgs = parse_arguments(&[json!({
            "uri": "file:///src/Foo.tsx",
            "bindingName": "Foo",
            "version": 3
        })])
        .unwrap();
        assert_eq!(parsed.binding_name, "Foo");
        assert_eq!(parsed.version, 3);

        let missing = parse_arguments::<ApplyIdentificationArgs>(&[]);
        assert!(matches!(missing, Err(ServerError::InvalidArguments(_))));
    }
}
