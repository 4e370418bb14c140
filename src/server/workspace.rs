use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tower_lsp::lsp_types::{TextDocumentEdit, Url};
use tracing::{debug, warn};

use crate::config::PathMatcher;
use crate::document::DocumentStore;
use crate::edit::generate_all;
use crate::error::AnalyzerError;
use crate::handlers::document_edit;
use crate::model::LineIndex;
use crate::util::is_tsx_path;

/// ワークスペースからTSXファイルを収集する
pub fn collect_files(dir: &Path, root: &Path, path_matcher: Option<&PathMatcher>, files: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut entries: Vec<_> = entries.flatten().map(|entry| entry.path()).collect();
    // 走査順を固定する
    entries.sort();

    for path in entries {
        let relative_path = path.strip_prefix(root).unwrap_or(&path);

        if path.is_dir() {
            let traverse = match path_matcher {
                Some(matcher) => matcher.should_traverse_dir(relative_path),
                None => path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| {
                        !(name.starts_with('.') || name == "node_modules" || name == "dist" || name == "build")
                    }),
            };
            if traverse {
                collect_files(&path, root, path_matcher, files);
            }
        } else {
            let included = match path_matcher {
                Some(matcher) => matcher.is_target_file(relative_path),
                None => is_tsx_path(&path),
            };
            if included {
                files.push(path);
            }
        }
    }
}

/// 1ファイル分の一括編集の計算結果
#[derive(Debug)]
pub enum FilePlan {
    Edit { edit: TextDocumentEdit, count: usize },
    UpToDate,
    ParseFailure(AnalyzerError),
    Skipped,
}

/// ファイル1つ分の displayName 編集を計算する
///
/// オープン中のドキュメントはエディタ上のテキストとバージョンを使い、
/// それ以外はディスクの内容をバージョンなしで扱う
pub fn plan_file_edit(store: &Arc<DocumentStore>, path: &Path, prefix: &str) -> FilePlan {
    let Ok(uri) = Url::from_file_path(path) else {
        warn!("Skipping non-absolute path {:?}", path);
        return FilePlan::Skipped;
    };

    let (version, line_index, result) = if store.is_open(&uri) {
        let Some(analysis) = store.analyze(&uri) else {
            return FilePlan::Skipped;
        };
        let result = match analysis.parse_error() {
            Some(err) => Err(err.clone()),
            None => Ok(analysis.candidates().to_vec()),
        };
        (Some(analysis.version), analysis.line_index.clone(), result)
    } else {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read {:?}: {}", path, e);
                return FilePlan::Skipped;
            }
        };
        let result = store.analyzer().analyze_source(&text);
        (None, LineIndex::new(Arc::from(text)), result)
    };

    let candidates = match result {
        Ok(candidates) => candidates,
        Err(err) => {
            warn!("{}: {}", uri, err);
            return FilePlan::ParseFailure(err);
        }
    };

    let edits = generate_all(&candidates, prefix, line_index.line_ending());
    debug!("{}: {} of {} components need an edit", uri, edits.len(), candidates.len());
    if edits.is_empty() {
        return FilePlan::UpToDate;
    }

    let count = edits.len();
    let text_edits = edits.iter().map(|edit| edit.to_text_edit(&line_index)).collect();
    FilePlan::Edit {
        edit: document_edit(uri, version, text_edits),
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemodConfig;
    use tower_lsp::lsp_types::OneOf;

    fn write(root: &Path, relative: &str, content: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_collect_files_honors_excludes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(root, "src/App.tsx", "");
        write(root, "src/util.ts", "");
        write(root, "src/nested/Card.tsx", "");
        write(root, "node_modules/lib/Button.tsx", "");
        write(root, ".cache/Stale.tsx", "");

        let matcher = RemodConfig::default().create_path_matcher().unwrap();
        let mut files = Vec::new();
        collect_files(root, root, Some(&matcher), &mut files);

        let relative: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();
        assert_eq!(relative, vec!["src/App.tsx", "src/nested/Card.tsx"]);
    }

    #[test]
    fn test_plan_unopened_file_uses_disk_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "Foo.tsx", "const Foo = () => <div/>;\n");
        let store = Arc::new(DocumentStore::new());

        let FilePlan::Edit { edit, count } = plan_file_edit(&store, &path, "X_") else {
            panic!("expected an edit");
        };
        assert_eq!(count, 1);
        assert_eq!(edit.text_document.version, None);
        let OneOf::Left(text_edit) = &edit.edits[0] else {
            panic!("expected a plain text edit");
        };
        assert_eq!(text_edit.new_text, "\nFoo.displayName = \"X_Foo\";");
    }

    #[test]
    fn test_plan_open_document_uses_live_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "Foo.tsx", "const Foo = () => <div/>;\n");
        let store = Arc::new(DocumentStore::new());
        let uri = Url::from_file_path(&path).unwrap();
        store.open(
            uri,
            4,
            "const Foo = () => <div/>;\nFoo.displayName = \"X_Foo\";\n",
            "typescriptreact",
        );

        assert!(matches!(plan_file_edit(&store, &path, "X_"), FilePlan::UpToDate));
    }

    #[test]
    fn test_plan_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "Broken.tsx", "const Foo = () => { return <div>; ");
        let store = Arc::new(DocumentStore::new());
        assert!(matches!(
            plan_file_edit(&store, &path, "X_"),
            FilePlan::ParseFailure(_)
        ));
    }
}
