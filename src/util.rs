use std::path::Path;

use tower_lsp::lsp_types::Url;

/// TSXとして扱う languageId
pub const TSX_LANGUAGE_ID: &str = "typescriptreact";

/// ファイルがTSXかどうか判定
pub fn is_tsx_file(uri: &Url) -> bool {
    uri.path().to_lowercase().ends_with(".tsx")
}

/// パスがTSXかどうか判定
pub fn is_tsx_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("tsx"))
        .unwrap_or(false)
}

/// ドキュメントが解析対象かどうか判定（languageId か拡張子）
pub fn is_tsx_document(uri: &Url, language_id: &str) -> bool {
    language_id == TSX_LANGUAGE_ID || is_tsx_file(uri)
}
