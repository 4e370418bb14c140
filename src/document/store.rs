use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tower_lsp::lsp_types::Url;
use tracing::debug;

use super::source_model::{DocumentAnalysis, DocumentState, SourceModel};
use crate::analyzer::ComponentAnalyzer;
use crate::util::is_tsx_document;

/// ストア内の1ドキュメント
///
/// バージョンはロックなしで読めるよう、モデルの外にも保持する
struct Document {
    version: AtomicI32,
    model: Mutex<SourceModel>,
}

impl Document {
    fn lock(&self) -> MutexGuard<'_, SourceModel> {
        self.model.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// オープン中ドキュメントのストア
///
/// ドキュメントごとに Mutex で直列化し、異なるドキュメントは並行に解析できる。
/// 解析中はロックが長く保持されるので、`version` / `is_open` 以外は
/// ブロッキングスレッドから呼ぶこと
pub struct DocumentStore {
    documents: DashMap<Url, Arc<Document>>,
    analyzer: ComponentAnalyzer,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
            analyzer: ComponentAnalyzer::new(),
        }
    }

    fn get(&self, uri: &Url) -> Option<Arc<Document>> {
        self.documents.get(uri).map(|entry| Arc::clone(entry.value()))
    }

    pub fn open(&self, uri: Url, version: i32, text: &str, language_id: &str) {
        let analyzable = is_tsx_document(&uri, language_id);
        debug!("open {} (version {}, analyzable: {})", uri, version, analyzable);
        let model = SourceModel::new(uri.clone(), version, text, analyzable);
        self.documents.insert(
            uri,
            Arc::new(Document {
                version: AtomicI32::new(version),
                model: Mutex::new(model),
            }),
        );
    }

    /// テキスト変更を反映する。未オープンなら false
    pub fn change(&self, uri: &Url, version: i32, text: &str) -> bool {
        match self.get(uri) {
            Some(document) => {
                let mut model = document.lock();
                model.replace_text(version, text);
                document.version.store(model.version(), Ordering::Release);
                true
            }
            None => false,
        }
    }

    /// ドキュメントを閉じ、キャッシュを含む全状態を破棄する
    pub fn close(&self, uri: &Url) -> bool {
        self.documents.remove(uri).is_some()
    }

    /// 現在のバージョンを解析する
    ///
    /// 同一ドキュメントの解析は直列化される。呼び出し元がキャンセルされても
    /// 結果はキャッシュに残る
    pub fn analyze(&self, uri: &Url) -> Option<Arc<DocumentAnalysis>> {
        let document = self.get(uri)?;
        let mut model = document.lock();
        Some(model.analyze(&self.analyzer))
    }

    /// 最新のバージョン（解析中でもブロックしない）
    pub fn version(&self, uri: &Url) -> Option<i32> {
        self.get(uri)
            .map(|document| document.version.load(Ordering::Acquire))
    }

    pub fn state(&self, uri: &Url) -> Option<DocumentState> {
        self.get(uri).map(|document| document.lock().state())
    }

    pub fn is_open(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri)
    }

    pub fn analyzer(&self) -> &ComponentAnalyzer {
        &self.analyzer
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}
