mod progress;
pub mod workspace;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::{self, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::config::{InitializationOptions, RemodConfig, Settings};
use crate::diagnostics::DiagnosticsHandler;
use crate::document::DocumentStore;
use crate::error::ServerError;
use crate::handlers::{
    command_names, parse_arguments, workspace_edit, ApplyAllArgs, ApplyIdentificationArgs,
    CodeLensHandler, IdentificationCommandHandler, APPLY_ALL_IDENTIFICATIONS,
    APPLY_IDENTIFICATION, APPLY_WORKSPACE_IDENTIFICATIONS,
};
use crate::util::is_tsx_document;

use progress::Progress;
use workspace::{collect_files, plan_file_edit, FilePlan};

/// ワークスペース一括適用で1回の blocking タスクが扱うファイル数
const WORKSPACE_CHUNK_SIZE: usize = 32;

pub struct Backend {
    client: Client,
    store: Arc<DocumentStore>,
    root_uri: RwLock<Option<Url>>,
    init_options: RwLock<Option<InitializationOptions>>,
    settings: Arc<RwLock<Settings>>,
}

/// CPU負荷の高い処理を blocking スレッドで実行する
///
/// 呼び出し元の future が破棄されてもタスク自体は最後まで走り、解析キャッシュに結果が残る
async fn run_blocking<T, F>(f: F) -> std::result::Result<T, ServerError>
where
    F: FnOnce() -> std::result::Result<T, ServerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Task(e.to_string()))?
}

#[derive(Debug, Default)]
struct WorkspaceSummary {
    files: usize,
    edits: usize,
    parse_failures: usize,
    document_edits: Vec<TextDocumentEdit>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            store: Arc::new(DocumentStore::new()),
            root_uri: RwLock::new(None),
            init_options: RwLock::new(None),
            settings: Arc::new(RwLock::new(Settings::default())),
        }
    }

    /// `remod/initialize` 通知（クライアント側の機能ネゴシエーション完了）
    pub async fn client_ready(&self) {
        info!("Client reported ready");
    }

    async fn publish_diagnostics(&self, uri: Url) {
        let config = self.settings.read().await.diagnostics.clone();
        let version = self.store.version(&uri);
        let store = Arc::clone(&self.store);
        let diagnose_uri = uri.clone();
        match run_blocking(move || Ok(DiagnosticsHandler::new(store, config).diagnose(&diagnose_uri))).await {
            Ok(diagnostics) => {
                self.client
                    .publish_diagnostics(uri, diagnostics, version)
                    .await;
            }
            Err(e) => warn!("Failed to compute diagnostics for {}: {}", uri, e),
        }
    }

    async fn apply_identification(&self, arguments: &[Value]) -> std::result::Result<Option<WorkspaceEdit>, ServerError> {
        let args: ApplyIdentificationArgs = parse_arguments(arguments)?;
        let prefix = self.settings.read().await.identification_prefix.clone();
        let handler = Arc::new(IdentificationCommandHandler::new(Arc::clone(&self.store), prefix));
        let (uri, version) = (args.uri.clone(), args.version);

        let worker = Arc::clone(&handler);
        let edit = run_blocking(move || worker.apply_identification(&args)).await?;
        // 計算中に didChange が来ていないか
        handler.ensure_current(&uri, version)?;
        Ok(edit)
    }

    async fn apply_all_identifications(&self, arguments: &[Value]) -> std::result::Result<Option<WorkspaceEdit>, ServerError> {
        let args: ApplyAllArgs = parse_arguments(arguments)?;
        let prefix = self.settings.read().await.identification_prefix.clone();
        let handler = Arc::new(IdentificationCommandHandler::new(Arc::clone(&self.store), prefix));
        let (uri, version) = (args.uri.clone(), args.version);

        let worker = Arc::clone(&handler);
        let edit = run_blocking(move || worker.apply_all(&args)).await?;
        handler.ensure_current(&uri, version)?;
        Ok(edit)
    }

    /// ワークスペース内の対象TSXファイル全てに displayName を適用する
    async fn apply_workspace_identifications(&self) -> std::result::Result<Option<WorkspaceEdit>, ServerError> {
        let root_uri = self
            .root_uri
            .read()
            .await
            .clone()
            .ok_or_else(|| ServerError::InvalidArguments("no workspace root".to_string()))?;
        let root_path = root_uri
            .to_file_path()
            .map_err(|_| ServerError::InvalidArguments(format!("workspace root is not a local path: {}", root_uri)))?;
        let (prefix, path_matcher) = {
            let settings = self.settings.read().await;
            (settings.identification_prefix.clone(), settings.path_matcher.clone())
        };

        let progress = Progress::begin(
            &self.client,
            "remod-workspace",
            "Applying displayName",
            Some("Collecting files...".to_string()),
        )
        .await;

        let result = async {
            let files = run_blocking(move || {
                let mut files = Vec::new();
                collect_files(&root_path, &root_path, path_matcher.as_ref(), &mut files);
                Ok(files)
            })
            .await?;
            self.plan_workspace(files, prefix, &progress).await
        }
        .await;

        let summary = match result {
            Ok(summary) => summary,
            Err(e) => {
                progress.end(format!("Failed: {}", e)).await;
                return Err(e);
            }
        };

        let message = format!(
            "{} edits in {} of {} files ({} files could not be parsed)",
            summary.edits,
            summary.document_edits.len(),
            summary.files,
            summary.parse_failures
        );
        info!("Workspace displayName: {}", message);
        progress.end(message.clone()).await;
        self.client.log_message(MessageType::INFO, message).await;

        if summary.document_edits.is_empty() {
            Ok(None)
        } else {
            Ok(Some(workspace_edit(summary.document_edits)))
        }
    }

    async fn plan_workspace(
        &self,
        files: Vec<PathBuf>,
        prefix: String,
        progress: &Progress<'_>,
    ) -> std::result::Result<WorkspaceSummary, ServerError> {
        let mut summary = WorkspaceSummary {
            files: files.len(),
            ..Default::default()
        };

        let mut done = 0;
        for chunk in files.chunks(WORKSPACE_CHUNK_SIZE) {
            let store = Arc::clone(&self.store);
            let chunk = chunk.to_vec();
            let prefix = prefix.clone();
            let plans = run_blocking(move || {
                Ok(chunk
                    .iter()
                    .map(|path| plan_file_edit(&store, path, &prefix))
                    .collect::<Vec<_>>())
            })
            .await?;

            done += plans.len();
            for plan in plans {
                match plan {
                    FilePlan::Edit { edit, count } => {
                        summary.edits += count;
                        summary.document_edits.push(edit);
                    }
                    FilePlan::ParseFailure(_) => summary.parse_failures += 1,
                    FilePlan::UpToDate | FilePlan::Skipped => {}
                }
            }
            progress.report(done, summary.files).await;
        }
        Ok(summary)
    }

    /// クライアントに編集を適用させる
    ///
    /// 拒否された場合は EditConflict。再適用はクライアントからのやり直しに任せる
    async fn send_edit(&self, edit: WorkspaceEdit) -> std::result::Result<Option<Value>, ServerError> {
        let response = self
            .client
            .apply_edit(edit.clone())
            .await
            .map_err(|e| ServerError::Client(e.to_string()))?;

        if !response.applied {
            let reason = response
                .failure_reason
                .unwrap_or_else(|| "client rejected the edit".to_string());
            warn!("workspace/applyEdit rejected: {}", reason);
            return Err(ServerError::EditConflict(reason));
        }
        Ok(serde_json::to_value(&edit).ok())
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let options = InitializationOptions::from_value(params.initialization_options).map_err(|e| {
            warn!("Rejecting initialization options: {}", e);
            jsonrpc::Error::invalid_params(e.to_string())
        })?;
        *self.init_options.write().await = options;

        let root = params.root_uri.or_else(|| {
            params
                .workspace_folders
                .as_ref()?
                .first()
                .map(|f| f.uri.clone())
        });
        *self.root_uri.write().await = root;

        Ok(InitializeResult {
            server_info: Some(ServerInfo {
                name: "remod-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                code_lens_provider: Some(CodeLensOptions {
                    resolve_provider: Some(false),
                }),
                execute_command_provider: Some(ExecuteCommandOptions {
                    commands: command_names(),
                    work_done_progress_options: Default::default(),
                }),
                ..Default::default()
            },
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        let root_uri = self.root_uri.read().await.clone();
        let config = match root_uri.as_ref().and_then(|uri| uri.to_file_path().ok()) {
            Some(path) => RemodConfig::load_from_dir(&path),
            None => RemodConfig::default(),
        };

        let options = self.init_options.read().await.clone();
        let settings = Settings::resolve(&config, options.as_ref());
        self.client
            .log_message(
                MessageType::INFO,
                format!(
                    "remod-lsp initialized (displayName prefix: {})",
                    settings.identification_prefix
                ),
            )
            .await;
        if !config.include.is_empty() {
            debug!("Include patterns: {:?}", config.include);
        }
        debug!("Exclude patterns: {:?}", config.excludes());

        *self.settings.write().await = settings;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        let analyzable = is_tsx_document(&document.uri, &document.language_id);
        self.store.open(
            document.uri.clone(),
            document.version,
            &document.text,
            &document.language_id,
        );
        if analyzable {
            self.publish_diagnostics(document.uri).await;
        }
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;
        // FULL sync なので最初の変更が全文
        let Some(change) = params.content_changes.into_iter().next() else {
            return;
        };
        // 解析中のドキュメントはロック待ちになるため blocking スレッドで反映する
        let store = Arc::clone(&self.store);
        let change_uri = uri.clone();
        match run_blocking(move || Ok(store.change(&change_uri, version, &change.text))).await {
            Ok(true) => {}
            Ok(false) => warn!("didChange for unopened document {}", uri),
            Err(e) => warn!("Failed to apply change to {}: {}", uri, e),
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        if self.store.close(&uri) {
            self.client.publish_diagnostics(uri, Vec::new(), None).await;
        }
    }

    async fn code_lens(&self, params: CodeLensParams) -> Result<Option<Vec<CodeLens>>> {
        let uri = params.text_document.uri;
        let prefix = self.settings.read().await.identification_prefix.clone();
        let store = Arc::clone(&self.store);
        let lens_uri = uri.clone();

        let lenses = run_blocking(move || Ok(CodeLensHandler::new(store, prefix).code_lens(&lens_uri))).await?;
        // 解析結果はキャッシュ済み
        self.publish_diagnostics(uri).await;
        Ok(lenses)
    }

    async fn execute_command(&self, params: ExecuteCommandParams) -> Result<Option<Value>> {
        let edit = match params.command.as_str() {
            APPLY_IDENTIFICATION => self.apply_identification(&params.arguments).await,
            APPLY_ALL_IDENTIFICATIONS => self.apply_all_identifications(&params.arguments).await,
            APPLY_WORKSPACE_IDENTIFICATIONS => self.apply_workspace_identifications().await,
            _ => {
                self.client
                    .log_message(
                        MessageType::WARNING,
                        format!("Unknown command: {}", params.command),
                    )
                    .await;
                return Ok(None);
            }
        };

        let result = match edit {
            Ok(Some(edit)) => self.send_edit(edit).await,
            Ok(None) => {
                debug!("{}: nothing to apply", params.command);
                Ok(None)
            }
            Err(e) => Err(e),
        };
        result.map_err(|e| {
            warn!("{} failed: {}", params.command, e);
            jsonrpc::Error::from(e)
        })
    }
}
