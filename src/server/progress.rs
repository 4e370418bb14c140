use tower_lsp::lsp_types::notification;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;
use tracing::debug;

/// work done progress の送信ヘルパー
pub struct Progress<'c> {
    client: &'c Client,
    token: NumberOrString,
}

impl<'c> Progress<'c> {
    /// トークンを作成して begin を送る
    ///
    /// クライアントが進捗表示に対応していなくても処理は続行する
    pub async fn begin(client: &'c Client, token_name: &str, title: &str, message: Option<String>) -> Self {
        let token = NumberOrString::String(token_name.to_string());
        if let Err(e) = client
            .send_request::<request::WorkDoneProgressCreate>(WorkDoneProgressCreateParams {
                token: token.clone(),
            })
            .await
        {
            debug!("workDoneProgress/create failed: {}", e);
        }

        let progress = Self { client, token };
        progress
            .send(WorkDoneProgress::Begin(WorkDoneProgressBegin {
                title: title.to_string(),
                cancellable: Some(false),
                message,
                percentage: Some(0),
            }))
            .await;
        progress
    }

    pub async fn report(&self, done: usize, total: usize) {
        let percentage = if total == 0 {
            100
        } else {
            (done * 100 / total) as u32
        };
        self.send(WorkDoneProgress::Report(WorkDoneProgressReport {
            cancellable: Some(false),
            message: Some(format!("{}/{} files", done, total)),
            percentage: Some(percentage),
        }))
        .await;
    }

    pub async fn end(self, message: String) {
        self.send(WorkDoneProgress::End(WorkDoneProgressEnd {
            message: Some(message),
        }))
        .await;
    }

    async fn send(&self, value: WorkDoneProgress) {
        self.client
            .send_notification::<notification::Progress>(ProgressParams {
                token: self.token.clone(),
                value: ProgressParamsValue::WorkDone(value),
            })
            .await;
    }
}
