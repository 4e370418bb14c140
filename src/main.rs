use tower_lsp::{LspService, Server};
use tracing_subscriber::EnvFilter;

use remod_lsp::server::Backend;

#[tokio::main]
async fn main() {
    // stdout はプロトコル用なのでログは stderr へ
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::build(Backend::new)
        .custom_method("remod/initialize", Backend::client_ready)
        .finish();

    Server::new(stdin, stdout, socket).serve(service).await;
}
