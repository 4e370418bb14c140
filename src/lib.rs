pub mod analyzer;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod edit;
pub mod error;
pub mod handlers;
pub mod model;
pub mod server;
pub mod util;
