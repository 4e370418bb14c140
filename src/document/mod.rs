mod source_model;
mod store;

pub use source_model::{AnalysisOutcome, DocumentAnalysis, DocumentState, SourceModel};
pub use store::DocumentStore;
