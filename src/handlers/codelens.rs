use std::sync::Arc;

use serde::Serialize;
use tower_lsp::lsp_types::*;

use super::command::{ApplyAllArgs, ApplyIdentificationArgs, APPLY_ALL_IDENTIFICATIONS, APPLY_IDENTIFICATION};
use crate::document::{DocumentAnalysis, DocumentStore};
use crate::edit::{generate, synthesize, EditPlan};
use crate::model::{ComponentCandidate, IdentificationValue};

pub struct CodeLensHandler {
    store: Arc<DocumentStore>,
    prefix: String,
}

impl CodeLensHandler {
    pub fn new(store: Arc<DocumentStore>, prefix: String) -> Self {
        Self { store, prefix }
    }

    /// コンポーネントごとの CodeLens を返す
    ///
    /// 編集が必要な候補が2つ以上あれば先頭に一括適用レンズを追加する
    pub fn code_lens(&self, uri: &Url) -> Option<Vec<CodeLens>> {
        let analysis = self.store.analyze(uri)?;
        let candidates = analysis.candidates();
        if candidates.is_empty() {
            return None;
        }

        let mut lenses = Vec::with_capacity(candidates.len() + 1);
        let mut actionable = 0;
        for candidate in candidates {
            let (lens, needs_edit) = self.create_candidate_lens(&analysis, candidate);
            if needs_edit {
                actionable += 1;
            }
            lenses.push(lens);
        }

        if actionable >= 2 {
            lenses.insert(0, self.create_apply_all_lens(&analysis, actionable));
        }
        Some(lenses)
    }

    fn create_candidate_lens(
        &self,
        analysis: &DocumentAnalysis,
        candidate: &ComponentCandidate,
    ) -> (CodeLens, bool) {
        let identification = synthesize(&candidate.binding_name, &self.prefix);
        let plan = generate(candidate, &identification, analysis.line_index.line_ending());

        let args = ApplyIdentificationArgs {
            uri: analysis.uri.clone(),
            binding_name: candidate.binding_name.clone(),
            version: analysis.version,
        };
        let command = match plan {
            EditPlan::Insert(_) => Command {
                title: format!("Add displayName \"{}\"", identification),
                command: APPLY_IDENTIFICATION.to_string(),
                arguments: arguments(&args),
            },
            EditPlan::Replace(_) => Command {
                title: format!("Update displayName to \"{}\"", identification),
                command: APPLY_IDENTIFICATION.to_string(),
                arguments: arguments(&args),
            },
            EditPlan::NoOp => {
                let title = match candidate
                    .existing_identification
                    .as_ref()
                    .map(|existing| &existing.value)
                {
                    Some(IdentificationValue::Computed) => "displayName (computed)".to_string(),
                    _ => format!("displayName \"{}\"", identification),
                };
                // 表示のみ
                Command {
                    title,
                    command: "".to_string(),
                    arguments: None,
                }
            }
        };
        let needs_edit = !command.command.is_empty();

        let lens = CodeLens {
            range: analysis.line_index.range(candidate.declaration_range),
            command: Some(command),
            data: None,
        };
        (lens, needs_edit)
    }

    fn create_apply_all_lens(&self, analysis: &DocumentAnalysis, count: usize) -> CodeLens {
        let args = ApplyAllArgs {
            uri: analysis.uri.clone(),
            version: analysis.version,
        };
        CodeLens {
            range: Range::default(),
            command: Some(Command {
                title: format!("Apply displayName to {} components", count),
                command: APPLY_ALL_IDENTIFICATIONS.to_string(),
                arguments: arguments(&args),
            }),
            data: None,
        }
    }
}

fn arguments<T: Serialize>(args: &T) -> Option<Vec<serde_json::Value>> {
    serde_json::to_value(args).ok().map(|value| vec![value])
}
