use tower_lsp::lsp_types::TextEdit;
use tracing::warn;

use super::name::synthesize;
use crate::model::{
    ComponentCandidate, IdentificationValue, LineIndex, TextRange, IDENTIFICATION_PROPERTY,
};

/// 1つの候補に対するテキスト編集
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentificationEdit {
    pub binding_name: String,
    pub range: TextRange,
    pub new_text: String,
}

impl IdentificationEdit {
    pub fn to_text_edit(&self, line_index: &LineIndex) -> TextEdit {
        TextEdit {
            range: line_index.range(self.range),
            new_text: self.new_text.clone(),
        }
    }
}

/// 編集計画
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditPlan {
    /// 宣言直後に displayName 文を挿入
    Insert(IdentificationEdit),
    /// 既存 displayName のリテラルだけを置換
    Replace(IdentificationEdit),
    /// 既に正しい値（または計算値で書き換え対象外）
    NoOp,
}

impl EditPlan {
    pub fn edit(&self) -> Option<&IdentificationEdit> {
        match self {
            EditPlan::Insert(edit) | EditPlan::Replace(edit) => Some(edit),
            EditPlan::NoOp => None,
        }
    }

    pub fn into_edit(self) -> Option<IdentificationEdit> {
        match self {
            EditPlan::Insert(edit) | EditPlan::Replace(edit) => Some(edit),
            EditPlan::NoOp => None,
        }
    }
}

/// 候補と displayName の値から編集を計算する
///
/// `line_ending` は挿入文の前に置く改行コード
pub fn generate(candidate: &ComponentCandidate, identification: &str, line_ending: &str) -> EditPlan {
    let plan = match &candidate.existing_identification {
        None => EditPlan::Insert(IdentificationEdit {
            binding_name: candidate.binding_name.clone(),
            range: TextRange::empty(candidate.insertion_point),
            new_text: format!(
                "{}{}.{} = \"{}\";",
                line_ending,
                candidate.binding_name,
                IDENTIFICATION_PROPERTY,
                escape_literal(identification, '"')
            ),
        }),
        Some(existing) => match &existing.value {
            IdentificationValue::Literal { value, range, quote } => {
                let expected = escape_literal(identification, *quote);
                if *value == expected {
                    EditPlan::NoOp
                } else {
                    EditPlan::Replace(IdentificationEdit {
                        binding_name: candidate.binding_name.clone(),
                        range: *range,
                        new_text: format!("{quote}{expected}{quote}"),
                    })
                }
            }
            IdentificationValue::Computed => EditPlan::NoOp,
        },
    };

    // 無関係な代入文には触れない
    if let Some(edit) = plan.edit() {
        let touches_sibling = candidate.trailing_sibling_assignments.iter().any(|sibling| {
            sibling.range.overlaps(&edit.range)
                || (sibling.range.start < edit.range.start && sibling.range.contains(edit.range.start))
        });
        if touches_sibling {
            warn!(
                "edit for '{}' would touch a sibling assignment; skipped",
                candidate.binding_name
            );
            return EditPlan::NoOp;
        }
    }
    plan
}

/// ドキュメント内の全候補の編集をまとめて計算する（NoOpは除外）
pub fn generate_all(candidates: &[ComponentCandidate], prefix: &str, line_ending: &str) -> Vec<IdentificationEdit> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let identification = synthesize(&candidate.binding_name, prefix);
            generate(candidate, &identification, line_ending).into_edit()
        })
        .collect()
}

/// クォート文字に合わせてリテラル内容をエスケープする
fn escape_literal(value: &str, quote: char) -> String {
    let mut escaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '$' if quote == '`' && chars.peek() == Some(&'{') => escaped.push_str("\\$"),
            c if c == quote => {
                escaped.push('\\');
                escaped.push(c);
            }
            c => escaped.push(c),
        }
    }
    escaped
}
