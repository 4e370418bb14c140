use tree_sitter::Node;

use super::ComponentAnalyzer;
use super::component::{named_children, unwrap_parens};
use crate::model::{IdentificationValue, TextRange};

/// トップレベルの `Object.property = value;` 文
#[derive(Debug, Clone)]
pub(super) struct TopLevelAssignment {
    pub(super) object: String,
    pub(super) property: String,
    pub(super) statement_range: TextRange,
    pub(super) value: IdentificationValue,
}

impl ComponentAnalyzer {
    /// 式文が識別子のプロパティへの代入であれば抽出する
    ///
    /// 認識パターン:
    /// - `Foo.displayName = "Foo";`
    /// - `Foo.defaultProps = { ... };`
    pub(super) fn extract_property_assignment(&self, statement: Node, source: &str) -> Option<TopLevelAssignment> {
        if statement.kind() != "expression_statement" {
            return None;
        }
        let expr = named_children(statement).into_iter().next()?;
        if expr.kind() != "assignment_expression" {
            return None;
        }

        let left = expr.child_by_field_name("left")?;
        if left.kind() != "member_expression" {
            return None;
        }
        let object = left.child_by_field_name("object")?;
        let property = left.child_by_field_name("property")?;
        if object.kind() != "identifier" || property.kind() != "property_identifier" {
            return None;
        }
        let right = expr.child_by_field_name("right")?;

        Some(TopLevelAssignment {
            object: self.node_text(object, source).to_string(),
            property: self.node_text(property, source).to_string(),
            statement_range: TextRange::of_node(statement),
            value: self.literal_value(right, source),
        })
    }

    /// 代入の右辺から文字列リテラルの値を取得する
    ///
    /// 置換のない template string もリテラルとして扱う
    fn literal_value(&self, right: Node, source: &str) -> IdentificationValue {
        let right = unwrap_parens(right);
        let is_literal = match right.kind() {
            "string" => true,
            "template_string" => named_children(right)
                .iter()
                .all(|child| child.kind() != "template_substitution"),
            _ => false,
        };
        if !is_literal {
            return IdentificationValue::Computed;
        }

        let raw = self.node_text(right, source);
        let Some(quote) = raw.chars().next() else {
            return IdentificationValue::Computed;
        };
        if raw.len() < 2 {
            return IdentificationValue::Computed;
        }
        IdentificationValue::Literal {
            value: raw[1..raw.len() - 1].to_string(),
            range: TextRange::of_node(right),
            quote,
        }
    }
}
