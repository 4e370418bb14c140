use phf::phf_set;
use tracing::debug;
use tree_sitter::Node;

use super::ComponentAnalyzer;
use crate::model::{DeclarationKind, ForwardRefVariant, TextRange};

/// 関数値として扱うノード種別
static FUNCTION_LIKE_KINDS: phf::Set<&'static str> = phf_set! {
    "arrow_function",
    "function_expression",
    "function",
};

/// トップレベル文から取り出したコンポーネント宣言
#[derive(Debug, Clone)]
pub(super) struct ComponentDeclaration {
    pub(super) binding_name: String,
    pub(super) kind: DeclarationKind,
    /// export を含む文全体
    pub(super) statement_range: TextRange,
}

pub(super) fn is_function_like(node: Node) -> bool {
    FUNCTION_LIKE_KINDS.contains(node.kind())
}

/// `( ... )` を外した中身を返す
pub(super) fn unwrap_parens<'t>(mut node: Node<'t>) -> Node<'t> {
    while node.kind() == "parenthesized_expression" {
        match named_children(node).into_iter().next() {
            Some(inner) => node = inner,
            None => break,
        }
    }
    node
}

/// コメントを除いた名前付き子ノード
pub(super) fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

/// 挿入位置（文末）
///
/// 同じ行に続くコメントは宣言側に残すため、その後ろを返す
pub(super) fn insertion_point(statement: Node) -> usize {
    let row = statement.end_position().row;
    let mut end = statement.end_byte();
    let mut next = statement.next_sibling();
    while let Some(node) = next {
        if !node.is_extra() || node.start_position().row != row {
            break;
        }
        end = node.end_byte();
        next = node.next_sibling();
    }
    end
}

impl ComponentAnalyzer {
    /// トップレベル文1つからコンポーネント宣言を抽出する
    ///
    /// 認識パターン:
    /// - `const Name = (props) => ...` / `const Name = function (props) { ... }`
    /// - `const Name = X.helper((props, ref) => ...)`
    /// - `const Name = helper((props, ref) => ...)`
    /// - `const Name = helper(function (props, ref) { ... })`
    /// - `function Name(props) { ... }`
    ///
    /// いずれも `export` / `export default` で包まれていてもよい
    pub(super) fn collect_declarations(&self, statement: Node, source: &str) -> Vec<ComponentDeclaration> {
        let statement_range = TextRange::of_node(statement);
        let declaration = if statement.kind() == "export_statement" {
            match statement.child_by_field_name("declaration") {
                Some(decl) => decl,
                None => return Vec::new(),
            }
        } else {
            statement
        };

        match declaration.kind() {
            "lexical_declaration" => self.collect_const_declarators(declaration, source, statement_range),
            "function_declaration" => declaration
                .child_by_field_name("name")
                .map(|name| ComponentDeclaration {
                    binding_name: self.node_text(name, source).to_string(),
                    kind: DeclarationKind::FunctionDeclaration,
                    statement_range,
                })
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    fn collect_const_declarators(
        &self,
        declaration: Node,
        source: &str,
        statement_range: TextRange,
    ) -> Vec<ComponentDeclaration> {
        // let / var は対象外
        if declaration.child(0).map(|kw| kw.kind()) != Some("const") {
            return Vec::new();
        }

        let mut found = Vec::new();
        for declarator in named_children(declaration) {
            if declarator.kind() != "variable_declarator" {
                continue;
            }
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            // 分割代入は対象外
            if name.kind() != "identifier" {
                continue;
            }
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            let binding_name = self.node_text(name, source);
            if let Some(kind) = self.classify_initializer(value, binding_name) {
                found.push(ComponentDeclaration {
                    binding_name: binding_name.to_string(),
                    kind,
                    statement_range,
                });
            }
        }
        found
    }

    /// 初期化式の形から宣言形式を判定する
    ///
    /// 呼び出し式は「関数値の引数がちょうど1つで、それが末尾引数」の場合のみ対象。
    /// 呼び出し先が本当に forwardRef かどうかは検証しない
    fn classify_initializer(&self, value: Node, binding_name: &str) -> Option<DeclarationKind> {
        let value = unwrap_parens(value);
        if is_function_like(value) {
            return Some(DeclarationKind::ArrowConst);
        }
        if value.kind() != "call_expression" {
            return None;
        }

        let callee = value.child_by_field_name("function")?;
        let arguments = named_children(value.child_by_field_name("arguments")?);
        let function_args = arguments
            .iter()
            .filter(|arg| is_function_like(unwrap_parens(**arg)))
            .count();
        let trailing = arguments.last().map(|arg| unwrap_parens(*arg));

        let trailing = match trailing {
            Some(arg) if function_args == 1 && is_function_like(arg) => arg,
            _ => {
                if function_args > 0 {
                    debug!(
                        "skipping ambiguous declaration '{}': {} function arguments",
                        binding_name, function_args
                    );
                }
                return None;
            }
        };

        match callee.kind() {
            "member_expression" => Some(DeclarationKind::ForwardRefWrapped(
                ForwardRefVariant::NamespacedCall,
            )),
            "identifier" if trailing.kind() == "arrow_function" => Some(
                DeclarationKind::ForwardRefWrapped(ForwardRefVariant::BareCall),
            ),
            "identifier" => Some(DeclarationKind::ForwardRefWrapped(
                ForwardRefVariant::BareCallWithFunctionExpression,
            )),
            _ => {
                debug!(
                    "skipping '{}': unsupported callee kind {}",
                    binding_name,
                    callee.kind()
                );
                None
            }
        }
    }
}
