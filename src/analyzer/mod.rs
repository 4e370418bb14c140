mod assignment;
mod component;
mod parser;


use std::collections::HashSet;

use tracing::debug;
use tree_sitter::{Node, Tree};

use crate::error::AnalyzerError;
use crate::model::{
    ComponentCandidate, ExistingIdentification, PropertyAssignment, TextRange,
    IDENTIFICATION_PROPERTY,
};
use component::{insertion_point, named_children};

pub use parser::TsxParser;

/// TSXソースからReactコンポーネント宣言を抽出するアナライザー
///
/// 構文木のトップレベル文だけを対象とし、import の解決や型検査は行わない
#[derive(Debug, Default, Clone, Copy)]
pub struct ComponentAnalyzer;

impl ComponentAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// ソースを構文解析してコンポーネント候補を返す
    pub fn analyze_source(&self, source: &str) -> Result<Vec<ComponentCandidate>, AnalyzerError> {
        let mut parser = TsxParser::new()?;
        let tree = parser.parse(source)?;
        self.analyze_tree(&tree, source)
    }

    /// 構文木からコンポーネント候補を宣言順に返す
    ///
    /// 構文エラーを含む木は ParseFailure として扱い、候補を返さない
    pub fn analyze_tree(&self, tree: &Tree, source: &str) -> Result<Vec<ComponentCandidate>, AnalyzerError> {
        let root = tree.root_node();
        if root.has_error() {
            return Err(parse_failure(root));
        }

        let statements = named_children(root);

        let mut seen: HashSet<String> = HashSet::new();
        let mut declarations = Vec::new();
        for statement in &statements {
            let insertion_point = insertion_point(*statement);
            for decl in self.collect_declarations(*statement, source) {
                if !seen.insert(decl.binding_name.clone()) {
                    debug!("duplicate top-level binding '{}' ignored", decl.binding_name);
                    continue;
                }
                declarations.push((decl, insertion_point));
            }
        }

        let assignments: Vec<_> = statements
            .iter()
            .filter_map(|statement| self.extract_property_assignment(*statement, source))
            .collect();

        let candidates: Vec<ComponentCandidate> = declarations
            .into_iter()
            .map(|(decl, insertion_point)| {
                let mut existing_identification = None;
                let mut trailing_sibling_assignments = Vec::new();

                for assignment in assignments.iter().filter(|a| {
                    a.object == decl.binding_name && a.statement_range.start >= decl.statement_range.end
                }) {
                    if assignment.property == IDENTIFICATION_PROPERTY {
                        // 2つ目以降の displayName 代入は無視
                        if existing_identification.is_none() {
                            existing_identification = Some(ExistingIdentification {
                                range: assignment.statement_range,
                                value: assignment.value.clone(),
                            });
                        }
                    } else {
                        trailing_sibling_assignments.push(PropertyAssignment {
                            property: assignment.property.clone(),
                            range: assignment.statement_range,
                        });
                    }
                }

                debug!("candidate '{}' ({})", decl.binding_name, decl.kind.label());
                ComponentCandidate {
                    binding_name: decl.binding_name,
                    declaration_kind: decl.kind,
                    declaration_range: decl.statement_range,
                    insertion_point,
                    existing_identification,
                    trailing_sibling_assignments,
                }
            })
            .collect();

        debug!("analyze_tree: {} component candidates", candidates.len());
        Ok(candidates)
    }

    /// ASTノードからソーステキストを取得する
    pub(crate) fn node_text<'s>(&self, node: Node, source: &'s str) -> &'s str {
        &source[node.byte_range()]
    }
}

/// 最初のエラーノードから ParseFailure を組み立てる
fn parse_failure(root: Node) -> AnalyzerError {
    match first_error_node(root) {
        Some(node) if node.is_missing() => AnalyzerError::Parse {
            message: format!("missing `{}`", node.kind()),
            range: TextRange::empty(node.start_byte()),
        },
        Some(node) => AnalyzerError::Parse {
            message: "unexpected syntax".to_string(),
            range: TextRange::of_node(node),
        },
        None => AnalyzerError::Parse {
            message: "unexpected syntax".to_string(),
            range: TextRange::empty(0),
        },
    }
}

fn first_error_node<'t>(node: Node<'t>) -> Option<Node<'t>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
    children.into_iter().find_map(first_error_node)
}
