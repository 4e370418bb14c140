use tree_sitter::{Parser, Tree};

use crate::error::AnalyzerError;
use crate::model::TextRange;

pub struct TsxParser {
    parser: Parser,
}

impl TsxParser {
    pub fn new() -> Result<Self, AnalyzerError> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TSX.into())
            .map_err(|e| AnalyzerError::Grammar(e.to_string()))?;

        Ok(Self { parser })
    }

    pub fn parse(&mut self, source: &str) -> Result<Tree, AnalyzerError> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| AnalyzerError::Parse {
                message: "parser produced no syntax tree".to_string(),
                range: TextRange::empty(0),
            })
    }
}
