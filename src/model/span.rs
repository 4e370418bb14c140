use std::sync::Arc;

use tower_lsp::lsp_types::{Position, Range};
use tree_sitter::Node;

/// ソース内のバイト範囲（半開区間 `start..end`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub start: usize,
    pub end: usize,
}

impl TextRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// 長さ0の範囲（挿入位置）
    pub fn empty(offset: usize) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    pub fn of_node(node: Node) -> Self {
        Self::new(node.start_byte(), node.end_byte())
    }

    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }

    /// 範囲が重なるかチェック（端点が接するだけの場合は重ならない）
    pub fn overlaps(&self, other: &TextRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// バイトオフセットとLSP位置（UTF-16列）の変換テーブル
#[derive(Debug, Clone)]
pub struct LineIndex {
    text: Arc<str>,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: Arc<str>) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// バイトオフセットをLSP Positionに変換
    pub fn position(&self, offset: usize) -> Position {
        let offset = offset.min(self.text.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let character = self.text[line_start..offset]
            .chars()
            .map(|c| c.len_utf16() as u32)
            .sum();
        Position {
            line: line as u32,
            character,
        }
    }

    /// バイト範囲をLSP Rangeに変換
    pub fn range(&self, range: TextRange) -> Range {
        Range {
            start: self.position(range.start),
            end: self.position(range.end),
        }
    }

    /// ドキュメントで使われている改行コード
    pub fn line_ending(&self) -> &'static str {
        if self.text.contains("\r\n") { "\r\n" } else { "\n" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(text: &str) -> LineIndex {
        LineIndex::new(Arc::from(text))
    }

    #[test]
    fn test_overlaps() {
        let a = TextRange::new(5, 10);
        assert!(a.overlaps(&TextRange::new(9, 12)));
        assert!(a.overlaps(&TextRange::new(0, 6)));
        assert!(!a.overlaps(&TextRange::new(10, 12)));
        assert!(!a.overlaps(&TextRange::new(0, 5)));
    }

    #[test]
    fn test_position_multiline() {
        let idx = index("const a = 1;\nconst b = 2;\n");
        assert_eq!(idx.position(0), Position::new(0, 0));
        assert_eq!(idx.position(12), Position::new(0, 12));
        assert_eq!(idx.position(13), Position::new(1, 0));
        assert_eq!(idx.position(19), Position::new(1, 6));
    }

    #[test]
    fn test_position_counts_utf16_units() {
        // "é" は2バイト/UTF-16で1単位、"😀" は4バイト/UTF-16で2単位
        let idx = index("é😀x");
        assert_eq!(idx.position(2), Position::new(0, 1));
        assert_eq!(idx.position(6), Position::new(0, 3));
    }

    #[test]
    fn test_position_past_end_is_clamped() {
        let idx = index("ab\ncd");
        assert_eq!(idx.position(100), Position::new(1, 2));
    }

    #[test]
    fn test_line_ending_detection() {
        assert_eq!(index("a\r\nb").line_ending(), "\r\n");
        assert_eq!(index("a\nb").line_ending(), "\n");
    }
}
