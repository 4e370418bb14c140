use super::span::TextRange;

/// コンポーネント識別に使うプロパティ名
pub const IDENTIFICATION_PROPERTY: &str = "displayName";

/// ref転送ヘルパー呼び出しの形
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ForwardRefVariant {
    /// `React.forwardRef((props, ref) => ...)`
    NamespacedCall,
    /// `forwardRef((props, ref) => ...)`
    BareCall,
    /// `forwardRef(function (props, ref) { ... })`
    BareCallWithFunctionExpression,
}

/// コンポーネントの宣言形式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `const Name = (props) => ...` / `const Name = function (props) { ... }`
    ArrowConst,
    /// `function Name(props) { ... }`
    FunctionDeclaration,
    ForwardRefWrapped(ForwardRefVariant),
}

impl DeclarationKind {
    pub fn label(&self) -> &'static str {
        match self {
            DeclarationKind::ArrowConst => "arrow component",
            DeclarationKind::FunctionDeclaration => "function component",
            DeclarationKind::ForwardRefWrapped(_) => "forwardRef component",
        }
    }
}

/// `Name.property = value;` 形式のトップレベル代入文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyAssignment {
    pub property: String,
    /// 文全体の範囲
    pub range: TextRange,
}

/// 既存の displayName 代入の右辺
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentificationValue {
    /// 文字列リテラル。`range` はクォートを含むリテラル全体
    Literal {
        value: String,
        range: TextRange,
        quote: char,
    },
    /// 変数参照などリテラル以外の式（書き換え対象外）
    Computed,
}

/// 既存の `Name.displayName = ...;` 文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingIdentification {
    pub range: TextRange,
    pub value: IdentificationValue,
}

impl ExistingIdentification {
    pub fn literal_value(&self) -> Option<&str> {
        match &self.value {
            IdentificationValue::Literal { value, .. } => Some(value),
            IdentificationValue::Computed => None,
        }
    }
}

/// 認識されたコンポーネント宣言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentCandidate {
    pub binding_name: String,
    pub declaration_kind: DeclarationKind,
    /// 束縛を導入する文全体（export を含む）
    pub declaration_range: TextRange,
    /// 宣言文の直後のオフセット（同じ行の末尾コメントがあればその後ろ）
    pub insertion_point: usize,
    pub existing_identification: Option<ExistingIdentification>,
    /// displayName 以外の `Name.prop = ...` 代入（ソース順）
    pub trailing_sibling_assignments: Vec<PropertyAssignment>,
}
