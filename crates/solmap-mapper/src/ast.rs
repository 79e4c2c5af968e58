// SPDX-License-Identifier: AGPL-3.0

//! Read-only view over the solc JSON AST and the smallest-node locator.

use serde::Serialize;
use serde_json::Value;
use solmap_exceptions::{MapperError, SolmapResult};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, trace};

/// A byte range `offset:length` inside source file `file_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceRange {
    pub offset: usize,
    pub length: usize,
    pub file_id: i64,
}

impl SourceRange {
    pub fn new(offset: usize, length: usize, file_id: i64) -> Self {
        Self {
            offset,
            length,
            file_id,
        }
    }

    /// `None` when `offset + length` does not fit in a `usize`.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }

    /// True if `self` covers `target`. A zero-length target counts as one
    /// byte wide so that a node starting exactly at it still qualifies.
    /// Ranges whose end overflows never qualify.
    pub fn contains(&self, target: &SourceRange) -> bool {
        let (Some(end), Some(target_end)) = (
            self.end(),
            target.offset.checked_add(target.length.max(1)),
        ) else {
            return false;
        };
        self.file_id == target.file_id && self.offset <= target.offset && end >= target_end
    }
}

impl FromStr for SourceRange {
    type Err = MapperError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let invalid = || MapperError::InvalidSourceRange {
            src: src.to_string(),
        };

        let mut parts = src.split(':');
        let (Some(offset), Some(length), Some(file_id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        Ok(Self {
            offset: offset.parse().map_err(|_| invalid())?,
            length: length.parse().map_err(|_| invalid())?,
            file_id: file_id.parse().map_err(|_| invalid())?,
        })
    }
}

impl fmt::Display for SourceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.offset, self.length, self.file_id)
    }
}

macro_rules! node_types {
    ($($variant:ident => $tag:literal),* $(,)?) => {
        /// Every `nodeType` the reconstructor knows how to render.
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum NodeType {
            $($variant,)*
            /// The compiler's alternate spelling is folded into this variant.
            PlaceholderStatement,
            /// A tag this version does not know about.
            Unknown(String),
        }

        impl NodeType {
            /// All recognised `nodeType` tags, including alternate spellings.
            pub const ALL_TAGS: &'static [&'static str] = &[
                $($tag,)*
                "PlaceholderStatement",
                "PlaceHolderStatement",
            ];

            pub fn from_tag(tag: &str) -> Self {
                match tag {
                    $($tag => NodeType::$variant,)*
                    "PlaceholderStatement" | "PlaceHolderStatement" => NodeType::PlaceholderStatement,
                    other => NodeType::Unknown(other.to_string()),
                }
            }

            pub fn tag(&self) -> &str {
                match self {
                    $(NodeType::$variant => $tag,)*
                    NodeType::PlaceholderStatement => "PlaceholderStatement",
                    NodeType::Unknown(tag) => tag,
                }
            }
        }
    };
}

node_types! {
    ArrayTypeName => "ArrayTypeName",
    Assignment => "Assignment",
    BinaryOperation => "BinaryOperation",
    Block => "Block",
    Break => "Break",
    Conditional => "Conditional",
    Continue => "Continue",
    ContractDefinition => "ContractDefinition",
    DoWhileStatement => "DoWhileStatement",
    ElementaryTypeName => "ElementaryTypeName",
    ElementaryTypeNameExpression => "ElementaryTypeNameExpression",
    EmitStatement => "EmitStatement",
    EnumDefinition => "EnumDefinition",
    EnumValue => "EnumValue",
    ErrorDefinition => "ErrorDefinition",
    EventDefinition => "EventDefinition",
    ExpressionStatement => "ExpressionStatement",
    ForStatement => "ForStatement",
    FunctionCall => "FunctionCall",
    FunctionCallOptions => "FunctionCallOptions",
    FunctionDefinition => "FunctionDefinition",
    FunctionTypeName => "FunctionTypeName",
    Identifier => "Identifier",
    IdentifierPath => "IdentifierPath",
    IfStatement => "IfStatement",
    ImportDirective => "ImportDirective",
    IndexAccess => "IndexAccess",
    IndexRangeAccess => "IndexRangeAccess",
    InheritanceSpecifier => "InheritanceSpecifier",
    InlineAssembly => "InlineAssembly",
    Literal => "Literal",
    Mapping => "Mapping",
    MemberAccess => "MemberAccess",
    ModifierDefinition => "ModifierDefinition",
    ModifierInvocation => "ModifierInvocation",
    NewExpression => "NewExpression",
    OverrideSpecifier => "OverrideSpecifier",
    ParameterList => "ParameterList",
    PragmaDirective => "PragmaDirective",
    Return => "Return",
    RevertStatement => "RevertStatement",
    SourceUnit => "SourceUnit",
    StorageLayoutSpecifier => "StorageLayoutSpecifier",
    StructDefinition => "StructDefinition",
    StructuredDocumentation => "StructuredDocumentation",
    TryCatchClause => "TryCatchClause",
    TryStatement => "TryStatement",
    TupleExpression => "TupleExpression",
    TypeDescriptions => "TypeDescriptions",
    UnaryOperation => "UnaryOperation",
    UncheckedBlock => "UncheckedBlock",
    UserDefinedTypeName => "UserDefinedTypeName",
    UserDefinedValueTypeDefinition => "UserDefinedValueTypeDefinition",
    UsingForDirective => "UsingForDirective",
    VariableDeclaration => "VariableDeclaration",
    VariableDeclarationStatement => "VariableDeclarationStatement",
    WhileStatement => "WhileStatement",
    YulAssignment => "YulAssignment",
    YulBlock => "YulBlock",
    YulBreak => "YulBreak",
    YulCase => "YulCase",
    YulContinue => "YulContinue",
    YulExpressionStatement => "YulExpressionStatement",
    YulForLoop => "YulForLoop",
    YulFunctionCall => "YulFunctionCall",
    YulFunctionDefinition => "YulFunctionDefinition",
    YulIdentifier => "YulIdentifier",
    YulIf => "YulIf",
    YulLeave => "YulLeave",
    YulLiteral => "YulLiteral",
    YulLiteralHexValue => "YulLiteralHexValue",
    YulLiteralValue => "YulLiteralValue",
    YulSwitch => "YulSwitch",
    YulTypedName => "YulTypedName",
    YulVariableDeclaration => "YulVariableDeclaration",
}

impl NodeType {
    pub fn is_known(&self) -> bool {
        !matches!(self, NodeType::Unknown(_))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Borrowed view of one AST node (a JSON object).
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(&'a Value);

impl<'a> Node<'a> {
    /// Wrap `value` if it is a JSON object.
    pub fn new(value: &'a Value) -> Option<Self> {
        value.is_object().then_some(Node(value))
    }

    pub fn value(&self) -> &'a Value {
        self.0
    }

    /// The raw `nodeType` tag, if any.
    pub fn tag(&self) -> Option<&'a str> {
        self.0.get("nodeType").and_then(Value::as_str)
    }

    pub fn node_type(&self) -> Option<NodeType> {
        self.tag().map(NodeType::from_tag)
    }

    pub fn id(&self) -> Option<i64> {
        self.0.get("id").and_then(Value::as_i64)
    }

    /// Parsed `src` attribute. `None` if absent, an error if malformed.
    pub fn src(&self) -> Option<SolmapResult<SourceRange>> {
        self.0
            .get("src")
            .and_then(Value::as_str)
            .map(SourceRange::from_str)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0.get(key).filter(|v| !v.is_null())
    }

    /// Child node stored under `key`.
    pub fn child(&self, key: &str) -> Option<Node<'a>> {
        self.get(key).and_then(Node::new)
    }

    /// Child nodes stored as an array under `key`. Non-object items are skipped.
    pub fn children(&self, key: &str) -> Vec<Node<'a>> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Node::new).collect())
            .unwrap_or_default()
    }

    /// String attribute, empty when missing.
    pub fn str_field(&self, key: &str) -> &'a str {
        self.get(key).and_then(Value::as_str).unwrap_or("")
    }

    pub fn bool_field(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }
}

/// Find the node with the smallest `src` length that contains `target`.
///
/// `root` is either one AST or an array of them. The whole tree is always
/// visited: finding a match never stops the descent, since a smaller node
/// may be nested below it. Traversal is depth-first pre-order over object
/// values and array items in document order, and among equally small nodes
/// the first one visited wins.
pub fn find_smallest_containing<'a>(
    root: &'a Value,
    target: &SourceRange,
) -> SolmapResult<Node<'a>> {
    let mut best: Option<(usize, Node<'a>)> = None;
    let mut visited = 0usize;

    let mut stack: Vec<&'a Value> = Vec::new();
    if root.is_object() {
        stack.push(root);
    } else {
        push_children(&mut stack, root);
    }

    while let Some(value) = stack.pop() {
        let Some(node) = Node::new(value) else {
            continue;
        };
        visited += 1;

        match node.src() {
            Some(Ok(range)) => {
                let smaller = best
                    .as_ref()
                    .map_or(true, |(length, _)| range.length < *length);
                if smaller && range.contains(target) {
                    trace!("candidate {} at {}", node.tag().unwrap_or("?"), range);
                    best = Some((range.length, node));
                }
            }
            Some(Err(err)) => debug!("skipping node: {}", err),
            None => {}
        }

        push_children(&mut stack, value);
    }

    debug!("visited {} AST objects looking for {}", visited, target);

    best.map(|(_, node)| node)
        .ok_or(MapperError::NoContainingAstNode {
            offset: target.offset,
            length: target.length,
            file_id: target.file_id,
        })
}

/// Push the object children of `value` so that they pop in document order.
fn push_children<'a>(stack: &mut Vec<&'a Value>, value: &'a Value) {
    let start = stack.len();
    match value {
        Value::Object(map) => {
            for child in map.values() {
                match child {
                    Value::Object(_) => stack.push(child),
                    Value::Array(items) => {
                        stack.extend(items.iter().filter(|item| item.is_object()))
                    }
                    _ => {}
                }
            }
        }
        Value::Array(items) => stack.extend(items.iter().filter(|item| item.is_object())),
        _ => {}
    }
    stack[start..].reverse();
}

/// `absolutePath` of the source unit for `file_id` in an AST or AST forest.
pub fn source_unit_path(root: &Value, file_id: i64) -> Option<&str> {
    let units: Vec<&Value> = match root {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };

    units
        .into_iter()
        .filter_map(Node::new)
        .filter(|unit| unit.node_type() == Some(NodeType::SourceUnit))
        .find(|unit| matches!(unit.src(), Some(Ok(range)) if range.file_id == file_id))
        .map(|unit| unit.str_field("absolutePath"))
        .filter(|path| !path.is_empty())
}
