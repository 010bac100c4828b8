//! The parsed-AST boundary this crate consumes.
//!
//! The tokenizer/parser that turns source text into this shape lives outside
//! this crate (see spec §1 "out of scope"). What reaches the interpreter is a
//! tree of nested, ordered token sequences: each leaf is a surface string,
//! optionally carrying a source line number for diagnostics; each non-leaf is
//! an ordered list of further nodes. A well-formed top-level form is a class
//! declaration; statement/expression forms are lists whose first element is a
//! reserved-word leaf.

use std::fmt;

/// A single leaf token: its surface text plus an optional source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub line: Option<u32>,
}

impl Token {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), line: None }
    }

    #[must_use]
    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl From<&str> for Token {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// One node of the parsed AST: either a leaf token or an ordered list of
/// child nodes (a "chunk", in the source material's terminology).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(Token),
    List(Vec<Node>),
}

impl Node {
    pub fn leaf(text: impl Into<String>) -> Self {
        Self::Leaf(Token::new(text))
    }

    pub fn leaf_at(text: impl Into<String>, line: u32) -> Self {
        Self::Leaf(Token::new(text).at_line(line))
    }

    pub fn list(children: impl IntoIterator<Item = Node>) -> Self {
        Self::List(children.into_iter().collect())
    }

    /// The surface text, if this node is a leaf.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Leaf(t) => Some(&t.text),
            Self::List(_) => None,
        }
    }

    /// The child list, if this node is a list.
    #[must_use]
    pub fn items(&self) -> Option<&[Node]> {
        match self {
            Self::List(items) => Some(items),
            Self::Leaf(_) => None,
        }
    }

    /// The source line of this node, or of its first leaf descendant.
    #[must_use]
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::Leaf(t) => t.line,
            Self::List(items) => items.first().and_then(Node::line),
        }
    }

    /// Convenience: the first item's text, used to identify a form's head
    /// keyword (`begin`, `call`, `if`, …).
    #[must_use]
    pub fn head(&self) -> Option<&str> {
        self.items()?.first()?.text()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(t) => write!(f, "{}", t.text),
            Self::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Builds a leaf node. Handy for hand-constructing ASTs in tests, mirroring
/// how an external parser would build the same shape.
#[must_use]
pub fn leaf(text: impl Into<String>) -> Node {
    Node::leaf(text)
}

/// Builds a list node from an array of children.
#[must_use]
pub fn list<const N: usize>(children: [Node; N]) -> Node {
    Node::list(children)
}
