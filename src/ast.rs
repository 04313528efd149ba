// Author: Dustin Pilgrim
// License: MIT

use std::fmt;

use indexmap::IndexMap;

use crate::value::Value;

/// Source position: file name plus 1-based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Pos {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self { file: file.into(), line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{},{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal { value: Value, pos: Pos },
    Tuple { items: Vec<Expr>, pos: Pos },
    Object { items: Vec<(String, Expr)>, pos: Pos },
    /// `root.attr.attr`
    Traversal { root: String, attrs: Vec<String>, pos: Pos },
    Call { name: String, args: Vec<Expr>, pos: Pos },
}

impl Expr {
    pub fn pos(&self) -> &Pos {
        match self {
            Expr::Literal { pos, .. }
            | Expr::Tuple { pos, .. }
            | Expr::Object { pos, .. }
            | Expr::Traversal { pos, .. }
            | Expr::Call { pos, .. } => pos,
        }
    }

    /// Root names of every traversal inside this expression, in source order.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Literal { .. } => {}
            Expr::Tuple { items, .. } | Expr::Call { args: items, .. } => {
                for item in items {
                    item.collect_variables(out);
                }
            }
            Expr::Object { items, .. } => {
                for (_, item) in items {
                    item.collect_variables(out);
                }
            }
            Expr::Traversal { root, .. } => out.push(root),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expr,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub kind: String,
    pub labels: Vec<String>,
    pub body: Body,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Body {
    pub attributes: IndexMap<String, Attribute>,
    pub blocks: Vec<Block>,
    pub pos: Pos,
}

impl Body {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    pub fn blocks_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }
}

/// Every configuration file under a root merged into a single body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub body: Body,
    pub files: Vec<String>,
}
