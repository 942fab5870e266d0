//! Statement AST nodes (spec §3.2).

use super::{ExprNode, Pattern, PatternSegment, StmtNode};

#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Var(String),
    Qualified(String, String),
    Index(Box<ExprNode>, Box<ExprNode>),
    /// `<<h:8, rest/binary>> = expr` — succeeds only if the match succeeds
    /// (spec §4.L.3); bindings are committed atomically.
    BitstringPattern(Vec<PatternSegment>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Assign { target: AssignTarget, value: ExprNode },
    ExprStmt(ExprNode),
    Block(Vec<StmtNode>),
    If {
        branches: Vec<(ExprNode, Vec<StmtNode>)>,
        else_branch: Option<Vec<StmtNode>>,
    },
    While {
        cond: ExprNode,
        body: Vec<StmtNode>,
    },
    /// `for i = start, stop [, step] { ... }`.
    NumericFor {
        var: String,
        start: ExprNode,
        stop: ExprNode,
        step: Option<ExprNode>,
        body: Vec<StmtNode>,
    },
    /// `for v in iterable { ... }`.
    ForIn {
        var: String,
        iter: ExprNode,
        body: Vec<StmtNode>,
    },
    /// `for (init; cond; post) { ... }`.
    CStyleFor {
        init: Option<Box<StmtNode>>,
        cond: Option<ExprNode>,
        post: Option<Box<StmtNode>>,
        body: Vec<StmtNode>,
    },
    Match {
        subject: ExprNode,
        arms: Vec<(Pattern, Vec<StmtNode>)>,
    },
    /// `lang (name1, name2) { ... }` — an embedded foreign-language fragment.
    CodeBlock {
        language: String,
        exported_names: Vec<String>,
        code: String,
    },
    Import(String),
    Break,
    Continue,
    /// A language call appearing at statement position, optionally
    /// backgrounded with `&` (spec §3.2 "language-call-statement").
    LanguageCall { call: ExprNode, background: bool },
}
