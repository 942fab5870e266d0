#![doc = include_str!("../../../README.md")]

mod adapter;
mod ast;
mod bitstring;
mod engine;
mod error;
mod io;
mod job;
mod lexer;
mod marshal;
mod parser;
mod scope;
mod token_stream;
mod value;

pub use adapter::{AdapterIntrospection, NullAdapter, RuntimeAdapter, TestAdapter, VariableBindings};
pub use ast::{
    AssignTarget, BinaryOp, Endianness, Expr, ExprNode, Literal, ObjectKey, Pattern, PatternSegment, Program,
    SegmentSpecs, SegmentTarget, SegmentType, Spanned, Stmt, StmtNode, UnaryOp, ValueSegment,
};
pub use bitstring::{BitBuffer, Bitstring};
pub use engine::{adapters::AdapterRegistry, adapters::DEFAULT_ADAPTER_TIMEOUT, Engine, Outcome};
pub use error::{Error, ErrorKind, ForeignErrorCategory, Position, SuResult};
pub use io::{CollectStringPrint, NoPrint, PrintWriter, StdPrint};
pub use job::{JobId, JobManager, JobNotification, JobRecord, JobState};
pub use lexer::{lex, Token, TokenKind};
pub use marshal::{from_foreign, to_foreign};
pub use parser::{full_registry, parse_program, parse_repl_line};
pub use scope::{Scope, RESERVED_LANGUAGE_NAMES};
pub use token_stream::TokenStream;
pub use value::{ForeignHandle, Value, ValueList, ValueMap};
