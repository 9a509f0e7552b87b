//! Tokens produced by the parser
//!
//! Tokens exist only between parsing and resolution; a resolved program
//! carries [`Argument`](crate::program::Argument)s instead. Every token
//! records the 1-based byte offset where it starts in the original source.

use crate::types::ValueType;
use crate::value::Value;

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub payload: TokenPayload,
    /// 1-based byte offset into the source.
    pub pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenPayload {
    /// A bare name: a function head, a macro use, or a label.
    Name(String),
    /// A string or number literal.
    Literal(Value),
    /// `@…@tok`: one register lookup per `@`, starting from the inner token.
    Retrieval { depth: u32, inner: Box<Token> },
    /// `<`: sugar for a retrieval through the line's first argument.
    Back,
}

impl Token {
    pub fn new(payload: TokenPayload, pos: usize) -> Token {
        Token { payload, pos }
    }

    /// Human-readable kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.payload {
            TokenPayload::Name(_) => "name",
            TokenPayload::Literal(_) => "literal",
            TokenPayload::Retrieval { .. } => "retrieval",
            TokenPayload::Back => "back retrieval",
        }
    }

    /// The type of a name or literal token.
    ///
    /// Calling this on a retrieval or back retrieval is a programmer error:
    /// those have no value until expanded against live registers.
    pub fn value_type(&self) -> ValueType {
        match &self.payload {
            TokenPayload::Name(_) => ValueType::Name,
            TokenPayload::Literal(v) => v.value_type(),
            other => panic!("no value type for a {:?}", other),
        }
    }
}
