//! Core data model for the Bliks scripting language
//!
//! This crate defines the types the whole pipeline is built from: runtime
//! [`Value`]s and their [`ValueType`] hierarchy, parser [`Token`]s,
//! parameter specs, and the [`CompiledProgram`] record that resolution
//! produces and machines execute. It has no behavior of its own beyond
//! classification and lookup; parsing lives in `bliks-compiler` and
//! execution in `bliks-runtime`.

pub mod error;
pub mod program;
pub mod token;
pub mod types;
pub mod value;

pub use error::Error;
pub use program::{Argument, CompiledProgram, Instruction, ProgramBuilder};
pub use token::{Token, TokenPayload};
pub use types::{Parameter, ParameterList, ValueType, parse_params};
pub use value::{Value, parse_number};
