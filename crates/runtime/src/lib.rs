//! Register machine and standard library for the Bliks scripting language
//!
//! This crate executes [`CompiledProgram`](bliks_core::CompiledProgram)s: a
//! stepwise [`Machine`] with buffered input, the argument [`expand`]er that
//! resolves retrieval indirection against live registers, and the
//! [`stdlib`] catalog of built-ins whose compile-time halves the resolver
//! in `bliks-compiler` invokes while building a program.

pub mod expand;
pub mod interface;
pub mod machine;
pub mod stdlib;

pub use expand::{Registers, expand_args};
pub use interface::{Interface, Signal};
pub use machine::{Machine, Step};
pub use stdlib::{CompileFn, FuncDescriptor, Library, RunFn};
