//! Bliks compiler library
//!
//! The front half of the Bliks pipeline: [`parser`] turns source text into
//! token lines, [`resolver`] turns token lines plus a standard library into
//! an executable [`CompiledProgram`], and [`report`] renders positioned
//! errors against the source. The convenience functions here wire the
//! stages together with the runtime:
//!
//! ```
//! use bliksc::{Library, Step, machine_from_source};
//! use std::sync::Arc;
//!
//! let library = Arc::new(Library::standard());
//! let mut machine = machine_from_source("write \"hi\"", library, None).unwrap();
//! match machine.step_until_output().unwrap() {
//!     Step::Output(v) => assert_eq!(v.to_string(), "hi"),
//!     other => panic!("unexpected {other:?}"),
//! }
//! ```

pub mod parser;
pub mod report;
pub mod resolver;

pub use bliks_core::{CompiledProgram, Error, Value};
pub use bliks_runtime::{Library, Machine, Step};
pub use report::format_error;

use std::sync::Arc;

/// Compile source text against a library.
pub fn compile(source: &str, library: &Library) -> Result<CompiledProgram, Error> {
    resolver::resolve(parser::parse(source)?, library)
}

/// Compile source text and bind a fresh machine to the result.
pub fn machine_from_source(
    source: &str,
    library: Arc<Library>,
    max_registers: Option<u64>,
) -> Result<Machine, Error> {
    let program = compile(source, &library)?;
    Ok(Machine::from_compiled(Arc::new(program), library, max_registers))
}
