//! The standard library
//!
//! A [`Library`] maps function names to [`FuncDescriptor`]s: a parameter
//! list plus up to two behaviors. The compile behavior runs during
//! resolution and shapes the program (labels, jump destinations, macros,
//! the begin index); the run behavior executes on a machine through the
//! per-step [`Interface`]. Control flow needs both; I/O and computation
//! need only the run side.
//!
//! The catalog is closed: [`Library::standard`] builds it once and the
//! result is shared read-only for the life of the process.

mod arithmetic;
mod control_flow;
mod io;
mod string_ops;

use crate::interface::Interface;
use bliks_core::{ParameterList, ProgramBuilder, Value, parse_params};
use std::collections::HashMap;

pub type CompileFn = fn(&mut ProgramBuilder, &[Value]) -> Result<(), String>;
pub type RunFn = fn(&mut Interface<'_>, &[Value]) -> Result<(), String>;

pub struct FuncDescriptor {
    pub params: ParameterList,
    pub compile: Option<CompileFn>,
    pub run: Option<RunFn>,
}

pub struct Library {
    funcs: HashMap<String, FuncDescriptor>,
}

impl Library {
    /// The full built-in catalog: control flow, I/O, and computation.
    pub fn standard() -> Library {
        let mut lib = Library { funcs: HashMap::new() };
        control_flow::install(&mut lib);
        io::install(&mut lib);
        arithmetic::install(&mut lib);
        string_ops::install(&mut lib);
        lib
    }

    pub fn get(&self, name: &str) -> Option<&FuncDescriptor> {
        self.funcs.get(name)
    }

    /// Register a built-in. The spec string uses the parameter grammar of
    /// [`parse_params`]; at least one behavior must be supplied.
    pub fn register(
        &mut self,
        name: &str,
        spec: &str,
        compile: Option<CompileFn>,
        run: Option<RunFn>,
    ) {
        assert!(
            compile.is_some() || run.is_some(),
            "built-in '{name}' has no behavior"
        );
        let params = match parse_params(spec) {
            Ok(params) => params,
            Err(e) => panic!("invalid parameter spec for '{name}': {e}"),
        };
        self.funcs
            .insert(name.to_string(), FuncDescriptor { params, compile, run });
    }
}

// Argument accessors for run behaviors. Expansion has already enforced the
// declared parameter types, so failures here are resolver bugs, not user
// errors.

fn pointer(v: &Value) -> u64 {
    match v.as_pointer() {
        Some(p) => p,
        None => unreachable!("argument passed a pointer type check"),
    }
}

fn number(v: &Value) -> f64 {
    match v {
        Value::Num(n) => *n,
        Value::Str(s) => unreachable!("argument '{s}' passed a numeric type check"),
    }
}

fn text(v: &Value) -> String {
    v.to_string()
}
