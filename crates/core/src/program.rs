//! Compiled programs
//!
//! A [`CompiledProgram`] is the frozen output of resolution: a dense list of
//! instructions plus the label and jump-destination tables the control-flow
//! built-ins populated at compile time. It is plain data all the way down
//! (strings, numbers, maps), so it serializes cleanly and can back any
//! number of machines at once.
//!
//! [`ProgramBuilder`] is the working form the resolver and the compile-time
//! behaviors mutate; `finish` drops the build-only state (macro table, scope
//! counters, current-instruction cursor) and freezes the rest.

use crate::types::ValueType;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::f64::consts;

/// A resolved argument: either a literal value or a register retrieval
/// expanded at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Value {
        expected: ValueType,
        value: Value,
        pos: usize,
    },
    Retrieval {
        expected: ValueType,
        /// The starting register index (already checked to be a pointer).
        index: Value,
        /// Number of register hops.
        depth: u32,
        pos: usize,
    },
}

impl Argument {
    pub fn expected(&self) -> ValueType {
        match self {
            Argument::Value { expected, .. } | Argument::Retrieval { expected, .. } => *expected,
        }
    }
}

/// One executable instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    pub func: String,
    pub args: Vec<Argument>,
    /// 1-based index of this instruction in the program.
    pub num: usize,
    /// Byte position of the function name in the source.
    pub pos: usize,
}

/// The immutable, shareable result of resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledProgram {
    pub instructions: Vec<Instruction>,
    /// 1-based index of the first instruction to execute.
    pub begin: usize,
    /// Label name → every instruction index it marks, in program order.
    pub labels: BTreeMap<String, Vec<usize>>,
    /// Instruction index → the label that instruction jumps to at run time.
    pub jump_dests: BTreeMap<usize, String>,
}

impl CompiledProgram {
    /// Look up an instruction by its 1-based index.
    pub fn instruction(&self, num: usize) -> Option<&Instruction> {
        num.checked_sub(1).and_then(|i| self.instructions.get(i))
    }

    /// The single index a label marks. Used by `goto`, which refuses
    /// ambiguous targets.
    pub fn unique_label(&self, name: &str) -> Result<usize, String> {
        match self.labels.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(format!("label '{name}' is not defined")),
            Some([index]) => Ok(*index),
            Some(indices) => Err(format!(
                "label '{name}' is ambiguous ({} occurrences)",
                indices.len()
            )),
        }
    }

    /// The first occurrence of a label strictly after `current`.
    pub fn next_label(&self, name: &str, current: usize) -> Result<usize, String> {
        self.labels
            .get(name)
            .and_then(|indices| indices.iter().find(|&&i| i > current))
            .copied()
            .ok_or_else(|| format!("no occurrence of label '{name}' after this instruction"))
    }

    /// The last occurrence of a label strictly before `current`.
    pub fn previous_label(&self, name: &str, current: usize) -> Result<usize, String> {
        self.labels
            .get(name)
            .and_then(|indices| indices.iter().rev().find(|&&i| i < current))
            .copied()
            .ok_or_else(|| format!("no occurrence of label '{name}' before this instruction"))
    }

    /// The label this instruction jumps to, recorded at compile time.
    pub fn jump_dest(&self, num: usize) -> Result<&str, String> {
        self.jump_dests
            .get(&num)
            .map(String::as_str)
            .ok_or_else(|| "instruction has no recorded jump destination".to_string())
    }
}

/// The in-progress program that resolution and compile-time behaviors build.
#[derive(Debug)]
pub struct ProgramBuilder {
    instructions: Vec<Instruction>,
    begin: Option<usize>,
    pub labels: BTreeMap<String, Vec<usize>>,
    pub jump_dests: BTreeMap<usize, String>,
    /// Compile-time name → literal substitutions. Seeded with the standard
    /// constants; extended by `let`. Dropped by `finish`.
    pub macros: HashMap<String, Value>,
    /// Open `if`/`ifnot` nesting depth.
    pub if_level: usize,
    /// Open loop nesting depth.
    pub loop_level: usize,
    /// The index the instruction being resolved will occupy.
    pub cur_instruction: usize,
}

impl ProgramBuilder {
    pub fn new() -> ProgramBuilder {
        let mut macros = HashMap::new();
        macros.insert("pi".to_string(), Value::Num(consts::PI));
        macros.insert("e".to_string(), Value::Num(consts::E));
        macros.insert("inf".to_string(), Value::Num(f64::INFINITY));
        macros.insert("ninf".to_string(), Value::Num(f64::NEG_INFINITY));
        macros.insert("true".to_string(), Value::from("true"));
        macros.insert("false".to_string(), Value::from(""));
        for i in 1..=4 {
            macros.insert(format!("_{i}"), Value::Num(i as f64));
        }

        ProgramBuilder {
            instructions: Vec::new(),
            begin: None,
            labels: BTreeMap::new(),
            jump_dests: BTreeMap::new(),
            macros,
            if_level: 0,
            loop_level: 0,
            cur_instruction: 1,
        }
    }

    /// The index the next emitted instruction will occupy.
    pub fn next_index(&self) -> usize {
        self.instructions.len() + 1
    }

    pub fn set_begin(&mut self, index: usize) -> Result<(), String> {
        if self.begin.is_some() {
            return Err("beginning has already been defined".to_string());
        }
        self.begin = Some(index);
        Ok(())
    }

    pub fn add_label(&mut self, name: &str, index: usize) {
        self.labels.entry(name.to_string()).or_default().push(index);
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.get(name).is_some_and(|v| !v.is_empty())
    }

    pub fn set_jump_dest(&mut self, index: usize, label: String) {
        self.jump_dests.insert(index, label);
    }

    pub fn emit(&mut self, func: &str, args: Vec<Argument>, pos: usize) {
        let num = self.next_index();
        self.instructions.push(Instruction {
            func: func.to_string(),
            args,
            num,
            pos,
        });
    }

    pub fn finish(self) -> CompiledProgram {
        CompiledProgram {
            instructions: self.instructions,
            begin: self.begin.unwrap_or(1),
            labels: self.labels,
            jump_dests: self.jump_dests,
        }
    }
}

impl Default for ProgramBuilder {
    fn default() -> Self {
        ProgramBuilder::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program_with_labels(pairs: &[(&str, usize)]) -> CompiledProgram {
        let mut b = ProgramBuilder::new();
        for (name, index) in pairs {
            b.add_label(name, *index);
        }
        b.finish()
    }

    #[test]
    fn test_begin_defaults_to_one() {
        assert_eq!(ProgramBuilder::new().finish().begin, 1);
    }

    #[test]
    fn test_begin_set_once() {
        let mut b = ProgramBuilder::new();
        b.set_begin(3).unwrap();
        assert!(b.set_begin(4).is_err());
        assert_eq!(b.finish().begin, 3);
    }

    #[test]
    fn test_unique_label() {
        let p = program_with_labels(&[("a", 2), ("b", 1), ("b", 5)]);
        assert_eq!(p.unique_label("a"), Ok(2));
        assert!(p.unique_label("b").is_err());
        assert!(p.unique_label("missing").is_err());
    }

    #[test]
    fn test_directional_label_search() {
        let p = program_with_labels(&[("l", 2), ("l", 6), ("l", 9)]);
        assert_eq!(p.next_label("l", 2), Ok(6));
        assert_eq!(p.next_label("l", 8), Ok(9));
        assert!(p.next_label("l", 9).is_err());
        assert_eq!(p.previous_label("l", 5), Ok(2));
        assert_eq!(p.previous_label("l", 9), Ok(6));
        assert!(p.previous_label("l", 2).is_err());
    }

    #[test]
    fn test_seeded_macros() {
        let b = ProgramBuilder::new();
        assert_eq!(b.macros.get("true"), Some(&Value::from("true")));
        assert_eq!(b.macros.get("false"), Some(&Value::from("")));
        assert_eq!(b.macros.get("_3"), Some(&Value::Num(3.0)));
        assert_eq!(b.macros.get("inf"), Some(&Value::Num(f64::INFINITY)));
    }
}
