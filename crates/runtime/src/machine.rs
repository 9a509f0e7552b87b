//! The register machine
//!
//! A [`Machine`] owns its registers, input buffer, and program counter, and
//! holds shared handles to an immutable [`CompiledProgram`] and a
//! [`Library`]. Execution is strictly host-driven: nothing happens between
//! [`Machine::step`] calls, and the only suspension is the explicit
//! [`Step::AwaitingInput`] result a `poll` produces on an empty buffer.
//!
//! Register writes made by a behavior accumulate on the per-step interface
//! and are flushed here after the behavior returns, where the optional
//! register cap is enforced.

use crate::expand::{Registers, expand_args};
use crate::interface::{Interface, Signal};
use crate::stdlib::Library;
use bliks_core::{CompiledProgram, Error, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// The result of one (or one batch of) execution steps.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The program counter ran past the program; the machine is finished.
    Halted,
    /// One instruction executed with nothing to report.
    Ran,
    /// One instruction executed and emitted a value.
    Output(Value),
    /// The buffer was empty at a `poll`; push input and step again to
    /// retry the same instruction.
    AwaitingInput,
}

pub struct Machine {
    program: Arc<CompiledProgram>,
    library: Arc<Library>,
    registers: Registers,
    buffer: VecDeque<String>,
    next_instruction: usize,
    return_target: Option<usize>,
    max_registers: Option<u64>,
}

impl Machine {
    /// Bind a machine to a compiled program. `max_registers` caps the
    /// highest writable register index; `None` means unlimited.
    pub fn from_compiled(
        program: Arc<CompiledProgram>,
        library: Arc<Library>,
        max_registers: Option<u64>,
    ) -> Machine {
        let next_instruction = program.begin;
        Machine {
            program,
            library,
            registers: Registers::new(),
            buffer: VecDeque::new(),
            next_instruction,
            return_target: None,
            max_registers,
        }
    }

    /// Enqueue a line of input at the end of the buffer.
    pub fn push(&mut self, value: impl Into<String>) {
        self.buffer.push_back(value.into());
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn program(&self) -> &CompiledProgram {
        &self.program
    }

    /// Execute one instruction. Errors leave the machine halted; a
    /// subsequent `step` reports [`Step::Halted`].
    pub fn step(&mut self) -> Result<Step, Error> {
        let program = Arc::clone(&self.program);
        let Some(instruction) = program.instruction(self.next_instruction) else {
            return Ok(Step::Halted);
        };
        let cur = instruction.num;
        self.next_instruction = cur + 1;
        trace!(num = cur, func = %instruction.func, "step");

        let expanded = match expand_args(&instruction.args, &self.registers) {
            Ok(values) => values,
            Err(message) => return Err(self.fail(message, instruction.pos)),
        };

        // A program compiled against one library can be run against
        // another, so a missing function is a runtime error, not a bug.
        let Some(desc) = self.library.get(&instruction.func) else {
            let message = format!("no such function '{}'", instruction.func);
            return Err(self.fail(message, instruction.pos));
        };
        let Some(run) = desc.run else {
            let message = format!("function '{}' cannot be executed", instruction.func);
            return Err(self.fail(message, instruction.pos));
        };

        let mut iface = Interface::new(
            &program,
            cur,
            self.next_instruction,
            &mut self.buffer,
            &mut self.return_target,
        );
        let result = run(&mut iface, &expanded);
        let (next, writes, signal) = iface.into_parts();
        if let Err(message) = result {
            return Err(self.fail(message, instruction.pos));
        }

        self.next_instruction = next;
        for (index, value) in writes {
            if let Some(max) = self.max_registers
                && index > max
            {
                let message = format!("register {index} exceeds the configured maximum of {max}");
                return Err(self.fail(message, instruction.pos));
            }
            self.registers.insert(index, value);
        }

        Ok(match signal {
            None => Step::Ran,
            Some(Signal::Emit(value)) => Step::Output(value),
            Some(Signal::AwaitInput) => Step::AwaitingInput,
        })
    }

    /// Step until the machine halts, emits output, needs input, or fails.
    pub fn step_until_output(&mut self) -> Result<Step, Error> {
        loop {
            match self.step()? {
                Step::Ran => continue,
                other => return Ok(other),
            }
        }
    }

    fn fail(&mut self, message: String, pos: usize) -> Error {
        self.next_instruction = 0;
        Error::new(message, pos)
    }
}
