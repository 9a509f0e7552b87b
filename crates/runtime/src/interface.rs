//! The per-step machine interface
//!
//! Run-time behaviors never touch a [`Machine`](crate::machine::Machine)
//! directly. Each step, the machine assembles an [`Interface`] — a transient
//! view over exactly the state a behavior may observe and mutate — and tears
//! it down afterwards, flushing accumulated register writes in one pass.
//! This keeps a behavior from seeing its own half-applied effects and keeps
//! the machine's invariants (register cap, program-counter discipline) in
//! one place.

use bliks_core::{CompiledProgram, Value};
use std::collections::VecDeque;

/// What a step produced, set at most once per step.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// A value to hand to the host.
    Emit(Value),
    /// The input buffer was empty; the host must push input and re-step.
    AwaitInput,
}

pub struct Interface<'m> {
    program: &'m CompiledProgram,
    cur_instruction: usize,
    next_instruction: usize,
    buffer: &'m mut VecDeque<String>,
    return_target: &'m mut Option<usize>,
    writes: Vec<(u64, Value)>,
    output: Option<Signal>,
}

impl<'m> Interface<'m> {
    pub(crate) fn new(
        program: &'m CompiledProgram,
        cur_instruction: usize,
        next_instruction: usize,
        buffer: &'m mut VecDeque<String>,
        return_target: &'m mut Option<usize>,
    ) -> Interface<'m> {
        Interface {
            program,
            cur_instruction,
            next_instruction,
            buffer,
            return_target,
            writes: Vec::new(),
            output: None,
        }
    }

    pub fn program(&self) -> &CompiledProgram {
        self.program
    }

    /// 1-based index of the instruction being executed.
    pub fn cur_instruction(&self) -> usize {
        self.cur_instruction
    }

    pub fn next_instruction(&self) -> usize {
        self.next_instruction
    }

    /// Redirect execution. 0 halts the machine.
    pub fn set_next_instruction(&mut self, num: usize) {
        self.next_instruction = num;
    }

    /// Queue a register write; it is committed when the step flushes.
    pub fn set_register(&mut self, index: u64, value: Value) {
        self.writes.push((index, value));
    }

    pub fn pop_buffer(&mut self) -> Option<String> {
        self.buffer.pop_front()
    }

    /// Emit the step's output. At most one output per step.
    pub fn emit(&mut self, value: Value) -> Result<(), String> {
        self.set_signal(Signal::Emit(value))
    }

    /// Signal the host that input is required. The caller is responsible
    /// for rewinding the program counter so the instruction repeats.
    pub fn await_input(&mut self) -> Result<(), String> {
        self.set_signal(Signal::AwaitInput)
    }

    fn set_signal(&mut self, signal: Signal) -> Result<(), String> {
        if self.output.is_some() {
            return Err("output has already been set during this step".to_string());
        }
        self.output = Some(signal);
        Ok(())
    }

    /// The label this instruction was compiled to jump to.
    pub fn jump_dest(&self) -> Result<String, String> {
        self.program.jump_dest(self.cur_instruction).map(str::to_string)
    }

    /// Jump to the next occurrence of a label after this instruction.
    pub fn jump_forward(&mut self, label: &str) -> Result<(), String> {
        let target = self.program.next_label(label, self.cur_instruction)?;
        self.next_instruction = target;
        Ok(())
    }

    /// Jump to the closest occurrence of a label before this instruction.
    pub fn jump_backward(&mut self, label: &str) -> Result<(), String> {
        let target = self.program.previous_label(label, self.cur_instruction)?;
        self.next_instruction = target;
        Ok(())
    }

    /// Jump to a label that must occur exactly once.
    pub fn goto(&mut self, label: &str) -> Result<(), String> {
        let target = self.program.unique_label(label)?;
        self.next_instruction = target;
        Ok(())
    }

    /// Record this instruction as the return target of a call. Calls do not
    /// nest; a second call before a `return` is an error.
    pub fn begin_call(&mut self) -> Result<(), String> {
        if self.return_target.is_some() {
            return Err("cannot call: already inside a function".to_string());
        }
        *self.return_target = Some(self.cur_instruction);
        Ok(())
    }

    /// Take the outstanding return target, if any.
    pub fn end_call(&mut self) -> Option<usize> {
        self.return_target.take()
    }

    pub(crate) fn into_parts(self) -> (usize, Vec<(u64, Value)>, Option<Signal>) {
        (self.next_instruction, self.writes, self.output)
    }
}
