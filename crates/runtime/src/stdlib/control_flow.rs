//! Control-flow built-ins
//!
//! The only family with compile behaviors. At resolve time these maintain
//! two counters (open `if` depth, open loop depth) on the program builder
//! and translate structured syntax into the label and jump-destination
//! tables; at run time the jumps resolve directionally against those
//! tables, so the same label name may recur at equal nesting depths without
//! ambiguity.
//!
//! Layout produced for a loop:
//!
//! ```text
//! while c        <- label _LOOP1 here; jumps forward to _END1 when c is falsy
//!   body
//! end            <- jumps backward to _LOOP1; label _END1 just after
//! ```
//!
//! `if c … else` guards a block: a falsy test jumps forward to the label
//! the `else` marker placed. `endif c` is the conditional loop exit, and
//! `break`/`continue` jump to the enclosing loop's `_END`/`_LOOP`.

use super::{Library, text};
use crate::interface::Interface;
use bliks_core::{ProgramBuilder, Value};

pub(super) fn install(lib: &mut Library) {
    lib.register("begin", "", Some(c_begin), None);
    lib.register(">", "!N", Some(c_label), None);
    lib.register("let", "!N !s", Some(c_let), None);
    lib.register("func", "!N", Some(c_func), None);

    lib.register("if", "s", Some(c_if), Some(r_if));
    lib.register("ifnot", "s", Some(c_if), Some(r_ifnot));
    lib.register("else", "", Some(c_else), None);

    lib.register("repeat", "", Some(c_repeat), None);
    lib.register("while", "s", Some(c_while), Some(r_while));
    lib.register("for", "p n n n?", Some(c_while), Some(r_for));
    lib.register("endif", "s", Some(c_endif), Some(r_while));
    lib.register("end", "", Some(c_end), Some(r_end));
    lib.register("break", "", Some(c_break), Some(r_break));
    lib.register("continue", "", Some(c_continue), Some(r_continue));

    lib.register("goto", "!N", None, Some(r_goto));
    lib.register("jump", "!N", None, Some(r_jump));
    lib.register("call", "!N", None, Some(r_call));
    lib.register("return", "", None, Some(r_return));
    lib.register("stop", "", None, Some(r_stop));
    lib.register("throw", "s", None, Some(r_throw));
    lib.register("assert", "s s?", None, Some(r_assert));
    lib.register("===", "", None, Some(r_boundary));
}

fn else_label(level: usize) -> String {
    format!("_ELSE{level}")
}

fn loop_label(level: usize) -> String {
    format!("_LOOP{level}")
}

fn end_label(level: usize) -> String {
    format!("_END{level}")
}

// Compile behaviors. `b.cur_instruction` is the index the instruction being
// resolved will occupy (for marker-only built-ins: the index the next
// emitted instruction will occupy).

fn c_begin(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    b.set_begin(b.cur_instruction)
}

fn c_label(b: &mut ProgramBuilder, args: &[Value]) -> Result<(), String> {
    let name = text(&args[0]);
    b.add_label(&name, b.cur_instruction);
    Ok(())
}

fn c_let(b: &mut ProgramBuilder, args: &[Value]) -> Result<(), String> {
    b.macros.insert(text(&args[0]), args[1].clone());
    Ok(())
}

fn c_func(b: &mut ProgramBuilder, args: &[Value]) -> Result<(), String> {
    let name = text(&args[0]);
    if b.has_label(&name) {
        return Err(format!(
            "cannot define function '{name}' because this label already exists"
        ));
    }
    b.add_label(&name, b.cur_instruction);
    Ok(())
}

fn c_if(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    b.if_level += 1;
    let label = else_label(b.if_level);
    b.set_jump_dest(b.cur_instruction, label);
    Ok(())
}

fn c_else(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    if b.if_level == 0 {
        return Err("'else' without a matching 'if'".to_string());
    }
    let label = else_label(b.if_level);
    b.add_label(&label, b.cur_instruction);
    b.if_level -= 1;
    Ok(())
}

fn c_repeat(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    b.loop_level += 1;
    let label = loop_label(b.loop_level);
    b.add_label(&label, b.cur_instruction);
    Ok(())
}

/// `while` and `for`: a loop head that can also exit.
fn c_while(b: &mut ProgramBuilder, args: &[Value]) -> Result<(), String> {
    c_repeat(b, args)?;
    b.set_jump_dest(b.cur_instruction, end_label(b.loop_level));
    Ok(())
}

fn c_endif(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    if b.loop_level == 0 {
        return Err("'endif' outside of a loop".to_string());
    }
    b.set_jump_dest(b.cur_instruction, end_label(b.loop_level));
    Ok(())
}

fn c_end(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    if b.loop_level == 0 {
        return Err("'end' without a matching loop".to_string());
    }
    let level = b.loop_level;
    b.loop_level -= 1;
    b.set_jump_dest(b.cur_instruction, loop_label(level));
    b.add_label(&end_label(level), b.cur_instruction + 1);
    Ok(())
}

fn c_break(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    if b.loop_level == 0 {
        return Err("'break' outside of a loop".to_string());
    }
    b.set_jump_dest(b.cur_instruction, end_label(b.loop_level));
    Ok(())
}

fn c_continue(b: &mut ProgramBuilder, _args: &[Value]) -> Result<(), String> {
    if b.loop_level == 0 {
        return Err("'continue' outside of a loop".to_string());
    }
    b.set_jump_dest(b.cur_instruction, loop_label(b.loop_level));
    Ok(())
}

// Run behaviors.

fn r_if(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    if !args[0].truthy() {
        let label = iface.jump_dest()?;
        iface.jump_forward(&label)?;
    }
    Ok(())
}

fn r_ifnot(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    if args[0].truthy() {
        let label = iface.jump_dest()?;
        iface.jump_forward(&label)?;
    }
    Ok(())
}

/// Shared by `while` and `endif`: exit the loop when the test fails.
fn r_while(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    r_if(iface, args)
}

fn r_for(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let register = super::pointer(&args[0]);
    let i = super::number(&args[1]);
    let stop = super::number(&args[2]);
    let step = args.get(3).map(super::number).unwrap_or(1.0);
    if step == 0.0 {
        return Err("'for' step cannot be zero".to_string());
    }

    let next = i + step;
    iface.set_register(register, Value::Num(next));
    if (step > 0.0 && next > stop) || (step < 0.0 && next < stop) {
        let label = iface.jump_dest()?;
        iface.jump_forward(&label)?;
    }
    Ok(())
}

fn r_end(iface: &mut Interface<'_>, _args: &[Value]) -> Result<(), String> {
    let label = iface.jump_dest()?;
    iface.jump_backward(&label)
}

fn r_break(iface: &mut Interface<'_>, _args: &[Value]) -> Result<(), String> {
    let label = iface.jump_dest()?;
    iface.jump_forward(&label)
}

fn r_continue(iface: &mut Interface<'_>, _args: &[Value]) -> Result<(), String> {
    let label = iface.jump_dest()?;
    iface.jump_backward(&label)
}

fn r_goto(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    iface.goto(&text(&args[0]))
}

fn r_jump(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    iface.jump_forward(&text(&args[0]))
}

fn r_call(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    iface.begin_call()?;
    iface.goto(&text(&args[0]))
}

fn r_return(iface: &mut Interface<'_>, _args: &[Value]) -> Result<(), String> {
    match iface.end_call() {
        Some(target) => {
            iface.set_next_instruction(target + 1);
            Ok(())
        }
        None => Err("'return' without a matching 'call'".to_string()),
    }
}

fn r_stop(iface: &mut Interface<'_>, _args: &[Value]) -> Result<(), String> {
    iface.set_next_instruction(0);
    Ok(())
}

fn r_throw(_iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    Err(text(&args[0]))
}

fn r_assert(_iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    if args[0].truthy() {
        Ok(())
    } else {
        Err(args
            .get(1)
            .map(text)
            .unwrap_or_else(|| "value was false".to_string()))
    }
}

fn r_boundary(_iface: &mut Interface<'_>, _args: &[Value]) -> Result<(), String> {
    Err("crossed a === boundary".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_if_else_tables() {
        let mut b = ProgramBuilder::new();

        // if ... emitted at index 1
        b.cur_instruction = 1;
        c_if(&mut b, &[]).unwrap();
        assert_eq!(b.jump_dests.get(&1), Some(&"_ELSE1".to_string()));
        assert_eq!(b.if_level, 1);

        // marker at index 3 (two body instructions in between)
        b.cur_instruction = 3;
        c_else(&mut b, &[]).unwrap();
        assert_eq!(b.labels.get("_ELSE1"), Some(&vec![3]));
        assert_eq!(b.if_level, 0);

        assert!(c_else(&mut b, &[]).is_err());
    }

    #[test]
    fn test_nested_if_levels() {
        let mut b = ProgramBuilder::new();
        b.cur_instruction = 1;
        c_if(&mut b, &[]).unwrap();
        b.cur_instruction = 2;
        c_if(&mut b, &[]).unwrap();
        assert_eq!(b.jump_dests.get(&2), Some(&"_ELSE2".to_string()));

        b.cur_instruction = 3;
        c_else(&mut b, &[]).unwrap(); // closes the inner if
        b.cur_instruction = 4;
        c_else(&mut b, &[]).unwrap(); // closes the outer if
        assert_eq!(b.labels.get("_ELSE2"), Some(&vec![3]));
        assert_eq!(b.labels.get("_ELSE1"), Some(&vec![4]));
    }

    #[test]
    fn test_while_end_tables() {
        let mut b = ProgramBuilder::new();
        b.cur_instruction = 1;
        c_while(&mut b, &[]).unwrap();
        assert_eq!(b.labels.get("_LOOP1"), Some(&vec![1]));
        assert_eq!(b.jump_dests.get(&1), Some(&"_END1".to_string()));

        b.cur_instruction = 3;
        c_end(&mut b, &[]).unwrap();
        assert_eq!(b.jump_dests.get(&3), Some(&"_LOOP1".to_string()));
        assert_eq!(b.labels.get("_END1"), Some(&vec![4]));
        assert_eq!(b.loop_level, 0);

        assert!(c_end(&mut b, &[]).is_err());
    }

    #[test]
    fn test_sequential_loops_reuse_level_labels() {
        let mut b = ProgramBuilder::new();
        b.cur_instruction = 1;
        c_repeat(&mut b, &[]).unwrap();
        b.cur_instruction = 2;
        c_end(&mut b, &[]).unwrap();
        b.cur_instruction = 3;
        c_repeat(&mut b, &[]).unwrap();
        b.cur_instruction = 4;
        c_end(&mut b, &[]).unwrap();

        assert_eq!(b.labels.get("_LOOP1"), Some(&vec![1, 3]));
        assert_eq!(b.labels.get("_END1"), Some(&vec![3, 5]));
    }

    #[test]
    fn test_break_continue_require_a_loop() {
        let mut b = ProgramBuilder::new();
        assert!(c_break(&mut b, &[]).is_err());
        assert!(c_continue(&mut b, &[]).is_err());
        assert!(c_endif(&mut b, &[]).is_err());

        b.cur_instruction = 1;
        c_repeat(&mut b, &[]).unwrap();
        b.cur_instruction = 2;
        c_break(&mut b, &[]).unwrap();
        assert_eq!(b.jump_dests.get(&2), Some(&"_END1".to_string()));
    }

    #[test]
    fn test_func_rejects_existing_label() {
        let mut b = ProgramBuilder::new();
        b.cur_instruction = 1;
        c_label(&mut b, &[Value::from("f")]).unwrap();
        let err = c_func(&mut b, &[Value::from("f")]).unwrap_err();
        assert!(err.contains("already exists"));
    }
}
