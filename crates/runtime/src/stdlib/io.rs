//! I/O built-ins
//!
//! All input comes through the machine's buffer and all output goes through
//! the per-step output slot; nothing here touches the process's stdio. The
//! `poll` family is the machine's only suspension point: an empty buffer
//! rewinds the program counter onto the polling instruction and signals the
//! host, so the next `step` retries after a `push`.

use super::{Library, pointer, text};
use crate::interface::Interface;
use bliks_core::{Value, parse_number};

pub(super) fn install(lib: &mut Library) {
    lib.register("read", "p", None, Some(r_read));
    lib.register("readnum", "p", None, Some(r_readnum));
    lib.register("poll", "p", None, Some(r_poll));
    lib.register("pollnum", "p", None, Some(r_pollnum));
    lib.register("write", "s", None, Some(r_write));
    lib.register("writef", "s s*", None, Some(r_writef));
}

fn numeric(input: String) -> Result<Value, String> {
    match parse_number(&input) {
        Some(n) => Ok(Value::Num(n)),
        None => Err(format!("expected a number from input, but got '{input}'")),
    }
}

fn r_read(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let input = iface.pop_buffer().unwrap_or_default();
    iface.set_register(pointer(&args[0]), Value::Str(input));
    Ok(())
}

fn r_readnum(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let input = iface.pop_buffer().unwrap_or_default();
    iface.set_register(pointer(&args[0]), numeric(input)?);
    Ok(())
}

fn r_poll(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    match iface.pop_buffer() {
        Some(input) => {
            iface.set_register(pointer(&args[0]), Value::Str(input));
            Ok(())
        }
        None => suspend(iface),
    }
}

fn r_pollnum(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    match iface.pop_buffer() {
        Some(input) => {
            iface.set_register(pointer(&args[0]), numeric(input)?);
            Ok(())
        }
        None => suspend(iface),
    }
}

/// Repeat this instruction once input arrives.
fn suspend(iface: &mut Interface<'_>) -> Result<(), String> {
    iface.set_next_instruction(iface.cur_instruction());
    iface.await_input()
}

fn r_write(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    iface.emit(args[0].clone())
}

/// `writef fmt v…`: each `%s` consumes the next value, `%%` is a literal
/// percent. The placeholder count must match the value count exactly.
fn r_writef(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let fmt = text(&args[0]);
    let mut values = args[1..].iter();
    let supplied = args.len() - 1;

    let mut out = String::with_capacity(fmt.len());
    let mut chars = fmt.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some('s') => match values.next() {
                Some(v) => out.push_str(&text(v)),
                None => {
                    return Err(format!(
                        "format string expects more than the {supplied} supplied value(s)"
                    ));
                }
            },
            Some(other) => return Err(format!("invalid format directive '%{other}'")),
            None => return Err("incomplete format directive at end of string".to_string()),
        }
    }

    let leftover = values.count();
    if leftover > 0 {
        return Err(format!(
            "format string leaves {leftover} of the {supplied} value(s) unused"
        ));
    }
    iface.emit(Value::Str(out))
}
