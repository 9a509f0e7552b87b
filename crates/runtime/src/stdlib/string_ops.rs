//! String, logic, and register built-ins
//!
//! Comparisons and logic return the canonical booleans: `"true"` and the
//! empty string. `equal` compares canonical string forms, so the number 5
//! and the string "5" are equal; `greater`/`less` demand numbers up front.

use super::{Library, number, pointer, text};
use crate::interface::Interface;
use bliks_core::Value;

pub(super) fn install(lib: &mut Library) {
    lib.register("set", "p s", None, Some(r_set));
    lib.register("concat", "p s s*", None, Some(r_concat));
    lib.register("upper", "p s", None, Some(r_upper));
    lib.register("lower", "p s", None, Some(r_lower));
    lib.register("len", "p s", None, Some(r_len));
    lib.register("tonum", "p s", None, Some(r_tonum));
    lib.register("tostr", "p s", None, Some(r_tostr));
    lib.register("equal", "p s s", None, Some(r_equal));
    lib.register("greater", "p n n", None, Some(r_greater));
    lib.register("less", "p n n", None, Some(r_less));
    lib.register("not", "p s", None, Some(r_not));
    lib.register("and", "p s s*", None, Some(r_and));
    lib.register("or", "p s s*", None, Some(r_or));
}

fn store(iface: &mut Interface<'_>, dest: &Value, value: Value) {
    iface.set_register(pointer(dest), value);
}

fn r_set(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], args[1].clone());
    Ok(())
}

fn r_concat(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let joined: String = args[1..].iter().map(text).collect();
    store(iface, &args[0], Value::Str(joined));
    Ok(())
}

fn r_upper(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], Value::Str(text(&args[1]).to_uppercase()));
    Ok(())
}

fn r_lower(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], Value::Str(text(&args[1]).to_lowercase()));
    Ok(())
}

/// Length in bytes of the canonical string form.
fn r_len(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], Value::Num(text(&args[1]).len() as f64));
    Ok(())
}

fn r_tonum(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    match args[1].as_num() {
        Some(n) => {
            store(iface, &args[0], Value::Num(n));
            Ok(())
        }
        None => Err(format!("cannot convert '{}' to a number", args[1])),
    }
}

fn r_tostr(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], Value::Str(text(&args[1])));
    Ok(())
}

fn r_equal(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let eq = text(&args[1]) == text(&args[2]);
    store(iface, &args[0], Value::from_bool(eq));
    Ok(())
}

fn r_greater(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let gt = number(&args[1]) > number(&args[2]);
    store(iface, &args[0], Value::from_bool(gt));
    Ok(())
}

fn r_less(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let lt = number(&args[1]) < number(&args[2]);
    store(iface, &args[0], Value::from_bool(lt));
    Ok(())
}

fn r_not(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], Value::from_bool(!args[1].truthy()));
    Ok(())
}

fn r_and(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let all = args[1..].iter().all(Value::truthy);
    store(iface, &args[0], Value::from_bool(all));
    Ok(())
}

fn r_or(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let any = args[1..].iter().any(Value::truthy);
    store(iface, &args[0], Value::from_bool(any));
    Ok(())
}
