//! Arithmetic built-ins
//!
//! Every operation writes its result to the destination register named by
//! the first argument. Operands arrive already canonicalized to numbers by
//! argument expansion. `mod` is floored (the sign follows the divisor),
//! matching the language's numeric heritage rather than Rust's truncating
//! `%`.

use super::{Library, number, pointer};
use crate::interface::Interface;
use bliks_core::Value;
use rand::Rng;

pub(super) fn install(lib: &mut Library) {
    lib.register("add", "p n n", None, Some(r_add));
    lib.register("sub", "p n n", None, Some(r_sub));
    lib.register("mul", "p n n", None, Some(r_mul));
    lib.register("div", "p n n", None, Some(r_div));
    lib.register("mod", "p n n", None, Some(r_mod));
    lib.register("pow", "p n n", None, Some(r_pow));
    lib.register("min", "p n n*", None, Some(r_min));
    lib.register("max", "p n n*", None, Some(r_max));
    lib.register("neg", "p n", None, Some(r_neg));
    lib.register("abs", "p n", None, Some(r_abs));
    lib.register("floor", "p n", None, Some(r_floor));
    lib.register("ceil", "p n", None, Some(r_ceil));
    lib.register("round", "p n", None, Some(r_round));
    lib.register("sqrt", "p n", None, Some(r_sqrt));
    lib.register("rand", "p n n", None, Some(r_rand));
}

fn store(iface: &mut Interface<'_>, dest: &Value, n: f64) {
    iface.set_register(pointer(dest), Value::Num(n));
}

fn r_add(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]) + number(&args[2]));
    Ok(())
}

fn r_sub(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]) - number(&args[2]));
    Ok(())
}

fn r_mul(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]) * number(&args[2]));
    Ok(())
}

fn r_div(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let divisor = number(&args[2]);
    if divisor == 0.0 {
        return Err("division by zero".to_string());
    }
    store(iface, &args[0], number(&args[1]) / divisor);
    Ok(())
}

fn r_mod(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let divisor = number(&args[2]);
    if divisor == 0.0 {
        return Err("modulo by zero".to_string());
    }
    let a = number(&args[1]);
    store(iface, &args[0], a - (a / divisor).floor() * divisor);
    Ok(())
}

fn r_pow(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]).powf(number(&args[2])));
    Ok(())
}

fn r_min(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let n = args[1..].iter().map(number).fold(f64::INFINITY, f64::min);
    store(iface, &args[0], n);
    Ok(())
}

fn r_max(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let n = args[1..]
        .iter()
        .map(number)
        .fold(f64::NEG_INFINITY, f64::max);
    store(iface, &args[0], n);
    Ok(())
}

fn r_neg(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], -number(&args[1]));
    Ok(())
}

fn r_abs(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]).abs());
    Ok(())
}

fn r_floor(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]).floor());
    Ok(())
}

fn r_ceil(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]).ceil());
    Ok(())
}

fn r_round(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]).round());
    Ok(())
}

fn r_sqrt(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    store(iface, &args[0], number(&args[1]).sqrt());
    Ok(())
}

/// Uniform random integer in `[low, high]`. The only nondeterministic
/// built-in.
fn r_rand(iface: &mut Interface<'_>, args: &[Value]) -> Result<(), String> {
    let low = number(&args[1]).ceil();
    let high = number(&args[2]).floor();
    if low > high || !low.is_finite() || !high.is_finite() {
        return Err(format!("rand range [{}, {}] is empty", args[1], args[2]));
    }
    let n = rand::thread_rng().gen_range(low as i64..=high as i64);
    store(iface, &args[0], n as f64);
    Ok(())
}
