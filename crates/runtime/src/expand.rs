//! Argument expansion
//!
//! Turns the resolved arguments of an instruction into raw values ready for
//! a run-time behavior. Literals pass straight through; retrievals walk the
//! register map one hop per `@`, demanding a pointer before every hop and
//! checking the final value against the parameter type. The hop trace is
//! kept for error messages, so a failed chain reads back the path it took.

use bliks_core::{Argument, Value, ValueType, parse_number};
use std::collections::HashMap;

/// Values longer than this are shortened in hop traces.
const TRACE_VALUE_LEN: usize = 20;

pub type Registers = HashMap<u64, Value>;

/// Expand every argument against the given registers.
///
/// Resolution uses this same routine with an empty register map to produce
/// the values handed to compile-time behaviors.
pub fn expand_args(args: &[Argument], registers: &Registers) -> Result<Vec<Value>, String> {
    let mut expanded = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        let value = match arg {
            Argument::Value { value, .. } => value.clone(),
            Argument::Retrieval { expected, index, depth, .. } => {
                retrieve(index, *depth, *expected, i + 1, registers)?
            }
        };

        // Canonicalize numeric arguments so behaviors see numbers, not
        // digit strings. The type checks above make the parse infallible.
        let value = if arg.expected().is(ValueType::Number) {
            match value {
                Value::Str(s) => match parse_number(&s) {
                    Some(n) => Value::Num(n),
                    None => unreachable!("value '{s}' passed a numeric type check"),
                },
                num => num,
            }
        } else {
            value
        };
        expanded.push(value);
    }
    Ok(expanded)
}

/// Follow a retrieval chain: `depth` register lookups starting at `index`.
fn retrieve(
    index: &Value,
    depth: u32,
    expected: ValueType,
    arg_num: usize,
    registers: &Registers,
) -> Result<Value, String> {
    let mut current = index.clone();
    let mut trace = vec![truncate(&current)];

    for _ in 0..depth {
        let pointer = current.as_pointer().ok_or_else(|| {
            format!(
                "expected pointer during retrieval, but got {} (a {})",
                join_trace(&trace),
                current.value_type()
            )
        })?;
        current = registers
            .get(&pointer)
            .cloned()
            .unwrap_or_else(|| Value::from(""));
        trace.push(truncate(&current));
    }

    let actual = current.value_type();
    if !actual.is(expected) {
        return Err(format!(
            "function expects a {expected} for argument {arg_num}, \
             but retrieval expanded to {} (a {actual})",
            join_trace(&trace)
        ));
    }
    Ok(current)
}

fn truncate(value: &Value) -> String {
    let text = value.to_string();
    if text.len() > TRACE_VALUE_LEN {
        let end = (0..=TRACE_VALUE_LEN).rev().find(|&i| text.is_char_boundary(i));
        format!("{}...", &text[..end.unwrap_or(0)])
    } else {
        text
    }
}

fn join_trace(trace: &[String]) -> String {
    trace
        .iter()
        .map(|v| format!("'{v}'"))
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value_arg(expected: ValueType, value: Value) -> Argument {
        Argument::Value { expected, value, pos: 1 }
    }

    fn retrieval_arg(expected: ValueType, index: f64, depth: u32) -> Argument {
        Argument::Retrieval { expected, index: Value::Num(index), depth, pos: 1 }
    }

    #[test]
    fn test_literals_pass_through() {
        let args = [value_arg(ValueType::String, Value::from("hi"))];
        assert_eq!(
            expand_args(&args, &Registers::new()).unwrap(),
            vec![Value::from("hi")]
        );
    }

    #[test]
    fn test_numeric_arguments_are_canonicalized() {
        let args = [
            value_arg(ValueType::Number, Value::from("5")),
            value_arg(ValueType::Pointer, Value::from("3")),
            value_arg(ValueType::String, Value::from("7")),
        ];
        let expanded = expand_args(&args, &Registers::new()).unwrap();
        assert_eq!(
            expanded,
            vec![Value::Num(5.0), Value::Num(3.0), Value::from("7")]
        );
    }

    #[test]
    fn test_retrieval_follows_registers() {
        let mut regs = Registers::new();
        regs.insert(1, Value::Num(2.0));
        regs.insert(2, Value::from("b"));

        let args = [retrieval_arg(ValueType::String, 1.0, 2)];
        assert_eq!(expand_args(&args, &regs).unwrap(), vec![Value::from("b")]);
    }

    #[test]
    fn test_missing_registers_read_as_empty() {
        let args = [retrieval_arg(ValueType::String, 9.0, 1)];
        assert_eq!(
            expand_args(&args, &Registers::new()).unwrap(),
            vec![Value::from("")]
        );
    }

    #[test]
    fn test_non_pointer_mid_chain() {
        let mut regs = Registers::new();
        regs.insert(1, Value::from("b"));

        let args = [retrieval_arg(ValueType::String, 1.0, 2)];
        let err = expand_args(&args, &regs).unwrap_err();
        assert_eq!(
            err,
            "expected pointer during retrieval, but got '1' -> 'b' (a string)"
        );
    }

    #[test]
    fn test_final_type_mismatch_reports_trace() {
        let mut regs = Registers::new();
        regs.insert(1, Value::Num(2.0));
        regs.insert(2, Value::from("b"));

        let args = [retrieval_arg(ValueType::Pointer, 1.0, 2)];
        let err = expand_args(&args, &regs).unwrap_err();
        assert!(err.contains("'1' -> '2' -> 'b' (a string)"), "{err}");
        assert!(err.contains("expects a pointer for argument 1"), "{err}");
    }

    #[test]
    fn test_long_values_truncated_in_trace() {
        let mut regs = Registers::new();
        regs.insert(1, Value::Str("x".repeat(50)));

        let args = [retrieval_arg(ValueType::String, 1.0, 2)];
        let err = expand_args(&args, &regs).unwrap_err();
        assert!(err.contains(&format!("'{}...'", "x".repeat(20))), "{err}");
    }
}
