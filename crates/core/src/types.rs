//! Type system for Bliks
//!
//! Values are classified into a small closed hierarchy: every positive
//! integer is a `Pointer` (usable as a register index), every other numeric
//! value is a `Number`, and everything else is a `String`. The three form a
//! subtype chain (`Pointer` ⊂ `Number` ⊂ `String`); `Name` stands apart and
//! only ever applies to name tokens, never to runtime values.
//!
//! Built-in functions declare their parameters with a compact spec string,
//! parsed by [`parse_params`]: whitespace-separated atoms of the form
//! `!? letter [?|*]`, e.g. `"p n n*"` for a destination register and one or
//! more numbers.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    /// A positive integer, usable as a register index.
    Pointer,
    /// Any numeric value.
    Number,
    /// Any value at all.
    String,
    /// A bare name token. Disjoint from the other three.
    Name,
}

impl ValueType {
    /// Subtype test: is `self` usable where `other` is expected?
    pub fn is(self, other: ValueType) -> bool {
        use ValueType::*;
        match (self, other) {
            (Name, Name) => true,
            (Name, _) | (_, Name) => false,
            (Pointer, _) => true,
            (Number, Number | String) => true,
            (String, String) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Pointer => "pointer",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Name => "name",
        };
        write!(f, "{name}")
    }
}

impl Value {
    /// The most specific type of this value.
    pub fn value_type(&self) -> ValueType {
        if self.as_pointer().is_some() {
            ValueType::Pointer
        } else if self.as_num().is_some() {
            ValueType::Number
        } else {
            ValueType::String
        }
    }
}

/// One declared parameter of a built-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parameter {
    pub ty: ValueType,
    /// A fixed parameter must be supplied as a literal, never a retrieval.
    pub fixed: bool,
}

/// An ordered parameter list with derived argument-count bounds.
///
/// Optional parameters must all be trailing, and at most one trailing
/// parameter may be variadic. The effective type of argument `i` is the
/// `i`-th parameter's if present, otherwise the last parameter's (so a
/// variadic parameter repeats indefinitely).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterList {
    params: Vec<Parameter>,
    min: usize,
    max: Option<usize>,
}

impl ParameterList {
    pub fn min(&self) -> usize {
        self.min
    }

    /// `None` means unbounded (trailing variadic parameter).
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// The parameter governing the `i`-th argument (0-based).
    ///
    /// Panics if called on an empty list; arity checking rejects any
    /// argument to a zero-parameter function first.
    pub fn at(&self, i: usize) -> Parameter {
        match self.params.get(i) {
            Some(p) => *p,
            None => *self.params.last().expect("argument to a nullary function"),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// Parse a parameter-spec string into a [`ParameterList`].
///
/// Grammar per atom: optional `!` (fixed), one of `p`/`n`/`s`/`N`, optional
/// trailing `?` (optional) or `*` (variadic).
pub fn parse_params(spec: &str) -> Result<ParameterList, String> {
    let mut params = Vec::new();
    let mut optionals = 0;
    let mut variadic = false;

    for atom in spec.split_whitespace() {
        if variadic {
            return Err(format!(
                "parameter '{atom}' follows a variadic parameter, which must be last"
            ));
        }

        let mut chars = atom.chars();
        let mut c = chars
            .next()
            .ok_or_else(|| format!("empty parameter in spec '{spec}'"))?;
        let fixed = c == '!';
        if fixed {
            c = chars
                .next()
                .ok_or_else(|| format!("malformed parameter '{atom}'"))?;
        }

        let ty = match c {
            'p' => ValueType::Pointer,
            'n' => ValueType::Number,
            's' => ValueType::String,
            'N' => ValueType::Name,
            other => return Err(format!("unknown parameter type '{other}' in '{atom}'")),
        };

        match chars.next() {
            None => {
                if optionals > 0 {
                    return Err(format!(
                        "required parameter '{atom}' follows an optional parameter"
                    ));
                }
            }
            Some('?') => optionals += 1,
            Some('*') => variadic = true,
            Some(other) => {
                return Err(format!("unexpected suffix '{other}' in parameter '{atom}'"));
            }
        }
        if chars.next().is_some() {
            return Err(format!("malformed parameter '{atom}'"));
        }

        params.push(Parameter { ty, fixed });
    }

    let total = params.len();
    let min = total - optionals - usize::from(variadic);
    let max = if variadic { None } else { Some(total) };
    Ok(ParameterList { params, min, max })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtype_chain() {
        use ValueType::*;
        for t in [Pointer, Number, String, Name] {
            assert!(t.is(t));
        }
        assert!(Pointer.is(Number));
        assert!(Pointer.is(String));
        assert!(Number.is(String));
        assert!(!Number.is(Pointer));
        assert!(!String.is(Number));
        assert!(!String.is(Name));
        assert!(!Name.is(String));
    }

    #[test]
    fn test_classification() {
        assert_eq!(Value::from("5").value_type(), ValueType::Pointer);
        assert_eq!(Value::Num(2.0).value_type(), ValueType::Pointer);
        assert_eq!(Value::Num(3.2).value_type(), ValueType::Number);
        assert_eq!(Value::Num(0.0).value_type(), ValueType::Number);
        assert_eq!(Value::Num(-3.0).value_type(), ValueType::Number);
        assert_eq!(Value::from("b").value_type(), ValueType::String);
        assert_eq!(Value::from("").value_type(), ValueType::String);
    }

    #[test]
    fn test_parse_params_basic() {
        let list = parse_params("p n n").unwrap();
        assert_eq!(list.min(), 3);
        assert_eq!(list.max(), Some(3));
        assert_eq!(list.at(0).ty, ValueType::Pointer);
        assert_eq!(list.at(1).ty, ValueType::Number);
        assert!(!list.at(0).fixed);
    }

    #[test]
    fn test_parse_params_fixed_optional_variadic() {
        let list = parse_params("!N s? s*").unwrap();
        assert_eq!(list.min(), 1);
        assert_eq!(list.max(), None);
        assert!(list.at(0).fixed);
        assert_eq!(list.at(0).ty, ValueType::Name);
        // The variadic parameter repeats for every further argument.
        assert_eq!(list.at(5).ty, ValueType::String);
    }

    #[test]
    fn test_parse_params_is_whitespace_insensitive() {
        assert_eq!(parse_params("p  n\tn"), parse_params("p n n"));
    }

    #[test]
    fn test_parse_params_rejects_malformed_specs() {
        assert!(parse_params("x").is_err());
        assert!(parse_params("p!").is_err());
        assert!(parse_params("n?? ").is_err());
        assert!(parse_params("n? n").is_err());
        assert!(parse_params("n* n").is_err());
        assert!(parse_params("!").is_err());
    }

    #[test]
    fn test_accepts_counts() {
        let list = parse_params("p n n?").unwrap();
        assert!(!list.accepts(1));
        assert!(list.accepts(2));
        assert!(list.accepts(3));
        assert!(!list.accepts(4));
    }
}
