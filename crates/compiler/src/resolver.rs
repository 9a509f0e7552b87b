//! Resolver for Bliks
//!
//! Turns parsed instruction lines into a [`CompiledProgram`] against a
//! standard library. Per line, in order: head lookup, arity check,
//! back-retrieval lowering, macro expansion, retrieval/literal type checks,
//! the fixed-parameter check, argument construction, the function's
//! compile-time behavior (if any), and finally emission of a run-time
//! instruction (if any). The first error aborts with its source position.

use bliks_core::{
    Argument, CompiledProgram, Error, ProgramBuilder, Token, TokenPayload, Value, ValueType,
};
use bliks_runtime::{Library, Registers, expand_args};
use std::collections::HashMap;
use tracing::debug;

use crate::parser::Line;

/// Resolve parsed lines into an executable program.
pub fn resolve(lines: Vec<Line>, library: &Library) -> Result<CompiledProgram, Error> {
    let mut builder = ProgramBuilder::new();
    for line in lines {
        resolve_line(line, library, &mut builder)?;
    }
    let program = builder.finish();
    debug!(
        instructions = program.instructions.len(),
        begin = program.begin,
        "resolved program"
    );
    Ok(program)
}

fn resolve_line(mut line: Line, library: &Library, b: &mut ProgramBuilder) -> Result<(), Error> {
    // Head: must be the name of a known function.
    let head = line.remove(0);
    let func = match &head.payload {
        TokenPayload::Name(name) => name.clone(),
        _ => {
            return Err(Error::new(
                format!("expected a function name, got a {}", head.kind_name()),
                head.pos,
            ));
        }
    };
    let desc = library
        .get(&func)
        .ok_or_else(|| Error::new(format!("no such function '{func}'"), head.pos))?;

    // Arity.
    let argc = line.len();
    if !desc.params.accepts(argc) {
        let want = match desc.params.max() {
            Some(max) if max == desc.params.min() => format!("exactly {max}"),
            Some(max) => format!("between {} and {max}", desc.params.min()),
            None => format!("at least {}", desc.params.min()),
        };
        return Err(Error::new(
            format!("function '{func}' expects {want} argument(s), but got {argc}"),
            head.pos,
        ));
    }

    lower_back_retrievals(&mut line)?;

    for (i, tok) in line.iter_mut().enumerate() {
        expand_macros(tok, desc.params.at(i).ty, &b.macros)?;
    }

    // Retrieval indices must be pointers. Nested names were expanded
    // above, so the inner token is a literal by now.
    for tok in &line {
        if let TokenPayload::Retrieval { inner, .. } = &tok.payload
            && let TokenPayload::Literal(index) = &inner.payload
            && index.value_type() != ValueType::Pointer
        {
            return Err(Error::new(
                format!(
                    "a retrieval index must be a pointer, but got '{index}' (a {})",
                    index.value_type()
                ),
                inner.pos,
            ));
        }
    }

    // Literal types against the declared parameters.
    for (i, tok) in line.iter().enumerate() {
        if let TokenPayload::Literal(value) = &tok.payload {
            let expected = desc.params.at(i).ty;
            let actual = value.value_type();
            if !actual.is(expected) {
                return Err(Error::new(
                    format!(
                        "function expects a {expected} for argument {}, \
                         but got '{value}' (a {actual})",
                        i + 1
                    ),
                    tok.pos,
                ));
            }
        }
    }

    // Fixed parameters take literals only.
    for (i, tok) in line.iter().enumerate() {
        if desc.params.at(i).fixed && matches!(tok.payload, TokenPayload::Retrieval { .. }) {
            return Err(Error::new(
                format!("argument {} cannot be a retrieval", i + 1),
                tok.pos,
            ));
        }
    }

    let args = build_arguments(&line, |i| desc.params.at(i).ty);

    // Compile-time behavior, with the index this instruction will occupy.
    // Behaviors see the literal arguments only: any behavior that consumes
    // its arguments declares fixed parameters, and retrievals have no value
    // before the machine runs.
    b.cur_instruction = b.next_index();
    if let Some(compile) = desc.compile {
        let literals: Vec<Argument> = args
            .iter()
            .filter(|arg| matches!(arg, Argument::Value { .. }))
            .cloned()
            .collect();
        let values = expand_args(&literals, &Registers::new())
            .map_err(|message| Error::new(message, head.pos))?;
        compile(b, &values).map_err(|message| Error::new(message, head.pos))?;
    }

    if desc.run.is_some() {
        b.emit(&func, args, head.pos);
    }
    Ok(())
}

/// Rewrite every `<` after the first argument into a retrieval through the
/// first argument, one hop deeper than it.
fn lower_back_retrievals(line: &mut Line) -> Result<(), Error> {
    if let Some(first) = line.first()
        && matches!(first.payload, TokenPayload::Back)
    {
        return Err(Error::new(
            "the first argument cannot be a back retrieval",
            first.pos,
        ));
    }
    if !line
        .iter()
        .skip(1)
        .any(|t| matches!(t.payload, TokenPayload::Back))
    {
        return Ok(());
    }

    let (inner, depth) = match &line[0].payload {
        TokenPayload::Retrieval { depth, inner } => ((**inner).clone(), depth + 1),
        _ => (line[0].clone(), 1),
    };
    for tok in line.iter_mut().skip(1) {
        if matches!(tok.payload, TokenPayload::Back) {
            tok.payload = TokenPayload::Retrieval {
                depth,
                inner: Box::new(inner.clone()),
            };
        }
    }
    Ok(())
}

/// Replace a name token with its macro value. Surface names expand when
/// the parameter does not expect a name; names nested in retrievals always
/// expand.
fn expand_macros(
    tok: &mut Token,
    param_ty: ValueType,
    macros: &HashMap<String, Value>,
) -> Result<(), Error> {
    fn lookup(macros: &HashMap<String, Value>, name: &str, pos: usize) -> Result<Value, Error> {
        macros
            .get(name)
            .cloned()
            .ok_or_else(|| Error::new(format!("macro '{name}' is not defined"), pos))
    }

    match &mut tok.payload {
        TokenPayload::Retrieval { inner, .. } => {
            let replacement = match &inner.payload {
                TokenPayload::Name(name) => Some(lookup(macros, name, inner.pos)?),
                _ => None,
            };
            if let Some(value) = replacement {
                inner.payload = TokenPayload::Literal(value);
            }
        }
        TokenPayload::Name(name) if param_ty != ValueType::Name => {
            let value = lookup(macros, name, tok.pos)?;
            tok.payload = TokenPayload::Literal(value);
        }
        _ => {}
    }
    Ok(())
}

fn build_arguments(line: &Line, param_ty: impl Fn(usize) -> ValueType) -> Vec<Argument> {
    line.iter()
        .enumerate()
        .map(|(i, tok)| match &tok.payload {
            TokenPayload::Literal(value) => Argument::Value {
                expected: param_ty(i),
                value: value.clone(),
                pos: tok.pos,
            },
            TokenPayload::Name(name) => Argument::Value {
                expected: param_ty(i),
                value: Value::from(name.as_str()),
                pos: tok.pos,
            },
            TokenPayload::Retrieval { depth, inner } => {
                let index = match &inner.payload {
                    TokenPayload::Literal(value) => value.clone(),
                    other => unreachable!("retrieval index not a literal: {other:?}"),
                };
                Argument::Retrieval {
                    expected: param_ty(i),
                    index,
                    depth: *depth,
                    pos: tok.pos,
                }
            }
            TokenPayload::Back => unreachable!("back retrievals are lowered before this point"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn lib() -> Library {
        Library::standard()
    }

    fn compile(source: &str) -> Result<CompiledProgram, Error> {
        resolve(parse(source).unwrap(), &lib())
    }

    #[test]
    fn test_empty_source_gives_empty_program() {
        let program = compile("").unwrap();
        assert!(program.instructions.is_empty());
        assert_eq!(program.begin, 1);
    }

    #[test]
    fn test_head_must_be_a_known_function_name() {
        let err = compile("3 1 2").unwrap_err();
        assert_eq!(err.message, "expected a function name, got a literal");
        let err = compile("@1 2").unwrap_err();
        assert_eq!(err.message, "expected a function name, got a retrieval");

        let err = compile("frobnicate 1").unwrap_err();
        assert_eq!(err.message, "no such function 'frobnicate'");
        assert_eq!(err.pos, 1);
    }

    #[test]
    fn test_arity_errors() {
        let err = compile("add 1 2").unwrap_err();
        assert!(err.message.contains("expects exactly 3"), "{}", err.message);
        let err = compile("add 1 2 3 4").unwrap_err();
        assert!(err.message.contains("but got 4"), "{}", err.message);
        let err = compile("max 1").unwrap_err();
        assert!(err.message.contains("at least 2"), "{}", err.message);
    }

    #[test]
    fn test_compile_only_lines_emit_nothing() {
        let program = compile("let a 3; > nice; set a 5").unwrap();
        assert_eq!(program.instructions.len(), 1);
        assert_eq!(program.instructions[0].func, "set");
        assert_eq!(program.labels.get("nice"), Some(&vec![1]));
    }

    #[test]
    fn test_begin_marks_the_next_instruction() {
        let program = compile("set 1 0; begin; set 2 0").unwrap();
        assert_eq!(program.begin, 2);

        let err = compile("begin; begin").unwrap_err();
        assert_eq!(err.message, "beginning has already been defined");
    }

    #[test]
    fn test_macro_expansion() {
        let program = compile("let a 3; set a 5").unwrap();
        match &program.instructions[0].args[0] {
            Argument::Value { value, .. } => assert_eq!(value, &Value::Num(3.0)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_macros_expand_inside_retrievals_and_name_params_stay_raw() {
        // 'a' inside the retrieval expands even though writing a name
        // there; the label argument of '>' stays a name.
        let program = compile("let a 3; > a; write @a").unwrap();
        assert_eq!(program.labels.get("a"), Some(&vec![1]));
        match &program.instructions[0].args[0] {
            Argument::Retrieval { index, depth, .. } => {
                assert_eq!(index, &Value::Num(3.0));
                assert_eq!(*depth, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_undefined_macro() {
        let err = compile("> hi; tonum 1 hi").unwrap_err();
        assert_eq!(err.message, "macro 'hi' is not defined");
        assert_eq!(err.pos, 15);
    }

    #[test]
    fn test_seeded_macros_expand() {
        let program = compile("set _2 true; set 1 false").unwrap();
        match &program.instructions[0].args[1] {
            Argument::Value { value, .. } => assert_eq!(value, &Value::from("true")),
            other => panic!("unexpected {other:?}"),
        }
        match &program.instructions[1].args[1] {
            Argument::Value { value, .. } => assert_eq!(value, &Value::from("")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_back_retrieval_lowering() {
        let program = compile("add @@1 < <").unwrap();
        let args = &program.instructions[0].args;
        let depths: Vec<u32> = args
            .iter()
            .map(|a| match a {
                Argument::Retrieval { depth, index, .. } => {
                    assert_eq!(index, &Value::Num(1.0));
                    *depth
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(depths, vec![2, 3, 3]);
    }

    #[test]
    fn test_back_retrieval_through_a_plain_first_argument() {
        let program = compile("add 1 < <").unwrap();
        let args = &program.instructions[0].args;
        match &args[1] {
            Argument::Retrieval { depth, index, .. } => {
                assert_eq!(*depth, 1);
                assert_eq!(index, &Value::Num(1.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_back_retrieval_cannot_lead() {
        let err = compile("add < 2 3").unwrap_err();
        assert_eq!(err.message, "the first argument cannot be a back retrieval");
        assert_eq!(err.pos, 5);
    }

    #[test]
    fn test_literal_type_mismatch() {
        let err = compile("add 3.2 3 3").unwrap_err();
        assert_eq!(
            err.message,
            "function expects a pointer for argument 1, but got '3.2' (a number)"
        );
        assert_eq!(err.pos, 5);

        let err = compile("add 1 x 3").unwrap_err();
        assert!(err.message.contains("macro 'x' is not defined"));

        let err = compile("add 1 \"x\" 3").unwrap_err();
        assert_eq!(
            err.message,
            "function expects a number for argument 2, but got 'x' (a string)"
        );
    }

    #[test]
    fn test_retrieval_index_must_be_a_pointer() {
        let err = compile("write @0").unwrap_err();
        assert_eq!(
            err.message,
            "a retrieval index must be a pointer, but got '0' (a number)"
        );
        let err = compile("write @\"a\"").unwrap_err();
        assert!(err.message.contains("(a string)"));
    }

    #[test]
    fn test_fixed_parameters_reject_retrievals() {
        let err = compile("goto @1").unwrap_err();
        assert_eq!(err.message, "argument 1 cannot be a retrieval");
        let err = compile("let @1 2").unwrap_err();
        assert_eq!(err.message, "argument 1 cannot be a retrieval");
    }

    #[test]
    fn test_name_where_pointer_expected_expands_first() {
        // Without a macro definition the name itself is the error.
        let err = compile("set q 1").unwrap_err();
        assert_eq!(err.message, "macro 'q' is not defined");
    }

    #[test]
    fn test_if_else_scheme() {
        let program = compile("if \"x\"; set 1 1; else; set 2 2").unwrap();
        assert_eq!(program.jump_dests.get(&1), Some(&"_ELSE1".to_string()));
        // The marker sits at the index of the instruction after the block.
        assert_eq!(program.labels.get("_ELSE1"), Some(&vec![3]));

        let err = compile("else").unwrap_err();
        assert_eq!(err.message, "'else' without a matching 'if'");
    }

    #[test]
    fn test_loop_scheme() {
        let program = compile("while \"x\"; set 1 1; end; set 2 2").unwrap();
        assert_eq!(program.labels.get("_LOOP1"), Some(&vec![1]));
        assert_eq!(program.jump_dests.get(&1), Some(&"_END1".to_string()));
        assert_eq!(program.jump_dests.get(&3), Some(&"_LOOP1".to_string()));
        assert_eq!(program.labels.get("_END1"), Some(&vec![4]));

        let err = compile("end").unwrap_err();
        assert_eq!(err.message, "'end' without a matching loop");
        let err = compile("break").unwrap_err();
        assert_eq!(err.message, "'break' outside of a loop");
    }

    #[test]
    fn test_func_requires_fresh_label() {
        let err = compile("func f; return; func f; return").unwrap_err();
        assert!(err.message.contains("already exists"));
        assert_eq!(err.pos, 17);
    }

    #[test]
    fn test_instruction_numbers_and_positions() {
        let program = compile("set 1 0\nset 2 0").unwrap();
        assert_eq!(program.instructions[0].num, 1);
        assert_eq!(program.instructions[1].num, 2);
        assert_eq!(program.instructions[0].pos, 1);
        assert_eq!(program.instructions[1].pos, 9);
    }
}
