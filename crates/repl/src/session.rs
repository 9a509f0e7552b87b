//! Session drivers: file runner and interactive prompt
//!
//! Both paths share `run_source`: compile, pre-fill the buffer, then drive
//! the machine to completion, printing each output on its own line and
//! feeding input when the machine suspends. Errors render through the
//! compiler's reporter against the source that produced them.

use bliksc::{Error, Library, Machine, Step, format_error, machine_from_source};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub fn run_file(
    path: &Path,
    fill: &[String],
    library: Arc<Library>,
    max_registers: Option<u64>,
    dump: bool,
) -> i32 {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("bliks: cannot read {}: {e}", path.display());
            return 1;
        }
    };
    let name = path.display().to_string();
    run_source(&source, &name, fill, library, max_registers, dump, stdin_line)
}

pub fn run_prompt(
    fill: &[String],
    library: Arc<Library>,
    max_registers: Option<u64>,
    dump: bool,
) -> i32 {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("bliks: cannot start the prompt: {e}");
            return 1;
        }
    };
    let history = home::home_dir().map(|dir| dir.join(".bliks_history"));
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    loop {
        match rl.readline("bliks> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());
                // Every line is an independent session; nothing carries
                // over but the editor history.
                run_source(
                    &line,
                    "repl",
                    fill,
                    Arc::clone(&library),
                    max_registers,
                    dump,
                    || rl.readline("input> ").ok(),
                );
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("bliks: {e}");
                return 1;
            }
        }
    }
    if let Some(path) = &history {
        let _ = rl.save_history(path);
    }
    0
}

fn run_source(
    source: &str,
    name: &str,
    fill: &[String],
    library: Arc<Library>,
    max_registers: Option<u64>,
    dump: bool,
    input: impl FnMut() -> Option<String>,
) -> i32 {
    if dump {
        return match bliksc::compile(source, &library) {
            Ok(program) => match serde_json::to_string_pretty(&program) {
                Ok(json) => {
                    println!("{json}");
                    0
                }
                Err(e) => {
                    eprintln!("bliks: {e}");
                    1
                }
            },
            Err(e) => {
                eprintln!("{}", format_error(&e, source, name));
                1
            }
        };
    }

    let mut machine = match machine_from_source(source, library, max_registers) {
        Ok(machine) => machine,
        Err(e) => {
            eprintln!("{}", format_error(&e, source, name));
            return 1;
        }
    };
    for value in fill {
        machine.push(value.clone());
    }
    debug!(name, prefilled = fill.len(), "running");

    match drive(&mut machine, input) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", format_error(&e, source, name));
            1
        }
    }
}

/// Step the machine until it halts or fails, printing outputs and feeding
/// input on demand.
fn drive(machine: &mut Machine, mut input: impl FnMut() -> Option<String>) -> Result<(), Error> {
    loop {
        match machine.step_until_output()? {
            Step::Halted => return Ok(()),
            Step::Output(value) => println!("{value}"),
            Step::AwaitingInput => match input() {
                Some(line) => machine.push(line),
                None => {
                    return Err(Error::new(
                        "input ended while the program was waiting for it",
                        1,
                    ));
                }
            },
            Step::Ran => unreachable!("step_until_output never reports a bare step"),
        }
    }
}

/// One line from stdin, without its terminator. `None` at end of input.
fn stdin_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            if line.ends_with('\n') {
                line.pop();
                if line.ends_with('\r') {
                    line.pop();
                }
            }
            Some(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn library() -> Arc<Library> {
        Arc::new(Library::standard())
    }

    fn script(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    #[test]
    fn test_missing_file_fails() {
        let code = run_file(Path::new("/no/such/file.bliks"), &[], library(), None, false);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_file_runs_with_prefilled_buffer() {
        let file = script("read 1; writef \"hi %s\" @1");
        let code = run_file(file.path(), &["world".to_string()], library(), None, false);
        assert_eq!(code, 0);
    }

    #[test]
    fn test_compile_error_fails() {
        let file = script("add 3.2 3 3");
        let code = run_file(file.path(), &[], library(), None, false);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_runtime_error_fails() {
        let file = script("throw \"boom\"");
        let code = run_file(file.path(), &[], library(), None, false);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_dump_program() {
        let file = script("set 1 2");
        let code = run_file(file.path(), &[], library(), None, true);
        assert_eq!(code, 0);

        let file = script("no_such_fn");
        let code = run_file(file.path(), &[], library(), None, true);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_register_cap_applies() {
        let file = script("set 9 1");
        let code = run_file(file.path(), &[], library(), Some(4), false);
        assert_eq!(code, 1);
    }

    #[test]
    fn test_drive_reports_exhausted_input() {
        let mut machine = machine_from_source("poll 1", library(), None).unwrap();
        let err = drive(&mut machine, || None).unwrap_err();
        assert!(err.message.contains("input ended"), "{err}");
    }
}
