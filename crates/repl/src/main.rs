//! bliks - run Bliks programs
//!
//! Usage:
//!   bliks                        # interactive prompt
//!   bliks program.bliks          # run a file
//!   bliks program.bliks a b c    # run with the buffer pre-filled
//!
//! With a file, the program runs to completion: outputs print one per
//! line, and when the machine waits for input a line is read from stdin.
//! Without a file, each prompt line compiles and runs as an independent
//! session. Exit status is 0 on a normal halt and 1 on any compile or
//! runtime error.
//!
//! Set BLIKS_LOG (tracing env-filter syntax) to see compile and step
//! logging on stderr.

mod session;

use clap::Parser;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bliks")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run Bliks programs from a file or an interactive prompt", long_about = None)]
struct Args {
    /// Source file to run; omit for an interactive prompt
    file: Option<PathBuf>,

    /// Values pre-filled into the machine's input buffer, in order
    args: Vec<String>,

    /// Print the compiled program as JSON instead of running it
    #[arg(long)]
    dump_program: bool,

    /// Highest register index programs may write (unlimited by default)
    #[arg(long, value_name = "N")]
    registers: Option<u64>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("BLIKS_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let library = Arc::new(bliksc::Library::standard());
    let code = match &args.file {
        Some(path) => {
            session::run_file(path, &args.args, library, args.registers, args.dump_program)
        }
        None => session::run_prompt(&args.args, library, args.registers, args.dump_program),
    };
    process::exit(code);
}
