//! REPL and file-runner binary for the tacit VM.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tacit_vm::{run_line, Vm};

#[derive(Parser)]
#[command(name = "tacit", author, version, about = "A NaN-boxed concatenative VM", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse and execute every non-empty, non-comment line of a source file.
    Run {
        /// Path to a tacit source file.
        path: String,
    },
    /// Start an interactive read-eval-print loop.
    Repl,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Repl) {
        Command::Run { path } => run_file(&path),
        Command::Repl => {
            repl();
            ExitCode::SUCCESS
        }
    }
}

/// File mode: run every line, stopping at the first parse or execution
/// error and exiting 1.
fn run_file(path: &str) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("tacit: could not read {path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut vm = Vm::new();
    for (lineno, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Err(e) = run_line(&mut vm, trimmed) {
            eprintln!("tacit: {path}:{}: {e}", lineno + 1);
            eprintln!("stack at error: {}", vm.render_stack());
            return ExitCode::FAILURE;
        }
        flush_output(&mut vm);
    }
    ExitCode::SUCCESS
}

/// Interactive mode: read one line at a time, executing against a VM whose
/// stacks, digest, and symbol table persist across lines. `exit`/`quit`
/// leave the loop; any other error is reported and execution continues
/// with the next line, surfacing the stack state at the point of failure.
fn repl() {
    let mut vm = Vm::new();
    let stdin = io::stdin();
    print!("tacit> ");
    let _ = io::stdout().flush();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            match run_line(&mut vm, trimmed) {
                Ok(()) => flush_output(&mut vm),
                Err(e) => {
                    println!("error: {e}");
                    println!("stack at error: {}", vm.render_stack());
                }
            }
        }
        print!("tacit> ");
        let _ = io::stdout().flush();
    }
}

/// Drain and print any lines `print`/`.` appended to `vm.output` since the
/// last flush.
fn flush_output(vm: &mut Vm) {
    for line in vm.output.drain(..) {
        println!("{line}");
    }
}
