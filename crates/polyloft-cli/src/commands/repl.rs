//! `polyloft repl`: interactive session
//!
//! One runtime lives for the whole session, so declarations and bindings
//! persist across inputs. Input that ends inside an open block keeps
//! reading continuation lines until the block is closed.

use polyloft_engine::parser::ParseErrorKind;
use polyloft_engine::vm::context::parse_program;
use polyloft_engine::{EvalError, EvalOptions, LexError, Runtime};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

const PROMPT: &str = "polyloft> ";
const CONTINUATION_PROMPT: &str = "     ... ";

pub fn execute(options: EvalOptions) -> anyhow::Result<()> {
    let runtime = Runtime::new(options);
    let mut editor = DefaultEditor::new()?;

    println!("Polyloft v{} REPL", env!("CARGO_PKG_VERSION"));
    println!("Type help for help, exit to quit\n");

    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() {
            PROMPT
        } else {
            CONTINUATION_PROMPT
        };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    if !buffer.is_empty() {
                        buffer.push('\n');
                    }
                    continue;
                }

                if buffer.is_empty() && is_command(trimmed) {
                    let _ = editor.add_history_entry(&line);
                    if handle_command(trimmed, &runtime) {
                        break;
                    }
                    continue;
                }

                if !buffer.is_empty() {
                    buffer.push('\n');
                }
                buffer.push_str(&line);

                if is_incomplete(&buffer) {
                    continue;
                }

                let code = std::mem::take(&mut buffer);
                let _ = editor.add_history_entry(&code);
                match runtime.eval_source(&code) {
                    Ok(value) if !value.is_nil() => print_value(&value.to_string()),
                    Ok(_) => {}
                    Err(e) => print_error(&e.to_string()),
                }
            }
            Err(ReadlineError::Interrupted) => {
                if !buffer.is_empty() {
                    buffer.clear();
                    println!();
                } else {
                    println!("\n(To exit, press Ctrl+D or type exit)");
                }
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                print_error(&e.to_string());
                break;
            }
        }
    }

    Ok(())
}

fn is_command(input: &str) -> bool {
    matches!(
        input.split_whitespace().next(),
        Some("exit" | "quit" | "help" | "clear" | "load")
    ) && !input.contains('(')
}

/// Returns true if the REPL should exit.
fn handle_command(cmd: &str, runtime: &Runtime) -> bool {
    match cmd {
        "exit" | "quit" => return true,
        "help" => {
            println!("Commands:");
            println!("  help            Show this help");
            println!("  clear           Reset session (discard all state)");
            println!("  load <file>     Load and execute a Polyloft file");
            println!("  exit            Exit the REPL (also Ctrl-D)");
        }
        "clear" => {
            runtime.reset();
            println!("Session cleared.");
        }
        _ => match cmd.strip_prefix("load ").map(str::trim) {
            Some("") => print_error("Usage: load <file.pf>"),
            Some(path) => match runtime.eval_file(path) {
                Ok(_) => println!("Loaded: {}", path),
                Err(e) => print_error(&e.to_string()),
            },
            None => {
                print_error(&format!("Unknown command: {}", cmd));
                eprintln!("Type help for available commands.");
            }
        },
    }
    false
}

/// Input whose first error is running out of source: an unclosed block,
/// a dangling operator or an unterminated string.
fn is_incomplete(code: &str) -> bool {
    match parse_program(code) {
        Ok(_) => false,
        Err(EvalError::Parse(errors)) => errors.first().is_some_and(|e| {
            matches!(
                e.kind,
                ParseErrorKind::UnexpectedEof { .. } | ParseErrorKind::UnclosedBlock { .. }
            )
        }),
        Err(EvalError::Lex(errors)) => errors.first().is_some_and(|e| {
            matches!(
                e,
                LexError::UnterminatedString { .. } | LexError::UnterminatedInterpolation { .. }
            )
        }),
        Err(_) => false,
    }
}

fn print_error(msg: &str) {
    eprintln!("\x1b[31m{}\x1b[0m", msg);
}

fn print_value(formatted: &str) {
    println!("\x1b[36m{}\x1b[0m", formatted);
}
