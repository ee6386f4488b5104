//! Colored console output.

use crate::error::CliError;
use blacklist_engine::{Outcome, ReconcileResult};

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const WHITE: &str = "\x1b[37m";
pub const RESET: &str = "\x1b[0m";

/// Wrap `text` in a color.
pub fn paint(color: &str, text: &str) -> String {
    format!("{}{}{}", color, text, RESET)
}

/// Print a red error line.
pub fn error(text: &str) {
    println!("{}", paint(RED, text));
}

/// Print a green success line.
pub fn success(text: &str) {
    println!("{}", paint(GREEN, text));
}

/// Print a yellow warning line.
pub fn warning(text: &str) {
    println!("{}", paint(YELLOW, text));
}

/// Print a plain status line.
pub fn info(text: &str) {
    println!("{}", paint(WHITE, text));
}

/// Usage text shown on argument errors.
pub fn usage() -> String {
    [
        format!(
            "{WHITE}Usage: {YELLOW}blacklist <textFile> <connectionString> [blacklistName] [addMode]"
        ),
        format!("{WHITE}Text file is expected to have a list of msisdns separated by newline"),
        connection_help(),
        format!(
            "{WHITE}Blacklist name is the name of the blacklist to modify (not case sensitive, default {YELLOW}global{WHITE})"
        ),
        format!("{WHITE}Any fourth argument (or {YELLOW}--add{WHITE}) adds the entries instead of deleting them"),
        examples(),
    ]
    .join("\n")
}

fn connection_help() -> String {
    format!(
        "{WHITE}Connection string is expected in the form of {YELLOW}host:port{WHITE} for the API \
         or {YELLOW}user:password@host:port/database{WHITE} for the database"
    )
}

fn examples() -> String {
    format!(
        "{WHITE}Example: {GREEN}blacklist lista.txt localhost:8877 global{RESET}\n\
         {WHITE}Example: {GREEN}blacklist lista.txt mgw:secret@localhost:5432/mgw global{RESET}"
    )
}

/// Lines reporting a fatal error, with the hints that belong to it.
pub fn report_lines(err: &CliError) -> Vec<String> {
    let mut lines = vec![paint(RED, &err.to_string())];
    match err {
        CliError::Usage(_) => lines.push(usage()),
        CliError::InvalidConnectionString(_) => {
            lines.push(connection_help());
            lines.push(examples());
        }
        _ => {}
    }
    lines
}

/// Report a fatal error.
///
/// Goes to stderr when stdout is reserved for the JSON summary.
pub fn report(err: &CliError, json: bool) {
    for line in report_lines(err) {
        if json {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }
}

/// Print the end-of-run summary.
pub fn summary(result: &ReconcileResult) {
    for item in result.failed_items() {
        if let Outcome::Failed(reason) = &item.outcome {
            warning(&format!("{}: {}", item.msisdn, reason));
        }
    }

    info(&format!(
        "\nProcessed {}/{} entries",
        result.processed(),
        result.total
    ));
    info(&format!(
        "Succeeded: {}, failed: {}, not found: {}, cancelled: {}",
        result.succeeded, result.failed, result.not_found, result.cancelled
    ));

    if result.timed_out {
        error("Timed out before every entry was processed");
    } else {
        success("\nDone");
    }
}

/// Print the run result as pretty JSON.
pub fn json(result: &ReconcileResult) {
    match serde_json::to_string_pretty(result) {
        Ok(text) => println!("{}", text),
        Err(e) => error(&format!("Failed to serialize result: {}", e)),
    }
}
