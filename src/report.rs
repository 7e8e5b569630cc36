//! Text report of unused and unchecked events, coloured on a terminal.

use std::fmt::Write;
use std::io::IsTerminal;

use colored::Colorize;

use crate::scan::UncheckedEvent;

/// First line of the unused-events block.
pub const UNUSED_HEADER: &str = "Unused events:";

/// First line of the unchecked-events block.
pub const UNCHECKED_HEADER: &str = "Events that could not be checked:";

/// Header, newline, then the names joined by newlines.
///
/// There is no newline after the last name; an empty list leaves an empty
/// line under the header.
pub fn format_events(events: &[String]) -> String {
    format!("{UNUSED_HEADER}\n{}", events.join("\n"))
}

/// Write the unused-events block to stdout, with a blue bold header on a
/// terminal.
pub fn print_events(events: &[String]) {
    if std::io::stdout().is_terminal() {
        println!("{}\n{}", header(true), events.join("\n"));
    } else {
        println!("{}", format_events(events));
    }
}

fn header(color: bool) -> String {
    if color {
        UNUSED_HEADER.blue().bold().to_string()
    } else {
        UNUSED_HEADER.to_string()
    }
}

/// Final progress line, green bold when stderr is a terminal.
pub fn print_done() {
    if std::io::stderr().is_terminal() {
        eprintln!("{}", DONE.green().bold());
    } else {
        eprintln!("{DONE}");
    }
}

const DONE: &str = "Done.";

/// Header and one `name: reason` line per failed search.
pub fn format_unchecked(events: &[UncheckedEvent]) -> String {
    let mut out = String::from(UNCHECKED_HEADER);
    for event in events {
        write!(out, "\n{}: {}", event.name, event.reason).unwrap();
    }
    out
}

/// Write the unchecked block to stderr. Prints nothing for an empty list.
pub fn print_unchecked(events: &[UncheckedEvent]) {
    if !events.is_empty() {
        eprintln!("{}", format_unchecked(events));
    }
}
