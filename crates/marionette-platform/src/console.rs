//! Console line I/O helpers.

use std::io::{BufRead, Write};

/// Print a line to stdout, or to stderr when `error` is set. Write errors
/// are swallowed; console output is best-effort.
pub fn print_line(text: &str, error: bool) {
    if error {
        let _ = write_line(&mut std::io::stderr().lock(), text);
    } else {
        let _ = write_line(&mut std::io::stdout().lock(), text);
    }
}

/// Print `message` as an error line and terminate the process.
pub fn error_exit(message: &str, exit_code: i32) -> ! {
    if !message.is_empty() {
        print_line(message, true);
    }
    std::process::exit(exit_code)
}

/// Read one line from stdin. Returns `None` on end of input or read error.
/// Blocks until a full line is available; the trailing newline is stripped.
pub fn read_console_line() -> Option<String> {
    let mut line = String::new();
    let read = std::io::stdin().lock().read_line(&mut line).ok()?;
    if read == 0 {
        return None;
    }
    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }
    Some(line)
}

fn write_line<W: Write>(writer: &mut W, text: &str) -> std::io::Result<()> {
    writeln!(writer, "{text}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
