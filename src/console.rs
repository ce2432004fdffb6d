//! The line protocol consumed by editor plugins.
//!
//! stdout carries `PROGRESS <pct>`, `OK: ...` and `DONE <path>` lines;
//! stderr carries `NOT_AAC: ...`, forwarded engine output and `error:` lines.

use std::io::{self, Write};
use std::path::Path;

use aac2alac_av::{Rejection, Summary};

/// Writer pair for protocol and diagnostic lines.
pub struct Console<O, E> {
    out: O,
    err: E,
}

impl Console<io::Stdout, io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> Console<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn progress(&mut self, percent: f64) {
        self.line_out(format_args!("PROGRESS {percent:.1}"));
    }

    pub fn ok(&mut self, path: &Path, summary: &Summary) {
        self.line_out(format_args!("OK: {} ({summary})", path.display()));
    }

    pub fn done(&mut self, path: &Path) {
        self.line_out(format_args!("DONE {}", path.display()));
    }

    pub fn not_aac(&mut self, rejection: &Rejection) {
        self.line_err(format_args!("NOT_AAC: {rejection}"));
    }

    /// Forward captured engine output verbatim.
    pub fn engine_output(&mut self, output: &str) {
        let output = output.trim_end();
        if !output.is_empty() {
            self.line_err(format_args!("{output}"));
        }
    }

    pub fn error(&mut self, message: impl std::fmt::Display) {
        self.line_err(format_args!("error: {message}"));
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    // Each line is flushed so a reading plugin sees it immediately.
    fn line_out(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{args}").and_then(|_| self.out.flush()) {
            tracing::warn!("failed to write to stdout: {e}");
        }
    }

    fn line_err(&mut self, args: std::fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.err, "{args}").and_then(|_| self.err.flush()) {
            tracing::warn!("failed to write to stderr: {e}");
        }
    }
}
