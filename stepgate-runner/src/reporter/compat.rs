// Copyright (c) The stepgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A narrow terminal-writer surface for other runner extensions.
//!
//! Extensions written against a runner's default reporter expect to be able to write raw text,
//! lines and section separators. [`SessionReporter`] implements [`TerminalWriter`] so that those
//! extensions keep working once it replaces the default reporter.

use super::imp::SessionReporter;
use std::io::{self, Write};

/// The width used for separators and erased lines.
pub const TERMINAL_WIDTH: usize = 80;

/// Write, line and section primitives shared with other runner extensions.
pub trait TerminalWriter {
    /// Writes raw content, without a trailing newline.
    fn write_raw(&mut self, content: &str) -> io::Result<()>;

    /// Ends the current line, unless the cursor is already at the start of one.
    fn ensure_newline(&mut self) -> io::Result<()>;

    /// Writes `msg` followed by a newline.
    fn line(&mut self, msg: &str) -> io::Result<()> {
        self.write_raw(msg)?;
        self.write_raw("\n")
    }

    /// Writes `line` on a line of its own.
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.ensure_newline()?;
        self.line(line)
    }

    /// Writes a separator line made of `sep`, with `title` centered in it if specified.
    fn write_sep(&mut self, sep: char, title: Option<&str>) -> io::Result<()> {
        self.ensure_newline()?;
        self.line(&separator(sep, title, TERMINAL_WIDTH))
    }

    /// Writes a titled section header on a line of its own.
    fn section(&mut self, title: &str, sep: char) -> io::Result<()> {
        self.write_sep(sep, Some(title))
    }

    /// Returns to the start of the current line and overwrites it with `line`.
    ///
    /// If `erase` is true, the rest of the line is blanked out.
    fn rewrite(&mut self, line: &str, erase: bool) -> io::Result<()> {
        let fill = if erase {
            TERMINAL_WIDTH.saturating_sub(line.chars().count() + 1)
        } else {
            0
        };
        self.write_raw(&format!("\r{line}{:fill$}", ""))
    }
}

impl TerminalWriter for SessionReporter<'_> {
    fn write_raw(&mut self, content: &str) -> io::Result<()> {
        self.output.write_all(content.as_bytes())?;
        self.output.flush()
    }

    fn ensure_newline(&mut self) -> io::Result<()> {
        self.ensure_line_start()
    }
}

/// Builds a separator line of at most `width` characters.
///
/// With a title, this looks like `===== title =====`; without one, it's `width` copies of `sep`.
pub fn separator(sep: char, title: Option<&str>, width: usize) -> String {
    match title {
        Some(title) => {
            let title_width = title.chars().count();
            let fill_count = (width.saturating_sub(title_width + 2) / 2).max(1);
            let fill: String = std::iter::repeat_n(sep, fill_count).collect();
            let mut line = format!("{fill} {title} {fill}");
            // Rounding down can leave one column free; fill it with one more separator.
            if line.chars().count() < width && !sep.is_whitespace() {
                line.push(sep);
            }
            line
        }
        None => std::iter::repeat_n(sep, width).collect(),
    }
}
