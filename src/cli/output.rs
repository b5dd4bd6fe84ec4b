//! Terminal output for routebook-server
//!
//! Status lines carry a short tag (`ok`, `note`, `warn`, `fail`) that is
//! colored on a terminal and bracketed when color is off, so piped output
//! stays greppable.

use owo_colors::OwoColorize;

/// Column width used when a table is printed without explicit widths.
const DEFAULT_COLUMN_WIDTH: usize = 15;

/// Severity of a one-line status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Ok,
    Note,
    Warn,
    Fail,
}

impl Tone {
    fn tag(self) -> &'static str {
        match self {
            Tone::Ok => "ok",
            Tone::Note => "note",
            Tone::Warn => "warn",
            Tone::Fail => "fail",
        }
    }
}

/// Writes CLI messages, with or without ANSI color.
pub struct Output {
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Format a status line without printing it.
    pub fn status_line(&self, tone: Tone, message: &str) -> String {
        let tag = tone.tag();
        if !self.colored {
            return format!("  [{tag}] {message}");
        }
        let tag = match tone {
            Tone::Ok => tag.green().bold().to_string(),
            Tone::Note => tag.blue().to_string(),
            Tone::Warn => tag.yellow().bold().to_string(),
            Tone::Fail => tag.red().bold().to_string(),
        };
        format!("  {tag} {message}")
    }

    /// Print a status line; failures go to stderr.
    pub fn status(&self, tone: Tone, message: &str) {
        let line = self.status_line(tone, message);
        if tone == Tone::Fail {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    }

    pub fn success(&self, message: &str) {
        self.status(Tone::Ok, message);
    }

    pub fn info(&self, message: &str) {
        self.status(Tone::Note, message);
    }

    pub fn warning(&self, message: &str) {
        self.status(Tone::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.status(Tone::Fail, message);
    }

    /// `routebook-server <version>` line printed before interactive commands.
    pub fn banner(&self) {
        let name = "routebook-server";
        let version = env!("CARGO_PKG_VERSION");
        if self.colored {
            println!("{} {}", name.bright_cyan().bold(), version.dimmed());
        } else {
            println!("{name} {version}");
        }
    }

    /// Report a file written to disk.
    pub fn wrote(&self, path: &str) {
        self.success(&format!("wrote {path}"));
    }

    /// Section title, preceded by a blank line.
    pub fn section(&self, title: &str) {
        if self.colored {
            println!("\n{}", title.bold());
        } else {
            println!("\n{title}:");
        }
    }

    pub fn field(&self, key: &str, value: &str) {
        if self.colored {
            println!("  {} {}", format!("{key}:").dimmed(), value);
        } else {
            println!("  {key}: {value}");
        }
    }

    /// Shell command the user can run next, indented under the preceding line.
    pub fn command(&self, cmd: &str) {
        if self.colored {
            println!("      {}", cmd.bright_cyan());
        } else {
            println!("      {cmd}");
        }
    }

    pub fn table_header(&self, columns: &[&str], widths: &[usize]) {
        let header = pad_row(columns, widths);
        let rule_width = header.chars().count();
        if self.colored {
            println!("  {}", header.bold());
            println!("  {}", "─".repeat(rule_width).dimmed());
        } else {
            println!("  {header}");
            println!("  {}", "-".repeat(rule_width));
        }
    }

    pub fn table_row(&self, values: &[&str], widths: &[usize]) {
        println!("  {}", pad_row(values, widths));
    }

    pub fn newline(&self) {
        println!();
    }
}

/// Left-align `values` into columns, one space apart.
///
/// Columns without a width get a fixed default; the last column is not padded.
pub fn pad_row(values: &[&str], widths: &[usize]) -> String {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            if i + 1 == values.len() {
                v.to_string()
            } else {
                let width = widths.get(i).copied().unwrap_or(DEFAULT_COLUMN_WIDTH);
                format!("{:<width$}", v)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Widest cell of each column, header included.
pub fn column_widths(header: &[&str], rows: &[Vec<&str>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }
    widths
}
