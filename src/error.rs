use std::fmt::{self, Display};

use colored::Colorize;

/// A single problem encountered while formatting, tied to a source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub lno: u32,
    pub cno: u32,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lno > 0 {
            write!(
                f,
                "{}: {}:{}: {}",
                self.path.bold(),
                self.lno,
                self.cno,
                self.message
            )
        } else {
            write!(f, "{}: {}", self.path.bold(), self.message)
        }
    }
}

/// Buffered diagnostics, accumulated while formatting and flushed by the
/// caller once a file is done. Non-fatal problems never interrupt a run.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn push(&mut self, path: &str, lno: u32, cno: u32, message: &str) {
        self.entries.push(Diagnostic {
            path: path.to_string(),
            lno,
            cno,
            message: message.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Print all buffered diagnostics to stderr and reset the buffer.
    pub fn flush(&mut self) {
        for entry in self.entries.drain(..) {
            eprintln!("{entry}");
        }
    }

    pub fn append(&mut self, other: &mut Diagnostics) {
        self.entries.append(&mut other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_reset() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.push("foo.c", 1, 2, "unexpected token");
        assert_eq!(diags.len(), 1);
        diags.reset();
        assert!(diags.is_empty());
    }
}
