//! Structured fatal parse/compile errors.

use std::fmt;

/// One structured syntax error.
///
/// Carries enough to render the familiar caret diagnostic: a description,
/// the offending line number, the source snippet, and a marker column when
/// the parser could pin one down.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    description: String,
    line: u32,
    snippet: String,
    marker: Option<usize>,
}

impl SyntaxError {
    /// A syntax error without a marker column.
    pub fn new(
        description: impl Into<String>,
        line: u32,
        snippet: impl Into<String>,
    ) -> SyntaxError {
        SyntaxError {
            description: description.into(),
            line,
            snippet: snippet.into(),
            marker: None,
        }
    }

    /// Attach a zero-based marker column into the snippet.
    #[must_use]
    pub fn with_marker(mut self, column: usize) -> SyntaxError {
        self.marker = Some(column);
        self
    }

    /// What went wrong.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Offending source line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The offending source text.
    pub fn snippet(&self) -> &str {
        &self.snippet
    }

    /// Marker column, when known.
    pub fn marker(&self) -> Option<usize> {
        self.marker
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} at line {}", self.description, self.line)?;
        writeln!(f, "    {}", self.snippet)?;
        if let Some(column) = self.marker {
            writeln!(f, "    {}^", " ".repeat(column))?;
        }
        Ok(())
    }
}

/// Fatal compile failure: the full structured error list.
///
/// Raised by the parse phase and by compiling dynamically-evaluated code at
/// runtime. A script that fails to compile never starts running.
#[derive(Clone, Debug, thiserror::Error)]
#[error("script failed to compile with {} error(s)", errors.len())]
pub struct CompileError {
    errors: Vec<SyntaxError>,
}

impl CompileError {
    /// Bundle the collected syntax errors.
    pub fn new(errors: Vec<SyntaxError>) -> CompileError {
        CompileError { errors }
    }

    /// The structured error list.
    pub fn errors(&self) -> &[SyntaxError] {
        &self.errors
    }

    /// Render every error in caret form.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for error in &self.errors {
            out.push_str(&error.to_string());
        }
        out
    }
}
