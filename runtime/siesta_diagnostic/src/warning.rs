//! Script warnings and their watchers.

use std::fmt;

/// A non-fatal fault report.
///
/// Carries the owning script's name, the message, the source line the
/// faulting step was tagged with, and whether this is trace narration
/// (call-by-call debug output) rather than a real fault.
#[derive(Clone, Debug)]
pub struct ScriptWarning {
    script: String,
    message: String,
    line: u32,
    trace: bool,
}

impl ScriptWarning {
    /// A fault warning.
    pub fn new(script: impl Into<String>, message: impl Into<String>, line: u32) -> ScriptWarning {
        ScriptWarning {
            script: script.into(),
            message: message.into(),
            line,
            trace: false,
        }
    }

    /// A trace-narration warning.
    pub fn trace(
        script: impl Into<String>,
        message: impl Into<String>,
        line: u32,
    ) -> ScriptWarning {
        ScriptWarning {
            trace: true,
            ..ScriptWarning::new(script, message, line)
        }
    }

    /// Name of the script the warning came from.
    pub fn script(&self) -> &str {
        &self.script
    }

    /// The warning message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Source line of the faulting step.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Whether this is trace narration rather than a fault.
    pub fn is_trace(&self) -> bool {
        self.trace
    }
}

impl fmt::Display for ScriptWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.trace { "Trace" } else { "Warning" };
        write!(
            f,
            "{kind}: {} at {} line {}",
            self.message, self.script, self.line
        )
    }
}

/// Observer for script warnings.
///
/// Watchers are registered on a script instance; every warning the engine
/// raises while that instance's code runs is delivered here.
pub trait WarningWatcher: Send + Sync {
    /// Called once per warning, on the thread that raised it.
    fn script_warning(&self, warning: &ScriptWarning);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn display_names_script_and_line() {
        let w = ScriptWarning::new("boot.ss", "undefined function &frob", 12);
        assert_eq!(w.to_string(), "Warning: undefined function &frob at boot.ss line 12");
        assert!(!w.is_trace());
    }

    #[test]
    fn trace_warnings_are_flagged() {
        let w = ScriptWarning::trace("boot.ss", "&frob(1, 2)", 3);
        assert!(w.is_trace());
        assert_eq!(w.to_string(), "Trace: &frob(1, 2) at boot.ss line 3");
    }
}
