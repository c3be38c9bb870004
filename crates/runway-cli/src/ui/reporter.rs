//! The output seam between commands and the terminal.

/// Sink for operator-facing messages.
///
/// One method per message class; implementations decide styling and
/// verbosity.
pub trait Reporter: Send + Sync {
    /// A pipeline step starting ("Tagging v1.2.0").
    fn step(&self, msg: &str);

    /// Informational message.
    fn info(&self, msg: &str);

    /// A step completed.
    fn success(&self, msg: &str);

    /// Something worth attention that does not abort the run.
    fn warning(&self, msg: &str);

    /// A failure message (errors are also returned as values; this is
    /// for context the operator should see immediately).
    fn error(&self, msg: &str);

    /// Secondary detail line under a step.
    fn detail(&self, msg: &str);
}

/// Reporter that swallows everything; used in tests.
#[derive(Debug, Default, Clone)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn step(&self, _msg: &str) {}
    fn info(&self, _msg: &str) {}
    fn success(&self, _msg: &str) {}
    fn warning(&self, _msg: &str) {}
    fn error(&self, _msg: &str) {}
    fn detail(&self, _msg: &str) {}
}
