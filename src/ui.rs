//! Operator-facing output sink.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Receives human-readable progress and error lines.
pub trait Ui: Send + Sync {
    /// Reports progress.
    fn say(&self, message: &str);

    /// Reports a failure the operator should read.
    fn error(&self, message: &str);
}

/// Writes `==> ` prefixed lines, progress to one stream and errors to
/// another. By default those are stdout and stderr.
pub struct ConsoleUi<O = io::Stdout, E = io::Stderr> {
    out: Mutex<O>,
    err: Mutex<E>,
}

impl ConsoleUi {
    /// Creates a sink bound to the process's stdout and stderr.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, E> ConsoleUi<O, E> {
    /// Creates a sink over arbitrary writers.
    #[must_use]
    pub const fn with_writers(out: O, err: E) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    /// Returns the progress and error writers.
    #[must_use]
    pub fn into_writers(self) -> (O, E) {
        (
            self.out.into_inner().unwrap_or_else(PoisonError::into_inner),
            self.err.into_inner().unwrap_or_else(PoisonError::into_inner),
        )
    }
}

fn write_line(target: &Mutex<impl Write>, message: &str) {
    let mut writer = target.lock().unwrap_or_else(PoisonError::into_inner);
    writeln!(writer, "==> {message}").ok();
}

impl<O: Write + Send, E: Write + Send> Ui for ConsoleUi<O, E> {
    fn say(&self, message: &str) {
        write_line(&self.out, message);
    }

    fn error(&self, message: &str) {
        write_line(&self.err, message);
    }
}

impl<O, E> fmt::Debug for ConsoleUi<O, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleUi").finish_non_exhaustive()
    }
}
