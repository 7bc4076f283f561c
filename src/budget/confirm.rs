//! Interactive confirmation channel.

use std::io::{BufRead, Write};

/// A synchronous yes/no prompt shown when projected spend crosses the ceiling.
pub trait Confirm: Send + Sync {
    /// Ask whether to continue at the given projected cost.
    ///
    /// Returns true only on an explicit affirmative reply.
    fn confirm(&self, projected_cost: f64) -> bool;
}

/// Prompts on stdout and reads the reply from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConfirm;

impl StdinConfirm {
    pub fn new() -> Self {
        Self
    }
}

impl Confirm for StdinConfirm {
    fn confirm(&self, projected_cost: f64) -> bool {
        let mut stdout = std::io::stdout();
        let _ = write!(
            stdout,
            "Projected total cost is ${:.2}. Continue? (yes/no): ",
            projected_cost
        );
        let _ = stdout.flush();

        blocking(|| read_reply(&mut std::io::stdin().lock()))
    }
}

/// Run a blocking read, handing the worker thread over to the runtime first
/// when called from inside a multi-threaded tokio runtime.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

fn read_reply(reader: &mut impl BufRead) -> bool {
    let mut reply = String::new();
    match reader.read_line(&mut reply) {
        // EOF means nobody is there to answer.
        Ok(0) => false,
        Ok(_) => is_affirmative(&reply),
        Err(e) => {
            tracing::warn!("Failed to read confirmation reply: {}", e);
            false
        }
    }
}

fn is_affirmative(reply: &str) -> bool {
    reply.trim().eq_ignore_ascii_case("yes")
}

/// Always answers the same way and counts how often it was asked.
#[cfg(test)]
pub(crate) struct FixedConfirm {
    answer: bool,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl FixedConfirm {
    pub(crate) fn new(answer: bool) -> Self {
        Self {
            answer,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl Confirm for FixedConfirm {
    fn confirm(&self, _projected_cost: f64) -> bool {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.answer
    }
}
