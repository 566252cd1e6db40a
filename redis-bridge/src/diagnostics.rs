//! Argument capture for tracing
//!
//! Every dispatched operation produces a [`CommandInvocation`]: the command
//! plus its arguments rendered by name. The dispatcher hands it to an
//! [`InvocationSink`] and never looks at it again.

use crate::registry::Command;
use redis_bridge_core::ExecutionMode;
use std::fmt;
use tracing::debug;

/// Ordered, named arguments of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandArguments {
    entries: Vec<(&'static str, String)>,
}

impl CommandArguments {
    /// No arguments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a named argument
    pub fn put(&mut self, name: &'static str, value: impl Into<String>) {
        self.entries.push((name, value.into()));
    }

    /// Rendered value of the first argument with this name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|(_, value)| value.as_str())
    }

    /// Arguments in capture order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(name, value)| (*name, value.as_str()))
    }

    /// Number of captured arguments
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether nothing was captured
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for CommandArguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name} => {value}")?;
        }
        Ok(())
    }
}

/// A command about to be dispatched, captured for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Command being issued
    pub command: Command,
    /// Arguments by name
    pub arguments: CommandArguments,
    /// Session mode at the time of the call
    pub mode: ExecutionMode,
}

impl fmt::Display for CommandInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.command, self.arguments, self.mode)
    }
}

/// Receives every invocation before it is checked or sent
pub trait InvocationSink: Send + Sync {
    /// Record one invocation
    fn record(&self, invocation: &CommandInvocation);
}

/// Default sink: one debug event per invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl InvocationSink for TracingSink {
    fn record(&self, invocation: &CommandInvocation) {
        debug!(target: "redis_bridge::command", "{}", invocation);
    }
}

/// Render bytes for a diagnostic entry
pub(crate) fn render(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
