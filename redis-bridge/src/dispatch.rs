//! Operations, deferred results and batch results
//!
//! An [`Operation`] is everything the dispatcher needs to issue one command:
//! the wire frame, the named arguments for diagnostics and the converter that
//! turns the native reply into the typed result. Direct calls apply the
//! converter at once; pipelined and transactional calls hand back a
//! [`Deferred`] ticket and apply the very same converter when the batch is
//! flushed.

use crate::diagnostics::{render, CommandArguments, CommandInvocation};
use crate::driver::Frame;
use crate::registry::Command;
use bytes::Bytes;
use redis_bridge_core::{ExecutionMode, RedisError, RedisResult, RespValue};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Pure function from a native reply to a typed result
pub type Converter<T> = fn(RespValue) -> RedisResult<T>;

/// Value that can be sent as a command argument
pub trait ToArg {
    /// Wire form of the value
    fn to_arg(&self) -> Bytes;
}

macro_rules! display_args {
    ($($ty:ty),+) => {
        $(
            impl ToArg for $ty {
                fn to_arg(&self) -> Bytes {
                    Bytes::from(self.to_string())
                }
            }
        )+
    };
}

display_args!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl ToArg for bool {
    fn to_arg(&self) -> Bytes {
        Bytes::from_static(if *self { b"1" } else { b"0" })
    }
}

impl ToArg for str {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for String {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_bytes())
    }
}

impl ToArg for [u8] {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Vec<u8> {
    fn to_arg(&self) -> Bytes {
        Bytes::copy_from_slice(self)
    }
}

impl ToArg for Bytes {
    fn to_arg(&self) -> Bytes {
        self.clone()
    }
}

impl<T: ToArg + ?Sized> ToArg for &T {
    fn to_arg(&self) -> Bytes {
        (**self).to_arg()
    }
}

/// One command invocation, ready for dispatch
pub struct Operation<T> {
    frame: Frame,
    arguments: CommandArguments,
    converter: Converter<T>,
}

impl<T> Operation<T> {
    /// Operation without arguments
    #[must_use]
    pub fn new(command: Command, converter: Converter<T>) -> Self {
        Self {
            frame: Frame::new(command),
            arguments: CommandArguments::new(),
            converter,
        }
    }

    /// Append a key, used for routing as well
    #[must_use]
    pub fn key(mut self, name: &'static str, key: impl AsRef<[u8]>) -> Self {
        let key = Bytes::copy_from_slice(key.as_ref());
        self.arguments.put(name, render(&key));
        self.frame = self.frame.key(key);
        self
    }

    /// Append several keys under one diagnostic name
    #[must_use]
    pub fn keys<I, K>(mut self, name: &'static str, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut rendered = Vec::new();
        for key in keys {
            let key = Bytes::copy_from_slice(key.as_ref());
            rendered.push(render(&key));
            self.frame = self.frame.key(key);
        }
        self.arguments.put(name, format!("[{}]", rendered.join(", ")));
        self
    }

    /// Append an argument
    #[must_use]
    pub fn arg(mut self, name: &'static str, value: impl ToArg) -> Self {
        let value = value.to_arg();
        self.arguments.put(name, render(&value));
        self.frame.args.push(value);
        self
    }

    /// Append several arguments under one diagnostic name
    #[must_use]
    pub fn args<I, A>(mut self, name: &'static str, values: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: ToArg,
    {
        let mut rendered = Vec::new();
        for value in values {
            let value = value.to_arg();
            rendered.push(render(&value));
            self.frame.args.push(value);
        }
        self.arguments.put(name, format!("[{}]", rendered.join(", ")));
        self
    }

    /// Append a fixed keyword such as `WITHSCORES`
    #[must_use]
    pub fn token(mut self, token: &'static str) -> Self {
        self.frame.args.push(Bytes::from_static(token.as_bytes()));
        self
    }

    /// Append option tokens, recorded only when present
    #[must_use]
    pub fn options(mut self, name: &'static str, tokens: Vec<String>) -> Self {
        if !tokens.is_empty() {
            self.arguments.put(name, tokens.join(" "));
            self.frame
                .args
                .extend(tokens.into_iter().map(|t| Bytes::from(t.into_bytes())));
        }
        self
    }

    /// Pin the operation to a cluster slot
    #[must_use]
    pub fn slot(mut self, slot: u16) -> Self {
        self.frame.slot = Some(slot);
        self
    }

    /// Command being issued
    #[must_use]
    pub fn command(&self) -> Command {
        self.frame.command
    }

    /// Wire frame
    #[must_use]
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Named arguments
    #[must_use]
    pub fn arguments(&self) -> &CommandArguments {
        &self.arguments
    }

    pub(crate) fn invocation(&self, mode: ExecutionMode) -> CommandInvocation {
        CommandInvocation {
            command: self.frame.command,
            arguments: self.arguments.clone(),
            mode,
        }
    }

    pub(crate) fn into_parts(self) -> (Frame, Converter<T>) {
        (self.frame, self.converter)
    }
}

impl<T> fmt::Debug for Operation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("command", &self.frame.command)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Outcome of a dispatched call
#[must_use]
#[derive(Debug)]
pub enum Reply<T> {
    /// Executed directly; the converted value
    Ready(T),
    /// Appended to the open pipeline or transaction
    Queued(Deferred<T>),
}

impl<T> Reply<T> {
    /// Value of a direct call
    pub fn ready(self) -> Option<T> {
        match self {
            Reply::Ready(value) => Some(value),
            Reply::Queued(_) => None,
        }
    }

    /// Ticket of a queued call
    pub fn queued(self) -> Option<Deferred<T>> {
        match self {
            Reply::Ready(_) => None,
            Reply::Queued(deferred) => Some(deferred),
        }
    }

    /// Value of a direct call, or a protocol error for a queued one
    pub fn into_value(self) -> RedisResult<T> {
        match self {
            Reply::Ready(value) => Ok(value),
            Reply::Queued(deferred) => Err(RedisError::Protocol(format!(
                "{} was queued; take its result from the batch",
                deferred.command
            ))),
        }
    }

    /// Check whether the call was queued
    #[must_use]
    pub fn is_queued(&self) -> bool {
        matches!(self, Reply::Queued(_))
    }
}

/// Ticket for the result of a queued call
///
/// Redeemed exactly once with [`BatchResults::take`].
#[derive(Debug, PartialEq, Eq)]
pub struct Deferred<T> {
    batch: u64,
    index: usize,
    command: Command,
    _result: PhantomData<fn() -> T>,
}

impl<T> Deferred<T> {
    /// Position in the batch
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Command that produced the ticket
    #[must_use]
    pub fn command(&self) -> Command {
        self.command
    }
}

type Materialized = RedisResult<Box<dyn Any + Send>>;
type Materializer = Box<dyn FnOnce(RespValue) -> Materialized + Send>;

/// Commands collected while a pipeline or transaction is open
pub(crate) struct Batch {
    id: u64,
    mode: ExecutionMode,
    frames: Vec<Frame>,
    entries: Vec<(Command, Materializer)>,
}

impl Batch {
    pub(crate) fn new(id: u64, mode: ExecutionMode) -> Self {
        Self {
            id,
            mode,
            frames: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub(crate) fn len(&self) -> usize {
        self.frames.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Queue a frame with the converter for its reply
    pub(crate) fn push<T: Send + 'static>(
        &mut self,
        frame: Frame,
        converter: Converter<T>,
    ) -> Deferred<T> {
        let index = self.frames.len();
        let command = frame.command;
        self.entries.push((
            command,
            Box::new(move |reply| match reply {
                RespValue::Error(msg) => Err(RedisError::from_server_reply(msg)),
                value => converter(value).map(|v| Box::new(v) as Box<dyn Any + Send>),
            }),
        ));
        self.frames.push(frame);

        Deferred {
            batch: self.id,
            index,
            command,
            _result: PhantomData,
        }
    }

    /// Frames to send, leaving the converters in place
    pub(crate) fn take_frames(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.frames)
    }

    /// Convert the replies, one per queued command, in submission order
    pub(crate) fn materialize(self, replies: Vec<RespValue>) -> RedisResult<BatchResults> {
        if replies.len() != self.entries.len() {
            return Err(RedisError::Protocol(format!(
                "Expected {} replies for the batch, got {}",
                self.entries.len(),
                replies.len()
            )));
        }

        let entries = self
            .entries
            .into_iter()
            .zip(replies)
            .map(|((command, materialize), reply)| Some((command, materialize(reply))))
            .collect();

        Ok(BatchResults {
            batch: self.id,
            entries,
        })
    }
}

impl fmt::Debug for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Batch")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("frames", &self.frames.len())
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// Converted results of a flushed pipeline or committed transaction,
/// in submission order
pub struct BatchResults {
    batch: u64,
    entries: Vec<Option<(Command, Materialized)>>,
}

impl BatchResults {
    /// Redeem a ticket
    ///
    /// Yields the converted value, or the error the server answered for
    /// that entry.
    ///
    /// # Errors
    ///
    /// [`RedisError::Protocol`] when the ticket belongs to another batch or
    /// its result was already taken.
    pub fn take<T: 'static>(&mut self, deferred: Deferred<T>) -> RedisResult<T> {
        if deferred.batch != self.batch {
            return Err(RedisError::Protocol(format!(
                "{} ticket belongs to another batch",
                deferred.command
            )));
        }

        let (_, result) = self
            .entries
            .get_mut(deferred.index)
            .and_then(Option::take)
            .ok_or_else(|| {
                RedisError::Protocol(format!(
                    "Result {} ({}) is not available",
                    deferred.index, deferred.command
                ))
            })?;

        result?.downcast::<T>().map(|value| *value).map_err(|_| {
            RedisError::Protocol(format!(
                "Result {} ({}) has a different type",
                deferred.index, deferred.command
            ))
        })
    }

    /// Number of entries, taken or not
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the batch was empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Commands of the entries not yet taken, in submission order
    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.entries
            .iter()
            .filter_map(|entry| entry.as_ref().map(|(command, _)| *command))
    }
}

impl fmt::Debug for BatchResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchResults")
            .field("batch", &self.batch)
            .field("pending", &self.commands().collect::<Vec<_>>())
            .finish()
    }
}

/// Outcome of `EXEC`
#[derive(Debug)]
pub enum TransactionResult {
    /// Every queued command ran
    Committed(BatchResults),
    /// A watched key changed; nothing ran
    Aborted,
}

impl TransactionResult {
    /// Check whether the transaction was aborted
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        matches!(self, TransactionResult::Aborted)
    }

    /// Results of a committed transaction
    pub fn committed(self) -> Option<BatchResults> {
        match self {
            TransactionResult::Committed(results) => Some(results),
            TransactionResult::Aborted => None,
        }
    }
}
