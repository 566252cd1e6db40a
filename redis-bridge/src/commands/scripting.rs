//! Lua scripting commands
//!
//! The script's `KEYS` are the routing keys, so on a cluster or sharded
//! deployment all of them must live on one node.

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Converter, Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, Status};

impl Client {
    /// Run a script, converting its result with `converter`
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use redis_bridge::{convert, Client, ConnectionConfig};
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// # let mut client = Client::connect(ConnectionConfig::new("localhost:6379")).await?;
    /// let len = client
    ///     .eval("return redis.call('STRLEN', KEYS[1])", &["greeting"], &[] as &[&str], convert::integer)
    ///     .await?
    ///     .into_value()?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn eval<T, K, A>(
        &mut self,
        script: &str,
        keys: &[K],
        args: &[A],
        converter: Converter<T>,
    ) -> RedisResult<Reply<T>>
    where
        T: Send + 'static,
        K: AsRef<[u8]>,
        A: ToArg,
    {
        self.dispatch(script_operation(Command::Eval, "script", script, keys, args, converter))
            .await
    }

    /// Run a cached script by its SHA1 digest
    ///
    /// An unknown digest fails with a `NOSCRIPT` server error.
    pub async fn eval_sha<T, K, A>(
        &mut self,
        sha: &str,
        keys: &[K],
        args: &[A],
        converter: Converter<T>,
    ) -> RedisResult<Reply<T>>
    where
        T: Send + 'static,
        K: AsRef<[u8]>,
        A: ToArg,
    {
        self.dispatch(script_operation(Command::EvalSha, "sha", sha, keys, args, converter))
            .await
    }

    /// Cache a script, returning its digest
    pub async fn script_load(&mut self, script: &str) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::ScriptLoad, convert::string).arg("script", script))
            .await
    }

    /// Check which digests are cached
    pub async fn script_exists<S: ToArg>(&mut self, shas: &[S]) -> RedisResult<Reply<Vec<bool>>> {
        self.dispatch(Operation::new(Command::ScriptExists, convert::boolean_list).args("shas", shas))
            .await
    }

    /// Empty the script cache
    pub async fn script_flush(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ScriptFlush, convert::status_ok))
            .await
    }

    /// Stop the running script if it has not written yet
    pub async fn script_kill(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ScriptKill, convert::status_ok))
            .await
    }
}

/// `EVAL|EVALSHA body numkeys key.. arg..`
fn script_operation<T, K, A>(
    command: Command,
    name: &'static str,
    body: &str,
    keys: &[K],
    args: &[A],
    converter: Converter<T>,
) -> Operation<T>
where
    K: AsRef<[u8]>,
    A: ToArg,
{
    Operation::new(command, converter)
        .arg(name, body)
        .arg("numkeys", keys.len())
        .keys("keys", keys)
        .args("args", args)
}
