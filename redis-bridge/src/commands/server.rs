//! Server and configuration commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{Info, RedisResult, RedisServerTime, Status};
use std::collections::HashMap;

impl Client {
    /// Default `INFO` sections
    pub async fn info(&mut self) -> RedisResult<Reply<Info>> {
        self.dispatch(Operation::new(Command::Info, convert::info))
            .await
    }

    /// One `INFO` section, e.g. `"memory"` or `"all"`
    pub async fn info_section(&mut self, section: &str) -> RedisResult<Reply<Info>> {
        self.dispatch(Operation::new(Command::Info, convert::info).arg("section", section))
            .await
    }

    /// Number of keys in the selected database
    pub async fn db_size(&mut self) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::DbSize, convert::integer))
            .await
    }

    /// Delete every key of the selected database
    pub async fn flush_db(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::FlushDb, convert::status_ok))
            .await
    }

    /// Delete every key of every database
    pub async fn flush_all(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::FlushAll, convert::status_ok))
            .await
    }

    /// Server clock
    pub async fn time(&mut self) -> RedisResult<Reply<RedisServerTime>> {
        self.dispatch(Operation::new(Command::Time, convert::server_time))
            .await
    }

    /// Unix time of the last successful save
    pub async fn last_save(&mut self) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::LastSave, convert::integer))
            .await
    }

    /// Save synchronously
    pub async fn save(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::Save, convert::status_ok))
            .await
    }

    /// Start a background save; the server's status text
    pub async fn bg_save(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::BgSave, convert::string))
            .await
    }

    /// Start an append-only file rewrite; the server's status text
    pub async fn bg_rewrite_aof(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::BgRewriteAof, convert::string))
            .await
    }

    /// Configuration parameters matching a glob
    pub async fn config_get(&mut self, pattern: &str) -> RedisResult<Reply<HashMap<String, String>>> {
        self.dispatch(Operation::new(Command::ConfigGet, convert::string_map).arg("pattern", pattern))
            .await
    }

    /// Change a configuration parameter at runtime
    pub async fn config_set(&mut self, parameter: &str, value: impl ToArg) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::ConfigSet, convert::status_ok)
                .arg("parameter", parameter)
                .arg("value", value),
        )
        .await
    }

    /// Reset the statistics reported by `INFO`
    pub async fn config_reset_stat(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ConfigResetStat, convert::status_ok))
            .await
    }

    /// Write the running configuration back to the config file
    pub async fn config_rewrite(&mut self) -> RedisResult<Reply<Status>> {
        self.dispatch(Operation::new(Command::ConfigRewrite, convert::status_ok))
            .await
    }
}
