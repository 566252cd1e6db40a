//! Access control commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{RedisResult, Status};

impl Client {
    /// User this connection is authenticated as
    pub async fn acl_whoami(&mut self) -> RedisResult<Reply<String>> {
        self.dispatch(Operation::new(Command::AclWhoAmI, convert::string))
            .await
    }

    /// Names of all users
    pub async fn acl_users(&mut self) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(Operation::new(Command::AclUsers, convert::string_list))
            .await
    }

    /// Command categories, or the commands of one category
    pub async fn acl_cat(&mut self, category: Option<&str>) -> RedisResult<Reply<Vec<String>>> {
        let mut operation = Operation::new(Command::AclCat, convert::string_list);
        if let Some(category) = category {
            operation = operation.arg("category", category);
        }
        self.dispatch(operation).await
    }

    /// Every user rule, one line per user
    pub async fn acl_list(&mut self) -> RedisResult<Reply<Vec<String>>> {
        self.dispatch(Operation::new(Command::AclList, convert::string_list))
            .await
    }

    /// Create or modify a user with ACL rules such as `"on"` or `"+get"`
    pub async fn acl_set_user<R: ToArg>(
        &mut self,
        username: &str,
        rules: &[R],
    ) -> RedisResult<Reply<Status>> {
        self.dispatch(
            Operation::new(Command::AclSetUser, convert::status_ok)
                .arg("username", username)
                .args("rules", rules),
        )
        .await
    }

    /// Delete users, returning how many existed
    pub async fn acl_del_user<U: ToArg>(&mut self, usernames: &[U]) -> RedisResult<Reply<i64>> {
        self.dispatch(Operation::new(Command::AclDelUser, convert::integer).args("usernames", usernames))
            .await
    }

    /// A random password, 256 bits unless `bits` says otherwise
    pub async fn acl_gen_pass(&mut self, bits: Option<u32>) -> RedisResult<Reply<String>> {
        let mut operation = Operation::new(Command::AclGenPass, convert::string);
        if let Some(bits) = bits {
            operation = operation.arg("bits", bits);
        }
        self.dispatch(operation).await
    }
}
