//! Geospatial commands

use crate::client::Client;
use crate::convert;
use crate::dispatch::{Operation, Reply, ToArg};
use crate::registry::Command;
use redis_bridge_core::{Geo, GeoRadius, GeoRadiusArgument, GeoUnit, RedisResult};

impl Client {
    /// Add members at the given coordinates, returning how many are new
    pub async fn geo_add<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[(Geo, M)],
    ) -> RedisResult<Reply<i64>> {
        let operation = members.iter().fold(
            Operation::new(Command::GeoAdd, convert::integer).key("key", key),
            |operation, (geo, member)| {
                operation
                    .arg("longitude", geo.longitude)
                    .arg("latitude", geo.latitude)
                    .arg("member", member)
            },
        );
        self.dispatch(operation).await
    }

    /// Coordinates of members, `None` for missing ones
    pub async fn geo_pos<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[M],
    ) -> RedisResult<Reply<Vec<Option<Geo>>>> {
        self.dispatch(
            Operation::new(Command::GeoPos, convert::geo_list)
                .key("key", key)
                .args("members", members),
        )
        .await
    }

    /// Distance between two members
    pub async fn geo_dist(
        &mut self,
        key: impl AsRef<[u8]>,
        member1: impl ToArg,
        member2: impl ToArg,
        unit: GeoUnit,
    ) -> RedisResult<Reply<Option<f64>>> {
        self.dispatch(
            Operation::new(Command::GeoDist, convert::optional_float)
                .key("key", key)
                .arg("member1", member1)
                .arg("member2", member2)
                .arg("unit", unit.as_str()),
        )
        .await
    }

    /// Geohash strings of members
    pub async fn geo_hash<M: ToArg>(
        &mut self,
        key: impl AsRef<[u8]>,
        members: &[M],
    ) -> RedisResult<Reply<Vec<Option<String>>>> {
        self.dispatch(
            Operation::new(Command::GeoHash, convert::optional_string_list)
                .key("key", key)
                .args("members", members),
        )
        .await
    }

    /// Members within `radius` of a point
    ///
    /// The fields filled in each [`GeoRadius`] follow the `WITH*` flags of
    /// the argument.
    pub async fn geo_radius(
        &mut self,
        key: impl AsRef<[u8]>,
        center: Geo,
        radius: f64,
        unit: GeoUnit,
        argument: &GeoRadiusArgument,
    ) -> RedisResult<Reply<Vec<GeoRadius>>> {
        self.dispatch(
            Operation::new(Command::GeoRadius, convert::geo_radius_list)
                .key("key", key)
                .arg("longitude", center.longitude)
                .arg("latitude", center.latitude)
                .arg("radius", radius)
                .arg("unit", unit.as_str())
                .options("options", argument.to_args()),
        )
        .await
    }

    /// Members within `radius` of another member
    pub async fn geo_radius_by_member(
        &mut self,
        key: impl AsRef<[u8]>,
        member: impl ToArg,
        radius: f64,
        unit: GeoUnit,
        argument: &GeoRadiusArgument,
    ) -> RedisResult<Reply<Vec<GeoRadius>>> {
        self.dispatch(
            Operation::new(Command::GeoRadiusByMember, convert::geo_radius_list)
                .key("key", key)
                .arg("member", member)
                .arg("radius", radius)
                .arg("unit", unit.as_str())
                .options("options", argument.to_args()),
        )
        .await
    }
}
