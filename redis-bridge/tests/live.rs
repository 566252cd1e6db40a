//! Tests against a running Redis server
//!
//! Ignored by default. Run with `cargo test -- --ignored`, pointing
//! `REDIS_URL` at a disposable instance (default redis://localhost:6379).

use redis_bridge::{convert, Client, ConnectionConfig, Script, Status, Topology};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

async fn connect() -> Client {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    Client::connect(ConnectionConfig::new(redis_url()))
        .await
        .expect("Failed to connect")
}

#[tokio::test]
#[ignore = "needs a Redis server"]
async fn test_basic_set_get() {
    let mut client = connect().await;
    assert_eq!(client.topology(), Topology::Standalone);

    let status = client.set("live:basic", "value").await.unwrap().into_value().unwrap();
    assert_eq!(status, Status::Success);

    let value = client.get("live:basic").await.unwrap().into_value().unwrap();
    assert_eq!(value.as_deref(), Some("value"));

    client.del(&["live:basic"]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a Redis server"]
async fn test_set_with_expiration() {
    let mut client = connect().await;

    client.set_ex("live:expire", 30, "temp").await.unwrap();
    let ttl = client.ttl("live:expire").await.unwrap().into_value().unwrap();
    assert!(ttl > 0 && ttl <= 30);

    client.del(&["live:expire"]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a Redis server"]
async fn test_bitmap_in_every_mode() {
    let mut client = connect().await;
    client.del(&["live:bits"]).await.unwrap();

    client.set_bit("live:bits", 7, true).await.unwrap();
    assert!(client.get_bit("live:bits", 7).await.unwrap().into_value().unwrap());

    client.open_pipeline().unwrap();
    let whole = client.bit_count("live:bits").await.unwrap().queued().unwrap();
    let range = client.bit_count_range("live:bits", 0, -1).await.unwrap().queued().unwrap();
    let mut results = client.close_pipeline().await.unwrap();
    assert_eq!(results.take(whole).unwrap(), 1);
    assert_eq!(results.take(range).unwrap(), 1);

    client.multi().unwrap();
    let count = client.bit_count("live:bits").await.unwrap().queued().unwrap();
    let mut results = client.exec().await.unwrap().committed().unwrap();
    assert_eq!(results.take(count).unwrap(), 1);

    client.del(&["live:bits"]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a Redis server"]
async fn test_collections() {
    let mut client = connect().await;
    client.del(&["live:hash", "live:list"]).await.unwrap();

    client.hset("live:hash", "name", "ada").await.unwrap();
    let fields = client.hget_all("live:hash").await.unwrap().into_value().unwrap();
    assert_eq!(fields.get("name").map(String::as_str), Some("ada"));

    client.rpush("live:list", &["a", "b", "c"]).await.unwrap();
    let items = client.lrange("live:list", 0, -1).await.unwrap().into_value().unwrap();
    assert_eq!(items, vec!["a", "b", "c"]);

    client.del(&["live:hash", "live:list"]).await.unwrap();
}

#[tokio::test]
#[ignore = "needs a Redis server"]
async fn test_script_falls_back_to_eval() {
    let mut client = connect().await;
    client.script_flush().await.unwrap();

    let script = Script::new("return tonumber(ARGV[1]) * 2");
    let value = script
        .invoke(&mut client, &["live:script"], &[21], convert::integer)
        .await
        .unwrap()
        .into_value()
        .unwrap();
    assert_eq!(value, 42);
}
