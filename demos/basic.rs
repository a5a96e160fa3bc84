//! Basic usage against a single master.
//!
//! Run with: cargo run --example basic

use std::time::Duration;

use tandem::{PoolBuilder, Result, SetOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let pool = PoolBuilder::new()
        .master("127.0.0.1:6379")
        .max_active(8)
        .read_timeout(Some(Duration::from_secs(2)))
        .build()
        .await?;

    println!("Connected, server version {}", pool.version());

    pool.set_with("demo:greeting", "Hello, tandem!", SetOptions::default().ex(60))
        .await?;
    if let Some(value) = pool.get("demo:greeting").await? {
        println!("GET demo:greeting: {}", String::from_utf8_lossy(&value));
    }

    let count = pool.incr("demo:counter").await?;
    println!("INCR demo:counter: {}", count);

    pool.hmset("demo:user", &[("name", "alice"), ("lang", "rust")])
        .await?;
    println!("HGETALL demo:user: {:?}", pool.hgetall("demo:user").await?);

    let deleted = pool
        .del(&["demo:greeting", "demo:counter", "demo:user"])
        .await?;
    println!("DEL: {}", deleted);

    Ok(())
}
