//! Master/replica routing and a registry of several deployments.
//!
//! Expects a master on 6379 replicated by 6380.
//!
//! Run with: cargo run --example replicas

use tandem::{Address, MultiPool, PoolOptions, Result, Role};

#[tokio::main]
async fn main() -> Result<()> {
    let registry = MultiPool::new(
        &[Address::new("127.0.0.1:6379", ["127.0.0.1:6380"])],
        PoolOptions::default(),
    )
    .await?;

    let pool = registry.get("127.0.0.1:6379").await?;
    println!(
        "master {} with {} replica(s)",
        pool.master_addr().socket_addr(),
        pool.replica_count()
    );

    // Writes go to the master; reads rotate over the replicas.
    pool.set("demo:routed", "written on master").await?;
    let acked = pool.wait(1, std::time::Duration::from_millis(500)).await?;
    println!("WAIT: {} replica(s) acknowledged", acked);
    println!("GET from replica: {:?}", pool.get("demo:routed").await?);

    match pool.role().await? {
        Role::Master { offset, replicas } => {
            println!("ROLE master at offset {}", offset);
            for r in replicas {
                println!("  replica {}:{} at {}", r.host, r.port, r.offset);
            }
        }
        other => println!("ROLE {:?}", other),
    }

    pool.del(&["demo:routed"]).await?;
    Ok(())
}
