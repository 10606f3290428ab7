/// Example demonstrating a fuse guarding a flaky dependency
///
/// Run with:
/// ```bash
/// # MemoryStore (no dependencies needed)
/// cargo run --example fuse_usage
///
/// # RedisStore (requires Redis running on localhost:6379)
/// cargo run --example fuse_usage --features redis-store
/// ```

use async_trait::async_trait;
use lighter_fuse::{Fuse, FuseBox, FuseObserver, FuseSettings, MemoryStore, Store, Transition};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "redis-store")]
use lighter_fuse::RedisStore;

/// Prints every transition
struct Logger;

#[async_trait]
impl<S: Store> FuseObserver<S> for Logger {
    async fn update(&self, fuse: &Fuse<S>, transition: Transition) {
        match transition {
            Transition::Blown { restart_at } => {
                println!("   [{}] blown, restart at {} ms", fuse.name(), restart_at)
            }
            Transition::Recovered => println!("   [{}] recovered", fuse.name()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== Fuse Usage Examples ===\n");

    // Example 1: MemoryStore (process-local)
    println!("1. MemoryStore Example:");
    demo_fuse(Arc::new(MemoryStore::new()), "MemoryStore").await?;

    // Example 2: RedisStore (shared between processes)
    #[cfg(feature = "redis-store")]
    {
        println!("\n2. RedisStore Example:");
        match RedisStore::new("redis://localhost:6379", "lighter-fuse-demo").await {
            Ok(store) => {
                demo_fuse(Arc::new(store), "RedisStore").await?;
            }
            Err(e) => {
                println!("   Failed to connect to Redis: {}", e);
                println!("   Make sure Redis is running on localhost:6379");
                println!("   Or run with: docker run -d -p 6379:6379 redis");
            }
        }
    }

    #[cfg(not(feature = "redis-store"))]
    {
        println!("\n2. RedisStore Example: (disabled)");
        println!("   Run with --features redis-store to enable RedisStore");
    }

    Ok(())
}

async fn demo_fuse<S: Store + 'static>(store: Arc<S>, store_name: &str) -> anyhow::Result<()> {
    let fuse_box = FuseBox::new(store, FuseSettings::default())?;
    let fuse = fuse_box.fuse("flaky-upstream")?;
    fuse.reset().await?;
    fuse.attach(Arc::new(Logger));

    println!(
        "   {}: M = {}, T = {} ms, R = {} ms",
        store_name,
        fuse.max_melts(),
        fuse.window_ms(),
        fuse.anneal_ms()
    );

    // Every call to the upstream fails
    let mut attempts = 0;
    while fuse.ok().await? {
        attempts += 1;
        fuse.melt().await?;
    }
    println!("   gave up after {} failed attempts", attempts);

    tokio::time::sleep(Duration::from_millis(fuse.anneal_ms())).await;
    println!("   ok again: {}", fuse.ok().await?);

    fuse.reset().await?;
    Ok(())
}
