use tagcache::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());

    println!("Connecting to Redis at {}", redis_url);

    let config = CacheConfig::from_json(&format!(
        r#"{{
            "application_identity": "/srv/example",
            "cache_name": "redis_example",
            "default_lifetime": 300,
            "backend": {{ "type": "redis", "url": "{redis_url}", "pool_size": 5 }}
        }}"#
    ))?;

    let cache = open(config).await?;

    // Every operation needs the server; fail with a hint instead of a trace
    if let Err(e) = cache.set("hello", b"world", ["greetings"], None).await {
        eprintln!("Failed to talk to Redis: {}", e);
        println!("Make sure Redis is running at 127.0.0.1:6379 or set REDIS_URL");
        return Ok(());
    }

    match cache.get("hello").await? {
        Some(value) => println!("Hit: {}", String::from_utf8_lossy(&value)),
        None => println!("Miss"),
    }

    // Tagging example
    cache.set("user:1", b"sachin", ["users", "admins"], None).await?;
    cache.set("user:2", b"alice", ["users"], None).await?;

    println!("users: {:?}", cache.find_identifiers_by_tag("users").await?);
    println!("admins flushed: {}", cache.flush_by_tag("admins").await?);
    println!("users: {:?}", cache.find_identifiers_by_tag("users").await?);

    // Redis expires entries itself
    println!("collected: {}", cache.collect_garbage().await?);

    cache.flush().await?;
    Ok(())
}
