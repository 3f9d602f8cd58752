use tagcache::TracingMetrics;
use tagcache::prelude::*;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize tracing subscriber
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE) // Enable TRACE to see latency logs
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    println!("🔍 Initialized tracing...");

    // 2. Engine with the TracingMetrics adapter
    let backend = MemoryBackend::new(MemoryConfig::default());
    let metrics = TracingMetrics::new().with_service_name("example-service");

    let cache = CacheEngine::with_metrics(
        std::sync::Arc::new(backend),
        metrics,
        EngineConfig::new("/srv/example", "tracing"),
    );

    println!("\n⚡ Setting values...");
    cache.set("user:1", b"Alice", ["active", "admin"], Some(60)).await?;
    cache.set("user:2", b"Bob", ["active"], Some(60)).await?;

    println!("\n⚡ Getting value (Hit)...");
    println!("   Got: {:?}", cache.get("user:1").await?);

    println!("\n⚡ Getting missing value (Miss)...");
    println!("   Got: {:?}", cache.get("user:99").await?);

    println!("\n⚡ Flushing tag admin...");
    let removed = cache.flush_by_tag("admin").await?;
    println!("   Removed: {}", removed);

    println!("\n✅ Check your console output for structured logs!");

    Ok(())
}
