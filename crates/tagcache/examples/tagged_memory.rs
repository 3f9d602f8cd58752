//! Basic example demonstrating tagcache with the memory backend

use tagcache::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("=== tagcache Tagged Memory Example ===\n");

    // Create cache with memory backend
    let backend = MemoryBackend::new(MemoryConfig::default());
    let cache = CacheEngine::new(backend, EngineConfig::new("/srv/shop", "pages"));

    // Store rendered pages tagged with what they show
    println!("Storing pages in cache...");
    cache
        .set("product:1", b"<h1>Lamp</h1>", ["products", "category:lighting"], Some(300))
        .await?;
    cache
        .set("product:2", b"<h1>Desk</h1>", ["products", "category:furniture"], Some(300))
        .await?;
    cache
        .set("category:lighting", b"<ul>Lamp</ul>", ["category:lighting"], None)
        .await?;

    // Retrieve from cache
    println!("Retrieving product:1...");
    match cache.get("product:1").await? {
        Some(page) => println!("✅ Cache HIT: {}", String::from_utf8_lossy(&page)),
        None => println!("❌ Cache MISS"),
    }

    // Look up by tag
    let lighting = cache.find_identifiers_by_tag("category:lighting").await?;
    println!("\nEntries tagged category:lighting: {:?}", lighting);

    // The lighting category changed: drop every page showing it
    let removed = cache.flush_by_tag("category:lighting").await?;
    println!("Flushed category:lighting, removed {} entries", removed);
    println!("   product:1 cached: {}", cache.has("product:1").await?);
    println!("   product:2 cached: {}", cache.has("product:2").await?);

    // Re-tagging replaces the old tags
    cache.set("product:2", b"<h1>Desk v2</h1>", ["sale"], Some(60)).await?;
    println!(
        "\nproduct:2 still under products: {}",
        cache.find_identifiers_by_tag("products").await?.contains("product:2")
    );

    // Key as stored in the backend
    println!("Physical key: {}", cache.prefixed_identifier("product:2"));

    // Check cache stats
    let stats = cache.stats().await?;
    println!("\n📊 Cache Statistics:");
    println!("   Hits: {}", stats.hits);
    println!("   Misses: {}", stats.misses);
    println!("   Writes: {}", stats.writes);
    println!("   Hit Ratio: {:.2}%", stats.hit_ratio() * 100.0);
    println!("   Size: {} entries", stats.size);

    // Expired entries stay in the document store until collected
    let collected = cache.collect_garbage().await?;
    println!("\nGarbage collected: {}", collected);

    cache.flush().await?;
    println!("Flushed, product:2 cached: {}", cache.has("product:2").await?);

    println!("\n=== Example Complete ===");
    Ok(())
}
