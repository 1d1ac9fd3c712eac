use std::time::Duration;

use pagestream::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    println!("=== Concurrent paginated fetch ===");
    let mut stream = Pipeline::new(NumberSource::new(100))
        .page_size(10)
        .max_concurrency(4)
        .deadline(Duration::from_secs(1))
        .spawn();

    while let Some(n) = stream.recv().await {
        println!("result: {}", n);
    }
    stream.finish().await?;

    println!("\n=== Sequential fetch past the deadline ===");
    let source = DelayedSource::new(NumberSource::new(100), Duration::from_millis(40));
    let (items, error) = Pipeline::new(source)
        .sequential()
        .deadline(Duration::from_millis(200))
        .spawn()
        .drain()
        .await;
    println!("received {} items before stopping: {:?}", items.len(), error);

    println!("\nsuccessfully executed program");
    Ok(())
}
