use archive_realtime::{ClientConfig, NotificationClient};
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

/// Subscribe to a department channel and survive a reconnect
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let channel =
        std::env::var("ARCHIVE_CHANNEL").unwrap_or_else(|_| "department.1".to_string());

    let client = NotificationClient::new(ClientConfig::from_env()?)?;

    let (connected_tx, mut connected_rx) = mpsc::unbounded_channel();
    client.on("connected", move |_| {
        let _ = connected_tx.send(());
    });
    client.on("document_update", |data| {
        println!("📄 Document update: {}", data);
    });
    client.on("reconnecting", |data| {
        println!("🔄 Reconnecting: {}", data);
    });

    // Subscriptions survive reconnects, so registering before connecting is fine
    client.subscribe(channel.clone()).await;
    println!("✅ Tracking channel '{}'", channel);

    client.connect().await;

    match tokio::time::timeout(Duration::from_secs(15), connected_rx.recv()).await {
        Ok(Some(())) => println!("✅ Connected, subscriptions: {:?}\n", client.subscriptions().await),
        _ => {
            client.disconnect().await;
            return Err("Did not connect within 15 seconds".into());
        }
    }

    client
        .send(&json!({ "type": "mark_read", "channel": channel }))
        .await;

    println!("⏳ Waiting 30 seconds for updates...");
    tokio::time::sleep(Duration::from_secs(30)).await;

    client.unsubscribe(&channel).await;
    client.disconnect().await;
    println!("🎉 Done");

    Ok(())
}
