use archive_realtime::{ClientConfig, NotificationClient};
use std::time::Duration;

/// Listen to the archive realtime server and print every event
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load ARCHIVE_* variables from .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "archive_realtime=debug".into()),
        )
        .init();

    let config = ClientConfig::from_env()?;
    println!("📡 Connecting to: {}\n", config.endpoint_url);

    let client = NotificationClient::new(config)?;

    for event in [
        "connected",
        "disconnected",
        "error",
        "reconnecting",
        "give_up",
        "notification",
        "document_update",
        "user_update",
        "system_alert",
        "real_time_data",
    ] {
        client.on(event, move |data| println!("📨 {}: {}", event, data));
    }

    client.connect().await;

    println!("⏳ Listening for 60 seconds (Ctrl+C to stop)...\n");
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(60)) => {}
        _ = tokio::signal::ctrl_c() => println!("\n🛑 Interrupted"),
    }

    println!("State before disconnect: {}", client.connection_state().await);
    client.disconnect().await;
    println!("✅ Disconnected");

    Ok(())
}
