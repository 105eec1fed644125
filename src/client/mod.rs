// Module declarations
mod builder;
mod config;
mod connection;
mod core;
mod state;

#[cfg(test)]
mod tests;

// Public API exports
pub use builder::NotificationClientBuilder;
pub use config::ClientConfig;
pub use connection::ConnectionState;
pub use self::core::NotificationClient;
pub use state::ClientState;
