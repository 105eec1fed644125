/// Server-to-client message types (magic strings layer)
pub mod message_types {
    pub const NOTIFICATION: &str = "notification";
    pub const DOCUMENT_UPDATE: &str = "document_update";
    pub const USER_UPDATE: &str = "user_update";
    pub const SYSTEM_ALERT: &str = "system_alert";
    pub const REAL_TIME_DATA: &str = "real_time_data";
    pub const PONG: &str = "pong";
    pub const CONNECTION_ESTABLISHED: &str = "connection_established";
    pub const ERROR: &str = "error";
    pub const SUBSCRIBED: &str = "subscribed";
    pub const UNSUBSCRIBED: &str = "unsubscribed";
}

/// Client-to-server request types
pub mod request_types {
    pub const PING: &str = "ping";
    pub const SUBSCRIBE: &str = "subscribe";
    pub const UNSUBSCRIBE: &str = "unsubscribe";
}

/// Synthetic events emitted by the client itself
pub mod client_events {
    pub const CONNECTED: &str = "connected";
    pub const DISCONNECTED: &str = "disconnected";
    pub const ERROR: &str = "error";
    pub const RECONNECTING: &str = "reconnecting";
    pub const GIVE_UP: &str = "give_up";
}

/// Default WebSocket endpoint
pub const DEFAULT_WS_URL: &str = "ws://localhost:6001";

/// Default REST base for the token endpoint
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Token endpoint paths, relative to the REST base
pub const TOKEN_PATH: &str = "/websocket/token";
pub const TOKEN_INVALIDATE_PATH: &str = "/websocket/token/invalidate";

/// Query parameter carrying the connection token
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Default reconnect base interval (milliseconds)
pub const DEFAULT_RECONNECT_INTERVAL: u64 = 5000;

/// Default reconnect ceiling
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Default heartbeat interval (milliseconds)
pub const DEFAULT_HEARTBEAT_INTERVAL: u64 = 30000;

/// Default connect timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10000;

/// WebSocket close codes
pub const WS_CLOSE_NORMAL: u16 = 1000;
pub const WS_CLOSE_ABNORMAL: u16 = 1006;

/// Close reasons
pub const DISCONNECT_REASON: &str = "User initiated disconnect";
pub const CONNECT_TIMEOUT_REASON: &str = "connect timeout";
