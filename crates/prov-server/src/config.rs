use std::net::{Ipv4Addr, SocketAddr};

use prov_store::ClientConfig;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Largest accepted request body, in bytes.
    pub max_body_bytes: usize,
    /// Answer CORS preflights for any origin (browser and mobile clients).
    pub allow_any_origin: bool,
    pub store: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            max_body_bytes: 64 * 1024,
            allow_any_origin: true,
            store: ClientConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.max_body_bytes, 64 * 1024);
        assert!(c.allow_any_origin);
        assert_eq!(c.store.call_timeout, Duration::from_secs(10));
    }
}
