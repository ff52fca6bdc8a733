use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 8000;

/// Listener settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
        }
    }
}

impl ServerConfig {
    /// `GREENVIEW_BIND` (full address) wins over `PORT`
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(bind) = lookup("GREENVIEW_BIND") {
            config.bind = bind
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid GREENVIEW_BIND '{}': {}", bind, e))?;
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT '{}': {}", port, e))?;
            config.bind.set_port(port);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_resolution() {
        assert_eq!(ServerConfig::from_lookup(|_| None).unwrap(), ServerConfig::default());

        let port_only = ServerConfig::from_lookup(|key| (key == "PORT").then(|| "9100".to_string())).unwrap();
        assert_eq!(port_only.bind.to_string(), "0.0.0.0:9100");

        let both = ServerConfig::from_lookup(|key| match key {
            "GREENVIEW_BIND" => Some("127.0.0.1:7000".to_string()),
            "PORT" => Some("9100".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(both.bind.to_string(), "127.0.0.1:7000");

        assert!(ServerConfig::from_lookup(|_| Some("nope".to_string())).is_err());
    }
}
