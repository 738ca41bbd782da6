/// Relay settings, read from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub bind_addr: String,
    pub port: u16,
    /// Peers allowed in one session at a time.
    pub max_peers: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: 3000,
            max_peers: 2,
        }
    }
}

impl RelayConfig {
    /// `BIND_ADDR`, `PORT` and `MAX_PEERS`; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = RelayConfig::default();
        RelayConfig {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_var(&lookup, "PORT").unwrap_or(defaults.port),
            max_peers: parse_var(&lookup, "MAX_PEERS")
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.max_peers),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}
