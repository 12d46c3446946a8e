use crate::*;
use std::time::Duration;

/// Runtime knobs for the hub and its transport.
/// Every field can be set by flag or environment variable in the binary;
/// tests build one from [`Config::default`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "server", derive(clap::Parser))]
#[cfg_attr(feature = "server", command(name = "hosting", about = "Live elimination quiz hub"))]
pub struct Config {
    /// Address the HTTP server binds to.
    #[cfg_attr(feature = "server", arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080"))]
    pub bind: String,
    /// Tokens granted to each player on join.
    #[cfg_attr(feature = "server", arg(long, env = "STARTING_BALANCE", default_value_t = STARTING_BALANCE))]
    pub starting_balance: Tokens,
    /// Persistent-balance fee debited through Accounts before a player may join.
    #[cfg_attr(feature = "server", arg(long, env = "ENTRY_FEE", default_value_t = Tokens::ZERO))]
    pub entry_fee: Tokens,
    /// Shared secret a host must present. Unset means any host may connect.
    #[cfg_attr(feature = "server", arg(long, env = "HOST_TOKEN"))]
    pub host_token: Option<String>,
    #[cfg_attr(feature = "server", arg(long, env = "MIN_TIME_LIMIT", default_value_t = 5))]
    pub min_time_limit: u64,
    #[cfg_attr(feature = "server", arg(long, env = "MAX_TIME_LIMIT", default_value_t = 300))]
    pub max_time_limit: u64,
    #[cfg_attr(feature = "server", arg(long, env = "COOLDOWN_SECS", default_value_t = COOLDOWN_SECS))]
    pub cooldown_secs: u64,
    #[cfg_attr(feature = "server", arg(long, env = "ELIMINATION_GRACE_SECS", default_value_t = ELIMINATION_GRACE_SECS))]
    pub elimination_grace_secs: u64,
    #[cfg_attr(feature = "server", arg(long, env = "OUTBOX_CAPACITY", default_value_t = OUTBOX_CAPACITY))]
    pub outbox_capacity: usize,
    #[cfg_attr(feature = "server", arg(long, env = "EVENT_CAPACITY", default_value_t = EVENT_CAPACITY))]
    pub event_capacity: usize,
    #[cfg_attr(feature = "server", arg(long, env = "PING_INTERVAL_SECS", default_value_t = PING_INTERVAL_SECS))]
    pub ping_interval_secs: u64,
    #[cfg_attr(feature = "server", arg(long, env = "READ_DEADLINE_SECS", default_value_t = READ_DEADLINE_SECS))]
    pub read_deadline_secs: u64,
    #[cfg_attr(feature = "server", arg(long, env = "WRITE_DEADLINE_SECS", default_value_t = WRITE_DEADLINE_SECS))]
    pub write_deadline_secs: u64,
    #[cfg_attr(feature = "server", arg(long, env = "WORKERS", default_value_t = 4))]
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            starting_balance: STARTING_BALANCE,
            entry_fee: Tokens::ZERO,
            host_token: None,
            min_time_limit: 5,
            max_time_limit: 300,
            cooldown_secs: COOLDOWN_SECS,
            elimination_grace_secs: ELIMINATION_GRACE_SECS,
            outbox_capacity: OUTBOX_CAPACITY,
            event_capacity: EVENT_CAPACITY,
            ping_interval_secs: PING_INTERVAL_SECS,
            read_deadline_secs: READ_DEADLINE_SECS,
            write_deadline_secs: WRITE_DEADLINE_SECS,
            workers: 4,
        }
    }
}

impl Config {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
    pub fn elimination_grace(&self) -> Duration {
        Duration::from_secs(self.elimination_grace_secs)
    }
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
    pub fn read_deadline(&self) -> Duration {
        Duration::from_secs(self.read_deadline_secs)
    }
    pub fn write_deadline(&self) -> Duration {
        Duration::from_secs(self.write_deadline_secs)
    }
    /// Whether a host presenting `token` may connect.
    pub fn admits_host(&self, token: Option<&str>) -> bool {
        match self.host_token.as_deref() {
            None => true,
            Some(secret) => token == Some(secret),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.starting_balance, Tokens::whole(50));
        assert_eq!(config.cooldown(), Duration::from_secs(3));
        assert_eq!(config.elimination_grace(), Duration::from_secs(2));
        assert_eq!(config.outbox_capacity, 64);
    }
    #[test]
    fn host_token_gate() {
        let open = Config::default();
        assert!(open.admits_host(None));
        let closed = Config {
            host_token: Some("s3cret".into()),
            ..Config::default()
        };
        assert!(closed.admits_host(Some("s3cret")));
        assert!(!closed.admits_host(Some("guess")));
        assert!(!closed.admits_host(None));
    }
}
