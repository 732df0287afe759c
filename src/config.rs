//! Command-line surface and runtime configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::Parser;

use crate::error::AddressError;

/// Topic carrying full board snapshots.
pub const BOARD_TOPIC: &str = "chess/board/fullstate";

/// Broker host used when `--broker` is not given.
pub const DEFAULT_BROKER_HOST: &str = "localhost";

/// Standard unencrypted MQTT port.
pub const DEFAULT_BROKER_PORT: u16 = 1883;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(author, version, about = "Live terminal view of a chessboard streamed over MQTT")]
pub struct Args {
    /// MQTT broker address, `host` or `host:port`.
    #[arg(long, value_name = "ADDRESS", default_value = DEFAULT_BROKER_HOST)]
    pub broker: BrokerAddress,
}

/// Broker host and port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerAddress {
    host: String,
    port: u16,
}

impl BrokerAddress {
    /// Address from explicit parts.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Host name or IP literal (IPv6 without brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl Default for BrokerAddress {
    fn default() -> Self {
        Self::new(DEFAULT_BROKER_HOST, DEFAULT_BROKER_PORT)
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for BrokerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = if let Some(rest) = s.strip_prefix('[') {
            let (host, tail) = rest
                .split_once(']')
                .ok_or_else(|| AddressError::Unbalanced(s.to_string()))?;
            match tail {
                "" => (host, None),
                _ => match tail.strip_prefix(':') {
                    Some(port) => (host, Some(port)),
                    None => return Err(AddressError::Unbalanced(s.to_string())),
                },
            }
        } else if s.matches(':').count() == 1 {
            let (host, port) = s.split_once(':').unwrap_or((s, ""));
            (host, Some(port))
        } else {
            (s, None)
        };

        if host.is_empty() {
            return Err(AddressError::EmptyHost);
        }
        let port = match port {
            Some(port) => port
                .parse()
                .map_err(|_| AddressError::InvalidPort(port.to_string()))?,
            None => DEFAULT_BROKER_PORT,
        };
        Ok(Self::new(host, port))
    }
}

/// Reconnection after an established session drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Consecutive failures tolerated before giving up.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on the delay between retries.
    pub max_backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl ReconnectPolicy {
    /// Never retry.
    pub const DISABLED: Self = Self {
        max_attempts: 0,
        initial_backoff: Duration::ZERO,
        max_backoff: Duration::ZERO,
    };

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1 << shift)
            .min(self.max_backoff)
    }
}

/// Feed listener tunables.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    /// Topic to subscribe to.
    pub topic: String,
    /// How often the cancellation flag is checked.
    pub poll_interval: Duration,
    /// Upper bound on the initial connect.
    pub connect_timeout: Duration,
    /// MQTT keep-alive.
    pub keep_alive: Duration,
    /// Behaviour when an established session drops.
    pub reconnect: ReconnectPolicy,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            topic: BOARD_TOPIC.to_string(),
            poll_interval: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(10),
            keep_alive: Duration::from_secs(5),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Configuration for the live view.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Broker to connect to.
    pub broker: BrokerAddress,
    /// Listener tunables.
    pub listener: ListenerConfig,
    /// Longest the coordinator blocks on the handoff channel.
    pub handoff_wait: Duration,
    /// Maximum repaints per second.
    pub refresh_per_second: u32,
    /// How long shutdown waits for the listener thread.
    pub join_timeout: Duration,
    /// Whether to draw on the alternate screen.
    pub alternate_screen: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            broker: BrokerAddress::default(),
            listener: ListenerConfig::default(),
            handoff_wait: Duration::from_millis(500),
            refresh_per_second: 4,
            join_timeout: Duration::from_secs(2),
            alternate_screen: true,
        }
    }
}

impl From<Args> for ViewerConfig {
    fn from(args: Args) -> Self {
        Self {
            broker: args.broker,
            ..Self::default()
        }
    }
}
