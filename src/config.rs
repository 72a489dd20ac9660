//! Environment-driven configuration

use std::time::Duration;

use crate::protocol::ActionPolicy;

/// Parse a boolean flag the way operators tend to write it
fn env_flag(name: &str, default: bool) -> bool {
    std::env::var(name)
        .map(|v| {
            let v = v.trim().to_lowercase();
            !(v == "0" || v == "false" || v == "no" || v == "off")
        })
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Host-side configuration
#[derive(Debug, Clone, Default)]
pub struct HostConfig {
    /// How inbound actions are screened against the current phase
    pub action_policy: ActionPolicy,
    /// Re-send the current snapshot this often (None = only after mutations)
    pub snapshot_heartbeat: Option<Duration>,
}

impl HostConfig {
    /// Load host config from environment variables
    pub fn from_env() -> Self {
        let strict = env_flag("BALLOON_STRICT_PHASES", false);
        let action_policy = if strict {
            ActionPolicy::PhaseGated
        } else {
            ActionPolicy::Permissive
        };

        let snapshot_heartbeat = env_parse::<u64>("BALLOON_HEARTBEAT_MS")
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        tracing::info!(?action_policy, ?snapshot_heartbeat, "Host config loaded");
        Self {
            action_policy,
            snapshot_heartbeat,
        }
    }
}

/// Settings for the headless loopback simulation
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of client devices besides the host
    pub players: usize,
    /// Probability that any single delivery is lost
    pub loss_rate: f64,
    /// How long a client waits to observe an intent before resubmitting
    pub observe_timeout: Duration,
    /// How often a client submits the same intent before giving up
    pub max_attempts: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            players: 3,
            loss_rate: 0.0,
            observe_timeout: Duration::from_millis(250),
            max_attempts: 20,
        }
    }
}

impl SimConfig {
    /// Load simulation config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let players = env_parse::<usize>("BALLOON_SIM_PLAYERS")
            .filter(|n| *n >= 1)
            .unwrap_or(defaults.players);

        let loss_rate = env_parse::<f64>("BALLOON_SIM_LOSS")
            .filter(|rate| (0.0..=1.0).contains(rate))
            .unwrap_or(defaults.loss_rate);

        let observe_timeout = env_parse::<u64>("BALLOON_SIM_TIMEOUT_MS")
            .map(Duration::from_millis)
            .unwrap_or(defaults.observe_timeout);

        let max_attempts = env_parse::<u32>("BALLOON_SIM_ATTEMPTS")
            .filter(|n| *n >= 1)
            .unwrap_or(defaults.max_attempts);

        tracing::info!(players, loss_rate, ?observe_timeout, max_attempts, "Simulation config loaded");

        Self {
            players,
            loss_rate,
            observe_timeout,
            max_attempts,
        }
    }
}
