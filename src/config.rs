//! Process configuration from environment variables.
//!
//! Every setting has a documented default except the broadcast channel name.
//! Values are read through a lookup function so tests can supply a map
//! instead of mutating the process environment.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::collector::CollectorConfig;
use crate::monitor::{DeliveryFailurePolicy, WorkingHours};
use crate::notify::{DEFAULT_TELEGRAM_BASE_URL, TelegramConfig};
use crate::persistence::DEFAULT_STATE_TTL;
use crate::retry::RetryConfig;
use crate::runner::PollConfig;
use crate::types::QueueId;

/// DUW Wrocław queue status endpoint.
pub const DEFAULT_STATUS_API_URL: &str =
    "https://rezerwacje.duw.pl/status_kolejek/query.php?status=";

const DEFAULT_QUEUE_ID: i64 = 24;
const DEFAULT_QUEUE_CITY: &str = "Wrocław";
const DEFAULT_STATE_DIR: &str = "./state";

/// Errors from loading configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is set but cannot be used.
    #[error("invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Everything the process needs to wire up a monitor.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upstream catalog URL.
    pub status_api_url: String,

    pub collector: CollectorConfig,

    /// Per-request timeout for the shared HTTP client.
    pub http_client_timeout: Duration,

    /// Directory backing the state store.
    pub state_dir: PathBuf,

    /// TTL of the persisted state. Zero disables expiry.
    pub state_ttl: Duration,

    pub poll: PollConfig,

    /// When set, checks run only inside this weekday window.
    pub working_hours: Option<WorkingHours>,

    pub delivery_failure_policy: DeliveryFailurePolicy,

    /// Where notifications are sent (`@channel_name`).
    pub destination: String,

    /// `None` when no bot token is configured; notifications are then only
    /// logged.
    pub telegram: Option<TelegramConfig>,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through `lookup`, which returns the raw value of a
    /// variable if it is set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env { lookup };

        let collector = CollectorConfig::new(
            env.string("STATUS_MONITORED_QUEUE_CITY", DEFAULT_QUEUE_CITY),
            QueueId(env.parse("STATUS_MONITORED_QUEUE_ID", DEFAULT_QUEUE_ID)?),
        )
        .with_timeout(env.millis("STATUS_CHECK_TIMEOUT_MS", 4000)?)
        .with_retry(RetryConfig::new(
            env.attempts("STATUS_CHECK_MAX_ATTEMPTS")?,
            env.millis("STATUS_CHECK_ATTEMPT_DELAY_MS", 500)?,
        ));

        let poll = PollConfig::new()
            .with_interval(env.positive_secs("STATUS_CHECK_INTERVAL_SECONDS", 10)?)
            .with_persist_every_tick(env.flag("STATE_PERSIST_EVERY_TICK", false)?);

        let working_hours = if env.flag("MONITOR_WORKING_HOURS_ONLY", false)? {
            Some(env.working_hours()?)
        } else {
            None
        };

        let telegram = match env.get("NOTIFICATION_TELEGRAM_BOT_TOKEN") {
            None => None,
            Some(token) => Some(
                TelegramConfig::new(token)
                    .with_base_url(
                        env.string("NOTIFICATION_TELEGRAM_API_BASE_URL", DEFAULT_TELEGRAM_BASE_URL),
                    )
                    .with_request_timeout(
                        env.positive_secs("NOTIFICATION_TELEGRAM_REQUEST_TIMEOUT_SECONDS", 5)?,
                    )
                    .with_retry(RetryConfig::new(
                        env.attempts("NOTIFICATION_TELEGRAM_MAX_ATTEMPTS")?,
                        env.millis("NOTIFICATION_TELEGRAM_RETRY_DELAY_MS", 500)?,
                    )),
            ),
        };

        Ok(Config {
            status_api_url: env.string("STATUS_API_URL", DEFAULT_STATUS_API_URL),
            collector,
            http_client_timeout: env.positive_secs("MONITOR_HTTP_CLIENT_TIMEOUT_SECONDS", 5)?,
            state_dir: PathBuf::from(env.string("STATE_DIR", DEFAULT_STATE_DIR)),
            state_ttl: env.secs("STATE_TTL_SECONDS", DEFAULT_STATE_TTL.as_secs())?,
            poll,
            working_hours,
            delivery_failure_policy: env
                .parse("MONITOR_DELIVERY_FAILURE_POLICY", DeliveryFailurePolicy::default())?,
            destination: channel_destination(
                &env.required("NOTIFICATION_TELEGRAM_BROADCAST_CHANNEL_NAME")?,
            ),
            telegram,
        })
    }
}

/// Telegram addresses public channels as `@name`.
fn channel_destination(name: &str) -> String {
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{}", name)
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// The trimmed value, with empty treated as unset.
    fn get(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or_else(|| default.to_string())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name).ok_or(ConfigError::Missing(name))
    }

    fn parse<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
                value,
            }),
        }
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        let Some(value) = self.get(name) else {
            return Ok(default);
        };
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(name, value, "expected a boolean")),
        }
    }

    fn secs(&self, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
        self.parse(name, default).map(Duration::from_secs)
    }

    fn positive_secs(&self, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
        let secs = self.parse(name, default)?;
        if secs == 0 {
            return Err(invalid(name, secs, "must be greater than zero"));
        }
        Ok(Duration::from_secs(secs))
    }

    fn millis(&self, name: &'static str, default: u64) -> Result<Duration, ConfigError> {
        self.parse(name, default).map(Duration::from_millis)
    }

    fn attempts(&self, name: &'static str) -> Result<u32, ConfigError> {
        let attempts = self.parse(name, RetryConfig::DEFAULT.max_attempts)?;
        if attempts == 0 {
            return Err(invalid(name, attempts, "at least one attempt is required"));
        }
        Ok(attempts)
    }

    fn working_hours(&self) -> Result<WorkingHours, ConfigError> {
        let start = self.parse("MONITOR_WORKING_HOUR_START", WorkingHours::DEFAULT.start_hour)?;
        let end = self.parse("MONITOR_WORKING_HOUR_END", WorkingHours::DEFAULT.end_hour)?;
        WorkingHours::new(start, end).ok_or_else(|| {
            invalid(
                "MONITOR_WORKING_HOUR_END",
                format!("{start}-{end}"),
                "expected start < end <= 24",
            )
        })
    }
}

fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const CHANNEL: (&str, &str) = ("NOTIFICATION_TELEGRAM_BROADCAST_CHANNEL_NAME", "duw_queue");

    #[test]
    fn defaults_with_only_channel_set() {
        let config = load(&[CHANNEL]).unwrap();

        assert_eq!(config.status_api_url, DEFAULT_STATUS_API_URL);
        assert_eq!(config.collector.group, "Wrocław");
        assert_eq!(config.collector.queue_id, QueueId(24));
        assert_eq!(config.collector.timeout, Duration::from_millis(4000));
        assert_eq!(config.collector.retry, RetryConfig::DEFAULT);
        assert_eq!(config.http_client_timeout, Duration::from_secs(5));
        assert_eq!(config.state_dir, PathBuf::from("./state"));
        assert_eq!(config.state_ttl, Duration::from_secs(60));
        assert_eq!(config.poll, PollConfig::new());
        assert_eq!(config.working_hours, None);
        assert_eq!(
            config.delivery_failure_policy,
            DeliveryFailurePolicy::CommitTransition
        );
        assert_eq!(config.destination, "@duw_queue");
        assert!(config.telegram.is_none());
    }

    #[test]
    fn channel_is_required() {
        assert_eq!(
            load(&[]).unwrap_err(),
            ConfigError::Missing("NOTIFICATION_TELEGRAM_BROADCAST_CHANNEL_NAME")
        );
        assert_eq!(
            load(&[("NOTIFICATION_TELEGRAM_BROADCAST_CHANNEL_NAME", "  ")]).unwrap_err(),
            ConfigError::Missing("NOTIFICATION_TELEGRAM_BROADCAST_CHANNEL_NAME")
        );
    }

    #[test]
    fn channel_with_at_sign_is_kept() {
        let config = load(&[("NOTIFICATION_TELEGRAM_BROADCAST_CHANNEL_NAME", "@already")]).unwrap();

        assert_eq!(config.destination, "@already");
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            CHANNEL,
            ("STATUS_CHECK_INTERVAL_SECONDS", "30"),
            ("STATUS_API_URL", "http://localhost:8080/status"),
            ("STATUS_MONITORED_QUEUE_ID", "7"),
            ("STATUS_MONITORED_QUEUE_CITY", "Legnica"),
            ("STATUS_CHECK_TIMEOUT_MS", "1500"),
            ("STATUS_CHECK_MAX_ATTEMPTS", "5"),
            ("STATUS_CHECK_ATTEMPT_DELAY_MS", "100"),
            ("STATE_DIR", "/var/lib/queue-monitor"),
            ("STATE_TTL_SECONDS", "0"),
            ("STATE_PERSIST_EVERY_TICK", "true"),
            ("MONITOR_DELIVERY_FAILURE_POLICY", "retain"),
        ])
        .unwrap();

        assert_eq!(config.poll.interval, Duration::from_secs(30));
        assert!(config.poll.persist_every_tick);
        assert_eq!(config.status_api_url, "http://localhost:8080/status");
        assert_eq!(config.collector.queue_id, QueueId(7));
        assert_eq!(config.collector.group, "Legnica");
        assert_eq!(config.collector.timeout, Duration::from_millis(1500));
        assert_eq!(
            config.collector.retry,
            RetryConfig::new(5, Duration::from_millis(100))
        );
        assert_eq!(config.state_dir, PathBuf::from("/var/lib/queue-monitor"));
        assert_eq!(config.state_ttl, Duration::ZERO);
        assert_eq!(
            config.delivery_failure_policy,
            DeliveryFailurePolicy::RetainCurrent
        );
    }

    #[test]
    fn telegram_enabled_by_token() {
        let config = load(&[
            CHANNEL,
            ("NOTIFICATION_TELEGRAM_BOT_TOKEN", "123:abc"),
            ("NOTIFICATION_TELEGRAM_API_BASE_URL", "http://localhost:9000"),
            ("NOTIFICATION_TELEGRAM_MAX_ATTEMPTS", "2"),
        ])
        .unwrap();

        let telegram = config.telegram.unwrap();
        assert_eq!(telegram.bot_token, "123:abc");
        assert_eq!(telegram.base_url, "http://localhost:9000");
        assert_eq!(telegram.request_timeout, Duration::from_secs(5));
        assert_eq!(telegram.retry, RetryConfig::new(2, Duration::from_millis(500)));
    }

    #[test]
    fn debug_output_hides_bot_token() {
        let config = load(&[CHANNEL, ("NOTIFICATION_TELEGRAM_BOT_TOKEN", "123:secret")]).unwrap();

        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn working_hours_only_when_enabled() {
        let config = load(&[
            CHANNEL,
            ("MONITOR_WORKING_HOURS_ONLY", "1"),
            ("MONITOR_WORKING_HOUR_START", "7"),
        ])
        .unwrap();

        assert_eq!(config.working_hours, WorkingHours::new(7, 18));

        let ignored = load(&[CHANNEL, ("MONITOR_WORKING_HOUR_START", "nope")]).unwrap();
        assert_eq!(ignored.working_hours, None);
    }

    // ─── Invalid values ───

    #[test]
    fn unparseable_number_is_invalid() {
        let err = load(&[CHANNEL, ("STATUS_MONITORED_QUEUE_ID", "twenty-four")]).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { name: "STATUS_MONITORED_QUEUE_ID", ref value, .. }
                if value == "twenty-four"
        ));
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let err = load(&[CHANNEL, ("STATUS_CHECK_MAX_ATTEMPTS", "0")]).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { name: "STATUS_CHECK_MAX_ATTEMPTS", .. }
        ));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let err = load(&[CHANNEL, ("STATUS_CHECK_INTERVAL_SECONDS", "0")]).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { name: "STATUS_CHECK_INTERVAL_SECONDS", .. }
        ));
    }

    #[test]
    fn bad_working_hours_are_invalid() {
        let err = load(&[
            CHANNEL,
            ("MONITOR_WORKING_HOURS_ONLY", "true"),
            ("MONITOR_WORKING_HOUR_START", "18"),
            ("MONITOR_WORKING_HOUR_END", "6"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { name: "MONITOR_WORKING_HOUR_END", .. }
        ));
    }

    #[test]
    fn unknown_policy_is_invalid() {
        let err = load(&[CHANNEL, ("MONITOR_DELIVERY_FAILURE_POLICY", "drop")]).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { name: "MONITOR_DELIVERY_FAILURE_POLICY", .. }
        ));
    }

    #[test]
    fn unparseable_flag_is_invalid() {
        let err = load(&[CHANNEL, ("STATE_PERSIST_EVERY_TICK", "sometimes")]).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid { name: "STATE_PERSIST_EVERY_TICK", .. }
        ));
    }
}
