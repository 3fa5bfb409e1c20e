use anyhow::Context;
use std::time::Duration;

const PREFIX: &str = "CREWSCHED__";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub port: u16,
    pub body_limit_bytes: usize,
    /// Added to every solve budget before a job is declared stuck.
    pub deadline_slack: Duration,
    /// Zero disables the result cache.
    pub cache_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            body_limit_bytes: 2 * 1024 * 1024,
            deadline_slack: jobs::DEFAULT_DEADLINE_SLACK,
            cache_capacity: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `CREWSCHED__<SECTION>__<KEY>` through `lookup`; unset keys keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        let get = |name: &str| {
            let key = format!("{PREFIX}{name}");
            lookup(&key).map(|v| (key, v))
        };

        if let Some((key, v)) = get("SERVER__PORT") {
            cfg.port = v.trim().parse().with_context(|| format!("{key}={v}"))?;
        }
        if let Some((key, v)) = get("SERVER__BODY_LIMIT_BYTES") {
            cfg.body_limit_bytes = v.trim().parse().with_context(|| format!("{key}={v}"))?;
        }
        if let Some((key, v)) = get("SOLVER__DEADLINE_SLACK_SEC") {
            let secs: f64 = v.trim().parse().with_context(|| format!("{key}={v}"))?;
            cfg.deadline_slack =
                Duration::try_from_secs_f64(secs).with_context(|| format!("{key}={v}"))?;
        }
        if let Some((key, v)) = get("CACHE__CAPACITY") {
            cfg.cache_capacity = v.trim().parse().with_context(|| format!("{key}={v}"))?;
        }
        Ok(cfg)
    }
}
