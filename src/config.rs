//! Key/value configuration lookup.
//!
//! The service only ever asks for a single key, so sources are plain
//! `get(key) -> Option<String>` lookups. [`Layered`] stacks two of them with
//! the first one winning.

use std::collections::HashMap;
use std::sync::Arc;

use crate::{ProbeError, Result};

/// Opaque key to value lookup.
pub trait ConfigSource: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Arc<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

impl<T: ConfigSource + ?Sized> ConfigSource for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

/// Reads process environment variables, optionally under a prefix.
#[derive(Clone, Debug, Default)]
pub struct EnvConfig {
    prefix: String,
}

impl EnvConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `{prefix}{key}` instead of `key`.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl ConfigSource for EnvConfig {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(format!("{}{key}", self.prefix)).ok()
    }
}

/// In-memory source, typically filled from `key=value` arguments.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapConfig {
    values: HashMap<String, String>,
}

impl MapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Parses `key=value`, `--key=value` or `/key=value` arguments.
    /// Later occurrences of a key override earlier ones.
    pub fn from_args<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::new();
        for arg in args {
            let arg = arg.as_ref();
            let (key, value) =
                parse_pair(arg).ok_or_else(|| ProbeError::InvalidArgument(arg.to_owned()))?;
            config.insert(key, value);
        }
        Ok(config)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapConfig {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut config = Self::new();
        for (key, value) in iter {
            config.insert(key, value);
        }
        config
    }
}

impl ConfigSource for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

fn parse_pair(arg: &str) -> Option<(&str, &str)> {
    let stripped = arg
        .strip_prefix("--")
        .or_else(|| arg.strip_prefix('/'))
        .unwrap_or(arg);
    let (key, value) = stripped.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Two sources where `first` shadows `second`.
#[derive(Clone, Debug)]
pub struct Layered<A, B> {
    first: A,
    second: B,
}

impl<A: ConfigSource, B: ConfigSource> Layered<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }
}

impl<A: ConfigSource, B: ConfigSource> ConfigSource for Layered<A, B> {
    fn get(&self, key: &str) -> Option<String> {
        self.first.get(key).or_else(|| self.second.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_argument_forms() {
        let config = MapConfig::from_args(["PROBE_PATH=api/people/1/", "--a=1", "/b=x=y", "c="])
            .expect("all pairs are valid");
        assert_eq!(config.get("PROBE_PATH").as_deref(), Some("api/people/1/"));
        assert_eq!(config.get("a").as_deref(), Some("1"));
        assert_eq!(config.get("b").as_deref(), Some("x=y"));
        assert_eq!(config.get("c").as_deref(), Some(""));
        assert_eq!(config.len(), 4);
    }

    #[test]
    fn rejects_argument_without_pair() {
        let err = MapConfig::from_args(["loose"]).expect_err("must fail");
        assert!(matches!(err, ProbeError::InvalidArgument(arg) if arg == "loose"));
        assert!(MapConfig::from_args(["=value"]).is_err());
    }

    #[test]
    fn later_argument_wins() {
        let config = MapConfig::from_args(["k=1", "k=2"]).expect("valid");
        assert_eq!(config.get("k").as_deref(), Some("2"));
    }

    #[test]
    fn layered_prefers_first_source() {
        let first: MapConfig = [("shared", "cli")].into_iter().collect();
        let second: MapConfig = [("shared", "env"), ("only_env", "env")].into_iter().collect();
        let config = Layered::new(first, second);

        assert_eq!(config.get("shared").as_deref(), Some("cli"));
        assert_eq!(config.get("only_env").as_deref(), Some("env"));
        assert_eq!(config.get("missing"), None);
    }

    #[test]
    fn env_config_reads_prefixed_variable() {
        std::env::set_var("RESILIENT_PROBE_TEST_ENDPOINT", "api/planets/3/");
        let config = EnvConfig::with_prefix("RESILIENT_PROBE_TEST_");
        assert_eq!(config.get("ENDPOINT").as_deref(), Some("api/planets/3/"));
        assert_eq!(EnvConfig::new().get("RESILIENT_PROBE_TEST_UNSET"), None);
    }
}
