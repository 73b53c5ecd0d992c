/*!
 * Runtime Configuration
 * Defaults from `limits`, overridable through `PROCMAN_*` environment variables
 */

use super::errors::ConfigError;
use super::limits::*;
use crate::process::types::{TerminationPolicy, WorkPlan};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_PROC_ROOT: &str = "PROCMAN_PROC_ROOT";
pub const ENV_GRACE_MS: &str = "PROCMAN_GRACE_MS";
pub const ENV_SEND_RETRIES: &str = "PROCMAN_SEND_RETRIES";
pub const ENV_RETRY_DELAY_MS: &str = "PROCMAN_RETRY_DELAY_MS";
pub const ENV_WORK_STEPS: &str = "PROCMAN_WORK_STEPS";
pub const ENV_WORK_INTERVAL_MS: &str = "PROCMAN_WORK_INTERVAL_MS";
pub const ENV_THREAD_STACK_KB: &str = "PROCMAN_THREAD_STACK_KB";
pub const ENV_TRACE_JSON: &str = "PROCMAN_TRACE_JSON";

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Mount point of the process tables
    pub proc_root: PathBuf,
    pub termination: TerminationPolicy,
    /// Simulated work for spawned processes
    pub process_work: WorkPlan,
    /// Simulated work for spawned threads
    pub thread_work: WorkPlan,
    pub thread_stack_size: usize,
    /// Emit JSON log lines instead of compact text
    pub trace_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from(DEFAULT_PROC_ROOT),
            termination: TerminationPolicy::default(),
            process_work: WorkPlan::new(DEFAULT_PROCESS_WORK_STEPS, DEFAULT_WORK_INTERVAL),
            thread_work: WorkPlan::new(DEFAULT_THREAD_WORK_STEPS, DEFAULT_WORK_INTERVAL),
            thread_stack_size: DEFAULT_THREAD_STACK_SIZE,
            trace_json: false,
        }
    }
}

impl Config {
    /// Read overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup(ENV_PROC_ROOT) {
            if root.trim().is_empty() {
                return Err(invalid(ENV_PROC_ROOT, &root, "path cannot be empty"));
            }
            config.proc_root = PathBuf::from(root);
        }

        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_GRACE_MS)? {
            config.termination.grace_period = Duration::from_millis(ms);
        }
        if let Some(retries) = parse_var::<u32, _>(&lookup, ENV_SEND_RETRIES)? {
            config.termination.send_retries = retries;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_RETRY_DELAY_MS)? {
            config.termination.retry_delay = Duration::from_millis(ms);
        }

        // One knob for both kinds of spawned work
        if let Some(steps) = parse_var::<u32, _>(&lookup, ENV_WORK_STEPS)? {
            config.process_work.steps = steps;
            config.thread_work.steps = steps;
        }
        if let Some(ms) = parse_var::<u64, _>(&lookup, ENV_WORK_INTERVAL_MS)? {
            config.process_work.interval = Duration::from_millis(ms);
            config.thread_work.interval = Duration::from_millis(ms);
        }

        if let Some(kb) = parse_var::<usize, _>(&lookup, ENV_THREAD_STACK_KB)? {
            let bytes = kb.saturating_mul(1024);
            if bytes < MIN_THREAD_STACK_SIZE {
                return Err(invalid(
                    ENV_THREAD_STACK_KB,
                    &kb.to_string(),
                    "stack must be at least 16 KB",
                ));
            }
            config.thread_stack_size = bytes;
        }

        if let Some(flag) = lookup(ENV_TRACE_JSON) {
            config.trace_json = matches!(flag.trim(), "1" | "true");
        }

        Ok(config)
    }

    pub fn with_proc_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.proc_root = root.into();
        self
    }

    pub fn with_termination(mut self, policy: TerminationPolicy) -> Self {
        self.termination = policy;
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| invalid(key, &raw, &e.to_string())),
    }
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.into(),
        value: value.into(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.proc_root, PathBuf::from("/proc"));
        assert_eq!(config.termination.grace_period, Duration::from_secs(2));
        assert_eq!(config.termination.send_retries, 0);
        assert_eq!(config.process_work.steps, 5);
        assert_eq!(config.thread_work.steps, 3);
        assert!(!config.trace_json);
    }

    #[test]
    fn test_overrides_applied() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_PROC_ROOT, "/tmp/fakeproc"),
            (ENV_GRACE_MS, "250"),
            (ENV_SEND_RETRIES, "2"),
            (ENV_WORK_STEPS, "1"),
            (ENV_WORK_INTERVAL_MS, "10"),
            (ENV_THREAD_STACK_KB, "128"),
            (ENV_TRACE_JSON, "true"),
        ]))
        .unwrap();

        assert_eq!(config.proc_root, PathBuf::from("/tmp/fakeproc"));
        assert_eq!(config.termination.grace_period, Duration::from_millis(250));
        assert_eq!(config.termination.send_retries, 2);
        assert_eq!(config.process_work.steps, 1);
        assert_eq!(config.thread_work.interval, Duration::from_millis(10));
        assert_eq!(config.thread_stack_size, 128 * 1024);
        assert!(config.trace_json);
    }

    #[test]
    fn test_invalid_number_rejected() {
        let err = Config::from_lookup(lookup_from(&[(ENV_GRACE_MS, "soon")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value, .. } => {
                assert_eq!(key, ENV_GRACE_MS);
                assert_eq!(value, "soon");
            }
        }
    }

    #[test]
    fn test_tiny_stack_rejected() {
        let result = Config::from_lookup(lookup_from(&[(ENV_THREAD_STACK_KB, "4")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_proc_root_rejected() {
        let result = Config::from_lookup(lookup_from(&[(ENV_PROC_ROOT, "  ")]));
        assert!(result.is_err());
    }
}
