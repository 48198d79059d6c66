//! Config for the match engine behaviors
//!
//! Configuration can be created programmatically using [`Configuration::new()`] or by reading
//! environment variables using [`Configuration::from_env()`].
//!
//! # Environment Variables
//!
//! The following environment variables can be used to override configuration values. All
//! values are optional. Flags are case-insensitive; set them to `"true"` to enable.
//!
//! - `MATCH_VERBOSE` — Print every tick's state and every finished event (default: `false`)
//! - `MATCH_LOG` — Enable logging to a file (default: `false`)
//! - `MATCH_ALLOW_UNCONTAINED` — Run agents as plain processes when a memory limit is set but
//!   cgroups are unavailable (default: `true`)
//! - `MATCH_DEBUG_AGENT_STDERR` — Let agents write to the evaluator's stderr (default: `false`)
//! - `MATCH_SEED` — Seed for every event's random parameters (default: unset, OS entropy)

/// Configuration for match behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Configuration {
    pub(crate) verbose: bool,
    pub(crate) log: bool,
    pub(crate) allow_uncontained: bool,
    pub(crate) debug_agent_stderr: bool,
    pub(crate) seed: Option<u64>,
}

impl Configuration {
    /// Create a new configuration with default parameters.
    ///
    /// By default:
    /// - Nothing is printed to stdout.
    /// - Logging to file is disabled.
    /// - Uncontained fallback is allowed.
    /// - Agent stderr output is discarded.
    /// - Event parameters are seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            verbose: false,
            log: false,
            allow_uncontained: true,
            debug_agent_stderr: false,
            seed: None,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// The following environment variables are recognized:
    /// - `MATCH_VERBOSE`: if set to `"true"`, enables verbose output (default: `false`)
    /// - `MATCH_LOG`: if set to `"true"`, enables logging to file (default: `false`)
    /// - `MATCH_ALLOW_UNCONTAINED`: if set to `"true"`, allows uncontained agents (default: `true`)
    /// - `MATCH_DEBUG_AGENT_STDERR`: if set to `"true"`, shows agent stderr (default: `false`)
    /// - `MATCH_SEED`: decimal `u64` seed (default: unset)
    ///
    /// Any other value (including unset) will result in using the default value for each field.
    pub fn from_env() -> Self {
        fn get_env_flag(var: &str, default: bool) -> bool {
            match std::env::var(var) {
                Ok(val) => val.eq_ignore_ascii_case("true"),
                Err(_) => default,
            }
        }

        Self {
            verbose: get_env_flag("MATCH_VERBOSE", false),
            log: get_env_flag("MATCH_LOG", false),
            allow_uncontained: get_env_flag("MATCH_ALLOW_UNCONTAINED", true),
            debug_agent_stderr: get_env_flag("MATCH_DEBUG_AGENT_STDERR", false),
            seed: std::env::var("MATCH_SEED")
                .ok()
                .and_then(|s| s.trim().parse().ok()),
        }
    }

    /// Enable or disable per-tick printing.
    pub fn with_verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    /// Enable or disable logging to file.
    pub fn with_log(mut self, value: bool) -> Self {
        self.log = value;
        self
    }

    /// Enable or disable the uncontained fallback.
    pub fn with_allow_uncontained(mut self, value: bool) -> Self {
        self.allow_uncontained = value;
        self
    }

    /// Enable or disable agent stderr output (debug purposes only).
    pub fn with_debug_agent_stderr(mut self, value: bool) -> Self {
        self.debug_agent_stderr = value;
        self
    }

    /// Seed every event's random parameters, making the simulation side of a match
    /// reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod configuration_tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Configuration::new()
            .with_verbose(true)
            .with_log(true)
            .with_allow_uncontained(false)
            .with_debug_agent_stderr(true)
            .with_seed(99);
        assert!(config.verbose && config.log && config.debug_agent_stderr);
        assert!(!config.allow_uncontained);
        assert_eq!(config.seed, Some(99));
        assert_eq!(Configuration::default(), Configuration::new());
    }

    #[test]
    fn from_env_reads_match_variables() {
        std::env::set_var("MATCH_VERBOSE", "TRUE");
        std::env::set_var("MATCH_LOG", "yes");
        std::env::set_var("MATCH_ALLOW_UNCONTAINED", "false");
        std::env::set_var("MATCH_SEED", " 42 ");
        let config = Configuration::from_env();
        std::env::set_var("MATCH_SEED", "forty-two");
        let unseeded = Configuration::from_env();
        for var in ["MATCH_VERBOSE", "MATCH_LOG", "MATCH_ALLOW_UNCONTAINED", "MATCH_SEED"] {
            std::env::remove_var(var);
        }

        assert!(config.verbose);
        // only "true" enables a flag
        assert!(!config.log);
        assert!(!config.allow_uncontained);
        assert!(!config.debug_agent_stderr);
        assert_eq!(config.seed, Some(42));
        assert_eq!(unseeded.seed, None);
    }
}
