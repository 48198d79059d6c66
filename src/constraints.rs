//! Resource limits applied to each agent of a match.
//!
//! # Overview
//!
//! The main entry point is the [`ConstraintsBuilder`] struct, which uses a builder pattern
//! to configure limits. These include:
//!
//! - **Memory**: a hard RAM limit per agent, enforced by running each agent in its own cgroup
//!   (Linux with cgroups v2 only)
//! - **Timing**:
//!   * Per-tick reply timeout
//!   * Handshake timeout (time to answer `INITIALIZED`)
//!
//! Without any limit set, agents run as plain child processes and the engine waits for their
//! replies indefinitely.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use tetrathlon::constraints::ConstraintsBuilder;
//!
//! let constraints = ConstraintsBuilder::new()
//!     .with_ram_per_agent(512)
//!     .with_action_timeout(Duration::from_millis(200))
//!     .with_init_timeout(Duration::from_secs(2))
//!     .build()
//!     .unwrap();
//! ```
//!
//! You may also construct constraints from environment variables using
//! [`ConstraintsBuilder::from_env()`] for runtime configurability.

use std::{env, time::Duration};

use anyhow::bail;

/// A builder for per-agent resource limits.
///
/// By default, nothing is limited.
#[derive(Debug, Default, Clone)]
pub struct ConstraintsBuilder {
    agent_ram: Option<usize>,
    action_time: Option<Duration>,
    init_time: Option<Duration>,
}

impl ConstraintsBuilder {
    /// Creates a new `ConstraintsBuilder` with no limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `ConstraintsBuilder` configured from environment variables.
    ///
    /// Read environment variables are:
    /// - `RAM_PER_AGENT` (usize): maximum RAM per agent in MB
    /// - `ACTION_TIMEOUT_MS` (u64): timeout per reply in milliseconds
    /// - `INIT_TIMEOUT_MS` (u64): handshake timeout in milliseconds
    ///
    /// Unset or unparsable variables leave the corresponding limit unset.
    #[must_use]
    pub fn from_env() -> Self {
        fn parse_usize(var: &str) -> Option<usize> {
            env::var(var).ok()?.parse().ok()
        }

        fn parse_duration_millis(var: &str) -> Option<Duration> {
            env::var(var)
                .ok()?
                .parse::<u64>()
                .ok()
                .map(Duration::from_millis)
        }

        ConstraintsBuilder {
            agent_ram: parse_usize("RAM_PER_AGENT"),
            action_time: parse_duration_millis("ACTION_TIMEOUT_MS"),
            init_time: parse_duration_millis("INIT_TIMEOUT_MS"),
        }
    }

    /// Sets the maximum RAM available per agent (in MB).
    #[must_use]
    pub fn with_ram_per_agent(self, max: usize) -> Self {
        Self {
            agent_ram: Some(max),
            ..self
        }
    }

    /// Sets the maximum time an agent may take to answer one tick.
    ///
    /// An agent that does not answer in time is treated like one whose process died.
    #[must_use]
    pub fn with_action_timeout(self, duration: Duration) -> Self {
        Self {
            action_time: Some(duration),
            ..self
        }
    }

    /// Sets the maximum time an agent may take to answer the handshake.
    #[must_use]
    pub fn with_init_timeout(self, duration: Duration) -> Self {
        Self {
            init_time: Some(duration),
            ..self
        }
    }

    /// Consumes the builder and returns the constructed `Constraints`.
    ///
    /// # Errors
    ///
    /// Returned when a limit is zero, which no agent could ever satisfy.
    pub fn build(self) -> anyhow::Result<Constraints> {
        if self.agent_ram == Some(0) {
            bail!("agent RAM limit must be positive");
        }
        if self.action_time == Some(Duration::ZERO) {
            bail!("action timeout must be positive");
        }
        if self.init_time == Some(Duration::ZERO) {
            bail!("init timeout must be positive");
        }

        Ok(Constraints {
            agent_ram: self.agent_ram.map(|mb| mb * 1_000_000),
            action_time: self.action_time,
            init_time: self.init_time,
        })
    }
}

/// Obtained using `ConstraintsBuilder`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    /// bytes
    pub(crate) agent_ram: Option<usize>,
    pub(crate) action_time: Option<Duration>,
    pub(crate) init_time: Option<Duration>,
}

impl Constraints {
    /// create a ConstraintsBuilder
    pub fn builder() -> ConstraintsBuilder {
        ConstraintsBuilder::new()
    }

    /// No limit at all: uncontained agents, unbounded waits.
    pub fn unlimited() -> Constraints {
        Constraints::default()
    }
}
