//! # Tetrathlon
//!
//! A match engine pitting three external agents against each other across four minigames played
//! simultaneously, producing one fitness score per agent for an outer evolutionary loop.
//!
//! It provides:
//! - The four events ([`minigame`]): a hurdle [`Race`](minigame::Race), a wind-blown
//!   [`Target`](minigame::Target), a [`Track`](minigame::Track) with a shuffled control legend and
//!   a [`Pattern`](minigame::Pattern) to repeat, all ranked by the same tie-aware
//!   [`rank_scores`](minigame::ranking::rank_scores)
//! - The per-match [`Cohort`](cohort::Cohort): medal table, death tracking and score formula
//! - The [`Match`](match_runner::Match) orchestrator stepping every event once per tick
//! - A line-based protocol with agent processes ([`agent_channel`]), optionally memory-limited
//!   through Linux cgroups v2
//!
//! Each match runs three agents, each as a separate OS process. Many matches can run in
//! parallel: they share nothing.
//!
//! # Usage Example
//!
//! ```no_run
//! use tetrathlon::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let constraints = ConstraintsBuilder::new()
//!         .with_ram_per_agent(200) // in MB
//!         .build()?;
//!     let config = Configuration::new().with_seed(42);
//!
//!     let agents = vec![
//!         Agent::new(0, "./agent", vec![0.5, -1.0]),
//!         Agent::new(1, "./agent", vec![0.1, 2.0]),
//!         Agent::new(2, "./agent", vec![1.5, 0.0]),
//!     ];
//!     let mut game = Match::new(agents, 600, config, &constraints)?;
//!     while !game.is_complete() {
//!         game.tick()?;
//!     }
//!     for (population_index, score) in game.finalize_scores() {
//!         println!("{population_index}: {score}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Agent Requirements
//!
//! Agents talk over stdin/stdout, one newline-terminated line at a time:
//! - Handshake (engine -> agent): the agent's slot (0 to 2), the number of events (4), then its
//!   genes as whitespace-separated decimals. The agent answers `INITIALIZED`.
//! - Every tick (engine -> agent): 3 lines `score` + 12 medal counts (gold, silver, bronze for
//!   each event, one line per player in slot order), then 4 lines `token` + 7 registers, one per
//!   event in order race, target, track, pattern. The token is `GAME_OVER` on the tick an event
//!   restarts.
//! - Every tick (agent -> engine): exactly one of `UP`, `DOWN`, `LEFT`, `RIGHT`.
//!
//! Any other reply, a closed pipe or an exceeded timeout makes the agent dead for the rest of the
//! match: it finishes last in every event from then on.
#![warn(missing_docs)]

pub use anyhow;
pub mod action;
pub mod agent;
pub mod agent_channel;
pub mod cohort;
pub mod configuration;
pub mod constraints;
mod logger;
pub mod match_runner;
pub mod minigame;
mod process;

/// Commonly used types and traits for quick access.
///
/// ```rust
/// use tetrathlon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::action::Action;
    pub use crate::agent::Agent;
    pub use crate::agent_channel::Decider;
    pub use crate::cohort::Tier;
    pub use crate::configuration::Configuration;
    pub use crate::constraints::{Constraints, ConstraintsBuilder};
    pub use crate::match_runner::{run_match, Match};
}
