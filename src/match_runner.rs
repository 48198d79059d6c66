//! One match: three agents playing the four events in lockstep for a fixed number of ticks.
//!
//! Each tick:
//! 1. events that completed on the previous tick are reset, and render `GAME_OVER` this tick
//! 2. every event renders one line: its token followed by its 7 registers
//! 3. the cohort prepends the score lines and queries every live player
//! 4. every event advances with the three actions
//! 5. every event now over is ranked and its medals awarded, to be reset on the next tick
//!
//! ```no_run
//! use tetrathlon::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let agents = (0..3)
//!         .map(|i| Agent::new(i, "./my_agent", vec![0.1, 0.2]))
//!         .collect();
//!     let constraints = ConstraintsBuilder::new().build()?;
//!     let scores = run_match(agents, 600, Configuration::new(), &constraints)?;
//!     println!("{scores:?}");
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;

use anyhow::{anyhow, bail, Context};
use tracing::{debug, info, instrument, trace};

use crate::{
    action::Action,
    agent::Agent,
    agent_channel::{AgentChannel, Decider},
    cohort::{Cohort, MedalTable, Tier},
    configuration::Configuration,
    constraints::Constraints,
    logger::init_logger,
    minigame::{standard_lineup, Minigame, Rankings, MINIGAME_COUNT, PLAYER_COUNT},
};

/// Token replacing the render of an event on the tick it is reset.
pub const GAME_OVER: &str = "GAME_OVER";

/// Rank given to a dead player when an event completes.
const DEAD_RANK: usize = 2;

/// One event and its reset cycle.
struct EventSlot {
    game: Box<dyn Minigame>,
    should_reset: bool,
    resetting: bool,
    resets: u32,
}

impl EventSlot {
    fn new(mut game: Box<dyn Minigame>) -> EventSlot {
        game.reset();
        EventSlot {
            game,
            should_reset: false,
            resetting: false,
            resets: 0,
        }
    }

    fn apply_pending_reset(&mut self) {
        self.resetting = self.should_reset;
        if self.should_reset {
            self.game.reset();
            self.resets += 1;
            self.should_reset = false;
        }
    }

    fn render_line(&self) -> String {
        let mut line = if self.resetting {
            GAME_OVER.to_string()
        } else {
            self.game.render()
        };
        for register in self.game.fill_registers() {
            line.push(' ');
            line.push_str(&register.to_string());
        }
        line
    }
}

/// A running match.
///
/// Agent processes are released when the match is dropped or its scores are finalized.
pub struct Match {
    events: Vec<EventSlot>,
    cohort: Cohort,
    ticks_played: usize,
    tick_budget: usize,
    config: Configuration,
    last_query: Vec<String>,
    last_actions: [Action; PLAYER_COUNT],
}

impl std::fmt::Debug for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Match")
            .field("cohort", &self.cohort)
            .field("ticks_played", &self.ticks_played)
            .field("tick_budget", &self.tick_budget)
            .field("resets", &self.resets())
            .finish_non_exhaustive()
    }
}

impl Match {
    /// Launch the three `agents` and prepare a match of `ticks` ticks.
    ///
    /// # Errors
    /// Returned if there are not exactly three agents, or if an agent cannot be launched or
    /// fails its handshake. Already launched agents are killed before returning.
    #[instrument(skip_all, fields(ticks = ticks))]
    pub fn new(
        agents: Vec<Agent>,
        ticks: usize,
        config: Configuration,
        constraints: &Constraints,
    ) -> anyhow::Result<Match> {
        if config.log {
            init_logger("match").context("could not start logger")?;
        }
        let agents: [Agent; PLAYER_COUNT] = agents.try_into().map_err(|agents: Vec<Agent>| {
            anyhow!("a match needs {PLAYER_COUNT} agents, got {}", agents.len())
        })?;
        info!(?agents, "starting match");

        let mut players: Vec<(usize, Box<dyn Decider>)> = Vec::with_capacity(PLAYER_COUNT);
        for (slot, agent) in agents.iter().enumerate() {
            let channel = AgentChannel::init(agent, slot, constraints, config)
                .with_context(|| format!("could not initialize agent {agent}"))?;
            let decider: Box<dyn Decider> = Box::new(channel);
            players.push((agent.population_index, decider));
        }
        let players: [(usize, Box<dyn Decider>); PLAYER_COUNT] = players
            .try_into()
            .map_err(|_| anyhow!("could not initialize every agent"))?;

        Match::with_deciders(players, ticks, config)
    }

    /// Prepare a match of `ticks` ticks between in-process deciders, each paired with the
    /// population index it plays for.
    ///
    /// # Errors
    /// Returned if the events cannot be created.
    pub fn with_deciders(
        players: [(usize, Box<dyn Decider>); PLAYER_COUNT],
        ticks: usize,
        config: Configuration,
    ) -> anyhow::Result<Match> {
        let events = standard_lineup(config.seed)
            .context("could not create events")?
            .into_iter()
            .map(EventSlot::new)
            .collect::<Vec<_>>();
        if events.len() != MINIGAME_COUNT {
            bail!("expected {MINIGAME_COUNT} events, got {}", events.len());
        }

        Ok(Match {
            events,
            cohort: Cohort::new(players),
            ticks_played: 0,
            tick_budget: ticks,
            config,
            last_query: vec![],
            last_actions: [Action::Error; PLAYER_COUNT],
        })
    }

    /// Play one tick.
    ///
    /// Agent failures are absorbed: the failing player is dead for the rest of the match.
    ///
    /// # Errors
    /// Returned once the tick budget is spent, or if an event rejects the actions it was given.
    /// The latter is an engine bug; the match should be abandoned.
    pub fn tick(&mut self) -> anyhow::Result<()> {
        if self.is_complete() {
            bail!("match already played its {} ticks", self.tick_budget);
        }

        for event in &mut self.events {
            event.apply_pending_reset();
        }

        let state_lines: Vec<String> = self.events.iter().map(EventSlot::render_line).collect();
        self.last_query = self.cohort.query_lines(&state_lines);
        if self.config.verbose {
            println!("--- tick {} ---", self.ticks_played);
            for line in &self.last_query {
                println!("{line}");
            }
        }

        let actions = self.cohort.gather_decisions(&state_lines);
        trace!(tick = self.ticks_played, ?actions);
        for event in &mut self.events {
            event
                .game
                .tick(&actions)
                .with_context(|| format!("{} rejected {actions:?}", event.game.name()))?;
        }
        self.last_actions = actions;

        for index in 0..self.events.len() {
            if !self.events[index].game.is_over() {
                continue;
            }
            let rankings = self.rankings_for(index);
            self.cohort.update_medals(index, rankings);
            let event = &mut self.events[index];
            event.should_reset = true;

            let tiers = rankings.map(Tier::from_rank);
            debug!(event = event.game.name(), ?rankings, "event over");
            if self.config.verbose {
                println!(
                    "{} over: {}",
                    event.game.name(),
                    tiers.map(|tier| tier.to_string()).join(" ")
                );
            }
        }

        self.ticks_played += 1;
        Ok(())
    }

    /// Rankings of event `index`, with dead players forced to last place.
    fn rankings_for(&self, index: usize) -> Rankings {
        let mut rankings = self.events[index].game.rankings();
        for (slot, rank) in rankings.iter_mut().enumerate() {
            if !self.cohort.is_active(slot) {
                *rank = DEAD_RANK;
            }
        }
        rankings
    }

    /// True once every tick of the budget has been played.
    pub fn is_complete(&self) -> bool {
        self.ticks_played >= self.tick_budget
    }

    /// Number of ticks played so far.
    pub fn ticks_played(&self) -> usize {
        self.ticks_played
    }

    /// How many times each event was reset after completing, in event order.
    pub fn resets(&self) -> [u32; MINIGAME_COUNT] {
        let mut resets = [0; MINIGAME_COUNT];
        for (count, event) in resets.iter_mut().zip(&self.events) {
            *count = event.resets;
        }
        resets
    }

    /// Medal counts so far.
    pub fn medals(&self) -> &MedalTable {
        self.cohort.medals()
    }

    /// False once the player in `slot` is dead.
    pub fn is_active(&self, slot: usize) -> bool {
        self.cohort.is_active(slot)
    }

    /// Lines sent to the players on the last tick. Empty before the first tick.
    pub fn last_query(&self) -> &[String] {
        &self.last_query
    }

    /// Actions the events were advanced with on the last tick.
    pub fn last_actions(&self) -> [Action; PLAYER_COUNT] {
        self.last_actions
    }

    /// Final scores keyed by population index. Releases every agent.
    pub fn finalize_scores(self) -> HashMap<usize, u64> {
        let scores = self.cohort.finalize_scores();
        info!(?scores, "match over");
        scores
    }
}

/// Play a full match of `ticks` ticks and return the final scores keyed by population index.
///
/// # Errors
/// See [`Match::new`] and [`Match::tick`].
pub fn run_match(
    agents: Vec<Agent>,
    ticks: usize,
    config: Configuration,
    constraints: &Constraints,
) -> anyhow::Result<HashMap<usize, u64>> {
    let mut game = Match::new(agents, ticks, config, constraints)?;
    while !game.is_complete() {
        game.tick()?;
    }
    Ok(game.finalize_scores())
}
