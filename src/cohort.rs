//! The three players of a match: medal table, death flags and decision gathering.

use std::{collections::HashMap, fmt::Display};

use tracing::warn;

use crate::{
    action::Action,
    agent_channel::Decider,
    minigame::{Rankings, MINIGAME_COUNT, PLAYER_COUNT},
};

/// Medal bucket awarded when an event instance completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Rank 0.
    Gold,
    /// Rank 1.
    Silver,
    /// Rank 2, or worse.
    Bronze,
}

impl Tier {
    /// All tiers, in table order.
    pub const ALL: [Tier; 3] = [Tier::Gold, Tier::Silver, Tier::Bronze];

    /// Bucket for a 0-indexed rank.
    pub fn from_rank(rank: usize) -> Tier {
        match rank {
            0 => Tier::Gold,
            1 => Tier::Silver,
            _ => Tier::Bronze,
        }
    }

    /// Column of this tier in the medal table.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Weight of one medal of this tier in the score multiplier.
    pub fn weight(self) -> u64 {
        match self {
            Tier::Gold => 3,
            Tier::Silver => 1,
            Tier::Bronze => 0,
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Gold => "gold",
            Tier::Silver => "silver",
            Tier::Bronze => "bronze",
        };
        write!(f, "{name}")
    }
}

/// Medal counts indexed `[minigame][player][tier]`.
pub type MedalTable = [[[u32; 3]; PLAYER_COUNT]; MINIGAME_COUNT];

/// Bookkeeping for the three players of one match.
///
/// Each slot holds the decider queried for that player. A player whose decider fails is dead
/// for the rest of the match: its decider is dropped (killing an agent process) and it plays
/// [`Action::Error`] from then on.
pub struct Cohort {
    population: [usize; PLAYER_COUNT],
    links: Vec<Option<Box<dyn Decider>>>,
    dead: [bool; PLAYER_COUNT],
    medals: MedalTable,
}

impl std::fmt::Debug for Cohort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cohort")
            .field("population", &self.population)
            .field("dead", &self.dead)
            .field("medals", &self.medals)
            .finish_non_exhaustive()
    }
}

impl Cohort {
    /// Group one decider per slot, with the population index of the player behind it.
    pub fn new(players: [(usize, Box<dyn Decider>); PLAYER_COUNT]) -> Cohort {
        let mut population = [0; PLAYER_COUNT];
        let mut links = Vec::with_capacity(PLAYER_COUNT);
        for (slot, (index, decider)) in players.into_iter().enumerate() {
            population[slot] = index;
            links.push(Some(decider));
        }
        Cohort {
            population,
            links,
            dead: [false; PLAYER_COUNT],
            medals: [[[0; 3]; PLAYER_COUNT]; MINIGAME_COUNT],
        }
    }

    /// Current score of `slot`: the product over events of `3 * gold + silver`.
    ///
    /// Zero as long as the player has no gold or silver in some event. Saturates at
    /// `u64::MAX`.
    pub fn score_for(&self, slot: usize) -> u64 {
        let factors = self.medals.map(|event| {
            Tier::ALL
                .iter()
                .map(|tier| tier.weight() * u64::from(event[slot][tier.index()]))
                .sum::<u64>()
        });
        if factors.contains(&0) {
            return 0;
        }
        factors
            .into_iter()
            .try_fold(1u64, u64::checked_mul)
            .unwrap_or(u64::MAX)
    }

    /// One line per player: its score followed by its 12 medal counts, event by event.
    pub fn score_lines(&self) -> Vec<String> {
        (0..PLAYER_COUNT)
            .map(|slot| {
                let mut line = self.score_for(slot).to_string();
                for event in &self.medals {
                    for count in event[slot] {
                        line.push(' ');
                        line.push_str(&count.to_string());
                    }
                }
                line
            })
            .collect()
    }

    /// Full query for this tick: the score lines followed by `state_lines`.
    pub fn query_lines(&self, state_lines: &[String]) -> Vec<String> {
        let mut lines = self.score_lines();
        lines.extend_from_slice(state_lines);
        lines
    }

    /// Ask every live player for its action, in slot order.
    ///
    /// Dead players get [`Action::Error`] without any I/O. A player whose decider fails dies
    /// here and also gets [`Action::Error`].
    pub fn gather_decisions(&mut self, state_lines: &[String]) -> [Action; PLAYER_COUNT] {
        let lines = self.query_lines(state_lines);
        let mut actions = [Action::Error; PLAYER_COUNT];
        for (slot, action) in actions.iter_mut().enumerate() {
            if self.dead[slot] {
                continue;
            }
            let Some(decider) = self.links[slot].as_mut() else {
                self.dead[slot] = true;
                continue;
            };
            match decider.query(&lines) {
                Ok(decision) if !decision.is_error() => *action = decision,
                Ok(_) => self.kill(slot, "replied with the error sentinel"),
                Err(e) => self.kill(slot, &format!("{e:#}")),
            }
        }
        actions
    }

    fn kill(&mut self, slot: usize, reason: &str) {
        warn!(
            slot,
            population_index = self.population[slot],
            "player is dead: {reason}"
        );
        self.dead[slot] = true;
        self.links[slot] = None;
    }

    /// Record the outcome of one completed instance of event `minigame`.
    pub fn update_medals(&mut self, minigame: usize, ranks: Rankings) {
        for (slot, rank) in ranks.into_iter().enumerate() {
            self.medals[minigame][slot][Tier::from_rank(rank).index()] += 1;
        }
    }

    /// False once the player in `slot` is dead.
    pub fn is_active(&self, slot: usize) -> bool {
        !self.dead[slot]
    }

    /// Medal counts so far.
    pub fn medals(&self) -> &MedalTable {
        &self.medals
    }

    /// Population index of the player in `slot`.
    pub fn population_index(&self, slot: usize) -> usize {
        self.population[slot]
    }

    /// Final scores keyed by population index. Consumes the cohort, releasing every decider.
    pub fn finalize_scores(self) -> HashMap<usize, u64> {
        (0..PLAYER_COUNT)
            .map(|slot| (self.population[slot], self.score_for(slot)))
            .collect()
    }
}
