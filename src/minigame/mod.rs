//! The four events played in lockstep during a match.
//!
//! Every event implements [`Minigame`], the capability contract the orchestrator drives:
//! [`reset`](Minigame::reset), [`render`](Minigame::render),
//! [`fill_registers`](Minigame::fill_registers), [`tick`](Minigame::tick),
//! [`is_over`](Minigame::is_over) and [`rankings`](Minigame::rankings).
//!
//! Each event owns its own random generator, used only when generating fresh event parameters
//! (map layout, wind, legend shuffles, goal sequence). Seeding it makes an event fully
//! deterministic.

use rand::{rngs::StdRng, SeedableRng};

use crate::action::Action;

mod pattern;
mod race;
pub mod ranking;
mod target;
mod track;

pub use pattern::Pattern;
pub use race::Race;
pub use target::Target;
pub use track::Track;

/// Number of players in every match.
pub const PLAYER_COUNT: usize = 3;

/// Number of minigames in every match.
pub const MINIGAME_COUNT: usize = 4;

/// Width of the numeric part of a rendered event line.
pub const REGISTER_COUNT: usize = 7;

/// Ranks are 0-indexed: 0 is first place. Ties share the better rank.
pub type Rankings = [usize; PLAYER_COUNT];

/// One event's simulation.
///
/// A dead player (one who was handed [`Action::Error`] once) stays dead inside the event for as
/// long as the event object lives, across resets.
pub trait Minigame: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Reinitialise per-player and per-instance state, drawing fresh event parameters.
    fn reset(&mut self);

    /// Textual encoding of the shared event state (map, wind, legend or goal).
    fn render(&self) -> String;

    /// Per-player numeric state, at most [`REGISTER_COUNT`] values.
    fn registers(&self) -> Vec<i32>;

    /// Advance the event by one step.
    ///
    /// # Errors
    /// Returned when the engine drives the event outside its contract, e.g. ticking after the
    /// event parameters are exhausted. This is an engine bug and should abort the match.
    fn tick(&mut self, actions: &[Action; PLAYER_COUNT]) -> anyhow::Result<()>;

    /// True once the current instance of the event is complete.
    fn is_over(&self) -> bool;

    /// Ranks of the current instance. A dead player gets the worst possible score first.
    fn rankings(&self) -> Rankings;

    /// [`registers`](Minigame::registers) zero-padded on the right to exactly
    /// [`REGISTER_COUNT`] values.
    fn fill_registers(&self) -> [i32; REGISTER_COUNT] {
        let registers = self.registers();
        debug_assert!(
            registers.len() <= REGISTER_COUNT,
            "{} produced {} registers",
            self.name(),
            registers.len()
        );
        let mut filled = [0; REGISTER_COUNT];
        for (slot, value) in filled.iter_mut().zip(registers) {
            *slot = value;
        }
        filled
    }
}

/// The fixed event line-up, in protocol order.
///
/// With `seed = Some(s)`, event `i` is seeded with `s + i`; otherwise every event draws its
/// seed from the OS.
///
/// # Errors
/// Returned if an event cannot be built.
pub fn standard_lineup(seed: Option<u64>) -> anyhow::Result<Vec<Box<dyn Minigame>>> {
    let rng = |index: u64| match seed {
        Some(s) => StdRng::seed_from_u64(s.wrapping_add(index)),
        None => StdRng::from_os_rng(),
    };
    let lineup: Vec<Box<dyn Minigame>> = vec![
        Box::new(Race::new(rng(0))),
        Box::new(Target::new(rng(1))?),
        Box::new(Track::new(rng(2))),
        Box::new(Pattern::new(rng(3))),
    ];
    Ok(lineup)
}

/// Error out of movement logic: dead players are filtered before it.
pub(crate) fn unexpected_action(game: &str, action: Action) -> anyhow::Error {
    anyhow::anyhow!("{game}: action {action} reached movement logic")
}
