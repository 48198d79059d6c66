use std::collections::VecDeque;

use anyhow::Context;

use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    rngs::StdRng,
    Rng,
};

use super::{ranking::rank_scores, unexpected_action, Minigame, Rankings, PLAYER_COUNT};
use crate::action::Action;

/// Relative odds of each wind strength 0 to 9.
const WIND_WEIGHTS: [f64; 10] = [0.0, 2.0, 2.0, 2.0, 0.5, 0.5, 0.25, 0.25, 0.25, 0.2];
const MAX_DISTANCE: i32 = 20;
const DEAD_SCORE: f64 = -999_999.0;

/// Aim a cursor at the origin against a sequence of wind strengths.
///
/// Every tick consumes one wind value `w`: `UP`/`DOWN` move the cursor by `-w`/`+w` on y,
/// `LEFT`/`RIGHT` by `-w`/`+w` on x. The cursor is clamped to `[-20, 20]` on both axes.
#[derive(Debug)]
pub struct Target {
    rng: StdRng,
    wind_distribution: WeightedIndex<f64>,
    cursors: [(i32, i32); PLAYER_COUNT],
    wind: VecDeque<i32>,
    dead: [bool; PLAYER_COUNT],
}

impl Target {
    /// Create a target event drawing its wind from `rng`. Call [`Minigame::reset`] before use.
    ///
    /// # Errors
    /// Returned if the wind weights do not form a valid distribution.
    pub fn new(rng: StdRng) -> anyhow::Result<Target> {
        let wind_distribution =
            WeightedIndex::new(WIND_WEIGHTS).context("invalid wind distribution")?;
        Ok(Target {
            rng,
            wind_distribution,
            cursors: [(0, 0); PLAYER_COUNT],
            wind: VecDeque::new(),
            dead: [false; PLAYER_COUNT],
        })
    }

    fn random_offset(&mut self) -> i32 {
        let sign = if self.rng.random_bool(0.5) { 1 } else { -1 };
        (5 + self.rng.random_range(0..5)) * sign
    }
}

impl Minigame for Target {
    fn name(&self) -> &'static str {
        "target"
    }

    fn reset(&mut self) {
        let start = (self.random_offset(), self.random_offset());
        self.cursors = [start; PLAYER_COUNT];

        let rounds = 12 + self.rng.random_range(0..4);
        self.wind = (0..rounds)
            .map(|_| self.wind_distribution.sample(&mut self.rng) as i32)
            .collect();
    }

    fn render(&self) -> String {
        self.wind.iter().map(i32::to_string).collect()
    }

    fn registers(&self) -> Vec<i32> {
        self.cursors.iter().flat_map(|&(x, y)| [x, y]).collect()
    }

    fn tick(&mut self, actions: &[Action; PLAYER_COUNT]) -> anyhow::Result<()> {
        let Some(offset) = self.wind.pop_front() else {
            anyhow::bail!("{}: ticked with no wind left", self.name());
        };

        for (i, &action) in actions.iter().enumerate() {
            if action.is_error() {
                self.dead[i] = true;
                continue;
            }

            let (dx, dy) = match action {
                Action::Up => (0, -offset),
                Action::Down => (0, offset),
                Action::Left => (-offset, 0),
                Action::Right => (offset, 0),
                Action::Error => return Err(unexpected_action(self.name(), action)),
            };

            let (x, y) = &mut self.cursors[i];
            *x = (*x + dx).clamp(-MAX_DISTANCE, MAX_DISTANCE);
            *y = (*y + dy).clamp(-MAX_DISTANCE, MAX_DISTANCE);
        }
        Ok(())
    }

    fn is_over(&self) -> bool {
        self.wind.is_empty()
    }

    fn rankings(&self) -> Rankings {
        let mut scores = [0.0; PLAYER_COUNT];
        for (i, score) in scores.iter_mut().enumerate() {
            let (x, y) = self.cursors[i];
            *score = if self.dead[i] {
                DEAD_SCORE
            } else {
                -f64::from(x * x + y * y)
            };
        }
        rank_scores(scores)
    }
}
