use std::collections::VecDeque;

use rand::{rngs::StdRng, seq::IndexedRandom, Rng};

use super::{ranking::rank_scores, Minigame, Rankings, PLAYER_COUNT};
use crate::action::Action;

/// Repeat a goal sequence, one action per tick.
///
/// Matching the goal extends the player's combo by one and scores the new combo length.
/// Any mismatch resets the combo.
#[derive(Debug)]
pub struct Pattern {
    rng: StdRng,
    goal: VecDeque<Action>,
    points: [i32; PLAYER_COUNT],
    combo: [i32; PLAYER_COUNT],
    dead: [bool; PLAYER_COUNT],
    history: [Vec<Action>; PLAYER_COUNT],
}

impl Pattern {
    /// Create a pattern event drawing its goals from `rng`. Call [`Minigame::reset`] before use.
    pub fn new(rng: StdRng) -> Pattern {
        Pattern {
            rng,
            goal: VecDeque::new(),
            points: [0; PLAYER_COUNT],
            combo: [0; PLAYER_COUNT],
            dead: [false; PLAYER_COUNT],
            history: Default::default(),
        }
    }

    /// Actions logged during the current instance.
    ///
    /// Every live player's action is appended to the log of slot 0; the logs of slots 1 and 2
    /// stay empty. Nothing reads them for scoring.
    pub fn history(&self) -> &[Vec<Action>; PLAYER_COUNT] {
        &self.history
    }
}

impl Minigame for Pattern {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn reset(&mut self) {
        let length = 12 + self.rng.random_range(0..4);
        self.goal = (0..length)
            .filter_map(|_| Action::PLAYABLE.choose(&mut self.rng).copied())
            .collect();
        self.points = [0; PLAYER_COUNT];
        self.combo = [0; PLAYER_COUNT];
        self.history = Default::default();
    }

    fn render(&self) -> String {
        self.goal.iter().map(|a| a.letter()).collect()
    }

    fn registers(&self) -> Vec<i32> {
        self.points
            .iter()
            .chain(self.combo.iter())
            .copied()
            .collect()
    }

    fn tick(&mut self, actions: &[Action; PLAYER_COUNT]) -> anyhow::Result<()> {
        let Some(goal) = self.goal.pop_front() else {
            anyhow::bail!("{}: ticked with an empty goal", self.name());
        };

        for (i, &action) in actions.iter().enumerate() {
            if action.is_error() {
                self.dead[i] = true;
                continue;
            }

            if action == goal {
                self.combo[i] += 1;
                self.points[i] += self.combo[i];
            } else {
                self.combo[i] = 0;
            }

            self.history[0].push(action);
        }
        Ok(())
    }

    fn is_over(&self) -> bool {
        self.goal.is_empty()
    }

    fn rankings(&self) -> Rankings {
        let mut scores = [0.0; PLAYER_COUNT];
        for (i, score) in scores.iter_mut().enumerate() {
            *score = if self.dead[i] {
                -1.0
            } else {
                f64::from(self.points[i])
            };
        }
        rank_scores(scores)
    }
}

#[cfg(test)]
mod pattern_tests {
    use rand::SeedableRng;

    use super::*;
    use crate::action::Action::*;

    fn pattern_with(goal: &[Action]) -> Pattern {
        let mut pattern = Pattern::new(StdRng::seed_from_u64(0));
        pattern.reset();
        pattern.goal = goal.iter().copied().collect();
        pattern
    }

    #[test]
    fn reset_draws_goal() {
        let mut pattern = Pattern::new(StdRng::seed_from_u64(21));
        for _ in 0..50 {
            pattern.reset();
            let goal = pattern.render();
            assert!((12..16).contains(&goal.len()));
            assert!(goal.chars().all(|c| "UDLR".contains(c)));
            assert_eq!(pattern.registers(), vec![0; 6]);
        }
    }

    #[test]
    fn combo_scoring() {
        let mut pattern = pattern_with(&[Up, Up, Down, Left]);
        assert_eq!(pattern.render(), "UUDL");

        pattern.tick(&[Up, Up, Left]).unwrap();
        pattern.tick(&[Up, Down, Up]).unwrap();
        pattern.tick(&[Down, Down, Down]).unwrap();
        assert_eq!(pattern.render(), "L");
        // 1 + 2 + 3, 1 + 0 + 1, 0 + 1 + 2
        assert_eq!(pattern.points, [6, 2, 3]);
        assert_eq!(pattern.combo, [3, 1, 2]);

        pattern.tick(&[Right, Left, Left]).unwrap();
        assert!(pattern.is_over());
        assert_eq!(pattern.points, [6, 4, 6]);
        assert_eq!(pattern.combo, [0, 2, 3]);
        assert_eq!(pattern.registers(), vec![6, 4, 6, 0, 2, 3]);
        assert_eq!(pattern.rankings(), [0, 2, 0]);
    }

    #[test]
    fn only_first_history_slot_is_written() {
        let mut pattern = pattern_with(&[Up, Down]);
        pattern.tick(&[Up, Left, Right]).unwrap();
        pattern.tick(&[Error, Down, Down]).unwrap();
        let history = pattern.history();
        assert_eq!(history[0], vec![Up, Left, Right, Down, Down]);
        assert!(history[1].is_empty());
        assert!(history[2].is_empty());
    }

    #[test]
    fn dead_player_ranks_below_zero_points() {
        let mut pattern = pattern_with(&[Up]);
        pattern.tick(&[Error, Left, Up]).unwrap();
        assert_eq!(pattern.rankings(), [2, 1, 0]);
    }

    #[test]
    fn ticking_past_goal_is_an_engine_error() {
        let mut pattern = pattern_with(&[]);
        assert!(pattern.is_over());
        assert!(pattern.tick(&[Up, Up, Up]).is_err());
    }
}
