use rand::{rngs::StdRng, Rng};

use super::{ranking::rank_scores, unexpected_action, Minigame, Rankings, PLAYER_COUNT};
use crate::action::Action;

const MAP_LENGTH: usize = 30;
const HURDLE: u8 = b'#';
const STUN_TICKS: i32 = 2;

/// Hurdle race on a fixed 30 tile map.
///
/// `LEFT` moves 1, `DOWN` 2, `RIGHT` 3 and `UP` jumps 2 (the first tile of a jump ignores
/// hurdles). Landing on a hurdle without jumping stuns for 2 ticks and stops the move.
#[derive(Debug)]
pub struct Race {
    rng: StdRng,
    map: String,
    positions: [i32; PLAYER_COUNT],
    stun_timers: [i32; PLAYER_COUNT],
    dead: [bool; PLAYER_COUNT],
    /// finish rank per player, `None` while running
    finished: [Option<usize>; PLAYER_COUNT],
    finish_counter: usize,
}

impl Race {
    /// Create a race drawing its maps from `rng`. Call [`Minigame::reset`] before use.
    pub fn new(rng: StdRng) -> Race {
        Race {
            rng,
            map: String::new(),
            positions: [0; PLAYER_COUNT],
            stun_timers: [0; PLAYER_COUNT],
            dead: [false; PLAYER_COUNT],
            finished: [None; PLAYER_COUNT],
            finish_counter: 0,
        }
    }

    fn generate_map(&mut self) -> String {
        let start_stretch = 3 + self.rng.random_range(0..5);
        let hurdles = 3 + self.rng.random_range(0..4);

        let mut map = ".".repeat(start_stretch);
        for _ in 0..hurdles {
            map.push_str("#...");
            if self.rng.random_bool(0.5) {
                map.push('.');
            }
        }
        while map.len() < MAP_LENGTH {
            map.push('.');
        }
        // the last tile is always clear
        map.truncate(MAP_LENGTH - 1);
        map.push('.');
        map
    }

    /// Order in which players reached the last tile, shared ranks for simultaneous finishes.
    ///
    /// Not used by [`Minigame::rankings`], which ranks by raw position.
    pub fn finish_ranks(&self) -> [Option<usize>; PLAYER_COUNT] {
        self.finished
    }

    fn last_tile(&self) -> i32 {
        self.map.len() as i32 - 1
    }

    fn is_hurdle(&self, position: i32) -> bool {
        self.map.as_bytes().get(position as usize) == Some(&HURDLE)
    }
}

impl Minigame for Race {
    fn name(&self) -> &'static str {
        "race"
    }

    fn reset(&mut self) {
        self.positions = [0; PLAYER_COUNT];
        self.stun_timers = [0; PLAYER_COUNT];
        self.finished = [None; PLAYER_COUNT];
        self.finish_counter = 0;
        self.map = self.generate_map();
    }

    fn render(&self) -> String {
        self.map.clone()
    }

    fn registers(&self) -> Vec<i32> {
        self.positions
            .iter()
            .chain(self.stun_timers.iter())
            .copied()
            .collect()
    }

    fn tick(&mut self, actions: &[Action; PLAYER_COUNT]) -> anyhow::Result<()> {
        let max_x = self.last_tile();
        let mut finishes = 0;

        for (i, &action) in actions.iter().enumerate() {
            if action.is_error() {
                self.dead[i] = true;
                continue;
            }
            if self.stun_timers[i] > 0 {
                self.stun_timers[i] -= 1;
                continue;
            }
            if self.finished[i].is_some() {
                continue;
            }

            let (move_by, mut jump) = match action {
                Action::Left => (1, false),
                Action::Down => (2, false),
                Action::Right => (3, false),
                Action::Up => (2, true),
                Action::Error => return Err(unexpected_action(self.name(), action)),
            };

            for _ in 0..move_by {
                self.positions[i] = max_x.min(self.positions[i] + 1);
                if self.is_hurdle(self.positions[i]) && !jump {
                    self.stun_timers[i] = STUN_TICKS;
                    break;
                }
                if self.positions[i] == max_x && self.finished[i].is_none() {
                    self.finished[i] = Some(self.finish_counter);
                    finishes += 1;
                    break;
                }
                jump = false;
            }
        }
        self.finish_counter += finishes;
        Ok(())
    }

    fn is_over(&self) -> bool {
        if self.finished.iter().any(Option::is_some) {
            return true;
        }
        let out = (0..PLAYER_COUNT)
            .filter(|&i| self.finished[i].is_some() || self.dead[i])
            .count();
        out >= 2
    }

    fn rankings(&self) -> Rankings {
        let mut scores = [0.0; PLAYER_COUNT];
        for (i, score) in scores.iter_mut().enumerate() {
            *score = if self.dead[i] {
                -1.0
            } else {
                f64::from(self.positions[i])
            };
        }
        rank_scores(scores)
    }
}
