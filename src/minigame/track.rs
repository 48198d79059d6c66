use rand::{rngs::StdRng, seq::SliceRandom};

use super::{ranking::rank_scores, Minigame, Rankings, PLAYER_COUNT};
use crate::action::Action;

const TRACK_LENGTH: i32 = 10;
const RACE_TICKS: i32 = 15;
const COLLISION_RISK: i32 = 2;
const RISK_LIMIT: i32 = 5;
/// Risk value set on a player who crossed [`RISK_LIMIT`]: stunned for 2 ticks.
const STUNNED: i32 = -2;

/// Speed skating on a circular track with a shuffled control legend.
///
/// The legend is a permutation of the four actions, reshuffled after every tick. Picking the
/// action in legend slot 0 moves 1, slots 1 and 2 move 2, slot 3 moves 3. Risk changes by
/// `slot - 1` and never drops below 0 that way. Two players on the same tile modulo 10 each
/// gain 2 risk, and reaching 5 risk stuns for 2 ticks (stored as negative risk).
#[derive(Debug)]
pub struct Track {
    rng: StdRng,
    positions: [i32; PLAYER_COUNT],
    risk: [i32; PLAYER_COUNT],
    dead: [bool; PLAYER_COUNT],
    legend: [Action; 4],
    timer: i32,
}

impl Track {
    /// Create a track drawing its legends from `rng`. Call [`Minigame::reset`] before use.
    pub fn new(rng: StdRng) -> Track {
        Track {
            rng,
            positions: [0; PLAYER_COUNT],
            risk: [0; PLAYER_COUNT],
            dead: [false; PLAYER_COUNT],
            legend: Action::PLAYABLE,
            timer: 0,
        }
    }

    /// Current control legend, slot 0 first.
    pub fn legend(&self) -> [Action; 4] {
        self.legend
    }

    fn legend_slot(&self, action: Action) -> anyhow::Result<i32> {
        self.legend
            .iter()
            .position(|&a| a == action)
            .map(|slot| slot as i32)
            .ok_or_else(|| super::unexpected_action(self.name(), action))
    }

    fn apply_collisions(&mut self) {
        for i in 0..PLAYER_COUNT {
            if self.risk[i] < 0 {
                continue;
            }
            let lane = self.positions[i] % TRACK_LENGTH;
            let clash = (0..PLAYER_COUNT)
                .filter(|&k| k != i)
                .any(|k| self.positions[k] % TRACK_LENGTH == lane);
            if clash {
                self.risk[i] += COLLISION_RISK;
            }
            if self.risk[i] >= RISK_LIMIT {
                self.risk[i] = STUNNED;
            }
        }
    }
}

impl Minigame for Track {
    fn name(&self) -> &'static str {
        "track"
    }

    fn reset(&mut self) {
        self.positions = [0; PLAYER_COUNT];
        self.risk = [0; PLAYER_COUNT];
        self.legend.shuffle(&mut self.rng);
        self.timer = RACE_TICKS;
    }

    fn render(&self) -> String {
        self.legend.iter().map(|a| a.letter()).collect()
    }

    fn registers(&self) -> Vec<i32> {
        let mut registers = Vec::with_capacity(2 * PLAYER_COUNT + 1);
        registers.extend_from_slice(&self.positions);
        registers.extend_from_slice(&self.risk);
        registers.push(self.timer);
        registers
    }

    fn tick(&mut self, actions: &[Action; PLAYER_COUNT]) -> anyhow::Result<()> {
        for (i, &action) in actions.iter().enumerate() {
            if action.is_error() {
                self.dead[i] = true;
                continue;
            }
            if self.risk[i] < 0 {
                self.risk[i] += 1;
                continue;
            }

            let slot = self.legend_slot(action)?;
            let distance = match slot {
                0 => 1,
                3 => 3,
                _ => 2,
            };
            self.positions[i] += distance;
            self.risk[i] = (self.risk[i] + slot - 1).max(0);
        }

        self.apply_collisions();

        self.legend.shuffle(&mut self.rng);
        self.timer -= 1;
        Ok(())
    }

    fn is_over(&self) -> bool {
        self.timer <= 0
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

#[cfg(test)]
mod track_tests {
    use rand::SeedableRng;

    use super::*;

    fn track(seed: u64) -> Track {
        let mut track = Track::new(StdRng::seed_from_u64(seed));
        track.reset();
        track
    }

    /// Actions sitting in the given legend slots this tick.
    fn pick(track: &Track, slots: [usize; PLAYER_COUNT]) -> [Action; PLAYER_COUNT] {
        slots.map(|slot| track.legend()[slot])
    }

    #[test]
    fn reset_state() {
        let track = track(1);
        assert_eq!(track.timer, RACE_TICKS);
        let mut letters: Vec<char> = track.render().chars().collect();
        letters.sort_unstable();
        assert_eq!(letters, ['D', 'L', 'R', 'U']);
        assert_eq!(track.registers(), vec![0, 0, 0, 0, 0, 0, 15]);
    }

    #[test]
    fn distance_and_risk_follow_legend_slot() {
        let mut track = track(2);
        // positions 1, 2, 3 never collide
        let actions = pick(&track, [0, 1, 3]);
        track.tick(&actions).unwrap();
        assert_eq!(track.positions, [1, 2, 3]);
        assert_eq!(track.risk, [0, 0, 2]);
        assert_eq!(track.timer, RACE_TICKS - 1);
    }

    #[test]
    fn collision_adds_risk_to_both() {
        let mut track = track(3);
        // slot 1 and slot 2 both move 2; slot 2 also costs 1 risk
        let actions = pick(&track, [1, 2, 0]);
        track.tick(&actions).unwrap();
        assert_eq!(track.positions, [2, 2, 1]);
        assert_eq!(track.risk, [2, 3, 0]);
    }

    #[test]
    fn collision_is_modulo_track_length() {
        let mut track = track(4);
        track.positions = [7, 17, 3];
        let actions = pick(&track, [1, 1, 0]);
        track.tick(&actions).unwrap();
        // 9 and 19 share tile 9
        assert_eq!(track.positions, [9, 19, 4]);
        assert_eq!(track.risk, [2, 2, 0]);

        track.positions = [8, 0, 4];
        track.risk = [0; PLAYER_COUNT];
        let actions = pick(&track, [1, 0, 3]);
        track.tick(&actions).unwrap();
        // 10, 1 and 7 are distinct tiles
        assert_eq!(track.positions, [10, 1, 7]);
        assert_eq!(track.risk, [0, 0, 2]);
    }

    #[test]
    fn high_risk_stuns_then_recovers() {
        let mut track = track(5);
        track.positions = [0, 25, 40];
        track.risk = [3, 0, 0];
        // slot 3 adds 2 risk: 3 + 2 = 5 stuns
        let actions = pick(&track, [3, 0, 1]);
        track.tick(&actions).unwrap();
        assert_eq!(track.positions, [3, 26, 42]);
        assert_eq!(track.risk[0], STUNNED);

        // stunned: risk climbs back, no movement
        let actions = pick(&track, [3, 0, 1]);
        track.tick(&actions).unwrap();
        assert_eq!(track.positions[0], 3);
        assert_eq!(track.risk[0], -1);
        let actions = pick(&track, [3, 0, 1]);
        track.tick(&actions).unwrap();
        assert_eq!(track.positions[0], 3);
        assert_eq!(track.risk[0], 0);
        let actions = pick(&track, [3, 0, 1]);
        track.tick(&actions).unwrap();
        assert_eq!(track.positions[0], 6);
        assert_eq!(track.risk[0], 2);
    }

    #[test]
    fn legend_slot_zero_lowers_risk_but_not_below_zero() {
        let mut track = track(6);
        track.positions = [0, 23, 46];
        track.risk = [2, 0, 0];
        let actions = pick(&track, [0, 0, 0]);
        track.tick(&actions).unwrap();
        assert_eq!(track.risk, [1, 0, 0]);
    }

    #[test]
    fn ends_after_fifteen_ticks_and_ranks_dead_last() {
        let mut track = track(7);
        let mut ticks = 0;
        while !track.is_over() {
            let actions = [Action::Error, track.legend()[3], track.legend()[0]];
            track.tick(&actions).unwrap();
            ticks += 1;
        }
        assert_eq!(ticks, RACE_TICKS);
        assert_eq!(track.rankings()[0], 2);
    }

    #[test]
    fn dead_and_stunned_players_still_block_tiles() {
        let mut with_dead = track(6);
        with_dead.positions = [4, 2, 0];
        let live = pick(&with_dead, [0, 1, 0]);
        with_dead.tick(&[Action::Error, live[1], live[2]]).unwrap();
        // the dead player stays on tile 4, where player 1 lands
        assert_eq!(with_dead.positions, [4, 4, 1]);
        assert_eq!(with_dead.risk[1], 2);
        assert_eq!(with_dead.risk[2], 0);

        let mut with_stunned = track(7);
        with_stunned.positions = [4, 2, 0];
        with_stunned.risk = [-2, 0, 0];
        let actions = pick(&with_stunned, [0, 1, 0]);
        with_stunned.tick(&actions).unwrap();
        // stunned player 0 does not move and gains nothing
        assert_eq!(with_stunned.positions, [4, 4, 1]);
        assert_eq!(with_stunned.risk, [-1, 2, 0]);
    }
}
