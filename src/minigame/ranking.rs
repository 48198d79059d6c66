//! Tie-aware ranking shared by every event.

use super::{Rankings, PLAYER_COUNT};

/// Standard competition ranking, descending by score.
///
/// Entries are sorted best first and walked with a running counter that advances once per
/// entry. An entry scoring exactly like the previous one takes the previous entry's rank,
/// otherwise it takes the counter. A two-way tie at the top therefore gives `[0, 0, 2]`.
pub fn rank_scores(scores: [f64; PLAYER_COUNT]) -> Rankings {
    let mut sorted: Vec<(usize, f64)> = scores.into_iter().enumerate().collect();
    // stable: equal scores keep slot order
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut rankings = [0; PLAYER_COUNT];
    let mut last: Option<(usize, f64)> = None;
    for (rank, (player, score)) in sorted.into_iter().enumerate() {
        let current = match last {
            Some((last_rank, last_score)) if last_score == score => last_rank,
            _ => rank,
        };
        rankings[player] = current;
        last = Some((current, score));
    }
    rankings
}

#[cfg(test)]
mod ranking_tests {
    use super::*;

    #[test]
    fn two_way_tie_on_top_skips_second() {
        assert_eq!(rank_scores([10.0, 10.0, 5.0]), [0, 0, 2]);
    }

    #[test]
    fn three_way_tie() {
        assert_eq!(rank_scores([5.0, 5.0, 5.0]), [0, 0, 0]);
    }

    #[test]
    fn strict_order() {
        assert_eq!(rank_scores([9.0, 5.0, 1.0]), [0, 1, 2]);
        assert_eq!(rank_scores([1.0, 5.0, 9.0]), [2, 1, 0]);
    }

    #[test]
    fn tie_for_last() {
        assert_eq!(rank_scores([3.0, -1.0, -1.0]), [0, 1, 1]);
    }

    #[test]
    fn negative_sentinels_rank_last() {
        assert_eq!(rank_scores([-999_999.0, -50.0, 0.0]), [2, 1, 0]);
    }
}
