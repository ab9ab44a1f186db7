//! Seeding and first-round pairing of a single-elimination bracket.

use crate::dao::models::TeamId;

/// A team together with the seed it was given when the bracket was generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    pub team_id: TeamId,
    /// 1-based rank, 1 being the strongest.
    pub seed: u32,
}

/// One first-round pairing. A side is `None` when the slot is a bye.
pub type Pair = (Option<Seed>, Option<Seed>);

/// Smallest power of two greater than or equal to `n`, `1` for `n <= 1`.
pub fn next_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Seed number occupying each slot of a bracket of `size` slots.
///
/// Every seed `x` of the half-size order is followed by its mirror `size + 1 - x`, so the
/// two best seeds land in opposite halves and each first-round pair sums to `size + 1`.
pub fn seed_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    let mut width = 1;
    while width < size {
        width *= 2;
        order = order.iter().flat_map(|&x| [x, width + 1 - x]).collect();
    }
    order
}

/// Assign seeds `1..=n` in the given order.
pub fn seeds_from_standings(team_ids: &[TeamId]) -> Vec<Seed> {
    team_ids
        .iter()
        .zip(1u32..)
        .map(|(&team_id, seed)| Seed { team_id, seed })
        .collect()
}

/// Place seeds into the canonical slot order and pair consecutive slots.
///
/// Returns `max(2, next_power_of_two(n)) / 2` pairs; an empty input yields no pairs.
pub fn build_first_round_pairs(seeds: &[Seed]) -> Vec<Pair> {
    if seeds.is_empty() {
        return Vec::new();
    }

    let mut sorted = seeds.to_vec();
    sorted.sort_by_key(|seed| seed.seed);

    let size = next_power_of_two(sorted.len()).max(2);
    let slots: Vec<Option<Seed>> = seed_order(size)
        .into_iter()
        .map(|rank| sorted.get(rank - 1).copied())
        .collect();

    slots
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn seeds(n: usize) -> Vec<Seed> {
        let ids: Vec<TeamId> = (1..=n as TeamId).map(|id| id * 10).collect();
        seeds_from_standings(&ids)
    }

    #[test]
    fn next_power_of_two_handles_small_counts() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(5), 8);
        assert_eq!(next_power_of_two(16), 16);
    }

    #[test]
    fn seed_order_mirrors_each_half() {
        assert_eq!(seed_order(2), vec![1, 2]);
        assert_eq!(seed_order(4), vec![1, 4, 2, 3]);
        assert_eq!(seed_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn every_entrant_is_placed_once_with_at_most_one_bye_per_pair() {
        for n in 1..=33 {
            let input = seeds(n);
            let pairs = build_first_round_pairs(&input);
            assert_eq!(pairs.len(), next_power_of_two(n).max(2) / 2, "n = {n}");

            let mut seen = HashSet::new();
            for (a, b) in &pairs {
                assert!(a.is_some() || b.is_some(), "n = {n} produced an empty pair");
                for seed in [a, b].into_iter().flatten() {
                    assert!(seen.insert(seed.team_id), "n = {n} placed a team twice");
                }
            }
            assert_eq!(seen.len(), n);
        }
    }

    #[test]
    fn eight_entrants_have_no_byes_and_split_top_seeds() {
        let pairs = build_first_round_pairs(&seeds(8));
        assert!(pairs.iter().all(|(a, b)| a.is_some() && b.is_some()));

        let half_of = |rank: u32| {
            pairs
                .iter()
                .position(|(a, b)| [a, b].into_iter().flatten().any(|s| s.seed == rank))
                .map(|index| index < pairs.len() / 2)
        };
        assert_ne!(half_of(1), half_of(2));
    }

    #[test]
    fn five_entrants_leave_three_byes() {
        let pairs = build_first_round_pairs(&seeds(5));
        assert_eq!(pairs.len(), 4);
        let byes = pairs
            .iter()
            .filter(|(a, b)| a.is_none() || b.is_none())
            .count();
        assert_eq!(byes, 3);

        // The bye goes to the top seeds.
        let (first, second) = pairs[0];
        assert_eq!(first.map(|s| s.seed), Some(1));
        assert!(second.is_none());
    }

    #[test]
    fn single_entrant_gets_a_bye_pair() {
        let pairs = build_first_round_pairs(&seeds(1));
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].0.map(|s| s.team_id), Some(10));
        assert!(pairs[0].1.is_none());
    }

    #[test]
    fn no_entrants_no_pairs() {
        assert!(build_first_round_pairs(&[]).is_empty());
    }

    #[test]
    fn unsorted_input_is_placed_by_seed() {
        let mut input = seeds(4);
        input.reverse();
        let pairs = build_first_round_pairs(&input);
        let ranks: Vec<_> = pairs
            .iter()
            .map(|(a, b)| (a.map(|s| s.seed), b.map(|s| s.seed)))
            .collect();
        assert_eq!(ranks, vec![(Some(1), Some(4)), (Some(2), Some(3))]);
    }
}
