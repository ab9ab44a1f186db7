//! Expansion of first-round pairs into the full tree of matches.

use uuid::Uuid;

use super::seeding::{Seed, build_first_round_pairs};
use crate::dao::models::{MatchEntity, Slot};

/// Position in the next round fed by match `match_number` (1-based) and the slot it fills.
///
/// Matches `2k - 1` and `2k` feed match `k` through slots A and B.
pub fn parent_position(match_number: u32) -> (u32, Slot) {
    let slot = if match_number % 2 == 1 { Slot::A } else { Slot::B };
    (match_number.div_ceil(2), slot)
}

/// Build every match of a bracket, round by round, with all links wired.
///
/// Round 1 holds the seeded pairs, later rounds start empty. Matches are returned ordered by
/// round then match number. Bye advancement is left to the caller.
pub fn generate_bracket(bracket_id: Uuid, seeds: &[Seed]) -> Vec<MatchEntity> {
    let pairs = build_first_round_pairs(seeds);
    if pairs.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<MatchEntity> = pairs
        .iter()
        .zip(1u32..)
        .map(|((a, b), match_number)| {
            let mut entity = MatchEntity::empty(bracket_id, 1, match_number);
            entity.slot_a = a.map(|seed| seed.team_id);
            entity.slot_b = b.map(|seed| seed.team_id);
            entity
        })
        .collect();

    let mut round_start = 0;
    let mut round_len = matches.len();
    let mut round_number = 1;

    while round_len > 1 {
        let next_round: Vec<MatchEntity> = (1..=(round_len / 2) as u32)
            .map(|match_number| MatchEntity::empty(bracket_id, round_number + 1, match_number))
            .collect();

        for child in &mut matches[round_start..round_start + round_len] {
            let (parent, slot) = parent_position(child.match_number);
            child.next_match_id = Some(next_round[(parent - 1) as usize].id);
            child.slot_in_next = Some(slot);
        }

        round_start += round_len;
        round_len = next_round.len();
        round_number += 1;
        matches.extend(next_round);
    }

    matches
}

/// Number of rounds of a bracket whose first round has `first_round_matches` matches.
pub fn round_count(first_round_matches: usize) -> u32 {
    if first_round_matches == 0 {
        0
    } else {
        first_round_matches.ilog2() + 1
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::state::seeding::seeds_from_standings;

    fn build(n: i64) -> Vec<MatchEntity> {
        let ids: Vec<i64> = (1..=n).collect();
        generate_bracket(Uuid::new_v4(), &seeds_from_standings(&ids))
    }

    #[test]
    fn parent_position_alternates_slots() {
        assert_eq!(parent_position(1), (1, Slot::A));
        assert_eq!(parent_position(2), (1, Slot::B));
        assert_eq!(parent_position(3), (2, Slot::A));
        assert_eq!(parent_position(4), (2, Slot::B));
    }

    #[test]
    fn rounds_halve_down_to_a_single_final() {
        let matches = build(8);
        let mut per_round: HashMap<u32, usize> = HashMap::new();
        for entity in &matches {
            *per_round.entry(entity.round_number).or_default() += 1;
        }
        assert_eq!(per_round.len(), 3);
        assert_eq!(per_round[&1], 4);
        assert_eq!(per_round[&2], 2);
        assert_eq!(per_round[&3], 1);
        assert_eq!(round_count(4), 3);
    }

    #[test]
    fn every_non_final_match_links_into_the_next_round() {
        let matches = build(13);
        let by_id: HashMap<Uuid, &MatchEntity> =
            matches.iter().map(|entity| (entity.id, entity)).collect();
        let last_round = matches.iter().map(|m| m.round_number).max().unwrap();

        for entity in &matches {
            if entity.round_number == last_round {
                assert!(entity.next_match_id.is_none());
                assert!(entity.slot_in_next.is_none());
                continue;
            }
            let next = by_id[&entity.next_match_id.unwrap()];
            assert_eq!(next.round_number, entity.round_number + 1);
            let expected = parent_position(entity.match_number);
            assert_eq!((next.match_number, entity.slot_in_next.unwrap()), expected);
        }
    }

    #[test]
    fn each_later_match_is_fed_by_one_a_and_one_b() {
        let matches = build(16);
        let mut feeds: HashMap<Uuid, Vec<Slot>> = HashMap::new();
        for entity in &matches {
            if let (Some(next), Some(slot)) = (entity.next_match_id, entity.slot_in_next) {
                feeds.entry(next).or_default().push(slot);
            }
        }
        assert_eq!(feeds.len(), 7);
        for slots in feeds.values() {
            assert_eq!(slots.len(), 2);
            assert!(slots.contains(&Slot::A) && slots.contains(&Slot::B));
        }
    }

    #[test]
    fn later_rounds_start_empty() {
        let matches = build(6);
        for entity in matches.iter().filter(|m| m.round_number > 1) {
            assert!(entity.slot_a.is_none() && entity.slot_b.is_none());
            assert!(entity.winner.is_none());
        }
    }

    #[test]
    fn single_entrant_builds_only_a_final() {
        let matches = build(1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].slot_a, Some(1));
        assert!(matches[0].next_match_id.is_none());
    }

    #[test]
    fn zero_entrants_build_nothing() {
        assert!(build(0).is_empty());
        assert_eq!(round_count(0), 0);
    }
}
