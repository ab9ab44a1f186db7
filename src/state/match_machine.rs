//! Result handling and winner advancement for bracket matches.
//!
//! Every function here works on in-memory entities and returns what has to be written back;
//! persistence and locking belong to the bracket service.

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use super::scoring::{ScoreRule, ScoreVerdict};
use crate::dao::models::{BracketEntity, MatchEntity, Slot, TeamId};

/// Lifecycle of a single match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchState {
    /// No winner and at least one slot still empty.
    Pending,
    /// Both entrants known, waiting for a winning score.
    AwaitingResult,
    /// Winner recorded.
    Resolved,
}

/// Reasons a match operation is refused. None of them leaves a partial write behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvanceError {
    /// Scores were submitted before both entrants were known.
    #[error("match {match_id} does not have both entrants yet")]
    NotReady { match_id: Uuid },
    /// Changing this result would rewrite a match that is already being played.
    #[error("the match following {match_id} has already started")]
    DownstreamStarted { match_id: Uuid },
    /// Swaps only apply to the first round.
    #[error("match {match_id} is not a first-round match")]
    NotFirstRound { match_id: Uuid },
    /// Seeding was frozen by an admin.
    #[error("bracket {bracket_id} is locked")]
    Locked { bracket_id: Uuid },
    #[error("slot {slot:?} of match {match_id} is empty")]
    SlotEmpty { match_id: Uuid, slot: Slot },
    #[error("match {match_id} already has a score")]
    AlreadyScored { match_id: Uuid },
    #[error("match {match_id} is not part of this bracket")]
    UnknownMatch { match_id: Uuid },
    #[error("match {match_id} was given a next match it does not link to")]
    LinkMismatch { match_id: Uuid },
}

impl MatchEntity {
    /// Lifecycle state derived from the entrants and the winner.
    pub fn state(&self) -> MatchState {
        if self.winner.is_some() {
            MatchState::Resolved
        } else if self.slot_a.is_some() && self.slot_b.is_some() {
            MatchState::AwaitingResult
        } else {
            MatchState::Pending
        }
    }

    /// Sole entrant of a first-round match whose other slot is permanently empty.
    pub fn bye_winner(&self) -> Option<TeamId> {
        if self.round_number != 1 {
            return None;
        }
        match (self.slot_a, self.slot_b) {
            (Some(team), None) | (None, Some(team)) => Some(team),
            _ => None,
        }
    }

    /// A match has started once it carries a score or a winner.
    pub fn has_started(&self) -> bool {
        self.winner.is_some() || self.score_a > 0 || self.score_b > 0
    }
}

/// What a score submission produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultOutcome {
    /// Out-of-range input was replaced; the caller has to resubmit.
    Corrected {
        /// Score to resubmit for slot A.
        score_a: u32,
        /// Score to resubmit for slot B.
        score_b: u32,
    },
    /// Scores stored, no winner yet.
    Recorded,
    /// A side reached the target and advances.
    Resolved {
        /// Team that won the match.
        winner: TeamId,
    },
}

/// Writes computed by [`apply_result`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultPlan {
    /// The submitted match with its new scores and winner.
    pub current: MatchEntity,
    /// The next match, present only when one of its slots changes.
    pub downstream: Option<MatchEntity>,
    /// Result reported back to the caller.
    pub outcome: ResultOutcome,
}

/// Apply a submitted score to `current`.
///
/// `next` must be the match `current` links to, if any. A resolved match may be resubmitted
/// while its next match has not started: the same winner leaves the next match untouched,
/// another winner overwrites its slot, undecided scores re-open the match and clear it.
pub fn apply_result(
    current: &MatchEntity,
    next: Option<&MatchEntity>,
    score_a: u32,
    score_b: u32,
    rule: &ScoreRule,
) -> Result<ResultPlan, AdvanceError> {
    let match_id = current.id;
    if current.slot_a.is_none() || current.slot_b.is_none() {
        return Err(AdvanceError::NotReady { match_id });
    }
    if current.next_match_id != next.map(|entity| entity.id) {
        return Err(AdvanceError::LinkMismatch { match_id });
    }
    if current.winner.is_some() && next.is_some_and(MatchEntity::has_started) {
        return Err(AdvanceError::DownstreamStarted { match_id });
    }

    let mut updated = current.clone();
    let outcome = match rule.judge(score_a, score_b) {
        ScoreVerdict::Corrected { score_a, score_b } => {
            updated.score_a = score_a;
            updated.score_b = score_b;
            return Ok(ResultPlan {
                current: updated,
                downstream: None,
                outcome: ResultOutcome::Corrected { score_a, score_b },
            });
        }
        ScoreVerdict::Winner(slot) => {
            let winner = current.entrant(slot);
            updated.winner = winner;
            winner.map_or(ResultOutcome::Recorded, |winner| ResultOutcome::Resolved {
                winner,
            })
        }
        ScoreVerdict::Undecided => {
            updated.winner = None;
            ResultOutcome::Recorded
        }
    };
    updated.score_a = score_a;
    updated.score_b = score_b;

    let downstream = next.and_then(|next| {
        let slot = current.slot_in_next?;
        let occupant = next.entrant(slot);
        let wanted = match updated.winner {
            Some(winner) => Some(winner),
            // Re-opened: only clear what this match put there.
            None if occupant.is_some() && occupant == current.winner => None,
            None => occupant,
        };
        (occupant != wanted).then(|| {
            let mut next = next.clone();
            next.set_entrant(slot, wanted);
            next
        })
    });

    Ok(ResultPlan {
        current: updated,
        downstream,
        outcome,
    })
}

fn index_by_id(matches: &[MatchEntity]) -> HashMap<Uuid, usize> {
    matches
        .iter()
        .enumerate()
        .map(|(index, entity)| (entity.id, index))
        .collect()
}

fn mark(changed: &mut Vec<Uuid>, id: Uuid) {
    if !changed.contains(&id) {
        changed.push(id);
    }
}

/// Write `team` into the slot `matches[from]` feeds, unless it is already there.
fn push_downstream(
    matches: &mut [MatchEntity],
    index: &HashMap<Uuid, usize>,
    from: usize,
    team: TeamId,
    changed: &mut Vec<Uuid>,
) {
    let (Some(next_id), Some(slot)) = (matches[from].next_match_id, matches[from].slot_in_next)
    else {
        return;
    };
    let Some(&next) = index.get(&next_id) else {
        return;
    };
    if matches[next].entrant(slot) != Some(team) {
        matches[next].set_entrant(slot, Some(team));
        mark(changed, next_id);
    }
}

/// Resolve every first-round bye and advance its entrant. Returns the ids of changed matches.
///
/// Byes already resolved for their current entrant are left alone, so running this twice
/// changes nothing the second time.
pub fn auto_advance_byes(matches: &mut [MatchEntity]) -> Vec<Uuid> {
    let index = index_by_id(matches);
    let mut changed = Vec::new();

    for position in 0..matches.len() {
        let Some(team) = matches[position].bye_winner() else {
            continue;
        };
        if matches[position].winner != Some(team) {
            matches[position].winner = Some(team);
            mark(&mut changed, matches[position].id);
        }
        push_downstream(matches, &index, position, team, &mut changed);
    }

    changed
}

/// Re-derive every downstream slot from the recorded winners.
///
/// Repairs a bracket where a winner was stored but never reached its next match.
pub fn resync(matches: &mut [MatchEntity]) -> Vec<Uuid> {
    let index = index_by_id(matches);
    let mut order: Vec<usize> = (0..matches.len()).collect();
    order.sort_by_key(|&position| (matches[position].round_number, matches[position].match_number));

    let mut changed = Vec::new();
    for position in order {
        let entity = &matches[position];
        let Some(winner) = entity.winner else {
            continue;
        };
        if entity.slot_a != Some(winner) && entity.slot_b != Some(winner) {
            continue;
        }
        push_downstream(matches, &index, position, winner, &mut changed);
    }
    changed
}

/// Exchange the entrants of two first-round slots, then re-run bye advancement.
///
/// Both slots must hold a team and neither match may have a score. Returns the ids of
/// every changed match.
pub fn swap_entrants(
    bracket: &BracketEntity,
    matches: &mut [MatchEntity],
    first: (Uuid, Slot),
    second: (Uuid, Slot),
) -> Result<Vec<Uuid>, AdvanceError> {
    if bracket.is_locked {
        return Err(AdvanceError::Locked {
            bracket_id: bracket.id,
        });
    }

    let index = index_by_id(matches);
    let mut picked = [(0usize, Slot::A, 0 as TeamId); 2];
    for (target, (match_id, slot)) in picked.iter_mut().zip([first, second]) {
        let position = *index
            .get(&match_id)
            .ok_or(AdvanceError::UnknownMatch { match_id })?;
        let entity = &matches[position];
        if entity.round_number != 1 {
            return Err(AdvanceError::NotFirstRound { match_id });
        }
        if entity.score_a > 0 || entity.score_b > 0 {
            return Err(AdvanceError::AlreadyScored { match_id });
        }
        let next_started = entity
            .next_match_id
            .and_then(|next| index.get(&next))
            .is_some_and(|&next| matches[next].has_started());
        if next_started {
            return Err(AdvanceError::DownstreamStarted { match_id });
        }
        let team = entity
            .entrant(slot)
            .ok_or(AdvanceError::SlotEmpty { match_id, slot })?;
        *target = (position, slot, team);
    }

    let [(first_pos, first_slot, first_team), (second_pos, second_slot, second_team)] = picked;
    matches[first_pos].set_entrant(first_slot, Some(second_team));
    matches[second_pos].set_entrant(second_slot, Some(first_team));

    let mut changed = vec![matches[first_pos].id];
    mark(&mut changed, matches[second_pos].id);
    for id in auto_advance_byes(matches) {
        mark(&mut changed, id);
    }
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::state::{seeding::seeds_from_standings, tree::generate_bracket};

    fn bracket(locked: bool) -> BracketEntity {
        BracketEntity {
            id: Uuid::new_v4(),
            event_id: 1,
            game_kind: "cornhole".into(),
            is_locked: locked,
            created_by: "admin".into(),
            created_at: SystemTime::now(),
        }
    }

    fn tree(bracket: &BracketEntity, n: i64) -> Vec<MatchEntity> {
        let ids: Vec<i64> = (1..=n).collect();
        generate_bracket(bracket.id, &seeds_from_standings(&ids))
    }

    fn find(matches: &[MatchEntity], round: u32, number: u32) -> &MatchEntity {
        matches
            .iter()
            .find(|m| m.round_number == round && m.match_number == number)
            .unwrap()
    }

    fn next_of<'a>(matches: &'a [MatchEntity], entity: &MatchEntity) -> Option<&'a MatchEntity> {
        entity
            .next_match_id
            .map(|id| matches.iter().find(|m| m.id == id).unwrap())
    }

    #[test]
    fn states_follow_slots_and_winner() {
        let mut entity = MatchEntity::empty(Uuid::new_v4(), 2, 1);
        assert_eq!(entity.state(), MatchState::Pending);
        entity.slot_a = Some(1);
        assert_eq!(entity.state(), MatchState::Pending);
        entity.slot_b = Some(2);
        assert_eq!(entity.state(), MatchState::AwaitingResult);
        entity.winner = Some(2);
        assert_eq!(entity.state(), MatchState::Resolved);
    }

    #[test]
    fn byes_advance_their_entrant() {
        let bracket = bracket(false);
        let mut matches = tree(&bracket, 5);
        let changed = auto_advance_byes(&mut matches);
        assert!(!changed.is_empty());

        let byes: Vec<MatchEntity> = matches
            .iter()
            .filter(|m| m.bye_winner().is_some())
            .cloned()
            .collect();
        assert_eq!(byes.len(), 3);
        for bye in &byes {
            assert_eq!(bye.winner, bye.bye_winner());
            assert_eq!((bye.score_a, bye.score_b), (0, 0));
            let next = next_of(&matches, bye).unwrap();
            assert_eq!(next.entrant(bye.slot_in_next.unwrap()), bye.winner);
        }

        assert!(auto_advance_byes(&mut matches).is_empty());
    }

    #[test]
    fn winning_score_resolves_and_propagates() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let current = find(&matches, 1, 1);
        let next = next_of(&matches, current);

        let plan = apply_result(current, next, 21, 15, &ScoreRule::CORNHOLE).unwrap();
        assert_eq!(plan.outcome, ResultOutcome::Resolved { winner: 1 });
        assert_eq!(plan.current.winner, Some(1));
        let downstream = plan.downstream.unwrap();
        assert_eq!(downstream.entrant(Slot::A), Some(1));
    }

    #[test]
    fn out_of_range_score_is_corrected_without_winner() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let current = find(&matches, 1, 2);
        let plan = apply_result(
            current,
            next_of(&matches, current),
            25,
            10,
            &ScoreRule::CORNHOLE,
        )
        .unwrap();
        assert_eq!(
            plan.outcome,
            ResultOutcome::Corrected {
                score_a: 11,
                score_b: 10
            }
        );
        assert_eq!((plan.current.score_a, plan.current.score_b), (11, 10));
        assert!(plan.current.winner.is_none());
        assert!(plan.downstream.is_none());
    }

    #[test]
    fn non_exact_scores_are_recorded_only() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let current = find(&matches, 1, 1);
        let plan = apply_result(
            current,
            next_of(&matches, current),
            18,
            20,
            &ScoreRule::CORNHOLE,
        )
        .unwrap();
        assert_eq!(plan.outcome, ResultOutcome::Recorded);
        assert_eq!((plan.current.score_a, plan.current.score_b), (18, 20));
        assert!(plan.current.winner.is_none());
        assert!(plan.downstream.is_none());
    }

    #[test]
    fn same_winner_twice_leaves_downstream_untouched() {
        let bracket = bracket(false);
        let mut matches = tree(&bracket, 4);
        let first = {
            let current = find(&matches, 1, 1);
            apply_result(current, next_of(&matches, current), 21, 9, &ScoreRule::CORNHOLE)
                .unwrap()
        };
        let downstream = first.downstream.clone().unwrap();
        for entity in matches.iter_mut() {
            if entity.id == first.current.id {
                *entity = first.current.clone();
            } else if entity.id == downstream.id {
                *entity = downstream.clone();
            }
        }

        let current = find(&matches, 1, 1);
        let again =
            apply_result(current, next_of(&matches, current), 21, 9, &ScoreRule::CORNHOLE)
                .unwrap();
        assert_eq!(again.current, first.current);
        assert!(again.downstream.is_none());
    }

    #[test]
    fn changed_winner_overwrites_and_undecided_clears() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let mut current = find(&matches, 1, 1).clone();
        let mut next = next_of(&matches, &current).unwrap().clone();
        current.score_a = 21;
        current.winner = current.slot_a;
        next.slot_a = current.slot_a;

        let flipped = apply_result(&current, Some(&next), 10, 21, &ScoreRule::CORNHOLE).unwrap();
        assert_eq!(flipped.current.winner, current.slot_b);
        assert_eq!(flipped.downstream.unwrap().slot_a, current.slot_b);

        let reopened = apply_result(&current, Some(&next), 10, 12, &ScoreRule::CORNHOLE).unwrap();
        assert!(reopened.current.winner.is_none());
        assert_eq!(reopened.downstream.unwrap().slot_a, None);
    }

    #[test]
    fn resubmission_after_downstream_started_is_rejected() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let mut current = find(&matches, 1, 1).clone();
        let mut next = next_of(&matches, &current).unwrap().clone();
        current.winner = current.slot_a;
        current.score_a = 21;
        next.slot_a = current.slot_a;
        next.slot_b = Some(2);
        next.score_b = 4;

        let err = apply_result(&current, Some(&next), 3, 21, &ScoreRule::CORNHOLE).unwrap_err();
        assert_eq!(err, AdvanceError::DownstreamStarted { match_id: current.id });
    }

    #[test]
    fn pending_match_rejects_scores() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let semifinal = find(&matches, 2, 1);
        let err = apply_result(semifinal, None, 21, 0, &ScoreRule::CORNHOLE).unwrap_err();
        assert_eq!(err, AdvanceError::NotReady { match_id: semifinal.id });
    }

    #[test]
    fn final_resolves_without_downstream() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 2);
        let final_match = find(&matches, 1, 1);
        let plan = apply_result(final_match, None, 5, 21, &ScoreRule::CORNHOLE).unwrap();
        assert_eq!(plan.outcome, ResultOutcome::Resolved { winner: 2 });
        assert!(plan.downstream.is_none());
    }

    #[test]
    fn wrong_next_match_is_refused() {
        let bracket = bracket(false);
        let matches = tree(&bracket, 4);
        let current = find(&matches, 1, 1);
        let other = find(&matches, 1, 2);
        let err = apply_result(current, Some(other), 21, 0, &ScoreRule::CORNHOLE).unwrap_err();
        assert_eq!(err, AdvanceError::LinkMismatch { match_id: current.id });
    }

    #[test]
    fn locked_bracket_refuses_swaps_without_change() {
        let bracket = bracket(true);
        let mut matches = tree(&bracket, 4);
        let before = matches.clone();
        let first = (find(&matches, 1, 1).id, Slot::A);
        let second = (find(&matches, 1, 2).id, Slot::B);

        let err = swap_entrants(&bracket, &mut matches, first, second).unwrap_err();
        assert_eq!(err, AdvanceError::Locked { bracket_id: bracket.id });
        assert_eq!(matches, before);
    }

    #[test]
    fn swap_exchanges_entrants_only() {
        let bracket = bracket(false);
        let mut matches = tree(&bracket, 4);
        let first = find(&matches, 1, 1).clone();
        let second = find(&matches, 1, 2).clone();

        let changed = swap_entrants(
            &bracket,
            &mut matches,
            (first.id, Slot::A),
            (second.id, Slot::B),
        )
        .unwrap();
        assert_eq!(changed, vec![first.id, second.id]);
        assert_eq!(find(&matches, 1, 1).slot_a, second.slot_b);
        assert_eq!(find(&matches, 1, 2).slot_b, first.slot_a);
        assert!(find(&matches, 1, 1).winner.is_none());
    }

    #[test]
    fn swapping_a_bye_entrant_re_advances() {
        let bracket = bracket(false);
        let mut matches = tree(&bracket, 3);
        auto_advance_byes(&mut matches);
        // Seeds 1, 4, 2, 3 -> match 1 is seed 1 against a bye, match 2 is 2 vs 3.
        let bye = find(&matches, 1, 1).clone();
        let played = find(&matches, 1, 2).clone();
        assert_eq!(bye.winner, Some(1));

        swap_entrants(
            &bracket,
            &mut matches,
            (bye.id, Slot::A),
            (played.id, Slot::A),
        )
        .unwrap();

        let bye = find(&matches, 1, 1);
        assert_eq!(bye.winner, Some(2));
        assert_eq!(find(&matches, 2, 1).slot_a, Some(2));
        assert_eq!(find(&matches, 1, 2).slot_a, Some(1));
    }

    #[test]
    fn swap_rejects_later_rounds_and_scored_matches() {
        let bracket = bracket(false);
        let mut matches = tree(&bracket, 4);
        let semifinal = find(&matches, 2, 1).id;
        let first = find(&matches, 1, 1).id;
        let err =
            swap_entrants(&bracket, &mut matches, (first, Slot::A), (semifinal, Slot::A))
                .unwrap_err();
        assert_eq!(err, AdvanceError::NotFirstRound { match_id: semifinal });

        let second = find(&matches, 1, 2).id;
        matches
            .iter_mut()
            .find(|m| m.id == second)
            .unwrap()
            .score_a = 7;
        let err = swap_entrants(&bracket, &mut matches, (first, Slot::A), (second, Slot::A))
            .unwrap_err();
        assert_eq!(err, AdvanceError::AlreadyScored { match_id: second });
    }

    #[test]
    fn resync_repairs_missing_propagation() {
        let bracket = bracket(false);
        let mut matches = tree(&bracket, 4);
        let first = find(&matches, 1, 1).id;
        let entity = matches.iter_mut().find(|m| m.id == first).unwrap();
        entity.score_a = 21;
        entity.winner = entity.slot_a;

        let changed = resync(&mut matches);
        let semifinal = find(&matches, 2, 1);
        assert_eq!(changed, vec![semifinal.id]);
        assert_eq!(semifinal.slot_a, Some(1));
        assert!(resync(&mut matches).is_empty());
    }
}
