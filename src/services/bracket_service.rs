//! Bracket lifecycle: generation, score submission, bye advancement, swaps and repair.
//!
//! Every read-modify-write on a bracket runs under [`AppState::lock_bracket`]. Match rows
//! are persisted round-descending so a downstream slot is always written before the
//! winner that feeds it.

use std::{cmp::Reverse, sync::Arc, time::SystemTime};

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::{
        fest_store::FestStore,
        models::{BracketEntity, EventId, MatchEntity, SeedEntity},
    },
    dto::{
        admin::{GenerateBracketRequest, ScoreSubmission, SwapEntrantsRequest},
        bracket::{BracketSummary, BracketView},
    },
    error::ServiceError,
    services::{roster_service, sse_events},
    state::{
        AppState,
        match_machine::{self, apply_result},
        seeding::seeds_from_standings,
        tree,
    },
};

async fn load_bracket(
    store: &Arc<dyn FestStore>,
    bracket_id: Uuid,
) -> Result<BracketEntity, ServiceError> {
    store
        .find_bracket(bracket_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("bracket `{bracket_id}`")))
}

async fn load_match(
    store: &Arc<dyn FestStore>,
    match_id: Uuid,
) -> Result<MatchEntity, ServiceError> {
    store
        .find_match(match_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("match `{match_id}`")))
}

/// Persist the matches whose ids are in `changed`, later rounds first.
async fn persist_changed(
    store: &Arc<dyn FestStore>,
    matches: &[MatchEntity],
    changed: &[Uuid],
) -> Result<Vec<MatchEntity>, ServiceError> {
    let mut dirty: Vec<MatchEntity> = matches
        .iter()
        .filter(|entity| changed.contains(&entity.id))
        .cloned()
        .collect();
    dirty.sort_by_key(|entity| Reverse((entity.round_number, entity.match_number)));

    for entity in &dirty {
        store.save_match(entity.clone()).await?;
    }
    Ok(dirty)
}

async fn build_view(
    state: &AppState,
    store: &Arc<dyn FestStore>,
    bracket: &BracketEntity,
) -> Result<BracketView, ServiceError> {
    let seeds = store.list_seeds(bracket.id).await?;
    let matches = store.list_matches(bracket.id).await?;
    let teams = roster_service::team_directory(state).await?;
    Ok(BracketView::build(bracket, &seeds, &matches, &teams))
}

/// Seed the teams of an event into a new bracket and build its whole tree.
///
/// Byes are advanced before anything is written. The bracket row goes in last, so an
/// interrupted generation leaves no bracket behind and can simply be retried.
pub async fn generate_bracket(
    state: &AppState,
    request: GenerateBracketRequest,
    created_by: &str,
) -> Result<BracketView, ServiceError> {
    let game_kind = request.game_kind.trim().to_lowercase();
    let _generation = state.lock_generation().await;
    let store = state.require_store().await?;

    let event = store
        .find_event(request.event_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("event `{}`", request.event_id)))?;
    if store
        .find_bracket_for(event.id, game_kind.clone())
        .await?
        .is_some()
    {
        return Err(ServiceError::Conflict(format!(
            "event `{}` already has a `{game_kind}` bracket",
            event.id
        )));
    }

    let standings = roster_service::standings(state, request.order, request.team_ids).await?;
    if standings.is_empty() {
        return Err(ServiceError::InvalidInput("no teams to seed".into()));
    }

    let bracket = BracketEntity {
        id: Uuid::new_v4(),
        event_id: event.id,
        game_kind,
        is_locked: false,
        created_by: created_by.to_owned(),
        created_at: SystemTime::now(),
    };
    let seeds = seeds_from_standings(&standings);
    let mut matches = tree::generate_bracket(bracket.id, &seeds);
    let advanced = match_machine::auto_advance_byes(&mut matches);

    store.insert_matches(matches.clone()).await?;
    store
        .save_seeds(
            seeds
                .iter()
                .map(|seed| SeedEntity {
                    bracket_id: bracket.id,
                    team_id: seed.team_id,
                    seed: seed.seed,
                })
                .collect(),
        )
        .await?;
    store.save_bracket(bracket.clone()).await?;

    info!(
        bracket_id = %bracket.id,
        event_id = bracket.event_id,
        game_kind = %bracket.game_kind,
        teams = seeds.len(),
        matches = matches.len(),
        byes = advanced.len(),
        "bracket generated"
    );
    sse_events::broadcast_bracket_updated(state, &bracket);
    sse_events::broadcast_matches_updated(state, &matches);

    build_view(state, &store, &bracket).await
}

/// Resolve and advance every first-round bye of a bracket. Safe to repeat.
pub async fn auto_advance_byes(
    state: &AppState,
    bracket_id: Uuid,
) -> Result<BracketView, ServiceError> {
    let _gate = state.lock_bracket(bracket_id).await;
    let store = state.require_store().await?;
    let bracket = load_bracket(&store, bracket_id).await?;

    let mut matches = store.list_matches(bracket_id).await?;
    let changed = match_machine::auto_advance_byes(&mut matches);
    let written = persist_changed(&store, &matches, &changed).await?;

    debug!(bracket_id = %bracket_id, changed = written.len(), "byes advanced");
    sse_events::broadcast_matches_updated(state, &written);
    build_view(state, &store, &bracket).await
}

/// Re-derive every downstream slot from the recorded winners.
pub async fn resync_bracket(
    state: &AppState,
    bracket_id: Uuid,
) -> Result<BracketView, ServiceError> {
    let _gate = state.lock_bracket(bracket_id).await;
    let store = state.require_store().await?;
    let bracket = load_bracket(&store, bracket_id).await?;

    let mut matches = store.list_matches(bracket_id).await?;
    let changed = match_machine::resync(&mut matches);
    let written = persist_changed(&store, &matches, &changed).await?;

    info!(bracket_id = %bracket_id, repaired = written.len(), "bracket resynced");
    sse_events::broadcast_matches_updated(state, &written);
    build_view(state, &store, &bracket).await
}

/// Record the scores of a match and advance its winner.
pub async fn submit_match_score(
    state: &AppState,
    match_id: Uuid,
    score_a: u32,
    score_b: u32,
) -> Result<ScoreSubmission, ServiceError> {
    let store = state.require_store().await?;
    let bracket_id = load_match(&store, match_id).await?.bracket_id;

    let _gate = state.lock_bracket(bracket_id).await;
    let current = load_match(&store, match_id).await?;
    let bracket = load_bracket(&store, bracket_id).await?;
    let next = match current.next_match_id {
        Some(next_id) => Some(store.find_match(next_id).await?.ok_or_else(|| {
            ServiceError::InvalidState(format!(
                "match `{match_id}` links to missing match `{next_id}`"
            ))
        })?),
        None => None,
    };

    let rule = state.config().score_rule(&bracket.game_kind);
    let plan = apply_result(&current, next.as_ref(), score_a, score_b, &rule)?;

    let mut written = Vec::with_capacity(2);
    if let Some(downstream) = plan.downstream {
        store.save_match(downstream.clone()).await?;
        written.push(downstream);
    }
    if plan.current != current {
        store.save_match(plan.current.clone()).await?;
        written.push(plan.current);
    }

    info!(
        bracket_id = %bracket_id,
        match_id = %match_id,
        score_a,
        score_b,
        outcome = ?plan.outcome,
        "match score submitted"
    );
    sse_events::broadcast_matches_updated(state, &written);
    Ok(ScoreSubmission::from_outcome(plan.outcome, score_a, score_b))
}

/// Exchange two first-round entrants of the same unlocked bracket.
pub async fn swap_first_round_entrants(
    state: &AppState,
    request: SwapEntrantsRequest,
) -> Result<BracketView, ServiceError> {
    let store = state.require_store().await?;
    let first = load_match(&store, request.first.match_id).await?;
    let second = load_match(&store, request.second.match_id).await?;
    if first.bracket_id != second.bracket_id {
        return Err(ServiceError::InvalidInput(
            "both matches must belong to the same bracket".into(),
        ));
    }
    let bracket_id = first.bracket_id;

    let _gate = state.lock_bracket(bracket_id).await;
    let bracket = load_bracket(&store, bracket_id).await?;
    let mut matches = store.list_matches(bracket_id).await?;
    let changed = match_machine::swap_entrants(
        &bracket,
        &mut matches,
        (request.first.match_id, request.first.slot),
        (request.second.match_id, request.second.slot),
    )?;
    let written = persist_changed(&store, &matches, &changed).await?;

    info!(
        bracket_id = %bracket_id,
        first = %request.first.match_id,
        second = %request.second.match_id,
        "first-round entrants swapped"
    );
    sse_events::broadcast_matches_updated(state, &written);
    build_view(state, &store, &bracket).await
}

/// Lock or unlock first-round rearrangement.
pub async fn set_bracket_lock(
    state: &AppState,
    bracket_id: Uuid,
    locked: bool,
) -> Result<BracketSummary, ServiceError> {
    let _gate = state.lock_bracket(bracket_id).await;
    let store = state.require_store().await?;
    let mut bracket = load_bracket(&store, bracket_id).await?;

    if bracket.is_locked != locked {
        bracket.is_locked = locked;
        store.save_bracket(bracket.clone()).await?;
        info!(bracket_id = %bracket_id, locked, "bracket lock changed");
        sse_events::broadcast_bracket_updated(state, &bracket);
    }
    Ok(BracketSummary::from(&bracket))
}

pub async fn get_bracket_view(
    state: &AppState,
    event_id: EventId,
    game_kind: &str,
) -> Result<BracketView, ServiceError> {
    let store = state.require_store().await?;
    let game_kind = game_kind.trim().to_lowercase();
    let bracket = store
        .find_bracket_for(event_id, game_kind.clone())
        .await?
        .ok_or_else(|| {
            ServiceError::NotFound(format!("no `{game_kind}` bracket for event `{event_id}`"))
        })?;
    build_view(state, &store, &bracket).await
}

pub async fn list_brackets(
    state: &AppState,
    event_id: Option<EventId>,
) -> Result<Vec<BracketSummary>, ServiceError> {
    let store = state.require_store().await?;
    let brackets = store.list_brackets(event_id).await?;
    Ok(brackets.iter().map(BracketSummary::from).collect())
}

