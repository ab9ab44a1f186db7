use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dao::models::{EventId, TeamId},
    dto::{
        bracket::{BracketSummary, BracketView, BracketsQuery},
        public::{EventSummary, EventsQuery, LeaderboardEntry, TeamSummary, TickerResponse},
    },
    error::AppError,
    services::{bracket_service, roster_service, schedule_service},
    state::SharedState,
};

/// Read-only endpoints shown on the family screens.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/teams", get(list_teams))
        .route("/teams/{id}", get(get_team))
        .route("/events", get(list_events))
        .route("/events/ticker", get(get_ticker))
        .route("/leaderboard", get(get_leaderboard))
        .route("/brackets", get(list_brackets))
        .route("/brackets/{event_id}/{game_kind}", get(get_bracket))
}

#[utoipa::path(
    get,
    path = "/teams",
    tag = "public",
    responses((status = 200, description = "Registered teams", body = [TeamSummary]))
)]
/// List teams in registration order.
pub async fn list_teams(
    State(state): State<SharedState>,
) -> Result<Json<Vec<TeamSummary>>, AppError> {
    Ok(Json(roster_service::list_teams(&state).await?))
}

#[utoipa::path(
    get,
    path = "/teams/{id}",
    tag = "public",
    params(("id" = i64, Path, description = "Team identifier")),
    responses(
        (status = 200, description = "Team", body = TeamSummary),
        (status = 404, description = "Unknown team")
    )
)]
pub async fn get_team(
    State(state): State<SharedState>,
    Path(id): Path<TeamId>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(roster_service::get_team(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/events",
    tag = "public",
    params(EventsQuery),
    responses((status = 200, description = "Schedule ordered by day and start time", body = [EventSummary]))
)]
/// List the schedule, optionally for a single day.
pub async fn list_events(
    State(state): State<SharedState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<EventSummary>>, AppError> {
    Ok(Json(schedule_service::list_events(&state, query.day).await?))
}

#[utoipa::path(
    get,
    path = "/events/ticker",
    tag = "public",
    responses((status = 200, description = "Live event and next scheduled event", body = TickerResponse))
)]
pub async fn get_ticker(
    State(state): State<SharedState>,
) -> Result<Json<TickerResponse>, AppError> {
    Ok(Json(schedule_service::ticker(&state).await?))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "public",
    responses((status = 200, description = "Teams ranked by total points", body = [LeaderboardEntry]))
)]
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(roster_service::leaderboard(&state).await?))
}

#[utoipa::path(
    get,
    path = "/brackets",
    tag = "brackets",
    params(BracketsQuery),
    responses((status = 200, description = "Bracket headers", body = [BracketSummary]))
)]
pub async fn list_brackets(
    State(state): State<SharedState>,
    Query(query): Query<BracketsQuery>,
) -> Result<Json<Vec<BracketSummary>>, AppError> {
    Ok(Json(
        bracket_service::list_brackets(&state, query.event_id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/brackets/{event_id}/{game_kind}",
    tag = "brackets",
    params(
        ("event_id" = i64, Path, description = "Event the bracket belongs to"),
        ("game_kind" = String, Path, description = "Game tag, e.g. `cornhole`")
    ),
    responses(
        (status = 200, description = "Bracket grouped by round", body = BracketView),
        (status = 404, description = "No such bracket")
    )
)]
/// Return a whole bracket with resolved team names and round labels.
pub async fn get_bracket(
    State(state): State<SharedState>,
    Path((event_id, game_kind)): Path<(EventId, String)>,
) -> Result<Json<BracketView>, AppError> {
    Ok(Json(
        bracket_service::get_bracket_view(&state, event_id, &game_kind).await?,
    ))
}
