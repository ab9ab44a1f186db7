use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, Request, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{post, put},
};
use axum_valid::Valid;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dao::models::EventId,
    dto::{
        admin::{
            AwardScoreRequest, BracketLockRequest, CreateEventRequest, CreateTeamRequest,
            EventStatusRequest, GenerateBracketRequest, MatchScoreRequest, ScoreSubmission,
            SwapEntrantsRequest, UnlockRequest, UnlockResponse,
        },
        bracket::{BracketSummary, BracketView},
        public::{EventSummary, ScoreSummary, TeamSummary},
    },
    error::AppError,
    services::{bracket_service, roster_service, schedule_service},
    state::SharedState,
};

const ADMIN_KEY_HEADER: &str = "x-admin-key";
const ADMIN_COOKIE: &str = "fest_admin";
/// Twelve hours.
const ADMIN_COOKIE_MAX_AGE: u32 = 43_200;
const CREATED_BY: &str = "admin";

/// Admin-only management endpoints. Every route requires the admin key.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/teams", post(create_team))
        .route("/admin/events", post(create_event))
        .route("/admin/events/{id}/status", put(set_event_status))
        .route("/admin/scores", post(award_score))
        .route("/admin/brackets", post(generate_bracket))
        .route("/admin/brackets/{id}/lock", put(set_bracket_lock))
        .route("/admin/brackets/{id}/byes", post(advance_byes))
        .route("/admin/brackets/{id}/resync", post(resync_bracket))
        .route("/admin/matches/{id}/score", post(submit_match_score))
        .route("/admin/matches/swap", post(swap_entrants))
        .route_layer(middleware::from_fn_with_state(state, require_admin_key))
}

/// Routes exchanging the admin key for a cookie, reachable without one.
pub fn session_router() -> Router<SharedState> {
    Router::new()
        .route("/admin/unlock", post(unlock))
        .route("/admin/logout", post(logout))
}

/// Value of the `fest_admin` cookie, if the request carries one.
fn cookie_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ADMIN_COOKIE)
        .map(|(_, value)| value)
}

/// Admin key presented by the caller: the header wins over the cookie.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(ADMIN_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .or_else(|| cookie_key(headers))
}

fn check_key(expected: Option<&str>, provided: Option<&str>) -> Result<(), AppError> {
    match (expected, provided) {
        (None, _) => Err(AppError::Unauthorized(
            "admin access is disabled: no ADMIN_KEY configured".into(),
        )),
        (Some(_), None) => Err(AppError::Unauthorized(
            "missing admin key header `X-Admin-Key` or `fest_admin` cookie".into(),
        )),
        (Some(expected), Some(provided)) if expected == provided => Ok(()),
        (Some(_), Some(_)) => Err(AppError::Unauthorized("invalid admin key".into())),
    }
}

async fn require_admin_key(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    check_key(state.admin_key(), presented_key(req.headers()))?;
    Ok(next.run(req).await)
}

fn admin_cookie(value: &str, max_age: u32) -> String {
    format!("{ADMIN_COOKIE}={value}; HttpOnly; Path=/; Max-Age={max_age}; SameSite=Lax")
}

/// Exchange the admin key for an HTTP-only session cookie.
#[utoipa::path(
    post,
    path = "/admin/unlock",
    tag = "admin",
    request_body = UnlockRequest,
    responses(
        (status = 200, description = "Key accepted; `fest_admin` cookie set", body = UnlockResponse),
        (status = 401, description = "Wrong key or admin access disabled")
    )
)]
pub async fn unlock(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<UnlockRequest>>,
) -> Result<Response, AppError> {
    if let Err(err) = check_key(state.admin_key(), Some(payload.key.as_str())) {
        warn!("rejected admin unlock attempt");
        return Err(err);
    }
    info!("admin session unlocked");
    Ok((
        [(
            header::SET_COOKIE,
            admin_cookie(&payload.key, ADMIN_COOKIE_MAX_AGE),
        )],
        Json(UnlockResponse { unlocked: true }),
    )
        .into_response())
}

/// Drop the admin session cookie.
#[utoipa::path(
    post,
    path = "/admin/logout",
    tag = "admin",
    responses((status = 204, description = "Cookie cleared"))
)]
pub async fn logout() -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, admin_cookie("", 0))],
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/admin/teams",
    tag = "admin",
    params(("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie")),
    request_body = CreateTeamRequest,
    responses((status = 200, description = "Team created", body = TeamSummary))
)]
pub async fn create_team(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateTeamRequest>>,
) -> Result<Json<TeamSummary>, AppError> {
    Ok(Json(roster_service::create_team(&state, payload).await?))
}

#[utoipa::path(
    post,
    path = "/admin/events",
    tag = "admin",
    params(("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie")),
    request_body = CreateEventRequest,
    responses((status = 200, description = "Event scheduled", body = EventSummary))
)]
pub async fn create_event(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateEventRequest>>,
) -> Result<Json<EventSummary>, AppError> {
    Ok(Json(schedule_service::create_event(&state, payload).await?))
}

/// Change the live status of an event; going live demotes the previous live event.
#[utoipa::path(
    put,
    path = "/admin/events/{id}/status",
    tag = "admin",
    params(
        ("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie"),
        ("id" = i64, Path, description = "Event identifier")
    ),
    request_body = EventStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = EventSummary),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn set_event_status(
    State(state): State<SharedState>,
    Path(id): Path<EventId>,
    Json(payload): Json<EventStatusRequest>,
) -> Result<Json<EventSummary>, AppError> {
    Ok(Json(
        schedule_service::set_event_status(&state, id, payload.status).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/scores",
    tag = "admin",
    params(("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie")),
    request_body = AwardScoreRequest,
    responses(
        (status = 200, description = "Points recorded", body = ScoreSummary),
        (status = 404, description = "Unknown event or team")
    )
)]
pub async fn award_score(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<AwardScoreRequest>>,
) -> Result<Json<ScoreSummary>, AppError> {
    Ok(Json(roster_service::award_score(&state, payload).await?))
}

/// Seed teams into a new bracket for an event and game kind.
#[utoipa::path(
    post,
    path = "/admin/brackets",
    tag = "brackets",
    params(("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie")),
    request_body = GenerateBracketRequest,
    responses(
        (status = 200, description = "Bracket generated, byes advanced", body = BracketView),
        (status = 404, description = "Unknown event"),
        (status = 409, description = "A bracket already exists for this event and game kind")
    )
)]
pub async fn generate_bracket(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<GenerateBracketRequest>>,
) -> Result<Json<BracketView>, AppError> {
    Ok(Json(
        bracket_service::generate_bracket(&state, payload, CREATED_BY).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/admin/brackets/{id}/lock",
    tag = "brackets",
    params(
        ("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie"),
        ("id" = Uuid, Path, description = "Bracket identifier")
    ),
    request_body = BracketLockRequest,
    responses((status = 200, description = "Lock updated", body = BracketSummary))
)]
pub async fn set_bracket_lock(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BracketLockRequest>,
) -> Result<Json<BracketSummary>, AppError> {
    Ok(Json(
        bracket_service::set_bracket_lock(&state, id, payload.locked).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/admin/brackets/{id}/byes",
    tag = "brackets",
    params(
        ("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie"),
        ("id" = Uuid, Path, description = "Bracket identifier")
    ),
    responses((status = 200, description = "Byes advanced", body = BracketView))
)]
pub async fn advance_byes(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BracketView>, AppError> {
    Ok(Json(bracket_service::auto_advance_byes(&state, id).await?))
}

/// Rewrite downstream slots from recorded winners after an interrupted update.
#[utoipa::path(
    post,
    path = "/admin/brackets/{id}/resync",
    tag = "brackets",
    params(
        ("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie"),
        ("id" = Uuid, Path, description = "Bracket identifier")
    ),
    responses((status = 200, description = "Bracket repaired", body = BracketView))
)]
pub async fn resync_bracket(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BracketView>, AppError> {
    Ok(Json(bracket_service::resync_bracket(&state, id).await?))
}

/// Submit the scores of a match. Out-of-range scores come back corrected and must be
/// submitted again.
#[utoipa::path(
    post,
    path = "/admin/matches/{id}/score",
    tag = "brackets",
    params(
        ("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie"),
        ("id" = Uuid, Path, description = "Match identifier")
    ),
    request_body = MatchScoreRequest,
    responses(
        (status = 200, description = "Submission outcome", body = ScoreSubmission),
        (status = 409, description = "Match not ready or next match already started"),
        (status = 404, description = "Unknown match")
    )
)]
pub async fn submit_match_score(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Valid(Json(payload)): Valid<Json<MatchScoreRequest>>,
) -> Result<Json<ScoreSubmission>, AppError> {
    Ok(Json(
        bracket_service::submit_match_score(&state, id, payload.score_a, payload.score_b).await?,
    ))
}

/// Exchange two first-round entrants of an unlocked bracket.
#[utoipa::path(
    post,
    path = "/admin/matches/swap",
    tag = "brackets",
    params(("X-Admin-Key" = String, Header, description = "Admin key, or the `fest_admin` cookie")),
    request_body = SwapEntrantsRequest,
    responses(
        (status = 200, description = "Entrants swapped", body = BracketView),
        (status = 409, description = "Bracket locked, match scored or not in round one")
    )
)]
pub async fn swap_entrants(
    State(state): State<SharedState>,
    Json(payload): Json<SwapEntrantsRequest>,
) -> Result<Json<BracketView>, AppError> {
    Ok(Json(
        bracket_service::swap_first_round_entrants(&state, payload).await?,
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn header_is_preferred_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; fest_admin=from-cookie"),
        );
        assert_eq!(presented_key(&headers), Some("from-cookie"));

        headers.insert(ADMIN_KEY_HEADER, HeaderValue::from_static("from-header"));
        assert_eq!(presented_key(&headers), Some("from-header"));
    }

    #[test]
    fn key_checks() {
        assert!(check_key(Some("s3cret"), Some("s3cret")).is_ok());
        assert!(matches!(
            check_key(Some("s3cret"), Some("nope")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_key(Some("s3cret"), None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            check_key(None, Some("anything")),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn logout_cookie_expires_immediately() {
        assert_eq!(
            admin_cookie("", 0),
            "fest_admin=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax"
        );
    }
}
