use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the festival bracket backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::public::list_teams,
        crate::routes::public::get_team,
        crate::routes::public::list_events,
        crate::routes::public::get_ticker,
        crate::routes::public::get_leaderboard,
        crate::routes::public::list_brackets,
        crate::routes::public::get_bracket,
        crate::routes::admin::unlock,
        crate::routes::admin::logout,
        crate::routes::admin::create_team,
        crate::routes::admin::create_event,
        crate::routes::admin::set_event_status,
        crate::routes::admin::award_score,
        crate::routes::admin::generate_bracket,
        crate::routes::admin::set_bracket_lock,
        crate::routes::admin::advance_byes,
        crate::routes::admin::resync_bracket,
        crate::routes::admin::submit_match_score,
        crate::routes::admin::swap_entrants,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::public::TeamSummary,
            crate::dto::public::EventSummary,
            crate::dto::public::TickerResponse,
            crate::dto::public::LeaderboardEntry,
            crate::dto::public::ScoreSummary,
            crate::dto::bracket::BracketSummary,
            crate::dto::bracket::BracketView,
            crate::dto::bracket::RoundView,
            crate::dto::bracket::MatchView,
            crate::dto::bracket::MatchStateView,
            crate::dto::bracket::EntrantView,
            crate::dto::bracket::SeedView,
            crate::dto::admin::UnlockRequest,
            crate::dto::admin::UnlockResponse,
            crate::dto::admin::CreateTeamRequest,
            crate::dto::admin::CreateEventRequest,
            crate::dto::admin::EventStatusRequest,
            crate::dto::admin::AwardScoreRequest,
            crate::dto::admin::StandingsOrderKind,
            crate::dto::admin::GenerateBracketRequest,
            crate::dto::admin::BracketLockRequest,
            crate::dto::admin::MatchScoreRequest,
            crate::dto::admin::SlotRef,
            crate::dto::admin::SwapEntrantsRequest,
            crate::dto::admin::ScoreSubmission,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::BracketUpdatedEvent,
            crate::dto::sse::MatchUpdatedEvent,
            crate::dto::sse::EventStatusEvent,
            crate::dto::sse::ScoreAwardedEvent,
            crate::dao::models::TeamColor,
            crate::dao::models::EventKind,
            crate::dao::models::EventStatus,
            crate::dao::models::Slot,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Teams, schedule and leaderboard"),
        (name = "brackets", description = "Bracket reads and admin bracket operations"),
        (name = "admin", description = "Admin session and festival management"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_bracket_routes() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/brackets/{event_id}/{game_kind}"));
        assert!(paths.contains_key("/admin/matches/{id}/score"));
        assert!(paths.contains_key("/healthcheck"));
    }
}
