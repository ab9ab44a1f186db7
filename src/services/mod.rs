/// Bracket generation, score submission, swaps and repair.
pub mod bracket_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Teams, awarded points, leaderboard and seeding standings.
pub mod roster_service;
/// Festival schedule and live ticker.
pub mod schedule_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor with reconnect backoff.
pub mod storage_supervisor;
