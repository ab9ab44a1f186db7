use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Admin request and response payloads.
pub mod admin;
/// Bracket presentation models.
pub mod bracket;
pub mod health;
/// Public read models (teams, schedule, leaderboard).
pub mod public;
/// Server-sent event payloads.
pub mod sse;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
