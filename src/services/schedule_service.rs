//! Festival schedule and the live ticker.

use tracing::{debug, info};

use crate::{
    dao::models::{EventEntity, EventId, EventStatus, NewEventEntity},
    dto::{
        admin::CreateEventRequest,
        public::{EventSummary, TickerResponse},
    },
    error::ServiceError,
    services::sse_events,
    state::AppState,
};

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub async fn create_event(
    state: &AppState,
    request: CreateEventRequest,
) -> Result<EventSummary, ServiceError> {
    let start_time = trimmed(request.start_time);
    let end_time = trimmed(request.end_time);
    if let (Some(start), Some(end)) = (&start_time, &end_time) {
        if end < start {
            return Err(ServiceError::InvalidInput(format!(
                "event ends ({end}) before it starts ({start})"
            )));
        }
    }

    let store = state.require_store().await?;
    let event = store
        .create_event(NewEventEntity {
            title: request.title.trim().to_owned(),
            day: request.day,
            start_time,
            end_time,
            location: trimmed(request.location),
            kind: request.kind,
            base_points: request.base_points,
        })
        .await?;
    info!(event_id = event.id, title = %event.title, day = %event.day, "event created");
    Ok(event.into())
}

/// Schedule order: day, then start time (untimed events first), then id.
fn sort_schedule(events: &mut [EventEntity]) {
    events.sort_by(|a, b| {
        (&a.day, &a.start_time, a.id).cmp(&(&b.day, &b.start_time, b.id))
    });
}

pub async fn list_events(
    state: &AppState,
    day: Option<String>,
) -> Result<Vec<EventSummary>, ServiceError> {
    let store = state.require_store().await?;
    let mut events = store.list_events().await?;
    if let Some(day) = day.as_deref() {
        events.retain(|event| event.day == day);
    }
    sort_schedule(&mut events);
    Ok(events.into_iter().map(Into::into).collect())
}

/// Change the live status of an event. At most one event is live: going live demotes the
/// previous live event back to scheduled.
pub async fn set_event_status(
    state: &AppState,
    event_id: EventId,
    status: EventStatus,
) -> Result<EventSummary, ServiceError> {
    let store = state.require_store().await?;
    let _gate = state.lock_event_status().await;
    let events = store.list_events().await?;
    let mut event = events
        .iter()
        .find(|event| event.id == event_id)
        .cloned()
        .ok_or_else(|| ServiceError::NotFound(format!("event `{event_id}`")))?;

    if status == EventStatus::Live {
        for other in events
            .into_iter()
            .filter(|other| other.id != event_id && other.status == EventStatus::Live)
        {
            let demoted = EventEntity {
                status: EventStatus::Scheduled,
                ..other
            };
            store.save_event(demoted.clone()).await?;
            debug!(event_id = demoted.id, "live event demoted");
            sse_events::broadcast_event_status(state, &demoted);
        }
    }

    event.status = status;
    store.save_event(event.clone()).await?;
    info!(event_id, status = ?status, "event status changed");
    sse_events::broadcast_event_status(state, &event);
    Ok(event.into())
}

/// The live event and the next scheduled one.
pub fn ticker_from(mut events: Vec<EventEntity>) -> TickerResponse {
    sort_schedule(&mut events);
    let live = events
        .iter()
        .find(|event| event.status == EventStatus::Live)
        .cloned();
    let next = events
        .into_iter()
        .find(|event| event.status == EventStatus::Scheduled);
    TickerResponse {
        live: live.map(Into::into),
        next: next.map(Into::into),
    }
}

pub async fn ticker(state: &AppState) -> Result<TickerResponse, ServiceError> {
    let store = state.require_store().await?;
    let events = store.list_events().await?;
    Ok(ticker_from(events))
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;
    use crate::dao::models::EventKind;

    fn event(id: EventId, day: &str, start: Option<&str>, status: EventStatus) -> EventEntity {
        EventEntity {
            id,
            title: format!("event {id}"),
            day: day.into(),
            start_time: start.map(Into::into),
            end_time: None,
            location: None,
            kind: EventKind::Game,
            base_points: 5,
            status,
            created_at: SystemTime::now(),
        }
    }

    #[test]
    fn ticker_picks_live_and_earliest_scheduled() {
        let events = vec![
            event(1, "2025-10-05", Some("09:00"), EventStatus::Scheduled),
            event(2, "2025-10-04", Some("18:00"), EventStatus::Scheduled),
            event(3, "2025-10-04", Some("10:00"), EventStatus::Finished),
            event(4, "2025-10-04", Some("12:00"), EventStatus::Live),
        ];
        let ticker = ticker_from(events);
        assert_eq!(ticker.live.map(|event| event.id), Some(4));
        assert_eq!(ticker.next.map(|event| event.id), Some(2));
    }

    #[test]
    fn ticker_is_empty_without_events() {
        let ticker = ticker_from(Vec::new());
        assert!(ticker.live.is_none());
        assert!(ticker.next.is_none());
    }

    #[test]
    fn schedule_sorts_by_day_then_time() {
        let mut events = vec![
            event(1, "2025-10-04", Some("14:00"), EventStatus::Scheduled),
            event(2, "2025-10-03", Some("20:00"), EventStatus::Scheduled),
            event(3, "2025-10-04", Some("09:30"), EventStatus::Scheduled),
        ];
        sort_schedule(&mut events);
        let ids: Vec<_> = events.iter().map(|event| event.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }
}
