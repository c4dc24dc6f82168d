use storage::models::{Event, PointScale};
use storage::store::EventStore;

use crate::error::{Result, ScoringError};

/// Resolves the point scale an event is scored with: the event's explicit
/// override when present, otherwise the default scale for its format.
///
/// A failure here is a per-event configuration error; callers record it
/// and move on to the next event.
pub async fn resolve_scale(store: &dyn EventStore, event: &Event) -> Result<PointScale> {
    if let Some(scale_id) = event.scale_id {
        if let Some(scale) = store.find_scale(scale_id).await? {
            return Ok(scale);
        }
    }

    if let Some(scale) = store.default_scale_for_format(event.format).await? {
        return Ok(scale);
    }

    Err(ScoringError::ScaleNotFound {
        event_id: event.event_id,
    })
}
