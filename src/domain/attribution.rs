use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::entities::{ActorRole, OrderStatus, order_entity, order_event_entity};

/// Who ended an order early, and why.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct Attribution {
    pub actor: Option<ActorRole>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributionError {
    #[error("reason must not be empty")]
    EmptyReason,

    #[error("no event explains the terminal status of order {order_id}")]
    Unresolvable { order_id: i64 },
}

/// Where a read-side attribution came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttributionSource {
    /// Denormalized columns on the order row
    Stored,
    /// Reconstructed from the order's events
    EventLog,
    /// Terminal order with no explaining event
    Unresolved,
    /// The order is not REJECTED / CANCELLED
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttribution {
    pub attribution: Attribution,
    pub source: AttributionSource,
}

impl ResolvedAttribution {
    pub fn is_resolved(&self) -> bool {
        self.source != AttributionSource::Unresolved
    }
}

/// Write-time attribution. The actor is always the authenticated caller's role,
/// never something read out of the reason text.
pub fn stamp(role: ActorRole, reason: &str) -> Result<Attribution, AttributionError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AttributionError::EmptyReason);
    }
    Ok(Attribution {
        actor: Some(role),
        reason: Some(reason.to_string()),
    })
}

/// Most recent event whose `to_status` equals `status`.
///
/// Ordering is `(occurred_at, id)` so the answer does not depend on the order the
/// rows were fetched in.
pub fn latest_event_into<'a>(
    status: OrderStatus,
    events: &'a [order_event_entity::Model],
) -> Option<&'a order_event_entity::Model> {
    events
        .iter()
        .filter(|e| e.to_status == status)
        .max_by_key(|e| (e.occurred_at, e.id))
}

/// Read-time reconstruction from the event log.
///
/// Non-abandoned orders have no attribution. For REJECTED / CANCELLED the latest
/// matching event supplies actor and reason; without one (or with an actor-less
/// legacy event) the result is [`AttributionError::Unresolvable`]. Nothing is guessed.
pub fn reconstruct(
    order_id: i64,
    status: OrderStatus,
    events: &[order_event_entity::Model],
) -> Result<Attribution, AttributionError> {
    if !status.is_abandoned() {
        return Ok(Attribution::default());
    }
    match latest_event_into(status, events) {
        Some(event) if event.actor.is_some() => Ok(Attribution {
            actor: event.actor,
            reason: event.reason.clone(),
        }),
        _ => Err(AttributionError::Unresolvable { order_id }),
    }
}

/// Attribution shown on read projections: the cached columns when present,
/// otherwise the event log, otherwise an explicit unresolved marker.
pub fn resolve(
    order: &order_entity::Model,
    events: &[order_event_entity::Model],
) -> ResolvedAttribution {
    if !order.status.is_abandoned() {
        return ResolvedAttribution {
            attribution: Attribution::default(),
            source: AttributionSource::NotApplicable,
        };
    }

    if order.attribution_actor.is_some() {
        return ResolvedAttribution {
            attribution: Attribution {
                actor: order.attribution_actor,
                reason: order.attribution_reason.clone(),
            },
            source: AttributionSource::Stored,
        };
    }

    match reconstruct(order.id, order.status, events) {
        Ok(attribution) => ResolvedAttribution {
            attribution,
            source: AttributionSource::EventLog,
        },
        Err(_) => {
            log::warn!(
                "Order {} is {} but no event explains who ended it",
                order.id,
                order.status
            );
            // 原因仍可展示，执行人保持未知
            ResolvedAttribution {
                attribution: Attribution {
                    actor: None,
                    reason: order.attribution_reason.clone(),
                },
                source: AttributionSource::Unresolved,
            }
        }
    }
}
