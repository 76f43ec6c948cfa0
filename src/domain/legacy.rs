//! Best-effort attribution for rows imported from the old order tables.
//!
//! Legacy rows carry a dozen overlapping actor / reason columns and sometimes an
//! embedded status history. Only the import path uses this module; live status
//! updates always stamp the caller's role (see [`super::attribution::stamp`]).

use serde::Serialize;
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::attribution::Attribution;
use crate::entities::{ActorRole, OrderStatus};

const CANCEL_ACTOR_FIELDS: &[&str] = &[
    "cancelled_by",
    "cancel_by",
    "cancelled_by_role",
    "cancelled_by_type",
    "cancelled_by_user",
    "cancel_actor",
];

const REJECT_ACTOR_FIELDS: &[&str] = &[
    "rejected_by",
    "rejected_by_role",
    "rejected_by_user",
];

const GENERIC_ACTOR_FIELDS: &[&str] = &[
    "action_by",
    "action_by_role",
    "status_updated_by",
    "status_updated_by_role",
    "updated_by",
    "last_updated_by",
];

const CANCEL_REASON_FIELDS: &[&str] = &[
    "customer_reason",
    "customer_cancel_reason",
    "cancel_reason",
    "cancellation_reason",
    "status_reason",
    "reason",
    "cancel_note",
];

const REJECT_REASON_FIELDS: &[&str] = &[
    "seller_reason",
    "seller_reject_reason",
    "reject_reason",
    "rejection_reason",
    "status_reason",
    "reason",
    "cancel_reason",
    "reject_note",
];

const PREVIOUS_STATUS_FIELDS: &[&str] = &["previous_status", "prev_status", "last_status"];

const HISTORY_FIELDS: &[&str] = &["status_history", "history", "events", "timeline", "logs"];

const EVENT_STATUS_FIELDS: &[&str] = &[
    "status",
    "new_status",
    "to_status",
    "next_status",
    "event_type",
    "type",
    "action",
];

const EVENT_FROM_FIELDS: &[&str] = &["from_status", "old_status", "previous_status"];

const EVENT_ACTOR_FIELDS: &[&str] = &[
    "actor",
    "acted_by",
    "action_by",
    "updated_by",
    "status_updated_by",
    "cancelled_by",
    "rejected_by",
    "role",
    "user_type",
];

const EVENT_REASON_FIELDS: &[&str] = &[
    "reason",
    "cancel_reason",
    "cancellation_reason",
    "reject_reason",
    "rejection_reason",
    "status_reason",
    "note",
    "comment",
    "message",
    "remarks",
];

const KNOWN_CUSTOMER_REASONS: &[&str] = &[
    "ordered by mistake",
    "found cheaper elsewhere",
    "delivery taking too long",
    "changed my mind",
];

const CUSTOMER_REASON_HINTS: &[&str] = &["mistake", "cheaper", "too long", "change my mind"];

const SELLER_REJECT_MARKERS: &[&str] = &["reject_reason", "rejection_reason", "seller_reason"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegacySource {
    /// An actor column on the row itself
    Explicit,
    /// An actor on the embedded status history
    History,
    /// Inferred from the reason text or which reason column is filled
    Heuristic,
    Unresolved,
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyResolution {
    pub attribution: Attribution,
    pub source: LegacySource,
    pub previous_status: Option<OrderStatus>,
}

/// `cancelledByRole` -> `cancelled_by_role`, `CANCELLED_BY` -> `cancelled_by`
pub fn normalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for ch in key.trim().chars() {
        if ch.is_ascii_uppercase() {
            // 仅在小写或数字之后断词，全大写的列名整体转小写
            if prev.is_some_and(|p| p.is_ascii_lowercase() || p.is_ascii_digit()) {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else if ch == '-' || ch == ' ' {
            out.push('_');
        } else {
            out.push(ch);
        }
        prev = Some(ch);
    }
    out
}

/// Legacy field bag with snake_case keys.
#[derive(Debug, Clone, Default)]
pub struct LegacyFields {
    fields: Map<String, Value>,
}

impl LegacyFields {
    pub fn from_value(value: &Value) -> Self {
        let fields = match value {
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (normalize_key(k), v.clone()))
                .collect(),
            _ => Map::new(),
        };
        Self { fields }
    }

    /// Trimmed, non-empty text of a field. Numbers are rendered as text.
    pub fn text(&self, key: &str) -> Option<String> {
        value_text(self.fields.get(key)?)
    }

    pub fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.text(k))
    }

    /// Embedded history, oldest first. Accepts an array or a JSON string holding one.
    pub fn history(&self) -> Vec<LegacyFields> {
        for key in HISTORY_FIELDS {
            let parsed = match self.fields.get(*key) {
                Some(Value::Array(items)) => Some(items.clone()),
                Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                    Ok(Value::Array(items)) => Some(items),
                    _ => None,
                },
                _ => None,
            };
            if let Some(items) = parsed {
                return items.iter().map(LegacyFields::from_value).collect();
            }
        }
        Vec::new()
    }

    fn event_status(&self) -> Option<OrderStatus> {
        let raw = self.first_text(EVENT_STATUS_FIELDS)?;
        let upper = raw.to_ascii_uppercase();
        if upper.contains("REJECT") {
            return Some(OrderStatus::Rejected);
        }
        if upper.contains("CANCEL") {
            return Some(OrderStatus::Cancelled);
        }
        OrderStatus::from_token(&raw)
    }
}

fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Maps a legacy actor token to a role. Some old rows store the acting user's id
/// instead of a role, which resolves only when it matches the order's customer or seller.
pub fn actor_from_token(raw: &str, customer_id: i64, seller_id: i64) -> Option<ActorRole> {
    let token = raw.trim().to_ascii_uppercase();
    match token.as_str() {
        "CUSTOMER" | "USER" | "BUYER" => Some(ActorRole::Customer),
        "SELLER" | "STORE" | "SHOP" | "VENDOR" | "MERCHANT" => Some(ActorRole::Seller),
        "ADMIN" => Some(ActorRole::Admin),
        _ => match token.parse::<i64>() {
            Ok(id) if id > 0 && id == customer_id => Some(ActorRole::Customer),
            Ok(id) if id > 0 && id == seller_id => Some(ActorRole::Seller),
            _ => None,
        },
    }
}

/// True when the text matches one of the canned customer cancellation reasons or
/// contains one of their loose hints.
pub fn is_customer_cancel_reason(reason: &str) -> bool {
    let r = reason.trim().to_lowercase();
    KNOWN_CUSTOMER_REASONS.iter().any(|k| r.contains(k))
        || CUSTOMER_REASON_HINTS.iter().any(|k| r.contains(k))
}

pub struct LegacyResolver {
    customer_id: i64,
    seller_id: i64,
}

impl LegacyResolver {
    pub fn new(customer_id: i64, seller_id: i64) -> Self {
        Self {
            customer_id,
            seller_id,
        }
    }

    fn actor(&self, raw: Option<String>) -> Option<ActorRole> {
        actor_from_token(&raw?, self.customer_id, self.seller_id)
    }

    fn explicit_actor(&self, status: OrderStatus, fields: &LegacyFields) -> Option<ActorRole> {
        let (own, other) = match status {
            OrderStatus::Rejected => (REJECT_ACTOR_FIELDS, CANCEL_ACTOR_FIELDS),
            _ => (CANCEL_ACTOR_FIELDS, REJECT_ACTOR_FIELDS),
        };
        [own, other, GENERIC_ACTOR_FIELDS]
            .iter()
            .flat_map(|group| group.iter())
            .find_map(|key| self.actor(fields.text(key)))
    }

    fn history_match(
        &self,
        status: OrderStatus,
        history: &[LegacyFields],
    ) -> Option<(Option<ActorRole>, Option<String>, Option<OrderStatus>)> {
        let event = history
            .iter()
            .rev()
            .find(|e| e.event_status() == Some(status))?;
        let actor = self.actor(event.first_text(EVENT_ACTOR_FIELDS));
        let reason = event.first_text(EVENT_REASON_FIELDS);
        let from = event
            .first_text(EVENT_FROM_FIELDS)
            .and_then(|raw| OrderStatus::from_token(&raw));
        Some((actor, reason, from))
    }

    fn heuristic_actor(
        &self,
        status: OrderStatus,
        fields: &LegacyFields,
        reason: Option<&str>,
    ) -> Option<ActorRole> {
        match status {
            OrderStatus::Cancelled => reason
                .filter(|r| is_customer_cancel_reason(r))
                .map(|_| ActorRole::Customer),
            OrderStatus::Rejected => SELLER_REJECT_MARKERS
                .iter()
                .any(|k| fields.text(k).is_some())
                .then_some(ActorRole::Seller),
            _ => None,
        }
    }

    /// Resolution order: actor columns on the row, then the latest matching history
    /// event, then the reason-text heuristic.
    pub fn resolve(&self, status: OrderStatus, bag: &Value) -> LegacyResolution {
        let fields = LegacyFields::from_value(bag);
        let history = fields.history();
        let matched = self.history_match(status, &history);

        let previous_status = fields
            .first_text(PREVIOUS_STATUS_FIELDS)
            .and_then(|raw| OrderStatus::from_token(&raw))
            .or_else(|| matched.as_ref().and_then(|(_, _, from)| *from))
            .filter(|s| !s.is_terminal());

        if !status.is_abandoned() {
            return LegacyResolution {
                attribution: Attribution::default(),
                source: LegacySource::NotApplicable,
                previous_status,
            };
        }

        let reason_fields = match status {
            OrderStatus::Rejected => REJECT_REASON_FIELDS,
            _ => CANCEL_REASON_FIELDS,
        };
        let reason = fields
            .first_text(reason_fields)
            .or_else(|| matched.as_ref().and_then(|(_, r, _)| r.clone()))
            .or_else(|| {
                history
                    .iter()
                    .rev()
                    .find_map(|e| e.first_text(EVENT_REASON_FIELDS))
            });

        let (actor, source) = if let Some(actor) = self.explicit_actor(status, &fields) {
            (Some(actor), LegacySource::Explicit)
        } else if let Some(actor) = matched.as_ref().and_then(|(a, _, _)| *a) {
            (Some(actor), LegacySource::History)
        } else if let Some(actor) = self.heuristic_actor(status, &fields, reason.as_deref()) {
            (Some(actor), LegacySource::Heuristic)
        } else {
            (None, LegacySource::Unresolved)
        };

        LegacyResolution {
            attribution: Attribution { actor, reason },
            source,
            previous_status,
        }
    }
}
