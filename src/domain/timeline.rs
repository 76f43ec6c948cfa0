use serde::{Serialize, Serializer};
use utoipa::ToSchema;

use super::attribution::{Attribution, latest_event_into};
use crate::entities::{OrderStatus, order_event_entity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Done,
    Active,
    Upcoming,
    /// Not reached because the order was rejected / cancelled earlier
    Crossed,
    /// The extra REJECTED / CANCELLED row
    Terminal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TimelineRow {
    pub step: OrderStatus,
    pub label: String,
    pub state: StepState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn step_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Placed => "PLACED",
        OrderStatus::Confirmed => "CONFIRMED",
        OrderStatus::Packed => "PACKED",
        OrderStatus::OutForDelivery => "OUT FOR DELIVERY",
        OrderStatus::Delivered => "DELIVERED",
        OrderStatus::Rejected => "REJECTED",
        OrderStatus::Cancelled => "CANCELLED",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TerminalStep {
    status: OrderStatus,
    label: String,
    reason: Option<String>,
}

/// Progress view of one order over the fixed main chain.
///
/// Rows are produced on demand by [`Timeline::rows`]; the projection itself only
/// stores where the flow stopped, so iterating twice yields the same rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    status: OrderStatus,
    /// Index of the active step; `None` when every step is done
    stop_index: Option<usize>,
    stop_defaulted: bool,
    terminal: Option<TerminalStep>,
}

impl Timeline {
    /// Never fails: a rejected / cancelled order without a usable `previous_status`
    /// is drawn as stopped at the first step.
    pub fn project(
        status: OrderStatus,
        previous_status: Option<OrderStatus>,
        attribution: &Attribution,
    ) -> Self {
        if status == OrderStatus::Delivered {
            return Self {
                status,
                stop_index: None,
                stop_defaulted: false,
                terminal: None,
            };
        }

        if !status.is_abandoned() {
            return Self {
                status,
                stop_index: status.chain_rank(),
                stop_defaulted: false,
                terminal: None,
            };
        }

        let rank = previous_status
            .filter(|s| !s.is_terminal())
            .and_then(|s| s.chain_rank());
        let actor = attribution
            .actor
            .map(|a| a.as_str())
            .unwrap_or("unknown");

        Self {
            status,
            stop_index: Some(rank.unwrap_or(0)),
            stop_defaulted: rank.is_none(),
            terminal: Some(TerminalStep {
                status,
                label: format!("{} by {}", step_label(status), actor),
                reason: attribution.reason.clone(),
            }),
        }
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn stop_index(&self) -> Option<usize> {
        self.stop_index
    }

    /// True when the stop point had to be assumed.
    pub fn stop_defaulted(&self) -> bool {
        self.stop_defaulted
    }

    pub fn rows(&self) -> Rows<'_> {
        Rows {
            timeline: self,
            next: 0,
        }
    }

    fn state_at(&self, index: usize) -> StepState {
        let Some(stop) = self.stop_index else {
            return StepState::Done;
        };
        match index.cmp(&stop) {
            std::cmp::Ordering::Less => StepState::Done,
            std::cmp::Ordering::Equal => StepState::Active,
            std::cmp::Ordering::Greater if self.terminal.is_some() => StepState::Crossed,
            std::cmp::Ordering::Greater => StepState::Upcoming,
        }
    }

    fn len(&self) -> usize {
        OrderStatus::MAIN_CHAIN.len() + usize::from(self.terminal.is_some())
    }
}

pub struct Rows<'a> {
    timeline: &'a Timeline,
    next: usize,
}

impl Iterator for Rows<'_> {
    type Item = TimelineRow;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next;
        let row = match OrderStatus::MAIN_CHAIN.get(index) {
            Some(step) => TimelineRow {
                step: *step,
                label: step_label(*step).to_string(),
                state: self.timeline.state_at(index),
                reason: None,
            },
            None if index == OrderStatus::MAIN_CHAIN.len() => {
                let terminal = self.timeline.terminal.as_ref()?;
                TimelineRow {
                    step: terminal.status,
                    label: terminal.label.clone(),
                    state: StepState::Terminal,
                    reason: terminal.reason.clone(),
                }
            }
            None => return None,
        };
        self.next += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.timeline.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl ExactSizeIterator for Rows<'_> {}

impl<'a> IntoIterator for &'a Timeline {
    type Item = TimelineRow;
    type IntoIter = Rows<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows()
    }
}

impl Serialize for Timeline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rows())
    }
}

/// Stop point recovered from the event that moved the order into its terminal
/// status, for rows written before `previous_status` existed.
pub fn previous_status_from_events(
    status: OrderStatus,
    events: &[order_event_entity::Model],
) -> Option<OrderStatus> {
    if !status.is_terminal() {
        return None;
    }
    latest_event_into(status, events)
        .and_then(|e| e.from_status)
        .filter(|s| !s.is_terminal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ActorRole;
    use OrderStatus::*;

    fn states(t: &Timeline) -> Vec<StepState> {
        t.rows().map(|r| r.state).collect()
    }

    #[test]
    fn test_in_flight_order() {
        let t = Timeline::project(Packed, None, &Attribution::default());
        assert_eq!(
            states(&t),
            vec![
                StepState::Done,
                StepState::Done,
                StepState::Active,
                StepState::Upcoming,
                StepState::Upcoming
            ]
        );
        assert_eq!(t.rows().nth(3).unwrap().label, "OUT FOR DELIVERY");
    }

    #[test]
    fn test_delivered_is_all_done() {
        let t = Timeline::project(Delivered, Some(OutForDelivery), &Attribution::default());
        assert_eq!(t.rows().len(), 5);
        assert!(t.rows().all(|r| r.state == StepState::Done));
    }

    #[test]
    fn test_customer_cancel_at_placed() {
        let attribution = Attribution {
            actor: Some(ActorRole::Customer),
            reason: Some("Changed my mind".to_string()),
        };
        let t = Timeline::project(Cancelled, Some(Placed), &attribution);
        let rows: Vec<_> = t.rows().collect();
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0].state, StepState::Active);
        assert!(rows[1..5].iter().all(|r| r.state == StepState::Crossed));
        assert_eq!(rows[5].state, StepState::Terminal);
        assert_eq!(rows[5].label, "CANCELLED by CUSTOMER");
        assert_eq!(rows[5].reason.as_deref(), Some("Changed my mind"));
        assert!(!t.stop_defaulted());
    }

    #[test]
    fn test_seller_reject_at_confirmed() {
        let attribution = Attribution {
            actor: Some(ActorRole::Seller),
            reason: Some("Out of stock".to_string()),
        };
        let t = Timeline::project(Rejected, Some(Confirmed), &attribution);
        assert_eq!(
            states(&t),
            vec![
                StepState::Done,
                StepState::Active,
                StepState::Crossed,
                StepState::Crossed,
                StepState::Crossed,
                StepState::Terminal
            ]
        );
    }

    #[test]
    fn test_missing_previous_status_defaults_to_first_step() {
        let t = Timeline::project(Cancelled, None, &Attribution::default());
        assert_eq!(t.stop_index(), Some(0));
        assert!(t.stop_defaulted());
        let last = t.rows().last().unwrap();
        assert_eq!(last.label, "CANCELLED by unknown");
        assert_eq!(last.reason, None);
    }

    #[test]
    fn test_rows_are_restartable() {
        let t = Timeline::project(OutForDelivery, None, &Attribution::default());
        let first: Vec<_> = t.rows().collect();
        let second: Vec<_> = (&t).into_iter().collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_serializes_as_row_list() {
        let t = Timeline::project(Confirmed, None, &Attribution::default());
        let value = serde_json::to_value(&t).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 5);
        assert_eq!(value[1]["state"], "active");
        assert_eq!(value[2]["state"], "upcoming");
    }
}
