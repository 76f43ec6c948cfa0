use thiserror::Error;

use crate::entities::{ActorRole, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order is already {0}")]
    Absorbing(OrderStatus),

    #[error("cannot move order from {from} to {to}")]
    Illegal { from: OrderStatus, to: OrderStatus },

    #[error("a reason is required to mark an order {0}")]
    MissingReason(OrderStatus),
}

/// A validated status change, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    /// Trimmed, never empty. Always present when `to` is REJECTED / CANCELLED.
    pub reason: Option<String>,
}

impl Transition {
    /// The status to remember as `previous_status`, set on every terminal transition.
    pub fn previous_status(&self) -> Option<OrderStatus> {
        self.to.is_terminal().then_some(self.from)
    }
}

/// Checks the status graph only.
///
/// Moves along the main chain must strictly increase the rank (skipping ahead is
/// allowed, repeating or going back is not). REJECTED / CANCELLED are reachable from
/// any non-terminal status. Nothing leaves a terminal status.
pub fn validate_transition(
    current: OrderStatus,
    requested: OrderStatus,
) -> Result<(), TransitionError> {
    if current.is_terminal() {
        return Err(TransitionError::Absorbing(current));
    }
    if requested.is_abandoned() {
        return Ok(());
    }
    match (current.chain_rank(), requested.chain_rank()) {
        (Some(from), Some(to)) if to > from => Ok(()),
        _ => Err(TransitionError::Illegal {
            from: current,
            to: requested,
        }),
    }
}

/// Trims the caller's reason; REJECTED / CANCELLED refuse a missing or blank one.
pub fn normalize_reason(
    requested: OrderStatus,
    reason: Option<&str>,
) -> Result<Option<String>, TransitionError> {
    let trimmed = reason.map(str::trim).filter(|r| !r.is_empty());
    match trimmed {
        Some(r) => Ok(Some(r.to_string())),
        None if requested.is_abandoned() => Err(TransitionError::MissingReason(requested)),
        None => Ok(None),
    }
}

/// Outcome of the role check for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDecision {
    Allowed,
    /// The role may never ask for this target.
    Forbidden,
    /// The target is allowed for the role, but the order already left the window
    /// in which it applies.
    Stale,
}

/// Customers and sellers may only abandon an order while it is still PLACED or CONFIRMED.
pub fn abandon_window_open(current: OrderStatus) -> bool {
    matches!(current, OrderStatus::Placed | OrderStatus::Confirmed)
}

/// Which targets a role may ask for, given a non-terminal current status.
///
/// Customers may only cancel. Sellers work the main chain and may reject or cancel.
/// Both abandon only inside [`abandon_window_open`]. Admins may request anything.
pub fn role_policy(role: ActorRole, current: OrderStatus, requested: OrderStatus) -> RoleDecision {
    let permitted = match role {
        ActorRole::Customer => requested == OrderStatus::Cancelled,
        ActorRole::Seller => requested != OrderStatus::Placed,
        ActorRole::Admin => return RoleDecision::Allowed,
    };
    if !permitted {
        RoleDecision::Forbidden
    } else if requested.is_abandoned() && !abandon_window_open(current) {
        RoleDecision::Stale
    } else {
        RoleDecision::Allowed
    }
}

pub fn plan_transition(
    current: OrderStatus,
    requested: OrderStatus,
    reason: Option<&str>,
) -> Result<Transition, TransitionError> {
    validate_transition(current, requested)?;
    let reason = normalize_reason(requested, reason)?;
    Ok(Transition {
        from: current,
        to: requested,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn test_forward_moves_are_allowed() {
        assert!(validate_transition(Placed, Confirmed).is_ok());
        assert!(validate_transition(Confirmed, Packed).is_ok());
        assert!(validate_transition(Packed, OutForDelivery).is_ok());
        assert!(validate_transition(OutForDelivery, Delivered).is_ok());
        assert!(validate_transition(Placed, Packed).is_ok());
    }

    #[test]
    fn test_backward_and_repeated_moves_are_rejected() {
        assert_eq!(
            validate_transition(Packed, Confirmed),
            Err(TransitionError::Illegal {
                from: Packed,
                to: Confirmed
            })
        );
        assert!(validate_transition(Confirmed, Confirmed).is_err());
        assert!(validate_transition(OutForDelivery, Placed).is_err());
    }

    #[test]
    fn test_abandon_from_any_open_status() {
        for from in [Placed, Confirmed, Packed, OutForDelivery] {
            assert!(validate_transition(from, Rejected).is_ok());
            assert!(validate_transition(from, Cancelled).is_ok());
        }
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        for from in [Delivered, Rejected, Cancelled] {
            for to in [Placed, Confirmed, Packed, OutForDelivery, Delivered, Rejected, Cancelled] {
                assert_eq!(
                    validate_transition(from, to),
                    Err(TransitionError::Absorbing(from))
                );
            }
        }
    }

    #[test]
    fn test_abandon_requires_reason() {
        assert_eq!(
            plan_transition(Placed, Cancelled, None),
            Err(TransitionError::MissingReason(Cancelled))
        );
        assert_eq!(
            plan_transition(Placed, Rejected, Some("   ")),
            Err(TransitionError::MissingReason(Rejected))
        );

        let t = plan_transition(Confirmed, Rejected, Some("  Out of stock ")).unwrap();
        assert_eq!(t.reason.as_deref(), Some("Out of stock"));
        assert_eq!(t.previous_status(), Some(Confirmed));
    }

    #[test]
    fn test_role_policy() {
        use RoleDecision::*;
        assert_eq!(role_policy(ActorRole::Customer, Placed, Cancelled), Allowed);
        assert_eq!(role_policy(ActorRole::Customer, Confirmed, Cancelled), Allowed);
        assert_eq!(role_policy(ActorRole::Customer, Packed, Cancelled), Stale);
        assert_eq!(role_policy(ActorRole::Customer, Placed, Rejected), Forbidden);
        assert_eq!(role_policy(ActorRole::Customer, Placed, Confirmed), Forbidden);

        assert_eq!(role_policy(ActorRole::Seller, Confirmed, Packed), Allowed);
        assert_eq!(role_policy(ActorRole::Seller, Confirmed, Rejected), Allowed);
        assert_eq!(role_policy(ActorRole::Seller, Packed, Rejected), Stale);
        assert_eq!(role_policy(ActorRole::Seller, OutForDelivery, Cancelled), Stale);
        assert_eq!(role_policy(ActorRole::Seller, Packed, Placed), Forbidden);

        assert_eq!(role_policy(ActorRole::Admin, Packed, Delivered), Allowed);
        assert_eq!(role_policy(ActorRole::Admin, OutForDelivery, Cancelled), Allowed);
    }

    #[test]
    fn test_reason_optional_on_main_chain() {
        let t = plan_transition(Placed, Confirmed, None).unwrap();
        assert_eq!(t.reason, None);
        assert_eq!(t.previous_status(), None);

        let t = plan_transition(OutForDelivery, Delivered, Some("left at door")).unwrap();
        assert_eq!(t.reason.as_deref(), Some("left at door"));
        assert_eq!(t.previous_status(), Some(OutForDelivery));
    }
}
