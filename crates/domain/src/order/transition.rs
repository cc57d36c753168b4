//! Order status transition rules.

use common::OrderStatus;

/// Decides which status changes an update may perform.
///
/// Lifecycle edges enforced by [`TransitionPolicy::Strict`]:
/// ```text
/// Pending ──► Paid ──► Shipped ──► Completed
///    │          │         │
///    └──────────┴─────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be assigned from any status.
    #[default]
    Permissive,

    /// Only the lifecycle edges are legal; terminal statuses stay put.
    Strict,
}

impl TransitionPolicy {
    /// Picks the policy from the strict-transitions flag.
    pub fn from_flag(strict: bool) -> Self {
        if strict {
            TransitionPolicy::Strict
        } else {
            TransitionPolicy::Permissive
        }
    }

    /// Returns true if moving from `from` to `to` is allowed.
    pub fn is_legal(&self, from: OrderStatus, to: OrderStatus) -> bool {
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => is_lifecycle_edge(from, to),
        }
    }
}

fn is_lifecycle_edge(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;

    matches!(
        (from, to),
        (Pending, Paid)
            | (Paid, Shipped)
            | (Shipped, Completed)
            | (Pending | Paid | Shipped, Cancelled)
    )
}
