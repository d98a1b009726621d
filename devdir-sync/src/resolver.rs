//! State transition resolver — the decision table mapping a partner/mirror
//! pair to a target mirror state.
//!
//! First match wins. The price-aware policy is in force: a priced-out
//! partner issue closes its mirror, and reopening requires price labels.

use devdir_core::types::IssueState;

/// Everything the decision table reads, derived once by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverInput {
    /// `false` means the partner issue no longer exists upstream.
    pub partner_exists: bool,
    pub partner_has_price_labels: bool,
    pub partner_state: IssueState,
    pub partner_assigned: bool,
    /// Derived from `pull_request.merged_at` presence.
    pub partner_merged: bool,
    pub mirror_state: IssueState,
}

/// A resolved state change with its human-readable reason tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub target: IssueState,
    pub reason: &'static str,
}

fn close(reason: &'static str) -> Option<Transition> {
    Some(Transition {
        target: IssueState::Closed,
        reason,
    })
}

fn reopen(reason: &'static str) -> Option<Transition> {
    Some(Transition {
        target: IssueState::Open,
        reason,
    })
}

/// Run the decision table. `None` means no state change (and no log line).
pub fn resolve(input: &ResolverInput) -> Option<Transition> {
    let mirror_open = input.mirror_state == IssueState::Open;
    let partner_open = input.partner_state == IssueState::Open;

    if !input.partner_exists {
        if mirror_open {
            return close("Closed (missing in partners)");
        }
        return None;
    }
    if mirror_open && !input.partner_has_price_labels {
        return close("Closed (no price labels)");
    }
    if mirror_open && !partner_open {
        if input.partner_merged {
            return close("Closed (merged)");
        }
        if input.partner_assigned {
            return close("Closed (assigned-closed)");
        }
        return close("Closed (not merged)");
    }
    if mirror_open && partner_open && input.partner_assigned {
        return close("Closed (assigned-open)");
    }
    if !mirror_open && partner_open && !input.partner_assigned && input.partner_has_price_labels {
        if input.partner_merged {
            return reopen("Reopened (merged)");
        }
        return reopen("Reopened (unassigned)");
    }
    None
}
