//! Unavailable-label rule — marks mirrors whose partner issue is claimed.
//!
//! Two states per mirror: has-label / no-label. The rule is intentionally
//! asymmetric: an assigned-but-closed partner does not clear the label;
//! closure does.

use devdir_core::types::{Issue, IssueState};

use crate::labels;

/// The label mutation to apply, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnavailableAction {
    Add,
    Remove,
}

/// Decide whether the mirror's `Unavailable` label must change.
pub fn resolve_unavailable(mirror: &Issue, partner: &Issue) -> Option<UnavailableAction> {
    let has_label = mirror.has_label(labels::UNAVAILABLE);
    let partner_open = partner.state == IssueState::Open;

    if partner_open && partner.is_assigned() && !has_label {
        Some(UnavailableAction::Add)
    } else if !partner_open && has_label {
        Some(UnavailableAction::Remove)
    } else {
        None
    }
}
