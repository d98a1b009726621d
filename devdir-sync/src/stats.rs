//! Statistics aggregator — reward and task totals over a directory snapshot.
//!
//! A pure fold: commutative and associative over the issue set, no ordering
//! dependency. Issues without a parseable price contribute to neither tally.

use devdir_core::types::{Issue, IssueState, RewardTotals, Statistics, TaskCounts};

use crate::labels;

/// Recompute statistics from scratch over the full directory snapshot.
pub fn calculate_statistics(issues: &[Issue]) -> Statistics {
    let mut rewards = RewardTotals::default();
    let mut tasks = TaskCounts::default();

    for issue in issues {
        let Some(amount) = labels::price_amount(issue) else {
            tracing::error!(
                "skipping {} in statistics: missing or non-numeric price label",
                issue.html_url
            );
            continue;
        };

        if issue.state == IssueState::Closed {
            rewards.completed += amount;
            tasks.completed += 1;
        } else if issue.is_assigned() {
            rewards.assigned += amount;
            tasks.assigned += 1;
        } else {
            rewards.not_assigned += amount;
            tasks.not_assigned += 1;
        }
    }

    rewards.total = rewards.completed + rewards.assigned + rewards.not_assigned;
    tasks.total = tasks.completed + tasks.assigned + tasks.not_assigned;

    Statistics { rewards, tasks }
}
