//! Issue matcher — locate a partner issue's mirror by its `id:` label.

use devdir_core::types::Issue;

use crate::labels;

/// Outcome of a mirror lookup.
///
/// More than one match indicates a corrupted directory; the caller must
/// report it and never silently pick one.
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorMatch<'a> {
    None,
    One(&'a Issue),
    Ambiguous(Vec<&'a Issue>),
}

/// Find the directory issue whose decoded `id:` label equals the partner
/// issue's `node_id`.
pub fn find_mirror<'a>(directory_issues: &'a [Issue], partner: &Issue) -> MirrorMatch<'a> {
    let mut matches = directory_issues
        .iter()
        .filter(|mirror| labels::decode_field(mirror, "id:") == Some(partner.node_id.as_str()));

    match (matches.next(), matches.next()) {
        (None, _) => MirrorMatch::None,
        (Some(only), None) => MirrorMatch::One(only),
        (Some(first), Some(second)) => {
            let mut all = vec![first, second];
            all.extend(matches);
            MirrorMatch::Ambiguous(all)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdir_core::types::{IssueState, Label};

    fn issue(id: u64, node_id: &str, labels: &[&str]) -> Issue {
        Issue {
            id,
            node_id: node_id.into(),
            number: id,
            title: format!("issue {id}"),
            body: None,
            state: IssueState::Open,
            labels: labels.iter().copied().map(Label::new).collect(),
            assignee: None,
            assignees: vec![],
            pull_request: None,
            html_url: format!("https://github.com/acme/directory/issues/{id}"),
            repository_url: "https://api.github.com/repos/acme/directory".into(),
            closed_at: None,
        }
    }

    #[test]
    fn no_match_returns_none() {
        let directory = vec![issue(1, "d1", &["id: other"])];
        let partner = issue(2, "p1", &[]);
        assert_eq!(find_mirror(&directory, &partner), MirrorMatch::None);
    }

    #[test]
    fn single_match_returns_the_mirror() {
        let directory = vec![issue(1, "d1", &["id: p1"]), issue(2, "d2", &["id: p2"])];
        let partner = issue(3, "p2", &[]);
        match find_mirror(&directory, &partner) {
            MirrorMatch::One(mirror) => assert_eq!(mirror.id, 2),
            other => panic!("expected single match, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_id_labels_are_ambiguous() {
        let directory = vec![issue(1, "d1", &["id: p1"]), issue(2, "d2", &["id: p1"])];
        let partner = issue(3, "p1", &[]);
        match find_mirror(&directory, &partner) {
            MirrorMatch::Ambiguous(all) => assert_eq!(all.len(), 2),
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn mirror_without_id_label_never_matches() {
        let directory = vec![issue(1, "d1", &["Pricing: 200 USD"])];
        let partner = issue(2, "p1", &[]);
        assert_eq!(find_mirror(&directory, &partner), MirrorMatch::None);
    }
}
