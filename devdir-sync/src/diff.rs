//! Metadata differ — minimal patch between a partner issue and its mirror.
//!
//! Pure computation over two issue snapshots; no I/O. The body comparison
//! is against the *encoded* social text, not the partner's raw body, since
//! the mirror stores the backlink/description format.

use std::collections::BTreeSet;

use similar::TextDiff;

use devdir_core::types::{Issue, RepoSlug};

use crate::labels;

/// Which fields differ, plus the replacement label set when they do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataDiff {
    pub title_changed: bool,
    pub body_changed: bool,
    pub labels_changed: bool,
    /// Full replacement label set: fresh managed labels plus every
    /// out-of-band label the mirror already carries (`Unavailable` included).
    pub new_labels: Vec<String>,
}

impl MetadataDiff {
    pub fn any(&self) -> bool {
        self.title_changed || self.body_changed || self.labels_changed
    }
}

/// Compute the minimal metadata patch for `mirror` against `partner`.
pub fn diff(mirror: &Issue, partner: &Issue, partner_repo: &RepoSlug) -> MetadataDiff {
    let title_changed = mirror.title != partner.title;

    let encoded_body = labels::social_text(partner);
    let mirror_body = mirror.body.as_deref().unwrap_or("");
    let body_changed = mirror_body != encoded_body;
    if body_changed && tracing::enabled!(tracing::Level::DEBUG) {
        let unified = TextDiff::from_lines(mirror_body, &encoded_body)
            .unified_diff()
            .header("mirror", "encoded")
            .context_radius(1)
            .to_string();
        tracing::debug!("body drift for {}:\n{unified}", mirror.html_url);
    }

    let encoded = labels::encode_labels(partner, partner_repo);
    let encoded_set: BTreeSet<&str> = encoded.iter().map(String::as_str).collect();
    let managed_on_mirror: BTreeSet<&str> = mirror
        .label_names()
        .filter(|name| labels::is_managed(name))
        .collect();
    let labels_changed = encoded_set != managed_on_mirror;

    let mut new_labels = encoded;
    for name in mirror.label_names() {
        if !labels::is_managed(name) && !new_labels.iter().any(|l| l == name) {
            new_labels.push(name.to_string());
        }
    }

    MetadataDiff {
        title_changed,
        body_changed,
        labels_changed,
        new_labels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devdir_core::types::{IssueState, Label};

    fn partner(labels: &[&str]) -> Issue {
        Issue {
            id: 2,
            node_id: "node-2".into(),
            number: 1,
            title: "Fix the bug".into(),
            body: Some("raw partner body".into()),
            state: IssueState::Open,
            labels: labels.iter().copied().map(Label::new).collect(),
            assignee: None,
            assignees: vec![],
            pull_request: None,
            html_url: "https://github.com/acme/widgets/issues/1".into(),
            repository_url: "https://api.github.com/repos/acme/widgets".into(),
            closed_at: None,
        }
    }

    fn mirror_of(partner: &Issue, repo: &RepoSlug) -> Issue {
        Issue {
            id: 1,
            node_id: "dir-1".into(),
            number: 10,
            title: partner.title.clone(),
            body: Some(labels::social_text(partner)),
            state: IssueState::Open,
            labels: labels::encode_labels(partner, repo)
                .iter()
                .map(Label::new)
                .collect(),
            assignee: None,
            assignees: vec![],
            pull_request: None,
            html_url: "https://github.com/acme/directory/issues/10".into(),
            repository_url: "https://api.github.com/repos/acme/directory".into(),
            closed_at: None,
        }
    }

    #[test]
    fn identical_pair_has_no_changes() {
        let repo = RepoSlug::new("acme", "widgets");
        let p = partner(&["Pricing: 200 USD", "Time: 1h"]);
        let m = mirror_of(&p, &repo);
        let d = diff(&m, &p, &repo);
        assert!(!d.any());
    }

    #[test]
    fn title_change_is_detected() {
        let repo = RepoSlug::new("acme", "widgets");
        let p = partner(&["Pricing: 200 USD"]);
        let mut m = mirror_of(&p, &repo);
        m.title = "Original Title".into();
        let d = diff(&m, &p, &repo);
        assert!(d.title_changed);
        assert!(!d.body_changed);
        assert!(!d.labels_changed);
    }

    #[test]
    fn body_compares_against_encoded_text() {
        let repo = RepoSlug::new("acme", "widgets");
        let p = partner(&["Pricing: 200 USD", "Time: 1h"]);
        let mut m = mirror_of(&p, &repo);
        // Mirror body holds the raw partner body instead of the encoding.
        m.body = p.body.clone();
        let d = diff(&m, &p, &repo);
        assert!(d.body_changed);
    }

    #[test]
    fn partner_label_change_flips_labels_changed() {
        let repo = RepoSlug::new("acme", "widgets");
        let p_old = partner(&["Pricing: 200 USD", "Time: 1h"]);
        let m = mirror_of(&p_old, &repo);
        let p_new = partner(&["Pricing: 300 USD", "Time: 1h"]);
        let d = diff(&m, &p_new, &repo);
        assert!(d.labels_changed);
        assert!(d.new_labels.contains(&"Pricing: 300 USD".to_string()));
    }

    #[test]
    fn out_of_band_labels_survive_replace() {
        let repo = RepoSlug::new("acme", "widgets");
        let p = partner(&["Pricing: 200 USD"]);
        let mut m = mirror_of(&p, &repo);
        m.labels.push(Label::new(labels::UNAVAILABLE));
        m.labels.push(Label::new("good first issue"));

        let d = diff(&m, &p, &repo);
        // Unmanaged labels alone do not constitute a label change...
        assert!(!d.labels_changed);
        // ...but they are always carried in the replacement set.
        assert!(d.new_labels.contains(&labels::UNAVAILABLE.to_string()));
        assert!(d.new_labels.contains(&"good first issue".to_string()));
    }

    #[test]
    fn duplicate_mirror_labels_compare_as_a_set() {
        let repo = RepoSlug::new("acme", "widgets");
        let p = partner(&["Pricing: 200 USD"]);
        let mut m = mirror_of(&p, &repo);
        let dup = m.labels[0].clone();
        m.labels.push(dup);
        let d = diff(&m, &p, &repo);
        assert!(!d.labels_changed);
    }
}
