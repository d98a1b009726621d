//! Partner repository selection.
//!
//! Resolves the configured include/exclude lists into a concrete ordered
//! list of partner repositories. Org listing is injected so the selection
//! rules stay purely testable.
//!
//! Rules:
//! - an include entry is either an org (`acme`, expanded via the listing
//!   callback) or an explicit slug (`acme/widgets`); URL forms of both are
//!   accepted
//! - an excluded org suppresses its expansion, but explicitly included
//!   slugs from that org survive
//! - an excluded slug is always removed, however it was included
//! - malformed entries are logged and skipped
//! - order follows the include list; duplicates keep their first position

use std::collections::BTreeSet;

use devdir_core::config::PartnerFilter;
use devdir_core::types::RepoSlug;
use devdir_sync::ProviderError;

#[derive(Debug, PartialEq, Eq)]
enum Entry {
    Owner(String),
    Repo(RepoSlug),
    Invalid,
}

fn parse_entry(raw: &str) -> Entry {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Entry::Invalid;
    }
    // Strip scheme and host from URL forms.
    let path = match trimmed.split_once("//") {
        Some((_, rest)) => match rest.split_once('/') {
            Some((_host, path)) => path,
            None => return Entry::Invalid,
        },
        None => trimmed,
    };
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        [owner] => Entry::Owner((*owner).to_string()),
        [owner, repo] => Entry::Repo(RepoSlug::new(*owner, *repo)),
        _ => Entry::Invalid,
    }
}

/// Resolve the filter into partner repositories, expanding org entries via
/// `list_owner_repos`.
pub fn select_partners<F>(
    filter: &PartnerFilter,
    list_owner_repos: F,
) -> Result<Vec<RepoSlug>, ProviderError>
where
    F: Fn(&str) -> Result<Vec<RepoSlug>, ProviderError>,
{
    let mut excluded_owners: BTreeSet<String> = BTreeSet::new();
    let mut excluded_slugs: BTreeSet<RepoSlug> = BTreeSet::new();
    for raw in &filter.exclude {
        match parse_entry(raw) {
            Entry::Owner(owner) => {
                excluded_owners.insert(owner);
            }
            Entry::Repo(slug) => {
                excluded_slugs.insert(slug);
            }
            Entry::Invalid => tracing::warn!("skipping malformed exclude entry: {raw:?}"),
        }
    }

    let mut selected = Vec::new();
    let mut seen: BTreeSet<RepoSlug> = BTreeSet::new();
    let mut push = |slug: RepoSlug, selected: &mut Vec<RepoSlug>| {
        if !excluded_slugs.contains(&slug) && seen.insert(slug.clone()) {
            selected.push(slug);
        }
    };

    for raw in &filter.include {
        match parse_entry(raw) {
            Entry::Repo(slug) => push(slug, &mut selected),
            Entry::Owner(owner) => {
                if excluded_owners.contains(&owner) {
                    continue;
                }
                for slug in list_owner_repos(&owner)? {
                    push(slug, &mut selected);
                }
            }
            Entry::Invalid => tracing::warn!("skipping malformed include entry: {raw:?}"),
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn filter(include: &[&str], exclude: &[&str]) -> PartnerFilter {
        PartnerFilter {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn static_org(repos: &[(&str, &str)]) -> impl Fn(&str) -> Result<Vec<RepoSlug>, ProviderError> {
        let repos: Vec<RepoSlug> = repos.iter().map(|(o, r)| RepoSlug::new(*o, *r)).collect();
        move |owner: &str| {
            Ok(repos
                .iter()
                .filter(|slug| slug.owner == owner)
                .cloned()
                .collect())
        }
    }

    #[rstest]
    #[case("acme", Entry::Owner("acme".into()))]
    #[case("acme/widgets", Entry::Repo(RepoSlug::new("acme", "widgets")))]
    #[case("https://github.com/acme", Entry::Owner("acme".into()))]
    #[case("https://github.com/acme/widgets", Entry::Repo(RepoSlug::new("acme", "widgets")))]
    #[case("https://github.com/acme/widgets/", Entry::Repo(RepoSlug::new("acme", "widgets")))]
    #[case("", Entry::Invalid)]
    #[case("a/b/c", Entry::Invalid)]
    fn entry_parsing(#[case] raw: &str, #[case] expected: Entry) {
        assert_eq!(parse_entry(raw), expected);
    }

    #[test]
    fn org_entries_expand_to_all_repos() {
        let list = static_org(&[("acme", "widgets"), ("acme", "gadgets")]);
        let selected = select_partners(&filter(&["acme"], &[]), list).unwrap();
        assert_eq!(
            selected,
            vec![RepoSlug::new("acme", "widgets"), RepoSlug::new("acme", "gadgets")]
        );
    }

    #[test]
    fn excluded_org_keeps_explicit_slug_includes() {
        let list = static_org(&[("acme", "widgets"), ("acme", "gadgets")]);
        let selected =
            select_partners(&filter(&["acme", "acme/widgets"], &["acme"]), list).unwrap();
        assert_eq!(selected, vec![RepoSlug::new("acme", "widgets")]);
    }

    #[test]
    fn excluded_slug_is_removed_even_when_org_expands() {
        let list = static_org(&[("acme", "widgets"), ("acme", "gadgets")]);
        let selected =
            select_partners(&filter(&["acme"], &["acme/gadgets"]), list).unwrap();
        assert_eq!(selected, vec![RepoSlug::new("acme", "widgets")]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        let list = static_org(&[("acme", "widgets")]);
        let selected = select_partners(
            &filter(&["acme/widgets", "acme", "other/things"], &[]),
            list,
        )
        .unwrap();
        assert_eq!(
            selected,
            vec![
                RepoSlug::new("acme", "widgets"),
                RepoSlug::new("other", "things")
            ]
        );
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let list = static_org(&[]);
        let selected =
            select_partners(&filter(&["a/b/c", "ok/fine", ""], &["x/y/z"]), list).unwrap();
        assert_eq!(selected, vec![RepoSlug::new("ok", "fine")]);
    }

    #[test]
    fn listing_failure_propagates() {
        let failing = |_: &str| Err(ProviderError::remote("listing repos", "boom"));
        let err = select_partners(&filter(&["acme"], &[]), failing).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }
}
