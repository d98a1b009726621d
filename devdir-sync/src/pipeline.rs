//! Mirror lifecycle orchestrator — the full reconciliation run.
//!
//! One run: fetch the directory snapshot, walk every partner repository's
//! issues in order, create/update/transition mirrors, force-close orphans,
//! then recompute statistics over the refreshed directory and persist the
//! per-run snapshots.
//!
//! Per-issue write failures never abort the run; they are logged and
//! collected on the [`RunSummary`]. Remote *reads* are fatal for the
//! affected partner repository only.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;

use devdir_core::config::RunConfig;
use devdir_core::types::{Issue, IssueState, OrgAvatar, PullRequest, RepoSlug, Statistics};

use crate::diff::{self, MetadataDiff};
use crate::error::SyncError;
use crate::labels;
use crate::matcher::{self, MirrorMatch};
use crate::provider::{IssueHost, IssuePatch, ProviderError, SnapshotKind, SnapshotStore, SocialFeed};
use crate::resolver::{self, ResolverInput};
use crate::stats;
use crate::unavailable::{self, UnavailableAction};

/// Everything one run needs, constructed once by the entry point.
pub struct RunContext<'a> {
    pub config: &'a RunConfig,
    pub host: &'a dyn IssueHost,
    pub social: &'a dyn SocialFeed,
    pub snapshots: &'a dyn SnapshotStore,
}

/// One captured non-fatal failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFailure {
    /// What was being attempted (issue number, operation).
    pub context: String,
    pub message: String,
}

/// Outcome of a reconciliation run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub repos_processed: usize,
    pub created: usize,
    pub metadata_updates: usize,
    pub state_transitions: usize,
    pub label_mutations: usize,
    pub force_closed: usize,
    pub failures: Vec<RunFailure>,
    pub statistics: Statistics,
}

impl RunSummary {
    fn note_failure(&mut self, context: impl Into<String>, err: &ProviderError) {
        let context = context.into();
        tracing::error!("{context}: {err}");
        self.failures.push(RunFailure {
            context,
            message: err.to_string(),
        });
    }
}

/// Memoizing partner-avatar lookup: at most one fetch per owner per run.
#[derive(Debug, Default)]
struct AvatarCache {
    entries: BTreeMap<String, OrgAvatar>,
}

impl AvatarCache {
    fn get_or_fetch(
        &mut self,
        host: &dyn IssueHost,
        owner: &str,
    ) -> Result<&OrgAvatar, ProviderError> {
        if !self.entries.contains_key(owner) {
            let avatar = host.fetch_org_avatar(owner)?;
            self.entries.insert(owner.to_string(), avatar);
        }
        Ok(&self.entries[owner])
    }

    fn into_values(self) -> Vec<OrgAvatar> {
        self.entries.into_values().collect()
    }
}

/// Whether a partner issue with no existing mirror gets one created.
fn qualifies_for_creation(partner: &Issue) -> bool {
    partner.state == IssueState::Open
        && !partner.is_assigned()
        && labels::has_price_labels(partner)
}

/// Run the full reconciliation for the configured directory.
pub fn run(ctx: &RunContext<'_>) -> Result<RunSummary, SyncError> {
    let cfg = ctx.config;
    let mut summary = RunSummary::default();

    let mut directory_issues = ctx.host.fetch_all_issues(&cfg.directory)?;
    let partner_repos = ctx.host.list_partner_repos(&cfg.partners)?;

    let mut social_map = load_social_map(ctx.snapshots, &mut summary);
    let mut avatars = AvatarCache::default();
    let mut seen_node_ids: BTreeSet<String> = BTreeSet::new();
    let mut failed_repos: BTreeSet<String> = BTreeSet::new();
    let mut created_node_ids: BTreeSet<String> = BTreeSet::new();
    let mut task_list: Vec<Issue> = Vec::new();
    let mut pull_list: Vec<PullRequest> = Vec::new();

    for repo in &partner_repos {
        if *repo == cfg.directory {
            continue;
        }
        if cfg.is_directory_repo_forked && cfg.upstream.as_ref() == Some(repo) {
            continue;
        }

        let partner_issues = match ctx.host.fetch_all_issues(repo) {
            Ok(issues) => issues,
            Err(err) => {
                summary.note_failure(format!("listing issues of {repo}"), &err);
                failed_repos.insert(repo.to_string());
                continue;
            }
        };
        summary.repos_processed += 1;

        for partner in &partner_issues {
            seen_node_ids.insert(partner.node_id.clone());
            if labels::has_price_labels(partner) {
                task_list.push(partner.clone());
            }

            match matcher::find_mirror(&directory_issues, partner) {
                MirrorMatch::Ambiguous(matches) => {
                    let urls: Vec<&str> = matches.iter().map(|m| m.html_url.as_str()).collect();
                    summary.note_failure(
                        format!("matching mirror for {}", partner.html_url),
                        &ProviderError::decode(
                            "find_mirror",
                            format!(
                                "{} mirrors reference node {}: {}",
                                urls.len(),
                                partner.node_id,
                                urls.join(", ")
                            ),
                        ),
                    );
                }
                MirrorMatch::None => {
                    if qualifies_for_creation(partner)
                        && !created_node_ids.contains(&partner.node_id)
                    {
                        if let Some(mirror) = create_mirror(
                            ctx,
                            repo,
                            partner,
                            &mut social_map,
                            &mut created_node_ids,
                            &mut summary,
                        ) {
                            directory_issues.push(mirror);
                        }
                    }
                }
                MirrorMatch::One(mirror) => {
                    let mirror = mirror.clone();
                    reconcile_pair(ctx, repo, &mirror, partner, &mut social_map, &mut summary);
                }
            }
        }

        match ctx.host.fetch_all_pull_requests(repo) {
            Ok(pulls) => pull_list.extend(pulls),
            Err(err) => summary.note_failure(format!("listing pull requests of {repo}"), &err),
        }

        if let Err(err) = avatars.get_or_fetch(ctx.host, &repo.owner) {
            summary.note_failure(format!("fetching avatar for {}", repo.owner), &err);
        }
    }

    force_close_orphans(
        ctx,
        &directory_issues,
        &seen_node_ids,
        &failed_repos,
        &mut social_map,
        &mut summary,
    );

    // Statistics run over the refreshed directory snapshot, not the
    // in-memory working copy.
    let refreshed = ctx.host.fetch_all_issues(&cfg.directory)?;
    summary.statistics = stats::calculate_statistics(&refreshed);

    persist_snapshots(
        ctx,
        &task_list,
        &pull_list,
        avatars.into_values(),
        &social_map,
        &mut summary,
    )?;

    Ok(summary)
}

/// Create a mirror for a qualifying partner issue and announce it.
fn create_mirror(
    ctx: &RunContext<'_>,
    partner_repo: &RepoSlug,
    partner: &Issue,
    social_map: &mut BTreeMap<String, String>,
    created_node_ids: &mut BTreeSet<String>,
    summary: &mut RunSummary,
) -> Option<Issue> {
    let body = labels::social_text(partner);
    let new_labels = labels::encode_labels(partner, partner_repo);

    if ctx.config.dry_run {
        tracing::info!("[dry-run] would create mirror for {}", partner.html_url);
        summary.created += 1;
        created_node_ids.insert(partner.node_id.clone());
        return None;
    }

    let mirror = match ctx
        .host
        .create_issue(&ctx.config.directory, &partner.title, &body, &new_labels)
    {
        Ok(mirror) => mirror,
        Err(err) => {
            summary.note_failure(format!("creating mirror for {}", partner.html_url), &err);
            return None;
        }
    };
    tracing::info!("Created mirror: {} - ({})", mirror.html_url, partner.html_url);
    summary.created += 1;
    created_node_ids.insert(partner.node_id.clone());

    match ctx.social.post_update(&body) {
        Ok(Some(post_id)) => {
            social_map.insert(partner.node_id.clone(), post_id);
        }
        Ok(None) => {}
        Err(err) => {
            summary.note_failure(format!("announcing {}", partner.html_url), &err);
        }
    }

    Some(mirror)
}

/// Run differ, resolver and the Unavailable rule for an existing pair.
fn reconcile_pair(
    ctx: &RunContext<'_>,
    partner_repo: &RepoSlug,
    mirror: &Issue,
    partner: &Issue,
    social_map: &mut BTreeMap<String, String>,
    summary: &mut RunSummary,
) {
    let cfg = ctx.config;

    let metadata = diff::diff(mirror, partner, partner_repo);
    if metadata.any() {
        apply_metadata(ctx, mirror, partner, &metadata, summary);
    }

    let input = ResolverInput {
        partner_exists: true,
        partner_has_price_labels: labels::has_price_labels(partner),
        partner_state: partner.state,
        partner_assigned: partner.is_assigned(),
        partner_merged: partner.is_merged(),
        mirror_state: mirror.state,
    };
    if let Some(transition) = resolver::resolve(&input) {
        let applied = if cfg.dry_run {
            tracing::info!(
                "[dry-run] would update state: ({})\n{} - ({})",
                transition.reason,
                mirror.html_url,
                partner.html_url
            );
            true
        } else {
            match ctx.host.update_issue(
                &cfg.directory,
                mirror.number,
                &IssuePatch::state(transition.target),
            ) {
                Ok(_) => {
                    tracing::info!(
                        "Updated state: ({})\n{} - ({})",
                        transition.reason,
                        mirror.html_url,
                        partner.html_url
                    );
                    true
                }
                Err(err) => {
                    summary.note_failure(
                        format!("updating state of issue #{}", mirror.number),
                        &err,
                    );
                    false
                }
            }
        };
        if applied {
            summary.state_transitions += 1;
            if transition.target == IssueState::Closed {
                retract_social_post(ctx, &partner.node_id, social_map, summary);
            }
        }
    }

    match unavailable::resolve_unavailable(mirror, partner) {
        Some(UnavailableAction::Add) => {
            if cfg.dry_run {
                tracing::info!(
                    "[dry-run] would add label \"{}\" to issue #{}",
                    labels::UNAVAILABLE,
                    mirror.number
                );
                summary.label_mutations += 1;
            } else {
                match ctx
                    .host
                    .add_label(&cfg.directory, mirror.number, labels::UNAVAILABLE)
                {
                    Ok(()) => {
                        tracing::info!(
                            "Added label \"{}\" to issue #{}",
                            labels::UNAVAILABLE,
                            mirror.number
                        );
                        summary.label_mutations += 1;
                    }
                    Err(err) => summary.note_failure(
                        format!("adding label to issue #{}", mirror.number),
                        &err,
                    ),
                }
            }
        }
        Some(UnavailableAction::Remove) => {
            if cfg.dry_run {
                tracing::info!(
                    "[dry-run] would remove label \"{}\" from issue #{}",
                    labels::UNAVAILABLE,
                    mirror.number
                );
                summary.label_mutations += 1;
            } else {
                match ctx
                    .host
                    .remove_label(&cfg.directory, mirror.number, labels::UNAVAILABLE)
                {
                    Ok(()) => {
                        tracing::info!(
                            "Removed label \"{}\" from issue #{}",
                            labels::UNAVAILABLE,
                            mirror.number
                        );
                        summary.label_mutations += 1;
                    }
                    Err(err) => summary.note_failure(
                        format!("removing label from issue #{}", mirror.number),
                        &err,
                    ),
                }
            }
        }
        None => {}
    }
}

/// Apply one combined metadata patch (title/body/labels together).
fn apply_metadata(
    ctx: &RunContext<'_>,
    mirror: &Issue,
    partner: &Issue,
    metadata: &MetadataDiff,
    summary: &mut RunSummary,
) {
    let log_line = format!(
        "Updated metadata: {} - ({}) title={} body={} labels={}",
        mirror.html_url,
        partner.html_url,
        metadata.title_changed,
        metadata.body_changed,
        metadata.labels_changed
    );

    if ctx.config.dry_run {
        tracing::info!("[dry-run] would have: {log_line}");
        summary.metadata_updates += 1;
        return;
    }

    let patch = IssuePatch {
        title: Some(partner.title.clone()),
        body: Some(labels::social_text(partner)),
        labels: Some(metadata.new_labels.clone()),
        state: None,
    };
    match ctx
        .host
        .update_issue(&ctx.config.directory, mirror.number, &patch)
    {
        Ok(_) => {
            tracing::info!("{log_line}");
            summary.metadata_updates += 1;
        }
        Err(err) => {
            summary.note_failure(format!("updating metadata of issue #{}", mirror.number), &err);
        }
    }
}

/// Close every mirror whose partner issue vanished from the partner set.
fn force_close_orphans(
    ctx: &RunContext<'_>,
    directory_issues: &[Issue],
    seen_node_ids: &BTreeSet<String>,
    failed_repos: &BTreeSet<String>,
    social_map: &mut BTreeMap<String, String>,
    summary: &mut RunSummary,
) {
    for mirror in directory_issues {
        let Some(node_id) = labels::decode_field(mirror, "id:") else {
            // Not a mirror (no join key) — not ours to manage.
            continue;
        };
        if seen_node_ids.contains(node_id) {
            continue;
        }
        // A mirror of an unreadable repo is indistinguishable from an
        // orphan; leave it for the next run.
        if let Some(partner_repo) = labels::decode_field(mirror, "Partner:") {
            if failed_repos.contains(partner_repo) {
                continue;
            }
        }

        let input = ResolverInput {
            partner_exists: false,
            partner_has_price_labels: false,
            partner_state: IssueState::Open,
            partner_assigned: false,
            partner_merged: false,
            mirror_state: mirror.state,
        };
        let Some(transition) = resolver::resolve(&input) else {
            continue;
        };

        let applied = if ctx.config.dry_run {
            tracing::info!(
                "[dry-run] would update state: ({})\n{}",
                transition.reason,
                mirror.html_url
            );
            true
        } else {
            match ctx.host.update_issue(
                &ctx.config.directory,
                mirror.number,
                &IssuePatch::state(transition.target),
            ) {
                Ok(_) => {
                    tracing::info!(
                        "Updated state: ({})\n{}",
                        transition.reason,
                        mirror.html_url
                    );
                    true
                }
                Err(err) => {
                    summary.note_failure(
                        format!("force-closing issue #{}", mirror.number),
                        &err,
                    );
                    false
                }
            }
        };
        if applied {
            summary.force_closed += 1;
            let node_id = node_id.to_string();
            retract_social_post(ctx, &node_id, social_map, summary);
        }
    }
}

/// Delete the social post announcing a now-closed mirror, if one exists.
fn retract_social_post(
    ctx: &RunContext<'_>,
    node_id: &str,
    social_map: &mut BTreeMap<String, String>,
    summary: &mut RunSummary,
) {
    let Some(post_id) = social_map.remove(node_id) else {
        return;
    };
    if ctx.config.dry_run {
        tracing::info!("[dry-run] would delete social post {post_id}");
        return;
    }
    if let Err(err) = ctx.social.delete_update(&post_id) {
        summary.note_failure(format!("deleting social post {post_id}"), &err);
        // Retried next run.
        social_map.insert(node_id.to_string(), post_id);
    }
}

fn load_social_map(
    snapshots: &dyn SnapshotStore,
    summary: &mut RunSummary,
) -> BTreeMap<String, String> {
    match snapshots.load(SnapshotKind::SocialMap) {
        Ok(Some(value)) => serde_json::from_value(value).unwrap_or_default(),
        Ok(None) => BTreeMap::new(),
        Err(err) => {
            summary.note_failure("loading social map snapshot", &err);
            BTreeMap::new()
        }
    }
}

fn persist_snapshots(
    ctx: &RunContext<'_>,
    task_list: &[Issue],
    pull_list: &[PullRequest],
    avatars: Vec<OrgAvatar>,
    social_map: &BTreeMap<String, String>,
    summary: &mut RunSummary,
) -> Result<(), SyncError> {
    if ctx.config.dry_run {
        tracing::info!("[dry-run] skipping snapshot writes");
        return Ok(());
    }

    let writes = [
        (SnapshotKind::Tasks, serde_json::to_value(task_list)?),
        (SnapshotKind::PullRequests, serde_json::to_value(pull_list)?),
        (SnapshotKind::Avatars, serde_json::to_value(avatars)?),
        (
            SnapshotKind::Statistics,
            serde_json::to_value(summary.statistics)?,
        ),
        (SnapshotKind::SocialMap, json!(social_map)),
    ];
    for (kind, data) in writes {
        if let Err(err) = ctx.snapshots.persist(kind, &data) {
            summary.note_failure(format!("persisting {}", kind.file_name()), &err);
        }
    }
    Ok(())
}
