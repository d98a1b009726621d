//! Label codec — semantic fields encoded as plain-text labels.
//!
//! A directory mirror carries four managed labels:
//!
//! ```text
//! Pricing: 200 USD      (or the literal "Pricing: not set")
//! Time: 1h              (only when the partner issue has one)
//! Partner: owner/repo
//! id: <partner node_id>
//! ```
//!
//! Everything else on the mirror (`Unavailable` included) is out-of-band
//! and must survive a label-set replace untouched.

use devdir_core::types::{Issue, RepoSlug};

/// Marker label for mirrors whose partner issue is currently claimed.
pub const UNAVAILABLE: &str = "Unavailable";

/// Sentinel price label for partner issues with no recognizable price.
pub const PRICE_NOT_SET: &str = "Pricing: not set";

/// Prefixes of labels managed by the codec. Any mirror label outside these
/// is preserved as-is by the differ.
const MANAGED_PREFIXES: [&str; 5] = ["Pricing:", "Price:", "Time:", "Partner:", "id:"];

/// Return the value after the first label matching `prefix`.
///
/// Matching is case-sensitive and first-match-wins: duplicate labels with
/// the same prefix are not aggregated. `decode_field(issue, "Pricing")` on
/// a `"Pricing: 200 USD"` label yields `"200 USD"`.
pub fn decode_field<'a>(issue: &'a Issue, prefix: &str) -> Option<&'a str> {
    issue
        .label_names()
        .find(|name| name.starts_with(prefix))
        .and_then(|name| name.split_once(':'))
        .map(|(_, value)| value.trim())
}

/// The exact price label text for an issue, or the sentinel when absent.
///
/// Partner repositories label rewards under either `Price:` or `Pricing:`;
/// the mirror always carries the `Pricing:` form.
pub fn price_label(issue: &Issue) -> String {
    match price_value(issue) {
        Some(value) => format!("Pricing: {value}"),
        None => PRICE_NOT_SET.to_string(),
    }
}

/// The raw price value (e.g. `"200 USD"`), from whichever prefix is present.
pub fn price_value(issue: &Issue) -> Option<&str> {
    decode_field(issue, "Pricing:").or_else(|| decode_field(issue, "Price:"))
}

/// Whether the issue carries any recognizable price label.
pub fn has_price_labels(issue: &Issue) -> bool {
    price_value(issue).is_some()
}

/// Parse the numeric amount out of a price value like `"200 USD"`.
///
/// Returns `None` for a malformed amount; the caller decides whether that
/// is a reportable condition.
pub fn price_amount(issue: &Issue) -> Option<f64> {
    let value = price_value(issue)?;
    let digits = value.split_whitespace().next()?;
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Build the full managed label set for a mirror of `partner`.
pub fn encode_labels(partner: &Issue, partner_repo: &RepoSlug) -> Vec<String> {
    let mut labels = vec![price_label(partner)];
    if let Some(time) = decode_field(partner, "Time:") {
        labels.push(format!("Time: {time}"));
    }
    labels.push(format!("Partner: {partner_repo}"));
    labels.push(format!("id: {}", partner.node_id));
    labels
}

/// Whether a label belongs to the codec-managed subset.
pub fn is_managed(label: &str) -> bool {
    MANAGED_PREFIXES
        .iter()
        .any(|prefix| label.starts_with(prefix))
}

/// The social/description text for a partner issue: price, time estimate,
/// and a backlink to the partner issue. Also stored as the mirror body.
pub fn social_text(partner: &Issue) -> String {
    let price = price_value(partner).unwrap_or("Pricing: not set");
    match decode_field(partner, "Time:") {
        Some(time) => format!("{price} for {time}\n\n{}", partner.html_url),
        None => format!("{price}\n\n{}", partner.html_url),
    }
}
