//! Error mapping helpers for the GitHub adapter.
//!
//! The adapter's public surface is the `devdir-sync` collaborator traits, so
//! everything funnels into [`ProviderError`].

use std::path::Path;

use devdir_sync::ProviderError;

/// Map an I/O error on a snapshot path into a provider error.
pub(crate) fn io_err(path: &Path, err: std::io::Error) -> ProviderError {
    ProviderError::remote("snapshot io", format!("{}: {err}", path.display()))
}

/// Map a ureq failure into a provider error, keeping the response body for
/// status errors (GitHub puts the useful message there).
pub(crate) fn http_err(operation: &str, err: ureq::Error) -> ProviderError {
    match err {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            ProviderError::remote(
                operation,
                format!("status {code}: {}", truncate(&body, 400)),
            )
        }
        ureq::Error::Transport(transport) => ProviderError::remote(operation, transport),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("abcdef", 4), "abcd");
        assert_eq!(truncate("ab", 4), "ab");
        assert_eq!(truncate("ééééé", 3), "ééé");
    }
}
