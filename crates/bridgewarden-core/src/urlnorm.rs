//! URL normalization for guarded web fetches.
//!
//! Known HTML-viewer URL forms are rewritten to their raw-file
//! equivalents before any policy check runs, so the fetcher downloads
//! the actual content instead of a rendering shell and never follows a
//! cross-host redirect to get there.

use crate::ssrf::normalize_host;
use url::Url;

/// Rewrite known HTML file-view URLs to their raw form. Unknown shapes
/// pass through unchanged.
///
/// - `github.com/<org>/<repo>/blob/<ref>/<path>` becomes
///   `raw.githubusercontent.com/<org>/<repo>/<ref>/<path>`
/// - GitLab's `/-/blob/<ref>/<path>` becomes `/-/raw/<ref>/<path>`
/// - Bitbucket's `/src/<ref>/<path>` becomes `/raw/<ref>/<path>`
pub fn normalize_raw_file_url(raw_url: &str) -> String {
    let Ok(parsed) = Url::parse(raw_url) else {
        return raw_url.to_string();
    };
    let host = normalize_host(parsed.host_str().unwrap_or(""));
    let segments: Vec<String> = parsed
        .path_segments()
        .map(|parts| parts.filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    if host == "github.com" && segments.len() >= 5 && matches!(segments[2].as_str(), "blob" | "raw") {
        let (org, repo, reference) = (&segments[0], &segments[1], &segments[3]);
        let tail = segments[4..].join("/");
        if !tail.is_empty() {
            return format!("{}://raw.githubusercontent.com/{org}/{repo}/{reference}/{tail}", parsed.scheme());
        }
    }

    // GitLab-style: .../<project path>/-/blob/<ref>/<path>
    for idx in 0..segments.len().saturating_sub(2) {
        if segments[idx] == "-" && matches!(segments[idx + 1].as_str(), "blob" | "raw") {
            if idx >= 2 && idx + 2 < segments.len() {
                let reference = &segments[idx + 2];
                let tail = segments[idx + 3..].join("/");
                let mut new_path = format!("/{}/-/raw/{reference}", segments[..idx].join("/"));
                if !tail.is_empty() {
                    new_path.push('/');
                    new_path.push_str(&tail);
                }
                let mut rewritten = parsed.clone();
                rewritten.set_path(&new_path);
                rewritten.set_query(None);
                rewritten.set_fragment(None);
                return rewritten.to_string();
            }
            break;
        }
    }

    if host == "bitbucket.org" && segments.len() >= 4 && matches!(segments[2].as_str(), "src" | "raw") {
        let reference = &segments[3];
        let tail = segments[4..].join("/");
        let mut new_path = format!("/{}/{}/raw/{reference}", segments[0], segments[1]);
        if !tail.is_empty() {
            new_path.push('/');
            new_path.push_str(&tail);
        }
        let mut rewritten = parsed.clone();
        rewritten.set_path(&new_path);
        rewritten.set_query(None);
        rewritten.set_fragment(None);
        return rewritten.to_string();
    }

    raw_url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_blob_to_raw() {
        assert_eq!(
            normalize_raw_file_url("https://github.com/org/repo/blob/main/src/lib.rs"),
            "https://raw.githubusercontent.com/org/repo/main/src/lib.rs"
        );
        assert_eq!(
            normalize_raw_file_url("https://github.com/org/repo/raw/v1.0/README.md"),
            "https://raw.githubusercontent.com/org/repo/v1.0/README.md"
        );
    }

    #[test]
    fn test_github_without_tail_unchanged() {
        let url = "https://github.com/org/repo/blob/main";
        assert_eq!(normalize_raw_file_url(url), url);
    }

    #[test]
    fn test_gitlab_blob_to_raw() {
        assert_eq!(
            normalize_raw_file_url("https://gitlab.com/group/project/-/blob/main/src/lib.rs"),
            "https://gitlab.com/group/project/-/raw/main/src/lib.rs"
        );
    }

    #[test]
    fn test_gitlab_strips_query() {
        assert_eq!(
            normalize_raw_file_url("https://gitlab.com/group/project/-/blob/main/file.txt?ref_type=heads"),
            "https://gitlab.com/group/project/-/raw/main/file.txt"
        );
    }

    #[test]
    fn test_bitbucket_src_to_raw() {
        assert_eq!(
            normalize_raw_file_url("https://bitbucket.org/team/repo/src/main/file.py"),
            "https://bitbucket.org/team/repo/raw/main/file.py"
        );
    }

    #[test]
    fn test_plain_urls_unchanged() {
        let url = "https://example.com/page.html";
        assert_eq!(normalize_raw_file_url(url), url);
        assert_eq!(normalize_raw_file_url("not a url"), "not a url");
    }
}
