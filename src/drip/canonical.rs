use crate::errors::{GardenerError, Result};
use url::Url;

/// Reduce any common Git remote spelling to `host/owner/repo`.
///
/// Accepts `https://` and other scheme URLs, scp-style `git@host:owner/repo.git`,
/// `host:owner/repo` shorthand and scheme-less `host[:port]/owner/repo`. The
/// result is lower-cased, has no `www.` prefix, no user-info and no `.git`
/// suffix. Canonical strings canonicalize to themselves.
pub fn canonicalize(url: &str) -> Result<String> {
    let lowered = url.trim().to_lowercase();
    let candidate = if let Some(rewritten) = rewrite_scp(&lowered) {
        rewritten
    } else if looks_like_bare_host(&lowered) {
        // no default port, so an explicit `:443` or `:80` survives a second pass
        format!("ssh://{lowered}")
    } else {
        lowered.clone()
    };

    if let Ok(parsed) = Url::parse(&candidate) {
        if let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) {
            let host = host.strip_prefix("www.").unwrap_or(host);
            let host = match parsed.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            return Ok(format!("{host}/{}", clean_path(parsed.path())));
        }
    }

    // `host:owner/repo` shorthand that URL parsing reads as a scheme
    match (candidate.find(':'), candidate.find('/')) {
        (Some(colon), Some(slash)) if colon < slash => {
            let (host, path) = candidate.split_at(colon);
            let host = host.strip_prefix("www.").unwrap_or(host);
            if host.is_empty() {
                return Err(invalid(url));
            }
            Ok(format!("{host}/{}", clean_path(&path[1..])))
        }
        _ => Err(invalid(url)),
    }
}

fn invalid(url: &str) -> GardenerError {
    GardenerError::InvalidUrl {
        url: url.to_string(),
    }
}

fn clean_path(path: &str) -> &str {
    let trimmed = path.trim_matches('/');
    trimmed.strip_suffix(".git").unwrap_or(trimmed)
}

/// `user@host:path` -> `https://host/path`.
fn rewrite_scp(url: &str) -> Option<String> {
    if url.contains("://") {
        return None;
    }
    let (user, rest) = url.split_once('@')?;
    if user.is_empty() || user.contains(['/', ':']) {
        return None;
    }
    let colon = rest.find(':')?;
    if rest.find('/').is_some_and(|slash| slash < colon) {
        return None;
    }
    Some(format!("https://{}", rest.replacen(':', "/", 1)))
}

/// `github.com/owner/repo`, `localhost:8080/a/b` and friends: an
/// authority (optional numeric port) followed by a path.
fn looks_like_bare_host(url: &str) -> bool {
    if url.contains("://") {
        return false;
    }
    let Some((authority, _)) = url.split_once('/') else {
        return false;
    };
    let host = match authority.split_once(':') {
        Some((host, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => host,
        Some(_) => return false,
        None => authority,
    };
    !host.is_empty()
        && !host.starts_with(['.', '-'])
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}
