/// Suffixes an operator may paste by mistake when they copy the full endpoint.
/// Longer suffix first so `/api/leaderboard` is not left as `/api`.
const ENDPOINT_SUFFIXES: [&str; 2] = ["/api/leaderboard", "/leaderboard"];

/// Normalize a configured base URL.
///
/// Trims whitespace, drops trailing slashes and a trailing `/leaderboard` or
/// `/api/leaderboard` segment (ASCII case-insensitive). Absent or blank input
/// yields an empty string, which callers treat as "not configured".
///
/// Stripping repeats until nothing changes, so the function is idempotent.
pub fn normalize_base_url(raw: Option<&str>) -> String {
    let mut s = raw.unwrap_or_default().trim();

    loop {
        let before = s.len();
        s = s.trim_end().trim_end_matches('/');
        for suffix in ENDPOINT_SUFFIXES {
            if let Some(stripped) = strip_suffix_ignore_case(s, suffix) {
                s = stripped;
                break;
            }
        }
        if s.len() == before {
            break;
        }
    }

    s.to_string()
}

/// Full leaderboard endpoint for an already-normalized base.
pub fn leaderboard_url(base: &str) -> String {
    format!("{base}/leaderboard")
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let start = s.len().checked_sub(suffix.len())?;
    let tail = s.get(start..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        s.get(..start)
    } else {
        None
    }
}
