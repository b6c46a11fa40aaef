use regex::Regex;
use serde::{Deserialize, Serialize};
use url::{Host, Url};

/// Characters stripped from the end of a matched URL
const TRAILING_PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '>', '"', '\'', '،', '؛', '؟', '”', '’', '»',
    '›', '…', '）', '」', '』', '】',
];

/// Characters stripped from the start of a bare token
const OPENING_PUNCTUATION: &[char] = &[
    '(', '[', '{', '<', '"', '\'', '“', '‘', '«', '‹', '（', '「', '『', '【',
];

/// Final labels that make the part before an '@' read as a host rather than
/// a mailbox name. Any two-letter label also counts.
const HOST_LIKE_TLDS: &[&str] = &[
    "com", "net", "org", "gov", "edu", "info", "biz", "xyz", "top", "online", "site", "app",
    "link", "click", "live", "shop",
];

/// A URL-like span found in a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateUrl {
    /// Text exactly as it appeared (minus trailing punctuation)
    pub raw: String,
    /// Lowercased form used by every check
    pub normalized: String,
    /// Scheme when written explicitly (`https`, `http`, ...)
    pub scheme: Option<String>,
}

/// Host and port recovered from a candidate, when it parses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHost {
    pub host: String,
    pub is_ip_literal: bool,
    pub explicit_port: Option<u16>,
}

impl CandidateUrl {
    pub fn new(raw: &str) -> Self {
        let normalized = raw.to_lowercase();
        let scheme = normalized
            .find("://")
            .map(|idx| normalized[..idx].to_string())
            .filter(|s| !s.is_empty());

        Self {
            raw: raw.to_string(),
            normalized,
            scheme,
        }
    }

    /// Parse the host, assuming `http://` for bare domains.
    ///
    /// Returns `None` when the string cannot be parsed into a host; every
    /// host-based check then simply does not match.
    pub fn parse_host(&self) -> Option<ParsedHost> {
        let with_scheme = if self.scheme.is_some() {
            self.normalized.clone()
        } else {
            format!("http://{}", self.normalized)
        };

        let parsed = Url::parse(&with_scheme).ok()?;
        let (host, is_ip_literal) = match parsed.host()? {
            Host::Domain(domain) => (domain.trim_end_matches('.').to_string(), false),
            Host::Ipv4(addr) => (addr.to_string(), true),
            Host::Ipv6(addr) => (addr.to_string(), true),
        };

        if host.is_empty() {
            return None;
        }

        Some(ParsedHost {
            host,
            is_ip_literal,
            explicit_port: parsed.port(),
        })
    }
}

pub struct UrlExtractor {
    protocol_regex: Regex,
    token_regex: Regex,
}

impl Default for UrlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl UrlExtractor {
    pub fn new() -> Self {
        Self {
            protocol_regex: Regex::new(r"(?i)\b[a-z][a-z0-9+.\-]*://\S+").unwrap(),
            token_regex: Regex::new(r"\S+").unwrap(),
        }
    }

    /// Deduplicated candidate URLs in first-occurrence order
    pub fn extract(&self, text: &str) -> Vec<CandidateUrl> {
        let mut found: Vec<(usize, String)> = Vec::new();
        let mut protocol_spans: Vec<(usize, usize)> = Vec::new();

        for m in self.protocol_regex.find_iter(text) {
            protocol_spans.push((m.start(), m.end()));
            let cleaned = m.as_str().trim_end_matches(TRAILING_PUNCTUATION);
            if cleaned.contains("://") && !cleaned.ends_with("://") {
                found.push((m.start(), cleaned.to_string()));
            }
        }

        for m in self.token_regex.find_iter(text) {
            let overlaps = protocol_spans
                .iter()
                .any(|(start, end)| m.start() < *end && *start < m.end());
            if overlaps {
                continue;
            }

            let token = m.as_str();
            let cleaned = token
                .trim_start_matches(OPENING_PUNCTUATION)
                .trim_end_matches(TRAILING_PUNCTUATION);
            if Self::is_bare_url(cleaned) {
                found.push((m.start(), cleaned.to_string()));
            }
        }

        found.sort_by_key(|(start, _)| *start);

        let mut unique: Vec<CandidateUrl> = Vec::new();
        for (_, url) in found {
            if !unique.iter().any(|c| c.raw == url) {
                unique.push(CandidateUrl::new(&url));
            }
        }

        log::debug!("Extracted {} candidate URLs", unique.len());
        unique
    }

    /// Whether a whitespace-delimited token is a scheme-less URL.
    ///
    /// The whole token is judged, so `absher.sa@evil.tk/x` stays one
    /// candidate whose host is `evil.tk`. A plain mailbox address
    /// (`ali.ahmed@gmail.com`) is not a URL.
    fn is_bare_url(candidate: &str) -> bool {
        let (authority, rest) = match candidate.find(['/', '?', '#']) {
            Some(idx) => candidate.split_at(idx),
            None => (candidate, ""),
        };

        let (userinfo, host_port) = match authority.rsplit_once('@') {
            Some((userinfo, host_port)) => (Some(userinfo), host_port),
            None => (None, authority),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (host_port, None),
        };
        if let Some(port) = port {
            if port.is_empty() || port.len() > 5 || !port.chars().all(|c| c.is_ascii_digit()) {
                return false;
            }
        }

        if !Self::is_hostname(host) {
            return false;
        }

        match userinfo {
            Some(userinfo) if rest.is_empty() && port.is_none() => Self::reads_as_host(userinfo),
            _ => true,
        }
    }

    // Labels may be any script so look-alike hosts are still extracted; the
    // final label must be ASCII letters, otherwise "word.word" prose in
    // Arabic would match
    fn is_hostname(host: &str) -> bool {
        let host = host.trim_end_matches('.');
        let Some((labels, last)) = host.rsplit_once('.') else {
            return false;
        };
        let labels_ok = labels
            .split('.')
            .all(|l| !l.is_empty() && l.chars().all(|c| c.is_alphanumeric() || c == '-'));
        labels_ok && last.len() >= 2 && last.chars().all(|c| c.is_ascii_alphabetic())
    }

    fn reads_as_host(userinfo: &str) -> bool {
        if !Self::is_hostname(userinfo) {
            return false;
        }
        let last = userinfo
            .trim_end_matches('.')
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        last.len() == 2 || HOST_LIKE_TLDS.contains(&last.as_str())
    }
}
