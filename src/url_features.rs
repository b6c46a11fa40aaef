//! Numeric URL features and the offline URL heuristic.
//!
//! The feature vector keeps the column order of the phishing URL model
//! that consumes it; [`FEATURE_NAMES`] is that order.

use serde::Serialize;
use std::collections::HashMap;

pub const FEATURE_COUNT: usize = 41;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "url_length",
    "number_of_dots_in_url",
    "having_repeated_digits_in_url",
    "number_of_digits_in_url",
    "number_of_special_char_in_url",
    "number_of_hyphens_in_url",
    "number_of_underline_in_url",
    "number_of_slash_in_url",
    "number_of_questionmark_in_url",
    "number_of_equal_in_url",
    "number_of_at_in_url",
    "number_of_dollar_in_url",
    "number_of_exclamation_in_url",
    "number_of_hashtag_in_url",
    "number_of_percent_in_url",
    "domain_length",
    "number_of_dots_in_domain",
    "number_of_hyphens_in_domain",
    "having_special_characters_in_domain",
    "number_of_special_characters_in_domain",
    "having_digits_in_domain",
    "number_of_digits_in_domain",
    "having_repeated_digits_in_domain",
    "number_of_subdomains",
    "having_dot_in_subdomain",
    "having_hyphen_in_subdomain",
    "average_subdomain_length",
    "average_number_of_dots_in_subdomain",
    "average_number_of_hyphens_in_subdomain",
    "having_special_characters_in_subdomain",
    "number_of_special_characters_in_subdomain",
    "having_digits_in_subdomain",
    "number_of_digits_in_subdomain",
    "having_repeated_digits_in_subdomain",
    "having_path",
    "path_length",
    "having_query",
    "having_fragment",
    "having_anchor",
    "entropy_of_url",
    "entropy_of_domain",
];

const URL_SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~`";
// Dots and hyphens are counted separately for hosts
const HOST_SPECIAL_CHARS: &str = "!@#$%^&*()_+=[]{}|;:,<>?/~`";

const HEURISTIC_SHORTENERS: &[&str] = &["bit.ly", "tinyurl", "goo.gl", "ow.ly", "t.co", "is.gd"];
const HEURISTIC_KEYWORDS: &[&str] = &["login", "verify", "account", "update", "secure", "banking"];
const HEURISTIC_TLDS: &[&str] = &[".tk", ".ml", ".ga", ".cf", ".gq", ".xyz", ".top"];

/// Probability above which the heuristic calls a URL phishing
pub const PHISHING_PROBABILITY: f64 = 0.6;

/// Ordered feature values for one URL
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFeatures {
    values: Vec<f64>,
}

impl UrlFeatures {
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        FEATURE_NAMES
            .iter()
            .position(|n| *n == name)
            .map(|idx| self.values[idx])
    }

    pub fn to_map(&self) -> HashMap<&'static str, f64> {
        FEATURE_NAMES
            .iter()
            .copied()
            .zip(self.values.iter().copied())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NamedFeature {
    pub name: &'static str,
    pub value: f64,
}

/// Heuristic verdict for one URL, with the features it was computed from
#[derive(Debug, Clone, Serialize)]
pub struct UrlPrediction {
    pub url: String,
    pub is_phishing: bool,
    pub probability: f64,
    pub features: Vec<NamedFeature>,
}

struct UrlParts<'a> {
    host: &'a str,
    path: &'a str,
    query: &'a str,
    fragment: &'a str,
}

// Lenient split that never fails; "host" keeps any userinfo and port, which
// `url::Url` would separate out of the counted host columns
fn split_url(url: &str) -> UrlParts<'_> {
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };

    let (before_fragment, fragment) = rest.split_once('#').unwrap_or((rest, ""));
    let (before_query, query) = before_fragment
        .split_once('?')
        .unwrap_or((before_fragment, ""));
    let (host, path) = match before_query.find('/') {
        Some(idx) => before_query.split_at(idx),
        None => (before_query, ""),
    };

    UrlParts {
        host,
        path,
        query,
        fragment,
    }
}

/// Shannon entropy in bits per character, rounded to four places
pub fn shannon_entropy(text: &str) -> f64 {
    let length = text.chars().count();
    if length == 0 {
        return 0.0;
    }

    let mut counts: HashMap<char, usize> = HashMap::new();
    for c in text.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }

    let entropy: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / length as f64;
            -p * p.log2()
        })
        .sum();
    (entropy * 10_000.0).round() / 10_000.0
}

/// Same digit twice in a row ("11", "2024-00")
pub fn has_repeated_digits(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    chars
        .windows(2)
        .any(|w| w[0].is_ascii_digit() && w[0] == w[1])
}

fn count_in(text: &str, set: &str) -> usize {
    text.chars().filter(|c| set.contains(*c)).count()
}

fn count_char(text: &str, target: char) -> usize {
    text.chars().filter(|c| *c == target).count()
}

fn count_digits(text: &str) -> usize {
    text.chars().filter(|c| c.is_ascii_digit()).count()
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

pub fn extract_url_features(url: &str) -> UrlFeatures {
    let parts = split_url(url);
    let host = parts.host;
    let mut values = Vec::with_capacity(FEATURE_COUNT);

    // Whole URL
    values.push(url.chars().count() as f64);
    values.push(count_char(url, '.') as f64);
    values.push(flag(has_repeated_digits(url)));
    values.push(count_digits(url) as f64);
    values.push(count_in(url, URL_SPECIAL_CHARS) as f64);
    for c in ['-', '_', '/', '?', '=', '@', '$', '!', '#', '%'] {
        values.push(count_char(url, c) as f64);
    }

    // Host
    let host_special = count_in(host, HOST_SPECIAL_CHARS);
    let host_digits = count_digits(host);
    values.push(host.chars().count() as f64);
    values.push(count_char(host, '.') as f64);
    values.push(count_char(host, '-') as f64);
    values.push(flag(host_special > 0));
    values.push(host_special as f64);
    values.push(flag(host_digits > 0));
    values.push(host_digits as f64);
    values.push(flag(has_repeated_digits(host)));

    // Subdomains: every label but the last two
    let labels: Vec<&str> = host.split('.').collect();
    let subdomains = if labels.len() > 2 {
        &labels[..labels.len() - 2]
    } else {
        &labels[..0]
    };
    values.push(subdomains.len() as f64);
    if subdomains.is_empty() {
        values.extend([0.0; 10]);
    } else {
        let n = subdomains.len() as f64;
        let hyphens: usize = subdomains.iter().map(|s| count_char(s, '-')).sum();
        let special: usize = subdomains
            .iter()
            .map(|s| count_in(s, HOST_SPECIAL_CHARS))
            .sum();
        let digits: usize = subdomains.iter().map(|s| count_digits(s)).sum();
        let total_len: usize = subdomains.iter().map(|s| s.chars().count()).sum();

        values.push(0.0);
        values.push(flag(hyphens > 0));
        values.push(total_len as f64 / n);
        values.push(0.0);
        values.push(hyphens as f64 / n);
        values.push(flag(special > 0));
        values.push(special as f64);
        values.push(flag(digits > 0));
        values.push(digits as f64);
        values.push(flag(subdomains.iter().any(|s| has_repeated_digits(s))));
    }

    // Path, query, fragment
    values.push(flag(!parts.path.is_empty() && parts.path != "/"));
    values.push(parts.path.chars().count() as f64);
    values.push(flag(!parts.query.is_empty()));
    values.push(flag(!parts.fragment.is_empty()));
    values.push(flag(!parts.fragment.is_empty()));

    values.push(shannon_entropy(url));
    values.push(shannon_entropy(host));

    debug_assert_eq!(values.len(), FEATURE_COUNT);
    UrlFeatures { values }
}

fn looks_like_ipv4(url: &str) -> bool {
    url.split(|c: char| !(c.is_ascii_digit() || c == '.'))
        .any(|run| {
            let octets: Vec<&str> = run.split('.').collect();
            octets
                .windows(4)
                .any(|w| w.iter().all(|o| (1..=3).contains(&o.len())))
        })
}

/// Offline phishing probability for one URL, in [0.3, 1.0]
pub fn heuristic_probability(url: &str) -> f64 {
    let lower = url.to_lowercase();
    let mut score: f64 = 0.3;

    if HEURISTIC_SHORTENERS.iter().any(|s| lower.contains(s)) {
        score += 0.35;
    }
    if count_char(url, '.') > 3 {
        score += 0.15;
    }
    if looks_like_ipv4(url) {
        score += 0.25;
    }
    if HEURISTIC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        score += 0.2;
    }
    if HEURISTIC_TLDS.iter().any(|t| lower.contains(t)) {
        score += 0.3;
    }
    if url.chars().count() > 75 {
        score += 0.15;
    }
    if url.contains('@') || url.contains('$') {
        score += 0.2;
    }

    score.min(1.0)
}

pub fn predict_url(url: &str) -> UrlPrediction {
    let features = extract_url_features(url);
    let probability = (heuristic_probability(url) * 10_000.0).round() / 10_000.0;

    UrlPrediction {
        url: url.to_string(),
        is_phishing: probability > PHISHING_PROBABILITY,
        probability,
        features: FEATURE_NAMES
            .iter()
            .zip(features.values())
            .map(|(name, value)| NamedFeature {
                name: *name,
                value: *value,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_shape() {
        let features = extract_url_features("https://www.example.com/path?q=1#top");
        assert_eq!(features.values().len(), FEATURE_COUNT);
        assert_eq!(features.get("url_length"), Some(36.0));
        assert_eq!(features.get("domain_length"), Some(15.0));
        assert_eq!(features.get("number_of_subdomains"), Some(1.0));
        assert_eq!(features.get("average_subdomain_length"), Some(3.0));
        assert_eq!(features.get("having_path"), Some(1.0));
        assert_eq!(features.get("path_length"), Some(5.0));
        assert_eq!(features.get("having_query"), Some(1.0));
        assert_eq!(features.get("having_fragment"), Some(1.0));
        assert_eq!(features.get("having_anchor"), Some(1.0));
        assert_eq!(features.get("no_such_feature"), None);
    }

    #[test]
    fn test_bare_domain_features() {
        let features = extract_url_features("bit.ly");
        assert_eq!(features.get("number_of_subdomains"), Some(0.0));
        assert_eq!(features.get("having_path"), Some(0.0));
        assert_eq!(features.get("domain_length"), Some(6.0));
    }

    #[test]
    fn test_subdomain_statistics() {
        let features = extract_url_features("http://a-1.b22.example.com/");
        assert_eq!(features.get("number_of_subdomains"), Some(2.0));
        assert_eq!(features.get("having_hyphen_in_subdomain"), Some(1.0));
        assert_eq!(features.get("average_number_of_hyphens_in_subdomain"), Some(0.5));
        assert_eq!(features.get("number_of_digits_in_subdomain"), Some(3.0));
        assert_eq!(features.get("having_repeated_digits_in_subdomain"), Some(1.0));
        assert_eq!(features.get("having_path"), Some(0.0));
    }

    #[test]
    fn test_entropy() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaa"), 0.0);
        assert_eq!(shannon_entropy("ab"), 1.0);
        assert_eq!(shannon_entropy("abcd"), 2.0);
    }

    #[test]
    fn test_repeated_digits() {
        assert!(has_repeated_digits("abc112"));
        assert!(!has_repeated_digits("a1b1c1"));
        assert!(!has_repeated_digits("aabb"));
    }

    #[test]
    fn test_heuristic_probability() {
        assert!((heuristic_probability("https://example.com") - 0.3).abs() < 1e-9);
        assert!((heuristic_probability("bit.ly/x") - 0.65).abs() < 1e-9);
        assert!((heuristic_probability("http://192.168.1.1/login") - 0.75).abs() < 1e-9);
        assert_eq!(
            heuristic_probability("http://secure.login.bank.verify.tk/@account$"),
            1.0
        );
    }

    #[test]
    fn test_predict_url() {
        let prediction = predict_url("http://verify-account.xyz/login");
        assert!(prediction.is_phishing);
        assert_eq!(prediction.features.len(), FEATURE_COUNT);
        assert_eq!(prediction.features[0].name, "url_length");

        assert!(!predict_url("https://example.com").is_phishing);
    }
}
