use crate::config::DomainConfig;

/// Minimal domain hierarchy utilities
pub struct DomainUtils;

impl DomainUtils {
    /// Check if host equals or is a subdomain of the pattern
    pub fn matches_domain(host: &str, pattern: &str) -> bool {
        let host = host.trim_end_matches('.').to_lowercase();
        let pattern = pattern.trim_start_matches('.').to_lowercase();

        if pattern.is_empty() {
            return false;
        }

        host == pattern || host.ends_with(&format!(".{}", pattern))
    }

    /// Check if host matches any in list (with hierarchy support)
    pub fn matches_domain_list(host: &str, domain_list: &[String]) -> bool {
        domain_list
            .iter()
            .any(|pattern| Self::matches_domain(host, pattern))
    }

    /// Canonicalize domain (remove www prefix)
    pub fn canonicalize_domain(domain: &str) -> String {
        let domain_lower = domain.to_lowercase();
        if let Some(stripped) = domain_lower.strip_prefix("www.") {
            stripped.to_string()
        } else {
            domain_lower
        }
    }

    /// Last label of a dotted host
    pub fn extract_tld(host: &str) -> Option<String> {
        let parts: Vec<&str> = host.trim_end_matches('.').split('.').collect();
        if parts.len() >= 2 {
            let tld = parts.last()?;
            if tld.is_empty() {
                return None;
            }
            Some(tld.to_lowercase())
        } else {
            None
        }
    }

    pub fn label_count(host: &str) -> usize {
        host.trim_end_matches('.')
            .split('.')
            .filter(|label| !label.is_empty())
            .count()
    }
}

/// Lowercased lookup sets for the domain-based checks.
#[derive(Debug, Clone)]
pub struct DomainLists {
    trusted: Vec<String>,
    shorteners: Vec<String>,
    suspicious_tlds: Vec<String>,
    government_suffixes: Vec<String>,
}

impl DomainLists {
    pub fn from_config(config: &DomainConfig) -> Self {
        let normalize = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|d| d.trim().trim_start_matches('.').to_lowercase())
                .filter(|d| !d.is_empty())
                .collect()
        };

        Self {
            trusted: normalize(&config.trusted),
            shorteners: normalize(&config.shorteners),
            suspicious_tlds: normalize(&config.suspicious_tlds),
            government_suffixes: normalize(&config.government_suffixes),
        }
    }

    pub fn is_trusted(&self, host: &str) -> bool {
        DomainUtils::matches_domain_list(host, &self.trusted)
    }

    pub fn is_shortener(&self, host: &str) -> bool {
        DomainUtils::matches_domain_list(host, &self.shorteners)
    }

    pub fn is_government(&self, host: &str) -> bool {
        DomainUtils::matches_domain_list(host, &self.government_suffixes)
    }

    /// Returns the matched abuse-prone TLD, if any
    pub fn suspicious_tld(&self, host: &str) -> Option<String> {
        let tld = DomainUtils::extract_tld(host)?;
        self.suspicious_tlds.iter().find(|t| **t == tld).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_domain_list() {
        let domains = vec!["absher.sa".to_string(), "gov.sa".to_string()];

        assert!(DomainUtils::matches_domain_list("absher.sa", &domains));
        assert!(DomainUtils::matches_domain_list("www.absher.sa", &domains));
        assert!(DomainUtils::matches_domain_list("moi.gov.sa", &domains));
        assert!(!DomainUtils::matches_domain_list("absher.sa.evil.com", &domains));
        assert!(!DomainUtils::matches_domain_list("fakeabsher.sa", &domains));
    }

    #[test]
    fn test_canonicalize_domain() {
        assert_eq!(
            DomainUtils::canonicalize_domain("www.Absher.sa"),
            "absher.sa"
        );
        assert_eq!(DomainUtils::canonicalize_domain("najiz.sa"), "najiz.sa");
    }

    #[test]
    fn test_tld_extraction() {
        assert_eq!(DomainUtils::extract_tld("example.com"), Some("com".to_string()));
        assert_eq!(DomainUtils::extract_tld("a.b.tk"), Some("tk".to_string()));
        assert_eq!(DomainUtils::extract_tld("localhost"), None);
    }

    #[test]
    fn test_domain_lists() {
        let lists = DomainLists::from_config(&DomainConfig::default());

        assert!(lists.is_trusted("www.absher.sa"));
        assert!(lists.is_shortener("bit.ly"));
        assert!(!lists.is_shortener("notbit.ly"));
        assert!(lists.is_government("portal.moi.gov.sa"));
        assert_eq!(lists.suspicious_tld("prize.tk"), Some("tk".to_string()));
        assert_eq!(lists.suspicious_tld("example.com"), None);
    }
}
