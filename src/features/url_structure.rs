//! URL structural red flags.
//!
//! Every candidate URL is scored on its own; the analyzer sums the per-URL
//! results. Checks that need a host are skipped when the URL cannot be
//! parsed, the rest run on the normalized string.

use super::{Flag, MessageContext, Signal, SignalAnalyzer, SignalScore};
use crate::config::{EngineConfig, RiskWeights, SignalThresholds, TrustedDomainPolicy};
use crate::domain_utils::{DomainLists, DomainUtils};
use crate::script::ScriptDetector;
use crate::url_extractor::CandidateUrl;

pub struct UrlStructureAnalyzer {
    weights: RiskWeights,
    thresholds: SignalThresholds,
    policy: TrustedDomainPolicy,
    domains: DomainLists,
    credential_keywords: Vec<String>,
}

impl UrlStructureAnalyzer {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            weights: config.weights.clone(),
            thresholds: config.thresholds.clone(),
            policy: config.policy.trusted_domain,
            domains: DomainLists::from_config(&config.domains),
            credential_keywords: config
                .credential_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn analyze_url(&self, candidate: &CandidateUrl) -> SignalScore {
        let mut result = SignalScore::new(self.name());
        let url = &candidate.normalized;
        let parsed = candidate.parse_host();

        // Official-domain bonus is decided first so it can short-circuit
        if let Some(host) = parsed.as_ref().filter(|p| !p.is_ip_literal) {
            if self.domains.is_trusted(&host.host) {
                result.push(Flag::new(
                    Signal::OfficialDomain,
                    self.weights.official_domain,
                    DomainUtils::canonicalize_domain(&host.host),
                ));
                if self.policy == TrustedDomainPolicy::ShortCircuit {
                    return result;
                }
            }
        }

        if let Some(host) = &parsed {
            if host.is_ip_literal {
                result.push(Flag::new(
                    Signal::IpLiteralHost,
                    self.weights.ip_literal_host,
                    host.host.clone(),
                ));
            }

            if let Some(port) = host.explicit_port {
                result.push(Flag::new(
                    Signal::NonStandardPort,
                    self.weights.non_standard_port,
                    format!("{}:{}", host.host, port),
                ));
            }

            if !host.is_ip_literal {
                let labels = DomainUtils::label_count(&host.host);
                if labels > self.thresholds.max_host_labels {
                    result.push(Flag::new(
                        Signal::DeepSubdomains,
                        self.weights.deep_subdomains,
                        format!("{} ({} labels)", host.host, labels),
                    ));
                }

                let hyphens = host.host.matches('-').count();
                if hyphens > self.thresholds.max_host_hyphens {
                    result.push(Flag::new(
                        Signal::ExcessiveHyphens,
                        self.weights.excessive_hyphens,
                        format!("{} ({} hyphens)", host.host, hyphens),
                    ));
                }

                if self.domains.is_shortener(&host.host) {
                    result.push(Flag::new(
                        Signal::Shortener,
                        self.weights.shortener,
                        host.host.clone(),
                    ));
                }

                if let Some(tld) = self.domains.suspicious_tld(&host.host) {
                    result.push(Flag::new(
                        Signal::SuspiciousTld,
                        self.weights.suspicious_tld,
                        format!(".{}", tld),
                    ));
                }
            }

            if candidate.scheme.as_deref() == Some("http") && !self.domains.is_government(&host.host)
            {
                result.push(Flag::new(
                    Signal::InsecureScheme,
                    self.weights.insecure_scheme,
                    candidate.raw.clone(),
                ));
            }
        }

        let foreign = ScriptDetector::foreign_chars(&candidate.raw);
        if !foreign.is_empty() {
            result.push(Flag::new(
                Signal::ForeignScript,
                self.weights.foreign_script,
                foreign.iter().collect::<String>(),
            ));
        }

        let keywords: Vec<&str> = self
            .credential_keywords
            .iter()
            .filter(|k| url.contains(k.as_str()))
            .map(|k| k.as_str())
            .collect();
        if keywords.len() >= self.thresholds.min_credential_keywords {
            result.push(Flag::new(
                Signal::CredentialKeywords,
                self.weights.credential_keywords,
                keywords.join(", "),
            ));
        }

        let length = url.chars().count();
        if length > self.thresholds.long_url_chars {
            result.push(Flag::new(
                Signal::LongUrl,
                self.weights.long_url,
                format!("{} characters", length),
            ));
        }

        if url.contains('@') {
            result.push(Flag::new(
                Signal::AtSymbol,
                self.weights.at_symbol,
                candidate.raw.clone(),
            ));
        }

        result
    }

    pub fn is_trusted(&self, candidate: &CandidateUrl) -> bool {
        candidate
            .parse_host()
            .map(|h| !h.is_ip_literal && self.domains.is_trusted(&h.host))
            .unwrap_or(false)
    }
}

impl SignalAnalyzer for UrlStructureAnalyzer {
    fn analyze(&self, context: &MessageContext) -> SignalScore {
        let mut total = SignalScore::new(self.name());
        for candidate in context.urls {
            total.merge(self.analyze_url(candidate));
        }
        total
    }

    fn name(&self) -> &str {
        "url_structure"
    }
}
