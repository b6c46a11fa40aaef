use super::lexicon::{CompiledLexicon, TermMatcher};
use super::{Flag, MessageContext, Signal, SignalAnalyzer, SignalScore};
use crate::config::{EngineConfig, RiskWeights, SignalThresholds};
use crate::domain_utils::{DomainLists, DomainUtils};
use crate::error::EngineError;
use crate::script::ScriptDetector;

/// Lexical and message-level signals, run over both lexicons at once
pub struct TextPatternAnalyzer {
    weights: RiskWeights,
    thresholds: SignalThresholds,
    guard_trust_bonus: bool,
    domains: DomainLists,
    lexicon: CompiledLexicon,
    misspellings: TermMatcher,
}

#[derive(Debug, Default)]
struct UrlTrust {
    trusted: Vec<String>,
    has_shortener: bool,
}

impl TextPatternAnalyzer {
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            weights: config.weights.clone(),
            thresholds: config.thresholds.clone(),
            guard_trust_bonus: config.policy.guard_trust_bonus,
            domains: DomainLists::from_config(&config.domains),
            lexicon: CompiledLexicon::from_config(&config.lexicons)?,
            misspellings: TermMatcher::new(&config.misspellings)?,
        })
    }

    fn url_trust(&self, context: &MessageContext) -> UrlTrust {
        let mut trust = UrlTrust::default();
        for candidate in context.urls {
            let Some(parsed) = candidate.parse_host() else {
                continue;
            };
            if parsed.is_ip_literal {
                continue;
            }
            if self.domains.is_trusted(&parsed.host) {
                trust
                    .trusted
                    .push(DomainUtils::canonicalize_domain(&parsed.host));
            }
            if self.domains.is_shortener(&parsed.host) {
                trust.has_shortener = true;
            }
        }
        trust
    }

    fn check_urgency(&self, lower: &str, result: &mut SignalScore) -> usize {
        let urgency = self.lexicon.urgency.matches(lower);
        if !urgency.is_empty() {
            let weight =
                (urgency.len() as i32 * self.weights.urgency_per_match).min(self.weights.urgency_cap);
            result.push(Flag::new(
                Signal::UrgencyLanguage,
                weight,
                urgency.join(", "),
            ));
        }
        urgency.len()
    }

    /// Urgency, action, threat, reward and verification phrases together
    fn check_pressure(&self, lower: &str, urgency_count: usize, result: &mut SignalScore) {
        let others = [
            ("action", self.lexicon.action.count(lower)),
            ("threat", self.lexicon.threat.count(lower)),
            ("reward", self.lexicon.reward.count(lower)),
            ("verification", self.lexicon.verification.count(lower)),
        ];
        let total = urgency_count + others.iter().map(|(_, n)| n).sum::<usize>();

        if total >= self.thresholds.min_pressure_matches {
            let weight =
                (total as i32 * self.weights.pressure_per_match).min(self.weights.pressure_cap);
            let mut parts = vec![format!("urgency: {}", urgency_count)];
            parts.extend(
                others
                    .iter()
                    .filter(|(_, n)| *n > 0)
                    .map(|(name, n)| format!("{}: {}", name, n)),
            );
            result.push(Flag::new(Signal::PressureTactics, weight, parts.join(", ")));
        }
    }

    fn check_mixed_script(&self, context: &MessageContext, result: &mut SignalScore) {
        let mut text = context.text.to_string();
        for candidate in context.urls {
            text = text.replace(&candidate.raw, " ");
        }

        let counts = ScriptDetector::count_scripts(&text);
        if counts.total() >= self.thresholds.mixed_script_min_letters
            && counts.minority_ratio() >= self.thresholds.mixed_script_min_ratio
        {
            result.push(Flag::new(
                Signal::MixedScript,
                self.weights.mixed_script,
                format!("arabic: {}, latin: {}", counts.arabic, counts.latin),
            ));
        }
    }
}

impl SignalAnalyzer for TextPatternAnalyzer {
    fn analyze(&self, context: &MessageContext) -> SignalScore {
        let mut result = SignalScore::new(self.name());
        let lower = context.lower.as_str();
        let trust = self.url_trust(context);
        let has_urls = !context.urls.is_empty();
        let any_trusted = !trust.trusted.is_empty();

        let urgency_count = self.check_urgency(lower, &mut result);
        self.check_pressure(lower, urgency_count, &mut result);

        let organizations = self.lexicon.organizations.matches(lower);
        if !organizations.is_empty() && has_urls && !any_trusted {
            result.push(Flag::new(
                Signal::Impersonation,
                self.weights.impersonation,
                organizations.join(", "),
            ));
        }

        let sensitive = self.lexicon.sensitive_data.matches(lower);
        if !sensitive.is_empty() {
            result.push(Flag::new(
                Signal::SensitiveDataRequest,
                self.weights.sensitive_data,
                sensitive.join(", "),
            ));
        }

        if has_urls && !any_trusted {
            result.push(Flag::new(
                Signal::UnofficialSource,
                self.weights.unofficial_source,
                format!("{} untrusted links", context.urls.len()),
            ));
        }

        if context.urls.len() >= self.thresholds.min_multiple_urls {
            result.push(Flag::new(
                Signal::MultipleUrls,
                self.weights.multiple_urls,
                format!("{} distinct links", context.urls.len()),
            ));
        }

        self.check_mixed_script(context, &mut result);

        for term in self.misspellings.matches(lower) {
            result.push(Flag::new(
                Signal::MisspelledOfficialName,
                self.weights.misspelling,
                term,
            ));
        }

        if any_trusted {
            let guarded = self.guard_trust_bonus && (trust.has_shortener || !sensitive.is_empty());
            if guarded {
                log::debug!("Trusted-source bonus withheld by trust guard");
            } else {
                result.push(Flag::new(
                    Signal::TrustedSource,
                    self.weights.trusted_source,
                    trust.trusted.join(", "),
                ));
            }
        }

        result
    }

    fn name(&self) -> &str {
        "text_patterns"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url_extractor::UrlExtractor;

    fn run_with(config: &EngineConfig, text: &str) -> SignalScore {
        let analyzer = TextPatternAnalyzer::from_config(config).unwrap();
        let urls = UrlExtractor::new().extract(text);
        let context = MessageContext::new(text, &urls);
        analyzer.analyze(&context)
    }

    fn run(text: &str) -> SignalScore {
        run_with(&EngineConfig::default(), text)
    }

    fn signals(result: &SignalScore) -> Vec<Signal> {
        result.flags.iter().map(|f| f.signal).collect()
    }

    #[test]
    fn test_plain_message_scores_zero() {
        let result = run("See you at dinner tomorrow");
        assert!(result.flags.is_empty());
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_urgency_is_capped() {
        let result = run("URGENT: act now, immediately, last chance, final notice, expires today");
        let urgency = result
            .flags
            .iter()
            .find(|f| f.signal == Signal::UrgencyLanguage)
            .unwrap();
        assert_eq!(urgency.weight, 24);
    }

    #[test]
    fn test_pressure_needs_three_matches() {
        let two = run("Congratulations winner");
        assert!(!signals(&two).contains(&Signal::PressureTactics));

        let three = run("Congratulations winner, click to claim your prize");
        let flag = three
            .flags
            .iter()
            .find(|f| f.signal == Signal::PressureTactics)
            .unwrap();
        assert_eq!(flag.weight, 20);
    }

    #[test]
    fn test_impersonation_and_unofficial_source_co_fire() {
        let result = run("Absher: your request is ready at absher-services.com");
        let s = signals(&result);
        assert!(s.contains(&Signal::Impersonation));
        assert!(s.contains(&Signal::UnofficialSource));
        assert!(!s.contains(&Signal::TrustedSource));
    }

    #[test]
    fn test_organization_without_links_is_not_impersonation() {
        let result = run("تم تحديث خدمات أبشر");
        assert!(!signals(&result).contains(&Signal::Impersonation));
    }

    #[test]
    fn test_trusted_link_gives_single_bonus() {
        let result = run("Absher notice: https://www.absher.sa/a and https://najiz.sa/b");
        let s = signals(&result);
        assert!(!s.contains(&Signal::Impersonation));
        assert!(!s.contains(&Signal::UnofficialSource));
        assert_eq!(
            s.iter().filter(|s| **s == Signal::TrustedSource).count(),
            1
        );
        assert_eq!(result.score, -20);
    }

    #[test]
    fn test_sensitive_data_request() {
        let result = run("أرسل رمز التحقق الآن");
        let flag = result
            .flags
            .iter()
            .find(|f| f.signal == Signal::SensitiveDataRequest)
            .unwrap();
        assert_eq!(flag.weight, 28);
        assert_eq!(flag.detail, "رمز التحقق");
    }

    #[test]
    fn test_multiple_urls() {
        let result = run("a.com b.com c.com");
        let s = signals(&result);
        assert!(s.contains(&Signal::MultipleUrls));
        assert!(s.contains(&Signal::UnofficialSource));

        let result = run("a.com b.com");
        assert!(!signals(&result).contains(&Signal::MultipleUrls));
    }

    #[test]
    fn test_mixed_script_ignores_urls() {
        let mixed = run("عزيزي العميل يرجى مراجعة your account details today please");
        assert!(signals(&mixed).contains(&Signal::MixedScript));

        let arabic_with_link =
            run("عزيزي العميل يرجى مراجعة الطلب عبر الرابط https://www.absher.sa/requests/view");
        assert!(!signals(&arabic_with_link).contains(&Signal::MixedScript));
    }

    #[test]
    fn test_each_misspelling_counts() {
        let result = run("Login to abshar or najez today");
        let count = result
            .flags
            .iter()
            .filter(|f| f.signal == Signal::MisspelledOfficialName)
            .count();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_trust_guard() {
        let text = "Absher: confirm at https://www.absher.sa and send your password";
        let unguarded = run(text);
        assert!(signals(&unguarded).contains(&Signal::TrustedSource));

        let mut config = EngineConfig::default();
        config.policy.guard_trust_bonus = true;
        let guarded = run_with(&config, text);
        assert!(!signals(&guarded).contains(&Signal::TrustedSource));
        assert!(signals(&guarded).contains(&Signal::SensitiveDataRequest));
    }
}
