use crate::classifier::{Classifier, RiskTier};
use crate::config::EngineConfig;
use crate::error::{EngineError, InputError};
use crate::features::text_patterns::TextPatternAnalyzer;
use crate::features::url_structure::UrlStructureAnalyzer;
use crate::features::{Flag, MessageContext, SignalAnalyzer, SignalScore};
use crate::scoring::{self, ExternalScore, ScoreBlender};
use crate::url_extractor::UrlExtractor;
use serde::{Deserialize, Serialize};

/// Outcome of one analysis call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Final score in [0, 100], after any external blend
    pub score: u8,
    /// Score from the built-in signals alone
    pub internal_score: u8,
    pub tier: RiskTier,
    /// Triggered flags in insertion order, truncated for display
    pub flags: Vec<Flag>,
    pub total_flags: usize,
    pub urls_found: usize,
    pub urls: Vec<String>,
    /// Input exceeded the message limit and only its prefix was analyzed
    pub truncated: bool,
}

/// The full scoring pipeline. Immutable once built, so one engine can
/// serve any number of threads.
pub struct RiskEngine {
    config: EngineConfig,
    extractor: UrlExtractor,
    analyzers: Vec<Box<dyn SignalAnalyzer>>,
    blender: ScoreBlender,
    classifier: Classifier,
}

impl RiskEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;

        let analyzers: Vec<Box<dyn SignalAnalyzer>> = vec![
            Box::new(UrlStructureAnalyzer::from_config(&config)),
            Box::new(TextPatternAnalyzer::from_config(&config)?),
        ];

        Ok(Self {
            extractor: UrlExtractor::new(),
            analyzers,
            blender: ScoreBlender::from_config(&config.external),
            classifier: Classifier::new(config.tiers, config.limits.max_display_flags),
            config,
        })
    }

    pub fn with_defaults() -> Result<Self, EngineError> {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Caller-side check for messages that should be refused outright
    pub fn validate_message(&self, message: &str) -> Result<(), InputError> {
        if message.trim().is_empty() {
            return Err(InputError::Empty);
        }
        let chars = message.chars().count();
        let max = self.config.limits.max_message_chars;
        if chars > max {
            return Err(InputError::TooLong { chars, max });
        }
        Ok(())
    }

    /// Score a message. Never fails: over-long input is cut to the limit.
    pub fn analyze(&self, message: &str, external: Option<&ExternalScore>) -> AnalysisResult {
        let (text, truncated) = self.truncate(message);
        let urls = self.extractor.extract(text);
        let context = MessageContext::new(text, &urls);

        let scores: Vec<SignalScore> = self
            .analyzers
            .iter()
            .map(|analyzer| analyzer.analyze(&context))
            .collect();
        let (raw, internal_score) = scoring::aggregate(&scores);

        let (score, external_flags) = self.blender.blend(internal_score, &urls, external);

        let mut flags: Vec<Flag> = scores.into_iter().flat_map(|s| s.flags).collect();
        flags.extend(external_flags);
        let total_flags = flags.len();

        let tier = self.classifier.classify(score);
        log::debug!(
            "Analyzed {} chars: {} urls, {} flags, raw {}, score {} -> {}",
            text.chars().count(),
            urls.len(),
            total_flags,
            raw,
            score,
            tier
        );

        AnalysisResult {
            score,
            internal_score,
            tier,
            flags: self.classifier.display_flags(flags),
            total_flags,
            urls_found: urls.len(),
            urls: urls.into_iter().map(|u| u.normalized).collect(),
            truncated,
        }
    }

    fn truncate<'a>(&self, message: &'a str) -> (&'a str, bool) {
        let max = self.config.limits.max_message_chars;
        match message.char_indices().nth(max) {
            Some((idx, _)) => {
                log::warn!("Message longer than {} characters, truncating", max);
                (&message[..idx], true)
            }
            None => (message, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::Signal;

    fn engine() -> RiskEngine {
        RiskEngine::with_defaults().unwrap()
    }

    fn signals(result: &AnalysisResult) -> Vec<Signal> {
        result.flags.iter().map(|f| f.signal).collect()
    }

    #[test]
    fn test_absher_shortener_scenario() {
        let result = engine().analyze(
            "Your Absher account has been suspended. Click bit.ly/abs123 to update within 24 hours",
            None,
        );
        let s = signals(&result);
        assert!(result.flags.len() >= 3);
        assert!(s.contains(&Signal::Shortener));
        assert!(s.contains(&Signal::UrgencyLanguage));
        assert!(s.contains(&Signal::Impersonation));
        assert!(s.contains(&Signal::UnofficialSource));
        assert_eq!(result.urls, vec!["bit.ly/abs123"]);
        assert_eq!(result.score, 100);
        assert_eq!(result.tier, RiskTier::HighRisk);
    }

    #[test]
    fn test_trusted_bill_scenario() {
        let result = engine().analyze(
            "Your electricity bill is due. Pay at https://www.absher.sa/bills",
            None,
        );
        let s = signals(&result);
        assert!(s.contains(&Signal::OfficialDomain));
        assert!(s.contains(&Signal::TrustedSource));
        assert!(!s.contains(&Signal::Shortener));
        assert!(!s.contains(&Signal::UrgencyLanguage));
        assert_eq!(result.score, 0);
        assert_eq!(result.tier, RiskTier::Safe);
    }

    #[test]
    fn test_empty_message() {
        let result = engine().analyze("", None);
        assert_eq!(result.score, 0);
        assert!(result.flags.is_empty());
        assert_eq!(result.urls_found, 0);
        assert_eq!(result.tier, RiskTier::Safe);
    }

    #[test]
    fn test_many_untrusted_urls_are_additive() {
        let result = engine().analyze(
            "Links: https://alpha-news.com https://beta-shop.net https://gamma.org https://delta.io https://epsilon.info",
            None,
        );
        let s = signals(&result);
        assert_eq!(result.urls_found, 5);
        assert!(s.contains(&Signal::MultipleUrls));
        assert!(s.contains(&Signal::UnofficialSource));
        assert!(result.score > 0);
        assert_eq!(result.score, 40);
        assert_eq!(result.tier, RiskTier::LowRisk);
    }

    #[test]
    fn test_clean_message_without_urls() {
        let result = engine().analyze("See you at the meeting tomorrow at five", None);
        assert_eq!(result.score, 0);
        assert_eq!(result.tier, RiskTier::Safe);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let e = engine();
        let message = "عاجل: تم إيقاف حسابك في أبشر، ادخل على الرابط absher-sa.xyz/login";
        assert_eq!(e.analyze(message, None), e.analyze(message, None));
    }

    #[test]
    fn test_shortener_never_lowers_score() {
        let e = engine();
        let clean = "Hello, the photos from the trip are ready";
        let base = e.analyze(clean, None).score;
        let with_short = e.analyze(&format!("{} bit.ly/trip", clean), None).score;
        assert!(with_short > base);
    }

    #[test]
    fn test_only_trusted_url_is_safe() {
        let result = engine().analyze("https://najiz.sa/cases", None);
        assert!(result.score <= engine().config().tiers.safe_max);
        assert_eq!(result.tier, RiskTier::Safe);
    }

    #[test]
    fn test_score_always_bounded() {
        let e = engine();
        let messages = [
            "URGENT verify your password and pin at http://192.168.0.1:8080/login/verify/account now, abshar winner prize",
            "https://absher.sa https://najiz.sa https://moi.gov.sa https://my.gov.sa",
            "\u{0430}\u{0431}\u{0432} http://xn--80a.tk/@",
        ];
        for m in messages {
            let result = e.analyze(m, Some(&ExternalScore::new(1.0, vec![])));
            assert!(result.score <= 100);
        }
    }

    #[test]
    fn test_external_score_is_optional() {
        let e = engine();
        let message = "Verify your account at secure-login.top";
        let plain = e.analyze(message, None);
        assert_eq!(plain.score, plain.internal_score);

        let blended = e.analyze(message, Some(&ExternalScore::new(0.6, vec![])));
        assert_eq!(blended.internal_score, plain.internal_score);
        assert_eq!(
            blended.score,
            (plain.internal_score as i32 + 20).min(100) as u8
        );
        assert!(signals(&blended).contains(&Signal::ExternalConfidence));
    }

    #[test]
    fn test_external_flag_surfaces_url() {
        let result = engine().analyze(
            "Parcel waiting: smsa-track.link/p/88",
            Some(&ExternalScore::new(
                0.9,
                vec!["smsa-track.link/p/88".to_string()],
            )),
        );
        assert!(signals(&result).contains(&Signal::ExternalFlaggedUrl));
        assert_eq!(result.tier, RiskTier::HighRisk);
    }

    #[test]
    fn test_long_message_is_truncated() {
        let e = engine();
        let message = "ا".repeat(6000);
        let result = e.analyze(&message, None);
        assert!(result.truncated);
        assert!(matches!(
            e.validate_message(&message),
            Err(InputError::TooLong { chars: 6000, max: 5000 })
        ));
    }

    #[test]
    fn test_validate_message() {
        let e = engine();
        assert_eq!(e.validate_message("   "), Err(InputError::Empty));
        assert!(e.validate_message("hello").is_ok());
    }

    #[test]
    fn test_display_flags_truncated_but_counted() {
        let result = engine().analyze(
            "URGENT: verify your password now at http://192.168.1.5:8080/login/verify/account@x a.tk b.tk c.tk abshar",
            None,
        );
        assert!(result.total_flags > result.flags.len());
        assert_eq!(result.flags.len(), 8);
    }

    #[test]
    fn test_engine_is_shareable_across_threads() {
        let e = engine();
        let shared = &e;
        let message = "Your Absher account has been suspended. Click bit.ly/abs123";
        let expected = e.analyze(message, None);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(move || shared.analyze(message, None)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.tiers.safe_max = 90;
        assert!(RiskEngine::new(config).is_err());
    }

    #[test]
    fn test_userinfo_cannot_borrow_trusted_domain() {
        let e = engine();
        for message in [
            "Absher: verify your account at absher.sa@evil-login.tk/verify",
            "Absher: verify your account at absher.sa@evil.tk",
        ] {
            let result = e.analyze(message, None);
            let s = signals(&result);
            assert!(s.contains(&Signal::AtSymbol));
            assert!(s.contains(&Signal::SuspiciousTld));
            assert!(s.contains(&Signal::Impersonation));
            assert!(!s.contains(&Signal::OfficialDomain));
            assert!(!s.contains(&Signal::TrustedSource));
            assert_eq!(result.tier, RiskTier::HighRisk);
        }
    }

    #[test]
    fn test_mailbox_address_is_not_a_link() {
        let result = engine().analyze("Email me at ali.ahmed@gmail.com", None);
        assert_eq!(result.urls_found, 0);
        assert!(!signals(&result).contains(&Signal::UnofficialSource));
        assert_eq!(result.score, 0);
    }

    #[test]
    fn test_bare_homograph_link_flagged() {
        let result = engine().analyze("Login at \u{0430}bsher.sa/verify", None);
        assert_eq!(result.urls_found, 1);
        assert!(signals(&result).contains(&Signal::ForeignScript));
        assert!(!signals(&result).contains(&Signal::OfficialDomain));
        assert!(result.tier >= RiskTier::Suspicious);
    }

    #[test]
    fn test_quoted_link_is_not_foreign_script() {
        let result = engine().analyze("Read the article “https://example.com/news”", None);
        assert_eq!(result.urls, vec!["https://example.com/news"]);
        assert!(!signals(&result).contains(&Signal::ForeignScript));
        assert_eq!(result.tier, RiskTier::Safe);
    }
}
