use crate::error::EngineError;
use serde::{Deserialize, Serialize};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Complete, immutable engine configuration.
///
/// Built once at startup (defaults or YAML) and shared read-only by every
/// analyzer the engine constructs from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub limits: LimitsConfig,
    pub weights: RiskWeights,
    pub thresholds: SignalThresholds,
    pub tiers: TierThresholds,
    pub external: ExternalBlendConfig,
    pub policy: PolicyConfig,
    pub domains: DomainConfig,
    pub lexicons: LexiconConfig,
    pub misspellings: Vec<String>,
    pub credential_keywords: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            limits: LimitsConfig::default(),
            weights: RiskWeights::default(),
            thresholds: SignalThresholds::default(),
            tiers: TierThresholds::default(),
            external: ExternalBlendConfig::default(),
            policy: PolicyConfig::default(),
            domains: DomainConfig::default(),
            lexicons: LexiconConfig::default(),
            misspellings: default_misspellings(),
            credential_keywords: default_credential_keywords(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_message_chars: usize,
    pub max_display_flags: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_message_chars: 5000,
            max_display_flags: 8,
        }
    }
}

/// Penalty (positive) or bonus (negative) per signal
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskWeights {
    // URL structure
    pub ip_literal_host: i32,
    pub non_standard_port: i32,
    pub deep_subdomains: i32,
    pub foreign_script: i32,
    pub credential_keywords: i32,
    pub long_url: i32,
    pub at_symbol: i32,
    pub excessive_hyphens: i32,
    pub shortener: i32,
    pub insecure_scheme: i32,
    pub suspicious_tld: i32,
    pub official_domain: i32,

    // Message text
    pub urgency_per_match: i32,
    pub urgency_cap: i32,
    pub pressure_per_match: i32,
    pub pressure_cap: i32,
    pub impersonation: i32,
    pub sensitive_data: i32,
    pub unofficial_source: i32,
    pub multiple_urls: i32,
    pub mixed_script: i32,
    pub misspelling: i32,
    pub trusted_source: i32,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            ip_literal_host: 40,
            non_standard_port: 18,
            deep_subdomains: 25,
            foreign_script: 45,
            credential_keywords: 35,
            long_url: 15,
            at_symbol: 30,
            excessive_hyphens: 20,
            shortener: 30,
            insecure_scheme: 25,
            suspicious_tld: 30,
            official_domain: -25,

            urgency_per_match: 8,
            urgency_cap: 24,
            pressure_per_match: 5,
            pressure_cap: 20,
            impersonation: 40,
            sensitive_data: 28,
            unofficial_source: 12,
            multiple_urls: 28,
            mixed_script: 12,
            misspelling: 15,
            trusted_source: -20,
        }
    }
}

/// Trigger points for the counted signals
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    /// URL longer than this many characters
    pub long_url_chars: usize,
    /// More host labels than this
    pub max_host_labels: usize,
    /// More hyphens in the host than this
    pub max_host_hyphens: usize,
    pub min_credential_keywords: usize,
    pub min_multiple_urls: usize,
    pub min_pressure_matches: usize,
    pub mixed_script_min_letters: usize,
    pub mixed_script_min_ratio: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            long_url_chars: 100,
            max_host_labels: 4,
            max_host_hyphens: 3,
            min_credential_keywords: 2,
            min_multiple_urls: 3,
            min_pressure_matches: 3,
            mixed_script_min_letters: 20,
            mixed_script_min_ratio: 0.35,
        }
    }
}

/// Inclusive upper bounds of the lower three tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    pub safe_max: u8,
    pub low_risk_max: u8,
    pub suspicious_max: u8,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            safe_max: 30,
            low_risk_max: 55,
            suspicious_max: 75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalBlendConfig {
    pub high_confidence: f64,
    pub high_bump: i32,
    pub medium_confidence: f64,
    pub medium_bump: i32,
    pub low_confidence: f64,
    pub low_bump: i32,
}

impl Default for ExternalBlendConfig {
    fn default() -> Self {
        Self {
            high_confidence: 0.75,
            high_bump: 35,
            medium_confidence: 0.50,
            medium_bump: 20,
            low_confidence: 0.30,
            low_bump: 8,
        }
    }
}

/// How an allow-listed host interacts with the other URL checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustedDomainPolicy {
    /// Bonus only; remaining structural checks for that URL are skipped
    #[default]
    ShortCircuit,
    /// Bonus is added and every other check still runs
    Offset,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    pub trusted_domain: TrustedDomainPolicy,
    /// Withhold the message-level trusted-source bonus when a shortener is
    /// present or sensitive data is requested
    pub guard_trust_bonus: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DomainConfig {
    pub trusted: Vec<String>,
    pub shorteners: Vec<String>,
    pub suspicious_tlds: Vec<String>,
    pub government_suffixes: Vec<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            trusted: strings(&[
                "absher.sa",
                "najiz.sa",
                "moi.gov.sa",
                "moj.gov.sa",
                "spa.gov.sa",
                "my.gov.sa",
                "gov.sa",
                "nafath.sa",
                "stc.com.sa",
                "mobily.com.sa",
                "sa.zain.com",
                "alrajhibank.com.sa",
                "alahli.com",
                "snb.com",
                "riyadbank.com",
                "splonline.com.sa",
                "aramex.com",
                "smsaexpress.com",
                "dhl.com",
                "saudia.com",
            ]),
            shorteners: strings(&[
                "bit.ly",
                "bitly.com",
                "tinyurl.com",
                "t.co",
                "goo.gl",
                "ow.ly",
                "short.link",
                "is.gd",
                "v.gd",
                "tiny.cc",
                "rb.gy",
                "cutt.ly",
                "shorturl.at",
                "u.to",
                "t.ly",
                "s.id",
                "buff.ly",
                "rebrand.ly",
            ]),
            suspicious_tlds: strings(&[
                "tk", "ml", "ga", "cf", "gq", "xyz", "top", "icu", "buzz", "click", "link",
                "work", "rest", "cam", "zip", "mov",
            ]),
            government_suffixes: strings(&["gov.sa", "gov"]),
        }
    }
}

/// Phrase lists for one language
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PhishingLexicon {
    pub urgency: Vec<String>,
    pub action: Vec<String>,
    pub threat: Vec<String>,
    pub reward: Vec<String>,
    pub verification: Vec<String>,
    pub sensitive_data: Vec<String>,
    pub organizations: Vec<String>,
}

impl PhishingLexicon {
    pub fn english() -> Self {
        Self {
            urgency: strings(&[
                "urgent",
                "immediately",
                "suspended",
                "within 24 hours",
                "within 48 hours",
                "expires today",
                "last chance",
                "act now",
                "as soon as possible",
                "final notice",
                "right away",
            ]),
            action: strings(&[
                "click",
                "tap here",
                "open the link",
                "follow the link",
                "update now",
                "log in",
                "sign in",
                "pay now",
                "reply with",
                "download",
            ]),
            threat: strings(&[
                "blocked",
                "locked",
                "terminated",
                "deactivated",
                "legal action",
                "penalty",
                "will be deleted",
                "arrest",
                "disconnected",
            ]),
            reward: strings(&[
                "congratulations",
                "winner",
                "you have won",
                "prize",
                "reward",
                "gift",
                "cashback",
                "refund",
                "bonus",
                "lottery",
            ]),
            verification: strings(&[
                "verify",
                "confirm your",
                "update your",
                "validate",
                "reactivate",
                "authenticate",
            ]),
            sensitive_data: strings(&[
                "password",
                "pin",
                "otp",
                "one-time password",
                "verification code",
                "cvv",
                "card number",
                "national id",
                "iqama",
                "id number",
                "iban",
            ]),
            organizations: strings(&[
                "absher",
                "najiz",
                "tawakkalna",
                "nafath",
                "sehhaty",
                "ministry",
                "moi",
                "moj",
                "gosi",
                "zakat",
                "saudi post",
                "spl",
                "stc",
                "mobily",
                "zain",
                "al rajhi",
                "alrajhi",
                "snb",
                "riyad bank",
                "aramex",
                "smsa",
                "dhl",
                "saudia",
            ]),
        }
    }

    pub fn arabic() -> Self {
        Self {
            urgency: strings(&[
                "عاجل",
                "فورا",
                "حالا",
                "خلال 24 ساعة",
                "خلال ٢٤ ساعة",
                "تم إيقاف",
                "معلق",
                "آخر فرصة",
                "في أقرب وقت",
            ]),
            action: strings(&[
                "اضغط",
                "انقر",
                "ادخل على الرابط",
                "افتح الرابط",
                "سجل دخولك",
                "ادفع الآن",
            ]),
            threat: strings(&[
                "تم حظر",
                "سيتم حذف",
                "سيتم إيقاف",
                "إغلاق حسابك",
                "غرامة",
                "إجراء قانوني",
                "تعليق حسابك",
            ]),
            reward: strings(&[
                "مبروك",
                "فزت",
                "ربحت",
                "جائزة",
                "مكافأة",
                "هدية",
                "مجانا",
                "استرداد",
            ]),
            verification: strings(&["تحقق", "تأكيد", "تحديث بيانات", "توثيق", "تفعيل"]),
            sensitive_data: strings(&[
                "كلمة المرور",
                "كلمة السر",
                "رمز التحقق",
                "الرقم السري",
                "رقم البطاقة",
                "رقم الهوية",
                "رمز التفعيل",
                "بطاقة",
            ]),
            organizations: strings(&[
                "أبشر",
                "ناجز",
                "توكلنا",
                "نفاذ",
                "صحتي",
                "وزارة",
                "الجوازات",
                "البريد السعودي",
                "الراجحي",
                "الأهلي",
                "أرامكس",
                "سمسا",
                "الزكاة",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconConfig {
    pub en: PhishingLexicon,
    pub ar: PhishingLexicon,
}

impl Default for LexiconConfig {
    fn default() -> Self {
        Self {
            en: PhishingLexicon::english(),
            ar: PhishingLexicon::arabic(),
        }
    }
}

pub fn default_misspellings() -> Vec<String> {
    strings(&[
        "abshar",
        "absheer",
        "abshir",
        "absherr",
        "absh3r",
        "najez",
        "nagiz",
        "najjiz",
        "tawakalna",
        "tawaklna",
        "nafaz",
        "sehaty",
        "alrajhe",
        "aramix",
    ])
}

pub fn default_credential_keywords() -> Vec<String> {
    strings(&[
        "login", "signin", "sign-in", "logon", "verify", "account", "update", "secure",
        "billing", "password", "confirm", "banking", "wallet", "auth", "unlock", "webscr",
    ])
}

impl EngineConfig {
    pub fn from_file(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file(&self, path: &str) -> Result<(), EngineError> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.limits.max_message_chars == 0 {
            return Err(EngineError::InvalidConfig(
                "limits.max_message_chars must be positive".to_string(),
            ));
        }

        let t = &self.tiers;
        if !(t.safe_max < t.low_risk_max && t.low_risk_max < t.suspicious_max && t.suspicious_max < 100)
        {
            return Err(EngineError::InvalidConfig(format!(
                "tier thresholds must ascend below 100 (got {}, {}, {})",
                t.safe_max, t.low_risk_max, t.suspicious_max
            )));
        }

        let e = &self.external;
        for confidence in [e.high_confidence, e.medium_confidence, e.low_confidence] {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(EngineError::InvalidConfig(format!(
                    "external confidence {} is outside [0, 1]",
                    confidence
                )));
            }
        }
        if !(e.high_confidence > e.medium_confidence && e.medium_confidence > e.low_confidence) {
            return Err(EngineError::InvalidConfig(
                "external confidence tiers must descend high > medium > low".to_string(),
            ));
        }

        if !(0.0..=0.5).contains(&self.thresholds.mixed_script_min_ratio) {
            return Err(EngineError::InvalidConfig(
                "thresholds.mixed_script_min_ratio must be within [0, 0.5]".to_string(),
            ));
        }

        if self.domains.trusted.is_empty() {
            return Err(EngineError::InvalidConfig(
                "domains.trusted must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiers.safe_max, 30);
        assert!(config.weights.official_domain < 0);
        assert!(config.weights.trusted_source < 0);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
tiers:
  safe_max: 25
  low_risk_max: 50
  suspicious_max: 65
policy:
  trusted_domain: offset
"#;
        let config: EngineConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.tiers.safe_max, 25);
        assert_eq!(config.policy.trusted_domain, TrustedDomainPolicy::Offset);
        assert_eq!(config.weights.shortener, 30);
        assert!(!config.lexicons.ar.urgency.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_tiers_rejected() {
        let mut config = EngineConfig::default();
        config.tiers.low_risk_max = 20;
        assert!(matches!(
            config.validate(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_external_tiers_rejected() {
        let mut config = EngineConfig::default();
        config.external.medium_confidence = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_yaml_round_trip_preserves_lexicons() {
        let config = EngineConfig::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.lexicons.ar.organizations, config.lexicons.ar.organizations);
        assert_eq!(parsed.domains.trusted, config.domains.trusted);
    }
}
