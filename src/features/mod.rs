pub mod lexicon;
pub mod text_patterns;
pub mod url_structure;

use crate::script::Language;
use crate::url_extractor::CandidateUrl;
use serde::{Deserialize, Serialize};

/// Broad family a flag belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagCategory {
    Structural,
    Lexical,
    Impersonation,
    DataRequest,
    SourceTrust,
    External,
}

/// Language-neutral identifier of one risk signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    IpLiteralHost,
    NonStandardPort,
    DeepSubdomains,
    ForeignScript,
    CredentialKeywords,
    LongUrl,
    AtSymbol,
    ExcessiveHyphens,
    Shortener,
    InsecureScheme,
    SuspiciousTld,
    OfficialDomain,
    UrgencyLanguage,
    PressureTactics,
    Impersonation,
    SensitiveDataRequest,
    UnofficialSource,
    MultipleUrls,
    MixedScript,
    MisspelledOfficialName,
    TrustedSource,
    ExternalConfidence,
    ExternalFlaggedUrl,
}

impl Signal {
    pub fn category(&self) -> FlagCategory {
        match self {
            Signal::IpLiteralHost
            | Signal::NonStandardPort
            | Signal::DeepSubdomains
            | Signal::ForeignScript
            | Signal::CredentialKeywords
            | Signal::LongUrl
            | Signal::AtSymbol
            | Signal::ExcessiveHyphens
            | Signal::Shortener
            | Signal::InsecureScheme
            | Signal::SuspiciousTld => FlagCategory::Structural,
            Signal::UrgencyLanguage
            | Signal::PressureTactics
            | Signal::MultipleUrls
            | Signal::MixedScript => FlagCategory::Lexical,
            Signal::Impersonation | Signal::MisspelledOfficialName => FlagCategory::Impersonation,
            Signal::SensitiveDataRequest => FlagCategory::DataRequest,
            Signal::OfficialDomain | Signal::TrustedSource | Signal::UnofficialSource => {
                FlagCategory::SourceTrust
            }
            Signal::ExternalConfidence | Signal::ExternalFlaggedUrl => FlagCategory::External,
        }
    }

    pub fn description(&self, language: Language) -> &'static str {
        match language {
            Language::En => self.description_en(),
            Language::Ar => self.description_ar(),
        }
    }

    fn description_en(&self) -> &'static str {
        match self {
            Signal::IpLiteralHost => "Link uses a raw IP address instead of a domain name",
            Signal::NonStandardPort => "Link uses an unusual port",
            Signal::DeepSubdomains => "Link hides its real domain behind many subdomains",
            Signal::ForeignScript => "Link contains look-alike characters from another alphabet",
            Signal::CredentialKeywords => "Link is built around login or verification words",
            Signal::LongUrl => "Link is unusually long",
            Signal::AtSymbol => "Link contains '@', which can hide the real destination",
            Signal::ExcessiveHyphens => "Link domain contains many hyphens",
            Signal::Shortener => "Shortened link hides its real destination",
            Signal::InsecureScheme => "Link does not use a secure connection",
            Signal::SuspiciousTld => "Link uses a domain ending often abused by scammers",
            Signal::OfficialDomain => "Link belongs to a verified official domain",
            Signal::UrgencyLanguage => "Urgency and pressure language",
            Signal::PressureTactics => "Several manipulation phrases combined",
            Signal::Impersonation => "Mentions an official entity but links elsewhere",
            Signal::SensitiveDataRequest => "Requests sensitive data such as passwords or codes",
            Signal::UnofficialSource => "Links do not come from an official source",
            Signal::MultipleUrls => "Contains many different links",
            Signal::MixedScript => "Unusual mix of Arabic and Latin text",
            Signal::MisspelledOfficialName => "Misspelled name of an official service",
            Signal::TrustedSource => "Message links to a trusted official source",
            Signal::ExternalConfidence => "Automated classifier rates this message as risky",
            Signal::ExternalFlaggedUrl => "Automated classifier flagged this link",
        }
    }

    fn description_ar(&self) -> &'static str {
        match self {
            Signal::IpLiteralHost => "الرابط يستخدم عنوان IP بدلاً من اسم نطاق",
            Signal::NonStandardPort => "الرابط يستخدم منفذاً غير معتاد",
            Signal::DeepSubdomains => "الرابط يخفي نطاقه الحقيقي خلف نطاقات فرعية كثيرة",
            Signal::ForeignScript => "الرابط يحتوي على أحرف مشابهة من لغة أخرى",
            Signal::CredentialKeywords => "الرابط يحتوي على كلمات دخول أو تحقق",
            Signal::LongUrl => "الرابط طويل بشكل غير معتاد",
            Signal::AtSymbol => "الرابط يحتوي على @ وقد يخفي الوجهة الحقيقية",
            Signal::ExcessiveHyphens => "نطاق الرابط يحتوي على شرطات كثيرة",
            Signal::Shortener => "روابط مختصرة تخفي الوجهة الحقيقية",
            Signal::InsecureScheme => "اتصال غير آمن",
            Signal::SuspiciousTld => "نطاق بامتداد يكثر استخدامه في الاحتيال",
            Signal::OfficialDomain => "الرابط تابع لنطاق رسمي موثوق",
            Signal::UrgencyLanguage => "أسلوب الاستعجال والضغط",
            Signal::PressureTactics => "عبارات ضغط وإغراء متعددة",
            Signal::Impersonation => "انتحال صفة جهة رسمية",
            Signal::SensitiveDataRequest => "طلب معلومات حساسة",
            Signal::UnofficialSource => "رابط غير موثوق",
            Signal::MultipleUrls => "الرسالة تحتوي على روابط متعددة",
            Signal::MixedScript => "خلط غير معتاد بين العربية والإنجليزية",
            Signal::MisspelledOfficialName => "اسم جهة رسمية مكتوب بشكل خاطئ",
            Signal::TrustedSource => "الرسالة من مصدر رسمي موثوق",
            Signal::ExternalConfidence => "نموذج التحليل الآلي يرجح أن الرسالة خطرة",
            Signal::ExternalFlaggedUrl => "نموذج التحليل الآلي صنف هذا الرابط كخطر",
        }
    }
}

/// One triggered signal with the weight it contributed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flag {
    pub signal: Signal,
    pub category: FlagCategory,
    pub weight: i32,
    /// Evidence: the URL or terms that triggered the signal
    pub detail: String,
}

impl Flag {
    pub fn new(signal: Signal, weight: i32, detail: impl Into<String>) -> Self {
        Self {
            signal,
            category: signal.category(),
            weight,
            detail: detail.into(),
        }
    }

    pub fn description(&self, language: Language) -> &'static str {
        self.signal.description(language)
    }
}

/// Output of one analyzer over one message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignalScore {
    pub analyzer: String,
    pub score: i32,
    pub flags: Vec<Flag>,
}

impl SignalScore {
    pub fn new(analyzer: &str) -> Self {
        Self {
            analyzer: analyzer.to_string(),
            score: 0,
            flags: Vec::new(),
        }
    }

    pub fn push(&mut self, flag: Flag) {
        log::debug!(
            "{}: {:?} ({:+}) {}",
            self.analyzer,
            flag.signal,
            flag.weight,
            flag.detail
        );
        self.score += flag.weight;
        self.flags.push(flag);
    }

    pub fn merge(&mut self, other: SignalScore) {
        self.score += other.score;
        self.flags.extend(other.flags);
    }
}

/// Everything an analyzer may look at for one message
#[derive(Debug, Clone)]
pub struct MessageContext<'a> {
    pub text: &'a str,
    pub lower: String,
    pub urls: &'a [CandidateUrl],
}

impl<'a> MessageContext<'a> {
    pub fn new(text: &'a str, urls: &'a [CandidateUrl]) -> Self {
        Self {
            text,
            lower: text.to_lowercase(),
            urls,
        }
    }
}

pub trait SignalAnalyzer: Send + Sync {
    fn analyze(&self, context: &MessageContext) -> SignalScore;
    fn name(&self) -> &str;
}
