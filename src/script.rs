use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Display language for flag descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            other => Err(format!("Unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Ar => write!(f, "ar"),
        }
    }
}

/// Letter counts per script family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptCounts {
    pub arabic: usize,
    pub latin: usize,
}

impl ScriptCounts {
    pub fn total(&self) -> usize {
        self.arabic + self.latin
    }

    /// Share of the smaller script among all counted letters
    pub fn minority_ratio(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        self.arabic.min(self.latin) as f64 / total as f64
    }
}

pub struct ScriptDetector;

impl ScriptDetector {
    pub fn is_arabic(c: char) -> bool {
        matches!(c,
            '\u{0600}'..='\u{06FF}' |  // Arabic
            '\u{0750}'..='\u{077F}' |  // Arabic Supplement
            '\u{08A0}'..='\u{08FF}' |  // Arabic Extended-A
            '\u{FB50}'..='\u{FDFF}' |  // Presentation Forms-A
            '\u{FE70}'..='\u{FEFF}'    // Presentation Forms-B
        )
    }

    pub fn contains_arabic(text: &str) -> bool {
        text.chars().any(Self::is_arabic)
    }

    /// Characters outside ASCII that are not Arabic script (look-alike candidates)
    pub fn foreign_chars(text: &str) -> Vec<char> {
        let mut found: Vec<char> = Vec::new();
        for c in text.chars() {
            if !c.is_ascii() && !Self::is_arabic(c) && !found.contains(&c) {
                found.push(c);
            }
        }
        found
    }

    pub fn count_scripts(text: &str) -> ScriptCounts {
        let mut counts = ScriptCounts::default();
        for c in text.chars() {
            if c.is_ascii_alphabetic() {
                counts.latin += 1;
            } else if Self::is_arabic(c) && c.is_alphabetic() {
                counts.arabic += 1;
            }
        }
        counts
    }

    /// Dominant display language of a message
    pub fn detect_language(text: &str) -> Language {
        let counts = Self::count_scripts(text);
        if counts.arabic > counts.latin {
            Language::Ar
        } else {
            Language::En
        }
    }
}
