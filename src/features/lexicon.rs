use crate::config::LexiconConfig;
use crate::error::EngineError;
use regex::RegexSet;

/// Matches a fixed list of terms against lowercased text.
///
/// ASCII terms match on word boundaries. Arabic terms match as substrings
/// since attached prefixes (و، ال، ب) defeat word boundaries.
#[derive(Debug, Clone)]
pub struct TermMatcher {
    ascii_terms: Vec<String>,
    ascii_set: RegexSet,
    other_terms: Vec<String>,
}

impl TermMatcher {
    pub fn new(terms: &[String]) -> Result<Self, EngineError> {
        let mut ascii_terms = Vec::new();
        let mut other_terms = Vec::new();

        for term in terms {
            let term = term.trim().to_lowercase();
            if term.is_empty() || ascii_terms.contains(&term) || other_terms.contains(&term) {
                continue;
            }
            if term.is_ascii() {
                ascii_terms.push(term);
            } else {
                other_terms.push(term);
            }
        }

        let patterns: Vec<String> = ascii_terms
            .iter()
            .map(|t| format!(r"(?i)\b{}\b", regex::escape(t)))
            .collect();

        Ok(Self {
            ascii_set: RegexSet::new(&patterns)?,
            ascii_terms,
            other_terms,
        })
    }

    /// Distinct terms present in the text
    pub fn matches(&self, lower_text: &str) -> Vec<String> {
        let mut found: Vec<String> = self
            .ascii_set
            .matches(lower_text)
            .iter()
            .map(|idx| self.ascii_terms[idx].clone())
            .collect();

        found.extend(
            self.other_terms
                .iter()
                .filter(|t| lower_text.contains(t.as_str()))
                .cloned(),
        );

        found
    }

    pub fn count(&self, lower_text: &str) -> usize {
        self.matches(lower_text).len()
    }

    pub fn is_match(&self, lower_text: &str) -> bool {
        self.ascii_set.is_match(lower_text)
            || self.other_terms.iter().any(|t| lower_text.contains(t.as_str()))
    }
}

/// Both languages' phrase lists, unioned per category
#[derive(Debug, Clone)]
pub struct CompiledLexicon {
    pub urgency: TermMatcher,
    pub action: TermMatcher,
    pub threat: TermMatcher,
    pub reward: TermMatcher,
    pub verification: TermMatcher,
    pub sensitive_data: TermMatcher,
    pub organizations: TermMatcher,
}

impl CompiledLexicon {
    pub fn from_config(config: &LexiconConfig) -> Result<Self, EngineError> {
        let union = |en: &[String], ar: &[String]| -> Vec<String> {
            en.iter().chain(ar.iter()).cloned().collect()
        };
        let (en, ar) = (&config.en, &config.ar);

        Ok(Self {
            urgency: TermMatcher::new(&union(&en.urgency, &ar.urgency))?,
            action: TermMatcher::new(&union(&en.action, &ar.action))?,
            threat: TermMatcher::new(&union(&en.threat, &ar.threat))?,
            reward: TermMatcher::new(&union(&en.reward, &ar.reward))?,
            verification: TermMatcher::new(&union(&en.verification, &ar.verification))?,
            sensitive_data: TermMatcher::new(&union(&en.sensitive_data, &ar.sensitive_data))?,
            organizations: TermMatcher::new(&union(&en.organizations, &ar.organizations))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(terms: &[&str]) -> TermMatcher {
        let terms: Vec<String> = terms.iter().map(|t| t.to_string()).collect();
        TermMatcher::new(&terms).unwrap()
    }

    #[test]
    fn test_ascii_terms_respect_word_boundaries() {
        let m = matcher(&["pin", "click"]);
        assert_eq!(m.matches("enter your pin now"), vec!["pin"]);
        assert!(m.matches("shopping spinner").is_empty());
        assert!(m.is_match("click the link"));
    }

    #[test]
    fn test_arabic_terms_match_with_prefixes() {
        let m = matcher(&["عاجل", "رمز التحقق"]);
        assert_eq!(m.count("تنبيه وعاجل: أرسل رمز التحقق"), 2);
        assert!(!m.is_match("مرحبا بك"));
    }

    #[test]
    fn test_duplicates_counted_once() {
        let m = matcher(&["urgent", "URGENT", " urgent "]);
        assert_eq!(m.count("urgent urgent urgent"), 1);
    }

    #[test]
    fn test_phrases_with_spaces() {
        let m = matcher(&["within 24 hours"]);
        assert!(m.is_match("update within 24 hours please"));
        assert!(!m.is_match("within 240 hours"));
    }

    #[test]
    fn test_compiled_default_lexicon() {
        let lexicon = CompiledLexicon::from_config(&LexiconConfig::default()).unwrap();
        assert!(lexicon.organizations.is_match("your absher account"));
        assert!(lexicon.organizations.is_match("حسابك في أبشر"));
        assert!(lexicon.sensitive_data.is_match("send the otp"));
    }
}
