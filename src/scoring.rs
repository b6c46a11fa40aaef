//! Score aggregation and optional blending of an external confidence.

use crate::config::ExternalBlendConfig;
use crate::features::{Flag, Signal, SignalScore};
use crate::url_extractor::CandidateUrl;
use serde::{Deserialize, Serialize};

pub const MAX_SCORE: i32 = 100;

/// Confidence supplied by an out-of-process classifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalScore {
    /// Probability in [0, 1] that the message is fraudulent
    pub confidence: f64,
    #[serde(default)]
    pub flags: Vec<String>,
}

impl ExternalScore {
    pub fn new(confidence: f64, flags: Vec<String>) -> Self {
        Self { confidence, flags }
    }
}

pub fn clamp_score(raw: i32) -> u8 {
    raw.clamp(0, MAX_SCORE) as u8
}

/// Sum every analyzer's flag weights; returns the raw sum and the clamped score
pub fn aggregate(scores: &[SignalScore]) -> (i32, u8) {
    let raw: i32 = scores
        .iter()
        .flat_map(|s| s.flags.iter())
        .map(|f| f.weight)
        .sum();
    (raw, clamp_score(raw))
}

pub struct ScoreBlender {
    config: ExternalBlendConfig,
}

impl ScoreBlender {
    pub fn from_config(config: &ExternalBlendConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn bump_for(&self, confidence: f64) -> i32 {
        if confidence >= self.config.high_confidence {
            self.config.high_bump
        } else if confidence >= self.config.medium_confidence {
            self.config.medium_bump
        } else if confidence >= self.config.low_confidence {
            self.config.low_bump
        } else {
            0
        }
    }

    /// Blend an external confidence into an already clamped score.
    ///
    /// `None` passes the score through untouched. Returns the re-clamped
    /// score and the flags the blend contributed.
    pub fn blend(
        &self,
        score: u8,
        urls: &[CandidateUrl],
        external: Option<&ExternalScore>,
    ) -> (u8, Vec<Flag>) {
        let Some(external) = external else {
            return (score, Vec::new());
        };
        if external.confidence.is_nan() {
            log::warn!("Ignoring external score with NaN confidence");
            return (score, Vec::new());
        }

        let confidence = external.confidence.clamp(0.0, 1.0);
        let bump = self.bump_for(confidence);
        let mut flags = Vec::new();

        if bump > 0 {
            flags.push(Flag::new(
                Signal::ExternalConfidence,
                bump,
                format!("confidence {:.2}", confidence),
            ));
        }

        if confidence >= self.config.high_confidence {
            for reported in &external.flags {
                let needle = reported.trim().to_lowercase();
                if needle.is_empty() {
                    continue;
                }
                let matched = urls
                    .iter()
                    .any(|u| u.normalized.contains(&needle) || needle.contains(&u.normalized));
                if matched {
                    flags.push(Flag::new(Signal::ExternalFlaggedUrl, 0, reported.trim()));
                }
            }
        }

        log::debug!(
            "External confidence {:.2} adds {:+} to {}",
            confidence,
            bump,
            score
        );
        (clamp_score(score as i32 + bump), flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blender() -> ScoreBlender {
        ScoreBlender::from_config(&ExternalBlendConfig::default())
    }

    #[test]
    fn test_aggregate_clamps_both_ends() {
        let mut high = SignalScore::new("a");
        high.push(Flag::new(Signal::IpLiteralHost, 80, ""));
        high.push(Flag::new(Signal::ForeignScript, 45, ""));
        assert_eq!(aggregate(&[high]), (125, 100));

        let mut low = SignalScore::new("b");
        low.push(Flag::new(Signal::OfficialDomain, -25, ""));
        low.push(Flag::new(Signal::TrustedSource, -20, ""));
        assert_eq!(aggregate(&[low]), (-45, 0));

        assert_eq!(aggregate(&[]), (0, 0));
    }

    #[test]
    fn test_absent_external_score_is_identity() {
        let (score, flags) = blender().blend(42, &[], None);
        assert_eq!(score, 42);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_confidence_tiers() {
        let b = blender();
        let at = |c: f64| b.blend(10, &[], Some(&ExternalScore::new(c, vec![]))).0;
        assert_eq!(at(0.9), 45);
        assert_eq!(at(0.75), 45);
        assert_eq!(at(0.6), 30);
        assert_eq!(at(0.3), 18);
        assert_eq!(at(0.1), 10);
    }

    #[test]
    fn test_blend_reclamps() {
        let (score, _) = blender().blend(90, &[], Some(&ExternalScore::new(0.95, vec![])));
        assert_eq!(score, 100);
    }

    #[test]
    fn test_high_confidence_surfaces_matching_urls() {
        let urls = vec![CandidateUrl::new("bit.ly/abs123"), CandidateUrl::new("example.com")];
        let external = ExternalScore::new(
            0.8,
            vec!["bit.ly/abs123".to_string(), "unrelated.net".to_string()],
        );
        let (_, flags) = blender().blend(0, &urls, Some(&external));
        let flagged: Vec<&Flag> = flags
            .iter()
            .filter(|f| f.signal == Signal::ExternalFlaggedUrl)
            .collect();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].detail, "bit.ly/abs123");
        assert_eq!(flagged[0].weight, 0);
    }

    #[test]
    fn test_medium_confidence_does_not_surface_urls() {
        let urls = vec![CandidateUrl::new("bit.ly/abs123")];
        let external = ExternalScore::new(0.6, vec!["bit.ly/abs123".to_string()]);
        let (_, flags) = blender().blend(0, &urls, Some(&external));
        assert!(flags.iter().all(|f| f.signal != Signal::ExternalFlaggedUrl));
    }

    #[test]
    fn test_out_of_range_confidence() {
        let b = blender();
        assert_eq!(b.blend(0, &[], Some(&ExternalScore::new(7.0, vec![]))).0, 35);
        assert_eq!(b.blend(5, &[], Some(&ExternalScore::new(-1.0, vec![]))).0, 5);
        assert_eq!(b.blend(5, &[], Some(&ExternalScore::new(f64::NAN, vec![]))).0, 5);
    }
}
