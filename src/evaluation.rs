//! Labelled-dataset evaluation of the engine.

use crate::classifier::RiskTier;
use crate::engine::{AnalysisResult, RiskEngine};
use crate::error::EngineError;
use crate::features::Flag;
use crate::script::Language;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;

/// Classification accuracy required for a passing run
pub const PASS_ACCURACY: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub message: String,
    pub label: RiskTier,
    #[serde(default)]
    pub expected_red_flags: Vec<String>,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl Dataset {
    pub fn from_file(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn count(&self, tier: RiskTier) -> usize {
        self.test_cases.iter().filter(|c| c.label == tier).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FlagMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub matched: usize,
    pub total_expected: usize,
    pub total_actual: usize,
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Partial-match precision/recall of expected flag phrases against
/// the textual forms of each produced flag
pub fn flag_metrics(expected: &[String], actual: &[Vec<String>]) -> FlagMetrics {
    if expected.is_empty() && actual.is_empty() {
        return FlagMetrics {
            precision: 1.0,
            recall: 1.0,
            f1: 1.0,
            ..Default::default()
        };
    }
    if expected.is_empty() {
        return FlagMetrics {
            recall: 1.0,
            total_actual: actual.len(),
            ..Default::default()
        };
    }
    if actual.is_empty() {
        return FlagMetrics {
            precision: 1.0,
            total_expected: expected.len(),
            ..Default::default()
        };
    }

    let matched = expected
        .iter()
        .map(|e| e.trim().to_lowercase())
        .filter(|e| {
            actual.iter().any(|forms| {
                forms.iter().any(|form| {
                    let form = form.trim().to_lowercase();
                    form.contains(e.as_str()) || e.contains(form.as_str())
                })
            })
        })
        .count();

    let precision = ratio(matched, actual.len());
    let recall = ratio(matched, expected.len());
    FlagMetrics {
        precision,
        recall,
        f1: f1(precision, recall),
        matched,
        total_expected: expected.len(),
        total_actual: actual.len(),
    }
}

// Identifier ("shortener", "urgency language") plus localized description
fn flag_forms(flag: &Flag, language: Language) -> Vec<String> {
    let id = serde_json::to_value(flag.signal)
        .ok()
        .and_then(|v| v.as_str().map(|s| s.replace('_', " ")))
        .unwrap_or_default();
    vec![id, flag.description(language).to_string()]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub test_id: String,
    pub message: String,
    pub language: Language,
    pub expected_label: RiskTier,
    pub expected_flags: Vec<String>,
    pub predicted_label: RiskTier,
    pub predicted_flags: Vec<String>,
    pub risk_score: u8,
    pub classification_correct: bool,
    pub risk_score_consistent: bool,
    pub flags_metrics: FlagMetrics,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FlagSummary {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub total_tests: usize,
    pub classification_accuracy: f64,
    pub correct_classifications: usize,
    pub risk_score_consistency: f64,
    pub consistent_risk_scores: usize,
    pub red_flags_metrics: FlagSummary,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub evaluation_summary: EvaluationSummary,
    /// expected label -> predicted label -> count
    pub confusion_matrix: BTreeMap<RiskTier, BTreeMap<RiskTier, usize>>,
    pub per_class: BTreeMap<RiskTier, ClassMetrics>,
    pub detailed_results: Vec<CaseResult>,
}

impl EvaluationReport {
    pub fn passed(&self) -> bool {
        self.evaluation_summary.classification_accuracy >= PASS_ACCURACY
    }

    fn cell(&self, expected: RiskTier, predicted: RiskTier) -> usize {
        self.confusion_matrix
            .get(&expected)
            .and_then(|row| row.get(&predicted))
            .copied()
            .unwrap_or(0)
    }

    pub fn to_file(&self, path: &str) -> Result<(), EngineError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn render_summary(&self) -> String {
        let s = &self.evaluation_summary;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Classification accuracy: {:.1}% ({}/{})",
            s.classification_accuracy * 100.0,
            s.correct_classifications,
            s.total_tests
        );
        let _ = writeln!(
            out,
            "Risk score consistency:  {:.1}% ({}/{})",
            s.risk_score_consistency * 100.0,
            s.consistent_risk_scores,
            s.total_tests
        );
        let _ = writeln!(
            out,
            "Red flags: precision {:.1}%, recall {:.1}%, F1 {:.1}%",
            s.red_flags_metrics.precision * 100.0,
            s.red_flags_metrics.recall * 100.0,
            s.red_flags_metrics.f1_score * 100.0
        );

        let _ = writeln!(out, "\nConfusion matrix (rows: expected, columns: predicted)");
        let _ = write!(out, "{:<14}", "");
        for tier in RiskTier::ALL {
            let _ = write!(out, "{:<12}", tier.as_str());
        }
        let _ = writeln!(out);
        for expected in RiskTier::ALL {
            let _ = write!(out, "{:<14}", expected.as_str());
            for predicted in RiskTier::ALL {
                let _ = write!(out, "{:<12}", self.cell(expected, predicted));
            }
            let _ = writeln!(out);
        }

        let _ = writeln!(out, "\nPer-class metrics");
        for (tier, m) in &self.per_class {
            let _ = writeln!(
                out,
                "  {:<12} precision {:.1}%, recall {:.1}%, F1 {:.1}%",
                tier.as_str(),
                m.precision * 100.0,
                m.recall * 100.0,
                m.f1_score * 100.0
            );
        }
        out
    }
}

pub fn evaluate_case(engine: &RiskEngine, case: &TestCase) -> CaseResult {
    let result: AnalysisResult = engine.analyze(&case.message, None);
    let forms: Vec<Vec<String>> = result
        .flags
        .iter()
        .map(|f| flag_forms(f, case.language))
        .collect();
    let (low, high) = engine.classifier().range_for(case.label);

    CaseResult {
        test_id: case.id.clone(),
        message: case.message.clone(),
        language: case.language,
        expected_label: case.label,
        expected_flags: case.expected_red_flags.clone(),
        predicted_label: result.tier,
        predicted_flags: result
            .flags
            .iter()
            .map(|f| f.description(case.language).to_string())
            .collect(),
        risk_score: result.score,
        classification_correct: result.tier == case.label,
        risk_score_consistent: (low..=high).contains(&result.score),
        flags_metrics: flag_metrics(&case.expected_red_flags, &forms),
    }
}

pub fn run_evaluation(engine: &RiskEngine, dataset: &Dataset) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    for case in &dataset.test_cases {
        let result = evaluate_case(engine, case);
        log::debug!(
            "{}: expected {}, predicted {} (score {})",
            result.test_id,
            result.expected_label,
            result.predicted_label,
            result.risk_score
        );
        *report
            .confusion_matrix
            .entry(result.expected_label)
            .or_default()
            .entry(result.predicted_label)
            .or_insert(0) += 1;
        report.detailed_results.push(result);
    }

    let results = &report.detailed_results;
    let total = results.len();
    let correct = results.iter().filter(|r| r.classification_correct).count();
    let consistent = results.iter().filter(|r| r.risk_score_consistent).count();
    let mean = |f: fn(&FlagMetrics) -> f64| -> f64 {
        if total == 0 {
            0.0
        } else {
            results.iter().map(|r| f(&r.flags_metrics)).sum::<f64>() / total as f64
        }
    };

    report.evaluation_summary = EvaluationSummary {
        total_tests: total,
        classification_accuracy: ratio(correct, total),
        correct_classifications: correct,
        risk_score_consistency: ratio(consistent, total),
        consistent_risk_scores: consistent,
        red_flags_metrics: FlagSummary {
            precision: mean(|m: &FlagMetrics| m.precision),
            recall: mean(|m: &FlagMetrics| m.recall),
            f1_score: mean(|m: &FlagMetrics| m.f1),
        },
    };

    for tier in RiskTier::ALL {
        let tp = report.cell(tier, tier);
        let fp: usize = RiskTier::ALL
            .iter()
            .filter(|t| **t != tier)
            .map(|other| report.cell(*other, tier))
            .sum();
        let fn_: usize = RiskTier::ALL
            .iter()
            .filter(|t| **t != tier)
            .map(|other| report.cell(tier, *other))
            .sum();
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        report.per_class.insert(
            tier,
            ClassMetrics {
                precision,
                recall,
                f1_score: f1(precision, recall),
            },
        );
    }

    log::info!(
        "Evaluated {} cases: accuracy {:.3}",
        total,
        report.evaluation_summary.classification_accuracy
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forms(items: &[&str]) -> Vec<Vec<String>> {
        items.iter().map(|s| vec![s.to_string()]).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flag_metrics_edge_cases() {
        let both_empty = flag_metrics(&[], &[]);
        assert_eq!(both_empty.f1, 1.0);

        let nothing_expected = flag_metrics(&[], &forms(&["shortener"]));
        assert_eq!(nothing_expected.precision, 0.0);
        assert_eq!(nothing_expected.recall, 1.0);

        let nothing_found = flag_metrics(&strings(&["urgency"]), &[]);
        assert_eq!(nothing_found.precision, 1.0);
        assert_eq!(nothing_found.recall, 0.0);
    }

    #[test]
    fn test_flag_metrics_partial_matching() {
        let expected = strings(&["Shortener", "urgency", "password"]);
        let actual = forms(&["shortener", "urgency language"]);
        let m = flag_metrics(&expected, &actual);
        assert_eq!(m.matched, 2);
        assert_eq!(m.precision, 1.0);
        assert!((m.recall - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_dataset_parsing() {
        let json = r#"{
            "statistics": {"safe": 1},
            "test_cases": [
                {"id": "t1", "message": "hi", "label": "SAFE", "expected_red_flags": [], "language": "en"},
                {"id": "t2", "message": "مرحبا", "label": "HIGH_RISK", "language": "ar"}
            ]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).unwrap();
        assert_eq!(dataset.test_cases.len(), 2);
        assert_eq!(dataset.count(RiskTier::HighRisk), 1);
        assert_eq!(dataset.test_cases[1].language, Language::Ar);
    }

    #[test]
    fn test_run_evaluation() {
        let engine = RiskEngine::with_defaults().unwrap();
        let dataset = Dataset {
            test_cases: vec![
                TestCase {
                    id: "safe-1".to_string(),
                    message: "Your electricity bill is due. Pay at https://www.absher.sa/bills"
                        .to_string(),
                    label: RiskTier::Safe,
                    expected_red_flags: vec![],
                    language: Language::En,
                },
                TestCase {
                    id: "high-1".to_string(),
                    message: "Your Absher account has been suspended. Click bit.ly/abs123 to update within 24 hours".to_string(),
                    label: RiskTier::HighRisk,
                    expected_red_flags: strings(&["shortener", "urgency"]),
                    language: Language::En,
                },
                TestCase {
                    id: "mislabelled".to_string(),
                    message: "See you tomorrow".to_string(),
                    label: RiskTier::Suspicious,
                    expected_red_flags: vec![],
                    language: Language::En,
                },
            ],
        };

        let report = run_evaluation(&engine, &dataset);
        let s = &report.evaluation_summary;
        assert_eq!(s.total_tests, 3);
        assert_eq!(s.correct_classifications, 2);
        assert!(!report.passed());
        assert_eq!(report.cell(RiskTier::Suspicious, RiskTier::Safe), 1);
        assert_eq!(report.detailed_results[1].flags_metrics.recall, 1.0);

        let safe = report.per_class[&RiskTier::Safe];
        assert_eq!(safe.recall, 1.0);
        assert_eq!(safe.precision, 0.5);
        assert!(report.render_summary().contains("Confusion matrix"));
    }
}
