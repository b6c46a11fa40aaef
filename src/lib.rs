pub mod classifier;
pub mod config;
pub mod domain_utils;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod oracle;
pub mod scoring;
pub mod script;
pub mod url_extractor;
pub mod url_features;

pub use classifier::{Classifier, RiskTier};
pub use config::EngineConfig;
pub use engine::{AnalysisResult, RiskEngine};
pub use error::{EngineError, InputError};
pub use features::{Flag, FlagCategory, Signal};
pub use scoring::ExternalScore;
pub use script::Language;
pub use url_extractor::{CandidateUrl, UrlExtractor};
