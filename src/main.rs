use anyhow::Context;
use clap::{Arg, ArgMatches, Command};
use log::LevelFilter;
use serde::Serialize;
use std::io::Read;
use std::process;
use tanabbah::evaluation::{self, Dataset};
use tanabbah::oracle::{HeuristicOracle, Oracle, RemoteOracle, DEFAULT_TIMEOUT_SECS};
use tanabbah::script::ScriptDetector;
use tanabbah::url_features;
use tanabbah::{AnalysisResult, EngineConfig, ExternalScore, Language, RiskEngine, UrlExtractor};

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    external_score: Option<&'a ExternalScore>,
}

#[tokio::main]
async fn main() {
    let matches = Command::new("tanabbah")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fraud-risk scoring for Arabic and English messages")
        .arg(
            Arg::new("message")
                .value_name("MESSAGE")
                .help("Message text to analyze")
                .index(1),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Read the message from a file ('-' for stdin)")
                .conflicts_with("message")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("tanabbah.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Validate the configuration and compile its lexicons")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the analysis result as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .value_name("LANG")
                .help("Language of the printed summary (en, ar); detected from the message if omitted")
                .value_parser(clap::value_parser!(Language)),
        )
        .arg(
            Arg::new("external-confidence")
                .long("external-confidence")
                .value_name("CONFIDENCE")
                .help("External classifier confidence in [0, 1]")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("external-flag")
                .long("external-flag")
                .value_name("FLAG")
                .help("Flag reported by the external classifier (repeatable)")
                .requires("external-confidence")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("heuristic-oracle")
                .long("heuristic-oracle")
                .help("Score URLs with the offline URL heuristic")
                .conflicts_with_all(["external-confidence", "oracle-url"])
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("oracle-url")
                .long("oracle-url")
                .value_name("URL")
                .help("Remote classifier endpoint")
                .conflicts_with("external-confidence"),
        )
        .arg(
            Arg::new("oracle-timeout")
                .long("oracle-timeout")
                .value_name("SECS")
                .help("Remote classifier timeout, 5-20 seconds")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            Arg::new("url-features")
                .long("url-features")
                .value_name("URL")
                .help("Print the URL feature vector and heuristic verdict as JSON"),
        )
        .arg(
            Arg::new("evaluate")
                .long("evaluate")
                .value_name("DATASET")
                .help("Evaluate the engine against a labelled JSON dataset"),
        )
        .arg(
            Arg::new("eval-output")
                .long("eval-output")
                .value_name("FILE")
                .help("Where to write the evaluation report")
                .default_value("eval_results.json"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging with per-signal detail")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    if let Some(url) = matches.get_one::<String>("url-features") {
        let prediction = url_features::predict_url(url);
        match serde_json::to_string_pretty(&prediction) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error encoding features: {e}");
                process::exit(1);
            }
        }
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("tanabbah.yaml");

    let config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e:#}");
            process::exit(1);
        }
    };

    let engine = match RiskEngine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Configuration validation failed: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        let config = engine.config();
        println!("Configuration OK");
        println!("  Trusted domains:  {}", config.domains.trusted.len());
        println!("  Shorteners:       {}", config.domains.shorteners.len());
        println!("  Suspicious TLDs:  {}", config.domains.suspicious_tlds.len());
        println!(
            "  Tiers:            SAFE <= {}, LOW_RISK <= {}, SUSPICIOUS <= {}",
            config.tiers.safe_max, config.tiers.low_risk_max, config.tiers.suspicious_max
        );
        println!("  Trusted policy:   {:?}", config.policy.trusted_domain);
        return;
    }

    if let Some(dataset_path) = matches.get_one::<String>("evaluate") {
        let output = matches
            .get_one::<String>("eval-output")
            .map(String::as_str)
            .unwrap_or("eval_results.json");
        match run_evaluation(&engine, dataset_path, output) {
            Ok(true) => process::exit(0),
            Ok(false) => process::exit(1),
            Err(e) => {
                eprintln!("Evaluation failed: {e:#}");
                process::exit(1);
            }
        }
    }

    let message = match read_message(&matches) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(1);
        }
    };

    if let Err(e) = engine.validate_message(&message) {
        eprintln!("Rejected: {e}");
        process::exit(1);
    }

    let external = external_score(&matches, &message).await;
    let result = engine.analyze(&message, external.as_ref());

    if matches.get_flag("json") {
        let report = JsonReport {
            result: &result,
            external_score: external.as_ref(),
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error encoding result: {e}");
                process::exit(1);
            }
        }
    } else {
        let language = matches
            .get_one::<Language>("lang")
            .copied()
            .unwrap_or_else(|| ScriptDetector::detect_language(&message));
        print_summary(&result, language);
    }
}

fn load_config(path: &str) -> anyhow::Result<EngineConfig> {
    if std::path::Path::new(path).exists() {
        EngineConfig::from_file(path).with_context(|| format!("reading '{path}'"))
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(EngineConfig::default())
    }
}

fn generate_default_config(path: &str) {
    let config = EngineConfig::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Edit weights, lexicons and domain lists to suit your deployment.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn read_message(matches: &ArgMatches) -> anyhow::Result<String> {
    if let Some(message) = matches.get_one::<String>("message") {
        return Ok(message.clone());
    }

    match matches.get_one::<String>("file").map(String::as_str) {
        Some("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("reading message from stdin")?;
            Ok(buffer)
        }
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading message file '{path}'"))
        }
        None => anyhow::bail!("No message given; pass MESSAGE or --file"),
    }
}

async fn external_score(matches: &ArgMatches, message: &str) -> Option<ExternalScore> {
    if let Some(confidence) = matches.get_one::<f64>("external-confidence") {
        let flags = matches
            .get_many::<String>("external-flag")
            .map(|values| values.cloned().collect())
            .unwrap_or_default();
        return Some(ExternalScore::new(*confidence, flags));
    }

    let oracle = if matches.get_flag("heuristic-oracle") {
        Oracle::Heuristic(HeuristicOracle)
    } else if let Some(endpoint) = matches.get_one::<String>("oracle-url") {
        let timeout = matches
            .get_one::<u64>("oracle-timeout")
            .copied()
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        match RemoteOracle::new(endpoint, timeout) {
            Ok(remote) => Oracle::Remote(remote),
            Err(e) => {
                log::warn!("Could not build oracle client, continuing without it: {e}");
                return None;
            }
        }
    } else {
        return None;
    };

    let urls = UrlExtractor::new().extract(message);
    oracle.score(message, &urls).await
}

fn run_evaluation(engine: &RiskEngine, dataset_path: &str, output: &str) -> anyhow::Result<bool> {
    let dataset = Dataset::from_file(dataset_path)
        .with_context(|| format!("loading dataset '{dataset_path}'"))?;
    log::info!("Loaded {} test cases", dataset.test_cases.len());

    let report = evaluation::run_evaluation(engine, &dataset);
    print!("{}", report.render_summary());

    report
        .to_file(output)
        .with_context(|| format!("writing report to '{output}'"))?;
    println!("\nResults saved to: {output}");

    if report.passed() {
        println!("Evaluation PASSED (accuracy >= 80%)");
    } else {
        println!(
            "Evaluation below target (accuracy {:.1}%)",
            report.evaluation_summary.classification_accuracy * 100.0
        );
    }
    Ok(report.passed())
}

fn print_summary(result: &AnalysisResult, language: Language) {
    let (score_label, urls_label, flags_label) = match language {
        Language::En => ("Risk score", "Links found", "Warning signs"),
        Language::Ar => ("درجة الخطورة", "الروابط المكتشفة", "مؤشرات التحذير"),
    };

    println!("{}", result.tier.label(language));
    println!("{score_label}: {}/100", result.score);
    println!("{urls_label}: {}", result.urls_found);
    if !result.flags.is_empty() {
        println!("{flags_label}:");
        for flag in &result.flags {
            println!("  - {}", flag.description(language));
        }
        if result.total_flags > result.flags.len() {
            println!("  (+{})", result.total_flags - result.flags.len());
        }
    }
}
