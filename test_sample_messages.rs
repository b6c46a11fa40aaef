#![allow(clippy::uninlined_format_args)]

use tanabbah::script::ScriptDetector;
use tanabbah::{ExternalScore, RiskEngine, RiskTier};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let engine = RiskEngine::with_defaults()?;

    // (message, expected tier)
    let samples = [
        (
            "Your Absher account has been suspended. Click bit.ly/abs123 to update within 24 hours",
            RiskTier::HighRisk,
        ),
        (
            "Your electricity bill is due. Pay at https://www.absher.sa/bills",
            RiskTier::Safe,
        ),
        (
            "عاجل: تم إيقاف حسابك في أبشر، ادخل على الرابط absher-sa.xyz/login وأدخل رمز التحقق فورا",
            RiskTier::HighRisk,
        ),
        (
            "تم إصدار موعدك في الجوازات، للتفاصيل: https://www.absher.sa",
            RiskTier::Safe,
        ),
        (
            "Links: https://alpha-news.com https://beta-shop.net https://gamma.org https://delta.io https://epsilon.info",
            RiskTier::LowRisk,
        ),
        ("Dinner at 8? Bring the photos from the trip", RiskTier::Safe),
    ];

    let total = samples.len();
    let mut mismatches = 0;
    for (message, expected) in samples {
        let result = engine.analyze(message, None);
        let language = ScriptDetector::detect_language(message);
        let marker = if result.tier == expected { "ok " } else { "!! " };
        if result.tier != expected {
            mismatches += 1;
        }

        println!("{}{} ({}/100) {}", marker, result.tier, result.score, message);
        for flag in &result.flags {
            println!("      {:+4}  {}", flag.weight, flag.description(language));
        }
    }

    println!();
    println!("Blending an external confidence of 0.8 into a parcel notice:");
    let blended = engine.analyze(
        "Your parcel is waiting: smsa-track.link/p/88",
        Some(&ExternalScore::new(0.8, vec!["smsa-track.link/p/88".to_string()])),
    );
    println!(
        "   internal {} -> blended {} ({})",
        blended.internal_score, blended.score, blended.tier
    );

    println!();
    println!("{} of {} samples matched", total - mismatches, total);
    Ok(())
}
