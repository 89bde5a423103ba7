//! Rules command - prints the scoring reference tables

use browser_sentry::rules::{CAPABILITY_RULES, MANUAL_CHECKS, PROVENANCE_RULES, SETTING_RULES};

use super::tier_glyph;

pub async fn run() -> anyhow::Result<()> {
    println!("📜 Scoring Reference");
    println!("════════════════════\n");

    println!("── Capability weights ──");
    for rule in CAPABILITY_RULES {
        println!(
            "  {} +{:<2} {} - {}",
            tier_glyph(rule.tier),
            rule.weight,
            rule.name,
            rule.description
        );
        println!("         {}", rule.advice);
    }

    println!("\n── Host access classes (first match wins) ──");
    println!("  🔴 +30 All URLs access (<all_urls> or a *://*/* pattern)");
    println!("  🔴 +30 All URLs access (http://*/* and https://*/* together)");
    println!("  🟡 +15 All HTTPS sites (https://*/*)");
    println!("  🟡 +15 All HTTP sites (http://*/*)");
    println!("  🟡 +15 Wildcard domains (any other pattern containing *)");
    println!("  🟢 +0  Specific sites only");

    println!("\n── Install provenance ──");
    for rule in PROVENANCE_RULES {
        println!(
            "  {} +{:<2} {} - {}",
            tier_glyph(rule.tier),
            rule.weight,
            rule.kind.label(),
            rule.description
        );
        println!("         {}", rule.advice);
    }
    println!("  🟢 +0  Enterprise policy - managed installs are not scored");

    println!("\n── Browser settings ──");
    for rule in SETTING_RULES {
        println!("  {} [{}] (recommended: {})", rule.name, rule.id, rule.recommended);
        println!("     {}", rule.explanation);
        for outcome in rule.outcomes {
            println!(
                "     {:>3} {} - {}",
                outcome.delta, outcome.value, outcome.label
            );
        }
    }

    println!("\n── Manual checks ──");
    for check in MANUAL_CHECKS {
        println!(
            "  [{}] {} {} - {}",
            check.category, check.penalty, check.id, check.name
        );
        println!("     {}", check.explanation);
    }

    println!(
        "\nTotal: {} capabilities, {} settings, {} manual checks",
        CAPABILITY_RULES.len(),
        SETTING_RULES.len(),
        MANUAL_CHECKS.len()
    );

    Ok(())
}
