//! Check command - manual hardening checklist

use browser_sentry::audit::Auditor;
use browser_sentry::rules::{self, CheckCategory};

use super::CliContext;

pub async fn run(
    ctx: &CliContext,
    id: Option<&str>,
    verified: bool,
    unverified: bool,
    list: bool,
) -> anyhow::Result<()> {
    let mut auditor = ctx.auditor().await;

    let Some(id) = id else {
        return list_checks(&auditor);
    };
    if list {
        return list_checks(&auditor);
    }

    if verified == unverified {
        eprintln!("Error: pass exactly one of --verified or --unverified");
        std::process::exit(1);
    }

    auditor.set_check(id, verified).await?;
    if verified {
        println!("✅ Marked '{}' verified", id);
        if !auditor.config().include_manual_checks {
            println!("\n💡 Checklist state is tracked but kept out of the score.");
            println!("   Set include_manual_checks: true in the config to fold it in.");
        }
    } else {
        println!("⬜ Marked '{}' unverified", id);
        if let Some(check) = rules::manual_check(id) {
            println!("   Fix: {}", check.how_to_fix);
        }
    }

    Ok(())
}

fn list_checks(auditor: &Auditor) -> anyhow::Result<()> {
    println!("🔎 Manual Hardening Checklist");
    println!("─────────────────────────────\n");

    let checks = &auditor.state().checks;
    let mut verified_count = 0;

    for category in [
        CheckCategory::Critical,
        CheckCategory::Important,
        CheckCategory::Privacy,
    ] {
        println!("── {} ──", category);
        for check in rules::MANUAL_CHECKS.iter().filter(|c| c.category == category) {
            match checks.get(check.id) {
                Some(state) => {
                    verified_count += 1;
                    println!(
                        "  ✅ {} - {} (verified {})",
                        check.id,
                        check.name,
                        state.verified_at.format("%Y-%m-%d")
                    );
                }
                None => {
                    println!("  ⬜ {} - {} ({})", check.id, check.name, check.unmet_label);
                    println!("     Recommended: {}", check.recommended);
                    println!("     How to check: {}", check.how_to_check);
                }
            }
        }
        println!();
    }

    println!(
        "Verified: {}/{}",
        verified_count,
        rules::MANUAL_CHECKS.len()
    );
    println!("\nMark one with 'browser-sentry check <id> --verified'");
    Ok(())
}
