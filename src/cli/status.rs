//! Status command - current security posture without a persisting scan

use browser_sentry::audit::AuditPhase;
use browser_sentry::{rules, store, PostureTier};

use super::{print_posture, CliContext};

pub async fn run(ctx: &CliContext) -> anyhow::Result<()> {
    println!("🛡️  Browser Sentry Status");
    println!("────────────────────────");
    println!();

    if !ctx.profile.path().exists() {
        println!("Profile: ❌ not found at {}", ctx.profile.path().display());
        println!("\nPoint --profile at an exported snapshot to begin auditing.");
        return Ok(());
    }

    let mut auditor = ctx.auditor().await;
    auditor.scan_extensions().await?;
    let phase = auditor.phase().await?;

    let state = auditor.state();
    match phase {
        AuditPhase::Unauthorized if state.browser.granted => {
            // The persisted snapshot predates a revocation; it must not
            // count toward the posture anymore
            let fleet = auditor.fleet_score();
            let tier = PostureTier::from_score(fleet);
            println!("Posture: {}/100 - {} ({})", fleet, tier, tier.color());
            println!("   Extension fleet: {}/100", fleet);
            println!("   Browser settings: ⚠️  access revoked since the last scan");
        }
        AuditPhase::AuthorizedUnscanned => {
            let fleet = auditor.fleet_score();
            let tier = PostureTier::from_score(fleet);
            println!("Posture: {}/100 - {} ({})", fleet, tier, tier.color());
            println!("   Extension fleet: {}/100", fleet);
            println!("   Browser settings: enabled but not scanned yet");
        }
        _ => {
            print_posture(&auditor);
            if let Some(at) = state.browser.last_checked {
                println!("   Last settings check: {}", at.format("%Y-%m-%d %H:%M UTC"));
            }
        }
    }

    println!();
    println!(
        "Extensions: {} scored, {} tagged",
        state.records.len(),
        state.tags.len()
    );
    println!(
        "Checklist: {}/{} verified",
        state.checks.len(),
        rules::MANUAL_CHECKS.len()
    );

    let stored = store::load_profile_digest(ctx.store.as_ref()).await;
    let current = ctx.profile.digest();
    match (stored, current) {
        (Some(stored), Some(current)) if stored != current => {
            println!("\n⚠️  Profile changed since the last scan - run 'browser-sentry scan'");
        }
        (None, _) => {
            println!("\nNo scan recorded yet - run 'browser-sentry scan'");
        }
        _ => {}
    }

    Ok(())
}
