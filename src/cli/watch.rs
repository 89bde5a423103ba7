//! Watch command - foreground loop that rescans when the profile changes

use std::time::Duration;

use tracing::{debug, info, warn};

use super::{print_posture, record_digest, CliContext};

/// Ticks between heartbeat log lines
const HEARTBEAT_TICKS: u64 = 10;

pub async fn run(ctx: &CliContext, interval: Option<u64>) -> anyhow::Result<()> {
    let secs = interval.unwrap_or(ctx.config.scan_interval_secs).max(1);

    if !ctx.profile.path().exists() {
        println!(
            "⚠️  Profile snapshot not found: {}",
            ctx.profile.path().display()
        );
        println!("\nExport one from your browser or point --profile at an existing file.");
        return Ok(());
    }

    info!(
        "🛡️ Browser Sentry watching {} every {}s (PID: {})",
        ctx.profile.path().display(),
        secs,
        std::process::id()
    );

    let mut auditor = ctx.auditor().await;
    auditor.scan().await?;
    record_digest(ctx).await;

    println!("🔍 Initial audit complete");
    print_posture(&auditor);
    println!();

    let mut last_digest = ctx.profile.digest();
    let mut last_tier = auditor.posture();
    let mut ticks: u64 = 0;

    let mut ticker = tokio::time::interval(Duration::from_secs(secs));
    // the first tick fires immediately and would double the initial scan
    ticker.tick().await;

    info!("👀 Watching for profile changes...");

    loop {
        ticker.tick().await;
        ticks += 1;

        let digest = ctx.profile.digest();
        if digest == last_digest {
            debug!("Profile unchanged");
        } else {
            info!("📥 Profile changed, rescanning...");
            match auditor.scan().await {
                Ok(()) => {
                    record_digest(ctx).await;
                    last_digest = digest;

                    let tier = auditor.posture();
                    if tier != last_tier {
                        info!(
                            "🚨 Posture changed: {} -> {} ({}/100)",
                            last_tier,
                            tier,
                            auditor.combined_score()
                        );
                        last_tier = tier;
                    } else {
                        info!(
                            "Posture holding at {}/100 ({})",
                            auditor.combined_score(),
                            tier
                        );
                    }
                }
                Err(e) => {
                    warn!("⚠️  Rescan failed: {}", e);
                }
            }
        }

        if ticks % HEARTBEAT_TICKS == 0 {
            info!("💓 Watch heartbeat - {} passes, posture {}", ticks, last_tier);
        }
    }
}
