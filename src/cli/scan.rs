//! Scan command - full audit pass over extensions and settings

use super::{print_posture, record_digest, tier_glyph, CliContext};

pub async fn run(ctx: &CliContext) -> anyhow::Result<()> {
    if !ctx.profile.path().exists() {
        println!(
            "⚠️  Profile snapshot not found: {}",
            ctx.profile.path().display()
        );
        println!("\nExport one from your browser or point --profile at an existing file.");
        return Ok(());
    }

    let mut auditor = ctx.auditor().await;
    auditor.scan().await?;
    record_digest(ctx).await;

    println!("🔍 Browser Sentry Audit");
    println!("───────────────────────");
    println!();

    let state = auditor.state();
    if state.records.is_empty() {
        println!("No extensions installed.");
    } else {
        println!("Extensions ({} scored):", state.records.len());
        for record in &state.records {
            let Some(score) = state.scores.get(&record.id) else {
                continue;
            };

            let disabled = if record.enabled { "" } else { " (disabled)" };
            let tag_note = state
                .tags
                .get(&record.id)
                .map(|t| format!(" [{}]", t.tag))
                .unwrap_or_default();
            println!(
                "  {} {} {}{} - {}/100 {} ({}){}",
                tier_glyph(score.tier),
                record.name,
                record.version,
                disabled,
                score.score,
                score.tier,
                record.install.label(),
                tag_note
            );
            println!("     id: {}", record.id);
            for factor in &score.factors {
                println!(
                    "     +{} {} - {}",
                    factor.weight, factor.label, factor.detail
                );
            }
            if score.capped {
                let raw: i32 = score.factors.iter().map(|f| f.weight).sum();
                println!("     score capped at 100 (factors total {})", raw);
            }
        }
    }

    println!();
    print_posture(&auditor);

    Ok(())
}
