//! Settings commands - browser settings audit opt-in and display

use browser_sentry::audit::Auditor;
use browser_sentry::providers::ConsentGate;
use browser_sentry::{rules, scoring, store, ControlAuthority, StatusTier};

use super::{status_glyph, CliContext};

pub async fn enable(ctx: &CliContext, yes: bool) -> anyhow::Result<()> {
    if yes {
        ctx.gate.force_grant()?;
    }

    let mut auditor = ctx.auditor().await;
    let granted = auditor.enable_browser_audit().await?;
    if !granted {
        println!("Settings access declined - nothing audited.");
        return Ok(());
    }

    auditor.scan_browser().await?;
    println!("✅ Browser settings audit enabled");
    println!();
    print_settings(&auditor);

    Ok(())
}

pub async fn disable(ctx: &CliContext) -> anyhow::Result<()> {
    let mut auditor = ctx.auditor().await;
    auditor.disable_browser_audit().await?;
    println!("✅ Browser settings audit disabled and snapshot cleared");
    Ok(())
}

pub async fn show(ctx: &CliContext) -> anyhow::Result<()> {
    let mut auditor = ctx.auditor().await;

    if !ctx.gate.is_granted().await? {
        println!("Browser settings audit is not enabled.");
        if store::load_opt_in(ctx.store.as_ref()).await {
            println!("⚠️  Opt-in preference is set but access is missing.");
        }
        println!("\nRun 'browser-sentry settings enable' to opt in.");
        return Ok(());
    }

    auditor.scan_browser().await?;
    print_settings(&auditor);

    Ok(())
}

fn print_settings(auditor: &Auditor) {
    let browser = &auditor.state().browser;

    println!("🔐 Browser Settings Audit");
    println!("─────────────────────────");

    for rule in rules::SETTING_RULES {
        let Some(obs) = browser.observations.get(rule.id) else {
            continue;
        };

        match scoring::browser::observation_status(obs) {
            Some(StatusTier::Error) => {
                println!(
                    "  ❓ {}: unable to check ({})",
                    rule.name,
                    obs.error.as_deref().unwrap_or("unknown error")
                );
            }
            Some(status) => {
                let value = obs
                    .value
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                let label = obs
                    .value
                    .as_ref()
                    .and_then(|v| rule.outcome_for(v))
                    .map(|o| o.label)
                    .unwrap_or_default();
                let authority = match obs.controlled_by {
                    Some(ControlAuthority::User) | None => String::new(),
                    Some(a) => format!(" [set by {}]", a),
                };
                println!(
                    "  {} {}: {} - {}{}",
                    status_glyph(status),
                    rule.name,
                    value,
                    label,
                    authority
                );
                if status != StatusTier::Secure {
                    println!("     Fix: {}", rule.how_to_fix);
                }
            }
            None => {
                let value = obs
                    .value
                    .as_ref()
                    .map(|v| v.to_string())
                    .unwrap_or_default();
                println!(
                    "  ❓ {}: unrecognized value '{}' (not scored)",
                    rule.name, value
                );
            }
        }
    }

    println!();
    println!(
        "Score: {}/100 ({} secure, {} warnings, {} risky)",
        browser.score, browser.secure, browser.warning, browser.risky
    );
    if let Some(at) = browser.last_checked {
        println!("Last checked: {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
}
