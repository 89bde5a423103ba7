//! Tag command - usage tagging for installed extensions

use browser_sentry::audit::Auditor;
use browser_sentry::UsageTag;

use super::CliContext;

pub async fn run(
    ctx: &CliContext,
    id: Option<&str>,
    tag: Option<&str>,
    clear: bool,
    list: bool,
) -> anyhow::Result<()> {
    let mut auditor = ctx.auditor().await;

    let Some(id) = id else {
        return list_tags(&mut auditor).await;
    };
    if list {
        return list_tags(&mut auditor).await;
    }

    if clear {
        auditor.set_tag(id, None).await?;
        println!("✅ Cleared tag on {}", id);
        return Ok(());
    }

    let Some(tag) = tag else {
        eprintln!("Error: provide a tag (actively-used, rarely-used, can-remove) or --clear");
        std::process::exit(1);
    };

    let tag: UsageTag = tag.parse()?;
    auditor.set_tag(id, Some(tag)).await?;
    println!("✅ Tagged {} as {}", id, tag);

    Ok(())
}

async fn list_tags(auditor: &mut Auditor) -> anyhow::Result<()> {
    // Names come from the inventory when the profile is readable;
    // tags for unknown ids are listed either way
    let _ = auditor.scan_extensions().await;

    println!("🏷️  Usage Tags");
    println!("─────────────");

    let state = auditor.state();
    if state.tags.is_empty() {
        println!("No tags assigned.");
        println!("\nRun 'browser-sentry tag <extension-id> <tag>' to assign one.");
        return Ok(());
    }

    for (id, entry) in &state.tags {
        let name = state
            .records
            .iter()
            .find(|r| &r.id == id)
            .map(|r| r.name.as_str())
            .unwrap_or("(not installed)");
        println!(
            "  {} - {} [{}] since {}",
            id,
            name,
            entry.tag,
            entry.tagged_at.format("%Y-%m-%d")
        );
    }

    println!("\nTotal: {} tags", state.tags.len());
    Ok(())
}
