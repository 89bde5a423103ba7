//! Report command - schema 2.0 JSON export

use browser_sentry::report;

use super::{record_digest, CliContext};

pub async fn run(ctx: &CliContext, output: Option<&str>) -> anyhow::Result<()> {
    let mut auditor = ctx.auditor().await;
    auditor.scan().await?;
    record_digest(ctx).await;

    let report = report::build(auditor.state());
    let json = report::render(&report)?;

    match output {
        Some(path) => {
            std::fs::write(path, &json)?;
            println!("📄 Report {} written to {}", report.report_id, path);
        }
        None => println!("{}", json),
    }

    Ok(())
}
