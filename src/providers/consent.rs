//! Settings-read consent gate
//!
//! Consent lives as a marker file on disk, so it can be revoked from
//! outside the tool (deleting the file is a revocation). Every query
//! stats the filesystem again instead of trusting a cached flag.

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::ConsentGate;

/// Marker-file consent gate
pub struct FileConsentGate {
    marker: PathBuf,
}

impl FileConsentGate {
    pub fn new(marker: impl Into<PathBuf>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Write the grant marker without prompting, for `--yes` flows and tests
    pub fn force_grant(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.marker.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.marker, Utc::now().to_rfc3339())?;
        Ok(())
    }
}

#[async_trait]
impl ConsentGate for FileConsentGate {
    async fn is_granted(&self) -> anyhow::Result<bool> {
        Ok(self.marker.exists())
    }

    async fn request(&self) -> anyhow::Result<bool> {
        if self.marker.exists() {
            return Ok(true);
        }

        // Waits as long as the user takes to answer
        let answer = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            print!("Allow reading browser privacy settings? [y/N] ");
            std::io::stdout().flush()?;
            std::io::stdin().read_line(&mut line)?;
            Ok::<String, std::io::Error>(line)
        })
        .await??;

        let granted = matches!(answer.trim().to_lowercase().as_str(), "y" | "yes");
        if granted {
            self.force_grant()?;
            info!("Settings-read consent granted");
        } else {
            info!("Settings-read consent denied");
        }
        Ok(granted)
    }

    async fn revoke(&self) -> anyhow::Result<()> {
        if self.marker.exists() {
            std::fs::remove_file(&self.marker)?;
        }
        info!("Settings-read consent revoked");
        Ok(())
    }
}
