//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::path::PathBuf;

/// Run the ingest command.
pub async fn run_ingest(folder: Option<String>, settings: Settings) -> Result<()> {
    let folder = match folder {
        Some(path) => PathBuf::from(shellexpand::tilde(&path).to_string()),
        None => settings.docs_dir(),
    };

    if !folder.is_dir() {
        Output::error(&format!("Document folder not found: {}", folder.display()));
        anyhow::bail!("not a directory: {}", folder.display());
    }

    let orchestrator = Orchestrator::new(settings)?;

    let spinner = Output::spinner(&format!("Ingesting documents from {}...", folder.display()));
    let stats = orchestrator.ingest_folder(&folder).await;
    spinner.finish_and_clear();

    match stats {
        Ok(stats) => {
            Output::success(&format!(
                "Indexed {} new courses ({} chunks)",
                stats.courses_added, stats.chunks_added
            ));
            if stats.skipped > 0 {
                Output::info(&format!("{} courses already indexed, skipped", stats.skipped));
            }
            if stats.failed > 0 {
                Output::warning(&format!(
                    "{} documents failed to parse (see log for details)",
                    stats.failed
                ));
            }
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            Err(e.into())
        }
    }
}
