//! Clear command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Run the clear command.
pub async fn run_clear(yes: bool, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let index = orchestrator.index();

    let courses = index.course_count().await?;
    let chunks = index.chunk_count().await?;

    if courses == 0 && chunks == 0 {
        Output::info("Index is already empty.");
        return Ok(());
    }

    if !yes {
        print!(
            "Delete {} courses and {} chunks? [y/N] ",
            courses, chunks
        );
        io::stdout().flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !answer.trim().eq_ignore_ascii_case("y") {
            Output::info("Aborted.");
            return Ok(());
        }
    }

    index.clear().await?;
    Output::success("Index cleared.");
    Ok(())
}
