//! Ask command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(question: &str, session: Option<String>, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.rag_engine();

    let spinner = Output::spinner("Searching course materials...");

    match engine.query(question, session.as_deref()).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    match &source.link {
                        Some(link) => Output::kv(&source.label, link),
                        None => Output::list_item(&source.label),
                    }
                }
            }

            Output::info(&format!(
                "Session {} (pass --session to follow up)",
                response.session_id
            ));
            Ok(())
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            Err(e.into())
        }
    }
}
