//! Interactive chat command.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
///
/// One chat session maps to one RAG session; 'clear' starts a fresh session
/// so the assistant forgets the conversation so far.
pub async fn run_chat(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let engine = orchestrator.rag_engine();

    println!("\n{}", style("Kurs Chat").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Use 'clear' to reset the conversation.")
            .dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut session_id: Option<String> = None;

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            session_id = None;
            Output::info("Conversation history cleared.");
            continue;
        }

        match engine.query(input, session_id.as_deref()).await {
            Ok(response) => {
                session_id = Some(response.session_id.clone());
                println!(
                    "\n{} {}\n",
                    style("Kurs:").cyan().bold(),
                    response.answer
                );
                if !response.sources.is_empty() {
                    for source in &response.sources {
                        println!("  {}", style(&source.label).dim());
                    }
                    println!();
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
