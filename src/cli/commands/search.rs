//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::KursError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the search command.
pub async fn run_search(
    query: &str,
    course: Option<String>,
    lesson: Option<u32>,
    limit: usize,
    settings: Settings,
) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let index = orchestrator.index();

    let spinner = Output::spinner("Searching...");
    let results = index.search(query, course.as_deref(), lesson, limit).await;
    spinner.finish_and_clear();

    match results {
        Ok(results) if results.is_empty() => {
            Output::info("No matching content found.");
            Ok(())
        }
        Ok(results) => {
            for result in &results {
                let link = match result.record.lesson_number {
                    Some(n) => index.lesson_link(&result.record.course_title, n).await?,
                    None => None,
                };
                Output::search_result(
                    &result.record.course_title,
                    result.record.lesson_number,
                    result.score,
                    &result.record.content,
                    link.as_deref(),
                );
            }
            Ok(())
        }
        Err(e @ KursError::CourseNotFound(_)) => {
            Output::error(&e.to_string());
            Err(e.into())
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            Err(e.into())
        }
    }
}
