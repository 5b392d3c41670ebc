//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let index = orchestrator.index();

    let titles = index.list_course_titles().await?;

    if titles.is_empty() {
        Output::info("No courses indexed yet. Run 'kurs ingest' to add some.");
        return Ok(());
    }

    Output::header(&format!("Indexed Courses ({})", titles.len()));
    for title in &titles {
        match index.get_course_metadata(title).await? {
            Some(course) => Output::course_info(
                &course.title,
                course.instructor.as_deref(),
                course.lessons.len(),
            ),
            None => Output::list_item(title),
        }
    }

    let chunks = index.chunk_count().await?;
    println!();
    Output::kv("Total chunks", &chunks.to_string());

    Ok(())
}
