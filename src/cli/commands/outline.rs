//! Outline command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::error::KursError;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the outline command.
pub async fn run_outline(course: &str, settings: Settings) -> Result<()> {
    let orchestrator = Orchestrator::new(settings)?;
    let index = orchestrator.index();

    let title = match index.resolve_course_name(course).await {
        Ok(title) => title,
        Err(e @ KursError::CourseNotFound(_)) => {
            Output::error(&e.to_string());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    let metadata = index
        .get_course_metadata(&title)
        .await?
        .ok_or_else(|| KursError::CourseNotFound(title.clone()))?;

    Output::header(&metadata.title);
    if let Some(instructor) = &metadata.instructor {
        Output::kv("Instructor", instructor);
    }
    if let Some(link) = &metadata.link {
        Output::kv("Link", link);
    }

    if metadata.lessons.is_empty() {
        Output::info("No lessons recorded for this course.");
        return Ok(());
    }

    println!();
    for lesson in &metadata.lessons {
        match &lesson.link {
            Some(link) => Output::list_item(&format!(
                "Lesson {}: {} ({})",
                lesson.number, lesson.title, link
            )),
            None => Output::list_item(&format!("Lesson {}: {}", lesson.number, lesson.title)),
        }
    }

    Ok(())
}
