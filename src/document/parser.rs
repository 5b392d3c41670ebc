//! Parser for semi-structured course transcript documents.

use super::{Course, CourseChunk, Lesson};
use crate::chunking::TextChunker;
use crate::error::{KursError, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};
use url::Url;

fn lesson_header_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Lesson\s+(\d+):\s*(.+)$").expect("valid regex"))
}

fn lesson_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^Lesson Link:\s*(\S+)\s*$").expect("valid regex"))
}

/// Parses course documents into a [`Course`] and its content chunks.
pub struct DocumentParser {
    chunker: TextChunker,
}

impl DocumentParser {
    /// Create a parser that delegates passage creation to `chunker`.
    pub fn new(chunker: TextChunker) -> Self {
        Self { chunker }
    }

    /// Parse a raw course document.
    ///
    /// The first three non-empty lines carry `Course Title:`, `Course Link:`
    /// and `Course Instructor:` labels. The title is mandatory; link and
    /// instructor are recorded as unset when absent. The rest of the text is
    /// split into lessons at `Lesson <n>: <title>` headers and chunked.
    pub fn parse(&self, raw_text: &str) -> Result<(Course, Vec<CourseChunk>)> {
        let lines: Vec<&str> = raw_text.lines().collect();
        let (mut course, body_start) = parse_header(&lines)?;

        let mut chunks = Vec::new();
        let mut chunk_index = 0u32;

        // Preamble before the first lesson header is course-level content.
        let mut section_lines: Vec<&str> = Vec::new();
        let mut current_lesson: Option<Lesson> = None;

        let flush =
            |lesson: Option<&Lesson>, text_lines: &[&str], chunks: &mut Vec<CourseChunk>, chunk_index: &mut u32, course: &Course| {
                let body = text_lines.join("\n");
                let body = body.trim();
                if body.is_empty() {
                    return;
                }
                for (i, passage) in self.chunker.chunk(body).into_iter().enumerate() {
                    let text = match lesson {
                        Some(l) if i == 0 => format!(
                            "Course {} Lesson {} ({}) content: {}",
                            course.title, l.number, l.title, passage
                        ),
                        Some(l) => format!(
                            "Course {} Lesson {} content: {}",
                            course.title, l.number, passage
                        ),
                        None => format!("Course {} content: {}", course.title, passage),
                    };
                    chunks.push(CourseChunk {
                        text,
                        course_title: course.title.clone(),
                        lesson_number: lesson.map(|l| l.number),
                        chunk_index: *chunk_index,
                    });
                    *chunk_index += 1;
                }
            };

        let mut i = body_start;
        while i < lines.len() {
            let line = lines[i].trim();

            if let Some(caps) = lesson_header_pattern().captures(line) {
                flush(
                    current_lesson.as_ref(),
                    &section_lines,
                    &mut chunks,
                    &mut chunk_index,
                    &course,
                );
                section_lines.clear();

                let number: u32 = caps[1].parse().map_err(|_| {
                    KursError::MalformedDocument(format!("invalid lesson number in: {}", line))
                })?;
                let title = caps[2].trim().to_string();

                // Optional "Lesson Link:" on the following line.
                let mut link = None;
                if let Some(next) = lines.get(i + 1) {
                    if let Some(link_caps) = lesson_link_pattern().captures(next.trim()) {
                        link = validate_link(&link_caps[1]);
                        i += 1;
                    }
                }

                let lesson = Lesson {
                    number,
                    title,
                    link,
                };
                course.lessons.push(lesson.clone());
                current_lesson = Some(lesson);
            } else {
                section_lines.push(lines[i]);
            }

            i += 1;
        }

        flush(
            current_lesson.as_ref(),
            &section_lines,
            &mut chunks,
            &mut chunk_index,
            &course,
        );

        debug!(
            course = %course.title,
            lessons = course.lessons.len(),
            chunks = chunks.len(),
            "Parsed course document"
        );

        Ok((course, chunks))
    }
}

/// Parse the course metadata header from the leading labeled lines.
///
/// The header ends at the first non-empty line that carries none of the
/// three `Course ...:` labels (or after three labeled lines), so unlabeled
/// preamble text is never consumed as metadata. Returns the course and the
/// index of the first body line.
fn parse_header(lines: &[&str]) -> Result<(Course, usize)> {
    let mut title = None;
    let mut link = None;
    let mut instructor = None;

    let mut seen = 0;
    let mut body_start = lines.len();

    for (i, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if seen == 3 || lesson_header_pattern().is_match(line) {
            body_start = i;
            break;
        }

        if let Some(value) = line.strip_prefix("Course Title:") {
            title = Some(value.trim().to_string()).filter(|t| !t.is_empty());
        } else if let Some(value) = line.strip_prefix("Course Link:") {
            link = validate_link(value.trim());
        } else if let Some(value) = line.strip_prefix("Course Instructor:") {
            instructor = Some(value.trim().to_string()).filter(|s| !s.is_empty());
        } else {
            // Unlabeled line: the body starts here.
            body_start = i;
            break;
        }

        seen += 1;
        body_start = i + 1;
    }

    let title = title.ok_or_else(|| {
        KursError::MalformedDocument("missing 'Course Title:' header line".to_string())
    })?;

    Ok((Course::new(title, link, instructor), body_start))
}

/// Accept a link only if it parses as a URL.
fn validate_link(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(_) => Some(raw.to_string()),
        Err(e) => {
            warn!("Ignoring invalid link '{}': {}", raw, e);
            None
        }
    }
}
