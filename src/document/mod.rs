//! Course document model and transcript parsing.
//!
//! A course document is a semi-structured text file: a metadata header
//! (title, link, instructor) followed by numbered lesson sections.

mod parser;

pub use parser::DocumentParser;

use serde::{Deserialize, Serialize};

/// A course with its ordered lessons.
///
/// The title is the course identity: the catalog holds at most one entry
/// per title, and chunks reference their course by it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Course {
    /// Course title (unique key).
    pub title: String,
    /// Course homepage link.
    pub link: Option<String>,
    /// Instructor name.
    pub instructor: Option<String>,
    /// Lessons in the order they appear in the source document.
    pub lessons: Vec<Lesson>,
}

impl Course {
    /// Create a course with no lessons yet.
    pub fn new(title: String, link: Option<String>, instructor: Option<String>) -> Self {
        Self {
            title,
            link,
            instructor,
            lessons: Vec::new(),
        }
    }

    /// Look up a lesson by number.
    pub fn lesson(&self, number: u32) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.number == number)
    }

    /// Link for a lesson, if the document provided one.
    pub fn lesson_link(&self, number: u32) -> Option<&str> {
        self.lesson(number).and_then(|l| l.link.as_deref())
    }
}

/// A single lesson within a course.
///
/// Numbers are taken from the lesson headers and need not be contiguous.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Lesson {
    /// Lesson number from the header.
    pub number: u32,
    /// Lesson title.
    pub title: String,
    /// Lesson link, if present.
    pub link: Option<String>,
}

/// A context-labeled passage of course text, the unit of retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CourseChunk {
    /// Chunk text, prefixed with a context label so it is self-describing.
    pub text: String,
    /// Title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson number, or `None` for course-level preamble content.
    pub lesson_number: Option<u32>,
    /// Position of this chunk within its course, gap-free from 0.
    pub chunk_index: u32,
}
