//! Vector store abstraction for Kurs.
//!
//! A store holds two logical collections keyed by course title: the course
//! catalog (one entry per course, searched to resolve fuzzy names) and the
//! course content (one entry per chunk, searched with metadata filters).

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::document::{Course, CourseChunk};
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A content chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique record ID.
    pub id: Uuid,
    /// Title of the course this chunk belongs to.
    pub course_title: String,
    /// Lesson number, if the chunk belongs to a lesson.
    pub lesson_number: Option<u32>,
    /// Position of this chunk within its course.
    pub chunk_index: u32,
    /// Context-labeled chunk text.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this record was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl ChunkRecord {
    /// Create a record from a parsed chunk and its embedding.
    pub fn new(chunk: CourseChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_title: chunk.course_title,
            lesson_number: chunk.lesson_number,
            chunk_index: chunk.chunk_index,
            content: chunk.text,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub record: ChunkRecord,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Equality filters applied to content search.
#[derive(Debug, Clone, Default)]
pub struct ChunkFilter {
    /// Exact (already resolved) course title.
    pub course_title: Option<String>,
    /// Lesson number within the course.
    pub lesson_number: Option<u32>,
}

impl ChunkFilter {
    /// Check whether a record passes the filter.
    pub fn matches(&self, record: &ChunkRecord) -> bool {
        if let Some(title) = &self.course_title {
            if &record.course_title != title {
                return false;
            }
        }
        if let Some(number) = self.lesson_number {
            if record.lesson_number != Some(number) {
                return false;
            }
        }
        true
    }
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert or replace a course catalog entry with its title embedding.
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()>;

    /// Bulk insert content chunks.
    async fn add_chunks(&self, records: &[ChunkRecord]) -> Result<usize>;

    /// Nearest catalog entry to the query embedding, if the catalog is
    /// non-empty.
    async fn best_course_match(&self, query_embedding: &[f32]) -> Result<Option<String>>;

    /// Search content chunks, ordered by similarity descending.
    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// All course titles present in the catalog.
    async fn list_course_titles(&self) -> Result<Vec<String>>;

    /// Full catalog entry for an exact title.
    async fn get_course(&self, title: &str) -> Result<Option<Course>>;

    /// Remove a course's catalog entry and all of its content chunks.
    /// Removing an absent course is a no-op.
    async fn remove_course(&self, title: &str) -> Result<()>;

    /// Number of catalog entries.
    async fn course_count(&self) -> Result<usize>;

    /// Number of content chunks.
    async fn chunk_count(&self) -> Result<usize>;

    /// Remove everything from both collections.
    async fn clear(&self) -> Result<()>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);
    }

    #[test]
    fn test_chunk_filter() {
        let record = ChunkRecord::new(
            CourseChunk {
                text: "content".to_string(),
                course_title: "Course A".to_string(),
                lesson_number: Some(2),
                chunk_index: 0,
            },
            vec![1.0],
        );

        assert!(ChunkFilter::default().matches(&record));
        assert!(ChunkFilter {
            course_title: Some("Course A".to_string()),
            lesson_number: Some(2),
        }
        .matches(&record));
        assert!(!ChunkFilter {
            course_title: Some("Course B".to_string()),
            lesson_number: None,
        }
        .matches(&record));
        assert!(!ChunkFilter {
            course_title: None,
            lesson_number: Some(3),
        }
        .matches(&record));
    }
}
