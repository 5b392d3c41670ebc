//! In-memory vector store implementation.
//!
//! Useful for testing and small corpora that are re-ingested at startup.

use super::{cosine_similarity, ChunkFilter, ChunkRecord, SearchResult, VectorStore};
use crate::document::Course;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

struct CatalogEntry {
    course: Course,
    title_embedding: Vec<f32>,
}

/// In-memory vector store.
pub struct MemoryVectorStore {
    catalog: RwLock<HashMap<String, CatalogEntry>>,
    chunks: RwLock<HashMap<String, ChunkRecord>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            catalog: RwLock::new(HashMap::new()),
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_course(&self, course: &Course, title_embedding: &[f32]) -> Result<()> {
        let mut catalog = self.catalog.write().unwrap();
        catalog.insert(
            course.title.clone(),
            CatalogEntry {
                course: course.clone(),
                title_embedding: title_embedding.to_vec(),
            },
        );
        Ok(())
    }

    async fn add_chunks(&self, records: &[ChunkRecord]) -> Result<usize> {
        let mut chunks = self.chunks.write().unwrap();
        for record in records {
            chunks.insert(record.id.to_string(), record.clone());
        }
        Ok(records.len())
    }

    async fn best_course_match(&self, query_embedding: &[f32]) -> Result<Option<String>> {
        let catalog = self.catalog.read().unwrap();

        let best = catalog
            .values()
            .map(|entry| {
                (
                    &entry.course.title,
                    cosine_similarity(query_embedding, &entry.title_embedding),
                )
            })
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

        Ok(best.map(|(title, _)| title.clone()))
    }

    async fn search_chunks(
        &self,
        query_embedding: &[f32],
        filter: &ChunkFilter,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let chunks = self.chunks.read().unwrap();

        let mut results: Vec<SearchResult> = chunks
            .values()
            .filter(|record| filter.matches(record))
            .map(|record| SearchResult {
                record: record.clone(),
                score: cosine_similarity(query_embedding, &record.embedding),
            })
            .collect();

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(limit);

        Ok(results)
    }

    async fn list_course_titles(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.read().unwrap();
        let mut titles: Vec<String> = catalog.keys().cloned().collect();
        titles.sort();
        Ok(titles)
    }

    async fn get_course(&self, title: &str) -> Result<Option<Course>> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.get(title).map(|entry| entry.course.clone()))
    }

    async fn remove_course(&self, title: &str) -> Result<()> {
        self.catalog.write().unwrap().remove(title);
        self.chunks
            .write()
            .unwrap()
            .retain(|_, record| record.course_title != title);
        Ok(())
    }

    async fn course_count(&self) -> Result<usize> {
        let catalog = self.catalog.read().unwrap();
        Ok(catalog.len())
    }

    async fn chunk_count(&self) -> Result<usize> {
        let chunks = self.chunks.read().unwrap();
        Ok(chunks.len())
    }

    async fn clear(&self) -> Result<()> {
        self.catalog.write().unwrap().clear();
        self.chunks.write().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CourseChunk;

    fn chunk(course: &str, lesson: Option<u32>, index: u32, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord::new(
            CourseChunk {
                text: format!("chunk {} of {}", index, course),
                course_title: course.to_string(),
                lesson_number: lesson,
                chunk_index: index,
            },
            embedding,
        )
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryVectorStore::new();

        let course = Course::new("Course A".to_string(), None, None);
        store.upsert_course(&course, &[1.0, 0.0]).await.unwrap();

        store
            .add_chunks(&[
                chunk("Course A", Some(1), 0, vec![1.0, 0.0]),
                chunk("Course A", Some(2), 1, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        assert_eq!(store.course_count().await.unwrap(), 1);
        assert_eq!(store.chunk_count().await.unwrap(), 2);

        let results = store
            .search_chunks(&[1.0, 0.0], &ChunkFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score > results[1].score);
        assert_eq!(results[0].record.lesson_number, Some(1));
    }

    #[tokio::test]
    async fn test_lesson_filter() {
        let store = MemoryVectorStore::new();
        store
            .add_chunks(&[
                chunk("Course A", Some(1), 0, vec![1.0, 0.0]),
                chunk("Course A", Some(2), 1, vec![1.0, 0.0]),
                chunk("Course B", Some(2), 0, vec![1.0, 0.0]),
            ])
            .await
            .unwrap();

        let filter = ChunkFilter {
            course_title: Some("Course A".to_string()),
            lesson_number: Some(2),
        };
        let results = store.search_chunks(&[1.0, 0.0], &filter, 10).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.course_title, "Course A");
        assert_eq!(results[0].record.lesson_number, Some(2));

        let no_match = ChunkFilter {
            course_title: Some("Course A".to_string()),
            lesson_number: Some(9),
        };
        let results = store.search_chunks(&[1.0, 0.0], &no_match, 10).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_best_course_match() {
        let store = MemoryVectorStore::new();
        assert!(store.best_course_match(&[1.0, 0.0]).await.unwrap().is_none());

        let a = Course::new("Course A".to_string(), None, None);
        let b = Course::new("Course B".to_string(), None, None);
        store.upsert_course(&a, &[1.0, 0.0]).await.unwrap();
        store.upsert_course(&b, &[0.0, 1.0]).await.unwrap();

        let best = store.best_course_match(&[0.9, 0.1]).await.unwrap();
        assert_eq!(best.as_deref(), Some("Course A"));
    }

    #[tokio::test]
    async fn test_remove_course_drops_both_collections() {
        let store = MemoryVectorStore::new();
        let a = Course::new("Course A".to_string(), None, None);
        let b = Course::new("Course B".to_string(), None, None);
        store.upsert_course(&a, &[1.0]).await.unwrap();
        store.upsert_course(&b, &[1.0]).await.unwrap();
        store
            .add_chunks(&[
                chunk("Course A", Some(1), 0, vec![1.0]),
                chunk("Course B", Some(1), 0, vec![1.0]),
            ])
            .await
            .unwrap();

        store.remove_course("Course A").await.unwrap();

        assert_eq!(store.list_course_titles().await.unwrap(), vec!["Course B"]);
        let remaining = store
            .search_chunks(&[1.0], &ChunkFilter::default(), 10)
            .await
            .unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].record.course_title, "Course B");

        // Removing an absent course is a no-op
        store.remove_course("Course A").await.unwrap();
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryVectorStore::new();
        let course = Course::new("Course A".to_string(), None, None);
        store.upsert_course(&course, &[1.0]).await.unwrap();
        store
            .add_chunks(&[chunk("Course A", None, 0, vec![1.0])])
            .await
            .unwrap();

        store.clear().await.unwrap();
        assert_eq!(store.course_count().await.unwrap(), 0);
        assert_eq!(store.chunk_count().await.unwrap(), 0);
    }
}
