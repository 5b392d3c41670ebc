//! Dual course index: catalog plus content, over one vector store.
//!
//! The catalog collection resolves fuzzy course names with the same
//! nearest-neighbor semantics the content collection uses for search, so a
//! user phrase like "intro to ml" finds "Introduction to Machine Learning".

use crate::document::{Course, CourseChunk};
use crate::embedding::Embedder;
use crate::error::{KursError, Result};
use crate::vector_store::{ChunkFilter, ChunkRecord, SearchResult, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Catalog and content operations over the vector store.
pub struct CourseIndex {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
}

impl CourseIndex {
    /// Create an index over the given store and embedder.
    pub fn new(store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Register course metadata in the catalog, keyed by title.
    #[instrument(skip(self, course), fields(title = %course.title))]
    pub async fn upsert_course_metadata(&self, course: &Course) -> Result<()> {
        let title_embedding = self.embedder.embed(&course.title).await?;
        self.store.upsert_course(course, &title_embedding).await
    }

    /// Embed and store content chunks.
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    pub async fn add_chunks(&self, chunks: Vec<CourseChunk>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        if embeddings.len() != chunks.len() {
            return Err(KursError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord::new(chunk, embedding))
            .collect();

        self.store.add_chunks(&records).await
    }

    /// Ingest one parsed course: metadata into the catalog, chunks into the
    /// content collection.
    ///
    /// All embeddings are generated before either collection is written, so
    /// an embedding failure leaves both collections untouched. If the chunk
    /// write fails after the catalog write, the catalog entry is removed
    /// again; the two collections never disagree on the set of course
    /// titles, and a failed course stays re-ingestable.
    #[instrument(skip(self, course, chunks), fields(title = %course.title, chunks = chunks.len()))]
    pub async fn ingest_course(&self, course: &Course, chunks: Vec<CourseChunk>) -> Result<usize> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let (title_embedding, embeddings) = futures::try_join!(
            self.embedder.embed(&course.title),
            self.embedder.embed_batch(&texts)
        )?;
        if embeddings.len() != chunks.len() {
            return Err(KursError::Embedding(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| ChunkRecord::new(chunk, embedding))
            .collect();

        self.store.upsert_course(course, &title_embedding).await?;
        match self.store.add_chunks(&records).await {
            Ok(added) => Ok(added),
            Err(e) => {
                if let Err(cleanup) = self.store.remove_course(&course.title).await {
                    warn!(
                        "Failed to remove catalog entry for '{}' after chunk write error: {}",
                        course.title, cleanup
                    );
                }
                Err(e)
            }
        }
    }

    /// Resolve a fuzzy course name to the best-matching catalog title.
    ///
    /// A one-entry nearest-neighbor query against stored titles; only an
    /// empty catalog produces [`KursError::CourseNotFound`].
    #[instrument(skip(self))]
    pub async fn resolve_course_name(&self, fuzzy_name: &str) -> Result<String> {
        let query_embedding = self.embedder.embed(fuzzy_name).await?;
        self.store
            .best_course_match(&query_embedding)
            .await?
            .ok_or_else(|| KursError::CourseNotFound(fuzzy_name.to_string()))
    }

    /// All course titles in the catalog.
    pub async fn list_course_titles(&self) -> Result<Vec<String>> {
        self.store.list_course_titles().await
    }

    /// Full metadata for an exact course title.
    pub async fn get_course_metadata(&self, title: &str) -> Result<Option<Course>> {
        self.store.get_course(title).await
    }

    /// Lesson link for a course title and lesson number, if recorded.
    pub async fn lesson_link(&self, title: &str, lesson_number: u32) -> Result<Option<String>> {
        Ok(self
            .store
            .get_course(title)
            .await?
            .and_then(|course| course.lesson_link(lesson_number).map(str::to_string)))
    }

    /// Semantic content search with optional course and lesson filters.
    ///
    /// A fuzzy `course_name` is resolved against the catalog first; failure
    /// to resolve short-circuits the search with [`KursError::CourseNotFound`]
    /// rather than silently dropping the filter.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn search(
        &self,
        query: &str,
        course_name: Option<&str>,
        lesson_number: Option<u32>,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let course_title = match course_name {
            Some(name) => Some(self.resolve_course_name(name).await?),
            None => None,
        };

        let query_embedding = self.embedder.embed(query).await?;
        let filter = ChunkFilter {
            course_title,
            lesson_number,
        };

        let results = self
            .store
            .search_chunks(&query_embedding, &filter, limit)
            .await?;

        debug!("Search returned {} results", results.len());
        Ok(results)
    }

    /// Number of courses in the catalog.
    pub async fn course_count(&self) -> Result<usize> {
        self.store.course_count().await
    }

    /// Number of content chunks.
    pub async fn chunk_count(&self) -> Result<usize> {
        self.store.chunk_count().await
    }

    /// Empty both collections.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::HashEmbedder;
    use crate::vector_store::MemoryVectorStore;

    fn index() -> CourseIndex {
        CourseIndex::new(Arc::new(MemoryVectorStore::new()), Arc::new(HashEmbedder))
    }

    fn chunk(course: &str, lesson: Option<u32>, idx: u32, text: &str) -> CourseChunk {
        CourseChunk {
            text: text.to_string(),
            course_title: course.to_string(),
            lesson_number: lesson,
            chunk_index: idx,
        }
    }

    #[tokio::test]
    async fn test_fuzzy_resolution() {
        let index = index();

        let ml = Course::new("Introduction to Machine Learning".to_string(), None, None);
        let retrieval = Course::new("Advanced Retrieval".to_string(), None, None);
        index.upsert_course_metadata(&ml).await.unwrap();
        index.upsert_course_metadata(&retrieval).await.unwrap();

        let resolved = index.resolve_course_name("intro to ml").await.unwrap();
        assert_eq!(resolved, "Introduction to Machine Learning");
    }

    #[tokio::test]
    async fn test_resolution_against_empty_catalog() {
        let index = index();
        let err = index.resolve_course_name("anything").await.unwrap_err();
        assert!(matches!(err, KursError::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn test_search_with_filters() {
        let index = index();

        let course = Course::new("Introduction to Machine Learning".to_string(), None, None);
        index.upsert_course_metadata(&course).await.unwrap();
        index
            .add_chunks(vec![
                chunk(
                    "Introduction to Machine Learning",
                    Some(1),
                    0,
                    "Gradient descent minimizes the loss function step by step.",
                ),
                chunk(
                    "Introduction to Machine Learning",
                    Some(2),
                    1,
                    "Cross validation estimates generalization error reliably.",
                ),
            ])
            .await
            .unwrap();

        let results = index
            .search("gradient descent", Some("machine learning"), Some(1), 5)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.lesson_number, Some(1));

        // Filter with no matching chunks yields an empty result, not an error
        let results = index
            .search("gradient descent", Some("machine learning"), Some(9), 5)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_unresolvable_course_filter_short_circuits() {
        let index = index();
        let err = index
            .search("anything", Some("ghost course"), None, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, KursError::CourseNotFound(_)));
    }

    #[tokio::test]
    async fn test_failed_chunk_write_rolls_back_catalog_entry() {
        use crate::vector_store::{ChunkFilter, ChunkRecord, SearchResult, VectorStore};
        use async_trait::async_trait;

        // Accepts catalog writes but fails every chunk write.
        #[derive(Default)]
        struct ChunkWriteFailingStore {
            inner: MemoryVectorStore,
        }

        #[async_trait]
        impl VectorStore for ChunkWriteFailingStore {
            async fn upsert_course(
                &self,
                course: &Course,
                title_embedding: &[f32],
            ) -> crate::Result<()> {
                self.inner.upsert_course(course, title_embedding).await
            }

            async fn add_chunks(&self, _records: &[ChunkRecord]) -> crate::Result<usize> {
                Err(KursError::VectorStore("disk full".to_string()))
            }

            async fn best_course_match(
                &self,
                query_embedding: &[f32],
            ) -> crate::Result<Option<String>> {
                self.inner.best_course_match(query_embedding).await
            }

            async fn search_chunks(
                &self,
                query_embedding: &[f32],
                filter: &ChunkFilter,
                limit: usize,
            ) -> crate::Result<Vec<SearchResult>> {
                self.inner.search_chunks(query_embedding, filter, limit).await
            }

            async fn list_course_titles(&self) -> crate::Result<Vec<String>> {
                self.inner.list_course_titles().await
            }

            async fn get_course(&self, title: &str) -> crate::Result<Option<Course>> {
                self.inner.get_course(title).await
            }

            async fn remove_course(&self, title: &str) -> crate::Result<()> {
                self.inner.remove_course(title).await
            }

            async fn course_count(&self) -> crate::Result<usize> {
                self.inner.course_count().await
            }

            async fn chunk_count(&self) -> crate::Result<usize> {
                self.inner.chunk_count().await
            }

            async fn clear(&self) -> crate::Result<()> {
                self.inner.clear().await
            }
        }

        let index = CourseIndex::new(
            Arc::new(ChunkWriteFailingStore::default()),
            Arc::new(HashEmbedder),
        );

        let course = Course::new("Flaky Course".to_string(), None, None);
        let err = index
            .ingest_course(
                &course,
                vec![chunk("Flaky Course", Some(1), 0, "Some lesson content.")],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, KursError::VectorStore(_)));

        // Neither collection retains the course, so re-ingestion is possible.
        assert!(index.list_course_titles().await.unwrap().is_empty());
        assert_eq!(index.course_count().await.unwrap(), 0);
        assert_eq!(index.chunk_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_lesson_link_lookup() {
        let index = index();

        let mut course = Course::new("Linked Course".to_string(), None, None);
        course.lessons.push(crate::document::Lesson {
            number: 3,
            title: "Third".to_string(),
            link: Some("https://example.com/l3".to_string()),
        });
        index.upsert_course_metadata(&course).await.unwrap();

        let link = index.lesson_link("Linked Course", 3).await.unwrap();
        assert_eq!(link.as_deref(), Some("https://example.com/l3"));
        assert!(index.lesson_link("Linked Course", 4).await.unwrap().is_none());
    }
}
