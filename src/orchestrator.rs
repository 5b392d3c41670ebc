//! Component wiring and startup ingestion for Kurs.

use crate::agent::{OpenAiChatModel, QueryRunner, ToolContext};
use crate::chunking::TextChunker;
use crate::config::{Prompts, Settings};
use crate::document::DocumentParser;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{KursError, Result};
use crate::index::CourseIndex;
use crate::rag::RagEngine;
use crate::session::MemorySessionStore;
use crate::vector_store::{MemoryVectorStore, SqliteVectorStore, VectorStore};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Document file extensions considered course transcripts.
const DOCUMENT_EXTENSIONS: &[&str] = &["txt", "md"];

/// The main coordinator: owns the index, the query engine and the parser.
pub struct Orchestrator {
    settings: Settings,
    parser: DocumentParser,
    index: Arc<CourseIndex>,
    engine: Arc<RagEngine>,
}

/// Result of ingesting a document folder.
#[derive(Debug, Default, Clone, Copy)]
pub struct IngestStats {
    /// Courses added to the catalog.
    pub courses_added: usize,
    /// Content chunks added.
    pub chunks_added: usize,
    /// Documents skipped because their course was already indexed.
    pub skipped: usize,
    /// Documents that failed to parse or index.
    pub failed: usize,
}

impl Orchestrator {
    /// Create an orchestrator with default (OpenAI-backed) components.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::with_config(
            &settings.embedding.model,
            settings.embedding.dimensions as usize,
        ));

        let store: Arc<dyn VectorStore> = match settings.vector_store.provider.as_str() {
            "memory" => Arc::new(MemoryVectorStore::new()),
            "sqlite" => Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?),
            other => {
                return Err(KursError::Config(format!(
                    "unknown vector store provider: {}",
                    other
                )));
            }
        };

        let index = Arc::new(CourseIndex::new(store, embedder));
        let model = Arc::new(OpenAiChatModel::new(&settings.rag.model));

        Self::with_components(settings, index, model)
    }

    /// Create an orchestrator with a custom index and chat model.
    pub fn with_components(
        settings: Settings,
        index: Arc<CourseIndex>,
        model: Arc<dyn crate::agent::ChatModel>,
    ) -> Result<Self> {
        settings.validate()?;

        let chunker = TextChunker::new(
            settings.chunking.chunk_size,
            settings.chunking.chunk_overlap,
        )?;
        let parser = DocumentParser::new(chunker);

        let prompts = Prompts::from_settings(&settings.prompts);
        let runner = QueryRunner::new(
            model,
            ToolContext::new(index.clone(), settings.search.max_results),
            prompts.rendered_system(),
            settings.rag.max_tool_rounds,
        );
        let sessions = Arc::new(MemorySessionStore::new(settings.session.max_history));
        let engine = Arc::new(RagEngine::new(runner, sessions));

        Ok(Self {
            settings,
            parser,
            index,
            engine,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the course index.
    pub fn index(&self) -> Arc<CourseIndex> {
        self.index.clone()
    }

    /// Get the query engine.
    pub fn rag_engine(&self) -> Arc<RagEngine> {
        self.engine.clone()
    }

    /// Ingest every course document in a folder.
    ///
    /// Courses already present in the catalog are skipped before parsing.
    /// A document that fails to parse or index is logged and skipped; it
    /// never aborts ingestion of the remaining documents.
    #[instrument(skip(self), fields(folder = %folder.display()))]
    pub async fn ingest_folder(&self, folder: &Path) -> Result<IngestStats> {
        let mut files: Vec<_> = std::fs::read_dir(folder)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        let existing: HashSet<String> = self
            .index
            .list_course_titles()
            .await?
            .into_iter()
            .collect();

        let mut stats = IngestStats::default();

        for path in files {
            match self.ingest_file(&path, &existing).await {
                Ok(Some(chunks)) => {
                    stats.courses_added += 1;
                    stats.chunks_added += chunks;
                }
                Ok(None) => stats.skipped += 1,
                Err(e) => {
                    warn!("Skipping document {:?}: {}", path, e);
                    stats.failed += 1;
                }
            }
        }

        info!(
            courses = stats.courses_added,
            chunks = stats.chunks_added,
            skipped = stats.skipped,
            failed = stats.failed,
            "Folder ingestion complete"
        );

        Ok(stats)
    }

    /// Ingest a single document. Returns `None` if its course was already
    /// indexed, or the number of chunks added.
    async fn ingest_file(
        &self,
        path: &Path,
        existing: &HashSet<String>,
    ) -> Result<Option<usize>> {
        let raw = std::fs::read_to_string(path)?;
        let (course, chunks) = self.parser.parse(&raw)?;

        if existing.contains(&course.title) {
            info!("Course '{}' already indexed, skipping", course.title);
            return Ok(None);
        }

        let added = self.index.ingest_course(&course, chunks).await?;
        Ok(Some(added))
    }
}
