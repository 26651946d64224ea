//! Command implementations for the docsearch CLI.
//!
//! Each command loads settings, opens the shared index and runs one
//! ingestion, query or maintenance step against it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use docsearch_embeddings::{load_embedder, EmbeddingModel};
use docsearch_ingest::{
    DirectoryWikiSource, IngestError, IngestionPipeline, PipelineConfig, SourceDocument,
    WikiCredentials, WikiSource,
};
use docsearch_retrieval::RetrievalService;
use docsearch_types::{
    expand_home, metadata_from_pairs, IndexStatus, SearchHit, Settings, META_FILE_NAME,
    META_SOURCE, META_TITLE,
};
use docsearch_vector::{store, SharedIndex};

use crate::cli::{Cli, Commands};

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(
    config_path: Option<&str>,
    index_path_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(index_path) = index_path_override {
        settings.index_path = index_path.to_string();
    }
    if let Some(log_level) = log_level_override {
        settings.log_level = log_level.to_string();
    }
    Ok(settings)
}

/// Install the global tracing subscriber. RUST_LOG wins over `log_level`.
pub fn init_logging(settings: &Settings) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Everything a command needs: settings, embedder and the opened index.
pub struct App {
    pub settings: Settings,
    pub embedder: Arc<dyn EmbeddingModel>,
    pub index: SharedIndex,
}

impl App {
    pub fn open(settings: Settings) -> Result<Self> {
        let index_dir = settings.expanded_index_path();
        let index = SharedIndex::open(&index_dir)
            .with_context(|| format!("Failed to open index at {:?}", index_dir))?;
        let embedder = load_embedder(&settings.embedder).context("Failed to load embedder")?;
        info!(
            index = ?index_dir,
            model = %embedder.info().name,
            dim = embedder.dimension(),
            "docsearch ready"
        );
        Ok(Self {
            settings,
            embedder,
            index,
        })
    }

    fn pipeline(&self, cancel: CancellationToken) -> Result<IngestionPipeline<dyn EmbeddingModel>> {
        let config = PipelineConfig {
            batch_size: self.settings.batch_size,
        };
        Ok(
            IngestionPipeline::new(Arc::clone(&self.embedder), self.index.clone(), config)?
                .with_cancellation(cancel),
        )
    }

    fn retrieval(&self) -> RetrievalService<dyn EmbeddingModel> {
        RetrievalService::new(Arc::clone(&self.embedder), self.index.clone())
    }

    /// Run ingestion on the blocking pool; Ctrl+C cancels between batches.
    async fn run_ingest<F>(&self, job: F) -> Result<usize>
    where
        F: FnOnce(&IngestionPipeline<dyn EmbeddingModel>) -> Result<usize, IngestError>
            + Send
            + 'static,
    {
        let cancel = CancellationToken::new();
        let pipeline = self.pipeline(cancel.clone())?;

        let watcher = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                if signal::ctrl_c().await.is_ok() {
                    info!("Received Ctrl+C, cancelling ingestion...");
                    cancel.cancel();
                }
            })
        };

        let result = tokio::task::spawn_blocking(move || job(&pipeline))
            .await
            .context("Ingestion task failed")?;
        watcher.abort();

        Ok(result?)
    }

    /// Ingest a plain text file. Title defaults to the file stem.
    pub async fn ingest_text(&self, file: &Path, title: Option<String>, source: &str) -> Result<usize> {
        let text = fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
        let title = title.unwrap_or_else(|| {
            file.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "Untitled".to_string())
        });
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let metadata = metadata_from_pairs([
            (META_SOURCE, source.to_string()),
            (META_TITLE, title),
            (META_FILE_NAME, file_name),
            ("file_path", file.display().to_string()),
        ]);

        let (size, overlap) = (self.settings.chunk_size, self.settings.chunk_overlap);
        let documents = vec![SourceDocument::new(text, metadata)];
        self.run_ingest(move |p| p.ingest_documents(&documents, size, overlap))
            .await
    }

    pub async fn ingest_pdf(&self, files: Vec<PathBuf>) -> Result<usize> {
        let (size, overlap) = (self.settings.chunk_size, self.settings.chunk_overlap);
        self.run_ingest(move |p| p.ingest_pdf_files(&files, size, overlap))
            .await
    }

    pub async fn ingest_wiki(&self, dir: Option<String>, page_ids: Vec<String>) -> Result<usize> {
        let wiki = &self.settings.wiki;
        let Some(dir) = dir.or_else(|| wiki.export_dir.clone()) else {
            bail!("No wiki export directory given (use --dir or wiki.export_dir)");
        };
        let source = DirectoryWikiSource::new(expand_home(&dir), WikiCredentials::from_settings(wiki));

        let (size, overlap) = (self.settings.chunk_size, self.settings.chunk_overlap);
        self.run_ingest(move |p| p.ingest_wiki_pages(&source, &page_ids, size, overlap))
            .await
    }

    pub async fn query(&self, text: &str, k: Option<usize>) -> Result<Vec<SearchHit>> {
        let k = k.unwrap_or(self.settings.top_k);
        Ok(self.retrieval().query_async(text, k).await?)
    }

    pub fn status(&self) -> Result<IndexStatus> {
        Ok(self.index.status()?)
    }

    /// Load the index stored in `other` and merge it in.
    pub fn merge(&self, other: &Path) -> Result<usize> {
        let other_index =
            store::load(other).with_context(|| format!("Failed to load index at {:?}", other))?;
        let pipeline = self.pipeline(CancellationToken::new())?;
        Ok(pipeline.merge_index(&other_index)?)
    }
}

/// Render one hit for terminal output.
pub fn format_hit(hit: &SearchHit) -> String {
    let mut out = format!(
        "{}. [{:.4}] {} ({}, {})",
        hit.rank,
        hit.score,
        hit.title(),
        hit.source(),
        hit.file_name()
    );
    if let Some(page) = hit.chunk.meta("page") {
        out.push_str(&format!(" page {}", page));
    }
    out.push('\n');
    out.push_str("   ");
    out.push_str(&hit.chunk.text.replace('\n', " "));
    out
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(
        cli.config.as_deref(),
        cli.index_path.as_deref(),
        cli.log_level.as_deref(),
    )?;
    init_logging(&settings)?;
    let app = App::open(settings)?;

    match cli.command {
        Commands::IngestText {
            file,
            title,
            source,
        } => {
            let added = app.ingest_text(&file, title, &source).await?;
            println!("Added {} chunks from {:?}", added, file);
        }
        Commands::IngestPdf { files } => {
            let count = files.len();
            let added = app.ingest_pdf(files).await?;
            println!("Added {} chunks from {} PDF file(s)", added, count);
        }
        Commands::IngestWiki { dir, page_ids } => {
            let count = page_ids.len();
            let added = app.ingest_wiki(dir, page_ids).await?;
            println!("Added {} chunks from {} wiki page(s)", added, count);
        }
        Commands::Query { text, k } => {
            let hits = app.query(&text, k).await?;
            if hits.is_empty() {
                println!("No results");
            }
            for hit in &hits {
                println!("{}", format_hit(hit));
            }
        }
        Commands::Status => {
            let status = app.status()?;
            println!("Index path: {:?}", app.index.dir());
            match status.dimension {
                Some(dim) => println!("Index: {} records, dimension {}", status.record_count, dim),
                None => println!("Index: none"),
            }
            println!(
                "Embedder: {} ({} dimensions)",
                app.embedder.info().name,
                app.embedder.dimension()
            );

            let wiki = WikiCredentials::from_settings(&app.settings.wiki).connection_status();
            match &wiki.error_message {
                None => println!("Wiki: available ({} as {})", wiki.url, wiki.username),
                Some(err) => println!("Wiki: unavailable - {}", err),
            }
            if let Some(dir) = &app.settings.wiki.export_dir {
                let export = DirectoryWikiSource::new(expand_home(dir), WikiCredentials::default());
                println!(
                    "Wiki export dir: {} ({})",
                    dir,
                    if export.status().available { "found" } else { "missing" }
                );
            }
        }
        Commands::Merge { other } => {
            let merged = app.merge(&other)?;
            println!("Merged {} records from {:?}", merged, other);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_types::{Chunk, Metadata};
    use docsearch_vector::VectorIndex;
    use tempfile::TempDir;

    fn test_app(temp: &TempDir) -> App {
        let mut settings = Settings::default();
        settings.index_path = temp.path().join("index").to_string_lossy().to_string();
        settings.embedder.dimension = 32;
        settings.chunk_size = 40;
        settings.chunk_overlap = 10;
        App::open(settings).unwrap()
    }

    #[tokio::test]
    async fn test_ingest_text_then_query() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let file = temp.path().join("runbook.txt");
        fs::write(&file, "Restart the ingestion worker before rotating the keys.").unwrap();

        let added = app.ingest_text(&file, None, "text").await.unwrap();
        assert!(added >= 1);

        let hits = app.query("restart ingestion worker", Some(1)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title(), "runbook");
        assert_eq!(hits[0].file_name(), "runbook.txt");
        assert_eq!(hits[0].source(), "text");
    }

    #[tokio::test]
    async fn test_query_default_k() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        assert!(app.query("nothing indexed", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_wiki_requires_dir() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);
        assert!(app.ingest_wiki(None, vec!["1".to_string()]).await.is_err());
    }

    #[tokio::test]
    async fn test_ingest_wiki_from_export_dir() {
        let temp = TempDir::new().unwrap();
        let export = temp.path().join("export");
        fs::create_dir_all(&export).unwrap();
        fs::write(export.join("7.html"), "<p>On-call escalation policy</p>").unwrap();

        let app = test_app(&temp);
        let added = app
            .ingest_wiki(Some(export.to_string_lossy().to_string()), vec!["7".to_string()])
            .await
            .unwrap();
        assert!(added >= 1);
        assert_eq!(app.status().unwrap().record_count, added);
    }

    #[test]
    fn test_merge_from_directory() {
        let temp = TempDir::new().unwrap();
        let app = test_app(&temp);

        let other_dir = temp.path().join("other");
        let mut other = VectorIndex::new(32).unwrap();
        other
            .add(vec![(vec![0.25; 32], Chunk::new("imported", Metadata::new(), 0))])
            .unwrap();
        store::save(&other, &other_dir).unwrap();

        assert_eq!(app.merge(&other_dir).unwrap(), 1);
        assert_eq!(app.status().unwrap().record_count, 1);
        assert!(app.merge(&temp.path().join("absent")).is_err());
    }

    #[test]
    fn test_format_hit_defaults() {
        let hit = SearchHit::new(
            docsearch_types::RecordId(1),
            Chunk::new("line one\nline two", Metadata::new(), 0),
            0.5,
            1,
        );
        let rendered = format_hit(&hit);
        assert!(rendered.starts_with("1. [0.5000] Unknown Document (unknown, Unknown File)"));
        assert!(rendered.ends_with("line one line two"));
    }
}
