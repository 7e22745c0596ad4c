//! Pipeline orchestration: one request in, chunks or a typed error out.
//!
//! [`Pipeline`] owns everything a request needs (configuration, HTTP client,
//! block source) and nothing a request produces, so one instance can serve
//! any number of concurrent requests behind an `Arc`.
//!
//! ```text
//! Start ─▶ Fetching ─▶ Extracting ─▶ Ordering ─▶ Chunking ─▶ Done
//!   └──────────┴───────────┴────────────┴───────────┴──▶ Failed(kind)
//! ```
//!
//! Stages run strictly in sequence. The first error ends the request and is
//! returned as-is; there are no retries and no partial results.

use crate::config::PipelineConfig;
use crate::error::PdfTextError;
use crate::model::{DocumentRequest, PageBlockSet, PipelineOutput, PipelineStats, RawDocument, TextBlock};
use crate::observer::Stage;
use crate::pipeline::chunk::chunk_text;
use crate::pipeline::extract::{extract_blocks, BlockSource, PdfiumBlockSource};
use crate::pipeline::fetch::{DocumentFetcher, HttpFetcher};
use crate::pipeline::normalize::Normalizer;
use crate::pipeline::order::order_blocks;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The text-extraction pipeline.
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Arc<dyn DocumentFetcher>,
    blocks: Arc<dyn BlockSource>,
}

impl Pipeline {
    /// Build a pipeline with the HTTP fetcher and the pdfium block source.
    ///
    /// # Example
    /// ```rust,no_run
    /// use edgequake_pdftext::{DocumentRequest, Pipeline, PipelineConfig};
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pipeline = Pipeline::new(PipelineConfig::default())?;
    /// let output = pipeline
    ///     .process(&DocumentRequest::new("https://arxiv.org/pdf/1706.03762"))
    ///     .await?;
    /// for (i, chunk) in output.chunks.iter().enumerate() {
    ///     println!("chunk {i}: {} chars", chunk.chars().count());
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(config: PipelineConfig) -> Result<Self, PdfTextError> {
        let fetcher = HttpFetcher::new(&config)?;
        let blocks = PdfiumBlockSource::new(config.pdfium_library_path.clone())?;
        Ok(Self::with_components(
            config,
            Arc::new(fetcher),
            Arc::new(blocks),
        ))
    }

    /// Build a pipeline from explicit components.
    pub fn with_components(
        config: PipelineConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        blocks: Arc<dyn BlockSource>,
    ) -> Self {
        Self {
            config,
            fetcher,
            blocks,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Download, extract, order, normalise and chunk one document.
    ///
    /// # Errors
    /// - `ValidationError` if the request has no usable URL (no download is attempted)
    /// - `TransportError` / `HTTPError` if the download fails
    /// - `ParseError` if the bytes are not a readable PDF
    /// - `ConfigError` / `InternalError` otherwise
    pub async fn process(&self, request: &DocumentRequest) -> Result<PipelineOutput, PdfTextError> {
        let started = Instant::now();
        self.enter(Stage::Start);

        let result = self.fetch_and_run(request, started).await;
        self.finish(result)
    }

    /// Run the pipeline on bytes already in memory, skipping the download.
    pub async fn process_document(
        &self,
        document: RawDocument,
    ) -> Result<PipelineOutput, PdfTextError> {
        let started = Instant::now();
        self.enter(Stage::Start);
        let result = self.run_from_extraction(document, 0, started).await;
        self.finish(result)
    }

    /// Synchronous wrapper around [`Self::process`].
    ///
    /// Creates a temporary tokio runtime internally; do not call it from
    /// inside an async context.
    pub fn process_sync(&self, request: &DocumentRequest) -> Result<PipelineOutput, PdfTextError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| PdfTextError::Internal(format!("Failed to create tokio runtime: {e}")))?
            .block_on(self.process(request))
    }

    async fn fetch_and_run(
        &self,
        request: &DocumentRequest,
        started: Instant,
    ) -> Result<PipelineOutput, PdfTextError> {
        let url = requested_url(request)?;
        info!("Processing PDF: {}", url);

        self.enter(Stage::Fetching);
        let fetch_start = Instant::now();
        let document = self.fetcher.fetch(url).await?;
        let fetch_ms = fetch_start.elapsed().as_millis() as u64;

        self.run_from_extraction(document, fetch_ms, started).await
    }

    async fn run_from_extraction(
        &self,
        document: RawDocument,
        fetch_duration_ms: u64,
        started: Instant,
    ) -> Result<PipelineOutput, PdfTextError> {
        let bytes_downloaded = document.len();

        // ── Extract ──────────────────────────────────────────────────────
        self.enter(Stage::Extracting);
        let extract_start = Instant::now();
        let pages = self.extract(document).await?;
        let extract_duration_ms = extract_start.elapsed().as_millis() as u64;

        let page_count = pages.len();
        let mut blocks_seen = 0;
        for page in &pages {
            blocks_seen += page.blocks.len();
            self.config
                .observer
                .on_page_extracted(page.page + 1, page.blocks.len());
        }

        // ── Order + normalise ────────────────────────────────────────────
        self.enter(Stage::Ordering);
        let ordered: Vec<TextBlock> = pages.into_iter().flat_map(order_blocks).collect();
        let normalized = Normalizer::new(self.config.encoding).normalize(&ordered);
        debug!(
            "Kept {}/{} blocks, {} bytes of text",
            ordered.len(),
            blocks_seen,
            normalized.text.len()
        );

        // ── Chunk ────────────────────────────────────────────────────────
        self.enter(Stage::Chunking);
        let chunks = chunk_text(&normalized.text, self.config.chunk_size)?;

        let stats = PipelineStats {
            bytes_downloaded,
            page_count,
            blocks_seen,
            blocks_kept: ordered.len(),
            dropped_chars: normalized.dropped_chars,
            text_chars: normalized.text.chars().count(),
            chunk_count: chunks.len(),
            fetch_duration_ms,
            extract_duration_ms,
            total_duration_ms: started.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} pages, {} chars, {} chunks, {}ms total",
            stats.page_count, stats.text_chars, stats.chunk_count, stats.total_duration_ms
        );

        Ok(PipelineOutput { chunks, stats })
    }

    /// pdfium work blocks; keep it off the async worker threads.
    async fn extract(&self, document: RawDocument) -> Result<Vec<PageBlockSet>, PdfTextError> {
        let source = Arc::clone(&self.blocks);
        let password = self.config.password.clone();

        tokio::task::spawn_blocking(move || {
            extract_blocks(source.as_ref(), document, password.as_deref())
        })
        .await
        .map_err(|e| PdfTextError::Internal(format!("Extraction task panicked: {e}")))?
    }

    fn enter(&self, stage: Stage) {
        debug!("Pipeline stage: {}", stage);
        self.config.observer.on_stage(stage);
    }

    fn finish(
        &self,
        result: Result<PipelineOutput, PdfTextError>,
    ) -> Result<PipelineOutput, PdfTextError> {
        match &result {
            Ok(output) => {
                self.enter(Stage::Done);
                self.config.observer.on_complete(&output.stats);
            }
            Err(e) => {
                let kind = e.kind();
                if kind.is_client_error() {
                    warn!(kind = %kind, "Pipeline failed: {}", e);
                } else {
                    error!(kind = %kind, "Pipeline failed: {}", e);
                }
                self.enter(Stage::Failed(kind));
                self.config.observer.on_failure(kind, &e.to_string());
            }
        }
        result
    }
}

/// The trimmed URL of `request`, if it has a non-blank one.
fn requested_url(request: &DocumentRequest) -> Result<&str, PdfTextError> {
    match request.source_url.as_deref().map(str::trim) {
        Some(url) if !url.is_empty() => Ok(url),
        _ => Err(PdfTextError::MissingUrl),
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::observer::PipelineObserver;
    use futures::future::BoxFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Respond = Box<dyn Fn(&str) -> Result<RawDocument, PdfTextError> + Send + Sync>;

    struct StubFetcher {
        calls: AtomicUsize,
        respond: Respond,
    }

    impl StubFetcher {
        fn serving(bytes: &'static [u8]) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                respond: Box::new(move |_| Ok(RawDocument::from_bytes(bytes.to_vec()))),
            })
        }

        fn failing(respond: Respond) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                respond,
            })
        }
    }

    impl DocumentFetcher for StubFetcher {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<RawDocument, PdfTextError>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = (self.respond)(url);
            Box::pin(async move { result })
        }
    }

    struct StubBlocks {
        pages: Vec<PageBlockSet>,
        calls: AtomicUsize,
    }

    impl StubBlocks {
        fn new(pages: Vec<PageBlockSet>) -> Arc<Self> {
            Arc::new(Self {
                pages,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl BlockSource for StubBlocks {
        fn extract(
            &self,
            _bytes: Vec<u8>,
            _password: Option<&str>,
        ) -> Result<Vec<PageBlockSet>, PdfTextError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.pages.clone())
        }
    }

    #[derive(Default)]
    struct Recorder {
        stages: Mutex<Vec<Stage>>,
        pages: Mutex<Vec<(usize, usize)>>,
    }

    impl PipelineObserver for Recorder {
        fn on_stage(&self, stage: Stage) {
            self.stages.lock().unwrap().push(stage);
        }
        fn on_page_extracted(&self, page_num: usize, blocks: usize) {
            self.pages.lock().unwrap().push((page_num, blocks));
        }
    }

    fn hello_world_page() -> PageBlockSet {
        PageBlockSet::new(
            0,
            vec![
                TextBlock::new(0, 50.0, 10.0, "Hello"),
                TextBlock::new(0, 10.0, 10.0, "World"),
            ],
        )
    }

    fn pipeline(
        config: PipelineConfig,
        fetcher: Arc<StubFetcher>,
        blocks: Arc<StubBlocks>,
    ) -> Pipeline {
        Pipeline::with_components(config, fetcher, blocks)
    }

    #[tokio::test]
    async fn missing_url_never_fetches() {
        let fetcher = StubFetcher::serving(b"%PDF-1.4");
        let blocks = StubBlocks::new(vec![]);
        let p = pipeline(PipelineConfig::default(), fetcher.clone(), blocks.clone());

        for request in [
            DocumentRequest::default(),
            DocumentRequest::new(""),
            DocumentRequest::new("   "),
        ] {
            let err = p.process(&request).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(blocks.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blocks_on_one_line_read_left_to_right() {
        let p = pipeline(
            PipelineConfig::default(),
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(vec![hello_world_page()]),
        );
        let out = p
            .process(&DocumentRequest::new("https://example.com/a.pdf"))
            .await
            .unwrap();
        assert_eq!(out.chunks, vec!["World\nHello\n".to_string()]);
        assert_eq!(out.stats.page_count, 1);
        assert_eq!(out.stats.blocks_kept, 2);
        assert_eq!(out.stats.text_chars, 12);
    }

    #[tokio::test]
    async fn pages_concatenate_in_page_order_and_blanks_vanish() {
        let pages = vec![
            PageBlockSet::new(
                1,
                vec![
                    TextBlock::new(1, 0.0, 90.0, "page two, bottom"),
                    TextBlock::new(1, 0.0, 10.0, "page two, top"),
                ],
            ),
            PageBlockSet::new(
                0,
                vec![
                    TextBlock::new(0, 0.0, 5.0, "   "),
                    TextBlock::new(0, 0.0, 20.0, " page one "),
                ],
            ),
        ];
        let p = pipeline(
            PipelineConfig::default(),
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(pages),
        );
        let out = p
            .process(&DocumentRequest::new("https://example.com/a.pdf"))
            .await
            .unwrap();
        assert_eq!(out.text(), "page one\npage two, top\npage two, bottom\n");
        assert_eq!(out.stats.blocks_seen, 4);
        assert_eq!(out.stats.blocks_kept, 3);
    }

    #[tokio::test]
    async fn chunk_size_comes_from_config() {
        let config = PipelineConfig::builder().chunk_size(5).build().unwrap();
        let p = pipeline(
            config,
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(vec![hello_world_page()]),
        );
        let out = p
            .process(&DocumentRequest::new("https://example.com/a.pdf"))
            .await
            .unwrap();
        assert_eq!(out.chunks, vec!["World", "\nHell", "o\n"]);
        assert_eq!(out.stats.chunk_count, 3);
    }

    #[tokio::test]
    async fn http_error_propagates_verbatim() {
        let fetcher = StubFetcher::failing(Box::new(|url| {
            Err(PdfTextError::HttpStatus {
                url: url.to_string(),
                status: 404,
                body_excerpt: "Not Found".into(),
            })
        }));
        let blocks = StubBlocks::new(vec![]);
        let p = pipeline(PipelineConfig::default(), fetcher, blocks.clone());

        let err = p
            .process(&DocumentRequest::new("https://example.com/gone.pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Http);
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(blocks.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plain_text_download_is_parse_error() {
        let blocks = StubBlocks::new(vec![hello_world_page()]);
        let p = pipeline(
            PipelineConfig::default(),
            StubFetcher::serving(b"just some text, no pdf here"),
            blocks.clone(),
        );
        let err = p
            .process(&DocumentRequest::new("https://example.com/a.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(blocks.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn document_without_pages_yields_no_chunks() {
        let p = pipeline(
            PipelineConfig::default(),
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(vec![]),
        );
        let out = p
            .process(&DocumentRequest::new("https://example.com/empty.pdf"))
            .await
            .unwrap();
        assert!(out.chunks.is_empty());
        assert_eq!(out.stats.page_count, 0);
    }

    #[tokio::test]
    async fn observer_sees_every_stage_in_order() {
        let recorder = Arc::new(Recorder::default());
        let config = PipelineConfig::builder()
            .observer(recorder.clone())
            .build()
            .unwrap();
        let p = pipeline(
            config,
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(vec![hello_world_page()]),
        );
        p.process(&DocumentRequest::new("https://example.com/a.pdf"))
            .await
            .unwrap();

        assert_eq!(
            *recorder.stages.lock().unwrap(),
            vec![
                Stage::Start,
                Stage::Fetching,
                Stage::Extracting,
                Stage::Ordering,
                Stage::Chunking,
                Stage::Done
            ]
        );
        assert_eq!(*recorder.pages.lock().unwrap(), vec![(1, 2)]);
    }

    #[tokio::test]
    async fn observer_sees_failure_stage() {
        let recorder = Arc::new(Recorder::default());
        let config = PipelineConfig::builder()
            .observer(recorder.clone())
            .build()
            .unwrap();
        let p = pipeline(
            config,
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(vec![]),
        );
        let err = p.process(&DocumentRequest::default()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            *recorder.stages.lock().unwrap(),
            vec![Stage::Start, Stage::Failed(ErrorKind::Validation)]
        );
    }

    #[test]
    fn process_document_skips_the_fetcher() {
        let fetcher = StubFetcher::serving(b"unused");
        let p = pipeline(
            PipelineConfig::default(),
            fetcher.clone(),
            StubBlocks::new(vec![hello_world_page()]),
        );
        let out = tokio_test::block_on(
            p.process_document(RawDocument::from_bytes(b"%PDF-1.7".to_vec())),
        )
        .unwrap();
        assert_eq!(out.text(), "World\nHello\n");
        assert_eq!(out.stats.bytes_downloaded, 8);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn process_sync_runs_outside_a_runtime() {
        let p = pipeline(
            PipelineConfig::default(),
            StubFetcher::serving(b"%PDF-1.4"),
            StubBlocks::new(vec![hello_world_page()]),
        );
        let out = p
            .process_sync(&DocumentRequest::new("https://example.com/a.pdf"))
            .unwrap();
        assert_eq!(out.chunks.len(), 1);
    }
}
