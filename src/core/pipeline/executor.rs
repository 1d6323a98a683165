//! Pipeline execution implementation.

use crate::core::batch::{BatchMatcher, BatchResults};
use crate::core::derivative::{
    sanitize_path, DerivativeGenerator, DerivativeReport, ImageResizer, MagickResizer,
    ProcessingMode,
};
use crate::core::matcher::{WalkConfig, DEFAULT_THRESHOLD};
use crate::core::upload::{BlobStore, Container, UploadGate, UploadReport};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// Match outcome for every target
    pub matches: BatchResults,
    /// `(from, to)` renames of matched originals made before deriving
    pub sanitized: Vec<(PathBuf, PathBuf)>,
    /// Derivatives created for the matched files
    pub derivatives: DerivativeReport,
    /// Upload tallies; `None` when no blob store was configured
    pub uploads: Option<UploadReport>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl PipelineResult {
    pub fn summary(&self) -> PipelineSummary {
        let uploads = self.uploads.as_ref();
        PipelineSummary {
            targets: self.matches.len(),
            matched: self.matches.matched_count(),
            derivatives_created: self.derivatives.created_count(),
            derivatives_failed: self.derivatives.failed_count(),
            uploads_copied: uploads.map(|u| u.copied).unwrap_or(0),
            uploads_existing: uploads.map(|u| u.exists).unwrap_or(0),
            uploads_failed: uploads.map(|u| u.failed).unwrap_or(0),
            duration_ms: self.duration_ms,
        }
    }

    /// Where a matched original lives now, following any sanitizing rename
    pub fn current_path<'a>(&'a self, matched: &'a Path) -> &'a Path {
        self.sanitized
            .iter()
            .find(|(from, _)| from == matched)
            .map(|(_, to)| to.as_path())
            .unwrap_or(matched)
    }
}

/// Configuration for the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory tree searched for targets
    pub root: PathBuf,
    /// Minimum match score (0-100)
    pub threshold: u8,
    /// Which derivatives to create
    pub mode: ProcessingMode,
    /// Directory walk options
    pub walk: WalkConfig,
    /// Rename matched originals to safe names before deriving
    pub sanitize: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            threshold: DEFAULT_THRESHOLD,
            mode: ProcessingMode::CollectionBuilder,
            walk: WalkConfig::default(),
            sanitize: false,
        }
    }
}

/// Builder for pipeline configuration
pub struct PipelineBuilder {
    config: PipelineConfig,
    resizer: Option<Box<dyn ImageResizer>>,
    store: Option<Box<dyn BlobStore>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
            resizer: None,
            store: None,
        }
    }

    /// Set the search root
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Set the match threshold
    pub fn threshold(mut self, threshold: u8) -> Self {
        self.config.threshold = threshold.min(100);
        self
    }

    /// Set the processing mode
    pub fn mode(mut self, mode: ProcessingMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set walk options
    pub fn walk_config(mut self, walk: WalkConfig) -> Self {
        self.config.walk = walk;
        self
    }

    /// Sanitize matched file names before deriving
    pub fn sanitize(mut self, sanitize: bool) -> Self {
        self.config.sanitize = sanitize;
        self
    }

    /// Set the resize backend (default: ImageMagick)
    pub fn resizer(mut self, resizer: Box<dyn ImageResizer>) -> Self {
        self.resizer = Some(resizer);
        self
    }

    /// Upload originals and derivatives to this store
    pub fn store(mut self, store: Box<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the pipeline
    pub fn build(self) -> IngestPipeline {
        IngestPipeline {
            config: self.config,
            resizer: self
                .resizer
                .unwrap_or_else(|| Box::new(MagickResizer::new())),
            store: self.store,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Match, derive, then upload
pub struct IngestPipeline {
    config: PipelineConfig,
    resizer: Box<dyn ImageResizer>,
    store: Option<Box<dyn BlobStore>>,
}

impl IngestPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events. Returns `None` if matching was
    /// cancelled.
    pub fn run<P, C>(&self, targets: &[String], on_progress: P, is_cancelled: C) -> Option<PipelineResult>
    where
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        self.run_with_events(targets, on_progress, is_cancelled, &null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Cancellation is honoured during matching only; once derivatives are
    /// being created the run goes to the end.
    pub fn run_with_events<P, C>(
        &self,
        targets: &[String],
        on_progress: P,
        is_cancelled: C,
        events: &EventSender,
    ) -> Option<PipelineResult>
    where
        P: FnMut(f64),
        C: FnMut() -> bool,
    {
        let start_time = Instant::now();
        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Matching
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Matching,
        }));

        let matcher = BatchMatcher::builder()
            .root(self.config.root.clone())
            .threshold(self.config.threshold)
            .walk_config(self.config.walk.clone())
            .build();

        let Some(matches) = matcher.run_with_events(targets, on_progress, is_cancelled, events) else {
            info!("Ingest cancelled during matching");
            events.send(Event::Pipeline(PipelineEvent::Cancelled));
            return None;
        };

        let mut originals = unique_paths(matches.matched_paths());
        let mut sanitized = Vec::new();
        if self.config.sanitize {
            for original in originals.iter_mut() {
                match sanitize_path(original) {
                    Ok(renamed) if renamed != *original => {
                        sanitized.push((original.clone(), renamed.clone()));
                        *original = renamed;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Keeping '{}': {}", original.display(), e),
                }
            }
        }

        // Phase 2: Derivatives
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Deriving,
        }));

        let generator = DerivativeGenerator::new(&*self.resizer);
        let mut derivatives = generator.generate_with_events(&originals, self.config.mode, events);

        if self.config.mode.renames_thumbnails() {
            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Renaming,
            }));
        }
        generator.finalize_with_events(&mut derivatives, self.config.mode, events);

        // Phase 3: Uploads
        let uploads = self.store.as_ref().map(|store| {
            events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
                phase: PipelinePhase::Uploading,
            }));

            let mut items: Vec<(PathBuf, Container)> = originals
                .iter()
                .map(|path| (path.clone(), Container::Objs))
                .collect();
            items.extend(derivatives.results.iter().filter_map(|r| {
                r.output_path
                    .clone()
                    .map(|path| (path, Container::for_derivative(r.kind)))
            }));

            UploadGate::new(&**store).upload_batch_with_events(&items, events)
        });

        let result = PipelineResult {
            matches,
            sanitized,
            derivatives,
            uploads,
            duration_ms: start_time.elapsed().as_millis() as u64,
        };

        let summary = result.summary();
        info!(
            "Ingest finished: {}/{} matched, {} derivative(s), {} upload(s) copied in {}ms",
            summary.matched,
            summary.targets,
            summary.derivatives_created,
            summary.uploads_copied,
            summary.duration_ms
        );
        events.send(Event::Pipeline(PipelineEvent::Completed { summary }));

        Some(result)
    }
}

/// Drop repeats, keeping first occurrence order
fn unique_paths(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::derivative::ResizeRequest;
    use crate::core::upload::InMemoryBlobStore;
    use crate::error::DerivativeError;
    use crate::events::EventChannel;
    use std::fs::{self, File};
    use std::sync::Arc;
    use tempfile::TempDir;

    /// Writes a stub JPEG for every request
    struct StubResizer;

    impl ImageResizer for StubResizer {
        fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
            fs::write(request.output, b"jpeg").map_err(|source| DerivativeError::Io {
                path: request.output.to_path_buf(),
                source,
            })
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    /// Shares one in-memory store between the pipeline and the test
    struct SharedStore(Arc<InMemoryBlobStore>);

    impl BlobStore for SharedStore {
        fn exists(&self, container: Container, key: &str) -> Result<bool, crate::error::UploadError> {
            self.0.exists(container, key)
        }

        fn upload(&self, container: Container, key: &str, bytes: &[u8]) -> Result<(), crate::error::UploadError> {
            self.0.upload(container, key, bytes)
        }

        fn name(&self) -> &'static str {
            "shared"
        }
    }

    fn targets(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("photo1.png")).unwrap();
        File::create(temp_dir.path().join("scan.tif")).unwrap();
        temp_dir
    }

    #[test]
    fn collection_builder_run_creates_and_uploads() {
        let temp_dir = fixture();
        let store = Arc::new(InMemoryBlobStore::new());
        let pipeline = IngestPipeline::builder()
            .root(temp_dir.path())
            .mode(ProcessingMode::CollectionBuilder)
            .resizer(Box::new(StubResizer))
            .store(Box::new(SharedStore(store.clone())))
            .build();

        let result = pipeline
            .run(&targets(&["photo1.png", "missing.pdf"]), |_| {}, || false)
            .unwrap();

        let summary = result.summary();
        assert_eq!((summary.targets, summary.matched), (2, 1));
        assert_eq!(summary.derivatives_created, 2);
        assert_eq!(summary.uploads_copied, 3);
        assert_eq!(store.keys(Container::Objs), vec!["photo1.png".to_string()]);
        assert_eq!(store.keys(Container::Thumbs), vec!["photo1_TN.jpg".to_string()]);
        assert_eq!(store.keys(Container::Smalls), vec!["photo1_SMALL.jpg".to_string()]);
    }

    #[test]
    fn alma_run_uploads_client_thumbs() {
        let temp_dir = fixture();
        let store = Arc::new(InMemoryBlobStore::new());
        let pipeline = IngestPipeline::builder()
            .root(temp_dir.path())
            .mode(ProcessingMode::Alma)
            .resizer(Box::new(StubResizer))
            .store(Box::new(SharedStore(store.clone())))
            .build();

        pipeline.run(&targets(&["scan.tif"]), |_| {}, || false).unwrap();

        assert_eq!(store.keys(Container::Thumbs), vec!["scan.jpg.clientThumb".to_string()]);
        assert!(temp_dir.path().join("scan.jpg.clientThumb").exists());
    }

    #[test]
    fn second_run_reports_existing_blobs() {
        let temp_dir = fixture();
        let store = Arc::new(InMemoryBlobStore::new());
        let build = || {
            IngestPipeline::builder()
                .root(temp_dir.path())
                .mode(ProcessingMode::Alma)
                .resizer(Box::new(StubResizer))
                .store(Box::new(SharedStore(store.clone())))
                .build()
        };

        build().run(&targets(&["photo1.png"]), |_| {}, || false).unwrap();
        let second = build().run(&targets(&["photo1.png"]), |_| {}, || false).unwrap();

        let uploads = second.uploads.unwrap();
        assert_eq!((uploads.copied, uploads.exists), (0, 2));
    }

    #[test]
    fn without_store_nothing_is_uploaded() {
        let temp_dir = fixture();
        let pipeline = IngestPipeline::builder()
            .root(temp_dir.path())
            .resizer(Box::new(StubResizer))
            .build();

        let result = pipeline.run(&targets(&["photo1.png"]), |_| {}, || false).unwrap();

        assert!(result.uploads.is_none());
        assert_eq!(result.derivatives.created_count(), 2);
    }

    #[test]
    fn cancelled_match_stops_the_pipeline() {
        let temp_dir = fixture();
        let pipeline = IngestPipeline::builder()
            .root(temp_dir.path())
            .resizer(Box::new(StubResizer))
            .build();
        let (sender, receiver) = EventChannel::new();

        let result = pipeline.run_with_events(&targets(&["photo1.png"]), |_| {}, || true, &sender);

        assert!(result.is_none());
        assert!(!temp_dir.path().join("photo1_TN.jpg").exists());
        assert!(matches!(
            receiver.drain().last(),
            Some(Event::Pipeline(PipelineEvent::Cancelled))
        ));
    }

    #[test]
    fn duplicate_targets_derive_once() {
        assert_eq!(
            unique_paths(vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/a")]),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn sanitize_renames_originals_before_deriving() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("scan 01.png")).unwrap();
        let store = Arc::new(InMemoryBlobStore::new());
        let pipeline = IngestPipeline::builder()
            .root(temp_dir.path())
            .mode(ProcessingMode::Alma)
            .sanitize(true)
            .resizer(Box::new(StubResizer))
            .store(Box::new(SharedStore(store.clone())))
            .build();

        let result = pipeline.run(&targets(&["scan 01.png"]), |_| {}, || false).unwrap();

        let matched = temp_dir.path().join("scan 01.png");
        assert_eq!(result.current_path(&matched), temp_dir.path().join("scan_01.png"));
        assert_eq!(result.derivatives.created_count(), 1);
        assert!(temp_dir.path().join("scan_01.jpg.clientThumb").exists());
        assert_eq!(store.keys(Container::Objs), vec!["scan_01.png".to_string()]);
    }

    #[test]
    fn unsanitized_spaces_fail_the_derivative() {
        let temp_dir = TempDir::new().unwrap();
        File::create(temp_dir.path().join("scan 01.png")).unwrap();
        let pipeline = IngestPipeline::builder()
            .root(temp_dir.path())
            .mode(ProcessingMode::Alma)
            .resizer(Box::new(StubResizer))
            .build();

        let result = pipeline.run(&targets(&["scan 01.png"]), |_| {}, || false).unwrap();

        assert!(result.sanitized.is_empty());
        assert_eq!(result.derivatives.failed_count(), 1);
        assert!(temp_dir.path().join("scan 01.png").exists());
    }
}
