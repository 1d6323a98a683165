//! Sequential derivative generation with the Alma rename post-pass.

use super::naming::{contains_whitespace, derivative_path, finalize_alma_thumbnails};
use super::{
    DerivativeKind, DerivativeResult, DerivativeSpec, ImageResizer, MagickResizer,
    ProcessingMode, ResizeRequest, SourceKind,
};
use crate::error::DerivativeError;
use crate::events::{null_sender, DerivativeEvent, Event, EventSender};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};

/// Results of one generation batch
#[derive(Debug, Clone, Default)]
pub struct DerivativeReport {
    /// One entry per (source, kind), in processing order
    pub results: Vec<DerivativeResult>,
    /// `(from, to)` pairs from the Alma post-pass
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Post-pass failures; per-derivative failures live in `results`
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl DerivativeReport {
    pub fn created_count(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.len() - self.created_count()
    }
}

/// Creates derivatives through an [`ImageResizer`]
#[derive(Debug, Clone, Default)]
pub struct DerivativeGenerator<R = MagickResizer> {
    resizer: R,
}

impl<R: ImageResizer> DerivativeGenerator<R> {
    pub fn new(resizer: R) -> Self {
        Self { resizer }
    }

    pub fn resizer(&self) -> &R {
        &self.resizer
    }

    /// Create one derivative of `source` and return where it was written.
    ///
    /// Rejects paths containing whitespace, kinds the mode does not produce
    /// and unsupported file types before the resizer is touched. Alma
    /// thumbnails come back under their `_TN.jpg` name; see
    /// [`finalize_alma_thumbnails`].
    pub fn create_derivative(
        &self,
        source: &Path,
        mode: ProcessingMode,
        kind: DerivativeKind,
    ) -> Result<PathBuf, DerivativeError> {
        if contains_whitespace(source) {
            return Err(DerivativeError::PathContainsWhitespace {
                path: source.to_path_buf(),
            });
        }

        let spec = DerivativeSpec::for_mode(mode, kind)?;
        let source_kind = SourceKind::from_path(source)?;

        let output = derivative_path(source, kind);
        if let Some(dir) = output.parent() {
            fs::create_dir_all(dir).map_err(|e| DerivativeError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }

        self.resizer.resize(&ResizeRequest {
            input: source,
            output: &output,
            width: spec.width,
            height: spec.height,
            quality: spec.quality,
            trim: spec.trim,
            first_page: source_kind == SourceKind::Pdf,
        })?;

        info!(
            "Created {} derivative '{}' for '{}'",
            kind,
            output.display(),
            source.display()
        );
        Ok(output)
    }

    /// Create every derivative `mode` calls for, for every source
    pub fn run(&self, sources: &[PathBuf], mode: ProcessingMode) -> DerivativeReport {
        self.run_with_events(sources, mode, &null_sender())
    }

    /// Create every derivative `mode` calls for, with event reporting.
    ///
    /// Sources are processed one at a time; a failure is recorded and the
    /// batch moves on. For Alma, thumbnails are renamed to
    /// `.jpg.clientThumb` after the last source is done.
    pub fn run_with_events(
        &self,
        sources: &[PathBuf],
        mode: ProcessingMode,
        events: &EventSender,
    ) -> DerivativeReport {
        let mut report = self.generate_with_events(sources, mode, events);
        self.finalize_with_events(&mut report, mode, events);
        report
    }

    /// First phase of a batch: write every derivative under its working
    /// name. Alma thumbnails stay `_TN.jpg` until
    /// [`finalize_with_events`](Self::finalize_with_events) runs.
    pub fn generate_with_events(
        &self,
        sources: &[PathBuf],
        mode: ProcessingMode,
        events: &EventSender,
    ) -> DerivativeReport {
        let start = Instant::now();
        let mut report = DerivativeReport::default();

        events.send(Event::Derivative(DerivativeEvent::Started {
            total: sources.len() * mode.derivative_kinds().len(),
        }));
        info!(
            "Creating {} derivatives for {} file(s) using {}",
            mode,
            sources.len(),
            self.resizer.name()
        );

        for source in sources {
            for &kind in mode.derivative_kinds() {
                let result = match self.create_derivative(source, mode, kind) {
                    Ok(output) => {
                        events.send(Event::Derivative(DerivativeEvent::Created {
                            source: source.clone(),
                            output: output.clone(),
                            kind,
                        }));
                        DerivativeResult::created(source.clone(), output, kind)
                    }
                    Err(e) => {
                        warn!(
                            "Failed to create {} derivative for '{}': {}",
                            kind,
                            source.display(),
                            e
                        );
                        events.send(Event::Derivative(DerivativeEvent::Failed {
                            source: source.clone(),
                            kind,
                            message: e.to_string(),
                        }));
                        DerivativeResult::failed(source.clone(), kind, &e)
                    }
                };
                report.results.push(result);
            }
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        report
    }

    /// Second phase of a batch: the Alma `.jpg.clientThumb` rename, then
    /// the completion event. A no-op rename for CollectionBuilder.
    pub fn finalize_with_events(
        &self,
        report: &mut DerivativeReport,
        mode: ProcessingMode,
        events: &EventSender,
    ) {
        let start = Instant::now();

        if mode.renames_thumbnails() {
            self.rename_thumbnails(report, events);
        }

        report.duration_ms += start.elapsed().as_millis() as u64;
        events.send(Event::Derivative(DerivativeEvent::Completed {
            created: report.created_count(),
            failed: report.failed_count(),
        }));
    }

    fn rename_thumbnails(&self, report: &mut DerivativeReport, events: &EventSender) {
        let dirs: BTreeSet<PathBuf> = report
            .results
            .iter()
            .filter(|r| r.kind == DerivativeKind::Thumbnail)
            .filter_map(|r| r.output_path.as_ref()?.parent().map(Path::to_path_buf))
            .collect();

        for dir in dirs {
            match finalize_alma_thumbnails(&dir) {
                Ok(pairs) => {
                    for (from, to) in &pairs {
                        events.send(Event::Derivative(DerivativeEvent::Renamed {
                            from: from.clone(),
                            to: to.clone(),
                        }));
                    }
                    report.renamed.extend(pairs);
                }
                Err(e) => {
                    warn!("Thumbnail rename failed in {}: {}", dir.display(), e);
                    report.errors.push(e.to_string());
                }
            }
        }

        let moved: HashMap<&PathBuf, &PathBuf> =
            report.renamed.iter().map(|(from, to)| (from, to)).collect();
        for result in &mut report.results {
            if let Some(to) = result.output_path.as_ref().and_then(|p| moved.get(p)) {
                result.output_path = Some((*to).clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::fs::File;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records requests and writes an empty output file
    #[derive(Default)]
    struct SpyResizer {
        calls: Mutex<Vec<(PathBuf, u32, bool)>>,
    }

    impl SpyResizer {
        fn calls(&self) -> Vec<(PathBuf, u32, bool)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageResizer for SpyResizer {
        fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
            self.calls.lock().unwrap().push((
                request.input.to_path_buf(),
                request.width,
                request.first_page,
            ));
            File::create(request.output).unwrap();
            Ok(())
        }

        fn name(&self) -> &'static str {
            "spy"
        }
    }

    /// Fails every request
    struct BrokenResizer;

    impl ImageResizer for BrokenResizer {
        fn resize(&self, request: &ResizeRequest<'_>) -> Result<(), DerivativeError> {
            Err(DerivativeError::ToolFailed {
                command: format!("magick {}", request.input.display()),
                code: "1".to_string(),
                stderr: "no decode delegate".to_string(),
            })
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn count_with_suffix(dir: &Path, suffix: &str) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(suffix))
            .count()
    }

    #[test]
    fn whitespace_path_never_reaches_the_resizer() {
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let result = generator.create_derivative(
            Path::new("/scans/my photo.png"),
            ProcessingMode::CollectionBuilder,
            DerivativeKind::Thumbnail,
        );

        assert!(matches!(result, Err(DerivativeError::PathContainsWhitespace { .. })));
        assert!(generator.resizer().calls().is_empty());
    }

    #[test]
    fn unsupported_type_never_reaches_the_resizer() {
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let result = generator.create_derivative(
            Path::new("/scans/clip.mov"),
            ProcessingMode::Alma,
            DerivativeKind::Thumbnail,
        );

        assert!(matches!(result, Err(DerivativeError::UnsupportedFileType { .. })));
        assert!(generator.resizer().calls().is_empty());
    }

    #[test]
    fn alma_small_is_unsupported() {
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let result = generator.create_derivative(
            Path::new("/scans/a.png"),
            ProcessingMode::Alma,
            DerivativeKind::Small,
        );

        assert!(matches!(result, Err(DerivativeError::UnsupportedKind { .. })));
    }

    #[test]
    fn collection_builder_names_and_sizes() {
        let temp_dir = TempDir::new().unwrap();
        let source = touch(temp_dir.path(), "grinnell_1.tif");
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let thumb = generator
            .create_derivative(&source, ProcessingMode::CollectionBuilder, DerivativeKind::Thumbnail)
            .unwrap();
        let small = generator
            .create_derivative(&source, ProcessingMode::CollectionBuilder, DerivativeKind::Small)
            .unwrap();

        assert_eq!(thumb, temp_dir.path().join("grinnell_1_TN.jpg"));
        assert_eq!(small, temp_dir.path().join("grinnell_1_SMALL.jpg"));
        let widths: Vec<u32> = generator.resizer().calls().iter().map(|c| c.1).collect();
        assert_eq!(widths, vec![400, 800]);
    }

    #[test]
    fn pdf_requests_first_page() {
        let temp_dir = TempDir::new().unwrap();
        let source = touch(temp_dir.path(), "letter.PDF");
        let generator = DerivativeGenerator::new(SpyResizer::default());

        generator
            .create_derivative(&source, ProcessingMode::Alma, DerivativeKind::Thumbnail)
            .unwrap();

        assert!(generator.resizer().calls()[0].2);
    }

    #[test]
    fn objs_source_creates_sibling_directory() {
        let temp_dir = TempDir::new().unwrap();
        let objs = temp_dir.path().join("OBJS");
        fs::create_dir(&objs).unwrap();
        let source = touch(&objs, "scan.jpg");
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let small = generator
            .create_derivative(&source, ProcessingMode::CollectionBuilder, DerivativeKind::Small)
            .unwrap();

        assert_eq!(small, temp_dir.path().join("SMALL").join("scan_SMALL.jpg"));
        assert!(small.exists());
    }

    #[test]
    fn alma_batch_renames_every_thumbnail() {
        let temp_dir = TempDir::new().unwrap();
        let sources = vec![
            touch(temp_dir.path(), "a.png"),
            touch(temp_dir.path(), "b.png"),
            touch(temp_dir.path(), "c.tif"),
        ];
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let report = generator.run(&sources, ProcessingMode::Alma);

        assert_eq!(report.created_count(), 3);
        assert_eq!(report.renamed.len(), 3);
        assert_eq!(count_with_suffix(temp_dir.path(), "_TN.jpg"), 0);
        assert_eq!(count_with_suffix(temp_dir.path(), ".jpg.clientThumb"), 3);
        assert_eq!(
            report.results[0].output_path,
            Some(temp_dir.path().join("a.jpg.clientThumb"))
        );
    }

    #[test]
    fn collection_builder_batch_keeps_tn_names() {
        let temp_dir = TempDir::new().unwrap();
        let sources = vec![touch(temp_dir.path(), "a.png")];
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let report = generator.run(&sources, ProcessingMode::CollectionBuilder);

        assert_eq!(report.results.len(), 2);
        assert!(report.renamed.is_empty());
        assert!(temp_dir.path().join("a_TN.jpg").exists());
        assert!(temp_dir.path().join("a_SMALL.jpg").exists());
    }

    #[test]
    fn failures_are_recorded_and_batch_continues() {
        let temp_dir = TempDir::new().unwrap();
        let sources = vec![
            temp_dir.path().join("bad name.png"),
            touch(temp_dir.path(), "notes.txt"),
            touch(temp_dir.path(), "ok.jpg"),
        ];
        let generator = DerivativeGenerator::new(SpyResizer::default());

        let report = generator.run(&sources, ProcessingMode::Alma);

        assert_eq!(report.results.len(), 3);
        assert_eq!(report.failed_count(), 2);
        assert!(report.results[2].success);
        assert!(report.results[0].error.as_deref().unwrap().contains("spaces"));
        assert_eq!(generator.resizer().calls().len(), 1);
    }

    #[test]
    fn tool_failure_is_a_failed_result() {
        let temp_dir = TempDir::new().unwrap();
        let sources = vec![touch(temp_dir.path(), "a.png")];
        let generator = DerivativeGenerator::new(BrokenResizer);

        let report = generator.run(&sources, ProcessingMode::CollectionBuilder);

        assert_eq!(report.failed_count(), 2);
        assert!(report.results.iter().all(|r| r.output_path.is_none()));
    }

    #[test]
    fn events_report_creations_and_renames() {
        let temp_dir = TempDir::new().unwrap();
        let sources = vec![touch(temp_dir.path(), "a.png")];
        let generator = DerivativeGenerator::new(SpyResizer::default());
        let (sender, receiver) = EventChannel::new();

        generator.run_with_events(&sources, ProcessingMode::Alma, &sender);

        let events = receiver.drain();
        assert!(matches!(
            events.first(),
            Some(Event::Derivative(DerivativeEvent::Started { total: 1 }))
        ));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::Derivative(DerivativeEvent::Renamed { .. }))));
        assert!(matches!(
            events.last(),
            Some(Event::Derivative(DerivativeEvent::Completed { created: 1, failed: 0 }))
        ));
    }

    #[test]
    fn started_total_counts_every_derivative() {
        let temp_dir = TempDir::new().unwrap();
        let sources = vec![touch(temp_dir.path(), "a.png"), touch(temp_dir.path(), "b.png")];
        let generator = DerivativeGenerator::new(SpyResizer::default());
        let (sender, receiver) = EventChannel::new();

        generator.run_with_events(&sources, ProcessingMode::CollectionBuilder, &sender);

        let events = receiver.drain();
        assert!(matches!(
            events.first(),
            Some(Event::Derivative(DerivativeEvent::Started { total: 4 }))
        ));
        let per_item = events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Event::Derivative(DerivativeEvent::Created { .. } | DerivativeEvent::Failed { .. })
                )
            })
            .count();
        assert_eq!(per_item, 4);
    }
}
