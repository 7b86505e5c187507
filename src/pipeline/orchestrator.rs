//! Sequential job loop: catalog resolution, download, extraction, submission.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;

use crate::catalog::{Catalog, CatalogRecord};
use crate::extraction::{ExtractedText, TextConverter, extract_document};
use crate::payload::{PayloadInputs, SubmissionPayload, build_payload, current_timestamp_rfc3339};
use crate::pipeline::types::{Job, JobError, PipelineOptions};
use crate::report::{ExtractionTally, ItemResult, RunStatistics};
use crate::storage::ObjectStore;
use crate::submission::{SubmissionOutcome, Vectorizer};

/// Results and counters of a completed loop.
#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    /// One result per job, in job order.
    pub results: Vec<ItemResult>,
    /// Counters folded from every result.
    pub statistics: RunStatistics,
}

/// Per-job progression; each arm performs one stage.
enum JobState<'j> {
    Pending,
    CatalogResolved {
        record: &'j CatalogRecord,
    },
    Downloaded {
        record: &'j CatalogRecord,
        bytes: Vec<u8>,
    },
    Extracted {
        payload: SubmissionPayload,
    },
}

/// Drives jobs one at a time through the processing stages.
pub struct Pipeline<'a> {
    catalog: &'a Catalog,
    storage: &'a dyn ObjectStore,
    vectorizer: &'a dyn Vectorizer,
    converter: Arc<dyn TextConverter>,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    /// Assemble a pipeline over the given collaborators.
    pub fn new(
        catalog: &'a Catalog,
        storage: &'a dyn ObjectStore,
        vectorizer: &'a dyn Vectorizer,
        converter: Arc<dyn TextConverter>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            catalog,
            storage,
            vectorizer,
            converter,
            options,
        }
    }

    /// Process every job in order. Never fails: per-job errors become failed results.
    pub async fn run(&self, jobs: &[Job]) -> PipelineRun {
        let total = jobs.len();
        let mut run = PipelineRun {
            results: Vec::with_capacity(total),
            statistics: RunStatistics::default(),
        };

        tracing::info!(jobs = total, "Starting document processing");
        for (index, job) in jobs.iter().enumerate() {
            let (result, extraction) = self.process(job).await;
            run.statistics.apply(&result, extraction);
            run.results.push(result);

            let processed = run.statistics.processed;
            if progress_due(processed, self.options.progress_every) {
                tracing::info!(
                    processed,
                    total,
                    successful = run.statistics.successful,
                    errors = run.statistics.errors,
                    "Progress"
                );
            }

            if index + 1 < total && !self.options.delay.is_zero() {
                tokio::time::sleep(self.options.delay).await;
            }
        }

        debug_assert_eq!(run.results.len(), total);
        run
    }

    /// Failure boundary around one job; always yields exactly one result.
    async fn process(&self, job: &Job) -> (ItemResult, Option<ExtractionTally>) {
        let object = &job.object;
        let mut extraction = None;
        let outcome = AssertUnwindSafe(self.drive(job, &mut extraction))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(JobError::Unexpected(panic_message(panic.as_ref()))));

        let result = match outcome {
            Ok(SubmissionOutcome::Indexed { chunks }) => {
                tracing::info!(file = %object.name, id = %object.id, chunks, "Document submitted");
                ItemResult::indexed(&object.id, &object.name, chunks)
            }
            Ok(SubmissionOutcome::Skipped { .. }) => {
                ItemResult::skipped(&object.id, &object.name)
            }
            Err(error) => {
                tracing::warn!(file = %object.name, id = %object.id, error = %error, "Document failed");
                ItemResult::failed(&object.id, &object.name, error.to_string())
            }
        };
        (result, extraction)
    }

    async fn drive(
        &self,
        job: &Job,
        extraction: &mut Option<ExtractionTally>,
    ) -> Result<SubmissionOutcome, JobError> {
        let object = &job.object;
        let mut state = JobState::Pending;
        loop {
            state = match state {
                JobState::Pending => {
                    let record = self
                        .catalog
                        .lookup(&object.name)
                        .ok_or(JobError::CatalogMiss)?;
                    JobState::CatalogResolved { record }
                }
                JobState::CatalogResolved { record } => {
                    let bytes = self
                        .storage
                        .download(&object.name)
                        .await
                        .map_err(JobError::Download)?;
                    JobState::Downloaded { record, bytes }
                }
                JobState::Downloaded { record, bytes } => {
                    let size_bytes = object.size_bytes.unwrap_or(bytes.len() as u64);
                    let extracted = self.extract(job, bytes).await?;
                    *extraction = Some(if extracted.accepted {
                        ExtractionTally::Accepted {
                            characters: extracted.accepted_characters(),
                        }
                    } else {
                        ExtractionTally::Degraded
                    });

                    let public_url = self.storage.public_url(&object.name);
                    let processed_at = current_timestamp_rfc3339();
                    let payload = build_payload(&PayloadInputs {
                        object,
                        record,
                        extracted: &extracted,
                        public_url: &public_url,
                        size_bytes,
                        processed_at: &processed_at,
                    });
                    JobState::Extracted { payload }
                }
                JobState::Extracted { payload } => {
                    return self
                        .vectorizer
                        .submit(&payload)
                        .await
                        .map_err(JobError::from);
                }
            };
        }
    }

    /// Run the blocking converter off the async workers; the temp file lives inside the call.
    async fn extract(&self, job: &Job, bytes: Vec<u8>) -> Result<ExtractedText, JobError> {
        let converter = Arc::clone(&self.converter);
        let file_name = job.object.name.clone();
        tokio::task::spawn_blocking(move || {
            extract_document(converter.as_ref(), &bytes, &file_name)
        })
        .await
        .map_err(|err| JobError::Unexpected(format!("Extraction task failed: {err}")))
    }
}

/// Whether a progress line is due after `processed` jobs; `every == 0` disables it.
fn progress_due(processed: usize, every: usize) -> bool {
    every > 0 && processed > 0 && processed % every == 0
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Unexpected panic while processing document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::ExtractionError;
    use crate::pipeline::types::CATALOG_MISS_MESSAGE;
    use crate::storage::{StorageError, StorageObject};
    use crate::submission::SubmissionError;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct FakeStorage {
        missing: Vec<String>,
        downloads: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ObjectStore for FakeStorage {
        async fn list_objects(&self) -> Result<Vec<StorageObject>, StorageError> {
            Ok(Vec::new())
        }

        async fn download(&self, name: &str) -> Result<Vec<u8>, StorageError> {
            self.downloads.lock().expect("lock").push(name.to_string());
            if self.missing.iter().any(|missing| missing == name) {
                return Err(StorageError::UnexpectedStatus {
                    status: StatusCode::NOT_FOUND,
                    body: "Object not found".into(),
                });
            }
            Ok(name.as_bytes().to_vec())
        }

        fn public_url(&self, name: &str) -> String {
            format!("https://files.test/{name}")
        }
    }

    /// Replies per file name; defaults to three new chunks.
    #[derive(Default)]
    struct FakeVectorizer {
        replies: HashMap<String, Result<SubmissionOutcome, u16>>,
        submitted: Mutex<Vec<SubmissionPayload>>,
    }

    #[async_trait]
    impl Vectorizer for FakeVectorizer {
        async fn submit(
            &self,
            payload: &SubmissionPayload,
        ) -> Result<SubmissionOutcome, SubmissionError> {
            self.submitted.lock().expect("lock").push(payload.clone());
            match self.replies.get(&payload.name) {
                Some(Ok(outcome)) => Ok(*outcome),
                Some(Err(status)) => Err(SubmissionError::UnexpectedStatus {
                    status: StatusCode::from_u16(*status).expect("status"),
                    body: "rate limited".into(),
                }),
                None => Ok(SubmissionOutcome::Indexed { chunks: 3 }),
            }
        }
    }

    /// Returns text whose length depends on the input file name.
    struct FakeConverter;

    impl TextConverter for FakeConverter {
        fn convert(&self, document: &[u8]) -> Result<String, ExtractionError> {
            let name = String::from_utf8_lossy(document);
            if name.starts_with("panic") {
                panic!("converter exploded");
            }
            if name.starts_with("short") {
                return Ok("x".repeat(40));
            }
            if name.starts_with("broken") {
                return Err(ExtractionError::ConverterFailed {
                    code: Some(1),
                    stderr: "bad pdf".into(),
                });
            }
            Ok(format!("{name} {}", "lorem ipsum ".repeat(10)))
        }
    }

    fn job(id: &str, name: &str) -> Job {
        Job {
            object: StorageObject {
                id: id.into(),
                name: name.into(),
                size_bytes: Some(2048),
                created_at: Some("2024-01-01T00:00:00Z".into()),
            },
        }
    }

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::from_records(names.iter().map(|name| CatalogRecord {
            document_key: name.to_string(),
            title: format!("Title of {name}"),
            source_url: format!("https://iadb.test/{name}"),
        }))
    }

    fn options() -> PipelineOptions {
        PipelineOptions {
            delay: Duration::ZERO,
            progress_every: 10,
        }
    }

    #[tokio::test]
    async fn every_job_yields_exactly_one_result() {
        let names: Vec<String> = (0..12).map(|idx| format!("doc-{idx}.pdf")).collect();
        let jobs: Vec<Job> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| job(&idx.to_string(), name))
            .collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let catalog = catalog(&refs[..10]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&jobs)
            .await;

        assert_eq!(run.results.len(), jobs.len());
        assert_eq!(run.statistics.processed, jobs.len());
        assert_eq!(run.statistics.successful, 10);
        assert_eq!(run.statistics.errors, 2);
        let ids: Vec<&str> = run.results.iter().map(|r| r.file_id.as_str()).collect();
        let expected: Vec<String> = (0..12).map(|idx| idx.to_string()).collect();
        assert_eq!(ids, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn catalog_miss_skips_download_and_submission() {
        let catalog = catalog(&[]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("a", "unknown.pdf")])
            .await;

        assert_eq!(
            run.results,
            vec![ItemResult::failed("a", "unknown.pdf", CATALOG_MISS_MESSAGE)]
        );
        assert!(storage.downloads.lock().expect("lock").is_empty());
        assert!(vectorizer.submitted.lock().expect("lock").is_empty());
        assert_eq!(run.statistics.extraction_failed, 0);
    }

    #[tokio::test]
    async fn short_text_submits_placeholder_and_counts_failed_extraction() {
        let catalog = catalog(&["short.pdf"]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("s", "short.pdf")])
            .await;

        assert!(run.results[0].success);
        assert_eq!(run.statistics.extraction_failed, 1);
        assert_eq!(run.statistics.total_characters, 0);
        let submitted = vectorizer.submitted.lock().expect("lock");
        assert_eq!(submitted.len(), 1);
        assert!(submitted[0].content.ends_with(
            "[Error extrayendo contenido del PDF - Archivo: short.pdf, Tamaño: 9 bytes]"
        ));
        assert!(submitted[0].content.contains("Tamaño: 2048 bytes\n"));
        assert_eq!(submitted[0].size_bytes, 2048);
    }

    #[tokio::test]
    async fn skip_response_reports_zero_chunks() {
        let catalog = catalog(&["dup.pdf"]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer {
            replies: HashMap::from([(
                "dup.pdf".to_string(),
                Ok(SubmissionOutcome::Skipped { existing_chunks: 12 }),
            )]),
            ..Default::default()
        };

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("d", "dup.pdf")])
            .await;

        assert_eq!(run.results, vec![ItemResult::skipped("d", "dup.pdf")]);
        assert_eq!(run.results[0].chunks, 0);
        assert_eq!(run.statistics.chunks_created, 0);
        assert_eq!(run.statistics.skipped, 1);
    }

    #[tokio::test]
    async fn transport_error_fails_only_its_job() {
        let catalog = catalog(&["limited.pdf", "fine.pdf"]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer {
            replies: HashMap::from([("limited.pdf".to_string(), Err(429))]),
            ..Default::default()
        };

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("l", "limited.pdf"), job("f", "fine.pdf")])
            .await;

        assert_eq!(
            run.results[0],
            ItemResult::failed("l", "limited.pdf", "API Error: 429 - rate limited")
        );
        assert_eq!(run.results[1], ItemResult::indexed("f", "fine.pdf", 3));
    }

    #[tokio::test]
    async fn download_failure_is_recorded_and_run_continues() {
        let catalog = catalog(&["gone.pdf", "here.pdf"]);
        let storage = FakeStorage {
            missing: vec!["gone.pdf".into()],
            ..Default::default()
        };
        let vectorizer = FakeVectorizer::default();

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("g", "gone.pdf"), job("h", "here.pdf")])
            .await;

        assert!(!run.results[0].success);
        let message = run.results[0].error.as_deref().unwrap_or_default();
        assert!(message.starts_with("Error descargando archivo"), "{message}");
        assert!(run.results[1].success);
    }

    #[tokio::test]
    async fn panicking_stage_is_contained() {
        let catalog = catalog(&["panic.pdf", "after.pdf"]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("p", "panic.pdf"), job("a", "after.pdf")])
            .await;

        assert_eq!(run.results.len(), 2);
        assert!(!run.results[0].success);
        assert!(run.results[1].success);
        assert_eq!(run.statistics.processed, 2);
    }

    #[tokio::test]
    async fn accepted_extractions_feed_character_totals() {
        let catalog = catalog(&["one.pdf", "broken.pdf"]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();

        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options())
            .run(&[job("1", "one.pdf"), job("2", "broken.pdf")])
            .await;

        let expected = format!("one.pdf {}", "lorem ipsum ".repeat(10))
            .trim()
            .chars()
            .count();
        assert_eq!(run.statistics.extraction_successful, 1);
        assert_eq!(run.statistics.extraction_failed, 1);
        assert_eq!(run.statistics.total_characters, expected);
        assert_eq!(run.statistics.average_characters(), expected);
    }

    #[test]
    fn progress_is_reported_on_every_tenth_job() {
        let due: Vec<usize> = (1..=25).filter(|processed| progress_due(*processed, 10)).collect();
        assert_eq!(due, vec![10, 20]);
        assert!(!progress_due(0, 10));
        assert!(!progress_due(10, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_separates_jobs_but_does_not_follow_the_last() {
        let catalog = catalog(&[]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();
        let options = PipelineOptions {
            delay: Duration::from_millis(100),
            progress_every: 10,
        };

        let started = tokio::time::Instant::now();
        let run = Pipeline::new(&catalog, &storage, &vectorizer, Arc::new(FakeConverter), options)
            .run(&[job("1", "a.pdf"), job("2", "b.pdf"), job("3", "c.pdf")])
            .await;
        let elapsed = started.elapsed();

        assert_eq!(run.results.len(), 3);
        assert!(elapsed >= Duration::from_millis(200), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(300), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn single_job_is_not_delayed() {
        let catalog = catalog(&[]);
        let storage = FakeStorage::default();
        let vectorizer = FakeVectorizer::default();

        let started = tokio::time::Instant::now();
        Pipeline::new(
            &catalog,
            &storage,
            &vectorizer,
            Arc::new(FakeConverter),
            PipelineOptions::default(),
        )
        .run(&[job("1", "a.pdf")])
        .await;

        assert!(started.elapsed() < PipelineOptions::default().delay);
    }
}
