//! Run statistics accumulated one completed job at a time.

use super::types::{ItemResult, RunReport, RunSummary, TextExtractionSummary};

/// How a job's extraction step ended, if it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionTally {
    /// Text accepted with this many characters.
    Accepted {
        /// Characters in the accepted text.
        characters: usize,
    },
    /// Placeholder substituted.
    Degraded,
}

/// Counters owned by the orchestrator for the duration of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Jobs that produced a result.
    pub processed: usize,
    /// Successful jobs, including skips.
    pub successful: usize,
    /// Failed jobs.
    pub errors: usize,
    /// Idempotent skips.
    pub skipped: usize,
    /// Chunks newly created.
    pub chunks_created: usize,
    /// Accepted extractions.
    pub extraction_successful: usize,
    /// Extractions replaced by the placeholder.
    pub extraction_failed: usize,
    /// Characters across accepted extractions.
    pub total_characters: usize,
}

impl RunStatistics {
    /// Fold one completed job into the counters.
    pub fn apply(&mut self, result: &ItemResult, extraction: Option<ExtractionTally>) {
        self.processed += 1;
        if result.success {
            self.successful += 1;
            if result.is_skipped() {
                self.skipped += 1;
            } else {
                self.chunks_created += result.chunks;
            }
        } else {
            self.errors += 1;
        }

        match extraction {
            Some(ExtractionTally::Accepted { characters }) => {
                self.extraction_successful += 1;
                self.total_characters += characters;
            }
            Some(ExtractionTally::Degraded) => self.extraction_failed += 1,
            None => {}
        }
    }

    /// Rounded mean characters per accepted extraction; zero when none were accepted.
    pub fn average_characters(&self) -> usize {
        if self.extraction_successful == 0 {
            0
        } else {
            (self.total_characters as f64 / self.extraction_successful as f64).round() as usize
        }
    }

    /// Share of processed jobs that succeeded.
    pub fn success_rate(&self) -> f64 {
        percentage(self.successful, self.processed)
    }

    /// Share of processed jobs whose extraction was accepted.
    pub fn extraction_rate(&self) -> f64 {
        percentage(self.extraction_successful, self.processed)
    }

    /// Assemble the final report.
    pub fn into_report(
        self,
        total_files: usize,
        results: Vec<ItemResult>,
        generated_at: String,
    ) -> RunReport {
        RunReport {
            summary: RunSummary {
                total_files,
                processed: self.processed,
                successful: self.successful,
                errors: self.errors,
                skipped: self.skipped,
                chunks_created: self.chunks_created,
                success_rate: self.success_rate(),
            },
            text_extraction: TextExtractionSummary {
                successful: self.extraction_successful,
                failed: self.extraction_failed,
                total_characters: self.total_characters,
                average_characters: self.average_characters(),
                success_rate: self.extraction_rate(),
            },
            results,
            generated_at,
        }
    }
}

/// Percentage rounded to two decimals; zero when the denominator is zero.
pub fn percentage(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let value = numerator as f64 / denominator as f64 * 100.0;
    (value * 100.0).round() / 100.0
}
