//! Bulk import/export pipeline
//!
//! Records stream through a [`RecordSource`] or [`RecordSink`] in bounded
//! batches. Source reads and sink writes happen with no lock held; only the
//! per-batch apply (import) or per-batch scan (export) runs under the index
//! lock. Counters in [`BulkProgress`] are updated after each completed
//! batch, and the [`CancellationToken`] is checked between batches.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vexil_core::{
    matches_opt, ItemFailure, MetadataFilter, NewVector, Timestamp, VectorEntry, VectorError,
    VectorResult,
};

use crate::cancel::{BulkProgress, CancellationToken};
use crate::engine::VectorEngine;
use crate::heap::Seq;
use crate::vectors::{apply_put, resolve_batch_size, WriteReport};

// ============================================================================
// Sources and sinks
// ============================================================================

/// One item read from a source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRecord {
    /// A well-formed record
    Vector(NewVector),
    /// A record that could not be decoded; counted as a per-item failure
    Malformed {
        /// Id, if one could be recovered
        id: String,
        /// Decode error
        error: VectorError,
    },
}

/// Stream of records for `bulk_import`
pub trait RecordSource: Send {
    /// Next record, `Ok(None)` at end of input
    ///
    /// `Err` means the underlying reader failed; the import stops after the
    /// last completed batch.
    fn next_record(&mut self) -> VectorResult<Option<SourceRecord>>;
}

/// Destination for `bulk_export`
pub trait RecordSink: Send {
    /// Write one entry
    fn write_entry(&mut self, entry: &VectorEntry) -> VectorResult<()>;

    /// Flush buffered output
    fn flush(&mut self) -> VectorResult<()> {
        Ok(())
    }
}

/// JSON-lines reader: one `{"id", "vector", "metadata"}` object per line
///
/// Blank lines are skipped.
pub struct JsonLinesSource<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead + Send> JsonLinesSource<R> {
    /// Wrap a buffered reader
    pub fn new(reader: R) -> Self {
        JsonLinesSource {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send> RecordSource for JsonLinesSource<R> {
    fn next_record(&mut self) -> VectorResult<Option<SourceRecord>> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let line = self.buf.trim();
            if line.is_empty() {
                continue;
            }
            return Ok(Some(match serde_json::from_str::<NewVector>(line) {
                Ok(record) => SourceRecord::Vector(record),
                Err(e) => {
                    let id = serde_json::from_str::<serde_json::Value>(line)
                        .ok()
                        .and_then(|v| v.get("id").and_then(|id| id.as_str()).map(String::from))
                        .unwrap_or_default();
                    SourceRecord::Malformed {
                        id,
                        error: VectorError::invalid(format!(
                            "line {}: malformed record: {}",
                            self.line_no, e
                        )),
                    }
                }
            }));
        }
    }
}

/// JSON-lines writer, one [`VectorEntry`] object per line
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    /// Wrap a writer
    pub fn new(writer: W) -> Self {
        JsonLinesSink { writer }
    }

    /// Recover the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> RecordSink for JsonLinesSink<W> {
    fn write_entry(&mut self, entry: &VectorEntry) -> VectorResult<()> {
        serde_json::to_writer(&mut self.writer, entry)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> VectorResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory source
#[derive(Debug, Default)]
pub struct VecSource {
    items: VecDeque<NewVector>,
}

impl VecSource {
    /// Source yielding `items` in order
    pub fn new(items: Vec<NewVector>) -> Self {
        VecSource {
            items: items.into(),
        }
    }
}

impl RecordSource for VecSource {
    fn next_record(&mut self) -> VectorResult<Option<SourceRecord>> {
        Ok(self.items.pop_front().map(SourceRecord::Vector))
    }
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct VecSink {
    entries: Vec<VectorEntry>,
}

impl VecSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries written so far
    pub fn entries(&self) -> &[VectorEntry] {
        &self.entries
    }

    /// Take the written entries
    pub fn into_entries(self) -> Vec<VectorEntry> {
        self.entries
    }
}

impl RecordSink for VecSink {
    fn write_entry(&mut self, entry: &VectorEntry) -> VectorResult<()> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

// ============================================================================
// Options and reports
// ============================================================================

/// Options for `bulk_import`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkOptions {
    /// Records per batch (engine `bulk_batch_size` when absent)
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Overwrite existing ids instead of failing them
    #[serde(default = "default_upsert")]
    pub upsert: bool,
}

fn default_upsert() -> bool {
    true
}

impl Default for BulkOptions {
    fn default() -> Self {
        BulkOptions {
            batch_size: None,
            upsert: true,
        }
    }
}

/// Result of `bulk_import`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkReport {
    /// Records read and applied (or failed)
    pub processed: usize,
    /// New ids written
    pub inserted: usize,
    /// Existing ids overwritten
    pub updated: usize,
    /// Records that failed
    pub failed: usize,
    /// One record per failure
    pub failures: Vec<ItemFailure>,
    /// Completed batches
    pub batches_processed: usize,
    /// Whether cancellation stopped the job early
    pub cancelled: bool,
}

/// Options for `bulk_export`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Entries per batch (engine `bulk_batch_size` when absent)
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Export only matching entries
    #[serde(default)]
    pub filter: Option<MetadataFilter>,
    /// Include embeddings
    #[serde(default)]
    pub include_vectors: bool,
}

/// Result of `bulk_export`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Entries scanned
    pub processed: usize,
    /// Entries written to the sink
    pub exported: usize,
    /// Completed batches
    pub batches_processed: usize,
    /// Whether cancellation stopped the job early
    pub cancelled: bool,
}

// ============================================================================
// Engine operations
// ============================================================================

impl VectorEngine {
    /// Stream records from `source` into an index
    ///
    /// Malformed records and per-item validation errors are counted as
    /// failures. A reader error stops the job: batches already applied stay
    /// applied, the partially read batch is discarded, and the error is
    /// returned (`progress` still shows the completed batches).
    pub fn bulk_import(
        &self,
        index: &str,
        source: &mut dyn RecordSource,
        options: &BulkOptions,
        progress: &BulkProgress,
        cancel: &CancellationToken,
    ) -> VectorResult<BulkReport> {
        self.track("bulk_import", || {
            let batch_size = resolve_batch_size(options.batch_size, self.config.bulk_batch_size)?;
            let slot = self.slot(index)?;
            slot.state.read().ensure_live()?;

            let mut report = BulkReport::default();
            loop {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }

                let mut vectors = Vec::with_capacity(batch_size);
                let mut batch = WriteReport::default();
                let mut read = 0;
                let mut exhausted = false;
                while read < batch_size {
                    match source.next_record() {
                        Ok(Some(SourceRecord::Vector(v))) => vectors.push(v),
                        Ok(Some(SourceRecord::Malformed { id, error })) => {
                            batch.failed += 1;
                            batch.failures.push(ItemFailure::new(id, &error));
                        }
                        Ok(None) => {
                            exhausted = true;
                            break;
                        }
                        Err(e) => {
                            warn!(
                                target: "vexil::bulk",
                                index,
                                batches_processed = report.batches_processed,
                                error = %e,
                                "Bulk import aborted by source error"
                            );
                            return Err(e);
                        }
                    }
                    read += 1;
                }
                if read == 0 {
                    break;
                }

                {
                    let mut state = slot.state.write();
                    state.ensure_live()?;
                    let now = Timestamp::now();
                    for v in vectors {
                        apply_put(&mut *state, v, options.upsert, now, &mut batch)?;
                    }
                }

                report.processed += read;
                report.inserted += batch.inserted;
                report.updated += batch.updated;
                report.failed += batch.failed;
                report.failures.extend(batch.failures);
                report.batches_processed += 1;

                progress.add_processed(read as u64);
                progress.add_inserted(batch.inserted as u64);
                progress.add_updated(batch.updated as u64);
                progress.add_failed(batch.failed as u64);
                progress.finish_batch();

                if batch.failed > 0 {
                    warn!(
                        target: "vexil::bulk",
                        index,
                        batch = report.batches_processed,
                        failed = batch.failed,
                        "Bulk batch completed with item failures"
                    );
                }
                if exhausted {
                    break;
                }
            }

            if report.cancelled {
                warn!(
                    target: "vexil::bulk",
                    index,
                    batches_processed = report.batches_processed,
                    "Bulk import cancelled"
                );
            } else {
                info!(
                    target: "vexil::bulk",
                    index,
                    processed = report.processed,
                    inserted = report.inserted,
                    updated = report.updated,
                    failed = report.failed,
                    batches = report.batches_processed,
                    "Bulk import completed"
                );
            }
            Ok(report)
        })
    }

    /// Stream an index's entries into `sink` in insertion order
    ///
    /// Paging uses an insertion-sequence cursor, so entries deleted between
    /// batches are skipped and no surviving entry is written twice.
    pub fn bulk_export(
        &self,
        index: &str,
        sink: &mut dyn RecordSink,
        options: &ExportOptions,
        progress: &BulkProgress,
        cancel: &CancellationToken,
    ) -> VectorResult<ExportReport> {
        self.track("bulk_export", || {
            let batch_size = resolve_batch_size(options.batch_size, self.config.bulk_batch_size)?;
            let slot = self.slot(index)?;

            let mut report = ExportReport::default();
            let mut cursor: Seq = 0;
            loop {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }

                let mut entries = Vec::with_capacity(batch_size);
                let mut scanned = 0usize;
                let mut exhausted = true;
                {
                    let state = slot.state.read();
                    state.ensure_live()?;
                    state.store.scan(cursor, &mut |entry| {
                        scanned += 1;
                        cursor = entry.seq + 1;
                        if matches_opt(options.filter.as_ref(), entry.metadata) {
                            entries.push(entry.to_entry(options.include_vectors));
                            if entries.len() >= batch_size {
                                exhausted = false;
                                return ControlFlow::Break(());
                            }
                        }
                        ControlFlow::Continue(())
                    })?;
                }

                for entry in &entries {
                    sink.write_entry(entry)?;
                }
                if scanned > 0 {
                    report.processed += scanned;
                    report.exported += entries.len();
                    report.batches_processed += 1;
                    progress.add_processed(scanned as u64);
                    progress.add_exported(entries.len() as u64);
                    progress.finish_batch();
                }
                if exhausted {
                    break;
                }
            }
            sink.flush()?;

            if report.cancelled {
                warn!(
                    target: "vexil::bulk",
                    index,
                    exported = report.exported,
                    "Bulk export cancelled"
                );
            } else {
                info!(
                    target: "vexil::bulk",
                    index,
                    exported = report.exported,
                    batches = report.batches_processed,
                    "Bulk export completed"
                );
            }
            Ok(report)
        })
    }
}
