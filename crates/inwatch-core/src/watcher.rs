//! Poll loop: list new PDFs, process each one, sleep, repeat.
//!
//! Each candidate goes through download → extract → record → mark known →
//! delete scratch file, in that order. The ledger is written only after the
//! row is in the output table, so a crash in between causes a retry on the
//! next run rather than a lost row.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::drive::{fetch_to_path, list_new_pdfs, RemoteStore};
use crate::error::Result;
use crate::invoice::InvoiceReader;
use crate::ledger::KnownFiles;
use crate::models::config::WatchConfig;
use crate::models::invoice::InvoiceRecord;
use crate::models::remote::RemoteFile;
use crate::sink::CsvSink;

/// Where the watcher currently is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Listing,
    Downloading,
    Extracting,
    Recording,
    MarkingKnown,
    Cleanup,
    Sleeping,
    Stopped,
}

/// What happened to a single candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateOutcome {
    /// A row was written and the file marked known.
    Recorded { amount_found: bool },
    /// The download failed; the file stays unknown and is retried next cycle.
    FetchFailed,
}

/// Counters for one cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// New files returned by the lister.
    pub listed: usize,
    /// Files recorded and marked known.
    pub recorded: usize,
    /// Recorded files where the amount to pay was found.
    pub amounts_found: usize,
    /// Files skipped because the download failed.
    pub fetch_failed: usize,
}

/// Scratch file removed when dropped, unless already cleaned up.
struct ScratchFile {
    path: PathBuf,
    armed: bool,
}

impl ScratchFile {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now. A file that was never created is fine.
    fn remove(mut self) -> Result<()> {
        self.armed = false;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = fs::remove_file(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Failed to remove scratch file {}: {}", self.path.display(), e);
                }
            }
        }
    }
}

/// Watches one Drive folder and records every new invoice exactly once.
pub struct Watcher<S, R> {
    config: WatchConfig,
    store: S,
    reader: R,
    known: KnownFiles,
    sink: CsvSink,
    state: WatchState,
}

impl<S: RemoteStore, R: InvoiceReader> Watcher<S, R> {
    /// Create a watcher, loading the ledger and preparing the scratch directory.
    pub fn new(config: WatchConfig, store: S, reader: R) -> Result<Self> {
        let known = KnownFiles::load(&config.storage.known_files)?;
        let sink = CsvSink::new(&config.storage.output_csv);
        fs::create_dir_all(&config.storage.scratch_dir)?;

        info!(
            folder_id = %config.drive.folder_id,
            known = known.len(),
            "Watcher ready"
        );

        Ok(Self {
            config,
            store,
            reader,
            known,
            sink,
            state: WatchState::Idle,
        })
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn known_files(&self) -> &KnownFiles {
        &self.known
    }

    pub fn sink(&self) -> &CsvSink {
        &self.sink
    }

    fn transition(&mut self, next: WatchState) {
        trace!(from = ?self.state, to = ?next, "State change");
        self.state = next;
    }

    /// Run a single cycle over all current candidates.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        self.cycle(&CancellationToken::new()).await
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between candidates, while a network call is
    /// in flight, and during the sleep. Local I/O errors end the loop.
    pub async fn run(&mut self, shutdown: CancellationToken) -> Result<()> {
        let interval = self.config.poll_interval();
        info!("Watching Drive folder {}", self.config.drive.folder_id);

        loop {
            let report = tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown requested during cycle");
                    break;
                }

                result = self.cycle(&shutdown) => result?,
            };

            if report.listed == 0 {
                debug!("No new files, waiting {}s before next poll", interval.as_secs());
            } else {
                info!(
                    listed = report.listed,
                    recorded = report.recorded,
                    amounts_found = report.amounts_found,
                    fetch_failed = report.fetch_failed,
                    "Cycle complete, waiting {}s before next poll",
                    interval.as_secs()
                );
            }

            self.transition(WatchState::Sleeping);
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested during poll wait");
                    break;
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        self.transition(WatchState::Stopped);
        info!("Watcher stopped");
        Ok(())
    }

    async fn cycle(&mut self, shutdown: &CancellationToken) -> Result<CycleReport> {
        self.transition(WatchState::Listing);
        let candidates = list_new_pdfs(&self.store, &self.config.drive.folder_id, &self.known).await;

        let mut report = CycleReport {
            listed: candidates.len(),
            ..CycleReport::default()
        };

        for file in &candidates {
            if shutdown.is_cancelled() {
                break;
            }

            match self.process_candidate(file).await? {
                CandidateOutcome::Recorded { amount_found } => {
                    report.recorded += 1;
                    if amount_found {
                        report.amounts_found += 1;
                    }
                }
                CandidateOutcome::FetchFailed => report.fetch_failed += 1,
            }
        }

        self.transition(WatchState::Idle);
        Ok(report)
    }

    /// Process one candidate end to end.
    pub async fn process_candidate(&mut self, file: &RemoteFile) -> Result<CandidateOutcome> {
        let processed_at = chrono::Local::now().fixed_offset();
        info!(file_id = %file.id, "New PDF detected: {}", file.name);

        self.transition(WatchState::Downloading);
        let scratch = ScratchFile::new(self.config.scratch_path(&file.id));
        if !fetch_to_path(&self.store, &file.id, scratch.path()).await {
            self.transition(WatchState::Cleanup);
            scratch.remove()?;
            return Ok(CandidateOutcome::FetchFailed);
        }

        self.transition(WatchState::Extracting);
        let fields = self.reader.read(scratch.path());
        let amount_found = fields.amount_to_pay.is_some();

        self.transition(WatchState::Recording);
        let record = InvoiceRecord::new(file, fields, processed_at);
        self.sink.append(&record)?;

        self.transition(WatchState::MarkingKnown);
        self.known.append(&file.id)?;

        self.transition(WatchState::Cleanup);
        scratch.remove()?;

        debug!(
            file_id = %file.id,
            amount_to_pay = record.amount_to_pay.as_deref().unwrap_or(""),
            "Recorded invoice"
        );
        Ok(CandidateOutcome::Recorded { amount_found })
    }
}
