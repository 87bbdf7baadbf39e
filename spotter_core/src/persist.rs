//! Fire-and-forget persistence for session results.
//!
//! Sessions hand new personal records and finished workout logs to a
//! [`RecordSink`] and move on. [`BackgroundWriter`] is the production sink:
//! a dedicated thread owning the [`TrainingStore`], fed through a channel.
//! Write failures are logged there and never reach the session.

use crate::store::TrainingStore;
use crate::{PersonalRecord, Result, WorkoutLog};
use std::sync::mpsc::{channel, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// A write the session wants performed eventually
#[derive(Clone, Debug, PartialEq)]
pub enum PersistRequest {
    PersonalRecord(PersonalRecord),
    WorkoutLog(WorkoutLog),
}

/// Accepts writes without blocking the caller
pub trait RecordSink {
    fn submit(&self, request: PersistRequest);
}

impl<T: RecordSink + ?Sized> RecordSink for Arc<T> {
    fn submit(&self, request: PersistRequest) {
        (**self).submit(request)
    }
}

/// Outcome counts reported when the writer shuts down
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WriterStats {
    pub written: usize,
    pub failed: usize,
}

pub struct BackgroundWriter {
    tx: Option<Sender<PersistRequest>>,
    worker: Option<JoinHandle<WriterStats>>,
}

impl BackgroundWriter {
    /// Start the writer thread, moving the store onto it
    pub fn spawn<S>(mut store: S) -> Result<Self>
    where
        S: TrainingStore + 'static,
    {
        let (tx, rx) = channel::<PersistRequest>();

        let worker = std::thread::Builder::new()
            .name("spotter-writer".into())
            .spawn(move || {
                let mut stats = WriterStats::default();
                for request in rx {
                    let result = match &request {
                        PersistRequest::PersonalRecord(record) => {
                            store.upsert_personal_record(record)
                        }
                        PersistRequest::WorkoutLog(log) => store.insert_workout_log(log),
                    };

                    match result {
                        Ok(()) => stats.written += 1,
                        Err(e) => {
                            stats.failed += 1;
                            tracing::warn!("Failed to persist {}: {}", request_kind(&request), e);
                        }
                    }
                }
                tracing::debug!(
                    "Writer drained: {} written, {} failed",
                    stats.written,
                    stats.failed
                );
                stats
            })?;

        Ok(Self {
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    /// Stop accepting writes, wait for queued ones to finish
    pub fn shutdown(mut self) -> WriterStats {
        self.finish()
    }

    fn finish(&mut self) -> WriterStats {
        // Closing the channel ends the worker loop once the queue is empty
        self.tx.take();
        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                tracing::error!("Writer thread panicked");
                WriterStats::default()
            }
            None => WriterStats::default(),
        }
    }
}

fn request_kind(request: &PersistRequest) -> &'static str {
    match request {
        PersistRequest::PersonalRecord(_) => "personal record",
        PersistRequest::WorkoutLog(_) => "workout log",
    }
}

impl RecordSink for BackgroundWriter {
    fn submit(&self, request: PersistRequest) {
        let Some(ref tx) = self.tx else {
            tracing::warn!("Writer already shut down, dropping {}", request_kind(&request));
            return;
        };
        if let Err(e) = tx.send(request) {
            tracing::warn!("Writer unavailable, dropping {}", request_kind(&e.0));
        }
    }
}

impl Drop for BackgroundWriter {
    fn drop(&mut self) {
        self.finish();
    }
}
