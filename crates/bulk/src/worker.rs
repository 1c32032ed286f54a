use std::sync::Arc;

use chrono::Utc;
use crossbeam::{
    channel::{Receiver, Sender},
    select,
};
use dorisload_client::{Destination, LoadOptions, Transport};
use log::debug;

use crate::{
    batch::{Batch, Record},
    error::{BulkError, Result},
    listener::{CommitInfo, CommitListener},
    retry::RetryPolicy,
};

/// Everything a worker needs to commit, shared by the whole pool.
pub(crate) struct CommitContext {
    pub(crate) transport: Arc<dyn Transport>,
    pub(crate) destination: Destination,
    pub(crate) options: LoadOptions,
    pub(crate) label_prefix: Option<String>,
    pub(crate) retry: RetryPolicy,
    pub(crate) listener: Arc<dyn CommitListener>,
    pub(crate) max_records: Option<usize>,
    pub(crate) max_bytes: Option<usize>,
}

/// Worker side of the channels connecting a worker to its processor.
pub(crate) struct WorkerChannels {
    /// Shared by every worker of the pool.
    pub(crate) intake: Receiver<Record>,
    pub(crate) flush: Receiver<()>,
    /// Answers each flush request with the outcome of its commit.
    pub(crate) flush_ack: Sender<Result<()>>,
}

enum Event {
    Record(Record),
    Flush,
    Closed,
}

pub(crate) struct Worker {
    id: usize,
    ctx: Arc<CommitContext>,
    batch: Batch,
    /// Commits issued so far, used to build unique labels.
    seq: u64,
}

impl Worker {
    pub(crate) fn new(id: usize, ctx: Arc<CommitContext>) -> Self {
        let batch = Batch::with_capacity(ctx.max_records.unwrap_or(0).min(4096));
        Self {
            id,
            ctx,
            batch,
            seq: 0,
        }
    }

    /// Process records and flush requests until the intake channel is
    /// closed, then commit what is left and return.
    pub(crate) fn run(mut self, channels: WorkerChannels) {
        let WorkerChannels {
            intake,
            flush,
            flush_ack,
        } = channels;

        debug!("worker {} started", self.id);

        loop {
            let event = select! {
                recv(intake) -> msg => msg.map_or(Event::Closed, Event::Record),
                recv(flush) -> msg => msg.map_or(Event::Closed, |()| Event::Flush),
            };

            match event {
                Event::Record(record) => {
                    self.batch.push(record);
                    if self.commit_required() {
                        // Failures already went to the listener.
                        let _ = self.commit();
                    }
                }
                Event::Flush => {
                    let result = self.commit_pending();
                    if flush_ack.send(result).is_err() {
                        debug!("worker {}: flush caller is gone", self.id);
                    }
                }
                Event::Closed => break,
            }
        }

        let _ = self.commit_pending();
        debug!("worker {} stopped", self.id);
    }

    fn commit_required(&self) -> bool {
        self.ctx
            .max_records
            .is_some_and(|max| self.batch.len() >= max)
            || self
                .ctx
                .max_bytes
                .is_some_and(|max| self.batch.estimated_size() >= max)
    }

    fn commit_pending(&mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Ok(());
        }
        self.commit()
    }

    /// Commit the batch through the retry policy. The batch is cleared
    /// before the first attempt, whatever the outcome.
    fn commit(&mut self) -> Result<()> {
        let records = self.batch.len();
        let bytes = self.batch.estimated_size();
        let payload = self.batch.to_payload();
        self.batch.reset();

        self.seq += 1;
        let label = self.next_label();

        let labelled;
        let options = match &label {
            Some(label) => {
                labelled = self.ctx.options.clone().label(label.as_str());
                &labelled
            }
            None => &self.ctx.options,
        };

        let ctx = &self.ctx;
        let info = CommitInfo {
            worker: self.id,
            records,
            bytes,
            label: label.as_deref(),
        };

        debug!(
            "worker {} committing {records} records ({bytes} bytes)",
            self.id
        );

        let mut attempts = 0u32;
        let outcome = ctx.retry.run(
            || {
                attempts += 1;
                ctx.transport.commit(&payload, &ctx.destination, options)
            },
            |err, notice| {
                if !notice.is_final() {
                    ctx.listener.on_retry(&info, err, notice);
                }
            },
        );

        match outcome {
            Ok(response) => {
                ctx.listener.on_commit(&info, &response);
                Ok(())
            }
            Err(source) => {
                ctx.listener.on_failure(&info, &source, attempts);
                Err(BulkError::Commit {
                    worker: self.id,
                    records,
                    attempts,
                    source,
                })
            }
        }
    }

    /// `{prefix}_{worker}_{millis}_{seq}`; reused by every retry of one batch.
    fn next_label(&self) -> Option<String> {
        let prefix = self.ctx.label_prefix.as_deref()?;
        Some(format!(
            "{prefix}_{}_{}_{}",
            self.id,
            Utc::now().timestamp_millis(),
            self.seq
        ))
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
