use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam::{
    channel::{self, Receiver, Sender},
    select,
};
use dorisload_client::{Destination, LoadOptions, Transport};
use dorisload_runtime::{
    DEFAULT_MAX_BYTES, DEFAULT_MAX_RECORDS, DEFAULT_NUM_WORKERS, DEFAULT_RETRY_STATUS_CODES,
};
use log::{debug, info, warn};

use crate::{
    backoff::{Backoff, ExponentialBackoff},
    batch::Record,
    error::{BulkError, Result},
    listener::{CommitListener, LogListener},
    retry::RetryPolicy,
    worker::{CommitContext, Worker, WorkerChannels},
};

/// Processor side of one worker's flush handshake.
struct FlushControl {
    id: usize,
    request: Sender<()>,
    ack: Receiver<Result<()>>,
}

/// Flush controls of the running pool, in pool order.
type Controls = Arc<Vec<FlushControl>>;

struct Flusher {
    stop: Sender<()>,
    stopped: Receiver<()>,
    thread: JoinHandle<()>,
}

#[derive(Default)]
struct State {
    started: bool,
    intake: Option<Sender<Record>>,
    controls: Controls,
    workers: Vec<JoinHandle<()>>,
    flusher: Option<Flusher>,
}

/// Batches records across a pool of workers and commits them with
/// stream loads.
///
/// ```no_run
/// use std::{sync::Arc, time::Duration};
/// use dorisload_bulk::{BulkProcessor, Client, Destination};
///
/// let client = Client::builder("http://fe-host:8030")
///     .basic_auth("root", "")
///     .build()?;
/// let processor = BulkProcessor::builder(Arc::new(client), Destination::new("shop", "orders"))
///     .workers(4)
///     .max_records(10_000)
///     .flush_interval(Duration::from_secs(5))
///     .start()?;
///
/// processor.add("1,alice")?;
/// processor.flush()?;
/// processor.close()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct BulkProcessor {
    name: String,
    num_workers: usize,
    flush_interval: Option<Duration>,
    ctx: Arc<CommitContext>,
    state: Mutex<State>,
    /// One flush handshake at a time, so acks always reach the flusher
    /// that asked for them.
    flush_lock: Arc<Mutex<()>>,
}

impl BulkProcessor {
    pub fn builder(transport: Arc<dyn Transport>, destination: Destination) -> BulkProcessorBuilder {
        BulkProcessorBuilder::new(transport, destination)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn db(&self) -> &str {
        &self.ctx.destination.db
    }

    pub fn table(&self) -> &str {
        &self.ctx.destination.table
    }

    pub fn is_started(&self) -> bool {
        self.lock_state().started
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn check_triggers(&self) -> Result<()> {
        if self.ctx.max_records.is_none()
            && self.ctx.max_bytes.is_none()
            && self.flush_interval.is_none()
        {
            return Err(BulkError::Config(
                "max records, max bytes and flush interval are all disabled".into(),
            ));
        }
        Ok(())
    }

    /// Spawn the worker pool and, if configured, the periodic flusher.
    /// Starting a started processor does nothing.
    pub fn start(&self) -> Result<()> {
        let mut state = self.lock_state();

        self.check_triggers()?;

        if state.started {
            return Ok(());
        }

        let num_workers = self.num_workers.max(1);
        let (intake_tx, intake_rx) = channel::bounded::<Record>(0);

        let mut controls = Vec::with_capacity(num_workers);
        let mut workers = Vec::with_capacity(num_workers);

        for id in 0..num_workers {
            let (flush_tx, flush_rx) = channel::bounded(0);
            let (ack_tx, ack_rx) = channel::bounded(0);

            let worker = Worker::new(id, Arc::clone(&self.ctx));
            let channels = WorkerChannels {
                intake: intake_rx.clone(),
                flush: flush_rx,
                flush_ack: ack_tx,
            };

            let name = format!("{}-worker-{id}", self.name);
            let spawned = thread::Builder::new()
                .name(name.clone())
                .spawn(move || worker.run(channels));

            match spawned {
                Ok(handle) => {
                    workers.push(handle);
                    controls.push(FlushControl {
                        id,
                        request: flush_tx,
                        ack: ack_rx,
                    });
                }
                Err(source) => {
                    // Closing the intake lets the workers spawned so far exit.
                    drop(intake_tx);
                    join_all(workers);
                    return Err(BulkError::Spawn { name, source });
                }
            }
        }

        let controls: Controls = Arc::new(controls);

        let flusher = match self.flush_interval {
            Some(interval) => match self.spawn_flusher(interval, Arc::clone(&controls)) {
                Ok(flusher) => Some(flusher),
                Err(err) => {
                    drop(intake_tx);
                    join_all(workers);
                    return Err(err);
                }
            },
            None => None,
        };

        info!(
            "bulk processor {} started: {} workers, loading into {}.{}",
            self.name, num_workers, self.ctx.destination.db, self.ctx.destination.table
        );

        *state = State {
            started: true,
            intake: Some(intake_tx),
            controls,
            workers,
            flusher,
        };

        Ok(())
    }

    fn spawn_flusher(&self, interval: Duration, controls: Controls) -> Result<Flusher> {
        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let (stopped_tx, stopped_rx) = channel::bounded::<()>(0);
        let flush_lock = Arc::clone(&self.flush_lock);

        let name = format!("{}-flusher", self.name);
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || run_flusher(interval, &controls, &flush_lock, stop_rx, stopped_tx))
            .map_err(|source| BulkError::Spawn { name, source })?;

        Ok(Flusher {
            stop: stop_tx,
            stopped: stopped_rx,
            thread,
        })
    }

    /// Hand one record to the pool.
    ///
    /// Blocks until a worker is free to take it; a worker busy committing
    /// takes nothing. Fails only if the processor is not started.
    pub fn add(&self, record: impl Into<Record>) -> Result<()> {
        let intake = self
            .lock_state()
            .intake
            .clone()
            .ok_or_else(|| BulkError::NotStarted(self.name.clone()))?;

        intake
            .send(record.into())
            .map_err(|_| BulkError::NotStarted(self.name.clone()))
    }

    /// Ask every worker, in pool order, to commit what it holds, and wait
    /// for each to finish before asking the next.
    ///
    /// Every worker is asked even if an earlier one failed; the first
    /// failure is returned.
    pub fn flush(&self) -> Result<()> {
        let controls = Arc::clone(&self.lock_state().controls);
        flush_workers(&controls, &self.flush_lock)
    }

    /// Stop the flusher, close the intake and wait for every worker to
    /// commit its remaining records and exit. Closing a stopped processor
    /// does nothing.
    pub fn close(&self) -> Result<()> {
        let mut state = self.lock_state();

        if !state.started {
            return Ok(());
        }

        let mut panicked = None;

        if let Some(flusher) = state.flusher.take() {
            if flusher.stop.send(()).is_ok() {
                let _ = flusher.stopped.recv();
            }
            if flusher.thread.join().is_err() {
                panicked = Some(format!("{}-flusher", self.name));
            }
        }

        // Workers see the closed intake once every pending `add` is done.
        state.intake = None;

        for handle in state.workers.drain(..) {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                panicked = Some(name);
            }
        }

        state.controls = Controls::default();
        state.started = false;

        info!("bulk processor {} stopped", self.name);

        match panicked {
            Some(name) => Err(BulkError::Panicked(name)),
            None => Ok(()),
        }
    }

    /// Alias for [`BulkProcessor::close`].
    pub fn stop(&self) -> Result<()> {
        self.close()
    }
}

impl Drop for BulkProcessor {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("bulk processor {}: {err}", self.name);
        }
    }
}

fn join_all(workers: Vec<JoinHandle<()>>) {
    for handle in workers {
        let _ = handle.join();
    }
}

fn flush_workers(controls: &[FlushControl], flush_lock: &Mutex<()>) -> Result<()> {
    let _guard = flush_lock.lock().unwrap_or_else(PoisonError::into_inner);

    let mut first_error = None;

    for control in controls {
        if control.request.send(()).is_err() {
            // Worker already gone: the processor is closing.
            debug!("flush skipped worker {}: stopped", control.id);
            continue;
        }

        match control.ack.recv() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                first_error.get_or_insert(err);
            }
            Err(_) => debug!("worker {} stopped before acknowledging flush", control.id),
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Flush on every tick until asked to stop.
///
/// Failed commits were already handed to the commit listener by the
/// worker that dropped them.
fn run_flusher(
    interval: Duration,
    controls: &[FlushControl],
    flush_lock: &Mutex<()>,
    stop: Receiver<()>,
    stopped: Sender<()>,
) {
    let ticker = channel::tick(interval);
    debug!("periodic flush every {interval:?}");

    loop {
        select! {
            recv(ticker) -> _ => {
                if let Err(err) = flush_workers(controls, flush_lock) {
                    debug!("periodic flush: {err}");
                }
            },
            recv(stop) -> _ => break,
        }
    }

    let _ = stopped.send(());
    debug!("periodic flush stopped");
}

/// Configures a [`BulkProcessor`].
pub struct BulkProcessorBuilder {
    transport: Arc<dyn Transport>,
    destination: Destination,
    name: String,
    num_workers: usize,
    max_records: Option<usize>,
    max_bytes: Option<usize>,
    flush_interval: Option<Duration>,
    backoff: Arc<dyn Backoff>,
    retry_status_codes: HashSet<u16>,
    options: LoadOptions,
    label_prefix: Option<String>,
    listener: Arc<dyn CommitListener>,
}

impl BulkProcessorBuilder {
    pub fn new(transport: Arc<dyn Transport>, destination: Destination) -> Self {
        Self {
            name: format!("{}.{}", destination.db, destination.table),
            transport,
            destination,
            num_workers: DEFAULT_NUM_WORKERS,
            max_records: Some(DEFAULT_MAX_RECORDS),
            max_bytes: Some(DEFAULT_MAX_BYTES),
            flush_interval: None,
            backoff: Arc::new(ExponentialBackoff::default()),
            retry_status_codes: DEFAULT_RETRY_STATUS_CODES.iter().copied().collect(),
            options: LoadOptions::new(),
            label_prefix: None,
            listener: Arc::new(LogListener),
        }
    }

    /// Name used for thread names and log lines. Defaults to `db.table`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of workers; values below 1 are raised to 1 on start.
    pub fn workers(mut self, num_workers: usize) -> Self {
        self.num_workers = num_workers;
        self
    }

    /// Commit once a batch holds this many records. `0` disables the limit.
    pub fn max_records(mut self, max: usize) -> Self {
        self.max_records = (max > 0).then_some(max);
        self
    }

    /// Commit once a batch's estimated size reaches this many bytes.
    /// `0` disables the limit.
    pub fn max_bytes(mut self, max: usize) -> Self {
        self.max_bytes = (max > 0).then_some(max);
        self
    }

    /// Flush every worker at this interval. A zero interval disables
    /// periodic flushing.
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = (!interval.is_zero()).then_some(interval);
        self
    }

    pub fn backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    /// HTTP status codes worth retrying a commit for.
    pub fn retry_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retry_status_codes = codes.into_iter().collect();
        self
    }

    /// Stream load options sent with every commit.
    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    /// Give every commit a unique label starting with `prefix`.
    pub fn label_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.label_prefix = Some(prefix.into());
        self
    }

    pub fn listener(mut self, listener: Arc<dyn CommitListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn build(self) -> BulkProcessor {
        let retry = RetryPolicy::new(self.backoff).with_status_codes(self.retry_status_codes);

        BulkProcessor {
            name: self.name,
            num_workers: self.num_workers,
            flush_interval: self.flush_interval,
            ctx: Arc::new(CommitContext {
                transport: self.transport,
                destination: self.destination,
                options: self.options,
                label_prefix: self.label_prefix,
                retry,
                listener: self.listener,
                max_records: self.max_records,
                max_bytes: self.max_bytes,
            }),
            state: Mutex::new(State::default()),
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build and start the processor.
    pub fn start(self) -> Result<BulkProcessor> {
        let processor = self.build();
        processor.start()?;
        Ok(processor)
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
