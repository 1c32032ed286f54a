use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use anyhow::{Context, Result, anyhow};
use crossbeam::{
    channel::{self, Receiver, Sender},
    select,
};
use log::info;

/// A source of records: a file, or stdin when the path is `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

impl Input {
    /// No paths means stdin.
    pub fn from_paths(paths: &[PathBuf]) -> Vec<Input> {
        if paths.is_empty() {
            return vec![Input::Stdin];
        }
        paths
            .iter()
            .map(|path| {
                if path.as_os_str() == "-" {
                    Input::Stdin
                } else {
                    Input::File(path.clone())
                }
            })
            .collect()
    }

    pub fn open(&self) -> Result<Box<dyn BufRead>> {
        match self {
            Input::Stdin => Ok(Box::new(io::stdin().lock())),
            Input::File(path) => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }

    pub fn display(&self) -> String {
        match self {
            Input::Stdin => "<stdin>".to_string(),
            Input::File(path) => path.display().to_string(),
        }
    }
}

/// Message from the reader thread.
#[derive(Debug)]
pub enum Feed {
    Record(Vec<u8>),
    /// One input was read to its end.
    Finished { input: String, records: u64 },
    Failed(anyhow::Error),
}

/// Outcome of draining a feed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub records: u64,
    /// Draining stopped early because `stop` was raised.
    pub interrupted: bool,
}

/// Read `inputs` one after the other on a dedicated thread.
///
/// The thread stops at the first failure or once the receiver is dropped.
/// It may stay blocked in a read after the receiver is gone.
pub fn spawn_feed(inputs: Vec<Input>) -> Result<Receiver<Feed>> {
    let (tx, rx) = channel::bounded(FEED_CAPACITY);

    thread::Builder::new()
        .name("dorisload-reader".into())
        .spawn(move || {
            for input in inputs {
                let read = input.open().and_then(|reader| {
                    forward(reader, &tx)
                        .with_context(|| format!("failed to read {}", input.display()))
                });

                let msg = match read {
                    Ok(records) => Feed::Finished {
                        input: input.display(),
                        records,
                    },
                    Err(err) => Feed::Failed(err),
                };
                let failed = matches!(msg, Feed::Failed(_));
                if tx.send(msg).is_err() || failed {
                    return;
                }
            }
        })
        .context("failed to spawn reader thread")?;

    Ok(rx)
}

const FEED_CAPACITY: usize = 1024;

/// Send every record of `reader` down `tx` and return how many were sent.
pub fn forward<R: BufRead>(reader: R, tx: &Sender<Feed>) -> Result<u64> {
    read_records(reader, |record| {
        tx.send(Feed::Record(record))
            .map_err(|_| anyhow!("record receiver is gone"))
    })
}

/// Hand every fed record to `sink` until the feed ends or `stop` is
/// raised. `stop` is polled every `poll`, so a reader blocked on input
/// does not delay shutdown.
pub fn drain_feed<F>(
    feed: &Receiver<Feed>,
    stop: &AtomicBool,
    poll: Duration,
    mut sink: F,
) -> Result<FeedStats>
where
    F: FnMut(Vec<u8>) -> Result<()>,
{
    let ticker = channel::tick(poll);
    let mut stats = FeedStats::default();

    loop {
        if stop.load(Ordering::Relaxed) {
            stats.interrupted = true;
            return Ok(stats);
        }

        select! {
            recv(feed) -> msg => match msg {
                Ok(Feed::Record(record)) => {
                    sink(record)?;
                    stats.records += 1;
                }
                Ok(Feed::Finished { input, records }) => {
                    info!("read {records} records from {input}");
                }
                Ok(Feed::Failed(err)) => return Err(err),
                Err(_) => return Ok(stats),
            },
            recv(ticker) -> _ => {}
        }
    }
}

/// Feed every non-empty line of `reader` to `sink`, without its line
/// terminator.
pub fn read_records<R, F>(mut reader: R, mut sink: F) -> Result<u64>
where
    R: BufRead,
    F: FnMut(Vec<u8>) -> Result<()>,
{
    let mut records = 0;
    let mut line = Vec::new();

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(records);
        }

        let record = trim_line_end(&line);
        if record.is_empty() {
            continue;
        }

        sink(record.to_vec())?;
        records += 1;
    }
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

#[cfg(test)]
#[path = "input_tests.rs"]
mod tests;
