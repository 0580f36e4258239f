//! Applying an ordered list of processors to a batch of items, either one
//! item after the other or concurrently on the rayon pool.
use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use rayon::ThreadPool;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// One stage of a pipeline. It mutates the item it is given, results live
/// on the item.
pub trait Processor<T>: Send + Sync {
    fn process(&self, data: &mut T) -> Result<()>;
}

/// Applies every processor to every item, in order, on the calling thread.
pub struct Pipeline<T> {
    processors: Vec<Arc<dyn Processor<T>>>,
}

impl<T> Pipeline<T> {
    pub fn new(processors: Vec<Arc<dyn Processor<T>>>) -> Pipeline<T> {
        Pipeline { processors }
    }

    pub fn processors(&self) -> &[Arc<dyn Processor<T>>] {
        &self.processors
    }

    pub fn process(&self, items: &mut [T]) -> Result<()> {
        for item in items.iter_mut() {
            for processor in &self.processors {
                processor.process(item)?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStatus {
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Percentage of finished (item, processor) units, 0 to 100.
    Progress(usize),
    Completed(PipelineStatus),
}

/// A processor that returned an error. The rest of that item's chain was
/// skipped.
#[derive(Debug)]
pub struct ProcessorFailure {
    pub item: usize,
    pub processor: usize,
    pub error: anyhow::Error,
}

#[derive(Debug)]
pub struct PipelineOutcome<T> {
    // in submission order
    pub items: Vec<T>,
    pub status: PipelineStatus,
    // (item, processor) units that never ran
    pub remaining: usize,
    pub failures: Vec<ProcessorFailure>,
}

impl<T> PipelineOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        self.status == PipelineStatus::Cancelled
    }
}

/// Runs one task per item on a rayon pool. Inside a task the processors
/// run strictly in order, and the cancellation flag is checked before each
/// of them.
pub struct MultiThreadedPipeline<T> {
    processors: Arc<Vec<Arc<dyn Processor<T>>>>,
    pool: Option<Arc<ThreadPool>>,
}

impl<T: Send + 'static> MultiThreadedPipeline<T> {
    pub fn new(processors: Vec<Arc<dyn Processor<T>>>) -> MultiThreadedPipeline<T> {
        MultiThreadedPipeline {
            processors: Arc::new(processors),
            pool: None,
        }
    }

    /// Use `pool` instead of the global rayon pool.
    pub fn with_thread_pool(mut self, pool: Arc<ThreadPool>) -> MultiThreadedPipeline<T> {
        self.pool = Some(pool);
        self
    }

    /// Start processing `items`. Progress and completion are reported to
    /// `handler` from a driver thread; the items come back in the outcome.
    pub fn process<H>(&self, items: Vec<T>, handler: H) -> PipelineHandle<T>
    where
        H: FnMut(PipelineEvent) + Send + 'static,
    {
        let nb_items = items.len();
        let initial = nb_items * self.processors.len();
        let remaining = Arc::new(AtomicUsize::new(initial));
        let cancelled = Arc::new(AtomicBool::new(false));
        info!(
            "Starting pipeline: {} items, {} processors",
            nb_items,
            self.processors.len()
        );

        let (item_tx, item_rx) = mpsc::channel();
        for (idx, mut item) in items.into_iter().enumerate() {
            let tx = item_tx.clone();
            let processors = self.processors.clone();
            let remaining = remaining.clone();
            let cancelled = cancelled.clone();
            let task = move || {
                let mut failure = None;
                for (step, processor) in processors.iter().enumerate() {
                    if cancelled.load(Ordering::Acquire) {
                        debug!("Item {} stopped before processor {}", idx, step);
                        break;
                    }
                    let result =
                        panic::catch_unwind(AssertUnwindSafe(|| processor.process(&mut item)))
                            .unwrap_or_else(|payload| Err(panicked(payload)));
                    if let Err(error) = result {
                        warn!("Processor {} failed on item {}: {:#}", step, idx, error);
                        failure = Some(ProcessorFailure {
                            item: idx,
                            processor: step,
                            error,
                        });
                        break;
                    }
                    remaining.fetch_sub(1, Ordering::AcqRel);
                }
                // the driver only goes away once every item is back
                let _ = tx.send((idx, item, failure));
            };
            match &self.pool {
                Some(pool) => pool.spawn(task),
                None => rayon::spawn(task),
            }
        }
        drop(item_tx);

        let (outcome_tx, outcome_rx) = mpsc::channel();
        let driver = {
            let remaining = remaining.clone();
            let cancelled = cancelled.clone();
            thread::spawn(move || {
                let outcome = drive(nb_items, initial, &remaining, &cancelled, item_rx, handler);
                let _ = outcome_tx.send(outcome);
            })
        };

        PipelineHandle {
            cancelled,
            remaining,
            outcome_rx,
            driver: Some(driver),
        }
    }
}

fn panicked(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|m| m.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned());
    match message {
        Some(message) => anyhow!("processor panicked: {}", message),
        None => anyhow!("processor panicked"),
    }
}

fn percent(initial: usize, remaining: usize) -> usize {
    if initial == 0 {
        100
    } else {
        (initial - remaining) * 100 / initial
    }
}

fn drive<T, H>(
    nb_items: usize,
    initial: usize,
    remaining: &AtomicUsize,
    cancelled: &AtomicBool,
    item_rx: Receiver<(usize, T, Option<ProcessorFailure>)>,
    mut handler: H,
) -> PipelineOutcome<T>
where
    H: FnMut(PipelineEvent),
{
    let mut slots: Vec<Option<T>> = (0..nb_items).map(|_| None).collect();
    let mut failures = Vec::new();
    let mut received = 0;
    let mut last_percent = None;

    while received < nb_items {
        match item_rx.recv_timeout(POLL_INTERVAL) {
            Ok((idx, item, failure)) => {
                slots[idx] = Some(item);
                failures.extend(failure);
                received += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("{} items never came back", nb_items - received);
                break;
            }
        }
        let p = percent(initial, remaining.load(Ordering::Acquire));
        if last_percent != Some(p) {
            handler(PipelineEvent::Progress(p));
            last_percent = Some(p);
        }
    }

    let status = if cancelled.load(Ordering::Acquire) {
        warn!("Pipeline cancelled");
        PipelineStatus::Cancelled
    } else {
        PipelineStatus::Completed
    };
    if last_percent != Some(100) {
        handler(PipelineEvent::Progress(100));
    }
    handler(PipelineEvent::Completed(status));

    let remaining = remaining.load(Ordering::Acquire);
    info!(
        "Pipeline finished ({:?}), {} units left, {} failures",
        status,
        remaining,
        failures.len()
    );
    PipelineOutcome {
        items: slots.into_iter().flatten().collect(),
        status,
        remaining,
        failures,
    }
}

/// Caller side of a running [`MultiThreadedPipeline`]. The outcome is handed
/// out once, by whichever of the completion methods sees it first.
pub struct PipelineHandle<T> {
    cancelled: Arc<AtomicBool>,
    remaining: Arc<AtomicUsize>,
    outcome_rx: Receiver<PipelineOutcome<T>>,
    driver: Option<JoinHandle<()>>,
}

impl<T> PipelineHandle<T> {
    /// Ask the item tasks to stop before their next processor. Work already
    /// done is kept.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// (item, processor) units not finished yet.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn try_complete(&mut self) -> Option<PipelineOutcome<T>> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => {
                self.join_driver();
                Some(outcome)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn wait_for_complete(&mut self, timeout: Duration) -> Option<PipelineOutcome<T>> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.join_driver();
                Some(outcome)
            }
            Err(_) => None,
        }
    }

    pub fn wait(mut self) -> Result<PipelineOutcome<T>> {
        let outcome = self
            .outcome_rx
            .recv()
            .map_err(|_| anyhow!("Pipeline driver stopped without an outcome"))?;
        self.join_driver();
        Ok(outcome)
    }

    fn join_driver(&mut self) {
        if let Some(driver) = self.driver.take() {
            if driver.join().is_err() {
                warn!("Pipeline driver panicked");
            }
        }
    }
}

/// Handler drawing the progress on a terminal bar.
#[cfg(feature = "kdam")]
pub fn progress_bar() -> impl FnMut(PipelineEvent) + Send + 'static {
    use kdam::{tqdm, BarExt};
    let mut bar = tqdm!(total = 100);
    move |event| match event {
        PipelineEvent::Progress(p) => {
            let _ = bar.update_to(p);
        }
        PipelineEvent::Completed(_) => {
            let _ = bar.refresh();
            eprintln!();
        }
    }
}
