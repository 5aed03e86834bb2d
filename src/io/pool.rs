//! A small fan-out/fan-in worker pool used by both decoders.
//!
//! The calling thread is the producer: it splits the input into work units
//! and hands them to `concurrency` scoped worker threads via a bounded queue.
//! Workers send their results to a single collector thread over an
//! unbounded channel, so a worker never blocks on reporting.
//!
//! Errors go into an [`Abort`] cell: the first one wins and sets a
//! cancellation flag. The producer stops dispatching, workers keep draining
//! the queue without doing any work (a producer blocked on a full queue must
//! always be able to finish) and the collector stops collecting.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc,
    },
    thread,
};

use log::{debug, trace};
use parking_lot::Mutex;

use super::Error;


/// Cancellation flag plus "first error wins" slot.
#[derive(Debug)]
pub(crate) struct Abort {
    cancelled: AtomicBool,
    first_error: Mutex<Option<Error>>,
}

impl Abort {
    fn new() -> Self {
        Self {
            cancelled: AtomicBool::new(false),
            first_error: Mutex::new(None),
        }
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Records `e` unless another error was recorded before, and cancels.
    pub(crate) fn fail(&self, e: Error) {
        let mut slot = self.first_error.lock();
        if slot.is_none() {
            debug!("decode pipeline cancelled: {}", e);
            *slot = Some(e);
        } else {
            trace!("dropping error after cancellation: {}", e);
        }
        self.cancelled.store(true, Ordering::Release);
    }

    fn into_error(self) -> Option<Error> {
        self.first_error.into_inner()
    }
}

/// Handed to the producer to dispatch work units.
pub(crate) struct Dispatcher<'a, W> {
    queue: mpsc::SyncSender<W>,
    abort: &'a Abort,
}

impl<W> Dispatcher<'_, W> {
    /// Queues `unit` for the workers, blocking while the queue is full.
    /// Returns `false` if the pipeline was cancelled; the producer should stop
    /// in that case.
    pub(crate) fn dispatch(&self, unit: W) -> bool {
        if self.abort.is_cancelled() {
            return false;
        }

        self.queue.send(unit).is_ok()
    }
}

/// Runs one decode pipeline.
///
/// - `produce` runs on the calling thread and feeds units to the dispatcher.
///   An error returned from it cancels the pipeline.
/// - `work` runs on the workers, once per unit.
/// - `collect` runs on the collector thread and folds every output into the
///   accumulator that starts as `init`.
///
/// Returns the accumulator or the first error reported by any part of the
/// pipeline.
pub(crate) fn run<W, O, A, P, F, C>(
    concurrency: usize,
    init: A,
    produce: P,
    work: F,
    mut collect: C,
) -> Result<A, Error>
where
    W: Send,
    O: Send,
    A: Send,
    P: FnOnce(&Dispatcher<'_, W>) -> Result<(), Error>,
    F: Fn(W) -> Result<O, Error> + Sync,
    C: FnMut(&mut A, O) + Send,
{
    let concurrency = concurrency.max(1);
    let abort = Abort::new();
    let (queue_tx, queue_rx) = mpsc::sync_channel::<W>(concurrency);
    let queue_rx = Mutex::new(queue_rx);
    let (done_tx, done_rx) = mpsc::channel::<O>();

    let acc = thread::scope(|s| {
        for _ in 0..concurrency {
            let done_tx = done_tx.clone();
            let queue_rx = &queue_rx;
            let abort = &abort;
            let work = &work;

            s.spawn(move || loop {
                let next = queue_rx.lock().recv();
                let unit = match next {
                    Ok(unit) => unit,
                    // The producer is done and the queue is empty.
                    Err(_) => break,
                };

                if abort.is_cancelled() {
                    continue;
                }

                match work(unit) {
                    // The collector only hangs up after cancellation.
                    Ok(out) => { let _ = done_tx.send(out); }
                    Err(e) => abort.fail(e),
                }
            });
        }
        drop(done_tx);

        let abort_ref = &abort;
        let collector = s.spawn(move || {
            let mut acc = init;
            for out in done_rx {
                if abort_ref.is_cancelled() {
                    break;
                }
                collect(&mut acc, out);
            }
            acc
        });

        let dispatcher = Dispatcher {
            queue: queue_tx,
            abort: &abort,
        };
        if let Err(e) = produce(&dispatcher) {
            abort.fail(e);
        }

        // Closes the queue: workers finish what's left and exit.
        drop(dispatcher);

        match collector.join() {
            Ok(acc) => acc,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    });

    match abort.into_error() {
        Some(e) => Err(e),
        None => Ok(acc),
    }
}
