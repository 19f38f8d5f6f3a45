//! Pipeline stage runtime.
//!
//! A [`Processor`] wraps one compiled statement. Upstream edges deliver
//! `(slot, value, order)` triples through [`Processor::put_data`]; once every
//! slot of an order is present the tuple is queued for the workers. A
//! sequential stage only releases orders in ascending sequence without gaps.
//! Producers block while the order they deliver lies beyond the completion
//! window.
//!
//! The stream ends at a stage when its logic returns
//! [`Emit::EndOfStream`], when an upstream edge announces a stop threshold,
//! or when a consumer refuses more data. Each of these lowers the stage's
//! stop threshold: orders at or past it are dropped, orders below it still
//! run and are pushed. Once every order below the threshold is accounted for
//! the stage broadcasts the threshold downstream and wakes all of its
//! workers so they exit.

use chamber_command::{Canceller, CommandDescriptor, CommandInstance, Emit};
use chamber_core::{OrderId, Tuple, Value};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::backpressure::CompletionWindow;
use crate::distributor::DistributorVariable;
use crate::error::StageFailure;
use crate::executor::{self, StageSet};

/// Entry in a processor's input queue
#[derive(Debug)]
enum Entry {
    /// Complete input tuple
    Ready { order: OrderId, tuple: Tuple },
    /// Dummy entry waking one worker to re-check stage state
    Wake,
}

/// Input tuple under reassembly
#[derive(Debug)]
struct Partial {
    slots: Vec<Option<Value>>,
    filled: usize,
}

impl Partial {
    fn new(width: usize) -> Self {
        Self {
            slots: vec![None; width],
            filled: 0,
        }
    }

    fn into_tuple(self) -> Tuple {
        self.slots.into_iter().map(|v| v.unwrap_or(Value::Null)).collect()
    }
}

/// Bookkeeping guarded by the processor mutex
#[derive(Debug)]
struct ProcessorState {
    partial: BTreeMap<OrderId, Partial>,
    /// Next order a sequential stage may release
    next_sequential: OrderId,
    /// Next order a source hands out
    next_source: OrderId,
    /// Orders a source has drawn but not yet finished
    drawn: BTreeSet<OrderId>,
    window: CompletionWindow,
    /// First order id past the end of the stream, minimum of all announced
    stop_at: Option<u64>,
    completed: u64,
    done: bool,
    killing: bool,
}

impl ProcessorState {
    /// Lower the stop threshold to `stop`; returns whether it moved
    fn cut(&mut self, stop: u64) -> bool {
        match self.stop_at {
            Some(current) if current <= stop => false,
            _ => {
                self.stop_at = Some(stop);
                true
            }
        }
    }

    /// Whether `order` lies at or past the stop threshold
    fn cuts(&self, order: OrderId) -> bool {
        self.stop_at.is_some_and(|stop| order.as_u64() >= stop)
    }
}

/// Result of one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Keep looping
    Continue,
    /// The worker should exit
    Finished,
}

/// Runtime node for one statement
pub struct Processor {
    line: usize,
    command: String,
    inputs: usize,
    outputs: Vec<Arc<DistributorVariable>>,
    workers: usize,
    sequential: bool,
    stages: StageSet,
    cancellers: Vec<Canceller>,
    state: Mutex<ProcessorState>,
    /// Signalled whenever the window advances or the stage stops
    ack: Condvar,
    tx: Sender<Entry>,
    rx: Receiver<Entry>,
}

impl Processor {
    /// Create a processor for a compiled statement
    ///
    /// `instances` come from the command registry for `threads` workers;
    /// `window` is the size of the completion window.
    #[must_use]
    pub fn new(
        line: usize,
        descriptor: &CommandDescriptor,
        inputs: usize,
        outputs: Vec<Arc<DistributorVariable>>,
        instances: Vec<CommandInstance>,
        threads: usize,
        window: usize,
    ) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let cancellers = executor::cancellers(&instances);
        Self {
            line,
            command: descriptor.name.clone(),
            inputs,
            outputs,
            workers: descriptor.concurrency.workers(threads).max(1),
            sequential: !descriptor.concurrency.multi_threadable(),
            stages: StageSet::from_instances(instances),
            cancellers,
            state: Mutex::new(ProcessorState {
                partial: BTreeMap::new(),
                next_sequential: OrderId::ZERO,
                next_source: OrderId::ZERO,
                drawn: BTreeSet::new(),
                window: CompletionWindow::new(window),
                stop_at: None,
                completed: 0,
                done: false,
                killing: false,
            }),
            ack: Condvar::new(),
            tx,
            rx,
        }
    }

    /// Script line of the statement
    #[must_use]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Command name
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Number of input slots
    #[must_use]
    pub const fn inputs(&self) -> usize {
        self.inputs
    }

    /// Output edges, one per output slot
    #[must_use]
    pub fn outputs(&self) -> &[Arc<DistributorVariable>] {
        &self.outputs
    }

    /// Number of worker tasks
    #[must_use]
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Whether the stage draws its own order ids
    #[must_use]
    pub const fn is_source(&self) -> bool {
        self.inputs == 0
    }

    /// Whether the stream has ended at this stage
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state.lock().done
    }

    /// Whether a kill reached this stage
    #[must_use]
    pub fn is_killing(&self) -> bool {
        self.state.lock().killing
    }

    /// Tuples produced so far
    #[must_use]
    pub fn completed(&self) -> u64 {
        self.state.lock().completed
    }

    /// Current stop threshold
    #[must_use]
    pub fn stop_at(&self) -> Option<u64> {
        self.state.lock().stop_at
    }

    /// Deliver one input value
    ///
    /// Blocks while `order` lies beyond the completion window. Returns false
    /// once the stage is done or killed, or when `order` lies past its stop
    /// threshold, so the producer can stop early.
    pub fn put_data(&self, slot: usize, value: Value, order: OrderId) -> bool {
        let mut guard = self.state.lock();
        while !guard.killing && !guard.done && !guard.cuts(order) && !guard.window.admits(order) {
            self.ack.wait(&mut guard);
        }
        if guard.killing || guard.done || guard.cuts(order) {
            return false;
        }
        if slot >= self.inputs {
            tracing::debug!(line = self.line, slot, "value for unknown slot dropped");
            return true;
        }

        let state = &mut *guard;
        let partial = state.partial.entry(order).or_insert_with(|| Partial::new(self.inputs));
        if partial.slots[slot].replace(value).is_none() {
            partial.filled += 1;
        }
        if partial.filled < self.inputs {
            return true;
        }

        if self.sequential {
            while state
                .partial
                .get(&state.next_sequential)
                .is_some_and(|p| p.filled == self.inputs)
            {
                if let Some(ready) = state.partial.remove(&state.next_sequential) {
                    self.enqueue(state.next_sequential, ready.into_tuple());
                }
                state.next_sequential = state.next_sequential.next();
            }
        } else if let Some(ready) = state.partial.remove(&order) {
            self.enqueue(order, ready.into_tuple());
        }
        true
    }

    /// Record that no order at or past `order` will arrive
    pub fn put_stop_request(&self, order: u64) {
        {
            let mut state = self.state.lock();
            if state.done || state.killing || !state.cut(order) {
                return;
            }
            tracing::debug!(line = self.line, command = %self.command, threshold = order, "stop requested");
        }
        self.ack.notify_all();
        self.wake_workers();
    }

    /// Execute one unit of the dispatch protocol on behalf of `worker`
    ///
    /// # Errors
    ///
    /// Returns error if stage logic fails, panics, or produces a tuple of
    /// the wrong width
    pub fn run_unit(&self, worker: usize) -> Result<Step, StageFailure> {
        let (order, input) = if self.is_source() {
            let mut state = self.state.lock();
            if state.killing || state.done {
                return Ok(Step::Finished);
            }
            let order = state.next_source;
            if state.cuts(order) {
                // Nothing left to draw; whoever finishes last ends the stream
                self.settle(state);
                return Ok(Step::Finished);
            }
            state.next_source = order.next();
            state.drawn.insert(order);
            (order, Tuple::new())
        } else {
            match self.rx.recv() {
                Err(_) => return Ok(Step::Finished),
                Ok(Entry::Wake) => return Ok(self.settle(self.state.lock())),
                Ok(Entry::Ready { order, tuple }) => {
                    let state = self.state.lock();
                    if state.killing || state.done {
                        return Ok(Step::Finished);
                    }
                    if state.cuts(order) {
                        return Ok(Step::Continue);
                    }
                    (order, tuple)
                }
            }
        };

        let emit = self
            .stages
            .invoke(worker, input)
            .map_err(|fault| self.failure(fault.message(), fault.trace()))?;

        let mut state = self.state.lock();
        if self.is_source() {
            state.drawn.remove(&order);
        } else if state.window.complete(order) > 0 {
            self.ack.notify_all();
        }
        if state.killing {
            return Ok(Step::Finished);
        }
        if state.cuts(order) {
            // The stream ended below this order while it ran
            return Ok(self.settle(state));
        }

        let tuple = match emit {
            Emit::Tuple(tuple) => tuple,
            Emit::EndOfStream => {
                state.cut(order.as_u64());
                tracing::debug!(line = self.line, command = %self.command, %order, "end of stream");
                self.ack.notify_all();
                return Ok(self.settle(state));
            }
        };
        if tuple.len() != self.outputs.len() {
            return Err(self.failure(
                format!(
                    "Returned tuple size mismatch (required {}, returned {})",
                    self.outputs.len(),
                    tuple.len()
                ),
                None,
            ));
        }
        state.completed += 1;
        drop(state);

        let mut accepted = true;
        for (edge, value) in self.outputs.iter().zip(&tuple) {
            accepted &= edge.push(value, order);
        }

        let mut state = self.state.lock();
        if !accepted && !state.done && !state.killing && state.cut(order.next().as_u64()) {
            tracing::debug!(line = self.line, command = %self.command, %order, "consumer finished early");
            self.ack.notify_all();
        }
        Ok(self.settle(state))
    }

    /// Mark the stage killed and wake every producer blocked on it
    pub fn begin_kill(&self) {
        self.state.lock().killing = true;
        self.ack.notify_all();
    }

    /// Invoke every instance's cancellation hook
    pub fn cancel(&self) {
        for cancel in &self.cancellers {
            cancel();
        }
    }

    /// Wake every worker blocked on the input queue
    pub fn flush(&self) {
        self.wake_workers();
    }

    /// Forward an interactive control event to the stage instances
    pub fn control(&self, tokens: &[String]) {
        self.stages.control(tokens);
    }

    /// End the stream if every order below the stop threshold is accounted
    /// for; tells the calling worker whether to keep looping
    fn settle(&self, mut state: MutexGuard<'_, ProcessorState>) -> Step {
        if state.killing || state.done {
            return Step::Finished;
        }
        let Some(stop) = state.stop_at else {
            return Step::Continue;
        };
        let bound = OrderId::new(stop);
        let drained = if self.is_source() {
            state.next_source >= bound && state.drawn.range(..bound).next().is_none()
        } else {
            state.window.anchor() >= bound
        };
        if !drained {
            return Step::Continue;
        }
        state.done = true;
        drop(state);
        self.end_stream(stop);
        Step::Finished
    }

    fn end_stream(&self, stop: u64) {
        tracing::debug!(line = self.line, command = %self.command, stop, "stream ended");
        for edge in &self.outputs {
            edge.push_stop(stop);
        }
        self.wake_workers();
        self.ack.notify_all();
    }

    fn enqueue(&self, order: OrderId, tuple: Tuple) {
        // The receiver lives as long as self, so sending cannot fail
        let _ = self.tx.send(Entry::Ready { order, tuple });
    }

    fn wake_workers(&self) {
        for _ in 0..self.workers {
            let _ = self.tx.send(Entry::Wake);
        }
    }

    fn failure(&self, message: String, trace: Option<String>) -> StageFailure {
        StageFailure {
            line: self.line,
            command: self.command.clone(),
            message,
            trace,
        }
    }
}

impl std::fmt::Debug for Processor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("line", &self.line)
            .field("command", &self.command)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs.len())
            .field("workers", &self.workers)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}
