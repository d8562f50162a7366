// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Timer shim module: setTimeout, setInterval, setImmediate, etc.
//!
//! Callbacks are queued on a [`TimerQueue`] and run when the embedder drains
//! it with [`TimerQueue::run_until_idle`]. Nothing runs while a module is
//! being loaded.

use crate::error::{Result, RuntimeError};
use crate::module_system::ModuleScope;
use crate::value::{NativeFunction, Object, Value};
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Longest delay accepted; larger values fire after 1ms, as in Node.js
const TIMEOUT_MAX_MS: f64 = 2_147_483_647.0;

/// Unique identifier for a timer or immediate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// A scheduled timer
struct Timer {
    id: TimerId,
    deadline: Instant,
    callback: Value,
    args: Vec<Value>,
    repeat: Option<Duration>,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest deadline first, then
        // scheduling order)
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.id.cmp(&self.id))
    }
}

struct Immediate {
    id: TimerId,
    callback: Value,
    args: Vec<Value>,
}

#[derive(Default)]
struct QueueState {
    next_id: u64,
    timers: BinaryHeap<Timer>,
    immediates: VecDeque<Immediate>,
    cancelled: HashSet<TimerId>,
    running: Option<TimerId>,
}

impl QueueState {
    fn next_id(&mut self) -> TimerId {
        self.next_id += 1;
        TimerId(self.next_id)
    }
}

/// Single-threaded queue of pending timer callbacks
#[derive(Clone, Default)]
pub struct TimerQueue {
    state: Rc<RefCell<QueueState>>,
}

impl TimerQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timeout (setTimeout)
    pub fn set_timeout(&self, callback: Value, delay_ms: f64, args: Vec<Value>) -> TimerId {
        self.schedule(callback, delay_ms, args, false)
    }

    /// Schedule an interval (setInterval)
    pub fn set_interval(&self, callback: Value, delay_ms: f64, args: Vec<Value>) -> TimerId {
        self.schedule(callback, delay_ms, args, true)
    }

    /// Queue an immediate callback (setImmediate)
    pub fn set_immediate(&self, callback: Value, args: Vec<Value>) -> TimerId {
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.immediates.push_back(Immediate { id, callback, args });
        id
    }

    /// Cancel a timer or immediate (clearTimeout/clearInterval/clearImmediate)
    pub fn clear(&self, id: TimerId) {
        let mut state = self.state.borrow_mut();
        let pending = state.running == Some(id)
            || state.timers.iter().any(|t| t.id == id)
            || state.immediates.iter().any(|i| i.id == id);
        if pending {
            state.cancelled.insert(id);
        }
    }

    /// Number of callbacks still scheduled
    pub fn pending(&self) -> usize {
        let state = self.state.borrow();
        let timers = state.timers.iter().map(|t| t.id);
        let immediates = state.immediates.iter().map(|i| i.id);
        timers
            .chain(immediates)
            .filter(|id| !state.cancelled.contains(id))
            .count()
    }

    /// Check if nothing is scheduled
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }

    /// Run callbacks until nothing is scheduled, sleeping until each timer's
    /// deadline. Immediates run before timers. The first callback error stops
    /// the queue and is returned.
    pub fn run_until_idle(&self) -> Result<()> {
        loop {
            let immediate = self.state.borrow_mut().immediates.pop_front();
            if let Some(Immediate { id, callback, args }) = immediate {
                if !self.state.borrow_mut().cancelled.remove(&id) {
                    callback.call(&args)?;
                }
                continue;
            }

            let timer = self.state.borrow_mut().timers.pop();
            let Some(mut timer) = timer else {
                return Ok(());
            };
            if self.state.borrow_mut().cancelled.remove(&timer.id) {
                continue;
            }

            let now = Instant::now();
            if timer.deadline > now {
                std::thread::sleep(timer.deadline - now);
            }
            self.state.borrow_mut().running = Some(timer.id);
            let result = timer.callback.call(&timer.args);
            self.state.borrow_mut().running = None;
            result?;

            let mut state = self.state.borrow_mut();
            // Cleared from inside its own callback
            let cleared = state.cancelled.remove(&timer.id);
            if let Some(interval) = timer.repeat.filter(|_| !cleared) {
                timer.deadline += interval;
                state.timers.push(timer);
            }
        }
    }

    fn schedule(&self, callback: Value, delay_ms: f64, args: Vec<Value>, repeat: bool) -> TimerId {
        let delay = Duration::from_millis(clamp_delay(delay_ms));
        let mut state = self.state.borrow_mut();
        let id = state.next_id();
        state.timers.push(Timer {
            id,
            deadline: Instant::now() + delay,
            callback,
            args,
            repeat: repeat.then_some(delay),
        });
        id
    }
}

fn clamp_delay(delay_ms: f64) -> u64 {
    if delay_ms.is_nan() || delay_ms < 1.0 || delay_ms > TIMEOUT_MAX_MS {
        1
    } else {
        delay_ms as u64
    }
}

fn callback_arg(args: &[Value]) -> Result<Value> {
    match args.first() {
        Some(callback @ Value::Function(_)) => Ok(callback.clone()),
        _ => Err(RuntimeError::type_error(
            "The \"callback\" argument must be of type function",
        )),
    }
}

fn id_arg(args: &[Value]) -> Option<TimerId> {
    match args.first() {
        Some(Value::Number(n)) if *n >= 1.0 && n.fract() == 0.0 => Some(TimerId(*n as u64)),
        _ => None,
    }
}

fn id_value(id: TimerId) -> Value {
    Value::Number(id.0 as f64)
}

/// Create the timer functions bound to `queue`
pub fn create_timer_functions(queue: &TimerQueue) -> Object {
    let exports = Object::new();

    for (name, repeat) in [("setTimeout", false), ("setInterval", true)] {
        let queue = queue.clone();
        exports.set(
            name,
            NativeFunction::new(name, move |args| {
                let callback = callback_arg(args)?;
                let delay = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
                let rest = args.get(2..).unwrap_or_default().to_vec();
                Ok(id_value(queue.schedule(callback, delay, rest, repeat)))
            }),
        );
    }

    let immediate_queue = queue.clone();
    exports.set(
        "setImmediate",
        NativeFunction::new("setImmediate", move |args| {
            let callback = callback_arg(args)?;
            let rest = args.get(1..).unwrap_or_default().to_vec();
            Ok(id_value(immediate_queue.set_immediate(callback, rest)))
        }),
    );

    for name in ["clearTimeout", "clearInterval", "clearImmediate"] {
        let queue = queue.clone();
        exports.set(
            name,
            NativeFunction::new(name, move |args| {
                if let Some(id) = id_arg(args) {
                    queue.clear(id);
                }
                Ok(Value::Undefined)
            }),
        );
    }

    exports
}

/// Build the timers shim initializer over `queue`
pub fn initializer(queue: TimerQueue) -> impl Fn(&ModuleScope<'_>) -> Result<()> + 'static {
    move |scope| {
        scope.module().set_exports(create_timer_functions(&queue));
        Ok(())
    }
}
