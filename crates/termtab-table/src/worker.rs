//! Worker threads for deferred values.
//!
//! One thread per deferred input (or delayed group). Each produced update
//! is applied under the table lock, which redraws the row it belongs to.

use std::any::Any;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use serde_json::{Map, Value};
use termtab_style::BoxError;
use tracing::debug;

use crate::error::{Result, TabularError};
use crate::row::{Key, Producer};
use crate::state::{Job, State};

pub type Worker = JoinHandle<Result<()>>;

/// Start a thread that runs `job` against `state`.
///
/// # Errors
///
/// [`TabularError::Io`] if the thread cannot be spawned.
pub fn spawn(state: &Arc<Mutex<State>>, job: Job) -> Result<Worker> {
    let state = Arc::clone(state);
    let handle = thread::Builder::new()
        .name(format!("termtab {}", job.key))
        .spawn(move || run(&state, job))?;
    Ok(handle)
}

fn run(state: &Mutex<State>, job: Job) -> Result<()> {
    let Job { id, key, producer } = job;
    debug!(key = %key, "worker started");
    match producer {
        Producer::Once(f) => {
            let value = f().map_err(|e| failed(&key, &e))?;
            apply(state, &id, &key, value)?;
        }
        Producer::Generate(make) => {
            for update in make() {
                let value = update.map_err(|e| failed(&key, &e))?;
                apply(state, &id, &key, value)?;
            }
        }
    }
    debug!(key = %key, "worker done");
    Ok(())
}

fn apply(state: &Mutex<State>, id: &Map<String, Value>, key: &Key, value: Value) -> Result<()> {
    state
        .lock()
        .map_err(|_| TabularError::Poisoned)?
        .apply_update(id, key, value)
}

fn failed(key: &Key, err: &BoxError) -> TabularError {
    TabularError::Worker(format!("{key}: {err}"))
}

/// Wait for `worker`, turning a panic into an error.
pub fn join(worker: Worker) -> Result<()> {
    worker
        .join()
        .unwrap_or_else(|payload| Err(TabularError::Worker(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    let msg = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown cause");
    format!("worker panicked: {msg}")
}
