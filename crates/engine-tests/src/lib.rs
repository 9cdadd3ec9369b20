#![allow(dead_code)]

use async_trait::async_trait;
use engine_core::{connectors::source::ScrollSource, error::SourceError};
use model::{pagination::cursor::ScrollCursor, query::ScrollQuery, records::batch::Batch};
use std::{
    collections::VecDeque,
    fmt::Debug,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};
use tokio::sync::Semaphore;

pub mod stream;
pub mod utils;

/// One scripted upstream answer.
#[derive(Debug)]
pub enum Step<T> {
    Page(Vec<T>),
    Fail(SourceError),
}

/// An upstream call as observed by [`ScriptedSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Start(String),
    Fetch(String),
}

/// A scroll source that answers from a script and records every call.
///
/// `start_scroll` returns cursor `cursor0`; each fetch returns the next
/// number. Once the script runs out it answers with empty pages. When gated,
/// each call waits for [`ScriptedSource::release`] before answering, which
/// lets a test decide exactly when upstream results arrive.
pub struct ScriptedSource<T> {
    script: Mutex<VecDeque<Step<T>>>,
    calls: Mutex<Vec<Call>>,
    next_cursor: AtomicU64,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    answered: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl<T> ScriptedSource<T>
where
    T: Send + Debug + 'static,
{
    pub fn new(script: Vec<Step<T>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::new(Vec::new()),
            next_cursor: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            answered: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn pages(pages: Vec<Vec<T>>) -> Self {
        Self::new(pages.into_iter().map(Step::Page).collect())
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `n` pending or future calls answer.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fetched_cursors(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Fetch(cursor) => Some(cursor),
                Call::Start(_) => None,
            })
            .collect()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Calls that have returned their answer.
    pub fn answered(&self) -> usize {
        self.answered.load(Ordering::SeqCst)
    }

    async fn answer(&self, call: Call) -> Result<Batch<T>, SourceError> {
        self.calls.lock().unwrap().push(call);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        } else {
            tokio::task::yield_now().await;
        }

        let step = self.script.lock().unwrap().pop_front();
        let cursor = format!("cursor{}", self.next_cursor.fetch_add(1, Ordering::SeqCst));

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.answered.fetch_add(1, Ordering::SeqCst);

        match step {
            Some(Step::Page(items)) => Ok(Batch::new(cursor, items)),
            Some(Step::Fail(e)) => Err(e),
            None => Ok(Batch::empty(cursor)),
        }
    }
}

#[async_trait]
impl<T> ScrollSource for ScriptedSource<T>
where
    T: Send + Debug + 'static,
{
    type Item = T;

    async fn start_scroll(&self, query: &ScrollQuery) -> Result<Batch<T>, SourceError> {
        self.answer(Call::Start(query.index.clone())).await
    }

    async fn fetch_next(&self, cursor: ScrollCursor) -> Result<Batch<T>, SourceError> {
        self.answer(Call::Fetch(cursor.into_inner())).await
    }
}
