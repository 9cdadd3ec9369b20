//! Demand-driven scroll state machine.
//!
//! The machine owns all scroll bookkeeping: the phase, the outstanding
//! demand, and whether a page fetch is in flight or a page is buffered. It
//! performs no I/O. Each event yields the commands the caller must carry out,
//! in order.
//!
//! Guarantees:
//!   * at most one upstream call is outstanding,
//!   * items are emitted only against demand, in page order,
//!   * a page is drained before the next one is requested,
//!   * `Terminated` is absorbing.

use crate::error::ScrollError;
use engine_core::error::SourceError;
use model::{pagination::cursor::ScrollCursor, records::batch::Batch};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Inputs to the machine, from downstream (`Subscribe`, `Request`, `Cancel`)
/// or from upstream (`Started`, `Fetched`, `Failed`).
#[derive(Debug)]
pub enum ScrollEvent<T> {
    Subscribe,
    Request(u64),
    Cancel,
    Started(Batch<T>),
    Fetched(Batch<T>),
    Failed(SourceError),
}

impl<T> ScrollEvent<T> {
    fn name(&self) -> &'static str {
        match self {
            ScrollEvent::Subscribe => "subscribe",
            ScrollEvent::Request(_) => "request",
            ScrollEvent::Cancel => "cancel",
            ScrollEvent::Started(_) => "started",
            ScrollEvent::Fetched(_) => "fetched",
            ScrollEvent::Failed(_) => "failed",
        }
    }
}

/// Work the owner of the machine must perform.
#[derive(Debug)]
pub enum Command<T> {
    StartScroll,
    FetchNext(ScrollCursor),
    Emit(T),
    Complete,
    Fail(ScrollError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Completed,
    Cancelled,
    Failed,
}

/// Observable phase, without the data attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Terminated(Termination),
}

enum Pending<T> {
    InFlight,
    Buffered {
        items: VecDeque<T>,
        cursor: ScrollCursor,
    },
}

enum State<T> {
    /// Created, not yet subscribed. Nothing buffered, nothing in flight.
    Idle { demand: u64 },
    /// `start_scroll` in flight; no cursor yet.
    Starting { demand: u64 },
    Running { demand: u64, pending: Pending<T> },
    Terminated(Termination),
}

pub struct ScrollMachine<T> {
    state: State<T>,
    max_items: Option<u64>,
    emitted: u64,
    pages: u64,
    fetches: u64,
}

impl<T> Default for ScrollMachine<T> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<T> ScrollMachine<T> {
    /// `max_items` caps the number of items emitted; the scroll completes once
    /// it is reached.
    pub fn new(max_items: Option<u64>) -> Self {
        Self {
            state: State::Idle { demand: 0 },
            max_items,
            emitted: 0,
            pages: 0,
            fetches: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.state {
            State::Idle { .. } => Phase::Idle,
            State::Starting { .. } => Phase::Starting,
            State::Running { .. } => Phase::Running,
            State::Terminated(t) => Phase::Terminated(*t),
        }
    }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, State::Terminated(_))
    }

    /// Outstanding demand. Zero once terminated.
    pub fn demand(&self) -> u64 {
        match &self.state {
            State::Idle { demand } | State::Starting { demand } | State::Running { demand, .. } => {
                *demand
            }
            State::Terminated(_) => 0,
        }
    }

    /// Whether an upstream call has been issued and not yet answered.
    pub fn is_fetch_in_flight(&self) -> bool {
        matches!(
            self.state,
            State::Starting { .. }
                | State::Running {
                    pending: Pending::InFlight,
                    ..
                }
        )
    }

    /// Items held back for lack of demand.
    pub fn buffered(&self) -> usize {
        match &self.state {
            State::Running {
                pending: Pending::Buffered { items, .. },
                ..
            } => items.len(),
            _ => 0,
        }
    }

    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Pages received from upstream, including the terminating empty one.
    pub fn pages(&self) -> u64 {
        self.pages
    }

    /// Upstream calls issued, `start_scroll` included.
    pub fn fetches_issued(&self) -> u64 {
        self.fetches
    }

    /// Applies one event and returns the resulting commands.
    pub fn handle(&mut self, event: ScrollEvent<T>) -> Vec<Command<T>> {
        let mut out = Vec::new();
        let state = std::mem::replace(&mut self.state, State::Terminated(Termination::Cancelled));

        self.state = match (state, event) {
            (State::Terminated(t), event) => {
                debug!(termination = ?t, event = event.name(), "Dropping event after termination");
                State::Terminated(t)
            }

            (_, ScrollEvent::Cancel) => {
                info!(emitted = self.emitted, "Scroll cancelled by downstream");
                State::Terminated(Termination::Cancelled)
            }

            (state, ScrollEvent::Request(0)) => {
                warn!("Ignoring request for zero items");
                state
            }

            (State::Idle { demand }, ScrollEvent::Subscribe) => {
                self.fetches += 1;
                out.push(Command::StartScroll);
                State::Starting { demand }
            }

            (State::Idle { demand }, ScrollEvent::Request(n)) => State::Idle {
                demand: demand.saturating_add(n),
            },

            (State::Starting { demand }, ScrollEvent::Request(n)) => State::Starting {
                demand: demand.saturating_add(n),
            },

            (State::Running { demand, pending }, ScrollEvent::Request(n)) => {
                let demand = demand.saturating_add(n);
                match pending {
                    Pending::Buffered { items, cursor } => {
                        self.consume(demand, items, cursor, &mut out)
                    }
                    Pending::InFlight => State::Running {
                        demand,
                        pending: Pending::InFlight,
                    },
                }
            }

            (State::Starting { demand }, ScrollEvent::Started(batch)) => {
                self.receive(demand, batch, &mut out)
            }

            (
                State::Running {
                    demand,
                    pending: Pending::InFlight,
                },
                ScrollEvent::Fetched(batch),
            ) => self.receive(demand, batch, &mut out),

            (State::Starting { .. }, ScrollEvent::Failed(cause)) => {
                warn!(error = %cause, "Scroll failed to start");
                out.push(Command::Fail(ScrollError::Start(cause)));
                State::Terminated(Termination::Failed)
            }

            (State::Running { .. }, ScrollEvent::Failed(cause)) => {
                warn!(page = self.pages + 1, error = %cause, "Scroll page fetch failed");
                out.push(Command::Fail(ScrollError::Fetch {
                    page: self.pages + 1,
                    source: cause,
                }));
                State::Terminated(Termination::Failed)
            }

            (state, event) => {
                warn!(phase = ?phase_of(&state), event = event.name(), "Unhandled scroll event");
                state
            }
        };

        out
    }

    fn receive(&mut self, demand: u64, batch: Batch<T>, out: &mut Vec<Command<T>>) -> State<T> {
        self.pages += 1;
        let (cursor, items) = batch.into_parts();

        if items.is_empty() {
            info!(
                emitted = self.emitted,
                pages = self.pages,
                "Scroll exhausted"
            );
            out.push(Command::Complete);
            return State::Terminated(Termination::Completed);
        }

        debug!(page = self.pages, items = items.len(), demand, "Received scroll page");
        self.consume(demand, items.into(), cursor, out)
    }

    fn consume(
        &mut self,
        mut demand: u64,
        mut items: VecDeque<T>,
        cursor: ScrollCursor,
        out: &mut Vec<Command<T>>,
    ) -> State<T> {
        while demand > 0 {
            let Some(item) = items.pop_front() else {
                break;
            };

            out.push(Command::Emit(item));
            demand -= 1;
            self.emitted += 1;

            if self.max_items.is_some_and(|max| self.emitted >= max) {
                info!(emitted = self.emitted, "Scroll reached its item limit");
                out.push(Command::Complete);
                return State::Terminated(Termination::Completed);
            }
        }

        if items.is_empty() {
            self.fetches += 1;
            out.push(Command::FetchNext(cursor));
            State::Running {
                demand,
                pending: Pending::InFlight,
            }
        } else {
            State::Running {
                demand,
                pending: Pending::Buffered { items, cursor },
            }
        }
    }
}

fn phase_of<T>(state: &State<T>) -> Phase {
    match state {
        State::Idle { .. } => Phase::Idle,
        State::Starting { .. } => Phase::Starting,
        State::Running { .. } => Phase::Running,
        State::Terminated(t) => Phase::Terminated(*t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    fn batch(cursor: &str, items: &[&'static str]) -> Batch<&'static str> {
        Batch::new(cursor, items.to_vec())
    }

    fn emitted(commands: &[Command<&'static str>]) -> Vec<&'static str> {
        commands
            .iter()
            .filter_map(|c| match c {
                Command::Emit(item) => Some(*item),
                _ => None,
            })
            .collect()
    }

    fn fetch_cursor(commands: &[Command<&'static str>]) -> Option<String> {
        commands.iter().find_map(|c| match c {
            Command::FetchNext(cursor) => Some(cursor.to_string()),
            _ => None,
        })
    }

    fn running() -> ScrollMachine<&'static str> {
        let mut machine = ScrollMachine::new(None);
        machine.handle(ScrollEvent::Subscribe);
        machine
    }

    #[test]
    fn test_subscribe_starts_scroll_once() {
        let mut machine = ScrollMachine::<&str>::new(None);
        let commands = machine.handle(ScrollEvent::Subscribe);

        assert!(matches!(commands.as_slice(), [Command::StartScroll]));
        assert_eq!(machine.phase(), Phase::Starting);
        assert!(machine.is_fetch_in_flight());

        // A second subscribe must not start another scroll.
        assert!(machine.handle(ScrollEvent::Subscribe).is_empty());
        assert_eq!(machine.fetches_issued(), 1);
    }

    #[test]
    fn test_demand_while_starting_only_accumulates() {
        let mut machine = running();
        assert!(machine.handle(ScrollEvent::Request(2)).is_empty());
        assert!(machine.handle(ScrollEvent::Request(3)).is_empty());
        assert_eq!(machine.demand(), 5);
        assert_eq!(machine.phase(), Phase::Starting);
    }

    #[test]
    fn test_first_page_is_buffered_without_demand() {
        let mut machine = running();
        let commands = machine.handle(ScrollEvent::Started(batch("c0", &["a", "b"])));

        assert!(commands.is_empty());
        assert_eq!(machine.phase(), Phase::Running);
        assert_eq!(machine.buffered(), 2);
        assert!(!machine.is_fetch_in_flight());
    }

    #[test]
    fn test_demand_bound_is_respected() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(1));
        machine.handle(ScrollEvent::Request(2));

        let commands = machine.handle(ScrollEvent::Started(batch("c0", &["a", "b", "c", "d", "e"])));

        assert_eq!(emitted(&commands), vec!["a", "b", "c"]);
        assert_eq!(machine.demand(), 0);
        assert_eq!(machine.buffered(), 2);
        assert_eq!(fetch_cursor(&commands), None);
    }

    #[test]
    fn test_draining_a_page_fetches_the_next_with_its_cursor() {
        let mut machine = running();
        machine.handle(ScrollEvent::Started(batch("c0", &["a", "b"])));

        let commands = machine.handle(ScrollEvent::Request(2));
        assert_eq!(emitted(&commands), vec!["a", "b"]);
        assert_eq!(fetch_cursor(&commands).as_deref(), Some("c0"));
        assert!(machine.is_fetch_in_flight());
        assert_eq!(machine.fetches_issued(), 2);
    }

    #[test]
    fn test_no_second_fetch_while_one_is_in_flight() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(10));
        let commands = machine.handle(ScrollEvent::Started(batch("c0", &["a"])));
        assert_eq!(fetch_cursor(&commands).as_deref(), Some("c0"));

        // More demand while the fetch is outstanding changes nothing but the count.
        assert!(machine.handle(ScrollEvent::Request(5)).is_empty());
        assert_eq!(machine.demand(), 14);
        assert_eq!(machine.fetches_issued(), 2);
    }

    #[test]
    fn test_pages_are_emitted_in_order_one_request_at_a_time() {
        let mut machine = running();
        let mut seen = Vec::new();
        let mut cursors = Vec::new();

        let mut commands = machine.handle(ScrollEvent::Started(batch("c0", &["a", "b"])));
        let pages = [batch("c1", &["c", "d"]), batch("c2", &["e"])];
        let mut upcoming = pages.into_iter();

        while !machine.is_terminated() {
            seen.extend(emitted(&commands));
            if let Some(cursor) = fetch_cursor(&commands) {
                cursors.push(cursor);
                let next = upcoming.next().unwrap_or_else(|| batch("c3", &[]));
                commands = machine.handle(ScrollEvent::Fetched(next));
                continue;
            }
            commands = machine.handle(ScrollEvent::Request(1));
        }

        assert_eq!(seen, vec!["a", "b", "c", "d", "e"]);
        assert_eq!(cursors, vec!["c0", "c1", "c2"]);
        assert_eq!(machine.phase(), Phase::Terminated(Termination::Completed));
        assert!(matches!(commands.last(), Some(Command::Complete)));
    }

    #[test]
    fn test_empty_page_completes_without_emitting() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(3));
        machine.handle(ScrollEvent::Started(batch("c0", &["a"])));

        let commands = machine.handle(ScrollEvent::Fetched(batch("c1", &[])));
        assert!(matches!(commands.as_slice(), [Command::Complete]));
        assert_eq!(machine.phase(), Phase::Terminated(Termination::Completed));
        assert_eq!(machine.pages(), 2);
    }

    #[test]
    fn test_empty_first_page_completes() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(1));

        let commands = machine.handle(ScrollEvent::Started(batch("c0", &[])));
        assert!(matches!(commands.as_slice(), [Command::Complete]));
        assert_eq!(machine.emitted(), 0);
    }

    #[test]
    fn test_start_failure_is_the_only_signal() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(5));

        let commands = machine.handle(ScrollEvent::Failed(SourceError::Rejected(
            "index_not_found".into(),
        )));

        assert!(matches!(
            commands.as_slice(),
            [Command::Fail(ScrollError::Start(SourceError::Rejected(_)))]
        ));
        assert_eq!(machine.phase(), Phase::Terminated(Termination::Failed));
        assert!(machine.handle(ScrollEvent::Request(1)).is_empty());
    }

    #[test]
    fn test_fetch_failure_discards_buffered_items() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(1));
        machine.handle(ScrollEvent::Started(batch("c0", &["a", "b", "c"])));
        assert_eq!(machine.buffered(), 2);

        let commands = machine.handle(ScrollEvent::Failed(SourceError::Unavailable(
            "node left".into(),
        )));
        assert!(matches!(
            commands.as_slice(),
            [Command::Fail(ScrollError::Fetch { page: 2, .. })]
        ));
        assert_eq!(machine.buffered(), 0);
        assert_eq!(machine.demand(), 0);
    }

    #[test]
    fn test_cancel_with_buffered_page_stops_silently() {
        let mut machine = running();
        machine.handle(ScrollEvent::Started(batch("c0", &["a", "b"])));

        assert!(machine.handle(ScrollEvent::Cancel).is_empty());
        assert_eq!(machine.phase(), Phase::Terminated(Termination::Cancelled));
        assert!(machine.handle(ScrollEvent::Request(2)).is_empty());
        assert!(machine.handle(ScrollEvent::Cancel).is_empty());
    }

    #[test]
    fn test_late_results_after_cancel_are_discarded() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(1));
        machine.handle(ScrollEvent::Cancel);

        assert!(machine.handle(ScrollEvent::Started(batch("c0", &["a"]))).is_empty());
        assert!(
            machine
                .handle(ScrollEvent::Failed(SourceError::Unavailable("late".into())))
                .is_empty()
        );
        assert_eq!(machine.phase(), Phase::Terminated(Termination::Cancelled));
        assert_eq!(machine.emitted(), 0);
    }

    #[test]
    #[traced_test]
    fn test_zero_request_is_logged_and_ignored() {
        let mut machine = running();
        machine.handle(ScrollEvent::Started(batch("c0", &["a"])));

        assert!(machine.handle(ScrollEvent::Request(0)).is_empty());
        assert_eq!(machine.buffered(), 1);
        assert!(logs_contain("Ignoring request for zero items"));
    }

    #[test]
    #[traced_test]
    fn test_unexpected_upstream_result_is_ignored() {
        let mut machine = running();
        machine.handle(ScrollEvent::Started(batch("c0", &["a"])));

        // Nothing was fetched, so a fetch result cannot be meaningful.
        assert!(machine.handle(ScrollEvent::Fetched(batch("cx", &["z"]))).is_empty());
        assert!(machine.handle(ScrollEvent::Started(batch("cy", &["y"]))).is_empty());
        assert_eq!(machine.buffered(), 1);
        assert!(logs_contain("Unhandled scroll event"));

        let commands = machine.handle(ScrollEvent::Request(1));
        assert_eq!(emitted(&commands), vec!["a"]);
        assert_eq!(fetch_cursor(&commands).as_deref(), Some("c0"));
    }

    #[test]
    fn test_item_limit_completes_early() {
        let mut machine = ScrollMachine::new(Some(3));
        machine.handle(ScrollEvent::Subscribe);
        machine.handle(ScrollEvent::Request(10));

        let commands = machine.handle(ScrollEvent::Started(batch("c0", &["a", "b"])));
        assert_eq!(fetch_cursor(&commands).as_deref(), Some("c0"));

        let commands = machine.handle(ScrollEvent::Fetched(batch("c1", &["c", "d"])));
        assert_eq!(emitted(&commands), vec!["c"]);
        assert!(matches!(commands.last(), Some(Command::Complete)));
        assert_eq!(fetch_cursor(&commands), None);
        assert_eq!(machine.phase(), Phase::Terminated(Termination::Completed));
    }

    #[test]
    fn test_demand_saturates() {
        let mut machine = running();
        machine.handle(ScrollEvent::Request(u64::MAX));
        machine.handle(ScrollEvent::Request(u64::MAX));
        assert_eq!(machine.demand(), u64::MAX);
    }
}
