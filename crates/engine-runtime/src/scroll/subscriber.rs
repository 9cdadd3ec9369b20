use crate::error::ScrollError;
use tokio::sync::mpsc;
use tracing::trace;

/// Downstream side of a scroll subscription.
///
/// Receives zero or more `on_next` calls, one per unit of requested demand,
/// followed by at most one of `on_complete` or `on_error`. Nothing is
/// delivered after either of those, or after the subscription is cancelled.
pub trait Subscriber<T>: Send + 'static {
    fn on_next(&mut self, item: T);

    fn on_complete(&mut self);

    fn on_error(&mut self, error: ScrollError);
}

/// A signal as seen by a [`ChannelSubscriber`]'s receiver.
#[derive(Debug)]
pub enum Signal<T> {
    Next(T),
    Complete,
    Error(ScrollError),
}

impl<T> Signal<T> {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Signal::Next(_))
    }
}

/// Forwards every signal into an unbounded channel.
///
/// Unbounded is safe here: the scroll never emits more than was requested,
/// so the channel never holds more than the outstanding demand plus one
/// terminal signal.
pub struct ChannelSubscriber<T> {
    tx: mpsc::UnboundedSender<Signal<T>>,
}

impl<T> ChannelSubscriber<T>
where
    T: Send + 'static,
{
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Signal<T>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, signal: Signal<T>) {
        if self.tx.send(signal).is_err() {
            trace!("Scroll receiver dropped; discarding signal");
        }
    }
}

impl<T> Subscriber<T> for ChannelSubscriber<T>
where
    T: Send + 'static,
{
    fn on_next(&mut self, item: T) {
        self.forward(Signal::Next(item));
    }

    fn on_complete(&mut self) {
        self.forward(Signal::Complete);
    }

    fn on_error(&mut self, error: ScrollError) {
        self.forward(Signal::Error(error));
    }
}
