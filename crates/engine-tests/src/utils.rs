use engine_runtime::scroll::Signal;
use std::{fmt::Debug, time::Duration};
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};

const SIGNAL_TIMEOUT: Duration = Duration::from_secs(2);
const QUIET_PERIOD: Duration = Duration::from_millis(50);

/// Waits for the next signal. Panics if none arrives in time.
pub async fn next_signal<T: Debug>(rx: &mut UnboundedReceiver<Signal<T>>) -> Option<Signal<T>> {
    timeout(SIGNAL_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for a scroll signal")
}

/// Waits for an item, panicking on anything else.
pub async fn expect_item<T: Debug>(rx: &mut UnboundedReceiver<Signal<T>>) -> T {
    match next_signal(rx).await {
        Some(Signal::Next(item)) => item,
        other => panic!("expected an item, got {other:?}"),
    }
}

/// Asserts that the channel stays silent for a short while.
pub async fn assert_quiet<T: Debug>(rx: &mut UnboundedReceiver<Signal<T>>) {
    if let Ok(signal) = timeout(QUIET_PERIOD, rx.recv()).await {
        match signal {
            None => {}
            Some(signal) => panic!("expected no signal, got {signal:?}"),
        }
    }
}

/// Asserts that the subscriber was released without any further signal.
pub async fn assert_closed_silently<T: Debug>(rx: &mut UnboundedReceiver<Signal<T>>) {
    if let Some(signal) = next_signal(rx).await {
        panic!("expected the scroll to end silently, got {signal:?}");
    }
}

/// Polls `check` until it holds.
pub async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    timeout(SIGNAL_TIMEOUT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition never became true");
}
