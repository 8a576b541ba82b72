
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::Level;

use konekt_client::SessionEvent;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Wait for the next session event that satisfies `pred`, with a
/// deadline so a stalled connection fails fast.
pub async fn wait_for_event(
    rx: &mut mpsc::Receiver<SessionEvent>,
    pred: impl Fn(&SessionEvent) -> bool,
    what: &str,
) -> SessionEvent {
    let deadline = Duration::from_secs(30);
    tokio::time::timeout(deadline, async {
        while let Some(event) = rx.recv().await {
            if pred(&event) {
                return event;
            }
        }
        panic!("event channel closed while waiting for {what}");
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"))
}
