//! Display sink boundary.
//!
//! The controller never talks to a window or a monitor; it hands immutable
//! [`Pattern`] values to a [`DisplaySink`] and moves on. The real rendering
//! surface is out of scope here, so the shipped sink forwards patterns over
//! a channel to a render loop task that logs them and tracks the last one
//! shown. A later pattern unconditionally supersedes an earlier pending one.

use std::sync::Mutex;

use shared::domain::Pattern;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

/// Fire-and-forget display boundary. `show` must never block: it is called
/// while the controller holds its state lock so that display order always
/// matches position-mutation order.
pub trait DisplaySink: Send + Sync {
    fn show(&self, pattern: Pattern);
}

/// Sink half of the render channel.
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Pattern>,
}

impl DisplaySink for ChannelSink {
    fn show(&self, pattern: Pattern) {
        // A closed channel means the render loop is gone, i.e. shutdown.
        let _ = self.tx.send(pattern);
    }
}

/// Render-loop half: drains the channel on the rendering task and publishes
/// the last shown pattern for observers.
pub struct RenderLoop {
    rx: mpsc::UnboundedReceiver<Pattern>,
    shown_tx: watch::Sender<Option<Pattern>>,
}

/// Creates the connected sink/render-loop pair plus a watch handle on the
/// most recently displayed pattern.
pub fn channel() -> (ChannelSink, RenderLoop, watch::Receiver<Option<Pattern>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let (shown_tx, shown_rx) = watch::channel(None);
    (ChannelSink { tx }, RenderLoop { rx, shown_tx }, shown_rx)
}

impl RenderLoop {
    /// Runs until shutdown is signalled or every sink handle is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        loop {
            tokio::select! {
                maybe = self.rx.recv() => match maybe {
                    Some(pattern) => {
                        info!(
                            position = pattern.position,
                            path = %pattern.path.display(),
                            "displaying pattern"
                        );
                        let _ = self.shown_tx.send(Some(pattern));
                    }
                    None => break,
                },
                changed = shutdown.changed() => {
                    // A dropped sender counts as shutdown too.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("render loop stopped");
    }
}

/// Discards every pattern. For tests that only exercise state transitions.
#[derive(Debug, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn show(&self, _pattern: Pattern) {}
}

/// Records every pattern it is shown, in order. Test helper.
#[derive(Debug, Default)]
pub struct RecordingSink {
    shown: Mutex<Vec<Pattern>>,
}

impl RecordingSink {
    pub fn shown(&self) -> Vec<Pattern> {
        self.shown.lock().expect("sink lock poisoned").clone()
    }
}

impl DisplaySink for RecordingSink {
    fn show(&self, pattern: Pattern) {
        self.shown.lock().expect("sink lock poisoned").push(pattern);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pattern(position: usize) -> Pattern {
        Pattern {
            position,
            path: PathBuf::from(format!("patterns/p{position}.jpg")),
        }
    }

    #[tokio::test]
    async fn render_loop_publishes_last_shown_pattern() {
        let (sink, render, mut shown) = channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(render.run(shutdown_rx));

        sink.show(pattern(0));
        sink.show(pattern(1));

        shown.changed().await.expect("first update");
        // Drain until the latest value is visible.
        while shown.borrow_and_update().as_ref().map(|p| p.position) != Some(1) {
            shown.changed().await.expect("second update");
        }

        shutdown_tx.send(true).expect("signal shutdown");
        handle.await.expect("render loop join");
    }

    #[tokio::test]
    async fn render_loop_stops_when_shutdown_sender_is_dropped() {
        // The sink stays alive, so the only way out is the shutdown arm.
        let (_sink, render, _shown) = channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(render.run(shutdown_rx));

        drop(shutdown_tx);
        handle.await.expect("render loop join");
    }

    #[tokio::test]
    async fn render_loop_stops_when_sink_is_dropped() {
        let (sink, render, _shown) = channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(render.run(shutdown_rx));

        drop(sink);
        handle.await.expect("render loop join");
    }

    #[test]
    fn recording_sink_preserves_order() {
        let sink = RecordingSink::default();
        sink.show(pattern(2));
        sink.show(pattern(0));
        let positions: Vec<usize> = sink.shown().iter().map(|p| p.position).collect();
        assert_eq!(positions, vec![2, 0]);
    }
}
