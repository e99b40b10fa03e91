//! Alert dispatch boundary: side effects happen on a dedicated thread,
//! never inside the frame step.

use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("speech io: {0}")]
    Io(#[from] std::io::Error),
    #[error("speech command exited with {0}")]
    Exit(std::process::ExitStatus),
}

/// Delivers one alert phrase (speech synthesis, desktop notification).
pub trait AlertSink: Send {
    fn speak(&mut self, phrase: &str) -> Result<(), AlertError>;
}

/// Clone-safe handle for dispatching alerts to the announcer thread.
#[derive(Clone)]
pub struct AnnouncerHandle {
    tx: mpsc::Sender<String>,
}

impl AnnouncerHandle {
    /// Queue a phrase without blocking. A full or closed queue drops the
    /// phrase with a warning; alerting must never stall the frame step.
    pub fn announce(&self, phrase: &str) {
        match self.tx.try_send(phrase.to_string()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("alert queue full; dropping phrase");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!("announcer thread gone; dropping phrase");
            }
        }
    }
}

/// Spawn the announcer on a dedicated OS thread. The sink may block for
/// the length of an utterance; queued phrases wait their turn and sink
/// failures are logged without stopping the thread.
pub fn spawn_announcer(mut sink: Box<dyn AlertSink>) -> AnnouncerHandle {
    let (tx, mut rx) = mpsc::channel::<String>(4);

    std::thread::Builder::new()
        .name("rollcall-announcer".into())
        .spawn(move || {
            tracing::info!("announcer thread started");
            while let Some(phrase) = rx.blocking_recv() {
                if let Err(err) = sink.speak(&phrase) {
                    tracing::warn!(error = %err, "alert sink failed; continuing");
                }
            }
            tracing::info!("announcer thread exiting");
        })
        .expect("failed to spawn announcer thread");

    AnnouncerHandle { tx }
}

/// Handle wired to a bare receiver so tests can observe dispatched
/// phrases without a thread.
#[cfg(test)]
pub(crate) fn test_handle(capacity: usize) -> (AnnouncerHandle, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(capacity);
    (AnnouncerHandle { tx }, rx)
}
