//! Frame pipeline: one iteration per frame, matching detected faces
//! against the gallery and driving the ledger, the alert throttle, and
//! the display.

use crate::announcer::AnnouncerHandle;
use crate::capture::{CaptureError, FaceAnalyzer, VideoSource};
use crate::display::{AnnotatedFrame, DisplaySink, FaceAnnotation, Marking};
use chrono::{DateTime, Local};
use rollcall_core::{AlertThrottle, Gallery, MatchVerdict, Matcher, NearestMatcher, Session};
use rollcall_ledger::{AttendanceLedger, RecordOutcome};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("capture: {0}")]
    Capture(#[from] CaptureError),
    #[error("pipeline thread exited")]
    ChannelClosed,
}

/// Lifecycle of the pipeline worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopped,
}

enum PipelineCommand {
    Start {
        reply: oneshot::Sender<Result<(), PipelineError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    State {
        reply: oneshot::Sender<PipelineState>,
    },
}

/// Clone-safe handle to the pipeline thread.
#[derive(Clone)]
pub struct PipelineHandle {
    tx: mpsc::Sender<PipelineCommand>,
}

impl PipelineHandle {
    /// Acquire the capture source and begin stepping at the configured
    /// cadence. Idempotent while running; on a capture failure the
    /// pipeline stays in its previous state.
    pub async fn start(&self) -> Result<(), PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PipelineCommand::Start { reply: reply_tx })
            .await
            .map_err(|_| PipelineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| PipelineError::ChannelClosed)?
    }

    /// Stop stepping and release the capture source. Safe at any time;
    /// commands are handled between steps, so no attendance write is in
    /// flight when the release happens.
    pub async fn stop(&self) -> Result<(), PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PipelineCommand::Stop { reply: reply_tx })
            .await
            .map_err(|_| PipelineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| PipelineError::ChannelClosed)
    }

    pub async fn state(&self) -> Result<PipelineState, PipelineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(PipelineCommand::State { reply: reply_tx })
            .await
            .map_err(|_| PipelineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| PipelineError::ChannelClosed)
    }
}

/// Everything the pipeline owns. The worker thread takes sole
/// possession, so gallery reads, ledger writes, and throttle updates
/// all happen through exclusive borrows on one thread.
pub struct PipelineDeps {
    pub source: Box<dyn VideoSource>,
    pub analyzer: Box<dyn FaceAnalyzer>,
    pub display: Box<dyn DisplaySink>,
    pub gallery: Gallery,
    pub ledger: AttendanceLedger,
    pub throttle: AlertThrottle,
    pub announcer: AnnouncerHandle,
    pub match_threshold: f32,
    pub frame_interval: Duration,
    pub alert_phrase: String,
}

/// Spawn the pipeline on a dedicated OS thread. The worker idles until
/// the first `start()`.
pub fn spawn_pipeline(deps: PipelineDeps) -> PipelineHandle {
    let (tx, rx) = mpsc::channel::<PipelineCommand>(4);

    std::thread::Builder::new()
        .name("rollcall-pipeline".into())
        .spawn(move || {
            tracing::info!("pipeline thread started");
            Worker::new(deps).run(rx);
            tracing::info!("pipeline thread exiting");
        })
        .expect("failed to spawn pipeline thread");

    PipelineHandle { tx }
}

struct Worker {
    deps: PipelineDeps,
    state: PipelineState,
}

impl Worker {
    fn new(deps: PipelineDeps) -> Self {
        Self {
            deps,
            state: PipelineState::Idle,
        }
    }

    fn run(mut self, mut rx: mpsc::Receiver<PipelineCommand>) {
        loop {
            if self.state == PipelineState::Running {
                let tick = Instant::now();
                self.step(Local::now(), tick);

                // Handle queued commands between steps, then sleep out
                // the remainder of the frame budget. A slow step simply
                // delays the next tick.
                loop {
                    match rx.try_recv() {
                        Ok(cmd) => self.handle(cmd),
                        Err(mpsc::error::TryRecvError::Empty) => break,
                        Err(mpsc::error::TryRecvError::Disconnected) => {
                            self.release();
                            return;
                        }
                    }
                }
                if self.state == PipelineState::Running {
                    std::thread::sleep(self.deps.frame_interval.saturating_sub(tick.elapsed()));
                }
            } else {
                match rx.blocking_recv() {
                    Some(cmd) => self.handle(cmd),
                    None => {
                        self.release();
                        return;
                    }
                }
            }
        }
    }

    fn handle(&mut self, cmd: PipelineCommand) {
        match cmd {
            PipelineCommand::Start { reply } => {
                let _ = reply.send(self.start());
            }
            PipelineCommand::Stop { reply } => {
                self.stop();
                let _ = reply.send(());
            }
            PipelineCommand::State { reply } => {
                let _ = reply.send(self.state);
            }
        }
    }

    fn start(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Running {
            return Ok(());
        }
        self.deps.source.start()?;
        self.state = PipelineState::Running;
        tracing::info!("pipeline running");
        Ok(())
    }

    fn stop(&mut self) {
        if self.state == PipelineState::Running {
            self.deps.source.stop();
            self.state = PipelineState::Stopped;
            tracing::info!("pipeline stopped");
        }
    }

    fn release(&mut self) {
        if self.state == PipelineState::Running {
            self.deps.source.stop();
        }
    }

    /// One pipeline iteration: pull a frame, match each detected face,
    /// record attendance or request an alert, and hand exactly one
    /// annotated frame to the display.
    fn step(&mut self, now: DateTime<Local>, tick: Instant) {
        let Some(frame) = self.deps.source.next_frame() else {
            // No frame ready this tick; not an error.
            return;
        };

        let session = Session::classify(&now);
        let detections = self.deps.analyzer.detect_and_embed(&frame);
        let mut faces = Vec::with_capacity(detections.len());

        for detection in detections {
            let verdict = NearestMatcher.compare(
                &detection.embedding,
                self.deps.gallery.identities(),
                self.deps.match_threshold,
            );

            let marking = match verdict {
                MatchVerdict::Matched { name, distance } => {
                    tracing::trace!(name = %name, distance, "face matched");
                    match self.deps.ledger.record(&name, &now) {
                        Ok(RecordOutcome::Inserted) => {
                            tracing::info!(name = %name, session = %session, "attendance saved");
                        }
                        Ok(RecordOutcome::AlreadyPresent) => {
                            tracing::trace!(name = %name, "already recorded this session");
                        }
                        Err(err) => {
                            // Matching stays up; the write retries on the
                            // next sighting of this person.
                            tracing::error!(name = %name, error = %err, "attendance write failed");
                        }
                    }
                    Marking::Known { name }
                }
                MatchVerdict::Unknown => {
                    if self.deps.throttle.maybe_alert(tick) {
                        self.deps.announcer.announce(&self.deps.alert_phrase);
                    }
                    Marking::Unknown
                }
            };

            faces.push(FaceAnnotation {
                region: detection.region,
                marking,
                session,
            });
        }

        tracing::trace!(
            seq = frame.sequence,
            faces = faces.len(),
            age_ms = frame.timestamp.elapsed().as_millis() as u64,
            "frame processed"
        );
        self.deps.display.render(AnnotatedFrame { frame, faces });
    }
}
