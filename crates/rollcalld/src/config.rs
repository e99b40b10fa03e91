use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// Directory of reference images, one identity per file.
    pub gallery_dir: PathBuf,
    /// Path to the attendance CSV store.
    pub ledger_path: PathBuf,
    /// Directory of frame images for the built-in replay source.
    pub frames_dir: Option<PathBuf>,
    /// Euclidean distance threshold for a positive match.
    pub match_threshold: f32,
    /// Target cadence between pipeline steps.
    pub frame_interval: Duration,
    /// Minimum quiet period between unknown-person alerts.
    pub alert_gap: Duration,
    /// Phrase spoken when an unknown person is detected.
    pub alert_phrase: String,
    /// Speech command line; the phrase is appended as the last argument.
    pub speak_command: String,
}

impl Config {
    /// Load configuration from `ROLLCALL_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let data_dir = rollcall_core::default_data_dir();

        let gallery_dir = std::env::var("ROLLCALL_GALLERY_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("known_faces"));

        let ledger_path = std::env::var("ROLLCALL_LEDGER_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("attendance.csv"));

        Self {
            gallery_dir,
            ledger_path,
            frames_dir: std::env::var("ROLLCALL_FRAMES_DIR").map(PathBuf::from).ok(),
            match_threshold: env_f32("ROLLCALL_MATCH_THRESHOLD", 0.6),
            frame_interval: Duration::from_millis(env_u64("ROLLCALL_FRAME_INTERVAL_MS", 33)),
            alert_gap: Duration::from_secs(env_u64("ROLLCALL_ALERT_GAP_SECS", 5)),
            alert_phrase: std::env::var("ROLLCALL_ALERT_PHRASE")
                .unwrap_or_else(|_| "Warning. Unknown person detected".to_string()),
            speak_command: std::env::var("ROLLCALL_SPEAK_COMMAND")
                .unwrap_or_else(|_| "espeak".to_string()),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
