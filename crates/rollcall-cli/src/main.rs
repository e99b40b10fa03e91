use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rollcall_core::{
    EmbeddingExtractor, Gallery, GridExtractor, MatchVerdict, Matcher, NearestMatcher,
};
use rollcall_ledger::{AttendanceLedger, AttendanceRecord};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rollcall", about = "Rollcall attendance inspection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show recorded attendance
    Records {
        /// Path to the attendance store (default: $XDG_DATA_HOME/rollcall/attendance.csv)
        #[arg(long)]
        ledger: Option<PathBuf>,
        /// Only show records for this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List the identities a gallery directory yields
    Gallery {
        /// Directory of reference images (default: $XDG_DATA_HOME/rollcall/known_faces)
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Match a directory of frame images against a gallery, offline
    Replay {
        /// Directory of frame images
        #[arg(long)]
        frames: PathBuf,
        /// Directory of reference images (default: $XDG_DATA_HOME/rollcall/known_faces)
        #[arg(long)]
        gallery: Option<PathBuf>,
        /// Euclidean distance threshold for a positive match
        #[arg(long, default_value_t = 0.6)]
        threshold: f32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let data_dir = rollcall_core::default_data_dir();

    match cli.command {
        Commands::Records { ledger, date, json } => {
            let path = ledger.unwrap_or_else(|| data_dir.join("attendance.csv"));
            show_records(&path, date, json)
        }
        Commands::Gallery { dir, json } => {
            let dir = dir.unwrap_or_else(|| data_dir.join("known_faces"));
            show_gallery(&dir, json)
        }
        Commands::Replay { frames, gallery, threshold } => {
            let gallery = gallery.unwrap_or_else(|| data_dir.join("known_faces"));
            run_replay(&frames, &gallery, threshold)
        }
    }
}

fn show_records(path: &Path, date: Option<NaiveDate>, json: bool) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("no attendance store at {}", path.display());
    }
    let ledger = AttendanceLedger::open(path)
        .with_context(|| format!("opening attendance store {}", path.display()))?;

    let records: Vec<&AttendanceRecord> = ledger
        .records()
        .iter()
        .filter(|r| date.map_or(true, |d| r.date == d))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("{:<20} {:<12} {:<8} {}", "NAME", "DATE", "SESSION", "TIME");
        for r in &records {
            println!(
                "{:<20} {:<12} {:<8} {}",
                r.name,
                r.date.to_string(),
                r.session.to_string(),
                r.time
            );
        }
        println!("{} record(s)", records.len());
    }
    Ok(())
}

fn show_gallery(dir: &Path, json: bool) -> Result<()> {
    let gallery = Gallery::load(dir, &GridExtractor)
        .with_context(|| format!("loading gallery from {}", dir.display()))?;

    if json {
        let entries: Vec<serde_json::Value> = gallery
            .iter()
            .map(|i| serde_json::json!({ "name": i.name, "dimensions": i.embedding.dim() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for identity in gallery.iter() {
            println!("{:<20} {} dims", identity.name, identity.embedding.dim());
        }
        println!("{} identities", gallery.len());
    }
    Ok(())
}

/// Offline diagnostics: embed each frame image and print the matcher
/// verdict. Never touches the attendance store.
fn run_replay(frames_dir: &Path, gallery_dir: &Path, threshold: f32) -> Result<()> {
    let gallery = Gallery::load(gallery_dir, &GridExtractor)
        .with_context(|| format!("loading gallery from {}", gallery_dir.display()))?;

    let entries = std::fs::read_dir(frames_dir)
        .with_context(|| format!("reading frames from {}", frames_dir.display()))?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();

    let mut matched = 0usize;
    let mut unknown = 0usize;
    let mut skipped = 0usize;

    for path in &files {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let img = match image::open(path) {
            Ok(img) => img,
            Err(_) => {
                println!("{file}: skipped (not an image)");
                skipped += 1;
                continue;
            }
        };
        let Some(embedding) = GridExtractor.extract(&img) else {
            println!("{file}: skipped (no embedding)");
            skipped += 1;
            continue;
        };

        match NearestMatcher.compare(&embedding, gallery.identities(), threshold) {
            MatchVerdict::Matched { name, distance } => {
                println!("{file}: {name} (distance {distance:.3})");
                matched += 1;
            }
            MatchVerdict::Unknown => {
                println!("{file}: unknown");
                unknown += 1;
            }
        }
    }

    println!(
        "{matched} matched, {unknown} unknown, {skipped} skipped of {} frames",
        files.len()
    );
    Ok(())
}
