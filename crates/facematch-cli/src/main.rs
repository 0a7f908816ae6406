use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use facematch_core::reference::crop;
use facematch_core::{
    BrowseCursor, DiskImageSource, FaceExtractor, ImageSource, MatchStrategy, OnnxExtractor,
    ResultSequence, ScanSummary, Session,
};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "facematch", about = "Find the photos where all chosen faces appear together")]
struct Cli {
    /// Directory holding det_10g.onnx and w600k_r50.onnx (overrides FACEMATCH_MODEL_DIR)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a folder for photos containing every reference face
    Scan {
        /// Reference image; every face found in it must appear in a match (repeatable)
        #[arg(short, long = "face", required = true)]
        faces: Vec<PathBuf>,
        /// Folder of photos to search (not recursive)
        #[arg(short = 'd', long)]
        folder: PathBuf,
        /// Cosine similarity a face must exceed
        #[arg(long)]
        threshold: Option<f32>,
        /// "greedy" lets references share a face, "exclusive" does not
        #[arg(long)]
        strategy: Option<MatchStrategy>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Step through matches interactively (n = next, p = previous, q = quit)
        #[arg(long, conflicts_with = "json")]
        browse: bool,
    },
    /// List the faces detected in one image
    Faces {
        image: PathBuf,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        /// Save each face crop as face_<n>.png into this directory
        #[arg(long)]
        crops: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ScanReport<'a> {
    folder: &'a Path,
    references: usize,
    matches: Vec<&'a Path>,
    scanned: usize,
    unreadable: usize,
    faceless: usize,
}

impl<'a> ScanReport<'a> {
    fn new(folder: &'a Path, references: usize, results: &'a ResultSequence, summary: &ScanSummary) -> Self {
        Self {
            folder,
            references,
            matches: results.iter().collect(),
            scanned: summary.scanned,
            unreadable: summary.unreadable,
            faceless: summary.faceless,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(dir) = cli.model_dir {
        config.model_dir = dir;
    }

    match cli.command {
        Commands::Scan {
            faces,
            folder,
            threshold,
            strategy,
            json,
            browse,
        } => {
            if let Some(t) = threshold {
                config.similarity_threshold = t;
            }
            if let Some(s) = strategy {
                config.strategy = s;
            }
            run_scan(&config, &faces, &folder, json, browse)
        }
        Commands::Faces { image, json, crops } => run_faces(&config, &image, json, crops.as_deref()),
    }
}

fn load_extractor(config: &Config) -> Result<OnnxExtractor> {
    OnnxExtractor::load(&config.model_dir)
        .with_context(|| format!("loading face models from {}", config.model_dir.display()))
}

fn run_scan(config: &Config, faces: &[PathBuf], folder: &Path, json: bool, browse: bool) -> Result<()> {
    let extractor = load_extractor(config)?;
    let mut session = Session::new(extractor, config.match_options());

    for path in faces {
        let added = session.add_face(path);
        if added == 0 {
            eprintln!("warning: no usable face in {}", path.display());
        }
    }

    if !session.select_folder(folder) {
        bail!("{} is not a folder containing images", folder.display());
    }

    let summary = session.scan()?;
    let results = session.results();

    if json {
        let report = ScanReport::new(folder, session.references().len(), results, &summary);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} of {} photos contain all {} reference face(s)",
        summary.matched,
        summary.scanned,
        session.references().len()
    );

    if browse {
        let stdin = io::stdin();
        browse_results(results, stdin.lock(), io::stdout().lock())?;
    } else {
        for path in results {
            println!("{}", path.display());
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct FaceReport {
    index: usize,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    crop: Option<PathBuf>,
}

fn run_faces(config: &Config, image_path: &Path, json: bool, crops: Option<&Path>) -> Result<()> {
    let image = DiskImageSource.load(image_path)?;
    let mut extractor = load_extractor(config)?;
    let faces = extractor.extract(&image)?;

    if let Some(dir) = crops {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut reports = Vec::with_capacity(faces.len());
    for (index, face) in faces.iter().enumerate() {
        let crop_path = match crops {
            Some(dir) if !face.bbox.is_empty() => {
                let path = dir.join(format!("face_{index}.png"));
                crop(&image, &face.bbox)
                    .save(&path)
                    .with_context(|| format!("saving {}", path.display()))?;
                Some(path)
            }
            _ => None,
        };
        reports.push(FaceReport {
            index,
            x1: face.bbox.x1,
            y1: face.bbox.y1,
            x2: face.bbox.x2,
            y2: face.bbox.y2,
            crop: crop_path,
        });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else if reports.is_empty() {
        println!("no faces detected in {}", image_path.display());
    } else {
        for r in &reports {
            println!("face {}: ({}, {}) - ({}, {})", r.index, r.x1, r.y1, r.x2, r.y2);
        }
    }
    Ok(())
}

/// Interactive previous/next loop over the matches. Wraps in both directions.
fn browse_results<R: BufRead, W: Write>(results: &ResultSequence, input: R, mut out: W) -> io::Result<()> {
    let mut cursor = BrowseCursor::start(results);
    let Some(first) = cursor.current(results) else {
        writeln!(out, "no matches to browse")?;
        return Ok(());
    };
    writeln!(out, "{}", first.display())?;

    for line in input.lines() {
        let shown = match line?.trim() {
            "" | "n" | "next" => cursor.next(results),
            "p" | "prev" => cursor.prev(results),
            "q" | "quit" => break,
            other => {
                writeln!(out, "unknown command {other:?} (n, p, q)")?;
                continue;
            }
        };
        if let Some(path) = shown {
            writeln!(out, "{}", path.display())?;
        }
    }
    Ok(())
}
