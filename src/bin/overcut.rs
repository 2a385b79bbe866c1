use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "overcut", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a timeline or overlay project document.
    Validate(ValidateArgs),
    /// Print the compose summary (clip count, effective duration) for a timeline.
    Summarize(SummarizeArgs),
    /// Print the visible overlay layers and their animated state at a playhead position.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Document kind.
    #[arg(long, value_enum)]
    kind: DocKind,
}

#[derive(Parser, Debug)]
struct SummarizeArgs {
    /// Input timeline JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Input overlay project JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Playhead position in seconds.
    #[arg(long)]
    at: f64,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DocKind {
    Timeline,
    Overlay,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Summarize(args) => cmd_summarize(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn read_timeline_json(path: &Path) -> anyhow::Result<overcut::Timeline> {
    let f = File::open(path).with_context(|| format!("open timeline '{}'", path.display()))?;
    let r = BufReader::new(f);
    let timeline: overcut::Timeline =
        serde_json::from_reader(r).with_context(|| "parse timeline JSON")?;
    Ok(timeline)
}

fn read_project_json(path: &Path) -> anyhow::Result<overcut::OverlayProject> {
    let f = File::open(path).with_context(|| format!("open project '{}'", path.display()))?;
    let r = BufReader::new(f);
    let project: overcut::OverlayProject =
        serde_json::from_reader(r).with_context(|| "parse project JSON")?;
    Ok(project)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    match args.kind {
        DocKind::Timeline => {
            let timeline = read_timeline_json(&args.in_path)?;
            timeline.validate()?;
            eprintln!(
                "ok: {} clip(s), {:.1}s effective",
                timeline.clip_count(),
                timeline.effective_duration()
            );
        }
        DocKind::Overlay => {
            let project = read_project_json(&args.in_path)?;
            project.validate()?;
            eprintln!(
                "ok: '{}', {} layer(s) over {:.1}s of video",
                project.name,
                project.layers.len(),
                project.video.duration
            );
        }
    }
    Ok(())
}

fn cmd_summarize(args: SummarizeArgs) -> anyhow::Result<()> {
    let timeline = read_timeline_json(&args.in_path)?;
    timeline.validate()?;

    let summary = overcut::PreviewSummary {
        clip_count: timeline.clip_count() as u32,
        effective_duration: timeline.effective_duration(),
        output_width: timeline.format.width,
        output_height: timeline.format.height,
    };

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let project = read_project_json(&args.in_path)?;
    project.validate()?;

    let sample = overcut::sample_frame(&project, args.at);
    println!("{}", serde_json::to_string_pretty(&sample)?);
    Ok(())
}
