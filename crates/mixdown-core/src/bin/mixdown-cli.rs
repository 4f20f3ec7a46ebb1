use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mixdown_core::{
    ChannelLayout, Engine, MixdownConfig, RenderSettings,
    diagnostics::init_tracing_from_config,
    export::inspect_wav,
    fixtures::{DEMO_TOTAL_FRAMES, demo_track},
    generate_parity_report,
    parity::write_parity_report,
    persistence::{load_track, save_track},
};

#[derive(Debug, Parser)]
#[command(name = "mixdown-cli")]
#[command(about = "Offline synthesis and mixdown of declarative sound tracks to WAV")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Render {
        #[arg(long)]
        track: PathBuf,

        #[arg(long)]
        frames: u32,

        #[arg(long)]
        fps: Option<u32>,

        #[arg(long)]
        sample_rate: Option<u32>,

        #[arg(long, value_enum, default_value = "stereo")]
        layout: LayoutArg,

        #[arg(long)]
        output: PathBuf,
    },
    DemoExport {
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    Inspect {
        path: PathBuf,
    },
    ParityReport {
        #[arg(long, default_value = "data/parity/report.json")]
        output: PathBuf,
    },
}

#[derive(Debug, Clone, ValueEnum)]
enum LayoutArg {
    Stereo,
    Mono,
}

impl From<LayoutArg> for ChannelLayout {
    fn from(value: LayoutArg) -> Self {
        match value {
            LayoutArg::Stereo => Self::Stereo,
            LayoutArg::Mono => Self::Mono,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => MixdownConfig::from_path(path)?,
        None => MixdownConfig::load_or_default()?,
    };
    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| config.paths.logs_dir.clone());
    let telemetry = init_tracing_from_config(&log_dir, &config.diagnostics)?;

    let settings = match &cli.command {
        Commands::Render {
            fps, sample_rate, ..
        } => RenderSettings {
            sample_rate: sample_rate.unwrap_or(config.render.sample_rate),
            fps: fps.unwrap_or(config.render.fps),
        },
        Commands::ParityReport { .. } => RenderSettings::default(),
        Commands::DemoExport { .. } | Commands::Inspect { .. } => config.render.settings(),
    };
    let _session = telemetry.render_session(settings).entered();

    match cli.command {
        Commands::Render {
            track,
            frames,
            layout,
            output,
            ..
        } => {
            let track = load_track(&track)?;
            Engine::new(settings).export(&track, frames, layout.into(), &output)?;
        }
        Commands::DemoExport { output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| config.paths.export_dir.clone());
            std::fs::create_dir_all(&output_dir)?;
            let track = demo_track();
            save_track(&output_dir.join("demo.track.json"), &track)?;

            let engine = Engine::new(settings);
            engine.export(
                &track,
                DEMO_TOTAL_FRAMES,
                ChannelLayout::Stereo,
                &output_dir.join("demo.wav"),
            )?;
            engine.export(
                &track,
                DEMO_TOTAL_FRAMES,
                ChannelLayout::Mono,
                &output_dir.join("demo.mono.wav"),
            )?;
        }
        Commands::Inspect { path } => {
            let info = inspect_wav(&path)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        Commands::ParityReport { output } => {
            let report = generate_parity_report(&demo_track(), settings, DEMO_TOTAL_FRAMES)?;
            write_parity_report(&output, &report)?;
            tracing::info!(path = %output.display(), "parity report generated");
        }
    }

    Ok(())
}
