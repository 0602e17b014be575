use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use scrubber::config::{self, DeviceTier, ScrubberConfig};
use scrubber::thumbnail::sample_timestamps;
use scrubber::time::format_timestamp;
use scrubber::{
    FfmpegThumbnailExtractor, GenerationOutcome, MediaDuration, MediaReference,
    SharedThumbnailCache, ThumbnailGenerator, ThumbnailSequence,
};

#[derive(Parser)]
#[command(name = "scrubber-cli")]
#[command(about = "Headless driver for the video timeline scrubber")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print streams and duration of a media file
    Probe { input: PathBuf },
    /// Generate the thumbnail strip for a media file
    Thumbnails {
        input: PathBuf,
        /// TOML config file; defaults apply when absent
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Device tier preset, overriding the config's strip tuning
        #[arg(long, value_enum)]
        tier: Option<TierArg>,
        /// Number of thumbnails
        #[arg(long)]
        count: Option<usize>,
        /// Maximum extractions in flight
        #[arg(long)]
        concurrency: Option<usize>,
        /// Write each thumbnail as a PNG into this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
    /// Write a config file with the preset for a tier
    InitConfig {
        path: PathBuf,
        #[arg(long, value_enum, default_value = "standard")]
        tier: TierArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TierArg {
    Low,
    Standard,
}

impl From<TierArg> for DeviceTier {
    fn from(value: TierArg) -> Self {
        match value {
            TierArg::Low => Self::Low,
            TierArg::Standard => Self::Standard,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Probe { input } => probe(input).await,
        Commands::Thumbnails {
            input,
            config,
            tier,
            count,
            concurrency,
            out_dir,
        } => {
            let mut config = match config {
                Some(path) => config::load_from_path(&path)?,
                None => ScrubberConfig::default(),
            };
            if let Some(tier) = tier {
                config.apply_tier(tier.into());
            }
            if let Some(count) = count {
                config.thumbnail_count = count;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency_limit = concurrency;
            }
            config.validate()?;
            thumbnails(input, &config, out_dir.as_deref()).await
        }
        Commands::InitConfig { path, tier } => {
            let config = ScrubberConfig::for_tier(tier.into());
            config::save_to_path(&config, &path)?;
            println!("wrote {}", path.display());
            Ok(())
        }
    }
}

async fn probe(input: PathBuf) -> Result<()> {
    let media = tokio::task::spawn_blocking(move || media_ffmpeg::probe_media(input)).await??;

    println!("{}", media.path.display());
    for stream in &media.streams {
        let size = match (stream.width, stream.height) {
            (Some(width), Some(height)) => format!(" {width}x{height}"),
            _ => String::new(),
        };
        println!(
            "  #{} {:?} {}{}",
            stream.index,
            stream.kind,
            stream.codec_name.as_deref().unwrap_or("unknown"),
            size
        );
    }
    match media.best_duration_seconds() {
        Some(duration) => println!("duration {}", format_timestamp(duration)),
        None => println!("duration unknown"),
    }
    Ok(())
}

async fn thumbnails(input: PathBuf, config: &ScrubberConfig, out_dir: Option<&Path>) -> Result<()> {
    let probe_path = input.clone();
    let media_info =
        tokio::task::spawn_blocking(move || media_ffmpeg::probe_media(probe_path)).await??;
    let seconds = media_info
        .best_duration_seconds()
        .ok_or_else(|| anyhow!("{} has no known duration", input.display()))?;
    let duration = MediaDuration::new(seconds)?;

    let generator = ThumbnailGenerator::new(SharedThumbnailCache::new(config.cache_capacity));
    let request = config.generation_request(MediaReference::from(input.as_path()), duration);
    let token = generator.begin();
    let strip = match generator
        .generate(&token, &FfmpegThumbnailExtractor, &request)
        .await
    {
        GenerationOutcome::Cached(strip) | GenerationOutcome::Generated(strip) => strip,
        GenerationOutcome::Cancelled => return Err(anyhow!("thumbnail generation was cancelled")),
    };

    let timestamps = sample_timestamps(duration, strip.len());
    for (index, (slot, at)) in strip.slots().iter().zip(&timestamps).enumerate() {
        let state = match slot {
            Some(image) => format!("{}x{}", image.width, image.height),
            None => "absent".to_string(),
        };
        println!("{index:>3} {:>8} {state}", format_timestamp(*at));
    }
    println!(
        "{} of {} thumbnails extracted",
        strip.present_count(),
        strip.len()
    );

    if let Some(out_dir) = out_dir {
        write_pngs(&strip, out_dir)?;
    }
    Ok(())
}

fn write_pngs(strip: &ThumbnailSequence, out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for (index, slot) in strip.slots().iter().enumerate() {
        let Some(thumbnail) = slot else {
            continue;
        };
        let image = image::RgbaImage::from_raw(
            thumbnail.width,
            thumbnail.height,
            thumbnail.bytes.to_vec(),
        )
        .ok_or_else(|| anyhow!("thumbnail {index} has an inconsistent buffer size"))?;
        let path = out_dir.join(format!("thumbnail_{index:02}.png"));
        image
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "thumbnail written");
    }
    Ok(())
}
