//! Radar volume inspector.
//!
//! Decodes a NEXRAD Archive II file, prints a JSON summary of the volume and
//! optionally resamples one sweep of one moment to a Cartesian grid.

mod report;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nexrad_decoder::{decode_file, DecoderConfig, MomentKind};
use radar_grid::{PolarField, PolarResampler, ResampleConfig};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use report::{GridReport, VolumeReport};

#[derive(Parser, Debug)]
#[command(name = "radar-inspect")]
#[command(about = "Decode NEXRAD Archive II volumes and resample sweeps to grids")]
struct Args {
    /// Archive II volume file
    file: PathBuf,

    /// Sweep index (0-based) to extract
    #[arg(short, long, default_value_t = 0)]
    sweep: usize,

    /// Moment to extract and resample (REF, VEL, SW, ZDR, PHI, RHO, CFP)
    #[arg(short, long)]
    moment: Option<MomentKind>,

    /// Output grid side length in pixels
    #[arg(long)]
    grid_size: Option<usize>,

    /// Write the grid JSON here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Decode records in parallel
    #[arg(long)]
    parallel: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_json)?;

    let mut decoder_config = DecoderConfig::from_env();
    decoder_config.parallel_segments |= args.parallel;

    let output = decode_file(&args.file, &decoder_config)
        .with_context(|| format!("failed to decode {}", args.file.display()))?;
    let volume = output.volume;

    let report = VolumeReport {
        file: args.file.display().to_string(),
        summary: volume.summary(),
        stats: output.stats,
    };

    write_json(&report, None)?;

    let Some(moment) = args.moment else {
        return Ok(());
    };

    let data = volume
        .extract_moment(args.sweep, moment)
        .with_context(|| format!("cannot extract {} from sweep {}", moment, args.sweep))?;
    info!(
        sweep = args.sweep,
        moment = %moment,
        rays = data.ray_count,
        gates = data.gate_count,
        "Extracted moment"
    );

    let mut resample_config = ResampleConfig::from_env();
    if let Some(size) = args.grid_size {
        resample_config.grid_size = size;
    }
    let resampler = PolarResampler::new(resample_config)?;
    let field = PolarField::try_from(data.clone())?;
    let grid = resampler.resample(&field);

    let grid_report = GridReport::new(volume.station_id(), volume.timestamp(), &data, &grid);
    write_json(&grid_report, args.output.as_ref())?;

    info!(
        size = grid.size,
        valid = grid.valid_count(),
        output = ?args.output,
        "Wrote grid"
    );

    Ok(())
}

fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(io::stderr);

    if json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }

    Ok(())
}

fn write_json<T: serde::Serialize>(value: &T, path: Option<&PathBuf>) -> Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
