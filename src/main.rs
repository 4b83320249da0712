//! Block-device telemetry CLI.
#![forbid(unsafe_code)]

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use blk_telemetry::{
    IoDelta, LogConfig, RtAssessment, RtTuning, SchedulerConfig, assess, init_logging,
    list_devices, read_rt_tuning, read_scheduler_config, sample_delta,
};

#[derive(Parser)]
#[command(
    name = "blk-telemetry",
    about = "Block-device I/O telemetry and RT scheduler assessment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a device's I/O counters and print derived rates
    Delta {
        /// Device name under /sys/block (e.g. sda, nvme0n1)
        device: String,

        /// Sampling window in milliseconds
        #[arg(long, default_value_t = 1000)]
        sample_ms: u64,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
    /// Show a device's I/O scheduler configuration
    Scheduler {
        device: String,

        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
    /// Assess a device's queue configuration for real-time workloads
    RtScore {
        device: String,

        #[arg(long, default_value = "json")]
        format: OutputFormat,
    },
    /// List block devices
    Devices,
}

#[derive(ValueEnum, Clone, Copy)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Serialize)]
struct Report<T: Serialize> {
    timestamp: DateTime<Utc>,
    device: String,
    #[serde(flatten)]
    body: T,
}

impl<T: Serialize> Report<T> {
    fn new(device: &str, body: T) -> Self {
        Self {
            timestamp: Utc::now(),
            device: device.to_string(),
            body,
        }
    }
}

#[derive(Serialize)]
struct DeltaBody {
    delta: IoDelta,
    idle: bool,
}

#[derive(Serialize)]
struct SchedulerBody {
    scheduler: SchedulerConfig,
}

#[derive(Serialize)]
struct RtScoreBody {
    tuning: RtTuning,
    rating: &'static str,
    assessment: RtAssessment,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    match cli.command {
        Commands::Delta {
            device,
            sample_ms,
            format,
        } => {
            let delta = sample_delta(&device, Duration::from_millis(sample_ms))?;
            let idle = delta.is_idle();
            print_report(format, &Report::new(&device, DeltaBody { delta, idle }))
        }
        Commands::Scheduler { device, format } => {
            let scheduler = read_scheduler_config(&device)?;
            print_report(format, &Report::new(&device, SchedulerBody { scheduler }))
        }
        Commands::RtScore { device, format } => {
            let tuning = read_rt_tuning(&device)?;
            let assessment = assess(&tuning);
            let rating = assessment.rating();
            print_report(
                format,
                &Report::new(
                    &device,
                    RtScoreBody {
                        tuning,
                        rating,
                        assessment,
                    },
                ),
            )
        }
        Commands::Devices => {
            for device in list_devices()? {
                println!("{device}");
            }
            Ok(())
        }
    }
}

fn print_report<T: Serialize>(format: OutputFormat, report: &T) -> Result<()> {
    let output = match format {
        OutputFormat::Json => serde_json::to_string(report)?,
        OutputFormat::Pretty => serde_json::to_string_pretty(report)?,
    };
    println!("{output}");
    Ok(())
}
