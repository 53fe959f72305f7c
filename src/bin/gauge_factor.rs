use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use shpb_gauge_factor::calibration::{GaugeFactorCalculator, GaugeFactorResult};
use shpb_gauge_factor::config::AppConfig;
use shpb_gauge_factor::error::{ErrorCode, GaugeFactorError, SignalError};
use shpb_gauge_factor::fixtures::{load_expectations, ExpectationDiff, FixtureCatalog};
use shpb_gauge_factor::recording::{load_csv, write_csv};
use shpb_gauge_factor::report::ShotReport;
use shpb_gauge_factor::testing::SyntheticShot;

#[derive(Parser, Debug)]
#[command(
    name = "gauge_factor",
    about = "Gauge factor and wave speed from SHPB input bar strain gauge recordings"
)]
struct Cli {
    /// Override directory containing fixture recordings (defaults to ./fixtures of the crate)
    #[arg(long)]
    fixtures_dir: Option<PathBuf>,
    /// JSON configuration file; errors in it are fatal
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log pulse detection details to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the gauge factor of one recording
    Compute {
        /// Recording path or fixture name
        #[arg(long)]
        input: String,
        /// Oscilloscope channel of the input bar gauge (1-based)
        #[arg(long)]
        channel: Option<usize>,
        #[command(flatten)]
        setup: SetupArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Expectation JSON to compare against (exit code 2 on mismatch)
        #[arg(long)]
        expect: Option<PathBuf>,
    },
    /// Compute every .csv recording in a directory
    Batch {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long, default_value_t = 1)]
        channel: usize,
        #[command(flatten)]
        setup: SetupArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Write a synthetic recording with a known gauge factor
    Synth {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 120.0)]
        gauge_factor: f64,
        #[arg(long, default_value_t = 5000.0)]
        wave_speed: f64,
        /// Sampling interval (s)
        #[arg(long, default_value_t = 4e-7)]
        time_step: f64,
        #[arg(long, default_value_t = 3000)]
        samples: usize,
        #[arg(long, default_value_t = 0.0)]
        baseline: f64,
        /// Half-width of uniform noise (V)
        #[arg(long, default_value_t = 0.0)]
        noise: f64,
        #[arg(long, default_value_t = 0x5A5A_FFF0)]
        seed: u64,
        #[arg(long, default_value_t = 1)]
        channel: usize,
        #[arg(long, default_value_t = false)]
        inverted: bool,
        #[command(flatten)]
        setup: SetupArgs,
    },
    /// List available fixtures on disk
    DumpFixtures,
}

/// Overrides for the configured bar constants
#[derive(Args, Debug, Clone, Default)]
struct SetupArgs {
    /// Gauge to free end distance (mm)
    #[arg(long)]
    length_mm: Option<f64>,
    /// Striker velocity (m/s)
    #[arg(long)]
    velocity: Option<f64>,
    /// Bridge excitation voltage (V)
    #[arg(long)]
    excitation: Option<f64>,
    /// Amplifier gain
    #[arg(long)]
    amplification: Option<f64>,
    /// Samples after the incident start before searching the reflection
    #[arg(long)]
    reflection_delay: Option<usize>,
}

impl SetupArgs {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(value) = self.length_mm {
            config.bar.gauge_to_interface_mm = value;
        }
        if let Some(value) = self.velocity {
            config.bar.striker_velocity_m_s = value;
        }
        if let Some(value) = self.excitation {
            config.bar.excitation_voltage_v = value;
        }
        if let Some(value) = self.amplification {
            config.bar.amplification = value;
        }
        if let Some(value) = self.reflection_delay {
            config.detection.reflection_delay_samples = value;
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    shpb_gauge_factor::init_logging(if cli.verbose { "debug" } else { "warn" });

    let base_config = match &cli.config {
        Some(path) => AppConfig::try_load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AppConfig::load(),
    };
    let catalog = cli
        .fixtures_dir
        .map(FixtureCatalog::new)
        .unwrap_or_default()
        .with_recording_config(base_config.recording.clone());

    match cli.command {
        Commands::Compute {
            input,
            channel,
            setup,
            format,
            output,
            expect,
        } => run_compute(
            &catalog,
            configured(base_config, &setup)?,
            &input,
            channel,
            format,
            output,
            expect,
        ),
        Commands::Batch {
            dir,
            channel,
            setup,
            format,
        } => {
            let config = configured(base_config, &setup)?;
            let catalog = FixtureCatalog::new(dir).with_recording_config(config.recording.clone());
            run_batch(&catalog, config, channel, format)
        }
        Commands::Synth {
            output,
            gauge_factor,
            wave_speed,
            time_step,
            samples,
            baseline,
            noise,
            seed,
            channel,
            inverted,
            setup,
        } => {
            let config = configured(base_config, &setup)?;
            let shot = SyntheticShot {
                gauge_factor,
                wave_speed_m_s: wave_speed,
                time_step_s: time_step,
                samples,
                baseline_v: baseline,
                noise_v: noise,
                seed,
                channel,
                inverted,
                bar: config.bar.clone(),
                ..SyntheticShot::default()
            };
            run_synth(&shot, &config, &output)
        }
        Commands::DumpFixtures => run_dump(&catalog),
    }
}

fn configured(mut config: AppConfig, setup: &SetupArgs) -> Result<AppConfig> {
    setup.apply(&mut config);
    config.validate().context("validating setup")?;
    Ok(config)
}

fn run_compute(
    catalog: &FixtureCatalog,
    config: AppConfig,
    input: &str,
    channel: Option<usize>,
    format: OutputFormat,
    output_path: Option<PathBuf>,
    override_expect: Option<PathBuf>,
) -> Result<ExitCode> {
    let data = catalog.load(input, None)?;
    let expectations = match override_expect {
        Some(path) => Some(load_expectations(&path)?),
        None => data.expectations,
    };
    let channel = channel
        .or_else(|| expectations.as_ref().and_then(|e| e.channel))
        .unwrap_or(1);

    let result = GaugeFactorCalculator::new(config)
        .compute(&data.record, channel)
        .with_context(|| format!("processing {}", data.metadata.csv_path.display()))?;

    let report = ShotReport::new(&data.record, channel, &result);
    let rendered = match format {
        OutputFormat::Text => report.to_text(),
        OutputFormat::Json => report.to_json()?,
    };
    emit(&rendered, output_path.as_deref())?;

    match expectations {
        Some(expectations) if !expectations.applies_to(channel) => {
            tracing::warn!(
                "[Compute] Expectations are for channel {:?}, not channel {}; skipping check",
                expectations.channel,
                channel
            );
            Ok(ExitCode::from(0))
        }
        Some(expectations) => match expectations.verify(&result) {
            Ok(()) => Ok(ExitCode::from(0)),
            Err(diff) => {
                emit_diff(&diff)?;
                Ok(ExitCode::from(2))
            }
        },
        None => Ok(ExitCode::from(0)),
    }
}

fn run_batch(
    catalog: &FixtureCatalog,
    config: AppConfig,
    channel: usize,
    format: OutputFormat,
) -> Result<ExitCode> {
    let recordings = catalog.discover()?;
    if recordings.is_empty() {
        bail!("No .csv recordings found under {}", catalog.root().display());
    }

    let calculator = GaugeFactorCalculator::new(config);
    let mut failed = 0usize;

    for metadata in &recordings {
        // Expectations are not checked here, so only the recording is read
        let outcome = load_csv(&metadata.csv_path, &calculator.config().recording)
            .map_err(anyhow::Error::from)
            .and_then(|record| {
                calculator
                    .compute(&record, channel)
                    .map(|result| (record, result))
                    .map_err(anyhow::Error::from)
            });

        match (outcome, format) {
            (Ok((record, result)), OutputFormat::Text) => {
                print!("{}", ShotReport::new(&record, channel, &result).to_text());
            }
            (Ok((_, result)), OutputFormat::Json) => {
                let line = BatchLine::success(&metadata.name, channel, &result);
                println!("{}", serde_json::to_string(&line)?);
            }
            (Err(err), OutputFormat::Text) => {
                failed += 1;
                eprintln!("{}: {:#}", metadata.name, err);
            }
            (Err(err), OutputFormat::Json) => {
                failed += 1;
                let line = BatchLine::failure(&metadata.name, channel, &err);
                println!("{}", serde_json::to_string(&line)?);
            }
        }
    }

    eprintln!(
        "Processed {} recordings, {} failed",
        recordings.len(),
        failed
    );
    Ok(ExitCode::from(if failed == 0 { 0 } else { 1 }))
}

fn run_synth(shot: &SyntheticShot, config: &AppConfig, output: &Path) -> Result<ExitCode> {
    let record = shot.generate()?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("creating output directory")?;
    }
    let file =
        fs::File::create(output).with_context(|| format!("creating {}", output.display()))?;
    write_csv(&record, file, &config.recording)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote synthetic shot to {} (gauge factor {}, wave speed {} m/s, transit {} samples)",
        output.display(),
        shot.gauge_factor,
        shot.wave_speed_m_s,
        shot.transit_samples()
    );
    Ok(ExitCode::from(0))
}

fn run_dump(catalog: &FixtureCatalog) -> Result<ExitCode> {
    let fixtures = catalog.discover()?;
    if fixtures.is_empty() {
        println!("No fixtures found under {}", catalog.root().display());
        return Ok(ExitCode::from(0));
    }

    for metadata in fixtures {
        if let Some(expect) = metadata.expect_path {
            println!("{} -> {}", metadata.name, expect.display());
        } else {
            println!("{}", metadata.name);
        }
    }
    Ok(ExitCode::from(0))
}

fn emit(rendered: &str, output_path: Option<&Path>) -> Result<()> {
    if let Some(path) = output_path {
        fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?;
    } else {
        print!("{rendered}");
        if !rendered.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct BatchLine<'a> {
    shot: &'a str,
    channel: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    gauge_factor: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    wave_speed_m_s: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> BatchLine<'a> {
    fn success(shot: &'a str, channel: usize, result: &GaugeFactorResult) -> Self {
        Self {
            shot,
            channel,
            gauge_factor: Some(result.gauge_factor),
            wave_speed_m_s: Some(result.wave_speed_m_s),
            error_code: None,
            error: None,
        }
    }

    fn failure(shot: &'a str, channel: usize, err: &anyhow::Error) -> Self {
        let error_code = err
            .downcast_ref::<GaugeFactorError>()
            .map(|e| e.code())
            .or_else(|| err.downcast_ref::<SignalError>().map(|e| e.code()));
        Self {
            shot,
            channel,
            gauge_factor: None,
            wave_speed_m_s: None,
            error_code,
            error: Some(format!("{err:#}")),
        }
    }
}
