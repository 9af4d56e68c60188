use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use log::debug;

use voice_anonymizer::{AnonymizeError, RateMode, Settings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RateModeArg {
    /// Process at the rate declared by the input file
    Input,
    /// Process at 44100 Hz regardless of the input
    Fixed,
}

impl From<RateModeArg> for RateMode {
    fn from(arg: RateModeArg) -> Self {
        match arg {
            RateModeArg::Input => RateMode::Input,
            RateModeArg::Fixed => RateMode::Fixed,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "voice-anonymizer")]
#[command(about = "Obfuscate a voice recording: pitch shift, tempo change and uniform noise")]
#[command(version)]
struct Cli {
    /// Input WAV file [default: input.wav]
    input: Option<PathBuf>,

    /// Output WAV file [default: output_anonymized.wav]
    output: Option<PathBuf>,

    /// Pitch shift in semitones [default: 5.0]
    #[arg(long, short = 'p', allow_negative_numbers = true)]
    pitch: Option<f64>,

    /// Tempo change in percent [default: 10.0]
    #[arg(long, short = 't', allow_negative_numbers = true)]
    tempo: Option<f64>,

    /// Noise amplitude as a fraction of full scale [default: 0.02]
    #[arg(long, short = 'n', allow_negative_numbers = true)]
    noise: Option<f32>,

    /// Seed the noise generator for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Sample rate used for processing [default: input]
    #[arg(long, value_enum)]
    rate_mode: Option<RateModeArg>,

    /// JSON settings file; command-line flags override its values
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Merges defaults, the optional settings file, and explicit flags.
    fn settings(&self) -> Result<Settings, AnonymizeError> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        if let Some(input) = &self.input {
            settings.input = input.clone();
        }
        if let Some(output) = &self.output {
            settings.output = output.clone();
        }
        if let Some(pitch) = self.pitch {
            settings.pitch_semitones = pitch;
        }
        if let Some(tempo) = self.tempo {
            settings.tempo_percent = tempo;
        }
        if let Some(noise) = self.noise {
            settings.noise_level = noise;
        }
        if let Some(seed) = self.seed {
            settings.seed = Some(seed);
        }
        if let Some(mode) = self.rate_mode {
            settings.rate_mode = mode.into();
        }
        Ok(settings)
    }

    fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    let settings = match cli.settings() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Settings: {}", settings.to_json());

    match voice_anonymizer::run(&settings) {
        Ok(report) => {
            debug!(
                "{} -> {} frames, {} ch, {} Hz (processed at {} Hz)",
                report.input_frames,
                report.output_frames,
                report.channels,
                report.sample_rate,
                report.processing_rate
            );
            println!(
                "Audio anonymization complete. Output saved to {}",
                settings.output.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
