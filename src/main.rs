//! vocalprep CLI entry point
//!
//! stdout carries exactly one JSON document; logs go to stderr.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;
use vocalprep::config::{Cli, Command, Settings};
use vocalprep::pipeline::{self, BatchOptions};
use vocalprep::VocalSeparationService;

/// Exit code for unparseable arguments, matching clap's own
const USAGE_EXIT: u8 = 2;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            use clap::error::ErrorKind;
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                // --help / --version print normally
                let _ = e.print();
                return ExitCode::SUCCESS;
            }
            print_error(&e.render().to_string());
            return ExitCode::from(USAGE_EXIT);
        }
    };

    init_logging(&cli);

    if let Err(e) = validate_inputs(&cli) {
        print_error(&e);
        return ExitCode::FAILURE;
    }

    let settings = Settings::from_cli(&cli);

    let service = match VocalSeparationService::from_settings(&settings) {
        Ok(service) => service,
        Err(e) => {
            print_error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let code = run(&cli.command, &service, &settings);
    service.shutdown();
    code
}

fn run(command: &Command, service: &VocalSeparationService, settings: &Settings) -> ExitCode {
    match command {
        Command::Analyze { audio_file } => print_json(&service.analyze(audio_file)),
        Command::Separate {
            audio_file,
            output_dir,
            prefix,
        } => print_json(&service.separate(audio_file, output_dir, prefix)),
        Command::Process {
            audio_file,
            song_title,
            output_dir,
        } => print_json(&service.process(audio_file, song_title, output_dir)),
        Command::Batch {
            input, output_dir, ..
        } => {
            let options = BatchOptions {
                input: input.clone(),
                output_dir: output_dir.clone(),
                recursive: settings.recursive,
                threads: settings.threads,
                show_progress: settings.show_progress,
            };
            match pipeline::run_batch(service, &options) {
                Ok(outcome) => print_json(&BatchOutput {
                    summary: outcome.summary,
                    report: outcome.report_path.map(|p| p.display().to_string()),
                }),
                Err(e) => {
                    error!("Batch failed: {}", e);
                    print_error(&e.to_string());
                    ExitCode::FAILURE
                }
            }
        }
    }
}

#[derive(Serialize)]
struct BatchOutput {
    #[serde(flatten)]
    summary: vocalprep::export::BatchSummary,
    report: Option<String>,
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&format!("Failed to serialize result: {}", e));
            ExitCode::FAILURE
        }
    }
}

fn print_error(message: &str) {
    let payload = serde_json::json!({ "error": message.trim_end() });
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
    );
}

fn init_logging(cli: &Cli) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter())),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    let input = cli.command.input();
    if !input.exists() {
        return Err(format!("Input path does not exist: {}", input.display()));
    }

    if let Command::Process { song_title, .. } = &cli.command {
        if song_title.trim().is_empty() {
            return Err("Song title must not be empty".to_string());
        }
    }

    Ok(())
}
