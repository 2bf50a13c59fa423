use clap::Parser;
use rego_check::adapters::batch;
use rego_check::api::{self, AppState};
use rego_check::utils::error::{ErrorSeverity, RegoError};
use rego_check::utils::logger::{init_logger, LogFormat};
use rego_check::utils::validation::Validate;
use rego_check::{App, AppConfig, AuState, CheckOutcome, Cli, Command, Result, VehicleInfo};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    init_logger(format, cli.verbose);
    tracing::debug!("CLI arguments: {:?}", cli);

    if let Err(e) = run(cli).await {
        tracing::error!(
            "rego-check failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("Error: {}", e.user_friendly_message());
        eprintln!("Suggestion: {}", e.recovery_suggestion());
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(e: &RegoError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

async fn run(cli: Cli) -> Result<()> {
    cli.validate()?;
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let app = App::start(&config).await?;
    let outcome = match cli.command() {
        Command::Serve { .. } => {
            let state = AppState::new(
                app.service.clone(),
                Duration::from_secs(config.server.request_timeout_seconds),
            )?;
            api::serve(state, &config.server).await
        }
        Command::Check { state, plate, json } => check_one(&app, &state, &plate, json).await,
        Command::Interactive { state } => interactive(&app, &state).await,
        Command::Batch { input, output } => {
            let summary = batch::run_batch(app.service.clone(), &input, output.as_deref()).await?;
            eprintln!(
                "Checked {} plates: {} registered, {} failed",
                summary.total, summary.registered, summary.failed
            );
            Ok(())
        }
    };

    if let Err(e) = app.shutdown().await {
        tracing::warn!("ChromeDriver shutdown failed: {}", e);
    }
    outcome
}

async fn check_one(app: &App, state: &str, plate: &str, json: bool) -> Result<()> {
    let code: AuState = state.parse()?;
    let info = app.service.get_vehicle_info(state, plate).await;
    if json {
        let outcome = CheckOutcome::new(code, plate.trim().to_uppercase(), info);
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_result(plate, code, &info);
    }
    Ok(())
}

async fn interactive(app: &App, state: &str) -> Result<()> {
    let code: AuState = state.parse()?;
    println!("Checking {} registrations. Type 'quit' to exit.", code);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("Enter plate: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let plate = line.trim();
        if plate.is_empty() {
            continue;
        }
        if plate.eq_ignore_ascii_case("quit") || plate.eq_ignore_ascii_case("exit") {
            break;
        }

        let info = app.service.get_vehicle_info(code.code(), plate).await;
        print_result(plate, code, &info);
    }
    Ok(())
}

fn print_result(plate: &str, state: AuState, info: &VehicleInfo) {
    println!("Results for {} ({})", plate.trim().to_uppercase(), state);
    println!("  Status: {}", info.status);
    println!("  Make:   {}", info.make);
    println!("  Model:  {}", info.model);
    println!("  Colour: {}", info.colour);
    println!("  Year:   {}", info.year);
    if let Some(note) = &info.error {
        println!("  Notes:  {}", note);
    }
}
