use anyhow::Context;
use clap::Parser;
use pharmacy_locator::app::commands;
use pharmacy_locator::domain::ports::ConfigProvider;
use pharmacy_locator::utils::error::{ErrorSeverity, LocatorError};
use pharmacy_locator::utils::{logger, validation::Validate};
use pharmacy_locator::{CliConfig, FileStore, PharmacyEngine};

fn exit_code(error: &LocatorError) -> i32 {
    match error.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(error: LocatorError) -> ! {
    tracing::error!(
        "❌ {} (Severity: {:?})",
        error,
        error.severity()
    );
    eprintln!("❌ {}", error.user_friendly_message());
    eprintln!("💡 {}", error.recovery_suggestion());
    std::process::exit(exit_code(&error));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let settings = match cli.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if settings.json_logs() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pharmacy-locator");
    tracing::debug!("Effective settings: {:?}", settings);

    if let Err(e) = settings.validate().and_then(|_| cli.command.validate()) {
        fail(e);
    }

    let store = match FileStore::open(settings.dataset_path()).await {
        Ok(store) => store,
        Err(e) => fail(LocatorError::storage("Failed to load dataset", e)),
    };
    let engine = PharmacyEngine::new(store);

    match commands::execute(&engine, &cli.command, &settings).await {
        Ok(output) => {
            let rendered =
                serde_json::to_string_pretty(&output).context("Failed to render output")?;
            println!("{}", rendered);
        }
        Err(e) => fail(e),
    }

    Ok(())
}
