use anyhow::Context;
use clap::Parser;
use std::io::{self, Write};
use vehicle_rental::app::{report, Shell};
use vehicle_rental::config::{Command, LogFormat};
use vehicle_rental::core::ConfigProvider;
use vehicle_rental::utils::{logger, validation::Validate};
use vehicle_rental::{CliConfig, FlatFileStorage, RecordStore, RentalEngine, TomlConfig};

fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    let mut config = match TomlConfig::load_or_default(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load config file '{}': {}",
                cli.config.display(),
                e
            );
            eprintln!("💡 Make sure the file is valid TOML");
            std::process::exit(1);
        }
    };
    cli.apply_overrides(&mut config);

    match config.logging.format {
        LogFormat::Compact => logger::init_cli_logger(cli.verbose, config.logging.level.as_deref()),
        LogFormat::Json => logger::init_json_logger(cli.verbose, config.logging.level.as_deref()),
    }
    tracing::debug!("Effective config: {:?}", config);

    if let Err(e) = config.validate() {
        tracing::error!("Configuration validation failed: {}", e);
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let storage = FlatFileStorage::from_config(&config);
    tracing::info!(
        "Using data directory {} ({:?})",
        config.data_dir().display(),
        config.persist_mode()
    );
    let store = RecordStore::open(storage, config.persist_mode())
        .context("failed to open the rental store")?;
    let engine = RentalEngine::new(store);

    match cli.command {
        None => {
            let stdin = io::stdin();
            let mut shell = Shell::new(&engine, stdin.lock(), io::stdout());
            shell.run().context("interactive session failed")?;
        }
        Some(command) => {
            let output = render(&engine, command)?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn render(
    engine: &RentalEngine<FlatFileStorage>,
    command: Command,
) -> vehicle_rental::Result<String> {
    let store = engine.store();
    let output = match command {
        Command::Vehicles { available, json } => {
            let vehicles: Vec<_> = if available {
                store.available_vehicles().collect()
            } else {
                store.vehicles().iter().collect()
            };
            if json {
                report::to_json(&vehicles)?
            } else {
                report::vehicle_table(vehicles)
            }
        }
        Command::Customers { json } => {
            if json {
                report::to_json(store.customers())?
            } else {
                report::customer_list(store.customers())
            }
        }
        Command::History {
            customer,
            plate,
            json,
        } => {
            let records: Vec<_> = match (customer, plate) {
                (Some(name), _) => store.records_by_customer(&name),
                (None, Some(plate)) => store.records_by_vehicle(&plate),
                (None, None) => store.records().iter().collect(),
            };
            if json {
                report::to_json(&records)?
            } else {
                report::history(records)
            }
        }
    };
    Ok(if output.ends_with('\n') {
        output
    } else {
        format!("{}\n", output)
    })
}
