// alias-cli/src/commands/setup.rs
use crate::output::{print_error, print_success, ExitCode};
use alias_sync::{Config, FetchOutcome};
use anyhow::Result;
use dialoguer::Password;

/// Run the interactive setup command
pub async fn run_setup() -> Result<ExitCode> {
    println!("SimpleLogin CLI Setup");
    println!();

    // Env overrides must not end up in the saved file, and nothing is written
    // until the key checks out
    let mut config = Config::load_stored()?;

    // Prompt for API key
    let api_key = Password::new()
        .with_prompt("Enter your SimpleLogin API key")
        .interact()?;

    if api_key.trim().is_empty() {
        print_error("API key cannot be empty");
        return Ok(ExitCode::PermanentError);
    }

    println!();
    println!("Validating API key...");

    config.api_key = api_key.trim().to_string();
    let engine = alias_sync::connect(&config)?;
    let mut events = engine.subscribe();

    match engine.refresh().await {
        FetchOutcome::Failed(kind) => {
            let message = events
                .drain()
                .into_iter()
                .find_map(|e| match e {
                    alias_sync::SyncEvent::Error(err) => Some(err.message),
                    alias_sync::SyncEvent::Changed(_) => None,
                })
                .unwrap_or_else(|| kind.to_string());
            print_error(&message);
            eprintln!();
            eprintln!("Visit {}/dashboard/api_key", config.api_url);
            eprintln!("to create an API key.");
            Ok(ExitCode::for_kind(kind))
        }
        _ => {
            if let Err(e) = config.save() {
                print_error(&format!("Couldn't write config file: {}", e));
                return Ok(ExitCode::PermanentError);
            }

            println!();
            print_success(&format!(
                "API key saved ({} aliases on the first page)",
                engine.snapshot().total
            ));
            println!();
            println!("Try: aliases list");

            Ok(ExitCode::Success)
        }
    }
}
