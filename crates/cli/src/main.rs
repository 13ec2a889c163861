use anyhow::Context;
use biblio_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Library catalog inventory service.
#[derive(Debug, Parser)]
#[command(name = "biblio", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load BIBLIO settings")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
        }
        Command::Migrate => {
            biblio_telemetry::init(&settings.telemetry)?;
            let applied = biblio_app::bootstrap::migrate(&settings).await?;
            println!("applied {applied} migration(s)");
        }
        Command::Serve => {
            biblio_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "starting biblio server");
            biblio_app::bootstrap::serve(&settings).await?;
        }
    }

    Ok(())
}
