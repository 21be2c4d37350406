use cadet::adapters::CosmosConnector;
use cadet::domain::ports::ProgressObserver;
use cadet::utils::logger;
use cadet::utils::progress::{BarProgress, NoopProgress};
use cadet::{app, Cli, Commands, ImportArgs, ImportSummary, Result};
use clap::Parser;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import(args) => {
            if args.log_json {
                logger::init_json_logger(args.verbose);
            } else {
                logger::init_cli_logger(args.verbose);
            }
            tracing::debug!("Import source: {}", args.source.display());

            match import(&args).await {
                Ok(summary) => {
                    tracing::info!(
                        "✅ Import finished: {} records upserted into {}/{}",
                        summary.records_upserted,
                        args.database_name,
                        args.collection_name
                    );
                    println!("Upload complete!");
                }
                Err(e) => {
                    tracing::error!("❌ Import failed: {} (Kind: {:?})", e, e.kind());
                    eprintln!("❌ {}", e.user_friendly_message());
                    eprintln!("💡 {}", e.recovery_suggestion());
                    std::process::exit(e.exit_code());
                }
            }
        }
    }
}

async fn import(args: &ImportArgs) -> Result<ImportSummary> {
    let settings = args.load_settings()?;
    let connector = CosmosConnector::new(settings.http.clone());

    let progress: Box<dyn ProgressObserver> = if args.no_progress {
        Box::new(NoopProgress)
    } else {
        Box::new(BarProgress::new("Uploading"))
    };

    app::run_import(args, &settings, &connector, progress).await
}
