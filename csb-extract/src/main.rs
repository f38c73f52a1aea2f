//! Point d'entrée CLI pour csb-extract

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;
mod config;
mod export;
mod report;

use cli::{Commands, DownloadArgs};

/// Extraire des parcelles USDA Crop Sequence Boundaries vers GeoJSON ou Shapefile
#[derive(Parser)]
#[command(name = "csb-extract")]
#[command(author, version)]
#[command(about = "Extraire des parcelles USDA Crop Sequence Boundaries (défaut: download)")]
#[command(
    long_about = "Interroge le jeu USDA Crop Sequence Boundaries (GeoParquet fiboa sur Source Cooperative) avec filtrage poussé côté serveur, et produit un extrait local validé en GeoJSON ou Shapefile."
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: download)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments pour la commande download (commande par défaut)
    #[command(flatten)]
    download: Option<DownloadArgs>,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Download(args)) => {
            info!(count = ?args.count, regions = ?args.regions, "Download");
            cli::cmd_download(&args)?;
        }
        Some(Commands::Validate { path }) => {
            info!(path = %path.display(), "Validate");
            if cli::cmd_validate(&path)? {
                println!("Validation passed: {}", path.display());
            } else {
                eprintln!("Validation failed: {}", path.display());
                std::process::exit(1);
            }
        }
        Some(Commands::Sample { output, count, url }) => {
            info!(output = %output.display(), count, "Sample");
            cli::cmd_sample(&output, count, url.as_deref())?;
        }
        None => {
            // Commande par défaut: download
            let args = cli.download.unwrap_or_default();
            cli::cmd_download(&args)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
