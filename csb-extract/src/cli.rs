//! Définition et implémentation des commandes CLI
//!
//! - `download`: extraction filtrée vers GeoJSON ou Shapefile (défaut)
//! - `validate`: repasse la passe de contrôle sur un extrait GeoJSON
//! - `sample`: produit une fixture GeoParquet locale pour les tests

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use tracing::info;

use csb::{Downloader, FieldBoundaryDownloader, FilterCriteria, SchemaProfile};

use crate::config::Config;
use crate::export::{self, OutputFormat};
use crate::report::ExtractReport;

#[derive(Subcommand)]
pub enum Commands {
    /// Download field boundaries into a local vector extract
    Download(DownloadArgs),

    /// Validate a previously produced GeoJSON extract
    Validate {
        /// Path to the GeoJSON file
        #[arg(short, long)]
        path: PathBuf,
    },

    /// Produce a small local GeoParquet fixture from the live dataset
    Sample {
        /// Output parquet path
        #[arg(short, long)]
        output: PathBuf,

        /// Number of fields to sample
        #[arg(short, long, default_value_t = 10)]
        count: i64,

        /// Dataset URL override
        #[arg(long)]
        url: Option<String>,
    },
}

/// Arguments de la commande download (commande par défaut)
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Number of fields to download (défaut: config fields.count)
    #[arg(short, long)]
    pub count: Option<i64>,

    /// Regions to sample from (corn_belt, great_plains, southeast)
    #[arg(short, long, value_delimiter = ',')]
    pub regions: Option<Vec<String>>,

    /// Crop types to include (corn, soybeans, wheat, cotton)
    #[arg(long, value_delimiter = ',')]
    pub crops: Option<Vec<String>>,

    /// Minimum field size in acres
    #[arg(long)]
    pub min_acres: Option<f64>,

    /// Maximum field size in acres
    #[arg(long)]
    pub max_acres: Option<f64>,

    /// Output format: geojson ou shapefile (défaut: config)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Path to a JSON config file (défaut: preset embarqué)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Schema profile: preset name (fiboa) or path to a JSON profile
    #[arg(long, default_value = "fiboa")]
    pub profile: String,

    /// Dataset URL override (supporte un fichier parquet local)
    #[arg(long)]
    pub url: Option<String>,

    /// Oversampling factor for the server-side query
    #[arg(long)]
    pub oversample: Option<f64>,

    /// Write a JSON report next to the extract
    #[arg(long)]
    pub report: bool,
}

impl Default for DownloadArgs {
    fn default() -> Self {
        Self {
            count: None,
            regions: None,
            crops: None,
            min_acres: None,
            max_acres: None,
            format: None,
            config: None,
            profile: "fiboa".to_string(),
            url: None,
            oversample: None,
            report: false,
        }
    }
}

/// Exécute la commande download
pub fn cmd_download(args: &DownloadArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;

    // Le format est contrôlé avant tout appel distant
    let format_name = args
        .format
        .clone()
        .unwrap_or_else(|| config.download().output_format.clone());
    let format: OutputFormat = format_name.parse().map_err(|e: String| anyhow!(e))?;

    let criteria = build_criteria(args, &config);
    let profile = load_profile(&args.profile, args.url.as_deref())?;
    let oversample = args.oversample.unwrap_or(config.download().oversample);

    let mut downloader = FieldBoundaryDownloader::new(profile).with_oversample(oversample);

    let start = Instant::now();
    let fields = downloader.download(&criteria)?;

    if !downloader.validate(&fields) {
        anyhow::bail!("Downloaded field data failed validation");
    }

    let output_path = export::save(&fields, format, &config)?;

    let mut report = ExtractReport::new(criteria.count as usize);
    report.record_saved(&fields);
    report.record_output(&output_path)?;
    report.set_duration(start.elapsed());
    report.display();

    if args.report {
        let report_path = output_path.with_extension("report.json");
        report.save_to_file(&report_path)?;
        info!("Report saved to: {}", report_path.display());
    }

    info!("Fields saved to: {}", output_path.display());
    Ok(())
}

/// Exécute la commande validate; retourne le verdict de la passe
pub fn cmd_validate(path: &Path) -> Result<bool> {
    let collection = crate::export::reader::read_geojson(path)?;
    info!(
        "Loaded {} fields from {}",
        collection.len(),
        path.display()
    );
    Ok(csb::validate(&collection))
}

/// Exécute la commande sample
pub fn cmd_sample(output: &Path, count: i64, url: Option<&str>) -> Result<()> {
    let profile = load_profile("fiboa", url)?;
    let criteria = FilterCriteria {
        count,
        ..Default::default()
    };
    let resolved = criteria.resolve()?;

    let mut downloader = FieldBoundaryDownloader::new(profile);
    downloader.export_sample(&resolved, output)?;

    println!("Sample fixture written to {}", output.display());
    Ok(())
}

/// Charge la configuration depuis un fichier ou le preset embarqué
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::embedded(),
    }
}

/// Fusionne les arguments CLI avec les défauts de la configuration
fn build_criteria(args: &DownloadArgs, config: &Config) -> FilterCriteria {
    FilterCriteria {
        count: args.count.unwrap_or(config.fields().count),
        regions: args
            .regions
            .clone()
            .unwrap_or_else(|| config.fields().regions.clone()),
        crops: Some(
            args.crops
                .clone()
                .unwrap_or_else(|| config.fields().crops.clone()),
        ),
        min_acres: args.min_acres,
        max_acres: args.max_acres,
    }
}

/// Résout un profil de schéma: nom de preset ou chemin JSON, avec URL
/// optionnellement substituée
fn load_profile(name_or_path: &str, url_override: Option<&str>) -> Result<SchemaProfile> {
    let mut profile = if name_or_path.ends_with(".json") {
        SchemaProfile::load(Path::new(name_or_path))?
    } else {
        SchemaProfile::from_preset(name_or_path)?
    };
    if let Some(url) = url_override {
        profile.url = url.to_string();
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_criteria_uses_config_defaults() {
        let config = Config::embedded().unwrap();
        let criteria = build_criteria(&DownloadArgs::default(), &config);

        assert_eq!(criteria.count, 200);
        assert_eq!(criteria.regions, ["corn_belt"]);
        assert_eq!(
            criteria.crops.as_deref(),
            Some(["corn".to_string(), "soybeans".to_string()].as_slice())
        );
    }

    #[test]
    fn test_build_criteria_cli_overrides_config() {
        let config = Config::embedded().unwrap();
        let args = DownloadArgs {
            count: Some(5),
            regions: Some(vec!["southeast".to_string()]),
            crops: Some(vec!["cotton".to_string()]),
            min_acres: Some(10.0),
            ..Default::default()
        };
        let criteria = build_criteria(&args, &config);

        assert_eq!(criteria.count, 5);
        assert_eq!(criteria.regions, ["southeast"]);
        assert_eq!(criteria.crops.as_deref(), Some(["cotton".to_string()].as_slice()));
        assert_eq!(criteria.min_acres, Some(10.0));
    }

    #[test]
    fn test_load_profile_preset_with_url_override() {
        let profile = load_profile("fiboa", Some("/tmp/fixture.parquet")).unwrap();
        assert_eq!(profile.url, "/tmp/fixture.parquet");
        assert_eq!(profile.id_col, "id");
    }

    #[test]
    fn test_load_profile_unknown_preset() {
        assert!(load_profile("nope", None).is_err());
    }
}
