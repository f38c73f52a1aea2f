//! # csb-extract
//!
//! Extraction de parcelles USDA Crop Sequence Boundaries vers GeoJSON ou
//! Shapefile.
//!
//! ## Features
//!
//! - Filtrage par région, culture et surface, poussé côté serveur
//! - Export GeoJSON (streaming geozero) et ESRI Shapefile
//! - Rapport d'extraction avec checksum blake3
//! - CLI simple
//!
//! ## Usage CLI
//!
//! ```bash
//! # 10 parcelles corn/soybeans de la corn belt, en GeoJSON
//! csb-extract --count 10 --regions corn_belt --crops corn,soybeans
//!
//! # Export shapefile avec bornes de surface
//! csb-extract download --count 50 --min-acres 50 --max-acres 200 -f shapefile
//!
//! # Contrôle d'un extrait existant
//! csb-extract validate --path data/raw/field_boundaries/fields.geojson
//! ```

pub mod config;
pub mod export;
pub mod report;

pub use config::Config;
pub use export::OutputFormat;
pub use report::ExtractReport;
