//! # csb
//!
//! Client pour le jeu USDA Crop Sequence Boundaries (CSB) publié au format
//! fiboa GeoParquet sur Source Cooperative. Résout des critères logiques
//! (régions, cultures, bornes de surface) en prédicats concrets, pousse le
//! filtrage côté serveur via DuckDB, et normalise le résultat en parcelles
//! validées, en coordonnées géographiques (EPSG:4326).
//!
//! ## Features
//!
//! - Pushdown des prédicats vers le GeoParquet distant (DuckDB `spatial` + `httpfs`)
//! - Surfaces en acres via la projection équivalente Albers (EPSG:5070)
//! - Profils de schéma versionnés pour absorber la dérive du jeu amont
//! - Passe de validation avant persistance (géométries, colonnes, CRS)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use csb::{Downloader, FieldBoundaryDownloader, FilterCriteria, SchemaProfile};
//!
//! let profile = SchemaProfile::from_preset("fiboa")?;
//! let mut downloader = FieldBoundaryDownloader::new(profile);
//!
//! let criteria = FilterCriteria {
//!     count: 10,
//!     regions: vec!["corn_belt".to_string()],
//!     ..Default::default()
//! };
//!
//! let fields = downloader.download(&criteria)?;
//! assert!(downloader.validate(&fields));
//! for field in &fields.records {
//!     println!("{}: {:.1} acres", field.field_id, field.area_acres);
//! }
//! ```

pub mod area;
pub mod downloader;
pub mod error;
pub mod filter;
pub mod query;
pub mod reproject;
pub mod schema;
pub mod types;
pub mod validate;

pub use downloader::{Downloader, FieldBoundaryDownloader, DEFAULT_OVERSAMPLE};
pub use error::{CsbError, ExtractError, FilterError};
pub use filter::{FilterCriteria, ResolvedFilter};
pub use schema::SchemaProfile;
pub use types::{Crs, FieldCollection, FieldRecord};
pub use validate::validate;
