//! Types d'erreurs pour le crate csb

use thiserror::Error;

/// Erreurs de validation des critères fournis par l'appelant.
///
/// Toujours levées avant tout appel distant, jamais réessayées.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Nombre de parcelles demandé invalide
    #[error("count must be at least 1 (got {0})")]
    InvalidCount(i64),

    /// Aucune région demandée
    #[error("regions cannot be empty")]
    EmptyRegions,

    /// Régions inconnues des tables de correspondance
    #[error("invalid regions: {invalid:?}, valid options: {valid:?}")]
    InvalidRegions {
        invalid: Vec<String>,
        valid: Vec<&'static str>,
    },

    /// Cultures inconnues des tables de correspondance
    #[error("invalid crops: {invalid:?}, valid options: {valid:?}")]
    InvalidCrops {
        invalid: Vec<String>,
        valid: Vec<&'static str>,
    },

    /// Bornes de surface incohérentes
    #[error("invalid acreage bounds: expected 0 <= min <= max, got min={min:?} max={max:?}")]
    InvalidBounds { min: Option<f64>, max: Option<f64> },
}

/// Erreurs d'extraction distante.
///
/// Terminales pour l'appel en cours; la cause sous-jacente est
/// conservée, jamais réessayée automatiquement.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Échec d'ouverture de la connexion ou du chargement des extensions
    #[error("failed to initialize DuckDB connection: {0}")]
    Connection(#[source] duckdb::Error),

    /// Échec de la requête distante
    #[error("remote query failed: {0}")]
    Query(#[from] duckdb::Error),

    /// Aucune ligne après filtrage
    #[error("no fields found matching criteria, try different regions/crops or adjust filters")]
    NoMatchingData,

    /// Profil de schéma incohérent (colonne manquante pour le mode demandé)
    #[error("invalid schema profile: {0}")]
    InvalidProfile(String),

    /// Géométrie WKB illisible
    #[error("failed to decode geometry for {field_id}: {reason}")]
    GeometryDecode { field_id: String, reason: String },

    /// Échec de reprojection
    #[error("reprojection failed: {0}")]
    Reprojection(String),
}

impl ExtractError {
    /// Crée une erreur de décodage de géométrie avec contexte
    pub fn geometry_decode(field_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::GeometryDecode {
            field_id: field_id.into(),
            reason: reason.into(),
        }
    }
}

/// Somme des deux taxonomies pour la surface `Downloader`
#[derive(Debug, Error)]
pub enum CsbError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}
