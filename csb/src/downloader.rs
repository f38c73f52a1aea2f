//! Téléchargement de parcelles depuis le GeoParquet distant
//!
//! Accède au jeu USDA Crop Sequence Boundaries hébergé sur Source
//! Cooperative via DuckDB (extensions `spatial` et `httpfs`): une seule
//! requête pushdown par extraction, matérialisée entièrement, puis décode
//! WKB -> surface -> reprojection -> harmonisation. Synchrone et bloquant;
//! la connexion partagée n'a pas de verrou interne, un downloader par
//! thread.

use std::path::Path;

use duckdb::Connection;
use geo::Geometry;
use geozero::ToGeo;
use tracing::{debug, info, warn};

use crate::area::{self, ALBERS_CONUS_EPSG, WGS84_EPSG};
use crate::error::{CsbError, ExtractError};
use crate::filter::{region_for_fips, FilterCriteria, ResolvedFilter};
use crate::query;
use crate::reproject::Reprojector;
use crate::schema::SchemaProfile;
use crate::types::{FieldCollection, FieldRecord};
use crate::validate;

/// Facteur de sur-échantillonnage par défaut
pub const DEFAULT_OVERSAMPLE: f64 = 2.0;

/// Capacité commune des downloaders de données.
///
/// Tout composant qui sait télécharger selon des critères et contrôler le
/// résultat est interchangeable ici; pas d'héritage d'implémentation.
pub trait Downloader {
    /// Télécharge selon les critères et retourne la collection harmonisée
    fn download(&mut self, criteria: &FilterCriteria) -> Result<FieldCollection, CsbError>;

    /// Contrôle de validité avant persistance (ne lève jamais)
    fn validate(&self, data: &FieldCollection) -> bool {
        validate::validate(data)
    }
}

/// Ligne brute matérialisée depuis DuckDB, avant décodage
struct RawRow {
    field_id: String,
    state_fips: String,
    crop_code: String,
    crop_name: Option<String>,
    crop_code_list: Option<String>,
    wkb: Vec<u8>,
}

/// Downloader de parcelles USDA Crop Sequence Boundaries
pub struct FieldBoundaryDownloader {
    profile: SchemaProfile,
    oversample: f64,
    conn: Option<Connection>,
}

impl FieldBoundaryDownloader {
    /// Crée un downloader pour un profil de schéma donné
    pub fn new(profile: SchemaProfile) -> Self {
        Self {
            profile,
            oversample: DEFAULT_OVERSAMPLE,
            conn: None,
        }
    }

    /// Ajuste le facteur de sur-échantillonnage (>= 1)
    pub fn with_oversample(mut self, factor: f64) -> Self {
        self.oversample = factor.max(1.0);
        self
    }

    pub fn profile(&self) -> &SchemaProfile {
        &self.profile
    }

    /// Connexion DuckDB paresseuse, créée une fois et réutilisée.
    /// Idempotent, pas thread-safe.
    fn connection(&mut self) -> Result<&Connection, ExtractError> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => {
                let conn = Connection::open_in_memory().map_err(ExtractError::Connection)?;
                conn.execute_batch(
                    "INSTALL spatial; LOAD spatial; INSTALL httpfs; LOAD httpfs;",
                )
                .map_err(ExtractError::Connection)?;
                debug!("DuckDB connection initialized with spatial extensions");
                conn
            }
        };
        Ok(self.conn.insert(conn))
    }

    /// Ferme explicitement la connexion (sinon libérée au drop)
    pub fn close(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err((_, e)) = conn.close() {
                warn!("Failed to close DuckDB connection: {}", e);
            }
        }
    }

    /// Exécute la requête et matérialise toutes les lignes
    fn run_query(&mut self, sql: &str) -> Result<Vec<RawRow>, ExtractError> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        let mut raw = Vec::new();
        while let Some(row) = rows.next()? {
            raw.push(RawRow {
                field_id: row.get(0)?,
                state_fips: row.get(1)?,
                crop_code: row.get(2)?,
                crop_name: row.get(3)?,
                crop_code_list: row.get(4)?,
                wkb: row.get(5)?,
            });
        }
        Ok(raw)
    }

    /// Extrait une collection de parcelles selon un filtre résolu.
    ///
    /// Une requête distante (ou une union par partition), puis décodage
    /// WKB, calcul de surface en acres via la projection équivalente,
    /// post-filtrage des géométries dégénérées, troncature à `count` et
    /// harmonisation du schéma de sortie.
    ///
    /// # Errors
    ///
    /// `ExtractError` si la requête échoue, si une géométrie est
    /// illisible, ou si aucune ligne ne subsiste après filtrage.
    pub fn extract(&mut self, filter: &ResolvedFilter) -> Result<FieldCollection, ExtractError> {
        let sql = query::build_select(&self.profile, filter, self.oversample)?;
        debug!(sql = %sql, "Executing DuckDB query");
        info!(
            "Querying {} (this may take 10-30 seconds)...",
            self.profile.url
        );

        let raw_rows = self.run_query(&sql)?;
        if raw_rows.is_empty() {
            return Err(ExtractError::NoMatchingData);
        }
        info!("Retrieved {} candidate fields", raw_rows.len());

        let native_epsg = self.profile.native_epsg;
        let area_reprojector = (native_epsg != ALBERS_CONUS_EPSG)
            .then(|| Reprojector::new(native_epsg, ALBERS_CONUS_EPSG))
            .transpose()?;
        let output_reprojector = (native_epsg != WGS84_EPSG)
            .then(|| Reprojector::new(native_epsg, WGS84_EPSG))
            .transpose()?;

        let sampled = raw_rows.len();
        let mut records: Vec<FieldRecord> = Vec::with_capacity(sampled.min(filter.count));

        for raw in raw_rows {
            let geometry = decode_wkb(&raw.field_id, &raw.wkb)?;

            // Surface dans la projection équivalente (directe quand le
            // stockage natif est déjà en Albers)
            let area_acres = match &area_reprojector {
                None => area::area_acres(&geometry),
                Some(reprojector) => {
                    area::area_acres(&reprojector.transform_geometry(&geometry)?)
                }
            };

            if area_acres <= 0.0 {
                continue;
            }
            if filter.min_acres.is_some_and(|min| area_acres < min) {
                continue;
            }
            if filter.max_acres.is_some_and(|max| area_acres > max) {
                continue;
            }

            let geometry = match &output_reprojector {
                None => geometry,
                Some(reprojector) => reprojector.transform_geometry(&geometry)?,
            };

            records.push(FieldRecord {
                field_id: raw.field_id,
                region: String::new(), // harmonisé plus bas
                state_fips: raw.state_fips,
                area_acres,
                crop_code: raw.crop_code,
                crop_name: raw.crop_name,
                crop_code_list: raw.crop_code_list,
                geometry,
            });
        }

        let dropped = sampled - records.len();
        if dropped > 0 {
            warn!("Filtered out {} fields with zero area or out of bounds", dropped);
        }
        if records.is_empty() {
            return Err(ExtractError::NoMatchingData);
        }

        records.truncate(filter.count);
        label_regions(&mut records, &filter.regions);

        Ok(FieldCollection::harmonized(records))
    }

    /// Produit une fixture GeoParquet locale avec les colonnes d'origine,
    /// interrogeable ensuite avec le même profil (URL pointée sur le
    /// fichier)
    pub fn export_sample(
        &mut self,
        filter: &ResolvedFilter,
        output: &Path,
    ) -> Result<(), ExtractError> {
        let sql =
            query::build_sample_copy(&self.profile, filter, &output.display().to_string())?;
        debug!(sql = %sql, "Executing DuckDB COPY");
        let conn = self.connection()?;
        conn.execute_batch(&sql)?;
        info!("Sample fixture written to {}", output.display());
        Ok(())
    }
}

impl Downloader for FieldBoundaryDownloader {
    fn download(&mut self, criteria: &FilterCriteria) -> Result<FieldCollection, CsbError> {
        info!(
            "Starting field boundary download: {} fields from Source Cooperative",
            criteria.count
        );

        let resolved = criteria.resolve()?;
        info!(regions = ?resolved.regions, "Resolved {} state FIPS codes", resolved.state_fips.len());
        debug!("Requested crop codes (CDL): {:?}", resolved.crop_codes);

        let collection = self.extract(&resolved)?;
        info!("Downloaded {} fields", collection.len());
        Ok(collection)
    }
}

impl Drop for FieldBoundaryDownloader {
    fn drop(&mut self) {
        self.close();
    }
}

/// Décode une géométrie WKB en types geo; seules les géométries surfaciques
/// sont acceptées
fn decode_wkb(field_id: &str, buf: &[u8]) -> Result<Geometry, ExtractError> {
    let geometry = geozero::wkb::Wkb(buf.to_vec())
        .to_geo()
        .map_err(|e| ExtractError::geometry_decode(field_id, e.to_string()))?;

    match geometry {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) => Ok(geometry),
        other => Err(ExtractError::geometry_decode(
            field_id,
            format!("expected Polygon or MultiPolygon, got {:?}", kind(&other)),
        )),
    }
}

fn kind(geometry: &Geometry) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

/// Harmonisation du label de région: référence inverse FIPS -> région,
/// restreinte aux régions demandées. Hors ensemble demandé: "mixed" si
/// plusieurs régions, sinon la région unique demandée.
fn label_regions(records: &mut [FieldRecord], requested: &[String]) {
    let multiple = requested.len() > 1;
    for record in records {
        record.region = match region_for_fips(&record.state_fips) {
            Some(region) if requested.iter().any(|r| r == region) => region.to_string(),
            _ if multiple => "mixed".to_string(),
            _ => requested[0].clone(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, Polygon};

    fn record(field_id: &str, fips: &str) -> FieldRecord {
        FieldRecord {
            field_id: field_id.to_string(),
            region: String::new(),
            state_fips: fips.to_string(),
            area_acres: 100.0,
            crop_code: "1".to_string(),
            crop_name: Some("Corn".to_string()),
            crop_code_list: None,
            geometry: Geometry::Polygon(Polygon::new(
                LineString::from(vec![
                    (0.0, 0.0),
                    (1.0, 0.0),
                    (1.0, 1.0),
                    (0.0, 1.0),
                    (0.0, 0.0),
                ]),
                vec![],
            )),
        }
    }

    #[test]
    fn test_label_regions_single_region() {
        let mut records = vec![record("19001", "19"), record("99001", "99")];
        label_regions(&mut records, &["corn_belt".to_string()]);

        assert_eq!(records[0].region, "corn_belt");
        // code hors table: retombe sur l'unique région demandée
        assert_eq!(records[1].region, "corn_belt");
    }

    #[test]
    fn test_label_regions_multiple_regions() {
        let mut records = vec![
            record("19001", "19"),
            record("48001", "48"),
            record("99001", "99"),
        ];
        label_regions(
            &mut records,
            &["corn_belt".to_string(), "great_plains".to_string()],
        );

        assert_eq!(records[0].region, "corn_belt");
        assert_eq!(records[1].region, "great_plains");
        assert_eq!(records[2].region, "mixed");
    }

    #[test]
    fn test_label_regions_outside_requested_set() {
        // FIPS 13 (southeast) alors que corn_belt + great_plains demandées
        let mut records = vec![record("13001", "13")];
        label_regions(
            &mut records,
            &["corn_belt".to_string(), "great_plains".to_string()],
        );
        assert_eq!(records[0].region, "mixed");
    }

    #[test]
    fn test_decode_wkb_rejects_garbage() {
        let err = decode_wkb("f1", &[0x00, 0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ExtractError::GeometryDecode { .. }));
    }

    #[test]
    fn test_downloader_builder() {
        let profile = SchemaProfile::from_preset("fiboa").unwrap();
        let downloader = FieldBoundaryDownloader::new(profile).with_oversample(0.5);
        // le facteur est borné à 1 minimum
        assert!(downloader.oversample >= 1.0);
        assert_eq!(downloader.profile().native_epsg, 5070);
    }
}
