//! Reprojection de géométries avec PROJ
//!
//! Ce module est disponible uniquement avec le feature `reproject`.
//! Le pipeline s'en sert deux fois: projeter vers l'équivalente Albers
//! (EPSG:5070) pour le calcul de surface quand le stockage natif ne l'est
//! pas, et ramener les géométries de sortie en géographique (EPSG:4326).

#[cfg(feature = "reproject")]
use geo::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
#[cfg(feature = "reproject")]
use proj::Proj;

use crate::error::ExtractError;

/// Reprojection de géométries entre deux systèmes de coordonnées
#[cfg(feature = "reproject")]
pub struct Reprojector {
    proj: Proj,
    source_epsg: u32,
    target_epsg: u32,
}

#[cfg(feature = "reproject")]
impl Reprojector {
    /// Crée un nouveau reprojector entre deux EPSG
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, ExtractError> {
        let source = format!("EPSG:{}", source_epsg);
        let target = format!("EPSG:{}", target_epsg);

        let proj = Proj::new_known_crs(&source, &target, None).map_err(|e| {
            ExtractError::Reprojection(format!(
                "failed to create projection from {} to {}: {}",
                source, target, e
            ))
        })?;

        Ok(Self {
            proj,
            source_epsg,
            target_epsg,
        })
    }

    /// Retourne le SRID source
    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    /// Retourne le SRID cible
    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Transforme une géométrie.
    ///
    /// Les parcelles sont des Polygon/MultiPolygon; Point est supporté pour
    /// les contrôles ponctuels. Les autres types sont retournés tels quels.
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, ExtractError> {
        if self.source_epsg == self.target_epsg {
            return Ok(geom.clone());
        }

        match geom {
            Geometry::Point(p) => {
                let (x, y) = self.transform_coord(p.0)?;
                Ok(Geometry::Point(Point::new(x, y)))
            }
            Geometry::Polygon(p) => Ok(Geometry::Polygon(self.transform_polygon(p)?)),
            Geometry::MultiPolygon(mp) => {
                let polys: Result<Vec<Polygon>, ExtractError> =
                    mp.0.iter().map(|p| self.transform_polygon(p)).collect();
                Ok(Geometry::MultiPolygon(MultiPolygon::new(polys?)))
            }
            _ => Ok(geom.clone()),
        }
    }

    /// Transforme une coordonnée unique
    fn transform_coord(&self, coord: Coord) -> Result<(f64, f64), ExtractError> {
        self.proj
            .convert((coord.x, coord.y))
            .map_err(|e| ExtractError::Reprojection(format!("coordinate transform failed: {}", e)))
    }

    /// Transforme une LineString (conversion batch, bien plus rapide que
    /// point par point)
    fn transform_linestring(&self, ls: &LineString) -> Result<LineString, ExtractError> {
        let mut coords: Vec<(f64, f64)> = ls.0.iter().map(|c| (c.x, c.y)).collect();

        self.proj
            .convert_array(&mut coords)
            .map_err(|e| ExtractError::Reprojection(format!("batch transform failed: {}", e)))?;

        let result: Vec<Coord> = coords.into_iter().map(|(x, y)| Coord { x, y }).collect();
        Ok(LineString::new(result))
    }

    /// Transforme un Polygon (enveloppe + trous)
    fn transform_polygon(&self, p: &Polygon) -> Result<Polygon, ExtractError> {
        let exterior = self.transform_linestring(p.exterior())?;
        let interiors: Result<Vec<LineString>, ExtractError> = p
            .interiors()
            .iter()
            .map(|ls| self.transform_linestring(ls))
            .collect();
        Ok(Polygon::new(exterior, interiors?))
    }
}

/// Vérifie si la reprojection est disponible
pub fn is_available() -> bool {
    cfg!(feature = "reproject")
}

// Implémentation factice quand le feature reproject est désactivé
#[cfg(not(feature = "reproject"))]
use geo::Geometry;

/// Reprojector factice - pas de reprojection disponible
#[cfg(not(feature = "reproject"))]
pub struct Reprojector {
    source_epsg: u32,
    target_epsg: u32,
}

#[cfg(not(feature = "reproject"))]
impl Reprojector {
    /// Tente de créer un reprojector - échoue toujours sans la feature
    pub fn new(source_epsg: u32, target_epsg: u32) -> Result<Self, ExtractError> {
        if source_epsg == target_epsg {
            Ok(Self {
                source_epsg,
                target_epsg,
            })
        } else {
            Err(ExtractError::Reprojection(format!(
                "reprojection from EPSG:{} to EPSG:{} requires the 'reproject' feature. \
                 Build with: cargo build --features reproject",
                source_epsg, target_epsg
            )))
        }
    }

    pub fn source_epsg(&self) -> u32 {
        self.source_epsg
    }

    pub fn target_epsg(&self) -> u32 {
        self.target_epsg
    }

    /// Retourne la géométrie inchangée (source == cible garanti par new)
    pub fn transform_geometry(&self, geom: &Geometry) -> Result<Geometry, ExtractError> {
        Ok(geom.clone())
    }
}
