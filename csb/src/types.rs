//! Types de données pour le crate csb

use geo::Geometry;

/// Ordre fixe des colonnes du schéma de sortie harmonisé
pub const OUTPUT_COLUMNS: [&str; 8] = [
    "field_id",
    "region",
    "state_fips",
    "area_acres",
    "crop_code",
    "crop_name",
    "crop_code_list",
    "geometry",
];

/// Colonnes exigées par la passe de validation
pub const REQUIRED_COLUMNS: [&str; 3] = ["field_id", "region", "geometry"];

/// Système de coordonnées déclaré d'une collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crs {
    /// Code EPSG
    pub epsg: u32,
}

impl Crs {
    /// WGS84, système géodésique de sortie
    pub const WGS84: Crs = Crs { epsg: 4326 };

    /// NAD83 / Conus Albers, projection équivalente des surfaces
    pub const ALBERS_CONUS: Crs = Crs { epsg: 5070 };
}

impl std::fmt::Display for Crs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Une parcelle agricole avec sa géométrie et ses attributs
#[derive(Debug, Clone)]
pub struct FieldRecord {
    /// Identifiant unique (id fiboa)
    pub field_id: String,

    /// Région résolue (corn_belt, great_plains, southeast, ou "mixed")
    pub region: String,

    /// Code FIPS de l'état (2 caractères)
    pub state_fips: String,

    /// Surface calculée en acres
    pub area_acres: f64,

    /// Code CDL de la culture de l'année courante
    pub crop_code: String,

    /// Nom de la culture
    pub crop_name: Option<String>,

    /// Historique des codes CDL (8 ans, séparés par des virgules)
    pub crop_code_list: Option<String>,

    /// Géométrie (Polygon ou MultiPolygon)
    pub geometry: Geometry,
}

/// Résultat d'une extraction: les parcelles et le schéma de sortie
#[derive(Debug, Clone)]
pub struct FieldCollection {
    /// Parcelles dans l'ordre de sortie
    pub records: Vec<FieldRecord>,

    /// Colonnes présentes, dans l'ordre harmonisé
    pub columns: Vec<String>,

    /// CRS déclaré (None = collection sans référence spatiale)
    pub crs: Option<Crs>,
}

impl FieldCollection {
    /// Construit une collection harmonisée (colonnes fixes, WGS84)
    pub fn harmonized(records: Vec<FieldRecord>) -> Self {
        Self {
            records,
            columns: OUTPUT_COLUMNS.iter().map(|c| (*c).to_string()).collect(),
            crs: Some(Crs::WGS84),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vérifie la présence d'une colonne dans le schéma de sortie
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }
}
