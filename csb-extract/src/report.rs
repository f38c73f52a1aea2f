//! Rapport d'extraction
//!
//! Collecte les compteurs d'une extraction et les affiche ou les sauvegarde
//! en JSON à côté de l'extrait.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use csb::FieldCollection;
use serde::Serialize;

/// Rapport complet d'une extraction
#[derive(Debug, Clone, Serialize)]
pub struct ExtractReport {
    /// Nombre de parcelles demandé
    pub requested: usize,
    /// Nombre de parcelles sauvegardées
    pub saved: usize,
    /// Parcelles par région
    pub by_region: HashMap<String, usize>,
    /// Surface totale de l'extrait en acres
    pub total_acres: f64,
    /// Durée de l'extraction
    pub duration_secs: f64,
    /// Chemin du fichier produit
    pub output_path: Option<PathBuf>,
    /// Checksum blake3 du fichier produit
    pub checksum: Option<String>,
}

impl ExtractReport {
    /// Crée un rapport pour une demande de `requested` parcelles
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            saved: 0,
            by_region: HashMap::new(),
            total_acres: 0.0,
            duration_secs: 0.0,
            output_path: None,
            checksum: None,
        }
    }

    /// Enregistre la collection sauvegardée
    pub fn record_saved(&mut self, data: &FieldCollection) {
        self.saved = data.len();
        self.total_acres = data.records.iter().map(|r| r.area_acres).sum();
        for record in &data.records {
            *self.by_region.entry(record.region.clone()).or_default() += 1;
        }
    }

    /// Enregistre le fichier produit et calcule son checksum
    pub fn record_output(&mut self, path: &Path) -> Result<()> {
        self.checksum = Some(compute_file_checksum(path)?);
        self.output_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Définit la durée de l'extraction
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("EXTRACT REPORT");
        println!("{}", "=".repeat(60));

        println!(
            "\nFields: {} saved ({} requested), {:.1} acres total",
            self.saved, self.requested, self.total_acres
        );
        println!("Duration: {:.2}s", self.duration_secs);

        if !self.by_region.is_empty() {
            println!("\n--- BY REGION ---");
            let mut regions: Vec<_> = self.by_region.iter().collect();
            regions.sort_by_key(|(name, _)| name.as_str());
            for (region, count) in regions {
                println!("  {}: {} fields", region, count);
            }
        }

        if let Some(ref path) = self.output_path {
            println!("\nOutput: {}", path.display());
        }
        if let Some(ref checksum) = self.checksum {
            println!("Checksum (blake3): {}", checksum);
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact pour les logs
    pub fn summary(&self) -> String {
        format!(
            "{}/{} fields saved, {:.1} acres, {:.2}s",
            self.saved, self.requested, self.total_acres, self.duration_secs
        )
    }
}

/// Calcule le checksum blake3 d'un fichier
pub fn compute_file_checksum(path: &Path) -> Result<String> {
    use std::io::Read;

    let mut file = std::fs::File::open(path)
        .with_context(|| format!("Cannot open {}", path.display()))?;
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 65536]; // 64KB buffer

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csb::{FieldCollection, FieldRecord};
    use geo::{Geometry, LineString, Polygon};

    fn record(region: &str, acres: f64) -> FieldRecord {
        FieldRecord {
            field_id: "19001".to_string(),
            region: region.to_string(),
            state_fips: "19".to_string(),
            area_acres: acres,
            crop_code: "1".to_string(),
            crop_name: None,
            crop_code_list: None,
            geometry: Geometry::Polygon(Polygon::new(
                LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
                vec![],
            )),
        }
    }

    #[test]
    fn test_record_saved() {
        let mut report = ExtractReport::new(5);
        let collection = FieldCollection::harmonized(vec![
            record("corn_belt", 100.0),
            record("corn_belt", 50.0),
            record("great_plains", 25.0),
        ]);
        report.record_saved(&collection);

        assert_eq!(report.saved, 3);
        assert_eq!(report.total_acres, 175.0);
        assert_eq!(report.by_region.get("corn_belt"), Some(&2));
        assert_eq!(report.by_region.get("great_plains"), Some(&1));
    }

    #[test]
    fn test_summary() {
        let mut report = ExtractReport::new(10);
        report.saved = 10;
        report.total_acres = 1234.5;
        let summary = report.summary();
        assert!(summary.contains("10/10"));
        assert!(summary.contains("1234.5"));
    }

    #[test]
    fn test_checksum_is_stable() {
        let path = std::env::temp_dir().join("csb_checksum_test.txt");
        std::fs::write(&path, b"field boundaries").unwrap();

        let first = compute_file_checksum(&path).unwrap();
        let second = compute_file_checksum(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64); // blake3 en hexadécimal

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_save_to_file() {
        let path = std::env::temp_dir().join("csb_report_test.json");
        let mut report = ExtractReport::new(2);
        report.saved = 2;
        report.save_to_file(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"requested\": 2"));

        std::fs::remove_file(path).ok();
    }
}
