use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Layout defaults implied by a plan code when the page shows nothing else
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlanDefaults {
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_footage: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanCodeEntry {
    pub prefix: String,
    #[serde(flatten)]
    pub defaults: PlanDefaults,
}

/// Plan-code prefix → layout defaults, longest prefix wins
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanCodeTable {
    entries: Vec<PlanCodeEntry>,
}

impl PlanCodeTable {
    pub fn new(entries: Vec<PlanCodeEntry>) -> Self {
        Self { entries }
    }

    /// Load a table from a JSON file of `{prefix, bedrooms, bathrooms, square_footage}` entries
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read plan table {}", path.display()))?;
        let entries: Vec<PlanCodeEntry> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse plan table {}", path.display()))?;
        Ok(Self::new(entries))
    }

    pub fn lookup(&self, plan_code: &str) -> Option<PlanDefaults> {
        let code = plan_code.trim().to_uppercase();
        self.entries
            .iter()
            .filter(|entry| code.starts_with(&entry.prefix.to_uppercase()))
            .max_by_key(|entry| entry.prefix.len())
            .map(|entry| entry.defaults)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PlanCodeTable {
    /// Common lettering convention: S studio, A one bed, B two bed, C three bed, TH townhome
    fn default() -> Self {
        let entry = |prefix: &str, bedrooms, bathrooms, square_footage| PlanCodeEntry {
            prefix: prefix.to_string(),
            defaults: PlanDefaults {
                bedrooms,
                bathrooms,
                square_footage,
            },
        };

        Self::new(vec![
            entry("S", 0, 1.0, 550),
            entry("A", 1, 1.0, 750),
            entry("B", 2, 2.0, 1100),
            entry("C", 3, 2.0, 1350),
            entry("TH", 3, 2.5, 1600),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let table = PlanCodeTable::default();
        assert_eq!(table.lookup("TH2").map(|d| d.bedrooms), Some(3));
        assert_eq!(table.lookup("th2").map(|d| d.bathrooms), Some(2.5));
        assert_eq!(table.lookup("B1").map(|d| d.square_footage), Some(1100));
        assert_eq!(table.lookup("S1").map(|d| d.bedrooms), Some(0));
        assert_eq!(table.lookup("Z9"), None);
    }

    #[test]
    fn loads_from_json_file() {
        let path = std::env::temp_dir().join(format!(
            "plan_table_test_{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::write(
            &path,
            r#"[{"prefix": "P", "bedrooms": 2, "bathrooms": 1.5, "square_footage": 980}]"#,
        )
        .unwrap();

        let table = PlanCodeTable::from_json_file(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup("P4"),
            Some(PlanDefaults { bedrooms: 2, bathrooms: 1.5, square_footage: 980 })
        );

        let _ = std::fs::remove_file(path);
    }
}
