use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

use crate::error::DirectoryError;
use crate::parser::{clean_header, sniff_delimiter};

const REQUIRED: [&str; 4] = ["PROGRAMA", "PROGRAMA_CORTO", "COORDINADOR", "EMAIL"];

/// Coordinator of one academic program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinator {
    pub short_name: String,
    pub name: String,
    pub email: String,
}

/// Maps program names to their coordinators.
///
/// Stored as a CSV file (`,` or `;` separated):
/// ```text
/// PROGRAMA;PROGRAMA_CORTO;COORDINADOR;EMAIL
/// Derecho;DER;Marta Gil;marta.gil@uni.edu
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoordinatorDirectory {
    entries: HashMap<String, Coordinator>,
}

impl CoordinatorDirectory {
    /// Loads the directory from a CSV file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&bytes).with_context(|| format!("invalid coordinator file {}", path.display()))
    }

    /// Parses directory CSV. Headers are matched ignoring case, BOMs and stray spaces.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(sniff_delimiter(bytes))
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| clean_header(h).to_uppercase())
            .collect();
        let missing: Vec<String> = REQUIRED
            .iter()
            .filter(|r| !headers.iter().any(|h| h == *r))
            .map(|r| r.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DirectoryError::MissingColumns {
                missing,
                found: headers,
            }
            .into());
        }

        let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or_default();
        let (program, short, coordinator, email) = (
            position("PROGRAMA"),
            position("PROGRAMA_CORTO"),
            position("COORDINADOR"),
            position("EMAIL"),
        );

        let mut entries = HashMap::new();
        for result in reader.records() {
            let row = result?;
            let field = |i: usize| row.get(i).unwrap_or_default().trim().to_string();
            entries.insert(
                field(program),
                Coordinator {
                    short_name: field(short),
                    name: field(coordinator),
                    email: field(email),
                },
            );
        }

        Ok(Self { entries })
    }

    /// Returns the coordinator for `program`, if one is configured.
    pub fn get(&self, program: &str) -> Option<&Coordinator> {
        self.entries.get(program.trim())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semicolon_file_with_messy_headers() {
        let data = "\u{feff}programa ;PROGRAMA_CORTO;Coordinador;EMAIL\u{a0}\nDerecho;DER;Marta Gil; marta@uni.edu \n";
        let directory = CoordinatorDirectory::parse(data.as_bytes()).unwrap();
        assert_eq!(directory.len(), 1);
        let coordinator = directory.get("Derecho").unwrap();
        assert_eq!(coordinator.short_name, "DER");
        assert_eq!(coordinator.name, "Marta Gil");
        assert_eq!(coordinator.email, "marta@uni.edu");
        assert!(directory.get("Medicina").is_none());
    }

    #[test]
    fn test_missing_columns_is_error() {
        let err = CoordinatorDirectory::parse(b"PROGRAMA,EMAIL\nDerecho,a@b.co\n").unwrap_err();
        let directory_err = err.downcast_ref::<DirectoryError>().unwrap();
        match directory_err {
            DirectoryError::MissingColumns { missing, .. } => {
                assert_eq!(missing, &vec!["PROGRAMA_CORTO".to_string(), "COORDINADOR".to_string()]);
            }
        }
    }
}
