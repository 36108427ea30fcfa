// Team catalog: a read-only indexed list of selectable teams with logo
// references. Browsing lives in the external collaborator; the engine
// only resolves selection events against the loaded list.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::session::{TeamLogo, TeamState};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse catalog {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogEntry {
    pub id: u64,
    pub slug: String,
    pub country: String,
    pub english_name: String,
    pub logos: TeamLogo,
}

#[derive(Debug, Clone, Default)]
pub struct TeamCatalog {
    entries: Vec<CatalogEntry>,
}

impl TeamCatalog {
    /// A catalog with no entries; selection events resolve to nothing.
    pub fn empty() -> Self {
        TeamCatalog::default()
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|_| CatalogError::FileNotFound {
            path: path.to_path_buf(),
        })?;
        Self::from_json(&text).map_err(|source| CatalogError::ParseError {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        Ok(TeamCatalog { entries })
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Apply a catalog selection to a session team: name and logo change,
/// everything else (roster, formation, score) stays.
pub fn apply_selection(team: &mut TeamState, entry: &CatalogEntry) {
    team.set_name(&entry.english_name);
    team.logo = Some(entry.logos.clone());
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG_JSON: &str = r#"[
        {
            "id": 10,
            "slug": "arsenal",
            "country": "England",
            "englishName": "Arsenal",
            "logos": { "svg": "logos/arsenal.svg", "png": "logos/arsenal.png" }
        },
        {
            "id": 20,
            "slug": "real-madrid",
            "country": "Spain",
            "englishName": "Real Madrid",
            "logos": { "svg": "logos/real.svg", "png": "logos/real.png" }
        }
    ]"#;

    #[test]
    fn catalog_parses_and_indexes() {
        let catalog = TeamCatalog::from_json(CATALOG_JSON).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(1).unwrap().slug, "real-madrid");
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn selection_sets_name_and_logo_only() {
        let catalog = TeamCatalog::from_json(CATALOG_JSON).unwrap();
        let mut team = TeamState::default();
        team.score = 2;
        let roster_before = team.roster.clone();

        apply_selection(&mut team, catalog.get(0).unwrap());
        assert_eq!(team.name, "Arsenal");
        assert_eq!(team.logo.as_ref().unwrap().png, "logos/arsenal.png");
        assert_eq!(team.score, 2);
        assert_eq!(team.roster, roster_before);
    }

    #[test]
    fn empty_catalog_resolves_nothing() {
        let catalog = TeamCatalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.get(0).is_none());
    }
}
