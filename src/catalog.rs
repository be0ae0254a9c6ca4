//! Template catalog configuration.
//!
//! A catalog is a JSON file naming the document kinds that can be
//! generated, the template each one uses, and any totals derived from its
//! fields:
//!
//! ```json
//! {
//!   "templates": [
//!     {
//!       "name": "Automation Proposal - Custom Price",
//!       "template": "Proposal - Custom Price.docx",
//!       "totals": { "T-Price": ["P01", "P02"] }
//!     }
//!   ]
//! }
//! ```

use crate::error::{Error, Result};
use crate::values::FieldSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One generatable document kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Display name, unique within the catalog
    pub name: String,

    /// Template file, relative to the catalog file unless absolute
    pub template: PathBuf,

    /// Human-readable description
    #[serde(default)]
    pub description: Option<String>,

    /// Derived totals: field name → fields it sums
    #[serde(default)]
    pub totals: BTreeMap<String, Vec<String>>,
}

impl TemplateEntry {
    /// Apply this entry's totals to a request's fields.
    ///
    /// Totals already declared by the request are kept.
    pub fn apply_totals(&self, fields: &mut FieldSet) {
        for (name, sources) in &self.totals {
            fields
                .totals
                .entry(name.clone())
                .or_insert_with(|| sources.clone());
        }
    }
}

/// A set of named templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateCatalog {
    /// Catalog entries in file order
    pub templates: Vec<TemplateEntry>,

    /// Directory that relative template paths resolve against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl TemplateCatalog {
    /// Load a catalog file. Template paths resolve against its directory.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let mut catalog = Self::from_json(&json)?;
        catalog.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        log::debug!(
            "Loaded {} template(s) from {}",
            catalog.templates.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse a catalog from JSON and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let catalog: TemplateCatalog =
            serde_json::from_str(json).map_err(|e| Error::Catalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for entry in &self.templates {
            if entry.name.trim().is_empty() {
                return Err(Error::Catalog("template entry without a name".to_string()));
            }
            if entry.template.as_os_str().is_empty() {
                return Err(Error::Catalog(format!(
                    "template entry '{}' has no template file",
                    entry.name
                )));
            }
            if !seen.insert(name_key(&entry.name)) {
                return Err(Error::Catalog(format!(
                    "duplicate template name '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Look up an entry by name, ignoring case.
    pub fn get(&self, name: &str) -> Result<&TemplateEntry> {
        let key = name_key(name);
        self.templates
            .iter()
            .find(|e| name_key(&e.name) == key)
            .ok_or_else(|| Error::UnknownTemplate(name.to_string()))
    }

    /// Entry names in file order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|e| e.name.as_str())
    }

    /// Full path to an entry's template file.
    pub fn template_path(&self, entry: &TemplateEntry) -> PathBuf {
        if entry.template.is_absolute() {
            entry.template.clone()
        } else {
            self.base_dir.join(&entry.template)
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Check if the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Case-folded name used for both duplicate detection and lookup.
fn name_key(name: &str) -> String {
    name.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "templates": [
            {"name": "Internship Offer Letter", "template": "Offer Letter.docx"},
            {
                "name": "Proposal - Custom Price",
                "template": "Proposal - Custom Price.docx",
                "description": "Automation proposal with itemised pricing",
                "totals": {"T-Price": ["P01", "P02"]}
            }
        ]
    }"#;

    #[test]
    fn test_parse_and_lookup() {
        let catalog = TemplateCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["Internship Offer Letter", "Proposal - Custom Price"]
        );

        let entry = catalog.get("internship offer letter").unwrap();
        assert_eq!(entry.template, PathBuf::from("Offer Letter.docx"));
        assert!(entry.totals.is_empty());

        assert!(matches!(
            catalog.get("Missing"),
            Err(Error::UnknownTemplate(_))
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let json = r#"{"templates": [
            {"name": "A", "template": "a.docx"},
            {"name": "a", "template": "b.docx"}
        ]}"#;
        assert!(matches!(
            TemplateCatalog::from_json(json),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_lookup_folds_non_ascii_case() {
        let json = r#"{"templates": [{"name": "Lettre d'Été", "template": "ete.docx"}]}"#;
        let catalog = TemplateCatalog::from_json(json).unwrap();
        assert_eq!(catalog.get("lettre d'été").unwrap().name, "Lettre d'Été");
        assert_eq!(catalog.get("LETTRE D'ÉTÉ").unwrap().name, "Lettre d'Été");

        let json = r#"{"templates": [
            {"name": "Lettre d'Été", "template": "a.docx"},
            {"name": "lettre d'été", "template": "b.docx"}
        ]}"#;
        assert!(matches!(
            TemplateCatalog::from_json(json),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_malformed_json_is_catalog_error() {
        assert!(matches!(
            TemplateCatalog::from_json("{\"templates\": 3}"),
            Err(Error::Catalog(_))
        ));
    }

    #[test]
    fn test_apply_totals_keeps_request_totals() {
        let catalog = TemplateCatalog::from_json(CATALOG).unwrap();
        let entry = catalog.get("Proposal - Custom Price").unwrap();

        let mut fields = FieldSet::new();
        entry.apply_totals(&mut fields);
        assert_eq!(fields.totals["T-Price"], vec!["P01", "P02"]);

        let mut fields = FieldSet::new();
        fields.add_total("T-Price", ["P01"]);
        entry.apply_totals(&mut fields);
        assert_eq!(fields.totals["T-Price"], vec!["P01"]);
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        fs::write(&path, CATALOG).unwrap();

        let catalog = TemplateCatalog::load(&path).unwrap();
        let entry = catalog.get("Internship Offer Letter").unwrap();
        assert_eq!(
            catalog.template_path(entry),
            dir.path().join("Offer Letter.docx")
        );
    }
}
