//! Piece catalog for loading and selecting templates.
//!
//! The catalog is read-only once built: generation runs borrow it shared and
//! only ever ask it for templates by id, name or role.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::Rng;

use super::schema::PieceTemplate;
use crate::core::error::{DungeonError, Result};
use crate::core::types::{PieceRole, TemplateId};

/// Registry of piece templates indexed by id, name and role
#[derive(Debug, Clone, Default)]
pub struct PieceCatalog {
    /// Templates in registration order; a `TemplateId` is an index here
    templates: Vec<PieceTemplate>,
    /// Map from name to ID for fast lookup
    by_name: HashMap<String, TemplateId>,
    /// Map from role to IDs, in registration order
    by_role: HashMap<PieceRole, Vec<TemplateId>>,
}

impl PieceCatalog {
    /// Create a new empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template and return its assigned ID
    ///
    /// A later template with the same name shadows the earlier one for
    /// name lookups; both stay selectable by role.
    pub fn register(&mut self, template: PieceTemplate) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);

        self.by_name.insert(template.piece.name.clone(), id);
        self.by_role.entry(template.piece.role).or_default().push(id);
        self.templates.push(template);

        id
    }

    /// Parse a single template from TOML
    pub fn parse_template(content: &str) -> Result<PieceTemplate> {
        parse_and_validate(content).map_err(DungeonError::CatalogParse)
    }

    /// Load a template from a TOML file
    pub fn load_file(&mut self, path: &Path) -> Result<TemplateId> {
        let content = std::fs::read_to_string(path)?;
        let template = parse_and_validate(&content)
            .map_err(|msg| DungeonError::CatalogParse(format!("{}: {}", path.display(), msg)))?;

        tracing::debug!(
            "Loaded template '{}' ({}) from {}",
            template.name(),
            template.role(),
            path.display()
        );
        Ok(self.register(template))
    }

    /// Load all .toml files from a directory recursively
    ///
    /// Entries are visited in path order so ids are stable across platforms.
    pub fn load_directory(&mut self, path: &Path) -> Result<Vec<TemplateId>> {
        let mut ids = Vec::new();
        self.load_directory_recursive(path, &mut ids)?;
        Ok(ids)
    }

    fn load_directory_recursive(&mut self, path: &Path, ids: &mut Vec<TemplateId>) -> Result<()> {
        let mut entries: Vec<PathBuf> = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();

        for entry_path in entries {
            if entry_path.is_dir() {
                self.load_directory_recursive(&entry_path, ids)?;
            } else if entry_path.extension().map_or(false, |ext| ext == "toml") {
                ids.push(self.load_file(&entry_path)?);
            }
        }
        Ok(())
    }

    /// Get a template by ID
    pub fn get(&self, id: TemplateId) -> Option<&PieceTemplate> {
        self.templates.get(id.0 as usize)
    }

    /// Get a template by ID, failing if it is not registered
    pub fn require(&self, id: TemplateId) -> Result<&PieceTemplate> {
        self.get(id)
            .ok_or_else(|| DungeonError::TemplateNotFound(format!("ID {:?}", id)))
    }

    /// Get a template by name
    pub fn get_by_name(&self, name: &str) -> Option<&PieceTemplate> {
        self.id_by_name(name).and_then(|id| self.get(id))
    }

    /// Get template ID by name
    pub fn id_by_name(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    /// All template IDs registered for a role
    pub fn templates_for(&self, role: PieceRole) -> &[TemplateId] {
        self.by_role.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_role(&self, role: PieceRole) -> bool {
        !self.templates_for(role).is_empty()
    }

    /// Pick a template of the given role uniformly at random
    pub fn pick_template<R: Rng>(&self, role: PieceRole, rng: &mut R) -> Option<TemplateId> {
        let ids = self.templates_for(role);
        if ids.is_empty() {
            return None;
        }
        Some(ids[rng.gen_range(0..ids.len())])
    }

    /// Iterate over all templates with their IDs
    pub fn iter(&self) -> impl Iterator<Item = (TemplateId, &PieceTemplate)> {
        self.templates
            .iter()
            .enumerate()
            .map(|(i, t)| (TemplateId(i as u32), t))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn parse_and_validate(content: &str) -> std::result::Result<PieceTemplate, String> {
    let template: PieceTemplate = toml::from_str(content).map_err(|e| e.to_string())?;

    let errors = template.validate();
    if !errors.is_empty() {
        return Err(errors.join(", "));
    }
    Ok(template)
}
