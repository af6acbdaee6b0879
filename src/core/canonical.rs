use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::SpecificationTree;

/// The fixed business attributes derived from the specification tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Manufacturer,
    Memory,
    Color,
    ScreenDiagonal,
    ScreenResolution,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::Manufacturer,
        CanonicalField::Memory,
        CanonicalField::Color,
        CanonicalField::ScreenDiagonal,
        CanonicalField::ScreenResolution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Manufacturer => "manufacturer",
            CanonicalField::Memory => "memory",
            CanonicalField::Color => "color",
            CanonicalField::ScreenDiagonal => "screen_diagonal",
            CanonicalField::ScreenResolution => "screen_resolution",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the tree a canonical field lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalPath {
    pub field: CanonicalField,
    pub section: String,
    pub key: String,
}

impl CanonicalPath {
    pub fn new(field: CanonicalField, section: &str, key: &str) -> Self {
        Self {
            field,
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalFields {
    pub manufacturer: Option<String>,
    pub memory: Option<String>,
    pub color: Option<String>,
    pub screen_diagonal: Option<String>,
    pub screen_resolution: Option<String>,
}

impl CanonicalFields {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        match field {
            CanonicalField::Manufacturer => self.manufacturer.as_deref(),
            CanonicalField::Memory => self.memory.as_deref(),
            CanonicalField::Color => self.color.as_deref(),
            CanonicalField::ScreenDiagonal => self.screen_diagonal.as_deref(),
            CanonicalField::ScreenResolution => self.screen_resolution.as_deref(),
        }
    }

    fn slot(&mut self, field: CanonicalField) -> &mut Option<String> {
        match field {
            CanonicalField::Manufacturer => &mut self.manufacturer,
            CanonicalField::Memory => &mut self.memory,
            CanonicalField::Color => &mut self.color,
            CanonicalField::ScreenDiagonal => &mut self.screen_diagonal,
            CanonicalField::ScreenResolution => &mut self.screen_resolution,
        }
    }
}

/// Projects [`CanonicalFields`] out of a [`SpecificationTree`].
#[derive(Debug, Clone)]
pub struct CanonicalMapper {
    paths: Vec<CanonicalPath>,
}

impl CanonicalMapper {
    pub fn new(paths: Vec<CanonicalPath>) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &[CanonicalPath] {
        &self.paths
    }

    /// Every path is looked up on its own; a missing section or key leaves
    /// that field `None`. When a field has several paths the first hit wins.
    pub fn map(&self, tree: &SpecificationTree) -> CanonicalFields {
        let mut fields = CanonicalFields::default();

        for path in &self.paths {
            let slot = fields.slot(path.field);
            if slot.is_some() {
                continue;
            }
            match tree.value(&path.section, &path.key) {
                Some(value) => *slot = Some(value.to_string()),
                None => tracing::debug!(
                    "No {} at {} / {}",
                    path.field,
                    path.section,
                    path.key
                ),
            }
        }

        fields
    }
}

impl Default for CanonicalMapper {
    fn default() -> Self {
        Self::new(crate::config::CanonicalConfig::default().paths)
    }
}
