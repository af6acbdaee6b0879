use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Attribute name → value pairs of one section, in page order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecificationSection {
    entries: Vec<(String, Option<String>)>,
}

impl SpecificationSection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an earlier value for the same key in place.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// `None` when the key is absent, `Some(None)` when present without a value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for SpecificationSection {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        let mut section = SpecificationSection::new();
        for (key, value) in iter {
            section.insert(key, value);
        }
        section
    }
}

/// Section name → [`SpecificationSection`], in page order.
///
/// Keys are whatever the page shows; there is no fixed schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecificationTree {
    sections: Vec<(String, SpecificationSection)>,
}

impl SpecificationTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `section` under `name`.
    ///
    /// A repeated name replaces the earlier section wholesale; pairs are not
    /// merged. The section keeps the position of its first occurrence.
    pub fn insert_section(&mut self, name: impl Into<String>, section: SpecificationSection) {
        let name = name.into();
        match self.sections.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = section,
            None => self.sections.push((name, section)),
        }
    }

    pub fn section(&self, name: &str) -> Option<&SpecificationSection> {
        self.sections
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, section)| section)
    }

    /// Value at `section` / `key`; absent paths and null values both yield `None`.
    pub fn value(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key).flatten()
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &SpecificationSection)> {
        self.sections
            .iter()
            .map(|(name, section)| (name.as_str(), section))
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl Serialize for SpecificationSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl Serialize for SpecificationTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, section) in &self.sections {
            map.serialize_entry(name, section)?;
        }
        map.end()
    }
}

struct SectionVisitor;

impl<'de> Visitor<'de> for SectionVisitor {
    type Value = SpecificationSection;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of attribute names to optional strings")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut section = SpecificationSection::new();
        while let Some((key, value)) = access.next_entry::<String, Option<String>>()? {
            section.insert(key, value);
        }
        Ok(section)
    }
}

impl<'de> Deserialize<'de> for SpecificationSection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SectionVisitor)
    }
}

struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = SpecificationTree;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of section names to attribute maps")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut tree = SpecificationTree::new();
        while let Some((name, section)) = access.next_entry::<String, SpecificationSection>()? {
            tree.insert_section(name, section);
        }
        Ok(tree)
    }
}

impl<'de> Deserialize<'de> for SpecificationTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TreeVisitor)
    }
}
