use crate::error::{GatewayError, Result};
use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub type Section = IndexMap<String, String>;

/// Section-grouped `key=value` document as read and written by the engine.
///
/// Section and key order is preserved so that a parse, mutate, serialize cycle
/// leaves unrelated settings where they were. Keys that appear before the first
/// section header are kept in an unnamed root group. Comments are not retained.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigurationDocument {
    root: Section,
    sections: IndexMap<String, Section>,
}

impl ConfigurationDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses the document at `path`.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(GatewayError::ConfigMissing {
                path: path.to_path_buf(),
            });
        }
        std::fs::read_to_string(path)?.parse()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(key))
            .map(String::as_str)
    }

    pub fn root_value(&self, key: &str) -> Option<&str> {
        self.root.get(key).map(String::as_str)
    }

    /// Sets a value, creating the section at the end of the document if needed.
    /// Existing keys keep their position.
    ///
    /// Values are written one per line, so a value holding a line break is
    /// rejected rather than allowed to add keys or sections of its own.
    pub fn set(&mut self, section: &str, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if value.contains(['\r', '\n']) {
            return Err(GatewayError::InvalidRequest(format!(
                "{section}.{key} must not contain line breaks"
            )));
        }
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

impl FromStr for ConfigurationDocument {
    type Err = GatewayError;

    fn from_str(text: &str) -> Result<Self> {
        let mut document = Self::new();
        let mut current: Option<String> = None;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header.strip_suffix(']').ok_or_else(|| GatewayError::ConfigParse {
                    line: line_no,
                    reason: format!("unterminated section header '{line}'"),
                })?;
                let name = name.trim();
                if name.is_empty() {
                    return Err(GatewayError::ConfigParse {
                        line: line_no,
                        reason: "empty section name".to_string(),
                    });
                }
                // repeated headers merge into the first occurrence
                document.sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| GatewayError::ConfigParse {
                line: line_no,
                reason: format!("expected key=value, found '{line}'"),
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(GatewayError::ConfigParse {
                    line: line_no,
                    reason: "empty key".to_string(),
                });
            }

            let entries = match &current {
                Some(name) => document.sections.entry(name.clone()).or_default(),
                None => &mut document.root,
            };
            entries.insert(key.to_string(), value.trim().to_string());
        }

        Ok(document)
    }
}

impl fmt::Display for ConfigurationDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.root {
            writeln!(f, "{key}={value}")?;
        }
        for (index, (name, entries)) in self.sections.iter().enumerate() {
            if index > 0 || !self.root.is_empty() {
                writeln!(f)?;
            }
            writeln!(f, "[{name}]")?;
            for (key, value) in entries {
                writeln!(f, "{key}={value}")?;
            }
        }
        Ok(())
    }
}
