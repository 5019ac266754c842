//! Loading composite chip definitions from TOML.
//!
//! A catalog file holds one `[chips.NAME]` table per composite:
//!
//! ```toml
//! [chips.OR3]
//! inputs = ["A", "B", "C"]
//! outputs = ["OUT"]
//! components = [
//!     { id = "o1", type = "OR" },
//!     { id = "o2", type = "OR" },
//! ]
//! wires = [
//!     { from = "A", to = "o1", to_pin = "A" },
//!     { from = "B", to = "o1", to_pin = "B" },
//!     { from = "o1", to = "o2", to_pin = "A" },
//!     { from = "C", to = "o2", to_pin = "B" },
//! ]
//!
//! [chips.OR3.io_mapping]
//! output = "o2"
//! outputs = { OUT = "o2" }
//! ```

use arcstr::ArcStr;
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::{Catalog, ChipDefinition, CompositeDef};

/// An error loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The file is not valid TOML, or does not match the catalog schema.
    #[error("could not parse catalog: {0}")]
    Toml(#[from] toml::de::Error),
    /// The file attempts to replace a primitive chip.
    #[error("cannot redefine primitive chip `{0}`")]
    RedefinePrimitive(ArcStr),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CatalogFile {
    chips: IndexMap<ArcStr, CompositeDef>,
}

impl Catalog {
    /// Parses composite definitions from TOML and adds them to this catalog.
    ///
    /// Definitions with the same name as an existing composite replace it.
    /// Nothing is added if any definition would replace a primitive.
    ///
    /// The merged catalog is not validated; call [`Catalog::validate`] once
    /// all definitions are loaded.
    pub fn extend_from_toml(&mut self, src: &str) -> Result<usize, CatalogError> {
        let file: CatalogFile = toml::from_str(src)?;

        for name in file.chips.keys() {
            let upper = name.to_ascii_uppercase();
            if let Some(ChipDefinition::Primitive(_)) = self.get(&upper) {
                return Err(CatalogError::RedefinePrimitive(name.clone()));
            }
        }

        let added = file.chips.len();
        for (name, def) in file.chips {
            tracing::debug!(chip = %name, "loaded composite definition");
            if self.insert(name.clone(), def).is_some() {
                tracing::warn!(chip = %name, "composite definition replaced an existing one");
            }
        }
        Ok(added)
    }

    /// Creates a catalog from the builtins plus the definitions in the given TOML.
    pub fn builtin_with_toml(src: &str) -> Result<Self, CatalogError> {
        let mut catalog = Self::builtin();
        catalog.extend_from_toml(src)?;
        Ok(catalog)
    }
}
