//! Per-module access control entries from `/me`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

use super::document::{coerce_string_map, Document};
use crate::error::Result;

/// Permissions for one module.
///
/// Action values are the server's strings (`"no"`, `"owner"`, ...); an empty
/// string means the server sent no restriction for that action.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AclEntry {
    pub access: String,
    pub admin: String,
    pub delete: String,
    pub developer: String,
    pub edit: String,
    pub export: String,
    pub import: String,
    pub list: String,
    pub mass_update: String,
    pub view: String,
    /// Field name → permission → value, e.g. `{"email": {"write": "no"}}`.
    pub fields: BTreeMap<String, BTreeMap<String, String>>,
    pub hash: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl AclEntry {
    pub(crate) fn from_document(doc: &Document<'_>) -> Result<Self> {
        let fields = match doc.object("fields")? {
            Some(fields) => {
                let mut out = BTreeMap::new();
                for (name, value) in fields.remaining() {
                    let perms = coerce_string_map(&value, &fields.field_path(&name))?;
                    out.insert(name, perms);
                }
                out
            }
            None => BTreeMap::new(),
        };

        Ok(Self {
            access: doc.string("access")?,
            admin: doc.string("admin")?,
            delete: doc.string("delete")?,
            developer: doc.string("developer")?,
            edit: doc.string("edit")?,
            export: doc.string("export")?,
            import: doc.string("import")?,
            list: doc.string("list")?,
            mass_update: doc.string("massupdate")?,
            view: doc.string("view")?,
            fields,
            hash: doc.string("_hash")?,
            extra: doc.remaining(),
        })
    }

    /// Check whether an action is explicitly denied (`"no"`).
    #[must_use]
    pub fn denies(&self, action: &str) -> bool {
        let value = match action {
            "access" => &self.access,
            "admin" => &self.admin,
            "delete" => &self.delete,
            "developer" => &self.developer,
            "edit" => &self.edit,
            "export" => &self.export,
            "import" => &self.import,
            "list" => &self.list,
            "massupdate" => &self.mass_update,
            "view" => &self.view,
            _ => return false,
        };
        value == "no"
    }
}
