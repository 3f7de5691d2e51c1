//! Session metadata reported by the server.
//!
//! [`SessionInfo`] is filled from two responses:
//!
//! 1. `GET /me` → `current_user` object → [`SessionInfo::from_current_user`]
//! 2. `GET /me/preferences` → [`SessionInfo::apply_user_preferences`]
//!
//! Both go through [`Document`], which coerces inconsistent wire types
//! field by field. Keys no record maps are kept in `extra` maps.

mod acl;
mod document;
mod preferences;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};

pub use acl::AclEntry;
pub use document::{coerce_bool, coerce_float, coerce_int, coerce_string, Document};
pub use preferences::{GlobalPreferences, UserPreferences};

use crate::error::Result;

/// Module the server omits from `module_list` although it serves it.
pub const IMPLICIT_MODULE: &str = "Users";

/// Team membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

/// Address fields, reported at the top level of `current_user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

/// Reporting-line flags, reported at the top level of `current_user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub is_manager: bool,
    pub is_top_level_manager: bool,
    pub reports_to_id: String,
    pub reports_to_name: String,
}

/// Snapshot of the logged-in user's session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub user_name: String,
    pub full_name: String,
    pub picture: String,
    pub hash: String,
    pub session_type: String,
    pub show_wizard: String,
    pub is_password_expired: bool,
    pub password_expired_message: String,
    /// Module name → permissions.
    pub acl: BTreeMap<String, AclEntry>,
    pub address: Address,
    pub organization: Organization,
    pub my_teams: Vec<Team>,
    pub roles: Vec<String>,
    pub module_list: Vec<String>,
    pub global_preferences: GlobalPreferences,
    pub user_preferences: UserPreferences,
    /// `current_user` keys not mapped above.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl SessionInfo {
    /// Decode the `current_user` object of a `/me` response.
    ///
    /// `user_preferences` is left at its default; it has its own source.
    pub fn from_current_user(current_user: &Map<String, Value>) -> Result<Self> {
        let doc = Document::new(current_user, "current_user");

        let mut acl = BTreeMap::new();
        for (module, entry) in doc.object_map("acl")? {
            acl.insert(module, AclEntry::from_document(&entry)?);
        }

        let global_preferences = match doc.object("preferences")? {
            Some(prefs) => GlobalPreferences::from_document(&prefs)?,
            None => GlobalPreferences::default(),
        };

        let my_teams = doc
            .object_list("my_teams")?
            .iter()
            .map(|team| {
                Ok(Team {
                    id: team.string("id")?,
                    name: team.string("name")?,
                    extra: team.remaining(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: doc.string("id")?,
            user_name: doc.string("user_name")?,
            full_name: doc.string("full_name")?,
            picture: doc.string("picture")?,
            hash: doc.string("_hash")?,
            session_type: doc.string("type")?,
            show_wizard: doc.string("show_wizard")?,
            is_password_expired: doc.bool("is_password_expired")?,
            password_expired_message: doc.string("password_expired_message")?,
            acl,
            address: Address {
                street: doc.string("address_street")?,
                city: doc.string("address_city")?,
                country: doc.string("address_country")?,
                postal_code: doc.string("address_postalcode")?,
            },
            organization: Organization {
                is_manager: doc.bool("is_manager")?,
                is_top_level_manager: doc.bool("is_top_level_manager")?,
                reports_to_id: doc.string("reports_to_id")?,
                reports_to_name: doc.string("reports_to_name")?,
            },
            my_teams,
            roles: doc.string_list("roles")?,
            module_list: doc.string_list("module_list")?,
            global_preferences,
            user_preferences: UserPreferences::default(),
            extra: doc.remaining(),
        })
    }

    /// Replace `user_preferences` from a `/me/preferences` response.
    pub fn apply_user_preferences(&mut self, response: &Map<String, Value>) -> Result<()> {
        let doc = Document::new(response, "preferences");
        self.user_preferences = UserPreferences::from_document(&doc)?;
        Ok(())
    }

    /// Case-sensitive check against `module_list`.
    #[must_use]
    pub fn has_module(&self, module: &str) -> bool {
        self.module_list.iter().any(|m| m == module)
    }

    /// Append [`IMPLICIT_MODULE`] unless already listed. Returns whether it
    /// was added.
    pub fn ensure_implicit_module(&mut self) -> bool {
        if self.has_module(IMPLICIT_MODULE) {
            return false;
        }
        self.module_list.push(IMPLICIT_MODULE.to_string());
        true
    }

    /// Permissions for a module, if the server reported any.
    #[must_use]
    pub fn acl_for(&self, module: &str) -> Option<&AclEntry> {
        self.acl.get(module)
    }
}
