//! Profile registry: named, isolated usage-history namespaces.
//!
//! Exactly one profile is active at a time. The "default" profile always
//! exists implicitly, needs no stored record, and can never be created,
//! deleted or renamed. Deleting a profile also deletes its history and
//! summary documents in the same call; that is a destructive side effect, so
//! every precondition (known name, not reserved, not active) is checked
//! before anything is mutated.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{QuotawatchError, Result};
use crate::models::Profile;
use crate::storage::DocumentStore;

pub const DEFAULT_PROFILE: &str = "default";

fn default_active() -> String {
    DEFAULT_PROFILE.to_string()
}

/// The persisted registry document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilesDocument {
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default = "default_active")]
    pub active: String,
}

impl Default for ProfilesDocument {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::new(),
            active: default_active(),
        }
    }
}

/// One row of `list()` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileListing {
    pub name: String,
    pub active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<Utc>>,
}

pub struct ProfileRegistry {
    docs: DocumentStore,
}

impl ProfileRegistry {
    pub fn new(docs: DocumentStore) -> Self {
        Self { docs }
    }

    pub fn load(&self) -> Result<ProfilesDocument> {
        self.docs.read_document(&self.docs.profiles_path())
    }

    /// Name of the currently active profile.
    pub fn active(&self) -> Result<String> {
        Ok(self.load()?.active)
    }

    /// Register a new profile. Fails on the reserved name, an already
    /// registered name, or a name unsafe to embed in a file name.
    pub fn create(
        &self,
        name: &str,
        auth_token: &str,
        base_url: Option<String>,
    ) -> Result<Profile> {
        validate_name(name)?;
        if name == DEFAULT_PROFILE {
            return Err(QuotawatchError::ReservedProfile(name.to_string()));
        }

        let mut doc = self.load()?;
        if doc.profiles.contains_key(name) {
            return Err(QuotawatchError::ProfileExists(name.to_string()));
        }

        let profile = Profile {
            name: name.to_string(),
            auth_token: auth_token.to_string(),
            base_url,
            created_at: Utc::now(),
        };
        doc.profiles.insert(name.to_string(), profile.clone());
        self.save(&doc)?;
        info!(profile = name, "Created profile");
        Ok(profile)
    }

    /// Make a profile the active one.
    pub fn switch(&self, name: &str) -> Result<()> {
        let mut doc = self.load()?;
        if name != DEFAULT_PROFILE && !doc.profiles.contains_key(name) {
            return Err(QuotawatchError::UnknownProfile(name.to_string()));
        }
        doc.active = name.to_string();
        self.save(&doc)?;
        info!(profile = name, "Switched active profile");
        Ok(())
    }

    /// All profiles, default first, with the active one flagged.
    pub fn list(&self) -> Result<Vec<ProfileListing>> {
        let doc = self.load()?;
        let mut listings = vec![ProfileListing {
            name: DEFAULT_PROFILE.to_string(),
            active: doc.active == DEFAULT_PROFILE,
            base_url: None,
            created_at: None,
        }];
        for (name, profile) in &doc.profiles {
            listings.push(ProfileListing {
                name: name.clone(),
                active: doc.active == *name,
                base_url: profile.base_url.clone(),
                created_at: Some(profile.created_at),
            });
        }
        Ok(listings)
    }

    /// Delete a profile and its data documents as one intent.
    ///
    /// All preconditions are checked before any mutation: the reserved
    /// default cannot be removed, an unknown name is rejected, and the active
    /// profile must be switched away from first.
    pub fn delete(&self, name: &str) -> Result<()> {
        if name == DEFAULT_PROFILE {
            return Err(QuotawatchError::ReservedProfile(name.to_string()));
        }

        let mut doc = self.load()?;
        if !doc.profiles.contains_key(name) {
            return Err(QuotawatchError::UnknownProfile(name.to_string()));
        }
        if doc.active == name {
            return Err(QuotawatchError::ProfileActive(name.to_string()));
        }

        doc.profiles.remove(name);
        self.save(&doc)?;
        self.docs.remove_profile_documents(name)?;
        info!(profile = name, "Deleted profile and its documents");
        Ok(())
    }

    fn save(&self, doc: &ProfilesDocument) -> Result<()> {
        self.docs.write_document(&self.docs.profiles_path(), doc)
    }
}

/// Profile names end up embedded in document file names, so only a
/// conservative character set is allowed.
fn validate_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(QuotawatchError::InvalidProfileName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_validation() {
        assert!(validate_name("work").is_ok());
        assert!(validate_name("team-2_b").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("../etc").is_err());
        assert!(validate_name("with space").is_err());
    }
}
