//! Persisted snapshot – the resume saved between sessions as one JSON value
//! under a fixed key.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::{Education, Experience, PersonalInfo, ProfilePicture, ResumeDocument, Skill};

pub const SNAPSHOT_KEY: &str = "resumeData";

/// Flat, unversioned snapshot. Every field is optional on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experiences: Option<Vec<Experience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub educations: Option<Vec<Education>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfilePicture>,
}

impl Snapshot {
    pub fn capture(doc: &ResumeDocument) -> Self {
        Self {
            template: Some(doc.selected_template),
            personal_info: Some(doc.personal_info.clone()),
            experiences: Some(doc.experiences.clone()),
            educations: Some(doc.educations.clone()),
            skills: Some(doc.skills.clone()),
            summary: Some(doc.summary.clone()),
            profile: doc.profile_picture.clone(),
        }
    }

    /// Overlay the snapshot onto `doc`. Absent fields, empty lists and an
    /// empty summary leave the current value in place.
    pub fn restore_into(self, doc: &mut ResumeDocument) {
        if let Some(t) = self.template {
            doc.selected_template = t;
        }
        if let Some(info) = self.personal_info {
            doc.personal_info = info;
        }
        if let Some(list) = self.experiences.filter(|l| !l.is_empty()) {
            doc.experiences = list;
        }
        if let Some(list) = self.educations.filter(|l| !l.is_empty()) {
            doc.educations = list;
        }
        if let Some(list) = self.skills.filter(|l| !l.is_empty()) {
            doc.skills = list;
        }
        if let Some(summary) = self.summary.filter(|s| !s.is_empty()) {
            doc.summary = summary;
        }
        if let Some(picture) = self.profile {
            doc.profile_picture = Some(picture);
        }
    }
}

/// A string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Save the document under [`SNAPSHOT_KEY`].
pub fn save(store: &dyn KeyValueStore, doc: &ResumeDocument) -> Result<(), StorageError> {
    let json = serde_json::to_string(&Snapshot::capture(doc))?;
    store.set(SNAPSHOT_KEY, &json)?;
    debug!("saved snapshot ({} bytes)", json.len());
    Ok(())
}

/// Restore a saved snapshot into `doc`, if one exists. Returns whether a
/// snapshot was found.
pub fn load_into(store: &dyn KeyValueStore, doc: &mut ResumeDocument) -> Result<bool, StorageError> {
    let Some(json) = store.get(SNAPSHOT_KEY)? else {
        return Ok(false);
    };
    let snapshot: Snapshot = serde_json::from_str(&json).map_err(|e| {
        warn!("discarding unreadable snapshot: {e}");
        e
    })?;
    snapshot.restore_into(doc);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_snapshot_is_not_an_error() {
        let store = MemoryStore::default();
        let mut doc = ResumeDocument::default();
        assert!(!load_into(&store, &mut doc).unwrap());
    }

    #[test]
    fn fields_restore_independently() {
        let store = MemoryStore::default();
        store
            .set(SNAPSHOT_KEY, r#"{"summary": "Restored", "skills": [{"id": "s1", "name": "Rust"}]}"#)
            .unwrap();

        let mut doc = ResumeDocument::default();
        doc.personal_info.full_name = "Kept".into();
        let exp_id = doc.experiences[0].id.clone();

        assert!(load_into(&store, &mut doc).unwrap());
        assert_eq!(doc.summary, "Restored");
        assert_eq!(doc.skills[0].name, "Rust");
        assert_eq!(doc.personal_info.full_name, "Kept");
        assert_eq!(doc.experiences[0].id, exp_id);
    }

    #[test]
    fn empty_values_do_not_clobber() {
        let store = MemoryStore::default();
        store.set(SNAPSHOT_KEY, r#"{"summary": "", "experiences": []}"#).unwrap();
        let mut doc = ResumeDocument::default();
        doc.summary = "current".into();
        load_into(&store, &mut doc).unwrap();
        assert_eq!(doc.summary, "current");
        assert_eq!(doc.experiences.len(), 1);
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let mut doc = ResumeDocument::default();
        doc.selected_template = 3;
        let json = serde_json::to_value(Snapshot::capture(&doc)).unwrap();
        assert_eq!(json["template"], 3);
        assert!(json["personalInfo"].get("fullName").is_some());
        assert!(json.get("profile").is_none());
    }

    #[test]
    fn corrupt_snapshot_is_an_error() {
        let store = MemoryStore::default();
        store.set(SNAPSHOT_KEY, "{not json").unwrap();
        let mut doc = ResumeDocument::default();
        assert!(matches!(load_into(&store, &mut doc), Err(StorageError::Json(_))));
    }
}
