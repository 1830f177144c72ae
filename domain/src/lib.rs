use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error; // For domain-specific errors

pub mod codec;

pub use codec::{CodecError, Record};

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Field '{0}' must be a non-empty string")]
    EmptyField(&'static str),
    #[error("Level must be numeric, got '{0}'")]
    InvalidLevel(String),
    #[error("Member list must contain at least one member id")]
    NoMembers,
}

// --- Personnel ---

/// A personnel record as stored in the ledger under its own `id`.
///
/// Field names on the wire follow the persisted layout (`memberid`,
/// `membername`, ...), so records written by earlier deployments still decode.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Personnel {
    #[serde(rename = "memberid", default)]
    pub id: String,
    #[serde(rename = "membername", default)]
    pub name: String,
    #[serde(rename = "jobtitle", default)]
    pub job_title: String,
    #[serde(default)]
    pub level: i64,
    #[serde(rename = "jobgroup", default)]
    pub job_group: String,
}

impl Personnel {
    /// Builds a personnel record from raw string input.
    ///
    /// All five inputs must be non-empty, and `level` must parse as an integer.
    /// Nothing is checked against the store here.
    pub fn parse(
        id: &str,
        name: &str,
        job_title: &str,
        level: &str,
        job_group: &str,
    ) -> Result<Self, DomainError> {
        require_non_empty("id", id)?;
        require_non_empty("name", name)?;
        require_non_empty("jobTitle", job_title)?;
        require_non_empty("level", level)?;
        require_non_empty("jobGroup", job_group)?;

        let level = level
            .parse::<i64>()
            .map_err(|_| DomainError::InvalidLevel(level.to_string()))?;

        Ok(Self {
            id: id.to_string(),
            name: name.to_string(),
            job_title: job_title.to_string(),
            level,
            job_group: job_group.to_string(),
        })
    }

    /// True when this record was stored under `key`, i.e. it already exists there.
    pub fn is_stored_under(&self, key: &str) -> bool {
        self.id == key
    }
}

// --- Project ---

/// A project record with its ordered, duplicate-free membership list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Project {
    #[serde(default)]
    pub name: String,
    /// Personnel ids; never validated against the personnel index.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub members: Vec<String>,
}

impl Project {
    /// Creates an empty project with the given display name.
    pub fn new(name: &str) -> Result<Self, DomainError> {
        require_non_empty("name", name)?;
        Ok(Self {
            name: name.to_string(),
            members: Vec::new(),
        })
    }

    /// Storage key for this project (see [`project_key`]).
    pub fn key(&self) -> String {
        project_key(&self.name)
    }

    pub fn has_member(&self, member_id: &str) -> bool {
        self.members.iter().any(|m| m == member_id)
    }

    /// Appends each id that is not already a member, in input order.
    ///
    /// The membership check runs again after every insertion, so repeats
    /// inside one batch are only added once. Returns the ids actually added.
    pub fn add_members<S: AsRef<str>>(&mut self, member_ids: &[S]) -> Vec<String> {
        let mut added = Vec::new();
        for member_id in member_ids {
            let member_id = member_id.as_ref();
            if !self.has_member(member_id) {
                self.members.push(member_id.to_string());
                added.push(member_id.to_string());
            }
        }
        added
    }

    /// Removes the first occurrence of `member_id`, keeping the order of the rest.
    /// Returns false (and changes nothing) when the id is not a member.
    pub fn remove_member(&mut self, member_id: &str) -> bool {
        match self.members.iter().position(|m| m == member_id) {
            Some(pos) => {
                self.members.remove(pos);
                true
            }
            None => false,
        }
    }
}

/// Derives the storage key for a project name: every space becomes `_`.
pub fn project_key(name: &str) -> String {
    name.replace(' ', "_")
}

/// Earlier writers emitted `"members": null` for a project with no members.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

fn require_non_empty(field: &'static str, value: &str) -> Result<(), DomainError> {
    if value.is_empty() {
        return Err(DomainError::EmptyField(field));
    }
    Ok(())
}

// --- Key Index ---

/// Ordered list of record keys kept under one well-known ledger key.
/// Append-only; duplicates are not filtered here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct KeyIndex(Vec<String>);

impl KeyIndex {
    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(key.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }
}

impl From<Vec<String>> for KeyIndex {
    fn from(entries: Vec<String>) -> Self {
        Self(entries)
    }
}

impl From<KeyIndex> for Vec<String> {
    fn from(index: KeyIndex) -> Self {
        index.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn personnel_parse_success() {
        let p = Personnel::parse("E1", "Ada", "Engineer", "3", "R&D").unwrap();
        assert_eq!(p.id, "E1");
        assert_eq!(p.name, "Ada");
        assert_eq!(p.job_title, "Engineer");
        assert_eq!(p.level, 3);
        assert_eq!(p.job_group, "R&D");
        assert!(p.is_stored_under("E1"));
        assert!(!p.is_stored_under("E2"));
    }

    #[test]
    fn personnel_parse_accepts_signed_level() {
        assert_eq!(Personnel::parse("E1", "a", "b", "-2", "c").unwrap().level, -2);
        assert_eq!(Personnel::parse("E1", "a", "b", "+7", "c").unwrap().level, 7);
    }

    #[test]
    fn personnel_parse_fails_empty_field() {
        assert_eq!(
            Personnel::parse("", "a", "b", "1", "c"),
            Err(DomainError::EmptyField("id"))
        );
        assert_eq!(
            Personnel::parse("E1", "a", "b", "1", ""),
            Err(DomainError::EmptyField("jobGroup"))
        );
        assert_eq!(
            Personnel::parse("E1", "a", "b", "", "c"),
            Err(DomainError::EmptyField("level"))
        );
    }

    #[test]
    fn personnel_parse_fails_non_integer_level() {
        let result = Personnel::parse("E1", "a", "b", "senior", "c");
        assert!(matches!(result, Err(DomainError::InvalidLevel(l)) if l == "senior"));
        assert!(matches!(
            Personnel::parse("E1", "a", "b", "1.5", "c"),
            Err(DomainError::InvalidLevel(_))
        ));
    }

    #[test]
    fn project_key_replaces_every_space() {
        assert_eq!(project_key("Alpha Beta"), "Alpha_Beta");
        assert_eq!(project_key(" a  b "), "_a__b_");
        assert_eq!(project_key("NoSpaces"), "NoSpaces");
        // Only the space character is replaced
        assert_eq!(project_key("tab\there"), "tab\there");
    }

    #[test]
    fn project_new_rejects_empty_name() {
        assert_eq!(Project::new(""), Err(DomainError::EmptyField("name")));
        let project = Project::new("Alpha Beta").unwrap();
        assert_eq!(project.key(), "Alpha_Beta");
        assert!(project.members.is_empty());
    }

    #[test]
    fn add_members_skips_duplicates_within_batch() {
        let mut project = Project::new("P1").unwrap();
        let added = project.add_members(&["E1", "E2", "E1"]);
        assert_eq!(project.members, vec!["E1", "E2"]);
        assert_eq!(added, vec!["E1", "E2"]);

        let added = project.add_members(&["E2", "E3"]);
        assert_eq!(project.members, vec!["E1", "E2", "E3"]);
        assert_eq!(added, vec!["E3"]);
    }

    #[test]
    fn remove_member_preserves_order() {
        let mut project = Project::new("P1").unwrap();
        project.add_members(&["E1", "E2", "E3"]);
        assert!(project.remove_member("E2"));
        assert_eq!(project.members, vec!["E1", "E3"]);
    }

    #[test]
    fn remove_missing_member_is_noop() {
        let mut project = Project::new("P1").unwrap();
        project.add_members(&["E1", "E2"]);
        assert!(!project.remove_member("E3"));
        assert_eq!(project.members, vec!["E1", "E2"]);
    }

    #[test]
    fn key_index_keeps_duplicates_in_order() {
        let mut index = KeyIndex::default();
        index.push("a");
        index.push("b");
        index.push("a");
        assert_eq!(index.entries(), ["a", "b", "a"]);
        assert_eq!(index.len(), 3);
        assert!(index.contains("b"));
        assert!(!index.contains("c"));
    }
}
