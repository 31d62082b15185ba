//! Repository diff engine.
//!
//! [`diff`] compares desired settings with observed remote state field by
//! field and returns a [`RepoPatch`] holding only the fields that differ.

use serde::Serialize;

use steward_core::{DesiredRepoConfig, RemoteRepository};

/// A partial repository update. `None` means "leave unchanged".
///
/// Serializes to the hosting API's update payload with unchanged fields
/// omitted; a cleared description is sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_downloads: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl RepoPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields this patch changes, in payload order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        let mut note = |set: bool, name: &'static str| {
            if set {
                fields.push(name);
            }
        };
        note(self.description.is_some(), "description");
        note(self.default_branch.is_some(), "default_branch");
        note(self.allow_merge_commit.is_some(), "allow_merge_commit");
        note(self.allow_rebase_merge.is_some(), "allow_rebase_merge");
        note(self.allow_squash_merge.is_some(), "allow_squash_merge");
        note(self.has_downloads.is_some(), "has_downloads");
        note(self.has_issues.is_some(), "has_issues");
        note(self.has_projects.is_some(), "has_projects");
        note(self.has_wiki.is_some(), "has_wiki");
        note(self.archived.is_some(), "archived");
        fields
    }

    /// Overwrite the patched fields of `repo`, leaving the rest untouched.
    pub fn apply_to(&self, repo: &mut RemoteRepository) {
        fn set<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        set(&mut repo.description, &self.description);
        set(&mut repo.default_branch, &self.default_branch);
        set(&mut repo.allow_merge_commit, &self.allow_merge_commit);
        set(&mut repo.allow_rebase_merge, &self.allow_rebase_merge);
        set(&mut repo.allow_squash_merge, &self.allow_squash_merge);
        set(&mut repo.has_downloads, &self.has_downloads);
        set(&mut repo.has_issues, &self.has_issues);
        set(&mut repo.has_projects, &self.has_projects);
        set(&mut repo.has_wiki, &self.has_wiki);
        set(&mut repo.archived, &self.archived);
    }
}

fn changed<T: PartialEq + Clone>(desired: &T, observed: &T) -> Option<T> {
    (desired != observed).then(|| desired.clone())
}

/// Minimal patch taking `observed` to `desired`.
///
/// Requesting `archived` always yields `archived: true`, whatever the
/// observed flag says; the transition is one-way and never un-archives.
pub fn diff(desired: &DesiredRepoConfig, observed: &RemoteRepository) -> RepoPatch {
    RepoPatch {
        description: changed(&desired.description, &observed.description),
        default_branch: changed(&desired.default_branch, &observed.default_branch),
        allow_merge_commit: changed(&desired.allow_merge_commit, &observed.allow_merge_commit),
        allow_rebase_merge: changed(&desired.allow_rebase_merge, &observed.allow_rebase_merge),
        allow_squash_merge: changed(&desired.allow_squash_merge, &observed.allow_squash_merge),
        has_downloads: changed(&desired.has_downloads, &observed.has_downloads),
        has_issues: changed(&desired.has_issues, &observed.has_issues),
        has_projects: changed(&desired.has_projects, &observed.has_projects),
        has_wiki: changed(&desired.has_wiki, &observed.has_wiki),
        archived: desired.archived.then_some(true),
    }
}
