//! CI pipeline registry entries.
//!
//! The registry file is a sequence of `{project: {...}}` mappings. Only the
//! keys the checks reason about are typed; the total key count is retained so
//! that entries carrying nothing but a name can be detected.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

/// Pipelines whose job lists are inspected for voting status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineKind {
    Gate,
    Periodic,
    PeriodicHourly,
    Post,
    Promote,
}

impl PipelineKind {
    /// All inspected pipelines, in scan order.
    pub const ALL: [PipelineKind; 5] = [
        PipelineKind::Gate,
        PipelineKind::Periodic,
        PipelineKind::PeriodicHourly,
        PipelineKind::Post,
        PipelineKind::Promote,
    ];

    /// Key used for this pipeline in the registry file.
    pub fn key(self) -> &'static str {
        match self {
            PipelineKind::Gate => "gate",
            PipelineKind::Periodic => "periodic",
            PipelineKind::PeriodicHourly => "periodic-1hr",
            PipelineKind::Post => "post",
            PipelineKind::Promote => "promote",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-job settings; only `voting` matters here, other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct JobOptions {
    #[serde(default)]
    pub voting: Option<bool>,
}

/// A job reference inside a pipeline's `jobs:` list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Job {
    /// `- job-name`
    Name(String),
    /// `- job-name: {voting: false, ...}`
    Configured(BTreeMap<String, Option<JobOptions>>),
}

impl Job {
    /// Names of jobs in this entry explicitly marked `voting: false`.
    pub fn non_voting(&self) -> Vec<&str> {
        match self {
            Job::Name(_) => Vec::new(),
            Job::Configured(jobs) => jobs
                .iter()
                .filter(|(_, opts)| {
                    matches!(opts, Some(JobOptions { voting: Some(false) }))
                })
                .map(|(name, _)| name.as_str())
                .collect(),
        }
    }
}

/// A pipeline section, e.g. `gate: {jobs: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub jobs: Vec<Job>,
}

/// The body of one registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRegistryProject")]
pub struct RegistryProject {
    pub name: String,
    pub default_branch: Option<String>,
    pub templates: Vec<String>,
    pub pipelines: BTreeMap<PipelineKind, Pipeline>,
    key_count: usize,
}

impl RegistryProject {
    /// A project with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_branch: None,
            templates: Vec::new(),
            pipelines: BTreeMap::new(),
            key_count: 1,
        }
    }

    /// Number of keys in the entry, `name` included.
    pub fn key_count(&self) -> usize {
        self.key_count
    }

    pub fn pipeline(&self, kind: PipelineKind) -> Option<&Pipeline> {
        self.pipelines.get(&kind)
    }
}

/// `{project: {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistryEntry {
    pub project: RegistryProject,
}

impl RegistryEntry {
    pub fn name(&self) -> &str {
        &self.project.name
    }
}

#[derive(Deserialize)]
struct RawRegistryProject {
    name: String,
    #[serde(flatten)]
    rest: BTreeMap<String, serde_yaml::Value>,
}

impl TryFrom<RawRegistryProject> for RegistryProject {
    type Error = String;

    fn try_from(raw: RawRegistryProject) -> Result<Self, Self::Error> {
        let key_count = 1 + raw.rest.len();
        let field = |key: &str| raw.rest.get(key).cloned();

        let default_branch = field("default-branch")
            .map(serde_yaml::from_value::<String>)
            .transpose()
            .map_err(|e| format!("project {}: invalid default-branch: {e}", raw.name))?;
        let templates = field("templates")
            .map(serde_yaml::from_value::<Vec<String>>)
            .transpose()
            .map_err(|e| format!("project {}: invalid templates: {e}", raw.name))?
            .unwrap_or_default();

        let mut pipelines = BTreeMap::new();
        for kind in PipelineKind::ALL {
            let Some(value) = field(kind.key()) else { continue };
            let pipeline = if value.is_null() {
                Pipeline::default()
            } else {
                serde_yaml::from_value::<Pipeline>(value)
                    .map_err(|e| format!("project {}: invalid {kind} pipeline: {e}", raw.name))?
            };
            pipelines.insert(kind, pipeline);
        }

        Ok(Self {
            name: raw.name,
            default_branch,
            templates,
            pipelines,
            key_count,
        })
    }
}
