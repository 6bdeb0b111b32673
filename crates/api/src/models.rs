use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records addressable by a numeric id, searchable with [`crate::read_by_id`].
pub trait Identified {
    fn id(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Opened,
    Closed,
}

impl IssueState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Opened => "opened",
            IssueState::Closed => "closed",
        }
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueType {
    Issue,
    Incident,
    TestCase,
    Task,
    #[default]
    #[serde(other)]
    Other,
}

/// A label as GitLab sends it: a bare name by default, or an object when
/// `with_labels_details=true` is requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        id: Option<u64>,
        #[serde(default)]
        color: Option<String>,
    },
}

impl Label {
    pub fn name(&self) -> &str {
        match self {
            Label::Name(name) | Label::Detailed { name, .. } => name,
        }
    }
}

/// User reference embedded in issues as `author` and `assignees`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub state: String,
    pub web_url: String,
}

/// Snapshot of a remote issue as returned by a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    pub iid: u64,
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: IssueState,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub assignees: Vec<User>,
    pub author: User,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub confidential: bool,
    #[serde(rename = "type", default)]
    pub issue_type: IssueType,
    #[serde(default)]
    pub web_url: Option<String>,
}

impl Issue {
    pub fn label_names(&self) -> Vec<&str> {
        self.labels.iter().map(Label::name).collect()
    }
}

impl Identified for Issue {
    fn id(&self) -> u64 {
        self.id
    }
}
