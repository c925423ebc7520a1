use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::task::TaskId;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyId(String);

impl DependencyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DependencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DependencyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for DependencyId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which endpoint of the predecessor constrains which endpoint of the successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DependencyType {
    /// Finish to start.
    #[serde(rename = "FS")]
    FinishToStart,
    /// Start to start.
    #[serde(rename = "SS")]
    StartToStart,
    /// Finish to finish.
    #[serde(rename = "FF")]
    FinishToFinish,
    /// Start to finish.
    #[serde(rename = "SF")]
    StartToFinish,
}

impl DependencyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyType::FinishToStart => "FS",
            DependencyType::StartToStart => "SS",
            DependencyType::FinishToFinish => "FF",
            DependencyType::StartToFinish => "SF",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FS" => Ok(DependencyType::FinishToStart),
            "SS" => Ok(DependencyType::StartToStart),
            "FF" => Ok(DependencyType::FinishToFinish),
            "SF" => Ok(DependencyType::StartToFinish),
            other => Err(format!("unknown dependency type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DependencyMode {
    /// Participates in automatic propagation.
    #[default]
    Asap,
    /// Advisory only.
    Free,
}

impl FromStr for DependencyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asap" => Ok(DependencyMode::Asap),
            "free" => Ok(DependencyMode::Free),
            other => Err(format!("unknown dependency mode '{other}'")),
        }
    }
}

/// Largest lag, in days either way, a dependency may carry.
pub const MAX_LAG_DAYS: i64 = 36_500;

/// Directed precedence link from `from` (predecessor) to `to` (successor).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub from: TaskId,
    pub to: TaskId,
    #[serde(rename = "type")]
    pub kind: DependencyType,
    /// Signed day offset; negative values are lead time.
    #[serde(default)]
    pub lag: i64,
    #[serde(default)]
    pub mode: DependencyMode,
    /// Excluded from propagation even when `mode` is ASAP.
    #[serde(default)]
    pub hard_constraint: bool,
}

impl Dependency {
    pub fn new(
        id: impl Into<DependencyId>,
        from: impl Into<TaskId>,
        to: impl Into<TaskId>,
        kind: DependencyType,
    ) -> Self {
        Self {
            id: id.into(),
            from: from.into(),
            to: to.into(),
            kind,
            lag: 0,
            mode: DependencyMode::Asap,
            hard_constraint: false,
        }
    }

    pub fn finish_to_start(
        id: impl Into<DependencyId>,
        from: impl Into<TaskId>,
        to: impl Into<TaskId>,
    ) -> Self {
        Self::new(id, from, to, DependencyType::FinishToStart)
    }

    pub fn with_lag(mut self, lag: i64) -> Self {
        self.lag = lag;
        self
    }

    pub fn with_mode(mut self, mode: DependencyMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn hard(mut self) -> Self {
        self.hard_constraint = true;
        self
    }

    /// Whether the scheduler may move the successor to satisfy this edge.
    pub fn is_automatic(&self) -> bool {
        self.mode == DependencyMode::Asap && !self.hard_constraint
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}
