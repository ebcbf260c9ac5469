use crate::error::TaskError;
use std::fmt;
use std::str::FromStr;

use super::task::Task;

// A dependency entry is either a numeric id assigned by the surrounding
// collection or an opaque identifier (typically a uuid) it has not resolved
// yet. Resolution happens outside this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dependency {
    Id(u32),
    Reference(String),
}

impl Dependency {
    pub fn parse(token: &str) -> Result<Self, TaskError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TaskError::field_validation("depends", "empty dependency entry"));
        }
        if token.starts_with('-') && token[1..].chars().all(|c| c.is_ascii_digit()) {
            return Err(TaskError::field_validation(
                "depends",
                format!("negative id {token:?}"),
            ));
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            return token.parse::<u32>().map(Self::Id).map_err(|_| {
                TaskError::field_validation("depends", format!("id {token:?} out of range"))
            });
        }
        if token.chars().any(|c| c.is_whitespace() || c == ',') {
            return Err(TaskError::field_validation(
                "depends",
                format!("malformed entry {token:?}"),
            ));
        }
        Ok(Self::Reference(token.to_string()))
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Reference(reference) => f.write_str(reference),
        }
    }
}

impl FromStr for Dependency {
    type Err = TaskError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::parse(token)
    }
}

impl From<u32> for Dependency {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl Task {
    pub fn dependencies(&self) -> Vec<Dependency> {
        self.get("depends")
            .map(|value| {
                value
                    .split(',')
                    .filter(|token| !token.is_empty())
                    .filter_map(|token| Dependency::parse(token).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn dependency_ids(&self) -> Vec<u32> {
        self.dependencies()
            .into_iter()
            .filter_map(|dependency| match dependency {
                Dependency::Id(id) => Some(id),
                Dependency::Reference(_) => None,
            })
            .collect()
    }

    pub fn dependency_refs(&self) -> Vec<String> {
        self.get("depends")
            .map(|value| {
                value
                    .split(',')
                    .filter(|token| !token.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn add_dependency<D: Into<Dependency>>(&mut self, dependency: D) {
        let dependency = dependency.into();
        let mut dependencies = self.dependencies();
        if dependencies.contains(&dependency) {
            return;
        }
        dependencies.push(dependency);
        self.store_dependencies(&dependencies);
    }

    pub fn remove_dependency(&mut self, dependency: &Dependency) {
        let dependencies: Vec<Dependency> = self
            .dependencies()
            .into_iter()
            .filter(|candidate| candidate != dependency)
            .collect();
        self.store_dependencies(&dependencies);
    }

    // An empty list means no depends field at all, never depends:"".
    fn store_dependencies(&mut self, dependencies: &[Dependency]) {
        if dependencies.is_empty() {
            self.remove("depends");
        } else {
            let joined = dependencies
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<String>>()
                .join(",");
            self.set("depends", joined);
        }
    }
}
