use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UdaType {
    Text,
    Numeric,
    Date,
    Duration,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyCoefficients {
    pub priority: f64,
    pub project: f64,
    pub active: f64,
    pub scheduled: f64,
    pub waiting: f64,
    pub blocked: f64,
    pub annotations: f64,
    pub tags: f64,
    pub next: f64,
    pub due: f64,
    pub blocking: f64,
    pub age: f64,
}

impl UrgencyCoefficients {
    // Default is all-zero, meaning every term is disabled. These are the
    // weights the upstream task tracker ships with.
    pub fn standard() -> Self {
        Self {
            priority: 6.0,
            project: 1.0,
            active: 4.0,
            scheduled: 5.0,
            waiting: -3.0,
            blocked: -5.0,
            annotations: 1.0,
            tags: 1.0,
            next: 15.0,
            due: 12.0,
            blocking: 8.0,
            age: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskConfig {
    pub default_project: Option<String>,
    pub default_priority: Option<String>,
    pub default_due: Option<String>,
    pub search_case_sensitive: bool,
    pub regex: bool,
    pub udas: BTreeMap<String, UdaType>,
    pub urgency: UrgencyCoefficients,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            default_project: None,
            default_priority: None,
            default_due: None,
            search_case_sensitive: true,
            regex: false,
            udas: BTreeMap::new(),
            urgency: UrgencyCoefficients::default(),
        }
    }
}
