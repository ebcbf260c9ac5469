use crate::config::{TaskConfig, UdaType};
use crate::error::TaskError;
use time::OffsetDateTime;

use super::depends::Dependency;
use super::task::{ANNOTATION_PREFIX, DATE_FIELDS, Status, Task};

const PRIORITIES: &[&str] = &["H", "M", "L"];

impl Task {
    pub fn validate(
        &mut self,
        config: &TaskConfig,
        now: OffsetDateTime,
        apply_default: bool,
    ) -> Result<(), TaskError> {
        // Reject bad values before mutating anything.
        for (name, value) in &self.attributes {
            self.validate_before(config, name, value)?;
        }

        if !self.has("entry") && !apply_default {
            return Err(TaskError::field_validation("entry", "missing required field"));
        }

        if !self.has("status") {
            self.set_status(Status::Pending);
        }

        if apply_default {
            if !self.has("entry") {
                self.set_entry(now);
            }
            if let Some(project) = config.default_project.as_deref()
                && !self.has("project")
            {
                self.set("project", project);
            }
            if let Some(priority) = config.default_priority.as_deref()
                && !self.has("priority")
            {
                self.set("priority", priority);
            }
            if let Some(due) = config.default_due.as_deref()
                && !self.has("due")
            {
                self.set("due", due);
            }

            // Configured defaults must themselves be legal values.
            for name in ["priority", "due"] {
                if let Some(value) = self.get(name).map(str::to_string) {
                    self.validate_before(config, name, &value)?;
                }
            }
        }

        Ok(())
    }

    fn validate_before(&self, config: &TaskConfig, name: &str, value: &str) -> Result<(), TaskError> {
        if DATE_FIELDS.contains(&name) {
            if value.parse::<i64>().is_err() {
                return Err(TaskError::field_validation(
                    name,
                    format!("expected epoch seconds, got {value:?}"),
                ));
            }
        } else if name == "status" {
            Status::from_text(value)?;
        } else if name == "priority" {
            if !PRIORITIES.contains(&value) {
                return Err(TaskError::field_validation(
                    name,
                    format!("expected one of H, M, L, got {value:?}"),
                ));
            }
        } else if name == "tags" {
            if value.is_empty() || value.split(',').any(|tag| tag.is_empty()) {
                return Err(TaskError::field_validation(name, "empty tag"));
            }
        } else if name == "depends" {
            for token in value.split(',') {
                Dependency::parse(token)?;
            }
        } else if let Some(stamp) = name.strip_prefix(ANNOTATION_PREFIX) {
            if stamp.parse::<i64>().is_err() {
                return Err(TaskError::field_validation(
                    name,
                    "annotation key must carry an epoch timestamp",
                ));
            }
        } else if let Some(uda_type) = config.udas.get(name) {
            match uda_type {
                UdaType::Numeric => {
                    if value.parse::<f64>().is_err() {
                        return Err(TaskError::field_validation(
                            name,
                            format!("expected a number, got {value:?}"),
                        ));
                    }
                }
                UdaType::Date => {
                    if value.parse::<i64>().is_err() {
                        return Err(TaskError::field_validation(
                            name,
                            format!("expected epoch seconds, got {value:?}"),
                        ));
                    }
                }
                UdaType::Text | UdaType::Duration => {}
            }
        }

        Ok(())
    }
}
