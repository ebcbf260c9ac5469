use crate::error::TaskError;
use crate::model::{ANNOTATION_PREFIX, DATE_FIELDS};
use std::collections::BTreeMap;

pub(crate) mod legacy;
pub(crate) mod structured;

// The first non-whitespace character selects the format: '[' is the legacy
// bracketed form, '{' the structured JSON form.
pub(crate) fn parse_record(input: &str) -> Result<BTreeMap<String, String>, TaskError> {
    let trimmed = input.trim();
    let attributes = match trimmed.chars().next() {
        Some('[') => legacy::parse(trimmed)?,
        Some('{') => structured::parse(trimmed)?,
        _ => {
            return Err(TaskError::format_error(
                "record is neither legacy nor structured format",
            ));
        }
    };
    check_reserved_types(&attributes)?;
    Ok(attributes)
}

fn check_reserved_types(attributes: &BTreeMap<String, String>) -> Result<(), TaskError> {
    for name in DATE_FIELDS {
        if let Some(value) = attributes.get(*name)
            && value.parse::<i64>().is_err()
        {
            return Err(TaskError::format_error(format!(
                "{name}: expected epoch seconds, got {value:?}"
            )));
        }
    }
    for name in attributes.keys() {
        if let Some(stamp) = name.strip_prefix(ANNOTATION_PREFIX)
            && stamp.parse::<i64>().is_err()
        {
            return Err(TaskError::format_error(format!(
                "{name}: annotation key must carry an epoch timestamp"
            )));
        }
    }
    Ok(())
}
