use crate::error::TaskError;
use crate::model::{ANNOTATION_PREFIX, Task};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

pub(crate) fn parse(input: &str) -> Result<BTreeMap<String, String>, TaskError> {
    let value: Value = serde_json::from_str(input)
        .map_err(|err| TaskError::format_error(format!("invalid structured payload: {err}")))?;
    let object = value
        .as_object()
        .ok_or_else(|| TaskError::format_error("structured payload must be an object"))?;

    let mut attributes = BTreeMap::new();
    for (name, value) in object {
        match name.as_str() {
            // Transient decorations some producers attach.
            "id" | "urgency" => {}
            "tags" | "depends" => {
                let joined = parse_token_list(name, value)?;
                if !joined.is_empty() {
                    attributes.insert(name.clone(), joined);
                }
            }
            "annotations" => parse_annotations(value, &mut attributes)?,
            _ => {
                attributes.insert(name.clone(), parse_scalar(name, value)?);
            }
        }
    }
    Ok(attributes)
}

fn parse_scalar(name: &str, value: &Value) -> Result<String, TaskError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(TaskError::format_error(format!("field {name:?} must be a string"))),
    }
}

fn parse_token_list(name: &str, value: &Value) -> Result<String, TaskError> {
    match value {
        // Older exports carried these pre-joined.
        Value::String(text) => Ok(text.clone()),
        Value::Array(items) => {
            let mut tokens: Vec<&str> = Vec::with_capacity(items.len());
            for item in items {
                let token = item.as_str().ok_or_else(|| {
                    TaskError::format_error(format!("{name} entries must be strings"))
                })?;
                if !tokens.contains(&token) {
                    tokens.push(token);
                }
            }
            Ok(tokens.join(","))
        }
        _ => Err(TaskError::format_error(format!(
            "field {name:?} must be an array of strings"
        ))),
    }
}

fn parse_annotations(
    value: &Value,
    attributes: &mut BTreeMap<String, String>,
) -> Result<(), TaskError> {
    let items = value
        .as_array()
        .ok_or_else(|| TaskError::format_error("annotations must be an array"))?;

    for item in items {
        let object = item
            .as_object()
            .ok_or_else(|| TaskError::format_error("each annotation must be an object"))?;

        let entry = object
            .get("entry")
            .ok_or_else(|| TaskError::format_error("annotation missing entry"))?;
        let stamp = match entry {
            Value::String(text) => text.parse::<i64>().ok(),
            Value::Number(number) => number.as_i64(),
            _ => None,
        }
        .ok_or_else(|| TaskError::format_error("annotation entry must be epoch seconds"))?;

        let description = object
            .get("description")
            .and_then(Value::as_str)
            .ok_or_else(|| TaskError::format_error("annotation missing description"))?;

        let mut stamp = stamp;
        while attributes.contains_key(&format!("{ANNOTATION_PREFIX}{stamp}")) {
            stamp += 1;
        }
        attributes.insert(format!("{ANNOTATION_PREFIX}{stamp}"), description.to_string());
    }

    Ok(())
}

pub(crate) fn compose(task: &Task, decorate: bool) -> String {
    let mut object = Map::new();

    for (name, value) in &task.attributes {
        if value.is_empty()
            || name.starts_with(ANNOTATION_PREFIX)
            || name == "tags"
            || name == "depends"
        {
            continue;
        }
        object.insert(name.clone(), Value::String(value.clone()));
    }

    let tags = task.tags();
    if !tags.is_empty() {
        object.insert("tags".to_string(), json!(tags));
    }

    let depends = task.dependency_refs();
    if !depends.is_empty() {
        object.insert("depends".to_string(), json!(depends));
    }

    let annotations: Vec<Value> = task
        .annotations()
        .into_iter()
        .map(|(stamp, description)| {
            json!({ "entry": stamp.to_string(), "description": description })
        })
        .collect();
    if !annotations.is_empty() {
        object.insert("annotations".to_string(), Value::Array(annotations));
    }

    if decorate && let Some(id) = task.id {
        object.insert("id".to_string(), json!(id));
    }

    Value::Object(object).to_string()
}
