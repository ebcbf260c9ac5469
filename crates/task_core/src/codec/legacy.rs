use crate::error::TaskError;
use std::collections::BTreeMap;

pub(crate) fn parse(input: &str) -> Result<BTreeMap<String, String>, TaskError> {
    let inner = input
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or_else(|| TaskError::format_error("unmatched outer brackets"))?;

    let mut attributes = BTreeMap::new();
    let mut chars = inner.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == ':' {
                break;
            }
            if c.is_whitespace() || c == '"' {
                return Err(TaskError::format_error(format!(
                    "malformed field near {name:?}: expected ':'"
                )));
            }
            name.push(c);
            chars.next();
        }
        if name.is_empty() {
            return Err(TaskError::format_error("empty field name"));
        }
        if chars.next() != Some(':') {
            return Err(TaskError::format_error(format!("field {name:?} has no value")));
        }
        if chars.next() != Some('"') {
            return Err(TaskError::format_error(format!(
                "field {name:?} value is not quoted"
            )));
        }

        let mut value = String::new();
        loop {
            match chars.next() {
                None => {
                    return Err(TaskError::format_error(format!(
                        "unterminated value for field {name:?}"
                    )));
                }
                Some('\\') => match chars.next() {
                    None => {
                        return Err(TaskError::format_error(format!(
                            "unterminated escape in field {name:?}"
                        )));
                    }
                    Some(escaped) => value.push(escaped),
                },
                Some('"') => break,
                Some(c) => value.push(c),
            }
        }

        attributes.insert(name, value);
    }

    // Records written before the status field existed imply pending.
    if !attributes.is_empty() && !attributes.contains_key("status") {
        attributes.insert("status".to_string(), "pending".to_string());
    }

    Ok(attributes)
}

pub(crate) fn compose(attributes: &BTreeMap<String, String>) -> String {
    let mut out = String::from("[");
    let mut first = true;
    for (name, value) in attributes {
        if value.is_empty() {
            continue;
        }
        if !first {
            out.push(' ');
        }
        out.push_str(name);
        out.push_str(":\"");
        out.push_str(&escape(value));
        out.push('"');
        first = false;
    }
    out.push(']');
    out
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '[' | ']') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
