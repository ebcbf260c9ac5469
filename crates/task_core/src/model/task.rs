use crate::codec;
use crate::config::TaskConfig;
use crate::error::TaskError;
use regex::{NoExpand, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use time::{Duration, OffsetDateTime};

pub const ANNOTATION_PREFIX: &str = "annotation_";

pub const RESERVED_FIELDS: &[&str] = &[
    "depends", "description", "due", "end", "entry", "imask", "mask", "modified",
    "parent", "priority", "project", "recur", "scheduled", "start", "status",
    "tags", "until", "uuid", "wait",
];

pub(crate) const DATE_FIELDS: &[&str] = &[
    "due", "end", "entry", "modified", "scheduled", "start", "until", "wait",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    Completed,
    Deleted,
    Recurring,
    Waiting,
}

impl Status {
    pub fn from_text(text: &str) -> Result<Self, TaskError> {
        match text {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "deleted" => Ok(Self::Deleted),
            "recurring" => Ok(Self::Recurring),
            "waiting" => Ok(Self::Waiting),
            other => Err(TaskError::field_validation(
                "status",
                format!("unknown status {other:?}"),
            )),
        }
    }

    pub fn as_text(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Deleted => "deleted",
            Self::Recurring => "recurring",
            Self::Waiting => "waiting",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

#[derive(Debug, Clone)]
pub struct Task {
    pub(crate) attributes: BTreeMap<String, String>,
    pub id: Option<u32>,
    blocked: bool,
    blocking: bool,
    pub(crate) urgency_value: f64,
    pub(crate) recalc_urgency: bool,
}

impl Default for Task {
    fn default() -> Self {
        Self::new()
    }
}

// Transient state (id, urgency cache, blocked flags) is not part of a
// record's identity.
impl PartialEq for Task {
    fn eq(&self, other: &Self) -> bool {
        self.attributes == other.attributes
    }
}

impl Task {
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            id: None,
            blocked: false,
            blocking: false,
            urgency_value: 0.0,
            recalc_urgency: true,
        }
    }

    pub fn parse(input: &str) -> Result<Self, TaskError> {
        let attributes = codec::parse_record(input)?;
        let mut task = Self::new();
        task.attributes = attributes;
        Ok(task)
    }

    pub fn compose(&self) -> String {
        codec::legacy::compose(&self.attributes)
    }

    pub fn compose_structured(&self, decorate: bool) -> String {
        codec::structured::compose(self, decorate)
    }

    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn set<V: Into<String>>(&mut self, name: &str, value: V) {
        if name.is_empty() {
            return;
        }
        self.attributes.insert(name.to_string(), value.into());
        self.recalc_urgency = true;
    }

    pub fn set_number(&mut self, name: &str, value: i64) {
        self.set(name, value.to_string());
    }

    pub fn remove(&mut self, name: &str) {
        if self.attributes.remove(name).is_some() {
            self.recalc_urgency = true;
        }
    }

    pub fn get_int(&self, name: &str) -> Result<Option<i64>, TaskError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value.trim().parse::<i64>().map(Some).map_err(|_| {
                TaskError::type_conversion(name, format!("{value:?} is not an integer"))
            }),
        }
    }

    pub fn get_uint(&self, name: &str) -> Result<Option<u64>, TaskError> {
        match self.get(name) {
            None => Ok(None),
            Some(value) => value.trim().parse::<u64>().map(Some).map_err(|_| {
                TaskError::type_conversion(name, format!("{value:?} is not an unsigned integer"))
            }),
        }
    }

    pub fn get_date(&self, name: &str) -> Result<Option<OffsetDateTime>, TaskError> {
        match self.get_int(name)? {
            None => Ok(None),
            Some(seconds) => OffsetDateTime::from_unix_timestamp(seconds)
                .map(Some)
                .map_err(|err| TaskError::type_conversion(name, err)),
        }
    }

    pub fn status(&self) -> Result<Status, TaskError> {
        match self.get("status") {
            None => Ok(Status::Pending),
            Some(text) => Status::from_text(text),
        }
    }

    pub fn set_status(&mut self, status: Status) {
        self.set("status", status.as_text());
    }

    pub fn set_entry(&mut self, now: OffsetDateTime) {
        self.set_number("entry", now.unix_timestamp());
    }

    pub fn set_end(&mut self, now: OffsetDateTime) {
        self.set_number("end", now.unix_timestamp());
    }

    pub fn set_start(&mut self, now: OffsetDateTime) {
        self.set_number("start", now.unix_timestamp());
    }

    pub fn set_modified(&mut self, now: OffsetDateTime) {
        self.set_number("modified", now.unix_timestamp());
    }

    pub fn is_blocked(&self) -> bool {
        self.blocked
    }

    pub fn set_blocked(&mut self, blocked: bool) {
        if self.blocked != blocked {
            self.blocked = blocked;
            self.recalc_urgency = true;
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.blocking
    }

    pub fn set_blocking(&mut self, blocking: bool) {
        if self.blocking != blocking {
            self.blocking = blocking;
            self.recalc_urgency = true;
        }
    }

    pub fn is_overdue(&self, now: OffsetDateTime) -> bool {
        matches!(self.get_date("due"), Ok(Some(due)) if due < now)
    }

    pub fn is_duetoday(&self, now: OffsetDateTime) -> bool {
        matches!(self.get_date("due"), Ok(Some(due)) if due.date() == now.date())
    }

    pub fn is_due(&self, now: OffsetDateTime) -> bool {
        matches!(self.get_date("due"), Ok(Some(due)) if due - now <= Duration::days(7))
    }

    pub fn tags(&self) -> Vec<String> {
        self.get("tags")
            .map(|value| {
                value
                    .split(',')
                    .filter(|tag| !tag.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tag_count(&self) -> usize {
        self.get("tags")
            .map_or(0, |value| value.split(',').filter(|tag| !tag.is_empty()).count())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.get("tags")
            .is_some_and(|value| value.split(',').any(|candidate| candidate == tag))
    }

    pub fn add_tag(&mut self, tag: &str) {
        if tag.is_empty() || self.has_tag(tag) {
            return;
        }
        let mut tags = self.tags();
        tags.push(tag.to_string());
        self.set("tags", tags.join(","));
    }

    pub fn add_tags<'a, I>(&mut self, tags: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for tag in tags {
            self.add_tag(tag);
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        let tags: Vec<String> = self
            .tags()
            .into_iter()
            .filter(|candidate| candidate != tag)
            .collect();
        if tags.is_empty() {
            self.remove("tags");
        } else {
            self.set("tags", tags.join(","));
        }
    }

    pub fn has_annotations(&self) -> bool {
        self.attributes
            .keys()
            .any(|name| name.starts_with(ANNOTATION_PREFIX))
    }

    pub fn annotation_count(&self) -> usize {
        self.attributes
            .keys()
            .filter(|name| name.starts_with(ANNOTATION_PREFIX))
            .count()
    }

    pub fn annotations(&self) -> Vec<(i64, String)> {
        let mut entries: Vec<(i64, String)> = self
            .attributes
            .iter()
            .filter_map(|(name, value)| {
                name.strip_prefix(ANNOTATION_PREFIX)
                    .and_then(|stamp| stamp.parse::<i64>().ok())
                    .map(|stamp| (stamp, value.clone()))
            })
            .collect();
        // key order is lexicographic, not numeric
        entries.sort_by_key(|(stamp, _)| *stamp);
        entries
    }

    pub fn add_annotation(&mut self, description: &str, now: OffsetDateTime) {
        self.add_annotation_at(now.unix_timestamp(), description);
    }

    pub fn set_annotations(&mut self, entries: &[(i64, String)]) {
        self.remove_annotations();
        for (stamp, description) in entries {
            self.add_annotation_at(*stamp, description);
        }
    }

    pub fn remove_annotations(&mut self) {
        let names: Vec<String> = self
            .attributes
            .keys()
            .filter(|name| name.starts_with(ANNOTATION_PREFIX))
            .cloned()
            .collect();
        for name in names {
            self.remove(&name);
        }
    }

    // A colliding timestamp probes forward until free rather than
    // overwriting the earlier annotation.
    fn add_annotation_at(&mut self, stamp: i64, description: &str) {
        let mut stamp = stamp;
        while self.attributes.contains_key(&format!("{ANNOTATION_PREFIX}{stamp}")) {
            stamp += 1;
        }
        self.set(&format!("{ANNOTATION_PREFIX}{stamp}"), description);
    }

    pub fn udas(&self, config: &TaskConfig) -> Vec<String> {
        self.attributes
            .keys()
            .filter(|name| !is_system_field(name) && config.udas.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn uda_orphans(&self, config: &TaskConfig) -> Vec<String> {
        self.attributes
            .keys()
            .filter(|name| !is_system_field(name) && !config.udas.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn substitute(
        &mut self,
        from: &str,
        to: &str,
        global: bool,
        config: &TaskConfig,
    ) -> Result<bool, TaskError> {
        let pattern = if config.regex {
            from.to_string()
        } else {
            regex::escape(from)
        };
        let matcher = RegexBuilder::new(&pattern)
            .case_insensitive(!config.search_case_sensitive)
            .build()
            .map_err(|err| TaskError::validation(format!("invalid substitution pattern: {err}")))?;

        let mut changed = false;
        if let Some(description) = self.get("description").map(str::to_string) {
            let replaced = rewrite(&matcher, &description, to, global, config.regex);
            if replaced != description {
                self.set("description", replaced);
                changed = true;
            }
        }

        for (stamp, text) in self.annotations() {
            if changed && !global {
                break;
            }
            let replaced = rewrite(&matcher, &text, to, global, config.regex);
            if replaced != text {
                self.set(&format!("{ANNOTATION_PREFIX}{stamp}"), replaced);
                changed = true;
            }
        }

        Ok(changed)
    }
}

// In regex mode `$N` capture references in the replacement expand; in
// literal mode the replacement text is inserted verbatim.
fn rewrite(matcher: &Regex, text: &str, to: &str, global: bool, expand: bool) -> String {
    match (expand, global) {
        (true, true) => matcher.replace_all(text, to).into_owned(),
        (true, false) => matcher.replace(text, to).into_owned(),
        (false, true) => matcher.replace_all(text, NoExpand(to)).into_owned(),
        (false, false) => matcher.replace(text, NoExpand(to)).into_owned(),
    }
}

// An annotation key only counts as a system field when it carries a real
// timestamp; a malformed one falls through to the orphan partition.
fn is_system_field(name: &str) -> bool {
    RESERVED_FIELDS.contains(&name)
        || name
            .strip_prefix(ANNOTATION_PREFIX)
            .is_some_and(|stamp| stamp.parse::<i64>().is_ok())
}
