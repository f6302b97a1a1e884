use std::fmt;

use clockabilly::{
    DateTime,
    Utc,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::*;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

// The apiserver only ever sends "True", "False" or "Unknown", but some operators get creative;
// anything we don't recognize is treated as Unknown
impl From<&str> for ConditionStatus {
    fn from(s: &str) -> ConditionStatus {
        match s {
            "True" => ConditionStatus::True,
            "False" => ConditionStatus::False,
            _ => ConditionStatus::Unknown,
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Condition {
    pub type_: String,
    pub status: ConditionStatus,
    pub message: String,
    pub last_transition_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    #[serde(rename = "type")]
    type_: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    last_transition_time: Option<String>,
}

impl Condition {
    pub fn new(type_: &str, status: ConditionStatus) -> Condition {
        Condition { type_: type_.into(), status, ..Default::default() }
    }

    pub fn with_message(mut self, message: &str) -> Condition {
        self.message = message.into();
        self
    }

    pub fn with_transition_time(mut self, ts: DateTime<Utc>) -> Condition {
        self.last_transition_time = Some(ts);
        self
    }

    // Conditions without a type are meaningless, so they get dropped instead of failing the
    // whole snapshot
    pub fn from_value(val: &Value) -> Option<Condition> {
        let raw: RawCondition = serde_json::from_value(val.clone()).ok()?;
        let last_transition_time = raw
            .last_transition_time
            .as_deref()
            .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
            .map(|ts| ts.with_timezone(&Utc));
        Some(Condition {
            type_: raw.type_,
            status: raw.status.as_str().into(),
            message: raw.message.unwrap_or_default(),
            last_transition_time,
        })
    }

    pub fn is(&self, type_: &str, status: ConditionStatus) -> bool {
        self.type_ == type_ && self.status == status
    }
}

pub fn parse_conditions(val: &Value) -> Vec<Condition> {
    match val.as_array() {
        Some(items) => items.iter().filter_map(Condition::from_value).collect(),
        None => vec![],
    }
}

pub fn find<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    let mut matches = conditions.iter().filter(|c| c.type_ == type_);
    let first = matches.next();
    if first.is_some() && matches.next().is_some() {
        debug!("found multiple {type_} conditions, using the first one");
    }
    first
}

pub fn evaluate(conditions: &[Condition], type_: &str, status: ConditionStatus) -> bool {
    find(conditions, type_).is_some_and(|c| c.status == status)
}

// Node conditions are reported such that only the last entry reflects the current state
pub fn evaluate_last(conditions: &[Condition], type_: &str, status: ConditionStatus) -> bool {
    conditions.last().is_some_and(|c| c.is(type_, status))
}

// Conditions that never transitioned sort before everything else
pub fn latest(conditions: &[Condition]) -> Option<&Condition> {
    conditions.iter().max_by_key(|c| c.last_transition_time)
}

pub fn summarize(conditions: &[Condition]) -> String {
    if conditions.is_empty() {
        return "<no conditions>".into();
    }
    conditions
        .iter()
        .map(|c| {
            if c.message.is_empty() {
                format!("{}={}", c.type_, c.status)
            } else {
                format!("{}={} ({})", c.type_, c.status, c.message)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
