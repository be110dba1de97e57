//! Event loading from JSON.
//!
//! Input is either a bare array of event records or an object carrying an `events` array.
//! Record fields are camelCase. A record whose temporal data cannot be understood is kept with
//! `real_time = None`; downstream pipelines route such events to a placeholder.

use crate::error::{Error, Result};
use crate::model::{Entity, Event, RealTime};
use crate::time::{from_millis, parse_instant};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventRecord {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    narrative_time: Option<f64>,
    #[serde(default)]
    real_time: Value,
    #[serde(default)]
    entities: Vec<EntityRecord>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    sub_topics: Vec<String>,
    #[serde(default)]
    sentiment_polarity: Option<f64>,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EntityRecord {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        attributes: Map<String, Value>,
    },
}

impl From<EntityRecord> for Entity {
    fn from(value: EntityRecord) -> Self {
        match value {
            EntityRecord::Id(id) => Entity::new(id.clone(), id),
            EntityRecord::Full {
                id,
                name,
                attributes,
            } => Entity {
                name: name.unwrap_or_else(|| id.clone()),
                id,
                attributes,
            },
        }
    }
}

pub fn events_from_json_str(text: &str) -> Result<Vec<Event>> {
    let value: Value = serde_json::from_str(text)?;
    events_from_json_value(&value)
}

pub fn events_from_json_value(value: &Value) -> Result<Vec<Event>> {
    let records = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("events") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(Error::InvalidInput {
                    message: "expected an `events` array".to_string(),
                });
            }
        },
        _ => {
            return Err(Error::InvalidInput {
                message: "expected an array of events or an object with an `events` array"
                    .to_string(),
            });
        }
    };

    let mut out = Vec::with_capacity(records.len());
    for (position, raw) in records.iter().enumerate() {
        let record: EventRecord =
            EventRecord::deserialize(raw).map_err(|err| Error::InvalidInput {
                message: format!("event #{position}: {err}"),
            })?;
        out.push(event_from_record(record, position));
    }
    tracing::debug!(events = out.len(), "loaded events");
    Ok(out)
}

fn event_from_record(record: EventRecord, position: usize) -> Event {
    let index = record.index.unwrap_or(position);
    let real_time = real_time_from_value(&record.real_time, index);
    let narrative_time = record
        .narrative_time
        .filter(|t| t.is_finite())
        .unwrap_or(position as f64);
    Event {
        index,
        narrative_time,
        real_time,
        entities: record.entities.into_iter().map(Entity::from).collect(),
        topic: record.topic.filter(|t| !t.trim().is_empty()),
        sub_topics: record.sub_topics,
        sentiment_polarity: record.sentiment_polarity.filter(|p| p.is_finite()),
        label: record.label,
    }
}

fn real_time_from_value(value: &Value, index: usize) -> Option<RealTime> {
    let parsed = match value {
        Value::Null => return None,
        Value::String(_) | Value::Number(_) => instant_from_value(value).map(RealTime::instant),
        Value::Array(items) => match items.as_slice() {
            [single] => instant_from_value(single).map(RealTime::instant),
            [start, end] => match (instant_from_value(start), instant_from_value(end)) {
                (Some(start), Some(end)) => Some(RealTime::interval(start, end)),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    };
    if parsed.is_none() {
        tracing::warn!(event = index, real_time = %value, "unreadable realTime; event treated as untimed");
    }
    parsed
}

fn instant_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_instant(s),
        Value::Number(n) => from_millis(n.as_i64()?),
        _ => None,
    }
}
