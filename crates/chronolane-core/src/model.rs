use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The calendar instant or interval an event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum RealTime {
    Instant { at: DateTime<Utc> },
    /// `start <= end` is assumed, not validated.
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl RealTime {
    pub fn instant(at: DateTime<Utc>) -> Self {
        Self::Instant { at }
    }

    pub fn interval(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::Interval { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        match *self {
            Self::Instant { at } => at,
            Self::Interval { start, .. } => start,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match *self {
            Self::Instant { at } => at,
            Self::Interval { end, .. } => end,
        }
    }

    pub fn start_ms(&self) -> i64 {
        self.start().timestamp_millis()
    }

    pub fn end_ms(&self) -> i64 {
        self.end().timestamp_millis()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// One narrative event. Input to every layout pipeline; never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub index: usize,
    /// Ordinal position in the telling order of the story.
    pub narrative_time: f64,
    pub real_time: Option<RealTime>,
    pub entities: Vec<Entity>,
    pub topic: Option<String>,
    pub sub_topics: Vec<String>,
    pub sentiment_polarity: Option<f64>,
    pub label: Option<String>,
}

impl Event {
    pub fn new(index: usize, narrative_time: f64) -> Self {
        Self {
            index,
            narrative_time,
            real_time: None,
            entities: Vec::new(),
            topic: None,
            sub_topics: Vec::new(),
            sentiment_polarity: None,
            label: None,
        }
    }

    pub fn with_real_time(mut self, real_time: RealTime) -> Self {
        self.real_time = Some(real_time);
        self
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_sub_topic(mut self, sub_topic: impl Into<String>) -> Self {
        self.sub_topics.push(sub_topic.into());
        self
    }

    pub fn with_sentiment(mut self, polarity: f64) -> Self {
        self.sentiment_polarity = Some(polarity);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Entity ids in mention order, first occurrence only.
    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entities
            .iter()
            .enumerate()
            .filter(|(i, e)| !self.entities[..*i].iter().any(|prev| prev.id == e.id))
            .map(|(_, e)| e.id.as_str())
    }
}
