use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Value objects that flatten into a plain mapping before they are persisted.
pub trait PlainRecord: Send + Sync {
    fn to_plain_record(&self) -> Map<String, Value>;
}

impl PlainRecord for Map<String, Value> {
    fn to_plain_record(&self) -> Map<String, Value> {
        self.clone()
    }
}

/// Caller-supplied document data.
///
/// Anything that is not already plain JSON must come in as a [`PlainRecord`],
/// so [`Payload::normalize`] always yields plain mappings, sequences and scalars.
pub enum Payload {
    Plain(Value),
    Record(Box<dyn PlainRecord>),
    List(Vec<Payload>),
    Map(BTreeMap<String, Payload>),
}

impl Payload {
    pub fn record(record: impl PlainRecord + 'static) -> Self {
        Self::Record(Box::new(record))
    }

    pub fn list(items: impl IntoIterator<Item = Payload>) -> Self {
        Self::List(items.into_iter().collect())
    }

    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Payload)>) -> Self {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Replaces every record with its plain mapping. Sequences are converted
    /// element-wise, mappings value-wise, plain values pass through untouched.
    pub fn normalize(self) -> Value {
        match self {
            Self::Plain(value) => value,
            Self::Record(record) => Value::Object(record.to_plain_record()),
            Self::List(items) => Value::Array(items.into_iter().map(Self::normalize).collect()),
            Self::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, value.normalize()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Self::Plain(value)
    }
}

impl From<Vec<Payload>> for Payload {
    fn from(items: Vec<Payload>) -> Self {
        Self::List(items)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            Self::Record(record) => f
                .debug_tuple("Record")
                .field(&record.to_plain_record())
                .finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Alert {
        severity: &'static str,
        count: u32,
    }

    impl PlainRecord for Alert {
        fn to_plain_record(&self) -> Map<String, Value> {
            let mut map = Map::new();
            map.insert("severity".into(), json!(self.severity));
            map.insert("count".into(), json!(self.count));
            map
        }
    }

    #[test]
    fn test_plain_values_pass_through() {
        let value = json!({"severity": "high", "tags": ["a", "b"], "count": 3});
        assert_eq!(Payload::from(value.clone()).normalize(), value);
        assert_eq!(Payload::from(json!(42)).normalize(), json!(42));
    }

    #[test]
    fn test_list_converts_records_only() {
        let payload = Payload::list([
            Payload::record(Alert {
                severity: "low",
                count: 1,
            }),
            Payload::from(json!("plain")),
        ]);

        assert_eq!(
            payload.normalize(),
            json!([{"severity": "low", "count": 1}, "plain"])
        );
    }

    #[test]
    fn test_map_converts_records_and_record_lists() {
        let payload = Payload::map([
            (
                "primary",
                Payload::record(Alert {
                    severity: "high",
                    count: 2,
                }),
            ),
            (
                "history",
                Payload::list([
                    Payload::record(Alert {
                        severity: "low",
                        count: 1,
                    }),
                    Payload::record(Alert {
                        severity: "medium",
                        count: 5,
                    }),
                ]),
            ),
            ("source", Payload::from(json!("scanner"))),
        ]);

        assert_eq!(
            payload.normalize(),
            json!({
                "primary": {"severity": "high", "count": 2},
                "history": [
                    {"severity": "low", "count": 1},
                    {"severity": "medium", "count": 5}
                ],
                "source": "scanner"
            })
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = Payload::map([(
            "alert",
            Payload::record(Alert {
                severity: "high",
                count: 2,
            }),
        )])
        .normalize();

        assert_eq!(Payload::from(once.clone()).normalize(), once);
    }
}
