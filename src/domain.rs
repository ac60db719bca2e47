use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

/// persisted humidity history plus the current alert status
///
/// keys are camelCase on disk. the collector script writes the same file,
/// so any key this struct does not know about is carried through in `extra`.
/// a value of the wrong type never fails the document; it reads as the default.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryState {
    /// observations, ascending by `time`
    #[serde(default)]
    pub records: Vec<Record>,

    /// marker of the most recent alert event, passed through untouched
    #[serde(default)]
    pub last_alert: Option<Value>,

    /// whether a huinan alert is currently considered active
    #[serde(default, deserialize_with = "lenient_bool")]
    pub alert_active: bool,

    /// severity of the active alert
    #[serde(default, deserialize_with = "lenient_string")]
    pub alert_level: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// a single timestamped observation
///
/// the merge only reads `time`. the measurements stay raw json so whatever
/// the collector wrote (`80`, `null`, ...) is written back as it was.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// relative humidity (0-100%)
    #[serde(default = "zero")]
    pub humidity: Value,

    /// dew point in celsius
    #[serde(default = "zero")]
    pub dew: Value,

    /// temperature in celsius
    #[serde(default = "zero")]
    pub temp: Value,

    /// reading time, e.g. "2026-02-18 11:00:00"; also the dedup key
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,

    /// whether this reading met the huinan condition
    #[serde(default = "not_nanhui")]
    pub is_nanhui: Value,

    #[serde(default)]
    pub level: Value,

    /// producer tag (e.g. "ecs"); absent on records written by the local collector
    #[serde(
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub source: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record {
    /// sort key; records without a time sort first
    pub fn time_key(&self) -> &str {
        self.time.as_deref().unwrap_or("")
    }
}

/// latest reading published by the remote collector node
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteSnapshot {
    #[serde(default)]
    pub humidity: Option<Number>,
    #[serde(default)]
    pub dew: Option<Number>,
    #[serde(default)]
    pub temp: Option<Number>,
    /// when the node took the reading; `None` means "use merge time"
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub is_nanhui: bool,
    #[serde(default)]
    pub level: Option<String>,
}

fn zero() -> Value {
    Value::from(0)
}

fn not_nanhui() -> Value {
    Value::Bool(false)
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Value::deserialize(deserializer)?, Value::Bool(true)))
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_defaults_for_missing_keys() {
        let state: HistoryState = serde_json::from_value(json!({})).unwrap();
        assert_eq!(state, HistoryState::default());
    }

    #[test]
    fn test_record_keeps_unknown_keys() {
        let raw = json!({
            "humidity": 90,
            "dew": 21,
            "temp": 22,
            "time": "2026-02-18 08:00:00",
            "isNanhui": true,
            "level": "moderate",
            "conditions": {"c1": true, "c2": true}
        });
        let record: Record = serde_json::from_value(raw).unwrap();
        assert_eq!(record.humidity, json!(90));
        assert_eq!(record.is_nanhui, json!(true));
        assert_eq!(record.source, None);
        assert_eq!(record.extra["conditions"], json!({"c1": true, "c2": true}));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["conditions"], json!({"c1": true, "c2": true}));
        assert_eq!(back["isNanhui"], json!(true));
        // integers stay integers
        assert_eq!(back["humidity"].to_string(), "90");
        assert!(back.get("source").is_none());
    }

    #[test]
    fn test_history_serializes_camel_case() {
        let state = HistoryState {
            alert_active: true,
            alert_level: Some("severe".to_string()),
            ..Default::default()
        };
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(
            value,
            json!({
                "records": [],
                "lastAlert": null,
                "alertActive": true,
                "alertLevel": "severe"
            })
        );
    }

    #[test]
    fn test_snapshot_without_updated_at() {
        let snapshot: RemoteSnapshot =
            serde_json::from_value(json!({"humidity": 85, "isNanhui": false})).unwrap();
        assert_eq!(snapshot.updated_at, None);
        assert_eq!(snapshot.humidity, Some(Number::from(85)));
        assert_eq!(snapshot.dew, None);
        assert_eq!(snapshot.level, None);
    }

    #[test]
    fn test_collector_nulls_do_not_fail_the_document() {
        let raw = json!({
            "records": [
                {"humidity": null, "dew": null, "temp": 21, "time": "2026-2-18 20:27:00",
                 "isNanhui": null, "level": null},
                {"humidity": 88, "time": 1771417620, "source": 7}
            ],
            "lastAlert": "2026-02-18T12:27:00.000Z",
            "alertActive": null,
            "alertLevel": 3
        });

        let state: HistoryState = serde_json::from_value(raw).unwrap();
        assert_eq!(state.records.len(), 2);
        assert_eq!(state.records[0].humidity, Value::Null);
        assert_eq!(state.records[0].time_key(), "2026-2-18 20:27:00");
        assert_eq!(state.records[1].time, None);
        assert_eq!(state.records[1].source, None);
        assert!(!state.alert_active);
        assert_eq!(state.alert_level, None);

        let back = serde_json::to_value(&state).unwrap();
        assert_eq!(back["records"][0]["humidity"], Value::Null);
        assert_eq!(back["records"][0]["temp"].to_string(), "21");
    }

    #[test]
    fn test_missing_measurements_default_to_zero() {
        let record: Record = serde_json::from_value(json!({"time": "2026-02-18 08:00:00"})).unwrap();
        assert_eq!(record.humidity, json!(0));
        assert_eq!(record.is_nanhui, json!(false));
        assert_eq!(record.level, Value::Null);
    }

    #[test]
    fn test_time_key_fallback() {
        assert_eq!(Record::default().time_key(), "");
    }
}
