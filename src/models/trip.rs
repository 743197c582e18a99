use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::skip_serializing_none;
use thiserror::Error;

/// A trip document. Identity lives in the route, never in the body.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub location: Option<Location>,
    pub time_frame: Option<TimeFrame>,
    pub name: Option<String>,
    pub members: Option<Vec<Member>>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub city: Option<String>,
    pub contact_info: Option<String>,
    pub place: Option<String>,
    pub state: Option<String>,
}

/// Start and end are free-form text, not parsed as times.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeFrame {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub is_coming: Option<bool>,
    pub name: Option<String>,
    pub username: Option<String>,
}

const TRIP_KEYS: &[&str] = &["location", "timeFrame", "name", "members"];
const LOCATION_KEYS: &[&str] = &["city", "contactInfo", "place", "state"];
const TIME_FRAME_KEYS: &[&str] = &["startTime", "endTime"];
const MEMBER_KEYS: &[&str] = &["isComing", "name", "username"];

#[derive(Debug, Error)]
pub enum TripBodyError {
    #[error("field `{0}` appears more than once with different letter case")]
    DuplicateField(String),
    #[error("body is not a trip: {0}")]
    Shape(#[from] serde_json::Error),
}

impl Trip {
    /// Rewrites known field names to their stored spelling, matching
    /// case-insensitively, so `{"Name": ..}` and `{"name": ..}` land on the
    /// same key. Unknown keys are left untouched.
    ///
    /// Two spellings of the same field in one object (`Name` and `name`)
    /// are rejected rather than letting one silently win.
    pub fn canonicalize_keys(
        fields: Map<String, Value>,
    ) -> Result<Map<String, Value>, TripBodyError> {
        let mut canonical = Map::new();
        for (key, value) in fields {
            let key = canonical_key(TRIP_KEYS, key);
            let value = match key.as_str() {
                "location" => canonicalize_object(LOCATION_KEYS, value)?,
                "timeFrame" => canonicalize_object(TIME_FRAME_KEYS, value)?,
                "members" => match value {
                    Value::Array(members) => Value::Array(
                        members
                            .into_iter()
                            .map(|member| canonicalize_object(MEMBER_KEYS, member))
                            .collect::<Result<_, _>>()?,
                    ),
                    other => other,
                },
                _ => value,
            };
            insert_unique(&mut canonical, key, value)?;
        }
        Ok(canonical)
    }

    /// Decodes a request body into a trip. Absent fields stay `None`.
    pub fn from_body(fields: Map<String, Value>) -> Result<Self, TripBodyError> {
        let fields = Self::canonicalize_keys(fields)?;
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// The stored form of this trip, omitting every absent field.
    pub fn to_fields(&self) -> Result<Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Ok(Map::new()),
        }
    }
}

fn canonical_key(known: &[&str], key: String) -> String {
    known
        .iter()
        .find(|candidate| candidate.eq_ignore_ascii_case(&key))
        .map(|candidate| candidate.to_string())
        .unwrap_or(key)
}

fn insert_unique(
    fields: &mut Map<String, Value>,
    key: String,
    value: Value,
) -> Result<(), TripBodyError> {
    if fields.contains_key(&key) {
        return Err(TripBodyError::DuplicateField(key));
    }
    fields.insert(key, value);
    Ok(())
}

fn canonicalize_object(known: &[&str], value: Value) -> Result<Value, TripBodyError> {
    match value {
        Value::Object(fields) => {
            let mut canonical = Map::new();
            for (key, value) in fields {
                insert_unique(&mut canonical, canonical_key(known, key), value)?;
            }
            Ok(Value::Object(canonical))
        }
        other => Ok(other),
    }
}
