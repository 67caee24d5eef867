use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AssessmentError;

/// Response keys the engine reads. The form layer may write any other key;
/// unknown keys are carried but never interpreted.
pub mod keys {
    pub const PROFESSIONAL_PROFILE: &str = "step1";
    pub const SECURITY_REQUIREMENTS: &str = "step2";
    pub const THREAT_ASSESSMENT: &str = "step2_5";
    pub const SEVEN_PS: &str = "step2_6";
    pub const TRANSPORT_PREFERENCES: &str = "step3";
    pub const TRAVEL_FREQUENCY: &str = "step4";
    pub const COVERAGE_AREAS: &str = "step5";
    pub const EMERGENCY_CONTACT: &str = "step6";
    pub const ENHANCED_EMERGENCY_CONTACTS: &str = "step6_5";
    pub const SPECIAL_REQUIREMENTS: &str = "step7";
    pub const CONTACT_PREFERENCES: &str = "step8";
    pub const MEDICAL_DATA: &str = "step8_5";
    pub const REVIEW: &str = "step9";

    /// The nine numbered base steps used as the confidence denominator.
    pub const CANONICAL_BASE: [&str; 9] = [
        PROFESSIONAL_PROFILE,
        SECURITY_REQUIREMENTS,
        TRANSPORT_PREFERENCES,
        TRAVEL_FREQUENCY,
        COVERAGE_AREAS,
        EMERGENCY_CONTACT,
        SPECIAL_REQUIREMENTS,
        CONTACT_PREFERENCES,
        REVIEW,
    ];
}

/// A single answer as supplied by the form layer.
///
/// Deserializes from plain JSON: `null`, a string, an array of strings, an
/// object. Anything else lands in `Other` and is rejected by the typed
/// accessors when read under a known key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Empty,
    Text(String),
    Selections(Vec<String>),
    Record(Map<String, Value>),
    Other(Value),
}

impl ResponseValue {
    pub fn text(value: impl Into<String>) -> Self {
        ResponseValue::Text(value.into())
    }

    pub fn selections<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResponseValue::Selections(values.into_iter().map(Into::into).collect())
    }

    /// Build a record from a JSON value. Non-object values become `Other`.
    pub fn record(value: Value) -> Self {
        match value {
            Value::Object(map) => ResponseValue::Record(map),
            other => ResponseValue::Other(other),
        }
    }

    /// Whether this value counts as an answer.
    pub fn is_answered(&self) -> bool {
        match self {
            ResponseValue::Empty => false,
            ResponseValue::Text(text) => !text.trim().is_empty(),
            ResponseValue::Selections(items) => items.iter().any(|item| !item.trim().is_empty()),
            ResponseValue::Record(map) => map.values().any(is_populated),
            ResponseValue::Other(value) => is_populated(value),
        }
    }

    /// Number of keys in a record that hold a populated value. Zero for non-records.
    pub fn populated_key_count(&self) -> usize {
        match self {
            ResponseValue::Record(map) => map.values().filter(|v| is_populated(v)).count(),
            _ => 0,
        }
    }

    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            ResponseValue::Record(map) => Some(map),
            _ => None,
        }
    }

    /// Decode a record into a typed view. `key` is only used for the error.
    pub fn decode<T: DeserializeOwned>(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, AssessmentError> {
        match self {
            ResponseValue::Empty => Ok(None),
            ResponseValue::Record(map) => serde_json::from_value(Value::Object(map.clone()))
                .map(Some)
                .map_err(|_| AssessmentError::shape(key, expected)),
            _ => Err(AssessmentError::shape(key, expected)),
        }
    }
}

impl From<&str> for ResponseValue {
    fn from(value: &str) -> Self {
        ResponseValue::Text(value.to_string())
    }
}

impl From<Vec<&str>> for ResponseValue {
    fn from(values: Vec<&str>) -> Self {
        ResponseValue::selections(values)
    }
}

/// JSON "has content" check: null, blank strings, empty arrays and objects
/// without content are unpopulated. Booleans and numbers always count.
pub fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => map.values().any(is_populated),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Accumulated questionnaire answers keyed by response key (`step1`, `step2_5`, ...).
///
/// Missing keys mean "not yet answered", never an error. The engine only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseMap(BTreeMap<String, ResponseValue>);

impl ResponseMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ResponseValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ResponseValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.0.get(key)
    }

    pub fn is_answered(&self, key: &str) -> bool {
        self.get(key).is_some_and(ResponseValue::is_answered)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ResponseValue)> {
        self.0.iter()
    }

    /// How many of the nine canonical base steps carry an answer.
    pub fn answered_base_steps(&self) -> usize {
        keys::CANONICAL_BASE
            .iter()
            .filter(|key| self.is_answered(key))
            .count()
    }

    /// Single-choice answer (radio). Blank text reads as unanswered.
    pub fn choice(&self, key: &str) -> Result<Option<&str>, AssessmentError> {
        match self.get(key) {
            None | Some(ResponseValue::Empty) => Ok(None),
            Some(ResponseValue::Text(text)) => {
                let trimmed = text.trim();
                Ok((!trimmed.is_empty()).then_some(trimmed))
            }
            Some(_) => Err(AssessmentError::shape(key, "a single choice")),
        }
    }

    /// Multi-choice answer (checkbox). A lone string is accepted as one selection.
    pub fn selections(&self, key: &str) -> Result<Vec<&str>, AssessmentError> {
        match self.get(key) {
            None | Some(ResponseValue::Empty) => Ok(Vec::new()),
            Some(ResponseValue::Text(text)) if text.trim().is_empty() => Ok(Vec::new()),
            Some(ResponseValue::Text(text)) => Ok(vec![text.trim()]),
            Some(ResponseValue::Selections(items)) => Ok(items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect()),
            Some(_) => Err(AssessmentError::shape(key, "a list of selections")),
        }
    }

    /// Threat indicator record from the threat assessment step.
    pub fn threat_indicators(&self) -> Result<Option<ThreatIndicators>, AssessmentError> {
        match self.get(keys::THREAT_ASSESSMENT) {
            None => Ok(None),
            Some(value) => value.decode(keys::THREAT_ASSESSMENT, "a threat indicator record"),
        }
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseMap
where
    K: Into<String>,
    V: Into<ResponseValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = ResponseMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

/// Answers to the threat assessment step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreatIndicators {
    pub has_received_threats: bool,
    pub has_legal_proceedings: bool,
    pub has_previous_incidents: bool,
    pub has_controversial_work: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threat_details: Option<String>,
}

impl ThreatIndicators {
    pub fn any_raised(&self) -> bool {
        self.has_received_threats
            || self.has_legal_proceedings
            || self.has_previous_incidents
            || self.has_controversial_work
    }
}

/// A person to call in an emergency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    pub primary_phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_phone: Option<String>,
}

impl ContactRecord {
    pub fn is_reachable(&self) -> bool {
        !self.name.trim().is_empty() && !self.primary_phone.trim().is_empty()
    }
}

/// Answers to the enhanced emergency contacts step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhancedEmergencyContacts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_of_kin: Option<ContactRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_contact: Option<ContactRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_contact: Option<ContactRecord>,
}

/// Answers to the medical data step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicalData {
    pub emergency_procedures: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blood_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}
