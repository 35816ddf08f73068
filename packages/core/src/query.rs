//! Rescue-category query builder and predicate evaluation.
//!
//! [`build_query`] maps a dashboard [`FilterSelection`] to an immutable
//! [`Query`]. A query can be serialized to the document-store dialect with
//! [`Query::to_document`] or evaluated in memory after [`Query::compile`].

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map as JsonMap, Value as JsonValue};

use crate::types::{fields, Record, Value};

// ---------------------------------------------------------------------------
// Filter selection
// ---------------------------------------------------------------------------

/// Rescue category chosen in the dashboard's filter control.
///
/// Parsed from the UI values `"Water"`, `"Mountain"`, `"Disaster"` and
/// `"Reset"`. Any other value, or no value at all, is `Reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "&'static str")]
pub enum FilterSelection {
    WaterRescue,
    MountainRescue,
    DisasterRescue,
    #[default]
    Reset,
}

impl FilterSelection {
    /// Total parse from an optional UI value.
    #[must_use]
    pub fn from_ui_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("Water") => Self::WaterRescue,
            Some("Mountain") => Self::MountainRescue,
            Some("Disaster") => Self::DisasterRescue,
            _ => Self::Reset,
        }
    }

    /// The value the UI control uses for this selection.
    #[must_use]
    pub fn ui_value(self) -> &'static str {
        match self {
            Self::WaterRescue => "Water",
            Self::MountainRescue => "Mountain",
            Self::DisasterRescue => "Disaster",
            Self::Reset => "Reset",
        }
    }

    /// Breed/sex/age heuristics for the rescue categories; `None` for `Reset`.
    #[must_use]
    pub fn profile(self) -> Option<&'static RescueProfile> {
        match self {
            Self::WaterRescue => Some(&WATER_RESCUE),
            Self::MountainRescue => Some(&MOUNTAIN_RESCUE),
            Self::DisasterRescue => Some(&DISASTER_RESCUE),
            Self::Reset => None,
        }
    }
}

impl From<Option<String>> for FilterSelection {
    fn from(value: Option<String>) -> Self {
        Self::from_ui_value(value.as_deref())
    }
}

impl From<String> for FilterSelection {
    fn from(value: String) -> Self {
        Self::from_ui_value(Some(&value))
    }
}

impl From<&str> for FilterSelection {
    fn from(value: &str) -> Self {
        Self::from_ui_value(Some(value))
    }
}

impl From<FilterSelection> for &'static str {
    fn from(selection: FilterSelection) -> Self {
        selection.ui_value()
    }
}

/// Candidate criteria for one rescue category.
#[derive(Debug, Clone, PartialEq)]
pub struct RescueProfile {
    /// Breed substrings; a dog qualifies if its breed matches any of them.
    pub breeds: &'static [&'static str],
    /// Required `sex_upon_outcome` substring.
    pub sex: &'static str,
    /// Inclusive lower bound on `age_upon_outcome_in_weeks`.
    pub min_age_weeks: f64,
    /// Inclusive upper bound on `age_upon_outcome_in_weeks`.
    pub max_age_weeks: f64,
}

const WATER_RESCUE: RescueProfile = RescueProfile {
    breeds: &["Labrador Retriever", "Chesapeake", "Newfoundland"],
    sex: "Intact Female",
    min_age_weeks: 26.0,
    max_age_weeks: 156.0,
};

const MOUNTAIN_RESCUE: RescueProfile = RescueProfile {
    breeds: &[
        "German Shepherd",
        "Alaskan Malamute",
        "Old English Sheepdog",
        "Siberian Husky",
        "Rottweiler",
    ],
    sex: "Intact Male",
    min_age_weeks: 26.0,
    max_age_weeks: 156.0,
};

const DISASTER_RESCUE: RescueProfile = RescueProfile {
    breeds: &[
        "Doberman Pinscher",
        "German Shepherd",
        "Golden Retriever",
        "Bloodhound",
        "Rottweiler",
    ],
    sex: "Intact Male",
    min_age_weeks: 20.0,
    max_age_weeks: 300.0,
};

// ---------------------------------------------------------------------------
// Predicate tree
// ---------------------------------------------------------------------------

/// A node of a structured query predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Field equals a value (numbers compare with widening).
    Equals { field: String, value: Value },
    /// Field is a string matching `pattern` anywhere (regex semantics).
    FieldMatch {
        field: String,
        pattern: String,
        case_insensitive: bool,
    },
    /// Field is a number within `[min, max]`.
    RangeMatch { field: String, min: f64, max: f64 },
    /// All children match. Empty matches everything.
    And { children: Vec<Predicate> },
    /// Any child matches. Empty matches nothing.
    Or { children: Vec<Predicate> },
}

impl Predicate {
    #[must_use]
    pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Equals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive pattern match.
    #[must_use]
    pub fn matches_ci(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::FieldMatch {
            field: field.into(),
            pattern: pattern.into(),
            case_insensitive: true,
        }
    }

    #[must_use]
    pub fn range(field: impl Into<String>, min: f64, max: f64) -> Self {
        Self::RangeMatch {
            field: field.into(),
            min,
            max,
        }
    }

    #[must_use]
    pub fn and(children: Vec<Predicate>) -> Self {
        Self::And { children }
    }

    #[must_use]
    pub fn or(children: Vec<Predicate>) -> Self {
        Self::Or { children }
    }

    fn to_document(&self) -> JsonValue {
        match self {
            Self::Equals { field, value } => single_field(field, json!(value)),
            Self::FieldMatch {
                field,
                pattern,
                case_insensitive,
            } => {
                let mut op = JsonMap::new();
                op.insert("$regex".to_string(), json!(pattern));
                if *case_insensitive {
                    op.insert("$options".to_string(), json!("i"));
                }
                single_field(field, JsonValue::Object(op))
            }
            Self::RangeMatch { field, min, max } => single_field(
                field,
                json!({ "$gte": number_json(*min), "$lte": number_json(*max) }),
            ),
            Self::And { children } => single_field("$and", children_json(children)),
            Self::Or { children } => single_field("$or", children_json(children)),
        }
    }
}

fn single_field(key: &str, value: JsonValue) -> JsonValue {
    let mut map = JsonMap::new();
    map.insert(key.to_string(), value);
    JsonValue::Object(map)
}

fn children_json(children: &[Predicate]) -> JsonValue {
    JsonValue::Array(children.iter().map(Predicate::to_document).collect())
}

/// Integral bounds serialize as integers, the way the store dialect writes them.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        json!(n as i64)
    } else {
        json!(n)
    }
}

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Immutable query handed verbatim to data access.
///
/// A query without a predicate matches every record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    predicate: Option<Predicate>,
}

impl Query {
    #[must_use]
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate: Some(predicate),
        }
    }

    /// The empty filter.
    #[must_use]
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Conjunction of field equalities, one per field of `filter`.
    ///
    /// An empty record yields [`Query::match_all`].
    #[must_use]
    pub fn where_equals(filter: &Record) -> Self {
        let mut clauses: Vec<Predicate> = filter
            .iter()
            .map(|(field, value)| Predicate::equals(field.clone(), value.clone()))
            .collect();
        match clauses.len() {
            0 => Self::match_all(),
            1 => Self::new(clauses.remove(0)),
            _ => Self::new(Predicate::and(clauses)),
        }
    }

    #[must_use]
    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    #[must_use]
    pub fn is_match_all(&self) -> bool {
        self.predicate.is_none()
    }

    /// Serializes to the document-store query dialect
    /// (`$and`, `$or`, `$regex`/`$options`, `$gte`/`$lte`).
    #[must_use]
    pub fn to_document(&self) -> JsonValue {
        self.predicate
            .as_ref()
            .map_or_else(|| json!({}), Predicate::to_document)
    }

    /// Prepares the query for in-memory evaluation.
    #[must_use]
    pub fn compile(&self) -> QueryMatcher {
        QueryMatcher {
            root: self.predicate.as_ref().map(CompiledPredicate::compile),
        }
    }
}

/// Builds the query for a dashboard filter selection.
///
/// `Reset` selects all dogs. Each rescue category is the conjunction of
/// "breed matches any candidate", "sex matches" and "age within range".
#[must_use]
pub fn build_query(selection: FilterSelection) -> Query {
    let Some(profile) = selection.profile() else {
        return Query::new(Predicate::equals(fields::ANIMAL_TYPE, "Dog"));
    };

    let breeds = profile
        .breeds
        .iter()
        .map(|breed| Predicate::matches_ci(fields::BREED, *breed))
        .collect();

    Query::new(Predicate::and(vec![
        Predicate::or(breeds),
        Predicate::matches_ci(fields::SEX_UPON_OUTCOME, profile.sex),
        Predicate::range(
            fields::AGE_UPON_OUTCOME_IN_WEEKS,
            profile.min_age_weeks,
            profile.max_age_weeks,
        ),
    ]))
}

// ---------------------------------------------------------------------------
// In-memory evaluation
// ---------------------------------------------------------------------------

/// A compiled [`Query`], reusable across many records.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    root: Option<CompiledPredicate>,
}

impl QueryMatcher {
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        self.root.as_ref().is_none_or(|p| p.matches(record))
    }
}

#[derive(Debug, Clone)]
enum CompiledPredicate {
    Equals { field: String, value: Value },
    Pattern { field: String, regex: Regex },
    Literal {
        field: String,
        needle: String,
        case_insensitive: bool,
    },
    Range { field: String, min: f64, max: f64 },
    And(Vec<CompiledPredicate>),
    Or(Vec<CompiledPredicate>),
}

impl CompiledPredicate {
    fn compile(predicate: &Predicate) -> Self {
        match predicate {
            Predicate::Equals { field, value } => Self::Equals {
                field: field.clone(),
                value: value.clone(),
            },
            Predicate::FieldMatch {
                field,
                pattern,
                case_insensitive,
            } => match RegexBuilder::new(pattern)
                .case_insensitive(*case_insensitive)
                .build()
            {
                Ok(regex) => Self::Pattern {
                    field: field.clone(),
                    regex,
                },
                Err(err) => {
                    tracing::debug!(%pattern, error = %err, "invalid pattern, matching literally");
                    Self::Literal {
                        field: field.clone(),
                        needle: if *case_insensitive {
                            pattern.to_lowercase()
                        } else {
                            pattern.clone()
                        },
                        case_insensitive: *case_insensitive,
                    }
                }
            },
            Predicate::RangeMatch { field, min, max } => Self::Range {
                field: field.clone(),
                min: *min,
                max: *max,
            },
            Predicate::And { children } => Self::And(children.iter().map(Self::compile).collect()),
            Predicate::Or { children } => Self::Or(children.iter().map(Self::compile).collect()),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Equals { field, value } => record
                .get(field)
                .is_some_and(|actual| actual.loosely_equals(value)),
            Self::Pattern { field, regex } => {
                record.get_str(field).is_some_and(|s| regex.is_match(s))
            }
            Self::Literal {
                field,
                needle,
                case_insensitive,
            } => record.get_str(field).is_some_and(|s| {
                if *case_insensitive {
                    s.to_lowercase().contains(needle.as_str())
                } else {
                    s.contains(needle.as_str())
                }
            }),
            Self::Range { field, min, max } => record
                .get(field)
                .and_then(Value::as_number)
                .is_some_and(|n| n >= *min && n <= *max),
            Self::And(children) => children.iter().all(|c| c.matches(record)),
            Self::Or(children) => children.iter().any(|c| c.matches(record)),
        }
    }
}
