//! Query parameters and scalar-or-list call arguments.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::{Result, WqpError};

/// Identifier of a sensor/measurement stream.
pub type ResultId = u64;

/// Format accepted for `start_times` / `end_times`, e.g. `2019-10-01 00:00:00`.
pub const INPUT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format the service expects in the `start` / `end` parameters.
pub const SERVICE_TIME_FORMAT: &str = "%Y-%m-%d:%H:%M:%S";

/// Query-string parameters for a single request, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Empty parameter list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `key=value`.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Appends `key=value` in place.
    pub fn insert(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    /// First value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no pairs were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A call argument given either as a single value or as one value per request.
///
/// A single value is broadcast to every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    /// Expands to exactly `n` values, repeating a scalar.
    ///
    /// `name` is used in the error when a list has the wrong length.
    pub fn broadcast(self, n: usize, name: &str) -> Result<Vec<T>> {
        let values = self.expand(n);
        if values.len() != n {
            return Err(WqpError::Validation(format!(
                "'{}' has {} value(s) but {} were expected",
                name,
                values.len(),
                n
            )));
        }
        Ok(values)
    }

    /// Repeats a scalar `n` times; a list is returned as given.
    #[must_use]
    pub fn expand(self, n: usize) -> Vec<T> {
        match self {
            Self::One(v) => vec![v; n],
            Self::Many(v) => v,
        }
    }

    /// Converts to a list without broadcasting.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        Self::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        Self::Many(values)
    }
}

impl<T: Clone> From<&[T]> for OneOrMany<T> {
    fn from(values: &[T]) -> Self {
        Self::Many(values.to_vec())
    }
}

impl<T, const N: usize> From<[T; N]> for OneOrMany<T> {
    fn from(values: [T; N]) -> Self {
        Self::Many(values.into())
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(value: &str) -> Self {
        Self::One(value.to_string())
    }
}

impl From<Vec<&str>> for OneOrMany<String> {
    fn from(values: Vec<&str>) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for OneOrMany<String> {
    fn from(values: [&str; N]) -> Self {
        Self::Many(values.into_iter().map(str::to_string).collect())
    }
}

/// Parses `2019-10-01 00:00:00` and re-formats it as `2019-10-01:00:00:00`.
pub fn service_time(input: &str) -> Result<String> {
    let t = NaiveDateTime::parse_from_str(input.trim(), INPUT_TIME_FORMAT).map_err(|e| {
        WqpError::Validation(format!(
            "invalid time {:?} (expected YYYY-MM-DD HH:MM:SS): {}",
            input, e
        ))
    })?;
    Ok(t.format(SERVICE_TIME_FORMAT).to_string())
}

/// One fully-resolved `ResultData` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataRequest {
    pub(crate) result_id: ResultId,
    pub(crate) start: String,
    pub(crate) end: String,
    pub(crate) version: i64,
}

/// Normalizes `result_data` arguments into per-request values.
///
/// Fails before anything is sent if list lengths disagree or a time cannot be parsed.
pub(crate) fn data_requests(
    result_ids: OneOrMany<ResultId>,
    start_times: OneOrMany<String>,
    end_times: OneOrMany<String>,
    version: OneOrMany<i64>,
) -> Result<Vec<DataRequest>> {
    let ids = result_ids.into_vec();
    let n = ids.len();

    let starts = start_times.expand(n);
    let ends = end_times.expand(n);
    if starts.len() != ends.len() {
        return Err(WqpError::Validation(
            "'start_times' and 'end_times' must be the same length.".into(),
        ));
    }
    if starts.len() != n {
        return Err(WqpError::Validation(
            "'start_times' and 'end_times' must be the same length as 'result_ids'.".into(),
        ));
    }
    let versions = version.broadcast(n, "version")?;

    ids.into_iter()
        .zip(starts)
        .zip(ends)
        .zip(versions)
        .map(|(((result_id, start), end), version)| {
            Ok(DataRequest {
                result_id,
                start: service_time(&start)?,
                end: service_time(&end)?,
                version,
            })
        })
        .collect()
}
