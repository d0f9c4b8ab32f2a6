//! Task descriptors and ingestion-time validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::AdmissionError;

/// Identifier assigned to a job by the external job system.
pub type TaskId = String;

/// A deferred batch job that may be admitted into weekend capacity.
///
/// Identity is the `id` alone; two descriptors with the same id are the same
/// task even if their resource requests differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique job identifier.
    pub id: TaskId,
    /// CPU cores requested.
    pub cpu_cores: u32,
    /// GPU units requested.
    pub gpu_units: u32,
    /// Wall-clock limit the job was submitted with.
    pub time_limit_minutes: u64,
}

impl Task {
    /// Build a task descriptor.
    pub fn new(id: impl Into<TaskId>, cpu_cores: u32, gpu_units: u32, time_limit_minutes: u64) -> Self {
        Self {
            id: id.into(),
            cpu_cores,
            gpu_units,
            time_limit_minutes,
        }
    }
}

/// Raw job record as reported by the job system.
///
/// Fields are optional and loosely typed so that one malformed entry can be
/// rejected on its own instead of failing the whole listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskRecord {
    /// Job identifier (string or number).
    #[serde(default)]
    pub job_id: Option<Value>,
    /// Requested CPU cores.
    #[serde(default)]
    pub cpu_cores_count: Option<Value>,
    /// Requested GPUs.
    #[serde(default)]
    pub gpu_count: Option<Value>,
    /// Time limit in minutes; fractional minutes are accepted.
    #[serde(default)]
    pub time_limit: Option<Value>,
}

impl TaskRecord {
    /// Decode one listing entry. Fails only when the entry is not an object.
    pub fn from_value(value: Value) -> Result<Self, AdmissionError> {
        serde_json::from_value(value)
            .map_err(|e| AdmissionError::InvalidTask(format!("record is not an object: {e}")))
    }

    /// Extract and validate the job identifier.
    pub fn id(&self) -> Result<TaskId, AdmissionError> {
        match &self.job_id {
            Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            Some(Value::Number(n)) => Ok(n.to_string()),
            Some(other) => Err(AdmissionError::InvalidTask(format!(
                "job_id has unsupported value {other}"
            ))),
            None => Err(AdmissionError::InvalidTask("job_id is missing".into())),
        }
    }
}

fn number(field: &str, id: &str, value: Option<&Value>) -> Result<f64, AdmissionError> {
    let invalid = |what: String| AdmissionError::InvalidTask(format!("job {id}: {field} {what}"));
    let v = match value {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| invalid(format!("is not representable ({n})")))?,
        Some(other) => return Err(invalid(format!("is not a number ({other})"))),
        None => return Err(invalid("is missing".into())),
    };
    if !v.is_finite() {
        return Err(invalid("is not finite".into()));
    }
    if v < 0.0 {
        return Err(invalid(format!("is negative ({v})")));
    }
    Ok(v)
}

fn count(field: &str, id: &str, value: Option<&Value>) -> Result<u32, AdmissionError> {
    let v = number(field, id, value)?;
    if v.fract() != 0.0 || v > f64::from(u32::MAX) {
        return Err(AdmissionError::InvalidTask(format!(
            "job {id}: {field} must be a whole number of at most {} ({v})",
            u32::MAX
        )));
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(v as u32)
}

/// Largest accepted time limit: one year, far past any weekend window.
const MAX_TIME_LIMIT_MINUTES: f64 = 366.0 * 24.0 * 60.0;

impl TryFrom<TaskRecord> for Task {
    type Error = AdmissionError;

    fn try_from(record: TaskRecord) -> Result<Self, Self::Error> {
        let id = record.id()?;
        let cpu_cores = count("cpu_cores_count", &id, record.cpu_cores_count.as_ref())?;
        let gpu_units = count("gpu_count", &id, record.gpu_count.as_ref())?;
        let limit = number("time_limit", &id, record.time_limit.as_ref())?;
        if limit > MAX_TIME_LIMIT_MINUTES {
            return Err(AdmissionError::InvalidTask(format!(
                "job {id}: time_limit too large ({limit})"
            )));
        }
        // Partial minutes round up so the deadline check stays conservative.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let time_limit_minutes = limit.ceil() as u64;

        Ok(Self {
            id,
            cpu_cores,
            gpu_units,
            time_limit_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> TaskRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_record() {
        let task = Task::try_from(record(
            r#"{"job_id": "job1", "cpu_cores_count": 4, "gpu_count": 1, "time_limit": 120}"#,
        ))
        .unwrap();
        assert_eq!(task, Task::new("job1", 4, 1, 120));
    }

    #[test]
    fn test_numeric_job_id() {
        let task = Task::try_from(record(
            r#"{"job_id": 42, "cpu_cores_count": 1, "gpu_count": 0, "time_limit": 5}"#,
        ))
        .unwrap();
        assert_eq!(task.id, "42");
    }

    #[test]
    fn test_missing_fields_rejected() {
        let err = Task::try_from(record(r#"{"job_id": "a", "cpu_cores_count": 1}"#)).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidTask(_)));

        let err = Task::try_from(record(r#"{"cpu_cores_count": 1, "gpu_count": 0, "time_limit": 1}"#))
            .unwrap_err();
        assert_eq!(err, AdmissionError::InvalidTask("job_id is missing".into()));
    }

    #[test]
    fn test_negative_values_rejected() {
        let err = Task::try_from(record(
            r#"{"job_id": "a", "cpu_cores_count": -2, "gpu_count": 0, "time_limit": 1}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_blank_job_id_rejected() {
        let err = Task::try_from(record(
            r#"{"job_id": "  ", "cpu_cores_count": 1, "gpu_count": 0, "time_limit": 1}"#,
        ))
        .unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidTask(_)));
    }

    #[test]
    fn test_fractional_time_limit_rounds_up() {
        let task = Task::try_from(record(
            r#"{"job_id": "a", "cpu_cores_count": 2.0, "gpu_count": 0, "time_limit": 90.5}"#,
        ))
        .unwrap();
        assert_eq!(task, Task::new("a", 2, 0, 91));
    }

    #[test]
    fn test_wrongly_typed_counts_rejected() {
        let err = Task::try_from(record(
            r#"{"job_id": "a", "cpu_cores_count": "4", "gpu_count": 0, "time_limit": 1}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("not a number"));

        let err = Task::try_from(record(
            r#"{"job_id": "a", "cpu_cores_count": 1.5, "gpu_count": 0, "time_limit": 1}"#,
        ))
        .unwrap_err();
        assert!(err.to_string().contains("whole number"));
    }

    #[test]
    fn test_non_object_entry_rejected() {
        let err = TaskRecord::from_value(serde_json::json!([1, 2])).unwrap_err();
        assert!(matches!(err, AdmissionError::InvalidTask(_)));
    }
}
