use std::ops::Deref;
use crate::{
    error::ValueError,
    task_status::*,
};

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Successful => "successful",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }

    pub fn from_i64(value: i64) -> Result<Self, ValueError> {
        Self::try_from(value)
            .map_err(|_| ValueError::UnknownStatus(value))
    }
}

impl TaskStatusKey {
    pub fn new(name: impl Into<String>, uid: Option<&str>) -> Self {
        Self {
            name: name.into(),
            uid: uid.map(str::to_string),
        }
    }

    pub fn uid(&self) -> Option<&str> {
        self.uid.as_deref()
    }
}

impl From<&str> for TaskStatusKey {
    fn from(name: &str) -> Self {
        Self { name: name.into(), uid: None }
    }
}

impl From<[&str; 2]> for TaskStatusKey {
    fn from(s: [&str; 2]) -> Self {
        Self { name: s[0].into(), uid: Some(s[1].into()) }
    }
}

impl TaskStatusRecord {
    pub fn key(&self) -> TaskStatusKey {
        TaskStatusKey {
            name: self.name.clone(),
            uid: self.uid.clone(),
        }
    }

    /// Whether the record is past its expiry at the provided timestamp.
    /// Records that are not expiring never expire.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expiring && self.expires_ts.is_some_and(|ts| ts <= now)
    }
}

impl From<&TaskStatusRecord> for TaskStatusKey {
    fn from(record: &TaskStatusRecord) -> Self {
        record.key()
    }
}

impl From<Vec<TaskStatusRecord>> for TaskStatusRecords {
    fn from(records: Vec<TaskStatusRecord>) -> Self {
        Self(records)
    }
}

impl Deref for TaskStatusRecords {
    type Target = Vec<TaskStatusRecord>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for TaskStatusRecords {
    type Item = TaskStatusRecord;
    type IntoIter = std::vec::IntoIter<TaskStatusRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl TaskStatusFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, value: impl Into<String>) -> Self {
        self.name = Some(value.into());
        self
    }

    pub fn status(mut self, value: TaskStatus) -> Self {
        self.status = Some(value);
        self
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use super::*;

    #[test]
    fn status_encoding() {
        assert_eq!(i64::from(TaskStatus::Successful), 1);
        assert_eq!(i64::from(TaskStatus::Warning), 2);
        assert_eq!(i64::from(TaskStatus::Error), 4);
        assert_eq!(i64::from(TaskStatus::Unknown), 8);
        assert_eq!(TaskStatus::from_i64(4).unwrap(), TaskStatus::Error);
        assert!(matches!(
            TaskStatus::from_i64(3),
            Err(ValueError::UnknownStatus(3)),
        ));
        assert_eq!(TaskStatus::default(), TaskStatus::Unknown);
    }

    #[test]
    fn status_serde() {
        assert_eq!(json!(TaskStatus::Warning), json!("warning"));
        let status: TaskStatus = serde_json::from_value(json!("error")).unwrap();
        assert_eq!(status, TaskStatus::Error);
    }

    #[test]
    fn record_key() {
        let record = TaskStatusRecord {
            name: "sync".into(),
            uid: Some("source-1".into()),
            .. Default::default()
        };
        assert_eq!(record.key(), TaskStatusKey::from(["sync", "source-1"]));
        assert_ne!(record.key(), TaskStatusKey::from("sync"));
    }

    #[test]
    fn record_expiry() {
        let mut record = TaskStatusRecord {
            name: "sync".into(),
            expires_ts: Some(100),
            .. Default::default()
        };
        assert!(!record.is_expired(200));
        record.expiring = true;
        assert!(!record.is_expired(99));
        assert!(record.is_expired(100));
    }
}
