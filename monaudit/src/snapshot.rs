use log::{
    error,
    warn,
};
use moncore::model::{
    FieldKind,
    FieldValue,
    Model,
    QueryLog,
};
use std::sync::Arc;
use crate::{
    diff::{
        self,
        AuditDiff,
    },
    error::AuditError,
    sanitize::{
        KeyPatternSanitizer,
        Sanitizer,
    },
};

pub use moncore::model::Snapshot;

/// Produces sanitized snapshots of the own-table state of a `Model` and
/// the differences between them.
#[derive(Clone)]
pub struct SnapshotEngine {
    sanitizer: Arc<dyn Sanitizer>,
}

impl Default for SnapshotEngine {
    fn default() -> Self {
        Self::new(Arc::new(KeyPatternSanitizer::default()))
    }
}

impl SnapshotEngine {
    pub fn new(sanitizer: Arc<dyn Sanitizer>) -> Self {
        Self { sanitizer }
    }

    pub fn sanitizer(&self) -> &dyn Sanitizer {
        self.sanitizer.as_ref()
    }

    /// Serialize the loaded scalar fields of the instance.
    ///
    /// Relations, deferred fields and unevaluated expressions are left
    /// out so that nothing here needs the backing store.
    pub fn serialize(&self, instance: &dyn Model) -> Snapshot {
        instance.fields()
            .into_iter()
            .filter_map(|field| {
                let kind = match field.kind {
                    FieldKind::Relation => return None,
                    FieldKind::Scalar(kind) => kind,
                };
                let raw = match field.value {
                    FieldValue::Value(value) => value,
                    FieldValue::Deferred | FieldValue::Expression(_) => return None,
                };
                let value = kind.to_canonical(&raw)
                    .unwrap_or_else(|e| {
                        warn!(
                            "keeping raw value for {}.{}: {e}",
                            instance.kind(),
                            field.name,
                        );
                        raw
                    });
                // values that cannot be sanitized are kept as is; `diff`
                // reports any change to them as opaque.
                let value = match self.sanitizer.sanitize(&field.name, &value) {
                    Ok(value) => value,
                    Err(e) => {
                        warn!("{}.{}: {e}", instance.kind(), field.name);
                        value
                    }
                };
                Some((field.name, value))
            })
            .collect()
    }

    /// Capture the state of the instance, verifying that doing so did not
    /// cause any reads to be recorded against the query log.
    pub fn capture(
        &self,
        instance: &dyn Model,
        queries: &QueryLog,
    ) -> Result<Snapshot, AuditError> {
        let before = queries.count();
        let snapshot = self.serialize(instance);
        let after = queries.count();
        if after > before {
            let err = AuditError::QueryAmplification {
                kind: instance.kind().to_string(),
                before,
                after,
            };
            error!("{err}");
            return Err(err);
        }
        Ok(snapshot)
    }

    pub fn diff(&self, before: &Snapshot, after: &Snapshot) -> AuditDiff {
        diff::diff(before, after, self.sanitizer.as_ref())
    }
}

#[cfg(test)]
mod test {
    use moncore::model::{
        Field,
        ScalarKind,
    };
    use serde_json::{
        json,
        Value,
    };
    use test_mon::model::TestModel;
    use crate::sanitize::{
        CLEANSED_SUBSTITUTE,
        OPAQUE,
    };
    use super::*;

    fn user() -> TestModel {
        TestModel::new("user", Some(1))
            .field(Field::scalar("username", ScalarKind::Text, "admin"))
            .field(Field::scalar("password", ScalarKind::Text, "hunter2"))
            .field(Field::scalar("is_active", ScalarKind::Boolean, 1))
            .field(Field::scalar("last_login", ScalarKind::Timestamp, 1234567890))
            .field(Field::scalar("avatar", ScalarKind::File, json!({"name": "a.png"})))
            .field(Field::relation("group_id", 3))
            .field(Field::deferred("bio", ScalarKind::Text))
            .field(Field::expression("login_count", ScalarKind::Integer, "login_count + 1"))
    }

    #[test]
    fn serialize_scalars() {
        let engine = SnapshotEngine::default();
        let snapshot = engine.serialize(&user());
        assert_eq!(Value::from(snapshot), json!({
            "username": "admin",
            "password": CLEANSED_SUBSTITUTE,
            "is_active": true,
            "last_login": "2009-02-13T23:31:30Z",
            "avatar": "a.png",
        }));
    }

    #[test]
    fn serialize_keeps_raw_on_coercion_failure() {
        let engine = SnapshotEngine::default();
        let model = TestModel::new("user", Some(1))
            .field(Field::scalar("age", ScalarKind::Integer, "old"));
        assert_eq!(engine.serialize(&model).get("age"), Some(&json!("old")));
    }

    #[test]
    fn too_deep_changes_are_opaque() {
        let engine = SnapshotEngine::new(Arc::new(
            KeyPatternSanitizer::default().max_depth(1)
        ));
        let mut model = TestModel::new("flow", Some(1))
            .field(Field::scalar("layout", ScalarKind::Json, json!({"a": {"b": 1}})));
        let before = engine.serialize(&model);
        assert!(engine.diff(&before, &engine.serialize(&model)).is_empty());

        model.set("layout", json!({"a": {"b": 2}}));
        let after = engine.serialize(&model);
        assert_eq!(
            serde_json::to_value(engine.diff(&before, &after)).unwrap(),
            json!({
                "changed": {
                    "root['layout']": {"old_value": OPAQUE, "new_value": OPAQUE},
                },
            }),
        );
    }

    #[test]
    fn capture_twice_is_stable() -> anyhow::Result<()> {
        let engine = SnapshotEngine::default();
        let queries = QueryLog::new();
        let model = user();
        let first = engine.capture(&model, &queries)?;
        let second = engine.capture(&model, &queries)?;
        assert_eq!(first, second);
        assert_eq!(queries.count(), 0);
        Ok(())
    }

    #[test]
    fn capture_rejects_reads() {
        let engine = SnapshotEngine::default();
        let queries = QueryLog::new();
        queries.record();
        let model = user().lazy(queries.clone());
        match engine.capture(&model, &queries) {
            Err(AuditError::QueryAmplification { kind, before, after }) => {
                assert_eq!(kind, "user");
                assert_eq!(before, 1);
                assert_eq!(after, 2);
            }
            _ => panic!("expected query amplification"),
        }
    }
}
