use moncore::model::{
    Field,
    FieldValue,
    Model,
    QueryLog,
    Snapshot,
};
use serde_json::Value;

/// A generic domain object backed by a list of fields.
#[derive(Clone, Debug, Default)]
pub struct TestModel {
    pub kind: String,
    pub pk: Option<i64>,
    pub fields: Vec<Field>,
    pub previous: Option<Snapshot>,
    // when set, every call to `fields` records a read, like a relation
    // that gets lazily loaded.
    pub lazy: Option<QueryLog>,
}

impl TestModel {
    pub fn new(kind: &str, pk: Option<i64>) -> Self {
        Self {
            kind: kind.to_string(),
            pk,
            .. Default::default()
        }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn lazy(mut self, log: QueryLog) -> Self {
        self.lazy = Some(log);
        self
    }

    /// Replace the value of an existing field.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.name == name) {
            field.value = FieldValue::Value(value.into());
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|f| f.name != name);
    }
}

impl Model for TestModel {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn pk(&self) -> Option<String> {
        self.pk.map(|pk| pk.to_string())
    }

    fn fields(&self) -> Vec<Field> {
        if let Some(log) = &self.lazy {
            log.record();
        }
        self.fields.clone()
    }

    fn previous_state(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    fn set_previous_state(&mut self, state: Snapshot) {
        self.previous = Some(state);
    }
}
