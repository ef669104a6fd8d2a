use moncore::model::Model;
use std::{
    fmt,
    sync::Arc,
};

/// Kinds of objects that are part of the audit trail itself.
pub const INTERNAL_KINDS: &[&str] = &["event", "task_status"];

/// Predicate deciding whether mutations to an object get audited.
#[derive(Clone)]
pub struct ShouldAudit(Arc<dyn Fn(&dyn Model) -> bool + Send + Sync>);

impl ShouldAudit {
    pub fn new(f: impl Fn(&dyn Model) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn all() -> Self {
        Self::new(|_| true)
    }

    /// Audit everything except the listed kinds.
    pub fn excluding<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let kinds = kinds.into_iter()
            .map(Into::into)
            .collect::<Vec<String>>();
        Self::new(move |instance| !kinds.iter().any(|k| k == instance.kind()))
    }

    pub fn check(&self, instance: &dyn Model) -> bool {
        (self.0)(instance)
    }
}

impl Default for ShouldAudit {
    fn default() -> Self {
        Self::excluding(INTERNAL_KINDS.iter().copied())
    }
}

impl fmt::Debug for ShouldAudit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ShouldAudit")
    }
}

#[cfg(test)]
mod test {
    use test_mon::model::TestModel;
    use super::*;

    #[test]
    fn default_excludes_internal() {
        let policy = ShouldAudit::default();
        assert!(policy.check(&TestModel::new("user", Some(1))));
        assert!(!policy.check(&TestModel::new("event", Some(1))));
        assert!(!policy.check(&TestModel::new("task_status", Some(1))));
    }

    #[test]
    fn custom() {
        let policy = ShouldAudit::new(|instance| instance.pk().is_some());
        assert!(policy.check(&TestModel::new("user", Some(1))));
        assert!(!policy.check(&TestModel::new("user", None)));
        assert!(ShouldAudit::all().check(&TestModel::new("event", None)));
    }
}
