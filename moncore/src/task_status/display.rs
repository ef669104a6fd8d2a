use std::fmt::{
    Display,
    Formatter,
    Result,
};
use crate::task_status::*;

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        self.as_str().fmt(f)
    }
}

impl Display for TaskStatusKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match &self.uid {
            Some(uid) => write!(f, "{}:{}", self.name, uid),
            None => self.name.fmt(f),
        }
    }
}

impl Display for TaskStatusRecord {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(
            f,
            "\
            TaskStatus {{ name: {:?}, uid: {:?}, status: {}, ... }}\n\
            {}.{}{}\
            ",
            &self.name,
            &self.uid,
            self.status,
            &self.call_module,
            &self.call_func,
            self.messages.iter().fold(
                String::new(), |acc, msg| format!("{acc}\n  {msg}")),
        )?;
        if !self.expiring {
            write!(f, "\n  (not expiring)")?;
        }
        Ok(())
    }
}
