//! Messages shown to the user, for example after a save or a failed service call.

/// Severity of a [Notification].
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: "Success".into(),
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            title: "Error".into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.title, self.message)
    }
}
