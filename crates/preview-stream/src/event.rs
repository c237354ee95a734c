/// Semantic events pushed to a sink while a generation session runs.
///
/// `File` is a full snapshot of the file's display text, never a diff; a later
/// `File` for the same name replaces any earlier one.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    /// Human-readable progress message.
    Status { message: String },
    /// Latest display text for a file.
    File { name: String, content: String },
    /// The upstream stream ended normally.
    Complete,
    /// Terminal failure description.
    Error { message: String },
}

impl Event {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::File {
            name: name.into(),
            content: content.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// True for `Complete` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Error { .. })
    }
}
