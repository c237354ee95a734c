use std::collections::BTreeMap;

/// Final display text of a completed session, keyed by file name.
#[derive(Clone, Debug, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct SessionOutput {
    pub files: BTreeMap<String, String>,
}

impl SessionOutput {
    /// Display text for `name`, if the session produced that file.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.files.get(name).map(String::as_str)
    }

    /// Consumes the output and returns the text for `name`, or an empty
    /// string.
    pub fn into_file(mut self, name: &str) -> String {
        self.files.remove(name).unwrap_or_default()
    }
}
