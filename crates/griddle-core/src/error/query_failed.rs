use crate::Value;

/// An unclassified native execution error.
///
/// Carries the offending command and its bound parameters so failures can be
/// reproduced from a log line alone.
#[derive(Debug)]
pub struct QueryFailedError {
    pub(super) command: String,
    pub(super) params: Vec<Value>,
    pub(super) message: String,
}

impl core::fmt::Display for QueryFailedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "query failed: {}; command={:?} params={:?}",
            self.message, self.command, self.params
        )
    }
}
