//! Typed errors for caller-supplied arguments
//!
//! Store failures travel as `anyhow::Error`; these variants cover input the
//! caller can fix.

/// Invalid argument passed to the mailbox layer
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MailboxError {
    #[error("Unknown folder type: {0}")]
    UnknownFolderType(String),

    #[error("Invalid record id '{0}' in id list")]
    InvalidId(String),

    #[error("Unknown storage backend: {0}")]
    UnknownBackend(String),

    #[error("Storage lock poisoned: {0}")]
    LockPoisoned(&'static str),
}

/// Parse a comma separated id list as sent by grid mass actions (`"1,2,3"`)
///
/// Blank input and blank segments are ignored.
pub fn parse_id_list(values: &str) -> Result<Vec<i64>, MailboxError> {
    values
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i64>().map_err(|_| MailboxError::InvalidId(s.to_string())))
        .collect()
}
