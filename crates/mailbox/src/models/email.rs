//! Email and thread models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{EmailId, ThreadId};

/// A conversation grouping several emails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailThread {
    pub id: ThreadId,
    pub subject: String,
}

impl EmailThread {
    pub fn new(id: ThreadId, subject: impl Into<String>) -> Self {
        Self {
            id,
            subject: subject.into(),
        }
    }
}

/// A logical email, shared by every owner that has a copy of it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: EmailId,
    /// RFC 5322 Message-ID header value
    pub message_id: String,
    pub subject: String,
    pub thread: Option<ThreadId>,
    /// Whether this is the representative message of its thread
    pub head: bool,
    pub sent_at: DateTime<Utc>,
}

impl Email {
    /// Create a new email builder
    pub fn builder(id: EmailId, message_id: impl Into<String>) -> EmailBuilder {
        EmailBuilder::new(id, message_id.into())
    }
}

/// Builder for creating Email instances
pub struct EmailBuilder {
    id: EmailId,
    message_id: String,
    subject: String,
    thread: Option<ThreadId>,
    head: bool,
    sent_at: Option<DateTime<Utc>>,
}

impl EmailBuilder {
    fn new(id: EmailId, message_id: String) -> Self {
        Self {
            id,
            message_id,
            subject: String::new(),
            thread: None,
            head: true,
            sent_at: None,
        }
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn thread(mut self, thread: ThreadId) -> Self {
        self.thread = Some(thread);
        self
    }

    pub fn head(mut self, head: bool) -> Self {
        self.head = head;
        self
    }

    pub fn sent_at(mut self, sent_at: DateTime<Utc>) -> Self {
        self.sent_at = Some(sent_at);
        self
    }

    pub fn build(self) -> Email {
        Email {
            id: self.id,
            message_id: self.message_id,
            subject: self.subject,
            thread: self.thread,
            head: self.head,
            sent_at: self.sent_at.unwrap_or_else(Utc::now),
        }
    }
}
