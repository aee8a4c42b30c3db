//! Composable, lazily executed query over `email_user` rows

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::predicate::{Join, Predicate};
use crate::models::{EmailUser, EmailUserId, ThreadId};
use crate::storage::EmailUserStore;

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// Ascending association id
    #[default]
    IdAsc,
    /// Newest first, ties broken by descending id
    ReceivedDesc,
}

/// A query handle carrying accumulated predicates
///
/// Building a query never touches the store. Callers may keep adding
/// predicates with [`EmailUserQuery::and_where`] and run it with one of
/// the execution methods.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailUserQuery {
    predicates: Vec<Predicate>,
    order: Order,
    limit: Option<usize>,
    offset: usize,
}

impl EmailUserQuery {
    /// A query matching every row
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition; it is AND-ed with the existing ones
    pub fn and_where(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn order_by(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn order(&self) -> Order {
        self.order
    }

    pub fn page_limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn page_offset(&self) -> usize {
        self.offset
    }

    /// Whether any predicate needs the given related record joined
    pub fn needs(&self, join: Join) -> bool {
        self.predicates.iter().any(|p| match (p.join(), join) {
            (Join::Origin, Join::Folder) => true,
            (have, want) => have == want,
        })
    }

    /// Load matching rows
    pub fn fetch(&self, store: &dyn EmailUserStore) -> Result<Vec<EmailUser>> {
        store.fetch(self)
    }

    /// Load only the ids of matching rows
    pub fn fetch_ids(&self, store: &dyn EmailUserStore) -> Result<Vec<EmailUserId>> {
        store.fetch_ids(self)
    }

    /// Distinct threads of the matching rows' emails
    pub fn fetch_thread_ids(&self, store: &dyn EmailUserStore) -> Result<Vec<ThreadId>> {
        store.fetch_thread_ids(self)
    }

    /// Count matching rows, ignoring limit and offset
    pub fn count(&self, store: &dyn EmailUserStore) -> Result<usize> {
        store.count(self)
    }

    /// First matching row in query order
    pub fn first(&self, store: &dyn EmailUserStore) -> Result<Option<EmailUser>> {
        let rows = store.fetch(&self.clone().limit(1))?;
        Ok(rows.into_iter().next())
    }
}
