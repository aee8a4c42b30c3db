//! In-memory storage implementation
//!
//! Used by tests and by embedders that import a mailbox snapshot without a
//! database. All tables sit behind one lock so bulk updates are atomic.

use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::EmailUserStore;
use crate::error::MailboxError;
use crate::models::{
    Email, EmailFolder, EmailId, EmailOrigin, EmailThread, EmailUser, EmailUserId, FolderId,
    NewEmailUser, OriginId, ThreadId,
};
use crate::query::{EmailUserQuery, EmailUserView, Order};

#[derive(Default)]
struct Tables {
    origins: HashMap<OriginId, EmailOrigin>,
    folders: HashMap<FolderId, EmailFolder>,
    threads: HashMap<ThreadId, EmailThread>,
    emails: HashMap<EmailId, Email>,
    /// Keyed by id so iteration is already in ascending id order
    email_users: BTreeMap<EmailUserId, EmailUser>,
    next_id: i64,
}

impl Tables {
    fn view<'a>(&'a self, row: &'a EmailUser) -> EmailUserView<'a> {
        let folder = self.folders.get(&row.folder);
        EmailUserView {
            row,
            folder,
            origin: folder.and_then(|f| self.origins.get(&f.origin)),
            email: self.emails.get(&row.email),
        }
    }

    /// All rows matching the query's predicates, in query order, unpaginated
    fn matching(&self, query: &EmailUserQuery) -> Vec<&EmailUser> {
        let mut rows: Vec<&EmailUser> = self
            .email_users
            .values()
            .filter(|row| {
                let view = self.view(row);
                query.predicates().iter().all(|p| p.matches(&view))
            })
            .collect();

        if query.order() == Order::ReceivedDesc {
            rows.sort_by(|a, b| b.received_at.cmp(&a.received_at).then(b.id.cmp(&a.id)));
        }

        rows
    }

    fn page<'a>(&'a self, query: &EmailUserQuery) -> impl Iterator<Item = &'a EmailUser> {
        let limit = query.page_limit().unwrap_or(usize::MAX);
        self.matching(query)
            .into_iter()
            .skip(query.page_offset())
            .take(limit)
    }
}

/// In-memory implementation of EmailUserStore
pub struct InMemoryEmailUserStore {
    tables: RwLock<Tables>,
}

impl InMemoryEmailUserStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: 1,
                ..Tables::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| MailboxError::LockPoisoned("email_user tables").into())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| MailboxError::LockPoisoned("email_user tables").into())
    }
}

impl Default for InMemoryEmailUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EmailUserStore for InMemoryEmailUserStore {
    fn upsert_origin(&self, origin: EmailOrigin) -> Result<()> {
        self.write()?.origins.insert(origin.id, origin);
        Ok(())
    }

    fn upsert_folder(&self, folder: EmailFolder) -> Result<()> {
        self.write()?.folders.insert(folder.id, folder);
        Ok(())
    }

    fn upsert_thread(&self, thread: EmailThread) -> Result<()> {
        self.write()?.threads.insert(thread.id, thread);
        Ok(())
    }

    fn upsert_email(&self, email: Email) -> Result<()> {
        self.write()?.emails.insert(email.id, email);
        Ok(())
    }

    fn get_email(&self, id: EmailId) -> Result<Option<Email>> {
        Ok(self.read()?.emails.get(&id).cloned())
    }

    fn insert_email_user(&self, row: NewEmailUser) -> Result<EmailUserId> {
        let mut tables = self.write()?;
        let id = EmailUserId(tables.next_id);
        tables.next_id += 1;
        tables.email_users.insert(id, row.into_stored(id));
        Ok(id)
    }

    fn get_email_user(&self, id: EmailUserId) -> Result<Option<EmailUser>> {
        Ok(self.read()?.email_users.get(&id).cloned())
    }

    fn fetch(&self, query: &EmailUserQuery) -> Result<Vec<EmailUser>> {
        let tables = self.read()?;
        Ok(tables.page(query).cloned().collect())
    }

    fn fetch_ids(&self, query: &EmailUserQuery) -> Result<Vec<EmailUserId>> {
        let tables = self.read()?;
        Ok(tables.page(query).map(|row| row.id).collect())
    }

    fn fetch_thread_ids(&self, query: &EmailUserQuery) -> Result<Vec<ThreadId>> {
        let tables = self.read()?;
        let threads: BTreeSet<ThreadId> = tables
            .page(query)
            .filter_map(|row| tables.emails.get(&row.email).and_then(|e| e.thread))
            .collect();
        Ok(threads.into_iter().collect())
    }

    fn count(&self, query: &EmailUserQuery) -> Result<usize> {
        Ok(self.read()?.matching(query).len())
    }

    fn set_seen(&self, ids: &[EmailUserId], seen: bool) -> Result<usize> {
        let unique: HashSet<EmailUserId> = ids.iter().copied().collect();
        let mut tables = self.write()?;
        let mut matched = 0;
        for id in unique {
            if let Some(row) = tables.email_users.get_mut(&id) {
                row.seen = seen;
                matched += 1;
            }
        }
        Ok(matched)
    }

    fn clear(&self) -> Result<()> {
        let mut tables = self.write()?;
        *tables = Tables {
            next_id: 1,
            ..Tables::default()
        };
        Ok(())
    }
}
