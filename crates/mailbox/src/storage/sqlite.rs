//! SQLite-based mailbox storage

use std::path::Path;
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::debug;
use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::vtab::array::{self, Array};
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params, params_from_iter};
use rusqlite_migration::{M, Migrations};

use super::traits::EmailUserStore;
use crate::error::MailboxError;
use crate::models::{
    Email, EmailFolder, EmailId, EmailOrigin, EmailThread, EmailUser, EmailUserId, MailboxId,
    NewEmailUser, ThreadId, raw_ids,
};
use crate::query::{EmailUserQuery, Join, Order, Predicate};

/// Database migrations
///
/// Each migration is applied in order. The user_version pragma tracks which
/// migrations have been applied.
fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        // Migration 1: Initial schema
        M::up(
            r#"
            -- Mail accounts / sources
            CREATE TABLE email_origin (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE email_folder (
                id INTEGER PRIMARY KEY,
                origin_id INTEGER NOT NULL,
                name TEXT NOT NULL,
                full_name TEXT NOT NULL,
                type TEXT NOT NULL,
                FOREIGN KEY (origin_id) REFERENCES email_origin(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_email_folder_origin ON email_folder(origin_id);

            CREATE TABLE email_thread (
                id INTEGER PRIMARY KEY,
                subject TEXT NOT NULL
            );

            CREATE TABLE email (
                id INTEGER PRIMARY KEY,
                message_id TEXT NOT NULL,
                subject TEXT NOT NULL,
                thread_id INTEGER,
                is_head INTEGER NOT NULL DEFAULT 1,
                sent_at TEXT NOT NULL,
                FOREIGN KEY (thread_id) REFERENCES email_thread(id) ON DELETE SET NULL
            );

            CREATE INDEX idx_email_message_id ON email(message_id);
            CREATE INDEX idx_email_thread ON email(thread_id);

            -- Ownership of an email by a user, one row per folder placement
            CREATE TABLE email_user (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                email_id INTEGER NOT NULL,
                owner_id INTEGER NOT NULL,
                organization_id INTEGER NOT NULL,
                folder_id INTEGER NOT NULL,
                mailbox_owner_id INTEGER,
                seen INTEGER NOT NULL DEFAULT 0,
                received_at TEXT NOT NULL,
                FOREIGN KEY (email_id) REFERENCES email(id) ON DELETE CASCADE,
                FOREIGN KEY (folder_id) REFERENCES email_folder(id) ON DELETE CASCADE
            );

            CREATE INDEX idx_email_user_owner_seen
                ON email_user(owner_id, organization_id, seen);
            CREATE INDEX idx_email_user_folder ON email_user(folder_id);
            CREATE INDEX idx_email_user_email ON email_user(email_id);
            "#,
        ),
    ])
}

const EMAIL_USER_COLUMNS: &str = "eu.id, eu.email_id, eu.owner_id, eu.organization_id, eu.folder_id,
     eu.mailbox_owner_id, eu.seen, eu.received_at";

/// A bound statement parameter
///
/// Lists are bound whole through the `rarray` table function, so their
/// length never counts against SQLite's host parameter limit.
enum Param {
    Value(Value),
    List(Array),
}

impl ToSql for Param {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Param::Value(value) => value.to_sql(),
            Param::List(values) => values.to_sql(),
        }
    }
}

fn int(value: i64) -> Param {
    Param::Value(Value::Integer(value))
}

fn ints(ids: Vec<i64>) -> Vec<Value> {
    ids.into_iter().map(Value::Integer).collect()
}

/// Render a list membership test bound as a single `rarray` parameter
///
/// Empty lists render as constant conditions.
fn in_list(column: &str, negate: bool, values: Vec<Value>, params: &mut Vec<Param>) -> String {
    if values.is_empty() {
        return if negate { "1".into() } else { "0".into() };
    }
    params.push(Param::List(Rc::new(values)));
    format!("{} {}IN rarray(?)", column, if negate { "NOT " } else { "" })
}

/// Compile a predicate to a WHERE fragment over the `eu`, `f`, `o`, `e` aliases
fn predicate_sql(predicate: &Predicate, params: &mut Vec<Param>) -> String {
    fn bind(params: &mut Vec<Param>, value: i64, sql: &str) -> String {
        params.push(int(value));
        sql.to_string()
    }

    match predicate {
        Predicate::Owner(id) => bind(params, id.0, "eu.owner_id = ?"),
        Predicate::Organization(id) => bind(params, id.0, "eu.organization_id = ?"),
        Predicate::Email(id) => bind(params, id.0, "eu.email_id = ?"),
        Predicate::Folder(id) => bind(params, id.0, "eu.folder_id = ?"),
        Predicate::Seen(seen) => bind(params, *seen as i64, "eu.seen = ?"),
        Predicate::OriginActive(active) => bind(params, *active as i64, "o.is_active = ?"),
        Predicate::Head(head) => bind(params, *head as i64, "e.is_head = ?"),
        Predicate::HasMailboxOwner => "eu.mailbox_owner_id IS NOT NULL".into(),
        Predicate::Ids(ids) => in_list("eu.id", false, ints(raw_ids(ids)), params),
        Predicate::ExcludeIds(ids) => in_list("eu.id", true, ints(raw_ids(ids)), params),
        Predicate::Threads(ids) => in_list("e.thread_id", false, ints(raw_ids(ids)), params),
        Predicate::FolderTypes(types) => in_list(
            "f.type",
            false,
            types.iter().map(|t| Value::Text(t.as_str().into())).collect(),
            params,
        ),
        Predicate::MessageIds(ids) => in_list(
            "e.message_id",
            false,
            ids.iter().cloned().map(Value::Text).collect(),
            params,
        ),
    }
}

/// FROM/JOIN/WHERE part shared by every select and count
fn from_where(query: &EmailUserQuery, params: &mut Vec<Param>) -> String {
    let mut sql = String::from(" FROM email_user eu");
    if query.needs(Join::Folder) {
        sql.push_str(" INNER JOIN email_folder f ON f.id = eu.folder_id");
    }
    if query.needs(Join::Origin) {
        sql.push_str(" INNER JOIN email_origin o ON o.id = f.origin_id");
    }
    if query.needs(Join::Email) {
        sql.push_str(" INNER JOIN email e ON e.id = eu.email_id");
    }

    let conditions: Vec<String> = query
        .predicates()
        .iter()
        .map(|p| predicate_sql(p, params))
        .collect();
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    sql
}

fn order_limit(query: &EmailUserQuery, params: &mut Vec<Param>) -> String {
    let mut sql = match query.order() {
        Order::IdAsc => String::from(" ORDER BY eu.id ASC"),
        Order::ReceivedDesc => String::from(" ORDER BY eu.received_at DESC, eu.id DESC"),
    };
    if query.page_limit().is_some() || query.page_offset() > 0 {
        // SQLite needs a LIMIT before OFFSET; -1 means unbounded
        let limit = query.page_limit().map_or(-1, |l| l as i64);
        sql.push_str(" LIMIT ? OFFSET ?");
        params.push(int(limit));
        params.push(int(query.page_offset() as i64));
    }
    sql
}

/// Fixed-width UTC timestamps so text ordering matches time ordering
fn stored_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn email_user_from_row(row: &Row<'_>) -> rusqlite::Result<EmailUser> {
    let received_at: String = row.get(7)?;
    Ok(EmailUser {
        id: EmailUserId(row.get(0)?),
        email: row.get::<_, i64>(1)?.into(),
        owner: row.get::<_, i64>(2)?.into(),
        organization: row.get::<_, i64>(3)?.into(),
        folder: row.get::<_, i64>(4)?.into(),
        mailbox_owner: row.get::<_, Option<i64>>(5)?.map(MailboxId),
        seen: row.get(6)?,
        received_at: parse_timestamp(&received_at),
    })
}

/// SQLite-based mailbox storage
pub struct SqliteEmailUserStore {
    conn: Mutex<Connection>,
}

impl SqliteEmailUserStore {
    /// Open (or create) a database file and bring its schema up to date
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path.as_ref())
            .with_context(|| format!("Failed to open database at {:?}", db_path.as_ref()))?;

        // WAL lets readers continue while the seen flag is being flipped
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
            "#,
        )?;

        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(mut conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        array::load_module(&conn).context("Failed to load rarray module")?;

        migrations()
            .to_latest(&mut conn)
            .context("Failed to run database migrations")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| MailboxError::LockPoisoned("sqlite connection").into())
    }

    fn select(&self, columns: &str, query: &EmailUserQuery) -> (String, Vec<Param>) {
        let mut params = Vec::new();
        let mut sql = format!("SELECT {}", columns);
        sql.push_str(&from_where(query, &mut params));
        sql.push_str(&order_limit(query, &mut params));
        debug!("email_user query: {}", sql);
        (sql, params)
    }
}

impl EmailUserStore for SqliteEmailUserStore {
    fn upsert_origin(&self, origin: EmailOrigin) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO email_origin (id, name, is_active) VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                is_active = excluded.is_active",
            params![origin.id.0, origin.name, origin.is_active],
        )?;
        Ok(())
    }

    fn upsert_folder(&self, folder: EmailFolder) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO email_folder (id, origin_id, name, full_name, type) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                origin_id = excluded.origin_id,
                name = excluded.name,
                full_name = excluded.full_name,
                type = excluded.type",
            params![
                folder.id.0,
                folder.origin.0,
                folder.name,
                folder.full_name,
                folder.folder_type.as_str(),
            ],
        )?;
        Ok(())
    }

    fn upsert_thread(&self, thread: EmailThread) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO email_thread (id, subject) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET subject = excluded.subject",
            params![thread.id.0, thread.subject],
        )?;
        Ok(())
    }

    fn upsert_email(&self, email: Email) -> Result<()> {
        let conn = self.conn()?;
        // ON CONFLICT DO UPDATE keeps the row, so email_user rows are not cascaded away
        conn.execute(
            "INSERT INTO email (id, message_id, subject, thread_id, is_head, sent_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                message_id = excluded.message_id,
                subject = excluded.subject,
                thread_id = excluded.thread_id,
                is_head = excluded.is_head,
                sent_at = excluded.sent_at",
            params![
                email.id.0,
                email.message_id,
                email.subject,
                email.thread.map(|t| t.0),
                email.head,
                stored_timestamp(email.sent_at),
            ],
        )?;
        Ok(())
    }

    fn get_email(&self, id: EmailId) -> Result<Option<Email>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, message_id, subject, thread_id, is_head, sent_at
                 FROM email WHERE id = ?",
                [id.0],
                |row| {
                    let sent_at: String = row.get(5)?;
                    Ok(Email {
                        id: EmailId(row.get(0)?),
                        message_id: row.get(1)?,
                        subject: row.get(2)?,
                        thread: row.get::<_, Option<i64>>(3)?.map(ThreadId),
                        head: row.get(4)?,
                        sent_at: parse_timestamp(&sent_at),
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    fn insert_email_user(&self, row: NewEmailUser) -> Result<EmailUserId> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO email_user
             (email_id, owner_id, organization_id, folder_id, mailbox_owner_id, seen, received_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
            params![
                row.email.0,
                row.owner.0,
                row.organization.0,
                row.folder.0,
                row.mailbox_owner.map(|m| m.0),
                row.seen,
                stored_timestamp(row.received_at),
            ],
        )
        .context("Failed to insert email_user row")?;
        Ok(EmailUserId(conn.last_insert_rowid()))
    }

    fn get_email_user(&self, id: EmailUserId) -> Result<Option<EmailUser>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {} FROM email_user eu WHERE eu.id = ?", EMAIL_USER_COLUMNS);
        let row = conn
            .query_row(&sql, [id.0], email_user_from_row)
            .optional()?;
        Ok(row)
    }

    fn fetch(&self, query: &EmailUserQuery) -> Result<Vec<EmailUser>> {
        let (sql, params) = self.select(EMAIL_USER_COLUMNS, query);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params), email_user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn fetch_ids(&self, query: &EmailUserQuery) -> Result<Vec<EmailUserId>> {
        let (sql, params) = self.select("eu.id", query);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?
            .map(|id| id.map(EmailUserId))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn fetch_thread_ids(&self, query: &EmailUserQuery) -> Result<Vec<ThreadId>> {
        let (rows, params) = self.select("eu.email_id", query);
        let sql = format!(
            "SELECT DISTINCT t.thread_id FROM email t
             WHERE t.thread_id IS NOT NULL AND t.id IN ({})
             ORDER BY t.thread_id",
            rows
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(params), |row| row.get::<_, i64>(0))?
            .map(|id| id.map(ThreadId))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn count(&self, query: &EmailUserQuery) -> Result<usize> {
        let mut params = Vec::new();
        let sql = format!("SELECT COUNT(*){}", from_where(query, &mut params));
        debug!("email_user count: {}", sql);
        let conn = self.conn()?;
        let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
        Ok(count as usize)
    }

    fn set_seen(&self, ids: &[EmailUserId], seen: bool) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut unique = raw_ids(ids);
        unique.sort_unstable();
        unique.dedup();
        let unique: Array = Rc::new(ints(unique));

        let conn = self.conn()?;
        let changed = conn
            .execute(
                "UPDATE email_user SET seen = ? WHERE id IN rarray(?)",
                params![seen, unique],
            )
            .context("Failed to update seen flag")?;
        Ok(changed)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "DELETE FROM email_user;
             DELETE FROM email;
             DELETE FROM email_thread;
             DELETE FROM email_folder;
             DELETE FROM email_origin;
             DELETE FROM sqlite_sequence WHERE name = 'email_user';",
        )?;
        Ok(())
    }
}
