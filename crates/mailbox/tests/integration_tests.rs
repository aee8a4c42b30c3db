//! Integration tests for the mailbox crate
//!
//! Every scenario runs against both the in-memory and the SQLite backend,
//! so the two stores are held to the same query semantics.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use mailbox::models::{
    Email, EmailFolder, EmailId, EmailOrigin, EmailThread, EmailUserId, FolderId, FolderType,
    MailboxId, NewEmailUser, OrganizationId, OriginId, SeenFilter, ThreadId, UserId,
};
use mailbox::query::{EmailUserQuery, Order, Predicate};
use mailbox::storage::{EmailUserStore, InMemoryEmailUserStore, SqliteEmailUserStore};
use mailbox::{
    EmailUserRepository, MassActionHandler, MassActionRequest, count_unseen, format_badge,
};
use tempfile::TempDir;

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);
const ORG: OrganizationId = OrganizationId(1);

const INBOX: FolderId = FolderId(1);
const SENT: FolderId = FolderId(2);
const STALE_INBOX: FolderId = FolderId(3);
const ARCHIVE: FolderId = FolderId(4);

const T1: ThreadId = ThreadId(1);
const T2: ThreadId = ThreadId(2);

/// Row ids of the shared fixture
struct Rows {
    /// alice, head of T1, inbox, unseen
    a_t1_head: EmailUserId,
    /// alice, reply in T1, inbox, unseen
    a_t1_reply: EmailUserId,
    /// alice, head of T2, inbox, seen
    a_t2_head: EmailUserId,
    /// alice, reply in T2, inbox, unseen
    a_t2_reply: EmailUserId,
    /// alice, standalone email, sent, unseen
    a_sent: EmailUserId,
    /// alice, standalone email, inbox of an inactive origin, unseen
    a_stale: EmailUserId,
    /// bob, head of T1, inbox, unseen
    b_t1_head: EmailUserId,
    /// bob, reply in T1, inbox, unseen
    b_t1_reply: EmailUserId,
    /// shared mailbox copy of T1's head
    shared_t1_head: EmailUserId,
}

fn seed(store: &dyn EmailUserStore) -> Rows {
    store.upsert_origin(EmailOrigin::new(OriginId(1), "work")).unwrap();
    store
        .upsert_origin(EmailOrigin::new(OriginId(2), "old account").with_active(false))
        .unwrap();

    for folder in [
        EmailFolder::new(INBOX, OriginId(1), FolderType::Inbox, "Inbox"),
        EmailFolder::new(SENT, OriginId(1), FolderType::Sent, "Sent"),
        EmailFolder::new(STALE_INBOX, OriginId(2), FolderType::Inbox, "Inbox"),
        EmailFolder::new(ARCHIVE, OriginId(1), FolderType::Other, "Archive")
            .with_full_name("INBOX/Archive"),
    ] {
        store.upsert_folder(folder).unwrap();
    }

    store.upsert_thread(EmailThread::new(T1, "Budget")).unwrap();
    store.upsert_thread(EmailThread::new(T2, "Offsite")).unwrap();

    let now = Utc::now();
    let emails = [
        Email::builder(EmailId(1), "<budget@example.com>").subject("Budget").thread(T1),
        Email::builder(EmailId(2), "<re-budget@example.com>")
            .subject("Re: Budget")
            .thread(T1)
            .head(false),
        Email::builder(EmailId(3), "<offsite@example.com>").subject("Offsite").thread(T2),
        Email::builder(EmailId(4), "<re-offsite@example.com>")
            .subject("Re: Offsite")
            .thread(T2)
            .head(false),
        Email::builder(EmailId(5), "<report@example.com>").subject("Report"),
    ];
    for (i, email) in emails.into_iter().enumerate() {
        store
            .upsert_email(email.sent_at(now - Duration::hours(10 - i as i64)).build())
            .unwrap();
    }

    let insert = |email: i64, owner: UserId, folder: FolderId, seen: bool, age_hours: i64| {
        store
            .insert_email_user(
                NewEmailUser::new(EmailId(email), owner, ORG, folder)
                    .seen(seen)
                    .received_at(now - Duration::hours(age_hours)),
            )
            .unwrap()
    };

    let rows = Rows {
        a_t1_head: insert(1, ALICE, INBOX, false, 9),
        a_t1_reply: insert(2, ALICE, INBOX, false, 8),
        a_t2_head: insert(3, ALICE, INBOX, true, 7),
        a_t2_reply: insert(4, ALICE, INBOX, false, 6),
        a_sent: insert(5, ALICE, SENT, false, 5),
        a_stale: insert(5, ALICE, STALE_INBOX, false, 4),
        b_t1_head: insert(1, BOB, INBOX, false, 3),
        b_t1_reply: insert(2, BOB, INBOX, false, 2),
        shared_t1_head: EmailUserId(0),
    };

    let shared = store
        .insert_email_user(
            NewEmailUser::new(EmailId(1), BOB, ORG, FolderId(1))
                .mailbox_owner(MailboxId(50))
                .received_at(now - Duration::hours(1)),
        )
        .unwrap();

    Rows {
        shared_t1_head: shared,
        ..rows
    }
}

/// One repository per backend, each seeded with the same fixture
fn backends() -> Vec<(&'static str, EmailUserRepository, Rows, Option<TempDir>)> {
    let memory: Arc<dyn EmailUserStore> = Arc::new(InMemoryEmailUserStore::new());
    let memory_rows = seed(memory.as_ref());

    let dir = TempDir::new().unwrap();
    // Use .test.sqlite extension to clearly distinguish from production databases
    let sqlite: Arc<dyn EmailUserStore> =
        Arc::new(SqliteEmailUserStore::open(dir.path().join("mailbox.test.sqlite")).unwrap());
    let sqlite_rows = seed(sqlite.as_ref());

    vec![
        ("memory", EmailUserRepository::new(memory), memory_rows, None),
        ("sqlite", EmailUserRepository::new(sqlite), sqlite_rows, Some(dir)),
    ]
}

fn set(ids: impl IntoIterator<Item = EmailUserId>) -> BTreeSet<EmailUserId> {
    ids.into_iter().collect()
}

fn row_ids(rows: &[mailbox::EmailUser]) -> BTreeSet<EmailUserId> {
    rows.iter().map(|r| r.id).collect()
}

#[test]
fn test_email_user_list_filters_partition_unfiltered_result() {
    for (backend, repo, rows, _dir) in backends() {
        let list = |types: &[FolderType], seen: SeenFilter| {
            row_ids(&repo.get_email_user_list(ALICE, ORG, types, seen).unwrap())
        };
        let unfiltered = list(&[], SeenFilter::Any);
        assert_eq!(
            unfiltered,
            set([rows.a_t1_head, rows.a_t1_reply, rows.a_t2_head, rows.a_t2_reply, rows.a_sent]),
            "{backend}: inactive origin rows must be hidden"
        );

        for types in [
            vec![FolderType::Inbox],
            vec![FolderType::Sent],
            vec![FolderType::Inbox, FolderType::Sent],
            vec![FolderType::Trash],
        ] {
            let filtered = list(&types, SeenFilter::Any);
            assert!(filtered.is_subset(&unfiltered), "{backend}: {types:?} not a subset");
        }

        let seen = list(&[], SeenFilter::SeenOnly);
        let unseen = list(&[], SeenFilter::UnseenOnly);
        assert!(seen.is_disjoint(&unseen), "{backend}");
        assert_eq!(&seen | &unseen, unfiltered, "{backend}");
        assert_eq!(seen, set([rows.a_t2_head]), "{backend}");
    }
}

#[test]
fn test_find_by_email_and_owner_and_mailbox() {
    for (backend, repo, rows, _dir) in backends() {
        let bob = row_ids(&repo.find_by_email_and_owner(EmailId(1), BOB, ORG).unwrap());
        assert_eq!(bob, set([rows.b_t1_head, rows.shared_t1_head]), "{backend}");

        let alice = row_ids(&repo.find_by_email_and_owner(EmailId(5), ALICE, ORG).unwrap());
        assert_eq!(alice, set([rows.a_sent, rows.a_stale]), "{backend}");

        assert!(repo.find_by_email_and_owner(EmailId(3), BOB, ORG).unwrap().is_empty());

        let shared = row_ids(&repo.find_by_email_for_mailbox(EmailId(1)).unwrap());
        assert_eq!(shared, set([rows.shared_t1_head]), "{backend}");
    }
}

#[test]
fn test_inverted_ids_from_folder() {
    for (backend, repo, rows, _dir) in backends() {
        let all_in_inbox = repo.get_email_user_by_folder(INBOX).fetch_ids(repo.store()).unwrap();
        assert_eq!(all_in_inbox.len(), 7, "{backend}");

        // Empty input excludes nothing
        let inverted = repo.get_inverted_ids_from_folder(&[], INBOX).unwrap();
        assert_eq!(set(inverted), set(all_in_inbox.clone()), "{backend}");

        let inverted = repo.get_inverted_ids_from_folder(&all_in_inbox, INBOX).unwrap();
        assert!(inverted.is_empty(), "{backend}");

        let inverted = repo
            .get_inverted_ids_from_folder(&[rows.a_t1_reply, rows.a_sent], INBOX)
            .unwrap();
        assert!(!inverted.contains(&rows.a_t1_reply), "{backend}");
        assert_eq!(inverted.len(), 6, "{backend}");
    }
}

#[test]
fn test_inverted_ids_example_folder() {
    for (backend, repo, _rows, _dir) in backends() {
        let store = repo.store();
        let ids: Vec<EmailUserId> = (0..3)
            .map(|_| {
                store
                    .insert_email_user(NewEmailUser::new(EmailId(5), ALICE, ORG, ARCHIVE))
                    .unwrap()
            })
            .collect();

        let inverted = repo.get_inverted_ids_from_folder(&[ids[1]], ARCHIVE).unwrap();
        assert_eq!(inverted, vec![ids[0], ids[2]], "{backend}");
    }
}

#[test]
fn test_seen_round_trip() {
    for (backend, repo, rows, _dir) in backends() {
        let unseen = repo.find_unseen_user_email(ALICE, ORG);
        let before = set(unseen.fetch_ids(repo.store()).unwrap());
        assert!(before.contains(&rows.a_t1_head) && before.contains(&rows.a_t1_reply));

        let updated = repo
            .set_email_users_seen(&[rows.a_t1_head, rows.a_t1_reply], true)
            .unwrap();
        assert_eq!(updated, 2, "{backend}");
        let after = set(unseen.fetch_ids(repo.store()).unwrap());
        assert!(!after.contains(&rows.a_t1_head), "{backend}");
        assert!(!after.contains(&rows.a_t1_reply), "{backend}");

        repo.set_email_users_seen(&[rows.a_t1_head, rows.a_t1_reply], false)
            .unwrap();
        assert_eq!(set(unseen.fetch_ids(repo.store()).unwrap()), before, "{backend}");
    }
}

#[test]
fn test_set_seen_skips_unknown_ids() {
    for (backend, repo, rows, _dir) in backends() {
        let updated = repo
            .set_email_users_seen(&[rows.b_t1_head, EmailUserId(10_000)], true)
            .unwrap();
        assert_eq!(updated, 1, "{backend}");
        let row = repo.store().get_email_user(rows.b_t1_head).unwrap().unwrap();
        assert!(row.seen, "{backend}");
    }
}

#[test]
fn test_mass_action_all_selected_overrides_ids() {
    for (backend, repo, rows, _dir) in backends() {
        let store = repo.store();
        let with_ids = repo
            .get_email_user_builder_for_mass_action(
                &[rows.a_t1_head, rows.a_t1_reply, rows.a_t2_head],
                ALICE,
                None,
                true,
            )
            .fetch_ids(store)
            .unwrap();
        let without_ids = repo
            .get_email_user_builder_for_mass_action(&[], ALICE, None, true)
            .fetch_ids(store)
            .unwrap();

        assert_eq!(with_ids, without_ids, "{backend}");
        assert_eq!(
            set(with_ids),
            set([rows.a_t1_head, rows.a_t2_head, rows.a_sent, rows.a_stale]),
            "{backend}"
        );
    }
}

#[test]
fn test_mass_action_selects_only_own_thread_heads() {
    for (backend, repo, rows, _dir) in backends() {
        let store = repo.store();

        let selected = repo
            .get_email_user_builder_for_mass_action(
                &[rows.a_t1_head, rows.a_t1_reply, rows.b_t1_head],
                ALICE,
                None,
                false,
            )
            .fetch(store)
            .unwrap();
        assert_eq!(row_ids(&selected), set([rows.a_t1_head]), "{backend}");

        for row in &selected {
            assert_eq!(row.owner, ALICE);
            assert!(store.get_email(row.email).unwrap().unwrap().head, "{backend}");
        }

        let sent = repo
            .get_email_user_builder_for_mass_action(&[], ALICE, Some(FolderType::Sent), true)
            .fetch_ids(store)
            .unwrap();
        assert_eq!(sent, vec![rows.a_sent], "{backend}");
    }
}

#[test]
fn test_thread_query_returns_only_non_head_rows() {
    for (backend, repo, rows, _dir) in backends() {
        let store = repo.store();

        let t1 = repo.get_email_user_by_thread_id(&[T1], ALICE).fetch(store).unwrap();
        assert_eq!(row_ids(&t1), set([rows.a_t1_reply]), "{backend}");
        for row in &t1 {
            assert!(!store.get_email(row.email).unwrap().unwrap().head, "{backend}");
        }

        let both = repo
            .get_email_user_by_thread_id(&[T1, T2], ALICE)
            .fetch_ids(store)
            .unwrap();
        assert_eq!(set(both), set([rows.a_t1_reply, rows.a_t2_reply]), "{backend}");

        let bob = repo.get_email_user_by_thread_id(&[T1], BOB).fetch_ids(store).unwrap();
        assert_eq!(bob, vec![rows.b_t1_reply], "{backend}");

        assert!(repo.get_email_user_by_thread_id(&[], ALICE).fetch_ids(store).unwrap().is_empty());
    }
}

#[test]
fn test_folder_and_message_id_lookup() {
    for (backend, repo, rows, _dir) in backends() {
        let found = repo
            .get_email_users_by_folder_and_message_ids(
                INBOX,
                &["<re-budget@example.com>".to_string(), "<missing@example.com>".to_string()],
            )
            .unwrap();
        assert_eq!(row_ids(&found), set([rows.a_t1_reply, rows.b_t1_reply]), "{backend}");

        let wrong_folder = repo
            .get_email_users_by_folder_and_message_ids(SENT, &["<budget@example.com>".to_string()])
            .unwrap();
        assert!(wrong_folder.is_empty(), "{backend}");
    }
}

#[test]
fn test_query_handle_composes_after_return() {
    for (backend, repo, rows, _dir) in backends() {
        let store = repo.store();
        let query = repo
            .get_email_user_by_folder(INBOX)
            .and_where(Predicate::Owner(ALICE))
            .and_where(Predicate::Seen(false))
            .order_by(Order::ReceivedDesc);

        assert_eq!(query.count(store).unwrap(), 3, "{backend}");
        assert_eq!(
            query.fetch_ids(store).unwrap(),
            vec![rows.a_t2_reply, rows.a_t1_reply, rows.a_t1_head],
            "{backend}"
        );
        assert_eq!(
            query.first(store).unwrap().map(|r| r.id),
            Some(rows.a_t2_reply),
            "{backend}"
        );
        assert_eq!(
            query.clone().limit(1).offset(1).fetch_ids(store).unwrap(),
            vec![rows.a_t1_reply],
            "{backend}"
        );
    }
}

#[test]
fn test_mark_read_mass_action_covers_whole_thread() {
    for (backend, repo, rows, _dir) in backends() {
        let handler = MassActionHandler::with_repository(repo.clone());
        assert_eq!(count_unseen(&repo, ALICE, ORG).unwrap(), 5, "{backend}");

        let result = handler
            .mark_seen(&MassActionRequest::selected(vec![rows.a_t1_head], ALICE), true)
            .unwrap();
        assert_eq!(result.selected, 1, "{backend}");
        assert_eq!(result.thread_rows, 1, "{backend}");
        assert_eq!(result.updated, 2, "{backend}");

        assert_eq!(count_unseen(&repo, ALICE, ORG).unwrap(), 3, "{backend}");
        // Bob's copies of the same thread are untouched
        let bob = repo.store().get_email_user(rows.b_t1_reply).unwrap().unwrap();
        assert!(!bob.seen, "{backend}");
    }
}

#[test]
fn test_mark_read_all_except() {
    for (backend, repo, rows, _dir) in backends() {
        let handler = MassActionHandler::with_repository(repo.clone());

        let request = MassActionRequest::all_except(vec![rows.a_t2_head], ALICE);
        let result = handler.mark_seen(&request, true).unwrap();
        assert_eq!(result.selected, 3, "{backend}");
        assert_eq!(result.updated, 4, "{backend}");

        let unseen = repo.find_unseen_user_email(ALICE, ORG).fetch_ids(repo.store()).unwrap();
        assert_eq!(unseen, vec![rows.a_t2_reply], "{backend}");
    }
}

#[test]
fn test_empty_mass_action_is_noop() {
    for (backend, repo, _rows, _dir) in backends() {
        let handler = MassActionHandler::with_repository(repo.clone());
        let result = handler
            .mark_seen(&MassActionRequest::selected(vec![], ALICE), true)
            .unwrap();
        assert_eq!(result.updated, 0, "{backend}");
        assert_eq!(count_unseen(&repo, ALICE, ORG).unwrap(), 5, "{backend}");
    }
}

#[test]
fn test_unseen_badge() {
    for (backend, repo, _rows, _dir) in backends() {
        let count = count_unseen(&repo, ALICE, ORG).unwrap();
        assert_eq!(format_badge(count, 10), "(5)", "{backend}");
        assert_eq!(format_badge(count, 4), "(4+)", "{backend}");
        assert_eq!(format_badge(count_unseen(&repo, UserId(99), ORG).unwrap(), 10), "");
    }
}

#[test]
fn test_sqlite_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mailbox.test.sqlite");

    let rows = {
        let store = SqliteEmailUserStore::open(&path).unwrap();
        let rows = seed(&store);
        store.set_seen(&[rows.a_sent], true).unwrap();
        rows
    };

    let store = SqliteEmailUserStore::open(&path).unwrap();
    assert!(store.get_email_user(rows.a_sent).unwrap().unwrap().seen);
    assert_eq!(EmailUserQuery::new().count(&store).unwrap(), 9);
}

#[test]
fn test_thread_ids_of_selection() {
    for (backend, repo, rows, _dir) in backends() {
        let store = repo.store();

        let alice = EmailUserQuery::new().and_where(Predicate::Owner(ALICE));
        assert_eq!(alice.fetch_thread_ids(store).unwrap(), vec![T1, T2], "{backend}");

        let standalone = EmailUserQuery::new().and_where(Predicate::Ids(vec![rows.a_sent]));
        assert!(standalone.fetch_thread_ids(store).unwrap().is_empty(), "{backend}");

        // Pagination applies before threads are collected; alice's newest row has no thread
        let newest = alice.clone().order_by(Order::ReceivedDesc).limit(1);
        assert!(newest.fetch_thread_ids(store).unwrap().is_empty(), "{backend}");
        let newest_three = alice.order_by(Order::ReceivedDesc).limit(3);
        assert_eq!(newest_three.fetch_thread_ids(store).unwrap(), vec![T2], "{backend}");
    }
}

/// More ids than SQLite accepts as separate statement parameters
const MANY: i64 = 40_000;

#[test]
fn test_large_id_lists() {
    let stores: Vec<(&str, Arc<dyn EmailUserStore>)> = vec![
        ("memory", Arc::new(InMemoryEmailUserStore::new())),
        ("sqlite", Arc::new(SqliteEmailUserStore::open_in_memory().unwrap())),
    ];

    for (backend, store) in stores {
        let rows = seed(store.as_ref());
        let repo = EmailUserRepository::new(store);
        let many: Vec<EmailUserId> = (1..=MANY).map(EmailUserId).collect();

        // Unknown ids are skipped, the nine fixture rows match
        assert_eq!(repo.set_email_users_seen(&many, true).unwrap(), 9, "{backend}");
        assert_eq!(count_unseen(&repo, ALICE, ORG).unwrap(), 0, "{backend}");

        let inverted = repo.get_inverted_ids_from_folder(&many, INBOX).unwrap();
        assert!(inverted.is_empty(), "{backend}");

        let in_set = repo
            .get_email_user_builder_for_mass_action(&many, ALICE, None, false)
            .fetch_ids(repo.store())
            .unwrap();
        let heads = vec![rows.a_t1_head, rows.a_t2_head, rows.a_sent, rows.a_stale];
        assert_eq!(in_set, heads, "{backend}");
    }
}

#[test]
fn test_select_all_on_large_mailbox() {
    let stores: Vec<(&str, Arc<dyn EmailUserStore>)> = vec![
        ("memory", Arc::new(InMemoryEmailUserStore::new())),
        ("sqlite", Arc::new(SqliteEmailUserStore::open_in_memory().unwrap())),
    ];

    for (backend, store) in stores {
        seed(store.as_ref());
        for _ in 0..33_000 {
            store
                .insert_email_user(NewEmailUser::new(EmailId(3), ALICE, ORG, ARCHIVE))
                .unwrap();
        }
        let repo = EmailUserRepository::new(store);
        let handler = MassActionHandler::with_repository(repo.clone());

        let result = handler
            .mark_seen(&MassActionRequest::all_except(vec![], ALICE), true)
            .unwrap();
        // Four fixture heads plus the archive copies, then the two thread replies
        assert_eq!(result.selected, 33_004, "{backend}");
        assert_eq!(result.thread_rows, 2, "{backend}");
        assert_eq!(result.updated, 33_006, "{backend}");
        assert_eq!(count_unseen(&repo, ALICE, ORG).unwrap(), 0, "{backend}");
    }
}
