use std::sync::{Arc, Mutex};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Category, Engine, EngineError, ExpenseUpdate, LedgerEvent, LedgerNotifier, MemberRole,
    MessageKind, MoneyCents, NewExpense, NewRoom, Room, RoomKind, Settlement, Split, Transfer,
    ValidationError,
};
use migration::MigratorTrait;

/// Keeps `(room_id, event kind)` of every published event.
#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(String, &'static str)>>,
}

impl RecordingNotifier {
    fn kinds(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().iter().map(|(_, k)| *k).collect()
    }

    fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl LedgerNotifier for RecordingNotifier {
    fn publish(&self, room_id: &str, event: LedgerEvent) {
        self.events
            .lock()
            .unwrap()
            .push((room_id.to_string(), event.kind()));
    }
}

async fn engine_with_db() -> (Engine, Arc<RecordingNotifier>, DatabaseConnection) {
    engine_with(ConnectOptions::new("sqlite::memory:")).await
}

async fn engine_with(options: ConnectOptions) -> (Engine, Arc<RecordingNotifier>, DatabaseConnection) {
    let db = Database::connect(options).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob", "carol", "dave"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let notifier = Arc::new(RecordingNotifier::default());
    let engine = Engine::builder()
        .database(db.clone())
        .notifier(notifier.clone())
        .build()
        .await
        .unwrap();
    (engine, notifier, db)
}

/// Room created by alice, joined by bob and carol.
async fn trip_room(engine: &Engine) -> Room {
    let room = engine
        .create_room(
            NewRoom {
                name: "Marrakech trip".to_string(),
                kind: Some(RoomKind::Trip),
                ..NewRoom::default()
            },
            "alice",
        )
        .await
        .unwrap();
    for user in ["bob", "carol"] {
        engine.join_room(&room.invite_code, user).await.unwrap();
    }
    room
}

fn dinner(paid_by: &str, cents: i64, split: Split) -> NewExpense {
    NewExpense {
        description: "Dinner".to_string(),
        amount: MoneyCents::new(cents),
        category: Some(Category::Food),
        paid_by: paid_by.to_string(),
        date: None,
        split,
    }
}

fn transfer(from: &str, to: &str, cents: i64) -> Transfer {
    Transfer {
        from: from.to_string(),
        to: to.to_string(),
        amount: MoneyCents::new(cents),
    }
}

#[tokio::test]
async fn create_room_makes_creator_admin() {
    let (engine, notifier, _db) = engine_with_db().await;
    let room = engine
        .create_room(
            NewRoom {
                name: "  Flat 4B ".to_string(),
                ..NewRoom::default()
            },
            "alice",
        )
        .await
        .unwrap();

    assert_eq!(room.name, "Flat 4B");
    assert_eq!(room.kind, RoomKind::General);
    assert_eq!(room.currency.code(), "MAD");
    assert_eq!(room.invite_code.len(), 6);

    let detail = engine.room(&room.id, "alice").await.unwrap();
    assert_eq!(detail.members.len(), 1);
    assert_eq!(detail.members[0].role, MemberRole::Admin);

    let messages = engine.list_messages(&room.id, "alice").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::System);
    assert_eq!(notifier.kinds(), vec!["new_message"]);
}

#[tokio::test]
async fn create_room_rejects_short_name() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let err = engine
        .create_room(
            NewRoom {
                name: "x".to_string(),
                ..NewRoom::default()
            },
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::InvalidField { field: "room name", .. })
    ));
}

#[tokio::test]
async fn join_room_is_idempotent() {
    let (engine, notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    notifier.clear();

    let joined = engine
        .join_room(&room.invite_code.to_lowercase(), "bob")
        .await
        .unwrap();
    assert_eq!(joined.id, room.id);
    assert!(notifier.kinds().is_empty());

    let detail = engine.room(&room.id, "bob").await.unwrap();
    assert_eq!(detail.members.len(), 3);
    assert_eq!(
        detail
            .members
            .iter()
            .filter(|m| m.role == MemberRole::Member)
            .count(),
        2
    );

    let err = engine.join_room("ZZZZZZ", "dave").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("room not exists".to_string()));
}

#[tokio::test]
async fn list_rooms_only_shows_own_rooms() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;

    let ids: Vec<String> = engine
        .list_rooms("bob")
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec![room.id]);
    assert!(engine.list_rooms("dave").await.unwrap().is_empty());
}

#[tokio::test]
async fn non_member_is_forbidden() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;

    let err = engine.room_summary(&room.id, "dave").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine.room_summary("missing", "alice").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("room not exists".to_string()));

    let err = engine
        .create_expense(&room.id, dinner("dave", 10_00, Split::equal(["dave"])), "dave")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn three_way_dinner_summary() {
    let (engine, notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    notifier.clear();

    let expense = engine
        .create_expense(
            &room.id,
            dinner("alice", 90_00, Split::equal(["alice", "bob", "carol"])),
            "alice",
        )
        .await
        .unwrap();
    assert_eq!(expense.currency, room.currency);
    assert!(expense.shares.iter().all(|s| s.owed == MoneyCents::new(30_00)));
    assert_eq!(
        notifier.kinds(),
        vec!["expense_added", "new_message", "summary_updated"]
    );

    let summary = engine.room_summary(&room.id, "bob").await.unwrap();
    assert_eq!(summary.total_spent, MoneyCents::new(90_00));
    assert_eq!(summary.balances.get("alice"), Some(MoneyCents::new(60_00)));
    assert_eq!(summary.balances.get("bob"), Some(MoneyCents::new(-30_00)));
    assert_eq!(summary.balances.get("carol"), Some(MoneyCents::new(-30_00)));
    assert_eq!(
        summary.transfers,
        vec![
            transfer("bob", "alice", 30_00),
            transfer("carol", "alice", 30_00)
        ]
    );

    let messages = engine.list_messages(&room.id, "carol").await.unwrap();
    let last = messages.last().unwrap();
    assert_eq!(last.body, "alice added: Dinner (90.00 MAD)");
}

#[tokio::test]
async fn hundred_split_three_ways_keeps_every_cent() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;

    let expense = engine
        .create_expense(
            &room.id,
            dinner("bob", 100_00, Split::equal(["alice", "bob", "carol"])),
            "bob",
        )
        .await
        .unwrap();
    let owed: Vec<i64> = expense.shares.iter().map(|s| s.owed.cents()).collect();
    assert_eq!(owed, vec![33_33, 33_33, 33_34]);

    let stored = engine.expense(expense.id, "carol").await.unwrap();
    assert_eq!(stored.shares, expense.shares);
    assert_eq!(stored.amount, expense.amount);
}

#[tokio::test]
async fn unequal_mismatch_is_rejected_and_not_stored() {
    let (engine, notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    notifier.clear();

    let ok = Split::unequal([
        ("alice", MoneyCents::new(40_00)),
        ("bob", MoneyCents::new(35_00)),
        ("carol", MoneyCents::new(25_00)),
    ]);
    engine
        .create_expense(&room.id, dinner("alice", 100_00, ok), "alice")
        .await
        .unwrap();

    let short = Split::unequal([
        ("alice", MoneyCents::new(40_00)),
        ("bob", MoneyCents::new(35_00)),
        ("carol", MoneyCents::new(24_00)),
    ]);
    let err = engine
        .create_expense(&room.id, dinner("alice", 100_00, short), "alice")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::Validation(ValidationError::SumMismatch {
            expected: MoneyCents::new(100_00),
            actual: MoneyCents::new(99_00),
        })
    );

    assert_eq!(engine.list_expenses(&room.id, "alice").await.unwrap().len(), 1);
    assert_eq!(notifier.kinds().len(), 3);
}

#[tokio::test]
async fn participants_must_be_members() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;

    let err = engine
        .create_expense(
            &room.id,
            dinner("alice", 20_00, Split::equal(["alice", "dave"])),
            "alice",
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::InvalidField { field: "participants", .. })
    ));

    let err = engine
        .create_expense(&room.id, dinner("dave", 20_00, Split::equal(["alice"])), "alice")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Validation(ValidationError::InvalidField { field: "paid_by", .. })
    ));
    assert!(engine.list_expenses(&room.id, "alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn settle_share_is_idempotent() {
    let (engine, notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    let expense = engine
        .create_expense(
            &room.id,
            dinner("alice", 90_00, Split::equal(["alice", "bob", "carol"])),
            "alice",
        )
        .await
        .unwrap();
    notifier.clear();

    let (settlement, updated) = engine.settle_share(expense.id, None, "bob").await.unwrap();
    assert_eq!(settlement, Settlement::Settled);
    assert!(updated.share("bob").unwrap().settled);
    assert!(!updated.share("carol").unwrap().settled);
    assert_eq!(
        notifier.kinds(),
        vec!["expense_updated", "new_message", "summary_updated"]
    );

    let summary = engine.room_summary(&room.id, "alice").await.unwrap();
    assert_eq!(summary.balances.get("alice"), Some(MoneyCents::new(30_00)));
    assert_eq!(summary.balances.get("bob"), Some(MoneyCents::ZERO));
    assert_eq!(summary.transfers, vec![transfer("carol", "alice", 30_00)]);

    notifier.clear();
    let (settlement, _) = engine.settle_share(expense.id, None, "bob").await.unwrap();
    assert_eq!(settlement, Settlement::AlreadySettled);
    assert!(notifier.kinds().is_empty());
}

#[tokio::test]
async fn settle_permissions() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    let expense = engine
        .create_expense(
            &room.id,
            dinner("bob", 90_00, Split::equal(["alice", "bob", "carol"])),
            "bob",
        )
        .await
        .unwrap();

    // carol is neither the member, the payer nor an admin.
    let err = engine
        .settle_share(expense.id, Some("alice"), "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    // bob paid, so he can confirm carol paid him back.
    let (settlement, _) = engine
        .settle_share(expense.id, Some("carol"), "bob")
        .await
        .unwrap();
    assert_eq!(settlement, Settlement::Settled);

    // alice is the room admin.
    let (settlement, _) = engine
        .settle_share(expense.id, Some("bob"), "alice")
        .await
        .unwrap();
    assert_eq!(settlement, Settlement::Settled);

    let err = engine
        .settle_share(expense.id, Some("dave"), "alice")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("share not exists".to_string()));
}

/// In-memory SQLite is a single pooled connection, so racing writers need a
/// file database with several connections.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settles_of_sibling_shares_both_stick() {
    let path = std::env::temp_dir().join(format!("roomledger-settle-{}.db", uuid::Uuid::new_v4()));
    let mut options = ConnectOptions::new(format!("sqlite:{}?mode=rwc", path.display()));
    options.max_connections(4).min_connections(4);
    let (engine, _notifier, _db) = engine_with(options).await;
    let engine = Arc::new(engine);

    let room = trip_room(&engine).await;
    engine.join_room(&room.invite_code, "dave").await.unwrap();
    let expense = engine
        .create_expense(
            &room.id,
            dinner("alice", 120_00, Split::equal(["alice", "bob", "carol", "dave"])),
            "alice",
        )
        .await
        .unwrap();

    let expense_id = expense.id;
    let tasks: Vec<_> = ["bob", "carol", "dave"]
        .into_iter()
        .map(|member| {
            let engine = engine.clone();
            tokio::spawn(async move {
                (member, engine.settle_share(expense_id, None, member).await)
            })
        })
        .collect();

    let mut refused = Vec::new();
    for task in tasks {
        let (member, result) = task.await.unwrap();
        match result {
            Ok((settlement, _)) => assert_eq!(settlement, Settlement::Settled, "{member}"),
            // SQLite may turn a competing writer away; that attempt must roll back whole.
            Err(EngineError::Database(_)) => refused.push(member),
            Err(err) => panic!("{member}: {err}"),
        }
    }

    let stored = engine.expense(expense.id, "alice").await.unwrap();
    for member in ["bob", "carol", "dave"] {
        assert_eq!(
            stored.share(member).unwrap().settled,
            !refused.contains(&member),
            "{member}"
        );
    }

    for member in refused {
        let (settlement, _) = engine.settle_share(expense.id, None, member).await.unwrap();
        assert_eq!(settlement, Settlement::Settled);
    }
    let stored = engine.expense(expense.id, "alice").await.unwrap();
    assert!(!stored.share("alice").unwrap().settled);
    assert!(["bob", "carol", "dave"].iter().all(|m| stored.share(m).unwrap().settled));
    let summary = engine.room_summary(&room.id, "alice").await.unwrap();
    assert!(summary.balances.is_settled());
    assert!(summary.transfers.is_empty());

    drop(engine);
    for suffix in ["", "-wal", "-shm", "-journal"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

#[tokio::test]
async fn delete_expense_is_soft_and_creator_only() {
    let (engine, notifier, db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    let expense = engine
        .create_expense(
            &room.id,
            dinner("alice", 90_00, Split::equal(["alice", "bob", "carol"])),
            "alice",
        )
        .await
        .unwrap();
    notifier.clear();

    let err = engine.delete_expense(expense.id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.delete_expense(expense.id, "alice").await.unwrap();
    assert_eq!(notifier.kinds(), vec!["expense_deleted", "summary_updated"]);

    let summary = engine.room_summary(&room.id, "alice").await.unwrap();
    assert_eq!(summary.total_spent, MoneyCents::ZERO);
    assert!(summary.balances.is_settled());
    assert!(summary.transfers.is_empty());

    let err = engine.delete_expense(expense.id, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));
    let err = engine.expense(expense.id, "alice").await.unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));

    // Shares of a deleted expense can no longer be settled.
    notifier.clear();
    let err = engine
        .settle_share(expense.id, Some("bob"), "alice")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::KeyNotFound("expense not exists".to_string()));
    assert!(notifier.kinds().is_empty());
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT settled FROM expense_shares WHERE expense_id = ? AND member_id = ?",
            vec![expense.id.to_string().into(), "bob".into()],
        ))
        .await
        .unwrap()
        .unwrap();
    assert!(!row.try_get::<bool>("", "settled").unwrap());

    // The row is still there, only flagged.
    let row = db
        .query_one(Statement::from_sql_and_values(
            db.get_database_backend(),
            "SELECT deleted FROM expenses WHERE id = ?",
            vec![expense.id.to_string().into()],
        ))
        .await
        .unwrap()
        .unwrap();
    assert!(row.try_get::<bool>("", "deleted").unwrap());
}

#[tokio::test]
async fn update_expense_edits_non_financial_fields() {
    let (engine, _notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    let expense = engine
        .create_expense(
            &room.id,
            dinner("alice", 90_00, Split::equal(["alice", "bob", "carol"])),
            "alice",
        )
        .await
        .unwrap();

    let update = ExpenseUpdate {
        description: Some("Tagine dinner".to_string()),
        category: Some(Category::Entertainment),
        date: None,
    };
    let err = engine
        .update_expense(expense.id, update.clone(), "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let updated = engine
        .update_expense(expense.id, update, "alice")
        .await
        .unwrap();
    assert_eq!(updated.description, "Tagine dinner");
    assert_eq!(updated.category, Category::Entertainment);
    assert_eq!(updated.amount, expense.amount);
    assert_eq!(updated.shares, expense.shares);

    let with_receipt = engine
        .set_receipt_url(expense.id, "https://example.org/r/1.jpg", "carol")
        .await
        .unwrap();
    assert_eq!(
        with_receipt.receipt_url.as_deref(),
        Some("https://example.org/r/1.jpg")
    );
    let err = engine
        .set_receipt_url(expense.id, "ftp://nope", "carol")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn chat_messages_are_listed_oldest_first() {
    let (engine, notifier, _db) = engine_with_db().await;
    let room = trip_room(&engine).await;
    notifier.clear();

    engine.post_message(&room.id, "hello", "bob").await.unwrap();
    engine.post_message(&room.id, "hi bob", "carol").await.unwrap();
    assert_eq!(notifier.kinds(), vec!["new_message", "new_message"]);

    let messages = engine.list_messages(&room.id, "alice").await.unwrap();
    let texts: Vec<&str> = messages
        .iter()
        .filter(|m| m.kind == MessageKind::Text)
        .map(|m| m.body.as_str())
        .collect();
    assert_eq!(texts, vec!["hello", "hi bob"]);

    let err = engine
        .post_message(&room.id, &"x".repeat(501), "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    let err = engine.post_message(&room.id, "hey", "dave").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn register_user_rejects_duplicates() {
    let (engine, _notifier, _db) = engine_with_db().await;
    engine.register_user("erin", "secret123").await.unwrap();
    let err = engine.register_user("erin", "secret123").await.unwrap_err();
    assert_eq!(err, EngineError::ExistingKey("erin".to_string()));

    let err = engine.register_user("frank", "123").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
