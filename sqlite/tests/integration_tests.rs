//! Integration tests for the recordlite-sqlite crate.

use std::collections::HashSet;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use recordlite_core::{
    Conditions, Entity, Record, RecordError, SaveOutcome, Statement, Storage, hydrate, record,
    schema_for,
};
use recordlite_sqlite::{Database, SqliteError, StoreConfig};

record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Ledger {
        memo: String,
        amount: BigDecimal,
        quantity: i32,
        serial: i64,
        settled: bool,
        booked_at: DateTime<Utc>,
        rate: f64,
        weight: f32,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: String,
        age: Option<i32>,
        nickname: Option<String>,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Sparse {
        note: Option<String>,
        total: Option<BigDecimal>,
        seen: Option<bool>,
        at: Option<DateTime<Utc>>,
        ratio: Option<f64>,
    }
}

record! {
    struct Order {
        group: String,
        limit: i32,
    }
}

fn ledger() -> Ledger {
    Ledger {
        memo: "coffee beans".to_string(),
        amount: BigDecimal::from_str("12345678901234567890.000123").unwrap(),
        quantity: -42,
        serial: 9_007_199_254_740_993,
        settled: true,
        booked_at: DateTime::from_timestamp_millis(1_700_000_000_123).unwrap(),
        rate: 0.1 + 0.2,
        weight: 1.25,
    }
}

fn person(name: &str, age: Option<i32>) -> Entity<Person> {
    Entity::new(Person {
        name: name.to_string(),
        age,
        nickname: None,
    })
}

#[test]
fn test_round_trip_all_field_types() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Ledger>().unwrap();

    let mut entry = Entity::new(ledger());
    let id = repo.save(&mut entry).unwrap().id();

    let loaded = repo.find(id).unwrap();
    assert_eq!(loaded.id(), Some(id));
    assert_eq!(*loaded, ledger());
    assert_eq!(loaded.amount.to_plain_string(), "12345678901234567890.000123");
    assert_eq!(loaded.booked_at.timestamp_millis(), 1_700_000_000_123);
}

#[test]
fn test_absent_values_round_trip_as_null() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Sparse>().unwrap();

    let mut empty = Entity::new(Sparse {
        note: None,
        total: None,
        seen: None,
        at: None,
        ratio: None,
    });
    let id = repo.save(&mut empty).unwrap().id();

    let loaded = repo.find(id).unwrap();
    assert_eq!(*loaded, *empty);

    let rows = db
        .storage()
        .query(&Statement::new("SELECT note, total, seen, at, ratio FROM Sparse"))
        .unwrap();
    assert!(rows[0].iter().all(|(_, value)| value.is_null()));
}

#[test]
fn test_save_twice_updates_in_place() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();

    let mut ada = person("Ada", Some(36));
    let first = repo.save(&mut ada).unwrap();
    assert!(matches!(first, SaveOutcome::Inserted(_)));

    ada.age = Some(37);
    ada.nickname = Some("Countess".to_string());
    assert_eq!(repo.save(&mut ada).unwrap(), SaveOutcome::Updated(first.id()));

    assert_eq!(repo.count().unwrap(), 1);
    let loaded = repo.find(first.id()).unwrap();
    assert_eq!(loaded.age, Some(37));
    assert_eq!(loaded.nickname.as_deref(), Some("Countess"));
}

#[test]
fn test_identities_are_distinct_and_positive() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();

    let mut ids = HashSet::new();
    for name in ["a", "b", "c"] {
        let mut p = person(name, None);
        ids.insert(repo.save(&mut p).unwrap().id());
    }
    assert!(ids.iter().all(|id| *id > 0));
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_find_missing_identity_is_not_found() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();

    let err = repo.find(999_999).unwrap_err();
    assert!(matches!(err, RecordError::NotFound { id: 999_999, .. }));
}

#[test]
fn test_find_by_matches_every_condition() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();

    for (name, age) in [("Alice", 30), ("Alice", 31), ("Bob", 30)] {
        let mut p = person(name, Some(age));
        repo.save(&mut p).unwrap();
    }

    let found = repo
        .find_by(&Conditions::new().with("name", "Alice").with("age", 30), 0)
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Alice");
    assert_eq!(found[0].age, Some(30));
    assert!(!found[0].is_new());
}

#[test]
fn test_find_by_limit_handling() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();
    for _ in 0..4 {
        let mut p = person("Same", None);
        repo.save(&mut p).unwrap();
    }
    let same = Conditions::new().with("name", "Same");

    assert_eq!(repo.find_by(&same, 0).unwrap().len(), 4);
    assert_eq!(repo.find_by(&same, 2).unwrap().len(), 2);
    assert_eq!(repo.find_all(0).unwrap().len(), 4);

    let err = repo.find_by(&same, -1).unwrap_err();
    assert!(matches!(err, RecordError::InvalidArgument(_)));

    let err = repo
        .find_by(&Conditions::new().with("shoe_size", 42), 0)
        .unwrap_err();
    assert!(matches!(err, RecordError::InvalidArgument(_)));
}

#[test]
fn test_conditions_on_non_text_columns() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Ledger>().unwrap();
    let mut entry = Entity::new(ledger());
    repo.save(&mut entry).unwrap();

    let by_flag = Conditions::new().with("settled", true);
    assert_eq!(repo.find_by(&by_flag, 0).unwrap().len(), 1);

    let by_amount = Conditions::new().with("amount", ledger().amount);
    assert_eq!(repo.find_by(&by_amount, 0).unwrap().len(), 1);

    let by_time = Conditions::new().with("booked_at", ledger().booked_at);
    assert_eq!(repo.find_by(&by_time, 0).unwrap().len(), 1);

    let by_weight = Conditions::new().with("weight", 1.25_f32);
    assert_eq!(repo.find_by(&by_weight, 0).unwrap().len(), 1);

    let unsettled = Conditions::new().with("settled", false);
    assert!(repo.find_by(&unsettled, 0).unwrap().is_empty());
}

#[test]
fn test_keyword_names_fail_before_table_creation() {
    let db = Database::open_in_memory().unwrap();

    let err = db.repository::<Order>().err().unwrap();
    assert!(matches!(
        err,
        SqliteError::Record(RecordError::InvalidIdentifier(ref name)) if name == "Order"
    ));
    assert!(!db.table_exists("Order").unwrap());
}

#[test]
fn test_non_finite_double_is_not_written() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Ledger>().unwrap();

    let mut entry = Entity::new(Ledger {
        rate: f64::NAN,
        ..ledger()
    });
    let err = repo.save(&mut entry).unwrap_err();
    assert!(matches!(err, RecordError::Conversion(ref msg) if msg.contains("rate")));
    assert!(entry.is_new());
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn test_delete_then_find_is_not_found() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();

    let mut p = person("Temp", None);
    let id = repo.save(&mut p).unwrap().id();
    assert!(repo.delete(p).unwrap());

    assert!(matches!(
        repo.find(id).unwrap_err(),
        RecordError::NotFound { .. }
    ));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn test_save_after_row_deleted_is_stale() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();

    let mut p = person("Ghost", None);
    let id = repo.save(&mut p).unwrap().id();

    let other_handle = repo.find(id).unwrap();
    assert!(repo.delete(other_handle).unwrap());

    p.age = Some(1);
    let outcome = repo.save(&mut p).unwrap();
    assert_eq!(outcome, SaveOutcome::Stale(id));
    assert_eq!(repo.count().unwrap(), 0);
}

#[test]
fn test_truncate_keeps_table() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();
    for name in ["x", "y"] {
        let mut p = person(name, None);
        repo.save(&mut p).unwrap();
    }

    assert_eq!(repo.truncate().unwrap(), 2);
    assert_eq!(repo.count().unwrap(), 0);
    assert!(db.table_exists(Person::table_name()).unwrap());
}

#[test]
fn test_drop_then_recreate() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();
    let mut p = person("Old", None);
    repo.save(&mut p).unwrap();

    repo.drop_table().unwrap();
    assert!(!db.table_exists("Person").unwrap());
    assert!(matches!(repo.count().unwrap_err(), RecordError::Storage(_)));

    db.create_table::<Person>().unwrap();
    assert_eq!(repo.count().unwrap(), 0);
    let mut fresh = person("New", None);
    repo.save(&mut fresh).unwrap();
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn test_hydrate_rejects_surprise_column() {
    let db = Database::open_in_memory().unwrap();
    let repo = db.repository::<Person>().unwrap();
    let mut p = person("Eve", None);
    repo.save(&mut p).unwrap();

    let rows = db
        .storage()
        .query(&Statement::new("SELECT *, 1 AS extra FROM Person"))
        .unwrap();
    let schema = schema_for::<Person>().unwrap();
    let err = hydrate::<Person>(&schema, &rows[0]).unwrap_err();
    assert!(matches!(err, RecordError::SchemaMismatch { ref column, .. } if column == "extra"));
}

#[test]
fn test_table_missing_declared_column_fails() {
    let db = Database::open_in_memory().unwrap();
    db.with_connection(|conn| {
        conn.execute_batch("CREATE TABLE Person (_id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)")
    })
    .unwrap();

    let repo = db.repository::<Person>().unwrap();
    assert!(matches!(repo.find_all(0).unwrap_err(), RecordError::Storage(_)));
}

#[test]
fn test_repositories_share_one_connection() {
    let db = Database::open_in_memory().unwrap();
    let people = db.repository::<Person>().unwrap();
    let ledgers = db.repository::<Ledger>().unwrap();

    let mut p = person("Shared", None);
    people.save(&mut p).unwrap();
    let mut l = Entity::new(ledger());
    ledgers.save(&mut l).unwrap();

    assert_eq!(people.count().unwrap(), 1);
    assert_eq!(ledgers.count().unwrap(), 1);
    assert!(db.table_exists("Ledger").unwrap());
}

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.db");

    let id = {
        let db = Database::open(StoreConfig::new(&path)).unwrap();
        let repo = db.repository::<Person>().unwrap();
        let mut p = person("Durable", Some(50));
        repo.save(&mut p).unwrap().id()
    };

    let db = Database::open(StoreConfig::new(&path)).unwrap();
    let repo = db.repository::<Person>().unwrap();
    let loaded = repo.find(id).unwrap();
    assert_eq!(loaded.name, "Durable");
    assert_eq!(loaded.age, Some(50));
}

#[test]
fn test_upgrade_hook_can_migrate_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.db");
    {
        let db = Database::open(StoreConfig::new(&path)).unwrap();
        let repo = db.repository::<Person>().unwrap();
        let mut p = person("Young", Some(1));
        repo.save(&mut p).unwrap();
    }

    let hook = |conn: &rusqlite::Connection, from: u32, to: u32| -> rusqlite::Result<()> {
        assert_eq!((from, to), (1, 2));
        conn.execute("UPDATE Person SET age = age + 1", [])?;
        Ok(())
    };
    let db = Database::open_with_upgrade(StoreConfig::new(&path).with_version(2), &hook).unwrap();
    assert_eq!(db.version().unwrap(), 2);

    let repo = db.repository::<Person>().unwrap();
    let found = repo
        .find_by(&Conditions::new().with("name", "Young"), 1)
        .unwrap();
    assert_eq!(found[0].age, Some(2));
}

#[test]
fn test_config_file_drives_open() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("store.yaml");
    let config = StoreConfig::new(dir.path().join("from_config.db")).with_version(3);
    config.save(&config_path).unwrap();

    let db = Database::open(StoreConfig::load(&config_path).unwrap()).unwrap();
    assert_eq!(db.version().unwrap(), 3);
    assert_eq!(db.config(), &config);

    let err = Database::open(StoreConfig::new(dir.path().join("x.db")).with_version(0))
        .err()
        .unwrap();
    assert!(matches!(err, SqliteError::ConfigError(_)));
}
