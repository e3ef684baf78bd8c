//! Todo list walkthrough.
//!
//! Declares a record type, then saves, queries, updates and deletes rows in
//! an in-memory store. Statement-level logging is printed to stderr.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p recordlite-demos --example todo_list
//! ```

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use recordlite_core::{Conditions, Entity, RecordError, record};
use recordlite_sqlite::Database;
use tracing_subscriber::filter::LevelFilter;

record! {
    #[derive(Debug, Clone)]
    pub struct Todo {
        pub title: String,
        pub done: bool,
        pub priority: i32,
        pub budget: Option<BigDecimal>,
        pub due: Option<DateTime<Utc>>,
    }
}

fn todo(title: &str, priority: i32) -> Entity<Todo> {
    Entity::new(Todo {
        title: title.to_string(),
        done: false,
        priority,
        budget: None,
        due: None,
    })
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::DEBUG)
        .init();

    let db = Database::open_in_memory().unwrap();
    let todos = db.repository::<Todo>().unwrap();
    println!("Table DDL: {}", todos.create_table_sql());

    // === Insert ===
    println!("\n=== Saving ===");
    let mut groceries = todo("Buy groceries", 2);
    groceries.budget = Some("42.50".parse().unwrap());
    groceries.due = Some(Utc::now());
    let outcome = todos.save(&mut groceries).unwrap();
    println!("Inserted 'Buy groceries' as #{}", outcome.id());

    for (title, priority) in [("Write report", 1), ("Call plumber", 2), ("Water plants", 3)] {
        let mut item = todo(title, priority);
        let id = todos.save(&mut item).unwrap().id();
        println!("Inserted '{title}' as #{id}");
    }
    println!("Rows: {}", todos.count().unwrap());

    // === Query ===
    println!("\n=== Querying ===");
    let urgent = todos
        .find_by(&Conditions::new().with("priority", 2).with("done", false), 0)
        .unwrap();
    println!("Open priority-2 items ({}):", urgent.len());
    for item in &urgent {
        println!("  #{} {}", item.id().unwrap_or_default(), item.title);
    }

    let first_two = todos.find_all(2).unwrap();
    println!("First two rows: {:?}", first_two.iter().map(|t| &t.title).collect::<Vec<_>>());

    // === Update ===
    println!("\n=== Updating ===");
    groceries.done = true;
    let outcome = todos.save(&mut groceries).unwrap();
    println!("Saved #{} again (stale: {})", outcome.id(), outcome.is_stale());
    let reloaded = todos.find(outcome.id()).unwrap();
    println!("Reloaded: done={} budget={:?}", reloaded.done, reloaded.budget);

    // === Delete ===
    println!("\n=== Deleting ===");
    let id = reloaded.id().unwrap_or_default();
    println!("Deleted #{id}: {}", todos.delete(reloaded).unwrap());
    match todos.find(id) {
        Err(RecordError::NotFound { table, id }) => println!("#{id} is gone from {table}"),
        other => println!("Unexpected: {other:?}"),
    }

    let stale = todos.save(&mut groceries).unwrap();
    println!("Saving the old handle again is stale: {}", stale.is_stale());

    // === Cleanup ===
    println!("\nCleared {} rows", todos.truncate().unwrap());
    todos.drop_table().unwrap();
    println!("Table dropped: {}", !db.table_exists("Todo").unwrap());
}
