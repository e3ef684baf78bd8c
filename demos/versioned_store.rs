//! File-backed store with a YAML configuration and a version upgrade.
//!
//! Writes a configuration file, opens the store at version 1, then reopens
//! it at version 2 with an upgrade hook that rewrites existing rows.
//!
//! # Usage
//!
//! ```bash
//! cargo run -p recordlite-demos --example versioned_store
//! ```

use recordlite_core::{Entity, record};
use recordlite_sqlite::{Database, StoreConfig};
use rusqlite::Connection;

record! {
    #[derive(Debug, Clone)]
    pub struct Contact {
        pub name: String,
        pub email: Option<String>,
        pub visits: i64,
    }
}

fn upgrade(conn: &Connection, from: u32, to: u32) -> rusqlite::Result<()> {
    println!("Upgrading store from v{from} to v{to}");
    conn.execute("UPDATE Contact SET email = lower(email) WHERE email IS NOT NULL", [])?;
    Ok(())
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let dir = std::env::temp_dir().join("recordlite_versioned_store");
    std::fs::create_dir_all(&dir).unwrap();
    let db_path = dir.join("contacts.db");
    let config_path = dir.join("store.yaml");
    std::fs::remove_file(&db_path).ok();

    // === Version 1 ===
    println!("=== Version 1 ===");
    StoreConfig::new(&db_path).save(&config_path).unwrap();
    let config = StoreConfig::load(&config_path).unwrap();
    {
        let db = Database::open(config.clone()).unwrap();
        let contacts = db.repository::<Contact>().unwrap();
        for (name, email) in [("Ada", Some("ADA@Example.org")), ("Grace", None)] {
            let mut contact = Entity::new(Contact {
                name: name.to_string(),
                email: email.map(String::from),
                visits: 0,
            });
            contacts.save(&mut contact).unwrap();
        }
        println!("Store v{} holds {} contacts", db.version().unwrap(), contacts.count().unwrap());
    }

    // === Version 2 ===
    println!("\n=== Version 2 ===");
    let config = config.with_version(2);
    config.save(&config_path).unwrap();
    let config = StoreConfig::load(&config_path).unwrap();
    let db = Database::open_with_upgrade(config, &upgrade).unwrap();
    let contacts = db.repository::<Contact>().unwrap();
    for contact in contacts.find_all(0).unwrap() {
        println!(
            "  #{} {} <{}>",
            contact.id().unwrap_or_default(),
            contact.name,
            contact.email.as_deref().unwrap_or("-")
        );
    }
    println!("Store is now v{}", db.version().unwrap());

    // Cleanup
    drop(contacts);
    drop(db);
    std::fs::remove_dir_all(&dir).ok();
    println!("\nDone!");
}
