use fundtab_core::db::open_db_in_memory;
use fundtab_core::{CategoryService, SqliteLedgerRepository, BUILTIN_CATEGORIES};

#[test]
fn list_starts_with_builtins() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteLedgerRepository::new(&conn));

    let labels = service.list().unwrap();
    assert_eq!(labels.len(), BUILTIN_CATEGORIES.len());
    assert_eq!(labels[0], BUILTIN_CATEGORIES[0]);
}

#[test]
fn added_labels_appear_after_builtins_and_persist() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteLedgerRepository::new(&conn));

    assert!(service.add("Coffee run").unwrap());
    assert!(service.add("  Parking fines  ").unwrap());

    let labels = service.list().unwrap();
    assert_eq!(labels[BUILTIN_CATEGORIES.len()], "Coffee run");
    assert_eq!(labels[BUILTIN_CATEGORIES.len() + 1], "Parking fines");

    // A fresh service over the same storage sees the same labels.
    let reopened = CategoryService::new(SqliteLedgerRepository::new(&conn));
    assert_eq!(reopened.list().unwrap(), labels);
}

#[test]
fn blanks_and_duplicates_are_ignored() {
    let conn = open_db_in_memory().unwrap();
    let service = CategoryService::new(SqliteLedgerRepository::new(&conn));

    assert!(!service.add("").unwrap());
    assert!(!service.add("   ").unwrap());
    assert!(!service.add("Other").unwrap());

    assert!(service.add("Coffee run").unwrap());
    assert!(!service.add("Coffee run").unwrap());

    let labels = service.list().unwrap();
    assert_eq!(labels.len(), BUILTIN_CATEGORIES.len() + 1);
}
