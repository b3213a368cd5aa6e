//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `fundtab_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use fundtab_core::db::open_db_in_memory;
use fundtab_core::{
    Bus, LedgerService, LedgerStats, RecordDraft, RecordKind, RecordState,
    SqliteLedgerRepository,
};

fn main() {
    println!("fundtab_core ping={}", fundtab_core::ping());
    println!("fundtab_core version={}", fundtab_core::core_version());

    // One throwaway in-memory context, exercised end to end.
    let conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("storage open failed: {err}");
            std::process::exit(1);
        }
    };
    let bus = Bus::new("fund_ledger");
    let service = LedgerService::new(SqliteLedgerRepository::new(&conn), &bus);

    let draft = RecordDraft {
        kind: RecordKind::Credit,
        amount: 5.0,
        category: "Other".to_string(),
        note: "smoke probe".to_string(),
        counterpart: "probe".to_string(),
        occurred_on: "2024-01-01".to_string(),
        state: RecordState::Settled,
    };
    match service.create(draft).and_then(|_| service.load_all()) {
        Ok(records) => {
            let stats = LedgerStats::from_records(&records);
            println!(
                "fundtab_core smoke records={} net_balance={}",
                stats.record_count, stats.net_balance
            );
        }
        Err(err) => {
            eprintln!("smoke probe failed: {err}");
            std::process::exit(1);
        }
    }
}
