//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `scribe_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    // Why: keep a tiny probe that exercises the storage bootstrap without
    // requiring a database file or logging directory on disk.
    println!("scribe_core version={}", scribe_core::core_version());

    match scribe_core::db::open_db_in_memory() {
        Ok(_conn) => println!("scribe_core storage=ok"),
        Err(err) => {
            eprintln!("scribe_core storage=error {err}");
            std::process::exit(1);
        }
    }
}
