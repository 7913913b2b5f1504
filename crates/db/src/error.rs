//! Classification of database errors into ledger store errors.
//!
//! The engine only needs to know whether a failure is contention, a lost
//! connection, a violated constraint, or anything else. PostgreSQL reports
//! this through SQLSTATE codes.

use paycore_core::ledger::StoreError;
use sea_orm::{DbErr, RuntimeErr};

/// Maps a `SeaORM` error onto the store error taxonomy.
#[must_use]
pub fn classify_db_err(err: DbErr) -> StoreError {
    let message = err.to_string();
    match err {
        DbErr::ConnectionAcquire(_) => StoreError::Connection(message),
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => classify_sqlx_err(&e, message),
        DbErr::Conn(_) => StoreError::Connection(message),
        _ => StoreError::Backend(message),
    }
}

fn classify_sqlx_err(err: &sqlx::Error, message: String) -> StoreError {
    match err {
        sqlx::Error::Database(db) => match db.code() {
            Some(code) => classify_sqlstate(&code, message),
            None => StoreError::Backend(message),
        },
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Connection(message),
        _ => StoreError::Backend(message),
    }
}

/// Maps a PostgreSQL SQLSTATE code onto the store error taxonomy.
///
/// - `40P01` deadlock, `40001` serialization failure, `55P03` lock timeout and
///   `57014` statement timeout are contention.
/// - Class `08` and server shutdown or overload are connection failures.
/// - Class `23` is a constraint violation.
#[must_use]
pub fn classify_sqlstate(code: &str, message: String) -> StoreError {
    match code {
        "40P01" | "40001" | "55P03" | "57014" => StoreError::Contention(message),
        "53300" | "57P01" | "57P02" | "57P03" => StoreError::Connection(message),
        c if c.starts_with("08") => StoreError::Connection(message),
        c if c.starts_with("23") => StoreError::Constraint(message),
        _ => StoreError::Backend(message),
    }
}
