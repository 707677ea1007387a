//! Database layer: migrations and contract queries.
//!
//! Transitions are a single conditional `UPDATE` whose `WHERE` clause carries
//! the status precondition, so two racing requests cannot both succeed.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use intermediation::{Contract, ContractId, ContractStatus, NewContract, Transition};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;

/// Establish a SQLite connection pool and run pending migrations.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    init_pool_with(database_url, 5).await
}

/// Same as [`init_pool`] with an explicit connection cap.
pub async fn init_pool_with(database_url: &str, max_connections: u32) -> Result<SqlitePool> {
    let url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{database_url}")
    };

    // Make sure the file is created if it doesn't exist yet.
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database migrations applied successfully");
    Ok(pool)
}

#[derive(Debug, sqlx::FromRow)]
struct ContractRow {
    id: i64,
    investor_ref: i64,
    broker_ref: i64,
    commission_rate: f64,
    duration_hours: i64,
    created_at: i64,
    status: String,
    notes: Option<String>,
}

impl TryFrom<ContractRow> for Contract {
    type Error = sqlx::Error;

    fn try_from(row: ContractRow) -> std::result::Result<Self, Self::Error> {
        let decode = |what: &str| sqlx::Error::Decode(format!("contract {}: invalid {what}", row.id).into());
        Ok(Contract {
            id: u64::try_from(row.id).map_err(|_| decode("id"))?,
            investor_ref: u64::try_from(row.investor_ref).map_err(|_| decode("investor_ref"))?,
            broker_ref: u64::try_from(row.broker_ref).map_err(|_| decode("broker_ref"))?,
            commission_rate: row.commission_rate,
            duration_hours: u32::try_from(row.duration_hours)
                .map_err(|_| decode("duration_hours"))?,
            created_at: DateTime::<Utc>::from_timestamp_millis(row.created_at)
                .ok_or_else(|| decode("created_at"))?,
            status: ContractStatus::from_str_opt(&row.status).ok_or_else(|| decode("status"))?,
            notes: row.notes,
        })
    }
}

const SELECT_CONTRACT: &str = r#"
    SELECT id, investor_ref, broker_ref, commission_rate, duration_hours,
           created_at, status, notes
    FROM   contracts
"#;

fn to_db_ref(value: u64, field: &str) -> Result<i64> {
    i64::try_from(value).map_err(|_| {
        intermediation::Error::Validation(format!("{field} is out of range, got {value}")).into()
    })
}

// ─────────────────────────────────────────────────────────
// Contract writes
// ─────────────────────────────────────────────────────────

/// Validate `request` and persist it as a new `PENDING` contract.
/// Nothing is written when validation fails.
pub async fn insert_contract(pool: &SqlitePool, request: &NewContract) -> Result<Contract> {
    let terms = request.validate()?;
    let investor_ref = to_db_ref(terms.investor_ref, "investor_ref")?;
    let broker_ref = to_db_ref(terms.broker_ref, "broker_ref")?;

    // Stored with millisecond precision; truncate now so the returned value
    // matches what a later read yields.
    let created_at = DateTime::<Utc>::from_timestamp_millis(Utc::now().timestamp_millis())
        .unwrap_or_else(Utc::now);

    let id = sqlx::query(
        r#"
        INSERT INTO contracts
            (investor_ref, broker_ref, commission_rate, duration_hours, created_at, status, notes)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(investor_ref)
    .bind(broker_ref)
    .bind(terms.commission_rate)
    .bind(i64::from(terms.duration_hours))
    .bind(created_at.timestamp_millis())
    .bind(ContractStatus::Pending.as_str())
    .bind(&terms.notes)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(Contract::from_terms(id as ContractId, terms, created_at))
}

/// Apply `transition` atomically. Returns the updated contract, `NotFound`
/// for an unknown id, or `InvalidTransition` when the precondition no longer
/// holds.
///
/// The next status comes from [`Contract::transition`]; the `UPDATE` only
/// lands if the row still carries the status that was read.
pub async fn transition_contract(
    pool: &SqlitePool,
    id: ContractId,
    transition: Transition,
) -> Result<Contract> {
    let mut contract = get_contract(pool, id).await?;
    let from = contract.status;
    contract.transition(transition)?;

    let db_id = i64::try_from(id).map_err(|_| intermediation::Error::NotFound(id))?;
    let rows_affected = sqlx::query("UPDATE contracts SET status = ?1 WHERE id = ?2 AND status = ?3")
        .bind(contract.status.as_str())
        .bind(db_id)
        .bind(from.as_str())
        .execute(pool)
        .await?
        .rows_affected();

    if rows_affected == 0 {
        // Another request moved the row first; report the status it left.
        let current = get_contract(pool, id).await?;
        return Err(intermediation::Error::InvalidTransition {
            id,
            from: current.status,
            transition,
        }
        .into());
    }
    Ok(contract)
}

// ─────────────────────────────────────────────────────────
// Contract reads
// ─────────────────────────────────────────────────────────

/// Fetch a single contract.
pub async fn get_contract(pool: &SqlitePool, id: ContractId) -> Result<Contract> {
    let Ok(db_id) = i64::try_from(id) else {
        return Err(intermediation::Error::NotFound(id).into());
    };
    let row = sqlx::query_as::<_, ContractRow>(&format!("{SELECT_CONTRACT} WHERE id = ?1"))
        .bind(db_id)
        .fetch_optional(pool)
        .await?
        .ok_or(intermediation::Error::NotFound(id))?;
    Ok(Contract::try_from(row)?)
}

/// Fetch all contracts, ordered by id ascending.
pub async fn list_contracts(pool: &SqlitePool) -> Result<Vec<Contract>> {
    let rows = sqlx::query_as::<_, ContractRow>(&format!("{SELECT_CONTRACT} ORDER BY id ASC"))
        .fetch_all(pool)
        .await?;
    rows.into_iter()
        .map(|row| Contract::try_from(row).map_err(Into::into))
        .collect()
}

/// Number of stored contracts.
pub async fn count_contracts(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contracts")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
