//! PostgreSQL-backed `OneTimeCodeRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::EmailAddress;
use crate::domain::ports::{
    OneTimeCodeRecord, OneTimeCodeRepository, OneTimeCodeRepositoryError,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewOneTimeCodeRow, OneTimeCodeRow};
use super::pool::{DbPool, PoolError};
use super::schema::one_time_codes;

/// Diesel-backed implementation of the `OneTimeCodeRepository` port.
#[derive(Clone)]
pub struct DieselOneTimeCodeRepository {
    pool: DbPool,
}

impl DieselOneTimeCodeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OneTimeCodeRepositoryError {
    map_basic_pool_error(error, OneTimeCodeRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OneTimeCodeRepositoryError {
    map_basic_diesel_error(
        error,
        OneTimeCodeRepositoryError::query,
        OneTimeCodeRepositoryError::connection,
    )
}

fn row_to_record(row: OneTimeCodeRow) -> Result<OneTimeCodeRecord, OneTimeCodeRepositoryError> {
    let email = EmailAddress::new(&row.email)
        .map_err(|_| OneTimeCodeRepositoryError::query("stored code has invalid email"))?;
    Ok(OneTimeCodeRecord {
        email,
        code_digest: row.code_digest,
        created_at: row.created_at,
    })
}

#[async_trait]
impl OneTimeCodeRepository for DieselOneTimeCodeRepository {
    async fn insert(&self, record: &OneTimeCodeRecord) -> Result<(), OneTimeCodeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewOneTimeCodeRow {
            email: record.email.as_ref(),
            code_digest: &record.code_digest,
            created_at: record.created_at,
        };
        diesel::insert_into(one_time_codes::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(
        &self,
        email: &EmailAddress,
        code_digest: &str,
    ) -> Result<Option<OneTimeCodeRecord>, OneTimeCodeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        one_time_codes::table
            .filter(one_time_codes::email.eq(email.as_ref()))
            .filter(one_time_codes::code_digest.eq(code_digest))
            .order_by((one_time_codes::created_at.desc(), one_time_codes::id.desc()))
            .select(OneTimeCodeRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .map(row_to_record)
            .transpose()
    }

    async fn consume(
        &self,
        email: &EmailAddress,
        code_digest: &str,
    ) -> Result<bool, OneTimeCodeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            one_time_codes::table
                .filter(one_time_codes::email.eq(email.as_ref()))
                .filter(one_time_codes::code_digest.eq(code_digest)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn purge_created_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, OneTimeCodeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(
            one_time_codes::table.filter(one_time_codes::created_at.lt(cutoff)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(u64::try_from(deleted).unwrap_or(u64::MAX))
    }
}
