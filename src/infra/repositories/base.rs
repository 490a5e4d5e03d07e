//! Query helpers shared by every repository.
//!
//! Repositories expose a pooled implementation and a transaction-bound
//! one. Both go through these helpers so the query code is written once
//! against `ConnectionTrait`.

use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait, QuerySelect, Select};

use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

/// Fetch one page of `select` plus the total row count.
pub(crate) async fn fetch_page<C, E>(
    db: &C,
    select: Select<E>,
    params: &PaginationParams,
) -> AppResult<(Vec<E::Model>, u64)>
where
    C: ConnectionTrait,
    E: EntityTrait,
    E::Model: Sync,
{
    let total = select.clone().count(db).await?;
    let rows = select
        .offset(params.offset())
        .limit(params.limit())
        .all(db)
        .await?;
    Ok((rows, total))
}

/// Convert a batch of entity models into domain values.
pub(crate) fn convert_all<M, T>(models: Vec<M>) -> AppResult<Vec<T>>
where
    T: TryFrom<M, Error = AppError>,
{
    models.into_iter().map(T::try_from).collect()
}

/// Convert an optional entity model into a domain value.
pub(crate) fn convert_one<M, T>(model: Option<M>) -> AppResult<Option<T>>
where
    T: TryFrom<M, Error = AppError>,
{
    model.map(T::try_from).transpose()
}

/// True when the error is a unique constraint violation.
pub(crate) fn is_unique_violation(err: &sea_orm::DbErr) -> bool {
    matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    )
}
