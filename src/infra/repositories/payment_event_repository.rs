//! Processed payment events, the idempotency ledger for webhooks.

use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::entities::payment_event::{self, Entity as PaymentEventEntity};
use crate::domain::PaymentOutcome;
use crate::errors::AppResult;

pub struct TxPaymentEventRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxPaymentEventRepository<'a> {
    pub(crate) fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    /// Record a provider event. Returns `false` when the id was already seen.
    pub async fn record(
        &self,
        event_id: &str,
        event_type: &str,
        order_id: Option<Uuid>,
    ) -> AppResult<bool> {
        let row = payment_event::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_id: Set(event_id.to_string()),
            event_type: Set(event_type.to_string()),
            order_id: Set(order_id),
            outcome: Set(None),
            received_at: Set(chrono::Utc::now()),
        };

        let result = PaymentEventEntity::insert(row)
            .on_conflict(
                OnConflict::column(payment_event::Column::EventId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.txn)
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn set_outcome(&self, event_id: &str, outcome: PaymentOutcome) -> AppResult<()> {
        PaymentEventEntity::update_many()
            .col_expr(payment_event::Column::Outcome, Expr::value(outcome.as_str()))
            .filter(payment_event::Column::EventId.eq(event_id))
            .exec(self.txn)
            .await?;
        Ok(())
    }
}
