//! Wholesale account applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

string_enum! {
    pub enum ApplicationStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WholesaleApplication {
    pub id: Uuid,
    pub user_id: Uuid,
    #[schema(example = "Corner Cafe LLC")]
    pub business_name: String,
    pub tax_id: Option<String>,
    pub message: Option<String>,
    pub status: ApplicationStatus,
    pub reviewed_by: Option<Uuid>,
    pub review_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl WholesaleApplication {
    pub fn ensure_pending(&self) -> AppResult<()> {
        if self.status != ApplicationStatus::Pending {
            return Err(AppError::invalid_state(format!(
                "Application has already been {}",
                self.status
            )));
        }
        Ok(())
    }
}
