//! Back-office work items created by the order and wholesale workflows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

string_enum! {
    pub enum TaskKind {
        ApproveOrder => "approve_order",
        AssignDistributor => "assign_distributor",
        FulfillOrder => "fulfill_order",
        VerifyFulfillment => "verify_fulfillment",
        ShipOrder => "ship_order",
        ReviewWholesaleApplication => "review_wholesale_application",
    }
}

string_enum! {
    pub enum TaskStatus {
        Open => "open",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

/// Task row. `assignee_id = None` means the admin pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub kind: TaskKind,
    pub status: TaskStatus,
    pub assignee_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    #[schema(example = "Approve order 3f2a...")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<Uuid>,
}

impl Task {
    pub fn is_open(&self) -> bool {
        self.status == TaskStatus::Open
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub kind: TaskKind,
    pub assignee_id: Option<Uuid>,
    pub order_id: Option<Uuid>,
    pub application_id: Option<Uuid>,
    pub title: String,
}

impl NewTask {
    /// Task for the admin pool about an order.
    pub fn for_admins(kind: TaskKind, order_id: Uuid) -> Self {
        Self {
            kind,
            assignee_id: None,
            order_id: Some(order_id),
            application_id: None,
            title: Self::order_title(kind, order_id),
        }
    }

    /// Task assigned to one user about an order.
    pub fn for_user(kind: TaskKind, assignee_id: Uuid, order_id: Uuid) -> Self {
        Self {
            assignee_id: Some(assignee_id),
            ..Self::for_admins(kind, order_id)
        }
    }

    pub fn review_application(application_id: Uuid, business_name: &str) -> Self {
        Self {
            kind: TaskKind::ReviewWholesaleApplication,
            assignee_id: None,
            order_id: None,
            application_id: Some(application_id),
            title: format!("Review wholesale application from {}", business_name),
        }
    }

    fn order_title(kind: TaskKind, order_id: Uuid) -> String {
        let verb = match kind {
            TaskKind::ApproveOrder => "Approve",
            TaskKind::AssignDistributor => "Assign a distributor to",
            TaskKind::FulfillOrder => "Fulfill",
            TaskKind::VerifyFulfillment => "Verify fulfillment of",
            TaskKind::ShipOrder => "Ship",
            TaskKind::ReviewWholesaleApplication => "Review",
        };
        format!("{} order {}", verb, order_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_tasks_keep_kind_and_order() {
        let order = Uuid::new_v4();
        let user = Uuid::new_v4();
        let task = NewTask::for_user(TaskKind::FulfillOrder, user, order);
        assert_eq!(task.assignee_id, Some(user));
        assert_eq!(task.order_id, Some(order));
        assert_eq!(task.title, format!("Fulfill order {}", order));
    }

    #[test]
    fn admin_pool_tasks_have_no_assignee() {
        let task = NewTask::for_admins(TaskKind::ApproveOrder, Uuid::new_v4());
        assert!(task.assignee_id.is_none());
    }
}
