//! Discount, commission, task, wholesale and dashboard service tests.

mod common;

use std::collections::HashMap;

use mockall::predicate::eq;
use rust_decimal::Decimal;
use uuid::Uuid;

use storefront::domain::{
    CommissionStatus, DiscountKind, DiscountUpdate, NewDiscount, OrderStatus, TaskStatus,
    UserRole,
};
use storefront::errors::AppError;
use storefront::infra::{
    MockCommissionRepository, MockDiscountRepository, MockOrderRepository, MockTaskRepository,
    MockWholesaleRepository,
};
use storefront::services::{
    ApplicationForm, CommissionManager, CommissionService, DashboardManager, DashboardService,
    DiscountManager, DiscountService, TaskManager, TaskService, WholesaleManager,
    WholesaleService,
};
use storefront::types::PaginationParams;

use common::{
    commission, current, discount, idle_cache, money, silent_notifier, task, TestUnitOfWork,
};

// =============================================================================
// Discounts
// =============================================================================

#[tokio::test]
async fn test_quote_normalizes_code_and_computes_percentage() {
    let mut discounts = MockDiscountRepository::new();
    discounts
        .expect_find_by_code()
        .withf(|code| code == "SPRING10")
        .returning(|_| Ok(Some(discount(DiscountKind::Percentage, Decimal::from(10)))));

    let service = DiscountManager::new(TestUnitOfWork::new().with_discounts(discounts).build());
    let quote = service.quote("  spring10 ", money(8000)).await.unwrap();

    assert_eq!(quote.code, "SPRING10");
    assert_eq!(quote.discount_amount, money(800));
}

#[tokio::test]
async fn test_fixed_discount_never_exceeds_subtotal() {
    let mut discounts = MockDiscountRepository::new();
    discounts
        .expect_find_by_code()
        .returning(|_| Ok(Some(discount(DiscountKind::Fixed, Decimal::from(25)))));

    let service = DiscountManager::new(TestUnitOfWork::new().with_discounts(discounts).build());
    let quote = service.quote("SPRING10", money(1500)).await.unwrap();

    assert_eq!(quote.discount_amount, money(1500));
}

#[tokio::test]
async fn test_quote_unknown_code() {
    let mut discounts = MockDiscountRepository::new();
    discounts.expect_find_by_code().returning(|_| Ok(None));

    let service = DiscountManager::new(TestUnitOfWork::new().with_discounts(discounts).build());

    assert!(matches!(
        service.quote("NOPE", money(1000)).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_quote_below_minimum_subtotal() {
    let mut code = discount(DiscountKind::Percentage, Decimal::from(10));
    code.min_subtotal = Some(money(5000));

    let mut discounts = MockDiscountRepository::new();
    discounts
        .expect_find_by_code()
        .returning(move |_| Ok(Some(code.clone())));

    let service = DiscountManager::new(TestUnitOfWork::new().with_discounts(discounts).build());

    assert!(matches!(
        service.quote("SPRING10", money(4999)).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_quote_rejects_negative_subtotal() {
    let service = DiscountManager::new(TestUnitOfWork::new().build());

    assert!(matches!(
        service.quote("SPRING10", money(-100)).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_create_rejects_percentage_over_hundred() {
    let mut discounts = MockDiscountRepository::new();
    discounts.expect_create().never();

    let service = DiscountManager::new(TestUnitOfWork::new().with_discounts(discounts).build());
    let result = service
        .create(NewDiscount {
            code: "HALFPLUS".to_string(),
            kind: DiscountKind::Percentage,
            value: Decimal::from(150),
            min_subtotal: None,
            max_uses: None,
            starts_at: None,
            expires_at: None,
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_update_rejects_zero_max_uses() {
    let service = DiscountManager::new(TestUnitOfWork::new().build());
    let result = service
        .update(
            Uuid::new_v4(),
            DiscountUpdate {
                max_uses: Some(0),
                ..Default::default()
            },
        )
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

// =============================================================================
// Commissions
// =============================================================================

#[tokio::test]
async fn test_mark_pending_commission_paid() {
    let pending = commission(CommissionStatus::PendingPayout);
    let id = pending.id;
    let mut paid = pending.clone();
    paid.status = CommissionStatus::Paid;

    let mut commissions = MockCommissionRepository::new();
    commissions
        .expect_find_by_id()
        .with(eq(id))
        .returning(move |_| Ok(Some(pending.clone())));
    commissions
        .expect_update_status()
        .with(
            eq(id),
            eq(CommissionStatus::PendingPayout),
            eq(CommissionStatus::Paid),
        )
        .times(1)
        .returning(move |_, _, _| Ok(paid.clone()));

    let service =
        CommissionManager::new(TestUnitOfWork::new().with_commissions(commissions).build());
    let updated = service.mark_paid(id).await.unwrap();

    assert_eq!(updated.status, CommissionStatus::Paid);
}

#[tokio::test]
async fn test_paid_commission_cannot_be_cancelled() {
    let paid = commission(CommissionStatus::Paid);
    let id = paid.id;

    let mut commissions = MockCommissionRepository::new();
    commissions
        .expect_find_by_id()
        .returning(move |_| Ok(Some(paid.clone())));
    commissions.expect_update_status().never();

    let service =
        CommissionManager::new(TestUnitOfWork::new().with_commissions(commissions).build());

    assert!(matches!(
        service.cancel(id).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_list_mine_scopes_to_referrer() {
    let user_id = Uuid::new_v4();

    let mut commissions = MockCommissionRepository::new();
    commissions
        .expect_list()
        .withf(move |owner, status, _| *owner == Some(user_id) && status.is_none())
        .returning(|_, _, _| Ok((vec![commission(CommissionStatus::PendingPayout)], 1)));

    let service =
        CommissionManager::new(TestUnitOfWork::new().with_commissions(commissions).build());
    let page = service
        .list_mine(user_id, PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(page.meta.total, 1);
}

// =============================================================================
// Tasks
// =============================================================================

#[tokio::test]
async fn test_admin_task_list_includes_pool() {
    let admin = current(UserRole::Admin);
    let admin_id = admin.id;

    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_list_visible()
        .withf(move |user_id, include_pool, open_only, _| {
            *user_id == admin_id && *include_pool && *open_only
        })
        .returning(|_, _, _, _| Ok((vec![task(TaskStatus::Open)], 1)));

    let service = TaskManager::new(TestUnitOfWork::new().with_tasks(tasks).build());
    let page = service
        .list(&admin, false, PaginationParams::default())
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
}

#[tokio::test]
async fn test_distributor_sees_only_own_tasks() {
    let distributor = current(UserRole::Distributor);

    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_list_visible()
        .withf(|_, include_pool, open_only, _| !*include_pool && !*open_only)
        .returning(|_, _, _, _| Ok((vec![], 0)));

    let service = TaskManager::new(TestUnitOfWork::new().with_tasks(tasks).build());
    let page = service
        .list(&distributor, true, PaginationParams::default())
        .await
        .unwrap();

    assert!(page.data.is_empty());
}

#[tokio::test]
async fn test_complete_open_task() {
    let open = task(TaskStatus::Open);
    let id = open.id;
    let actor_id = Uuid::new_v4();
    let mut done = open.clone();
    done.status = TaskStatus::Completed;
    done.completed_by = Some(actor_id);

    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_find_by_id()
        .returning(move |_| Ok(Some(open.clone())));
    tasks
        .expect_complete()
        .with(eq(id), eq(actor_id))
        .times(1)
        .returning(move |_, _| Ok(done.clone()));

    let service = TaskManager::new(TestUnitOfWork::new().with_tasks(tasks).build());
    let completed = service.complete(actor_id, id).await.unwrap();

    assert_eq!(completed.status, TaskStatus::Completed);
    assert_eq!(completed.completed_by, Some(actor_id));
}

#[tokio::test]
async fn test_completed_task_cannot_be_completed_again() {
    let closed = task(TaskStatus::Completed);
    let id = closed.id;

    let mut tasks = MockTaskRepository::new();
    tasks
        .expect_find_by_id()
        .returning(move |_| Ok(Some(closed.clone())));
    tasks.expect_complete().never();

    let service = TaskManager::new(TestUnitOfWork::new().with_tasks(tasks).build());

    assert!(matches!(
        service.complete(Uuid::new_v4(), id).await,
        Err(AppError::InvalidState(_))
    ));
}

// =============================================================================
// Wholesale
// =============================================================================

#[tokio::test]
async fn test_no_application_on_file() {
    let mut wholesale = MockWholesaleRepository::new();
    wholesale.expect_latest_for_user().returning(|_| Ok(None));

    let service = WholesaleManager::new(
        TestUnitOfWork::new().with_wholesale(wholesale).build(),
        silent_notifier(),
        idle_cache(),
    );

    assert!(matches!(
        service.my_latest(Uuid::new_v4()).await,
        Err(AppError::NotFound)
    ));
}

#[tokio::test]
async fn test_only_retail_accounts_may_apply() {
    let service = WholesaleManager::new(
        TestUnitOfWork::new().build(),
        silent_notifier(),
        idle_cache(),
    );
    let form = ApplicationForm {
        business_name: "Harbour Vapes".to_string(),
        tax_id: None,
        message: None,
    };

    assert!(matches!(
        service.apply(Uuid::new_v4(), UserRole::Wholesale, form).await,
        Err(AppError::InvalidState(_))
    ));
}

#[tokio::test]
async fn test_application_requires_business_name() {
    let service = WholesaleManager::new(
        TestUnitOfWork::new().build(),
        silent_notifier(),
        idle_cache(),
    );
    let form = ApplicationForm {
        business_name: "  ".to_string(),
        tax_id: Some("IE1234567T".to_string()),
        message: None,
    };

    assert!(matches!(
        service.apply(Uuid::new_v4(), UserRole::Retail, form).await,
        Err(AppError::Validation(_))
    ));
}

// =============================================================================
// Dashboard
// =============================================================================

#[tokio::test]
async fn test_dashboard_lists_every_status() {
    let mut orders = MockOrderRepository::new();
    orders.expect_count_by_status().returning(|| {
        Ok(HashMap::from([
            (OrderStatus::Delivered, 2),
            (OrderStatus::PendingPayment, 1),
        ]))
    });
    orders
        .expect_paid_revenue()
        .returning(|| Ok(money(15204)));

    let mut commissions = MockCommissionRepository::new();
    commissions
        .expect_pending_total()
        .returning(|| Ok(money(841)));

    let mut tasks = MockTaskRepository::new();
    tasks.expect_count_open().returning(|| Ok(3));

    let mut wholesale = MockWholesaleRepository::new();
    wholesale.expect_count_pending().returning(|| Ok(1));

    let uow = TestUnitOfWork::new()
        .with_orders(orders)
        .with_commissions(commissions)
        .with_tasks(tasks)
        .with_wholesale(wholesale)
        .build();
    let stats = DashboardManager::new(uow).stats().await.unwrap();

    assert_eq!(stats.orders_by_status.len(), OrderStatus::ALL.len());
    assert_eq!(stats.orders_by_status["delivered"], 2);
    assert_eq!(stats.orders_by_status["pending_payment"], 1);
    assert_eq!(stats.orders_by_status["refunded"], 0);
    assert_eq!(stats.paid_revenue, money(15204));
    assert_eq!(stats.pending_commissions, money(841));
    assert_eq!(stats.open_tasks, 3);
    assert_eq!(stats.pending_wholesale_applications, 1);
}
