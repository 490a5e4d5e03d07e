//! OpenAPI documentation, served through Swagger UI.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, cart_handler, catalog_handler, commission_handler, dashboard_handler,
    discount_handler, fulfillment_handler, inventory_handler, order_handler, payment_handler,
    task_handler, upload_handler, user_handler, wholesale_handler,
};
use crate::domain::{
    ApplicationStatus, CartLine, CartView, Commission, CommissionStatus, DiscountCode,
    DiscountKind, InventoryMovement, Order, OrderDetail, OrderItem, OrderStatus,
    OrderStatusChange, PaymentOutcome, PaymentStatus, PriceBreakdown, Product,
    ProductDetail, ProductVariation, ReferralSummary, StockLevel, Task, TaskKind, TaskStatus,
    UserResponse, UserRole, UserStatus, VariationWithStock, WebhookEvent, WebhookEventData,
    WholesaleApplication,
};
use crate::services::{DashboardStats, DiscountQuote, TokenResponse, UploadedFile, WebhookReceipt};
use crate::types::{
    ApplicationPage, CommissionPage, MovementPage, OrderPage, PaginationMeta, ProductPage,
    TaskPage, UserPage,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "Storefront and back-office API: catalog, cart, checkout, fulfillment, referrals and wholesale accounts",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        auth_handler::register,
        auth_handler::login,
        user_handler::get_current_user,
        user_handler::get_referrals,
        user_handler::list_users,
        user_handler::get_user,
        user_handler::activate_user,
        user_handler::suspend_user,
        user_handler::set_role,
        user_handler::delete_user,
        user_handler::restore_user,
        catalog_handler::list_products,
        catalog_handler::get_product,
        catalog_handler::list_categories,
        catalog_handler::admin_list_products,
        catalog_handler::create_product,
        catalog_handler::update_product,
        catalog_handler::create_variation,
        catalog_handler::update_variation,
        cart_handler::view_cart,
        cart_handler::add_item,
        cart_handler::update_item,
        cart_handler::remove_item,
        cart_handler::clear_cart,
        discount_handler::validate_discount,
        discount_handler::list_discounts,
        discount_handler::create_discount,
        discount_handler::update_discount,
        discount_handler::delete_discount,
        order_handler::checkout,
        order_handler::list_my_orders,
        order_handler::get_order,
        order_handler::cancel_order,
        order_handler::list_orders,
        fulfillment_handler::approve_order,
        fulfillment_handler::assign_distributor,
        fulfillment_handler::verify_fulfillment,
        fulfillment_handler::admin_ship_order,
        fulfillment_handler::admin_deliver_order,
        fulfillment_handler::refund_order,
        fulfillment_handler::distributor_orders,
        fulfillment_handler::submit_fulfillment,
        fulfillment_handler::distributor_ship_order,
        fulfillment_handler::distributor_deliver_order,
        fulfillment_handler::distributor_inventory,
        payment_handler::payment_webhook,
        commission_handler::list_my_commissions,
        commission_handler::list_commissions,
        commission_handler::pay_commission,
        commission_handler::cancel_commission,
        inventory_handler::list_stock,
        inventory_handler::set_stock,
        inventory_handler::transfer_stock,
        inventory_handler::list_movements,
        task_handler::list_tasks,
        task_handler::complete_task,
        wholesale_handler::apply,
        wholesale_handler::my_application,
        wholesale_handler::list_applications,
        wholesale_handler::approve_application,
        wholesale_handler::reject_application,
        upload_handler::upload_file,
        dashboard_handler::stats,
    ),
    components(
        schemas(
            UserRole,
            UserStatus,
            UserResponse,
            ReferralSummary,
            Product,
            ProductVariation,
            ProductDetail,
            VariationWithStock,
            CartLine,
            CartView,
            PriceBreakdown,
            DiscountKind,
            DiscountCode,
            DiscountQuote,
            Order,
            OrderItem,
            OrderDetail,
            OrderStatus,
            OrderStatusChange,
            PaymentStatus,
            PaymentOutcome,
            WebhookEvent,
            WebhookEventData,
            WebhookReceipt,
            Commission,
            CommissionStatus,
            StockLevel,
            InventoryMovement,
            Task,
            TaskKind,
            TaskStatus,
            ApplicationStatus,
            WholesaleApplication,
            UploadedFile,
            DashboardStats,
            TokenResponse,
            PaginationMeta,
            UserPage,
            ProductPage,
            OrderPage,
            CommissionPage,
            MovementPage,
            TaskPage,
            ApplicationPage,
            auth_handler::RegisterRequest,
            auth_handler::LoginRequest,
            user_handler::SetRoleRequest,
            catalog_handler::CreateProductRequest,
            catalog_handler::UpdateProductRequest,
            catalog_handler::CreateVariationRequest,
            catalog_handler::UpdateVariationRequest,
            cart_handler::AddCartItemRequest,
            cart_handler::UpdateCartItemRequest,
            discount_handler::CreateDiscountRequest,
            discount_handler::UpdateDiscountRequest,
            discount_handler::ValidateDiscountRequest,
            order_handler::CheckoutRequest,
            fulfillment_handler::NoteRequest,
            fulfillment_handler::AssignDistributorRequest,
            fulfillment_handler::VerifyFulfillmentRequest,
            fulfillment_handler::ShipRequest,
            fulfillment_handler::RefundRequest,
            fulfillment_handler::FulfillRequest,
            inventory_handler::SetStockRequest,
            inventory_handler::TransferRequest,
            wholesale_handler::ApplyRequest,
            wholesale_handler::ReviewRequest,
            upload_handler::UploadForm,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Registration and login"),
        (name = "Users", description = "The signed-in account"),
        (name = "Catalog", description = "Products and categories"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Discounts", description = "Discount codes"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Fulfillment", description = "Order workflow for admins"),
        (name = "Distributor", description = "Distributor workspace"),
        (name = "Payments", description = "Payment provider webhooks"),
        (name = "Commissions", description = "Referral commissions"),
        (name = "Inventory", description = "Stock levels and movements"),
        (name = "Tasks", description = "Back-office tasks"),
        (name = "Wholesale", description = "Wholesale applications"),
        (name = "Uploads", description = "File uploads"),
        (name = "Admin", description = "Back-office administration")
    )
)]
pub struct ApiDoc;

/// Adds the JWT bearer scheme referenced by protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Token from /api/auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_bearer_scheme_and_core_paths() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/api/orders/{id}"));
        assert!(doc.paths.paths.contains_key("/api/webhooks/payments"));
    }
}
