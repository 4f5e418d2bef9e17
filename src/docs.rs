// src/docs.rs

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::auth::register,
        crate::api::auth::login,
        crate::api::auth::admin_login,
        crate::api::products::list_products,
        crate::api::orders::create_order,
        crate::api::orders::update_order_status,
        crate::api::payments::verify_payment,
        crate::api::webhooks::payment_webhook
    ),
    components(
        schemas(
            crate::api::auth::RegisterRequest,
            crate::api::auth::LoginRequest,
            crate::api::auth::AdminLoginRequest,
            crate::api::orders::CreateOrderRequest,
            crate::api::orders::PaymentRequest,
            crate::api::orders::UpdateStatusRequest,
            crate::api::payments::VerifyPaymentRequest,
            crate::pricing::CartItem,
            crate::pricing::CartCustomization,
            crate::models::Order,
            crate::models::OrderItem,
            crate::models::OrderItemCustomization,
            crate::models::OrderStatus,
            crate::models::OrderPricing,
            crate::models::PaymentInfo,
            crate::models::PaymentMethod,
            crate::models::PaymentStatus,
            crate::models::StatusHistoryEntry,
            crate::models::DeliveryInfo,
            crate::models::DeliveryAddress,
            crate::models::Product,
            crate::models::ProductDescription,
            crate::models::ProductImage,
            crate::models::ProductAttributes,
            crate::models::ProductAvailability,
            crate::models::CustomizationGroup,
            crate::models::CustomizationOption,
            crate::models::Restaurant,
            crate::models::RestaurantSettings,
            crate::models::ContactInfo,
            crate::models::Branding,
            crate::models::Coordinates,
            crate::models::Address
        )
    ),
    tags(
        (name = "auth", description = "Customer and staff authentication"),
        (name = "products", description = "Menu catalog"),
        (name = "orders", description = "Ordering and order lifecycle"),
        (name = "payments", description = "Gateway verification and webhooks")
    )
)]
pub struct ApiDoc;
