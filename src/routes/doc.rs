use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use utoipa::openapi::OpenApi as OpenApiSpec;

use crate::{
    dto::{
        auth::{LoginRequest, RegisterRequest, UserResponse},
        orders::{CreateOrderRequest, OrderItemInput, OrderListResponse, OrderResponse},
        products::CatalogResponse,
    },
    models::{Category, Order, OrderItem, Product, ProductSummary, User, UserSummary},
    routes::{auth, health, orders, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_catalog,
        orders::list_orders,
        orders::create_order,
    ),
    components(
        schemas(
            User,
            UserSummary,
            Category,
            Product,
            ProductSummary,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            UserResponse,
            CatalogResponse,
            OrderItemInput,
            CreateOrderRequest,
            OrderResponse,
            OrderListResponse,
            health::HealthData,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Catalog", description = "Product and category browsing"),
        (name = "Orders", description = "Order intake and history"),
        (name = "Auth", description = "Registration and credential checks"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
