use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Category, Product};

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogQuery {
    pub offers_only: Option<bool>,
    /// Category slug to restrict the listing to.
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub products: Vec<Product>,
    pub categories: Vec<Category>,
}
