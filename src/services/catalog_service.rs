use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    dto::products::{CatalogQuery, CatalogResponse},
    entity::{
        categories::{Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        products::{Column as ProductCol, Entity as Products, Model as ProductModel},
    },
    error::AppResult,
    models::{Category, Product},
    state::AppState,
};

pub async fn list_catalog(state: &AppState, query: CatalogQuery) -> AppResult<CatalogResponse> {
    let mut condition = Condition::all();
    if query.offers_only == Some(true) {
        condition = condition.add(ProductCol::IsOffer.eq(true));
    }

    // An unknown slug yields an empty product list, not an error.
    let mut unknown_category = false;
    if let Some(slug) = query.category.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        match Categories::find()
            .filter(CategoryCol::Slug.eq(slug))
            .one(&state.orm)
            .await?
        {
            Some(category) => condition = condition.add(ProductCol::CategoryId.eq(category.id)),
            None => unknown_category = true,
        }
    }

    let products = if unknown_category {
        Vec::new()
    } else {
        Products::find()
            .filter(condition)
            .order_by_desc(ProductCol::CreatedAt)
            .find_also_related(Categories)
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|(product, category)| product_from_entity(product, category))
            .collect()
    };

    let categories = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();

    Ok(CatalogResponse {
        products,
        categories,
    })
}

pub fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
    }
}

fn product_from_entity(model: ProductModel, category: Option<CategoryModel>) -> Product {
    Product {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: model.price,
        original_price: model.original_price,
        image: model.image,
        is_offer: model.is_offer,
        in_stock: model.in_stock,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        category: category.map(category_from_entity),
    }
}
