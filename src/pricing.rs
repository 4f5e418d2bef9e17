// src/pricing.rs
//
// Cart validation and pricing. Pure: products are fetched by the caller, this
// module only computes. Stock is read, never decremented.

use std::collections::HashMap;

use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    OrderItem, OrderItemCustomization, OrderPricing, Product, Restaurant,
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: Uuid,
    pub quantity: u32,
    #[serde(default)]
    pub customizations: Vec<CartCustomization>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartCustomization {
    /// Customization group name, e.g. "Size".
    pub name: String,
    /// Option name within the group, e.g. "Large".
    pub option: String,
}

#[derive(Debug, Clone)]
pub struct PricedCart {
    pub items: Vec<OrderItem>,
    pub pricing: OrderPricing,
}

/// Validate a cart against its restaurant's catalog and price it.
///
/// `products` maps product id -> product, already scoped to the restaurant.
/// Unit price is the discounted price when one is set, plus the sum of the
/// selected customization option prices; the customization total is charged
/// regardless of which base price applies.
pub fn price_cart(
    restaurant: &Restaurant,
    items: &[CartItem],
    products: &HashMap<Uuid, Product>,
) -> Result<PricedCart, ApiError> {
    if !restaurant.settings.is_active || !restaurant.settings.accepting_orders {
        return Err(ApiError::BadRequest(
            "Restaurant is not accepting orders".to_string(),
        ));
    }
    if items.is_empty() {
        return Err(ApiError::BadRequest("Order has no items".to_string()));
    }

    let mut priced_items = Vec::with_capacity(items.len());
    let mut subtotal = 0.0;

    for item in items {
        let product = products
            .get(&item.product_id)
            .filter(|p| p.availability.is_available)
            .ok_or_else(|| {
                ApiError::BadRequest(format!("Product {} not available", item.product_id))
            })?;

        if item.quantity < 1 {
            return Err(ApiError::BadRequest("Invalid quantity".to_string()));
        }

        if let Some(stock) = product.availability.stock_count {
            if stock < item.quantity as i64 {
                return Err(ApiError::BadRequest(format!(
                    "Insufficient stock for {}",
                    product.name
                )));
            }
        }

        let mut customizations = Vec::with_capacity(item.customizations.len());
        let mut customization_total = 0.0;

        for customization in &item.customizations {
            let group = product
                .customization
                .iter()
                .find(|g| g.name == customization.name)
                .ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "Invalid customization group: {}",
                        customization.name
                    ))
                })?;

            let option = group
                .options
                .iter()
                .find(|o| o.name == customization.option)
                .filter(|o| o.is_available)
                .ok_or_else(|| {
                    ApiError::BadRequest(format!(
                        "Invalid or unavailable option: {}",
                        customization.option
                    ))
                })?;

            customizations.push(OrderItemCustomization {
                name: group.name.clone(),
                option: option.name.clone(),
                price: option.price,
            });
            customization_total += option.price;
        }

        let unit_price = product.discounted_price.unwrap_or(product.price);
        let item_total = (unit_price + customization_total) * item.quantity as f64;
        subtotal += item_total;

        priced_items.push(OrderItem {
            product_id: product.id,
            name: product.name.clone(),
            quantity: item.quantity,
            price: unit_price,
            customizations,
            subtotal: item_total,
        });
    }

    if subtotal < restaurant.settings.minimum_order_value {
        return Err(ApiError::BadRequest(format!(
            "Order total below minimum order value of {:.2}",
            restaurant.settings.minimum_order_value
        )));
    }

    let tax = subtotal * restaurant.settings.tax_percentage / 100.0;
    let delivery_fee = restaurant.settings.delivery_fee;
    let total = subtotal + tax + delivery_fee;

    Ok(PricedCart {
        items: priced_items,
        pricing: OrderPricing {
            subtotal,
            tax,
            delivery_fee,
            discount: 0.0,
            total,
        },
    })
}
