use std::collections::HashMap;

use chrono::Utc;
use uuid::Uuid;

use restaurant_platform_api::error::ApiError;
use restaurant_platform_api::models::{
    Branding, ContactInfo, CustomizationGroup, CustomizationOption, Product, ProductAttributes,
    ProductAvailability, ProductDescription, Restaurant, RestaurantSettings,
};
use restaurant_platform_api::pricing::{price_cart, CartCustomization, CartItem};

const EPS: f64 = 1e-9;

fn restaurant() -> Restaurant {
    let now = Utc::now();
    Restaurant {
        id: Uuid::new_v4(),
        slug: "tandoori-house".to_string(),
        name: "Tandoori House".to_string(),
        description: None,
        image_url: None,
        logo_url: None,
        cover_image_url: None,
        contact: ContactInfo::default(),
        settings: RestaurantSettings {
            is_active: true,
            accepting_orders: true,
            minimum_order_value: 0.0,
            delivery_radius: None,
            delivery_fee: 20.0,
            tax_percentage: 10.0,
        },
        branding: Branding::default(),
        created_at: now,
        updated_at: now,
    }
}

fn product(restaurant_id: Uuid, price: f64, discounted: Option<f64>) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        restaurant_id,
        category_id: Uuid::new_v4(),
        name: "Paneer Wrap".to_string(),
        slug: "paneer-wrap".to_string(),
        description: ProductDescription::default(),
        images: Vec::new(),
        price,
        discounted_price: discounted,
        customization: vec![CustomizationGroup {
            name: "Size".to_string(),
            options: vec![
                CustomizationOption {
                    name: "Small".to_string(),
                    price: 0.0,
                    is_available: true,
                    max_quantity: 1,
                },
                CustomizationOption {
                    name: "Large".to_string(),
                    price: 25.0,
                    is_available: true,
                    max_quantity: 1,
                },
                CustomizationOption {
                    name: "Family".to_string(),
                    price: 40.0,
                    is_available: false,
                    max_quantity: 1,
                },
            ],
            required: false,
            multiple: false,
            min_select: 0,
            max_select: 1,
        }],
        attributes: ProductAttributes::default(),
        availability: ProductAvailability::default(),
        created_at: now,
        updated_at: now,
    }
}

fn catalog(products: &[&Product]) -> HashMap<Uuid, Product> {
    products.iter().map(|p| (p.id, (*p).clone())).collect()
}

fn item(product: &Product, quantity: u32) -> CartItem {
    CartItem {
        product_id: product.id,
        quantity,
        customizations: Vec::new(),
    }
}

fn sized(product: &Product, quantity: u32, option: &str) -> CartItem {
    CartItem {
        product_id: product.id,
        quantity,
        customizations: vec![CartCustomization {
            name: "Size".to_string(),
            option: option.to_string(),
        }],
    }
}

fn expect_bad_request(result: Result<impl Sized, ApiError>) -> String {
    match result {
        Err(ApiError::BadRequest(msg)) => msg,
        Err(other) => panic!("expected BadRequest, got {other:?}"),
        Ok(_) => panic!("expected BadRequest, got Ok"),
    }
}

#[test]
fn subtotal_is_sum_of_item_subtotals() {
    let restaurant = restaurant();
    let a = product(restaurant.id, 100.0, None);
    let b = product(restaurant.id, 60.0, None);
    let products = catalog(&[&a, &b]);

    let priced = price_cart(&restaurant, &[item(&a, 2), item(&b, 3)], &products).unwrap();

    assert_eq!(priced.items.len(), 2);
    assert!((priced.items[0].subtotal - 200.0).abs() < EPS);
    assert!((priced.items[1].subtotal - 180.0).abs() < EPS);
    let sum: f64 = priced.items.iter().map(|i| i.subtotal).sum();
    assert!((priced.pricing.subtotal - sum).abs() < EPS);
}

// Pins the pricing semantic: the customization total is added on top of the
// discounted price, not only on the undiscounted fallback.
#[test]
fn customizations_are_charged_on_top_of_discounted_price() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, Some(80.0));
    let products = catalog(&[&p]);

    let priced = price_cart(&restaurant, &[sized(&p, 2, "Large")], &products).unwrap();

    let line = &priced.items[0];
    assert!((line.price - 80.0).abs() < EPS);
    assert_eq!(line.customizations.len(), 1);
    assert!((line.customizations[0].price - 25.0).abs() < EPS);
    assert!((line.subtotal - (80.0 + 25.0) * 2.0).abs() < EPS);
}

#[test]
fn tax_is_subtotal_times_restaurant_percentage() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let priced = price_cart(&restaurant, &[item(&p, 3)], &products).unwrap();

    assert!((priced.pricing.subtotal - 300.0).abs() < EPS);
    assert!((priced.pricing.tax - 30.0).abs() < EPS);
    assert!((priced.pricing.delivery_fee - 20.0).abs() < EPS);
    assert!((priced.pricing.discount - 0.0).abs() < EPS);
    assert!((priced.pricing.total - 350.0).abs() < EPS);
}

#[test]
fn rejects_zero_quantity() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[item(&p, 0)], &products));
    assert!(msg.contains("Invalid quantity"), "{msg}");
}

#[test]
fn rejects_quantity_over_stock() {
    let restaurant = restaurant();
    let mut p = product(restaurant.id, 100.0, None);
    p.availability.stock_count = Some(2);
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[item(&p, 3)], &products));
    assert!(msg.contains("Insufficient stock"), "{msg}");
    assert!(msg.contains("Paneer Wrap"), "{msg}");
}

#[test]
fn allows_quantity_equal_to_stock() {
    let restaurant = restaurant();
    let mut p = product(restaurant.id, 100.0, None);
    p.availability.stock_count = Some(2);
    let products = catalog(&[&p]);

    assert!(price_cart(&restaurant, &[item(&p, 2)], &products).is_ok());
}

#[test]
fn rejects_unknown_product() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, None);

    let msg = expect_bad_request(price_cart(&restaurant, &[item(&p, 1)], &HashMap::new()));
    assert!(msg.contains("not available"), "{msg}");
}

#[test]
fn rejects_unavailable_product() {
    let restaurant = restaurant();
    let mut p = product(restaurant.id, 100.0, None);
    p.availability.is_available = false;
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[item(&p, 1)], &products));
    assert!(msg.contains("not available"), "{msg}");
}

#[test]
fn rejects_unknown_customization_group() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let cart = vec![CartItem {
        product_id: p.id,
        quantity: 1,
        customizations: vec![CartCustomization {
            name: "Toppings".to_string(),
            option: "Cheese".to_string(),
        }],
    }];

    let msg = expect_bad_request(price_cart(&restaurant, &cart, &products));
    assert!(msg.contains("Invalid customization group"), "{msg}");
}

#[test]
fn rejects_unknown_option() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[sized(&p, 1, "Mega")], &products));
    assert!(msg.contains("Invalid or unavailable option"), "{msg}");
}

#[test]
fn rejects_option_marked_unavailable() {
    let restaurant = restaurant();
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[sized(&p, 1, "Family")], &products));
    assert!(msg.contains("Invalid or unavailable option"), "{msg}");
}

#[test]
fn rejects_empty_cart() {
    let restaurant = restaurant();
    let msg = expect_bad_request(price_cart(&restaurant, &[], &HashMap::new()));
    assert!(msg.contains("no items"), "{msg}");
}

#[test]
fn rejects_when_not_accepting_orders() {
    let mut restaurant = restaurant();
    restaurant.settings.accepting_orders = false;
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[item(&p, 1)], &products));
    assert!(msg.contains("not accepting orders"), "{msg}");
}

#[test]
fn rejects_below_minimum_order_value() {
    let mut restaurant = restaurant();
    restaurant.settings.minimum_order_value = 500.0;
    let p = product(restaurant.id, 100.0, None);
    let products = catalog(&[&p]);

    let msg = expect_bad_request(price_cart(&restaurant, &[item(&p, 1)], &products));
    assert!(msg.contains("minimum order value"), "{msg}");
}
