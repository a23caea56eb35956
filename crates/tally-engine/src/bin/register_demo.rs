//! # Register Demo
//!
//! Opens a register on a seeded store, rings up a few sales, voids one and
//! prints the end-of-day reports.
//!
//! ```text
//! RUST_LOG=tally=debug cargo run --bin register-demo
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging)
//! 2. Load configuration from `TALLY_*` environment variables
//! 3. Seed the owner account, staff and catalog
//! 4. Run the sales
//! 5. Print the sales summary and inventory report

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_core::{BundleComponent, Category, Money, Role};
use tally_engine::{
    Argon2Credentials, CheckoutRequest, EngineConfig, NewProduct, Register, SharedStores,
    SystemClock,
};

const STAFF: [(&str, &str, Role); 3] = [
    ("johndoe", "password123", Role::Cashier),
    ("janesmith", "password456", Role::Manager),
    ("alicejohnson", "password789", Role::Admin),
];

const PRODUCTS: [(&str, i64, Category); 6] = [
    ("Apple", 50, Category::Grocery),
    ("Bread", 200, Category::Grocery),
    ("Milk", 300, Category::Grocery),
    ("Burger", 500, Category::Fastfood),
    ("Fries", 250, Category::Fastfood),
    ("Soda", 150, Category::Fastfood),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Default: INFO, debug for our crates; RUST_LOG overrides
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tally=debug")),
        )
        .with_target(true)
        .init();

    let config = EngineConfig::from_env();
    info!(store = %config.store_name, float = %config.starting_float, "Opening register");

    let mut register = Register::open(
        SharedStores::new(&config),
        config,
        Arc::new(Argon2Credentials::low_cost()?),
        Arc::new(SystemClock),
    );

    // Seed
    register.bootstrap_owner("bobwilliams", "password000")?;
    register.login("bobwilliams", "password000")?;
    for (username, password, role) in STAFF {
        register.add_employee(username, password, role)?;
    }

    let mut ids = Vec::new();
    for (name, cents, category) in PRODUCTS {
        let product = register.add_product(NewProduct {
            name: name.to_string(),
            price: Money::from_cents(cents),
            category,
            stock: 100,
        })?;
        ids.push(product.id);
    }
    let meal = register.add_bundle(
        "Burger Meal",
        Money::from_cents(800),
        ids[3..]
            .iter()
            .map(|id| BundleComponent {
                product_id: id.clone(),
                quantity: 1,
            })
            .collect(),
    )?;
    register.logout()?;

    // A cashier's shift
    register.login("johndoe", "password123")?;
    register.clock_in()?;

    register.add_item(&ids[0])?;
    register.add_item(&ids[0])?;
    register.add_item(&ids[2])?;
    let first = register.checkout(CheckoutRequest::cash())?;
    info!(receipt = %first.id, total = %first.total, "First sale");

    register.add_item(&meal.id)?;
    register.set_employee_order(true)?;
    let second = register.checkout(CheckoutRequest::credit().with_signature("J. Doe"))?;
    info!(receipt = %second.id, total = %second.total, "Employee meal");

    register.add_item(&ids[1])?;
    let third = register.checkout(CheckoutRequest::cash())?;
    register.void_receipt(&third.id, "customer changed their mind")?;

    register.clock_out()?;
    register.logout()?;

    // End of day
    register.login("janesmith", "password456")?;
    let summary = register.get_sales_summary()?;
    let inventory = register.get_inventory_report()?;
    register.logout()?;

    println!("{}", summary);
    println!("{}", inventory);
    Ok(())
}
