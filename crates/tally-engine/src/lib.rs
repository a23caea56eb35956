//! # tally-engine: Register State & Transaction Ledger
//!
//! The stateful half of the Tally register. Everything that changes lives
//! here: the catalog's stock, the ledger of receipts, the cash drawer, the
//! employee roster, and each register's open order and session.
//!
//! ## Module Organization
//! ```text
//! tally_engine/
//! ├── lib.rs          ◄─── You are here (exports)
//! ├── register.rs     ◄─── Command/query surface, RBAC in every handler
//! ├── order.rs        ◄─── In-progress order and its pricing knobs
//! ├── session.rs      ◄─── Login, clock in/out, authorization
//! ├── state/
//! │   ├── mod.rs      ◄─── SharedState<T>, SharedStores, lock order
//! │   ├── catalog.rs  ◄─── Products, bundles, stock reservation
//! │   ├── ledger.rs   ◄─── Receipts: complete / void / refund / duplicate
//! │   ├── drawer.rs   ◄─── Cash balance
//! │   └── roster.rs   ◄─── Employees
//! ├── report.rs       ◄─── Sales summary, inventory report
//! ├── snapshot.rs     ◄─── Durable state as JSON records keyed by id
//! ├── config.rs       ◄─── EngineConfig (defaults + TALLY_* env)
//! ├── credentials.rs  ◄─── Argon2 credential verifier
//! └── clock.rs        ◄─── Time source (system or manual)
//! ```
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use tally_core::{Category, Money};
//! use tally_engine::{
//!     Argon2Credentials, CheckoutRequest, EngineConfig, NewProduct, Register, SharedStores,
//!     SystemClock,
//! };
//!
//! let config = EngineConfig::default();
//! let mut register = Register::open(
//!     SharedStores::new(&config),
//!     config,
//!     Arc::new(Argon2Credentials::low_cost().unwrap()),
//!     Arc::new(SystemClock),
//! );
//! register.bootstrap_owner("owner", "secret").unwrap();
//! register.login("owner", "secret").unwrap();
//!
//! let apple = register
//!     .add_product(NewProduct {
//!         name: "Apple".into(),
//!         price: Money::from_cents(50),
//!         category: Category::Grocery,
//!         stock: 10,
//!     })
//!     .unwrap();
//! register.add_item(&apple.id).unwrap();
//!
//! let receipt = register.checkout(CheckoutRequest::cash()).unwrap();
//! assert_eq!(receipt.total, Money::from_cents(55));
//! ```

pub mod clock;
pub mod config;
pub mod credentials;
pub mod order;
pub mod register;
pub mod report;
pub mod session;
pub mod snapshot;
pub mod state;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use credentials::{Argon2Credentials, CredentialVerifier};
pub use order::{CheckoutStage, Order, OrderSettings, OrderView};
pub use register::{CheckoutRequest, EmployeeUpdate, Register};
pub use report::{InventoryReport, SalesSummary};
pub use snapshot::{RegisterSnapshot, SnapshotError};
pub use state::{NewProduct, SharedStores};
