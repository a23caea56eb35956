//! # State Module
//!
//! The shared aggregates of the register.
//!
//! ## Why one lock per aggregate?
//! Several registers may share one catalog, drawer, ledger and roster. Each
//! aggregate sits behind its own mutex so unrelated work does not contend,
//! and each logical operation (a bundle reservation, a void) holds the lock
//! for its whole check-then-mutate sequence.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │   Register A ─┐                                        ┌─ Register B    │
//! │               ▼                                        ▼                │
//! │  ┌──────────────┐ ┌──────────────┐ ┌──────────────┐ ┌──────────────┐   │
//! │  │ LedgerState  │ │ CatalogState │ │ DrawerState  │ │ RosterState  │   │
//! │  │  receipts    │ │  products    │ │  balance     │ │  employees   │   │
//! │  └──────────────┘ └──────────────┘ └──────────────┘ └──────────────┘   │
//! │                                                                         │
//! │  LOCK ORDER (always): ledger → catalog → drawer → roster → settings    │
//! │  Taking them in one global order rules out deadlock between registers. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tally_core::ClientSettings;

use crate::config::EngineConfig;

mod catalog;
mod drawer;
mod ledger;
mod roster;

pub use catalog::{Catalog, NewProduct};
pub use drawer::CashDrawer;
pub use ledger::{CompletedSale, Ledger};
pub use roster::Roster;

/// An aggregate behind a shared mutex.
///
/// Every mutating method on the aggregates validates before it writes, so a
/// panic inside a critical section cannot leave half-applied changes and a
/// poisoned lock is safe to recover.
#[derive(Debug, Default)]
pub struct SharedState<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Clone for SharedState<T> {
    fn clone(&self) -> Self {
        SharedState {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> SharedState<T> {
    pub fn new(value: T) -> Self {
        SharedState {
            inner: Arc::new(Mutex::new(value)),
        }
    }

    /// Acquires the lock for a multi-step operation.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Executes a function with read access to the aggregate.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        let guard = self.lock();
        f(&guard)
    }

    /// Executes a function with write access to the aggregate.
    pub fn write<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

pub type CatalogState = SharedState<Catalog>;
pub type LedgerState = SharedState<Ledger>;
pub type DrawerState = SharedState<CashDrawer>;
pub type RosterState = SharedState<Roster>;
pub type SettingsState = SharedState<ClientSettings>;

/// Everything registers share. Cloning shares, it does not copy.
#[derive(Debug, Clone, Default)]
pub struct SharedStores {
    pub catalog: CatalogState,
    pub ledger: LedgerState,
    pub drawer: DrawerState,
    pub roster: RosterState,
    pub settings: SettingsState,
}

impl SharedStores {
    /// Empty catalog, ledger and roster; drawer holds the starting float.
    pub fn new(config: &EngineConfig) -> Self {
        SharedStores {
            catalog: CatalogState::default(),
            ledger: LedgerState::default(),
            drawer: DrawerState::new(CashDrawer::new(config.starting_float)),
            roster: RosterState::default(),
            settings: SettingsState::new(config.client_settings.clone()),
        }
    }
}
