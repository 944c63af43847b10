//! # dispatch-core - typed event registry for game-engine hosts
//!
//! Listeners declare handlers for concrete event types; producers fire event
//! values and every handler bound to that exact type runs, synchronously and
//! in registration order. A handler that fails or panics is logged and
//! skipped without affecting the others.
//!
//! ## Key Features
//! - Handlers keyed by the concrete event type, no runtime reflection
//! - Weak listener references: the registry never keeps a listener alive
//! - Per-handler failure isolation (errors and panics)
//! - Re-entrant: handlers may fire events or (un)register listeners
//! - Injectable registry, plus an optional process-wide instance
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use dispatch_core::{Event, EventRegistry, HandlerResult, Listener, Subscriptions};
//!
//! struct CoinPicked {
//!     value: u32,
//! }
//! impl Event for CoinPicked {}
//!
//! #[derive(Default)]
//! struct Wallet {
//!     total: AtomicU32,
//! }
//!
//! impl Wallet {
//!     fn on_coin(&self, ev: &CoinPicked) -> HandlerResult {
//!         self.total.fetch_add(ev.value, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for Wallet {
//!     fn subscriptions(&self, subs: &mut Subscriptions<Self>) {
//!         subs.on("on_coin", Self::on_coin);
//!     }
//! }
//!
//! let registry = EventRegistry::new();
//! let wallet = Arc::new(Wallet::default());
//!
//! registry.register(&wallet)?;
//! registry.fire(&CoinPicked { value: 5 });
//! registry.unregister(&wallet)?;
//! registry.fire(&CoinPicked { value: 5 });
//!
//! assert_eq!(wallet.total.load(Ordering::Relaxed), 5);
//! # Ok::<(), dispatch_core::RegistryError>(())
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod logging;
pub mod registry;

pub use binding::HandlerBinding;
pub use config::{RegistrationPolicy, RegistryConfig};
pub use error::{HandlerFailure, RegistryError, RegistryResult};
pub use event::{AsAny, Event, EventType};
pub use listener::{HandlerResult, Listener, Subscriptions};
pub use logging::{LoggerConfig, LoggingError};
pub use registry::{DispatchReport, EventRegistry, RegistryStats};
