//! Listener: declarative handler tagging.
//!
//! A listener lists its handlers once, in [`Listener::subscriptions`]. The
//! registry calls it on every `register`/`unregister`, so the declarations are
//! the single source of truth for which event kinds a listener receives.
//!
//! Two ways to declare a handler:
//! - [`Subscriptions::on`]: typed. The event kind is the handler's parameter
//!   type, checked by the compiler.
//! - [`Subscriptions::declare`]: described at runtime (data-driven hosts,
//!   scripting bridges). The parameter list is validated at registration.
//!
//! ```rust
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use dispatch_core::{Event, HandlerResult, Listener, Subscriptions};
//!
//! struct ScoreChanged(u32);
//! impl Event for ScoreChanged {}
//!
//! #[derive(Default)]
//! struct Scoreboard {
//!     best: AtomicU32,
//! }
//!
//! impl Scoreboard {
//!     fn on_score(&self, ev: &ScoreChanged) -> HandlerResult {
//!         self.best.fetch_max(ev.0, Ordering::Relaxed);
//!         Ok(())
//!     }
//! }
//!
//! impl Listener for Scoreboard {
//!     fn subscriptions(&self, subs: &mut Subscriptions<Self>) {
//!         subs.on("on_score", Self::on_score);
//!     }
//! }
//! ```

use std::any::{Any, type_name};
use std::marker::PhantomData;
use std::sync::Arc;

use smallvec::{SmallVec, smallvec};

use crate::error::{HandlerFailure, RegistryError, RegistryResult};
use crate::event::{Event, EventType};

/// Result returned by user handlers.
pub type HandlerResult = anyhow::Result<()>;

/// Handler with listener and event erased, as stored in a binding.
pub(crate) type ErasedHandler = Arc<
    dyn Fn(&(dyn Any + Send + Sync), &dyn Event) -> Result<(), HandlerFailure> + Send + Sync,
>;

/// An object exposing event handlers.
pub trait Listener: Send + Sync + Sized + 'static {
    /// Declare every handler this listener wants bound.
    fn subscriptions(&self, subs: &mut Subscriptions<Self>);

    /// Name used in diagnostics.
    fn listener_name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// One declared handler, not yet validated.
pub(crate) struct HandlerDecl {
    pub(crate) name: &'static str,
    params: SmallVec<[EventType; 1]>,
    pub(crate) handler: ErasedHandler,
}

impl HandlerDecl {
    /// Check the declared signature and return the event kind it binds to.
    pub(crate) fn validate(&self, listener: &'static str) -> RegistryResult<EventType> {
        if self.params.len() != 1 {
            return Err(RegistryError::parameter_arity(
                listener,
                self.name,
                self.params.len(),
            ));
        }

        let event_type: EventType = self.params[0];
        if event_type.is_base() {
            return Err(RegistryError::invalid_event_type(
                listener, self.name, event_type,
            ));
        }

        Ok(event_type)
    }
}

/// Collector handed to [`Listener::subscriptions`].
pub struct Subscriptions<L: Listener> {
    decls: Vec<HandlerDecl>,
    _listener: PhantomData<fn(&L)>,
}

impl<L: Listener> Subscriptions<L> {
    pub(crate) fn collect(listener: &L) -> Vec<HandlerDecl> {
        let mut subs: Subscriptions<L> = Self {
            decls: Vec::new(),
            _listener: PhantomData,
        };
        listener.subscriptions(&mut subs);
        subs.decls
    }

    /// Bind a typed handler for the concrete event kind `E`.
    pub fn on<E, F>(&mut self, name: &'static str, handler: F) -> &mut Self
    where
        E: Event,
        F: Fn(&L, &E) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(
            move |target: &(dyn Any + Send + Sync), event: &dyn Event| -> Result<(), HandlerFailure> {
                let listener: &L = downcast_listener::<L>(target)?;
                let event: &E = event.as_any().downcast_ref::<E>().ok_or(
                    HandlerFailure::TypeMismatch {
                        expected: type_name::<E>(),
                        found: event.name(),
                    },
                )?;
                handler(listener, event).map_err(HandlerFailure::from)
            },
        );

        self.decls.push(HandlerDecl {
            name,
            params: smallvec![EventType::of::<E>()],
            handler: erased,
        });
        self
    }

    /// Bind a handler whose parameter list is only known at runtime.
    ///
    /// `params` must hold exactly one concrete event type; anything else is
    /// rejected when the listener is registered.
    pub fn declare<F>(&mut self, name: &'static str, params: &[EventType], handler: F) -> &mut Self
    where
        F: Fn(&L, &dyn Event) -> HandlerResult + Send + Sync + 'static,
    {
        let erased: ErasedHandler = Arc::new(
            move |target: &(dyn Any + Send + Sync), event: &dyn Event| -> Result<(), HandlerFailure> {
                let listener: &L = downcast_listener::<L>(target)?;
                handler(listener, event).map_err(HandlerFailure::from)
            },
        );

        self.decls.push(HandlerDecl {
            name,
            params: SmallVec::from_slice(params),
            handler: erased,
        });
        self
    }
}

fn downcast_listener<L: Listener>(target: &(dyn Any + Send + Sync)) -> Result<&L, HandlerFailure> {
    target
        .downcast_ref::<L>()
        .ok_or(HandlerFailure::TypeMismatch {
            expected: type_name::<L>(),
            found: "unknown listener",
        })
}
