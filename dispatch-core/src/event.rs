//! Event capability trait and runtime type keys.
//!
//! Every event kind is its own Rust type implementing [`Event`]. The registry
//! keys bindings by the exact concrete type ([`EventType`]), so a handler for
//! one kind never sees another kind, even if the two are related in the
//! host's own modelling.
//!
//! ```rust
//! use dispatch_core::{Event, EventType};
//!
//! #[derive(Debug)]
//! struct PlayerDamaged {
//!     amount: u32,
//! }
//!
//! impl Event for PlayerDamaged {}
//!
//! let ev = PlayerDamaged { amount: 3 };
//! assert_eq!(EventType::of_val(&ev), EventType::of::<PlayerDamaged>());
//! assert!(!EventType::of::<PlayerDamaged>().is_base());
//! # let _ = ev.amount;
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Upcast helper so a `&dyn Event` can be inspected as `&dyn Any`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Something that happened and can be dispatched to listeners.
pub trait Event: AsAny + Send + Sync + 'static {
    /// Name used in diagnostics. Defaults to the Rust type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Runtime key identifying an event kind.
///
/// Equality and hashing only consider the [`TypeId`]; the name is carried for
/// logs and error messages.
#[derive(Clone, Copy)]
pub struct EventType {
    id: TypeId,
    name: &'static str,
}

impl EventType {
    /// Key for the concrete event kind `E`.
    #[inline]
    pub fn of<E: Event>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: std::any::type_name::<E>(),
        }
    }

    /// Key for the runtime type behind an event reference.
    #[inline]
    pub fn of_val(event: &dyn Event) -> Self {
        Self {
            id: event.as_any().type_id(),
            name: event.name(),
        }
    }

    /// Key for the base event type itself. Never a valid handler parameter.
    #[inline]
    pub fn base() -> Self {
        Self {
            id: TypeId::of::<dyn Event>(),
            name: "dyn Event",
        }
    }

    #[inline]
    pub fn is_base(&self) -> bool {
        self.id == TypeId::of::<dyn Event>()
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for EventType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventType {}

impl Hash for EventType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventType").field(&self.name).finish()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
