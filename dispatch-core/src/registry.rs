//! EventRegistry: event-type keyed handler bindings with synchronous dispatch.
//!
//! - `register` binds every handler a listener declares, keyed by the
//!   handler's event type
//! - `unregister` removes the bindings of one listener instance
//! - `fire` delivers an event to the bindings of its exact runtime type,
//!   in registration order
//!
//! ## Dispatch
//! ```text
//! fire(event)
//!   ├─ read lock ─► clone bindings for TypeId(event) ─► unlock
//!   └─ for binding in snapshot (registration order)
//!        ├─ listener dropped  ─► skipped
//!        ├─ Ok                ─► delivered
//!        └─ Err / panic       ─► error! log, continue
//! ```
//!
//! No lock is held while handlers run, so a handler may fire further events
//! or (un)register listeners. Such changes apply from the next dispatch.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use smallvec::SmallVec;
use tracing::{debug, error, trace, warn};

use crate::binding::{HandlerBinding, Invocation, ListenerRef};
use crate::config::{RegistrationPolicy, RegistryConfig};
use crate::error::{HandlerFailure, RegistryError, RegistryResult};
use crate::event::{Event, EventType};
use crate::listener::{HandlerDecl, Listener, Subscriptions};

type BindingList = Vec<Arc<HandlerBinding>>;

/// Bindings copied out of the map for one dispatch.
type Snapshot = SmallVec<[Arc<HandlerBinding>; 8]>;

static GLOBAL: Lazy<EventRegistry> = Lazy::new(EventRegistry::new);

/// Counts for a single dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that ran to completion.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
    /// Bindings whose listener no longer exists.
    pub skipped: usize,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub event_types: usize,
    pub bindings: usize,
    pub dead_bindings: usize,
}

pub struct EventRegistry {
    listeners: RwLock<HashMap<TypeId, BindingList>>,
    config: RegistryConfig,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Process-wide registry with default config, created on first use.
    pub fn global() -> &'static EventRegistry {
        &GLOBAL
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Bind every handler `listener` declares.
    ///
    /// # Errors
    /// `ParameterArity` or `InvalidEventType` for the first bad declaration.
    /// Whether earlier declarations stay bound depends on
    /// [`RegistryConfig::registration`].
    pub fn register<L: Listener>(&self, listener: &Arc<L>) -> RegistryResult<()> {
        let listener_type: &'static str = listener.listener_name();
        let decls: Vec<HandlerDecl> = Subscriptions::collect(listener.as_ref());

        if self.config.warn_on_duplicate && self.has_declared_bindings(listener, &decls) {
            warn!(
                listener = listener_type,
                "Listener registered again; its handlers will run once per registration"
            );
        }

        let erased: Arc<dyn Any + Send + Sync> = listener.clone();
        let weak: ListenerRef = Arc::downgrade(&erased);

        let added: usize = match self.config.registration {
            RegistrationPolicy::Atomic => {
                let validated: Vec<(EventType, HandlerDecl)> = decls
                    .into_iter()
                    .map(|decl: HandlerDecl| {
                        decl.validate(listener_type)
                            .map(|event_type: EventType| (event_type, decl))
                    })
                    .collect::<RegistryResult<Vec<(EventType, HandlerDecl)>>>()?;

                let mut map = self.listeners.write();
                for (event_type, decl) in &validated {
                    Self::bind(&mut map, &weak, listener_type, *event_type, decl);
                }
                validated.len()
            }

            RegistrationPolicy::BestEffort => {
                let mut map = self.listeners.write();
                let mut added: usize = 0;

                for decl in &decls {
                    let event_type: EventType = match decl.validate(listener_type) {
                        Ok(event_type) => event_type,
                        Err(e) => {
                            warn!(
                                listener = listener_type,
                                kept = added,
                                "Registration stopped at invalid handler: {}",
                                e
                            );
                            return Err(e);
                        }
                    };

                    Self::bind(&mut map, &weak, listener_type, event_type, decl);
                    added += 1;
                }
                added
            }
        };

        debug!(listener = listener_type, bindings = added, "Registered listener");
        Ok(())
    }

    fn bind(
        map: &mut HashMap<TypeId, BindingList>,
        weak: &ListenerRef,
        listener_type: &'static str,
        event_type: EventType,
        decl: &HandlerDecl,
    ) {
        let binding: HandlerBinding = HandlerBinding::new(
            Arc::clone(&decl.handler),
            decl.name,
            weak.clone(),
            listener_type,
            event_type,
        );

        map.entry(event_type.id())
            .or_default()
            .push(Arc::new(binding));
    }

    /// Whether `listener` already owns a binding under one of the event types
    /// in `decls`. Only the declared keys are looked at.
    fn has_declared_bindings<L: Listener>(&self, listener: &Arc<L>, decls: &[HandlerDecl]) -> bool {
        let listener_type: &'static str = listener.listener_name();
        let map = self.listeners.read();

        decls
            .iter()
            .filter_map(|decl: &HandlerDecl| decl.validate(listener_type).ok())
            .filter_map(|event_type: EventType| map.get(&event_type.id()))
            .flatten()
            .any(|binding: &Arc<HandlerBinding>| binding.is_bound_to(listener))
    }

    /// Remove every binding owned by this listener instance.
    ///
    /// Declarations are validated with the same errors as
    /// [`register`](Self::register). Under `Atomic` nothing is removed on
    /// error. Under `BestEffort` the bindings of the declarations before the
    /// first invalid one are removed before the error is returned.
    pub fn unregister<L: Listener>(&self, listener: &Arc<L>) -> RegistryResult<()> {
        let listener_type: &'static str = listener.listener_name();
        let mut event_types: Vec<EventType> = Vec::new();
        let mut invalid: Option<RegistryError> = None;

        for decl in Subscriptions::collect(listener.as_ref()) {
            match decl.validate(listener_type) {
                Ok(event_type) => event_types.push(event_type),
                Err(e) => {
                    invalid = Some(e);
                    break;
                }
            }
        }

        let Some(e) = invalid else {
            let removed: usize = self.remove_bindings(listener, &event_types);
            debug!(listener = listener_type, removed, "Unregistered listener");
            return Ok(());
        };

        if self.config.registration == RegistrationPolicy::BestEffort {
            let removed: usize = self.remove_bindings(listener, &event_types);
            warn!(
                listener = listener_type,
                removed,
                "Unregistration stopped at invalid handler: {}",
                e
            );
        }
        Err(e)
    }

    /// Drop the bindings of `listener` under each event type, and the key
    /// itself once its list is empty.
    fn remove_bindings<L: Send + Sync + 'static>(
        &self,
        listener: &Arc<L>,
        event_types: &[EventType],
    ) -> usize {
        let mut removed: usize = 0;
        let mut map = self.listeners.write();

        for event_type in event_types {
            let Some(list) = map.get_mut(&event_type.id()) else {
                continue;
            };

            let before: usize = list.len();
            list.retain(|binding: &Arc<HandlerBinding>| !binding.is_bound_to(listener));
            removed += before - list.len();

            if list.is_empty() {
                map.remove(&event_type.id());
            }
        }

        removed
    }

    /// Deliver `event` to every handler bound to its exact type.
    pub fn fire<E: Event>(&self, event: &E) {
        self.dispatch(event);
    }

    /// Same as [`fire`](Self::fire) for an event behind a trait object.
    pub fn fire_dyn(&self, event: &dyn Event) {
        self.dispatch(event);
    }

    /// Dispatch and report how each binding fared.
    ///
    /// Handler failures are logged and counted, never returned.
    pub fn dispatch(&self, event: &dyn Event) -> DispatchReport {
        let event_type: EventType = EventType::of_val(event);
        let snapshot: Snapshot = {
            let map = self.listeners.read();
            match map.get(&event_type.id()) {
                Some(list) => list.iter().cloned().collect(),
                None => SmallVec::new(),
            }
        };

        if self.config.trace_dispatch {
            trace!(
                event = event_type.name(),
                handlers = snapshot.len(),
                "Dispatching event"
            );
        }

        let mut report: DispatchReport = DispatchReport::default();

        for binding in &snapshot {
            match self.invoke(binding, event) {
                Invocation::Delivered => report.delivered += 1,

                Invocation::Failed(failure) => {
                    report.failed += 1;
                    error!(
                        event = event_type.name(),
                        listener = binding.listener_type(),
                        handler = binding.handler_name(),
                        kind = failure.as_label(),
                        "Event handler failed: {}",
                        failure
                    );
                }

                Invocation::ListenerGone => {
                    report.skipped += 1;
                    trace!(
                        event = event_type.name(),
                        listener = binding.listener_type(),
                        handler = binding.handler_name(),
                        "Skipping binding of dropped listener"
                    );
                }
            }
        }

        report
    }

    fn invoke(&self, binding: &HandlerBinding, event: &dyn Event) -> Invocation {
        if !self.config.catch_panics {
            return binding.invoke(event);
        }

        match catch_unwind(AssertUnwindSafe(|| binding.invoke(event))) {
            Ok(outcome) => outcome,
            Err(payload) => Invocation::Failed(HandlerFailure::from_panic(payload)),
        }
    }

    /// Bindings for `E`, in dispatch order.
    pub fn bindings<E: Event>(&self) -> Vec<Arc<HandlerBinding>> {
        self.listeners
            .read()
            .get(&TypeId::of::<E>())
            .map(|list: &BindingList| list.to_vec())
            .unwrap_or_default()
    }

    pub fn binding_count<E: Event>(&self) -> usize {
        self.binding_count_for(EventType::of::<E>())
    }

    pub fn binding_count_for(&self, event_type: EventType) -> usize {
        self.listeners
            .read()
            .get(&event_type.id())
            .map_or(0, |list: &BindingList| list.len())
    }

    pub fn total_bindings(&self) -> usize {
        self.listeners.read().values().map(|list: &BindingList| list.len()).sum()
    }

    /// Event types with at least one binding.
    pub fn event_types(&self) -> Vec<EventType> {
        self.listeners
            .read()
            .values()
            .filter_map(|list: &BindingList| list.first().map(|b| b.event_type()))
            .collect()
    }

    /// Whether any binding belongs to this listener instance.
    pub fn is_registered<L: Send + Sync + 'static>(&self, listener: &Arc<L>) -> bool {
        self.listeners
            .read()
            .values()
            .flatten()
            .any(|binding: &Arc<HandlerBinding>| binding.is_bound_to(listener))
    }

    /// Drop bindings whose listener no longer exists. Returns how many went.
    pub fn prune(&self) -> usize {
        let mut removed: usize = 0;
        let mut map = self.listeners.write();

        for list in map.values_mut() {
            let before: usize = list.len();
            list.retain(|binding: &Arc<HandlerBinding>| binding.is_alive());
            removed += before - list.len();
        }
        map.retain(|_, list: &mut BindingList| !list.is_empty());
        drop(map);

        if removed > 0 {
            debug!(removed, "Pruned bindings of dropped listeners");
        }
        removed
    }

    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    pub fn stats(&self) -> RegistryStats {
        let map = self.listeners.read();
        let mut stats: RegistryStats = RegistryStats::default();

        for list in map.values().filter(|list: &&BindingList| !list.is_empty()) {
            stats.event_types += 1;
            stats.bindings += list.len();
            stats.dead_bindings += list.iter().filter(|b| !b.is_alive()).count();
        }

        stats
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats: RegistryStats = self.stats();
        f.debug_struct("EventRegistry")
            .field("event_types", &stats.event_types)
            .field("bindings", &stats.bindings)
            .field("config", &self.config)
            .finish()
    }
}
