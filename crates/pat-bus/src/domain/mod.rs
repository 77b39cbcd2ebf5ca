//! # Domain Layer
//!
//! Pure dispatch logic: events, listener binding, subscriptions, handler
//! groups and the registry.
//!
//! ## Hexagonal Architecture
//!
//! This module contains NO I/O. The broker connection is reached only
//! through the `Transport` port in the `ports` module.

pub mod errors;
pub mod event;
pub mod handler_group;
pub mod listener;
pub mod registry;
pub mod subscription;

pub use errors::*;
pub use event::*;
pub use handler_group::*;
pub use listener::{Binder, HandlerOutcome, Listener, ListenerId};
pub use registry::*;
pub use subscription::{Callback, CallbackSubscription, ListenerRef, MethodSubscription, Subscription, CALLBACK_HANDLER};
