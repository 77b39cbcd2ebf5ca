//! # Listener Binding
//!
//! A listener is an application object that declares, once per type, which of
//! its methods handle which channel. The declaration is an explicit table built
//! at registration time through [`Binder`]:
//!
//! ```ignore
//! struct Orders;
//!
//! impl Orders {
//!     fn on_order(&self, event: &Event) { /* ... */ }
//! }
//!
//! impl Listener for Orders {
//!     fn bind(binder: &mut Binder<Self>) {
//!         binder.on_named("orders", "on_order", Self::on_order);
//!     }
//! }
//! ```
//!
//! The [`listener!`](crate::listener) macro generates the same impl.
//!
//! Handler methods take exactly one `&Event`; the return type is anything
//! implementing [`HandlerOutcome`] (`()` or `Result<(), E>`).

use std::fmt;
use std::sync::Arc;

use super::errors::BoxError;
use super::event::Event;

/// An object that owns channel handlers.
pub trait Listener: Send + Sync + 'static {
    /// Declares this type's channel → method table.
    fn bind(binder: &mut Binder<Self>)
    where
        Self: Sized;
}

/// Return types accepted from handler methods.
pub trait HandlerOutcome {
    fn into_result(self) -> Result<(), BoxError>;
}

impl HandlerOutcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> HandlerOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

pub(crate) type BoundMethod<L> = Arc<dyn Fn(&L, &Event) -> Result<(), BoxError> + Send + Sync>;

/// One declared `channel → method` entry.
pub(crate) struct MethodBinding<L> {
    pub(crate) channel: String,
    pub(crate) handler: &'static str,
    pub(crate) method: BoundMethod<L>,
}

/// Collects the handler table of one listener type.
pub struct Binder<L> {
    bindings: Vec<MethodBinding<L>>,
}

impl<L: Listener> Binder<L> {
    pub(crate) fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Binds `method` to `channel`. The handler is reported as `handler` in logs.
    pub fn on<O>(&mut self, channel: impl Into<String>, method: fn(&L, &Event) -> O) -> &mut Self
    where
        O: HandlerOutcome + 'static,
    {
        self.on_named(channel, "handler", method)
    }

    /// Binds `method` to `channel` under a diagnostic name.
    pub fn on_named<O>(
        &mut self,
        channel: impl Into<String>,
        handler: &'static str,
        method: fn(&L, &Event) -> O,
    ) -> &mut Self
    where
        O: HandlerOutcome + 'static,
    {
        self.bindings.push(MethodBinding {
            channel: channel.into(),
            handler,
            method: Arc::new(move |listener: &L, event: &Event| {
                method(listener, event).into_result()
            }),
        });
        self
    }

    /// Runs `L::bind` and returns the declared entries in declaration order.
    pub(crate) fn collect() -> Vec<MethodBinding<L>> {
        let mut binder = Self::new();
        L::bind(&mut binder);
        binder.bindings
    }
}

/// Identity of one registered listener instance.
///
/// Derived from the address of the listener's `Arc` allocation, so two
/// instances of the same type are distinct registrants while clones of one
/// `Arc` share an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(usize);

impl ListenerId {
    pub fn of<L: Listener>(listener: &Arc<L>) -> Self {
        Self(Arc::as_ptr(listener) as *const () as usize)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener@{:#x}", self.0)
    }
}

/// Implements [`Listener`] from a `channel => method` table.
///
/// ```ignore
/// listener!(Orders {
///     "orders" => on_order,
///     "refunds" => on_refund,
/// });
/// ```
#[macro_export]
macro_rules! listener {
    ($ty:ty { $($channel:expr => $method:ident),* $(,)? }) => {
        impl $crate::Listener for $ty {
            fn bind(binder: &mut $crate::Binder<Self>) {
                $(
                    binder.on_named($channel, stringify!($method), <$ty>::$method);
                )*
            }
        }
    };
}
