//! Per-surface state holders.
//!
//! DESIGN
//! ======
//! Each surface (`chat`, `courtroom`, `admin`) owns its state exclusively and
//! is handed to the presentation layer by value or `&mut`. Nothing is shared
//! between surfaces and there are no process-wide singletons. A `busy` flag
//! per holder allows one outstanding request at a time, which also keeps
//! appended responses in request order. The flag is held by a [`BusyGuard`],
//! so a caller that drops an in-flight future leaves the holder idle again.

pub mod admin;
pub mod chat;
pub mod courtroom;

/// Blocking operator notification ("alert") raised by a state holder.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);
}

/// Notifier that only logs. Used when no presentation layer is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, message: &str) {
        tracing::warn!(%message, "operator alert");
    }
}

/// Sets a holder's `busy` flag for as long as it lives.
pub(crate) struct BusyGuard<'a>(&'a mut bool);

impl<'a> BusyGuard<'a> {
    pub(crate) fn hold(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}
