//! Transient user-facing notices.
//!
//! A [`ToastCenter`] is created once by whoever owns the application root and
//! cloned into anything that needs to raise or observe notices. Subscribers
//! always get the whole current list, never a diff.

use colored::Colorize;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToastId(u64);

impl fmt::Display for ToastId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub kind: ToastKind,
    /// Zero means the toast stays until dismissed.
    pub duration: Duration,
}

type Listener = Arc<dyn Fn(&[Toast]) + Send + Sync>;

#[derive(Default)]
struct Inner {
    toasts: Mutex<Vec<Toast>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_toast: AtomicU64,
    next_listener: AtomicU64,
}

impl Inner {
    fn notify(&self) {
        let snapshot = self.toasts.lock().clone();
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&snapshot);
        }
    }

    fn dismiss(&self, id: ToastId) -> bool {
        let removed = {
            let mut toasts = self.toasts.lock();
            let before = toasts.len();
            toasts.retain(|toast| toast.id != id);
            toasts.len() != before
        };
        if removed {
            self.notify();
        }
        removed
    }
}

#[derive(Clone, Default)]
pub struct ToastCenter {
    inner: Arc<Inner>,
}

impl ToastCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a notice for the default three seconds.
    pub fn show(&self, message: impl Into<String>, kind: ToastKind) -> ToastId {
        self.show_for(message, kind, DEFAULT_TOAST_DURATION)
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Error)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Info)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.show(message, ToastKind::Warning)
    }

    /// Appends a notice and notifies subscribers before returning.
    ///
    /// A non-zero `duration` schedules removal on the current tokio runtime.
    /// Outside a runtime the notice stays until [`dismiss`](Self::dismiss).
    pub fn show_for(&self, message: impl Into<String>, kind: ToastKind, duration: Duration) -> ToastId {
        let id = ToastId(self.inner.next_toast.fetch_add(1, Ordering::Relaxed) + 1);
        self.inner.toasts.lock().push(Toast {
            id,
            message: message.into(),
            kind,
            duration,
        });
        self.inner.notify();

        if !duration.is_zero() {
            self.schedule_dismiss(id, duration);
        }
        id
    }

    /// Removes a notice if it is still showing. Unknown ids are ignored.
    pub fn dismiss(&self, id: ToastId) {
        self.inner.dismiss(id);
    }

    pub fn snapshot(&self) -> Vec<Toast> {
        self.inner.toasts.lock().clone()
    }

    /// Registers `listener` for every future change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[Toast]) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.lock().push((id, Arc::new(listener)));
        Subscription {
            center: Arc::downgrade(&self.inner),
            id,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    fn schedule_dismiss(&self, id: ToastId, after: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, toast {id} will not auto-dismiss");
            return;
        };
        let center = Arc::downgrade(&self.inner);
        runtime.spawn(async move {
            tokio::time::sleep(after).await;
            if let Some(inner) = center.upgrade() {
                inner.dismiss(id);
            }
        });
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    center: Weak<Inner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.center.upgrade() {
            inner.listeners.lock().retain(|(id, _)| *id != self.id);
        }
    }
}

/// Prints each new toast once to stderr.
pub struct TerminalToasts {
    _subscription: Subscription,
}

impl TerminalToasts {
    pub fn attach(center: &ToastCenter) -> Self {
        let seen: Mutex<HashSet<ToastId>> = Mutex::new(HashSet::new());
        let subscription = center.subscribe(move |toasts| {
            let mut seen = seen.lock();
            for toast in toasts {
                if seen.insert(toast.id) {
                    eprintln!("{}", render(toast));
                }
            }
        });
        Self {
            _subscription: subscription,
        }
    }
}

fn render(toast: &Toast) -> String {
    match toast.kind {
        ToastKind::Success => format!("{} {}", "✔".green().bold(), toast.message),
        ToastKind::Error => format!("{} {}", "✖".red().bold(), toast.message.red()),
        ToastKind::Info => format!("{} {}", "ℹ".blue().bold(), toast.message),
        ToastKind::Warning => format!("{} {}", "⚠".yellow().bold(), toast.message.yellow()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder(center: &ToastCenter) -> (Arc<Mutex<Vec<Vec<String>>>>, Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = center.subscribe(move |toasts| {
            sink.lock()
                .push(toasts.iter().map(|t| t.message.clone()).collect());
        });
        (seen, subscription)
    }

    #[test]
    fn subscribers_get_full_list_on_each_change() {
        let center = ToastCenter::new();
        let (seen, _sub) = recorder(&center);

        let first = center.show_for("saved", ToastKind::Success, Duration::ZERO);
        center.show_for("offline", ToastKind::Warning, Duration::ZERO);
        center.dismiss(first);

        assert_eq!(
            *seen.lock(),
            vec![
                vec!["saved".to_string()],
                vec!["saved".to_string(), "offline".to_string()],
                vec!["offline".to_string()],
            ]
        );
    }

    #[test]
    fn duplicate_messages_are_kept() {
        let center = ToastCenter::new();
        let a = center.show_for("same", ToastKind::Info, Duration::ZERO);
        let b = center.show_for("same", ToastKind::Info, Duration::ZERO);
        assert_ne!(a, b);
        assert_eq!(center.snapshot().len(), 2);
    }

    #[test]
    fn second_dismiss_is_a_no_op() {
        let center = ToastCenter::new();
        let id = center.show_for("bye", ToastKind::Info, Duration::ZERO);
        let (seen, _sub) = recorder(&center);

        center.dismiss(id);
        center.dismiss(id);

        assert_eq!(seen.lock().len(), 1);
        assert!(center.snapshot().is_empty());
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let center = ToastCenter::new();
        let (seen, sub) = recorder(&center);
        assert_eq!(center.subscriber_count(), 1);

        sub.unsubscribe();
        center.show_for("unheard", ToastKind::Info, Duration::ZERO);

        assert_eq!(center.subscriber_count(), 0);
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn listeners_may_call_back_into_the_center() {
        let center = ToastCenter::new();
        let inner = center.clone();
        let _sub = center.subscribe(move |toasts| {
            if let Some(toast) = toasts.iter().find(|t| t.kind == ToastKind::Error) {
                inner.dismiss(toast.id);
            }
        });

        center.show_for("boom", ToastKind::Error, Duration::ZERO);
        assert!(center.snapshot().is_empty());
    }

    #[test]
    fn without_runtime_toasts_wait_for_dismissal() {
        let center = ToastCenter::new();
        center.show("sticky", ToastKind::Info);
        assert_eq!(center.snapshot().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn toasts_expire_after_their_duration() {
        let center = ToastCenter::new();
        center.show("short", ToastKind::Success);
        center.show_for("long", ToastKind::Info, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_millis(3001)).await;
        let left: Vec<_> = center.snapshot().into_iter().map(|t| t.message).collect();
        assert_eq!(left, vec!["long".to_string()]);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(center.snapshot().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn early_dismiss_beats_the_timer() {
        let center = ToastCenter::new();
        let (seen, _sub) = recorder(&center);

        let id = center.show("gone early", ToastKind::Info);
        center.dismiss(id);
        assert!(center.snapshot().is_empty());

        tokio::time::sleep(Duration::from_secs(5)).await;
        // show + dismiss only; the timer found nothing to remove.
        assert_eq!(seen.lock().len(), 2);
    }
}
