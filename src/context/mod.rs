//! Current-environment context.
//!
//! # Responsibilities
//! - Hold the environment selected for the request being handled
//! - Make it readable from any layer without passing it through every call
//! - Guarantee it is cleared when the request ends
//!
//! # Design Decisions
//! - Two slots: a tokio task-local for async request handling ([`scope`]) and
//!   a thread-local for synchronous code ([`set_current`], [`enter`])
//! - Inside a task scope the task value wins, even when it is `None`
//! - Absent is distinct from the empty string
//! - Explicit keys (`EnvRegistry::get(Some(key))`) remain preferable wherever
//!   the key is at hand

use std::cell::RefCell;
use std::future::Future;

tokio::task_local! {
    static TASK_ENVIRONMENT: Option<String>;
}

thread_local! {
    static THREAD_ENVIRONMENT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// The environment selected for the current request, if any.
pub fn current() -> Option<String> {
    match TASK_ENVIRONMENT.try_with(Clone::clone) {
        Ok(scoped) => scoped,
        Err(_) => THREAD_ENVIRONMENT.with(|slot| slot.borrow().clone()),
    }
}

/// Set the environment for the current thread.
///
/// Callers own the clearing obligation; prefer [`enter`] which clears on drop.
pub fn set_current(environment: impl Into<String>) {
    let environment = environment.into();
    THREAD_ENVIRONMENT.with(|slot| *slot.borrow_mut() = Some(environment));
}

/// Remove the environment from the current thread.
pub fn clear() {
    THREAD_ENVIRONMENT.with(|slot| slot.borrow_mut().take());
}

/// Set the thread environment until the returned guard is dropped.
///
/// The previous value is restored on drop, including during unwinding.
#[must_use = "the environment is cleared as soon as the guard is dropped"]
pub fn enter(environment: impl Into<String>) -> EnvironmentGuard {
    let environment = environment.into();
    let previous = THREAD_ENVIRONMENT.with(|slot| slot.borrow_mut().replace(environment));
    EnvironmentGuard { previous }
}

/// Restores the previous thread environment when dropped.
#[derive(Debug)]
pub struct EnvironmentGuard {
    previous: Option<String>,
}

impl Drop for EnvironmentGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        THREAD_ENVIRONMENT.with(|slot| *slot.borrow_mut() = previous);
    }
}

/// Run `future` with `environment` as the current environment.
///
/// The value is visible to everything the future polls and disappears when
/// the future completes, fails or is dropped.
pub async fn scope<F>(environment: Option<String>, future: F) -> F::Output
where
    F: Future,
{
    TASK_ENVIRONMENT.scope(environment, future).await
}
