//! Ambient conversation id
//!
//! Each logical unit of execution owns its own slot:
//! - inside [`scope`], the slot is a tokio task-local and follows the future
//!   across worker threads
//! - on a plain thread with no tokio runtime, the slot is thread-local
//!
//! Concurrent requests therefore never observe each other's id. Tokio worker
//! threads are shared by many tasks, so on a runtime without an enclosing
//! [`scope`] there is no slot at all: [`set`] fails with a configuration error,
//! [`get`] returns `None` and [`clear`] does nothing.

use crate::error::{ObservabilityError, Result};
use std::cell::RefCell;
use std::future::Future;

tokio::task_local! {
    static TASK_CONVERSATION: RefCell<Option<String>>;
}

thread_local! {
    static THREAD_CONVERSATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Whether the caller has a slot: inside a [`scope`], or on a thread with no
/// tokio runtime
pub fn is_scoped() -> bool {
    TASK_CONVERSATION.try_with(|_| ()).is_ok() || tokio::runtime::Handle::try_current().is_err()
}

fn with_slot<R>(f: impl FnOnce(&RefCell<Option<String>>) -> R) -> Option<R> {
    if TASK_CONVERSATION.try_with(|_| ()).is_ok() {
        Some(TASK_CONVERSATION.with(f))
    } else if tokio::runtime::Handle::try_current().is_err() {
        Some(THREAD_CONVERSATION.with(f))
    } else {
        None
    }
}

fn unscoped_error() -> ObservabilityError {
    ObservabilityError::Config(
        "conversation id set from a tokio task without a conversation scope; \
         run the task inside context::scope or AiLogger::in_conversation"
            .to_string(),
    )
}

/// Run `fut` with its own conversation slot, initialised to `conversation_id`
///
/// # Example
///
/// ```ignore
/// context::scope(None, async {
///     context::set("conv-42")?;
///     logger.log_prompt("hi", "gpt-4o", None, Metadata::new()).await?;
///     Ok::<_, ObservabilityError>(())
/// })
/// .await?;
/// ```
pub async fn scope<F>(conversation_id: Option<String>, fut: F) -> F::Output
where
    F: Future,
{
    TASK_CONVERSATION.scope(RefCell::new(conversation_id), fut).await
}

/// Set the conversation id for the rest of the current execution context
///
/// Fails on a tokio runtime outside any [`scope`].
pub fn set(conversation_id: impl Into<String>) -> Result<()> {
    let conversation_id = conversation_id.into();
    with_slot(|slot| *slot.borrow_mut() = Some(conversation_id)).ok_or_else(unscoped_error)
}

/// Reset the conversation id to absent
pub fn clear() {
    with_slot(|slot| *slot.borrow_mut() = None);
}

/// Currently active conversation id, if any
pub fn get() -> Option<String> {
    with_slot(|slot| slot.borrow().clone()).flatten()
}

/// Sets a conversation id and restores the previous value on drop
///
/// Meant for synchronous sections; do not hold across `.await` outside a
/// [`scope`].
#[must_use = "the previous conversation id is restored when the guard is dropped"]
pub struct ConversationGuard {
    previous: Option<String>,
}

impl ConversationGuard {
    pub fn enter(conversation_id: impl Into<String>) -> Result<Self> {
        let conversation_id = conversation_id.into();
        let previous = with_slot(|slot| slot.replace(Some(conversation_id)))
            .ok_or_else(unscoped_error)?;
        Ok(Self { previous })
    }
}

impl Drop for ConversationGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        with_slot(|slot| *slot.borrow_mut() = previous);
    }
}
