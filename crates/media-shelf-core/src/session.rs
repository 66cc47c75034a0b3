use std::sync::{PoisonError, RwLock};

/// Supplies the signed-in user. `None` means no session, and every store
/// operation that would touch the remote collections is skipped.
pub trait SessionProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}

/// In-process session holder, switched by sign-in and sign-out.
#[derive(Debug, Default)]
pub struct SharedSession {
    user_id: RwLock<Option<String>>,
}

impl SharedSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = Some(user_id.into());
    }

    pub fn sign_out(&self) {
        *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl SessionProvider for SharedSession {
    fn current_user_id(&self) -> Option<String> {
        self.user_id.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
