use std::sync::Arc;

use crate::{
    error::{StorageError, ValidationError},
    storage::{KeyValueStore, SUBSCRIBERS_STORAGE_KEY, read_list},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Locally kept list of addresses that asked for daily updates.
#[derive(Debug, Clone)]
pub struct Subscriptions {
    store: Arc<dyn KeyValueStore>,
}

impl Subscriptions {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn subscribe(&self, email: &str) -> Result<SubscribeOutcome, SubscriptionError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(ValidationError::InvalidEmail(email.to_string()).into());
        }

        if self.store.append(SUBSCRIBERS_STORAGE_KEY, email)? {
            tracing::info!(%email, "subscribed");
            Ok(SubscribeOutcome::Subscribed)
        } else {
            Ok(SubscribeOutcome::AlreadySubscribed)
        }
    }

    pub fn list(&self) -> Result<Vec<String>, StorageError> {
        read_list(self.store.as_ref(), SUBSCRIBERS_STORAGE_KEY)
    }
}

/// `local@domain.tld` with no whitespace and a single `@`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn subscriptions() -> Subscriptions {
        Subscriptions::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("user"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user@example."));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("a@b@example.com"));
    }

    #[test]
    fn subscribe_twice_reports_existing() {
        let subs = subscriptions();

        assert_eq!(subs.subscribe("user@example.com").unwrap(), SubscribeOutcome::Subscribed);
        assert_eq!(
            subs.subscribe(" user@example.com ").unwrap(),
            SubscribeOutcome::AlreadySubscribed
        );
        assert_eq!(subs.list().unwrap(), vec!["user@example.com"]);
    }

    #[test]
    fn invalid_email_is_not_stored() {
        let subs = subscriptions();

        let err = subs.subscribe("nope").unwrap_err();
        assert!(matches!(err, SubscriptionError::Invalid(ValidationError::InvalidEmail(_))));
        assert!(subs.list().unwrap().is_empty());
    }

    #[test]
    fn list_keeps_insertion_order() {
        let subs = subscriptions();
        subs.subscribe("b@example.com").unwrap();
        subs.subscribe("a@example.com").unwrap();

        assert_eq!(subs.list().unwrap(), vec!["b@example.com", "a@example.com"]);
    }
}
