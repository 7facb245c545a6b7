//! Signature notification correlation.
//!
//! Maps transaction signatures to pending confirmation waiters. Each
//! subscription gets a generated id and its own channel; whatever
//! transport delivers notifications (a WebSocket task, a polling loop, a
//! test) feeds them in by signature and the table fans them out. Dropping
//! a [`SubscriptionHandle`] removes its entry, so a cancelled or timed-out
//! wait never leaks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sol_sdk::Signature;
use tokio::sync::mpsc;

/// A notification about a watched signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureNotification {
    /// Terminal processing status. `err` is `None` on success and carries
    /// the node's error rendering otherwise.
    Status { err: Option<String> },
    /// The node has seen the signature but not yet processed it.
    Received,
}

struct Entry {
    signature: String,
    sender: mpsc::UnboundedSender<SignatureNotification>,
}

#[derive(Default)]
struct Table {
    next_id: u64,
    entries: HashMap<u64, Entry>,
}

/// Correlation table shared between a connection and its notification
/// transport.
#[derive(Clone, Default)]
pub struct SignatureSubscriptions {
    table: Arc<Mutex<Table>>,
}

impl SignatureSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register interest in `signature`. Notifications arriving after
    /// this call are delivered to the returned handle until it is
    /// dropped.
    pub fn subscribe(&self, signature: &Signature) -> SubscriptionHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut table = lock(&self.table);
        let id = table.next_id;
        table.next_id += 1;
        table.entries.insert(
            id,
            Entry {
                signature: signature.to_string(),
                sender,
            },
        );
        tracing::debug!(id, %signature, "signature subscription registered");
        SubscriptionHandle {
            id,
            table: Arc::clone(&self.table),
            receiver,
        }
    }

    /// Deliver a notification to every subscriber of `signature`.
    /// Returns the number of subscribers reached.
    pub fn notify(&self, signature: &Signature, notification: &SignatureNotification) -> usize {
        let wanted = signature.to_string();
        let table = lock(&self.table);
        let mut delivered = 0;
        for entry in table.entries.values() {
            if entry.signature == wanted && entry.sender.send(notification.clone()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        lock(&self.table).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Receiving end of one subscription. Unsubscribes on drop.
pub struct SubscriptionHandle {
    id: u64,
    table: Arc<Mutex<Table>>,
    receiver: mpsc::UnboundedReceiver<SignatureNotification>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Await the next notification. `None` means the table entry was
    /// removed externally.
    pub async fn next(&mut self) -> Option<SignatureNotification> {
        self.receiver.recv().await
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        lock(&self.table).entries.remove(&self.id);
    }
}

fn lock(table: &Mutex<Table>) -> std::sync::MutexGuard<'_, Table> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(byte: u8) -> Signature {
        Signature::new_from_array([byte; 64])
    }

    #[tokio::test]
    async fn notification_reaches_subscriber() {
        let subscriptions = SignatureSubscriptions::new();
        let mut handle = subscriptions.subscribe(&sig(1));

        let delivered = subscriptions.notify(&sig(1), &SignatureNotification::Status { err: None });
        assert_eq!(delivered, 1);
        assert_eq!(
            handle.next().await,
            Some(SignatureNotification::Status { err: None })
        );
    }

    #[tokio::test]
    async fn received_precedes_status() {
        let subscriptions = SignatureSubscriptions::new();
        let mut handle = subscriptions.subscribe(&sig(1));

        subscriptions.notify(&sig(1), &SignatureNotification::Received);
        subscriptions.notify(
            &sig(1),
            &SignatureNotification::Status {
                err: Some("InstructionError".into()),
            },
        );

        assert_eq!(handle.next().await, Some(SignatureNotification::Received));
        assert_eq!(
            handle.next().await,
            Some(SignatureNotification::Status {
                err: Some("InstructionError".into())
            })
        );
    }

    #[test]
    fn notify_only_matching_signature() {
        let subscriptions = SignatureSubscriptions::new();
        let _watching_one = subscriptions.subscribe(&sig(1));

        let delivered = subscriptions.notify(&sig(2), &SignatureNotification::Received);
        assert_eq!(delivered, 0);
    }

    #[test]
    fn two_subscribers_both_reached() {
        let subscriptions = SignatureSubscriptions::new();
        let _a = subscriptions.subscribe(&sig(1));
        let _b = subscriptions.subscribe(&sig(1));

        let delivered = subscriptions.notify(&sig(1), &SignatureNotification::Received);
        assert_eq!(delivered, 2);
    }

    #[test]
    fn drop_unsubscribes() {
        let subscriptions = SignatureSubscriptions::new();
        let handle = subscriptions.subscribe(&sig(1));
        assert_eq!(subscriptions.len(), 1);
        assert_eq!(handle.id(), 0);

        drop(handle);
        assert!(subscriptions.is_empty());
        assert_eq!(subscriptions.notify(&sig(1), &SignatureNotification::Received), 0);
    }

    #[test]
    fn ids_are_unique() {
        let subscriptions = SignatureSubscriptions::new();
        let a = subscriptions.subscribe(&sig(1));
        let b = subscriptions.subscribe(&sig(1));
        assert_ne!(a.id(), b.id());
    }
}
