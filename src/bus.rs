use std::sync::Arc;
use tokio::sync::broadcast;

/// Broadcast topic with bounded capacity.
/// `T` must be `Send + Sync` because messages cross from the UI thread to the runtime.
#[derive(Debug, Clone)]
pub struct Topic<T> {
    tx: broadcast::Sender<Arc<T>>,
}

impl<T: Send + Sync + 'static> Topic<T> {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Sends `msg` to every current subscriber. Returns `false` when nobody is listening.
    pub fn publish(&self, msg: T) -> bool {
        self.tx.send(Arc::new(msg)).is_ok()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<T>> {
        self.tx.subscribe()
    }

    /// Raw sender, for tasks that publish on their own.
    pub fn sender(&self) -> broadcast::Sender<Arc<T>> {
        self.tx.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let topic: Topic<u32> = Topic::new(4);
        assert!(!topic.publish(1));
    }

    #[test]
    fn test_subscriber_receives_messages_sent_after_subscribing() {
        let topic: Topic<u32> = Topic::new(4);
        let mut rx = topic.subscribe();
        assert!(topic.publish(7));
        assert!(topic.sender().send(Arc::new(8)).is_ok());
        assert_eq!(*rx.try_recv().unwrap(), 7);
        assert_eq!(*rx.try_recv().unwrap(), 8);
    }
}
