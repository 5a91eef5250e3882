/// Hook run after every successful update, once subscribers are notified.
///
/// Middleware observes; it cannot veto or alter the update.
pub trait Middleware<V>: Send + Sync {
    fn after_set(&self, store: &str, action: &str, prev: &V, next: &V);
}
