use parking_lot::Mutex;
use std::sync::Arc;

/// Handle partagé entre le tableau de bord et ses collaborateurs (stubs de test, vue).
pub type Shared<T> = Arc<Mutex<T>>;

pub fn new_state<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}
