/// A mutex that keeps serving its data after a holder panicked.
///
/// Every critical section in the vault is a single statement or a single
/// transaction, so the guarded connection stays consistent across a poison.
pub struct Mutex<T>(std::sync::Mutex<T>);

impl<T> Mutex<T> {
    pub const fn new(value: T) -> Self {
        Self(std::sync::Mutex::new(value))
    }

    pub fn lock(&self) -> std::sync::MutexGuard<'_, T> {
        self.0
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
