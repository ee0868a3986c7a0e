use std::sync::{Condvar, Mutex};

/// Bounds the number of operations that may be inside the sheet at once.
///
/// The gate is a counting primitive: `admit` blocks while `active` equals
/// the configured capacity and returns an [`AdmissionPermit`] otherwise.
/// Dropping the permit releases the slot and wakes one waiter, so a permit
/// can never be released twice or leaked across an early return.
///
/// Capacity is fixed at construction. An unbounded gate uses a capacity of
/// `usize::MAX`, which no realistic thread count reaches.
pub(crate) struct AdmissionGate {
    capacity: usize,
    active: Mutex<usize>,
    freed: Condvar,
}

impl AdmissionGate {
    /// Creates a gate admitting at most `max_users` concurrent operations,
    /// or an unbounded gate when `max_users` is `None`.
    pub(crate) fn new(max_users: Option<usize>) -> Self {
        Self {
            capacity: max_users.unwrap_or(usize::MAX),
            active: Mutex::new(0),
            freed: Condvar::new(),
        }
    }

    /// Blocks until a slot is free, then claims it.
    pub(crate) fn admit(&self) -> AdmissionPermit<'_> {
        let mut active = self.active.lock().unwrap();
        while *active >= self.capacity {
            active = self.freed.wait(active).unwrap();
        }
        *active += 1;
        AdmissionPermit { gate: self }
    }

    /// Number of operations currently admitted.
    #[cfg(test)]
    pub(crate) fn active(&self) -> usize {
        *self.active.lock().unwrap()
    }
}

/// A claimed admission slot. The slot is returned when the permit drops.
pub(crate) struct AdmissionPermit<'a> {
    gate: &'a AdmissionGate,
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        let mut active = self.gate.active.lock().unwrap();
        *active -= 1;
        self.gate.freed.notify_one();
    }
}
