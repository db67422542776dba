// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<A> = Rc<dyn Fn(&A)>;

struct Slot<A: ?Sized> {
    id: u64,
    callback: Callback<A>,
}

struct SlotList<A: ?Sized> {
    next_id: Cell<u64>,
    slots: RefCell<Vec<Slot<A>>>,
}

impl<A: ?Sized> SlotList<A> {
    fn remove(&self, id: u64) {
        self.slots.borrow_mut().retain(|slot| slot.id != id);
    }

    fn contains(&self, id: u64) -> bool {
        self.slots.borrow().iter().any(|slot| slot.id == id)
    }
}

/// A typed, single-threaded notification channel.
///
/// Subscribers register a callback with [`Signal::connect`] and keep the
/// returned [`SignalSlot`] alive for as long as they want to be notified.
/// [`Signal::execute`] invokes every connected callback synchronously, in
/// connection order.
///
/// Callbacks may connect, disconnect or execute signals (including this one)
/// while they run. The list of callbacks is captured when `execute` starts; a
/// callback disconnected by an earlier callback of the same execution is
/// skipped, a callback connected during it is not called until the next one.
pub struct Signal<A: ?Sized> {
    inner: Rc<SlotList<A>>,
}

impl<A: ?Sized + 'static> Signal<A> {
    /// Creates a signal with no subscribers.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(SlotList {
                next_id: Cell::new(0),
                slots: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Connects `callback` and returns the slot that keeps it connected.
    pub fn connect<F>(&self, callback: F) -> SignalSlot
    where
        F: Fn(&A) + 'static,
    {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.slots.borrow_mut().push(Slot {
            id,
            callback: Rc::new(callback),
        });

        let list: Weak<SlotList<A>> = Rc::downgrade(&self.inner);
        SignalSlot {
            disconnect: Some(Box::new(move || {
                if let Some(list) = list.upgrade() {
                    list.remove(id);
                }
            })),
        }
    }

    /// Invokes every connected callback with `args`.
    pub fn execute(&self, args: &A) {
        let snapshot: Vec<(u64, Callback<A>)> = self
            .inner
            .slots
            .borrow()
            .iter()
            .map(|slot| (slot.id, slot.callback.clone()))
            .collect();

        for (id, callback) in snapshot {
            if self.inner.contains(id) {
                callback(args);
            }
        }
    }

    /// Returns the number of connected callbacks.
    pub fn num_callbacks(&self) -> usize {
        self.inner.slots.borrow().len()
    }

    /// Returns `true` if no callback is connected.
    pub fn is_empty(&self) -> bool {
        self.num_callbacks() == 0
    }
}

impl<A: ?Sized + 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("callbacks", &self.inner.slots.borrow().len())
            .finish()
    }
}

/// The connection returned by [`Signal::connect`].
///
/// Dropping the slot disconnects its callback. A slot outliving its signal is
/// harmless.
#[must_use = "dropping a SignalSlot disconnects its callback immediately"]
pub struct SignalSlot {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl SignalSlot {
    /// Disconnects the callback now.
    pub fn disconnect(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for SignalSlot {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SignalSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalSlot")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_reaches_every_connected_callback_in_order() {
        let signal = Signal::<u32>::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = log.clone();
            signal.connect(move |v| log.borrow_mut().push(("first", *v)))
        };
        let second = {
            let log = log.clone();
            signal.connect(move |v| log.borrow_mut().push(("second", *v)))
        };

        signal.execute(&7);

        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
        drop((first, second));
    }

    #[test]
    fn dropping_the_slot_disconnects() {
        let signal = Signal::<()>::new();
        let count = Rc::new(Cell::new(0));

        let slot = {
            let count = count.clone();
            signal.connect(move |_| count.set(count.get() + 1))
        };
        signal.execute(&());
        drop(slot);
        signal.execute(&());

        assert_eq!(count.get(), 1);
        assert!(signal.is_empty());
    }

    #[test]
    fn callback_can_disconnect_a_later_callback() {
        let signal = Rc::new(Signal::<()>::new());
        let late_calls = Rc::new(Cell::new(0));
        let late_slot: Rc<RefCell<Option<SignalSlot>>> = Rc::new(RefCell::new(None));

        let _early = {
            let late_slot = late_slot.clone();
            signal.connect(move |_| {
                late_slot.borrow_mut().take();
            })
        };
        *late_slot.borrow_mut() = Some({
            let late_calls = late_calls.clone();
            signal.connect(move |_| late_calls.set(late_calls.get() + 1))
        });

        signal.execute(&());

        assert_eq!(late_calls.get(), 0);
        assert_eq!(signal.num_callbacks(), 1);
    }

    #[test]
    fn callback_connected_during_execution_waits_for_next_execution() {
        let signal = Rc::new(Signal::<()>::new());
        let added: Rc<RefCell<Vec<SignalSlot>>> = Rc::new(RefCell::new(Vec::new()));
        let inner_calls = Rc::new(Cell::new(0));

        let _outer = {
            let signal_weak = Rc::downgrade(&signal);
            let added = added.clone();
            let inner_calls = inner_calls.clone();
            signal.connect(move |_| {
                if let Some(signal) = signal_weak.upgrade() {
                    let inner_calls = inner_calls.clone();
                    let slot = signal.connect(move |_| inner_calls.set(inner_calls.get() + 1));
                    added.borrow_mut().push(slot);
                }
            })
        };

        signal.execute(&());
        assert_eq!(inner_calls.get(), 0);

        signal.execute(&());
        assert_eq!(inner_calls.get(), 1);
    }

    #[test]
    fn slot_outliving_signal_is_harmless() {
        let signal = Signal::<str>::new();
        let slot = signal.connect(|_| {});
        drop(signal);
        slot.disconnect();
    }
}
