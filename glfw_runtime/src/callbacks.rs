////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! Closure registry behind the generated callback trampolines.
//!
//! GLFW delivers callbacks on the thread that polls events, so the registry is thread local.
//! A closure is taken out of its slot while it runs; it may replace or clear its own slot, in
//! which case it is dropped once it returns instead of being put back.

use std::{any::Any, cell::RefCell, collections::BTreeMap};

/// Handle value of callbacks that are not tied to a window or monitor.
pub const GLOBAL: usize = 0;

/// Identifies one registered closure: the handle it belongs to and the name of the GLFW setter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackKey {
    pub handle: usize,
    pub kind: &'static str,
}

impl CallbackKey {
    pub const fn new(handle: usize, kind: &'static str) -> CallbackKey {
        CallbackKey { handle, kind }
    }

    pub const fn global(kind: &'static str) -> CallbackKey {
        CallbackKey::new(GLOBAL, kind)
    }
}

struct Slot {
    /// Changes on every `replace`, so a running closure can tell it was swapped out.
    id: u64,
    /// `None` while the closure runs.
    callback: Option<Box<dyn Any>>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    slots: BTreeMap<CallbackKey, Slot>,
}

thread_local! {
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry::default());
}

fn unbox<F: 'static>(key: CallbackKey, boxed: Box<dyn Any>) -> Option<F> {
    match boxed.downcast::<F>() {
        Ok(callback) => Some(*callback),
        Err(_) => {
            warn!("Callback registered for {:?} has an unexpected type", key);
            None
        },
    }
}

/// Stores `callback` under `key`, or clears the slot for `None`.
///
/// Returns the closure previously stored there. A closure that is running right now is not
/// returned; it is dropped when it finishes.
pub fn replace<F: 'static>(key: CallbackKey, callback: Option<F>) -> Option<F> {
    let previous = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        match callback {
            Some(callback) => {
                let id = registry.next_id;
                registry.next_id += 1;
                let slot = Slot {
                    id,
                    callback: Some(Box::new(callback) as Box<dyn Any>),
                };
                registry.slots.insert(key, slot)
            },
            None => registry.slots.remove(&key),
        }
    });

    trace!("Replaced callback {:?}", key);
    previous.and_then(|slot| slot.callback).and_then(|boxed| unbox(key, boxed))
}

/// Runs the closure stored under `key`.
///
/// Returns `None` if no closure is stored, the closure is already running further up the
/// stack or it has another type than `F`.
pub fn invoke<F, R, C>(key: CallbackKey, call: C) -> Option<R>
where
    F: 'static,
    C: FnOnce(&mut F) -> R,
{
    let (id, mut boxed) = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let slot = registry.slots.get_mut(&key)?;
        let callback = slot.callback.take()?;
        Some((slot.id, callback))
    })?;

    let result = match boxed.downcast_mut::<F>() {
        Some(callback) => Some(call(callback)),
        None => {
            warn!("Callback registered for {:?} has an unexpected type", key);
            None
        },
    };

    // dropped outside the borrow, its destructor may touch the registry
    let _stale = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        match registry.slots.get_mut(&key) {
            Some(slot) if slot.id == id && slot.callback.is_none() => {
                slot.callback = Some(boxed);
                None
            },
            _ => Some(boxed),
        }
    });

    result
}

/// Drops every closure registered for `handle`. Returns how many there were.
pub fn release(handle: usize) -> usize {
    let released: Vec<Slot> = REGISTRY.with(|registry| {
        let mut registry = registry.borrow_mut();
        let keys: Vec<CallbackKey> = registry.slots.keys().filter(|k| k.handle == handle).cloned().collect();
        keys.iter().filter_map(|k| registry.slots.remove(k)).collect()
    });

    if !released.is_empty() {
        debug!("Released {} callbacks of handle {:#x}", released.len(), handle);
    }
    released.len()
}

pub fn is_registered(key: CallbackKey) -> bool {
    REGISTRY.with(|registry| registry.borrow().slots.contains_key(&key))
}

/// Number of registered closures on this thread.
pub fn len() -> usize {
    REGISTRY.with(|registry| registry.borrow().slots.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::Cell, rc::Rc};

    type Counter = Box<dyn FnMut(i32) -> i32>;

    const KEY: CallbackKey = CallbackKey::new(0x10, "glfwSetKeyCallback");

    /// The harness may run several tests on one thread.
    fn fresh() {
        let slots = REGISTRY.with(|registry| std::mem::take(&mut registry.borrow_mut().slots));
        drop(slots);
    }

    #[test]
    fn invoke_runs_the_registered_closure() {
        fresh();
        let mut total = 0;
        replace::<Counter>(KEY, Some(Box::new(move |n| {
            total += n;
            total
        })));

        assert_eq!(invoke(KEY, |f: &mut Counter| f(2)), Some(2));
        assert_eq!(invoke(KEY, |f: &mut Counter| f(3)), Some(5));
        assert_eq!(invoke(CallbackKey::global("glfwSetKeyCallback"), |f: &mut Counter| f(1)), None);
    }

    #[test]
    fn replace_returns_the_previous_closure() {
        fresh();
        assert!(replace::<Counter>(KEY, Some(Box::new(|n| n))).is_none());
        let mut previous = replace::<Counter>(KEY, Some(Box::new(|n| n * 10))).unwrap();
        assert_eq!(previous(4), 4);
        assert_eq!(invoke(KEY, |f: &mut Counter| f(4)), Some(40));

        assert!(replace::<Counter>(KEY, None).is_some());
        assert!(!is_registered(KEY));
    }

    #[test]
    fn a_closure_may_replace_itself() {
        fresh();
        replace::<Counter>(KEY, Some(Box::new(|n| {
            replace::<Counter>(KEY, Some(Box::new(|n| -n)));
            n
        })));

        assert_eq!(invoke(KEY, |f: &mut Counter| f(7)), Some(7));
        assert_eq!(invoke(KEY, |f: &mut Counter| f(7)), Some(-7));
    }

    #[test]
    fn a_closure_may_clear_itself() {
        fresh();
        let dropped = Rc::new(Cell::new(false));
        struct Flag(Rc<Cell<bool>>);
        impl Drop for Flag {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let flag = Flag(dropped.clone());
        replace::<Counter>(KEY, Some(Box::new(move |n| {
            let _keep = &flag;
            assert!(replace::<Counter>(KEY, None).is_none());
            n
        })));

        assert_eq!(invoke(KEY, |f: &mut Counter| f(1)), Some(1));
        assert!(dropped.get());
        assert!(!is_registered(KEY));
    }

    #[test]
    fn reentrant_invoke_is_skipped() {
        fresh();
        replace::<Counter>(KEY, Some(Box::new(|n| invoke(KEY, |f: &mut Counter| f(n)).unwrap_or(-1))));
        assert_eq!(invoke(KEY, |f: &mut Counter| f(5)), Some(-1));
    }

    #[test]
    fn wrong_type_is_not_called() {
        fresh();
        replace::<Counter>(KEY, Some(Box::new(|n| n)));
        assert_eq!(invoke(KEY, |f: &mut Box<dyn FnMut()>| f()), None);
        assert_eq!(invoke(KEY, |f: &mut Counter| f(8)), Some(8));
    }

    #[test]
    fn release_drops_one_handle() {
        fresh();
        let other = CallbackKey::new(0x20, "glfwSetKeyCallback");
        replace::<Counter>(KEY, Some(Box::new(|n| n)));
        replace::<Counter>(CallbackKey::new(0x10, "glfwSetCharCallback"), Some(Box::new(|n| n)));
        replace::<Counter>(other, Some(Box::new(|n| n)));
        assert_eq!(len(), 3);

        assert_eq!(release(0x10), 2);
        assert_eq!(len(), 1);
        assert!(is_registered(other));
        assert_eq!(release(0x10), 0);
    }
}
