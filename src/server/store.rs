// SPDX-FileCopyrightText: Copyright (c) 2025-2026 modbus-kit contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Concurrent in-memory data store.

use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;

use crate::frame::{Address, Word};

/// The four Modbus address spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointKind {
    /// A writable bit.
    Coil,
    /// A bit that is read-only from the bus.
    DiscreteInput,
    /// A writable 16-bit word.
    HoldingRegister,
    /// A 16-bit word that is read-only from the bus.
    InputRegister,
}

impl fmt::Display for PointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PointKind::Coil => "coil",
            PointKind::DiscreteInput => "discrete input",
            PointKind::HoldingRegister => "holding register",
            PointKind::InputRegister => "input register",
        };
        f.write_str(name)
    }
}

/// A single addressed cell and its value at the time of the event or
/// snapshot. Bit spaces carry `0` or `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub kind: PointKind,
    pub address: Address,
    pub value: Word,
}

/// Subscription token returned by [`MemoryDataStore::subscribe`].
pub type CallbackId = u64;

type WriteCallback = Arc<dyn Fn(Point) + Send + Sync>;

/// An in-memory image of the four address spaces, shared between the
/// request dispatcher and the host application.
///
/// Reads are shared, writes exclusive; unset addresses read as zero.
/// Subscribed callbacks observe every committed write. They are invoked
/// outside the lock, so a callback may write back into the store without
/// deadlocking.
#[derive(Default)]
pub struct MemoryDataStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    coils: HashMap<Address, bool>,
    discrete_inputs: HashMap<Address, bool>,
    holding_registers: HashMap<Address, Word>,
    input_registers: HashMap<Address, Word>,
    callbacks: Vec<(CallbackId, WriteCallback)>,
    next_callback_id: CallbackId,
}

impl MemoryDataStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads one cell; bit spaces yield `0` or `1`.
    #[must_use]
    pub fn read(&self, kind: PointKind, address: Address) -> Word {
        let inner = self.inner.read();
        match kind {
            PointKind::Coil => inner.coils.get(&address).copied().unwrap_or(false).into(),
            PointKind::DiscreteInput => inner
                .discrete_inputs
                .get(&address)
                .copied()
                .unwrap_or(false)
                .into(),
            PointKind::HoldingRegister => {
                inner.holding_registers.get(&address).copied().unwrap_or(0)
            }
            PointKind::InputRegister => {
                inner.input_registers.get(&address).copied().unwrap_or(0)
            }
        }
    }

    /// Writes one cell; bit spaces store `value != 0`.
    ///
    /// Subscribers are notified once per call, after the write committed.
    pub fn write(&self, kind: PointKind, address: Address, value: Word) {
        {
            let mut inner = self.inner.write();
            match kind {
                PointKind::Coil => {
                    inner.coils.insert(address, value != 0);
                }
                PointKind::DiscreteInput => {
                    inner.discrete_inputs.insert(address, value != 0);
                }
                PointKind::HoldingRegister => {
                    inner.holding_registers.insert(address, value);
                }
                PointKind::InputRegister => {
                    inner.input_registers.insert(address, value);
                }
            }
        }
        self.notify(Point {
            kind,
            address,
            value,
        });
    }

    fn notify(&self, point: Point) {
        // Snapshot the subscriber list so the callbacks run unlocked.
        let callbacks: Vec<WriteCallback> = {
            let inner = self.inner.read();
            if inner.callbacks.is_empty() {
                return;
            }
            inner
                .callbacks
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect()
        };
        for callback in callbacks {
            callback(point);
        }
    }

    /// Registers a write observer and returns its subscription token.
    pub fn subscribe<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(Point) + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        let id = inner.next_callback_id;
        inner.next_callback_id += 1;
        inner.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Drops the subscription with the given token, if it still exists.
    pub fn unsubscribe(&self, id: CallbackId) {
        let mut inner = self.inner.write();
        inner.callbacks.retain(|(callback_id, _)| *callback_id != id);
    }

    /// Snapshot of every populated cell across all four spaces.
    #[must_use]
    pub fn points(&self) -> Vec<Point> {
        let inner = self.inner.read();
        let mut points = Vec::new();
        points.extend(inner.coils.iter().map(|(address, value)| Point {
            kind: PointKind::Coil,
            address: *address,
            value: (*value).into(),
        }));
        points.extend(inner.discrete_inputs.iter().map(|(address, value)| Point {
            kind: PointKind::DiscreteInput,
            address: *address,
            value: (*value).into(),
        }));
        points.extend(
            inner
                .holding_registers
                .iter()
                .map(|(address, value)| Point {
                    kind: PointKind::HoldingRegister,
                    address: *address,
                    value: *value,
                }),
        );
        points.extend(inner.input_registers.iter().map(|(address, value)| Point {
            kind: PointKind::InputRegister,
            address: *address,
            value: *value,
        }));
        points
    }
}

impl fmt::Debug for MemoryDataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("MemoryDataStore")
            .field("coils", &inner.coils.len())
            .field("discrete_inputs", &inner.discrete_inputs.len())
            .field("holding_registers", &inner.holding_registers.len())
            .field("input_registers", &inner.input_registers.len())
            .field("callbacks", &inner.callbacks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    };

    use super::*;

    #[test]
    fn unset_addresses_read_as_zero() {
        let store = MemoryDataStore::new();
        assert_eq!(store.read(PointKind::Coil, 7), 0);
        assert_eq!(store.read(PointKind::HoldingRegister, 7), 0);
    }

    #[test]
    fn write_then_read() {
        let store = MemoryDataStore::new();
        store.write(PointKind::HoldingRegister, 3, 0x1234);
        assert_eq!(store.read(PointKind::HoldingRegister, 3), 0x1234);

        store.write(PointKind::Coil, 3, 0xFF00);
        assert_eq!(store.read(PointKind::Coil, 3), 1);
        store.write(PointKind::Coil, 3, 0);
        assert_eq!(store.read(PointKind::Coil, 3), 0);

        // The four spaces are disjoint.
        assert_eq!(store.read(PointKind::InputRegister, 3), 0);
    }

    #[test]
    fn callback_fires_once_per_write() {
        let store = MemoryDataStore::new();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        store.subscribe(move |point| sink.lock().unwrap().push(point));

        store.write(PointKind::InputRegister, 1, 11);
        store.write(PointKind::InputRegister, 1, 11);

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            Point {
                kind: PointKind::InputRegister,
                address: 1,
                value: 11
            }
        );
    }

    #[test]
    fn unsubscribe_by_token() {
        let store = MemoryDataStore::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let first = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&count);
        store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.write(PointKind::Coil, 0, 1);
        assert_eq!(count.load(Ordering::SeqCst), 2);

        store.unsubscribe(first);
        store.write(PointKind::Coil, 0, 1);
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn callback_may_write_back() {
        let store = Arc::new(MemoryDataStore::new());
        let mirror = Arc::clone(&store);
        store.subscribe(move |point| {
            if point.kind == PointKind::HoldingRegister {
                mirror.write(PointKind::InputRegister, point.address, point.value);
            }
        });
        store.write(PointKind::HoldingRegister, 9, 42);
        assert_eq!(store.read(PointKind::InputRegister, 9), 42);
    }

    #[test]
    fn points_snapshot() {
        let store = MemoryDataStore::new();
        store.write(PointKind::Coil, 0, 1);
        store.write(PointKind::HoldingRegister, 1, 7);
        let mut points = store.points();
        points.sort_by_key(|point| point.address);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].kind, PointKind::Coil);
        assert_eq!(points[1].value, 7);
    }
}
