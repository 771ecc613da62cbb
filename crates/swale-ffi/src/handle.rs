//! Opaque `u64` handles for project builders and simulation runs.
//!
//! A handle carries the kind of object it names (top 8 bits), its slot in
//! that kind's registry (next 24 bits) and the slot's generation (low 32
//! bits). Destroying a builder or a run bumps the generation, so a handle
//! kept after `swale_project_destroy` or `swale_run_destroy` resolves to
//! nothing instead of to whatever reuses the slot. A run handle passed
//! where a project builder is expected, or the reverse, never resolves.

const GENERATION_BITS: u32 = 32;
const SLOT_BITS: u32 = 24;
const MAX_SLOTS: usize = 1 << SLOT_BITS;

/// Kind of object a handle names. Zero is never a valid kind, so the
/// all-zero handle is always invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum HandleKind {
    /// A project under construction.
    Project = 1,
    /// A simulation run.
    Run = 2,
}

/// Objects the C side refers to by handle.
pub(crate) trait Handled {
    /// Kind stamped into every handle of this type.
    const KIND: HandleKind;
}

fn pack(kind: HandleKind, slot: u32, generation: u32) -> u64 {
    (u64::from(kind as u8) << (GENERATION_BITS + SLOT_BITS))
        | (u64::from(slot) << GENERATION_BITS)
        | u64::from(generation)
}

/// Slot and generation of `handle`, if it names an object of `kind`.
fn unpack(kind: HandleKind, handle: u64) -> Option<(usize, u32)> {
    if (handle >> (GENERATION_BITS + SLOT_BITS)) as u8 != kind as u8 {
        return None;
    }
    let slot = (handle >> GENERATION_BITS) as usize & (MAX_SLOTS - 1);
    Some((slot, handle as u32))
}

struct Entry<T> {
    generation: u32,
    value: Option<T>,
}

/// Builders or runs addressed by generation-checked handles.
pub(crate) struct Registry<T> {
    entries: Vec<Entry<T>>,
    vacant: Vec<u32>,
}

impl<T: Handled> Registry<T> {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            vacant: Vec::new(),
        }
    }

    /// Store `value` and return its handle, or `None` once every slot is
    /// taken or retired.
    pub fn insert(&mut self, value: T) -> Option<u64> {
        if let Some(slot) = self.vacant.pop() {
            let entry = &mut self.entries[slot as usize];
            entry.value = Some(value);
            return Some(pack(T::KIND, slot, entry.generation));
        }
        if self.entries.len() >= MAX_SLOTS {
            return None;
        }
        let slot = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            value: Some(value),
        });
        Some(pack(T::KIND, slot, 0))
    }

    pub fn get(&self, handle: u64) -> Option<&T> {
        let (slot, generation) = unpack(T::KIND, handle)?;
        self.entries
            .get(slot)
            .filter(|e| e.generation == generation)?
            .value
            .as_ref()
    }

    pub fn get_mut(&mut self, handle: u64) -> Option<&mut T> {
        let (slot, generation) = unpack(T::KIND, handle)?;
        self.entries
            .get_mut(slot)
            .filter(|e| e.generation == generation)?
            .value
            .as_mut()
    }

    /// Take the object out, invalidating every copy of `handle`.
    ///
    /// A slot whose generation wraps to 0 is retired for good, so a handle
    /// from its first use can never match again.
    pub fn remove(&mut self, handle: u64) -> Option<T> {
        let (slot, generation) = unpack(T::KIND, handle)?;
        let entry = self.entries.get_mut(slot).filter(|e| e.generation == generation)?;
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        if entry.generation != 0 {
            self.vacant.push(slot as u32);
        }
        Some(value)
    }
}
