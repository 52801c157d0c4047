use fnv::FnvHashMap;

/// NUL-terminated buffer handed to the host by address.
///
/// The heap block never moves while this value is alive, and dropping it frees the block.
/// Raw addresses only leave this type through [`ForeignString::as_ptr`].
pub struct ForeignString {
    buf: Box<[u8]>
}

impl ForeignString {
    /// `None` unless `bytes` ends with its terminator.
    pub fn new(bytes: Vec<u8>) -> Option<ForeignString> {
        if bytes.last() != Some(&0) {
            return None;
        }

        Some(ForeignString {
            buf: bytes.into_boxed_slice()
        })
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.buf.as_ptr()
    }
}

/// One live buffer per node id.
///
/// Replacing a slot installs the new pointer before the old buffer is dropped, so the
/// host never holds a freed address between the two steps.
#[derive(Default)]
pub struct StringArena {
    slots: FnvHashMap<u32, ForeignString>
}

impl StringArena {
    pub fn new() -> StringArena {
        StringArena::default()
    }

    /// Stores `string` for `node_id`, calls `install` with its address, then frees whatever
    /// the slot held before.
    pub fn set(&mut self, node_id: u32, string: ForeignString, install: impl FnOnce(*const u8)) -> *const u8 {
        let ptr = string.as_ptr();
        install(ptr);

        if let Some(prev) = self.slots.insert(node_id, string) {
            trace!("Releasing previous buffer for node {} ({} bytes)", node_id, prev.buf.len());
        }
        ptr
    }

    pub fn get(&self, node_id: u32) -> Option<&ForeignString> {
        self.slots.get(&node_id)
    }

    /// Whether `ptr` is the buffer currently held for `node_id`.
    pub fn owns(&self, node_id: u32, ptr: *const u8) -> bool {
        self.get(node_id).is_some_and(|s| s.as_ptr() == ptr)
    }

    pub fn release(&mut self, node_id: u32) -> bool {
        self.slots.remove(&node_id).is_some()
    }

    /// Frees every buffer. Safe to call any number of times.
    pub fn release_all(&mut self) -> usize {
        let count = self.slots.len();
        self.slots.clear();
        if count != 0 {
            debug!("Released {} node text buffer(s)", count);
        }
        count
    }

    pub fn live_count(&self) -> usize {
        self.slots.len()
    }
}
