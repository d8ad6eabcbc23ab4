use serde::{Deserialize, Serialize};

/// Generational handle to a rigid body. Stale handles fail lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyHandle {
    pub index: u32,
    pub generation: u32,
}

impl BodyHandle {
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

impl std::fmt::Display for BodyHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "B{}g{}", self.index, self.generation)
    }
}

pub(crate) struct BodyAllocator {
    generations: Vec<u32>,
    free_indices: Vec<u32>,
    next_index: u32,
}

impl BodyAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free_indices: Vec::new(),
            next_index: 0,
        }
    }

    pub fn allocate(&mut self) -> BodyHandle {
        if let Some(index) = self.free_indices.pop() {
            let generation = self.generations[index as usize];
            BodyHandle::new(index, generation)
        } else {
            let index = self.next_index;
            self.next_index += 1;
            self.generations.push(0);
            BodyHandle::new(index, 0)
        }
    }

    /// Returns false for handles that are already stale.
    pub fn deallocate(&mut self, handle: BodyHandle) -> bool {
        if self.is_alive(handle) {
            self.generations[handle.index as usize] += 1;
            self.free_indices.push(handle.index);
            true
        } else {
            false
        }
    }

    pub fn is_alive(&self, handle: BodyHandle) -> bool {
        (handle.index as usize) < self.generations.len()
            && self.generations[handle.index as usize] == handle.generation
    }

    /// Rebuild the live handle for a slot index.
    pub fn handle_at(&self, index: u32) -> Option<BodyHandle> {
        self.generations
            .get(index as usize)
            .map(|&generation| BodyHandle::new(index, generation))
    }
}

impl Default for BodyAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_and_deallocate() {
        let mut alloc = BodyAllocator::new();
        let b0 = alloc.allocate();
        assert_eq!(b0.index, 0);
        assert_eq!(b0.generation, 0);
        assert!(alloc.is_alive(b0));

        assert!(alloc.deallocate(b0));
        assert!(!alloc.is_alive(b0));
        assert!(!alloc.deallocate(b0));

        let reused = alloc.allocate();
        assert_eq!(reused.index, 0);
        assert_eq!(reused.generation, 1);
        assert!(alloc.is_alive(reused));
        assert!(!alloc.is_alive(b0));
    }
}
