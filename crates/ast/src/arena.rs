use bumpalo::Bump;

/// Owns every node, token spelling and child list of one parsed file.
///
/// `Bump` is not `Sync`, so a tree never leaves the thread that built it;
/// multi-file analysis gives each worker its own arena.
#[derive(Debug, Default)]
pub struct AstArena {
    pub bump: Bump,
}

impl AstArena {
    pub fn new() -> Self {
        Self { bump: Bump::new() }
    }

    /// Copy a token spelling or file path into the arena
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Bytes held by the arena, child lists included
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}
