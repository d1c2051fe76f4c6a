use crate::types::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyFlags {
    pub readable: bool,
    pub writable: bool,
    /// Belongs to the type, not to each instance.
    pub is_static: bool,
    /// Local to one executing thread.
    pub scoped: bool,
}

impl Default for PropertyFlags {
    fn default() -> Self {
        Self {
            readable: true,
            writable: true,
            is_static: false,
            scoped: false,
        }
    }
}

impl PropertyFlags {
    pub fn read_only() -> Self {
        Self {
            writable: false,
            ..Self::default()
        }
    }

    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_scoped(mut self) -> Self {
        self.scoped = true;
        self
    }
}

/// Identifies one storage location. Equality covers key, type and flags.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryProperty {
    key: String,
    type_ref: TypeRef,
    flags: PropertyFlags,
}

impl MemoryProperty {
    pub fn new(key: impl Into<String>, type_ref: TypeRef) -> Self {
        Self::with_flags(key, type_ref, PropertyFlags::default())
    }

    pub fn with_flags(key: impl Into<String>, type_ref: TypeRef, flags: PropertyFlags) -> Self {
        Self {
            key: key.into(),
            type_ref,
            flags,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn flags(&self) -> PropertyFlags {
        self.flags
    }

    pub fn is_readable(&self) -> bool {
        self.flags.readable
    }

    pub fn is_writable(&self) -> bool {
        self.flags.writable
    }
}
