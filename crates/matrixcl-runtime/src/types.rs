//! Handles and device descriptions exchanged with a runtime

use std::fmt;

macro_rules! handle_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        impl $name {
            /// Create a handle from a raw runtime id
            pub const fn new(id: u64) -> Self {
                $name(id)
            }

            /// Raw runtime id
            pub const fn id(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

handle_type!(
    /// Opaque handle to a device execution context
    ContextHandle,
    "ctx"
);

handle_type!(
    /// Opaque handle to a device memory allocation
    ///
    /// This is the value a kernel-dispatch layer binds as a kernel argument.
    BufferHandle,
    "buf"
);

handle_type!(
    /// Opaque handle to a built program
    ProgramHandle,
    "prog"
);

/// Identifier of a compute device within its runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device{}", self.0)
    }
}

/// Static description of the device behind a runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub name: String,
    /// Total device memory in bytes
    pub global_mem_bytes: usize,
    /// Largest single allocation in bytes
    pub max_alloc_bytes: usize,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({} MiB global, {} MiB max alloc)",
            self.name,
            self.id,
            self.global_mem_bytes / (1024 * 1024),
            self.max_alloc_bytes / (1024 * 1024)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_display_with_prefix() {
        assert_eq!(ContextHandle::new(3).to_string(), "ctx3");
        assert_eq!(BufferHandle::new(12).to_string(), "buf12");
        assert_eq!(ProgramHandle::new(1).to_string(), "prog1");
        assert_eq!(DeviceId(0).to_string(), "device0");
    }

    #[test]
    fn handle_ids_round_trip() {
        let handle = BufferHandle::new(42);
        assert_eq!(handle.id(), 42);
        assert_eq!(handle, BufferHandle(42));
    }

    #[test]
    fn device_info_display() {
        let info = DeviceInfo {
            id: DeviceId(1),
            name: "test".into(),
            global_mem_bytes: 64 * 1024 * 1024,
            max_alloc_bytes: 16 * 1024 * 1024,
        };
        assert_eq!(info.to_string(), "test [device1] (64 MiB global, 16 MiB max alloc)");
    }
}
