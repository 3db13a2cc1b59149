pub const UNIFORM_DIMS: u32 = 0;
pub const STORAGE_PIXELS: u32 = 1;
pub const STORAGE_LOCK: u32 = 2; // atomic u32, zeroed before dispatch

pub const BIND_GROUP: u32 = 0;
pub const BINDING_COUNT: u32 = 3;

/// Size in bytes of the lock word.
pub const LOCK_SIZE: u64 = std::mem::size_of::<u32>() as u64;

const _: () = assert!(STORAGE_LOCK + 1 == BINDING_COUNT);
