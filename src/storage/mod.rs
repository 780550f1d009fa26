pub mod file_lock;
pub mod layout;

pub use file_lock::FileLock;
pub use layout::StorageLayout;
