//! Async filesystem helpers re-exported from the underlying runtime.

pub use tokio::fs::{
    create_dir_all, metadata, read, remove_file, rename, try_exists, write, File, OpenOptions,
};
