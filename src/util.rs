//! Shared utility modules used across Tiffin components.

pub mod fs;
