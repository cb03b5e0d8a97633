pub mod cleanup;
pub mod sessions;
