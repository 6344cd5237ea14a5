pub mod entry;
pub mod enumerator;
pub mod loader;
pub mod tree;

#[cfg(test)]
pub(crate) mod fake;
