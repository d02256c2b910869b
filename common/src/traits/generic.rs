//! This module provides abstraction over things that can be trained and stored.

use std::path::Path;

use crate::{Listing, NcResult};

/// Something that might need training.
pub trait Trainable {
    /// This function gets used to provide new training data.
    /// Implementations may define failure conditions.
    /// # Default Implementation
    /// The default implementation ignores the input and always returns Ok(()).
    fn train<'i>(&mut self, _training_data: impl IntoIterator<Item = &'i Listing>) -> NcResult<()> {
        Ok(())
    }
}

/// Something whose trained state can be written to and restored from a snapshot.
/// Restoring must not need the original training data, and a restored instance must behave
/// exactly like the one that was saved.
pub trait Persistent {
    /// Encode the complete state into a self-describing snapshot.
    fn to_bytes(&self) -> NcResult<Vec<u8>>;

    /// Replace the complete state with the one from `bytes`.
    /// Fails with [NcError::CorruptModelError](crate::NcError::CorruptModelError) if the snapshot
    /// can not be decoded or was written for a different schema. On failure `self` is unchanged.
    fn restore_from_bytes(&mut self, bytes: &[u8]) -> NcResult<()>;

    /// Write the snapshot to a file at `path`, creating parent directories as needed.
    fn save<P: AsRef<Path>>(&self, path: P) -> NcResult<()> {
        let bytes = self.to_bytes()?;
        crate::util::write_bytes(&bytes, path)
    }

    /// Restore the state from the snapshot file at `path`.
    fn load<P: AsRef<Path>>(&mut self, path: P) -> NcResult<()> {
        let bytes = std::fs::read(path)?;
        self.restore_from_bytes(&bytes)
    }
}
