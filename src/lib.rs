//! A threshold-protected password verification store.
//!
//! No password can be verified at all until a threshold `k` of correct passwords are presented
//! together in a single [`Store::unlock`] call — short of the optional few-bit isolated-check side
//! channel. An attacker who steals the persisted file alone learns essentially nothing about any
//! password until they already know enough of the real ones.
//!
//! ```no_run
//! use polyhasher::Store;
//!
//! let mut store = Store::new_fresh(3, 0)?;
//! store.create_account("alice", b"kitten", 1)?;
//! assert!(store.is_valid_login("alice", b"kitten")?);
//!
//! store.write_password_data("passwords.db")?;
//! # Ok::<(), polyhasher::Error>(())
//! ```

mod aes_ecb;
mod bytes;
mod codec;
mod error;
mod icb;
mod record;
mod secret;
mod share;
mod store;

pub use error::Error;
pub use store::Store;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

impl Store {
    /// Loads a locked store from a previously written file.
    ///
    /// `threshold` must match the value the store was created with; a mismatch is not detected
    /// here (the threshold is not part of the on-disk format) and instead surfaces as
    /// [`Error::BadUnlock`] during [`Store::unlock`]. `isolated_check_bits` must match the value
    /// stored in the file; a mismatch is rejected with [`Error::BadFormat`] since that much is
    /// locally checkable without needing an unlock.
    pub fn new_from_file<P: AsRef<Path>>(
        path: P,
        threshold: u8,
        isolated_check_bits: u8,
    ) -> Result<Store, Error> {
        let file = File::open(path)?;
        let loaded = codec::read(file)?;
        if loaded.isolated_check_bits != isolated_check_bits {
            return Err(Error::BadFormat);
        }
        Store::from_parts(threshold, isolated_check_bits, loaded.fingerprint, loaded.accounts)
    }

    /// Persists the locked subset of the store's state: the integrity fingerprint,
    /// isolated-check bits, and every account record. Never the shielded key or the share
    /// engine's internal polynomial.
    ///
    /// Fails with [`Error::UnderThreshold`] if fewer than `threshold + 1` protector shares have
    /// ever been allocated, since such a file could never be unlocked again.
    pub fn write_password_data<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        if !self.has_enough_shares_to_persist() {
            return Err(Error::UnderThreshold);
        }
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        codec::write(&mut writer, self.isolated_check_bits(), &self.fingerprint(), self.accounts())?;
        log::debug!("wrote password data (next_share={})", self.next_share());
        Ok(())
    }
}
