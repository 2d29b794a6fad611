//! The account store: lifecycle state, the account map, and the three core operations
//! (`create_account`, `is_valid_login`, `unlock`).

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use zeroize::Zeroize;

use crate::bytes::{ct_eq, xor};
use crate::error::Error;
use crate::icb;
use crate::record::{AccountRecord, BOOTSTRAP_SHARE, SALT_LEN, SHIELDED_SHARE};
use crate::secret::{create_secret, verify_secret, Fingerprint, Secret};
use crate::share::ShareEngine;

/// A `(username, record index)` reference into a locked store's account map, recording where a
/// bootstrap record lives so it can be re-encoded by index on unlock. Replaces the cyclic
/// back-references of the construction this is modeled on.
type BootstrapRef = (String, usize);

/// The store's lifecycle state. Locked and unlocked are mutually exclusive: a locked store has no
/// shielded key or share engine to speak of, and an unlocked one has no bootstrap ledger left to
/// replay.
enum State {
    Locked { bootstrap_ledger: Vec<BootstrapRef> },
    Unlocked { shielded_key: Secret, share_engine: ShareEngine },
}

/// The in-memory store. Construct via [`Store::new_fresh`] or [`Store::new_from_file`]; see
/// [`crate`] for the facade that also wires up persistence.
pub struct Store {
    threshold: u8,
    isolated_check_bits: u8,
    next_share: u16,
    accounts: BTreeMap<String, Vec<AccountRecord>>,
    fingerprint: Fingerprint,
    state: State,
}

fn salted_hash(salt: &[u8; SALT_LEN], password: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password);
    hasher.finalize().into()
}

fn random_salt() -> [u8; SALT_LEN] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

impl Store {
    /// Creates a fresh store: a new random secret and fingerprint, no accounts, unlocked from the
    /// start.
    pub fn new_fresh(threshold: u8, isolated_check_bits: u8) -> Result<Self, Error> {
        validate_params(threshold, isolated_check_bits)?;
        let (secret, fingerprint) = create_secret();
        let share_engine = ShareEngine::new_unlocked(threshold, secret.as_bytes());
        log::debug!("created fresh store (k={threshold}, b={isolated_check_bits})");
        Ok(Store {
            threshold,
            isolated_check_bits,
            next_share: 1,
            accounts: BTreeMap::new(),
            fingerprint,
            state: State::Unlocked { shielded_key: secret, share_engine },
        })
    }

    /// Rebuilds a locked store from its parsed-out parts: the fingerprint, isolated-check bits,
    /// and the account map. `next_share` is recomputed as one more than the greatest protector
    /// share number found, clamped to 255 when no protector records exist.
    pub(crate) fn from_parts(
        threshold: u8,
        isolated_check_bits: u8,
        fingerprint: Fingerprint,
        accounts: BTreeMap<String, Vec<AccountRecord>>,
    ) -> Result<Self, Error> {
        validate_params(threshold, isolated_check_bits)?;

        let mut next_share: u16 = 1;
        let mut bootstrap_ledger = Vec::new();
        for (username, records) in &accounts {
            for (index, record) in records.iter().enumerate() {
                if record.is_bootstrap() {
                    bootstrap_ledger.push((username.clone(), index));
                } else if let Some(sn) = record.protector_share() {
                    next_share = next_share.max(sn as u16 + 1);
                }
            }
        }
        next_share = next_share.min(255);

        log::debug!(
            "loaded locked store (k={threshold}, b={isolated_check_bits}, {} users, {} bootstrap)",
            accounts.len(),
            bootstrap_ledger.len()
        );
        Ok(Store {
            threshold,
            isolated_check_bits,
            next_share,
            accounts,
            fingerprint,
            state: State::Locked { bootstrap_ledger },
        })
    }

    pub fn isolated_check_bits(&self) -> u8 {
        self.isolated_check_bits
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub(crate) fn accounts(&self) -> &BTreeMap<String, Vec<AccountRecord>> {
        &self.accounts
    }

    pub(crate) fn next_share(&self) -> u16 {
        self.next_share
    }

    /// `write_password_data` is only meaningful once enough protector shares exist to recover the
    /// secret later; this mirrors that precondition for callers that want to check before writing.
    pub(crate) fn has_enough_shares_to_persist(&self) -> bool {
        self.next_share > self.threshold as u16
    }

    pub fn create_account(&mut self, username: &str, password: &[u8], shares: u8) -> Result<(), Error> {
        if self.accounts.contains_key(username) {
            return Err(Error::DuplicateUser);
        }
        if self.next_share as u16 + shares as u16 > 255 {
            return Err(Error::ShareExhausted);
        }

        let records = match (&self.state, shares) {
            (State::Locked { .. }, 0) => {
                let salt = random_salt();
                let h = salted_hash(&salt, password);
                vec![AccountRecord {
                    share_number: BOOTSTRAP_SHARE,
                    salt,
                    passhash: h.to_vec(),
                }]
            }
            (State::Locked { .. }, _) => return Err(Error::BootstrapOnly),
            (State::Unlocked { shielded_key, .. }, 0) => {
                let salt = random_salt();
                let h = salted_hash(&salt, password);
                let core = crate::aes_ecb::encrypt(shielded_key.as_bytes(), &h);
                let mut passhash = core.to_vec();
                passhash.extend_from_slice(&icb::compute(&h, self.isolated_check_bits));
                vec![AccountRecord {
                    share_number: SHIELDED_SHARE,
                    salt,
                    passhash,
                }]
            }
            (State::Unlocked { share_engine, .. }, shares) => {
                let start = self.next_share as u8;
                let mut records = Vec::with_capacity(shares as usize);
                for offset in 0..shares {
                    let x = start + offset;
                    let salt = random_salt();
                    let h = salted_hash(&salt, password);
                    let share_bytes = share_engine
                        .compute_share(x)
                        .expect("share engine is unlocked in this branch");
                    let mut passhash = xor(&h, &share_bytes);
                    passhash.extend_from_slice(&icb::compute(&h, self.isolated_check_bits));
                    records.push(AccountRecord {
                        share_number: x,
                        salt,
                        passhash,
                    });
                }
                records
            }
        };

        let is_bootstrap = matches!(self.state, State::Locked { .. });
        self.accounts.insert(username.to_string(), records);
        if is_bootstrap {
            if let State::Locked { bootstrap_ledger } = &mut self.state {
                bootstrap_ledger.push((username.to_string(), 0));
            }
        } else if shares > 0 {
            self.next_share += shares as u16;
        }
        log::debug!("created account {username:?} ({shares} share(s))");
        Ok(())
    }

    pub fn is_valid_login(&self, username: &str, password: &[u8]) -> Result<bool, Error> {
        if matches!(self.state, State::Locked { .. }) && self.isolated_check_bits == 0 {
            return Err(Error::StillBootstrapping);
        }
        let records = self.accounts.get(username).ok_or(Error::UnknownUser)?;

        for record in records {
            let h = salted_hash(&record.salt, password);

            if record.is_bootstrap() {
                return Ok(ct_eq(&h, &record.passhash));
            }

            match &self.state {
                State::Locked { .. } => {
                    let icb = icb::compute(&h, self.isolated_check_bits);
                    return Ok(ct_eq(&icb, record.icb_suffix()));
                }
                State::Unlocked { shielded_key, share_engine } => {
                    let core = record.core();
                    let icb_match = ct_eq(&icb::compute(&h, self.isolated_check_bits), record.icb_suffix());
                    let valid = if record.is_shielded() {
                        ct_eq(&crate::aes_ecb::encrypt(shielded_key.as_bytes(), &h), core)
                    } else {
                        let share_number =
                            record.protector_share().expect("classified neither bootstrap nor shielded above");
                        let candidate = xor(&h, core);
                        let mut candidate_arr = [0u8; 32];
                        candidate_arr.copy_from_slice(&candidate);
                        share_engine.is_valid_share(share_number, &candidate_arr)
                    };
                    if valid {
                        return Ok(true);
                    }
                    if icb_match {
                        log::warn!("break-in suspected: ICB matched but full verification failed for {username:?}");
                    }
                }
            }
        }
        Ok(false)
    }

    pub fn unlock(&mut self, logins: &[(String, Vec<u8>)]) -> Result<(), Error> {
        let bootstrap_ledger = match &self.state {
            State::Unlocked { .. } => return Err(Error::AlreadyUnlocked),
            State::Locked { bootstrap_ledger } => bootstrap_ledger.clone(),
        };

        let mut candidate_shares: Vec<(u8, [u8; 32])> = Vec::new();
        for (username, password) in logins {
            let records = self.accounts.get(username).ok_or(Error::UnknownUser)?;
            for record in records {
                if record.is_bootstrap() || record.is_shielded() {
                    continue;
                }
                let h = salted_hash(&record.salt, password);
                let candidate = xor(&h, record.core());
                let mut arr = [0u8; 32];
                arr.copy_from_slice(&candidate);
                let share_number = record.protector_share().expect("protector record");
                candidate_shares.push((share_number, arr));
            }
        }

        let mut engine = ShareEngine::new_locked(self.threshold);
        let mut recovered = engine.recover_secretdata(&candidate_shares)?;

        if !verify_secret(&recovered, &self.fingerprint) {
            recovered.zeroize();
            return Err(Error::BadUnlock);
        }
        let shielded_key = Secret(recovered);
        recovered.zeroize();

        for (username, index) in &bootstrap_ledger {
            let record = self
                .accounts
                .get_mut(username)
                .and_then(|records| records.get_mut(*index))
                .expect("bootstrap ledger entries reference existing records");
            let mut old_hash = [0u8; 32];
            old_hash.copy_from_slice(&record.passhash);
            let core = crate::aes_ecb::encrypt(shielded_key.as_bytes(), &old_hash);
            let mut new_passhash = core.to_vec();
            new_passhash.extend_from_slice(&icb::compute(&old_hash, self.isolated_check_bits));
            record.share_number = SHIELDED_SHARE;
            record.passhash = new_passhash;
        }

        self.state = State::Unlocked { shielded_key, share_engine: engine };
        log::debug!("store unlocked ({} bootstrap record(s) re-encoded)", bootstrap_ledger.len());
        Ok(())
    }
}

fn validate_params(threshold: u8, isolated_check_bits: u8) -> Result<(), Error> {
    if threshold == 0 {
        return Err(Error::ShareExhausted);
    }
    if isolated_check_bits > crate::icb::MAX_ICB_BYTES {
        return Err(Error::ShareExhausted);
    }
    Ok(())
}
