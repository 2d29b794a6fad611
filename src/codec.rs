//! The persisted file format: a deterministic byte stream carrying the integrity fingerprint,
//! isolated-check bits, and the account map. Never the shielded key, never the share engine's
//! polynomial coefficients, never a flag saying whether the secret is known.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::Error;
use crate::record::{AccountRecord, SALT_LEN};
use crate::secret::Fingerprint;

/// The only format tag this crate understands. Bumped if the byte layout ever changes.
const FORMAT_VERSION: u8 = 0x01;

pub(crate) struct Loaded {
    pub isolated_check_bits: u8,
    pub fingerprint: Fingerprint,
    pub accounts: BTreeMap<String, Vec<AccountRecord>>,
}

pub(crate) fn write<W: Write>(
    mut out: W,
    isolated_check_bits: u8,
    fingerprint: &Fingerprint,
    accounts: &BTreeMap<String, Vec<AccountRecord>>,
) -> Result<(), Error> {
    out.write_u8(FORMAT_VERSION)?;
    out.write_u8(isolated_check_bits)?;
    out.write_all(fingerprint)?;

    out.write_u32::<LittleEndian>(accounts.len() as u32)?;
    for (username, records) in accounts {
        let username_bytes = username.as_bytes();
        out.write_u16::<LittleEndian>(username_bytes.len() as u16)?;
        out.write_all(username_bytes)?;

        out.write_u8(records.len() as u8)?;
        for record in records {
            // The format's share number field is a signed byte; reinterpret our unsigned domain
            // (bootstrap=255, shielded=0, protector=1..=254) as its two's-complement bit pattern,
            // e.g. 255 round-trips as -1 and 200 as -56.
            out.write_i8(record.share_number as i8)?;
            out.write_all(&record.salt)?;
            out.write_u16::<LittleEndian>(record.passhash.len() as u16)?;
            out.write_all(&record.passhash)?;
        }
    }
    Ok(())
}

pub(crate) fn read<R: Read>(mut input: R) -> Result<Loaded, Error> {
    let version = input.read_u8()?;
    if version != FORMAT_VERSION {
        return Err(Error::BadFormat);
    }
    let isolated_check_bits = input.read_u8()?;

    let mut fingerprint = [0u8; 32];
    input.read_exact(&mut fingerprint)?;

    let account_count = input.read_u32::<LittleEndian>()?;
    let mut accounts = BTreeMap::new();
    for _ in 0..account_count {
        let username_len = input.read_u16::<LittleEndian>()? as usize;
        let mut username_bytes = vec![0u8; username_len];
        input.read_exact(&mut username_bytes)?;
        let username = String::from_utf8(username_bytes).map_err(|_| Error::BadFormat)?;

        let record_count = input.read_u8()?;
        let mut records = Vec::with_capacity(record_count as usize);
        for _ in 0..record_count {
            let share_number = input.read_i8()? as u8;
            let mut salt = [0u8; SALT_LEN];
            input.read_exact(&mut salt)?;
            let passhash_len = input.read_u16::<LittleEndian>()? as usize;
            let mut passhash = vec![0u8; passhash_len];
            input.read_exact(&mut passhash)?;
            records.push(AccountRecord { share_number, salt, passhash });
        }
        accounts.insert(username, records);
    }

    Ok(Loaded { isolated_check_bits, fingerprint, accounts })
}
