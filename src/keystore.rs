//! Minimal JKS keystore support: enough to append trusted certificate entries to
//! a JVM `cacerts` file and re-seal it with the keystore password.

use sha1::{Digest, Sha1};

const MAGIC: u32 = 0xFEED_FEED;
const PRIVATE_KEY_TAG: u32 = 1;
const TRUSTED_CERT_TAG: u32 = 2;
const WHITENER: &[u8] = b"Mighty Aphrodite";
const DIGEST_LEN: usize = 20;

#[derive(thiserror::Error, Debug)]
pub enum KeystoreError {
    #[error("not a JKS keystore")]
    UnsupportedFormat,
    #[error("unsupported JKS version {0}")]
    UnsupportedVersion(u32),
    #[error("unsupported keystore entry type {0}")]
    UnsupportedEntry(u32),
    #[error("keystore is truncated")]
    Truncated,
    #[error("keystore was tampered with, or password was incorrect")]
    IntegrityCheckFailed,
}

#[derive(Debug)]
struct Entry {
    alias: String,
    encoded: Vec<u8>,
}

#[derive(Debug)]
pub(crate) struct JksKeystore {
    version: u32,
    entries: Vec<Entry>,
}

impl JksKeystore {
    pub(crate) fn parse(bytes: &[u8], password: &str) -> Result<Self, KeystoreError> {
        if bytes.len() < DIGEST_LEN {
            return Err(KeystoreError::Truncated);
        }
        let (body, digest) = bytes.split_at(bytes.len() - DIGEST_LEN);

        let mut reader = Reader { bytes: body, position: 0 };
        if reader.u32()? != MAGIC {
            return Err(KeystoreError::UnsupportedFormat);
        }
        let version = reader.u32()?;
        if version != 1 && version != 2 {
            return Err(KeystoreError::UnsupportedVersion(version));
        }

        if seal(password, body).as_slice() != digest {
            return Err(KeystoreError::IntegrityCheckFailed);
        }

        let count = reader.u32()?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let start = reader.position;
            let tag = reader.u32()?;
            let alias = String::from_utf8_lossy(reader.utf()?).into_owned();
            reader.u64()?;

            match tag {
                PRIVATE_KEY_TAG => {
                    let key_len = reader.u32()? as usize;
                    reader.take(key_len)?;
                    for _ in 0..reader.u32()? {
                        reader.certificate(version)?;
                    }
                }
                TRUSTED_CERT_TAG => {
                    reader.certificate(version)?;
                }
                other => return Err(KeystoreError::UnsupportedEntry(other)),
            }

            entries.push(Entry {
                alias,
                encoded: body[start..reader.position].to_vec(),
            });
        }

        Ok(JksKeystore { version, entries })
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains_alias(&self, alias: &str) -> bool {
        let alias = alias.to_lowercase();
        self.entries.iter().any(|entry| entry.alias == alias)
    }

    /// Adds a trusted certificate entry. Returns `false` when the alias is already taken.
    pub(crate) fn add_trusted_certificate(
        &mut self,
        alias: &str,
        timestamp_millis: u64,
        der: &[u8],
    ) -> bool {
        let alias = alias.to_lowercase();
        if self.contains_alias(&alias) {
            return false;
        }

        let mut encoded = Vec::with_capacity(der.len() + alias.len() + 32);
        encoded.extend_from_slice(&TRUSTED_CERT_TAG.to_be_bytes());
        write_utf(&mut encoded, &alias);
        encoded.extend_from_slice(&timestamp_millis.to_be_bytes());
        if self.version == 2 {
            write_utf(&mut encoded, "X.509");
        }
        encoded.extend_from_slice(&(der.len() as u32).to_be_bytes());
        encoded.extend_from_slice(der);

        self.entries.push(Entry { alias, encoded });
        true
    }

    pub(crate) fn to_bytes(&self, password: &str) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&MAGIC.to_be_bytes());
        body.extend_from_slice(&self.version.to_be_bytes());
        body.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());
        for entry in &self.entries {
            body.extend_from_slice(&entry.encoded);
        }

        let digest = seal(password, &body);
        body.extend_from_slice(&digest);
        body
    }
}

fn seal(password: &str, body: &[u8]) -> Vec<u8> {
    let mut hasher = Sha1::new();
    for unit in password.encode_utf16() {
        hasher.update(unit.to_be_bytes());
    }
    hasher.update(WHITENER);
    hasher.update(body);
    hasher.finalize().to_vec()
}

fn write_utf(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(&(value.len() as u16).to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], KeystoreError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(KeystoreError::Truncated)?;
        let slice = &self.bytes[self.position..end];
        self.position = end;
        Ok(slice)
    }

    fn u16(&mut self) -> Result<u16, KeystoreError> {
        let mut buf = [0; 2];
        buf.copy_from_slice(self.take(2)?);
        Ok(u16::from_be_bytes(buf))
    }

    fn u32(&mut self) -> Result<u32, KeystoreError> {
        let mut buf = [0; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    fn u64(&mut self) -> Result<u64, KeystoreError> {
        let mut buf = [0; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    fn utf(&mut self) -> Result<&'a [u8], KeystoreError> {
        let len = self.u16()? as usize;
        self.take(len)
    }

    fn certificate(&mut self, version: u32) -> Result<(), KeystoreError> {
        if version == 2 {
            self.utf()?;
        }
        let len = self.u32()? as usize;
        self.take(len)?;
        Ok(())
    }
}
