// SPDX-License-Identifier: AGPL-3.0-or-later

//! The identity registry: Ed25519 key pairs stored under local aliases.
use log::debug;

use baobab_core::base62;
use baobab_core::identity::PrivateKey;

use crate::error::StoreError;
use crate::spool::IdentityRow;
use crate::store::Store;

/// Which half of a key pair to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHalf {
    Secret,
    Public,
}

impl Store {
    /// Stores a key pair under `alias` and returns the Base62 identifier of
    /// its public key.
    ///
    /// `secret` may be 32 raw key bytes, a 43-character Base62 string, or
    /// absent to draw a fresh key from the system CSPRNG. An existing alias
    /// is overwritten; recreating one from the same secret yields the same
    /// identifier.
    pub fn create_identity(&self, alias: &str, secret: Option<&[u8]>) -> Result<String, StoreError> {
        validate_alias(alias)?;

        let private_key = match secret {
            None => PrivateKey::new(),
            Some(bytes) if bytes.len() == 32 => PrivateKey::from_bytes(bytes)?,
            Some(bytes) => {
                let encoded = std::str::from_utf8(bytes).ok().filter(|encoded| {
                    encoded.len() == base62::KEY_CHARS
                });
                match encoded {
                    Some(encoded) => {
                        let key = base62::decode_key(encoded)
                            .map_err(|err| StoreError::ImproperArguments(err.to_string()))?;
                        PrivateKey::from_bytes(&key)?
                    }
                    None => {
                        return Err(StoreError::ImproperArguments(
                            "secret must be 32 raw bytes or a 43-character base62 string"
                                .to_string(),
                        ))
                    }
                }
            }
        };

        let public = private_key.public_key();
        self.spool().identity_put(
            alias,
            &IdentityRow {
                secret: private_key.to_bytes(),
                public: public.to_bytes(),
            },
        )?;

        debug!("created identity {} as {}", alias, public);
        Ok(public.to_base62())
    }

    /// Raw bytes of one half of the key pair stored under `alias`.
    pub fn identity_key(&self, alias: &str, half: KeyHalf) -> Result<[u8; 32], StoreError> {
        let row = self
            .spool()
            .identity_get(alias)?
            .ok_or(StoreError::NotFound)?;

        Ok(match half {
            KeyHalf::Secret => row.secret,
            KeyHalf::Public => row.public,
        })
    }

    /// All identities as `(alias, base62_identifier)` pairs, sorted by alias.
    pub fn identities(&self) -> Result<Vec<(String, String)>, StoreError> {
        Ok(self
            .spool()
            .identity_fold()?
            .into_iter()
            .map(|(alias, row)| (alias, base62::encode_key(&row.public)))
            .collect())
    }

    /// Moves a key pair to a new alias, returning its Base62 identifier.
    pub fn rename_identity(&self, old: &str, new: &str) -> Result<String, StoreError> {
        validate_alias(new)?;
        let row = self
            .spool()
            .identity_get(old)?
            .ok_or_else(|| StoreError::UnknownIdentity(old.to_string()))?;

        let identifier = base62::encode_key(&row.public);
        self.spool().identity_put(new, &row)?;
        if old != new {
            self.spool().identity_delete(old)?;
        }
        Ok(identifier)
    }

    /// Forgets the key pair stored under `alias`.
    pub fn drop_identity(&self, alias: &str) -> Result<(), StoreError> {
        match self.spool().identity_delete(alias)? {
            true => Ok(()),
            false => Err(StoreError::UnknownIdentity(alias.to_string())),
        }
    }

    /// Canonicalises any author reference to its Base62 identifier.
    ///
    /// Accepts 32 raw key bytes, a 43-character Base62 identifier, a known
    /// alias, or `~prefix` matching exactly one identifier.
    pub fn as_base62(&self, identity: &[u8]) -> Result<String, StoreError> {
        if identity.len() == 32 {
            let key: [u8; 32] = identity.try_into().expect("length checked above");
            return Ok(base62::encode_key(&key));
        }

        let text = std::str::from_utf8(identity).map_err(|_| {
            StoreError::ImproperArguments(
                "identity reference must be 32 raw bytes or a utf-8 string".to_string(),
            )
        })?;
        self.resolve(text)
    }

    /// String form of [`Store::as_base62`].
    pub fn resolve(&self, identity: &str) -> Result<String, StoreError> {
        if identity.len() == base62::KEY_CHARS && base62::decode_key(identity).is_ok() {
            return Ok(identity.to_string());
        }

        if let Some(prefix) = identity.strip_prefix('~') {
            let mut matches: Vec<String> = self
                .identities()?
                .into_iter()
                .map(|(_, identifier)| identifier)
                .filter(|identifier| identifier.starts_with(prefix))
                .collect();
            // Two aliases may share a key pair; that is still one identity
            matches.sort();
            matches.dedup();

            return match matches.len() {
                1 => Ok(matches.remove(0)),
                _ => Err(StoreError::UnknownIdentity(identity.to_string())),
            };
        }

        match self.spool().identity_get(identity)? {
            Some(row) => Ok(base62::encode_key(&row.public)),
            None => Err(StoreError::UnknownIdentity(identity.to_string())),
        }
    }

    /// The signing key stored under `alias`.
    pub(crate) fn signing_key(&self, alias: &str) -> Result<PrivateKey, StoreError> {
        let row = self
            .spool()
            .identity_get(alias)?
            .ok_or_else(|| StoreError::UnknownIdentity(alias.to_string()))?;
        Ok(PrivateKey::from_bytes(&row.secret)?)
    }
}

fn validate_alias(alias: &str) -> Result<(), StoreError> {
    if alias.is_empty() {
        return Err(StoreError::ImproperArguments(
            "alias must be a non-empty string".to_string(),
        ));
    }
    Ok(())
}
