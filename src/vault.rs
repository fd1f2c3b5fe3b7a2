//! Note and image repositories.
//!
//! Envelopes are applied at field granularity: a note's title and content
//! are sealed independently, an image's bytes go into one binary envelope.
//! Plaintext exists only between the store and the caller of these methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::binary::BinaryEnvelope;
use crate::error::EnvelopeError;
use crate::passphrase::PassphraseProvider;
use crate::sealer::Sealer;
use crate::store::RecordStore;

/// A decrypted note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub title: String,
    pub content: String,
}

impl Note {
    /// A plaintext note with the given title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }
}

/// A note as persisted: both text fields are envelope tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedNote {
    /// Text envelope of the title.
    pub title: String,
    /// Text envelope of the content.
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An image as persisted. The name is plain metadata; the bytes are sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedImage {
    pub name: String,
    pub data: BinaryEnvelope,
    pub uploaded_at: DateTime<Utc>,
}

/// Notes for one store, sealed with one `Sealer`.
pub struct NoteVault<S> {
    store: S,
    sealer: Sealer,
}

impl<S: RecordStore<EncryptedNote>> NoteVault<S> {
    /// A vault writing to `store` with envelopes from `sealer`.
    pub fn new(store: S, sealer: Sealer) -> Self {
        Self { store, sealer }
    }

    /// The underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypt and write a note, creating it or replacing its fields.
    ///
    /// Concurrent saves of the same id all succeed; the last write wins and
    /// the first `created_at` is kept.
    pub fn save(
        &self,
        id: &str,
        note: &Note,
        owner: &dyn PassphraseProvider,
    ) -> Result<(), EnvelopeError> {
        let passphrase = owner.passphrase();
        let now = Utc::now();
        let record = EncryptedNote {
            title: self.sealer.seal_text(&note.title, passphrase.expose())?,
            content: self.sealer.seal_text(&note.content, passphrase.expose())?,
            created_at: now,
            updated_at: now,
        };

        if let Some(existing) = self.store.get(id) {
            return self.replace(id, record, existing.created_at);
        }
        match self.store.insert(id, record.clone()) {
            Ok(()) => {
                debug!(id, "note created");
                Ok(())
            }
            // Another writer created the note between `get` and `insert`.
            Err(EnvelopeError::RecordExists(_)) => {
                let created_at = self.store.get(id).map_or(now, |r| r.created_at);
                self.replace(id, record, created_at)
            }
            Err(e) => Err(e),
        }
    }

    fn replace(
        &self,
        id: &str,
        record: EncryptedNote,
        created_at: DateTime<Utc>,
    ) -> Result<(), EnvelopeError> {
        self.store.update(
            id,
            EncryptedNote {
                created_at,
                ..record
            },
        )?;
        debug!(id, "note updated");
        Ok(())
    }

    /// Read and decrypt one note.
    pub fn load(&self, id: &str, owner: &dyn PassphraseProvider) -> Result<Note, EnvelopeError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| EnvelopeError::RecordNotFound(id.to_string()))?;
        self.open(&record, owner)
    }

    /// Read and decrypt every note. A record that fails to decrypt is
    /// reported in place rather than hiding the rest.
    pub fn load_all(
        &self,
        owner: &dyn PassphraseProvider,
    ) -> Vec<(String, Result<Note, EnvelopeError>)> {
        self.store
            .keys()
            .into_iter()
            .filter_map(|id| {
                let record = self.store.get(&id)?;
                let note = self.open(&record, owner);
                if let Err(e) = &note {
                    warn!(id = %id, error = %e, "note could not be decrypted");
                }
                Some((id, note))
            })
            .collect()
    }

    /// Delete a note together with its envelopes.
    pub fn delete(&self, id: &str) -> Result<(), EnvelopeError> {
        self.store.delete(id)?;
        debug!(id, "note deleted");
        Ok(())
    }

    /// Re-seal every note under a new passphrase, e.g. after a password
    /// change.
    ///
    /// Every note is opened with `from` and re-sealed with `to` before the
    /// first write, so a wrong passphrase or a sealing failure changes
    /// nothing. If a write fails, notes already rewritten are restored to
    /// their previous envelopes; any that cannot be restored are named in
    /// `RotationIncomplete`.
    ///
    /// Needs exclusive access to the store: a `save` that lands during
    /// rotation may be overwritten with the note's earlier content.
    pub fn rotate(
        &self,
        from: &dyn PassphraseProvider,
        to: &dyn PassphraseProvider,
    ) -> Result<usize, EnvelopeError> {
        let originals: Vec<(String, EncryptedNote)> = snapshot(&self.store);
        let passphrase = to.passphrase();
        let now = Utc::now();
        let resealed = originals
            .iter()
            .map(|(_, record)| -> Result<_, EnvelopeError> {
                let note = self.open(record, from)?;
                Ok(EncryptedNote {
                    title: self.sealer.seal_text(&note.title, passphrase.expose())?,
                    content: self.sealer.seal_text(&note.content, passphrase.expose())?,
                    created_at: record.created_at,
                    updated_at: now,
                })
            })
            .collect::<Result<Vec<_>, EnvelopeError>>()?;

        write_rotated(&self.store, &originals, resealed)?;
        info!(count = originals.len(), "notes re-sealed under new passphrase");
        Ok(originals.len())
    }

    fn open(
        &self,
        record: &EncryptedNote,
        owner: &dyn PassphraseProvider,
    ) -> Result<Note, EnvelopeError> {
        let passphrase = owner.passphrase();
        Ok(Note {
            title: self.sealer.open_text(&record.title, passphrase.expose())?,
            content: self.sealer.open_text(&record.content, passphrase.expose())?,
        })
    }
}

/// Images for one store, sealed with one `Sealer`.
pub struct ImageVault<S> {
    store: S,
    sealer: Sealer,
}

impl<S: RecordStore<EncryptedImage>> ImageVault<S> {
    /// A vault writing to `store` with envelopes from `sealer`.
    pub fn new(store: S, sealer: Sealer) -> Self {
        Self { store, sealer }
    }

    /// The underlying record store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Encrypt and store a new image.
    pub fn upload(
        &self,
        id: &str,
        name: &str,
        bytes: &[u8],
        owner: &dyn PassphraseProvider,
    ) -> Result<(), EnvelopeError> {
        let data = self.sealer.seal_binary(bytes, owner.passphrase().expose())?;
        self.store.insert(
            id,
            EncryptedImage {
                name: name.to_string(),
                data,
                uploaded_at: Utc::now(),
            },
        )?;
        debug!(id, size = bytes.len(), "image uploaded");
        Ok(())
    }

    /// Decrypt an image's bytes for viewing.
    pub fn view(
        &self,
        id: &str,
        owner: &dyn PassphraseProvider,
    ) -> Result<Vec<u8>, EnvelopeError> {
        let record = self
            .store
            .get(id)
            .ok_or_else(|| EnvelopeError::RecordNotFound(id.to_string()))?;
        self.sealer
            .open_binary(&record.data, owner.passphrase().expose())
            .inspect_err(|e| warn!(id, error = %e, "image could not be decrypted"))
    }

    /// Delete an image together with its envelope.
    pub fn delete(&self, id: &str) -> Result<(), EnvelopeError> {
        self.store.delete(id)?;
        debug!(id, "image deleted");
        Ok(())
    }

    /// Re-seal every image under a new passphrase. Same guarantees and
    /// the same exclusive-access requirement as [`NoteVault::rotate`].
    pub fn rotate(
        &self,
        from: &dyn PassphraseProvider,
        to: &dyn PassphraseProvider,
    ) -> Result<usize, EnvelopeError> {
        let originals: Vec<(String, EncryptedImage)> = snapshot(&self.store);
        let old = from.passphrase();
        let new = to.passphrase();
        let resealed = originals
            .iter()
            .map(|(_, record)| -> Result<_, EnvelopeError> {
                let bytes = self.sealer.open_binary(&record.data, old.expose())?;
                Ok(EncryptedImage {
                    data: self.sealer.seal_binary(&bytes, new.expose())?,
                    ..record.clone()
                })
            })
            .collect::<Result<Vec<_>, EnvelopeError>>()?;

        write_rotated(&self.store, &originals, resealed)?;
        info!(count = originals.len(), "images re-sealed under new passphrase");
        Ok(originals.len())
    }
}

// ---------------------------------------------------------------------------
// Rotation writes
// ---------------------------------------------------------------------------

fn snapshot<R, S: RecordStore<R>>(store: &S) -> Vec<(String, R)> {
    store
        .keys()
        .into_iter()
        .filter_map(|id| store.get(&id).map(|record| (id, record)))
        .collect()
}

/// Write `rotated[i]` over `originals[i]` in order. On the first failed
/// write, put back the originals of every record already written and return
/// that write's error.
fn write_rotated<R: Clone, S: RecordStore<R>>(
    store: &S,
    originals: &[(String, R)],
    rotated: Vec<R>,
) -> Result<(), EnvelopeError> {
    for (written, ((id, _), record)) in originals.iter().zip(rotated).enumerate() {
        if let Err(e) = store.update(id, record) {
            warn!(id = %id, error = %e, written, "rotation write failed, restoring");

            let mut stranded = Vec::new();
            for (id, original) in &originals[..written] {
                if let Err(restore) = store.update(id, original.clone()) {
                    warn!(id = %id, error = %restore, "could not restore record");
                    stranded.push(id.clone());
                }
            }
            return if stranded.is_empty() {
                Err(e)
            } else {
                Err(EnvelopeError::RotationIncomplete(stranded))
            };
        }
    }
    Ok(())
}
