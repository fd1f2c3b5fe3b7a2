//! Minimal example: one user's notes and images in memory.
//!
//! Run with: `RUST_LOG=notevault=debug cargo run --example note_vault_demo`
//!
//! - Alice logs in; her envelope passphrase is her login plus stored hash
//! - Notes and an image are sealed field by field
//! - A stranger's passphrase is rejected with a typed error, not a blank note
//! - A password change re-seals everything

use notevault::credentials::{hash_password, verify_password};
use notevault::store::MemoryStore;
use notevault::{ImageVault, Note, NoteVault, Principal, Sealer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "notevault=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    notevault::self_test()?;

    // 1. Account setup and login.
    let stored = hash_password("correct horse battery staple")?;
    assert!(verify_password("correct horse battery staple", &stored));
    let alice = Principal::new("alice", stored.to_string());

    // 2. Repositories.
    let notes = NoteVault::new(MemoryStore::new(), Sealer::default());
    let images = ImageVault::new(MemoryStore::new(), Sealer::default());

    notes.save("n1", &Note::new("Nouvelle note", "Acheter du pain"), &alice)?;
    images.upload("i1", "cat.png", &[0x89, b'P', b'N', b'G'], &alice)?;

    println!("note  : {:?}", notes.load("n1", &alice)?);
    println!("image : {} bytes", images.view("i1", &alice)?.len());

    // 3. Someone else tries.
    let mallory = Principal::new("mallory", "guess");
    match notes.load("n1", &mallory) {
        Ok(note) => println!("unexpected plaintext: {note:?}"),
        Err(e) => println!("mallory: could not decrypt ({e})"),
    }

    // 4. Password change.
    let rotated = Principal::new("alice", hash_password("new passphrase")?.to_string());
    let count = notes.rotate(&alice, &rotated)? + images.rotate(&alice, &rotated)?;
    println!("re-sealed {count} records");
    println!("note  : {:?}", notes.load("n1", &rotated)?);

    Ok(())
}
