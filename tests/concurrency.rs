use std::sync::{Arc, Barrier};
use std::thread;

use notevault::store::MemoryStore;
use notevault::{decrypt, encrypt, encrypt_binary, Note, NoteVault, Principal, Sealer};

#[test]
fn test_parallel_encrypt_decrypt_is_independent() {
    let handles: Vec<_> = (0..8)
        .map(|i| {
            thread::spawn(move || {
                let passphrase = format!("user{i}:hash");
                let plaintext = format!("note from thread {i}");
                let token = encrypt(&plaintext, &passphrase).unwrap();
                assert_eq!(decrypt(&token, &passphrase).unwrap(), plaintext);
                token
            })
        })
        .collect();

    let mut tokens: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    tokens.sort();
    tokens.dedup();
    assert_eq!(tokens.len(), 8);
}

#[test]
fn test_parallel_binary_envelopes_never_share_salt_or_iv() {
    let handles: Vec<_> = (0..8)
        .map(|_| thread::spawn(|| encrypt_binary(b"same image", "alice:hash").unwrap()))
        .collect();
    let envelopes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    for (i, a) in envelopes.iter().enumerate() {
        for b in &envelopes[i + 1..] {
            assert_ne!(a.salt_hex, b.salt_hex);
            assert_ne!(a.iv_hex, b.iv_hex);
        }
    }
}

#[test]
fn test_shared_vault_across_threads() {
    let vault = Arc::new(NoteVault::new(MemoryStore::new(), Sealer::default()));
    let alice = Arc::new(Principal::new("alice", "hash"));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let vault = Arc::clone(&vault);
            let alice = Arc::clone(&alice);
            thread::spawn(move || {
                let id = format!("note-{i}");
                vault
                    .save(&id, &Note::new(format!("title {i}"), "body"), alice.as_ref())
                    .unwrap();
                vault.load(&id, alice.as_ref()).unwrap()
            })
        })
        .collect();

    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().unwrap().title, format!("title {i}"));
    }
    assert_eq!(vault.load_all(alice.as_ref()).len(), 4);
}

#[test]
fn test_concurrent_saves_of_one_new_note_all_succeed() {
    const WRITERS: usize = 4;
    let vault = Arc::new(NoteVault::new(MemoryStore::new(), Sealer::default()));
    let alice = Arc::new(Principal::new("alice", "hash"));
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let vault = Arc::clone(&vault);
            let alice = Arc::clone(&alice);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                vault.save("shared", &Note::new(format!("writer {i}"), "body"), alice.as_ref())
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap().unwrap();
    }
    let titles: Vec<String> = (0..WRITERS).map(|i| format!("writer {i}")).collect();
    let note = vault.load("shared", alice.as_ref()).unwrap();
    assert!(titles.contains(&note.title), "unexpected title {:?}", note.title);
    assert_eq!(vault.store().len(), 1);
}
