//! Cost of sealing and opening one field.
//!
//! PBKDF2 runs once per operation, so payload size barely moves the numbers
//! until images get large. Run with: `cargo bench --bench envelope_benchmark`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use notevault::{decrypt, decrypt_binary, encrypt, encrypt_binary};

const PASSPHRASE: &str = "alice:hash";

fn bench_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("text_envelope");
    group.sample_size(20);

    let note = "Nouvelle note ".repeat(64);
    let token = encrypt(&note, PASSPHRASE).unwrap();

    group.bench_function("encrypt_900B", |b| {
        b.iter(|| encrypt(black_box(&note), black_box(PASSPHRASE)).unwrap());
    });
    group.bench_function("decrypt_900B", |b| {
        b.iter(|| decrypt(black_box(&token), black_box(PASSPHRASE)).unwrap());
    });

    group.finish();
}

fn bench_binary(c: &mut Criterion) {
    let mut group = c.benchmark_group("binary_envelope");
    group.sample_size(20);

    let sizes = [("1KB", 1024), ("100KB", 100 * 1024), ("2MB", 2 * 1024 * 1024)];

    for (name, size) in sizes {
        let image = vec![0x5au8; size];
        let env = encrypt_binary(&image, PASSPHRASE).unwrap();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("encrypt", name), &image, |b, image| {
            b.iter(|| encrypt_binary(black_box(image), black_box(PASSPHRASE)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decrypt", name), &env, |b, env| {
            b.iter(|| {
                decrypt_binary(
                    black_box(&env.ciphertext),
                    black_box(&env.salt_hex),
                    black_box(&env.iv_hex),
                    black_box(PASSPHRASE),
                )
                .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_text, bench_binary);
criterion_main!(benches);
