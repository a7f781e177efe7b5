//! Corpus-based conformance tests.
//!
//! Runs every vector of the shipped FIPS 202 corpus against the reference.

use keccak_oracle::conformance::CorpusRunner;
use std::path::Path;

/// Path to the corpus file relative to the crate root.
const CORPUS_PATH: &str = "tests/vectors/fips202.json";

fn load() -> CorpusRunner {
    let corpus_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CORPUS_PATH);
    CorpusRunner::load(&corpus_path).expect("Failed to load corpus")
}

/// Load and run the full corpus.
#[test]
fn test_full_corpus() {
    let runner = load();
    println!("Loaded corpus with {} vectors", runner.vector_count());
    println!("Manifest: {:?}", runner.manifest());

    let results = runner.run_all();

    println!("\n=== Corpus Conformance Results ===");
    println!("{}", results.summary());

    for (id, outcome) in results.problems() {
        println!("  {} - {}", id, outcome);
    }

    assert!(
        results.is_clean(),
        "Corpus conformance failed: {}",
        results.summary()
    );
    assert_eq!(results.len(), runner.vector_count());
}

#[test]
fn test_corpus_manifest() {
    let runner = load();
    assert_eq!(runner.manifest().format_version, "1");
    assert_eq!(runner.manifest().name, "fips202");
}

#[test]
fn test_corpus_covers_every_operation() {
    let content = std::fs::read_to_string(Path::new(env!("CARGO_MANIFEST_DIR")).join(CORPUS_PATH))
        .expect("Failed to read corpus");
    for op in ["\"digest\"", "\"xof\"", "\"sponge\"", "\"permute\""] {
        assert!(content.contains(op), "no vector for op {}", op);
    }
}

#[test]
fn test_corrupted_vector_fails() {
    let corpus = r#"{
        "manifest": {"format_version": "1", "name": "broken"},
        "vectors": [
            {"id": "ok", "op": "digest",
             "input": {"algorithm": "SHA3-224", "message_hex": ""},
             "expected": {"ok": {"digest": "6b4e03423667dbb73b6e15454f0eb1abd4597f9a1b078e3f5b5a6bc7"}}},
            {"id": "bad", "op": "digest",
             "input": {"algorithm": "SHA3-224", "message_hex": ""},
             "expected": {"ok": {"digest": "6b4e03423667dbb73b6e15454f0eb1abd4597f9a1b078e3f5b5a6bc8"}}},
            {"id": "wrong_error", "op": "sponge",
             "input": {"rate_bits": 1088, "capacity_bits": 512, "suffix": 6, "output_len": 32},
             "expected": {"err": "InvalidParameters"}}
        ]
    }"#;
    let runner = CorpusRunner::from_json(corpus).unwrap();
    let results = runner.run_all();
    assert_eq!(results.passed(), 1);
    assert_eq!(results.mismatched(), 2);
    assert!(!results.is_clean());
    assert_eq!(
        results.problems().map(|(id, _)| id).collect::<Vec<_>>(),
        vec!["bad", "wrong_error"]
    );
}

#[test]
fn test_missing_corpus_file() {
    assert!(CorpusRunner::load("tests/vectors/does-not-exist.json").is_err());
}
