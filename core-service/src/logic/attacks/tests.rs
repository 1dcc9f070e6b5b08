use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::*;
use crate::logic::embedding::{Embedder, HashingEmbedder};
use crate::logic::storage::Metadata;

// ============================================================================
// FIXTURES
// ============================================================================

/// Hashing embedder that counts embedded strings
struct CountingEmbedder {
    inner: HashingEmbedder,
    calls: AtomicUsize,
}

impl Embedder for CountingEmbedder {
    fn model_name(&self) -> &str {
        "counting-test"
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed_batch(&self, texts: &[String]) -> crate::logic::error::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(texts.len(), Ordering::SeqCst);
        self.inner.embed_batch(texts)
    }
}

struct Fixture {
    store: Arc<VectorStore>,
    templates: Arc<TemplateRegistry>,
    config: EngineConfig,
    embedder: Arc<CountingEmbedder>,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(EngineConfig::for_testing())
    }

    fn with_config(config: EngineConfig) -> Self {
        let embedder = Arc::new(CountingEmbedder {
            inner: HashingEmbedder::new(256).unwrap(),
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(VectorStore::in_memory(embedder.clone()).unwrap());
        Self {
            store,
            templates: Arc::new(TemplateRegistry::builtin()),
            config,
            embedder,
        }
    }

    fn attack(&self, kind: AttackKind) -> Attack {
        Attack::build(kind, self.store.clone(), self.templates.clone(), &self.config).unwrap()
    }

    fn target(&self, text: &str) -> Vec<f32> {
        let id = self.store.store_text(text, Metadata::new()).unwrap();
        self.store.get_vector(&id).unwrap()
    }

    fn calls(&self) -> usize {
        self.embedder.calls.load(Ordering::SeqCst)
    }
}

fn ssn_format(text: &str) -> bool {
    DataTemplate::ssn().matches(text)
}

// ============================================================================
// SIMILARITY
// ============================================================================

#[test]
fn test_exact_candidate_is_recovered() {
    let fx = Fixture::new();
    // Same seed as the attack: candidate #37 of the first 100
    let secret = CandidatePool::new(fx.config.seed).take(&DataTemplate::ssn(), 100)[37].clone();
    let target = fx.target(&secret);

    let attack = fx.attack(AttackKind::Similarity);
    let options = AttackOptions {
        sample_size: Some(100),
        ..AttackOptions::for_type("ssn")
    };
    let result = attack.execute(&target, &options).unwrap();

    assert!(result.success);
    assert!(result.confidence > 0.9999);
    assert_eq!(result.num_queries, 100);
    let extracted = result.extracted_text.clone().unwrap();
    let eval = attack.evaluate(&extracted, &secret);
    assert!(eval.exact_match);
    assert_eq!(eval.partial_accuracy, 1.0);
}

#[test]
fn test_ssn_scenario() {
    let fx = Fixture::new();
    let target = fx.target("SSN: 123-45-6789");

    let attack = fx.attack(AttackKind::Similarity);
    let options = AttackOptions {
        sample_size: Some(1000),
        ..AttackOptions::for_type("ssn")
    };
    let result = attack.execute(&target, &options).unwrap();

    assert_eq!(result.method, SIMILARITY_METHOD);
    assert_eq!(result.num_queries, 1000);
    assert!(ssn_format(result.extracted_text.as_deref().unwrap()));
    assert!((0.0..=1.0).contains(&result.confidence));
    assert_eq!(result.success, result.confidence > fx.config.thresholds.similarity);

    let top: Vec<f64> = result.metadata["top_5_similarities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(top.len(), 5);
    assert!(top.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(result.metadata["sample_size"], 1000);
    assert_eq!(result.metadata["data_type"], "ssn");
}

#[test]
fn test_similarity_is_reproducible() {
    let fx = Fixture::new();
    let target = fx.target("Credit Card: 4532-1234-5678-9010");
    let options = AttackOptions {
        sample_size: Some(200),
        ..AttackOptions::for_type("creditcard")
    };

    let a = fx.attack(AttackKind::Similarity).execute(&target, &options).unwrap();
    let b = fx.attack(AttackKind::Similarity).execute(&target, &options).unwrap();
    assert_eq!(a.extracted_text, b.extracted_text);
    assert_eq!(a.confidence, b.confidence);
    assert!(DataTemplate::credit_card().matches(a.extracted_text.as_deref().unwrap()));
}

#[test]
fn test_incremental_accumulates_queries() {
    let mut config = EngineConfig::for_testing();
    config.incremental_schedule = vec![10, 20, 40];
    config.thresholds.early_stop = 1.1; // never stop early
    let fx = Fixture::with_config(config);
    let target = fx.target("SSN: 123-45-6789");

    let attack = fx.attack(AttackKind::Incremental);
    let options = options_for(AttackKind::Incremental, &AttackOptions::for_type("ssn"));
    let result = attack.execute(&target, &options).unwrap();

    assert_eq!(result.method, INCREMENTAL_METHOD);
    assert_eq!(result.num_queries, 70);
    assert_eq!(result.metadata["rounds"], 3);

    // Capped by max_rounds
    let capped = AttackOptions {
        max_rounds: Some(2),
        ..options
    };
    let result = attack.execute(&target, &capped).unwrap();
    assert_eq!(result.num_queries, 30);
    assert_eq!(result.metadata["rounds"], 2);
}

#[test]
fn test_incremental_stops_early() {
    let mut config = EngineConfig::for_testing();
    config.incremental_schedule = vec![10, 20, 40];
    let fx = Fixture::with_config(config);
    let secret = CandidatePool::new(fx.config.seed).take(&DataTemplate::ssn(), 10)[3].clone();
    let target = fx.target(&secret);

    let attack = fx.attack(AttackKind::Incremental);
    let options = options_for(AttackKind::Incremental, &AttackOptions::for_type("ssn"));
    let result = attack.execute(&target, &options).unwrap();

    assert_eq!(result.metadata["rounds"], 1);
    assert_eq!(result.num_queries, 10);
    assert_eq!(result.extracted_text.as_deref(), Some(secret.as_str()));
}

// ============================================================================
// RECONSTRUCTION
// ============================================================================

#[test]
fn test_reconstruction_trace_is_non_decreasing() {
    let fx = Fixture::new();
    let target = fx.target("SSN: 123-45-6789");

    let attack = fx.attack(AttackKind::Reconstruction);
    let result = attack.execute(&target, &AttackOptions::for_type("ssn")).unwrap();

    assert_eq!(result.method, RECONSTRUCTION_METHOD);
    assert!(ssn_format(result.extracted_text.as_deref().unwrap()));
    assert!((0.0..=1.0).contains(&result.confidence));

    let scores: Vec<f64> = result.metadata["segment_scores"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert_eq!(scores.len(), 3);
    assert!(scores.windows(2).all(|w| w[0] <= w[1]));

    let initial = result.metadata["initial_similarity"].as_f64().unwrap();
    assert!(initial <= scores[0]);

    // Re-embedded winner scores like its last segment
    let last = *scores.last().unwrap();
    assert!((result.raw_similarity() - last).abs() < 1e-5);
}

#[test]
fn test_reconstruction_counts_every_embedding() {
    let fx = Fixture::new();
    let target = fx.target("SSN: 555-12-3456");
    let attack = fx.attack(AttackKind::Reconstruction);

    // Beam of one: zero template + 100 + 50 + 50 mutations + final
    let before = fx.calls();
    let options = AttackOptions {
        beam_width: Some(1),
        ..AttackOptions::for_type("ssn")
    };
    let result = attack.execute(&target, &options).unwrap();
    assert_eq!(result.num_queries, 202);
    assert_eq!(fx.calls() - before, 202);

    // Default beam: reported count still equals what was embedded
    let before = fx.calls();
    let result = attack.execute(&target, &AttackOptions::for_type("ssn")).unwrap();
    assert_eq!(result.num_queries, fx.calls() - before);
    assert_eq!(result.metadata["beam_width"], 5);
}

#[test]
fn test_reconstruction_is_reproducible() {
    let fx = Fixture::new();
    let target = fx.target("Credit Card: 5500-0000-0000-0004");
    let attack = fx.attack(AttackKind::Reconstruction);
    let options = AttackOptions::for_type("creditcard");

    let a = attack.execute(&target, &options).unwrap();
    let b = attack.execute(&target, &options).unwrap();
    assert_eq!(a.extracted_text, b.extracted_text);
    assert_eq!(a.metadata["segment_scores"], b.metadata["segment_scores"]);
    assert_eq!(a.metadata["segment_scores"].as_array().unwrap().len(), 4);
    assert!(DataTemplate::credit_card().matches(a.extracted_text.as_deref().unwrap()));
}

#[test]
fn test_zero_beam_width_is_rejected() {
    let fx = Fixture::new();
    let target = fx.target("SSN: 123-45-6789");
    let options = AttackOptions {
        beam_width: Some(0),
        ..AttackOptions::for_type("ssn")
    };
    let result = fx.attack(AttackKind::Reconstruction).execute(&target, &options);
    assert!(matches!(result, Err(VectorScopeError::InvalidInput(_))));
}

// ============================================================================
// PATTERN
// ============================================================================

#[test]
fn test_pattern_detects_category() {
    let fx = Fixture::new();
    let attack = fx.attack(AttackKind::Pattern);

    let ssn = attack
        .execute(&fx.target("SSN: 123-45-6789"), &AttackOptions::default())
        .unwrap();
    assert_eq!(ssn.method, PATTERN_METHOD);
    assert_eq!(ssn.num_queries, 1);
    assert_eq!(ssn.metadata["detected_type"], "ssn");
    assert_eq!(ssn.extracted_text.as_deref(), Some("Detected pattern: ssn"));
    assert!((0.0..=1.0).contains(&ssn.confidence));
    assert_eq!(ssn.success, ssn.confidence > fx.config.thresholds.pattern);

    let table = ssn.metadata["similarities"].as_object().unwrap();
    assert_eq!(table.len(), 2);
    assert!(table.contains_key("ssn") && table.contains_key("creditcard"));

    let card = attack
        .execute(&fx.target("Credit Card: 4111-1111-1111-1111"), &AttackOptions::default())
        .unwrap();
    assert_eq!(card.metadata["detected_type"], "creditcard");
    assert_eq!(card.metadata["detected_label"], "Credit Card Number");
}

#[test]
fn test_pattern_centroids_are_precomputed() {
    let fx = Fixture::new();
    let before = fx.calls();
    let attack = PatternAttack::new(fx.store.clone(), &fx.templates, &fx.config).unwrap();
    assert_eq!(fx.calls() - before, 2 * fx.config.centroid_samples);
    assert_eq!(attack.centroids().len(), 2);
    assert_eq!(attack.centroid("ssn").unwrap().vector.len(), 256);

    // Execution embeds nothing new
    let target = fx.target("SSN: 123-45-6789");
    let before = fx.calls();
    attack.execute(&target).unwrap();
    assert_eq!(fx.calls(), before);
}

// ============================================================================
// ERRORS / SELECTION
// ============================================================================

#[test]
fn test_unsupported_data_type() {
    let fx = Fixture::new();
    let target = fx.target("Passport: X1234567");
    let options = AttackOptions::for_type("passport");

    for kind in [AttackKind::Similarity, AttackKind::Reconstruction] {
        let result = fx.attack(kind).execute(&target, &options);
        assert!(
            matches!(result, Err(VectorScopeError::UnsupportedDataType(ref t)) if t == "passport"),
            "{} accepted an unknown data type",
            kind
        );
    }
}

#[test]
fn test_degenerate_and_mismatched_targets() {
    let fx = Fixture::new();
    let attack = fx.attack(AttackKind::Similarity);
    let options = AttackOptions {
        sample_size: Some(10),
        ..AttackOptions::for_type("ssn")
    };

    let zero = vec![0.0f32; 256];
    assert!(matches!(attack.execute(&zero, &options), Err(VectorScopeError::DegenerateVector)));

    let short = vec![1.0f32; 8];
    assert!(matches!(
        attack.execute(&short, &options),
        Err(VectorScopeError::DimensionMismatch { .. })
    ));

    let empty = AttackOptions {
        sample_size: Some(0),
        ..options
    };
    assert!(matches!(
        attack.execute(&fx.target("SSN: 1"), &empty),
        Err(VectorScopeError::InvalidInput(_))
    ));
}

#[test]
fn test_attack_kind_tags() {
    for kind in AttackKind::ALL {
        assert_eq!(kind.as_str().parse::<AttackKind>().unwrap(), kind);
    }
    assert_eq!(" Pattern ".parse::<AttackKind>().unwrap(), AttackKind::Pattern);
    assert!("all".parse::<AttackKind>().is_err());

    let opts = options_for(AttackKind::Incremental, &AttackOptions::default());
    assert!(opts.incremental);
    assert!(!options_for(AttackKind::Similarity, &opts).incremental);
}
