//! End-to-end tests: corpus sampling feeding training feeding retrieval.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use word2gauss::{
    text_to_pairs, CovarianceKind, Direction, EmbeddingConfig, EnergyKind, GaussianEmbedding,
    Neighbor, SampleSource, SamplerConfig, TrainingRecord,
};

const VOCAB: u32 = 10;

/// Synthetic co-occurrence stream over a 10-word vocabulary where words 0
/// and 1 co-occur half the time and everything else pairs uniformly, so 0
/// and 1 should end up each other's closest neighbor.
fn co_occurrence_records(n: usize, seed: u64) -> Vec<TrainingRecord> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let i = rng.gen_range(0..VOCAB);
            let j = if i < 2 && rng.gen::<bool>() {
                1 - i
            } else {
                rng.gen_range(0..VOCAB)
            };
            let neg = rng.gen_range(0..VOCAB);
            let direction = if rng.gen::<bool>() {
                Direction::Left
            } else {
                Direction::Right
            };
            TrainingRecord::new(i, j, i, neg, direction)
        })
        .collect()
}

fn cluster_config(energy: EnergyKind, covariance: CovarianceKind) -> EmbeddingConfig {
    EmbeddingConfig {
        covariance,
        energy,
        mu_max: 2.0,
        sigma_min: 0.8,
        sigma_max: 1.2,
        eta: 0.1,
        closs: 1.0,
        seed: Some(29),
        ..EmbeddingConfig::new(VOCAB as usize, 5)
    }
}

fn rank_of(neighbors: &[Neighbor], id: usize) -> usize {
    neighbors
        .iter()
        .position(|n| n.id == id)
        .expect("word missing from neighbor list")
}

/// Trains sequentially in small chunks and checks that 0 and 1 rank each
/// other above every unrelated word.
fn assert_cluster_recovered(energy: EnergyKind, covariance: CovarianceKind) {
    let embedding = GaussianEmbedding::new(cluster_config(energy, covariance)).unwrap();
    let records = co_occurrence_records(100_000, 7);
    for chunk in records.chunks(100) {
        embedding.train_batch(chunk).unwrap();
    }
    assert!(embedding.n_updates() > 0);

    for (word, partner) in [(0usize, 1usize), (1, 0)] {
        let neighbors = embedding.nearest_neighbors(word, VOCAB as usize).unwrap();
        let partner_rank = rank_of(&neighbors, partner);
        for other in 2..VOCAB as usize {
            assert!(
                partner_rank < rank_of(&neighbors, other),
                "{energy:?}/{covariance:?}: word {other} outranked {partner} for {word}"
            );
        }
    }
}

#[test]
fn test_learns_cluster_kl_spherical() {
    assert_cluster_recovered(EnergyKind::Kl, CovarianceKind::Spherical);
}

#[test]
fn test_learns_cluster_kl_diagonal() {
    assert_cluster_recovered(EnergyKind::Kl, CovarianceKind::Diagonal);
}

#[test]
fn test_learns_cluster_ip_spherical() {
    assert_cluster_recovered(EnergyKind::Ip, CovarianceKind::Spherical);
}

#[test]
fn test_learns_cluster_ip_diagonal() {
    assert_cluster_recovered(EnergyKind::Ip, CovarianceKind::Diagonal);
}

#[test]
fn test_threaded_training_recovers_cluster_and_keeps_constraints() {
    let config = cluster_config(EnergyKind::Kl, CovarianceKind::Spherical);
    let embedding = GaussianEmbedding::new(config.clone()).unwrap();

    let records = co_occurrence_records(100_000, 13);
    let batches: Vec<Vec<TrainingRecord>> =
        records.chunks(100).map(|c| c.to_vec()).collect();
    embedding.train(batches, 4).unwrap();

    let neighbors = embedding.nearest_neighbors(0, VOCAB as usize).unwrap();
    let partner_rank = rank_of(&neighbors, 1);
    for other in 2..VOCAB as usize {
        assert!(partner_rank < rank_of(&neighbors, other));
    }

    for mu in embedding.mu() {
        let norm = mu.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!(norm <= config.mu_max + 1e-9);
        assert!(mu.iter().all(|x| x.is_finite()));
    }
    for sigma in embedding.sigma() {
        for s in sigma {
            assert!(s >= config.sigma_min && s <= config.sigma_max);
        }
    }
}

#[test]
fn test_sequential_training_is_reproducible() {
    let records = co_occurrence_records(5_000, 3);
    let run = || {
        let embedding =
            GaussianEmbedding::new(cluster_config(EnergyKind::Kl, CovarianceKind::Diagonal))
                .unwrap();
        for chunk in records.chunks(100) {
            embedding.train_batch(chunk).unwrap();
        }
        (embedding.mu(), embedding.sigma(), embedding.n_updates())
    };
    assert_eq!(run(), run());
}

/// Scripted sampling decisions: fixed window radii, enumerated negatives.
struct ScriptedSource {
    windows: Vec<usize>,
    next_window: usize,
    next_negative: u32,
}

impl SampleSource for ScriptedSource {
    fn window_radius(&mut self, _max: usize) -> usize {
        let w = self.windows[self.next_window];
        self.next_window += 1;
        w
    }

    fn negative_id(&mut self) -> u32 {
        let id = self.next_negative;
        self.next_negative += 1;
        id
    }
}

#[test]
fn test_pair_expansion_emits_expected_sequence() {
    let unknown = u32::MAX;
    let documents = vec![vec![1, 2, 3, unknown, 8, 4, 5], vec![], vec![10, 11]];
    // One radius per non-sentinel center position.
    let mut source = ScriptedSource {
        windows: vec![2, 1, 2, 2, 1, 2, 1, 1],
        next_window: 0,
        next_negative: 0,
    };
    let config = SamplerConfig {
        half_window: 2,
        nsamples_per_word: 2,
        unknown_id: unknown,
    };

    let records = text_to_pairs(&documents, &mut source, &config).unwrap();
    let rows: Vec<[u32; 5]> = records.iter().map(|r| r.to_row()).collect();

    let expected: Vec<[u32; 5]> = vec![
        [1, 2, 1, 0, 0],
        [1, 2, 1, 1, 0],
        [1, 3, 1, 2, 0],
        [1, 3, 1, 3, 0],
        [1, 2, 4, 2, 1],
        [1, 2, 5, 2, 1],
        [2, 3, 2, 6, 0],
        [2, 3, 2, 7, 0],
        [1, 3, 8, 3, 1],
        [1, 3, 9, 3, 1],
        [2, 3, 10, 3, 1],
        [2, 3, 11, 3, 1],
        [3, 8, 3, 12, 0],
        [3, 8, 3, 13, 0],
        [3, 8, 14, 8, 1],
        [3, 8, 15, 8, 1],
        [8, 4, 8, 16, 0],
        [8, 4, 8, 17, 0],
        [8, 5, 8, 18, 0],
        [8, 5, 8, 19, 0],
        [8, 4, 20, 4, 1],
        [8, 4, 21, 4, 1],
        [4, 5, 4, 22, 0],
        [4, 5, 4, 23, 0],
        [8, 5, 24, 5, 1],
        [8, 5, 25, 5, 1],
        [4, 5, 26, 5, 1],
        [4, 5, 27, 5, 1],
        [10, 11, 10, 28, 0],
        [10, 11, 10, 29, 0],
        [10, 11, 30, 11, 1],
        [10, 11, 31, 11, 1],
    ];
    assert_eq!(rows, expected);
}

#[test]
fn test_sampled_pairs_train_end_to_end() {
    let n_words = 20usize;
    let config = EmbeddingConfig {
        mu_max: 2.0,
        sigma_min: 0.8,
        sigma_max: 1.2,
        seed: Some(5),
        ..EmbeddingConfig::new(n_words, 4)
    };
    let embedding = GaussianEmbedding::new(config).unwrap();

    let sampler = SamplerConfig {
        half_window: 3,
        nsamples_per_word: 1,
        unknown_id: u32::MAX,
    };
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let documents: Vec<Vec<u32>> = (0..200)
        .map(|_| (0..30).map(|_| rng.gen_range(0..n_words as u32)).collect())
        .collect();

    let mut source =
        word2gauss::RngSource::new(ChaCha8Rng::seed_from_u64(18), n_words as u32, u32::MAX);
    let records = text_to_pairs(&documents, &mut source, &sampler).unwrap();
    assert!(!records.is_empty());

    let batches: Vec<Vec<TrainingRecord>> =
        records.chunks(256).map(|c| c.to_vec()).collect();
    embedding.train(batches, 2).unwrap();
    assert!(embedding.n_updates() > 0);

    let neighbors = embedding.nearest_neighbors(0, 5).unwrap();
    assert_eq!(neighbors.len(), 5);
    assert_eq!(neighbors[0].id, 0);
}

#[test]
fn test_grow_then_train_reaches_new_words() {
    let config = EmbeddingConfig {
        seed: Some(9),
        ..cluster_config(EnergyKind::Kl, CovarianceKind::Spherical)
    };
    let mut embedding = GaussianEmbedding::new(config).unwrap();
    embedding.grow(12).unwrap();
    assert_eq!(embedding.n_words(), 12);

    let records = vec![
        TrainingRecord::new(10, 11, 10, 2, Direction::Left),
        TrainingRecord::new(11, 10, 3, 10, Direction::Right),
    ];
    embedding.train_batch(&records).unwrap();
    assert!(embedding.energy(10, 11).unwrap().is_finite());
}
