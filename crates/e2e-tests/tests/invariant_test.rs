//! Randomized single-production invariant test.
//!
//! Applies random lifecycle operations across several datasets. After every
//! successful promotion to PRODUCTION the dataset has exactly one production
//! generation, and no dataset ever has more than one.

use std::collections::HashMap;

use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use e2e_tests::TestHarness;
use lifecycle_types::{LifecycleError, LifecycleStatus};

const DATASETS: usize = 3;
const STEPS: usize = 150;

async fn run_sequence(seed: u64) {
    let harness = TestHarness::new();
    let mut rng = StdRng::seed_from_u64(seed);

    let mut datasets = Vec::new();
    for i in 0..DATASETS {
        let (dataset, config) = harness
            .seed(&format!("corpus-{}", i), "v1", "e5")
            .await;
        datasets.push((dataset, config));
    }
    let mut generations: HashMap<String, Vec<String>> = HashMap::new();

    for step in 0..STEPS {
        let (dataset, config) = &datasets[rng.random_range(0..DATASETS)];
        let known = generations.entry(dataset.id.clone()).or_default();

        if known.is_empty() || rng.random_bool(0.2) {
            let gen = harness
                .manager
                .create_index_generation(&dataset.id, &config.id)
                .await
                .unwrap();
            known.push(gen.id);
            continue;
        }

        let gen_id = known[rng.random_range(0..known.len())].clone();
        let target = LifecycleStatus::ALL[rng.random_range(0..LifecycleStatus::ALL.len())];
        let current = harness.manager.get_status(&gen_id).await.unwrap();

        match harness.manager.promote(&gen_id, target).await {
            Ok(updated) => {
                assert!(current.can_transition_to(target));
                assert_eq!(updated.status, target);
                if target == LifecycleStatus::Production {
                    let production = harness.production_of(&dataset.id).await;
                    assert_eq!(
                        production.len(),
                        1,
                        "seed {} step {}: expected exactly one production generation",
                        seed,
                        step
                    );
                    assert_eq!(production[0].id, gen_id);
                }
            }
            Err(LifecycleError::InvalidTransition { from, to, .. }) => {
                assert!(!current.can_transition_to(target));
                assert_eq!((from, to), (current, target));
                assert_eq!(harness.manager.get_status(&gen_id).await.unwrap(), current);
            }
            Err(other) => panic!("seed {} step {}: unexpected error {}", seed, step, other),
        }

        for (dataset, _) in &datasets {
            assert!(harness.production_of(&dataset.id).await.len() <= 1);
        }
    }
}

#[tokio::test]
async fn test_single_production_invariant_random_sequences() {
    for seed in [7, 42, 1337] {
        run_sequence(seed).await;
    }
}
