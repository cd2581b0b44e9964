//! End-to-end check: generate a small dataset, then load it back.

use std::fs;

use rand::rngs::StdRng;
use rand::SeedableRng;

use pretty_clevr::loaders::{PrettyClevr, MAX_OBJECTS};
use pretty_clevr::scene::Scene;
use pretty_clevr::{DatasetGenerator, GenerationConfig, SplitConfig};

const OBJECTS: usize = 3;

fn generate_dataset(dir: &std::path::Path) {
    let config = GenerationConfig {
        output_dir: dir.to_path_buf(),
        objects_per_scene: OBJECTS,
        min_separation_sq: 0.1,
        seed: Some(2024),
        splits: vec![
            SplitConfig {
                name: "train".to_string(),
                scenes: 3,
            },
            SplitConfig {
                name: "dev".to_string(),
                scenes: 1,
            },
            SplitConfig {
                name: "test".to_string(),
                scenes: 2,
            },
        ],
    };
    DatasetGenerator::new(config).unwrap().run().unwrap();
}

#[test]
fn generated_dataset_loads_and_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    generate_dataset(dir.path());

    let dataset = PrettyClevr::from_dir(dir.path()).unwrap();

    assert_eq!(dataset.vocab.len(), 16);
    assert_eq!(dataset.train.questions.len(), 3 * OBJECTS * OBJECTS * 2);
    assert_eq!(dataset.dev.questions.len(), OBJECTS * OBJECTS * 2);
    assert_eq!(dataset.test.questions.len(), 2 * OBJECTS * OBJECTS * 2);
    assert_eq!(dataset.train.images.len(), 3);
    assert_eq!(dataset.train.states.len(), 3);

    // States re-read from disk agree with the arrays the loader produced.
    for (name, arrays) in &dataset.train.states {
        let raw = fs::read_to_string(dir.path().join("train").join("states").join(name)).unwrap();
        let scene: Scene = serde_json::from_str(&raw).unwrap();
        assert_eq!(arrays.len, scene.len());
        for (i, obj) in scene.objects.iter().enumerate() {
            assert_eq!(arrays.positions[i], [obj.p[0] as f32, obj.p[1] as f32]);
            assert_eq!(
                dataset.vocab.symbol_of(arrays.colors[i]).unwrap(),
                obj.c.as_str()
            );
            assert_eq!(
                dataset.vocab.symbol_of(arrays.markers[i]).unwrap(),
                obj.m.as_str()
            );
        }
    }
}

#[test]
fn test_split_yields_each_question_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    generate_dataset(dir.path());

    let dataset = PrettyClevr::from_dir(dir.path()).unwrap();
    let samples: Vec<_> = dataset.test_samples().collect();
    assert_eq!(samples.len(), dataset.test.questions.len());

    for sample in &samples {
        assert_eq!(sample.image.len(), 128 * 128 * 3);
        assert_eq!(sample.n_objects, OBJECTS);
        assert!(sample.hops < OBJECTS);
        assert!(sample.anchor < dataset.vocab.len());
        assert!(sample.target < dataset.vocab.len());
        // Unaugmented positions stay inside the unit square; padding is zero.
        for p in &sample.positions[..OBJECTS] {
            assert!((0.0..1.0).contains(&p[0]));
            assert!((0.0..1.0).contains(&p[1]));
        }
        for p in &sample.positions[OBJECTS..MAX_OBJECTS] {
            assert_eq!(*p, [0.0, 0.0]);
        }
    }
}

#[test]
fn train_samples_repeat_with_augmentation() {
    let dir = tempfile::tempdir().unwrap();
    generate_dataset(dir.path());

    let dataset = PrettyClevr::from_dir(dir.path()).unwrap();
    let n_questions = dataset.train.questions.len();

    // An endless iterator keeps producing past one epoch.
    let mut rng_seeded = dataset
        .train
        .samples(None, true, StdRng::seed_from_u64(77));
    let samples: Vec<_> = (&mut rng_seeded).take(n_questions + 5).collect();
    assert_eq!(samples.len(), n_questions + 5);

    // Augmented positions leave the unit square often enough that at least
    // one sample should show a coordinate outside [0, 1).
    let escaped = samples.iter().any(|s| {
        s.positions[..OBJECTS]
            .iter()
            .any(|p| !(0.0..1.0).contains(&p[0]) || !(0.0..1.0).contains(&p[1]))
    });
    assert!(escaped);
}
