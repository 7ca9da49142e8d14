use qfarm::prelude::*;
use qfarm_datasets::crop_recommendation;
use qfarm_trees::{MaxFeatures, RandomForestClassifier};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn crop_random_forest_high_accuracy() {
    // reproducible split
    let mut rng = StdRng::seed_from_u64(42);
    let (train, valid) = crop_recommendation()
        .shuffle(&mut rng)
        .split_with_ratio(0.8);

    let model = RandomForestClassifier::params()
        .max_depth(Some(10))
        .seed(42)
        .fit(&train)
        .expect("Training failed");

    let train_accuracy = model
        .predict(&train)
        .confusion_matrix(&train)
        .expect("Failed to compute confusion matrix")
        .accuracy();
    assert!(
        train_accuracy >= 0.9,
        "Expected at least 90% training accuracy, got {:.2}",
        train_accuracy
    );

    let preds = model.predict(valid.records.clone());
    let accuracy = preds
        .confusion_matrix(&valid)
        .expect("Failed to compute confusion matrix")
        .accuracy();
    assert!(
        accuracy >= 0.8,
        "Expected at least 80% hold-out accuracy, got {:.2}",
        accuracy
    );
}

#[test]
fn crop_random_forest_string_labels() {
    let dataset = crop_recommendation();
    let names = dataset.target_names().to_vec();
    let dataset = dataset.map_targets(|class| names[*class].clone());

    let model = RandomForestClassifier::params()
        .n_trees(30)
        .max_features(MaxFeatures::All)
        .seed(3)
        .fit(&dataset)
        .expect("Training failed");

    assert_eq!(model.classes(), names.as_slice());

    let prediction = model.predict(dataset.records());
    assert!(prediction.iter().all(|crop| names.contains(crop)));
}

#[test]
fn same_seed_same_predictions() {
    let dataset = crop_recommendation();
    let params = RandomForestClassifier::params().n_trees(20).seed(2024);

    let first = params.fit(&dataset).unwrap().predict(dataset.records());
    let second = params.fit(&dataset).unwrap().predict(dataset.records());

    assert_eq!(first, second);
}
