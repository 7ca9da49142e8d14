use std::io::Write;
use std::path::PathBuf;

use flate2::{write::GzEncoder, Compression};
use qfarm_advisory::*;
use qfarm_trees::RandomForestClassifier;
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn every_goal_scores_in_the_unit_interval() {
    let mut rng = StdRng::seed_from_u64(42);
    let readings = ClimateReadings::default();

    for goal in &Goal::ALL {
        for _ in 0..100 {
            let assessment = Assessment::new(*goal, &readings, &mut rng);
            assert!((0.0..=1.0).contains(&assessment.score));
            assert_eq!(assessment.tier, AdvisoryTier::from_score(assessment.score));
        }
    }
}

#[test]
fn roadmap_branches_on_climate() {
    let hot = roadmap(
        "Wheat",
        &ClimateReadings {
            temperature: 35.0,
            humidity: 30.0,
            ph: 6.5,
        },
    );
    assert_eq!(hot.steps()[2], "Use shade nets to reduce heat stress");
    assert_eq!(hot.steps()[3], "Increase irrigation frequency");

    let mild = roadmap(
        "Wheat",
        &ClimateReadings {
            temperature: 20.0,
            humidity: 60.0,
            ph: 6.5,
        },
    );
    assert_eq!(mild.steps()[2], "Normal sunlight exposure recommended");
    assert_eq!(mild.steps()[3], "Standard irrigation schedule");
}

#[test]
fn fallback_schedules_switch_on_one_slot() {
    let scheduler = select_scheduler(SchedulerKind::Fallback).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    let mut counts = [0usize; 3];
    for _ in 0..10_000 {
        let schedule = scheduler.schedule(&mut rng).unwrap();
        let slots = schedule.slots();
        assert_eq!(slots.len(), 1);
        counts[slots[0] as usize] += 1;
    }

    // 0.5 / 0.3 / 0.2
    assert!(counts[0] > counts[1] && counts[1] > counts[2]);
    assert!((4_700..5_300).contains(&counts[0]));
}

#[cfg(feature = "eigen-solver")]
#[test]
fn solver_irrigates_in_the_morning() {
    let scheduler = select_scheduler(SchedulerKind::EigenSolver).unwrap();
    let mut rng = StdRng::seed_from_u64(5);

    assert_eq!(scheduler.schedule(&mut rng).unwrap().bits(), [1, 0, 0]);
}

#[test]
fn recommendation_comes_from_the_vocabulary() {
    let recommender =
        CropRecommender::advisory(&RandomForestClassifier::params().seed(7)).unwrap();

    let crop = recommender.recommend(&FeatureVector::default()).unwrap();
    assert!(["Rice", "Wheat", "Maize", "Cotton", "Barley"].contains(&crop));
}

#[test]
fn train_from_gzipped_csv() {
    let path = std::env::temp_dir().join(format!("qfarm-crops-{}.csv.gz", std::process::id()));

    let mut csv = String::from("N,P,K,temperature,humidity,ph,rainfall,label\n");
    for i in 0..40 {
        let shift = (i % 5) as f64;
        if i % 2 == 0 {
            csv.push_str(&format!(
                "{},40,40,21,82,6.5,{},rice\n",
                85.0 + shift,
                200.0 + shift
            ));
        } else {
            csv.push_str(&format!(
                "{},70,80,18,16,7.2,{},chickpea\n",
                40.0 + shift,
                80.0 + shift
            ));
        }
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(csv.as_bytes()).unwrap();
    std::fs::write(&path, encoder.finish().unwrap()).unwrap();

    let mut rng = StdRng::seed_from_u64(42);
    let report = CropRecommender::train_from_csv(
        &path,
        0.2,
        &RandomForestClassifier::params().n_trees(20).seed(42),
        &mut rng,
    )
    .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(report.train_samples + report.test_samples, 40);
    assert!(report.test_samples >= 7 && report.test_samples <= 8);
    assert!((report.accuracy - 1.0).abs() < 1e-6);
    assert_eq!(
        report.recommender.schema(),
        &FeatureSchema::CropRecommendation
    );

    let readings = FeatureVector {
        nitrogen: 87.0,
        phosphorus: 40.0,
        potassium: 40.0,
        temperature: 21.0,
        humidity: 82.0,
        ph: 6.5,
        rainfall: Some(202.0),
    };
    assert_eq!(report.recommender.recommend(&readings).unwrap(), "rice");
}

/// Rice and chickpea rows, written in the column order of `header`
fn separable_crops_csv(name: &str, header: &[&str]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("qfarm-{}-{}.csv", name, std::process::id()));

    let mut csv = header.join(",");
    csv.push_str(",label\n");
    for i in 0..40 {
        let shift = (i % 5) as f64;
        let rice = i % 2 == 0;
        let pick = |rice_value: f64, chickpea_value: f64| {
            if rice {
                rice_value
            } else {
                chickpea_value
            }
        };

        let row = header
            .iter()
            .map(|column| {
                let column = column.to_ascii_lowercase();
                let value = match column.as_str() {
                    "n" | "nitrogen" => pick(85.0, 40.0) + shift,
                    "p" | "phosphorus" => pick(40.0, 70.0),
                    "k" | "potassium" => pick(40.0, 80.0),
                    "humidity" => pick(82.0, 16.0),
                    "ph" => pick(6.5, 7.2),
                    _ if column.starts_with("temp") => pick(21.0, 18.0),
                    _ if column.starts_with("rain") => pick(200.0, 80.0) + shift,
                    _ => 0.0,
                };
                value.to_string()
            })
            .collect::<Vec<_>>();

        csv.push_str(&row.join(","));
        csv.push_str(if rice { ",rice\n" } else { ",chickpea\n" });
    }

    std::fs::write(&path, csv).unwrap();
    path
}

fn rice_readings() -> FeatureVector {
    FeatureVector {
        nitrogen: 87.0,
        phosphorus: 40.0,
        potassium: 40.0,
        temperature: 21.0,
        humidity: 82.0,
        ph: 6.5,
        rainfall: Some(202.0),
    }
}

#[test]
fn train_on_renamed_and_reordered_columns() {
    let header = [
        "humidity", "temp", "Nitrogen", "phosphorus", "potassium", "pH", "rain",
    ];
    let path = separable_crops_csv("renamed", &header);

    let mut rng = StdRng::seed_from_u64(3);
    let report = CropRecommender::train_from_csv(
        &path,
        0.2,
        &RandomForestClassifier::params().n_trees(20).seed(3),
        &mut rng,
    )
    .unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!((report.accuracy - 1.0).abs() < 1e-6);
    assert_eq!(report.recommender.schema().feature_names(), header.to_vec());
    assert_eq!(report.recommender.recommend(&rice_readings()).unwrap(), "rice");
}

#[test]
fn unknown_columns_train_but_need_a_table_to_recommend() {
    let header = ["N", "P", "K", "temperature", "humidity", "ph", "rain_mm"];
    let path = separable_crops_csv("rain-mm", &header);

    let mut rng = StdRng::seed_from_u64(9);
    let report = CropRecommender::train_from_csv(
        &path,
        0.2,
        &RandomForestClassifier::params().n_trees(20).seed(9),
        &mut rng,
    )
    .unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!((report.accuracy - 1.0).abs() < 1e-6);

    let recommender = report.recommender;
    assert!(matches!(
        recommender.recommend(&rice_readings()),
        Err(AdvisoryError::UnmatchedFeature(name)) if name == "rain_mm"
    ));

    let headers = header.iter().map(|h| h.to_string()).collect::<Vec<_>>();
    let table = ndarray::array![[87., 40., 40., 21., 82., 6.5, 202.]];
    assert_eq!(recommender.recommend_table(&headers, &table).unwrap(), vec!["rice"]);
}
