use candle_core::{Device, Result as CandleResult, Tensor};
use zombie_arena_core::{Observation, OBSERVATION_LEN};
use zombie_arena_learning::{
    checkpoint::{
        self, CheckpointError, RecordMeta, FIRST_ESTIMATOR_FILE, SECOND_ESTIMATOR_FILE,
    },
    learner::{LearnerConfig, TwinQLearner},
};

fn learner() -> TwinQLearner {
    TwinQLearner::new(
        LearnerConfig {
            gamma: 0.99,
            tau: 0.005,
            learning_rate: 1e-3,
            hidden_width: 8,
            dropout_rate: 0.2,
        },
        &Device::Cpu,
    )
    .expect("learner")
}

fn probe() -> Vec<Observation> {
    let pixels = (0..OBSERVATION_LEN).map(|index| (index % 251) as u8).collect();
    vec![Observation::from_pixels(pixels)]
}

fn values(learner: &TwinQLearner) -> CandleResult<(Vec<f32>, Vec<f32>)> {
    let (q1, q2) = learner.action_values(&probe())?;
    let flatten = |tensor: Tensor| tensor.flatten_all()?.to_vec1::<f32>();
    Ok((flatten(q1)?, flatten(q2)?))
}

#[test]
fn missing_checkpoint_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = checkpoint::load_estimators(&learner(), dir.path());
    match result {
        Err(CheckpointError::Missing(path)) => {
            assert_eq!(path, dir.path().join(FIRST_ESTIMATOR_FILE));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn saved_estimators_restore_into_a_fresh_learner() {
    let dir = tempfile::tempdir().expect("temp dir");
    let trained = learner();
    let meta = RecordMeta {
        best_score: 12.5,
        episode: 3,
    };
    let record = checkpoint::save_best(&trained, dir.path(), meta).expect("save");

    assert!(dir.path().join(FIRST_ESTIMATOR_FILE).exists());
    assert!(dir.path().join(SECOND_ESTIMATOR_FILE).exists());
    assert_eq!(
        record.file_name().and_then(|name| name.to_str()),
        Some("best_model_ep3_score12.50.safetensors")
    );

    let restored = learner();
    assert_ne!(values(&trained).expect("values"), values(&restored).expect("values"));
    checkpoint::load_estimators(&restored, dir.path()).expect("load");
    assert_eq!(values(&trained).expect("values"), values(&restored).expect("values"));

    let (target_1, _) = restored.target_values(&probe()).expect("targets");
    let target_1 = target_1.flatten_all().expect("flatten").to_vec1::<f32>().expect("vec");
    assert_eq!(target_1, values(&trained).expect("values").0);
}

#[test]
fn combined_record_carries_both_estimators_and_metadata() {
    let dir = tempfile::tempdir().expect("temp dir");
    let trained = learner();
    let meta = RecordMeta {
        best_score: -4.0,
        episode: 17,
    };
    let record = checkpoint::save_best(&trained, dir.path(), meta).expect("save");

    let restored = learner();
    let loaded = checkpoint::load_record(&restored, &record).expect("load record");
    assert_eq!(loaded, meta);
    assert_eq!(values(&trained).expect("values"), values(&restored).expect("values"));
}

fn target_values(learner: &TwinQLearner) -> CandleResult<(Vec<f32>, Vec<f32>)> {
    let (q1, q2) = learner.target_values(&probe())?;
    let flatten = |tensor: Tensor| tensor.flatten_all()?.to_vec1::<f32>();
    Ok((flatten(q1)?, flatten(q2)?))
}

#[test]
fn failed_load_leaves_every_estimator_untouched() {
    let dir = tempfile::tempdir().expect("temp dir");
    let meta = RecordMeta {
        best_score: 1.0,
        episode: 1,
    };
    let _ = checkpoint::save_best(&learner(), dir.path(), meta).expect("save");
    std::fs::remove_file(dir.path().join(SECOND_ESTIMATOR_FILE)).expect("remove");

    let restored = learner();
    let online = values(&restored).expect("values");
    let targets = target_values(&restored).expect("targets");

    match checkpoint::load_estimators(&restored, dir.path()) {
        Err(CheckpointError::Missing(path)) => {
            assert_eq!(path, dir.path().join(SECOND_ESTIMATOR_FILE));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(values(&restored).expect("values"), online);
    assert_eq!(target_values(&restored).expect("targets"), targets);
}

#[test]
fn record_without_metadata_is_rejected_before_assignment() {
    let dir = tempfile::tempdir().expect("temp dir");
    let meta = RecordMeta {
        best_score: 2.0,
        episode: 4,
    };
    let record = checkpoint::save_best(&learner(), dir.path(), meta).expect("save");
    let mut tensors = candle_core::safetensors::load(&record, &Device::Cpu).expect("load");
    let _ = tensors.remove("meta.episode");
    candle_core::safetensors::save(&tensors, &record).expect("rewrite");

    let restored = learner();
    let online = values(&restored).expect("values");
    let targets = target_values(&restored).expect("targets");

    match checkpoint::load_record(&restored, &record) {
        Err(CheckpointError::MissingTensor { name, .. }) => assert_eq!(name, "meta.episode"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(values(&restored).expect("values"), online);
    assert_eq!(target_values(&restored).expect("targets"), targets);
}
