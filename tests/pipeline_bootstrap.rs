//! Tests de extremo a extremo del pipeline de bootstrap: resolución remota,
//! overlay local y pasos del caller, con un backend que registra cada
//! batch-get recibido para poder afirmar cuántas peticiones salieron y con
//! qué forma.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use configflow::{BackendError, BatchGetResponse, CompositeKey, FnStep, KeyValueBackend, MemoryBackend, Options,
                 Pipeline, PipelineError, PipelineStep, SetupError, StageStatus, State};
use serde_json::json;

/// Backend que delega en `MemoryBackend` y registra cada petición recibida.
struct RecordingBackend {
    inner: MemoryBackend,
    calls: Mutex<Vec<(String, Vec<CompositeKey>)>>,
}

impl RecordingBackend {
    fn new(inner: MemoryBackend) -> Self {
        Self { inner,
               calls: Mutex::new(Vec::new()) }
    }

    fn calls(&self) -> Vec<(String, Vec<CompositeKey>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueBackend for RecordingBackend {
    fn get_name(&self) -> &str {
        "recording"
    }

    fn get_description(&self) -> &str {
        "Memory backend that records every batch_get request"
    }

    async fn batch_get(&self, table: &str, keys: &[CompositeKey]) -> Result<BatchGetResponse, BackendError> {
        self.calls.lock().unwrap().push((table.to_string(), keys.to_vec()));
        self.inner.batch_get(table, keys).await
    }
}

/// Backend que siempre falla, para el camino de error de transporte.
struct BrokenBackend;

#[async_trait]
impl KeyValueBackend for BrokenBackend {
    fn get_name(&self) -> &str {
        "broken"
    }

    fn get_description(&self) -> &str {
        "Always fails with a transport error"
    }

    async fn batch_get(&self, _table: &str, _keys: &[CompositeKey]) -> Result<BatchGetResponse, BackendError> {
        Err(BackendError::Transport("connection refused".into()))
    }
}

fn pipeline_with(backend: Arc<dyn KeyValueBackend>, options: Options) -> Pipeline {
    Pipeline::builder(options).backend(backend).build().unwrap()
}

#[tokio::test]
async fn state_without_config_passes_through_and_issues_no_remote_call() {
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default()));
    let pipeline = pipeline_with(backend.clone(), Options::new().with_keyvalue_backend());

    let initial = State::from_value(json!({"stage": "staging", "x": 1})).unwrap();
    let outcome = pipeline.run(initial.clone(), &[]).await.unwrap();

    assert_eq!(outcome.state, initial);
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn empty_config_list_succeeds_immediately_without_remote_call() {
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default()));
    let pipeline = pipeline_with(backend.clone(), Options::new().with_keyvalue_backend());

    let initial = State::from_value(json!({"config": [], "stage": "staging"})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    assert_eq!(outcome.state, State::from_value(json!({"stage": "staging"})).unwrap());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn resolution_issues_exactly_one_batched_call_with_one_key_per_entry() {
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default().with_record("a", "staging", "1")
                                                                         .with_record("b", "staging", "2")));
    let pipeline = pipeline_with(backend.clone(), Options::new().with_keyvalue_backend());

    let initial = State::from_value(json!({"config": ["a", "b"], "stage": "staging"})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    let calls = backend.calls();
    assert_eq!(calls.len(), 1);
    let (table, keys) = &calls[0];
    assert_eq!(table, "Config");
    assert_eq!(keys,
               &vec![CompositeKey::new("a", "staging"), CompositeKey::new("b", "staging")]);

    assert_eq!(outcome.state.get("a"), Some(&json!("1")));
    assert_eq!(outcome.state.get("b"), Some(&json!("2")));
    assert!(!outcome.state.contains_key("config"));
}

#[tokio::test]
async fn missing_stage_fails_before_any_remote_call() {
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default()));
    let pipeline = pipeline_with(backend.clone(), Options::new().with_keyvalue_backend());

    let initial = State::from_value(json!({"config": ["a"], "x": 9})).unwrap();
    let failure = pipeline.run(initial, &[]).await.unwrap_err();

    assert!(matches!(failure.error, PipelineError::MissingStage));
    assert!(backend.calls().is_empty());
    assert_eq!(failure.state.get("x"), Some(&json!(9)));
}

#[tokio::test]
async fn strict_mode_reports_missing_keys_but_keeps_partial_merge() {
    // escenario de referencia: backend sólo conoce 'a'
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default().with_record("a", "staging", "v-a")));
    let pipeline = pipeline_with(backend.clone(), Options::new().with_keyvalue_backend());

    let initial = State::from_value(json!({"config": ["a", "b"], "stage": "staging"})).unwrap();
    let failure = pipeline.run(initial, &[]).await.unwrap_err();

    assert_eq!(failure.error.to_string(), "missing remote config keys: b");
    assert_eq!(failure.state,
               State::from_value(json!({"stage": "staging", "a": "v-a"})).unwrap());
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn lenient_mode_succeeds_with_the_resolved_subset() {
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default().with_record("a", "staging", "v-a")));
    let pipeline = pipeline_with(backend,
                                 Options::new().with_keyvalue_backend().with_err_on_missing(false));

    let initial = State::from_value(json!({"config": ["a", "b"], "stage": "staging"})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    assert_eq!(outcome.state.get("a"), Some(&json!("v-a")));
    assert!(!outcome.state.contains_key("b"));
}

#[tokio::test]
async fn default_stage_applies_when_state_has_none() {
    let backend = Arc::new(RecordingBackend::new(MemoryBackend::default().with_record("a", "qa", "qa-v")));
    let pipeline = pipeline_with(backend.clone(),
                                 Options::new().with_keyvalue_backend().with_default_stage("qa"));

    let initial = State::from_value(json!({"config": ["a"]})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    assert_eq!(outcome.state.get("a"), Some(&json!("qa-v")));
    assert_eq!(backend.calls()[0].1, vec![CompositeKey::new("a", "qa")]);
}

#[tokio::test]
async fn transport_errors_propagate_and_abort_the_run() {
    let flag = Arc::new(AtomicBool::new(false));
    let flag_in_step = flag.clone();
    let pipeline = pipeline_with(Arc::new(BrokenBackend), Options::new().with_keyvalue_backend());

    let steps = vec![FnStep::boxed("never", move |s: State| {
        flag_in_step.store(true, Ordering::SeqCst);
        Ok(s)
    })];
    let initial = State::from_value(json!({"config": ["a"], "stage": "staging"})).unwrap();
    let failure = pipeline.run(initial, &steps).await.unwrap_err();

    assert!(matches!(failure.error, PipelineError::Backend(BackendError::Transport(_))));
    assert!(!flag.load(Ordering::SeqCst), "los pasos no deben correr tras un fallo");
}

#[tokio::test]
async fn overlay_wins_over_remote_and_prior_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("local.json");
    std::fs::write(&path, r#"{"a": "overlaid", "extra": true}"#).unwrap();

    let backend = Arc::new(MemoryBackend::default().with_record("a", "staging", "remote-v"));
    let pipeline = pipeline_with(backend,
                                 Options::new().with_keyvalue_backend().with_config_file(&path));

    let initial = State::from_value(json!({"config": ["a"], "stage": "staging"})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    assert_eq!(outcome.state.get("a"), Some(&json!("overlaid")));
    assert_eq!(outcome.state.get("extra"), Some(&json!(true)));
}

#[tokio::test]
async fn steps_run_in_order_and_first_error_short_circuits() {
    let pipeline = Pipeline::builder(Options::new()).build().unwrap();
    let ran_third = Arc::new(AtomicBool::new(false));
    let ran_third_in_step = ran_third.clone();

    let steps: Vec<Box<dyn PipelineStep>> = vec![
        FnStep::boxed("first", |mut s: State| {
            s.insert("order", json!(["first"]));
            Ok(s)
        }),
        FnStep::boxed("second", |_s: State| {
            Err(PipelineError::Step { step: "second".into(),
                                      message: "bad state".into() })
        }),
        FnStep::boxed("third", move |s: State| {
            ran_third_in_step.store(true, Ordering::SeqCst);
            Ok(s)
        }),
    ];

    let failure = pipeline.run(State::new(), &steps).await.unwrap_err();
    assert_eq!(failure.error.to_string(), "step 'second' failed: bad state");
    // el estado al momento del fallo es el que entró al paso que falló
    assert_eq!(failure.state.get("order"), Some(&json!(["first"])));
    assert!(!ran_third.load(Ordering::SeqCst));

    let statuses: Vec<_> = failure.report.stages.iter().map(|st| (st.name.clone(), st.status.clone())).collect();
    assert!(statuses.contains(&("first".to_string(), StageStatus::Completed)));
    assert!(matches!(failure.report.stage("second").unwrap().status, StageStatus::Failed(_)));
    assert!(failure.report.stage("third").is_none());
}

#[tokio::test]
async fn empty_step_list_round_trips_the_resolved_state() {
    let backend = Arc::new(MemoryBackend::default().with_record("a", "staging", "v-a"));
    let pipeline = pipeline_with(backend, Options::new().with_keyvalue_backend());

    let initial = State::from_value(json!({"config": ["a"], "stage": "staging"})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    assert_eq!(outcome.state,
               State::from_value(json!({"stage": "staging", "a": "v-a"})).unwrap());
    assert!(outcome.report.succeeded());
    assert_eq!(outcome.report.stage("resolve").unwrap().status, StageStatus::Completed);
}

#[tokio::test]
async fn factory_without_backend_discards_the_config_list() {
    let pipeline = Pipeline::builder(Options::new()).build().unwrap();

    let initial = State::from_value(json!({"config": ["a"], "stage": "staging"})).unwrap();
    let outcome = pipeline.run(initial, &[]).await.unwrap();

    assert_eq!(outcome.state, State::from_value(json!({"stage": "staging"})).unwrap());
    assert_eq!(outcome.report.stage("resolve").unwrap().status, StageStatus::Skipped);
}

#[test]
fn config_section_without_backend_tag_fails_at_construction() {
    let options: Options = serde_json::from_value(json!({"config": {}})).unwrap();
    let err = Pipeline::builder(options).build().unwrap_err();
    assert!(matches!(err, SetupError::NoBackend));
}

#[test]
fn remote_config_without_backend_instance_fails_at_construction() {
    let err = Pipeline::builder(Options::new().with_keyvalue_backend()).build().unwrap_err();
    assert!(matches!(err, SetupError::BackendInstanceMissing(tag) if tag == "keyvalue"));
}
