use moveplay_core::{
    core_version, Event, LoggingConfig, MemoryRuntime, Playground, ProjectError, SetupError,
    SetupOptions,
};
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn setup_wires_observer_before_project_operations() {
    let runtime = Arc::new(MemoryRuntime::new());
    let seen = Arc::new(Mutex::new(Vec::<Event>::new()));
    let sink = Arc::clone(&seen);
    let options = SetupOptions::new().on_event(move |event| sink.lock().unwrap().push(event));

    let playground = Playground::setup(runtime.clone(), options).await.unwrap();
    assert!(playground.subscription().is_attached());

    let project = playground.open_project("demo").await.unwrap();
    project.build().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);

    playground.detach_events();
    project.build().await.unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn version_combines_wrapper_and_runtime() {
    let runtime = Arc::new(MemoryRuntime::with_version("engine-7"));
    let playground = Playground::setup(runtime, SetupOptions::new()).await.unwrap();

    assert_eq!(
        playground.version().await,
        format!("v{}(moveplay wrapper engine-7)", core_version())
    );
}

#[tokio::test]
async fn project_lifecycle_through_host_surface() {
    let runtime = Arc::new(MemoryRuntime::new());
    let playground = Playground::setup(runtime, SetupOptions::new()).await.unwrap();

    let created = playground.create_project("foo").await.unwrap();
    let err = playground.create_project("foo").await.err().unwrap();
    assert_eq!(err, ProjectError::DuplicateName("foo".to_string()));

    let reopened = playground.open_project_by_id(created.id()).await.unwrap();
    assert_eq!(reopened.name(), "foo");

    let names = playground
        .projects()
        .await
        .unwrap()
        .into_iter()
        .map(|info| info.name)
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["foo".to_string()]);

    playground.remove_project(created.id()).await.unwrap();
    assert!(playground.projects().await.unwrap().is_empty());
}

#[tokio::test]
async fn clear_cache_reaches_runtime() {
    let runtime = Arc::new(MemoryRuntime::new());
    let playground = Playground::setup(runtime.clone(), SetupOptions::new())
        .await
        .unwrap();

    playground.clear_cache().await.unwrap();
    assert_eq!(runtime.cache_clears(), 1);
}

#[tokio::test]
async fn setup_rejects_relative_log_dir() {
    let runtime = Arc::new(MemoryRuntime::new());
    let options = SetupOptions::new().logging(LoggingConfig::new("info", "relative/logs"));

    let err = Playground::setup(runtime, options).await.err().unwrap();
    assert!(matches!(err, SetupError::Logging(_)));
}
