use std::path::Path;
use std::sync::{Arc, Mutex};

use templar_core::config::TemplarConfig;
use templar_core::index::IndexListener;
use templar_core::{Index, TemplarError, TemplateDraft, TemplateService};

async fn service_at(config: &TemplarConfig) -> TemplateService {
    TemplateService::from_config(config).await.unwrap()
}

#[tokio::test]
async fn test_first_run_create_commit_list() {
    let dir = tempfile::tempdir().unwrap();
    let config = TemplarConfig::with_store_root(dir.path().join("template-store"));
    let service = service_at(&config).await;

    assert!(service.list().await.unwrap().is_empty());

    let meta = service.create(TemplateDraft::named("Foo")).unwrap();
    assert!(!meta.id.is_empty());
    assert!(meta.url.to_string_lossy().ends_with(".template"));
    assert!(service.list().await.unwrap().is_empty());

    let committed = service
        .commit(meta.clone(), "Hello {{name}}".to_string())
        .await
        .unwrap();
    assert!(committed.url.exists());

    let index = service.list().await.unwrap();
    assert_eq!(index.len(), 1);
    assert_eq!(index[&meta.id].name, "Foo");

    let raw = std::fs::read_to_string(config.store_root.join("index.json")).unwrap();
    assert!(!raw.contains("url"));
    assert!(!raw.contains("Hello"));
}

#[tokio::test]
async fn test_listeners_follow_the_index() {
    let dir = tempfile::tempdir().unwrap();
    let config = TemplarConfig::with_store_root(dir.path());
    let service = service_at(&config).await;

    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&sizes);
    let listener: Arc<dyn IndexListener> = Arc::new(move |index: &Index| -> anyhow::Result<()> {
        sink.lock().unwrap().push(index.len());
        Ok(())
    });
    let subscription = service.subscribe(Arc::clone(&listener));

    let a = service.create(TemplateDraft::named("A")).unwrap();
    let a = service.commit(a, "a".into()).await.unwrap();
    let b = service.create(TemplateDraft::named("B")).unwrap();
    service.commit(b, "b".into()).await.unwrap();
    service.remove(&a).await.unwrap();

    assert!(service.unsubscribe(&subscription));
    let c = service.create(TemplateDraft::named("C")).unwrap();
    service.commit(c, "c".into()).await.unwrap();

    assert_eq!(*sizes.lock().unwrap(), vec![1, 2, 1]);
}

#[tokio::test]
async fn test_instantiate_with_project_and_global_providers() {
    let dir = tempfile::tempdir().unwrap();
    let project = dir.path().join("project");
    std::fs::create_dir_all(project.join("src")).unwrap();
    std::fs::write(
        project.join("templar.json"),
        r#"{ "author": "Project Author", "license": null }"#,
    )
    .unwrap();
    let macros = dir.path().join("macros.json");
    std::fs::write(&macros, r#"{ "author": "Global Author", "company": "ACME" }"#).unwrap();

    let config = TemplarConfig {
        macro_file: Some(macros),
        project_roots: vec![project.clone()],
        ..TemplarConfig::with_store_root(dir.path().join("store"))
    };
    let service = service_at(&config).await;

    let draft = TemplateDraft {
        name: "Rust module".into(),
        kind: "rust".into(),
        ext: "rs".into(),
        ..TemplateDraft::default()
    };
    let meta = service.create(draft).unwrap();
    let meta = service
        .commit(
            meta,
            "// {{path}} by {{author}} ({{company}}) [{{license}}] {{template}}\npub struct {{name}};\n"
                .into(),
        )
        .await
        .unwrap();

    let inst = service
        .instantiate(&meta, &project.join("src"), "Widget")
        .await
        .unwrap();
    let expected_path = Path::new("src").join("Widget.rs");
    assert_eq!(
        inst.content,
        format!(
            "// {} by Project Author (ACME) [] Rust module\npub struct Widget;\n",
            expected_path.display()
        )
    );

    service.write(&inst).await.unwrap();
    let again = service.instantiate(&meta, &project.join("src"), "Widget").await;
    assert!(matches!(again, Err(TemplarError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_corrupt_index_surfaces() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.json"), "[1, 2").unwrap();
    let service = service_at(&TemplarConfig::with_store_root(dir.path())).await;
    assert!(matches!(
        service.list().await,
        Err(TemplarError::CorruptIndex { .. })
    ));
}
