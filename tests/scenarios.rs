use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tokio::time::timeout;
use workbench::{
    AccessMode, ArchiveHandler, Broker, CommandContext, CommandFn, Config, ContentModel,
    ContentModelFactory, ContentModels, Echo, Event, EventKind, HandlerFn, ModelError, ResourceId,
    Service, TaskError, TaskId, TaskStatus, Workbench, Workspace,
};

const WAIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct ClassModel {
    methods: Vec<String>,
}

#[async_trait]
impl ContentModel for ClassModel {
    async fn commit(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct ClassModelFactory;

#[async_trait]
impl ContentModelFactory for ClassModelFactory {
    fn identifier(&self) -> &str {
        "class-model"
    }

    async fn open(
        &self,
        _resources: &[ResourceId],
        _mode: AccessMode,
    ) -> anyhow::Result<Box<dyn ContentModel>> {
        Ok(Box::new(ClassModel::default()))
    }
}

type StatusLog = mpsc::UnboundedReceiver<(TaskId, TaskStatus, Option<Arc<str>>)>;

/// Service that reports every task transition on a channel.
struct WorkspaceService {
    tx: mpsc::UnboundedSender<(TaskId, TaskStatus, Option<Arc<str>>)>,
}

impl WorkspaceService {
    fn new() -> (Arc<Self>, StatusLog) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl Service for WorkspaceService {
    fn name(&self) -> &str {
        "workspace"
    }

    async fn initialize(&self, broker: &Broker) -> anyhow::Result<()> {
        let tx = self.tx.clone();
        broker.subscribe(
            EventKind::TaskStatusChanged,
            HandlerFn::arc("workspace", move |ev: Event| {
                let tx = tx.clone();
                async move {
                    if let (Some(task), Some(status)) = (ev.task, ev.status) {
                        let _ = tx.send((task, status, ev.reason.clone()));
                    }
                    Ok(())
                }
            }),
        );
        Ok(())
    }
}

async fn statuses(log: &mut StatusLog, id: TaskId) -> Vec<(TaskStatus, Option<Arc<str>>)> {
    let mut seen: Vec<(TaskStatus, Option<Arc<str>>)> = Vec::new();
    while !seen.last().is_some_and(|(s, _)| s.is_terminal()) {
        let (task, status, reason) = timeout(WAIT, log.recv())
            .await
            .expect("status not published in time")
            .expect("status channel closed");
        if task == id {
            seen.push((status, reason));
        }
    }
    seen
}

#[tokio::test]
async fn echo_reports_queued_running_succeeded() {
    let wb = Workbench::builder(Config::default()).build().unwrap();
    let (service, mut log) = WorkspaceService::new();
    wb.register(service).await.unwrap();
    wb.start().await.unwrap();

    let id = wb.dispatch(Arc::new(Echo::new("ping")));
    let seen: Vec<TaskStatus> = statuses(&mut log, id).await.into_iter().map(|(s, _)| s).collect();
    assert_eq!(
        seen,
        vec![TaskStatus::Queued, TaskStatus::Running, TaskStatus::Succeeded]
    );

    wb.shutdown().await.unwrap();
}

#[tokio::test]
async fn duplicate_service_aborts_startup() {
    let wb = Workbench::builder(Config::default()).build().unwrap();
    let (first, _log1) = WorkspaceService::new();
    let (second, _log2) = WorkspaceService::new();

    wb.register(first).await.unwrap();
    let err = wb.register(second).await.unwrap_err();
    assert_eq!(err.as_label(), "runtime_duplicate_service");
}

#[tokio::test]
async fn overlapping_write_transaction_conflicts_immediately() {
    let wb = Workbench::builder(Config::default()).build().unwrap();
    wb.models().register_factory(Arc::new(ClassModelFactory)).unwrap();
    wb.start().await.unwrap();

    let first = wb
        .models()
        .open_transaction("class-model", &[ResourceId::new(42)], AccessMode::Write)
        .await
        .unwrap();

    let second = timeout(
        WAIT,
        wb.models().open_transaction(
            "class-model",
            &[ResourceId::new(42), ResourceId::new(7)],
            AccessMode::Write,
        ),
    )
    .await
    .expect("conflicting open must not block");
    match second {
        Err(ModelError::TransactionConflict { resource, held }) => {
            assert_eq!(resource, ResourceId::new(42));
            assert_eq!(held, AccessMode::Write);
        }
        Err(other) => panic!("expected a conflict, got {other}"),
        Ok(_) => panic!("expected a conflict, got a transaction"),
    }
    assert_eq!(wb.models().lock_state(ResourceId::new(7)), None);

    let seven = wb
        .models()
        .open_transaction("class-model", &[ResourceId::new(7)], AccessMode::Write)
        .await
        .unwrap();
    seven.discard();
    first.discard();
    wb.shutdown().await.unwrap();
}

#[tokio::test]
async fn closing_workspace_cancels_task_and_releases_its_transaction() {
    let wb = Workbench::builder(Config::default()).build().unwrap();
    wb.models().register_factory(Arc::new(ClassModelFactory)).unwrap();
    let (service, mut log) = WorkspaceService::new();
    wb.register(service).await.unwrap();
    wb.start().await.unwrap();

    let holding = Arc::new(Notify::new());
    let signal = Arc::clone(&holding);
    let models: Arc<ContentModels> = Arc::clone(wb.models());
    let id = wb.dispatch(CommandFn::arc("rewrite-class", move |ctx: CommandContext| {
        let models = Arc::clone(&models);
        let signal = Arc::clone(&signal);
        async move {
            let mut tx = models
                .open_transaction("class-model", &[ResourceId::new(42)], AccessMode::Write)
                .await?;
            if let Some(model) = tx.model_mut::<ClassModel>() {
                model.methods.push("<init>".into());
            }
            signal.notify_one();
            ctx.cancelled().await;
            tx.commit().await?;
            Ok::<_, TaskError>(None)
        }
    }));

    timeout(WAIT, holding.notified()).await.unwrap();
    assert!(wb.models().lock_state(ResourceId::new(42)).is_some());

    wb.workspace().close();
    let seen = statuses(&mut log, id).await;
    assert_eq!(
        seen.iter().map(|(s, _)| *s).collect::<Vec<_>>(),
        vec![TaskStatus::Queued, TaskStatus::Running, TaskStatus::Failed]
    );
    assert_eq!(seen[2].1.as_deref(), Some("Cancelled"));

    assert_eq!(wb.models().lock_state(ResourceId::new(42)), None);
    let again = wb
        .models()
        .open_transaction("class-model", &[ResourceId::new(42)], AccessMode::Write)
        .await
        .unwrap();
    again.discard();
    wb.shutdown().await.unwrap();
}

/// Attaches two class entries below the archive root.
struct JarHandler;

#[async_trait]
impl ArchiveHandler for JarHandler {
    async fn expand(&self, archive: ResourceId, workspace: &Workspace) -> anyhow::Result<()> {
        for entry in ["com/acme/Main.class", "com/acme/Util.class"] {
            workspace.add_resource(Some(archive), entry)?;
        }
        Ok(())
    }
}

/// Analyses every added class in a write transaction.
struct AnalysisService {
    models: Arc<ContentModels>,
}

#[async_trait]
impl Service for AnalysisService {
    fn name(&self) -> &str {
        "structural-analysis"
    }

    async fn initialize(&self, broker: &Broker) -> anyhow::Result<()> {
        let models = Arc::clone(&self.models);
        broker.subscribe(
            EventKind::AddedResource,
            HandlerFn::arc("structural-analysis", move |ev: Event| {
                let models = Arc::clone(&models);
                async move {
                    let (Some(id), Some(handle)) = (ev.resource, ev.handle) else {
                        return Ok(());
                    };
                    if !handle.as_str().ends_with(".class") {
                        return Ok(());
                    }
                    let mut tx = models
                        .open_transaction("class-model", &[id], AccessMode::Write)
                        .await?;
                    if let Some(model) = tx.model_mut::<ClassModel>() {
                        model.methods.push("main".into());
                    }
                    tx.commit().await?;
                    anyhow::Ok(())
                }
            }),
        );
        Ok(())
    }
}

#[tokio::test]
async fn import_flows_through_analysis_to_updates() {
    let (tx, mut updates) = mpsc::unbounded_channel();
    let observer = HandlerFn::arc("update-observer", move |ev: Event| {
        let tx = tx.clone();
        async move {
            if ev.kind == EventKind::UpdatedResource {
                let _ = tx.send(ev.handle.map(|h| h.as_str().to_string()));
            }
            Ok(())
        }
    });
    let wb = Workbench::builder(Config::default())
        .with_observer(observer)
        .build()
        .unwrap();

    wb.models().register_factory(Arc::new(ClassModelFactory)).unwrap();
    wb.plugins().archives.register("jar", Arc::new(JarHandler)).unwrap();
    wb.register(Arc::new(AnalysisService {
        models: Arc::clone(wb.models()),
    }))
    .await
    .unwrap();
    wb.start().await.unwrap();

    let id = wb.import_archive("jar", "app.jar");
    let done = timeout(WAIT, wb.dispatcher().wait(id)).await.unwrap().unwrap();
    assert_eq!(done.status, TaskStatus::Succeeded, "{:?}", done.reason);

    let root = ResourceId::new(done.output.unwrap().parse().unwrap());
    assert_eq!(wb.tree().children(root).unwrap().len(), 2);

    let mut updated = Vec::new();
    for _ in 0..2 {
        updated.push(timeout(WAIT, updates.recv()).await.unwrap().unwrap());
    }
    updated.sort();
    assert_eq!(
        updated,
        vec![
            Some("com/acme/Main.class".to_string()),
            Some("com/acme/Util.class".to_string())
        ]
    );

    let unknown = wb.import_archive("rar", "old.rar");
    let failed = timeout(WAIT, wb.dispatcher().wait(unknown)).await.unwrap().unwrap();
    assert_eq!(failed.status, TaskStatus::Failed);
    assert_eq!(failed.reason.as_deref(), Some("no handler for archive type 'rar'"));

    wb.shutdown().await.unwrap();
}
