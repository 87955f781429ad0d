// ── Controller abstraction ──
//
// Full lifecycle management for a fleet of devices. Owns the poll
// cycles, the schedule tick, the single merge task every outcome flows
// through, and the command processor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use hydrohomie_api::{HomieClient, TransportConfig};

use crate::command::{Command, CommandEnvelope, CommandResult, ConfigChange};
use crate::config::EngineConfig;
use crate::convert::history_samples;
use crate::error::CoreError;
use crate::model::{
    Category, ConfigFields, DeviceAddress, DeviceError, DeviceRecord, HistorySample, PollOutcome,
    RecordUpdate,
};
use crate::persist::DirectoryPersistence;
use crate::schedule::{ScheduleBoard, ScheduleView};
use crate::selection::SelectionTracker;
use crate::store::DataStore;
use crate::stream::RecordStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── EngineState ──────────────────────────────────────────────────

/// Lifecycle state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running,
}

/// One outcome queued for the merge task, with an optional
/// acknowledgement carrying the merged record.
struct MergeRequest {
    update: RecordUpdate,
    applied: Option<oneshot::Sender<Option<Arc<DeviceRecord>>>>,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Manages the engine
/// lifecycle: directory loading, background polling, schedule
/// recomputation, command routing, and reactive record streaming.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: EngineConfig,
    client: HomieClient,
    store: Arc<DataStore>,
    selection: SelectionTracker,
    persistence: Arc<dyn DirectoryPersistence>,
    engine_state: watch::Sender<EngineState>,
    schedules: watch::Sender<Arc<ScheduleBoard>>,
    command_tx: Mutex<mpsc::Sender<CommandEnvelope>>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    /// Entry point of the merge task for the current run.
    merge_tx: Mutex<Option<mpsc::UnboundedSender<MergeRequest>>>,
    cancel: CancellationToken,
    /// Child token for the current run; cancelled on stop, replaced on start.
    cancel_child: Mutex<CancellationToken>,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
    /// Per-device fetches spawned by poll cycles and commands.
    fetches: TaskTracker,
    /// Source of freshness sequence numbers.
    sequence: AtomicU64,
    /// Non-fatal problems (persistence failures) for the consumer to show.
    warnings: Mutex<Vec<String>>,
}

impl Controller {
    /// Create a controller. Does NOT start polling; call
    /// [`start()`](Self::start) to load the directory and spawn tasks.
    pub fn new(
        config: EngineConfig,
        persistence: Arc<dyn DirectoryPersistence>,
    ) -> Result<Self, CoreError> {
        let transport = TransportConfig::with_timeout(config.request_timeout);
        let client = HomieClient::new(&transport).map_err(|e| {
            CoreError::Internal(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self::with_client(config, client, persistence))
    }

    /// Create a controller around a pre-built client.
    pub fn with_client(
        config: EngineConfig,
        client: HomieClient,
        persistence: Arc<dyn DirectoryPersistence>,
    ) -> Self {
        let store = Arc::new(DataStore::new());
        let selection = SelectionTracker::new(Arc::clone(&store));
        let (engine_state, _) = watch::channel(EngineState::Stopped);
        let (schedules, _) = watch::channel(Arc::new(ScheduleBoard::default()));
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
        let cancel = CancellationToken::new();
        let cancel_child = cancel.child_token();

        Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                store,
                selection,
                persistence,
                engine_state,
                schedules,
                command_tx: Mutex::new(command_tx),
                command_rx: Mutex::new(Some(command_rx)),
                merge_tx: Mutex::new(None),
                cancel,
                cancel_child: Mutex::new(cancel_child),
                task_handles: Mutex::new(Vec::new()),
                fetches: TaskTracker::new(),
                sequence: AtomicU64::new(0),
                warnings: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Access the underlying DataStore.
    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.inner.selection
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Start the engine.
    ///
    /// Loads the persisted directory, then spawns the merge task, the
    /// command processor, and whichever periodic tasks have a non-zero
    /// period. Poll cycles fire immediately, so every loaded address
    /// gets its first fetches without waiting a full period.
    pub async fn start(&self) -> Result<(), CoreError> {
        if self.is_running() {
            return Ok(());
        }

        let child = self.inner.cancel.child_token();
        *self.inner.cancel_child.lock().await = child.clone();

        self.load_directory().await;

        let (merge_tx, merge_rx) = mpsc::unbounded_channel();
        *self.inner.merge_tx.lock().await = Some(merge_tx.clone());
        self.inner.fetches.reopen();

        let mut handles = self.inner.task_handles.lock().await;

        {
            let store = Arc::clone(&self.inner.store);
            handles.push(tokio::spawn(merge_task(store, merge_rx, child.clone())));
        }

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx, child.clone())));
        }

        let config = &self.inner.config;
        for (category, period) in [
            (Category::Status, config.status_interval),
            (Category::Config, config.config_interval),
        ] {
            if !period.is_zero() {
                let ctrl = self.clone();
                let tx = merge_tx.clone();
                let cancel = child.clone();
                handles.push(tokio::spawn(poll_task(ctrl, category, period, tx, cancel)));
            }
        }

        if !config.schedule_tick.is_zero() {
            let ctrl = self.clone();
            let cancel = child.clone();
            let period = config.schedule_tick;
            handles.push(tokio::spawn(schedule_tick_task(ctrl, period, cancel)));
        }

        self.inner.engine_state.send_replace(EngineState::Running);
        info!(devices = self.inner.store.device_count(), "engine started");
        Ok(())
    }

    /// Stop the engine.
    ///
    /// Cancels background tasks and in-flight fetches, joins them, and
    /// resets the state to [`Stopped`](EngineState::Stopped). Records
    /// and the directory are kept; `start()` may be called again.
    pub async fn stop(&self) {
        self.inner.cancel_child.lock().await.cancel();

        self.inner.fetches.close();
        self.inner.fetches.wait().await;

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        *self.inner.merge_tx.lock().await = None;

        // The previous receiver was consumed by the command processor.
        {
            let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);
            *self.inner.command_tx.lock().await = tx;
            *self.inner.command_rx.lock().await = Some(rx);
        }

        self.inner.engine_state.send_replace(EngineState::Stopped);
        debug!("engine stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.inner.engine_state.borrow() == EngineState::Running
    }

    /// Fetch status and config for every address now and wait until
    /// all outcomes are merged. Failures are recorded per device, not
    /// returned.
    pub async fn refresh(&self) -> Result<(), CoreError> {
        let tx = self.merge_sender().await?;
        let directory = self.inner.store.directory();

        let pending: Vec<_> = directory
            .iter()
            .flat_map(|address| {
                [Category::Status, Category::Config].map(|category| (category, address.clone()))
            })
            .map(|(category, address)| {
                let seq = self.next_seq();
                let client = self.inner.client.clone();
                async move {
                    let outcome = fetch_category(&client, category, &address).await;
                    RecordUpdate {
                        address,
                        seq,
                        at: Utc::now(),
                        outcome,
                    }
                }
            })
            .collect();

        let updates = futures_util::future::join_all(pending).await;
        let mut acks = Vec::with_capacity(updates.len());
        for update in updates {
            let (ack_tx, ack_rx) = oneshot::channel();
            tx.send(MergeRequest {
                update,
                applied: Some(ack_tx),
            })
            .map_err(|_| CoreError::EngineStopped)?;
            acks.push(ack_rx);
        }
        for ack in acks {
            ack.await.map_err(|_| CoreError::EngineStopped)?;
        }

        self.recompute_schedules();
        debug!(devices = directory.len(), "refresh complete");
        Ok(())
    }

    // ── Command execution ────────────────────────────────────────

    /// Execute a command.
    ///
    /// Sends the command through the internal channel to the command
    /// processor task and awaits the result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if !self.is_running() {
            return Err(CoreError::EngineStopped);
        }

        let (tx, rx) = oneshot::channel();

        let command_tx = self.inner.command_tx.lock().await.clone();

        command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::EngineStopped)?;

        rx.await.map_err(|_| CoreError::EngineStopped)?
    }

    pub async fn add_device(&self, address: DeviceAddress) -> Result<Arc<DeviceRecord>, CoreError> {
        match self.execute(Command::AddDevice { address }).await? {
            CommandResult::Added(record) => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn remove_device(
        &self,
        address: DeviceAddress,
    ) -> Result<Arc<DeviceRecord>, CoreError> {
        match self.execute(Command::RemoveDevice { address }).await? {
            CommandResult::Removed(record) => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn update_config(
        &self,
        address: DeviceAddress,
        change: ConfigChange,
    ) -> Result<Arc<DeviceRecord>, CoreError> {
        match self.execute(Command::UpdateConfig { address, change }).await? {
            CommandResult::ConfigApplied(record) => Ok(record),
            other => Err(unexpected(&other)),
        }
    }

    pub async fn force_water(&self, address: DeviceAddress) -> Result<(), CoreError> {
        self.execute(Command::ForceWater { address }).await.map(|_| ())
    }

    pub async fn force_stop(&self, address: DeviceAddress) -> Result<(), CoreError> {
        self.execute(Command::ForceStop { address }).await.map(|_| ())
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// One-shot: start, run closure, stop.
    ///
    /// Optimized for CLI: no poll cycles and no schedule tick, since
    /// a single invocation only needs commands and explicit refreshes.
    pub async fn oneshot<F, Fut, T>(
        config: EngineConfig,
        persistence: Arc<dyn DirectoryPersistence>,
        f: F,
    ) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: std::future::Future<Output = Result<T, CoreError>>,
    {
        let cfg = EngineConfig::oneshot(config.request_timeout);

        let controller = Controller::new(cfg, persistence)?;
        controller.start().await?;
        let result = f(controller.clone()).await;
        controller.stop().await;
        result
    }

    // ── State observation ────────────────────────────────────────

    pub fn engine_state(&self) -> watch::Receiver<EngineState> {
        self.inner.engine_state.subscribe()
    }

    pub fn directory(&self) -> Arc<Vec<DeviceAddress>> {
        self.inner.store.directory()
    }

    pub fn record(&self, address: &DeviceAddress) -> Option<Arc<DeviceRecord>> {
        self.inner.store.record(address)
    }

    pub fn records_snapshot(&self) -> Arc<Vec<Arc<DeviceRecord>>> {
        self.inner.store.records_snapshot()
    }

    pub fn records(&self) -> RecordStream {
        self.inner.store.subscribe_records()
    }

    /// Subscribe to the schedule board republished on every tick.
    pub fn schedules(&self) -> watch::Receiver<Arc<ScheduleBoard>> {
        self.inner.schedules.subscribe()
    }

    /// The schedule for one device, computed now rather than at the
    /// last tick.
    pub fn schedule_for(&self, address: &DeviceAddress) -> Option<ScheduleView> {
        let record = self.inner.store.record(address)?;
        ScheduleView::compute(&record, Utc::now())
    }

    /// Recompute and publish the schedule board from the latest records.
    pub fn recompute_schedules(&self) -> Arc<ScheduleBoard> {
        let board = Arc::new(ScheduleBoard::compute(
            &self.inner.store.records_snapshot(),
            Utc::now(),
        ));
        self.inner.schedules.send_replace(Arc::clone(&board));
        board
    }

    /// Drain non-fatal warnings (e.g. directory persistence failures).
    pub async fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.warnings.lock().await)
    }

    // ── Ad-hoc device queries ────────────────────────────────────
    //
    // These bypass the DataStore and query the device directly.

    /// Fetch the rolling sensor history of a device, oldest first.
    pub async fn fetch_history(
        &self,
        address: &DeviceAddress,
    ) -> Result<Vec<HistorySample>, CoreError> {
        let entries = self
            .inner
            .client
            .get_history(address.as_str())
            .await
            .map_err(|e| CoreError::from_api(address, e))?;
        Ok(history_samples(&entries))
    }

    // ── Internals ────────────────────────────────────────────────

    fn next_seq(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    async fn merge_sender(&self) -> Result<mpsc::UnboundedSender<MergeRequest>, CoreError> {
        self.inner
            .merge_tx
            .lock()
            .await
            .clone()
            .ok_or(CoreError::EngineStopped)
    }

    /// Queue `update` and wait until the merge task has applied it.
    /// Resolves to the current record even if the update was stale.
    async fn merge_and_wait(&self, update: RecordUpdate) -> Result<Arc<DeviceRecord>, CoreError> {
        let address = update.address.clone();
        let tx = self.merge_sender().await?;
        let (ack_tx, ack_rx) = oneshot::channel();
        tx.send(MergeRequest {
            update,
            applied: Some(ack_tx),
        })
        .map_err(|_| CoreError::EngineStopped)?;

        let merged = ack_rx.await.map_err(|_| CoreError::EngineStopped)?;
        merged
            .or_else(|| self.inner.store.record(&address))
            .ok_or_else(|| CoreError::DeviceNotFound {
                address: address.to_string(),
            })
    }

    /// Spawn one tracked fetch whose outcome goes to the merge task.
    fn spawn_fetch(
        &self,
        category: Category,
        address: DeviceAddress,
        tx: &mpsc::UnboundedSender<MergeRequest>,
        cancel: &CancellationToken,
    ) {
        let seq = self.next_seq();
        let client = self.inner.client.clone();
        let tx = tx.clone();
        let cancel = cancel.clone();

        self.inner.fetches.spawn(async move {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                outcome = fetch_category(&client, category, &address) => outcome,
            };
            let _ = tx.send(MergeRequest {
                update: RecordUpdate {
                    address,
                    seq,
                    at: Utc::now(),
                    outcome,
                },
                applied: None,
            });
        });
    }

    /// Dispatch one fetch per directory address without waiting for any.
    fn run_cycle(
        &self,
        category: Category,
        tx: &mpsc::UnboundedSender<MergeRequest>,
        cancel: &CancellationToken,
    ) {
        let directory = self.inner.store.directory();
        if directory.is_empty() {
            return;
        }
        debug!(%category, devices = directory.len(), "poll cycle");
        for address in directory.iter() {
            self.spawn_fetch(category, address.clone(), tx, cancel);
        }
    }

    async fn load_directory(&self) {
        match self.inner.persistence.load() {
            Ok(addresses) => {
                let added = self.inner.store.load_directory(addresses);
                debug!(added, "loaded device directory");
            }
            Err(e) => {
                warn!(error = %e, "failed to load device directory");
                self.inner.warnings.lock().await.push(e.to_string());
            }
        }
    }

    async fn persist_directory(&self) {
        let directory = self.inner.store.directory();
        if let Err(e) = self.inner.persistence.save(&directory) {
            warn!(error = %e, "failed to persist device directory");
            self.inner.warnings.lock().await.push(e.to_string());
        }
    }
}

fn unexpected(result: &CommandResult) -> CoreError {
    CoreError::Internal(format!("unexpected command result: {result:?}"))
}

// ── Background tasks ─────────────────────────────────────────────

/// Single consumer for every poll outcome and command confirmation.
///
/// All record writes other than add/remove happen here, one at a time.
async fn merge_task(
    store: Arc<DataStore>,
    mut rx: mpsc::UnboundedReceiver<MergeRequest>,
    cancel: CancellationToken,
) {
    debug!("merge task started");
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            request = rx.recv() => {
                let Some(request) = request else { break };
                let merged = store.apply_update(&request.update);
                if let Some(ack) = request.applied {
                    let _ = ack.send(merged);
                }
            }
        }
    }
}

/// Periodic poll for one category.
///
/// Each tick dispatches the cycle's fetches and returns to the timer
/// immediately, so a slow device never delays the next tick.
async fn poll_task(
    controller: Controller,
    category: Category,
    period: Duration,
    tx: mpsc::UnboundedSender<MergeRequest>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => controller.run_cycle(category, &tx, &cancel),
        }
    }
}

/// Recompute the schedule board on a fast tick, independent of polling.
async fn schedule_tick_task(controller: Controller, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                controller.recompute_schedules();
            }
        }
    }
}

/// Take commands off the channel and run each as its own tracked task.
///
/// A command waiting on an unresponsive device holds up only its own
/// caller. Commands still in flight at shutdown are dropped, which the
/// caller sees as [`CoreError::EngineStopped`].
async fn command_processor_task(
    controller: Controller,
    mut rx: mpsc::Receiver<CommandEnvelope>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(CommandEnvelope { command, response_tx }) = envelope else { break };
                let ctrl = controller.clone();
                let cancel = cancel.clone();
                controller.inner.fetches.spawn(async move {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => {}
                        result = route_command(&ctrl, command) => {
                            let _ = response_tx.send(result);
                        }
                    }
                });
            }
        }
    }
}

/// One fetch for one category, folded into a `PollOutcome`.
async fn fetch_category(
    client: &HomieClient,
    category: Category,
    address: &DeviceAddress,
) -> PollOutcome {
    let result = match category {
        Category::Status => client
            .get_status(address.as_str())
            .await
            .map(|p| PollOutcome::Status(p.into())),
        Category::Config => client
            .get_config(address.as_str())
            .await
            .map(|p| PollOutcome::Config(p.into())),
    };

    result.unwrap_or_else(|e| {
        let err = CoreError::from_api(address, e);
        debug!(%address, %category, error = %err, "fetch failed");
        PollOutcome::Failed {
            category,
            error: DeviceError::from_error(&err, Utc::now()),
        }
    })
}

// ── Command routing ──────────────────────────────────────────────

async fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    let store = &controller.inner.store;
    let client = &controller.inner.client;

    match cmd {
        Command::AddDevice { address } => {
            if store.contains(&address) {
                return Err(CoreError::DuplicateAddress {
                    address: address.to_string(),
                });
            }

            // Taken before the probe so any poll fetch issued after the
            // insert below is fresher.
            let seq = controller.next_seq();
            let probe = client
                .get_status(address.as_str())
                .await
                .map_err(|e| CoreError::from_api(&address, e))?;

            store.add_device(address.clone())?;
            info!(%address, "device added");
            controller.persist_directory().await;

            let record = controller
                .merge_and_wait(RecordUpdate {
                    address: address.clone(),
                    seq,
                    at: Utc::now(),
                    outcome: PollOutcome::Status(probe.into()),
                })
                .await?;

            let tx = controller.merge_sender().await?;
            let cancel = controller.inner.cancel_child.lock().await.clone();
            controller.spawn_fetch(Category::Config, address, &tx, &cancel);

            Ok(CommandResult::Added(record))
        }

        Command::RemoveDevice { address } => {
            let removed = store
                .remove_device(&address)
                .ok_or_else(|| CoreError::DeviceNotFound {
                    address: address.to_string(),
                })?;
            controller.inner.selection.forget(&address);
            info!(%address, "device removed");
            controller.persist_directory().await;
            Ok(CommandResult::Removed(removed))
        }

        Command::UpdateConfig { address, change } => {
            let current = store
                .record(&address)
                .ok_or_else(|| CoreError::DeviceNotFound {
                    address: address.to_string(),
                })?;
            let body = change.to_update(&current)?;

            client
                .update_config(address.as_str(), &body)
                .await
                .map_err(|e| {
                    let err = CoreError::from_api(&address, e);
                    warn!(%address, error = %err, "config update failed");
                    err
                })?;

            let seq = controller.next_seq();
            let record = controller
                .merge_and_wait(RecordUpdate {
                    address: address.clone(),
                    seq,
                    at: Utc::now(),
                    outcome: PollOutcome::Config(ConfigFields::from(&body)),
                })
                .await?;
            info!(%address, "config updated");
            Ok(CommandResult::ConfigApplied(record))
        }

        Command::ForceWater { address } => {
            require_known(store, &address)?;
            client.force_water(address.as_str()).await.map_err(|e| {
                let err = CoreError::from_api(&address, e);
                warn!(%address, error = %err, "force water failed");
                err
            })?;
            info!(%address, "watering started");
            Ok(CommandResult::Ok)
        }

        Command::ForceStop { address } => {
            require_known(store, &address)?;
            client.force_stop(address.as_str()).await.map_err(|e| {
                let err = CoreError::from_api(&address, e);
                warn!(%address, error = %err, "force stop failed");
                err
            })?;
            info!(%address, "watering stopped");
            Ok(CommandResult::Ok)
        }
    }
}

fn require_known(store: &DataStore, address: &DeviceAddress) -> Result<(), CoreError> {
    if store.contains(address) {
        Ok(())
    } else {
        Err(CoreError::DeviceNotFound {
            address: address.to_string(),
        })
    }
}
