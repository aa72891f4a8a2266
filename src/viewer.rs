//! Viewer session and polling loops.
//!
//! A [`Viewer`] owns one [`Session`]: the scene currently shown, the version
//! it was loaded for and the pose timer feeding it. Two cadences drive it:
//!
//! 1. every `scene_poll_interval_ms` the scene version is fetched; a change
//!    starts a full reload in the background
//! 2. every `pose_interval_ms` (only while a scene is loaded) the latest pose
//!    record is fetched and applied
//!
//! Everything runs on one thread. Loads are tagged with a generation number
//! so that a slow load finishing after a newer version was announced is
//! dropped instead of replacing the newer scene. Installing a scene replaces
//! the pose timer, so at most one is ever alive.

use std::{
    cell::{Ref, RefCell},
    rc::Rc,
};

use anyhow::Context as _;
use futures::future::{AbortHandle, Abortable};
use instant::{Duration, Instant};

use crate::{
    builder::{BuiltScene, build_scene},
    config::ViewerConfig,
    pose::apply_pose_record,
    resources::load_assets,
    transport::{HttpSource, SceneSource},
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// State of the pose update cadence.
#[derive(Debug, Default)]
pub enum PoseTimer {
    /// No scene loaded yet.
    #[default]
    Idle,
    Active(AbortHandle),
}

/// Everything that changes over the lifetime of a viewer.
#[derive(Debug)]
pub struct Session {
    version: Option<serde_json::Value>,
    generation: u64,
    scene: Option<BuiltScene>,
    pose_timer: PoseTimer,
    reloads: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            version: None,
            generation: 0,
            scene: None,
            pose_timer: PoseTimer::Idle,
            reloads: 0,
        }
    }

    /// Records the version reported by the host. Returns the generation of
    /// the load that has to follow, or `None` if nothing changed.
    ///
    /// The first version seen starts the initial load; every later change
    /// counts as a reload. Until then the host reports `0` for "no scene yet".
    pub fn observe_version(&mut self, version: serde_json::Value) -> Option<u64> {
        match &self.version {
            Some(current) if *current == version => return None,
            Some(current) => {
                log::info!("Scene version changed from {} to {}, reloading", current, version);
                self.reloads += 1;
            }
            None if version == serde_json::Value::from(0) => return None,
            None => log::info!("Loading scene version {}", version),
        }
        self.version = Some(version);
        self.generation += 1;
        Some(self.generation)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    /// Replaces the shown scene unless a newer load has been requested since
    /// `generation` was handed out.
    pub fn install(&mut self, generation: u64, scene: BuiltScene) -> bool {
        if !self.is_current(generation) {
            log::info!(
                "Discarding scene of generation {}, generation {} is pending",
                generation,
                self.generation
            );
            return false;
        }
        self.scene = Some(scene);
        true
    }

    /// Stops the running pose timer, if any, and remembers the new one.
    pub fn replace_pose_timer(&mut self, handle: AbortHandle) {
        if let PoseTimer::Active(previous) = std::mem::replace(&mut self.pose_timer, PoseTimer::Active(handle)) {
            previous.abort();
        }
    }

    pub fn stop_pose_timer(&mut self) {
        if let PoseTimer::Active(previous) = std::mem::take(&mut self.pose_timer) {
            previous.abort();
        }
    }

    pub fn pose_timer(&self) -> &PoseTimer {
        &self.pose_timer
    }

    pub fn version(&self) -> Option<&serde_json::Value> {
        self.version.as_ref()
    }

    /// Number of loads requested so far, the initial one included.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// How many version changes after the initial load triggered a reload.
    pub fn reloads(&self) -> usize {
        self.reloads
    }

    pub fn scene(&self) -> Option<&BuiltScene> {
        self.scene.as_ref()
    }

    pub fn scene_mut(&mut self) -> Option<&mut BuiltScene> {
        self.scene.as_mut()
    }
}

/// A viewer bound to one scene source.
///
/// Cloning is cheap and yields a handle onto the same session.
pub struct Viewer<S> {
    source: Rc<S>,
    config: Rc<ViewerConfig>,
    session: Rc<RefCell<Session>>,
}

impl<S> Clone for Viewer<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            config: self.config.clone(),
            session: self.session.clone(),
        }
    }
}

impl<S: SceneSource + 'static> Viewer<S> {
    pub fn new(source: S, config: ViewerConfig) -> Self {
        Self {
            source: Rc::new(source),
            config: Rc::new(config),
            session: Rc::new(RefCell::new(Session::new())),
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn session(&self) -> Ref<'_, Session> {
        self.session.borrow()
    }

    /// Fetches the scene version. Returns the generation to load if it changed.
    pub async fn check_version(&self) -> anyhow::Result<Option<u64>> {
        let version = self
            .source
            .scene_id()
            .await
            .context("Cannot read the scene version")?;
        Ok(self.session.borrow_mut().observe_version(version))
    }

    /// Fetches the scene description and its assets, builds the graph and
    /// installs it if `generation` is still the latest. Returns whether the
    /// scene was installed.
    pub async fn reload(&self, generation: u64) -> anyhow::Result<bool> {
        let started = Instant::now();
        let description = self
            .source
            .scene_data()
            .await
            .context("Cannot read the scene description")?;
        let assets = load_assets(self.source.as_ref(), &description, &self.config).await;

        if !self.session.borrow().is_current(generation) {
            log::info!("Dropping assets of generation {generation}, a newer scene was announced");
            return Ok(false);
        }
        let scene = build_scene(&description, &assets, &self.config);
        let installed = self.session.borrow_mut().install(generation, scene);
        if installed {
            log::info!(
                "Scene {} (generation {}) ready after {:?}",
                description.id,
                generation,
                started.elapsed()
            );
        }
        Ok(installed)
    }

    /// Fetches the latest pose record and applies it to the current scene.
    /// Returns the number of nodes written; zero while idle.
    pub async fn tick(&self) -> anyhow::Result<usize> {
        if self.session.borrow().scene().is_none() {
            return Ok(0);
        }
        let record = self
            .source
            .scene_state()
            .await
            .context("Cannot read the scene state")?;
        if record.is_empty() {
            return Ok(0);
        }
        let mut session = self.session.borrow_mut();
        let Some(scene) = session.scene_mut() else {
            return Ok(0);
        };
        Ok(apply_pose_record(scene, &record, &self.config))
    }

    /// Starts a fresh pose cadence, stopping the previous one first.
    fn start_pose_timer(&self) {
        let (handle, registration) = AbortHandle::new_pair();
        let viewer = self.clone();
        let period = self.config.pose_interval();
        let pose_loop = async move {
            loop {
                let started = Instant::now();
                if let Err(e) = viewer.tick().await {
                    log::error!("Error updating the scene: {:#}", e);
                }
                sleep(period.saturating_sub(started.elapsed())).await;
            }
        };
        self.session.borrow_mut().replace_pose_timer(handle);
        spawn_local(async move {
            let _ = Abortable::new(pose_loop, registration).await;
        });
    }

    /// Stops applying poses until the next scene is installed.
    pub fn pause_updates(&self) {
        self.session.borrow_mut().stop_pose_timer();
    }

    async fn load_and_activate(&self, generation: u64) {
        match self.reload(generation).await {
            Ok(true) => self.start_pose_timer(),
            Ok(false) => {}
            Err(e) => log::error!("Error loading the scene: {:#}", e),
        }
    }

    /// Polls the scene version forever, reloading whenever it changes.
    ///
    /// Must run inside a single-threaded executor that supports local tasks.
    pub async fn run(self) {
        let period = self.config.scene_poll_interval();
        loop {
            let started = Instant::now();
            match self.check_version().await {
                Ok(Some(generation)) => {
                    let viewer = self.clone();
                    spawn_local(async move { viewer.load_and_activate(generation).await });
                }
                Ok(None) => {}
                Err(e) => log::error!("Error polling the scene version: {:#}", e),
            }
            sleep(period.saturating_sub(started.elapsed())).await;
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn spawn_local<F: Future<Output = ()> + 'static>(future: F) {
    tokio::task::spawn_local(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn_local<F: Future<Output = ()> + 'static>(future: F) {
    wasm_bindgen_futures::spawn_local(future);
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}

#[cfg(target_arch = "wasm32")]
async fn sleep(duration: Duration) {
    let millis = duration.as_millis().min(i32::MAX as u128) as i32;
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        let Some(window) = web_sys::window() else {
            log::error!("No window to schedule a timer on");
            return;
        };
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis) {
            log::error!("Cannot schedule a timer: {:?}", e);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

/// Sets up logging for the current platform. Safe to call more than once.
pub fn init_logger() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        // Only fails when a logger is already installed.
        let _ = console_log::init_with_level(log::Level::Info);
    }
}

/// Runs a viewer against the HTTP host described by `config` until the
/// process (or page) ends.
pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    init_logger();
    let source = HttpSource::new(config.base_url.as_deref())?;
    let viewer = Viewer::new(source, config);

    #[cfg(not(target_arch = "wasm32"))]
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let local = tokio::task::LocalSet::new();
        local.block_on(&runtime, viewer.run());
    }

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(viewer.run());
    }

    Ok(())
}

/// Browser entry point: mirrors the scene served by the page's own origin.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn start() -> Result<(), JsValue> {
    run(ViewerConfig::default()).map_err(|e| JsValue::from_str(&format!("{:#}", e)))
}
