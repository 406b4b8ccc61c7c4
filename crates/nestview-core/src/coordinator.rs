//! The window-embedding lifecycle coordinator.
//!
//! Owns the full lifecycle of a host-window / rendering-surface pair: the
//! creation sequence, the embedding relation, the poll loop that drains the
//! native message queue, and the teardown handshake. Two window objects with
//! different owners exist underneath; the coordinator holds non-owning
//! references to both and enforces the one order of operations that keeps
//! the window manager and the compositor consistent:
//!
//! - parenting and child styles are applied before the surface becomes
//!   visible, so it never flashes as an independent top-level window
//! - the poll loop is cancelled before either handle is destroyed
//! - the surface is destroyed strictly before the host
//!
//! Everything runs on one cooperative scheduler; [`create`] must be called
//! inside a [`tokio::task::LocalSet`].

use std::cell::RefCell;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, trace, warn};

use nestview_platform::{
    Bounds, NativeHandle, PlatformSurface, PositionFlags, RenderingHost, StyleMask, SurfaceConfig,
    SurfaceEvent, SurfaceId,
};

use crate::config::{ColorScheme, Theme, WindowConfig};
use crate::error::{CreationError, CreationStep, RuntimeError};
use crate::events::{ObserverRegistry, WindowEvent};
use crate::instance::WindowInstance;

/// Lifecycle of one embedded window pair. Transitions are strictly forward;
/// `Ready` absorbs repeated geometry and style updates without a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LifecycleState {
    Uninitialized,
    CreatingHost,
    CreatingSurface,
    Embedding,
    Ready,
    ClosingRequested,
    TearingDown,
    Destroyed,
}

/// What triggered teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` called on the instance facade.
    Explicit,
    /// Close request from the window manager.
    CloseRequested,
    /// The message pump drain failed.
    PollFailure,
    /// Application-wide quit.
    AppQuit,
}

/// The parent→child relation between the host window and the embedded
/// surface, plus the child styles currently applied. Derived state owned by
/// the coordinator; exists only while both handles are live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingRelation {
    pub host: NativeHandle,
    pub surface: NativeHandle,
    pub child_styles: StyleMask,
}

/// State shared between the coordinator, the poll loop, the surface event
/// subscription, and every clone of the instance facade.
pub(crate) struct Shared {
    pub(crate) platform: Rc<dyn PlatformSurface>,
    pub(crate) renderer: Rc<dyn RenderingHost>,
    pub(crate) host: NativeHandle,
    pub(crate) surface: SurfaceId,
    pub(crate) surface_handle: NativeHandle,
    pub(crate) relation: Option<EmbeddingRelation>,
    pub(crate) state: LifecycleState,
    pub(crate) observers: ObserverRegistry,
    pub(crate) poll_task: Option<JoinHandle<()>>,
    pub(crate) on_close: Option<Rc<dyn Fn()>>,
    pub(crate) on_error: Option<Rc<dyn Fn(&RuntimeError)>>,
    content_scheme: Option<ColorScheme>,
    content_css_injected: bool,
    load_waiter: Option<oneshot::Sender<()>>,
}

fn advance(state: &mut LifecycleState, to: LifecycleState) {
    debug_assert!(to > *state, "lifecycle transitions are strictly forward");
    trace!(from = ?*state, ?to, "lifecycle transition");
    *state = to;
}

/// Create a native host window with an embedded rendering surface.
///
/// Resolves once the initial content load has completed and the instance is
/// `Ready`. On a structural failure, every handle created by earlier steps
/// is destroyed (surface before host) before the error is returned.
///
/// Must be called from within a [`tokio::task::LocalSet`]; the poll loop is
/// spawned onto it.
pub async fn create(
    mut config: WindowConfig,
    platform: Rc<dyn PlatformSurface>,
    renderer: Rc<dyn RenderingHost>,
) -> Result<WindowInstance, CreationError> {
    config.validate()?;
    debug!(?config, "creating embedded window");

    let mut state = LifecycleState::Uninitialized;
    advance(&mut state, LifecycleState::CreatingHost);

    let host = platform
        .create_window(config.width, config.height)
        .map_err(|e| CreationError::new(CreationStep::HostCreation, e))?;
    info!(host = host.raw(), width = config.width, height = config.height, "host window created");

    match embed(&mut config, &platform, &renderer, host, &mut state).await {
        Ok(instance) => Ok(instance),
        Err(failure) => {
            error!(step = %failure.error.step, "window creation failed, unwinding");
            if let Some(surface) = failure.surface {
                if let Err(e) = renderer.destroy_surface(surface) {
                    warn!(error = %e, "surface destroy failed during unwind");
                }
            }
            if let Err(e) = platform.destroy_window(host) {
                warn!(error = %e, "host destroy failed during unwind");
            }
            Err(failure.error)
        }
    }
}

struct EmbedFailure {
    surface: Option<SurfaceId>,
    error: CreationError,
}

fn fail(
    surface: Option<SurfaceId>,
    step: CreationStep,
    source: impl Into<anyhow::Error>,
) -> EmbedFailure {
    EmbedFailure {
        surface,
        error: CreationError::new(step, source),
    }
}

async fn embed(
    config: &mut WindowConfig,
    platform: &Rc<dyn PlatformSurface>,
    renderer: &Rc<dyn RenderingHost>,
    host: NativeHandle,
    state: &mut LifecycleState,
) -> Result<WindowInstance, EmbedFailure> {
    if let Err(e) = platform.show_window(host) {
        warn!(error = %e, "failed to show host window");
    }

    // Cosmetic host setup: failures are logged, never fatal.
    if let Some(title) = &config.title {
        if let Err(e) = platform.set_title(host, title) {
            warn!(error = %e, "failed to set window title");
        }
    }
    if let Err(e) = platform.set_icon_visible(host, config.show_icon) {
        warn!(error = %e, "failed to set window icon visibility");
    }
    if let Some(scheme) = config.theme.as_ref().and_then(Theme::titlebar) {
        if let Err(e) = platform.set_dark_mode(host, scheme == ColorScheme::Dark) {
            warn!(error = %e, "failed to set titlebar theme");
        }
    }

    advance(state, LifecycleState::CreatingSurface);

    // The surface is created hidden so parenting and style patching finish
    // before the window manager ever composites it.
    if config.surface.host_scripting || !config.surface.content_isolation {
        warn!("surface options weakening content isolation are ignored for embedding");
    }
    let surface_config = SurfaceConfig {
        bounds: Bounds::new(
            config.x.unwrap_or(0),
            config.y.unwrap_or(0),
            config.width,
            config.height,
        ),
        visible: false,
        frameless: true,
        content_isolation: true,
        host_scripting: false,
    };
    let surface = renderer
        .create_surface(&surface_config)
        .map_err(|e| fail(None, CreationStep::SurfaceCreation, e))?;
    debug!(surface = surface.raw(), "rendering surface created");

    advance(state, LifecycleState::Embedding);

    let surface_handle = renderer
        .native_handle(surface)
        .map_err(|e| fail(Some(surface), CreationStep::Embedding, e))?;

    platform
        .set_parent(surface_handle, host)
        .map_err(|e| fail(Some(surface), CreationStep::Embedding, e))?;

    let child_styles = StyleMask::CHILD;
    platform
        .set_styles(
            surface_handle,
            child_styles,
            StyleMask::POPUP | StyleMask::OVERLAPPED_WINDOW,
        )
        .map_err(|e| fail(Some(surface), CreationStep::InitialStyle, e))?;

    platform
        .set_position(
            surface_handle,
            Bounds::at_origin(config.width, config.height),
            PositionFlags::NO_ZORDER | PositionFlags::FRAME_CHANGED,
        )
        .map_err(|e| fail(Some(surface), CreationStep::InitialPosition, e))?;

    if let Err(e) = platform.attach_child(host, surface_handle) {
        warn!(error = %e, "failed to record embedding relation on host");
    }
    info!(
        host = host.raw(),
        surface = surface_handle.raw(),
        "surface embedded under host"
    );

    apply_style_deltas(platform, host, config);

    let (load_tx, load_rx) = oneshot::channel();
    let shared = Rc::new(RefCell::new(Shared {
        platform: platform.clone(),
        renderer: renderer.clone(),
        host,
        surface,
        surface_handle,
        relation: Some(EmbeddingRelation {
            host,
            surface: surface_handle,
            child_styles,
        }),
        state: *state,
        observers: ObserverRegistry::default(),
        poll_task: None,
        on_close: config.on_close.take(),
        on_error: config.on_error.take(),
        content_scheme: config.theme.as_ref().and_then(Theme::content),
        content_css_injected: false,
        load_waiter: Some(load_tx),
    }));

    {
        let weak = Rc::downgrade(&shared);
        renderer
            .subscribe(surface, Rc::new(move |event| on_surface_event(&weak, event)))
            .map_err(|e| fail(Some(surface), CreationStep::Embedding, e))?;
    }

    renderer
        .load_url(surface, &config.url)
        .map_err(|e| fail(Some(surface), CreationStep::ContentLoad, e))?;

    // Adapter-specific tuning gets both raw handles. A panic here is routed
    // to on_error; it never aborts creation.
    if let Some(tune) = config.tune_native.take() {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| tune(host, surface_handle))) {
            let message = panic_message(payload);
            error!(message = %message, "host customization callback panicked");
            report_error(&shared, &RuntimeError::Callback(message));
        }
    }

    if load_rx.await.is_err() {
        return Err(fail(
            Some(surface),
            CreationStep::ContentLoad,
            anyhow::anyhow!("content load interrupted"),
        ));
    }
    debug!(surface = surface.raw(), url = %config.url, "initial content loaded");

    if let Err(e) = renderer.show(surface) {
        warn!(error = %e, "failed to show surface after load");
    }
    if config.center {
        if let Err(e) = renderer.center(surface) {
            warn!(error = %e, "failed to center window");
        }
    }

    advance(state, LifecycleState::Ready);
    shared.borrow_mut().state = LifecycleState::Ready;

    let instance = WindowInstance::new(shared.clone());
    if let Some(on_ready) = config.on_ready.take() {
        let ready_instance = instance.clone();
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| on_ready(ready_instance))) {
            let message = panic_message(payload);
            error!(message = %message, "on_ready callback panicked");
            report_error(&shared, &RuntimeError::Callback(message));
        }
    }

    let poll_task = spawn_poll_loop(&shared, config.poll_period());
    shared.borrow_mut().poll_task = Some(poll_task);

    // Close-request handshake: the window manager asks, the coordinator
    // tears down. Registration failure leaves explicit close() working, so
    // it is not fatal.
    {
        let weak = Rc::downgrade(&shared);
        let result = platform.on_close_requested(
            host,
            Box::new(move || {
                let Some(shared) = weak.upgrade() else { return };
                debug!("close requested by window manager");
                {
                    let mut s = shared.borrow_mut();
                    if s.state < LifecycleState::ClosingRequested {
                        s.state = LifecycleState::ClosingRequested;
                    }
                }
                teardown(&shared, CloseReason::CloseRequested);
            }),
        );
        if let Err(e) = result {
            warn!(error = %e, "failed to register close-request handshake");
        }
    }

    quit::register(&shared);
    info!(host = host.raw(), "embedded window ready");
    Ok(instance)
}

/// Apply caller style deltas to the host, nudging the frame after each so
/// cached decoration metrics are recomputed.
fn apply_style_deltas(
    platform: &Rc<dyn PlatformSurface>,
    host: NativeHandle,
    config: &WindowConfig,
) {
    let nudge = Bounds::at_origin(config.width, config.height);
    let flags = PositionFlags::NO_ZORDER | PositionFlags::NO_MOVE | PositionFlags::FRAME_CHANGED;

    if !config.native_styles_add.is_empty() || !config.native_styles_remove.is_empty() {
        if let Err(e) =
            platform.set_styles(host, config.native_styles_add, config.native_styles_remove)
        {
            warn!(error = %e, "failed to apply host style delta");
        }
        if let Err(e) = platform.set_position(host, nudge, flags) {
            warn!(error = %e, "failed to reposition host after style delta");
        }
    }

    if !config.native_ex_styles_add.is_empty() || !config.native_ex_styles_remove.is_empty() {
        if let Err(e) = platform.set_ex_styles(
            host,
            config.native_ex_styles_add,
            config.native_ex_styles_remove,
        ) {
            warn!(error = %e, "failed to apply host extended style delta");
        }
        if let Err(e) = platform.set_position(host, nudge, flags) {
            warn!(error = %e, "failed to reposition host after extended style delta");
        }
    }
}

/// Forward surface notifications: keep the host geometry in sync (never
/// touching z-order) and deliver application-level events.
fn on_surface_event(weak: &Weak<RefCell<Shared>>, event: &SurfaceEvent) {
    let Some(shared) = weak.upgrade() else { return };

    match event {
        SurfaceEvent::Painted => trace!("surface painted"),
        SurfaceEvent::Resized { width, height } => {
            let (platform, host, closed) = {
                let s = shared.borrow();
                (
                    s.platform.clone(),
                    s.host,
                    s.state >= LifecycleState::TearingDown,
                )
            };
            if closed {
                return;
            }
            if let Err(e) = platform.set_position(
                host,
                Bounds::at_origin(*width, *height),
                PositionFlags::NO_ZORDER | PositionFlags::NO_MOVE,
            ) {
                warn!(error = %e, "failed to propagate surface resize to host");
            }
            emit_event(
                &shared,
                &WindowEvent::Resized {
                    width: *width,
                    height: *height,
                },
            );
        }
        SurfaceEvent::Moved { x, y } => {
            let (platform, host, closed) = {
                let s = shared.borrow();
                (
                    s.platform.clone(),
                    s.host,
                    s.state >= LifecycleState::TearingDown,
                )
            };
            if closed {
                return;
            }
            if let Err(e) = platform.set_position(
                host,
                Bounds::new(*x, *y, 0, 0),
                PositionFlags::NO_ZORDER | PositionFlags::NO_SIZE,
            ) {
                warn!(error = %e, "failed to propagate surface move to host");
            }
            emit_event(&shared, &WindowEvent::Moved { x: *x, y: *y });
        }
        SurfaceEvent::Focused => emit_event(&shared, &WindowEvent::Focused),
        SurfaceEvent::Blurred => emit_event(&shared, &WindowEvent::Blurred),
        SurfaceEvent::LoadFinished => {
            let (renderer, surface, scheme, waiter) = {
                let mut s = shared.borrow_mut();
                let scheme = if s.content_css_injected {
                    None
                } else {
                    s.content_scheme
                };
                if scheme.is_some() {
                    s.content_css_injected = true;
                }
                (s.renderer.clone(), s.surface, scheme, s.load_waiter.take())
            };
            if let Some(scheme) = scheme {
                let css = format!(":root{{color-scheme:{};}}", scheme.as_str());
                if let Err(e) = renderer.inject_css(surface, &css) {
                    warn!(error = %e, "failed to inject content color scheme");
                }
            }
            if let Some(waiter) = waiter {
                let _ = waiter.send(());
            }
            emit_event(&shared, &WindowEvent::Ready);
        }
    }
}

/// Deliver an event to registered observers, outside any registry borrow.
pub(crate) fn emit_event(shared: &Rc<RefCell<Shared>>, event: &WindowEvent) {
    let callbacks = shared.borrow().observers.snapshot(event.kind());
    for callback in callbacks {
        callback(event);
    }
}

fn report_error(shared: &Rc<RefCell<Shared>>, error: &RuntimeError) {
    let on_error = shared.borrow().on_error.clone();
    if let Some(on_error) = on_error {
        on_error(error);
    }
}

/// One message-queue drain per tick; ticks are scheduled, never re-entered.
/// A drain failure is an implicit close: the loop cancels itself and runs
/// the common teardown path.
fn spawn_poll_loop(shared: &Rc<RefCell<Shared>>, period: Duration) -> JoinHandle<()> {
    let weak = Rc::downgrade(shared);
    debug!(?period, "starting poll loop");
    tokio::task::spawn_local(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the loop runs
        // on the configured cadence.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let Some(shared) = weak.upgrade() else { break };
            let (platform, state) = {
                let s = shared.borrow();
                (s.platform.clone(), s.state)
            };
            if state >= LifecycleState::TearingDown {
                break;
            }
            if let Err(e) = platform.poll_events() {
                warn!(error = %e, "message pump drain failed, closing window");
                let runtime_error = RuntimeError::Poll(e);
                teardown(&shared, CloseReason::PollFailure);
                report_error(&shared, &runtime_error);
                break;
            }
        }
        trace!("poll loop exited");
    })
}

/// Tear down the window pair. Idempotent and re-entry safe; every
/// termination path funnels through here.
///
/// Order is load-bearing: the poll loop stops before any handle dies, and
/// the surface is destroyed strictly before the host. Destroying the parent
/// first while a child handle is still registered is the documented cause of
/// compositor faults in this class of embedding.
pub(crate) fn teardown(shared: &Rc<RefCell<Shared>>, reason: CloseReason) {
    let (platform, renderer, host, surface, poll_task, on_close) = {
        let mut s = shared.borrow_mut();
        if s.state >= LifecycleState::TearingDown {
            trace!(?reason, "teardown already ran");
            return;
        }
        s.state = LifecycleState::TearingDown;
        (
            s.platform.clone(),
            s.renderer.clone(),
            s.host,
            s.surface,
            s.poll_task.take(),
            s.on_close.take(),
        )
    };
    info!(?reason, host = host.raw(), "tearing down embedded window");

    if let Some(task) = poll_task {
        task.abort();
    }

    if let Err(e) = renderer.destroy_surface(surface) {
        warn!(error = %e, "surface destroy failed during teardown");
    }
    if let Err(e) = platform.destroy_window(host) {
        warn!(error = %e, "host destroy failed during teardown");
    }

    {
        let mut s = shared.borrow_mut();
        s.state = LifecycleState::Destroyed;
        s.relation = None;
        s.load_waiter = None;
    }
    quit::unregister(shared);

    emit_event(shared, &WindowEvent::Closed);
    if let Some(on_close) = on_close {
        on_close();
    }
    debug!(host = host.raw(), "teardown complete");
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Process-wide registry of live windows, armed once at first create and
/// drained by [`shutdown_all`].
mod quit {
    use super::*;
    use std::sync::Once;

    thread_local! {
        static LIVE: RefCell<Vec<Weak<RefCell<Shared>>>> = const { RefCell::new(Vec::new()) };
    }
    static ARMED: Once = Once::new();

    pub(super) fn register(shared: &Rc<RefCell<Shared>>) {
        ARMED.call_once(|| debug!("quit registry armed"));
        LIVE.with(|live| {
            let mut live = live.borrow_mut();
            live.retain(|w| w.strong_count() > 0);
            live.push(Rc::downgrade(shared));
        });
    }

    pub(super) fn unregister(shared: &Rc<RefCell<Shared>>) {
        let target = Rc::downgrade(shared);
        LIVE.with(|live| {
            live.borrow_mut()
                .retain(|w| w.strong_count() > 0 && !w.ptr_eq(&target));
        });
    }

    pub(super) fn shutdown_all() {
        let targets: Vec<Rc<RefCell<Shared>>> = LIVE.with(|live| {
            live.borrow_mut()
                .drain(..)
                .filter_map(|w| w.upgrade())
                .collect()
        });
        for shared in targets {
            teardown(&shared, CloseReason::AppQuit);
        }
    }
}

/// Close every live embedded window, in registration order.
///
/// Intended for application-wide quit paths; closing an already-closed
/// window is a no-op.
pub fn shutdown_all() {
    quit::shutdown_all();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_states_are_ordered() {
        assert!(LifecycleState::Uninitialized < LifecycleState::CreatingHost);
        assert!(LifecycleState::CreatingHost < LifecycleState::CreatingSurface);
        assert!(LifecycleState::CreatingSurface < LifecycleState::Embedding);
        assert!(LifecycleState::Embedding < LifecycleState::Ready);
        assert!(LifecycleState::Ready < LifecycleState::ClosingRequested);
        assert!(LifecycleState::ClosingRequested < LifecycleState::TearingDown);
        assert!(LifecycleState::TearingDown < LifecycleState::Destroyed);
    }

    #[test]
    fn test_advance_moves_forward() {
        let mut state = LifecycleState::Uninitialized;
        advance(&mut state, LifecycleState::CreatingHost);
        advance(&mut state, LifecycleState::Embedding);
        assert_eq!(state, LifecycleState::Embedding);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload), "boom");

        let payload: Box<dyn std::any::Any + Send> = Box::new("owned".to_string());
        assert_eq!(panic_message(payload), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload), "non-string panic payload");
    }
}
