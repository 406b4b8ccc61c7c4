//! End-to-end lifecycle tests against the headless adapters.
//!
//! The headless pair records every adapter call in a shared log; these tests
//! assert the coordinator's ordering contracts against it.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use nestview_core::{
    create, init_logging, shutdown_all, ColorScheme, ControlError, CreationStep, EventKind,
    LogConfig, RuntimeError, Theme, WindowConfig, WindowInstance,
};
use nestview_platform::headless::{CallLog, HeadlessPlatform, HeadlessRenderer};
use nestview_platform::{SurfaceEvent, StyleMask};

struct Harness {
    log: CallLog,
    platform: Rc<HeadlessPlatform>,
    renderer: Rc<HeadlessRenderer>,
}

impl Harness {
    fn new() -> Self {
        static LOGGING: std::sync::Once = std::sync::Once::new();
        LOGGING.call_once(|| init_logging(LogConfig::default().with_filter("nestview=debug")));

        let log = CallLog::new();
        Self {
            platform: Rc::new(HeadlessPlatform::new(log.clone())),
            renderer: Rc::new(HeadlessRenderer::new(log.clone())),
            log,
        }
    }

    async fn open(&self, config: WindowConfig) -> WindowInstance {
        create(config, self.platform.clone(), self.renderer.clone())
            .await
            .expect("window creation")
    }
}

macro_rules! local_test {
    ($body:expr) => {
        tokio::task::LocalSet::new().run_until($body).await
    };
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_create_embeds_surface_under_host() {
    local_test!(async {
        let h = Harness::new();
        let window = h
            .open(WindowConfig::new().with_size(1024, 768).with_title("main"))
            .await;

        let host = window.handle().expect("host handle");
        let surface_handle = window.surface_handle().expect("surface handle");

        // The surface is reparented under the host with child styles.
        assert_eq!(h.platform.parent_of(surface_handle), Some(host));
        let relation = window.embedding().expect("embedding relation");
        assert_eq!(relation.host, host);
        assert_eq!(relation.surface, surface_handle);
        assert!(relation.child_styles.contains(StyleMask::CHILD));

        // Reparent before style patch, style patch before positioning.
        let parented = h.log.index_of("platform.set_parent").unwrap();
        let styled = h
            .log
            .index_of(&format!("platform.set_styles {}", surface_handle.raw()))
            .unwrap();
        let positioned = h
            .log
            .index_of(&format!("platform.set_position {}", surface_handle.raw()))
            .unwrap();
        assert!(parented < styled, "style patch must follow reparenting");
        assert!(styled < positioned, "positioning must follow style patch");

        // The surface becomes visible only after the content load.
        let loaded = h.log.index_of("renderer.load_url").unwrap();
        let shown = h.log.index_of("renderer.show").unwrap();
        assert!(loaded < shown, "surface shown before content loaded");

        // Both sides agree on geometry.
        let surface_bounds = h
            .renderer
            .surface_bounds(window.surface_id().unwrap())
            .expect("surface bounds");
        assert_eq!((surface_bounds.width, surface_bounds.height), (1024, 768));
        let host_bounds = h.platform.bounds_of(host).expect("host bounds");
        assert_eq!((host_bounds.width, host_bounds.height), (1024, 768));

        assert!(window.is_visible().unwrap());
        assert_eq!(window.dpi().unwrap(), 96);
        assert_eq!(h.platform.title_of(host).as_deref(), Some("main"));

        let rendered = format!("{:?}", window);
        assert!(rendered.contains("WindowInstance"));
        assert!(rendered.contains("Ready"));
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_resize_moves_both_surfaces_in_lockstep() {
    local_test!(async {
        let h = Harness::new();
        let window = h.open(WindowConfig::new().with_size(800, 600)).await;
        let host = window.handle().unwrap();

        window.resize(1280, 720).unwrap();

        let host_bounds = h.platform.bounds_of(host).unwrap();
        assert_eq!((host_bounds.width, host_bounds.height), (1280, 720));
        let surface_bounds = h
            .renderer
            .surface_bounds(window.surface_id().unwrap())
            .unwrap();
        assert_eq!((surface_bounds.width, surface_bounds.height), (1280, 720));

        // Moving preserves size.
        window.move_to(40, 50).unwrap();
        let moved = h.platform.bounds_of(host).unwrap();
        assert_eq!((moved.x, moved.y), (40, 50));
        assert_eq!((moved.width, moved.height), (1280, 720));
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_surface_resize_event_propagates_to_host() {
    local_test!(async {
        let h = Harness::new();
        let window = h.open(WindowConfig::new().with_size(800, 600)).await;
        let host = window.handle().unwrap();
        let surface = window.surface_id().unwrap();

        let resizes = Rc::new(Cell::new(0u32));
        {
            let resizes = resizes.clone();
            window.on(
                EventKind::Resize,
                Rc::new(move |_| resizes.set(resizes.get() + 1)),
            );
        }

        h.renderer.emit(
            surface,
            &SurfaceEvent::Resized {
                width: 640,
                height: 480,
            },
        );

        let bounds = h.platform.bounds_of(host).unwrap();
        assert_eq!((bounds.width, bounds.height), (640, 480));
        assert_eq!(resizes.get(), 1);

        h.renderer.emit(surface, &SurfaceEvent::Moved { x: 10, y: 20 });
        let bounds = h.platform.bounds_of(host).unwrap();
        assert_eq!((bounds.x, bounds.y), (10, 20));
        // Position sync never resizes.
        assert_eq!((bounds.width, bounds.height), (640, 480));
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_close_destroys_surface_before_host_exactly_once() {
    local_test!(async {
        let h = Harness::new();
        let closes = Rc::new(Cell::new(0u32));
        let config = {
            let closes = closes.clone();
            WindowConfig::new().on_close(move || closes.set(closes.get() + 1))
        };
        let window = h.open(config).await;

        let closed_events = Rc::new(Cell::new(0u32));
        {
            let closed_events = closed_events.clone();
            window.on(
                EventKind::Closed,
                Rc::new(move |_| closed_events.set(closed_events.get() + 1)),
            );
        }

        window.close();
        window.close();
        window.close();

        assert!(window.is_destroyed());
        assert_eq!(h.platform.window_count(), 0);
        assert_eq!(h.renderer.surface_count(), 0);

        let surface_gone = h.log.index_of("renderer.destroy_surface").unwrap();
        let host_gone = h.log.index_of("platform.destroy_window").unwrap();
        assert!(surface_gone < host_gone, "surface must die before host");
        assert_eq!(h.log.count_of("renderer.destroy_surface"), 1);
        assert_eq!(h.log.count_of("platform.destroy_window"), 1);

        assert_eq!(closes.get(), 1);
        assert_eq!(closed_events.get(), 1);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_window_manager_close_request_tears_down() {
    local_test!(async {
        let h = Harness::new();
        let closes = Rc::new(Cell::new(0u32));
        let config = {
            let closes = closes.clone();
            WindowConfig::new().on_close(move || closes.set(closes.get() + 1))
        };
        let window = h.open(config).await;
        let host = window.handle().unwrap();

        h.platform.request_close(host);
        assert!(!window.is_destroyed());

        // Delivered on the next poll tick.
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(window.is_destroyed());
        assert_eq!(closes.get(), 1);
        let surface_gone = h.log.index_of("renderer.destroy_surface").unwrap();
        let host_gone = h.log.index_of("platform.destroy_window").unwrap();
        assert!(surface_gone < host_gone);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_poll_failure_closes_window_and_reports() {
    local_test!(async {
        let h = Harness::new();
        let errors = Rc::new(Cell::new(0u32));
        let closes = Rc::new(Cell::new(0u32));
        let config = {
            let errors = errors.clone();
            let closes = closes.clone();
            WindowConfig::new()
                .on_error(move |e| {
                    assert!(matches!(e, RuntimeError::Poll(_)));
                    errors.set(errors.get() + 1);
                })
                .on_close(move || closes.set(closes.get() + 1))
        };
        let window = h.open(config).await;

        // Let the loop run a few healthy ticks first.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!window.is_destroyed());

        h.platform.fail_next_pump();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(window.is_destroyed());
        assert_eq!(errors.get(), 1);
        assert_eq!(closes.get(), 1);
        let surface_gone = h.log.index_of("renderer.destroy_surface").unwrap();
        let host_gone = h.log.index_of("platform.destroy_window").unwrap();
        assert!(surface_gone < host_gone);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_explicit_close_racing_poll_failure() {
    local_test!(async {
        let h = Harness::new();
        let closes = Rc::new(Cell::new(0u32));
        let config = {
            let closes = closes.clone();
            WindowConfig::new().on_close(move || closes.set(closes.get() + 1))
        };
        let window = h.open(config).await;

        // Arm a pump failure, then close explicitly before the next tick
        // can observe it.
        h.platform.fail_next_pump();
        window.close();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(window.is_destroyed());
        assert_eq!(closes.get(), 1);
        assert_eq!(h.log.count_of("renderer.destroy_surface"), 1);
        assert_eq!(h.log.count_of("platform.destroy_window"), 1);
        let surface_gone = h.log.index_of("renderer.destroy_surface").unwrap();
        let host_gone = h.log.index_of("platform.destroy_window").unwrap();
        assert!(surface_gone < host_gone);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_tune_native_panic_is_reported_not_fatal() {
    local_test!(async {
        let h = Harness::new();
        let errors = Rc::new(Cell::new(0u32));
        let seen = Rc::new(Cell::new((0u64, 0u64)));
        let config = {
            let errors = errors.clone();
            let seen = seen.clone();
            WindowConfig::new()
                .tune_native(move |host, surface| {
                    seen.set((host.raw(), surface.raw()));
                    panic!("tuning went sideways");
                })
                .on_error(move |e| {
                    assert!(matches!(e, RuntimeError::Callback(_)));
                    errors.set(errors.get() + 1);
                })
        };

        let window = h.open(config).await;

        // Creation survives the panic and the window comes up normally.
        assert!(!window.is_destroyed());
        assert!(window.is_visible().unwrap());
        assert_eq!(errors.get(), 1);

        // The callback received both live handles before panicking.
        let (host_raw, surface_raw) = seen.get();
        assert_eq!(host_raw, window.handle().unwrap().raw());
        assert_eq!(surface_raw, window.surface_handle().unwrap().raw());
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_operations_after_close() {
    local_test!(async {
        let h = Harness::new();
        let window = h.open(WindowConfig::new()).await;
        window.close();

        let calls_after_close = h.log.entries().len();

        // Movement and visual operations degrade to silent no-ops.
        window.resize(100, 100).unwrap();
        window.move_to(1, 2).unwrap();
        window.show().unwrap();
        window.hide().unwrap();
        window.focus().unwrap();
        window.minimize().unwrap();
        window.flash(false).unwrap();
        assert_eq!(h.log.entries().len(), calls_after_close, "no adapter calls");

        // Property setters fail loudly.
        assert!(matches!(
            window.set_title("late"),
            Err(ControlError::WindowClosed)
        ));
        assert!(matches!(
            window.set_dark_mode(true),
            Err(ControlError::WindowClosed)
        ));
        assert!(matches!(
            window.set_opacity(0.5),
            Err(ControlError::WindowClosed)
        ));

        // Queries return inert defaults.
        assert!(!window.is_visible().unwrap());
        assert!(!window.is_focused().unwrap());
        assert_eq!(window.dpi().unwrap(), 96);
        assert_eq!(window.scale_factor().unwrap(), 1.0);
        assert_eq!(window.handle(), None);
        assert_eq!(window.surface_handle(), None);
        assert_eq!(window.embedding(), None);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_surface_creation_failure_unwinds_host() {
    local_test!(async {
        let h = Harness::new();
        h.renderer.fail_next_create();

        let err = create(
            WindowConfig::new(),
            h.platform.clone(),
            h.renderer.clone(),
        )
        .await
        .expect_err("creation must fail");

        assert_eq!(err.step, CreationStep::SurfaceCreation);
        // The half-created host does not leak.
        assert_eq!(h.platform.window_count(), 0);
        assert_eq!(h.log.count_of("platform.destroy_window"), 1);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_validation_failure_touches_no_adapter() {
    local_test!(async {
        let h = Harness::new();

        let err = create(
            WindowConfig::new().with_size(0, 0),
            h.platform.clone(),
            h.renderer.clone(),
        )
        .await
        .expect_err("creation must fail");

        assert_eq!(err.step, CreationStep::Validation);
        assert!(h.log.entries().is_empty());
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_split_theme_styles_titlebar_and_content_independently() {
    local_test!(async {
        let h = Harness::new();
        let window = h
            .open(WindowConfig::new().with_theme(Theme::Split {
                titlebar: Some(ColorScheme::Dark),
                content: Some(ColorScheme::Light),
            }))
            .await;

        let host = window.handle().unwrap();
        assert_eq!(h.platform.dark_mode_of(host), Some(true));

        let surface = window.surface_id().unwrap();
        assert_eq!(
            h.renderer.injected_css(surface),
            vec![":root{color-scheme:light;}".to_string()]
        );

        // A second load does not re-inject.
        h.renderer.emit(surface, &SurfaceEvent::LoadFinished);
        assert_eq!(h.renderer.injected_css(surface).len(), 1);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_on_ready_receives_live_instance() {
    local_test!(async {
        let h = Harness::new();
        let observed = Rc::new(Cell::new(false));
        let config = {
            let observed = observed.clone();
            WindowConfig::new().on_ready(move |instance: WindowInstance| {
                assert!(!instance.is_destroyed());
                assert!(instance.handle().is_some());
                observed.set(true);
            })
        };
        let _window = h.open(config).await;
        assert!(observed.get());
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_shutdown_all_closes_every_live_window() {
    local_test!(async {
        let h = Harness::new();
        let first = h.open(WindowConfig::new()).await;
        let second = h.open(WindowConfig::new()).await;
        assert_eq!(h.platform.window_count(), 2);

        shutdown_all();

        assert!(first.is_destroyed());
        assert!(second.is_destroyed());
        assert_eq!(h.platform.window_count(), 0);
        assert_eq!(h.renderer.surface_count(), 0);

        // Already drained; a second call is a no-op.
        shutdown_all();
        assert_eq!(h.log.count_of("platform.destroy_window"), 2);
    })
}

#[tokio::test(flavor = "current_thread", start_paused = true)]
async fn test_focus_events_reach_observers() {
    local_test!(async {
        let h = Harness::new();
        let window = h.open(WindowConfig::new()).await;
        let surface = window.surface_id().unwrap();

        let focused = Rc::new(Cell::new(0u32));
        let blurred = Rc::new(Cell::new(0u32));
        {
            let focused = focused.clone();
            window.on(
                EventKind::Focus,
                Rc::new(move |_| focused.set(focused.get() + 1)),
            );
        }
        {
            let blurred = blurred.clone();
            window.on(
                EventKind::Blur,
                Rc::new(move |_| blurred.set(blurred.get() + 1)),
            );
        }

        h.renderer.emit(surface, &SurfaceEvent::Focused);
        h.renderer.emit(surface, &SurfaceEvent::Blurred);
        h.renderer.emit(surface, &SurfaceEvent::Focused);

        assert_eq!(focused.get(), 2);
        assert_eq!(blurred.get(), 1);
    })
}
