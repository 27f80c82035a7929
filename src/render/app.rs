//! App entrypoint for the rendering layer.
//!
//! This module owns:
//! - the winit application lifecycle + event loop
//! - creating the window
//! - delegating to an injected async state builder
//!
//! The runner is generic over a state type `S: AppState` (resize, keyboard input, render,
//! redraw requests). The builder is async and receives the created window, so demos
//! under `demos/` supply their own state without duplicating the event loop.
//!
//! Failures while creating the window or the state stop the event loop and are returned
//! from `run_with_builder`.

use std::{future::Future, pin::Pin, sync::Arc};

use anyhow::Context as _;
use log::{error, info};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowAttributes, WindowId},
};

/// App-facing configuration for running the winit event loop.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Window title.
    pub title: String,
    /// Initial inner size in logical pixels, if any.
    pub inner_size: Option<(u32, u32)>,
    /// ControlFlow for the event loop. Default is `Poll`.
    pub control_flow: ControlFlow,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "ringtext".to_string(),
            inner_size: None,
            control_flow: ControlFlow::Poll,
        }
    }
}

/// Minimal trait a demo state must implement to be driven by the app runner.
pub trait AppState: 'static {
    /// Handle window resize.
    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>);

    /// Handle a key press (auto-repeats included). Releases are not forwarded.
    fn key_pressed(&mut self, _event: &KeyEvent) {}

    /// Render one frame.
    fn render(&mut self) -> anyhow::Result<()>;

    /// Request a redraw on the underlying window (used for continuous animation).
    fn request_redraw(&self);
}

/// Run the winit event loop with an injected async state builder.
///
/// The builder is called once when the app is resumed (after the window is created)
/// and runs on the current thread via `pollster::block_on`.
pub fn run_with_builder<S, B, Fut>(config: AppConfig, builder: B) -> anyhow::Result<()>
where
    S: AppState,
    B: FnOnce(Arc<Window>) -> Fut + 'static,
    Fut: Future<Output = anyhow::Result<S>> + 'static,
{
    let event_loop = EventLoop::new().context("winit: failed to create EventLoop")?;
    event_loop.set_control_flow(config.control_flow);

    let mut app = App::<S>::new_with_builder(config, builder);
    event_loop
        .run_app(&mut app)
        .context("winit: run_app failed")?;

    match app.failure.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Type-erased async builder for creating a state `S` from a created window.
///
/// The future is boxed and pinned so `pollster::block_on(...)` can drive it.
type BoxedStateBuilder<S> = Box<
    dyn FnOnce(Arc<Window>) -> Pin<Box<dyn Future<Output = anyhow::Result<S>> + 'static>> + 'static,
>;

/// Application state used by winit.
struct App<S: AppState> {
    config: AppConfig,
    builder: Option<BoxedStateBuilder<S>>,
    state: Option<S>,
    failure: Option<anyhow::Error>,
    exiting: bool,
}

impl<S: AppState> App<S> {
    fn new_with_builder<B, Fut>(config: AppConfig, builder: B) -> Self
    where
        B: FnOnce(Arc<Window>) -> Fut + 'static,
        Fut: Future<Output = anyhow::Result<S>> + 'static,
    {
        Self {
            config,
            builder: Some(Box::new(|window| Box::pin(builder(window)))),
            state: None,
            failure: None,
            exiting: false,
        }
    }

    fn init_state(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        // Resumed may fire more than once (e.g. mobile suspend/resume); build only once.
        let Some(builder) = self.builder.take() else {
            return Ok(());
        };

        let mut attrs = WindowAttributes::default().with_title(self.config.title.as_str());
        if let Some((w, h)) = self.config.inner_size {
            attrs = attrs.with_inner_size(winit::dpi::LogicalSize::new(w, h));
        }
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("winit: failed to create window")?,
        );

        let state = pollster::block_on(builder(window)).context("failed to initialize state")?;
        state.request_redraw();
        self.state = Some(state);
        Ok(())
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.failure = Some(err);
        self.exiting = true;
        self.state = None;
        event_loop.exit();
    }
}

impl<S: AppState> ApplicationHandler for App<S> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(err) = self.init_state(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if self.exiting {
            return;
        }
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested; exiting");
                self.exiting = true;
                self.state = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                state.resize(size);
                state.request_redraw();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    state.key_pressed(&event);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(err) = state.render() {
                    self.fail(event_loop, err);
                }
            }
            _ => {}
        }
    }
}
