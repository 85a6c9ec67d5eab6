use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Fullscreen, WindowBuilder};

use super::input::InputCollector;
use super::metrics::MetricsAccumulator;
use super::screen::Screen;
use super::state::{
    GameState, MachineStatus, StateContext, StateError, StateFactory, StateMachine, WindowRequest,
};

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub metrics_log_interval: Duration,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "The Game".to_string(),
            window_width: 800,
            window_height: 480,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            metrics_log_interval: Duration::from_secs(1),
            max_render_fps: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize screen: {0}")]
    CreateScreen(#[source] PixelsError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Run the game to completion: window and screen setup, then the
/// fixed-timestep loop driving the state machine until it quits or a
/// fatal state error surfaces.
pub fn run_app(
    config: LoopConfig,
    mut ctx: StateContext,
    initial: Box<dyn GameState>,
    factory: Box<dyn StateFactory>,
) -> Result<(), AppError> {
    let mut machine = StateMachine::new(initial, factory);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window: &'static winit::window::Window = Box::leak(Box::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    ));
    let mut screen = Screen::new(window).map_err(AppError::CreateScreen)?;
    ctx.viewport = screen.size();

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let metrics_log_interval =
        normalize_non_zero_duration(config.metrics_log_interval, Duration::from_secs(1));
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let fixed_dt_ms = fixed_dt.as_secs_f32() * 1000.0;
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::new();

    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        metrics_log_interval_ms = metrics_log_interval.as_millis() as u64,
        render_fps_cap = %format_render_cap(effective_render_cap),
        initial_state = machine.active_kind().name(),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();
    let mut metrics_accumulator = MetricsAccumulator::new(metrics_log_interval);
    let fatal: Rc<RefCell<Option<StateError>>> = Rc::new(RefCell::new(None));
    let fatal_for_loop = Rc::clone(&fatal);
    let window_title = config.window_title.clone();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    if new_size.width == 0 || new_size.height == 0 {
                        warn!(
                            width = new_size.width,
                            height = new_size.height,
                            "resize_rejected"
                        );
                        return;
                    }
                    let multiplier = new_size.width as f32 / ctx.viewport.0.max(1) as f32;
                    if let Err(error) = screen.resize(new_size.width, new_size.height) {
                        warn!(error = %error, "screen_resize_failed");
                        window_target.exit();
                        return;
                    }
                    ctx.viewport = (new_size.width, new_size.height);
                    input_collector.rescale(multiplier);
                    machine.scale(&mut ctx, multiplier);
                    info!(
                        width = new_size.width,
                        height = new_size.height,
                        multiplier,
                        "window_resized"
                    );
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input_collector.handle_cursor_moved(position.x as f32, position.y as f32);
                }
                WindowEvent::MouseInput { state, button, .. } => {
                    input_collector.handle_pointer_button(button, state);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input_collector.handle_key(event.physical_key, event.state, event.repeat);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                    last_frame_instant = now;

                    let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                    accumulator = accumulator.saturating_add(clamped_frame_dt);

                    let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                    for _ in 0..step_plan.ticks_to_run {
                        ctx.cursor = input_collector.cursor();
                        for game_event in input_collector.drain_for_tick() {
                            machine.on_event(&mut ctx, game_event);
                        }
                        match machine.update(&mut ctx, fixed_dt_ms) {
                            Ok(MachineStatus::Running) => {}
                            Ok(MachineStatus::Quit) => {
                                info!(reason = "state_request", "shutdown_requested");
                                window_target.exit();
                                return;
                            }
                            Err(error) => {
                                warn!(error = %error, "state_machine_failed");
                                *fatal_for_loop.borrow_mut() = Some(error);
                                window_target.exit();
                                return;
                            }
                        }
                        for request in ctx.drain_window_requests() {
                            match request {
                                WindowRequest::SetFullscreen(true) => {
                                    window.set_fullscreen(Some(Fullscreen::Borderless(None)));
                                }
                                WindowRequest::SetFullscreen(false) => {
                                    window.set_fullscreen(None);
                                }
                            }
                        }
                        metrics_accumulator.record_tick();
                    }
                    accumulator = step_plan.remaining_accumulator;

                    if step_plan.dropped_backlog > Duration::ZERO {
                        warn!(
                            dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                            max_ticks_per_frame, "sim_clamp_triggered"
                        );
                    }

                    // Single sleep point for render pacing.
                    let elapsed_since_last_present =
                        Instant::now().saturating_duration_since(last_present_instant);
                    let cap_sleep =
                        compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                    if cap_sleep > Duration::ZERO {
                        thread::sleep(cap_sleep);
                    }

                    // Redraws between ticks carry no queued draws; the
                    // previous buffer stays up instead of a cleared one.
                    if should_present(ctx.queue.len()) {
                        {
                            let mut frame = screen.frame();
                            ctx.queue.flush(&mut frame);
                        }
                        if let Err(error) = screen.present() {
                            warn!(error = %error, "screen_present_failed");
                            window_target.exit();
                            return;
                        }
                        last_present_instant = Instant::now();
                    }
                    metrics_accumulator.record_frame(raw_frame_dt);

                    if let Some(snapshot) = metrics_accumulator.maybe_snapshot(now) {
                        window.set_title(&format!(
                            "{}, FPS:{}",
                            window_title,
                            snapshot.fps.round() as u32
                        ));
                        info!(
                            fps = snapshot.fps,
                            tps = snapshot.tps,
                            frame_time_ms = snapshot.frame_time_ms,
                            state = machine.active_kind().name(),
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            Event::LoopExiting => {
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)?;

    let fatal_error = fatal.borrow_mut().take();
    match fatal_error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    if accumulator >= fixed_dt {
        let dropped_backlog = accumulator;
        StepPlan {
            ticks_to_run,
            remaining_accumulator: Duration::ZERO,
            dropped_backlog,
        }
    } else {
        StepPlan {
            ticks_to_run,
            remaining_accumulator: accumulator,
            dropped_backlog: Duration::ZERO,
        }
    }
}

fn should_present(queued_draws: usize) -> bool {
    queued_draws > 0
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}
