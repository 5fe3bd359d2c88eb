//! Neon Racer entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, HtmlElement, KeyboardEvent};

    use neon_racer::app::{Game, HudSink, HudSnapshot};
    use neon_racer::audio::AudioManager;
    use neon_racer::input::{
        ACQUIRE_TIMEOUT_MS, AcquireOutcome, InputMode, InputSource, KeyboardSteering,
        PendingOutcome, lane_from_nose_x, lane_from_signal,
    };
    use neon_racer::renderer::{Projector, RenderState, build_frame};
    use neon_racer::sim::{Lane, SessionPhase};
    use neon_racer::{HighScore, InitError, QualityPreset, Settings};

    const CANVAS_ID: &str = "gameCanvas";
    const SHAKE_MS: i32 = 400;

    thread_local! {
        /// Handle for the tracker glue, which calls in from JS
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
        /// Acquisition outcome reported while `init` was still awaiting the GPU
        static PENDING_OUTCOME: RefCell<PendingOutcome> = RefCell::new(PendingOutcome::default());
    }

    /// Screens and readouts in the page
    struct DomHud {
        document: Document,
        /// Power-up labels currently shown, to skip rebuilding every frame
        shown_status: Vec<&'static str>,
    }

    impl DomHud {
        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn set_active(&self, id: &str, active: bool) {
            if let Some(el) = self.document.get_element_by_id(id) {
                let _ = el.class_list().toggle_with_force("active", active);
            }
        }

        fn set_style(&self, id: &str, property: &str, value: &str) {
            let el = self.document.get_element_by_id(id);
            if let Some(el) = el.and_then(|el| el.dyn_into::<HtmlElement>().ok()) {
                let _ = el.style().set_property(property, value);
            }
        }

        /// Stack of "... ONLINE" lines in `#powerupStatus`, created inside
        /// `#gameHUD` on first use
        fn update_status(&mut self, labels: &[(&'static str, &'static str)]) {
            let texts: Vec<_> = labels.iter().map(|(text, _)| *text).collect();
            if texts == self.shown_status {
                return;
            }
            let container = match self.document.get_element_by_id("powerupStatus") {
                Some(el) => el,
                None => {
                    let Some(hud) = self.document.get_element_by_id("gameHUD") else {
                        return;
                    };
                    let Ok(el) = self.document.create_element("div") else { return };
                    el.set_id("powerupStatus");
                    let _ = hud.append_child(&el);
                    el
                }
            };
            container.set_inner_html("");
            for &(text, color) in labels {
                let Ok(line) = self.document.create_element("div") else { continue };
                line.set_class_name("powerup-status");
                line.set_text_content(Some(text));
                if let Ok(line) = line.dyn_into::<HtmlElement>() {
                    let style = line.style();
                    let _ = style.set_property("color", color);
                    let _ = style.set_property("text-shadow", &format!("0 0 10px {}", color));
                    let _ = container.append_child(&line);
                }
            }
            self.shown_status = texts;
        }

        /// One `shield-bar` div per health unit, lit while the unit remains
        fn update_health_bars(&self, health: u8, max_health: u8) {
            let Some(container) = self.document.get_element_by_id("healthContainer") else {
                return;
            };
            if container.child_element_count() != max_health as u32 {
                container.set_inner_html("");
                for _ in 0..max_health {
                    if let Ok(bar) = self.document.create_element("div") {
                        bar.set_class_name("shield-bar");
                        let _ = container.append_child(&bar);
                    }
                }
            }
            let bars = container.children();
            for i in 0..bars.length() {
                if let Some(bar) = bars.item(i) {
                    let _ = bar.class_list().toggle_with_force("active", i < health as u32);
                }
            }
        }
    }

    impl HudSink for DomHud {
        fn show_phase(&mut self, phase: SessionPhase, high_score: u64) {
            self.set_active("mainMenu", phase == SessionPhase::Menu);
            self.set_active("gameHUD", phase == SessionPhase::Playing);
            self.set_active("gameOverScreen", phase == SessionPhase::GameOver);
            self.set_text("menuHighScore", &high_score.to_string());
        }

        fn update(&mut self, hud: &HudSnapshot) {
            if hud.phase != SessionPhase::Playing {
                return;
            }
            self.set_text("scoreValue", &hud.score_text());
            self.set_style("scoreValue", "color", hud.score_color());
            self.set_text("speedValue", &hud.display_speed().to_string());
            self.set_style("speedValue", "width", &format!("{:.1}%", hud.speed_bar_percent()));
            self.update_status(&hud.status_labels());
            self.set_text("healthValue", &hud.health.to_string());
            self.set_text("coinValue", &hud.coins.to_string());
            for (id, lane) in [
                ("laneLeft", Lane::Left),
                ("laneCenter", Lane::Center),
                ("laneRight", Lane::Right),
            ] {
                self.set_active(id, hud.lane == lane);
            }
            self.update_health_bars(hud.health, hud.max_health);
        }

        fn show_game_over(&mut self, score: u64, high_score: u64, new_record: bool) {
            self.set_text("finalScore", &score.to_string());
            self.set_text("finalHighScore", &high_score.to_string());
            self.set_text("menuHighScore", &high_score.to_string());
            if new_record {
                log::info!("Run ended with a new record: {}", score);
            }
        }

        fn input_ready(&mut self, mode: InputMode) {
            let status = match mode {
                InputMode::Tracker => "NEURAL LINK ESTABLISHED",
                _ => "MANUAL OVERRIDE ENGAGED",
            };
            self.set_text("cameraStatus", status);
            if let Some(btn) = self.document.get_element_by_id("btnStart") {
                let _ = btn.remove_attribute("disabled");
            }
            self.set_active("loader", false);
        }

        fn damaged(&mut self, health: u8) {
            log::debug!("Damage taken, {} left", health);
            let Some(body) = self.document.body() else { return };
            let _ = body.class_list().add_1("damage-shake");
            let closure = Closure::once(move || {
                let _ = body.class_list().remove_1("damage-shake");
            });
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    SHAKE_MS,
                );
            }
            closure.forget();
        }
    }

    /// Everything the page keeps alive between frames
    struct App {
        game: Game,
        render_state: Option<RenderState>,
        audio: AudioManager,
        hud: DomHud,
        keyboard: KeyboardSteering,
        canvas: HtmlCanvasElement,
    }

    impl App {
        /// CSS pixel size of the canvas; the scene is laid out in these units
        fn viewport(&self) -> (f32, f32) {
            (
                self.canvas.client_width().max(1) as f32,
                self.canvas.client_height().max(1) as f32,
            )
        }

        fn resolve_input(&mut self, outcome: AcquireOutcome) {
            let App { game, audio, hud, .. } = self;
            game.resolve_input(outcome, audio, hud);
        }

        fn frame(&mut self, time: f64) {
            let App { game, audio, hud, .. } = self;
            game.frame(time, audio, hud);
            self.audio.pump();
            self.render();
        }

        fn render(&mut self) {
            let viewport = self.viewport();
            let projector = Projector::new(viewport.0, viewport.1);
            let vertices = build_frame(
                &self.game.state,
                &projector,
                self.game.animation_time(),
                &self.game.settings,
            );

            if let Some(ref mut render_state) = self.render_state {
                match render_state.render(&vertices, viewport) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        render_state.reconfigure();
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Step through the quality presets and persist the choice
        fn cycle_quality(&mut self) {
            let next = match self.game.settings.quality {
                QualityPreset::Low => QualityPreset::Medium,
                QualityPreset::Medium => QualityPreset::High,
                QualityPreset::High => QualityPreset::Low,
            };
            let mut settings = self.game.settings.clone();
            settings.apply_preset(next);
            settings.save();
            self.game.apply_settings(settings);
            log::info!("Quality: {}", next.as_str());
        }

        /// Match the drawing buffer to the canvas' displayed size
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else { return };
            let (width, height) = backing_size(&window, &self.canvas);
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            if let Some(ref mut render_state) = self.render_state {
                render_state.resize(width, height);
            }
        }
    }

    fn backing_size(window: &web_sys::Window, canvas: &HtmlCanvasElement) -> (u32, u32) {
        let dpr = window.device_pixel_ratio();
        (
            (canvas.client_width() as f64 * dpr) as u32,
            (canvas.client_height() as f64 * dpr) as u32,
        )
    }

    fn with_app(f: impl FnOnce(&mut App)) {
        let app = APP.with(|slot| slot.borrow().clone());
        match app {
            Some(app) => f(&mut app.borrow_mut()),
            None => log::debug!("Lane signal before the game started"),
        }
    }

    /// Resolve the input race now, or hold the outcome until `run` installs the app
    fn deliver(outcome: AcquireOutcome) {
        let app = APP.with(|slot| slot.borrow().clone());
        match app {
            Some(app) => app.borrow_mut().resolve_input(outcome),
            None => {
                log::debug!("Buffering {:?} until startup finishes", outcome);
                PENDING_OUTCOME.with(|pending| pending.borrow_mut().offer(outcome));
            }
        }
    }

    /// Camera and face tracking are running
    #[wasm_bindgen]
    pub fn tracker_ready() {
        deliver(AcquireOutcome::Ready);
    }

    /// Camera or tracker could not be started
    #[wasm_bindgen]
    pub fn tracker_failed(reason: String) {
        deliver(AcquireOutcome::Failed(reason));
    }

    /// Latest nose x from the tracker (0..1, unmirrored camera space)
    #[wasm_bindgen]
    pub fn tracker_nose(x: f32) {
        with_app(|app| {
            app.game
                .request_lane(InputSource::Tracker, lane_from_nose_x(x))
        });
    }

    /// Discrete lane from the tracker glue (0 left, 1 centre, 2 right)
    #[wasm_bindgen]
    pub fn set_lane(lane: i32) {
        let Some(lane) = lane_from_signal(lane) else {
            log::debug!("Ignoring lane signal {}", lane);
            return;
        };
        with_app(|app| app.game.request_lane(InputSource::Tracker, lane));
    }

    fn find_canvas(document: &Document) -> Result<HtmlCanvasElement, InitError> {
        document
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| InitError::MissingElement(CANVAS_ID.into()))?
            .dyn_into()
            .map_err(|_| InitError::NotACanvas(CANVAS_ID.into()))
    }

    async fn init() -> Result<Rc<RefCell<App>>, InitError> {
        let window = web_sys::window().ok_or(InitError::NoDocument)?;
        let document = window.document().ok_or(InitError::NoDocument)?;
        let canvas = find_canvas(&document)?;

        let (width, height) = backing_size(&window, &canvas);
        canvas.set_width(width);
        canvas.set_height(height);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU | wgpu::Backends::GL,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| InitError::Surface(e.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| InitError::Adapter(e.to_string()))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = RenderState::new(surface, &adapter, width, height).await?;

        let settings = Settings::load();
        let high_score = HighScore::load();
        let seed = js_sys::Date::now() as u64;
        log::info!("Game initialized with seed: {}", seed);

        let audio = AudioManager::new(&settings);
        let hud = DomHud {
            document,
            shown_status: Vec::new(),
        };
        hud.set_text("menuHighScore", &high_score.best.to_string());

        Ok(Rc::new(RefCell::new(App {
            game: Game::new(seed, settings, high_score),
            render_state: Some(render_state),
            audio,
            hud,
            keyboard: KeyboardSteering::new(),
            canvas,
        })))
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialised".into());
        }

        log::info!("Neon Racer starting...");

        let app = match init().await {
            Ok(app) => app,
            Err(e) => {
                log::error!("Startup failed: {}", e);
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&format!("CRITICAL ERROR: {}", e));
                }
                return;
            }
        };

        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));
        if let Some(outcome) = PENDING_OUTCOME.with(|pending| pending.borrow_mut().take()) {
            app.borrow_mut().resolve_input(outcome);
        }

        setup_resize_handler(app.clone());
        setup_keyboard(app.clone());
        setup_buttons(app.clone());
        start_acquire_timeout(app.clone());

        request_animation_frame(app);

        log::info!("Neon Racer running!");
    }

    /// Fall back to the keyboard if the tracker has not reported in time
    fn start_acquire_timeout(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move || {
            app.borrow_mut().resolve_input(AcquireOutcome::TimedOut);
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            ACQUIRE_TIMEOUT_MS,
        );
        closure.forget();
    }

    fn setup_resize_handler(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };

        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut a = app.borrow_mut();
                let key = event.key();
                if key == "m" || key == "M" {
                    let App { game, audio, .. } = &mut *a;
                    game.toggle_mute(audio);
                    return;
                }
                if key == "q" || key == "Q" {
                    a.cycle_quality();
                    return;
                }
                if let Some(lane) = a.keyboard.key_down(&key) {
                    a.game.request_lane(InputSource::Keyboard, lane);
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut a = app.borrow_mut();
                if let Some(lane) = a.keyboard.key_up(&event.key()) {
                    a.game.request_lane(InputSource::Keyboard, lane);
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn on_click(document: &Document, id: &str, app: Rc<RefCell<App>>, f: fn(&mut App)) {
        let Some(btn) = document.get_element_by_id(id) else {
            log::warn!("Button #{} not found", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            f(&mut app.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let start: fn(&mut App) = |a| {
            a.audio.resume();
            let App { game, audio, .. } = a;
            game.press_start(audio);
        };
        on_click(&document, "btnStart", app.clone(), start);
        on_click(&document, "btnRetry", app.clone(), start);
        on_click(&document, "btnMenu", app.clone(), |a| {
            let App { game, audio, .. } = a;
            game.press_menu(audio);
        });
        on_click(&document, "btnSkipCamera", app.clone(), |a| {
            log::info!("Manual override requested");
            a.resolve_input(AcquireOutcome::Failed("skipped by player".into()));
        });
        on_click(&document, "btnMute", app, |a| {
            let App { game, audio, hud, .. } = a;
            let muted = game.toggle_mute(audio);
            hud.set_text("btnMute", if muted { "SOUND OFF" } else { "SOUND ON" });
        });
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Neon Racer (native) starting...");
    log::info!("Native mode runs headless - run with `trunk serve` for the web version");

    headless_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {}

/// Drive a short keyboard-steered run without any output devices and log how it went
#[cfg(not(target_arch = "wasm32"))]
fn headless_run() {
    use neon_racer::app::{AudioSink, Game, HudSink, HudSnapshot, SoundEffect};
    use neon_racer::input::{AcquireOutcome, InputSource};
    use neon_racer::renderer::{Projector, build_frame};
    use neon_racer::sim::{Lane, SessionPhase};
    use neon_racer::{HighScore, Settings};

    struct Silent;
    impl AudioSink for Silent {
        fn start_engine(&mut self) {}
        fn stop_engine(&mut self) {}
        fn update_engine(&mut self, _speed_ratio: f32) {}
        fn start_ambience(&mut self) {}
        fn stop_ambience(&mut self) {}
        fn start_music(&mut self) {}
        fn set_music_muffled(&mut self, _muffled: bool) {}
        fn set_muted(&mut self, _muted: bool) {}
        fn play(&mut self, effect: SoundEffect) {
            log::debug!("sound: {:?}", effect);
        }
    }

    struct LogHud;
    impl HudSink for LogHud {
        fn show_phase(&mut self, phase: SessionPhase, high_score: u64) {
            log::info!("Phase {:?} (best {})", phase, high_score);
        }
        fn update(&mut self, _hud: &HudSnapshot) {}
        fn show_game_over(&mut self, score: u64, high_score: u64, new_record: bool) {
            log::info!("Game over: {} (best {}, record: {})", score, high_score, new_record);
        }
    }

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    let mut game = Game::new(seed, Settings::default(), HighScore::load());
    let (mut audio, mut hud) = (Silent, LogHud);
    let projector = Projector::new(1280.0, 720.0);

    game.resolve_input(AcquireOutcome::TimedOut, &mut audio, &mut hud);
    game.press_start(&mut audio);

    // Weave between lanes for up to a minute of game time at 60 fps
    let lanes = [Lane::Center, Lane::Left, Lane::Center, Lane::Right];
    let mut vertices = 0usize;
    for frame in 0..3600u32 {
        if frame % 45 == 0 {
            let lane = lanes[(frame / 45) as usize % lanes.len()];
            game.request_lane(InputSource::Keyboard, lane);
        }
        game.step(1.0 / 60.0, &mut audio, &mut hud);
        let frame_vertices =
            build_frame(&game.state, &projector, game.animation_time(), &game.settings);
        vertices = vertices.max(frame_vertices.len());
        if game.state.phase == SessionPhase::GameOver {
            break;
        }
    }

    let hud = game.hud_snapshot();
    println!(
        "score {} | coins {} | health {}/{} | speed {} | peak vertices {}",
        hud.score,
        hud.coins,
        hud.health,
        hud.max_health,
        hud.display_speed(),
        vertices
    );
}
