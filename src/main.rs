//! Cosmic Breaker entry point
//!
//! Handles platform wiring and runs the game loop. The interactive build
//! targets the browser; native runs a headless simulation smoke pass.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use cosmic_breaker::renderer::SceneRenderer;
    use cosmic_breaker::sim::Game;
    use cosmic_breaker::{Settings, consts::MAX_FRAME_DELTA};

    /// Application instance holding the simulation and render state
    struct App {
        game: Game,
        renderer: Option<SceneRenderer>,
        last_time: f64,
        // FPS tracking over a 60-frame window
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        show_fps: bool,
    }

    impl App {
        fn new(width: f32, height: f32, seed: u64, settings: &Settings) -> Self {
            Self {
                game: Game::new(width, height, seed),
                renderer: None,
                last_time: 0.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                show_fps: settings.show_fps,
            }
        }

        fn update(&mut self, dt: f32, time: f64) {
            self.game.step(dt);

            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest = self.frame_times[self.frame_index];
            if oldest > 0.0 {
                let elapsed = time - oldest;
                if elapsed > 0.0 {
                    self.fps = (60_000.0 / elapsed).round() as u32;
                }
            }
        }

        fn render(&mut self) {
            let Some(renderer) = self.renderer.as_mut() else {
                return;
            };
            match renderer.render(
                &self.game.state,
                &self.game.paddle,
                &self.game.field,
                self.game.clock(),
            ) {
                Ok(()) => {}
                Err(wgpu::SurfaceError::Lost) => {
                    let (w, h) = renderer.size;
                    renderer.resize(w, h);
                }
                Err(wgpu::SurfaceError::OutOfMemory) => {
                    log::error!("out of GPU memory");
                }
                Err(e) => log::warn!("render error: {e:?}"),
            }
        }

        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };

            if let Some(el) = document.get_element_by_id("score") {
                el.set_text_content(Some(&self.game.state.score.to_string()));
            }
            if let Some(el) = document.get_element_by_id("lives") {
                el.set_text_content(Some(&self.game.state.lives.to_string()));
            }
            if let Some(el) = document.get_element_by_id("level") {
                el.set_text_content(Some(&self.game.state.level.to_string()));
            }
            if self.show_fps
                && let Some(el) = document.get_element_by_id("fps")
            {
                el.set_text_content(Some(&self.fps.to_string()));
            }

            if let Some(overlay_el) = document.get_element_by_id("overlay") {
                match &self.game.state.overlay {
                    Some(overlay) => {
                        if let Some(el) = document.get_element_by_id("overlay-title") {
                            el.set_text_content(Some(&overlay.title));
                        }
                        if let Some(el) = document.get_element_by_id("overlay-message") {
                            el.set_text_content(Some(&overlay.message));
                        }
                        if let Some(el) = document.get_element_by_id("start-button") {
                            el.set_text_content(Some(overlay.button_label));
                        }
                        let _ = overlay_el.set_attribute("class", "overlay overlay--visible");
                    }
                    None => {
                        let _ = overlay_el.set_attribute("class", "overlay");
                    }
                }
            }
        }
    }

    /// Fatal setup problem: surface the message and disable the start
    /// control. No simulation runs past this point.
    fn show_fatal(document: &web_sys::Document, message: &str) {
        if let Some(el) = document.get_element_by_id("overlay-title") {
            el.set_text_content(Some("Renderer Error"));
        }
        if let Some(el) = document.get_element_by_id("overlay-message") {
            el.set_text_content(Some(message));
        }
        if let Some(el) = document.get_element_by_id("overlay") {
            let _ = el.set_attribute("class", "overlay overlay--visible");
        }
        if let Some(button) = document
            .get_element_by_id("start-button")
            .and_then(|el| el.dyn_into::<web_sys::HtmlButtonElement>().ok())
        {
            button.set_disabled(true);
        }
    }

    /// Map a pointer event to canvas x, scaling from CSS to canvas pixels
    fn canvas_x(canvas: &HtmlCanvasElement, event: &PointerEvent) -> f32 {
        let rect = canvas.get_bounding_client_rect();
        let x = event.client_x() as f32 - rect.left() as f32;
        let scale = canvas.width() as f32 / rect.width().max(1.0) as f32;
        x * scale
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("failed to init logger");

        log::info!("Cosmic Breaker starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("game")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Size the drawing surface to the viewport
        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App::new(
            width as f32,
            height as f32,
            seed,
            &settings,
        )));

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("surface creation failed: {e}");
                show_fatal(
                    &document,
                    "WebGPU is not available, so the 3D mission display cannot initialize.",
                );
                return;
            }
        };

        match SceneRenderer::new(&instance, surface, width, height, &settings).await {
            Ok(renderer) => {
                app.borrow_mut().renderer = Some(renderer);
            }
            Err(e) => {
                log::error!("renderer init failed: {e}");
                show_fatal(
                    &document,
                    "WebGPU is not available, so the 3D mission display cannot initialize.",
                );
                return;
            }
        }

        settings.save();
        setup_input_handlers(&canvas, app.clone());

        request_animation_frame(app);
        log::info!("Cosmic Breaker running");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Launch/restart button
        if let Some(button) = document.get_element_by_id("start-button") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().game.launch();
            });
            let _ =
                button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard: arrows/WASD move, Space launches or restarts
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut app = app.borrow_mut();
                match event.code().as_str() {
                    "Space" => {
                        event.prevent_default();
                        app.game.launch();
                    }
                    "ArrowLeft" | "KeyA" => app.game.set_moving_left(true),
                    "ArrowRight" | "KeyD" => app.game.set_moving_right(true),
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut app = app.borrow_mut();
                match event.code().as_str() {
                    "ArrowLeft" | "KeyA" => app.game.set_moving_left(false),
                    "ArrowRight" | "KeyD" => app.game.set_moving_right(false),
                    _ => {}
                }
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer drag positions the paddle directly
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let x = canvas_x(&canvas_clone, &event);
                app.borrow_mut().game.pointer_down(x);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let x = canvas_x(&canvas_clone, &event);
                app.borrow_mut().game.pointer_move(x);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.pointer_up();
            });
            let _ = window
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.pointer_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerleave", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resize: rescale the surface and recompute the playfield bounds
        {
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(window) = web_sys::window() else {
                    return;
                };
                let dpr = window.device_pixel_ratio();
                let width = (canvas_clone.client_width() as f64 * dpr) as u32;
                let height = (canvas_clone.client_height() as f64 * dpr) as u32;
                canvas_clone.set_width(width);
                canvas_clone.set_height(height);

                let mut app = app.borrow_mut();
                app.game.resize(width as f32, height as f32);
                if let Some(renderer) = app.renderer.as_mut() {
                    renderer.resize(width, height);
                }
            });
            let _ =
                window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut app_ref = app.borrow_mut();

            let dt = if app_ref.last_time > 0.0 {
                (((time - app_ref.last_time) / 1000.0) as f32).min(MAX_FRAME_DELTA)
            } else {
                MAX_FRAME_DELTA.min(1.0 / 60.0)
            };
            app_ref.last_time = time;

            app_ref.update(dt, time);
            app_ref.render();
            app_ref.update_hud();
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cosmic_breaker::sim::Game;

    env_logger::init();
    log::info!("Cosmic Breaker (native) starting...");

    // Headless smoke run; the interactive build is browser-hosted
    let mut game = Game::new(1280.0, 720.0, 42);
    game.launch();
    for _ in 0..600 {
        game.step(1.0 / 60.0);
    }
    println!(
        "simulated 10s: mode={:?} score={} lives={} level={} balls={}",
        game.state.mode,
        game.state.score,
        game.state.lives,
        game.state.level,
        game.state.balls.len()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main; this satisfies the binary target
}
