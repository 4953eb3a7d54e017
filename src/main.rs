//! Bloink entry point
//!
//! On the web: wires the canvas, buttons and sliders to a [`Simulation`].
//! Natively: runs the simulation headless for a fixed number of ticks.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::prelude::*;
    use web_sys::{Element, HtmlCanvasElement, HtmlOptionElement, HtmlSelectElement, MouseEvent};

    use bloink::audio::{AudioManager, WebSynth};
    use bloink::consts::*;
    use bloink::controls;
    use bloink::platform::web::{IntervalScheduler, event_to_xy};
    use bloink::renderer::Canvas2d;
    use bloink::{Command, InitError, Settings, Simulation};

    const CANVAS_ID: &str = "canvasId";

    /// Everything one page owns
    struct App {
        settings: Settings,
        sim: Simulation,
        audio: AudioManager<WebSynth>,
        canvas: Canvas2d,
    }

    impl App {
        fn frame(&mut self) {
            self.sim.run_frame(&mut self.audio, &mut self.canvas);
        }

        fn submit(&mut self, command: Command) {
            self.sim.submit(command);
            if !self.sim.is_running() {
                self.sim.redraw(&mut self.canvas);
            }
        }
    }

    type Shared<T> = Rc<RefCell<T>>;

    pub fn run() -> Result<(), InitError> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Bloink starting...");

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| InitError::Surface("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(CANVAS_ID)
            .ok_or_else(|| InitError::MissingElement(CANVAS_ID.into()))?
            .dyn_into()
            .map_err(|_| InitError::Surface(format!("`{}` is not a canvas", CANVAS_ID)))?;

        if (canvas.width() as f32) < ARENA_MIN_WIDTH || (canvas.height() as f32) < ARENA_MIN_HEIGHT {
            return Err(InitError::CanvasTooSmall {
                width: canvas.width(),
                height: canvas.height(),
                min_width: ARENA_MIN_WIDTH as u32,
                min_height: ARENA_MIN_HEIGHT as u32,
            });
        }

        // The arena is the canvas
        let mut settings = Settings::load();
        settings.arena_width = canvas.width() as f32;
        settings.arena_height = canvas.height() as f32;

        let seed = settings.seed.unwrap_or(js_sys::Date::now() as u64);
        let sim = Simulation::new(&settings, seed)?;
        let audio = AudioManager::from_settings(WebSynth::new()?, &settings);
        let canvas2d = Canvas2d::new(&canvas)?;

        let app = Rc::new(RefCell::new(App {
            settings,
            sim,
            audio,
            canvas: canvas2d,
        }));
        {
            let mut a = app.borrow_mut();
            let App { sim, canvas, .. } = &mut *a;
            sim.redraw(canvas);
        }

        let scheduler = {
            let app = app.clone();
            Rc::new(RefCell::new(IntervalScheduler::new(Rc::new(move || {
                app.borrow_mut().frame();
            }))))
        };

        setup_pointer(&canvas, app.clone());
        setup_buttons(&document, app.clone(), scheduler.clone());
        setup_scale_select(&document, app.clone());
        setup_sliders(&document, app.clone());

        if app.borrow().settings.autostart {
            app.borrow_mut().sim.start(&mut *scheduler.borrow_mut());
        }

        log::info!("Bloink ready with seed {}", seed);
        Ok(())
    }

    fn setup_pointer(canvas: &HtmlCanvasElement, app: Shared<App>) {
        let target: Element = canvas.clone().into();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
            let point = event_to_xy(&event, &target);
            app.borrow_mut().submit(Command::Pointer(point));
        });
        let _ = canvas.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(
        document: &web_sys::Document,
        app: Shared<App>,
        scheduler: Shared<IntervalScheduler>,
    ) {
        if let Some(btn) = document.get_element_by_id("startButton") {
            let app = app.clone();
            let scheduler = scheduler.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                // Browsers only allow audio after a user gesture
                a.audio.backend().resume();
                a.sim.start(&mut *scheduler.borrow_mut());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        } else {
            log::warn!("No startButton on page");
        }

        if let Some(btn) = document.get_element_by_id("stopButton") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().sim.stop(&mut *scheduler.borrow_mut());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_scale_select(document: &web_sys::Document, app: Shared<App>) {
        let Some(select) = document
            .get_element_by_id("scaleSelect")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        else {
            return;
        };

        // Offer exactly the scales the keeper knows
        select.set_length(0);
        for name in app.borrow().sim.state().scales.names() {
            if let Ok(option) = HtmlOptionElement::new_with_text_and_value(name, name) {
                let _ = select.add_with_html_option_element(&option);
            }
        }
        select.set_value(app.borrow().sim.state().scales.current_name());

        let source = select.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let name = source.value();
            let mut a = app.borrow_mut();
            if !a.sim.state().scales.contains(&name) {
                log::warn!("Ignoring unknown scale {:?}", name);
                source.set_value(&a.settings.scale);
                return;
            }
            a.submit(Command::SetScale(name.clone()));
            a.settings.scale = name;
            a.settings.save();
        });
        let _ = select.add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    /// Clickable bar width; canvases report their drawing width like the arena does
    fn bar_width(el: &Element) -> f32 {
        el.dyn_ref::<HtmlCanvasElement>()
            .map(|c| c.width() as f32)
            .unwrap_or(el.client_width() as f32)
    }

    #[derive(Clone, Copy)]
    enum Slider {
        Speed,
        Volume,
        Delay,
        Instrument,
    }

    impl Slider {
        const ALL: [Slider; 4] = [Slider::Speed, Slider::Volume, Slider::Delay, Slider::Instrument];

        fn suffix(self) -> &'static str {
            match self {
                Slider::Speed => "speed",
                Slider::Volume => "volume",
                Slider::Delay => "delay",
                Slider::Instrument => "instrument",
            }
        }
    }

    fn apply_slider(app: &mut App, index: usize, slider: Slider, x: f32, width: f32) {
        let Some(ball) = app.sim.state().balls.get(index) else {
            return;
        };
        let (id, channel) = (ball.id, ball.channel);
        let Some(cfg) = app.settings.balls.get_mut(index) else {
            return;
        };

        match slider {
            Slider::Speed => {
                let speed = controls::speed_from_slider(x, width);
                app.sim.submit(Command::SetSpeed { ball: id, speed });
                cfg.speed = speed;
            }
            Slider::Volume => {
                let volume = controls::volume_from_slider(x, width);
                if let Some(v) = app.audio.voice_mut(channel) {
                    v.set_volume(volume);
                }
                cfg.volume = volume;
            }
            Slider::Delay => {
                let delay = controls::delay_from_slider(x, width);
                if let Some(v) = app.audio.voice_mut(channel) {
                    v.set_delay(delay);
                }
                cfg.delay = delay;
            }
            Slider::Instrument => {
                let program = controls::timbre_from_slider(x, width);
                if let Some(v) = app.audio.voice_mut(channel) {
                    v.set_timbre(program);
                }
                cfg.program = program;
            }
        }
        app.settings.save();
    }

    fn setup_sliders(document: &web_sys::Document, app: Shared<App>) {
        let names: Vec<String> = app.borrow().settings.balls.iter().map(|b| b.name.clone()).collect();

        for (index, name) in names.iter().enumerate() {
            for slider in Slider::ALL {
                let id = format!("{}_{}", name, slider.suffix());
                let Some(el) = document.get_element_by_id(&id) else {
                    log::debug!("No control `{}`", id);
                    continue;
                };

                let app = app.clone();
                let target = el.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                    let x = event_to_xy(&event, &target).x;
                    apply_slider(&mut app.borrow_mut(), index, slider, x, bar_width(&target));
                });
                let _ = el.add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_app::run() {
        log::error!("Bloink failed to start: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    use clap::Parser;

    use bloink::audio::{AudioManager, LogSynth};
    use bloink::platform::ManualScheduler;
    use bloink::renderer::TextCanvas;
    use bloink::{InitError, Settings, Simulation};

    #[derive(Parser, Debug)]
    #[command(name = "bloink")]
    #[command(about = "Bouncing balls that play notes (headless)", long_about = None)]
    pub struct Args {
        /// Number of ticks to simulate
        #[arg(long, default_value_t = 200)]
        ticks: u64,

        /// RNG seed (block layout); time-based when omitted
        #[arg(long)]
        seed: Option<u64>,

        /// Scale to quantise notes to
        #[arg(long)]
        scale: Option<String>,

        /// JSON settings file
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Print the final frame as text
        #[arg(long, default_value_t = false)]
        frame: bool,

        /// Pixels per character cell for --frame
        #[arg(long, default_value_t = 10.0)]
        cell: f32,

        /// Print the final world as JSON
        #[arg(long, default_value_t = false)]
        snapshot: bool,
    }

    fn clock_seed() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default()
    }

    pub fn run(args: Args) -> Result<(), InitError> {
        let mut settings = match &args.settings {
            Some(path) => Settings::from_file(path)?,
            None => Settings::load(),
        };
        if let Some(scale) = args.scale {
            settings.scale = scale;
        }
        let seed = args.seed.or(settings.seed).unwrap_or_else(clock_seed);

        let mut sim = Simulation::new(&settings, seed)?;
        let mut audio = AudioManager::from_settings(LogSynth::default(), &settings);
        let arena = sim.state().arena;
        let mut canvas = TextCanvas::for_arena(arena.width, arena.height, args.cell);

        let mut scheduler = ManualScheduler::new();
        sim.start(&mut scheduler);

        let period = sim.period_ms() as u64;
        let mut notes = 0usize;
        for _ in 0..scheduler.advance(args.ticks * period) {
            notes += sim.run_frame(&mut audio, &mut canvas);
        }
        sim.stop(&mut scheduler);

        let state = sim.state();
        println!(
            "{} ticks, {} notes ({} sounded), {} blocks, scale {}, seed {}",
            state.time_ticks,
            notes,
            audio.backend().notes_played,
            state.blocks.len(),
            state.scales.current_name(),
            seed
        );
        for ball in &state.balls {
            println!(
                "  {:<10} pos ({:.0}, {:.0}) vel ({}, {})",
                ball.name, ball.pos.x, ball.pos.y, ball.vel.x, ball.vel.y
            );
        }

        if args.frame {
            sim.redraw(&mut canvas);
            println!("{}", canvas);
        }
        if args.snapshot {
            match serde_json::to_string_pretty(&state.snapshot()) {
                Ok(json) => println!("{}", json),
                Err(e) => log::error!("Snapshot failed: {}", e),
            }
        }
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::init();
    let args = native::Args::parse();

    match native::run(args) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("bloink: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}
