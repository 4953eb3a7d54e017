//! Browser timers and pointer helpers

use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Element, MouseEvent};

use super::{TickScheduler, TimerId};

/// `setInterval`-backed scheduler; every firing calls the same callback
pub struct IntervalScheduler {
    on_tick: Rc<dyn Fn()>,
    // Closures must outlive their intervals
    live: HashMap<TimerId, Closure<dyn FnMut()>>,
}

impl IntervalScheduler {
    pub fn new(on_tick: Rc<dyn Fn()>) -> Self {
        Self {
            on_tick,
            live: HashMap::new(),
        }
    }
}

impl TickScheduler for IntervalScheduler {
    fn schedule(&mut self, period_ms: u32) -> Option<TimerId> {
        let on_tick = self.on_tick.clone();
        let closure = Closure::<dyn FnMut()>::new(move || on_tick());

        let handle = web_sys::window()?
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                period_ms as i32,
            )
            .map_err(|e| log::error!("setInterval failed: {:?}", e))
            .ok()?;

        let id = TimerId(handle as u32);
        self.live.insert(id, closure);
        Some(id)
    }

    fn cancel(&mut self, id: TimerId) {
        if self.live.remove(&id).is_some() {
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(id.0 as i32);
            }
        }
    }
}

/// Translate a mouse event to coordinates relative to `target`'s top-left
pub fn event_to_xy(event: &MouseEvent, target: &Element) -> Vec2 {
    let rect = target.get_bounding_client_rect();
    Vec2::new(
        (event.client_x() as f64 - rect.left()) as f32,
        (event.client_y() as f64 - rect.top()) as f32,
    )
}
