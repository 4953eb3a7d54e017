//! HTML canvas 2D context backend

use std::f64::consts::TAU;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{Canvas, OUTLINE};
use crate::error::InitError;
use crate::sim::Rgb;

pub struct Canvas2d {
    ctx: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl Canvas2d {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, InitError> {
        let ctx = canvas
            .get_context("2d")
            .map_err(|e| InitError::Surface(format!("{:?}", e)))?
            .ok_or_else(|| InitError::Surface("no 2d context".into()))?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| InitError::Surface("context is not 2d".into()))?;

        Ok(Self {
            ctx,
            width: canvas.width() as f64,
            height: canvas.height() as f64,
        })
    }

    fn outline(&self) {
        self.ctx.set_line_width(1.0);
        self.ctx.set_stroke_style_str(&OUTLINE.to_string());
        self.ctx.stroke();
    }
}

impl Canvas for Canvas2d {
    fn clear(&mut self, background: Rgb) {
        self.ctx.set_fill_style_str(&background.to_string());
        self.ctx.fill_rect(0.0, 0.0, self.width, self.height);
    }

    fn circle(&mut self, center: Vec2, radius: f32, fill: Rgb) {
        self.ctx.begin_path();
        // arc only fails for a negative radius
        if self
            .ctx
            .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)
            .is_err()
        {
            return;
        }
        self.ctx.set_fill_style_str(&fill.to_string());
        self.ctx.fill();
        self.outline();
    }

    fn rect(&mut self, min: Vec2, max: Vec2, fill: Rgb) {
        let size = max - min;
        self.ctx.begin_path();
        self.ctx
            .rect(min.x as f64, min.y as f64, size.x as f64, size.y as f64);
        self.ctx.set_fill_style_str(&fill.to_string());
        self.ctx.fill();
        self.outline();
    }
}
