//! Character-grid canvas for terminals and tests

use std::fmt;

use glam::Vec2;

use super::Canvas;
use crate::distance;
use crate::sim::Rgb;

const EMPTY: char = ' ';
const BLOCK_EDGE: char = '#';
const BLOCK_FILL: char = ':';

/// Rasterises shapes into `cols` x `rows` cells of `cell` pixels each.
///
/// A cell takes a shape's glyph when its centre lies inside the shape. Balls
/// are drawn as the initial of their dominant colour channel (`R`, `G`, `B`,
/// or `O` when no channel dominates).
#[derive(Debug, Clone)]
pub struct TextCanvas {
    cols: usize,
    rows: usize,
    cell: f32,
    cells: Vec<char>,
}

impl TextCanvas {
    pub fn new(cols: usize, rows: usize, cell: f32) -> Self {
        Self {
            cols,
            rows,
            cell: cell.max(1.0),
            cells: vec![EMPTY; cols * rows],
        }
    }

    /// Grid sized to cover a `width` x `height` arena
    pub fn for_arena(width: f32, height: f32, cell: f32) -> Self {
        let cell = cell.max(1.0);
        let cols = (width / cell).ceil().max(1.0) as usize;
        let rows = (height / cell).ceil().max(1.0) as usize;
        Self::new(cols, rows, cell)
    }

    pub fn get(&self, col: usize, row: usize) -> Option<char> {
        (col < self.cols && row < self.rows).then(|| self.cells[row * self.cols + col])
    }

    fn set(&mut self, col: usize, row: usize, glyph: char) {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col] = glyph;
        }
    }

    fn cell_center(&self, col: usize, row: usize) -> Vec2 {
        Vec2::new((col as f32 + 0.5) * self.cell, (row as f32 + 0.5) * self.cell)
    }

    /// Inclusive cell span covering `[lo, hi]` pixels along one axis
    fn span(&self, lo: f32, hi: f32, len: usize) -> Option<(usize, usize)> {
        if len == 0 || hi < 0.0 || lo > len as f32 * self.cell {
            return None;
        }
        let first = (lo / self.cell).floor().max(0.0) as usize;
        let last = ((hi / self.cell).floor().max(0.0) as usize).min(len - 1);
        (first <= last).then_some((first, last))
    }

    fn ball_glyph(color: Rgb) -> char {
        let Rgb { r, g, b } = color;
        if r > g && r > b {
            'R'
        } else if g > r && g > b {
            'G'
        } else if b > r && b > g {
            'B'
        } else {
            'O'
        }
    }
}

impl Canvas for TextCanvas {
    fn clear(&mut self, _background: Rgb) {
        self.cells.fill(EMPTY);
    }

    fn circle(&mut self, center: Vec2, radius: f32, fill: Rgb) {
        let glyph = Self::ball_glyph(fill);
        let Some((c0, c1)) = self.span(center.x - radius, center.x + radius, self.cols) else {
            return;
        };
        let Some((r0, r1)) = self.span(center.y - radius, center.y + radius, self.rows) else {
            return;
        };
        let mut drawn = false;
        for row in r0..=r1 {
            for col in c0..=c1 {
                if distance(self.cell_center(col, row), center) <= radius {
                    self.set(col, row, glyph);
                    drawn = true;
                }
            }
        }
        // Small balls still get the cell they sit in
        if !drawn && center.x >= 0.0 && center.y >= 0.0 {
            self.set(
                (center.x / self.cell) as usize,
                (center.y / self.cell) as usize,
                glyph,
            );
        }
    }

    fn rect(&mut self, min: Vec2, max: Vec2, _fill: Rgb) {
        let Some((c0, c1)) = self.span(min.x, max.x, self.cols) else {
            return;
        };
        let Some((r0, r1)) = self.span(min.y, max.y, self.rows) else {
            return;
        };
        for row in r0..=r1 {
            for col in c0..=c1 {
                let edge = row == r0 || row == r1 || col == c0 || col == c1;
                self.set(col, row, if edge { BLOCK_EDGE } else { BLOCK_FILL });
            }
        }
    }
}

impl fmt::Display for TextCanvas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.cells.chunks(self.cols.max(1)).enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            let line: String = row.iter().collect();
            f.write_str(line.trim_end())?;
        }
        Ok(())
    }
}
