//! Synthetic puck frames: a bright disc on a dark background carrying
//! rendered Data Matrix symbols at the template anchors
use image::{GrayImage, Luma};

use super::encoder::{encode_symbol, EncodeError};
use crate::detector::GeometryTemplate;
use crate::models::{BitMatrix, Frame, Point};

/// Background intensity
pub const BACKGROUND: u8 = 20;
/// Puck surface and light modules
pub const SURFACE: u8 = 210;
/// Dark modules
pub const INK: u8 = 30;
/// Smudge drawn over occluded symbols
pub const SMUDGE: u8 = 120;

/// What a slot shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotContent {
    /// No pin
    Empty,
    /// Pin with a readable symbol
    Text(String),
    /// Pin whose symbol is covered by a smudge
    Occluded(String),
}

/// Description of one synthetic frame
#[derive(Debug, Clone)]
pub struct PuckScene {
    template: GeometryTemplate,
    module_px: usize,
    margin: usize,
    offset: (f32, f32),
    quarter_turns: usize,
    holder: Option<String>,
    slots: Vec<SlotContent>,
    damaged_modules: usize,
}

impl PuckScene {
    /// Empty scene for `template` with `module_px` pixels per module
    pub fn new(template: GeometryTemplate, module_px: usize) -> Self {
        let slots = vec![SlotContent::Empty; template.slot_count()];
        Self {
            template,
            module_px: module_px.max(1),
            margin: 24,
            offset: (0.0, 0.0),
            quarter_turns: 0,
            holder: None,
            slots,
            damaged_modules: 0,
        }
    }

    /// Empty 16-slot puck
    pub fn unipuck(module_px: usize) -> Self {
        Self::new(GeometryTemplate::unipuck(), module_px)
    }

    /// Side view of a holder with its barcode
    pub fn holder_view(module_px: usize, barcode: &str) -> Self {
        Self::new(GeometryTemplate::holder(), module_px).with_slot(0, barcode)
    }

    /// Every slot filled with `"{prefix}{index:02}"`
    pub fn with_all_slots(mut self, prefix: &str) -> Self {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            *slot = SlotContent::Text(format!("{}{:02}", prefix, i));
        }
        self
    }

    /// Print `text` in slot `index`
    pub fn with_slot(mut self, index: usize, text: &str) -> Self {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = SlotContent::Text(text.to_string());
        }
        self
    }

    /// Print `text` as the holder barcode
    pub fn with_holder(mut self, text: &str) -> Self {
        self.holder = Some(text.to_string());
        self
    }

    /// Leave slot `index` without a pin
    pub fn without_slot(mut self, index: usize) -> Self {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = SlotContent::Empty;
        }
        self
    }

    /// Cover the symbol in `index` with a smudge
    pub fn occlude_slot(mut self, index: usize) -> Self {
        if let Some(slot) = self.slots.get_mut(index) {
            let text = match slot {
                SlotContent::Text(t) | SlotContent::Occluded(t) => t.clone(),
                SlotContent::Empty => String::new(),
            };
            *slot = SlotContent::Occluded(text);
        }
        self
    }

    /// Remove the smudge from `index`
    pub fn reveal_slot(mut self, index: usize) -> Self {
        if let Some(slot) = self.slots.get_mut(index) {
            if let SlotContent::Occluded(text) = slot {
                *slot = SlotContent::Text(std::mem::take(text));
            }
        }
        self
    }

    /// Move the puck by (dx, dy) pixels
    pub fn shifted(mut self, dx: f32, dy: f32) -> Self {
        self.offset = (dx, dy);
        self
    }

    /// Rotate every symbol by a quarter turn `turns` times (square symbols)
    pub fn with_symbol_turns(mut self, turns: usize) -> Self {
        self.quarter_turns = turns % 4;
        self
    }

    /// Invert the first `count` data modules of every symbol
    pub fn with_damage(mut self, count: usize) -> Self {
        self.damaged_modules = count;
        self
    }

    /// Template the scene is laid out on
    pub fn template(&self) -> &GeometryTemplate {
        &self.template
    }

    /// Slot contents in template order
    pub fn slots(&self) -> &[SlotContent] {
        &self.slots
    }

    /// Symbol side in pixels
    pub fn symbol_side(&self) -> f32 {
        (self.module_px * self.template.symbol.rows().max(self.template.symbol.cols())) as f32
    }

    /// Puck radius in pixels
    pub fn radius(&self) -> f32 {
        self.symbol_side() / self.template.symbol_span
    }

    /// Square frame side
    pub fn frame_side(&self) -> usize {
        let shift = self.offset.0.abs().max(self.offset.1.abs());
        (2.0 * (self.radius() + shift)).ceil() as usize + 2 * self.margin
    }

    /// Puck centre in the frame
    pub fn center(&self) -> Point {
        let half = self.frame_side() as f32 / 2.0;
        Point::new(half + self.offset.0, half + self.offset.1)
    }

    /// Where the symbol of a slot (or the holder, for `None`) is drawn
    pub fn symbol_center(&self, index: Option<usize>) -> Point {
        let anchor = match index {
            Some(i) => self.template.slots.get(i).copied(),
            None => self.template.holder,
        }
        .unwrap_or_default();
        let r = self.radius();
        self.center().translate(anchor.x * r, anchor.y * r)
    }

    /// Draw the scene
    pub fn render(&self) -> Frame {
        self.try_render().unwrap_or_else(|_| {
            let side = self.frame_side() as u32;
            Frame::new(GrayImage::from_pixel(side, side, Luma([BACKGROUND])))
        })
    }

    /// Draw the scene, failing on text that does not fit the symbol
    pub fn try_render(&self) -> Result<Frame, EncodeError> {
        let side = self.frame_side() as u32;
        let mut image = GrayImage::from_pixel(side, side, Luma([BACKGROUND]));

        let center = self.center();
        let r = self.radius();
        for (x, y, px) in image.enumerate_pixels_mut() {
            let (dx, dy) = (x as f32 + 0.5 - center.x, y as f32 + 0.5 - center.y);
            if dx * dx + dy * dy <= r * r {
                *px = Luma([SURFACE]);
            }
        }

        if let Some(text) = &self.holder {
            self.draw_symbol(&mut image, None, text)?;
        }
        for (i, slot) in self.slots.iter().enumerate() {
            match slot {
                SlotContent::Empty => {}
                SlotContent::Text(text) => self.draw_symbol(&mut image, Some(i), text)?,
                SlotContent::Occluded(_) => self.draw_smudge(&mut image, Some(i)),
            }
        }

        Ok(Frame::new(image))
    }

    fn top_left(&self, index: Option<usize>, w: usize, h: usize) -> (i64, i64) {
        let c = self.symbol_center(index);
        let px = self.module_px as f32;
        (
            (c.x - w as f32 * px / 2.0).round() as i64,
            (c.y - h as f32 * px / 2.0).round() as i64,
        )
    }

    fn draw_symbol(
        &self,
        image: &mut GrayImage,
        index: Option<usize>,
        text: &str,
    ) -> Result<(), EncodeError> {
        let mut symbol = encode_symbol(text, self.template.symbol)?;
        self.damage(&mut symbol);
        for _ in 0..self.quarter_turns {
            symbol = symbol.rotated_cw();
        }

        let (w, h) = (symbol.width(), symbol.height());
        let (ox, oy) = self.top_left(index, w, h);
        let px = self.module_px;
        for my in 0..h {
            for mx in 0..w {
                if symbol.get(mx, my) {
                    fill(image, ox + (mx * px) as i64, oy + (my * px) as i64, px, px, INK);
                }
            }
        }
        Ok(())
    }

    fn damage(&self, symbol: &mut BitMatrix) {
        // Spread the damage along the first data row of the symbol
        let mut remaining = self.damaged_modules;
        let mut x = 1;
        while remaining > 0 && x + 1 < symbol.width() {
            symbol.toggle(x, 1);
            remaining -= 1;
            x += 2;
        }
    }

    fn draw_smudge(&self, image: &mut GrayImage, index: Option<usize>) {
        let size = self.template.symbol;
        let (ox, oy) = self.top_left(index, size.cols(), size.rows());
        let px = self.module_px;
        fill(image, ox, oy, size.cols() * px, size.rows() * px, SMUDGE);
    }
}

fn fill(image: &mut GrayImage, x0: i64, y0: i64, w: usize, h: usize, value: u8) {
    for y in y0.max(0)..(y0 + h as i64).min(image.height() as i64) {
        for x in x0.max(0)..(x0 + w as i64).min(image.width() as i64) {
            image.put_pixel(x as u32, y as u32, Luma([value]));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_dimensions() {
        let scene = PuckScene::unipuck(3);
        assert_eq!(scene.symbol_side(), 42.0);
        assert!((scene.radius() - 262.5).abs() < 1e-3);
        let frame = scene.render();
        assert_eq!(frame.width(), scene.frame_side());
        assert_eq!(frame.intensity(0, 0), BACKGROUND);
        let c = scene.center();
        assert_eq!(frame.intensity(c.x as usize, c.y as usize), SURFACE);
    }

    #[test]
    fn test_symbol_drawn_at_anchor() {
        let scene = PuckScene::unipuck(3).with_slot(0, "A");
        let frame = scene.render();
        let c = scene.symbol_center(Some(0));
        // Bottom-left module of the finder is dark
        let (x, y) = ((c.x - 20.0) as usize, (c.y + 20.0) as usize);
        assert_eq!(frame.intensity(x, y), INK);
    }

    #[test]
    fn test_text_too_long() {
        let scene = PuckScene::unipuck(3).with_slot(0, "THIS DOES NOT FIT");
        assert!(matches!(scene.try_render(), Err(EncodeError::TooLong { .. })));
    }
}
