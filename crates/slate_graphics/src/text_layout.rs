//! Text layout
//!
//! Splits text into lines, wraps greedily at a caller-set width, and
//! measures through the device so extents agree with what the GC will draw.
//! Glyph-level shaping stays on the backend side; this layer only decides
//! where lines break.

use slate_core::geometry::{Point, Rectangle};
use slate_core::scale::scale_down;
use slate_core::Result;

use crate::device::Device;
use crate::font::Font;
use crate::gc::Gc;
use crate::resource::ResourceState;

pub struct TextLayout {
    state: ResourceState,
    text: String,
    font: Font,
    /// Wrap width in logical points; `None` disables wrapping.
    width: Option<i32>,
}

impl TextLayout {
    pub fn new(device: &Device) -> Self {
        Self {
            state: ResourceState::new(device, "text_layout"),
            text: String::new(),
            font: Font::new(device, device.system_font()),
            width: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<()> {
        self.state.check_disposed()?;
        self.text = text.into();
        Ok(())
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    /// `None` restores the system font.
    pub fn set_font(&mut self, font: Option<Font>) -> Result<()> {
        self.state.check_disposed()?;
        let device = self.state.device();
        self.font = font.unwrap_or_else(|| Font::new(device, device.system_font()));
        Ok(())
    }

    pub fn width(&self) -> Option<i32> {
        self.width
    }

    pub fn set_width(&mut self, width: Option<i32>) -> Result<()> {
        self.state.check_disposed()?;
        if let Some(w) = width {
            if w <= 0 {
                return Err(slate_core::GraphicsError::InvalidArgument(
                    "wrap width must be positive",
                ));
            }
        }
        self.width = width;
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.state.is_disposed()
    }

    pub fn dispose(&self) {
        self.state.mark_disposed();
    }

    fn measure(&self, text: &str) -> Result<(i32, i32)> {
        let device = self.state.device();
        let zoom = device.zoom();
        let (w, h) = device.text_extent(self.font.font_data(), zoom, text)?;
        Ok((scale_down(w, zoom), scale_down(h, zoom)))
    }

    /// The laid-out lines after hard breaks and wrapping.
    pub fn lines(&self) -> Result<Vec<String>> {
        self.state.check_disposed()?;
        let mut lines = Vec::new();
        for paragraph in self.text.split('\n') {
            match self.width {
                None => lines.push(paragraph.to_string()),
                Some(width) => self.wrap_paragraph(paragraph, width, &mut lines)?,
            }
        }
        Ok(lines)
    }

    /// Greedy word wrap; a word wider than the wrap width gets its own line
    /// rather than being split.
    fn wrap_paragraph(&self, paragraph: &str, width: i32, out: &mut Vec<String>) -> Result<()> {
        let mut line = String::new();
        for word in paragraph.split(' ') {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{line} {word}");
            if self.measure(&candidate)?.0 <= width {
                line = candidate;
            } else {
                out.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        out.push(line);
        Ok(())
    }

    pub fn line_count(&self) -> Result<usize> {
        Ok(self.lines()?.len())
    }

    /// Bounding box of the laid-out text in logical points.
    pub fn bounds(&self) -> Result<Rectangle> {
        self.state.check_disposed()?;
        let mut width = 0;
        let mut height = 0;
        for line in self.lines()? {
            let (w, h) = self.measure(&line)?;
            width = width.max(w);
            height += h.max(self.measure(" ")?.1);
        }
        Ok(Rectangle::new(0, 0, width, height))
    }

    /// Draws the laid-out lines at `(x, y)` through `gc`.
    pub fn draw(&self, gc: &mut Gc, x: i32, y: i32) -> Result<()> {
        self.state.check_disposed()?;
        let saved_font = gc.font().clone();
        gc.set_font(Some(self.font.clone()))?;
        let mut line_y = y;
        let result = (|| {
            for line in self.lines()? {
                let (_, h) = self.measure(&line)?;
                gc.draw_string(&line, x, line_y, true)?;
                line_y += h.max(self.measure(" ")?.1);
            }
            Ok(())
        })();
        gc.set_font(Some(saved_font))?;
        result
    }

    /// Point offset of the first position in line `index`.
    pub fn line_offset(&self, index: usize) -> Result<Point> {
        let lines = self.lines()?;
        let mut y = 0;
        for line in lines.iter().take(index) {
            let (_, h) = self.measure(line)?;
            y += h.max(self.measure(" ")?.1);
        }
        Ok(Point::new(0, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendKind, NativeSurface, RecordingSurface};
    use crate::font::FontData;
    use std::rc::Rc;

    fn device() -> Device {
        Device::new(BackendKind::Native(Rc::new(RecordingSurface::new())), 100)
    }

    // The recording backend measures 12pt text at 6 points per character.

    #[test]
    fn test_unwrapped_text_splits_on_newlines() {
        let device = device();
        let mut layout = TextLayout::new(&device);
        layout.set_text("one\ntwo\nthree").unwrap();
        assert_eq!(layout.line_count().unwrap(), 3);
        assert_eq!(layout.lines().unwrap()[1], "two");
        layout.dispose();
    }

    #[test]
    fn test_wrap_breaks_between_words() {
        let device = device();
        let mut layout = TextLayout::new(&device);
        layout.set_font(Some(Font::new(&device, FontData::new("Sans", 12)))).unwrap();
        layout.set_text("aa bb cc").unwrap();
        // "aa bb" is 5 chars = 30 points wide; "aa bb cc" is 48
        layout.set_width(Some(32)).unwrap();
        assert_eq!(layout.lines().unwrap(), vec!["aa bb", "cc"]);
        layout.dispose();
    }

    #[test]
    fn test_oversized_word_keeps_own_line() {
        let device = device();
        let mut layout = TextLayout::new(&device);
        layout.set_font(Some(Font::new(&device, FontData::new("Sans", 12)))).unwrap();
        layout.set_text("a verylongword b").unwrap();
        layout.set_width(Some(12)).unwrap();
        assert_eq!(
            layout.lines().unwrap(),
            vec!["a", "verylongword", "b"]
        );
        layout.dispose();
    }

    #[test]
    fn test_bounds_accumulate_line_heights() {
        let device = device();
        let mut layout = TextLayout::new(&device);
        layout.set_font(Some(Font::new(&device, FontData::new("Sans", 12)))).unwrap();
        layout.set_text("abcd\nef").unwrap();
        let bounds = layout.bounds().unwrap();
        assert_eq!(bounds.width, 24);
        assert_eq!(bounds.height, 24);
        assert_eq!(layout.line_offset(1).unwrap(), Point::new(0, 12));
        layout.dispose();
    }

    #[test]
    fn test_draw_emits_one_text_op_per_line() {
        let surface = Rc::new(RecordingSurface::new());
        let device = Device::new(BackendKind::Native(Rc::clone(&surface) as Rc<dyn NativeSurface>), 100);
        let mut layout = TextLayout::new(&device);
        layout.set_text("one\ntwo").unwrap();
        let mut gc = Gc::for_surface(&device).unwrap();
        layout.draw(&mut gc, 0, 0).unwrap();
        assert_eq!(surface.count("draw_text"), 2);
        gc.dispose();
        layout.dispose();
    }

    #[test]
    fn test_invalid_width_rejected() {
        let device = device();
        let mut layout = TextLayout::new(&device);
        assert!(layout.set_width(Some(0)).is_err());
        layout.set_width(Some(10)).unwrap();
        layout.set_width(None).unwrap();
        layout.dispose();
    }
}
