//! Text source for the scene: a catalog of labels handed out in pages.
//!
//! The catalog keeps a fixed display order (innermost orbit first) and a
//! deduplicated list of [`TextItem`]s. [`TextCatalog::next_page`] walks the
//! display order one page at a time and returns an empty page once it is
//! exhausted. [`BatchLoader`] calls it on a fixed delay, driven by frame
//! time, so labels appear in waves instead of all at once.
//!
//! Colors are derived from the text itself by [`generate_color`], so the same
//! word always gets the same color.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::color::{hsl_to_rgb, Rgb};

/// Texts shown by default, innermost orbit first.
pub const DISPLAY_ORDER: [&str; 13] = [
    "Hello World!",
    "Three.js",
    "JavaScript",
    "Python",
    "Java",
    "C++",
    "React",
    "Vue",
    "Angular",
    "Node.js",
    "linzefei",
    "Cursor",
    "2025",
];

/// Base hues in degrees: red, yellow, green, cyan, blue, magenta.
pub const BASE_HUES: [f64; 6] = [0.0, 60.0, 120.0, 180.0, 240.0, 300.0];

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Default delay between batches, in seconds.
pub const DEFAULT_BATCH_INTERVAL: f32 = 1.0;

/// String hash over UTF-16 code units.
///
/// Each step computes `c + ((hash << 5) - hash)`, where the shift operates on
/// the 32-bit truncation of `hash` but the subtraction does not.
pub fn text_hash(text: &str) -> i64 {
    text.encode_utf16().fold(0i64, |hash, unit| {
        let shifted = (hash as i32).wrapping_shl(5) as i64;
        unit as i64 + shifted - hash
    })
}

/// Deterministic color for a text.
pub fn generate_color(text: &str) -> Rgb {
    let hash = text_hash(text);
    let magnitude = hash.unsigned_abs();

    let hue = BASE_HUES[(magnitude % BASE_HUES.len() as u64) as usize];
    let saturation = 50 + magnitude % 50;
    let lightness = 40 + ((hash as i32) >> 4).unsigned_abs() % 20;

    hsl_to_rgb(hue, saturation as f64, lightness as f64)
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A text with its color.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextItem {
    pub text: String,
    pub color: Rgb,
    /// Creation time in unix milliseconds.
    pub created: u64,
}

impl TextItem {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            color: generate_color(&text),
            text,
            created: unix_millis(),
        }
    }
}

/// Catalog of texts and the paging cursor over the display order.
#[derive(Clone, Debug)]
pub struct TextCatalog {
    items: Vec<TextItem>,
    display_order: Vec<String>,
    page_size: usize,
    /// Display-order index of the next text to page out.
    cursor: usize,
}

impl TextCatalog {
    /// Catalog with the default display order.
    pub fn new() -> Self {
        Self::with_display_order(DISPLAY_ORDER.iter().map(|s| s.to_string()))
    }

    /// Catalog with a custom display order. Duplicates are dropped.
    pub fn with_display_order<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self {
            items: Vec::new(),
            display_order: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            cursor: 0,
        };
        catalog.extend_display_order(order);
        catalog
    }

    /// Add a text if it is not already present.
    ///
    /// Returns `false` for duplicates.
    pub fn add_text(&mut self, text: &str) -> bool {
        if self.find(text).is_some() {
            return false;
        }
        let item = TextItem::new(text);
        tracing::debug!("catalog: added {:?} with color {}", text, item.color);
        self.items.push(item);
        true
    }

    /// Add several texts. Returns how many were new.
    pub fn add_texts<I, S>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .filter(|t| self.add_text(t.as_ref()))
            .count()
    }

    /// Remove a text. Returns `false` if it was not present.
    pub fn remove_text(&mut self, text: &str) -> bool {
        match self.items.iter().position(|item| item.text == text) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Append texts to the display order, skipping ones already in it.
    ///
    /// Returns how many were appended.
    pub fn extend_display_order<I, S>(&mut self, texts: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for text in texts {
            let text = text.into();
            if !text.is_empty() && !self.display_order.contains(&text) {
                self.display_order.push(text);
                added += 1;
            }
        }
        added
    }

    /// The next page of the display order, adding missing items on the way.
    ///
    /// Returns an empty page once the display order is exhausted. Texts
    /// appended later are paged out starting where the last page ended.
    pub fn next_page(&mut self) -> Vec<TextItem> {
        let start = self.cursor;
        if start >= self.display_order.len() {
            return Vec::new();
        }
        let end = (start + self.page_size).min(self.display_order.len());

        let texts: Vec<String> = self.display_order[start..end].to_vec();
        let mut page = Vec::with_capacity(texts.len());
        for text in &texts {
            self.add_text(text);
            if let Some(item) = self.find(text) {
                page.push(item.clone());
            }
        }

        self.cursor = end;
        page
    }

    /// Start paging from the beginning again.
    pub fn reset_paging(&mut self) {
        self.cursor = 0;
    }

    /// Drop all items and reset paging. The display order is kept.
    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
    }

    /// Number of texts in the display order.
    pub fn count(&self) -> usize {
        self.display_order.len()
    }

    /// Set the page size. Zero is treated as one.
    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn items(&self) -> &[TextItem] {
        &self.items
    }

    pub fn display_order(&self) -> &[String] {
        &self.display_order
    }

    /// Orbit level of a text: its position in the display order.
    pub fn level_of(&self, text: &str) -> Option<usize> {
        self.display_order.iter().position(|t| t == text)
    }

    fn find(&self, text: &str) -> Option<&TextItem> {
        self.items.iter().find(|item| item.text == text)
    }
}

impl Default for TextCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Pulls pages from a [`TextCatalog`] with a fixed delay between them.
#[derive(Clone, Debug)]
pub struct BatchLoader {
    interval: f32,
    timer: f32,
    exhausted: bool,
}

impl BatchLoader {
    /// A loader that delivers its first page on the first poll.
    pub fn new(interval: f32) -> Self {
        let interval = interval.max(0.0);
        Self {
            interval,
            timer: interval,
            exhausted: false,
        }
    }

    pub fn interval(&self) -> f32 {
        self.interval
    }

    /// Whether the catalog returned an empty page.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Advance by `dt` seconds and return a page if one is due.
    pub fn poll(&mut self, catalog: &mut TextCatalog, dt: f32) -> Option<Vec<TextItem>> {
        if self.exhausted {
            return None;
        }
        if dt.is_finite() && dt > 0.0 {
            self.timer += dt;
        }
        if self.timer < self.interval {
            return None;
        }
        self.timer = 0.0;

        let page = catalog.next_page();
        if page.is_empty() {
            self.exhausted = true;
            tracing::info!("text catalog exhausted after {} texts", catalog.count());
            return None;
        }
        tracing::info!("loaded a batch of {} texts", page.len());
        Some(page)
    }

    /// Deliver the next page immediately and resume polling.
    pub fn reset(&mut self) {
        self.timer = self.interval;
        self.exhausted = false;
    }
}

impl Default for BatchLoader {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_INTERVAL)
    }
}
