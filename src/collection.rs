//! Documents in rotation: an ordered, non-empty list of paginated items.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::Error;
use crate::processing::layout::Size;

/// Stable identity of an item, used to key carousel thumbnails.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(PathBuf);

impl From<PathBuf> for ItemId {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&str> for ItemId {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A pre-rendered page bitmap. Shared read-only with the draw sink.
#[derive(Debug, Clone)]
pub struct Page {
    bitmap: Arc<RgbaImage>,
}

impl Page {
    pub fn new(bitmap: Arc<RgbaImage>) -> Self {
        Self { bitmap }
    }

    pub fn bitmap(&self) -> &Arc<RgbaImage> {
        &self.bitmap
    }

    pub fn size(&self) -> Size {
        Size::new(self.bitmap.width(), self.bitmap.height())
    }
}

#[derive(Debug, Clone)]
pub struct Item {
    pub id: ItemId,
    pub pages: Vec<Page>,
    pub thumbnail: Arc<RgbaImage>,
    pub modified: DateTime<Utc>,
}

impl Item {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

#[derive(Debug, Clone)]
pub struct Collection {
    items: Vec<Item>,
}

impl Collection {
    /// Items without pages are dropped; an empty result is an error.
    pub fn new(items: Vec<Item>) -> Result<Self, Error> {
        let items: Vec<Item> = items.into_iter().filter(|i| !i.pages.is_empty()).collect();
        if items.is_empty() {
            return Err(Error::EmptyCollection);
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Page count of the item at `index`, zero when out of range.
    pub fn page_count(&self, index: usize) -> usize {
        self.items.get(index).map_or(0, Item::page_count)
    }

    pub fn page(&self, index: usize, page: usize) -> Option<&Page> {
        self.items.get(index)?.pages.get(page)
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R, files: bool, pages: bool) {
        if pages {
            for item in &mut self.items {
                item.pages.shuffle(rng);
            }
        }
        if files {
            self.items.shuffle(rng);
        }
    }
}
