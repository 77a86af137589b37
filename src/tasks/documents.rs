use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use image::RgbaImage;
use image::imageops;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::collection::{Item, ItemId, Page};
use crate::error::Error;
use crate::processing::thumbnails::scale_to_height;

/// Produces the documents to rotate through. Called at startup and on reload,
/// always from the blocking pool since listing decodes every page.
pub trait DocumentSource: Send + Sync + 'static {
    /// Undecodable documents are skipped, not reported as errors.
    fn list_items(&self) -> Result<Vec<Item>>;
}

/// Runs [`DocumentSource::list_items`] on the blocking pool.
pub async fn list_items_blocking<D: DocumentSource>(source: Arc<D>) -> Result<Vec<Item>> {
    tokio::task::spawn_blocking(move || source.list_items())
        .await
        .context("document listing task failed")?
}

/// A document before decoding: its identity and the page files in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentEntry {
    pub id: PathBuf,
    pub pages: Vec<PathBuf>,
}

/// Reads documents from a directory tree. Image files directly under the
/// root are single-page documents; every subdirectory holding images is one
/// multi-page document.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    thumbnail_height: u32,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, thumbnail_height: u32) -> Self {
        Self {
            root: root.into(),
            thumbnail_height,
        }
    }
}

impl DocumentSource for DirectorySource {
    #[instrument(skip(self), fields(root = %self.root.display()))]
    fn list_items(&self) -> Result<Vec<Item>> {
        if !self.root.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} is not a directory", self.root.display()),
            ))
            .into());
        }
        let entries = discover(&self.root);
        let discovered = entries.len();
        let items: Vec<Item> = entries
            .into_iter()
            .filter_map(|entry| match load_item(&entry, self.thumbnail_height) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!(error = %err, "skipping document");
                    None
                }
            })
            .collect();
        info!(discovered, loaded = items.len(), "document scan complete");
        Ok(items)
    }
}

/// Groups image files under `root` into documents, sorted case-insensitively
/// by id and pages by file name.
pub fn discover(root: &Path) -> Vec<DocumentEntry> {
    let mut groups: BTreeMap<(String, PathBuf), Vec<PathBuf>> = BTreeMap::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .min_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path().to_path_buf();
        if !is_image(&path) {
            debug!(path = %path.display(), "not an image; ignored");
            continue;
        }
        let id = match path.parent() {
            Some(parent) if parent != root => parent.to_path_buf(),
            _ => path.clone(),
        };
        groups.entry((sort_key(&id), id)).or_default().push(path);
    }

    groups
        .into_iter()
        .map(|((_, id), mut pages)| {
            pages.sort_by_cached_key(|p| sort_key(p.file_name().map_or(p.as_os_str(), |n| n)));
            DocumentEntry { id, pages }
        })
        .collect()
}

fn sort_key(p: impl AsRef<OsStr>) -> String {
    p.as_ref().to_string_lossy().to_lowercase()
}

fn load_item(entry: &DocumentEntry, thumbnail_height: u32) -> Result<Item, Error> {
    let mut pages = Vec::with_capacity(entry.pages.len());
    let mut modified: Option<DateTime<Utc>> = None;
    for path in &entry.pages {
        match decode_rgba8_apply_exif(path) {
            Ok(bitmap) => {
                pages.push(Page::new(Arc::new(bitmap)));
                if let Some(mtime) = modified_time(path) {
                    modified = Some(modified.map_or(mtime, |m| m.max(mtime)));
                }
            }
            Err(err) => warn!(path = %path.display(), error = %err, "skipping page"),
        }
    }
    let Some(first) = pages.first() else {
        return Err(Error::Load {
            path: entry.id.clone(),
            source: anyhow::anyhow!("no decodable pages"),
        });
    };
    let thumbnail = scale_to_height(first.bitmap(), thumbnail_height);
    debug!(
        id = %entry.id.display(),
        pages = pages.len(),
        "document loaded"
    );
    Ok(Item {
        id: ItemId::from(entry.id.clone()),
        pages,
        thumbnail: Arc::new(thumbnail),
        modified: modified.unwrap_or_default(),
    })
}

fn modified_time(path: &Path) -> Option<DateTime<Utc>> {
    let mtime = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    Some(DateTime::<Utc>::from(mtime))
}

/// Decodes to RGBA8 and applies the EXIF orientation when present.
fn decode_rgba8_apply_exif(path: &Path) -> Result<RgbaImage> {
    let img = image::ImageReader::open(path)?
        .with_guessed_format()?
        .decode()?
        .to_rgba8();

    let img = match read_orientation(path).unwrap_or(1) {
        2 => imageops::flip_horizontal(&img),
        3 => imageops::rotate180(&img),
        4 => imageops::flip_vertical(&img),
        5 => imageops::flip_horizontal(&imageops::rotate90(&img)),
        6 => imageops::rotate90(&img),
        7 => imageops::flip_horizontal(&imageops::rotate270(&img)),
        8 => imageops::rotate270(&img),
        _ => img,
    };
    Ok(img)
}

fn read_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    let o = field.value.get_uint(0)? as u16;
    debug!(orientation = o, path = %path.display(), "exif orientation");
    Some(o)
}

fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if ["jpg", "jpeg", "png", "gif", "webp"].contains(&e.as_str())
    )
}
