//! The score: a PDF opened through mupdf with cached page geometry.

use std::path::{Path, PathBuf};

use log::{debug, info};
use mupdf::{Colorspace, Device, Document, Matrix, Pixmap};

use crate::geometry::{PageSize, PixelRect};
use crate::view::PageGeometry;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("cannot resolve {}: {source}", path.display())]
    BadPath {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: mupdf::error::Error,
    },
    #[error("{} has no pages", path.display())]
    NoPages { path: PathBuf },
    #[error("page {index} is out of range")]
    PageOutOfRange { index: usize },
    #[error("empty render clip")]
    EmptyClip,
    #[error("unsupported pixmap format: {0} channels")]
    PixmapFormat(usize),
    #[error(transparent)]
    Pdf(#[from] mupdf::error::Error),
}

/// Tightly packed 8-bit RGB pixels.
#[derive(Debug, Clone)]
pub struct RgbImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

pub struct ScoreDocument {
    doc: Document,
    path: PathBuf,
    sizes: Vec<PageSize>,
}

impl ScoreDocument {
    /// Open `path` and measure every page.
    ///
    /// The path is canonicalized first so later comparisons (extraction
    /// destination, file watching) see one absolute form.
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let path = path
            .canonicalize()
            .map_err(|source| DocumentError::BadPath {
                path: path.to_path_buf(),
                source,
            })?;
        let doc = Document::open(path.to_string_lossy().as_ref()).map_err(|source| {
            DocumentError::Open {
                path: path.clone(),
                source,
            }
        })?;
        let count = doc.page_count().map_err(|source| DocumentError::Open {
            path: path.clone(),
            source,
        })?;
        if count <= 0 {
            return Err(DocumentError::NoPages { path });
        }

        let mut sizes = Vec::with_capacity(count as usize);
        for i in 0..count {
            let bounds = doc.load_page(i)?.bounds()?;
            let size = PageSize::new(
                f64::from(bounds.x1 - bounds.x0).max(1.0),
                f64::from(bounds.y1 - bounds.y0).max(1.0),
            );
            debug!("page {i}: {:.1}x{:.1} pt", size.width, size.height);
            sizes.push(size);
        }
        info!("opened {} ({} pages)", path.display(), sizes.len());

        Ok(Self { doc, path, sizes })
    }

    /// Absolute path of the opened file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn page_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn page_size(&self, index: usize) -> Option<PageSize> {
        self.sizes.get(index).copied()
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.sizes
    }

    /// Rasterize the `clip` part of page `index` drawn at `scale` pixels
    /// per point. `clip` is relative to the page's top-left corner.
    ///
    /// Only the clip is allocated, so a deeply zoomed page costs no more
    /// than the part of it on screen.
    pub fn render_clip(
        &self,
        index: usize,
        scale: f64,
        clip: PixelRect,
    ) -> Result<RgbImage, DocumentError> {
        if index >= self.sizes.len() {
            return Err(DocumentError::PageOutOfRange { index });
        }
        if clip.width == 0 || clip.height == 0 {
            return Err(DocumentError::EmptyClip);
        }
        let page = self.doc.load_page(index as i32)?;
        let bounds = page.bounds()?;
        let s = scale as f32;
        let ctm = Matrix::new(
            s,
            0.0,
            0.0,
            s,
            -(bounds.x0 * s) - clip.x as f32,
            -(bounds.y0 * s) - clip.y as f32,
        );

        let mut pixmap = Pixmap::new_with_w_h(
            &Colorspace::device_rgb(),
            clip.width as i32,
            clip.height as i32,
            false,
        )?;
        pixmap.clear_with(0xff)?;
        {
            let device = Device::from_pixmap(&pixmap)?;
            page.run(&device, &ctm)?;
        }
        let image = pixmap_to_rgb(&pixmap)?;
        debug!(
            "render: page {index} at {scale:.3}, clip {}x{}+{}+{}",
            clip.width, clip.height, clip.x, clip.y
        );
        Ok(image)
    }
}

impl PageGeometry for ScoreDocument {
    fn page_count(&self) -> usize {
        ScoreDocument::page_count(self)
    }

    fn page_size(&self, index: usize) -> Option<PageSize> {
        ScoreDocument::page_size(self, index)
    }
}

/// Copy the first three channels of each pixel, dropping row padding.
fn pixmap_to_rgb(pixmap: &Pixmap) -> Result<RgbImage, DocumentError> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(DocumentError::PixmapFormat(n));
    }
    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;

    let mut data = Vec::with_capacity(width * height * 3);
    for row in samples.chunks(stride.max(1)).take(height) {
        let Some(row) = row.get(..row_bytes) else {
            break;
        };
        if n == 3 {
            data.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                data.extend_from_slice(&px[..3]);
            }
        }
    }

    Ok(RgbImage {
        width: width as u32,
        height: height as u32,
        data,
    })
}
