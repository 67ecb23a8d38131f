//! Page image encoding: fixed-width JPEG and AVIF pairs per page.
//!
//! Encoding (AVIF in particular) ties up a core for a noticeable stretch
//! per page, so pages are encoded on the blocking thread pool with a
//! semaphore bounding the number of in-flight encodes to the available
//! CPUs.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tokio::sync::Semaphore;

/// Target width of rendered page images.
const TARGET_WIDTH: u32 = 900;

/// AVIF quality (0-100, lower is smaller).
const AVIF_QUALITY: u8 = 50;

/// AVIF encoder speed (1 slowest/best .. 10 fastest).
const AVIF_SPEED: u8 = 6;

/// Encode one rendered page as `{stem}_{index}.jpg` and `.avif` under
/// `images_dir`, downscaling to 900px width when the source is wider.
///
/// Returns the JPEG path; the AVIF sits next to it.
pub fn save_page_image(
    rendered_png: &Path,
    images_dir: &Path,
    pdf_stem: &str,
    page_index: usize,
) -> anyhow::Result<PathBuf> {
    let mut img = image::open(rendered_png)
        .with_context(|| format!("decoding rendered page {}", rendered_png.display()))?;

    // Never upscale; small scans stay at their native resolution.
    if img.width() > TARGET_WIDTH {
        let height = (img.height() as f64 * TARGET_WIDTH as f64 / img.width() as f64) as u32;
        img = img.resize_exact(TARGET_WIDTH, height.max(1), FilterType::Lanczos3);
    }

    let base = images_dir.join(format!("{}_{}", pdf_stem, page_index));

    let jpg_path = base.with_extension("jpg");
    encode_jpeg(&img, &jpg_path)?;

    let avif_path = base.with_extension("avif");
    encode_avif(&img, &avif_path)?;

    Ok(jpg_path)
}

fn encode_jpeg(img: &DynamicImage, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, 85);
    img.to_rgb8().write_with_encoder(encoder)?;
    Ok(())
}

fn encode_avif(img: &DynamicImage, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let writer = std::io::BufWriter::new(file);
    let encoder = AvifEncoder::new_with_speed_quality(writer, AVIF_SPEED, AVIF_QUALITY);
    img.to_rgba8().write_with_encoder(encoder)?;
    Ok(())
}

/// Encode all pages of one document in parallel.
///
/// `rendered_pages` are the rasterized page PNGs in page order. Returns
/// the JPEG paths in the same order. Fails if any single page fails.
pub async fn save_page_images(
    rendered_pages: Vec<PathBuf>,
    images_dir: &Path,
    pdf_stem: &str,
) -> anyhow::Result<Vec<PathBuf>> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut tasks = Vec::with_capacity(rendered_pages.len());
    for (page_index, rendered) in rendered_pages.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let images_dir = images_dir.to_path_buf();
        let pdf_stem = pdf_stem.to_string();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await?;
            tokio::task::spawn_blocking(move || {
                save_page_image(&rendered, &images_dir, &pdf_stem, page_index)
            })
            .await?
        }));
    }

    let results = futures::future::try_join_all(tasks).await?;
    results.into_iter().collect()
}
