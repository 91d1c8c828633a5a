//! Screenshot baselines for the visual layer.
//!
//! Each route gets one PNG per run under `screenshots/`, keyed by its slug.
//! A capture is compared with `baselines/<slug>.png`; identical bytes short
//! circuit, otherwise pixels are compared with a small per-channel tolerance
//! and a red-on-grey overlay is written to `diffs/<slug>-diff.png`.

use image::{DynamicImage, GenericImageView, Pixel, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

/// Per-channel drift ignored when comparing pixels.
const CHANNEL_TOLERANCE: u8 = 5;

const CHANGED: Rgba<u8> = Rgba([255, 0, 0, 255]);

/// Outcome of comparing one capture with its baseline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDiff {
    pub name: String,
    pub matches: bool,
    /// Share of differing pixels, 0.0 - 100.0
    pub diff_percent: f64,
    pub diff_pixels: u64,
    pub total_pixels: u64,
    pub diff_image_path: Option<PathBuf>,
    /// Capture and baseline were byte-identical
    pub identical: bool,
    /// The baseline was written by this comparison
    pub baseline_created: bool,
}

impl VisualDiff {
    fn clean(name: &str, total_pixels: u64, baseline_created: bool) -> Self {
        Self {
            name: name.to_string(),
            matches: true,
            diff_percent: 0.0,
            diff_pixels: 0,
            total_pixels,
            diff_image_path: None,
            identical: true,
            baseline_created,
        }
    }
}

/// Pixel comparison of two images of possibly different sizes.
/// Pixels outside the overlap count as changed.
struct PixelDiff {
    changed: u64,
    total: u64,
    overlay: RgbaImage,
}

impl PixelDiff {
    fn between(actual: &DynamicImage, baseline: &DynamicImage) -> Self {
        let actual = actual.to_rgba8();
        let baseline = baseline.to_rgba8();
        let width = actual.width().max(baseline.width());
        let height = actual.height().max(baseline.height());

        let mut changed = 0u64;
        let overlay = RgbaImage::from_fn(width, height, |x, y| {
            let in_both = x < actual.width() && y < actual.height() && x < baseline.width() && y < baseline.height();
            let same = if in_both {
                let a = actual.get_pixel(x, y);
                close_enough(a, baseline.get_pixel(x, y)).then_some(*a)
            } else {
                None
            };
            match same {
                Some(pixel) => faded(&pixel),
                None => {
                    changed += 1;
                    CHANGED
                }
            }
        });

        Self { changed, total: u64::from(width) * u64::from(height), overlay }
    }

    fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.changed as f64 * 100.0 / self.total as f64
        }
    }
}

fn close_enough(a: &Rgba<u8>, b: &Rgba<u8>) -> bool {
    a.channels().iter().zip(b.channels()).all(|(x, y)| x.abs_diff(*y) <= CHANNEL_TOLERANCE)
}

fn faded(pixel: &Rgba<u8>) -> Rgba<u8> {
    let [r, g, b, _] = pixel.0;
    Rgba([r / 2, g / 2, b / 2, 128])
}

/// Screenshot store and comparator for one output directory
pub struct VisualTester {
    config: VisualConfig,
}

impl VisualTester {
    pub fn new(config: &VisualConfig) -> E2eResult<Self> {
        for dir in [&config.baseline_dir, &config.actual_dir, &config.diff_dir] {
            std::fs::create_dir_all(dir)?;
        }
        Ok(Self { config: config.clone() })
    }

    pub fn threshold(&self) -> f64 {
        self.config.threshold
    }

    /// Store `png` as this run's capture for `name`
    pub fn record(&self, name: &str, png: &[u8]) -> E2eResult<PathBuf> {
        let path = self.capture_path(name);
        std::fs::write(&path, png)?;
        Ok(path)
    }

    pub fn check(&self, name: &str, png: &[u8], threshold: Option<f64>) -> E2eResult<VisualDiff> {
        self.record(name, png)?;
        self.compare(name, threshold)
    }

    /// Compare the stored capture for `name` with its baseline.
    /// A missing baseline is `BaselineNotFound` unless auto-update is on.
    pub fn compare(&self, name: &str, threshold: Option<f64>) -> E2eResult<VisualDiff> {
        let capture = self.capture_path(name);
        let baseline = self.baseline_path(name);
        if !capture.exists() {
            return Err(E2eError::VisualRegression(format!("no capture recorded for {}", name)));
        }

        if !baseline.exists() {
            if !self.config.auto_update {
                return Err(E2eError::BaselineNotFound(baseline.display().to_string()));
            }
            std::fs::copy(&capture, &baseline)?;
            info!("Baseline created for {}", name);
            let (width, height) = image::open(&capture)?.dimensions();
            return Ok(VisualDiff::clean(name, u64::from(width) * u64::from(height), true));
        }

        let actual = image::open(&capture)?;
        if digest(&capture)? == digest(&baseline)? {
            debug!("{}: capture identical to baseline", name);
            let (width, height) = actual.dimensions();
            return Ok(VisualDiff::clean(name, u64::from(width) * u64::from(height), false));
        }

        let expected = image::open(&baseline)?;
        if actual.dimensions() != expected.dimensions() {
            warn!("{}: size changed from {:?} to {:?}", name, expected.dimensions(), actual.dimensions());
        }

        let pixels = PixelDiff::between(&actual, &expected);
        let threshold = threshold.unwrap_or(self.config.threshold);
        let diff_percent = pixels.percent();
        let matches = diff_percent <= threshold;

        let diff_image_path = if pixels.changed > 0 {
            let path = self.config.diff_dir.join(format!("{}-diff.png", name));
            pixels.overlay.save(&path)?;
            Some(path)
        } else {
            None
        };
        if !matches {
            warn!("{}: {:.2}% of pixels changed, threshold {:.2}%", name, diff_percent, threshold);
        }

        Ok(VisualDiff {
            name: name.to_string(),
            matches,
            diff_percent,
            diff_pixels: pixels.changed,
            total_pixels: pixels.total,
            diff_image_path,
            identical: false,
            baseline_created: false,
        })
    }

    /// Make this run's capture for `name` the new baseline
    pub fn update_baseline(&self, name: &str) -> E2eResult<()> {
        let capture = self.capture_path(name);
        if !capture.exists() {
            return Err(E2eError::VisualRegression(format!(
                "cannot promote {}: no capture at {}",
                name,
                capture.display()
            )));
        }
        std::fs::copy(&capture, self.baseline_path(name))?;
        debug!("Promoted {} to baseline", name);
        Ok(())
    }

    /// Promote every capture of this run. Returns how many were promoted.
    pub fn update_all_baselines(&self) -> E2eResult<usize> {
        let names = png_stems(&self.config.actual_dir)?;
        for name in &names {
            self.update_baseline(name)?;
        }
        Ok(names.len())
    }

    pub fn list_baselines(&self) -> E2eResult<Vec<String>> {
        png_stems(&self.config.baseline_dir)
    }

    pub fn clean_diffs(&self) -> E2eResult<()> {
        for stem in png_stems(&self.config.diff_dir)? {
            std::fs::remove_file(self.config.diff_dir.join(format!("{}.png", stem)))?;
        }
        Ok(())
    }

    fn capture_path(&self, name: &str) -> PathBuf {
        self.config.actual_dir.join(format!("{}.png", name))
    }

    fn baseline_path(&self, name: &str) -> PathBuf {
        self.config.baseline_dir.join(format!("{}.png", name))
    }
}

fn digest(path: &Path) -> E2eResult<String> {
    Ok(hex::encode(Sha256::digest(std::fs::read(path)?)))
}

fn png_stems(dir: &Path) -> E2eResult<Vec<String>> {
    let mut stems: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "png"))
        .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .collect();
    stems.sort();
    Ok(stems)
}

/// Where captures, baselines and diffs live, and the failure threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub baseline_dir: PathBuf,
    pub actual_dir: PathBuf,
    pub diff_dir: PathBuf,
    /// Percent of changed pixels tolerated
    pub threshold: f64,
    /// Write missing baselines instead of reporting them
    pub auto_update: bool,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self::under(Path::new("test-results"))
    }
}

impl VisualConfig {
    /// The standard layout rooted at `root`
    pub fn under(root: &Path) -> Self {
        Self {
            baseline_dir: root.join("baselines"),
            actual_dir: root.join("screenshots"),
            diff_dir: root.join("diffs"),
            threshold: 0.5,
            auto_update: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageOutputFormat;
    use std::io::Cursor;

    fn png(width: u32, height: u32, paint: impl Fn(u32, u32) -> [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_fn(width, height, |x, y| Rgba(paint(x, y)));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn tester(dir: &Path, auto_update: bool) -> VisualTester {
        VisualTester::new(&VisualConfig { auto_update, ..VisualConfig::under(dir) }).unwrap()
    }

    #[test]
    fn test_default_layout() {
        let config = VisualConfig::default();
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.diff_dir, PathBuf::from("test-results/diffs"));
        assert!(!config.auto_update);
    }

    #[test]
    fn test_missing_baseline() {
        let dir = tempfile::tempdir().unwrap();
        let err = tester(dir.path(), false).check("home", &png(4, 4, |_, _| [0, 0, 0, 255]), None).unwrap_err();
        assert!(matches!(err, E2eError::BaselineNotFound(_)));
    }

    #[test]
    fn test_auto_update_creates_baseline_then_matches() {
        let dir = tempfile::tempdir().unwrap();
        let tester = tester(dir.path(), true);
        let image = png(8, 8, |x, _| [x as u8 * 10, 0, 0, 255]);
        let created = tester.check("home", &image, None).unwrap();
        assert!(created.baseline_created);
        assert_eq!(created.total_pixels, 64);

        let diff = tester.check("home", &image, None).unwrap();
        assert!(diff.matches && diff.identical);
        assert!(!diff.baseline_created);
        assert_eq!(tester.list_baselines().unwrap(), vec!["home".to_string()]);
    }

    #[test]
    fn test_detects_regression() {
        let dir = tempfile::tempdir().unwrap();
        let tester = tester(dir.path(), true);
        tester.check("page", &png(10, 10, |_, _| [255, 255, 255, 255]), None).unwrap();
        let diff = tester
            .check("page", &png(10, 10, |x, _| if x < 2 { [0, 0, 0, 255] } else { [255, 255, 255, 255] }), None)
            .unwrap();
        assert!(!diff.matches);
        assert_eq!(diff.diff_pixels, 20);
        assert!((diff.diff_percent - 20.0).abs() < f64::EPSILON);
        assert_eq!(diff.diff_image_path.unwrap(), dir.path().join("diffs").join("page-diff.png"));

        tester.clean_diffs().unwrap();
        assert!(!dir.path().join("diffs").join("page-diff.png").exists());
    }

    #[test]
    fn test_resized_capture_counts_extra_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let tester = tester(dir.path(), true);
        tester.check("wide", &png(4, 4, |_, _| [9, 9, 9, 255]), None).unwrap();
        let diff = tester.check("wide", &png(5, 4, |_, _| [9, 9, 9, 255]), None).unwrap();
        assert_eq!(diff.total_pixels, 20);
        assert_eq!(diff.diff_pixels, 4);
    }

    #[test]
    fn test_small_color_drift_is_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let tester = tester(dir.path(), true);
        tester.check("drift", &png(6, 6, |_, _| [100, 100, 100, 255]), None).unwrap();
        let diff = tester.check("drift", &png(6, 6, |_, _| [103, 98, 100, 255]), None).unwrap();
        assert!(diff.matches);
        assert!(!diff.identical);
        assert_eq!(diff.diff_pixels, 0);
        assert!(diff.diff_image_path.is_none());
    }

    #[test]
    fn test_update_all_promotes_captures() {
        let dir = tempfile::tempdir().unwrap();
        let tester = tester(dir.path(), false);
        tester.record("a", &png(2, 2, |_, _| [1, 2, 3, 255])).unwrap();
        tester.record("b", &png(2, 2, |_, _| [3, 2, 1, 255])).unwrap();
        assert_eq!(tester.update_all_baselines().unwrap(), 2);
        assert!(tester.compare("a", None).unwrap().identical);
    }
}
