//! Aspect-ratio-preserving fit of media into a fraction of the viewport.

use crate::error::{Error, Result};

/// Share of each viewport axis the lightbox may occupy.
pub const DEFAULT_FILL_FRACTION: f64 = 0.95;

/// Visible area the lightbox is laid out in, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Display size for one media item. Not stored; recomputed on every open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    pub display_width: f64,
    pub display_height: f64,
}

/// Computes display sizes against a configurable fill fraction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportFitter {
    fill: f64,
}

impl Default for ViewportFitter {
    fn default() -> Self {
        Self {
            fill: DEFAULT_FILL_FRACTION,
        }
    }
}

impl ViewportFitter {
    pub fn new(fill: f64) -> Self {
        Self { fill }
    }

    /// Scale `natural_width x natural_height` to fit `fill` of the viewport on both axes.
    ///
    /// Landscape media is sized by width first, portrait and square media by
    /// height first; the other axis is only consulted when the first choice
    /// overflows it. Media already smaller than the bound keeps its natural size
    /// on the leading axis.
    pub fn fit(&self, natural_width: f64, natural_height: f64, viewport: Viewport) -> Result<FitResult> {
        if !(natural_width.is_finite() && natural_height.is_finite())
            || natural_width <= 0.0
            || natural_height <= 0.0
        {
            return Err(Error::DegenerateMedia {
                width: natural_width,
                height: natural_height,
            });
        }
        if !(viewport.width.is_finite() && viewport.height.is_finite())
            || viewport.width <= 0.0
            || viewport.height <= 0.0
        {
            return Err(Error::DegenerateViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let max_width = self.fill * viewport.width;
        let max_height = self.fill * viewport.height;
        let ratio = natural_width / natural_height;

        let mut width;
        let mut height;
        if ratio > 1.0 {
            width = natural_width.min(max_width);
            height = width / ratio;
            if height > max_height {
                height = max_height;
                width = height * ratio;
            }
        } else {
            height = natural_height.min(max_height);
            width = height * ratio;
            if width > max_width {
                width = max_width;
                height = width / ratio;
            }
        }

        Ok(FitResult {
            display_width: width,
            display_height: height,
        })
    }
}

/// Fit with the default 95% fill fraction.
pub fn fit(natural_width: f64, natural_height: f64, viewport: Viewport) -> Result<FitResult> {
    ViewportFitter::default().fit(natural_width, natural_height, viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-6;

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-3, "{} != {}", actual, expected);
    }

    #[test]
    fn test_landscape_limited_by_width() {
        let result = fit(1600.0, 900.0, Viewport::new(1000.0, 1000.0)).unwrap();
        assert_close(result.display_width, 950.0);
        assert_close(result.display_height, 534.375);
    }

    #[test]
    fn test_portrait_limited_by_height() {
        let result = fit(900.0, 1600.0, Viewport::new(1000.0, 1000.0)).unwrap();
        assert_close(result.display_width, 534.375);
        assert_close(result.display_height, 950.0);
    }

    #[test]
    fn test_landscape_overflowing_height_is_rescaled() {
        // Wide viewport, short height: width-first choice overflows vertically.
        let result = fit(2000.0, 1500.0, Viewport::new(2000.0, 500.0)).unwrap();
        assert_close(result.display_height, 475.0);
        assert_close(result.display_width, 475.0 * 2000.0 / 1500.0);
    }

    #[test]
    fn test_portrait_overflowing_width_is_rescaled() {
        let result = fit(900.0, 1000.0, Viewport::new(400.0, 2000.0)).unwrap();
        assert_close(result.display_width, 380.0);
        assert_close(result.display_height, 380.0 * 1000.0 / 900.0);
    }

    #[test]
    fn test_square_takes_portrait_branch() {
        let result = fit(2000.0, 2000.0, Viewport::new(1000.0, 800.0)).unwrap();
        assert_close(result.display_height, 760.0);
        assert_close(result.display_width, 760.0);
    }

    #[test]
    fn test_small_media_keeps_natural_size() {
        let result = fit(320.0, 240.0, Viewport::new(1920.0, 1080.0)).unwrap();
        assert_close(result.display_width, 320.0);
        assert_close(result.display_height, 240.0);
    }

    #[test]
    fn test_result_preserves_ratio_and_bounds() {
        let viewport = Viewport::new(1280.0, 720.0);
        for (w, h) in [(4000.0, 3000.0), (3000.0, 4000.0), (100.0, 5000.0), (5000.0, 100.0), (1.0, 1.0)] {
            let result = fit(w, h, viewport).unwrap();
            assert!(result.display_width > 0.0 && result.display_height > 0.0);
            assert!(result.display_width <= 0.95 * viewport.width + EPS);
            assert!(result.display_height <= 0.95 * viewport.height + EPS);
            let ratio = result.display_width / result.display_height;
            assert!((ratio - w / h).abs() / (w / h) < 1e-9, "ratio drift for {}x{}", w, h);
        }
    }

    #[test]
    fn test_fit_is_idempotent() {
        let viewport = Viewport::new(1000.0, 1000.0);
        for (w, h) in [(1600.0, 900.0), (900.0, 1600.0), (3000.0, 3000.0), (200.0, 100.0)] {
            let once = fit(w, h, viewport).unwrap();
            let twice = fit(once.display_width, once.display_height, viewport).unwrap();
            assert_close(twice.display_width, once.display_width);
            assert_close(twice.display_height, once.display_height);
        }
    }

    #[test]
    fn test_degenerate_media_rejected() {
        let viewport = Viewport::new(1000.0, 1000.0);
        assert!(matches!(fit(1600.0, 0.0, viewport), Err(Error::DegenerateMedia { .. })));
        assert!(matches!(fit(0.0, 900.0, viewport), Err(Error::DegenerateMedia { .. })));
        assert!(matches!(fit(-5.0, 900.0, viewport), Err(Error::DegenerateMedia { .. })));
        assert!(matches!(fit(f64::NAN, 900.0, viewport), Err(Error::DegenerateMedia { .. })));
    }

    #[test]
    fn test_degenerate_viewport_rejected() {
        assert!(matches!(
            fit(1600.0, 900.0, Viewport::new(0.0, 1000.0)),
            Err(Error::DegenerateViewport { .. })
        ));
    }

    #[test]
    fn test_custom_fill_fraction() {
        let fitter = ViewportFitter::new(0.5);
        let result = fitter.fit(1600.0, 900.0, Viewport::new(1000.0, 1000.0)).unwrap();
        assert_close(result.display_width, 500.0);
    }
}
