//! Portrait reframing: crop geometry and the face-tracking seam.

use cliprank_models::CropStrategy;

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Per-frame crop planning seam.
///
/// A real tracker would return one rectangle per frame following the
/// active face; the default implementation returns a constant center
/// crop, which the renderer collapses into a static filter chain.
pub trait FaceTracker: Send + Sync {
    /// Plan crop rectangles for a clip of `frame_count` frames over a
    /// `source_width` x `source_height` image.
    fn plan(&self, source_width: u32, source_height: u32, frame_count: usize) -> Vec<CropRect>;
}

/// Default tracker: every frame gets the centered 9:16 crop.
#[derive(Debug, Default)]
pub struct CenterTrack;

impl FaceTracker for CenterTrack {
    fn plan(&self, source_width: u32, source_height: u32, frame_count: usize) -> Vec<CropRect> {
        let rect = center_crop_rect(source_width, source_height);
        vec![rect; frame_count]
    }
}

/// Resolve the tracker that backs a crop strategy.
///
/// Both strategies currently resolve to the center tracker; this is the
/// seam where a real per-frame tracker replaces the stub arm.
pub fn tracker_for(strategy: CropStrategy) -> Box<dyn FaceTracker> {
    match strategy {
        CropStrategy::Center => Box::new(CenterTrack),
        CropStrategy::FaceTrackStub => Box::new(CenterTrack),
    }
}

/// The centered 9:16 crop rectangle for a source frame.
pub fn center_crop_rect(source_width: u32, source_height: u32) -> CropRect {
    if source_width == 0 || source_height == 0 {
        return CropRect {
            x: 0,
            y: 0,
            width: source_width,
            height: source_height,
        };
    }

    let target_ratio = 9.0 / 16.0;
    let source_ratio = source_width as f64 / source_height as f64;

    if source_ratio > target_ratio {
        // Wider than portrait: crop width.
        let width = (source_height as f64 * target_ratio).round() as u32;
        let width = width.min(source_width);
        CropRect {
            x: (source_width - width) / 2,
            y: 0,
            width,
            height: source_height,
        }
    } else {
        // Taller or equal: crop height.
        let height = (source_width as f64 / target_ratio).round() as u32;
        let height = height.min(source_height);
        CropRect {
            x: 0,
            y: (source_height - height) / 2,
            width: source_width,
            height,
        }
    }
}

/// Build the geometry part of the video filter chain from a tracker's
/// planned rectangles.
///
/// The center tracker emits one rectangle repeated per frame, which
/// collapses into a single fixed crop. Until a dynamic tracker lands,
/// a varying plan is pinned to its first rectangle. An empty plan skips
/// the crop and just fits the frame into the portrait canvas.
pub fn build_crop_filter(rects: &[CropRect], target_width: u32, target_height: u32) -> String {
    let fit = format!(
        "scale={tw}:{th}:force_original_aspect_ratio=decrease,\
         pad={tw}:{th}:(ow-iw)/2:(oh-ih)/2",
        tw = target_width,
        th = target_height
    );

    match rects.first() {
        Some(r) if r.width > 0 && r.height > 0 => {
            format!("crop={}:{}:{}:{},{}", r.width, r.height, r.x, r.y, fit)
        }
        _ => fit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center_crop_landscape() {
        let rect = center_crop_rect(1920, 1080);
        // 9:16 of 1080 height is ~608 wide, centered.
        assert_eq!(rect.height, 1080);
        assert!((rect.width as f64 - 1080.0 * 9.0 / 16.0).abs() < 1.0);
        assert_eq!(rect.x, (1920 - rect.width) / 2);
        assert_eq!(rect.y, 0);
    }

    #[test]
    fn test_center_crop_already_portrait() {
        let rect = center_crop_rect(1080, 1920);
        assert_eq!(rect.width, 1080);
        assert_eq!(rect.height, 1920);
        assert_eq!(rect.x, 0);
    }

    #[test]
    fn test_center_track_fills_frames() {
        let tracker = CenterTrack;
        let rects = tracker.plan(1920, 1080, 10);
        assert_eq!(rects.len(), 10);
        assert!(rects.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_both_strategies_resolve_to_a_tracker() {
        for strategy in [CropStrategy::Center, CropStrategy::FaceTrackStub] {
            let rects = tracker_for(strategy).plan(1920, 1080, 5);
            assert_eq!(rects.len(), 5);
            assert_eq!(rects[0], center_crop_rect(1920, 1080));
        }
    }

    #[test]
    fn test_filter_from_static_plan() {
        let rects = CenterTrack.plan(1920, 1080, 3);
        let f = build_crop_filter(&rects, 1080, 1920);
        assert!(f.starts_with(&format!(
            "crop={}:{}:{}:{}",
            rects[0].width, rects[0].height, rects[0].x, rects[0].y
        )));
        assert!(f.contains("1080:1920"));
        assert!(f.contains("pad="));
    }

    #[test]
    fn test_filter_from_empty_plan_skips_crop() {
        let f = build_crop_filter(&[], 1080, 1920);
        assert!(!f.contains("crop="));
        assert!(f.contains("scale=1080:1920"));
    }
}
