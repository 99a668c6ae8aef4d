//! Track surfaces the vehicles drive on.
//!
//! Everything the simulation asks of a track goes through [`TrackSurface`], so tests can use
//! synthetic grids and the trainer can feed decoded images.

use glam::{DVec2, I64Vec2};

use crate::math::truncate_to_cell;

pub mod raster;

pub use raster::RasterTrack;

pub trait TrackSurface: Send + Sync {
    fn in_bounds(&self, cell: I64Vec2) -> bool;

    /// Must report `false` for any cell outside the bounds.
    fn is_road(&self, cell: I64Vec2) -> bool;

    #[inline]
    fn is_road_at(&self, point: DVec2) -> bool {
        self.is_road(truncate_to_cell(point))
    }
}

/// An endless road with no walls.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenTrack;

impl TrackSurface for OpenTrack {
    #[inline]
    fn in_bounds(&self, _cell: I64Vec2) -> bool {
        true
    }

    #[inline]
    fn is_road(&self, _cell: I64Vec2) -> bool {
        true
    }
}

/// The single color that marks road pixels. Matching is exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct RoadColor(pub [u8; 3]);

impl Default for RoadColor {
    fn default() -> Self {
        Self([130, 130, 130])
    }
}

impl RoadColor {
    #[inline]
    pub fn matches(&self, pixel: &image::Rgb<u8>) -> bool {
        pixel.0 == self.0
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("Pixel Size Mismatch: Got {0} pixels but have shape ({width}, {height})", width = .1[0], height = .1[1])]
    PixelSizeMismatch(usize, [usize; 2]),
    #[error("IOError: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ImageError: {0}")]
    ImageError(#[from] image::ImageError),
}
