use std::path::Path;

use glam::{I64Vec2, USizeVec2};
use rayon::prelude::*;

use crate::track::{RoadColor, TrackError, TrackSurface};

/// Row-major road mask with finite extent. Everything outside it is a wall.
#[derive(Debug, Clone)]
pub struct RasterTrack {
    size: USizeVec2,
    cells: Vec<bool>,
}

impl RasterTrack {
    pub fn from_mask(size: USizeVec2, cells: Vec<bool>) -> Result<RasterTrack, TrackError> {
        let expected_count = size.x * size.y;

        if expected_count == cells.len() {
            Ok(Self { size, cells })
        } else {
            Err(TrackError::PixelSizeMismatch(cells.len(), size.into()))
        }
    }

    pub fn from_fn(size: USizeVec2, is_road: impl Fn(USizeVec2) -> bool + Sync) -> RasterTrack {
        let width = size.x;
        let cells = (0..size.x * size.y)
            .into_par_iter()
            .map(|i| is_road(glam::usizevec2(i % width, i / width)))
            .collect();

        Self { size, cells }
    }

    pub fn from_rgb(image: &image::RgbImage, road: RoadColor) -> RasterTrack {
        let size = glam::usizevec2(image.width() as usize, image.height() as usize);
        let cells = image
            .as_raw()
            .par_chunks_exact(3)
            .map(|rgb| road.matches(&image::Rgb([rgb[0], rgb[1], rgb[2]])))
            .collect();

        Self { size, cells }
    }

    pub fn open(path: impl AsRef<Path>, road: RoadColor) -> Result<RasterTrack, TrackError> {
        let start = std::time::Instant::now();
        let image = image::ImageReader::open(path.as_ref())?
            .decode()?
            .to_rgb8();

        log::trace!(
            "Took {} ms to decode {:?}",
            start.elapsed().as_millis(),
            path.as_ref()
        );

        Ok(Self::from_rgb(&image, road))
    }

    #[inline]
    pub fn size(&self) -> USizeVec2 {
        self.size
    }

    pub fn road_fraction(&self) -> f64 {
        if self.cells.is_empty() {
            return 0.;
        }

        let road = self.cells.par_iter().filter(|&&c| c).count();
        road as f64 / self.cells.len() as f64
    }
}

impl TrackSurface for RasterTrack {
    #[inline]
    fn in_bounds(&self, cell: I64Vec2) -> bool {
        cell.cmpge(I64Vec2::ZERO).all() && cell.as_usizevec2().cmplt(self.size).all()
    }

    #[inline]
    fn is_road(&self, cell: I64Vec2) -> bool {
        if !self.in_bounds(cell) {
            log::trace!("Out of bounds: {cell}");
            return false;
        }

        let cell = cell.as_usizevec2();
        self.cells[cell.x + cell.y * self.size.x]
    }
}
