use glam::DVec2;

/// Wraps an angle in degrees into `[0, 360)`.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.);

    // `rem_euclid` can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360. { 0. } else { wrapped }
}

/// Unit vector pointing along `degrees`, measured from +X towards +Y (raster rows grow downward).
#[inline]
pub fn heading_direction(degrees: f64) -> DVec2 {
    DVec2::from_angle(degrees.to_radians())
}

/// Truncates toward zero, so `-0.5` lands on cell `0` just like a plain integer cast.
#[inline]
pub fn truncate_to_cell(point: DVec2) -> glam::I64Vec2 {
    point.as_i64vec2()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox2D {
    pub center: DVec2,
    pub half_extent: DVec2,
    pub heading_deg: f64,
}

impl OrientedBox2D {
    #[inline]
    pub fn size(&self) -> DVec2 {
        self.half_extent * 2.
    }

    /// Corners in the order `(-w,-h)`, `(w,-h)`, `(w,h)`, `(-w,h)`, rotated by the heading
    /// and translated to the center.
    pub fn corners(&self) -> [DVec2; 4] {
        let DVec2 { x: w, y: h } = self.half_extent;
        let rotation = heading_direction(self.heading_deg);

        [
            glam::dvec2(-w, -h),
            glam::dvec2(w, -h),
            glam::dvec2(w, h),
            glam::dvec2(-w, h),
        ]
        .map(|corner| rotation.rotate(corner) + self.center)
    }
}

#[cfg(test)]
mod test {
    use crate::math::{OrientedBox2D, heading_direction, normalize_degrees, truncate_to_cell};

    const EPS: f64 = 1e-9;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.), 0.);
        assert_eq!(normalize_degrees(360.), 0.);
        assert_eq!(normalize_degrees(-3.), 357.);
        assert_eq!(normalize_degrees(723.), 3.);
        assert!((0.0..360.).contains(&normalize_degrees(-1e-18)));
    }

    #[test]
    fn test_heading_direction() {
        let east = heading_direction(0.);
        assert!((east - glam::DVec2::X).length() < EPS);

        let south = heading_direction(90.);
        assert!((south - glam::DVec2::Y).length() < EPS);
    }

    #[test]
    fn test_truncate_toward_zero() {
        assert_eq!(truncate_to_cell(glam::dvec2(3.9, 0.2)), glam::i64vec2(3, 0));
        assert_eq!(truncate_to_cell(glam::dvec2(-0.5, -1.5)), glam::i64vec2(0, -1));
    }

    #[test]
    fn test_corners() {
        let axis_aligned = OrientedBox2D {
            center: glam::dvec2(10., 20.),
            half_extent: glam::dvec2(4., 2.),
            heading_deg: 0.,
        };

        assert_eq!(
            axis_aligned.corners(),
            [
                glam::dvec2(6., 18.),
                glam::dvec2(14., 18.),
                glam::dvec2(14., 22.),
                glam::dvec2(6., 22.),
            ]
        );

        let quarter_turn = OrientedBox2D {
            heading_deg: 90.,
            ..axis_aligned
        };
        let expected = [
            glam::dvec2(12., 16.),
            glam::dvec2(12., 24.),
            glam::dvec2(8., 24.),
            glam::dvec2(8., 16.),
        ];

        for (corner, expected) in quarter_turn.corners().into_iter().zip(expected) {
            assert!((corner - expected).length() < EPS, "{corner} != {expected}");
        }
    }
}
