use crate::geo::bounding_region;
use crate::models::coordinate::{Coordinate, ViewportRegion};

const EMPTY_SET_DELTA: f64 = 60.0;

#[derive(Debug, Clone, Copy)]
pub struct ViewportFitter {
    padding_factor: f64,
    min_delta: f64,
}

impl ViewportFitter {
    pub fn new(padding_factor: f64, min_delta: f64) -> Self {
        Self {
            padding_factor,
            min_delta,
        }
    }

    /// Fits a region around all points. With no points, returns a widely
    /// zoomed region centered on the fallback (e.g. the last driver fix).
    pub fn fit(&self, points: &[Coordinate], fallback: Option<Coordinate>) -> ViewportRegion {
        match bounding_region(points, self.padding_factor, self.min_delta) {
            Some(region) => region,
            None => ViewportRegion {
                center: fallback.unwrap_or(Coordinate::new(0.0, 0.0)),
                latitude_delta: EMPTY_SET_DELTA,
                longitude_delta: EMPTY_SET_DELTA,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ViewportFitter;
    use crate::models::coordinate::Coordinate;

    #[test]
    fn all_points_are_visible() {
        let fitter = ViewportFitter::new(1.5, 0.01);
        let points = [
            Coordinate::new(25.1, 55.2),
            Coordinate::new(25.2, 55.3),
            Coordinate::new(25.25, 55.35),
        ];

        let region = fitter.fit(&points, None);
        for point in &points {
            assert!(region.contains(point));
        }
    }

    #[test]
    fn single_point_zooms_to_min_delta() {
        let fitter = ViewportFitter::new(1.5, 0.01);
        let driver = Coordinate::new(25.1, 55.2);

        let region = fitter.fit(&[driver], None);
        assert_eq!(region.center, driver);
        assert_eq!(region.latitude_delta, 0.01);
        assert_eq!(region.longitude_delta, 0.01);
    }

    #[test]
    fn empty_set_centers_on_fallback() {
        let fitter = ViewportFitter::new(1.5, 0.01);
        let last_fix = Coordinate::new(25.1, 55.2);

        let region = fitter.fit(&[], Some(last_fix));
        assert_eq!(region.center, last_fix);
        assert!(region.latitude_delta > 1.0);
    }
}
