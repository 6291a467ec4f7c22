//! The spherical wedge and its parameterisation.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use serde::{Deserialize, Serialize};
use sphereseg_math::{BoundingBox, BoundingSphere, Point3, Vec3};

use crate::error::{Result, SegmentError};
use crate::region::{Region, WedgeBounds};

/// A region of a sphere bounded by radius, azimuth and elevation.
///
/// Azimuth is measured in the XY plane from +Y towards +X, elevation is
/// the angle above the XY plane. A point at `(az, elev)` on the outer
/// surface is `centre + radius * (cos(elev) sin(az), cos(elev) cos(az), sin(elev))`.
///
/// The wedge has up to five bounding surfaces: the outer sphere, two
/// azimuth half-planes (absent when the azimuth span covers a full turn)
/// and two elevation cones (absent at the poles).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereSegment {
    centre: Point3,
    radius: f64,
    az_min: f64,
    az_max: f64,
    elev_min: f64,
    elev_max: f64,
    density: u32,
}

impl Default for SphereSegment {
    fn default() -> Self {
        Self {
            centre: Point3::origin(),
            radius: 1.0,
            az_min: 0.0,
            az_max: FRAC_PI_2,
            elev_min: 0.0,
            elev_max: FRAC_PI_2,
            density: 10,
        }
    }
}

impl SphereSegment {
    /// Create a wedge from explicit angular bounds (radians).
    pub fn new(
        centre: Point3,
        radius: f64,
        az_min: f64,
        az_max: f64,
        elev_min: f64,
        elev_max: f64,
    ) -> Self {
        Self {
            centre,
            radius,
            az_min,
            az_max,
            elev_min,
            elev_max,
            ..Default::default()
        }
    }

    /// Create a wedge centred on `direction`, spanning `az_range` and
    /// `elev_range` radians around it.
    pub fn from_direction(
        centre: Point3,
        radius: f64,
        direction: &Vec3,
        az_range: f64,
        elev_range: f64,
    ) -> Self {
        let mut segment = Self {
            centre,
            radius,
            ..Default::default()
        };
        segment.set_area_from_direction(direction, az_range, elev_range);
        segment
    }

    /// Centre of the sphere.
    pub fn centre(&self) -> Point3 {
        self.centre
    }

    /// Move the wedge.
    pub fn set_centre(&mut self, centre: Point3) {
        self.centre = centre;
    }

    /// Outer radius.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Change the outer radius.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
    }

    /// Angular bounds as `(az_min, az_max, elev_min, elev_max)`.
    pub fn area(&self) -> (f64, f64, f64, f64) {
        (self.az_min, self.az_max, self.elev_min, self.elev_max)
    }

    /// Set the angular bounds (radians).
    pub fn set_area(&mut self, az_min: f64, az_max: f64, elev_min: f64, elev_max: f64) {
        self.az_min = az_min;
        self.az_max = az_max;
        self.elev_min = elev_min;
        self.elev_max = elev_max;
    }

    /// Set the angular bounds from a central direction and full ranges.
    ///
    /// Elevation bounds are clamped to the poles.
    pub fn set_area_from_direction(&mut self, direction: &Vec3, az_range: f64, elev_range: f64) {
        let dir = direction.try_normalize(0.0).unwrap_or_else(Vec3::y);
        let elev = dir.z.clamp(-1.0, 1.0).asin();
        let az = if dir.x == 0.0 && dir.y == 0.0 {
            0.0
        } else {
            dir.x.atan2(dir.y)
        };

        let half_elev = elev_range * 0.5;
        self.elev_min = (elev - half_elev).max(-FRAC_PI_2);
        self.elev_max = (elev + half_elev).min(FRAC_PI_2);

        let half_az = az_range * 0.5;
        self.az_min = az - half_az;
        self.az_max = az + half_az;
    }

    /// Central direction of the wedge with its azimuth and elevation spans.
    pub fn area_direction(&self) -> (Vec3, f64, f64) {
        let az = (self.az_min + self.az_max) * 0.5;
        let elev = (self.elev_min + self.elev_max) * 0.5;
        (
            direction(az, elev),
            self.az_max - self.az_min,
            self.elev_max - self.elev_min,
        )
    }

    /// Number of subdivisions used when generating outline geometry.
    pub fn density(&self) -> u32 {
        self.density
    }

    /// Change the outline subdivision count.
    pub fn set_density(&mut self, density: u32) {
        self.density = density;
    }

    /// Azimuth span in radians.
    pub fn azimuth_span(&self) -> f64 {
        self.az_max - self.az_min
    }

    /// Whether the two azimuth half-planes bound the wedge.
    pub fn has_azimuth_bounds(&self) -> bool {
        self.azimuth_span() < TAU
    }

    /// Whether the azimuth span exceeds a half turn, making the azimuth
    /// region the union of two half-spaces instead of their intersection.
    pub fn is_azimuth_reflex(&self) -> bool {
        self.azimuth_span() > PI
    }

    /// Whether the lower elevation cone bounds the wedge.
    pub fn has_lower_bound(&self) -> bool {
        self.elev_min > -FRAC_PI_2
    }

    /// Whether the upper elevation cone bounds the wedge.
    pub fn has_upper_bound(&self) -> bool {
        self.elev_max < FRAC_PI_2
    }

    /// Validate the wedge parameters.
    pub fn validate(&self) -> Result<()> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(SegmentError::InvalidSegment(format!(
                "radius must be positive, got {}",
                self.radius
            )));
        }
        if !self.centre.coords.iter().all(|c| c.is_finite()) {
            return Err(SegmentError::InvalidSegment("centre must be finite".into()));
        }
        let angles = [self.az_min, self.az_max, self.elev_min, self.elev_max];
        if !angles.iter().all(|a| a.is_finite()) {
            return Err(SegmentError::InvalidSegment("angles must be finite".into()));
        }
        if self.az_max < self.az_min {
            return Err(SegmentError::InvalidSegment(
                "az_max must not be less than az_min".into(),
            ));
        }
        if self.elev_max < self.elev_min {
            return Err(SegmentError::InvalidSegment(
                "elev_max must not be less than elev_min".into(),
            ));
        }
        if self.elev_min < -FRAC_PI_2 || self.elev_max > FRAC_PI_2 {
            return Err(SegmentError::InvalidSegment(
                "elevation must lie within [-pi/2, pi/2]".into(),
            ));
        }
        if self.density == 0 {
            return Err(SegmentError::InvalidSegment(
                "density must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Point on the outer sphere at the given angles.
    pub fn point_at(&self, az: f64, elev: f64) -> Point3 {
        self.centre + direction(az, elev) * self.radius
    }

    /// Whether a point lies inside or on the wedge.
    pub fn contains(&self, p: &Point3) -> bool {
        let bounds = WedgeBounds::new(self);
        Region::classify(&(p - self.centre), &bounds).is_inside(&bounds)
    }

    /// Bounds of the wedge sampled at the outline density.
    ///
    /// The centre is always included since the sides and spokes meet there.
    pub fn bounding_box(&self) -> BoundingBox {
        let mut bbox = BoundingBox::empty();
        bbox.expand(&self.centre);

        let n = self.density.max(1);
        let az_step = self.azimuth_span() / n as f64;
        let elev_step = (self.elev_max - self.elev_min) / n as f64;
        for i in 0..=n {
            let az = self.az_min + i as f64 * az_step;
            for j in 0..=n {
                let elev = self.elev_min + j as f64 * elev_step;
                bbox.expand(&self.point_at(az, elev));
            }
        }
        bbox
    }

    /// Sphere enclosing the whole wedge.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        BoundingSphere::new(self.centre, self.radius)
    }
}

/// Unit vector for an azimuth/elevation pair.
pub(crate) fn direction(az: f64, elev: f64) -> Vec3 {
    let (sin_az, cos_az) = az.sin_cos();
    let (sin_el, cos_el) = elev.sin_cos();
    Vec3::new(cos_el * sin_az, cos_el * cos_az, sin_el)
}
