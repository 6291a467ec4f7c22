//! Job files and command-line overrides.
//!
//! A job is a TOML document with an optional `[wedge]` table (angles in
//! degrees), an optional `[settings]` table matching
//! [`IntersectSettings`] and an optional row-major `transform` matrix:
//!
//! ```toml
//! transform = [[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]]
//!
//! [wedge]
//! centre = [0.0, 0.0, 0.0]
//! radius = 100.0
//! azimuth = [-30.0, 40.0]
//! elevation = [-20.0, 20.0]
//!
//! [settings]
//! fuse_tolerance = 1e-6
//! ```
//!
//! Values given on the command line win over the file.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Deserialize;
use sphereseg::{IntersectSettings, SphereSegment, SurfaceMask};
use sphereseg_math::{Point3, Transform, Vec3};

/// Wedge parameters, as read from a job file or flags.
#[derive(Args, Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WedgeArgs {
    /// Wedge centre as X,Y,Z
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub centre: Option<Vec<f64>>,
    /// Outer radius
    #[arg(long)]
    pub radius: Option<f64>,
    /// Azimuth bounds in degrees as MIN,MAX (measured from +Y towards +X)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub azimuth: Option<Vec<f64>>,
    /// Elevation bounds in degrees as MIN,MAX
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub elevation: Option<Vec<f64>>,
    /// Central direction as X,Y,Z; used with --az-range and --elev-range
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub direction: Option<Vec<f64>>,
    /// Full azimuth span in degrees around --direction
    #[arg(long)]
    pub az_range: Option<f64>,
    /// Full elevation span in degrees around --direction
    #[arg(long)]
    pub elev_range: Option<f64>,
    /// Outline subdivisions
    #[arg(long)]
    pub density: Option<u32>,
}

impl WedgeArgs {
    /// Fill every unset field from `base`.
    ///
    /// A wedge is placed either by explicit bounds or by a direction with
    /// spans. When `self` picks one of the two, the other one's fields in
    /// `base` are dropped.
    pub fn or(self, mut base: WedgeArgs) -> WedgeArgs {
        if self.direction.is_some() || self.az_range.is_some() || self.elev_range.is_some() {
            base.azimuth = None;
            base.elevation = None;
        }
        if self.azimuth.is_some() || self.elevation.is_some() {
            base.direction = None;
            base.az_range = None;
            base.elev_range = None;
        }
        WedgeArgs {
            centre: self.centre.or(base.centre),
            radius: self.radius.or(base.radius),
            azimuth: self.azimuth.or(base.azimuth),
            elevation: self.elevation.or(base.elevation),
            direction: self.direction.or(base.direction),
            az_range: self.az_range.or(base.az_range),
            elev_range: self.elev_range.or(base.elev_range),
            density: self.density.or(base.density),
        }
    }

    /// Build the wedge. Unset values fall back to [`SphereSegment::default`].
    pub fn build(&self) -> Result<SphereSegment> {
        let mut wedge = SphereSegment::default();
        if let Some(c) = &self.centre {
            wedge.set_centre(Point3::from(vec3(c, "centre")?));
        }
        if let Some(r) = self.radius {
            wedge.set_radius(r);
        }
        if let Some(d) = self.density {
            wedge.set_density(d);
        }

        if let Some(dir) = &self.direction {
            if self.azimuth.is_some() || self.elevation.is_some() {
                bail!("--direction cannot be combined with --azimuth or --elevation");
            }
            let (_, az_span, elev_span) = wedge.area_direction();
            wedge.set_area_from_direction(
                &vec3(dir, "direction")?,
                self.az_range.map_or(az_span, f64::to_radians),
                self.elev_range.map_or(elev_span, f64::to_radians),
            );
        } else {
            let (az_min, az_max, elev_min, elev_max) = wedge.area();
            let (az_min, az_max) = match &self.azimuth {
                Some(a) => pair(a, "azimuth")?,
                None => (az_min, az_max),
            };
            let (elev_min, elev_max) = match &self.elevation {
                Some(e) => pair(e, "elevation")?,
                None => (elev_min, elev_max),
            };
            wedge.set_area(az_min, az_max, elev_min, elev_max);
        }

        wedge.validate().context("invalid wedge")?;
        Ok(wedge)
    }
}

/// Clipping options exposed on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Distance under which fragment ends are fused into one point
    #[arg(long)]
    pub fuse_tolerance: Option<f64>,
    /// Keep open fragments apart instead of chaining them
    #[arg(long)]
    pub no_join: bool,
    /// Do not close nearly closed curves into loops
    #[arg(long)]
    pub no_close: bool,
    /// Largest gap closed into a loop (default: unlimited)
    #[arg(long)]
    pub close_tolerance: Option<f64>,
    /// Surfaces to trace, comma separated
    /// (radius, azimuth-min, azimuth-max, elevation-min, elevation-max)
    #[arg(long, value_delimiter = ',')]
    pub surfaces: Option<Vec<String>>,
}

impl SettingsArgs {
    /// Apply the flags on top of `base`.
    pub fn apply(&self, mut base: IntersectSettings) -> Result<IntersectSettings> {
        if let Some(t) = self.fuse_tolerance {
            base.fuse_tolerance = t;
        }
        if self.no_join {
            base.join_fragments = false;
        }
        if self.no_close {
            base.close_loops = false;
        }
        if self.close_tolerance.is_some() {
            base.close_tolerance = self.close_tolerance;
        }
        if let Some(names) = &self.surfaces {
            base.surfaces = parse_mask(names)?;
        }
        base.validate().context("invalid settings")?;
        Ok(base)
    }
}

/// Contents of a TOML job file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobFile {
    pub wedge: WedgeArgs,
    pub settings: IntersectSettings,
    /// Row-major model-to-world matrix for the input mesh.
    pub transform: Option<[[f64; 4]; 4]>,
}

impl JobFile {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse job file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load `path` if given, otherwise an empty job.
    pub fn load_optional(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn transform(&self) -> Result<Transform> {
        let t = self.transform.map_or_else(Transform::identity, Transform::from_rows);
        if !t.is_finite() {
            bail!("transform must contain only finite values");
        }
        Ok(t)
    }
}

fn parse_mask(names: &[String]) -> Result<SurfaceMask> {
    let mut mask = SurfaceMask::NONE;
    for name in names {
        match name.trim() {
            "radius" => mask.radius = true,
            "azimuth-min" => mask.azimuth_min = true,
            "azimuth-max" => mask.azimuth_max = true,
            "elevation-min" => mask.elevation_min = true,
            "elevation-max" => mask.elevation_max = true,
            "azimuth" => {
                mask.azimuth_min = true;
                mask.azimuth_max = true;
            }
            "elevation" => {
                mask.elevation_min = true;
                mask.elevation_max = true;
            }
            other => bail!("unknown surface {other:?}"),
        }
    }
    Ok(mask)
}

fn vec3(v: &[f64], what: &str) -> Result<Vec3> {
    match v {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => bail!("{what} needs three values, got {}", v.len()),
    }
}

fn pair(v: &[f64], what: &str) -> Result<(f64, f64)> {
    match v {
        [a, b] => Ok((a.to_radians(), b.to_radians())),
        _ => bail!("{what} needs two values, got {}", v.len()),
    }
}
