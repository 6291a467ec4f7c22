#![warn(missing_docs)]

//! Spherical wedge clipping for triangle meshes.
//!
//! A [`SphereSegment`] is the part of a sphere between two azimuth angles
//! and two elevation angles. This crate intersects triangle meshes with
//! the boundary of such a wedge and returns the resulting curves as
//! polylines, and generates geometry describing the wedge itself.
//!
//! Clipping runs in stages: vertices are classified against the five
//! bounding surfaces, triangles that cannot cross a surface are dropped,
//! the rest are turned into an edge graph, per-surface curves are traced
//! through the graph and trimmed to the wedge, and finally the fragments
//! are joined end to end.
//!
//! # Example
//!
//! ```ignore
//! use sphereseg::{IntersectSettings, SphereSegment};
//! use sphereseg_math::{Point3, Transform, Vec3};
//!
//! let wedge = SphereSegment::from_direction(Point3::origin(), 100.0, &Vec3::y(), 0.8, 0.4);
//! let mesh = sphereseg_mesh::obj::read_obj(reader)?;
//! let lines = wedge.compute_intersection(&mesh, &Transform::identity(), &IntersectSettings::default())?;
//!
//! println!("Curves: {}", lines.len());
//! ```

pub mod error;
pub mod fuse;
pub mod graph;
pub mod intersect;
pub mod line;
pub mod outline;
pub mod region;
pub mod scene;
pub mod segment;
pub mod surface;
pub mod trim;
pub mod walk;

pub use error::{Result, SegmentError};
pub use intersect::{IntersectSettings, SurfaceCurves, SurfaceMask};
pub use line::Polyline3;
pub use outline::{BoundaryAngle, Outline, Parts, SideOrientation};
pub use scene::{Scene, SceneHit, SceneInstance};
pub use segment::SphereSegment;
pub use surface::{
    AzimuthSideSurface, AzimuthSurface, CutSurface, ElevationSurface, IntersectionType,
    RadiusSurface, SurfaceKind,
};
