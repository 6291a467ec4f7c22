//! Clipping many placed meshes against one wedge.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sphereseg_math::Transform;
use sphereseg_mesh::TriangleMesh;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::intersect::IntersectSettings;
use crate::line::Polyline3;
use crate::segment::SphereSegment;

/// A mesh placed in the world.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneInstance {
    /// Label reported back with the curves.
    pub name: String,
    /// Model-to-world transform.
    pub transform: Transform,
    /// Geometry in model coordinates.
    pub mesh: TriangleMesh,
}

/// A flat list of placed meshes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Instances in insertion order.
    pub instances: Vec<SceneInstance>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh under `name`.
    pub fn add(&mut self, name: impl Into<String>, transform: Transform, mesh: TriangleMesh) {
        self.instances.push(SceneInstance {
            name: name.into(),
            transform,
            mesh,
        });
    }

    /// Number of instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Curves found on one scene instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneHit {
    /// Name of the instance.
    pub name: String,
    /// Intersection curves in world coordinates.
    pub lines: Vec<Polyline3>,
}

impl SphereSegment {
    /// Intersect every instance of `scene` with the wedge.
    ///
    /// Instances whose world bounds miss the wedge's bounding sphere are
    /// skipped without clipping. Hits keep the scene order; instances
    /// without curves are left out.
    #[instrument(skip_all, fields(instances = scene.len()))]
    pub fn intersect_scene(
        &self,
        scene: &Scene,
        settings: &IntersectSettings,
    ) -> Result<Vec<SceneHit>> {
        self.validate()?;
        settings.validate()?;

        let sphere = self.bounding_sphere();
        let candidates: Vec<&SceneInstance> = scene
            .instances
            .iter()
            .filter(|inst| {
                inst.mesh
                    .bounds()
                    .is_some_and(|b| sphere.intersects_box(&b.transformed(&inst.transform)))
            })
            .collect();
        debug!(
            culled = scene.len() - candidates.len(),
            candidates = candidates.len(),
            "culled scene"
        );

        let hits = candidates
            .par_iter()
            .map(|inst| {
                let lines = self.compute_intersection(&inst.mesh, &inst.transform, settings)?;
                Ok((!lines.is_empty()).then(|| SceneHit {
                    name: inst.name.clone(),
                    lines,
                }))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(hits.into_iter().flatten().collect())
    }
}
