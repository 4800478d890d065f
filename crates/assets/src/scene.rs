use crate::AssetError;
use crate::map::{MapDocument, PlayerStart, load_map_file, parse_map};
use glam::{DVec3, Mat4};
use std::path::Path;
use vantage_common::precision::relative_to;
use vantage_render::{MeshHandle, RenderBackend, RenderError};

/// One uploaded static mesh placed in the world.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticMeshInstance {
    pub mesh: MeshHandle,
    pub index_count: u32,
    /// Absolute world position.
    pub position: DVec3,
    pub kind: &'static str,
}

impl StaticMeshInstance {
    /// Model matrix in render space for the given floating origin.
    pub fn model_matrix(&self, world_origin: DVec3) -> Mat4 {
        Mat4::from_translation(relative_to(self.position, world_origin))
    }
}

/// Outcome of a map load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapLoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

/// The static geometry currently resident on a backend.
///
/// Instances keep absolute positions, so a floating-origin shift only changes
/// the origin passed to [`StaticScene::draw`].
#[derive(Debug, Default)]
pub struct StaticScene {
    instances: Vec<StaticMeshInstance>,
    player_start: Option<PlayerStart>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_map_str<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        json: &str,
    ) -> Result<MapLoadReport, AssetError> {
        let doc = parse_map(json)?;
        self.load_document(backend, &doc)
    }

    pub fn load_map_file<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        path: impl AsRef<Path>,
    ) -> Result<MapLoadReport, AssetError> {
        let path = path.as_ref();
        let doc = load_map_file(path)?;
        let report = self.load_document(backend, &doc)?;
        tracing::info!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            "map loaded"
        );
        Ok(report)
    }

    /// Replace the current scene with `doc`. The previous meshes are released
    /// first; an entity whose upload fails is skipped like a bad entity.
    /// Backend state errors abort the load.
    pub fn load_document<B: RenderBackend>(
        &mut self,
        backend: &mut B,
        doc: &MapDocument,
    ) -> Result<MapLoadReport, AssetError> {
        self.unload(backend);

        let mut report = MapLoadReport {
            loaded: 0,
            skipped: doc.skipped,
        };
        for entity in &doc.static_geometry {
            let data = entity.geometry.build();
            let mesh = match backend.create_mesh(&data) {
                Ok(mesh) => mesh,
                Err(e @ RenderError::InvalidState { .. }) => {
                    self.unload(backend);
                    return Err(e.into());
                }
                Err(e) => {
                    tracing::warn!(kind = entity.geometry.kind(), "mesh upload failed: {e}; skipped");
                    report.skipped += 1;
                    continue;
                }
            };
            self.instances.push(StaticMeshInstance {
                mesh,
                index_count: data.index_count(),
                position: entity.position(),
                kind: entity.geometry.kind(),
            });
            report.loaded += 1;
        }
        self.player_start = doc.player_start;

        tracing::debug!(loaded = report.loaded, skipped = report.skipped, "static scene built");
        Ok(report)
    }

    /// Release every mesh this scene uploaded.
    pub fn unload<B: RenderBackend>(&mut self, backend: &mut B) {
        for instance in self.instances.drain(..) {
            backend.destroy_mesh(instance.mesh);
        }
        self.player_start = None;
    }

    /// Issue one draw per instance. Must be called inside a frame.
    pub fn draw<B: RenderBackend>(
        &self,
        backend: &mut B,
        world_origin: DVec3,
    ) -> Result<(), RenderError> {
        for instance in &self.instances {
            backend.draw_mesh(instance.mesh, instance.model_matrix(world_origin))?;
        }
        Ok(())
    }

    pub fn instances(&self) -> &[StaticMeshInstance] {
        &self.instances
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn player_start(&self) -> Option<&PlayerStart> {
        self.player_start.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use vantage_render::HeadlessBackend;

    const CUBE_MAP: &str = r#"{ "entities": [
        { "classname": "static_geometry", "origin": [0, 0, 0],
          "geometry": { "type": "cube", "size": [2, 2, 2] } }
    ] }"#;

    fn backend() -> HeadlessBackend {
        let mut backend = HeadlessBackend::new();
        backend.init((), 640, 480).unwrap();
        backend
    }

    #[test]
    fn single_cube_map() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        let report = scene.load_map_str(&mut backend, CUBE_MAP).unwrap();

        assert_eq!(report, MapLoadReport { loaded: 1, skipped: 0 });
        assert_eq!(scene.len(), 1);
        let cube = &scene.instances()[0];
        assert_eq!(cube.index_count, 36);
        assert_eq!(cube.kind, "cube");
        assert_eq!(backend.mesh_index_count(cube.mesh), Some(36));
        assert_eq!(cube.model_matrix(DVec3::ZERO), Mat4::IDENTITY);
    }

    #[test]
    fn unsupported_geometry_produces_no_mesh() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        let report = scene
            .load_map_str(
                &mut backend,
                r#"{ "entities": [
                    { "classname": "static_geometry", "origin": [0, 0, 0],
                      "geometry": { "type": "torus" } }
                ] }"#,
            )
            .unwrap();
        assert_eq!(report, MapLoadReport { loaded: 0, skipped: 1 });
        assert!(scene.is_empty());
        assert_eq!(backend.mesh_count(), 0);
    }

    #[test]
    fn huge_sphere_tessellation_is_skipped_not_fatal() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        let report = scene
            .load_map_str(
                &mut backend,
                r#"{ "entities": [
                    { "classname": "static_geometry",
                      "geometry": { "type": "sphere", "radius": 1, "slices": 4294967295, "stacks": 2 } },
                    { "classname": "static_geometry", "geometry": { "type": "cube" } }
                ] }"#,
            )
            .unwrap();
        assert_eq!(report, MapLoadReport { loaded: 1, skipped: 1 });
        assert_eq!(scene.instances()[0].kind, "cube");
    }

    #[test]
    fn reload_replaces_previous_meshes() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        scene.load_map_str(&mut backend, CUBE_MAP).unwrap();
        let old = scene.instances()[0].mesh;

        scene
            .load_map_str(
                &mut backend,
                r#"{ "entities": [
                    { "classname": "static_geometry", "geometry": { "type": "plane" } },
                    { "classname": "static_geometry", "geometry": { "type": "sphere" } },
                    { "classname": "info_player_start", "origin": [1, 2, 3] }
                ] }"#,
            )
            .unwrap();

        assert_eq!(scene.len(), 2);
        assert_eq!(backend.mesh_count(), 2);
        assert_eq!(backend.mesh_index_count(old), None);
        assert_eq!(
            scene.player_start().map(|s| s.position()),
            Some(DVec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn parse_failure_keeps_current_scene() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        scene.load_map_str(&mut backend, CUBE_MAP).unwrap();
        assert!(scene.load_map_str(&mut backend, "{ broken").is_err());
        assert_eq!(scene.len(), 1);
        assert_eq!(backend.mesh_count(), 1);
    }

    #[test]
    fn load_requires_initialized_backend() {
        let mut backend = HeadlessBackend::new();
        let mut scene = StaticScene::new();
        let err = scene.load_map_str(&mut backend, CUBE_MAP).unwrap_err();
        assert!(matches!(
            err,
            AssetError::Render(RenderError::InvalidState { .. })
        ));
        assert!(scene.is_empty());
    }

    #[test]
    fn draw_uses_origin_relative_model() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        scene
            .load_map_str(
                &mut backend,
                r#"{ "entities": [
                    { "classname": "static_geometry", "origin": [1000000000.5, 0, 0],
                      "geometry": { "type": "cube" } },
                    { "classname": "static_geometry", "origin": [1000000000.5, 0, 0],
                      "geometry": { "type": "cube" } }
                ] }"#,
            )
            .unwrap();

        let origin = DVec3::new(1_000_000_000.0, 0.0, 0.0);
        backend.begin_frame().unwrap();
        scene.draw(&mut backend, origin).unwrap();
        backend.end_frame().unwrap();

        let frame = backend.last_frame();
        assert_eq!(frame.len(), 2);
        assert_eq!(frame[0].mvp, Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0)));
        let stats = backend.last_frame_stats();
        assert_eq!(stats.draws, 2);
        assert_eq!(stats.triangles, 24);
    }

    #[test]
    fn draw_outside_frame_fails() {
        let mut backend = backend();
        let mut scene = StaticScene::new();
        scene.load_map_str(&mut backend, CUBE_MAP).unwrap();
        assert!(scene.draw(&mut backend, DVec3::ZERO).is_err());
    }

    #[test]
    fn load_from_file_and_unload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cube.json");
        std::fs::write(&path, CUBE_MAP).unwrap();

        let mut backend = backend();
        let mut scene = StaticScene::new();
        let report = scene.load_map_file(&mut backend, &path).unwrap();
        assert_eq!(report.loaded, 1);

        scene.unload(&mut backend);
        assert!(scene.is_empty());
        assert_eq!(backend.mesh_count(), 0);
    }
}
