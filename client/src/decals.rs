//! Bullet-hole decals
//!
//! Hits are queued by the weapon through [`DecalRequests`] and turned into small quads
//! afterwards. At most [`MAX_DECALS`] exist; the oldest goes first.

use std::collections::VecDeque;

use bevy::prelude::*;
use controller::{DecalSink, SurfaceKind};

pub const MAX_DECALS: usize = 100;
const DECAL_SIZE: f32 = 0.08;
/// Lift off the surface to avoid z-fighting
const DECAL_SURFACE_OFFSET: f32 = 0.005;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecalRequest {
    pub point: Vec3,
    pub normal: Vec3,
    pub hit: Option<Entity>,
}

/// Decals requested this frame
#[derive(Resource, Default)]
pub struct DecalRequests {
    pub pending: Vec<DecalRequest>,
}

impl DecalSink for DecalRequests {
    fn add_decal(&mut self, point: Vec3, normal: Vec3, hit: Option<Entity>, surface: SurfaceKind) {
        // Moving bodies and targets don't keep holes
        if surface != SurfaceKind::Static {
            return;
        }
        self.pending.push(DecalRequest { point, normal, hit });
    }
}

/// Live decals, oldest first
#[derive(Resource, Default)]
pub struct DecalRing {
    entities: VecDeque<Entity>,
}

impl DecalRing {
    /// Track a new decal; returns the one that fell off the end, if any
    pub fn push(&mut self, entity: Entity) -> Option<Entity> {
        self.entities.push_back(entity);
        if self.entities.len() > MAX_DECALS {
            self.entities.pop_front()
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }
}

#[derive(Resource)]
pub struct DecalAssets {
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

pub fn setup_decal_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(DecalAssets {
        mesh: meshes.add(Rectangle::new(DECAL_SIZE, DECAL_SIZE)),
        material: materials.add(StandardMaterial {
            base_color: Color::srgb(0.05, 0.05, 0.05),
            perceptual_roughness: 1.0,
            ..default()
        }),
    });
}

/// Spawn queued decals, parented to the surface they hit
pub fn spawn_decals(
    mut commands: Commands,
    mut requests: ResMut<DecalRequests>,
    mut ring: ResMut<DecalRing>,
    assets: Option<Res<DecalAssets>>,
    surfaces: Query<&GlobalTransform>,
) {
    let Some(assets) = assets else {
        requests.pending.clear();
        return;
    };

    for request in requests.pending.drain(..) {
        let normal = request.normal.normalize_or_zero();
        if normal == Vec3::ZERO {
            continue;
        }

        // Rectangle faces +Z
        let world = Transform::from_translation(request.point + normal * DECAL_SURFACE_OFFSET)
            .with_rotation(Quat::from_rotation_arc(Vec3::Z, normal));

        let parent = request
            .hit
            .and_then(|entity| surfaces.get(entity).ok().map(|global| (entity, global)));
        let transform = match parent {
            Some((_, global)) => GlobalTransform::from(world).reparented_to(global),
            None => world,
        };

        let decal = commands
            .spawn((
                Mesh3d(assets.mesh.clone()),
                MeshMaterial3d(assets.material.clone()),
                transform,
            ))
            .id();
        if let Some((entity, _)) = parent {
            commands.entity(entity).add_child(decal);
        }

        if let Some(oldest) = ring.push(decal) {
            commands.entity(oldest).try_despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_drops_oldest() {
        let mut world = World::new();
        let entities: Vec<Entity> = (0..=MAX_DECALS).map(|_| world.spawn_empty().id()).collect();

        let mut ring = DecalRing::default();
        for entity in &entities[..MAX_DECALS] {
            assert_eq!(ring.push(*entity), None);
        }
        assert_eq!(ring.push(entities[MAX_DECALS]), Some(entities[0]));
        assert_eq!(ring.len(), MAX_DECALS);
    }

    #[test]
    fn test_only_static_surfaces_get_decals() {
        let mut requests = DecalRequests::default();
        requests.add_decal(Vec3::ZERO, Vec3::Y, None, SurfaceKind::Dynamic);
        requests.add_decal(Vec3::ZERO, Vec3::Y, None, SurfaceKind::Entity);
        assert!(requests.pending.is_empty());

        requests.add_decal(Vec3::ONE, Vec3::Y, None, SurfaceKind::Static);
        assert_eq!(requests.pending.len(), 1);
    }
}
