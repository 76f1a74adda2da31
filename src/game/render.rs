use bevy::prelude::*;

use crate::game::GameState;
use crate::game::camera::Viewport;
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::fog::FogOfWar;
use crate::game::grid::Cell;
use crate::game::map::LayerRole;
use crate::game::movement::{DisplayPosition, SpriteSize};
use crate::game::simulation::{ActiveMap, SimConfig};

pub struct MapRenderPlugin;

impl Plugin for MapRenderPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, spawn_camera)
           .add_systems(Update, (
               spawn_map_layers.run_if(resource_exists_and_changed::<ActiveMap>),
               sync_layer_transforms,
               sync_display_transforms,
               sync_fog_markers,
           ).chain().run_if(in_state(GameState::InGame)));
    }
}

/// Draw order of the map layers. Every root follows the shared viewport offset.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MapLayer {
    Background,
    World,
    Foreground,
    Fog,
}

impl MapLayer {
    fn z(self) -> f32 {
        match self {
            MapLayer::Background => 0.0,
            MapLayer::World => 1.0,
            MapLayer::Foreground => 10.0,
            MapLayer::Fog => 20.0,
        }
    }

    fn for_role(role: LayerRole) -> Option<Self> {
        match role {
            LayerRole::BackgroundFar | LayerRole::BackgroundNear => Some(MapLayer::Background),
            LayerRole::SimpleObjects => Some(MapLayer::World),
            LayerRole::Foreground => Some(MapLayer::Foreground),
            // Collision tiles are data only
            LayerRole::Collision => None,
        }
    }
}

#[derive(Component, Clone, Copy, Debug)]
pub struct FogMarker(pub Cell);

/// Z for sprites placed from a [`DisplayPosition`]: above the world layer,
/// below the foreground.
const OBJECT_Z: f32 = 5.0;

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}

/// Canvas pixel (top-left origin, y down) to Bevy 2D world (center origin, y up).
fn canvas_to_world(canvas: Vec2, canvas_size: Vec2) -> Vec2 {
    Vec2::new(canvas.x - canvas_size.x / 2.0, canvas_size.y / 2.0 - canvas.y)
}

/// Flat color standing in for a tileset image.
fn tile_color(tile: u32, layer: MapLayer) -> Color {
    let hue = (tile.wrapping_mul(47) % 360) as f32;
    match layer {
        MapLayer::Background => Color::hsl(hue, 0.35, 0.35),
        MapLayer::World => Color::hsl(hue, 0.55, 0.5),
        _ => Color::hsla(hue, 0.5, 0.65, 0.8),
    }
}

fn spawn_map_layers(
    mut commands: Commands,
    active_map: Res<ActiveMap>,
    old_layers: Query<Entity, With<MapLayer>>,
) {
    for entity in old_layers.iter() {
        commands.entity(entity).despawn();
    }

    let map = &active_map.0;
    let tile_size = Vec2::new(map.tile_width as f32, map.tile_height as f32);
    let local = |x: usize, y: usize| {
        Vec3::new(
            x as f32 * tile_size.x + tile_size.x / 2.0,
            -(y as f32 * tile_size.y + tile_size.y / 2.0),
            0.0,
        )
    };

    for kind in [MapLayer::Background, MapLayer::World, MapLayer::Foreground] {
        let mut sprites = Vec::new();
        for (role, layer) in map.tile_layers() {
            if MapLayer::for_role(role) != Some(kind) {
                continue;
            }
            for y in 0..layer.height {
                for x in 0..layer.width {
                    let tile = layer.tile(x, y);
                    if tile != 0 {
                        sprites.push((
                            Sprite::from_color(tile_color(tile, kind), tile_size),
                            Transform::from_translation(local(x, y)),
                        ));
                    }
                }
            }
        }

        commands
            .spawn((kind, Transform::from_xyz(0.0, 0.0, kind.z()), Visibility::default()))
            .with_children(|parent| {
                for sprite in sprites {
                    parent.spawn(sprite);
                }
            });
    }

    commands
        .spawn((MapLayer::Fog, Transform::from_xyz(0.0, 0.0, MapLayer::Fog.z()), Visibility::default()))
        .with_children(|parent| {
            for y in 0..map.height {
                for x in 0..map.width {
                    parent.spawn((
                        FogMarker(Cell::new(x, y)),
                        Sprite::from_color(Color::BLACK, tile_size),
                        Transform::from_translation(local(x, y)),
                    ));
                }
            }
        });

    debug!("Spawned render layers for {}x{} map", map.width, map.height);
}

fn sync_layer_transforms(
    viewport: Res<Viewport>,
    sim_config: Res<SimConfig>,
    mut layers: Query<(Ref<MapLayer>, &mut Transform)>,
) {
    let canvas_size = sim_config.canvas_size.to_vec2();
    for (layer, mut transform) in layers.iter_mut() {
        if !viewport.is_changed() && !layer.is_added() {
            continue;
        }
        let origin = canvas_to_world(viewport.offset.to_vec2(), canvas_size);
        transform.translation = origin.extend(layer.z());
    }
}

fn sync_display_transforms(
    sim_config: Res<SimConfig>,
    mut objects: Query<(&DisplayPosition, Option<&SpriteSize>, &mut Transform), Changed<DisplayPosition>>,
) {
    let canvas_size = sim_config.canvas_size.to_vec2();
    for (display, sprite_size, mut transform) in objects.iter_mut() {
        let size = sprite_size.copied().unwrap_or_default().0;
        let center = display.0 + size / FixedNum::from_num(2);
        transform.translation = canvas_to_world(center.to_vec2(), canvas_size).extend(OBJECT_Z);
    }
}

/// Marker visibility only follows the fog once a new cache revision exists.
fn sync_fog_markers(
    fog: Res<FogOfWar>,
    mut last_revision: Local<Option<u64>>,
    mut markers: Query<(Ref<FogMarker>, &mut Visibility)>,
) {
    let fresh_markers = markers.iter().any(|(marker, _)| marker.is_added());
    let new_revision = fog.is_cached() && *last_revision != Some(fog.revision());
    if !fresh_markers && !new_revision {
        return;
    }
    if fog.is_cached() {
        *last_revision = Some(fog.revision());
    }

    for (marker, mut visibility) in markers.iter_mut() {
        *visibility = if fog.is_opaque(marker.0) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

/// Flat placeholder sprite for an object drawn from a [`DisplayPosition`].
pub fn object_sprite(size: FixedVec2) -> Sprite {
    Sprite::from_color(Color::srgb(0.9, 0.8, 0.2), size.to_vec2())
}
