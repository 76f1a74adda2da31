use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;

use crate::game::fixed_math::FixedVec2;

/// Position of each tile layer in a map file, by convention of the map editor
/// project: two background layers, the simple-object layer, the collision
/// layer and the foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerRole {
    BackgroundFar,
    BackgroundNear,
    SimpleObjects,
    Collision,
    Foreground,
}

impl LayerRole {
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(LayerRole::BackgroundFar),
            1 => Some(LayerRole::BackgroundNear),
            2 => Some(LayerRole::SimpleObjects),
            3 => Some(LayerRole::Collision),
            4 => Some(LayerRole::Foreground),
            _ => None,
        }
    }
}

/// Tiled map as exported to JSON. Only the fields the viewport needs are read.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    #[serde(rename = "tilewidth")]
    pub tile_width: u32,
    #[serde(rename = "tileheight")]
    pub tile_height: u32,
    pub layers: Vec<MapLayerData>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(tag = "type")]
pub enum MapLayerData {
    #[serde(rename = "tilelayer")]
    Tiles(TileLayer),
    #[serde(rename = "objectgroup")]
    Objects(ObjectGroup),
    /// Image layers, group layers and anything newer Tiled versions add.
    #[serde(other)]
    Other,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TileLayer {
    #[serde(default)]
    pub name: String,
    pub width: usize,
    pub height: usize,
    /// Row-major tile indices, 1-based; 0 means no tile.
    pub data: Vec<u32>,
}

impl TileLayer {
    pub fn tile(&self, x: usize, y: usize) -> u32 {
        self.data.get(x + y * self.width).copied().unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ObjectGroup {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub objects: Vec<MapObject>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct MapObject {
    #[serde(rename = "type", default)]
    pub kind: String,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

/// Map objects the viewport itself cares about. Everything else in an object
/// group belongs to game-entity code.
#[derive(Clone, Debug, PartialEq)]
pub enum MapMarker {
    StartPoint { id: u32, position: FixedVec2 },
    DisableFogOfWar,
}

impl TileMap {
    pub fn from_json_str(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let map: TileMap = serde_json::from_str(json)?;
        map.validate()?;
        Ok(map)
    }

    /// Tile layer at a given layer position, if that position is a tile layer.
    pub fn tile_layer(&self, role: LayerRole) -> Option<&TileLayer> {
        self.tile_layers().find(|(r, _)| *r == role).map(|(_, layer)| layer)
    }

    /// Tile layers tagged with their role, in file order.
    pub fn tile_layers(&self) -> impl Iterator<Item = (LayerRole, &TileLayer)> {
        self.layers.iter().enumerate().filter_map(|(i, layer)| match layer {
            MapLayerData::Tiles(tiles) => LayerRole::from_index(i).map(|role| (role, tiles)),
            _ => None,
        })
    }

    pub fn collision_layer(&self) -> Option<&TileLayer> {
        self.tile_layer(LayerRole::Collision)
    }

    pub fn pixel_width(&self) -> u32 {
        self.tile_width * self.width as u32
    }

    pub fn pixel_height(&self) -> u32 {
        self.tile_height * self.height as u32
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        let mut markers = Vec::new();
        for layer in &self.layers {
            let MapLayerData::Objects(group) = layer else { continue };
            for object in &group.objects {
                match object.kind.as_str() {
                    "StartPoint" => {
                        let id = object.properties.get("startpoint_id").and_then(property_as_u32).unwrap_or(0);
                        markers.push(MapMarker::StartPoint {
                            id,
                            position: FixedVec2::from_f32(object.x, object.y),
                        });
                    }
                    "DisableFogOfWar" => markers.push(MapMarker::DisableFogOfWar),
                    other => debug!("Ignoring map object of type '{}'", other),
                }
            }
        }
        markers
    }

    pub fn fog_disabled(&self) -> bool {
        self.markers().contains(&MapMarker::DisableFogOfWar)
    }

    pub fn start_point(&self, id: u32) -> Option<FixedVec2> {
        self.markers().into_iter().find_map(|marker| match marker {
            MapMarker::StartPoint { id: marker_id, position } if marker_id == id => Some(position),
            _ => None,
        })
    }

    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.width == 0 || self.height == 0 {
            return Err(format!("map has empty dimensions {}x{}", self.width, self.height).into());
        }
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err("map tile size must be non-zero".into());
        }
        if self.collision_layer().is_none() {
            return Err("map has no collision layer (tile layer #4)".into());
        }
        for (role, layer) in self.tile_layers() {
            if layer.width != self.width || layer.height != self.height || layer.data.len() != self.width * self.height {
                return Err(format!(
                    "{:?} layer '{}' is {}x{} with {} tiles, map is {}x{}",
                    role, layer.name, layer.width, layer.height, layer.data.len(), self.width, self.height
                ).into());
            }
        }
        Ok(())
    }
}

/// Tiled writes custom properties as strings in older exports and as numbers
/// in newer ones.
fn property_as_u32(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().map(|n| n as u32),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn load_map(path: &str) -> Result<TileMap, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let map: TileMap = serde_json::from_reader(reader)?;
    map.validate()?;
    Ok(map)
}
