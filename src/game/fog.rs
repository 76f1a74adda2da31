use bevy::prelude::*;
use fixedbitset::FixedBitSet;
use std::time::Duration;

use crate::game::grid::Cell;

/// Per-cell fog-of-war overlay.
///
/// Each cell carries one obscuring marker; a set bit means the marker is still
/// opaque. Markers are only ever cleared, so revealing is idempotent.
///
/// The render layer draws the markers from a cached snapshot. Mutations must be
/// bracketed by [`uncache`](Self::uncache) and [`begin_caching`](Self::begin_caching);
/// each re-cache publishes a new [`revision`](Self::revision).
#[derive(Resource, Clone, Debug, Default)]
pub struct FogOfWar {
    width: usize,
    height: usize,
    opaque: FixedBitSet,
    cached: bool,
    revision: u64,
}

impl FogOfWar {
    /// All cells start opaque and uncached.
    pub fn new(width: usize, height: usize) -> Self {
        let mut opaque = FixedBitSet::with_capacity(width * height);
        opaque.insert_range(..);
        Self {
            width,
            height,
            opaque,
            cached: false,
            revision: 0,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn is_opaque(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height && self.opaque.contains(cell.y * self.width + cell.x)
    }

    pub fn is_revealed(&self, cell: Cell) -> bool {
        !self.is_opaque(cell)
    }

    pub fn revealed_count(&self) -> usize {
        self.width * self.height - self.opaque.count_ones(..)
    }

    /// Clear every marker within `radius` cells (Euclidean) of `center`.
    pub fn reveal(&mut self, center: Cell, radius: u32) {
        let r = radius as i64;
        let (cx, cy) = (center.x as i64, center.y as i64);

        let min_y = (cy - r).max(0);
        let max_y = (cy + r).min(self.height as i64 - 1);
        let min_x = (cx - r).max(0);
        let max_x = (cx + r).min(self.width as i64 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let (dx, dy) = (x - cx, y - cy);
                if dx * dx + dy * dy <= r * r {
                    self.opaque.set(y as usize * self.width + x as usize, false);
                }
            }
        }
    }

    /// Clear every marker on the map.
    pub fn disable(&mut self) {
        self.opaque.clear();
    }

    pub fn uncache(&mut self) {
        self.cached = false;
    }

    pub fn begin_caching(&mut self) {
        self.cached = true;
        self.revision += 1;
    }

    pub fn is_cached(&self) -> bool {
        self.cached
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Uncache, reveal around `center`, re-cache.
    pub fn refresh_around(&mut self, center: Cell, radius: u32) {
        self.uncache();
        self.reveal(center, radius);
        self.begin_caching();
    }
}

/// Defers the first fog cache after a map install so the reveal around the
/// spawning observer lands before the layer is frozen.
#[derive(Resource, Debug)]
pub struct FogCacheDelay(pub Timer);

impl FogCacheDelay {
    pub fn new(delay_ms: u64) -> Self {
        Self(Timer::new(Duration::from_millis(delay_ms), TimerMode::Once))
    }
}

pub fn tick_fog_cache_delay(
    mut commands: Commands,
    time: Res<Time>,
    delay: Option<ResMut<FogCacheDelay>>,
    mut fog: ResMut<FogOfWar>,
) {
    let Some(mut delay) = delay else { return };
    if delay.0.tick(time.delta()).is_finished() {
        fog.begin_caching();
        commands.remove_resource::<FogCacheDelay>();
        debug!("Fog of war cached (revision {})", fog.revision());
    }
}
