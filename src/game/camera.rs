use bevy::ecs::system::SystemId;
use bevy::prelude::*;

use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::movement::{DisplayPosition, SimPosition, SpriteSize, Tracked};
use crate::game::simulation::{CenterOnEntity, CenteringFinished, SimConfig, SimSet};

pub struct MapCameraPlugin;

impl Plugin for MapCameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>()
           .init_resource::<CenteringRequest>()
           .add_systems(FixedUpdate, (
               process_center_commands.in_set(SimSet::Input),
               center_map_on_object_tick.in_set(SimSet::Camera),
           ));
    }
}

/// Pixel offset shared by every map layer, plus the sizes needed to keep the
/// map covering the canvas.
///
/// `offset` is where the map's top-left pixel sits on the canvas, so it is zero
/// or negative on both axes whenever the map is at least as large as the canvas.
#[derive(Resource, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub offset: FixedVec2,
    pub canvas_size: FixedVec2,
    pub map_size: FixedVec2,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(FixedVec2::from_int(800, 600), FixedVec2::ZERO)
    }
}

impl Viewport {
    pub fn new(canvas_size: FixedVec2, map_size: FixedVec2) -> Self {
        Self {
            offset: FixedVec2::ZERO,
            canvas_size,
            map_size,
        }
    }

    pub fn world_to_screen(&self, world: FixedVec2) -> FixedVec2 {
        world + self.offset
    }

    pub fn screen_to_world(&self, screen: FixedVec2) -> FixedVec2 {
        screen - self.offset
    }

    /// Vector from the on-screen center of a sprite to the canvas center.
    pub fn distance_from_center(&self, screen_pos: FixedVec2, sprite_size: FixedVec2) -> FixedVec2 {
        let half = FixedNum::from_num(2);
        (self.canvas_size / half) - (screen_pos + sprite_size / half)
    }

    // How far the map may still move before one of its edges enters the canvas.

    pub fn room_left(&self) -> FixedNum {
        (-self.offset.x).max(FixedNum::ZERO)
    }

    pub fn room_right(&self) -> FixedNum {
        (self.offset.x + self.map_size.x - self.canvas_size.x).max(FixedNum::ZERO)
    }

    pub fn room_up(&self) -> FixedNum {
        (-self.offset.y).max(FixedNum::ZERO)
    }

    pub fn room_down(&self) -> FixedNum {
        (self.offset.y + self.map_size.y - self.canvas_size.y).max(FixedNum::ZERO)
    }

    /// Next shift that brings a sprite at `screen_pos` toward the canvas
    /// center, or `None` once it is centered or the map edges stop it.
    ///
    /// Axes closer than `2 * speed` to center snap to zero. Each axis moves at
    /// most `speed` and never past the room left before a map edge.
    pub fn centering_shift(
        &self,
        screen_pos: FixedVec2,
        sprite_size: FixedVec2,
        speed: FixedNum,
    ) -> Option<FixedVec2> {
        let distance = self.distance_from_center(screen_pos, sprite_size);
        let snap = speed * FixedNum::from_num(2);

        let axis = |d: FixedNum, room_neg: FixedNum, room_pos: FixedNum| -> FixedNum {
            if d.abs() < snap {
                FixedNum::ZERO
            } else if d > FixedNum::ZERO {
                speed.min(room_pos)
            } else {
                -speed.min(room_neg)
            }
        };

        // A positive shift moves the map right/down, eating the left/up room.
        let shift = FixedVec2::new(
            axis(distance.x, self.room_right(), self.room_left()),
            axis(distance.y, self.room_down(), self.room_up()),
        );

        (shift != FixedVec2::ZERO).then_some(shift)
    }

    pub fn apply_shift(&mut self, shift: FixedVec2) {
        self.offset += shift;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CenteringTarget {
    pub entity: Entity,
    pub speed: FixedNum,
    pub on_complete: Option<SystemId>,
}

/// Scrolling state of the map.
///
/// `target` is the pending "scroll until this object is centered" request; it
/// reports completion once. `follow` keeps a walking object in view: it is set
/// on every step of its movement and consumed by the next camera tick. The two
/// never overwrite each other.
#[derive(Resource, Default, Debug)]
pub struct CenteringRequest {
    target: Option<CenteringTarget>,
    follow: Option<(Entity, FixedNum)>,
}

impl CenteringRequest {
    /// Start centering on `entity`. `on_complete` runs once when the
    /// viewport stops shifting.
    pub fn center_map_on_object(&mut self, entity: Entity, speed: FixedNum, on_complete: Option<SystemId>) {
        self.target = Some(CenteringTarget {
            entity,
            speed,
            on_complete,
        });
    }

    /// Shift toward a walking object on the next camera tick only.
    pub fn follow(&mut self, entity: Entity, speed: FixedNum) {
        self.follow = Some((entity, speed));
    }

    pub fn target(&self) -> Option<CenteringTarget> {
        self.target
    }

    pub fn followed(&self) -> Option<Entity> {
        self.follow.map(|(entity, _)| entity)
    }

    /// Whether a standalone request is still pending.
    pub fn is_active(&self) -> bool {
        self.target.is_some()
    }

    pub fn is_following(&self) -> bool {
        self.follow.is_some()
    }

    pub fn clear(&mut self) {
        self.target = None;
        self.follow = None;
    }
}

/// Move every tracked object's screen position along with the map, except
/// `exempt`, which is re-derived from its world position.
pub fn shift_world(
    viewport: &mut Viewport,
    shift: FixedVec2,
    exempt: Option<Entity>,
    tracked: &mut Query<(Entity, &mut DisplayPosition, &SimPosition), With<Tracked>>,
) {
    viewport.apply_shift(shift);

    for (entity, mut display, sim) in tracked.iter_mut() {
        if Some(entity) == exempt {
            display.0 = viewport.world_to_screen(sim.0);
        } else {
            display.0 += shift;
        }
    }
}

fn process_center_commands(
    mut requests: MessageReader<CenterOnEntity>,
    mut centering: ResMut<CenteringRequest>,
    sim_config: Res<SimConfig>,
) {
    for request in requests.read() {
        debug!("Centering map on {:?}", request.entity);
        centering.center_map_on_object(request.entity, sim_config.map_move_speed, None);
    }
}

/// Shift that centers `entity`, or `None` once it is centered, stopped by the
/// map edges or gone.
fn shift_toward(
    viewport: &Viewport,
    entity: Entity,
    speed: FixedNum,
    targets: &Query<(&SimPosition, Option<&SpriteSize>)>,
) -> Option<FixedVec2> {
    let Ok((sim_pos, sprite_size)) = targets.get(entity) else {
        warn!("Centering target {:?} no longer exists", entity);
        return None;
    };
    let sprite_size = sprite_size.copied().unwrap_or_default().0;
    viewport.centering_shift(viewport.world_to_screen(sim_pos.0), sprite_size, speed)
}

/// One follow step and one centering step per tick. The followed object's
/// screen position is re-derived from its world position after every shift.
pub fn center_map_on_object_tick(
    mut commands: Commands,
    mut centering: ResMut<CenteringRequest>,
    mut viewport: ResMut<Viewport>,
    mut finished: MessageWriter<CenteringFinished>,
    targets: Query<(&SimPosition, Option<&SpriteSize>)>,
    mut tracked: Query<(Entity, &mut DisplayPosition, &SimPosition), With<Tracked>>,
) {
    let follow = centering.follow.take();
    let followed = follow.map(|(entity, _)| entity);

    if let Some(shift) = follow.and_then(|(entity, speed)| shift_toward(&viewport, entity, speed, &targets)) {
        shift_world(&mut viewport, shift, followed, &mut tracked);
    }

    let Some(target) = centering.target() else { return };

    match shift_toward(&viewport, target.entity, target.speed, &targets) {
        Some(shift) => shift_world(&mut viewport, shift, followed, &mut tracked),
        None => {
            centering.target = None;
            if let Some(callback) = target.on_complete {
                commands.run_system(callback);
            }
            debug!("Centering on {:?} finished at offset {:?}", target.entity, viewport.offset);
            finished.write(CenteringFinished { entity: target.entity });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport(canvas: (i64, i64), map: (i64, i64)) -> Viewport {
        Viewport::new(FixedVec2::from_int(canvas.0, canvas.1), FixedVec2::from_int(map.0, map.1))
    }

    #[test]
    fn test_centered_sprite_needs_no_shift() {
        let vp = viewport((800, 600), (1600, 1200));
        let sprite = FixedVec2::from_int(16, 16);
        // Sprite center at (400, 300).
        let pos = FixedVec2::from_int(392, 292);

        assert_eq!(vp.centering_shift(pos, sprite, FixedNum::from_num(4)), None);
    }

    #[test]
    fn test_small_offsets_snap_to_zero() {
        let vp = viewport((800, 600), (1600, 1200));
        let sprite = FixedVec2::from_int(16, 16);
        // 7 px right of center with speed 4 is inside the snap band of 8.
        let pos = FixedVec2::from_int(399, 292);

        assert_eq!(vp.centering_shift(pos, sprite, FixedNum::from_num(4)), None);
    }

    #[test]
    fn test_shift_moves_map_toward_target() {
        let mut vp = viewport((800, 600), (1600, 1200));
        vp.offset = FixedVec2::from_int(-400, -300);
        let sprite = FixedVec2::from_int(16, 16);

        let right_of_center = FixedVec2::from_int(600, 292);
        assert_eq!(
            vp.centering_shift(right_of_center, sprite, FixedNum::from_num(4)),
            Some(FixedVec2::from_int(-4, 0))
        );

        let above_center = FixedVec2::from_int(392, 100);
        assert_eq!(
            vp.centering_shift(above_center, sprite, FixedNum::from_num(4)),
            Some(FixedVec2::from_int(0, 4))
        );
    }

    #[test]
    fn test_edges_stop_shifting() {
        let vp = viewport((800, 600), (1600, 1200));
        let sprite = FixedVec2::from_int(16, 16);
        // Target in the top-left corner of a map already at its top-left edge.
        let pos = FixedVec2::from_int(0, 0);

        assert_eq!(vp.centering_shift(pos, sprite, FixedNum::from_num(4)), None);
    }

    #[test]
    fn test_partial_shift_up_to_edge() {
        let mut vp = viewport((800, 600), (1600, 1200));
        vp.offset = FixedVec2::from_int(-2, -300);
        let sprite = FixedVec2::from_int(16, 16);
        let pos = FixedVec2::from_int(0, 292);

        assert_eq!(
            vp.centering_shift(pos, sprite, FixedNum::from_num(4)),
            Some(FixedVec2::from_int(2, 0))
        );
    }

    #[test]
    fn test_map_smaller_than_canvas_never_shifts() {
        let vp = viewport((800, 600), (320, 240));
        let sprite = FixedVec2::from_int(16, 16);

        for pos in [FixedVec2::from_int(0, 0), FixedVec2::from_int(304, 224)] {
            assert_eq!(vp.centering_shift(pos, sprite, FixedNum::from_num(4)), None);
        }
    }

    #[test]
    fn test_never_exposes_area_outside_map() {
        let mut rng = fastrand::Rng::with_seed(42);
        let sprite = FixedVec2::from_int(16, 16);

        for _ in 0..200 {
            let map_w = rng.i64(800..3000);
            let map_h = rng.i64(600..3000);
            let mut vp = viewport((800, 600), (map_w, map_h));
            let speed = FixedNum::from_num(rng.i64(1..40));
            let target = FixedVec2::from_int(rng.i64(0..map_w - 16), rng.i64(0..map_h - 16));

            for _ in 0..500 {
                let Some(shift) = vp.centering_shift(vp.world_to_screen(target), sprite, speed) else { break };
                vp.apply_shift(shift);

                assert!(vp.offset.x <= FixedNum::ZERO && vp.offset.y <= FixedNum::ZERO);
                assert!(vp.offset.x + vp.map_size.x >= vp.canvas_size.x);
                assert!(vp.offset.y + vp.map_size.y >= vp.canvas_size.y);
            }
        }
    }

    #[test]
    fn test_stationary_target_distance_decreases() {
        let mut vp = viewport((800, 600), (3200, 2400));
        let sprite = FixedVec2::from_int(16, 16);
        let speed = FixedNum::from_num(8);
        let target = FixedVec2::from_int(1500, 1100);

        let manhattan = |v: FixedVec2| v.x.abs() + v.y.abs();
        let mut last = manhattan(vp.distance_from_center(vp.world_to_screen(target), sprite));
        let mut steps = 0;

        while let Some(shift) = vp.centering_shift(vp.world_to_screen(target), sprite, speed) {
            vp.apply_shift(shift);
            let now = manhattan(vp.distance_from_center(vp.world_to_screen(target), sprite));
            assert!(now < last, "distance must shrink every tick");
            last = now;
            steps += 1;
            assert!(steps < 1000);
        }

        let rest = vp.distance_from_center(vp.world_to_screen(target), sprite);
        assert!(rest.x.abs() < speed * FixedNum::from_num(2));
        assert!(rest.y.abs() < speed * FixedNum::from_num(2));
    }

    #[test]
    fn test_follow_leaves_pending_request_alone() {
        let mut world = World::new();
        let callback = world.register_system(|| {});
        let chest = world.spawn_empty().id();
        let player = world.spawn_empty().id();

        let mut request = CenteringRequest::default();
        request.center_map_on_object(chest, FixedNum::from_num(8), Some(callback));
        request.follow(player, FixedNum::from_num(4));

        let target = request.target().unwrap();
        assert_eq!(target.entity, chest);
        assert_eq!(target.on_complete, Some(callback));
        assert_eq!(request.followed(), Some(player));

        request.clear();
        assert!(!request.is_active());
        assert!(!request.is_following());
    }
}
