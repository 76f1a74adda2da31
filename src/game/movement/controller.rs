use bevy::prelude::*;

use crate::game::camera::Viewport;
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::fog::FogOfWar;
use crate::game::grid::{Cell, CollisionGrid};
use crate::game::pathfinding::{search, MovementGraph};

/// What the movement state machine needs from the object it moves.
pub trait Mover {
    /// World-local pixel position.
    fn position(&self) -> FixedVec2;

    fn move_speed(&self) -> FixedNum;

    /// Observers clear fog of war around every cell they reach.
    fn is_observer(&self) -> bool;

    /// Move both the logical and the animated position by `step` pixels.
    fn advance(&mut self, step: FixedVec2);

    fn update_movement_animation(&mut self, delta: IVec2);

    /// Called once whenever an order ends, including rejected ones.
    fn clean_up_movement(&mut self);
}

/// A move order in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementOrder {
    pub entity: Entity,
    /// World-local pixel the order was issued for.
    pub target_pixel: FixedVec2,
    pub target_cell: Cell,
    pub start_cell: Cell,
    /// Cell the mover last fully arrived at.
    pub current_cell: Cell,
    /// Cell the mover is currently stepping into.
    pub next_cell: Option<Cell>,
    /// Remaining route from `current_cell`, `None` until the first tick.
    pub path: Option<Vec<Cell>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum MovementState {
    #[default]
    Idle,
    Pathing(MovementOrder),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No order in progress.
    Idle,
    /// The order ended this tick; `arrived` is false for unreachable targets.
    Finished { entity: Entity, arrived: bool },
    /// The mover advanced by `step` pixels.
    Stepped { entity: Entity, step: FixedVec2 },
}

/// Single-mover movement state machine: Idle -> Pathing -> Idle.
#[derive(Resource, Default, Debug)]
pub struct MovementController {
    state: MovementState,
}

impl MovementController {
    pub fn state(&self) -> &MovementState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, MovementState::Idle)
    }

    pub fn active_entity(&self) -> Option<Entity> {
        match &self.state {
            MovementState::Pathing(order) => Some(order.entity),
            MovementState::Idle => None,
        }
    }

    pub fn remaining_path_len(&self) -> Option<usize> {
        match &self.state {
            MovementState::Pathing(order) => order.path.as_ref().map(Vec::len),
            MovementState::Idle => None,
        }
    }

    /// Drop any order without running cleanup. Used when a new map is installed.
    pub fn reset(&mut self) {
        self.state = MovementState::Idle;
    }

    /// Start moving `entity` toward the cell under a canvas pixel.
    ///
    /// Returns `false` and leaves the controller idle when the target is off the
    /// map, blocked, or the mover's own cell, and when the mover has no positive
    /// speed. A new order replaces any order
    /// already in flight.
    pub fn move_object_to(
        &mut self,
        entity: Entity,
        mover: &mut impl Mover,
        target_screen: FixedVec2,
        viewport: &Viewport,
        grid: &CollisionGrid,
    ) -> bool {
        let target_pixel = viewport.screen_to_world(target_screen);

        let accepted = match (grid.cell_at(mover.position()), grid.cell_at(target_pixel)) {
            (Some(start_cell), Some(target_cell))
                if start_cell != target_cell
                    && grid.is_cell_valid(target_pixel)
                    && mover.move_speed() > FixedNum::ZERO =>
            {
                debug!("Move order for {:?}: {:?} -> {:?}", entity, start_cell, target_cell);
                self.state = MovementState::Pathing(MovementOrder {
                    entity,
                    target_pixel,
                    target_cell,
                    start_cell,
                    current_cell: start_cell,
                    next_cell: None,
                    path: None,
                });
                true
            }
            _ => false,
        };

        if !accepted {
            debug!("Rejected move order for {:?} to {:?}", entity, target_pixel);
            self.state = MovementState::Idle;
            mover.clean_up_movement();
        }
        accepted
    }

    /// Advance the active order by one tick.
    ///
    /// The route is searched again each time the mover lands exactly on the
    /// origin of the cell it was stepping into, so a path of length N is N - 1
    /// after one consumed step. Steps are clamped so the mover never overshoots
    /// that origin.
    pub fn movement_tick(
        &mut self,
        mover: &mut impl Mover,
        grid: &CollisionGrid,
        graph: &MovementGraph,
        fog: &mut FogOfWar,
        fog_radius: u32,
    ) -> TickOutcome {
        let MovementState::Pathing(order) = &mut self.state else {
            return TickOutcome::Idle;
        };
        let entity = order.entity;
        let position = mover.position();

        let step_consumed = match order.next_cell {
            Some(next) => position == grid.cell_origin(next),
            None => true,
        };

        if step_consumed {
            let Some(current) = grid.cell_at(position) else {
                warn!("Mover {:?} left the map at {:?}", entity, position);
                return self.finish(mover, false);
            };
            order.current_cell = current;

            let path = search(graph, current, order.target_cell);
            if mover.is_observer() {
                fog.refresh_around(current, fog_radius);
            }

            if current == order.target_cell || path.is_empty() {
                let arrived = current == order.target_cell;
                if !arrived {
                    debug!("No route from {:?} to {:?}", current, order.target_cell);
                }
                order.path = Some(path);
                return self.finish(mover, arrived);
            }

            order.next_cell = Some(path[0]);
            order.path = Some(path);
        }

        let Some(next) = order.next_cell else {
            return self.finish(mover, false);
        };

        let delta = order.current_cell.step_toward(next);
        let step = (grid.cell_origin(next) - position).clamp_each(mover.move_speed());

        mover.advance(step);
        mover.update_movement_animation(delta);

        TickOutcome::Stepped { entity, step }
    }

    fn finish(&mut self, mover: &mut impl Mover, arrived: bool) -> TickOutcome {
        let entity = self.active_entity();
        self.state = MovementState::Idle;
        mover.clean_up_movement();

        match entity {
            Some(entity) => TickOutcome::Finished { entity, arrived },
            None => TickOutcome::Idle,
        }
    }
}
