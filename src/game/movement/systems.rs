use bevy::prelude::*;

use crate::game::camera::{CenteringRequest, Viewport};
use crate::game::fixed_math::{FixedNum, FixedVec2};
use crate::game::fog::FogOfWar;
use crate::game::grid::CollisionGrid;
use crate::game::pathfinding::MovementGraph;
use crate::game::simulation::{MoveCommand, MovementEnded, SimConfig, SimTick, TurnState};

use super::components::*;
use super::controller::{MovementController, Mover, TickOutcome};

type MoverComponents = (
    &'static mut SimPosition,
    &'static mut DisplayPosition,
    Option<&'static MoveSpeed>,
    Option<&'static mut MovementAnimation>,
    Has<Observer>,
);

/// [`Mover`] over the components of one entity.
struct EcsMover<'a> {
    sim_pos: Mut<'a, SimPosition>,
    display_pos: Mut<'a, DisplayPosition>,
    speed: FixedNum,
    animation: Option<Mut<'a, MovementAnimation>>,
    observer: bool,
}

impl<'a> EcsMover<'a> {
    fn new(
        (sim_pos, display_pos, speed, animation, observer): (
            Mut<'a, SimPosition>,
            Mut<'a, DisplayPosition>,
            Option<&'a MoveSpeed>,
            Option<Mut<'a, MovementAnimation>>,
            bool,
        ),
        default_speed: FixedNum,
    ) -> Self {
        Self {
            sim_pos,
            display_pos,
            speed: speed.map_or(default_speed, |s| s.0),
            animation,
            observer,
        }
    }
}

impl Mover for EcsMover<'_> {
    fn position(&self) -> FixedVec2 {
        self.sim_pos.0
    }

    fn move_speed(&self) -> FixedNum {
        self.speed
    }

    fn is_observer(&self) -> bool {
        self.observer
    }

    fn advance(&mut self, step: FixedVec2) {
        self.sim_pos.0 += step;
        self.display_pos.0 += step;
    }

    fn update_movement_animation(&mut self, delta: IVec2) {
        if let Some(animation) = self.animation.as_mut() {
            animation.step(delta);
        }
    }

    fn clean_up_movement(&mut self) {
        if let Some(animation) = self.animation.as_mut() {
            animation.stop();
        }
    }
}

/// Turn move commands into a movement order. The last command of a tick wins.
pub fn process_move_commands(
    mut commands_in: MessageReader<MoveCommand>,
    mut ended: MessageWriter<MovementEnded>,
    mut controller: ResMut<MovementController>,
    mut turn: ResMut<TurnState>,
    mut movers: Query<MoverComponents>,
    viewport: Res<Viewport>,
    grid: Res<CollisionGrid>,
    sim_config: Res<SimConfig>,
) {
    for command in commands_in.read() {
        let Ok(components) = movers.get_mut(command.entity) else {
            warn!("Move command for {:?}, which cannot move", command.entity);
            continue;
        };
        let mut mover = EcsMover::new(components, sim_config.player_move_speed);

        if controller.move_object_to(command.entity, &mut mover, command.target, &viewport, &grid) {
            turn.in_progress = true;
        } else {
            turn.in_progress = false;
            ended.write(MovementEnded { entity: command.entity, arrived: false });
        }
    }
}

/// Advance the active order one step and keep the camera on the mover.
pub fn movement_tick_actions(
    mut controller: ResMut<MovementController>,
    mut movers: Query<MoverComponents>,
    mut fog: ResMut<FogOfWar>,
    mut turn: ResMut<TurnState>,
    mut centering: ResMut<CenteringRequest>,
    mut ended: MessageWriter<MovementEnded>,
    grid: Res<CollisionGrid>,
    graph: Res<MovementGraph>,
    sim_config: Res<SimConfig>,
    #[allow(unused_variables)] tick: Res<SimTick>,
) {
    use crate::profile_log;

    let Some(entity) = controller.active_entity() else { return };
    let Ok(components) = movers.get_mut(entity) else {
        warn!("Moving entity {:?} disappeared, dropping its order", entity);
        controller.reset();
        turn.in_progress = false;
        return;
    };
    let mut mover = EcsMover::new(components, sim_config.player_move_speed);
    let speed = mover.move_speed();

    match controller.movement_tick(&mut mover, &grid, &graph, &mut fog, sim_config.fog_reveal_radius) {
        TickOutcome::Stepped { entity, step } => {
            trace!("{:?} stepped {:?}", entity, step);
            profile_log!(tick, "[MOVEMENT] {:?} has {:?} cells left", entity, controller.remaining_path_len());
            centering.follow(entity, speed);
        }
        TickOutcome::Finished { entity, arrived } => {
            debug!("Movement of {:?} finished (arrived: {})", entity, arrived);
            turn.in_progress = false;
            ended.write(MovementEnded { entity, arrived });
        }
        TickOutcome::Idle => {}
    }
}
