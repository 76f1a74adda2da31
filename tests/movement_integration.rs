use bevy::ecs::message::Messages;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::time::Duration;
use tilescape::game::GameState;
use tilescape::game::camera::{MapCameraPlugin, Viewport};
use tilescape::game::config::InitialConfig;
use tilescape::game::fixed_math::{FixedNum, FixedVec2};
use tilescape::game::fog::FogOfWar;
use tilescape::game::grid::Cell;
use tilescape::game::map::{MapLayerData, TileLayer, TileMap};
use tilescape::game::movement::{
    Controlled, DisplayPosition, MoveSpeed, MovementAnimation, MovementController, MovementPlugin, Observer,
    SimPosition, SpriteSize, Tracked,
};
use tilescape::game::simulation::{ActiveMap, MoveCommand, MovementEnded, SimConfig, SimulationPlugin, TurnState};

fn tile_map(width: usize, height: usize, blocked: &[(usize, usize)]) -> TileMap {
    let mut collision = vec![1u32; width * height];
    for &(x, y) in blocked {
        collision[y * width + x] = 0;
    }
    let layer = |name: &str, data: Vec<u32>| {
        MapLayerData::Tiles(TileLayer {
            name: name.to_string(),
            width,
            height,
            data,
        })
    };

    TileMap {
        width,
        height,
        tile_width: 16,
        tile_height: 16,
        layers: vec![
            layer("ground", vec![1; width * height]),
            layer("detail", vec![0; width * height]),
            layer("objects", vec![0; width * height]),
            layer("collision", collision),
        ],
    }
}

fn setup_app(map: TileMap) -> App {
    setup_app_with(map, InitialConfig {
        map_path: String::new(),
        ..default()
    })
}

fn setup_app_with(map: TileMap, config: InitialConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(bevy::state::app::StatesPlugin);
    // Time never advances on its own, ticks are driven by hand
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    app.init_state::<GameState>();
    app.insert_resource(config);
    app.add_plugins(SimulationPlugin);
    app.add_plugins(MovementPlugin);
    app.add_plugins(MapCameraPlugin);
    app.insert_resource(ActiveMap(map));

    // Startup + map install
    app.update();
    app
}

fn spawn_player(app: &mut App, cell: Cell, speed: i64) -> Entity {
    let viewport = *app.world().resource::<Viewport>();
    let position = FixedVec2::from_int(cell.x as i64 * 16, cell.y as i64 * 16);
    app.world_mut()
        .spawn((
            SimPosition(position),
            DisplayPosition(viewport.world_to_screen(position)),
            MoveSpeed(FixedNum::from_num(speed)),
            SpriteSize(FixedVec2::from_int(16, 16)),
            MovementAnimation::default(),
            Observer,
            Tracked,
            Controlled,
        ))
        .id()
}

/// Canvas pixel at the middle of a cell, given the current viewport.
fn screen_px(app: &App, cell: Cell) -> FixedVec2 {
    let viewport = app.world().resource::<Viewport>();
    viewport.world_to_screen(FixedVec2::from_int(cell.x as i64 * 16 + 8, cell.y as i64 * 16 + 8))
}

fn ended_messages(app: &App) -> Vec<MovementEnded> {
    let messages = app.world().resource::<Messages<MovementEnded>>();
    let mut cursor = messages.get_cursor();
    cursor.read(messages).cloned().collect()
}

fn tick_until_idle(app: &mut App, max_ticks: usize) -> usize {
    for tick in 1..=max_ticks {
        app.world_mut().run_schedule(FixedUpdate);
        if app.world().resource::<MovementController>().is_idle() {
            return tick;
        }
    }
    panic!("movement did not finish within {} ticks", max_ticks);
}

#[test]
fn test_map_install_enters_game() {
    let app = setup_app(tile_map(20, 20, &[(3, 3)]));

    assert_eq!(*app.world().resource::<State<GameState>>().get(), GameState::InGame);
    let fog = app.world().resource::<FogOfWar>();
    assert_eq!((fog.width(), fog.height()), (20, 20));
    let viewport = app.world().resource::<Viewport>();
    assert_eq!(viewport.map_size, FixedVec2::from_int(320, 320));
    assert_eq!(viewport.offset, FixedVec2::ZERO);
}

#[test]
fn test_move_command_walks_player_to_target() {
    let mut app = setup_app(tile_map(20, 20, &[(3, 1), (3, 2)]));
    let player = spawn_player(&mut app, Cell::new(1, 1), 4);

    let target = screen_px(&app, Cell::new(5, 1));
    app.world_mut().write_message(MoveCommand { entity: player, target });

    app.world_mut().run_schedule(FixedUpdate);
    assert!(app.world().resource::<TurnState>().in_progress);

    tick_until_idle(&mut app, 500);

    assert_eq!(app.world().get::<SimPosition>(player).unwrap().0, FixedVec2::from_int(80, 16));
    assert!(!app.world().resource::<TurnState>().in_progress);
    assert!(!app.world().get::<MovementAnimation>(player).unwrap().walking);
    assert_eq!(ended_messages(&app), vec![MovementEnded { entity: player, arrived: true }]);

    let fog = app.world().resource::<FogOfWar>();
    assert!(fog.is_revealed(Cell::new(5, 1)));
    assert!(fog.is_revealed(Cell::new(1, 1)));
    assert!(fog.is_opaque(Cell::new(19, 19)));
}

#[test]
fn test_command_to_own_cell_is_rejected() {
    let mut app = setup_app(tile_map(20, 20, &[]));
    let player = spawn_player(&mut app, Cell::new(2, 2), 4);

    let target = screen_px(&app, Cell::new(2, 2));
    app.world_mut().write_message(MoveCommand { entity: player, target });
    app.world_mut().run_schedule(FixedUpdate);

    assert!(app.world().resource::<MovementController>().is_idle());
    assert!(!app.world().resource::<TurnState>().in_progress);
    assert_eq!(app.world().get::<SimPosition>(player).unwrap().0, FixedVec2::from_int(32, 32));
    assert_eq!(ended_messages(&app), vec![MovementEnded { entity: player, arrived: false }]);
    assert_eq!(app.world().resource::<FogOfWar>().revealed_count(), 0);
}

#[test]
fn test_unreachable_target_ends_without_arriving() {
    let mut app = setup_app(tile_map(20, 20, &[(10, 9), (9, 10), (11, 10), (10, 11)]));
    let player = spawn_player(&mut app, Cell::new(0, 0), 4);

    let target = screen_px(&app, Cell::new(10, 10));
    app.world_mut().write_message(MoveCommand { entity: player, target });
    let ticks = tick_until_idle(&mut app, 10);

    assert_eq!(ticks, 1);
    assert_eq!(app.world().get::<SimPosition>(player).unwrap().0, FixedVec2::ZERO);
    assert_eq!(ended_messages(&app), vec![MovementEnded { entity: player, arrived: false }]);
}

#[test]
fn test_camera_follows_walking_player() {
    // 1600x1600 map on an 800x600 canvas
    let mut app = setup_app(tile_map(100, 100, &[]));
    let player = spawn_player(&mut app, Cell::new(10, 10), 4);

    let target = screen_px(&app, Cell::new(60, 70));
    app.world_mut().write_message(MoveCommand { entity: player, target });

    for _ in 0..5000 {
        app.world_mut().run_schedule(FixedUpdate);

        let viewport = *app.world().resource::<Viewport>();
        let sim = app.world().get::<SimPosition>(player).unwrap().0;
        let display = app.world().get::<DisplayPosition>(player).unwrap().0;
        assert_eq!(display, viewport.world_to_screen(sim));
        assert!(viewport.offset.x <= FixedNum::ZERO && viewport.offset.y <= FixedNum::ZERO);
        assert!(viewport.offset.x + viewport.map_size.x >= viewport.canvas_size.x);
        assert!(viewport.offset.y + viewport.map_size.y >= viewport.canvas_size.y);

        if app.world().resource::<MovementController>().is_idle() {
            break;
        }
    }

    assert_eq!(app.world().get::<SimPosition>(player).unwrap().0, FixedVec2::from_int(960, 1120));
    let viewport = app.world().resource::<Viewport>();
    assert!(viewport.offset.x < FixedNum::ZERO);
    assert!(viewport.offset.y < FixedNum::ZERO);
}

#[test]
fn test_map_reload_resets_movement() {
    let mut app = setup_app(tile_map(100, 100, &[]));
    let player = spawn_player(&mut app, Cell::new(10, 10), 4);

    let target = screen_px(&app, Cell::new(90, 90));
    app.world_mut().write_message(MoveCommand { entity: player, target });
    for _ in 0..40 {
        app.world_mut().run_schedule(FixedUpdate);
    }
    assert!(!app.world().resource::<MovementController>().is_idle());

    app.world_mut().insert_resource(ActiveMap(tile_map(30, 30, &[])));
    app.update();

    assert!(app.world().resource::<MovementController>().is_idle());
    assert!(!app.world().resource::<TurnState>().in_progress);
    let viewport = app.world().resource::<Viewport>();
    assert_eq!(viewport.offset, FixedVec2::ZERO);
    assert_eq!(viewport.map_size, FixedVec2::from_int(480, 480));
    assert_eq!(app.world().resource::<FogOfWar>().revealed_count(), 0);
}

#[test]
fn test_non_positive_speeds_fall_back_to_defaults() {
    let mut app = setup_app_with(tile_map(20, 20, &[]), InitialConfig {
        map_path: String::new(),
        map_move_speed: -2.0,
        player_move_speed: 0.0,
        ..default()
    });

    let sim_config = app.world().resource::<SimConfig>();
    assert_eq!(sim_config.player_move_speed, FixedNum::from_num(4));
    assert_eq!(sim_config.map_move_speed, FixedNum::from_num(8));

    // No MoveSpeed of its own, so the configured player speed applies
    let position = FixedVec2::from_int(16, 16);
    let player = app.world_mut().spawn((SimPosition(position), DisplayPosition(position), Tracked)).id();
    let target = screen_px(&app, Cell::new(4, 1));
    app.world_mut().write_message(MoveCommand { entity: player, target });

    tick_until_idle(&mut app, 100);
    assert_eq!(app.world().get::<SimPosition>(player).unwrap().0, FixedVec2::from_int(64, 16));
}

#[test]
fn test_stationary_mover_order_is_rejected() {
    let mut app = setup_app(tile_map(20, 20, &[]));
    let player = spawn_player(&mut app, Cell::new(1, 1), 0);

    let target = screen_px(&app, Cell::new(4, 1));
    app.world_mut().write_message(MoveCommand { entity: player, target });
    app.world_mut().run_schedule(FixedUpdate);

    assert!(app.world().resource::<MovementController>().is_idle());
    assert!(!app.world().resource::<TurnState>().in_progress);
    assert_eq!(ended_messages(&app), vec![MovementEnded { entity: player, arrived: false }]);
}
