//! Firing Range - first-person character and weapon sandbox
//!
//! Drives the `controller` crate against Rapier physics and renders the result.

mod camera;
mod crosshair;
mod decals;
mod input;
mod physics;
mod states;
mod systems;
mod weapon_view;

use std::path::Path;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::transform::TransformSystems;
use bevy::window::WindowResolution;
use bevy_rapier3d::prelude::*;
use controller::{BindingTable, ControllerConfig, VisualModeContext, WeaponArchetype, WeaponLibrary};
use states::GameState;

/// Get the asset path - for bundled macOS apps, use path relative to executable
fn get_asset_path() -> String {
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let bundled_assets = exe_dir.join("assets");
            if bundled_assets.exists() {
                info!("Using bundled assets at: {:?}", bundled_assets);
                return bundled_assets.to_string_lossy().to_string();
            }
        }
    }
    // Under `cargo run` the working directory may be the workspace root
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        return Path::new(&manifest_dir).join("assets").to_string_lossy().to_string();
    }
    "assets".to_string()
}

/// Built-in weapons, overridden by `weapons.ron` when present
fn load_weapon_library(asset_path: &str) -> WeaponLibrary {
    let mut library = WeaponLibrary::builtin();
    let path = Path::new(asset_path).join("weapons.ron");
    if !path.exists() {
        info!("No {:?}; using built-in weapons", path);
        return library;
    }
    match WeaponLibrary::load_from_file(&path) {
        Ok(overrides) => {
            info!("Loaded {} weapon definitions from {:?}", overrides.len(), path);
            library.merge(overrides);
        }
        Err(e) => warn!("Ignoring weapon file: {e}"),
    }
    library
}

fn load_controller_config(asset_path: &str) -> ControllerConfig {
    let path = Path::new(asset_path).join("controller.ron");
    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) => {
            info!("Using default controller tuning ({:?}: {e})", path);
            return ControllerConfig::default();
        }
    };
    ControllerConfig::from_ron(&text).unwrap_or_else(|e| {
        warn!("{e}; using default controller tuning");
        ControllerConfig::default()
    })
}

fn main() {
    let asset_path = get_asset_path();

    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Firing Range".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: asset_path.clone(),
                ..default()
            }),
    );
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());

    app.init_state::<GameState>();

    let config = load_controller_config(&asset_path);
    app.insert_resource(BindingTable::defaults(config.aim_mode));
    app.insert_resource(systems::CharacterTuning(config));
    app.insert_resource(load_weapon_library(&asset_path));
    app.init_resource::<VisualModeContext>();
    app.init_resource::<input::InputState>();
    app.init_resource::<input::PendingIntents>();
    app.insert_resource(input::PendingEquip(Some(WeaponArchetype::Rifle.name().to_string())));
    app.init_resource::<decals::DecalRequests>();
    app.init_resource::<decals::DecalRing>();
    app.init_resource::<weapon_view::AmmoReadout>();

    app.add_systems(
        Startup,
        (
            systems::setup_rendering,
            systems::spawn_world,
            systems::spawn_player,
            systems::setup_wanderer_spawner,
            decals::setup_decal_assets,
            crosshair::spawn_crosshair,
            weapon_view::spawn_weapon_hud,
        ),
    );
    app.add_systems(OnEnter(GameState::Playing), input::grab_cursor);

    app.add_systems(Update, input::handle_pause);

    // Input -> intents -> controller, all before the physics step
    app.add_systems(
        Update,
        (
            input::handle_mouse_input,
            input::feed_weapon_sway,
            input::gather_intents,
            input::toggle_visual_mode,
            input::handle_weapon_switch,
            systems::apply_pending_equip,
            systems::drive_wanderers,
            systems::drive_character,
            decals::spawn_decals,
            systems::handle_target_deaths,
            systems::respawn_wanderer,
        )
            .chain()
            .after(input::handle_pause)
            .run_if(in_state(GameState::Playing)),
    );

    // View work reads the post-step velocity and must land before transforms propagate
    app.add_systems(
        PostUpdate,
        (
            weapon_view::animate_weapon,
            camera::update_camera,
            camera::update_camera_fov,
            crosshair::update_crosshair,
            weapon_view::update_weapon_hud,
        )
            .chain()
            .after(PhysicsSet::Writeback)
            .before(TransformSystems::Propagate)
            .run_if(in_state(GameState::Playing)),
    );

    info!("Starting firing range");
    app.run();
}
