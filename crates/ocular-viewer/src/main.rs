//! Ocular Viewer - Bevy-based visualization of the eye exam

use bevy::prelude::*;
use ocular_core::commands::Command;
use ocular_core::config::{load_tuning, Tuning};
use ocular_core::components::CardRig;
use ocular_core::engine::ExamEngine;
use ocular_logic::blend_shapes::{BlendShape, BlendShapeSink};
use ocular_logic::cadence::PatientProfile;
use ocular_logic::dropper::DropperState;
use ocular_logic::judgement::{StampState, Verdict};
use ocular_logic::motion::MotionState;
use ocular_logic::playback::TwitchDegree;
use ocular_logic::tween::Pose;

const TUNING_PATH: &str = "data/eyeball_tuning.json";

const EYE_POSITION: Vec3 = Vec3::new(0.0, 1.4, 0.0);
const TRAY_POSITION: Vec3 = Vec3::new(0.35, 1.1, 0.25);
const CARD_REST: Vec3 = Vec3::new(-0.45, 1.05, 0.3);
const CARD_ZOOMED: Vec3 = Vec3::new(-0.12, 1.4, 0.7);

fn main() {
    let tuning = match load_tuning(TUNING_PATH) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Using default tuning, could not load {}: {}", TUNING_PATH, e);
            Tuning::default()
        }
    };

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Ocular - Eye Exam".to_string(),
                resolution: (1280.0, 720.0).into(),
                present_mode: bevy::window::PresentMode::AutoVsync,
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ExamWrapper(ExamEngine::with_tuning(tuning, 7)))
        .insert_resource(ViewerConfig::default())
        .insert_resource(AmbientLight {
            color: Color::WHITE,
            brightness: 80.0,
        })
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                handle_input,
                update_exam,
                sync_eye,
                sync_pupil,
                sync_speculum,
                sync_lamp,
                sync_card,
                update_hud,
            )
                .chain(),
        )
        .run();
}

#[derive(Resource)]
struct ExamWrapper(ExamEngine);

/// Engine entities the viewer mirrors.
#[derive(Resource)]
struct ExamHandles {
    eye: hecs::Entity,
    speculum: hecs::Entity,
    lamp: hecs::Entity,
    card: hecs::Entity,
    dropper: hecs::Entity,
    stamp: hecs::Entity,
}

#[derive(Resource)]
struct ViewerConfig {
    time_scale: f32,
    tracking: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            tracking: false,
        }
    }
}

// Marker components for mirrored scene objects
#[derive(Component)]
struct CarrierView;

#[derive(Component)]
struct EyeballView;

#[derive(Component)]
struct SpeculumView;

#[derive(Component)]
struct LampView;

#[derive(Component)]
struct BulbView(Handle<StandardMaterial>);

#[derive(Component)]
struct PupilView;

#[derive(Component)]
struct CardView;

#[derive(Component)]
struct HudText;

fn setup(
    mut commands: Commands,
    mut sim: ResMut<ExamWrapper>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let profile = PatientProfile {
        infected: true,
        twitch_degree: TwitchDegree::Medium,
        will_dilate: false,
        people_killed: 17,
        ..PatientProfile::default()
    };
    let eye = sim
        .0
        .spawn_eyeball(Pose::new(EYE_POSITION, Quat::IDENTITY), Quat::IDENTITY, profile);
    let Some(speculum) = sim.0.spawn_speculum(eye) else {
        error!("Speculum could not be linked to the eye");
        return;
    };
    let lamp = sim.0.spawn_lamp();
    let card_rest = Pose::new(CARD_REST, Quat::from_rotation_x(-1.2));
    let card = sim.0.spawn_prop("id_card", card_rest);
    let rig = CardRig {
        card,
        rest: card_rest,
        inspect: Pose::new(CARD_ZOOMED, Quat::IDENTITY),
        duration: 0.35,
    };
    let (Some(dropper), Some(stamp)) = (sim.0.spawn_dropper(eye), sim.0.spawn_stamp(eye, Some(rig)))
    else {
        error!("Exam tools could not be linked to the eye");
        return;
    };
    commands.insert_resource(ExamHandles {
        eye,
        speculum,
        lamp,
        card,
        dropper,
        stamp,
    });

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.45, 1.1).looking_at(EYE_POSITION, Vec3::Y),
    ));

    // Eyeball: a breathing carrier with the rotating eye inside it
    let sclera = materials.add(StandardMaterial {
        base_color: Color::srgb(0.95, 0.92, 0.88),
        perceptual_roughness: 0.3,
        ..default()
    });
    let iris = materials.add(StandardMaterial {
        base_color: Color::srgb(0.25, 0.45, 0.3),
        ..default()
    });
    let pupil = materials.add(StandardMaterial {
        base_color: Color::srgb(0.02, 0.02, 0.02),
        ..default()
    });
    commands
        .spawn((CarrierView, Transform::from_translation(EYE_POSITION), Visibility::default()))
        .with_children(|carrier| {
            carrier
                .spawn((
                    EyeballView,
                    Mesh3d(meshes.add(Sphere::new(0.12))),
                    MeshMaterial3d(sclera),
                    Transform::default(),
                ))
                .with_children(|eyeball| {
                    eyeball.spawn((
                        Mesh3d(meshes.add(Sphere::new(0.05))),
                        MeshMaterial3d(iris),
                        Transform::from_xyz(0.0, 0.0, 0.1),
                    ));
                    eyeball.spawn((
                        PupilView,
                        Mesh3d(meshes.add(Sphere::new(0.022))),
                        MeshMaterial3d(pupil),
                        Transform::from_xyz(0.0, 0.0, 0.142),
                    ));
                });
        });

    commands.spawn((
        SpeculumView,
        Mesh3d(meshes.add(Torus::new(0.1, 0.13))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.7, 0.72, 0.75),
            metallic: 0.9,
            perceptual_roughness: 0.2,
            ..default()
        })),
        Transform::from_translation(TRAY_POSITION),
    ));

    let bulb = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.95, 0.8),
        emissive: LinearRgba::rgb(2.0, 1.9, 1.6),
        ..default()
    });
    commands
        .spawn((
            LampView,
            PointLight {
                intensity: 200_000.0,
                shadows_enabled: true,
                ..default()
            },
            Transform::from_xyz(0.0, 2.3, 0.4),
        ))
        .with_children(|lamp| {
            lamp.spawn((
                BulbView(bulb.clone()),
                Mesh3d(meshes.add(Sphere::new(0.04))),
                MeshMaterial3d(bulb),
                Transform::default(),
            ));
        });

    commands.spawn((
        CardView,
        Mesh3d(meshes.add(Cuboid::new(0.17, 0.11, 0.004))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.85, 0.8, 0.65),
            ..default()
        })),
        Transform::from_translation(CARD_REST),
    ));

    commands.spawn((
        Text::new(""),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgba(0.9, 0.9, 0.9, 0.9)),
        Node {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        },
        HudText,
    ));

    info!("Exam room ready: eye {:?}, speculum {:?}", eye, speculum);
}

fn handle_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    handles: Option<Res<ExamHandles>>,
    mut config: ResMut<ViewerConfig>,
    mut sim: ResMut<ExamWrapper>,
) {
    let Some(h) = handles else {
        return;
    };
    let engine = &mut sim.0;

    // Motion states: A agitated, I idle, T toggles tracking the camera
    if keyboard.just_pressed(KeyCode::KeyA) {
        engine.push(h.eye, Command::SetMotionState(MotionState::Agitated));
    }
    if keyboard.just_pressed(KeyCode::KeyI) {
        engine.push(h.eye, Command::SetMotionState(MotionState::Idling));
    }
    if keyboard.just_pressed(KeyCode::KeyT) {
        config.tracking = !config.tracking;
        if config.tracking {
            engine.push(h.eye, Command::SetTrackingTarget(Some(Vec3::new(0.0, 1.45, 1.1))));
            engine.push(h.eye, Command::SetMotionState(MotionState::Tracking));
        } else {
            engine.push(h.eye, Command::SetTrackingTarget(None));
            engine.push(h.eye, Command::SetMotionState(MotionState::Idling));
        }
    }

    // Eyelids: B blink, 1-3 twitch
    if keyboard.just_pressed(KeyCode::KeyB) {
        engine.push(h.eye, Command::Blink);
    }
    for (key, degree) in [
        (KeyCode::Digit1, TwitchDegree::Small),
        (KeyCode::Digit2, TwitchDegree::Medium),
        (KeyCode::Digit3, TwitchDegree::Large),
    ] {
        if keyboard.just_pressed(key) {
            engine.push(h.eye, Command::Twitch(degree));
        }
    }

    // Breath: P pause, R resume
    if keyboard.just_pressed(KeyCode::KeyP) {
        engine.push(h.eye, Command::PauseBreathing);
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        engine.push(h.eye, Command::ResumeBreathing);
    }

    // Speculum: E pick up, Q put down, hold Space to squeeze
    if keyboard.just_pressed(KeyCode::KeyE) {
        engine.push(h.speculum, Command::SpeculumPickedUp);
    }
    if keyboard.just_pressed(KeyCode::KeyQ) {
        engine.push(h.speculum, Command::SpeculumPutDown);
    }
    if keyboard.just_pressed(KeyCode::Space) {
        engine.push(h.speculum, Command::SpeculumTrigger(1.0));
        engine.push(h.speculum, Command::SpeculumPullStarted);
    }
    if keyboard.just_released(KeyCode::Space) {
        engine.push(h.speculum, Command::SpeculumTrigger(0.0));
        engine.push(h.speculum, Command::SpeculumPullEnded);
    }

    // Dropper: D picks up or puts down, F squeezes a drop
    if keyboard.just_pressed(KeyCode::KeyD) {
        let command = match engine.dropper_state(h.dropper) {
            Some(DropperState::OnTray) => Command::DropperPickedUp,
            _ => Command::DropperPutDown,
        };
        engine.push(h.dropper, command);
    }
    if keyboard.just_pressed(KeyCode::KeyF) {
        engine.push(h.dropper, Command::DropperSqueezed);
    }

    // Stamp: J lifts or rests it (the ID card follows), Y accepts, N marks infected
    if keyboard.just_pressed(KeyCode::KeyJ) {
        let command = match engine.stamp_state(h.stamp) {
            Some(StampState::Lifted) => Command::StampRested,
            _ => Command::StampLifted,
        };
        engine.push(h.stamp, command);
    }
    if keyboard.just_pressed(KeyCode::KeyY) {
        engine.push(h.stamp, Command::Judge(Verdict::Accepted));
    }
    if keyboard.just_pressed(KeyCode::KeyN) {
        engine.push(h.stamp, Command::Judge(Verdict::Infected));
    }

    // Time scale controls: +/= to speed up, - to slow down, 0 to pause/resume
    if keyboard.just_pressed(KeyCode::Equal) || keyboard.just_pressed(KeyCode::NumpadAdd) {
        config.time_scale = (config.time_scale * 2.0).min(8.0);
    }
    if keyboard.just_pressed(KeyCode::Minus) || keyboard.just_pressed(KeyCode::NumpadSubtract) {
        config.time_scale = (config.time_scale / 2.0).max(0.125);
    }
    if keyboard.just_pressed(KeyCode::Digit0) || keyboard.just_pressed(KeyCode::Numpad0) {
        config.time_scale = if config.time_scale > 0.0 { 0.0 } else { 1.0 };
    }
}

fn update_exam(time: Res<Time>, config: Res<ViewerConfig>, mut sim: ResMut<ExamWrapper>) {
    sim.0.set_time_scale(config.time_scale);
    sim.0.update(time.delta_secs());
}

/// Blend-shape weights collected for display and for the eyelid stand-in.
#[derive(Default)]
struct WeightReadout {
    weights: [f32; BlendShape::COUNT],
}

impl BlendShapeSink for WeightReadout {
    fn set_blend_shape_weight(&mut self, index: usize, weight: f32) {
        if let Some(slot) = self.weights.get_mut(index) {
            *slot = weight;
        }
    }
}

impl WeightReadout {
    fn get(&self, shape: BlendShape) -> f32 {
        self.weights[shape.index()]
    }

    /// Vertical squash of the eyeball: closes for blinks and twitches,
    /// stretches while held open.
    fn lid_scale(&self) -> f32 {
        let closed = self.get(BlendShape::Blink).max(self.get(BlendShape::Twitch) * 0.6) / 100.0;
        let held_open = self.get(BlendShape::Open) / 100.0;
        (1.0 - 0.85 * closed + 0.15 * held_open).max(0.1)
    }
}

fn sync_eye(
    sim: Res<ExamWrapper>,
    handles: Option<Res<ExamHandles>>,
    mut carriers: Query<&mut Transform, (With<CarrierView>, Without<EyeballView>)>,
    mut eyeballs: Query<&mut Transform, (With<EyeballView>, Without<CarrierView>)>,
) {
    let Some(h) = handles else {
        return;
    };
    if let Some(pose) = sim.0.carrier_pose(h.eye) {
        for mut transform in &mut carriers {
            transform.translation = pose.position;
            transform.rotation = pose.rotation;
        }
    }

    let mut readout = WeightReadout::default();
    if !sim.0.write_blend_shapes(h.eye, &mut readout) {
        return;
    }
    if let Some(rotation) = sim.0.eye_rotation(h.eye) {
        for mut transform in &mut eyeballs {
            transform.rotation = rotation;
            transform.scale = Vec3::new(1.0, readout.lid_scale(), 1.0);
        }
    }
}

fn sync_pupil(
    sim: Res<ExamWrapper>,
    handles: Option<Res<ExamHandles>>,
    mut query: Query<&mut Transform, With<PupilView>>,
) {
    let Some(h) = handles else {
        return;
    };
    let dilation = sim.0.pupil_dilation(h.eye).unwrap_or(0.0);
    for mut transform in &mut query {
        transform.scale = Vec3::new(1.0 + dilation * 1.2, 1.0 + dilation * 1.2, 1.0);
    }
}

fn sync_speculum(
    sim: Res<ExamWrapper>,
    handles: Option<Res<ExamHandles>>,
    mut query: Query<&mut Transform, With<SpeculumView>>,
) {
    let Some(h) = handles else {
        return;
    };
    let Some(speculum) = sim.0.speculum(h.speculum) else {
        return;
    };
    let duration = sim.0.tuning().speculum.placement_duration.max(f32::EPSILON);
    let t = (speculum.clip_time() / duration).clamp(0.0, 1.0);
    let seated = EYE_POSITION + Vec3::new(0.0, 0.0, 0.13);
    for mut transform in &mut query {
        transform.translation = TRAY_POSITION.lerp(seated, t);
        transform.scale = Vec3::splat(1.0 + speculum.weight() * 0.003);
    }
}

fn sync_lamp(
    sim: Res<ExamWrapper>,
    handles: Option<Res<ExamHandles>>,
    mut lights: Query<&mut PointLight, With<LampView>>,
    bulbs: Query<&BulbView>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(h) = handles else {
        return;
    };
    let Some(lamp) = sim.0.lamp(h.lamp) else {
        return;
    };
    let on = lamp.light.is_enabled();
    for mut light in &mut lights {
        light.intensity = if on {
            lamp.light.intensity() * 125_000.0
        } else {
            0.0
        };
    }
    let e = if on { lamp.light.emission() } else { 0.0 };
    for bulb in &bulbs {
        if let Some(material) = materials.get_mut(&bulb.0) {
            material.emissive = LinearRgba::rgb(e, e * 0.95, e * 0.8);
        }
    }
    if lamp.signals.zap {
        debug!("Lamp zap");
    }
}

fn sync_card(
    sim: Res<ExamWrapper>,
    handles: Option<Res<ExamHandles>>,
    mut query: Query<&mut Transform, With<CardView>>,
) {
    let Some(h) = handles else {
        return;
    };
    if let Some(pose) = sim.0.prop_pose(h.card) {
        for mut transform in &mut query {
            transform.translation = pose.position;
            transform.rotation = pose.rotation;
        }
    }
}

fn update_hud(
    sim: Res<ExamWrapper>,
    handles: Option<Res<ExamHandles>>,
    config: Res<ViewerConfig>,
    mut query: Query<&mut Text, With<HudText>>,
) {
    let Some(h) = handles else {
        return;
    };
    let mut readout = WeightReadout::default();
    sim.0.write_blend_shapes(h.eye, &mut readout);

    let state = sim
        .0
        .motion_state(h.eye)
        .map(|s| s.name())
        .unwrap_or("-");
    let speculum = sim
        .0
        .speculum_state(h.speculum)
        .map(|s| format!("{:?}", s))
        .unwrap_or_default();

    let dropper = sim
        .0
        .dropper_state(h.dropper)
        .map(|s| format!("{:?}", s))
        .unwrap_or_default();
    let dilation = sim.0.pupil_dilation(h.eye).unwrap_or(0.0);

    let mut lines = vec![
        format!("t = {:.1}s  x{:.2}", sim.0.elapsed(), config.time_scale),
        format!("motion: {}   speculum: {}", state, speculum),
        format!("dropper: {}   pupil: {:.2}", dropper, dilation),
    ];
    if let Some(tally) = sim.0.tally(h.stamp) {
        lines.push(format!(
            "population: {}   killed: {}   infected let in: {}",
            tally.population, tally.patients_killed, tally.infected_accepted
        ));
    }
    for shape in BlendShape::ALL {
        lines.push(format!("{:>7}: {:6.1}", shape.name(), readout.get(shape)));
    }
    lines.push(String::new());
    lines.push("A agitate  I idle  T track  B blink  1-3 twitch  P/R breath".into());
    lines.push("E pick up  Q put down  Space squeeze  D dropper  F drip".into());
    lines.push("J stamp  Y accept  N infected  +/-/0 speed".into());

    for mut text in &mut query {
        text.0 = lines.join("\n");
    }
}
