use platformer_core::entity_collision::resolve_entities;
use platformer_core::{
    Animation, AnimationClip, AnimationClips, AnimationState, CollisionConfig, CollisionInfo, Enemy,
    EntityId, EntityType, Patrol, PlayerController, Position, SimConfig, Simulation, Size, Sprite,
    TileGrid, Vec2, Velocity, World,
};

const TILE: f32 = 16.0;
const DT: f32 = 1.0 / 60.0;

fn level() -> TileGrid {
    TileGrid::from_rows(
        &[
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "#..................#",
            "####################",
        ],
        TILE,
    )
    .unwrap()
}

fn spawn(world: &mut World, kind: EntityType, x: f32, y: f32) -> EntityId {
    let e = world.create_entity();
    world.add(e, Position::new(x, y));
    world.add(e, Velocity::default());
    world.add(e, Size::new(12.0, 12.0));
    world.add(e, kind);
    world.add(e, CollisionInfo::default());
    world.add(e, Sprite::shape([1.0; 4], Vec2::new(12.0, 12.0)));
    world.add(e, Animation::new(2, 0.1));
    world.add(
        e,
        AnimationClips {
            idle: AnimationClip::new(2, 0.1, 12, 12),
            run: AnimationClip::new(4, 0.1, 12, 12).with_row(1),
            jump: AnimationClip::new(1, 0.1, 12, 12).with_row(2),
            celebrate: AnimationClip::new(3, 0.1, 12, 12).with_row(3),
        },
    );
    if kind.is_enemy() {
        world.add(e, Enemy);
    }
    e
}

#[test]
fn stomp_kills_enemy_and_celebrates_in_the_same_frame() {
    let mut sim = Simulation::new(level(), SimConfig::default());
    let floor_top = 5.0 * TILE;

    let world = sim.world_mut();
    let enemy = spawn(world, EntityType::Goomba, 100.0, floor_top - 12.0);
    world.add(enemy, Patrol::new(30.0));
    let player = spawn(world, EntityType::Player, 100.0, floor_top - 12.0 - 40.0);
    world.add(player, PlayerController::default());

    let mut stomped_on = None;
    for frame in 0..60 {
        let report = sim.tick(DT);
        if !report.stomps.is_empty() {
            assert_eq!(report.stomps[0].player, player);
            assert_eq!(report.stomps[0].enemy, enemy);
            stomped_on = Some(frame);
            // Animation ran after collision, so the queued celebration is already playing.
            let anim = sim.world().get::<Animation>(player).unwrap();
            assert_eq!(anim.state, AnimationState::Celebrate);
            assert_eq!(anim.one_shot_queue, 0);
            break;
        }
    }

    assert!(stomped_on.is_some(), "player never landed on the enemy");
    let world = sim.world();
    assert_eq!(world.component_count(enemy), 0);
    assert_eq!(world.get::<Velocity>(player).unwrap().vy, 0.0);
    assert_eq!(world.get::<Position>(player).unwrap().y, floor_top - 12.0);
    assert!(world.get::<PlayerController>(player).unwrap().grounded);
}

#[test]
fn side_contact_blocks_player_without_killing() {
    let mut sim = Simulation::new(level(), SimConfig::default());
    let floor_top = 5.0 * TILE;

    let world = sim.world_mut();
    let enemy = spawn(world, EntityType::Koopa, 150.0, floor_top - 12.0);
    let player = spawn(world, EntityType::Player, 100.0, floor_top - 12.0);
    world.add(
        player,
        PlayerController {
            move_axis: 1.0,
            ..Default::default()
        },
    );

    for _ in 0..60 {
        sim.tick(DT);
    }

    let world = sim.world();
    assert!(world.has::<Position>(enemy));
    let player_x = world.get::<Position>(player).unwrap().x;
    assert!(player_x + 12.0 <= 150.0 + 1e-3, "player at {player_x} overlaps the enemy");
    assert_eq!(world.get::<CollisionInfo>(enemy).unwrap().other_type, EntityType::Player);
}

#[test]
fn double_jump_then_landing_restores_jumps() {
    let mut sim = Simulation::new(level(), SimConfig::default());
    let floor_top = 5.0 * TILE;
    let player = spawn(sim.world_mut(), EntityType::Player, 60.0, floor_top - 12.0);
    sim.world_mut().add(player, PlayerController::default());

    sim.tick(DT);
    assert_eq!(sim.world().get::<PlayerController>(player).unwrap().jump_count, 0);

    for _ in 0..3 {
        sim.world_mut().get_mut::<PlayerController>(player).unwrap().jump_requested = true;
        sim.tick(DT);
    }
    let controller = sim.world().get::<PlayerController>(player).unwrap();
    assert_eq!(controller.jump_count, 2);
    assert!(!controller.grounded);

    for _ in 0..240 {
        sim.tick(DT);
    }
    let controller = sim.world().get::<PlayerController>(player).unwrap();
    assert!(controller.grounded);
    assert_eq!(controller.jump_count, 0);
    assert_eq!(sim.world().get::<Position>(player).unwrap().y, floor_top - 12.0);
}

#[test]
fn patrolling_enemy_turns_at_wall() {
    let mut sim = Simulation::new(level(), SimConfig::default());
    let floor_top = 5.0 * TILE;
    let enemy = spawn(sim.world_mut(), EntityType::Goomba, 40.0, floor_top - 12.0);
    sim.world_mut().add(enemy, Patrol::new(60.0));

    for _ in 0..120 {
        sim.tick(DT);
    }
    let world = sim.world();
    assert_eq!(world.get::<Patrol>(enemy).unwrap().direction, 1.0);
    assert!(world.get::<Position>(enemy).unwrap().x > TILE);
}

#[test]
fn enemy_cannot_shove_player_through_a_wall() {
    let mut sim = Simulation::new(level(), SimConfig::default());
    let floor_top = 5.0 * TILE;
    let flush = 19.0 * TILE - 12.0;

    let world = sim.world_mut();
    let player = spawn(world, EntityType::Player, flush, floor_top - 12.0);
    world.add(player, PlayerController::default());
    let enemy = spawn(world, EntityType::Goomba, flush - 60.0, floor_top - 12.0);
    world.add(
        enemy,
        Patrol {
            direction: 1.0,
            ..Patrol::new(60.0)
        },
    );

    let mut rightmost = f32::MIN;
    for _ in 0..180 {
        sim.tick(DT);
        rightmost = rightmost.max(sim.world().get::<Position>(player).unwrap().x);
    }
    assert!(rightmost <= flush + 1e-3, "player reached x = {rightmost}");
}

#[test]
fn contacts_above_the_level_are_detected() {
    let grid = level();
    let mut world = World::new();
    // Enough bodies inside the level to split the broadphase root.
    for i in 0..10 {
        let x = if i % 2 == 0 { 20.0 } else { 200.0 } + i as f32 * 14.0;
        spawn(&mut world, EntityType::Unknown, x, 60.0);
    }
    let a = spawn(&mut world, EntityType::Goomba, 150.0, -40.0);
    let b = spawn(&mut world, EntityType::Koopa, 161.0, -40.0);

    let report = resolve_entities(&mut world, &grid, &CollisionConfig::default(), DT);

    assert_eq!(report.contacts, 1);
    assert_eq!(world.get::<CollisionInfo>(a).unwrap().other_type, EntityType::Koopa);
    assert_eq!(world.get::<CollisionInfo>(b).unwrap().other_type, EntityType::Goomba);
}
