use std::collections::HashSet;

use platformer_core::{EntityId, Position, Size, Velocity, World};
use proptest::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Tag(u8);

proptest! {
    #[test]
    fn get_after_add_returns_value(values in prop::collection::vec(any::<i32>(), 1..50)) {
        let mut world = World::new();
        let ids: Vec<EntityId> = values.iter().map(|_| world.create_entity()).collect();
        for (id, v) in ids.iter().zip(&values) {
            world.add(*id, Position::new(*v as f32, 0.0));
        }
        for (id, v) in ids.iter().zip(&values) {
            prop_assert!(world.has::<Position>(*id));
            prop_assert_eq!(world.get::<Position>(*id), Some(&Position::new(*v as f32, 0.0)));
        }
        for id in &ids {
            prop_assert!(world.remove::<Position>(*id).is_some());
            prop_assert!(!world.has::<Position>(*id));
        }
    }

    #[test]
    fn multi_query_equals_intersection(
        membership in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 0..60)
    ) {
        let mut world = World::new();
        let mut with_pos = HashSet::new();
        let mut with_vel = HashSet::new();
        let mut with_size = HashSet::new();
        for (p, v, s) in &membership {
            let e = world.create_entity();
            if *p { world.add(e, Position::default()); with_pos.insert(e); }
            if *v { world.add(e, Velocity::default()); with_vel.insert(e); }
            if *s { world.add(e, Size::default()); with_size.insert(e); }
        }

        let mut out = Vec::new();
        world.query_into::<(Position, Velocity, Size)>(&mut out);
        let got: HashSet<EntityId> = out.iter().copied().collect();
        prop_assert_eq!(got.len(), out.len(), "query returned duplicates");

        let expected: HashSet<EntityId> = with_pos
            .iter()
            .filter(|e| with_vel.contains(e) && with_size.contains(e))
            .copied()
            .collect();
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn ids_are_unique_until_clear(count in 1usize..200) {
        let mut world = World::new();
        let ids: HashSet<EntityId> = (0..count).map(|_| world.create_entity()).collect();
        prop_assert_eq!(ids.len(), count);
        prop_assert!(!ids.contains(&EntityId::NONE));
    }
}

#[test]
fn query_with_empty_type_is_empty() {
    let mut world = World::new();
    for _ in 0..10 {
        let e = world.create_entity();
        world.add(e, Position::default());
    }
    let mut out = Vec::new();
    world.query_into::<(Position, Tag)>(&mut out);
    assert!(out.is_empty());
}

#[test]
fn clear_twice_matches_clear_once() {
    let mut once = World::new();
    let mut twice = World::new();
    for world in [&mut once, &mut twice] {
        let e = world.create_entity();
        world.add(e, Tag(1));
        world.add(e, Position::default());
    }
    once.clear();
    twice.clear();
    twice.clear();

    assert_eq!(once.len(), twice.len());
    assert_eq!(once.query::<Tag>().len(), twice.query::<Tag>().len());
    assert_eq!(once.create_entity(), twice.create_entity());
}
