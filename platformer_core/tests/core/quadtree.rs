use platformer_core::quadtree::MAX_OBJECTS;
use platformer_core::{Quadtree, Rect};
use proptest::prelude::*;

fn boxes() -> impl Strategy<Value = Vec<Rect>> {
    prop::collection::vec(
        // Reaches past every edge of the 640x480 root.
        (-200.0f32..820.0, -200.0f32..660.0, 1.0f32..20.0, 1.0f32..20.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h)),
        0..120,
    )
}

proptest! {
    #[test]
    fn retrieve_finds_every_overlapping_entry(rects in boxes(), query in boxes()) {
        let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 640.0, 480.0));
        for (i, r) in rects.iter().enumerate() {
            tree.insert(*r, i);
        }
        prop_assert_eq!(tree.len(), rects.len());

        let mut out = Vec::new();
        for q in &query {
            out.clear();
            tree.retrieve(&mut out, q);
            for (i, r) in rects.iter().enumerate() {
                if r.intersects(q) {
                    prop_assert!(out.iter().any(|e| e.payload == i));
                }
            }
        }
    }
}

#[test]
fn one_overflow_causes_one_split() {
    let mut tree = Quadtree::new(Rect::new(0.0, 0.0, 640.0, 480.0));
    for i in 0..=MAX_OBJECTS {
        let quadrant_x = if i % 2 == 0 { 20.0 } else { 400.0 };
        let quadrant_y = if i % 4 < 2 { 20.0 } else { 300.0 };
        tree.insert(Rect::new(quadrant_x + i as f32 * 10.0, quadrant_y, 5.0, 5.0), i);
    }
    assert_eq!(tree.node_count(), 5);
    assert!(tree.root_entries().is_empty());
}
