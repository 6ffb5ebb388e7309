use asymsim::{Circle, NVec2, QuadPoint, Rect, SpatialIndex};

/// Deterministic scatter over [0, 100)^2 with a few exact duplicates
pub fn scatter(n: usize) -> Vec<QuadPoint> {
    let mut points: Vec<QuadPoint> = (0..n)
        .map(|i| {
            let i_f = i as f64;
            let x = 50.0 + (i_f * 1.7).sin() * 49.0;
            let y = 50.0 + (i_f * 0.61).cos() * 49.0;
            QuadPoint::new(NVec2::new(x, y), i)
        })
        .collect();

    // a dense clump to exercise the depth limit
    for k in 0..12 {
        points.push(QuadPoint::new(NVec2::new(25.0, 75.0), n + k));
    }
    points
}

fn sorted_indices(points: &[QuadPoint]) -> Vec<usize> {
    let mut idx: Vec<usize> = points.iter().map(|p| p.index).collect();
    idx.sort_unstable();
    idx
}

fn world() -> Rect {
    Rect::new(0.0, 0.0, 100.0, 100.0)
}

// ==================================================================================
// Rect / Circle
// ==================================================================================

#[test]
fn rect_contains_is_half_open() {
    let r = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(r.contains(&NVec2::new(0.0, 0.0)));
    assert!(r.contains(&NVec2::new(9.999, 5.0)));
    assert!(!r.contains(&NVec2::new(10.0, 5.0)));
    assert!(!r.contains(&NVec2::new(5.0, 10.0)));
}

#[test]
fn rect_intersects_touching_edges() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    assert!(a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
    assert!(a.intersects(&Rect::new(2.0, 2.0, 1.0, 1.0)));
    assert!(!a.intersects(&Rect::new(10.5, 0.0, 5.0, 5.0)));
}

#[test]
fn circle_boundary_included() {
    let c = Circle::new(NVec2::new(0.0, 0.0), 5.0);
    assert!(c.contains(&NVec2::new(3.0, 4.0)));
    assert!(!c.contains(&NVec2::new(3.0, 4.1)));
    assert_eq!(c.bounding_rect(), Rect::new(-5.0, -5.0, 10.0, 10.0));
}

// ==================================================================================
// Build
// ==================================================================================

#[test]
fn points_outside_root_are_rejected() {
    let mut index = SpatialIndex::new(world(), 4, 6);
    assert!(!index.insert(QuadPoint::new(NVec2::new(100.0, 50.0), 0)));
    assert!(!index.insert(QuadPoint::new(NVec2::new(-0.1, 50.0), 1)));
    assert!(index.insert(QuadPoint::new(NVec2::new(0.0, 0.0), 2)));
    assert_eq!(index.len(), 1);
}

#[test]
fn rebuild_counts_stored_points() {
    let mut index = SpatialIndex::new(world(), 4, 6);
    let mut points = scatter(50);
    points.push(QuadPoint::new(NVec2::new(500.0, 500.0), 999));

    let stored = index.rebuild(points.clone());
    assert_eq!(stored, points.len() - 1);
    assert_eq!(index.len(), stored);

    // a second rebuild starts from scratch
    assert_eq!(index.rebuild(points.into_iter().take(10)), 10);
    assert_eq!(index.len(), 10);
}

#[test]
fn leaves_respect_capacity_unless_at_max_depth() {
    for (capacity, max_depth) in [(1, 3), (2, 8), (4, 5), (8, 10)] {
        let mut index = SpatialIndex::new(world(), capacity, max_depth);
        index.rebuild(scatter(200));

        let mut total = 0;
        for node in index.nodes() {
            assert!(node.depth <= max_depth);
            match node.children {
                Some(_) => assert!(node.entries.is_empty(), "internal node holds entries"),
                None => {
                    assert!(
                        node.entries.len() <= capacity || node.depth == max_depth,
                        "leaf at depth {} holds {} (cap {capacity})",
                        node.depth,
                        node.entries.len()
                    );
                    for e in &node.entries {
                        assert!(node.bounds.contains(&e.pos));
                    }
                    total += node.entries.len();
                }
            }
        }
        assert_eq!(total, index.len());
    }
}

#[test]
fn depth_zero_never_splits() {
    let mut index = SpatialIndex::new(world(), 1, 0);
    index.rebuild(scatter(30));
    assert_eq!(index.node_count(), 1);
    assert_eq!(index.depth(), 0);
    assert_eq!(index.len(), 42);
}

// ==================================================================================
// Queries
// ==================================================================================

#[test]
fn query_rect_matches_brute_force() {
    let points = scatter(300);
    let ranges = [
        Rect::new(0.0, 0.0, 100.0, 100.0),
        Rect::new(10.0, 20.0, 30.0, 15.0),
        Rect::new(25.0, 75.0, 0.5, 0.5),
        Rect::new(49.0, 49.0, 2.0, 2.0),
        Rect::new(-20.0, -20.0, 30.0, 30.0),
        Rect::new(90.0, 0.0, 40.0, 100.0),
    ];

    for (capacity, max_depth) in [(1, 2), (1, 12), (3, 4), (8, 10), (64, 1)] {
        let mut index = SpatialIndex::new(world(), capacity, max_depth);
        index.rebuild(points.clone());

        for range in &ranges {
            let expected: Vec<QuadPoint> = points.iter().copied().filter(|p| range.contains(&p.pos)).collect();
            let got = index.query_rect(range);
            assert_eq!(
                sorted_indices(&got),
                sorted_indices(&expected),
                "cap {capacity} depth {max_depth} range {range:?}"
            );
        }
    }
}

#[test]
fn query_circle_matches_brute_force() {
    let points = scatter(300);
    let mut index = SpatialIndex::new(world(), 4, 8);
    index.rebuild(points.clone());

    for (cx, cy, r) in [(50.0, 50.0, 10.0), (25.0, 75.0, 0.0), (0.0, 0.0, 30.0), (99.0, 10.0, 5.5)] {
        let circle = Circle::new(NVec2::new(cx, cy), r);
        let expected: Vec<QuadPoint> = points.iter().copied().filter(|p| circle.contains(&p.pos)).collect();
        assert_eq!(sorted_indices(&index.query_circle(&circle)), sorted_indices(&expected));
    }
}

#[test]
fn query_prunes_far_nodes() {
    let mut index = SpatialIndex::new(world(), 2, 8);
    index.rebuild(scatter(300));

    let mut out = Vec::new();
    let visited = index.query_rect_into(&Rect::new(1.0, 1.0, 2.0, 2.0), &mut out);
    assert!(visited < index.node_count());
}

#[test]
fn empty_index_queries() {
    let index = SpatialIndex::new(world(), 4, 8);
    assert!(index.is_empty());
    assert!(index.query_rect(&world()).is_empty());
    assert!(index.k_nearest(NVec2::new(50.0, 50.0), 3, 100.0).is_empty());
}

#[test]
fn k_nearest_sorted_and_bounded() {
    let points = scatter(300);
    let mut index = SpatialIndex::new(world(), 4, 8);
    index.rebuild(points.clone());

    let target = NVec2::new(60.0, 40.0);
    let got = index.k_nearest(target, 5, 200.0);
    assert_eq!(got.len(), 5);

    let mut brute: Vec<f64> = points.iter().map(|p| (p.pos - target).norm()).collect();
    brute.sort_by(|a, b| a.total_cmp(b));

    for (k, p) in got.iter().enumerate() {
        let d = (p.pos - target).norm();
        assert!((d - brute[k]).abs() < 1e-12, "rank {k}: {d} vs {}", brute[k]);
    }

    // nothing closer than max_radius -> nothing returned
    let mut sparse = SpatialIndex::new(world(), 4, 8);
    sparse.rebuild([QuadPoint::new(NVec2::new(90.0, 90.0), 0)]);
    assert!(sparse.k_nearest(NVec2::new(10.0, 10.0), 1, 20.0).is_empty());
    assert_eq!(sparse.k_nearest(NVec2::new(10.0, 10.0), 3, 200.0).len(), 1);
}
