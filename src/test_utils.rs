use crate::map::{GridCity, Position};

// Helper function to setup tracing
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init();
}

/// Every waypoint is free of static obstacles and consecutive waypoints are
/// one axis-aligned move apart.
pub fn assert_valid_path(city: &GridCity, path: &[Position]) {
    for &position in path {
        assert!(
            city.is_passable(position),
            "{position:?} is blocked in {path:?}"
        );
    }
    for pair in path.windows(2) {
        let distance = pair[0].0.abs_diff(pair[1].0) + pair[0].1.abs_diff(pair[1].1);
        assert_eq!(distance, 1, "{:?} -> {:?} is not a unit move", pair[0], pair[1]);
    }
}
