//! Iterative leader-line relaxation.
//!
//! Anchors never move. Each label sits at the end of a leader line pointing
//! away from a reference centre; colliding labels have their leaders rotated
//! in opposite senses about the local vertical and extended, up to a cap.
//!
//! # Algorithm
//!
//! ```text
//! d_i = normalize(anchor_i - centre)          (fallback: local east)
//! L_i = base * (1 + amp*sin(freq*atan2(d.y, d.x)) + offsets[i % n])
//! p_i = anchor_i + d_i * L_i
//!
//! repeat up to max_iterations:
//!     pairs = { (i, j) : |p_i - p_j| < min_separation }
//!     if pairs is empty: stop
//!     for (i, j) in pairs:
//!         rotate d_i by +/-step, d_j by the opposite sense
//!         L_i, L_j *= extension_factor (capped)
//!         recompute p_i, p_j
//! ```
//!
//! Convergence is not guaranteed for dense clusters. Whatever still collides
//! after the cap is reported in [`DeclutterReport::residual_collisions`].

use super::config::DeclutterConfig;
use super::types::{AnchorPoint, LabelPlacement};
use crate::geometry::Cartesian3;

/// Outcome of a declutter pass, with diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclutterReport {
    /// One placement per anchor, in input order.
    pub placements: Vec<LabelPlacement>,
    /// Collision passes that adjusted at least one pair.
    pub iterations: u32,
    /// Pairs colliding at the start of each pass.
    pub collisions_per_iteration: Vec<usize>,
    /// Pair adjustments applied across all passes.
    pub adjustments: usize,
    /// Pairs still closer than the minimum separation when the pass ended.
    pub residual_collisions: usize,
}

impl DeclutterReport {
    /// Whether every pair ended up separated.
    pub fn converged(&self) -> bool {
        self.residual_collisions == 0
    }
}

/// Place one label per anchor.
///
/// Invalid configs are replaced by the defaults (with a warning).
pub fn declutter(
    anchors: &[AnchorPoint],
    reference_center: Cartesian3,
    config: &DeclutterConfig,
) -> Vec<LabelPlacement> {
    declutter_with_report(anchors, reference_center, config).placements
}

/// Place one label per anchor and report how the relaxation went.
pub fn declutter_with_report(
    anchors: &[AnchorPoint],
    reference_center: Cartesian3,
    config: &DeclutterConfig,
) -> DeclutterReport {
    let config = config.clone().validated();

    let ups: Vec<Cartesian3> = anchors
        .iter()
        .map(|a| config.vertical.up_at(a.position))
        .collect();

    let mut placements: Vec<LabelPlacement> = anchors
        .iter()
        .zip(&ups)
        .enumerate()
        .map(|(index, (anchor, up))| {
            let direction = initial_direction(anchor.position, reference_center, *up);
            let length = initial_leader_length(index, direction, &config);
            LabelPlacement::new(anchor, direction, length)
        })
        .collect();

    let mut report = DeclutterReport {
        placements: Vec::new(),
        iterations: 0,
        collisions_per_iteration: Vec::new(),
        adjustments: 0,
        residual_collisions: 0,
    };

    if anchors.len() < 2 {
        report.placements = placements;
        return report;
    }

    for pass in 0..config.max_iterations {
        let pairs = colliding_pairs(&placements, config.min_separation);
        report.collisions_per_iteration.push(pairs.len());
        if pairs.is_empty() {
            break;
        }

        tracing::debug!(pass, collisions = pairs.len(), "Declutter pass");
        report.iterations += 1;

        for (i, j) in pairs {
            separate_pair(&mut placements, &ups, i, j, &config);
            report.adjustments += 1;
        }
    }

    report.residual_collisions = colliding_pairs(&placements, config.min_separation).len();
    if report.residual_collisions > 0 {
        tracing::warn!(
            anchors = anchors.len(),
            residual = report.residual_collisions,
            iterations = report.iterations,
            min_separation = config.min_separation,
            "Labels still overlap after iteration cap"
        );
    } else {
        tracing::debug!(
            anchors = anchors.len(),
            iterations = report.iterations,
            adjustments = report.adjustments,
            "Declutter converged"
        );
    }

    report.placements = placements;
    report
}

/// Direction from the centre to the anchor, or local east when they coincide.
fn initial_direction(anchor: Cartesian3, center: Cartesian3, up: Cartesian3) -> Cartesian3 {
    (anchor - center)
        .normalize()
        .unwrap_or_else(|| fallback_direction(up))
}

/// Local east at a point with vertical `up`, or +X at the poles.
fn fallback_direction(up: Cartesian3) -> Cartesian3 {
    Cartesian3::UNIT_Z
        .cross(up)
        .normalize()
        .unwrap_or(Cartesian3::UNIT_X)
}

fn initial_leader_length(index: usize, direction: Cartesian3, config: &DeclutterConfig) -> f64 {
    let angle_variation = config.angle_variation_amplitude
        * (config.angle_variation_frequency * direction.azimuth()).sin();
    let index_variation = config.index_offsets[index % config.index_offsets.len()];

    let length = config.base_leader_length * (1.0 + angle_variation + index_variation);
    length.min(config.max_leader_length)
}

/// Unordered pairs (i < j) whose labels are closer than `min_separation`.
fn colliding_pairs(placements: &[LabelPlacement], min_separation: f64) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..placements.len() {
        for j in (i + 1)..placements.len() {
            if placements[i].position.distance(placements[j].position) < min_separation {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Rotate a colliding pair apart and extend both leaders.
///
/// Label `i` turns in whichever sense moves it away from label `j`; label `j`
/// turns the other way.
fn separate_pair(
    placements: &mut [LabelPlacement],
    ups: &[Cartesian3],
    i: usize,
    j: usize,
    config: &DeclutterConfig,
) {
    let towards_j = placements[j].position - placements[i].position;
    let tangent_i = ups[i].cross(placements[i].direction);
    let sense = if tangent_i.dot(towards_j) > 0.0 { -1.0 } else { 1.0 };
    let step = sense * config.angle_step_rad;

    for (index, angle) in [(i, step), (j, -step)] {
        let placement = &placements[index];
        let direction = rotate_direction(placement.direction, ups[index], angle);
        let length = extend_leader(placement.leader_length, config);
        placements[index].update(direction, length);
    }
}

fn rotate_direction(direction: Cartesian3, up: Cartesian3, angle: f64) -> Cartesian3 {
    direction
        .rotate_about(up, angle)
        .normalize()
        .unwrap_or(direction)
}

/// Grow a leader by the extension factor; a leader at the cap keeps its length.
fn extend_leader(length: f64, config: &DeclutterConfig) -> f64 {
    if length >= config.max_leader_length {
        length
    } else {
        (length * config.extension_factor).min(config.max_leader_length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Small local-frame config: labels 20 units out, 50 units apart.
    fn local_config() -> DeclutterConfig {
        DeclutterConfig::default()
            .with_base_leader_length(20.0)
            .with_min_separation(50.0)
            .with_max_leader_length(200.0)
            .with_fixed_vertical(Cartesian3::UNIT_Z)
    }

    fn anchors(points: &[(f64, f64, f64)]) -> Vec<AnchorPoint> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| AnchorPoint::new(i as u32, Cartesian3::new(x, y, z)))
            .collect()
    }

    fn min_pair_distance(placements: &[LabelPlacement]) -> f64 {
        let mut min = f64::INFINITY;
        for i in 0..placements.len() {
            for j in (i + 1)..placements.len() {
                min = min.min(placements[i].position.distance(placements[j].position));
            }
        }
        min
    }

    // ─────────────────────────────────────────────────────────────────────
    // Edge cases
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_empty_input() {
        let report = declutter_with_report(&[], Cartesian3::ZERO, &local_config());
        assert!(report.placements.is_empty());
        assert_eq!(report.iterations, 0);
        assert!(report.converged());
    }

    #[test]
    fn test_single_anchor_skips_collision_pass() {
        let input = anchors(&[(100.0, 0.0, 0.0)]);
        let report = declutter_with_report(&input, Cartesian3::ZERO, &local_config());

        assert_eq!(report.placements.len(), 1);
        assert!(report.collisions_per_iteration.is_empty());
        assert_eq!(report.adjustments, 0);

        let p = report.placements[0];
        assert_eq!(p.direction, Cartesian3::UNIT_X);
        assert_eq!(p.leader_length, 20.0);
        assert_eq!(p.position, Cartesian3::new(120.0, 0.0, 0.0));
    }

    #[test]
    fn test_anchor_at_center_points_east() {
        let anchor = Cartesian3::from_degrees(0.0, 0.0, 0.0);
        let input = vec![AnchorPoint::new(1, anchor)];
        let placements = declutter(&input, anchor, &DeclutterConfig::default());

        // At (lon 0, lat 0) up is +X and east is +Y.
        assert!(placements[0].direction.distance(Cartesian3::UNIT_Y) < 1e-12);
        assert!(placements[0].position.x.is_finite());
    }

    #[test]
    fn test_anchor_at_center_on_axis_uses_x() {
        let input = anchors(&[(0.0, 0.0, 0.0)]);
        let placements = declutter(&input, Cartesian3::ZERO, &local_config());
        assert_eq!(placements[0].direction, Cartesian3::UNIT_X);
    }

    #[test]
    fn test_coincident_anchors_are_pulled_apart() {
        let input = anchors(&[(100.0, 0.0, 0.0), (100.0, 0.0, 0.0)]);
        let center = Cartesian3::new(100.0, 0.0, 0.0);
        let report = declutter_with_report(&input, center, &local_config());

        assert!(report.converged());
        assert!(min_pair_distance(&report.placements) >= 50.0);
        for p in &report.placements {
            assert!((p.direction.magnitude() - 1.0).abs() < 1e-9);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Relaxation behaviour
    // ─────────────────────────────────────────────────────────────────────

    #[test]
    fn test_two_colliding_anchors_resolve() {
        let input = anchors(&[(100.0, 0.0, 0.0), (100.0, 10.0, 0.0)]);
        let report = declutter_with_report(&input, Cartesian3::ZERO, &local_config());

        assert_eq!(report.collisions_per_iteration, vec![1, 1, 1, 1, 0]);
        assert_eq!(report.iterations, 4);
        assert_eq!(report.adjustments, 4);
        assert!(report.converged());
        assert!(min_pair_distance(&report.placements) >= 50.0);

        // 20 * 1.15^4
        assert!((report.placements[0].leader_length - 34.980_125).abs() < 1e-3);
        assert!(report.placements[1].leader_length > report.placements[0].leader_length);
    }

    #[test]
    fn test_colliding_labels_turn_in_opposite_senses() {
        let input = anchors(&[(100.0, 0.0, 0.0), (100.0, 10.0, 0.0)]);
        let placements = declutter(&input, Cartesian3::ZERO, &local_config());

        // Label 1 sits on the +Y side, so label 0 turns towards -Y.
        assert!(placements[0].direction.y < 0.0);
        assert!(placements[1].direction.y > 0.1);
    }

    #[test]
    fn test_anchors_never_move() {
        let input = anchors(&[(100.0, 0.0, 0.0), (100.0, 10.0, 0.0), (95.0, -5.0, 0.0)]);
        let placements = declutter(&input, Cartesian3::ZERO, &local_config());
        for (anchor, placement) in input.iter().zip(&placements) {
            assert_eq!(placement.anchor, anchor.position);
            assert_eq!(placement.anchor_id, anchor.id);
        }
    }

    #[test]
    fn test_leaders_at_cap_only_rotate() {
        let config = local_config().with_max_leader_length(25.0);
        let input = anchors(&[(100.0, 0.0, 0.0), (100.0, 10.0, 0.0)]);
        let report = declutter_with_report(&input, Cartesian3::ZERO, &config);

        assert!(report.iterations >= 2);
        for p in &report.placements {
            assert!(p.leader_length <= 25.0);
        }
        assert_eq!(report.placements[0].leader_length, 25.0);
    }

    #[test]
    fn test_separated_set_is_idempotent() {
        let input = anchors(&[(100.0, 0.0, 0.0), (0.0, 100.0, 0.0), (-100.0, 0.0, 0.0)]);
        let config = local_config();

        let first = declutter_with_report(&input, Cartesian3::ZERO, &config);
        let second = declutter_with_report(&input, Cartesian3::ZERO, &config);

        assert_eq!(first.adjustments, 0);
        assert_eq!(first.collisions_per_iteration, vec![0]);
        assert_eq!(first, second);

        assert_eq!(first.placements[0].leader_length, 20.0);
        assert!((first.placements[1].leader_length - 19.4).abs() < 1e-9);
        assert!((first.placements[2].leader_length - 18.4).abs() < 1e-9);
        for (anchor, p) in input.iter().zip(&first.placements) {
            let expected = anchor.position + p.direction * p.leader_length;
            assert!(p.position.distance(expected) < 1e-12);
        }
    }

    #[test]
    fn test_clustered_anchors_spread_out() {
        // Five towns within 50 km of each other.
        let offsets = [(0.0, 0.0), (0.15, 0.1), (-0.1, 0.2), (0.2, -0.15), (-0.15, -0.1)];
        let input: Vec<AnchorPoint> = offsets
            .iter()
            .enumerate()
            .map(|(i, (dlat, dlon))| {
                AnchorPoint::new(i as u32, Cartesian3::from_degrees(2.35 + dlon, 48.85 + dlat, 0.0))
            })
            .collect();
        for i in 0..input.len() {
            for j in (i + 1)..input.len() {
                assert!(input[i].position.distance(input[j].position) < 50_000.0);
            }
        }

        let sum = input
            .iter()
            .fold(Cartesian3::ZERO, |acc, a| acc + a.position);
        let center = sum * (1.0 / input.len() as f64);

        let config = DeclutterConfig::default().with_min_separation(150_000.0);
        let report = declutter_with_report(&input, center, &config);

        let extended = report
            .placements
            .iter()
            .filter(|p| p.leader_length > config.base_leader_length)
            .count();
        assert!(extended >= 4, "only {} leaders extended", extended);
        assert!(report.converged());

        let counts = &report.collisions_per_iteration;
        assert!(counts.windows(2).all(|w| w[1] <= w[0]), "counts = {:?}", counts);
    }

    #[test]
    fn test_invalid_config_behaves_like_defaults() {
        let input = anchors(&[(100_000.0, 0.0, 0.0), (100_000.0, 1_000.0, 0.0)]);
        let bad = DeclutterConfig::default().with_min_separation(-1.0);

        let with_bad = declutter_with_report(&input, Cartesian3::ZERO, &bad);
        let with_default =
            declutter_with_report(&input, Cartesian3::ZERO, &DeclutterConfig::default());
        assert_eq!(with_bad, with_default);
    }

    #[test]
    fn test_extend_leader() {
        let config = local_config();
        assert!((extend_leader(20.0, &config) - 23.0).abs() < 1e-12);
        assert_eq!(extend_leader(190.0, &config), 200.0);
        assert_eq!(extend_leader(200.0, &config), 200.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn anchor_set() -> impl Strategy<Value = Vec<(f64, f64)>> {
            prop::collection::vec((-200.0f64..200.0, -200.0f64..200.0), 0..12)
        }

        proptest! {
            /// The pass cap bounds the work for any anchor set.
            #[test]
            fn prop_terminates_within_cap(points in anchor_set()) {
                let input: Vec<AnchorPoint> = points
                    .iter()
                    .enumerate()
                    .map(|(i, &(x, y))| AnchorPoint::new(i as u32, Cartesian3::new(x, y, 0.0)))
                    .collect();
                let config = local_config();
                let report = declutter_with_report(&input, Cartesian3::ZERO, &config);

                prop_assert!(report.iterations <= config.max_iterations);
                prop_assert!(
                report.collisions_per_iteration.len() <= config.max_iterations as usize
            );
                prop_assert_eq!(report.placements.len(), input.len());
            }

            /// Leaders stay within the cap and directions stay unit-length.
            #[test]
            fn prop_leaders_bounded_and_unit(points in anchor_set()) {
                let input: Vec<AnchorPoint> = points
                    .iter()
                    .enumerate()
                    .map(|(i, &(x, y))| AnchorPoint::new(i as u32, Cartesian3::new(x, y, 0.0)))
                    .collect();
                let config = local_config();
                let placements = declutter(&input, Cartesian3::ZERO, &config);

                for (anchor, p) in input.iter().zip(&placements) {
                    prop_assert!(p.leader_length > 0.0);
                    prop_assert!(p.leader_length <= config.max_leader_length);
                    prop_assert!((p.direction.magnitude() - 1.0).abs() < 1e-9);
                    let expected = anchor.position + p.direction * p.leader_length;
                    prop_assert!(p.position.distance(expected) < 1e-9);
                }
            }
        }
    }
}
