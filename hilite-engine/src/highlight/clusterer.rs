//! Proximity clustering of timestamp candidates
//!
//! Groups second values whose distance to a cluster leader is within a
//! window. Input is sorted first, then swept once left to right: each value
//! joins the earliest existing leader within the window, or becomes a new
//! leader. For a fixed window the result does not depend on input order.

use tracing::trace;

/// One group of near-duplicate timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Representative time (earliest member)
    pub leader_time: f64,
    /// Distinct member times, ascending
    pub member_times: Vec<f64>,
    /// Number of members including duplicates
    pub member_count: usize,
}

impl Cluster {
    fn new(leader_time: f64) -> Self {
        Self {
            leader_time,
            member_times: vec![leader_time],
            member_count: 1,
        }
    }

    fn absorb(&mut self, time: f64) {
        if self.member_times.last() != Some(&time) {
            self.member_times.push(time);
        }
        self.member_count += 1;
    }

    /// Mentioned more than once
    pub fn is_frequent(&self) -> bool {
        self.member_count > 1
    }

    pub fn contains(&self, time: f64) -> bool {
        self.member_times.iter().any(|t| *t == time)
    }
}

/// Leader/sweep clusterer parameterised by window size
#[derive(Debug, Clone, Copy)]
pub struct ProximityClusterer {
    window: f64,
}

impl ProximityClusterer {
    /// Create clusterer; negative or non-finite windows are treated as `0`
    pub fn new(window_secs: f64) -> Self {
        let window = if window_secs.is_finite() && window_secs > 0.0 {
            window_secs
        } else {
            0.0
        };
        Self { window }
    }

    pub fn window(&self) -> f64 {
        self.window
    }

    /// Cluster `times` (duplicates allowed). Non-finite values are dropped.
    ///
    /// Clusters are returned in ascending leader order.
    pub fn cluster(&self, times: &[f64]) -> Vec<Cluster> {
        let mut sorted: Vec<f64> = times.iter().copied().filter(|t| t.is_finite()).collect();
        sorted.sort_by(f64::total_cmp);

        let mut clusters: Vec<Cluster> = Vec::new();

        for value in sorted {
            // Leaders are ascending, so the first match is the smallest
            let leader = clusters
                .iter_mut()
                .find(|c| (c.leader_time - value).abs() <= self.window);

            match leader {
                Some(cluster) => cluster.absorb(value),
                None => clusters.push(Cluster::new(value)),
            }
        }

        trace!(
            window = self.window,
            clusters = clusters.len(),
            "Clustered timestamps"
        );

        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaders(clusters: &[Cluster]) -> Vec<f64> {
        clusters.iter().map(|c| c.leader_time).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(ProximityClusterer::new(20.0).cluster(&[]).is_empty());
    }

    #[test]
    fn test_single_cluster_led_by_earliest() {
        let clusters = ProximityClusterer::new(20.0).cluster(&[5.0, 23.0, 9.0]);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].leader_time, 5.0);
        assert_eq!(clusters[0].member_times, vec![5.0, 9.0, 23.0]);
        assert_eq!(clusters[0].member_count, 3);
        assert!(clusters[0].is_frequent());
    }

    #[test]
    fn test_far_value_starts_new_cluster() {
        let clusters = ProximityClusterer::new(20.0).cluster(&[5.0, 23.0, 50.0]);
        assert_eq!(leaders(&clusters), vec![5.0, 50.0]);
        assert_eq!(clusters[0].member_times, vec![5.0, 23.0]);
        assert_eq!(clusters[1].member_times, vec![50.0]);
        assert!(!clusters[1].is_frequent());
    }

    #[test]
    fn test_order_independent() {
        let clusterer = ProximityClusterer::new(20.0);
        let a = clusterer.cluster(&[50.0, 5.0, 23.0, 71.0, 90.0]);
        let b = clusterer.cluster(&[90.0, 23.0, 71.0, 5.0, 50.0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_membership_is_measured_from_leader_not_neighbour() {
        // 30 is within 20 of 15 but not of the leader 5
        let clusters = ProximityClusterer::new(20.0).cluster(&[5.0, 15.0, 30.0]);
        assert_eq!(leaders(&clusters), vec![5.0, 30.0]);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let clusters = ProximityClusterer::new(20.0).cluster(&[10.0, 30.0]);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_zero_window_groups_only_equal_values() {
        let clusters = ProximityClusterer::new(0.0).cluster(&[3.0, 3.0, 4.0]);
        assert_eq!(leaders(&clusters), vec![3.0, 4.0]);
        assert_eq!(clusters[0].member_count, 2);
        assert_eq!(clusters[0].member_times, vec![3.0]);
    }

    #[test]
    fn test_duplicates_count_as_mentions() {
        let clusters = ProximityClusterer::new(20.0).cluster(&[90.0, 90.0]);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].is_frequent());
    }

    #[test]
    fn test_negative_window_degenerates_to_zero() {
        assert_eq!(ProximityClusterer::new(-5.0).window(), 0.0);
    }

    #[test]
    fn test_non_finite_values_dropped() {
        let clusters = ProximityClusterer::new(1.0).cluster(&[f64::NAN, 2.0]);
        assert_eq!(leaders(&clusters), vec![2.0]);
    }
}
