use chrono::{DateTime, Duration, TimeZone, Utc};
use hotspots::{
    cluster, AnchorStrategy, ClusterList, Coord, DetectionPoint, Geo, HotspotClusterer,
    InvalidInput, Linkage,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{collections::HashSet, time::Instant};

/*-------------------------------------------------------------------------------------------------
 *                                         Test Data
 *-----------------------------------------------------------------------------------------------*/
fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 20, 13, 30, 0).unwrap()
}

/// Ten detections stepping 0.0001 degrees in latitude and longitude, about 100 m end to end.
fn tight_group() -> Vec<DetectionPoint> {
    (0..10)
        .map(|i| {
            let step = f64::from(i) * 0.0001;
            DetectionPoint::new(
                format!("tight-{}", i),
                57.0 + step,
                -4.0 + step,
                base_time() + Duration::minutes(i64::from(i)),
                10.0 + f64::from(i),
                80.0,
            )
        })
        .collect()
}

/// Five Scottish cities, each pair at least 50 km apart.
fn scottish_cities() -> Vec<DetectionPoint> {
    [
        ("edinburgh", 55.9533, -3.1883),
        ("glasgow", 55.8642, -4.2518),
        ("inverness", 57.4778, -4.2247),
        ("aberdeen", 57.1497, -2.0943),
        ("dundee", 56.4620, -2.9707),
    ]
    .into_iter()
    .map(|(id, lat, lon)| DetectionPoint::new(id, lat, lon, base_time(), 25.0, 90.0))
    .collect()
}

/// Detections spread uniformly over the Scotland bounding box.
fn random_scotland(n: usize, seed: u64) -> Vec<DetectionPoint> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|i| {
            let lat = rng.random_range(54.5..61.0);
            let lon = rng.random_range(-8.0..0.0);
            let frp = rng.random_range(0.0..150.0);
            let confidence = rng.random_range(0.0..=100.0);
            let minutes = rng.random_range(0..(24 * 60));
            DetectionPoint::new(
                format!("rand-{}", i),
                lat,
                lon,
                base_time() + Duration::minutes(minutes),
                frp,
                confidence,
            )
        })
        .collect()
}

/// Check every input point is in exactly one cluster and the counts add up.
fn assert_partition(points: &[DetectionPoint], clusterer: &HotspotClusterer) {
    let clusters = clusterer.cluster(points).unwrap();

    let mut seen = HashSet::new();
    let mut total = 0;
    for clust in &clusters {
        assert!(clust.count() >= 1);
        assert_eq!(clust.count(), clust.members().len());
        total += clust.count();

        for member in clust.members() {
            assert!(seen.insert(member.id.clone()), "{} is in two clusters", member.id);
        }
    }

    assert_eq!(total, points.len());
    let expected: HashSet<_> = points.iter().map(|p| p.id.clone()).collect();
    assert_eq!(seen, expected);
}

fn all_clusterers() -> Vec<HotspotClusterer> {
    let mut clusterers = vec![];
    for linkage in [Linkage::Single, Linkage::Seed] {
        for threshold_km in [0.5, 2.0, 5.0, 25.0] {
            clusterers.push(
                HotspotClusterer::new()
                    .with_linkage(linkage)
                    .with_threshold_km(threshold_km),
            );
        }
    }
    clusterers
}

/*-------------------------------------------------------------------------------------------------
 *                                      Degenerate Inputs
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_empty_input() {
    let start = Instant::now();
    let clusters = cluster(&[]).unwrap();
    let elapsed = start.elapsed();

    assert!(clusters.is_empty());
    assert!(elapsed.as_millis() < 1, "{:?}", elapsed);
}

#[test]
fn test_single_point() {
    let point = DetectionPoint::new("only", 56.8, -5.1, base_time(), 7.5, 65.0);
    let clusters = cluster(std::slice::from_ref(&point)).unwrap();

    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].count(), 1);
    assert_eq!(clusters[0].members(), &[point.clone()]);
    assert_eq!(clusters[0].anchor(), point.location);
    assert_eq!(clusters[0].total_power(), 7.5);
}

/*-------------------------------------------------------------------------------------------------
 *                                     Spatial Behavior
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_tight_group_collapses() {
    let points = tight_group();

    for linkage in [Linkage::Single, Linkage::Seed] {
        let clusters = HotspotClusterer::new()
            .with_linkage(linkage)
            .cluster(&points)
            .unwrap();
        assert!(clusters.len() <= 2, "{} clusters", clusters.len());
    }

    let clusters = cluster(&points).unwrap();
    assert_eq!(clusters.len(), 1);

    let clust = &clusters[0];
    assert_eq!(clust.count(), 10);
    assert!(clust.radius() < 0.2, "{}", clust.radius());
    assert_eq!(clust.first_detected(), base_time());
    assert_eq!(clust.last_detected(), base_time() + Duration::minutes(9));
    assert!((clust.total_power() - 145.0).abs() < 1.0e-9);
    assert_eq!(clust.max_power(), 19.0);
}

#[test]
fn test_dispersed_points_stay_apart() {
    let points = scottish_cities();

    let clusters = cluster(&points).unwrap();
    assert!(clusters.len() >= 3);
    // At the default threshold, nothing this far apart should merge at all.
    assert_eq!(clusters.len(), 5);

    let seeded = HotspotClusterer::new().with_linkage(Linkage::Seed);
    assert_eq!(seeded.cluster(&points).unwrap().len(), 5);
}

#[test]
fn test_mixed_groups() {
    let mut points = tight_group();
    points.extend(scottish_cities());

    let clusters = cluster(&points).unwrap();
    assert_eq!(clusters.len(), 6);
    assert_eq!(clusters[0].count(), 10);
    assert!(clusters[1..].iter().all(|c| c.count() == 1));
    assert_eq!(clusters[1].members()[0].id, "edinburgh");
}

#[test]
fn test_anchor_choices() {
    let points = tight_group();

    let centroid = HotspotClusterer::new().cluster(&points).unwrap();
    let expected = Coord {
        lat: 57.00045,
        lon: -3.99955,
    };
    assert!(centroid[0].anchor().is_close(expected, 1.0e-9));
    assert_eq!(centroid[0].anchor(), centroid[0].centroid());

    let first = HotspotClusterer::new()
        .with_anchor(AnchorStrategy::First)
        .cluster(&points)
        .unwrap();
    assert_eq!(first[0].anchor(), points[0].location);

    let intense = HotspotClusterer::new()
        .with_anchor(AnchorStrategy::MostIntense)
        .cluster(&points)
        .unwrap();
    assert_eq!(intense[0].anchor(), points[9].location);
}

/*-------------------------------------------------------------------------------------------------
 *                                         Invariants
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_partition_invariant() {
    let mut inputs = vec![tight_group(), scottish_cities(), random_scotland(750, 7)];

    // A dense patch where lots of merging happens.
    let mut rng = StdRng::seed_from_u64(99);
    inputs.push(
        (0..400)
            .map(|i| {
                DetectionPoint::new(
                    format!("dense-{}", i),
                    rng.random_range(57.0..57.3),
                    rng.random_range(-4.5..-4.0),
                    base_time(),
                    1.0,
                    50.0,
                )
            })
            .collect(),
    );

    for points in &inputs {
        for clusterer in all_clusterers() {
            assert_partition(points, &clusterer);
        }
    }
}

#[test]
fn test_seed_clusters_are_bounded() {
    let points = random_scotland(1_000, 3);
    let clusterer = HotspotClusterer::new()
        .with_linkage(Linkage::Seed)
        .with_threshold_km(25.0);

    for clust in clusterer.cluster(&points).unwrap() {
        let seed = clust.members()[0].location;
        for member in clust.members() {
            let d = hotspots::equirectangular_distance(
                seed.lat,
                seed.lon,
                member.location.lat,
                member.location.lon,
            );
            assert!(d <= 25.0, "{} km from the seed", d);
        }
    }
}

#[test]
fn test_single_linkage_matches_brute_force() {
    let points = random_scotland(300, 11);
    let threshold_km = 25.0;

    // Union-find over all pairs.
    let mut parent: Vec<usize> = (0..points.len()).collect();
    fn find(parent: &mut [usize], i: usize) -> usize {
        let mut root = i;
        while parent[root] != root {
            root = parent[root];
        }
        parent[i] = root;
        root
    }

    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            let (a, b) = (points[i].location, points[j].location);
            if hotspots::equirectangular_distance(a.lat, a.lon, b.lat, b.lon) <= threshold_km {
                let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
                parent[ri.max(rj)] = ri.min(rj);
            }
        }
    }

    let mut roots = HashSet::new();
    for i in 0..points.len() {
        roots.insert(find(&mut parent, i));
    }

    let clusters = HotspotClusterer::new()
        .with_threshold_km(threshold_km)
        .cluster(&points)
        .unwrap();
    assert_eq!(clusters.len(), roots.len());
}

#[test]
fn test_deterministic() {
    let points = random_scotland(1_000, 42);
    let clusterer = HotspotClusterer::new().with_threshold_km(10.0);

    let first = clusterer.cluster(&points).unwrap();
    let second = clusterer.cluster(&points).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_clusters_in_input_order() {
    let points = random_scotland(500, 5);
    let clusters = HotspotClusterer::new()
        .with_threshold_km(15.0)
        .cluster(&points)
        .unwrap();

    let index_of = |id: &str| points.iter().position(|p| p.id == id).unwrap();

    let mut last_first = None;
    for clust in &clusters {
        let idxs: Vec<usize> = clust.members().iter().map(|m| index_of(&m.id)).collect();
        assert!(idxs.windows(2).all(|w| w[0] < w[1]));

        if let Some(prev) = last_first {
            assert!(idxs[0] > prev);
        }
        last_first = Some(idxs[0]);
    }
}

/*-------------------------------------------------------------------------------------------------
 *                                        Validation
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_rejects_invalid_points() {
    let bad_points = [
        DetectionPoint::new("nan", f64::NAN, -3.0, base_time(), 1.0, 50.0),
        DetectionPoint::new("inf", 56.0, f64::INFINITY, base_time(), 1.0, 50.0),
        DetectionPoint::new("lat", -91.0, -3.0, base_time(), 1.0, 50.0),
        DetectionPoint::new("lon", 56.0, 181.0, base_time(), 1.0, 50.0),
        DetectionPoint::new("frp", 56.0, -3.0, base_time(), -5.0, 50.0),
        DetectionPoint::new("conf", 56.0, -3.0, base_time(), 1.0, 101.0),
    ];

    for bad in bad_points {
        let mut points = scottish_cities();
        points.insert(2, bad.clone());

        let err = cluster(&points).unwrap_err();
        assert_eq!(err.point_id(), Some(bad.id.as_str()));
    }

    let err = HotspotClusterer::new()
        .with_threshold_km(0.0)
        .cluster(&scottish_cities())
        .unwrap_err();
    assert_eq!(err, InvalidInput::Threshold(0.0));
}

/*-------------------------------------------------------------------------------------------------
 *                                        Performance
 *-----------------------------------------------------------------------------------------------*/
fn assert_clusters_within(n: usize, budget_ms: u128) {
    let points = random_scotland(n, 42);

    let start = Instant::now();
    let clusters = cluster(&points).unwrap();
    let elapsed = start.elapsed();

    let total: usize = clusters.iter().map(|c| c.count()).sum();
    assert_eq!(total, n);
    assert!(
        elapsed.as_millis() < budget_ms,
        "{} points took {:?}",
        n,
        elapsed
    );
}

#[test]
fn test_performance_100_points() {
    assert_clusters_within(100, 50);
}

#[test]
fn test_performance_500_points() {
    assert_clusters_within(500, 200);
}

#[test]
fn test_performance_1000_points() {
    assert_clusters_within(1_000, 500);
}

/*-------------------------------------------------------------------------------------------------
 *                                        Cluster List
 *-----------------------------------------------------------------------------------------------*/
#[test]
fn test_cluster_list_summary() {
    let mut points = tight_group();
    points.extend(scottish_cities());

    let list = ClusterList::from_points("mixed", &HotspotClusterer::new(), &points).unwrap();

    assert_eq!(list.len(), 6);
    assert_eq!(list.num_points(), 15);

    let biggest = list.biggest().unwrap();
    assert_eq!(biggest.count(), 10);
    assert!(biggest.bounding_box().contains(biggest.centroid()));
}

#[test]
fn test_threads_share_a_clusterer() {
    let clusterer = HotspotClusterer::new();
    let batches: Vec<Vec<DetectionPoint>> = (0..4).map(|s| random_scotland(250, s)).collect();

    let expected: Vec<usize> = batches
        .iter()
        .map(|b| clusterer.cluster(b).unwrap().len())
        .collect();

    let found: Vec<usize> = std::thread::scope(|s| {
        let handles: Vec<_> = batches
            .iter()
            .map(|b| s.spawn(move || clusterer.cluster(b).unwrap().len()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(found, expected);
}
