//! Road/sea dispatch over a hand-built sea graph with a stub road engine.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use geo::polygon;
use sealane_lib::{
    Chokepoint, ChokepointFilter, ChokepointRegistry, LandMask, MatrixRequest, MatrixResponse,
    MatrixService, NodeId, Port, PortSnapper, RouteCost, RoutingEngine, RoutingMode, SeaLaneGraph,
    SeaNode, SeaRoutingEngine, UNREACHABLE,
};

/// Road engine stand-in: snaps everything to node 0 and answers a fixed cost,
/// counting invocations so dispatch can be asserted.
struct StubRoadEngine {
    calls: AtomicUsize,
}

impl StubRoadEngine {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl RoutingEngine for StubRoadEngine {
    fn find_closest(
        &self,
        _lat: f64,
        _lon: f64,
        _filter: &ChokepointFilter,
    ) -> sealane_lib::Result<NodeId> {
        Ok(0)
    }

    fn compute_path(
        &self,
        _source: NodeId,
        _target: NodeId,
        _filter: &ChokepointFilter,
    ) -> Option<RouteCost> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Some(RouteCost {
            distance_m: 42_000.0,
            time_ms: 1_000,
        })
    }
}

fn port(unlocode: &str, name: &str, lat: f64, lon: f64) -> Port {
    Port {
        unlocode: unlocode.to_string(),
        name: name.to_string(),
        country_code: unlocode[..2].to_string(),
        subdivision: String::new(),
        lat,
        lon,
        function: "1-------".to_string(),
        status: "AI".to_string(),
    }
}

/// Two port areas joined by a short canal route (through node 1) and a long
/// open-water detour (through nodes 3 and 4).
fn sea_world() -> (SeaRoutingEngine, PortSnapper, ChokepointRegistry) {
    let nodes = vec![
        SeaNode { lat: 0.0, lon: 0.0 },  // 0: off port Alpha
        SeaNode { lat: 0.0, lon: 2.0 },  // 1: the canal
        SeaNode { lat: 0.0, lon: 4.0 },  // 2: off port Beta
        SeaNode { lat: 3.0, lon: 0.0 },  // 3: detour west
        SeaNode { lat: 3.0, lon: 4.0 },  // 4: detour east
    ];
    let mut graph = SeaLaneGraph::with_nodes(nodes);
    graph.add_edge(0, 1, 200_000.0);
    graph.add_edge(1, 2, 200_000.0);
    graph.add_edge(0, 3, 400_000.0);
    graph.add_edge(3, 4, 600_000.0);
    graph.add_edge(4, 2, 400_000.0);

    let snapper = PortSnapper::new(vec![
        port("AAALF", "Alpha Harbour", 0.1, 0.0),
        port("BBBET", "Beta Haven", 0.1, 4.0),
    ]);

    let mut registry = ChokepointRegistry::new();
    registry.add(
        Chokepoint::definition("CANAL", "Test Canal", "TEST", 0.0, 2.0, 1.0, 0.5)
            .with_node_ids(HashSet::from([1])),
    );

    (SeaRoutingEngine::new(graph), snapper, registry)
}

fn service(land_mask: Option<Arc<LandMask>>) -> (MatrixService, Arc<StubRoadEngine>) {
    let (sea, snapper, registry) = sea_world();
    let road = Arc::new(StubRoadEngine::new());
    let service = MatrixService::new(
        road.clone(),
        Some(Arc::new(sea)),
        Arc::new(snapper),
        Arc::new(registry),
        land_mask,
    );
    (service, road)
}

fn sea_request() -> MatrixRequest {
    MatrixRequest {
        points: vec![[0.1, 0.0], [0.1, 4.0]],
        sources: vec![0],
        targets: vec![1],
        mode: RoutingMode::Sea,
        excluded_chokepoints: Vec::new(),
        validate_coordinates: false,
    }
}

#[test]
fn sea_matrix_routes_through_the_canal_by_default() {
    let (service, road) = service(None);
    let response = service.compute(&sea_request()).unwrap();

    assert_eq!(response.mode, RoutingMode::Sea);
    assert_eq!(road.calls.load(Ordering::Relaxed), 0, "road engine must not run");

    let distances = response.distances.unwrap();
    assert_eq!(distances, vec![vec![400_000]]);

    let snaps = response.port_snaps.unwrap();
    assert_eq!(snaps.len(), 2);
    let alpha = snaps[0].as_ref().unwrap();
    assert_eq!(alpha.unlocode, "AAALF");
    assert_eq!(alpha.role, sealane_lib::PortRole::PortOfLoading);
    let beta = snaps[1].as_ref().unwrap();
    assert_eq!(beta.unlocode, "BBBET");
    assert_eq!(beta.role, sealane_lib::PortRole::PortOfDischarge);
    assert!(response.failures.is_empty());

    assert_eq!(response.excluded_chokepoints.as_deref(), Some(&[][..]));
}

#[test]
fn excluding_the_canal_takes_the_long_way_round() {
    let (service, _) = service(None);
    let mut request = sea_request();
    request.excluded_chokepoints = vec!["CANAL".to_string(), "NOT_A_CHOKEPOINT".to_string()];

    let response = service.compute(&request).unwrap();

    let distances = response.distances.unwrap();
    assert_eq!(distances, vec![vec![1_400_000]]);

    // Unknown ids are dropped from the echoed list.
    assert_eq!(
        response.excluded_chokepoints.unwrap(),
        vec!["CANAL".to_string()]
    );
}

#[test]
fn exclusion_set_can_make_pairs_unreachable() {
    let (sea, snapper, mut registry) = sea_world();
    registry.add(
        Chokepoint::definition("DETOUR", "Detour Passage", "TEST", 3.0, 2.0, 1.0, 0.5)
            .with_node_ids(HashSet::from([3, 4])),
    );
    let service = MatrixService::new(
        Arc::new(StubRoadEngine::new()),
        Some(Arc::new(sea)),
        Arc::new(snapper),
        Arc::new(registry),
        None,
    );

    let mut request = sea_request();
    request.excluded_chokepoints = vec!["CANAL".to_string(), "DETOUR".to_string()];

    let response = service.compute(&request).unwrap();
    assert_eq!(response.distances.unwrap(), vec![vec![UNREACHABLE]]);
    assert_eq!(response.times.unwrap(), vec![vec![UNREACHABLE]]);
}

#[test]
fn road_mode_bypasses_snapping_and_filters() {
    let (service, road) = service(None);
    let request = MatrixRequest {
        points: vec![[52.0, 4.3], [48.0, 11.5]],
        sources: Vec::new(),
        targets: Vec::new(),
        mode: RoutingMode::Road,
        excluded_chokepoints: Vec::new(),
        validate_coordinates: true,
    };

    let response = service.compute(&request).unwrap();
    assert_eq!(response.mode, RoutingMode::Road);
    assert!(response.port_snaps.is_none());
    assert!(response.excluded_chokepoints.is_none());
    assert_eq!(road.calls.load(Ordering::Relaxed), 4, "2x2 road cells");
    assert_eq!(response.distances.unwrap()[0][1], 42_000);
}

#[test]
fn coordinate_validation_rejects_land_points() {
    let land = geo::polygon![
        (x: -1.0, y: -1.0),
        (x: 1.0, y: -1.0),
        (x: 1.0, y: 1.0),
        (x: -1.0, y: 1.0),
        (x: -1.0, y: -1.0),
    ];
    let mask = Arc::new(LandMask::from_polygons(vec![land], "test.json"));
    let (service, _) = service(Some(mask));

    let mut request = sea_request();
    request.points[0] = [0.0, 0.5]; // inside the land square
    request.validate_coordinates = true;

    let response = service.compute_response(&request);
    assert!(response.is_error());
    assert_eq!(response.error_code.as_deref(), Some("COORDINATE_ON_LAND"));

    // The same request with validation off snaps normally.
    request.validate_coordinates = false;
    let response = service.compute_response(&request);
    assert!(!response.is_error());
}

#[test]
fn sea_mode_without_sea_engine_is_an_error() {
    let (_, snapper, registry) = sea_world();
    let service = MatrixService::new(
        Arc::new(StubRoadEngine::new()),
        None,
        Arc::new(snapper),
        Arc::new(registry),
        None,
    );

    let response = service.compute_response(&sea_request());
    assert!(response.is_error());
    assert_eq!(response.error_code.as_deref(), Some("SEA_ROUTING_UNAVAILABLE"));
}

#[test]
fn out_of_range_port_snap_flags_the_point_not_the_request() {
    let (sea, _, registry) = sea_world();
    let snapper = PortSnapper::with_max_distance(vec![port("AAALF", "Alpha", 0.1, 0.0)], 50.0);
    let service = MatrixService::new(
        Arc::new(StubRoadEngine::new()),
        Some(Arc::new(sea)),
        Arc::new(snapper),
        Arc::new(registry),
        None,
    );

    let mut request = sea_request();
    request.points[1] = [40.0, 40.0]; // thousands of km from the only port

    let response = service.compute(&request).unwrap();
    assert!(!response.is_error());
    assert_eq!(response.failures, vec![1]);

    // The healthy point still snapped; the failed one has a placeholder and
    // its cells stay unreachable.
    let snaps = response.port_snaps.unwrap();
    assert_eq!(snaps[0].as_ref().unwrap().unlocode, "AAALF");
    assert!(snaps[1].is_none());
    assert_eq!(response.distances.unwrap(), vec![vec![UNREACHABLE]]);
}

#[test]
fn sea_matrix_is_deterministic() {
    let (service, _) = service(None);
    let request = sea_request();

    let first = service.compute(&request).unwrap();
    for _ in 0..5 {
        let again = service.compute(&request).unwrap();
        assert_eq!(again.distances, first.distances);
        assert_eq!(again.times, first.times);
    }
}

#[test]
fn error_response_serializes_with_code_and_message() {
    let response = MatrixResponse::failure(RoutingMode::Sea, "GRAPH_SNAP_FAILED", "too far");
    let json = serde_json::to_string(&response).unwrap();
    assert!(json.contains("GRAPH_SNAP_FAILED"));
    assert!(json.contains("\"mode\":\"sea\""));
    assert!(!json.contains("distances"));
}
