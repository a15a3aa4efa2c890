use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use svl_scenario::adapters::outbound::init_noop_logger;
use svl_scenario::application::*;
use svl_scenario::common::*;
use svl_scenario::domains::logger::{DomainLogger, DynLogger};
use svl_scenario::domains::simulation::*;
use svl_scenario::ScenarioConfig;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    OpenSimulator(String, u16),
    LoadScene(String, Option<i64>),
    CurrentScene,
    Reset,
    SetDateTime(SimDateTime, bool),
    SpawnPoints,
    AddAgent(String, AgentType, Transform),
    AgentState,
    ConnectBridge(String, u16),
    OnCollision(String),
    MapToGps(Transform),
    AddRandomAgents(AgentType),
    Run(f64),
    CloseSimulator,
    OpenDashboard(String, u16),
    SetHdMap(String),
    SetVehicle(String),
    DisableAutonomy,
    SetupAutonomy(Vec<String>, RoutingRequest),
    CloseDashboard,
}

type Calls = Arc<Mutex<Vec<Call>>>;

#[derive(Clone, Default)]
struct Script {
    load_fails: bool,
    reload_fails: bool,
    current_scene: Option<String>,
    spawns: Vec<SpawnPoint>,
    collision: Option<(String, Option<String>)>,
    simulator_unreachable: bool,
}

struct MockSimulator {
    script: Script,
    calls: Calls,
    loads: usize,
    handlers: Vec<CollisionHandler>,
}

impl MockSimulator {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SimulatorPort for MockSimulator {
    async fn load_scene(&mut self, scene: &str, seed: Option<i64>) -> ScenarioResult<()> {
        self.record(Call::LoadScene(scene.to_string(), seed));
        self.loads += 1;
        let fails = if self.loads == 1 { self.script.load_fails } else { self.script.reload_fails };
        if fails {
            return Err(ScenarioError::Remote {
                command: "simulator/load_scene".into(),
                message: "load failed".into(),
            });
        }
        Ok(())
    }

    async fn current_scene(&mut self) -> ScenarioResult<Option<String>> {
        self.record(Call::CurrentScene);
        Ok(self.script.current_scene.clone())
    }

    async fn reset(&mut self) -> ScenarioResult<()> {
        self.record(Call::Reset);
        Ok(())
    }

    async fn set_date_time(&mut self, at: SimDateTime, fixed: bool) -> ScenarioResult<()> {
        self.record(Call::SetDateTime(at, fixed));
        Ok(())
    }

    async fn spawn_points(&mut self) -> ScenarioResult<Vec<SpawnPoint>> {
        self.record(Call::SpawnPoints);
        Ok(self.script.spawns.clone())
    }

    async fn add_agent(&mut self, name: &str, agent_type: AgentType, state: &AgentState) -> ScenarioResult<AgentHandle> {
        self.record(Call::AddAgent(name.to_string(), agent_type, state.transform));
        Ok(AgentHandle {
            uid: "ego-uid".into(),
            name: name.to_string(),
            agent_type,
        })
    }

    async fn agent_state(&mut self, _agent: &AgentHandle) -> ScenarioResult<AgentState> {
        self.record(Call::AgentState);
        Ok(AgentState::at(Transform::planar(5.0, 6.0)))
    }

    async fn connect_bridge(&mut self, _agent: &AgentHandle, host: &str, port: u16) -> ScenarioResult<()> {
        self.record(Call::ConnectBridge(host.to_string(), port));
        Ok(())
    }

    async fn on_collision(&mut self, agent: &AgentHandle, handler: CollisionHandler) -> ScenarioResult<()> {
        self.record(Call::OnCollision(agent.uid.clone()));
        self.handlers.push(handler);
        Ok(())
    }

    async fn map_to_gps(&mut self, transform: &Transform) -> ScenarioResult<GpsFix> {
        self.record(Call::MapToGps(*transform));
        Ok(GpsFix {
            easting: transform.position.x,
            northing: transform.position.z,
            orientation: 90.0,
            ..GpsFix::default()
        })
    }

    async fn add_random_agents(&mut self, agent_type: AgentType) -> ScenarioResult<()> {
        self.record(Call::AddRandomAgents(agent_type));
        Ok(())
    }

    async fn run(&mut self, time_limit_secs: f64) -> ScenarioResult<()> {
        self.record(Call::Run(time_limit_secs));
        if let Some((agent, other)) = self.script.collision.clone() {
            let event = CollisionEvent { agent, other, contact: None };
            for handler in self.handlers.iter_mut() {
                handler(&event)?;
            }
        }
        Ok(())
    }

    async fn close(&mut self) -> ScenarioResult<()> {
        self.record(Call::CloseSimulator);
        Ok(())
    }
}

struct MockDashboard {
    calls: Calls,
}

impl MockDashboard {
    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DashboardPort for MockDashboard {
    async fn set_hd_map(&mut self, hd_map: &str) -> ScenarioResult<()> {
        self.record(Call::SetHdMap(hd_map.to_string()));
        Ok(())
    }

    async fn set_vehicle(&mut self, vehicle: &str) -> ScenarioResult<()> {
        self.record(Call::SetVehicle(vehicle.to_string()));
        Ok(())
    }

    async fn disable_autonomy(&mut self) -> ScenarioResult<()> {
        self.record(Call::DisableAutonomy);
        Ok(())
    }

    async fn setup_autonomy(&mut self, modules: &[&str], routing: &RoutingRequest) -> ScenarioResult<()> {
        self.record(Call::SetupAutonomy(
            modules.iter().map(|m| m.to_string()).collect(),
            *routing,
        ));
        Ok(())
    }

    async fn close(&mut self) -> ScenarioResult<()> {
        self.record(Call::CloseDashboard);
        Ok(())
    }
}

struct MockFactory {
    script: Script,
    calls: Calls,
}

#[async_trait]
impl ConnectionFactory for MockFactory {
    async fn open_simulator(&self, host: &str, port: u16) -> ScenarioResult<Box<dyn SimulatorPort>> {
        self.calls.lock().unwrap().push(Call::OpenSimulator(host.to_string(), port));
        if self.script.simulator_unreachable {
            return Err(ScenarioError::Connection {
                endpoint: format!("ws://{}:{}", host, port),
                reason: "connection refused".into(),
            });
        }
        Ok(Box::new(MockSimulator {
            script: self.script.clone(),
            calls: self.calls.clone(),
            loads: 0,
            handlers: Vec::new(),
        }))
    }

    async fn open_dashboard(&self, host: &str, port: u16) -> ScenarioResult<Box<dyn DashboardPort>> {
        self.calls.lock().unwrap().push(Call::OpenDashboard(host.to_string(), port));
        Ok(Box::new(MockDashboard { calls: self.calls.clone() }))
    }
}

/// `count` spawn points at x = 100 * i, each with `destinations` targets at (i, 0, -10 * j).
fn spawns(count: usize, destinations: usize) -> Vec<SpawnPoint> {
    (0..count)
        .map(|i| SpawnPoint {
            position: Vector::new(100.0 * i as f64, 0.0, 0.0),
            rotation: Vector::new(0.0, 90.0, 0.0),
            destinations: (0..destinations)
                .map(|j| Transform::planar(i as f64, -10.0 * j as f64))
                .collect(),
        })
        .collect()
}

fn script() -> Script {
    Script {
        spawns: spawns(10, 4),
        ..Script::default()
    }
}

struct Capture {
    lines: Mutex<Vec<String>>,
}

impl DomainLogger for Capture {
    fn info(&self, msg: &str) { self.lines.lock().unwrap().push(format!("INFO:{}", msg)); }
    fn warn(&self, msg: &str) { self.lines.lock().unwrap().push(format!("WARN:{}", msg)); }
    fn error(&self, msg: &str) { self.lines.lock().unwrap().push(format!("ERR:{}", msg)); }
}

async fn run_scenario(config: ScenarioConfig, script: Script) -> (ScenarioResult<ScenarioReport>, Vec<Call>) {
    run_logged(config, script, init_noop_logger()).await
}

async fn run_logged(
    config: ScenarioConfig,
    script: Script,
    logger: DynLogger,
) -> (ScenarioResult<ScenarioReport>, Vec<Call>) {
    let calls: Calls = Arc::new(Mutex::new(Vec::new()));
    let factory = Arc::new(MockFactory { script, calls: calls.clone() });
    let runner = ScenarioRunner::new(config, factory, logger);
    let result = runner.run().await;
    let recorded = calls.lock().unwrap().clone();
    (result, recorded)
}

#[tokio::test]
async fn test_default_seed_selects_spawn_and_destination() {
    let (result, calls) = run_scenario(ScenarioConfig::default(), script()).await;
    let report = result.unwrap();

    assert_eq!(report.spawn_index, 2);
    assert_eq!(report.destination_index, 0);
    assert_eq!(report.destination, Transform::planar(2.0, 0.0));
    assert_eq!(report.ego.uid, "ego-uid");

    let spawn = &spawns(10, 4)[2];
    assert!(calls.contains(&Call::AddAgent(
        svl_scenario::config::DEFAULT_VEHICLE.to_string(),
        AgentType::Ego,
        spawn.transform(),
    )));
}

#[tokio::test]
async fn test_full_setup_sequence() {
    let (result, calls) = run_scenario(ScenarioConfig::default(), script()).await;
    result.unwrap();

    let modules: Vec<String> = DEFAULT_MODULES.iter().map(|m| m.to_string()).collect();
    let routing = RoutingRequest {
        start_easting: 5.0,
        start_northing: 6.0,
        start_heading: 90f64.to_radians(),
        end_easting: 2.0,
        end_northing: 0.0,
    };
    let expected = vec![
        Call::OpenSimulator("127.0.0.1".into(), 8181),
        Call::LoadScene("san_francisco".into(), Some(51472)),
        Call::SetDateTime(SCENARIO_START, true),
        Call::SpawnPoints,
        Call::AddAgent(
            svl_scenario::config::DEFAULT_VEHICLE.into(),
            AgentType::Ego,
            spawns(10, 4)[2].transform(),
        ),
        Call::ConnectBridge("127.0.0.1".into(), 9090),
        Call::OnCollision("ego-uid".into()),
        Call::OpenDashboard("127.0.0.1".into(), 8888),
        Call::SetHdMap("SanFrancisco".into()),
        Call::SetVehicle("Lincoln2017MKZ".into()),
        Call::AgentState,
        Call::MapToGps(Transform::planar(5.0, 6.0)),
        Call::MapToGps(Transform::planar(2.0, 0.0)),
        Call::DisableAutonomy,
        Call::SetupAutonomy(modules, routing),
        Call::AddRandomAgents(AgentType::Npc),
        Call::AddRandomAgents(AgentType::Pedestrian),
        Call::Run(120.0),
        Call::CloseDashboard,
        Call::CloseSimulator,
    ];
    assert_eq!(calls, expected);
}

#[tokio::test]
async fn test_load_failure_on_current_scene_resets() {
    let s = Script {
        load_fails: true,
        current_scene: Some("san_francisco".into()),
        ..script()
    };
    let (result, calls) = run_scenario(ScenarioConfig::default(), s).await;
    result.unwrap();

    let loads = calls.iter().filter(|c| matches!(c, Call::LoadScene(..))).count();
    assert_eq!(loads, 1);
    assert_eq!(
        &calls[1..4],
        &[
            Call::LoadScene("san_francisco".into(), Some(51472)),
            Call::CurrentScene,
            Call::Reset,
        ]
    );
}

#[tokio::test]
async fn test_load_failure_on_other_scene_reloads_without_seed() {
    let s = Script {
        load_fails: true,
        current_scene: Some("BorregasAve".into()),
        ..script()
    };
    let (result, calls) = run_scenario(ScenarioConfig::default(), s).await;
    result.unwrap();

    assert!(!calls.contains(&Call::Reset));
    assert_eq!(
        &calls[1..4],
        &[
            Call::LoadScene("san_francisco".into(), Some(51472)),
            Call::CurrentScene,
            Call::LoadScene("san_francisco".into(), None),
        ]
    );
}

#[tokio::test]
async fn test_reseed_on_fallback_passes_seed_again() {
    let config = ScenarioConfig {
        reseed_on_fallback: true,
        random_seed: 7,
        ..ScenarioConfig::default()
    };
    let s = Script {
        load_fails: true,
        current_scene: None,
        ..script()
    };
    let (result, calls) = run_scenario(config, s).await;
    let report = result.unwrap();

    assert_eq!(calls[3], Call::LoadScene("san_francisco".into(), Some(7)));
    assert_eq!(report.spawn_index, 7);
    assert_eq!(report.destination_index, 3);
}

#[tokio::test]
async fn test_failed_fallback_is_fatal_and_closes_session() {
    let s = Script {
        load_fails: true,
        reload_fails: true,
        current_scene: Some("BorregasAve".into()),
        ..script()
    };
    let (result, calls) = run_scenario(ScenarioConfig::default(), s).await;

    assert!(matches!(result, Err(ScenarioError::Remote { .. })));
    assert!(!calls.contains(&Call::SpawnPoints));
    assert_eq!(calls.last(), Some(&Call::CloseSimulator));
}

#[tokio::test]
async fn test_collision_aborts_run_and_releases_sessions() {
    let s = Script {
        collision: Some(("ego-uid".into(), Some("npc-42".into()))),
        ..script()
    };
    let (result, calls) = run_scenario(ScenarioConfig::default(), s).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ScenarioError::Collision { .. }));
    let msg = err.to_string();
    assert!(msg.contains("ego-uid"));
    assert!(msg.contains("npc-42"));

    let tail = &calls[calls.len() - 3..];
    assert_eq!(tail, &[Call::Run(120.0), Call::CloseDashboard, Call::CloseSimulator]);
}

#[tokio::test]
async fn test_collision_with_environment_names_obstacle() {
    let s = Script {
        collision: Some(("ego-uid".into(), None)),
        ..script()
    };
    let (result, _calls) = run_scenario(ScenarioConfig::default(), s).await;
    let msg = result.unwrap_err().to_string();
    assert!(msg.contains("ego-uid"));
    assert!(msg.contains(STATIC_OBSTACLE));
}

#[tokio::test]
async fn test_no_spawn_points_is_fatal() {
    let s = Script {
        spawns: Vec::new(),
        ..script()
    };
    let (result, calls) = run_scenario(ScenarioConfig::default(), s).await;

    assert!(matches!(result, Err(ScenarioError::EmptySelection { .. })));
    assert!(!calls.iter().any(|c| matches!(c, Call::AddAgent(..))));
    assert!(!calls.iter().any(|c| matches!(c, Call::OpenDashboard(..))));
    assert_eq!(calls.last(), Some(&Call::CloseSimulator));
}

#[tokio::test]
async fn test_spawn_without_destinations_is_fatal() {
    let s = Script {
        spawns: spawns(3, 0),
        ..script()
    };
    let (result, calls) = run_scenario(ScenarioConfig::default(), s).await;

    match result {
        Err(ScenarioError::EmptySelection { what }) => assert_eq!(what, "destinations"),
        other => panic!("expected EmptySelection, got {:?}", other),
    }
    assert!(!calls.contains(&Call::Run(120.0)));
    assert_eq!(
        &calls[calls.len() - 2..],
        &[Call::CloseDashboard, Call::CloseSimulator]
    );
}

#[tokio::test]
async fn test_unreachable_simulator_is_fatal() {
    let s = Script {
        simulator_unreachable: true,
        ..script()
    };
    let config = ScenarioConfig {
        simulator_host: "10.0.0.9".into(),
        simulator_port: 9999,
        ..ScenarioConfig::default()
    };
    let (result, calls) = run_scenario(config, s).await;

    match result {
        Err(ScenarioError::Connection { endpoint, .. }) => assert_eq!(endpoint, "ws://10.0.0.9:9999"),
        other => panic!("expected Connection error, got {:?}", other),
    }
    assert_eq!(calls, vec![Call::OpenSimulator("10.0.0.9".into(), 9999)]);
}

#[tokio::test]
async fn test_unreachable_simulator_is_logged() {
    let s = Script {
        simulator_unreachable: true,
        ..script()
    };
    let capture = Arc::new(Capture { lines: Mutex::new(Vec::new()) });
    let (result, _) = run_logged(ScenarioConfig::default(), s, capture.clone()).await;
    assert!(result.is_err());

    let lines = capture.lines.lock().unwrap();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("ERR:Scenario aborted: "));
}
