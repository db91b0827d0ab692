use game_server_panel::config::{ConfigData, ServiceConfig};
use game_server_panel::status::{FALLBACK_STATUS, INITIAL_STATUS};
use game_server_panel::widget::{refresh_deadline, ServiceWidget};
use game_server_panel::{cli, Command, PanelError, Transport};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::{Duration, Instant};

const ON_WITH_PLAYERS: &str = r#"{"state":"On","players":{"count":3,"name_tags":["A","B"]}}"#;
const ON_EMPTY: &str = r#"{"state":"On","players":{"count":0,"name_tags":[]}}"#;
const OFF: &str = r#"{"state":"Off","players":{"count":0,"name_tags":[]}}"#;

// Records every request and answers GETs from a queue
#[derive(Default)]
struct FakeTransport {
    posts: Mutex<Vec<String>>,
    gets: Mutex<Vec<String>>,
    bodies: Mutex<VecDeque<Result<String, PanelError>>>,
    fail_posts: bool,
}

impl FakeTransport {
    fn answering(bodies: &[&str]) -> Self {
        let transport = Self::default();
        {
            let mut queue = transport.bodies.lock().unwrap();
            for body in bodies {
                queue.push_back(Ok(body.to_string()));
            }
        }
        transport
    }

    fn push_error(&self, status: u16) {
        self.bodies.lock().unwrap().push_back(Err(PanelError::Status {
            path: "/arma/get_status".to_string(),
            status,
        }));
    }

    fn posts(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }

    fn gets(&self) -> Vec<String> {
        self.gets.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn send_post(&self, path: &str) -> Result<(), PanelError> {
        self.posts.lock().unwrap().push(path.to_string());
        if self.fail_posts {
            Err(PanelError::Status {
                path: path.to_string(),
                status: 500,
            })
        } else {
            Ok(())
        }
    }

    fn get_text(&self, path: &str) -> Result<String, PanelError> {
        self.gets.lock().unwrap().push(path.to_string());
        self.bodies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(OFF.to_string()))
    }
}

fn arma() -> ServiceWidget {
    ServiceWidget::new(ServiceConfig::new("arma", "Arma"))
}

fn quick_config() -> ConfigData {
    ConfigData {
        refresh_delay_ms: 0,
        ..ConfigData::default()
    }
}

#[test]
fn test_new_widget_is_off() {
    let widget = arma();

    assert!(!widget.is_running());
    assert_eq!(widget.status_text(), INITIAL_STATUS);
    assert!(widget.last_error().is_none());
    assert!(widget.last_updated().is_none());
    assert!(widget.next_scheduled_refresh().is_none());
}

#[test]
fn test_paths_follow_endpoint() {
    let mut config = ServiceConfig::new("mc", "Minecraft");
    config.endpoint = "minecraft".to_string();
    let widget = ServiceWidget::new(config);

    assert_eq!(widget.command_path(game_server_panel::ServiceAction::Start), "/minecraft/start");
    assert_eq!(widget.command_path(game_server_panel::ServiceAction::Stop), "/minecraft/stop");
    assert_eq!(widget.status_path(), "/minecraft/get_status");
}

#[test]
fn test_unforced_refresh_skipped_while_off() {
    let transport = FakeTransport::answering(&[ON_WITH_PLAYERS]);
    let mut widget = arma();

    let performed = widget.refresh(false, &transport).expect("refresh");

    assert!(!performed);
    assert!(transport.gets().is_empty());
    assert_eq!(widget.status_text(), INITIAL_STATUS);
}

#[test]
fn test_forced_refresh_always_fetches() {
    let transport = FakeTransport::answering(&[OFF, OFF]);
    let mut widget = arma();

    assert!(widget.refresh(true, &transport).expect("refresh"));
    assert!(widget.refresh(true, &transport).expect("refresh"));

    assert_eq!(transport.gets(), vec!["/arma/get_status", "/arma/get_status"]);
    assert!(!widget.is_running());
    assert_eq!(widget.status_text(), "Status: Off");
}

#[test]
fn test_refresh_tracks_running_flag() {
    let transport = FakeTransport::answering(&[ON_WITH_PLAYERS, ON_EMPTY, OFF]);
    let mut widget = arma();

    widget.refresh(true, &transport).expect("refresh");
    assert!(widget.is_running());
    assert_eq!(widget.status_text(), "Status: On, Player count: 3, Player nametags: A,B");
    assert!(widget.last_updated().is_some());

    // Running, so an unforced refresh goes out
    assert!(widget.refresh(false, &transport).expect("refresh"));
    assert_eq!(widget.status_text(), "Status: On, Player count: 0");

    assert!(widget.refresh(false, &transport).expect("refresh"));
    assert!(!widget.is_running());
    assert_eq!(widget.status_text(), "Status: Off");

    // Off again, polling stops
    assert!(!widget.refresh(false, &transport).expect("refresh"));
    assert_eq!(transport.gets().len(), 3);
}

#[test]
fn test_failed_refresh_shows_fallback() {
    let transport = FakeTransport::answering(&[ON_EMPTY]);
    let mut widget = arma();
    widget.refresh(true, &transport).expect("refresh");
    assert!(widget.is_running());

    transport.push_error(503);
    let result = widget.refresh(false, &transport);

    assert!(matches!(result, Err(PanelError::Status { status: 503, .. })));
    assert_eq!(widget.status_text(), FALLBACK_STATUS);
    assert_eq!(widget.last_error(), Some("/arma/get_status answered with HTTP 503"));
    // Still believed running, so polling keeps trying
    assert!(widget.is_running());

    transport.bodies.lock().unwrap().push_back(Ok(OFF.to_string()));
    widget.refresh(false, &transport).expect("refresh");
    assert!(widget.last_error().is_none());
    assert_eq!(widget.status_text(), "Status: Off");
}

#[test]
fn test_malformed_payload_shows_fallback() {
    let transport = FakeTransport::answering(&["<html>502 Bad Gateway</html>"]);
    let mut widget = arma();

    let result = widget.refresh(true, &transport);

    assert!(matches!(result, Err(PanelError::Payload(_))));
    assert_eq!(widget.status_text(), FALLBACK_STATUS);
    assert!(widget.last_error().is_some());
    assert!(!widget.is_running());
}

#[test]
fn test_stale_response_is_dropped() {
    let mut widget = arma();

    let first = widget.begin_refresh(true).expect("forced refresh");
    let second = widget.begin_refresh(true).expect("forced refresh");
    assert!(second > first);

    // The newer request completes first
    widget.apply_response(second, Ok(OFF.to_string())).expect("apply");
    widget
        .apply_response(first, Ok(ON_WITH_PLAYERS.to_string()))
        .expect("stale responses are ignored");

    assert!(!widget.is_running());
    assert_eq!(widget.status_text(), "Status: Off");
}

#[test]
fn test_stale_error_is_dropped() {
    let mut widget = arma();
    let first = widget.begin_refresh(true).expect("forced refresh");
    let second = widget.begin_refresh(true).expect("forced refresh");

    widget.apply_response(second, Ok(ON_EMPTY.to_string())).expect("apply");
    let stale = Err(PanelError::Status {
        path: "/arma/get_status".to_string(),
        status: 504,
    });
    assert!(widget.apply_response(first, stale).is_ok());

    assert!(widget.last_error().is_none());
    assert_eq!(widget.status_text(), "Status: On, Player count: 0");
}

#[test]
fn test_start_posts_and_schedules_refresh() {
    let transport = FakeTransport::default();
    let mut widget = arma();
    let before = Instant::now();

    widget.start(&transport, Duration::from_secs(1)).expect("start");

    assert_eq!(transport.posts(), vec!["/arma/start"]);
    // Neither the flag nor the text changes until a refresh applies
    assert!(!widget.is_running());
    assert_eq!(widget.status_text(), INITIAL_STATUS);

    let deadline = widget.next_scheduled_refresh().expect("refresh scheduled");
    assert!(deadline >= before + Duration::from_secs(1));
    assert!(!widget.take_due_refresh(before));
    assert!(widget.take_due_refresh(deadline));
    assert!(widget.next_scheduled_refresh().is_none());
}

#[test]
fn test_failed_stop_still_schedules_refresh() {
    let transport = FakeTransport {
        fail_posts: true,
        ..FakeTransport::default()
    };
    let mut widget = arma();

    let result = widget.stop(&transport, Duration::ZERO);

    assert!(matches!(result, Err(PanelError::Status { status: 500, .. })));
    assert_eq!(transport.posts(), vec!["/arma/stop"]);
    assert!(widget.next_scheduled_refresh().is_some());
}

#[test]
fn test_each_command_schedules_its_own_refresh() {
    let mut widget = arma();
    let now = Instant::now();

    widget.queue_command(game_server_panel::ServiceAction::Start, now + Duration::from_secs(1));
    widget.queue_command(game_server_panel::ServiceAction::Stop, now + Duration::from_secs(3));

    assert!(widget.take_due_refresh(now + Duration::from_secs(2)));
    assert_eq!(widget.next_scheduled_refresh(), Some(now + Duration::from_secs(3)));
    assert!(!widget.take_due_refresh(now + Duration::from_secs(2)));
    assert!(widget.take_due_refresh(now + Duration::from_secs(3)));
}

#[test]
fn test_cli_status() {
    let transport = FakeTransport::answering(&[ON_WITH_PLAYERS]);
    let mut out = Vec::new();

    cli::run(
        &Command::Status { service: "minecraft".to_string() },
        &quick_config(),
        &transport,
        &mut out,
    )
    .expect("status");

    assert_eq!(transport.gets(), vec!["/minecraft/get_status"]);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Status: On, Player count: 3, Player nametags: A,B\n"
    );
}

#[test]
fn test_cli_start_refreshes_after_command() {
    let transport = FakeTransport::answering(&[ON_EMPTY]);
    let mut out = Vec::new();

    cli::run(
        &Command::Start { service: "arma".to_string() },
        &quick_config(),
        &transport,
        &mut out,
    )
    .expect("start");

    assert_eq!(transport.posts(), vec!["/arma/start"]);
    assert_eq!(transport.gets(), vec!["/arma/get_status"]);
    assert_eq!(String::from_utf8(out).unwrap(), "Status: On, Player count: 0\n");
}

#[test]
fn test_cli_stop_reports_status_even_if_post_fails() {
    let transport = FakeTransport {
        fail_posts: true,
        ..FakeTransport::answering(&[OFF])
    };
    let mut out = Vec::new();

    cli::run(
        &Command::Stop { service: "arma".to_string() },
        &quick_config(),
        &transport,
        &mut out,
    )
    .expect("stop");

    assert_eq!(transport.posts(), vec!["/arma/stop"]);
    assert_eq!(String::from_utf8(out).unwrap(), "Status: Off\n");
}

#[test]
fn test_cli_unknown_service() {
    let transport = FakeTransport::default();
    let mut out = Vec::new();

    let result = cli::run(
        &Command::Status { service: "factorio".to_string() },
        &quick_config(),
        &transport,
        &mut out,
    );

    assert!(matches!(result, Err(PanelError::UnknownService(ref name)) if name == "factorio"));
    assert!(transport.gets().is_empty());
    assert!(out.is_empty());
}

#[test]
fn test_cli_services_marks_configured() {
    let transport = FakeTransport::answering(&[r#"["minecraft","arma","factorio"]"#]);
    let mut out = Vec::new();

    cli::run(&Command::Services, &quick_config(), &transport, &mut out).expect("services");

    assert_eq!(transport.gets(), vec!["/available-servers"]);
    assert_eq!(String::from_utf8(out).unwrap(), "*minecraft\n*arma\n factorio\n");
}

#[test]
fn test_cli_services_rejects_malformed_list() {
    let transport = FakeTransport::answering(&[r#"{"state":"On"}"#]);
    let mut out = Vec::new();

    let result = cli::run(&Command::Services, &quick_config(), &transport, &mut out);

    let err = result.expect_err("an object is not a service list");
    assert!(matches!(err, PanelError::Discovery(_)));
    assert!(err.to_string().starts_with("malformed service list"));
    assert!(out.is_empty());
}

#[test]
fn test_unrepresentable_delay_refreshes_at_once() {
    let transport = FakeTransport::default();
    let mut widget = arma();

    widget.start(&transport, Duration::MAX).expect("start");

    assert_eq!(transport.posts(), vec!["/arma/start"]);
    assert!(widget.take_due_refresh(Instant::now()));

    let now = Instant::now();
    assert_eq!(refresh_deadline(now, Duration::MAX), now);
    assert_eq!(refresh_deadline(now, Duration::from_secs(1)), now + Duration::from_secs(1));
}
