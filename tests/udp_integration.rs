use std::time::{Duration, Instant};

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

use race_game::game::player::{Player, PlayerId, PlayerPosition};
use race_game::game::receiver::{CommandReceiverPlugin, MessagingNode, VelocityMailbox};
use race_game::game::input::GridEditPlugin;
use race_game::game::simulation::RaceSimulationPlugin;
use race_game::game::RunState;
use race_game::messaging::{Node, Twist, UdpPublisher, UdpTransport};

#[test]
fn test_udp_command_drives_player_two() {
    let transport = UdpTransport::bind("127.0.0.1:0").unwrap();
    let addr = transport.local_addr();

    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    app.init_state::<RunState>();
    app.insert_resource(MessagingNode(Node::new("udp_test_node", transport)));
    app.add_plugins((RaceSimulationPlugin, GridEditPlugin, CommandReceiverPlugin));
    app.update();

    let publisher = UdpPublisher::connect(addr).unwrap();
    publisher.publish("player2/cmd_vel", Twist::planar(0.0, -4.0)).unwrap();
    // Unknown topics and stray datagrams must not disturb delivery.
    publisher.publish("player9/cmd_vel", Twist::planar(1.0, 1.0)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while app.world().resource::<VelocityMailbox>().velocity(PlayerId::Two) == Vec2::ZERO {
        assert!(Instant::now() < deadline, "command never arrived");
        app.update();
    }
    assert_eq!(app.world().resource::<VelocityMailbox>().velocity(PlayerId::One), Vec2::ZERO);

    for _ in 0..5 {
        app.world_mut().run_schedule(FixedUpdate);
    }

    let mut query = app.world_mut().query::<(&Player, &PlayerPosition)>();
    for (player, pos) in query.iter(app.world()) {
        match player.0 {
            PlayerId::One => assert_eq!(pos.0, Vec2::new(100.0, 300.0)),
            PlayerId::Two => assert_eq!(pos.0, Vec2::new(200.0, 280.0)),
        }
    }
}

#[test]
fn test_stray_datagram_is_skipped() {
    let transport = UdpTransport::bind("127.0.0.1:0").unwrap();
    let addr = transport.local_addr();
    let mut node = Node::new("stray_test_node", transport);

    let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = seen.clone();
    node.subscribe("player1/cmd_vel", move |twist: &Twist| sink.lock().unwrap().push(*twist));

    let raw = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    raw.send_to(b"not a command", addr).unwrap();
    UdpPublisher::connect(addr).unwrap().publish("player1/cmd_vel", Twist::planar(2.0, 0.0)).unwrap();

    let deadline = Instant::now() + Duration::from_secs(2);
    while seen.lock().unwrap().is_empty() {
        assert!(Instant::now() < deadline, "command never arrived");
        node.spin_once(Duration::from_millis(50)).unwrap();
    }
    assert_eq!(seen.lock().unwrap().as_slice(), &[Twist::planar(2.0, 0.0)]);
}
