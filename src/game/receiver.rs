/// Command receiver: turns velocity messages into the per-player mailbox the
/// simulation samples every tick.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bevy::prelude::*;

use crate::game::config::RaceConfig;
use crate::game::player::PlayerId;
use crate::game::RunState;
use crate::messaging::{Node, Twist};

/// Latest velocity per player. Writers overwrite, readers never block on an
/// empty slot: before the first message every slot holds `Vec2::ZERO`.
///
/// Cloning shares the same storage, which is how the node's handlers and the
/// tick systems see one mailbox.
#[derive(Resource, Clone, Default, Debug)]
pub struct VelocityMailbox(Arc<Mutex<[Vec2; 2]>>);

impl VelocityMailbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn velocity(&self, player: PlayerId) -> Vec2 {
        let slots = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        slots[player.index()]
    }

    pub fn store(&self, player: PlayerId, velocity: Vec2) {
        let mut slots = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        slots[player.index()] = velocity;
    }

    /// Keep the planar linear part of a twist; everything else is ignored.
    pub fn on_twist(&self, player: PlayerId, twist: &Twist) {
        self.store(player, Vec2::new(twist.linear.x as f32, twist.linear.y as f32));
    }

    /// Subscription callback writing into this mailbox.
    pub fn handler(&self, player: PlayerId) -> impl FnMut(&Twist) + Send + Sync + 'static {
        let mailbox = self.clone();
        move |twist: &Twist| mailbox.on_twist(player, twist)
    }
}

/// The messaging node owned by the app.
#[derive(Resource)]
pub struct MessagingNode(pub Node);

/// Subscribe one handler per player topic.
pub fn attach_receiver(node: &mut Node, mailbox: &VelocityMailbox, config: &RaceConfig) {
    for id in PlayerId::ALL {
        node.subscribe(id.topic(config), mailbox.handler(id));
    }
}

pub struct CommandReceiverPlugin;

impl Plugin for CommandReceiverPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<VelocityMailbox>()
           .add_systems(Startup, register_velocity_handlers)
           .add_systems(Last, spin_node.run_if(in_state(RunState::Running)))
           .add_systems(OnEnter(RunState::Stopped), shutdown_node);
    }
}

fn register_velocity_handlers(
    node: Option<ResMut<MessagingNode>>,
    mailbox: Res<VelocityMailbox>,
    config: Res<RaceConfig>,
) {
    let Some(mut node) = node else {
        warn!("No messaging node; players will not receive velocity commands");
        return;
    };
    attach_receiver(&mut node.0, &mailbox, &config);
}

/// Let the node deliver pending messages, waiting at most the configured
/// spin timeout.
pub fn spin_node(node: Option<ResMut<MessagingNode>>, config: Res<RaceConfig>) {
    let Some(mut node) = node else { return };
    match node.0.spin_once(Duration::from_millis(config.spin_timeout_ms)) {
        Ok(0) => {}
        Ok(delivered) => debug!("Delivered {} velocity message(s)", delivered),
        Err(e) => warn!("Spinning node '{}' failed: {}", node.0.name(), e),
    }
}

fn shutdown_node(node: Option<ResMut<MessagingNode>>) {
    if let Some(mut node) = node {
        node.0.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messaging::LoopbackTransport;

    #[test]
    fn test_fresh_mailbox_reads_zero() {
        let mailbox = VelocityMailbox::new();
        for id in PlayerId::ALL {
            assert_eq!(mailbox.velocity(id), Vec2::ZERO);
        }
    }

    #[test]
    fn test_last_write_wins_per_player() {
        let mailbox = VelocityMailbox::new();
        mailbox.store(PlayerId::One, Vec2::new(1.0, 1.0));
        mailbox.store(PlayerId::One, Vec2::new(5.0, 0.0));

        assert_eq!(mailbox.velocity(PlayerId::One), Vec2::new(5.0, 0.0));
        assert_eq!(mailbox.velocity(PlayerId::Two), Vec2::ZERO);
    }

    #[test]
    fn test_handlers_route_topics_to_players() {
        let config = RaceConfig::default();
        let mailbox = VelocityMailbox::new();
        let (transport, publisher) = LoopbackTransport::new(config.qos_depth);
        let mut node = Node::new(config.node_name.clone(), transport);
        attach_receiver(&mut node, &mailbox, &config);

        let mut twist = Twist::planar(0.0, 3.0);
        twist.angular.z = 9.0;
        publisher.publish("player2/cmd_vel", twist);
        publisher.publish("player3/cmd_vel", Twist::planar(7.0, 7.0));

        assert_eq!(node.spin_once(Duration::ZERO).unwrap(), 1);
        assert_eq!(mailbox.velocity(PlayerId::One), Vec2::ZERO);
        assert_eq!(mailbox.velocity(PlayerId::Two), Vec2::new(0.0, 3.0));
    }
}
