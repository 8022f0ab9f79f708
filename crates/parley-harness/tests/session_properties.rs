//! Property tests over arbitrary user, network and directory interleavings.
//!
//! Standard invariants are asserted by the driver before every event; these
//! properties additionally check that what is displayed matches the session
//! once everything has settled.

use parley_app::{Runtime, SessionConfig, SessionEvent, Topic, UserId, UserRecord};
use parley_harness::{InvariantRegistry, SimDirectory, SimDriver};
use parley_proto::ChatPayload;
use proptest::prelude::*;

const OWN_ID: UserId = 7;
const PEERS: [UserId; 3] = [3, 9, 11];

#[derive(Debug, Clone)]
enum Op {
    Deliver { sender: UserId, content: String },
    DeliverGarbage,
    Select(UserId),
    Submit(String),
    DropPeer(UserId),
    HoldDirectory(bool),
    Release(usize),
    ReleaseNewestFirst,
    ChannelClosed,
}

fn any_sender() -> impl Strategy<Value = UserId> {
    prop_oneof![Just(3), Just(9), Just(11), Just(42)]
}

fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (any_sender(), "[a-z]{1,6}").prop_map(|(sender, content)| Op::Deliver { sender, content }),
        1 => Just(Op::DeliverGarbage),
        3 => any_sender().prop_map(Op::Select),
        3 => "[ a-z]{0,6}".prop_map(Op::Submit),
        1 => prop::sample::select(PEERS.to_vec()).prop_map(Op::DropPeer),
        1 => any::<bool>().prop_map(Op::HoldDirectory),
        2 => (0usize..4).prop_map(Op::Release),
        1 => Just(Op::ReleaseNewestFirst),
        1 => Just(Op::ChannelClosed),
    ]
}

fn directory() -> SimDirectory {
    SimDirectory::with_users([
        UserRecord::new(OWN_ID, "Alice", "Smith"),
        UserRecord::new(3, "Bob", "Jones"),
        UserRecord::new(9, "Carol", "White"),
        UserRecord::new(11, "Dave", "Brown"),
    ])
}

fn apply(sim: &SimDriver, op: Op) {
    match op {
        Op::Deliver { sender, content } => sim.deliver(sender, OWN_ID, &content),
        Op::DeliverGarbage => sim.deliver_raw(&Topic::broadcast(), "not json"),
        Op::Select(peer_id) => sim.select(peer_id),
        Op::Submit(content) => sim.submit(&content),
        Op::DropPeer(peer_id) => sim.update_directory(|dir| dir.users.retain(|u| u.id != peer_id)),
        Op::HoldDirectory(hold) => sim.hold_directory(hold),
        Op::Release(index) => {
            sim.release(index);
        },
        Op::ReleaseNewestFirst => sim.release_newest_first(),
        Op::ChannelClosed => sim.inject_event(SessionEvent::ChannelClosed),
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn surface_converges_to_session(ops in prop::collection::vec(any_op(), 1..40)) {
        block_on(async move {
            let sim = SimDriver::new(directory()).with_invariants(InvariantRegistry::standard());
            let mut runtime = Runtime::new(sim.clone(), SessionConfig::default());
            runtime.bootstrap("Alice", "Smith").await.unwrap();
            runtime.pump().await.unwrap();

            for op in ops {
                apply(&sim, op);
                runtime.pump().await.unwrap();
            }
            sim.hold_directory(false);
            sim.release_all();
            runtime.pump().await.unwrap();

            let session = runtime.session();
            let surface = sim.surface();
            prop_assert_eq!(session.parked_messages(), 0);

            let displayed: Vec<_> =
                surface.roster.iter().map(|e| (e.peer_id, e.unread, e.selected)).collect();
            let expected: Vec<_> =
                session.roster().peers().iter().map(|p| (p.id, p.unread, p.selected)).collect();
            prop_assert_eq!(displayed, expected);

            prop_assert_eq!(&surface.transcript[..], session.conversation().entries());
            prop_assert_eq!(surface.composer_visible, session.composer_visible());
            prop_assert!(session.roster().peers().iter().all(|p| p.id != OWN_ID));
            Ok(())
        })?;
    }

    #[test]
    fn published_messages_are_never_blank(ops in prop::collection::vec(any_op(), 1..40)) {
        block_on(async move {
            let sim = SimDriver::new(directory()).with_invariants(InvariantRegistry::standard());
            let mut runtime = Runtime::new(sim.clone(), SessionConfig::default());
            runtime.bootstrap("Alice", "Smith").await.unwrap();
            runtime.pump().await.unwrap();

            for op in ops {
                apply(&sim, op);
                runtime.pump().await.unwrap();
            }

            for (topic, body) in sim.published() {
                prop_assert_eq!(topic, Topic::send());
                let payload = ChatPayload::from_json(&body).unwrap();
                prop_assert_eq!(payload.sender_id, OWN_ID);
                prop_assert!(PEERS.contains(&payload.recipient_id));
                prop_assert!(!payload.content.trim().is_empty());
                prop_assert_eq!(payload.content.trim(), payload.content.as_str());
            }
            Ok(())
        })?;
    }
}
