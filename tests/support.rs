#![allow(unused)]

use otrkeys::session::crypto::DhKeyPair;
use otrkeys::session::CounterLayout;
use otrkeys::{KeyScheduleConfig, SessionKeys, Slot};

pub struct TestKit {}

impl TestKit {
    #[inline(always)]
    pub fn gen_key_pair() -> DhKeyPair {
        DhKeyPair::generate()
    }

    /// Two slots for opposite ends of the same key exchange.
    pub fn gen_peers(layout: CounterLayout) -> (SessionKeys, SessionKeys) {
        let cfg = KeyScheduleConfig::default().counter_layout(layout);
        let (alice_pair, bob_pair) = (
        cfg.generate_key_pair().unwrap(),
        cfg.generate_key_pair().unwrap(),
    );

        let mut alice = SessionKeys::with_config(Slot::Current, Slot::Current, &cfg);
        let mut bob = SessionKeys::with_config(Slot::Current, Slot::Current, &cfg);
        alice
            .set_remote_public_key(bob_pair.public().clone(), 1)
            .unwrap();
        bob.set_remote_public_key(alice_pair.public().clone(), 1)
            .unwrap();
        alice.set_local_pair(alice_pair, 1).unwrap();
        bob.set_local_pair(bob_pair, 1).unwrap();
        (alice, bob)
    }

    pub fn init_tracing() {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        let _ = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "trace".into()),
            ))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    }
}

/// A data message as the session layer would assemble it.
pub struct DataMessage {
    pub sender_key_id: u32,
    pub recipient_key_id: u32,
    pub counter: [u8; 8],
    pub ciphertext: Vec<u8>,
    pub mac: [u8; 20],
}

impl DataMessage {
    pub fn authenticated_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.sender_key_id.to_be_bytes());
        buf.extend_from_slice(&self.recipient_key_id.to_be_bytes());
        buf.extend_from_slice(&self.counter);
        buf.extend_from_slice(&self.ciphertext);
        buf
    }
}
