//! Shared keys and fixtures for the recode pipeline tests.

#![allow(dead_code)]

use std::sync::OnceLock;

use snaprecode_core::types::{AggregatedSnapshot, Brigade, ControlNode, ReservationConfig};
use snaprecode_crypto::{AuthorityKey, MasterKeypair, RsaPrivateKey};
use snaprecode_plan::testutil::Exporter;

pub use snaprecode_plan::testutil::{sealed_to, TAG};

pub const MIB: usize = 1024 * 1024;

pub struct Fixture {
    /// Source datacenter authority (opens the bundle)
    pub authority: AuthorityKey,
    /// Destination authority (opens the plan)
    pub destination: AuthorityKey,
    pub master: MasterKeypair,
    /// One router key pair per destination node, by index
    pub routers: Vec<MasterKeypair>,
}

pub fn fixture() -> &'static Fixture {
    static FX: OnceLock<Fixture> = OnceLock::new();
    FX.get_or_init(|| {
        let rsa = || RsaPrivateKey::new(&mut rand::thread_rng(), 1024).unwrap();
        Fixture {
            authority: AuthorityKey::from_private(rsa()).unwrap(),
            destination: AuthorityKey::from_private(rsa()).unwrap(),
            master: MasterKeypair::generate(),
            routers: (0..3).map(|_| MasterKeypair::generate()).collect(),
        }
    })
}

pub fn exporter() -> Exporter<'static> {
    let fx = fixture();
    Exporter {
        authority: &fx.authority,
        master: &fx.master,
    }
}

pub fn live_brigade(id: &str, addr: &str) -> Brigade {
    exporter().live_brigade(id, addr)
}

pub fn bundle(brigades: &[Brigade]) -> AggregatedSnapshot {
    exporter().bundle(brigades)
}

/// Reservation with node `i` using router key pair `i`.
pub fn reservation(nodes: Vec<(&str, Vec<&str>)>) -> ReservationConfig {
    let fx = fixture();
    ReservationConfig {
        reservation_id: "resv-42".into(),
        plan: nodes
            .into_iter()
            .enumerate()
            .map(|(i, (control_ip, slots))| ControlNode {
                control_ip: control_ip.into(),
                router_public_key: fx.routers[i].router_key().to_wire(),
                slots: slots.iter().map(|s| s.parse().unwrap()).collect(),
            })
            .collect(),
    }
}
