//! Placement Planner: assigns each brigade exactly one destination slot.
//!
//! Two algorithms:
//! - **mirrored**: a brigade keeps its current address (or its pin); the first
//!   node declaring that address takes it.
//! - **sequential**: nodes and slots are walked in declaration order and each
//!   slot takes the next brigade in input order.
//!
//! All state (used slots, cursor) lives in a [`Placement`] built per call.

use std::collections::{BTreeMap, HashSet};
use std::net::Ipv4Addr;

use snaprecode_core::config::PlacementPolicy;
use snaprecode_core::types::{
    Brigade, PinMap, PreparedSnapshot, ReservationConfig, RestoreNodeConfig, RestorePlan,
};
use snaprecode_core::{RecodeError, RecodeResult};
use snaprecode_crypto::RouterKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    Mirrored,
    Sequential,
}

/// A destination node with its parsed router key.
#[derive(Debug, Clone)]
pub struct Node {
    pub control_ip: String,
    pub router_key: RouterKey,
    pub slots: Vec<Ipv4Addr>,
}

/// Parsed reservation: nodes in declaration order.
#[derive(Debug, Clone)]
pub struct Topology {
    pub reservation_id: String,
    pub nodes: Vec<Node>,
}

impl Topology {
    pub fn from_reservation(reservation: &ReservationConfig) -> RecodeResult<Self> {
        let nodes = reservation
            .plan
            .iter()
            .map(|n| {
                let router_key = RouterKey::from_wire(&n.router_public_key).map_err(|e| {
                    RecodeError::InvalidKey(format!("router key of node {}: {e}", n.control_ip))
                })?;
                Ok(Node {
                    control_ip: n.control_ip.clone(),
                    router_key,
                    slots: n.slots.clone(),
                })
            })
            .collect::<RecodeResult<Vec<_>>>()?;

        Ok(Self {
            reservation_id: reservation.reservation_id.clone(),
            nodes,
        })
    }

    pub fn total_slots(&self) -> usize {
        self.nodes.iter().map(|n| n.slots.len()).sum()
    }

    /// Index of the first node that declares `addr`.
    pub fn locate(&self, addr: Ipv4Addr) -> Option<usize> {
        self.nodes.iter().position(|n| n.slots.contains(&addr))
    }

    /// Validate pins against the topology and the brigades actually present.
    ///
    /// Pins naming unknown brigades are logged and dropped.
    pub fn check_pins<'a>(
        &self,
        pins: &PinMap,
        brigade_ids: impl IntoIterator<Item = &'a str>,
    ) -> RecodeResult<CheckedPins> {
        let present: HashSet<&str> = brigade_ids.into_iter().collect();
        let mut taken: BTreeMap<Ipv4Addr, &str> = BTreeMap::new();
        let mut applied = PinMap::new();

        for (brigade_id, &addr) in pins {
            if !present.contains(brigade_id.as_str()) {
                tracing::warn!(brigade_id = %brigade_id, addr = %addr, "pin for unknown brigade ignored");
                continue;
            }
            if self.locate(addr).is_none() {
                return Err(RecodeError::PinnedIpNotFound {
                    addr,
                    brigade_id: brigade_id.clone(),
                });
            }
            if taken.insert(addr, brigade_id).is_some() {
                return Err(RecodeError::PinnedIpDuplicated {
                    addr,
                    brigade_id: brigade_id.clone(),
                });
            }
            applied.insert(brigade_id.clone(), addr);
        }
        Ok(CheckedPins(applied))
    }
}

/// Pins accepted by [`Topology::check_pins`]: every address is in the
/// topology and no two pins share one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckedPins(PinMap);

impl CheckedPins {
    pub fn get(&self, brigade_id: &str) -> Option<Ipv4Addr> {
        self.0.get(brigade_id).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Produces the outbound unit for a brigade placed on `slot` of a node.
pub trait SlotEncoder {
    fn encode(
        &self,
        brigade: Brigade,
        slot: Ipv4Addr,
        router: &RouterKey,
    ) -> RecodeResult<PreparedSnapshot>;
}

/// Planning inputs besides the brigades themselves.
#[derive(Debug, Clone, Copy)]
pub struct PlanOptions<'a> {
    pub mode: PlacementMode,
    pub pins: &'a CheckedPins,
    pub policy: PlacementPolicy,
}

/// Place every brigade and collect the encoded results per node.
///
/// `opts.pins` must come from [`Topology::check_pins`] on the same topology.
/// Encode failures are logged and the brigade is dropped; its slot stays
/// empty. Placement failures follow `opts.policy`.
pub fn build_plan(
    topology: &Topology,
    realm_fingerprint: &str,
    brigades: Vec<Brigade>,
    opts: PlanOptions<'_>,
    encoder: &dyn SlotEncoder,
) -> RecodeResult<RestorePlan> {
    let mut placement = Placement::new(topology, encoder);

    match opts.mode {
        PlacementMode::Mirrored => placement.mirrored(brigades, opts.pins, opts.policy)?,
        PlacementMode::Sequential => placement.sequential(brigades, opts.pins)?,
    }

    let plan = placement.finish(realm_fingerprint);
    tracing::info!(
        reservation_id = %plan.reservation_id,
        mode = ?opts.mode,
        nodes = plan.plan.len(),
        placed = plan.plan.iter().map(|n| n.snapshots.len()).sum::<usize>(),
        "restore plan assembled"
    );
    Ok(plan)
}

struct Placement<'a> {
    topology: &'a Topology,
    encoder: &'a dyn SlotEncoder,
    used: Vec<HashSet<Ipv4Addr>>,
    placed: Vec<Vec<PreparedSnapshot>>,
}

impl<'a> Placement<'a> {
    fn new(topology: &'a Topology, encoder: &'a dyn SlotEncoder) -> Self {
        let n = topology.nodes.len();
        Self {
            topology,
            encoder,
            used: vec![HashSet::new(); n],
            placed: vec![Vec::new(); n],
        }
    }

    fn mirrored(
        &mut self,
        brigades: Vec<Brigade>,
        pins: &CheckedPins,
        policy: PlacementPolicy,
    ) -> RecodeResult<()> {
        for brigade in brigades {
            let addr = pins
                .get(&brigade.brigade_id)
                .unwrap_or(brigade.endpoint_ipv4);

            let node = match self.claim_mirrored(&brigade.brigade_id, addr) {
                Ok(node) => node,
                Err(e) if policy == PlacementPolicy::Skip => {
                    tracing::warn!(brigade_id = %brigade.brigade_id, addr = %addr, error = %e, "brigade not placed");
                    continue;
                }
                Err(e) => return Err(e),
            };
            self.encode_into(node, brigade, addr);
        }
        Ok(())
    }

    fn claim_mirrored(&mut self, brigade_id: &str, addr: Ipv4Addr) -> RecodeResult<usize> {
        let node = self
            .topology
            .locate(addr)
            .ok_or_else(|| RecodeError::MirroredIpNotFound {
                addr,
                brigade_id: brigade_id.to_string(),
            })?;
        if !self.used[node].insert(addr) {
            return Err(RecodeError::MirroredIpDuplicated {
                addr,
                brigade_id: brigade_id.to_string(),
            });
        }
        Ok(node)
    }

    fn sequential(&mut self, brigades: Vec<Brigade>, pins: &CheckedPins) -> RecodeResult<()> {
        let (pinned, queue): (Vec<_>, Vec<_>) = brigades
            .into_iter()
            .partition(|b| pins.get(&b.brigade_id).is_some());
        let pinned_count = pinned.len();

        for brigade in pinned {
            let Some(addr) = pins.get(&brigade.brigade_id) else {
                continue;
            };
            let node = self
                .topology
                .locate(addr)
                .ok_or_else(|| RecodeError::PinnedIpNotFound {
                    addr,
                    brigade_id: brigade.brigade_id.clone(),
                })?;
            self.used[node].insert(addr);
            self.encode_into(node, brigade, addr);
        }

        let topology = self.topology;
        let total = queue.len();
        let mut queue = queue.into_iter();
        let mut taken = 0;

        'nodes: for (node, n) in topology.nodes.iter().enumerate() {
            for &slot in &n.slots {
                if self.used[node].contains(&slot) {
                    continue;
                }
                let Some(brigade) = queue.next() else {
                    break 'nodes;
                };
                taken += 1;
                self.used[node].insert(slot);
                self.encode_into(node, brigade, slot);
            }
        }

        if taken < total {
            return Err(RecodeError::ReservationTooSmall {
                snapshots: pinned_count + total,
                slots: self.topology.total_slots(),
            });
        }
        Ok(())
    }

    fn encode_into(&mut self, node: usize, brigade: Brigade, slot: Ipv4Addr) {
        let brigade_id = brigade.brigade_id.clone();
        let topology = self.topology;
        let target = &topology.nodes[node];

        match self.encoder.encode(brigade, slot, &target.router_key) {
            Ok(prepared) => {
                tracing::debug!(brigade_id = %brigade_id, slot = %slot, control_ip = %target.control_ip, "placed");
                self.placed[node].push(prepared);
            }
            Err(e) => {
                let stage = e.stage().map_or_else(String::new, |s| s.to_string());
                tracing::warn!(
                    brigade_id = %brigade_id,
                    slot = %slot,
                    stage = %stage,
                    error = %e,
                    "skipping brigade"
                );
            }
        }
    }

    fn finish(self, realm_fingerprint: &str) -> RestorePlan {
        let plan = self
            .topology
            .nodes
            .iter()
            .zip(self.placed)
            .filter(|(_, snapshots)| !snapshots.is_empty())
            .map(|(node, snapshots)| RestoreNodeConfig {
                control_ip: node.control_ip.clone(),
                snapshots,
            })
            .collect();

        RestorePlan {
            reservation_id: self.topology.reservation_id.clone(),
            realm_fingerprint: realm_fingerprint.to_string(),
            plan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use snaprecode_core::Stage;
    use snaprecode_crypto::MasterKeypair;

    /// Encodes without crypto; fails for the listed brigade IDs.
    #[derive(Default)]
    struct StubEncoder {
        fail: HashSet<String>,
    }

    impl SlotEncoder for StubEncoder {
        fn encode(
            &self,
            brigade: Brigade,
            slot: Ipv4Addr,
            _router: &RouterKey,
        ) -> RecodeResult<PreparedSnapshot> {
            if self.fail.contains(&brigade.brigade_id) {
                return Err(RecodeError::DecryptionFailed("wg private key".into())
                    .in_brigade(&brigade.brigade_id, Stage::Recode));
            }
            Ok(PreparedSnapshot {
                domain_names: brigade.domain_names(),
                brigade_id: brigade.brigade_id,
                endpoint_ipv4: slot,
                encrypted_secret: String::new(),
                payload: String::new(),
            })
        }
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn brigade(id: &str, addr: &str) -> Brigade {
        serde_json::from_value(json!({"brigade_id": id, "endpoint_ipv4": addr})).unwrap()
    }

    fn topology(nodes: Vec<(&str, Vec<&str>)>) -> Topology {
        Topology {
            reservation_id: "r-1".into(),
            nodes: nodes
                .into_iter()
                .map(|(ctrl, slots)| Node {
                    control_ip: ctrl.to_string(),
                    router_key: MasterKeypair::generate().router_key(),
                    slots: slots.iter().map(|s| ip(s)).collect(),
                })
                .collect(),
        }
    }

    fn options(mode: PlacementMode, pins: &CheckedPins) -> PlanOptions<'_> {
        PlanOptions {
            mode,
            pins,
            policy: PlacementPolicy::Fatal,
        }
    }

    fn placements(plan: &RestorePlan) -> Vec<(String, String, Ipv4Addr)> {
        plan.plan
            .iter()
            .flat_map(|n| {
                n.snapshots
                    .iter()
                    .map(|s| (n.control_ip.clone(), s.brigade_id.clone(), s.endpoint_ipv4))
            })
            .collect()
    }

    #[test]
    fn test_single_brigade_both_modes() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);
        let pins = CheckedPins::default();

        for mode in [PlacementMode::Mirrored, PlacementMode::Sequential] {
            let plan = build_plan(
                &topo,
                "SHA256:realm",
                vec![brigade("b1", "10.0.0.5")],
                options(mode, &pins),
                &StubEncoder::default(),
            )
            .unwrap();

            assert_eq!(
                placements(&plan),
                vec![("192.0.2.1".into(), "b1".into(), ip("10.0.0.5"))],
                "mode {mode:?}"
            );
            assert_eq!(plan.reservation_id, "r-1");
            assert_eq!(plan.realm_fingerprint, "SHA256:realm");
        }
    }

    #[test]
    fn test_mirrored_keeps_addresses_across_nodes() {
        let topo = topology(vec![
            ("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"]),
            ("192.0.2.2", vec!["10.0.1.5"]),
        ]);
        let brigades = vec![brigade("b1", "10.0.1.5"), brigade("b2", "10.0.0.6")];

        let plan = build_plan(
            &topo,
            "",
            brigades,
            options(PlacementMode::Mirrored, &CheckedPins::default()),
            &StubEncoder::default(),
        )
        .unwrap();

        // nodes in declaration order, not discovery order
        assert_eq!(
            placements(&plan),
            vec![
                ("192.0.2.1".into(), "b2".into(), ip("10.0.0.6")),
                ("192.0.2.2".into(), "b1".into(), ip("10.0.1.5")),
            ]
        );
    }

    #[test]
    fn test_mirrored_duplicate_address_fails() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);
        let brigades = vec![brigade("b1", "10.0.0.5"), brigade("b2", "10.0.0.5")];

        let err = build_plan(
            &topo,
            "",
            brigades.clone(),
            options(PlacementMode::Mirrored, &CheckedPins::default()),
            &StubEncoder::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RecodeError::MirroredIpDuplicated { ref brigade_id, .. } if brigade_id == "b2"));

        let plan = build_plan(
            &topo,
            "",
            brigades,
            options(PlacementMode::Sequential, &CheckedPins::default()),
            &StubEncoder::default(),
        )
        .unwrap();
        assert_eq!(
            placements(&plan)
                .into_iter()
                .map(|(_, _, a)| a)
                .collect::<Vec<_>>(),
            vec![ip("10.0.0.5"), ip("10.0.0.6")]
        );
    }

    #[test]
    fn test_mirrored_unknown_address_fails() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5"])]);

        let err = build_plan(
            &topo,
            "",
            vec![brigade("b1", "10.9.9.9")],
            options(PlacementMode::Mirrored, &CheckedPins::default()),
            &StubEncoder::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RecodeError::MirroredIpNotFound { addr, .. } if addr == ip("10.9.9.9")));
    }

    #[test]
    fn test_skip_policy_drops_only_the_offender() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);
        let brigades = vec![
            brigade("b1", "10.0.0.5"),
            brigade("b2", "10.9.9.9"),
            brigade("b3", "10.0.0.5"),
            brigade("b4", "10.0.0.6"),
        ];
        let pins = CheckedPins::default();
        let opts = PlanOptions {
            policy: PlacementPolicy::Skip,
            ..options(PlacementMode::Mirrored, &pins)
        };

        let plan = build_plan(&topo, "", brigades, opts, &StubEncoder::default()).unwrap();
        let ids: Vec<_> = placements(&plan).into_iter().map(|(_, id, _)| id).collect();
        assert_eq!(ids, vec!["b1", "b4"]);
    }

    #[test]
    fn test_sequential_encode_failure_leaves_slot_empty() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6", "10.0.0.7"])]);
        let brigades = vec![
            brigade("b1", "172.16.0.1"),
            brigade("b2", "172.16.0.2"),
            brigade("b3", "172.16.0.3"),
        ];
        let encoder = StubEncoder {
            fail: HashSet::from(["b2".to_string()]),
        };

        let plan = build_plan(
            &topo,
            "",
            brigades,
            options(PlacementMode::Sequential, &CheckedPins::default()),
            &encoder,
        )
        .unwrap();

        // b2 consumed 10.0.0.6; b3 is not moved up into it
        assert_eq!(
            placements(&plan),
            vec![
                ("192.0.2.1".into(), "b1".into(), ip("10.0.0.5")),
                ("192.0.2.1".into(), "b3".into(), ip("10.0.0.7")),
            ]
        );
    }

    #[test]
    fn test_mirrored_encode_failure_is_skipped() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);
        let encoder = StubEncoder {
            fail: HashSet::from(["b1".to_string()]),
        };

        let plan = build_plan(
            &topo,
            "",
            vec![brigade("b1", "10.0.0.5"), brigade("b2", "10.0.0.6")],
            options(PlacementMode::Mirrored, &CheckedPins::default()),
            &encoder,
        )
        .unwrap();
        assert_eq!(placements(&plan).len(), 1);
        assert_eq!(plan.plan[0].snapshots[0].brigade_id, "b2");
    }

    #[test]
    fn test_empty_nodes_are_omitted() {
        let topo = topology(vec![
            ("192.0.2.1", vec!["10.0.0.5"]),
            ("192.0.2.2", vec!["10.0.1.5"]),
        ]);

        let plan = build_plan(
            &topo,
            "",
            vec![brigade("b1", "10.0.1.5")],
            options(PlacementMode::Mirrored, &CheckedPins::default()),
            &StubEncoder::default(),
        )
        .unwrap();
        assert_eq!(plan.plan.len(), 1);
        assert_eq!(plan.plan[0].control_ip, "192.0.2.2");
    }

    #[test]
    fn test_pins_override_mirror_target() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);
        let pins = topo
            .check_pins(&PinMap::from([("b1".to_string(), ip("10.0.0.6"))]), ["b1"])
            .unwrap();

        let plan = build_plan(
            &topo,
            "",
            vec![brigade("b1", "10.0.0.5")],
            options(PlacementMode::Mirrored, &pins),
            &StubEncoder::default(),
        )
        .unwrap();
        assert_eq!(plan.plan[0].snapshots[0].endpoint_ipv4, ip("10.0.0.6"));
    }

    #[test]
    fn test_pins_in_sequential_mode() {
        let topo = topology(vec![
            ("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"]),
            ("192.0.2.2", vec!["10.0.1.5"]),
        ]);
        let brigades = vec![
            brigade("b1", "172.16.0.1"),
            brigade("b2", "172.16.0.2"),
            brigade("b3", "172.16.0.3"),
        ];
        let pins = topo
            .check_pins(
                &PinMap::from([("b3".to_string(), ip("10.0.0.5"))]),
                brigades.iter().map(|b| b.brigade_id.as_str()),
            )
            .unwrap();

        let plan = build_plan(
            &topo,
            "",
            brigades,
            options(PlacementMode::Sequential, &pins),
            &StubEncoder::default(),
        )
        .unwrap();

        let mut got = placements(&plan);
        got.sort_by_key(|(_, _, addr)| *addr);
        assert_eq!(
            got,
            vec![
                ("192.0.2.1".into(), "b3".into(), ip("10.0.0.5")),
                ("192.0.2.1".into(), "b1".into(), ip("10.0.0.6")),
                ("192.0.2.2".into(), "b2".into(), ip("10.0.1.5")),
            ]
        );
    }

    #[test]
    fn test_pin_validation() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);

        let outside = PinMap::from([("b1".to_string(), ip("10.9.9.9"))]);
        let err = topo.check_pins(&outside, ["b1"]).unwrap_err();
        assert!(matches!(err, RecodeError::PinnedIpNotFound { .. }));

        let doubled = PinMap::from([
            ("b1".to_string(), ip("10.0.0.5")),
            ("b2".to_string(), ip("10.0.0.5")),
        ]);
        let err = topo.check_pins(&doubled, ["b1", "b2"]).unwrap_err();
        assert!(matches!(err, RecodeError::PinnedIpDuplicated { .. }));

        // a pin for a brigade that is not in the bundle is ignored
        let applied = topo.check_pins(&doubled, ["b1"]).unwrap();
        assert_eq!(applied.len(), 1);
        assert_eq!(applied.get("b1"), Some(ip("10.0.0.5")));
        assert_eq!(applied.get("b2"), None);
    }

    #[test]
    fn test_checked_pins_drive_placement_without_recheck() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5", "10.0.0.6"])]);
        let pins = topo
            .check_pins(
                &PinMap::from([
                    ("b2".to_string(), ip("10.0.0.5")),
                    ("gone".to_string(), ip("10.0.0.6")),
                ]),
                ["b1", "b2"],
            )
            .unwrap();
        assert_eq!(pins.len(), 1);

        let plan = build_plan(
            &topo,
            "",
            vec![brigade("b1", "172.16.0.1"), brigade("b2", "172.16.0.2")],
            options(PlacementMode::Sequential, &pins),
            &StubEncoder::default(),
        )
        .unwrap();

        let mut got = placements(&plan);
        got.sort_by_key(|(_, _, addr)| *addr);
        assert_eq!(
            got,
            vec![
                ("192.0.2.1".into(), "b2".into(), ip("10.0.0.5")),
                ("192.0.2.1".into(), "b1".into(), ip("10.0.0.6")),
            ]
        );
    }

    #[test]
    fn test_sequential_reports_overflow() {
        let topo = topology(vec![("192.0.2.1", vec!["10.0.0.5"])]);

        let err = build_plan(
            &topo,
            "",
            vec![brigade("b1", "10.0.0.5"), brigade("b2", "10.0.0.6")],
            options(PlacementMode::Sequential, &CheckedPins::default()),
            &StubEncoder::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RecodeError::ReservationTooSmall { snapshots: 2, slots: 1 }));
    }

    #[test]
    fn test_topology_rejects_bad_router_key() {
        let reservation: ReservationConfig = serde_json::from_value(json!({
            "reservation_id": "r",
            "plan": [{"control_ip": "192.0.2.1", "router_public_key": "c2hvcnQ=", "slots": []}]
        }))
        .unwrap();

        let err = Topology::from_reservation(&reservation).unwrap_err();
        assert!(err.to_string().contains("192.0.2.1"));
    }

    mod proptest_suite {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any split of N slots over two nodes fills node 1 first, in input order.
            #[test]
            fn sequential_fills_in_order(n in 1usize..24, split in 0usize..24) {
                let k = split.min(n);
                let first: Vec<String> = (0..k).map(|i| format!("10.0.0.{}", i + 1)).collect();
                let second: Vec<String> = (k..n).map(|i| format!("10.0.1.{}", i + 1)).collect();
                let first: Vec<&str> = first.iter().map(String::as_str).collect();
                let second: Vec<&str> = second.iter().map(String::as_str).collect();
                let topo = topology(vec![("192.0.2.1", first), ("192.0.2.2", second)]);

                // every brigade claims the same original address
                let brigades: Vec<_> = (0..n).map(|i| brigade(&format!("b{i}"), "172.16.0.1")).collect();

                let plan = build_plan(
                    &topo,
                    "",
                    brigades,
                    options(PlacementMode::Sequential, &CheckedPins::default()),
                    &StubEncoder::default(),
                )
                .unwrap();

                let got = placements(&plan);
                prop_assert_eq!(got.len(), n);
                for (i, (ctrl, id, _)) in got.iter().enumerate() {
                    prop_assert_eq!(id, &format!("b{i}"));
                    let want = if i < k { "192.0.2.1" } else { "192.0.2.2" };
                    prop_assert_eq!(ctrl.as_str(), want);
                }
                let addrs: HashSet<_> = got.iter().map(|(_, _, a)| *a).collect();
                prop_assert_eq!(addrs.len(), n);
            }
        }
    }
}
