mod common;

use common::{openvpn_only, wireguard};
use proptest::prelude::*;
use xray_gen::directory::{Capability, RawCandidate};
use xray_gen::selector::select;

fn candidate() -> impl Strategy<Value = (bool, Option<u8>)> {
    (any::<bool>(), proptest::option::of(0u8..=100))
}

fn pool(spec: &[(bool, Option<u8>)]) -> Vec<RawCandidate> {
    spec.iter()
        .enumerate()
        .map(|(i, (capable, load))| {
            let host = format!("node{i}.nordvpn.com");
            let station = format!("192.0.2.{}", i % 250);
            if *capable {
                wireguard(&host, &station, *load)
            } else {
                openvpn_only(&host, &station, *load)
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn never_selects_an_incapable_candidate(spec in proptest::collection::vec(candidate(), 0..24)) {
        let candidates = pool(&spec);
        if let Some(endpoint) = select(&candidates, Capability::WIREGUARD_UDP) {
            let index = candidates
                .iter()
                .position(|c| c.hostname.as_deref() == Some(endpoint.hostname.as_str()))
                .unwrap();
            prop_assert!(spec[index].0);
        }
    }

    #[test]
    fn selects_first_minimum_among_capable(spec in proptest::collection::vec(candidate(), 0..24)) {
        let candidates = pool(&spec);
        let expected = spec
            .iter()
            .enumerate()
            .filter(|(_, (capable, _))| *capable)
            .map(|(i, (_, load))| (load.unwrap_or(100), i))
            .min();

        match (select(&candidates, Capability::WIREGUARD_UDP), expected) {
            (None, None) => {}
            (Some(endpoint), Some((load, index))) => {
                prop_assert_eq!(endpoint.load, load);
                prop_assert_eq!(endpoint.hostname, format!("node{index}.nordvpn.com"));
            }
            (got, want) => prop_assert!(false, "got {:?}, expected {:?}", got, want),
        }
    }
}
