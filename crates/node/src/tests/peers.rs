use std::sync::Arc;
use std::thread;

use super::*;

fn addr(s: &str) -> Multiaddr {
    s.parse().unwrap()
}

#[test]
fn test_add_discovered_peer_keeps_existing_key() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    assert!(registry.add_discovered_peer(peer, []));
    assert!(registry.update_peer_public_key(&peer, "key-1"));

    assert!(!registry.add_discovered_peer(peer, [addr("/ip4/10.0.0.1/tcp/1")]));

    let record = registry.peer(&peer).unwrap();
    assert_eq!(record.public_key.as_deref(), Some("key-1"));
    assert!(record.addrs.is_empty());
}

#[test]
fn test_merge_multiaddrs_is_a_union() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    let a = addr("/ip4/10.0.0.1/tcp/2528");
    let b = addr("/ip4/10.0.0.2/tcp/2528");
    let c = addr("/ip6/::1/tcp/2528");

    registry.merge_multiaddrs(peer, [a.clone(), b.clone()]);
    registry.merge_multiaddrs(peer, [b.clone(), c.clone()]);

    let record = registry.peer(&peer).unwrap();
    assert_eq!(record.addrs, HashSet::from([a, b, c]));
}

#[test]
fn test_update_unknown_peer_is_a_noop() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    assert!(!registry.update_peer_public_key(&peer, "key"));
    assert!(registry.peer(&peer).is_none());
    assert_eq!(registry.get_peer_by_public_key("key"), None);
}

#[test]
fn test_public_key_sent_flag() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    assert!(!registry.has_sent_public_key_to(&peer));

    registry.mark_public_key_sent_to(peer);
    assert!(registry.has_sent_public_key_to(&peer));

    registry.mark_public_key_sent_to(peer);
    assert!(registry.has_sent_public_key_to(&peer));
}

#[test]
fn test_claims_are_exclusive() {
    let registry = Arc::new(PeerRegistry::new());
    let peer = PeerId::random();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.try_claim_public_key_send(peer))
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert!(registry.has_sent_public_key_to(&peer));

    registry.release_public_key_send(&peer);
    assert!(!registry.has_sent_public_key_to(&peer));
    assert!(registry.try_claim_public_key_send(peer));
}

#[test]
fn test_handshake_states() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    assert_eq!(registry.handshake_state(&peer), HandshakeState::Unknown);

    assert!(registry.try_claim_key_request(peer));
    assert_eq!(registry.handshake_state(&peer), HandshakeState::KeyRequested);
    assert!(!registry.try_claim_key_request(peer));

    registry.release_key_request(&peer);
    assert_eq!(registry.handshake_state(&peer), HandshakeState::Unknown);

    assert!(registry.update_peer_public_key(&peer, "key"));
    assert_eq!(registry.handshake_state(&peer), HandshakeState::KeyObtained);
    assert!(!registry.try_claim_key_request(peer));
}

#[test]
fn test_remove_discovered_peer_clears_markers() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    let _ = registry.add_discovered_peer(peer, [addr("/ip4/10.0.0.1/tcp/1")]);
    registry.add_connected_peer(peer);
    registry.mark_public_key_sent_to(peer);
    assert!(registry.is_peer_connected(&peer));

    let removed = registry.remove_discovered_peer(&peer).unwrap();
    assert_eq!(removed.addrs.len(), 1);

    assert!(registry.peer(&peer).is_none());
    assert!(!registry.is_peer_connected(&peer));
    assert!(!registry.has_sent_public_key_to(&peer));
    assert!(registry.remove_discovered_peer(&peer).is_none());
}

#[test]
fn test_connected_markers() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    registry.add_connected_peer(peer);
    assert!(registry.is_peer_connected(&peer));

    registry.remove_connected_peer(&peer);
    assert!(!registry.is_peer_connected(&peer));
}

#[test]
fn test_get_peer_by_public_key() {
    let registry = PeerRegistry::new();
    let first = PeerId::random();
    let second = PeerId::random();

    let _ = registry.add_discovered_peer(first, []);
    let _ = registry.add_discovered_peer(second, []);
    let _ = registry.update_peer_public_key(&second, "synapse-b");

    assert_eq!(registry.get_peer_by_public_key("synapse-b"), Some(second));
    assert_eq!(registry.get_peer_by_public_key("synapse-a"), None);

    let _ = registry.update_peer_public_key(&first, "synapse-b");
    let expected = first.min(second);
    assert_eq!(registry.get_peer_by_public_key("synapse-b"), Some(expected));
}

#[test]
fn test_snapshot() {
    let registry = PeerRegistry::new();
    let peer = PeerId::random();

    registry.merge_multiaddrs(
        peer,
        [addr("/ip4/10.0.0.2/tcp/1"), addr("/ip4/10.0.0.1/tcp/1")],
    );
    registry.add_connected_peer(peer);
    let _ = registry.update_peer_public_key(&peer, "key");

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.len(), 1);

    let entry = &snapshot[0];
    assert_eq!(entry.peer_id, peer.to_string());
    assert_eq!(entry.public_key.as_deref(), Some("key"));
    assert_eq!(
        entry.multiaddrs,
        vec!["/ip4/10.0.0.1/tcp/1".to_owned(), "/ip4/10.0.0.2/tcp/1".to_owned()]
    );
    assert!(entry.connected);
    assert!(!entry.public_key_sent);
    assert_eq!(entry.handshake, HandshakeState::KeyObtained);

    let json = serde_json::to_value(entry).unwrap();
    assert_eq!(json["handshake"], "keyObtained");
    assert_eq!(json["publicKeySent"], false);
}
