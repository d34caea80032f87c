//! Ed25519 signature verification against account addresses.

use ed25519_dalek::{Verifier, VerifyingKey};
use lattice_types::{Address, Signature};

/// Verify a signature over a message with the given account address as the
/// public key. Returns `false` for malformed keys and invalid signatures
/// alike.
pub fn verify_signature(address: &Address, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(address.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify(message, &sig).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPair;

    #[test]
    fn sign_and_verify() {
        let kp = KeyPair::from_seed(&[7u8; 32]);
        let msg = b"block hash stand-in";
        let sig = kp.sign(msg);
        assert!(verify_signature(&kp.address(), msg, &sig));
    }

    #[test]
    fn wrong_message_fails() {
        let kp = KeyPair::from_seed(&[7u8; 32]);
        let sig = kp.sign(b"correct");
        assert!(!verify_signature(&kp.address(), b"tampered", &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let kp1 = KeyPair::from_seed(&[1u8; 32]);
        let kp2 = KeyPair::from_seed(&[2u8; 32]);
        let sig = kp1.sign(b"msg");
        assert!(!verify_signature(&kp2.address(), b"msg", &sig));
    }

    #[test]
    fn malformed_public_key_fails() {
        let kp = KeyPair::from_seed(&[7u8; 32]);
        let sig = kp.sign(b"msg");
        // not a valid curve point
        let bad = Address::new([0xFF; 32]);
        assert!(!verify_signature(&bad, b"msg", &sig));
    }
}
