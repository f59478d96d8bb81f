//! Keypair and signature helpers for solver authorization.
//!
//! Pure functions, no persistent state. The signer-helper endpoint and
//! the verifier in `submit_solution` must agree bit-for-bit on the
//! canonical message, so both go through [`canonical_message`].

use bitcoin_hashes::hex::{FromHex, ToHex};
use bitcoin_hashes::{sha256, Hash};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid private key format")]
    InvalidKey,
    #[error("Invalid signature format or verification failed")]
    InvalidSignature,
}

/// Lowercase hex SHA-256 digest of `prompt || unique_id`.
pub fn canonical_message(prompt: &str, unique_id: &str) -> String {
    let mut preimage = String::with_capacity(prompt.len() + unique_id.len());
    preimage.push_str(prompt);
    preimage.push_str(unique_id);
    sha256::Hash::hash(preimage.as_bytes()).to_string()
}

/// Generate a fresh keypair, returning `(privkey, address)` as hex
/// strings.
pub fn generate_keypair() -> (String, String) {
    let secret = SecretKey::new(&mut secp256k1::rand::thread_rng());
    let public = PublicKey::from_secret_key(SECP256K1, &secret);
    let privkey = format!("0x{}", secret.secret_bytes().to_hex());
    (privkey, address_from_public_key(&public))
}

/// Derive the address belonging to a hex-encoded private key.
pub fn derive_address(privkey: &str) -> Result<String, AuthError> {
    let secret = parse_secret_key(privkey)?;
    let public = PublicKey::from_secret_key(SECP256K1, &secret);
    Ok(address_from_public_key(&public))
}

/// Sign `message` with a recoverable ECDSA signature, encoded as 65
/// hex bytes (64-byte compact signature plus the recovery id).
pub fn sign_message(message: &str, privkey: &str) -> Result<String, AuthError> {
    let secret = parse_secret_key(privkey)?;
    let digest = message_digest(message);
    let signature = SECP256K1.sign_ecdsa_recoverable(&digest, &secret);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut bytes = [0u8; 65];
    bytes[..64].copy_from_slice(&compact);
    bytes[64] = recovery_id.to_i32() as u8;
    Ok(format!("0x{}", bytes.to_hex()))
}

/// Recover the signing address from `(message, signature)`.
pub fn recover_signer(message: &str, signature: &str) -> Result<String, AuthError> {
    let bytes =
        Vec::<u8>::from_hex(strip_hex_prefix(signature)).map_err(|_| AuthError::InvalidSignature)?;
    if bytes.len() != 65 {
        return Err(AuthError::InvalidSignature);
    }

    let recovery_id =
        RecoveryId::from_i32(i32::from(bytes[64])).map_err(|_| AuthError::InvalidSignature)?;
    let signature = RecoverableSignature::from_compact(&bytes[..64], recovery_id)
        .map_err(|_| AuthError::InvalidSignature)?;

    let digest = message_digest(message);
    let public = SECP256K1
        .recover_ecdsa(&digest, &signature)
        .map_err(|_| AuthError::InvalidSignature)?;
    Ok(address_from_public_key(&public))
}

/// Addresses are hex-encoded and may vary in letter casing.
pub fn addresses_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

fn parse_secret_key(privkey: &str) -> Result<SecretKey, AuthError> {
    let bytes =
        Vec::<u8>::from_hex(strip_hex_prefix(privkey)).map_err(|_| AuthError::InvalidKey)?;
    SecretKey::from_slice(&bytes).map_err(|_| AuthError::InvalidKey)
}

fn message_digest(message: &str) -> Message {
    let digest = sha256::Hash::hash(message.as_bytes());
    Message::from_slice(&digest.into_inner()).expect("sha256 digest is 32 bytes")
}

fn address_from_public_key(public: &PublicKey) -> String {
    let digest = sha256::Hash::hash(&public.serialize());
    format!("0x{}", digest.into_inner()[12..].to_hex())
}

fn strip_hex_prefix(value: &str) -> &str {
    value.strip_prefix("0x").unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_message_is_stable() {
        let prompt = "generate a pic about cat girl";
        let unique_id = "6f9619ff-8b86-4011-b42d-00cf4fc964ff";
        let expected = sha256::Hash::hash(format!("{prompt}{unique_id}").as_bytes()).to_string();
        assert_eq!(canonical_message(prompt, unique_id), expected);
        assert_eq!(
            canonical_message(prompt, unique_id),
            canonical_message(prompt, unique_id)
        );
    }

    #[test]
    fn sign_and_recover_round_trip() {
        let (privkey, addr) = generate_keypair();
        let message = canonical_message("a prompt", "an-id");

        let signature = sign_message(&message, &privkey).unwrap();
        let recovered = recover_signer(&message, &signature).unwrap();
        assert!(addresses_match(&recovered, &addr));
    }

    #[test]
    fn recovery_fails_on_tampered_message() {
        let (privkey, addr) = generate_keypair();
        let signature = sign_message(&canonical_message("a", "b"), &privkey).unwrap();

        // Recovery over a different message yields some other address, so
        // the comparison must fail.
        let recovered = recover_signer(&canonical_message("a", "c"), &signature).unwrap();
        assert!(!addresses_match(&recovered, &addr));
    }

    #[test]
    fn derive_address_matches_generation() {
        let (privkey, addr) = generate_keypair();
        assert_eq!(derive_address(&privkey).unwrap(), addr);
        // Case-insensitive comparison.
        assert!(addresses_match(&addr.to_uppercase(), &addr));
    }

    #[test]
    fn malformed_material_is_rejected() {
        assert!(matches!(
            derive_address("not-hex"),
            Err(AuthError::InvalidKey)
        ));
        assert!(matches!(
            derive_address("0xdeadbeef"),
            Err(AuthError::InvalidKey)
        ));
        assert!(matches!(
            recover_signer("msg", "0x1234"),
            Err(AuthError::InvalidSignature)
        ));
        assert!(matches!(
            recover_signer("msg", "zzzz"),
            Err(AuthError::InvalidSignature)
        ));
    }

    #[test]
    fn signature_prefix_is_optional() {
        let (privkey, addr) = generate_keypair();
        let message = canonical_message("p", "q");
        let signature = sign_message(&message, &privkey).unwrap();
        let bare = signature.trim_start_matches("0x");

        let recovered = recover_signer(&message, bare).unwrap();
        assert!(addresses_match(&recovered, &addr));
    }
}
