// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Digest and signature primitives.
//!
//! This module consumes trusted library implementations only: Ed25519
//! verification from `ring` and SHA-256 from `sha2`. The subsystem never
//! signs anything; all signing happens client-side and the server only
//! verifies.
//!
//! Wallet addresses are the base64 encoding of a 32-byte Ed25519 public
//! key; signatures are the base64 encoding of the 64-byte signature.

use base64ct::{Base64, Encoding};
use ring::signature::{UnparsedPublicKey, ED25519};
use sha2::{Digest, Sha256};

use crate::error::{AuthFailure, TrustError, TrustResult};

/// Length of an Ed25519 public key in bytes.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Length of an Ed25519 signature in bytes.
pub const SIGNATURE_LEN: usize = 64;

/// Decode a wallet address into its 32-byte Ed25519 public key.
///
/// # Errors
/// Returns [`TrustError::Validation`] if the address is not base64 or does
/// not decode to exactly 32 bytes.
pub fn decode_wallet_address(address: &str) -> TrustResult<[u8; PUBLIC_KEY_LEN]> {
    let bytes = Base64::decode_vec(address)
        .map_err(|_| TrustError::validation("wallet address is not valid base64"))?;

    bytes.as_slice().try_into().map_err(|_| {
        TrustError::validation(format!(
            "wallet address must decode to {PUBLIC_KEY_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Decode a base64 signature into its 64-byte form.
///
/// # Errors
/// Returns [`TrustError::Validation`] if the signature is not base64 or does
/// not decode to exactly 64 bytes.
pub fn decode_signature(signature: &str) -> TrustResult<[u8; SIGNATURE_LEN]> {
    let bytes = Base64::decode_vec(signature)
        .map_err(|_| TrustError::validation("signature is not valid base64"))?;

    bytes.as_slice().try_into().map_err(|_| {
        TrustError::validation(format!(
            "signature must decode to {SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

/// Verify an Ed25519 signature over `message` against the wallet's public key.
///
/// # Errors
/// Returns [`TrustError::Validation`] for malformed inputs and
/// [`AuthFailure::BadSignature`] when verification fails.
pub fn verify_wallet_signature(
    wallet_address: &str,
    message: &[u8],
    signature: &str,
) -> TrustResult<()> {
    let public_key = decode_wallet_address(wallet_address)?;
    let signature = decode_signature(signature)?;

    UnparsedPublicKey::new(&ED25519, public_key)
        .verify(message, &signature)
        .map_err(|_| AuthFailure::BadSignature.into())
}

/// SHA-256 digest of `data`, hex-encoded.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write;
        // Writing to a String cannot fail.
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Encode raw bytes as base64 (addresses, signatures).
pub fn encode_base64(data: &[u8]) -> String {
    Base64::encode_string(data)
}


#[cfg(test)]
mod tests {
    use super::test_keys::TestWallet;
    use super::*;
    use crate::error::AuthFailure;

    #[test]
    fn sha256_hex_matches_known_vector() {
        // SHA-256("abc")
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn valid_signature_verifies() {
        let wallet = TestWallet::generate();
        let message = b"verify wallet ownership";
        let signature = wallet.sign(message);

        verify_wallet_signature(&wallet.address, message, &signature).unwrap();
    }

    #[test]
    fn signature_from_other_key_is_rejected() {
        let wallet = TestWallet::generate();
        let impostor = TestWallet::generate();
        let message = b"verify wallet ownership";
        let signature = impostor.sign(message);

        let err = verify_wallet_signature(&wallet.address, message, &signature).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::BadSignature)
        ));
    }

    #[test]
    fn tampered_message_is_rejected() {
        let wallet = TestWallet::generate();
        let signature = wallet.sign(b"original message");

        let err =
            verify_wallet_signature(&wallet.address, b"tampered message", &signature).unwrap_err();
        assert!(matches!(
            err,
            TrustError::Authentication(AuthFailure::BadSignature)
        ));
    }

    #[test]
    fn malformed_address_is_validation_error() {
        let err = decode_wallet_address("not-base64!!!").unwrap_err();
        assert!(matches!(err, TrustError::Validation(_)));

        // Valid base64, wrong length.
        let err = decode_wallet_address(&encode_base64(b"short")).unwrap_err();
        assert!(matches!(err, TrustError::Validation(_)));
    }

    #[test]
    fn malformed_signature_is_validation_error() {
        let wallet = TestWallet::generate();
        let err =
            verify_wallet_signature(&wallet.address, b"msg", &encode_base64(b"too short"))
                .unwrap_err();
        assert!(matches!(err, TrustError::Validation(_)));
    }
}
