use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::CryptoError;

/// A node's identity: an ed25519 keypair whose public half doubles as the
/// node's blockchain address.
///
/// Treated by the rest of the workspace as an opaque capability: callers
/// never reach into the inner keys, only `sign`/`verify`/the string
/// encodings.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh keypair. Called once per node, at construction;
    /// keys are never rotated.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// The hex-encoded public key — this node's blockchain address.
    pub fn public_key_string(&self) -> String {
        encode_public_key(&self.signing_key.verifying_key())
    }

    /// Sign `message`, returning the hex-encoded signature.
    pub fn sign(&self, message: &str) -> String {
        let signature = self.signing_key.sign(message.as_bytes());
        hex::encode(signature.to_bytes())
    }
}

/// Hex-encode a public key the same way [`KeyPair::public_key_string`] does.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    hex::encode(key.to_bytes())
}

/// Decode a hex-encoded public key string.
pub fn public_key_from_string(s: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|_| CryptoError::InvalidPublicKey)?;
    VerifyingKey::from_bytes(&array).map_err(|_| CryptoError::InvalidPublicKey)
}

/// `true` when `s` decodes to a well-formed public key.
pub fn is_public_key_string_valid(s: &str) -> bool {
    public_key_from_string(s).is_ok()
}

/// Verify that `signature` (hex-encoded) over `message` was produced by the
/// holder of `public_key_string`.
pub fn verify(message: &str, signature: &str, public_key_string: &str) -> bool {
    let Ok(key) = public_key_from_string(public_key_string) else {
        return false;
    };
    let Ok(sig_bytes) = hex::decode(signature) else {
        return false;
    };
    let Ok(sig_array): Result<[u8; 64], _> = sig_bytes.try_into() else {
        return false;
    };
    let signature = ed25519_dalek::Signature::from_bytes(&sig_array);
    key.verify(message.as_bytes(), &signature).is_ok()
}
