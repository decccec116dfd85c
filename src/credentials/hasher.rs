// Keyward — Credential Hasher
//
// Derives and verifies salted Argon2id password digests. The output is a
// self-describing string carrying everything needed to verify later:
//
//   $argon2id$v=19$m=<memory KiB>,t=<iterations>,p=<lanes>$<b64 salt>$<b64 digest>
//
// Base64 is the standard alphabet without padding. Verification re-derives with
// the embedded parameters and compares in constant time.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::engine::general_purpose::STANDARD_NO_PAD;
use base64::Engine;
use rand::RngCore;
use zeroize::Zeroizing;

use super::CredentialError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Algorithm identifier written into every encoded digest.
const ALGORITHM_ID: &str = "argon2id";

/// The only Argon2 version this hasher produces and accepts (0x13).
pub const ARGON2_VERSION: u32 = 0x13;

// Argon2id production parameters.
// m=65536 (64 MiB), t=3 (3 iterations), p=2 (2 parallelism lanes)
const ARGON2_M_COST: u32 = 64 * 1024;
const ARGON2_T_COST: u32 = 3;
const ARGON2_P_COST: u32 = 2;

/// Fresh random salt length in bytes.
const SALT_LEN: usize = 16;

/// Derived digest length in bytes.
const DIGEST_LEN: usize = 32;

// ─── Parameters ──────────────────────────────────────────────────────────────

/// Cost parameters used when hashing new passwords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt_len: usize,
    pub digest_len: usize,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: ARGON2_M_COST,
            iterations: ARGON2_T_COST,
            parallelism: ARGON2_P_COST,
            salt_len: SALT_LEN,
            digest_len: DIGEST_LEN,
        }
    }
}

// ─── Encoded Digest ──────────────────────────────────────────────────────────

/// A parsed `$argon2id$...` string.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedDigest {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub salt: Vec<u8>,
    pub digest: Vec<u8>,
}

impl fmt::Debug for EncodedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedDigest")
            .field("memory_kib", &self.memory_kib)
            .field("iterations", &self.iterations)
            .field("parallelism", &self.parallelism)
            .field("salt_len", &self.salt.len())
            .field("digest", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for EncodedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}$v={}$m={},t={},p={}${}${}",
            ALGORITHM_ID,
            ARGON2_VERSION,
            self.memory_kib,
            self.iterations,
            self.parallelism,
            STANDARD_NO_PAD.encode(&self.salt),
            STANDARD_NO_PAD.encode(&self.digest),
        )
    }
}

impl FromStr for EncodedDigest {
    type Err = CredentialError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = encoded.split('$').collect();
        if fields.len() != 6 || !fields[0].is_empty() {
            return Err(malformed(format!(
                "expected 6 '$'-separated fields, found {}",
                fields.len()
            )));
        }

        if fields[1] != ALGORITHM_ID {
            return Err(malformed(format!("unsupported algorithm '{}'", fields[1])));
        }

        let version: u32 = fields[2]
            .strip_prefix("v=")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| malformed(format!("bad version field '{}'", fields[2])))?;
        if version != ARGON2_VERSION {
            return Err(CredentialError::IncompatibleVersion {
                found: version,
                supported: ARGON2_VERSION,
            });
        }

        let (memory_kib, iterations, parallelism) = parse_costs(fields[3])
            .ok_or_else(|| malformed(format!("bad parameter field '{}'", fields[3])))?;

        let salt = decode_b64(fields[4], "salt")?;
        let digest = decode_b64(fields[5], "digest")?;

        Ok(Self {
            memory_kib,
            iterations,
            parallelism,
            salt,
            digest,
        })
    }
}

/// Parse `m=<u32>,t=<u32>,p=<u32>`.
fn parse_costs(field: &str) -> Option<(u32, u32, u32)> {
    let mut parts = field.split(',');
    let m = parts.next()?.strip_prefix("m=")?.parse().ok()?;
    let t = parts.next()?.strip_prefix("t=")?.parse().ok()?;
    let p = parts.next()?.strip_prefix("p=")?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((m, t, p))
}

fn decode_b64(field: &str, what: &str) -> Result<Vec<u8>, CredentialError> {
    let bytes = STANDARD_NO_PAD
        .decode(field)
        .map_err(|e| malformed(format!("invalid base64 {}: {}", what, e)))?;
    if bytes.is_empty() {
        return Err(malformed(format!("empty {}", what)));
    }
    Ok(bytes)
}

fn malformed(reason: String) -> CredentialError {
    CredentialError::MalformedDigest(reason)
}

// ─── Hasher ──────────────────────────────────────────────────────────────────

/// Hashes and verifies passwords with Argon2id.
#[derive(Debug, Clone, Default)]
pub struct CredentialHasher {
    params: HashParams,
}

impl CredentialHasher {
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    /// Hash `password` with a fresh random salt.
    ///
    /// The same password never produces the same string twice.
    pub fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let mut salt = vec![0u8; self.params.salt_len];
        rand::rng().fill_bytes(&mut salt);

        let digest = derive(
            password.as_bytes(),
            &salt,
            self.params.memory_kib,
            self.params.iterations,
            self.params.parallelism,
            self.params.digest_len,
        )?;

        let encoded = EncodedDigest {
            memory_kib: self.params.memory_kib,
            iterations: self.params.iterations,
            parallelism: self.params.parallelism,
            salt,
            digest: digest.to_vec(),
        };
        Ok(encoded.to_string())
    }

    /// Check `password` against a previously encoded digest.
    ///
    /// Uses the parameters embedded in `encoded`, not this hasher's own, so digests
    /// produced under older cost settings keep verifying.
    pub fn verify_password(&self, password: &str, encoded: &str) -> Result<bool, CredentialError> {
        let parsed: EncodedDigest = encoded.parse()?;

        let candidate = derive(
            password.as_bytes(),
            &parsed.salt,
            parsed.memory_kib,
            parsed.iterations,
            parsed.parallelism,
            parsed.digest.len(),
        )?;

        Ok(constant_time_eq(&candidate, &parsed.digest))
    }
}

/// Run Argon2id with explicit parameters.
fn derive(
    password: &[u8],
    salt: &[u8],
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
    digest_len: usize,
) -> Result<Zeroizing<Vec<u8>>, CredentialError> {
    let params = Params::new(memory_kib, iterations, parallelism, Some(digest_len))
        .map_err(|e| CredentialError::Derivation(format!("invalid Argon2 params: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut digest = Zeroizing::new(vec![0u8; digest_len]);
    argon2
        .hash_password_into(password, salt, &mut digest)
        .map_err(|e| CredentialError::Derivation(format!("Argon2id hash failed: {}", e)))?;

    Ok(digest)
}

/// Constant-time byte comparison: running time depends only on the lengths.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

// ─── Tests ───────────────────────────────────────────────────────────────────
