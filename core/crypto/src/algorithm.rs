//! The closed set of supported algorithms and modes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use credvault_common::{Error, Result};

/// Symmetric block cipher family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// AES with a 256-bit key.
    Aes,
    /// Single DES, 64-bit key (56 effective bits).
    Des,
    /// Triple DES (EDE3), 192-bit key.
    DesEde,
}

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Algorithm; 3] = [Algorithm::Aes, Algorithm::Des, Algorithm::DesEde];

    /// Derived key length in bytes.
    pub fn key_length(&self) -> usize {
        match self {
            Algorithm::Aes => 32,
            Algorithm::Des => 8,
            Algorithm::DesEde => 24,
        }
    }

    /// Cipher block size in bytes.
    pub fn block_size(&self) -> usize {
        match self {
            Algorithm::Aes => 16,
            Algorithm::Des | Algorithm::DesEde => 8,
        }
    }

    /// Canonical name as written to the account metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Aes => "AES",
            Algorithm::Des => "DES",
            Algorithm::DesEde => "DESede",
        }
    }

    /// Whether this algorithm can run in `mode`.
    ///
    /// GCM is defined only for 128-bit block ciphers.
    pub fn supports(&self, mode: Mode) -> bool {
        match mode {
            Mode::Gcm => *self == Algorithm::Aes,
            Mode::Cbc | Mode::Ecb => true,
        }
    }

    /// Fail with `UnsupportedCombination` unless this algorithm supports `mode`.
    pub fn check_mode(&self, mode: Mode) -> Result<()> {
        if self.supports(mode) {
            Ok(())
        } else {
            Err(Error::UnsupportedCombination {
                algorithm: self.name().to_string(),
                mode: mode.name().to_string(),
            })
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "AES" => Ok(Algorithm::Aes),
            "DES" => Ok(Algorithm::Des),
            "DESEDE" | "3DES" | "TRIPLEDES" => Ok(Algorithm::DesEde),
            _ => Err(Error::UnsupportedAlgorithm(s.to_string())),
        }
    }
}

/// Block cipher mode of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Cipher block chaining with PKCS#7 padding.
    Cbc,
    /// Electronic codebook with PKCS#7 padding. Ignores the IV.
    Ecb,
    /// Galois/counter mode, no padding, 128-bit tag.
    Gcm,
}

impl Mode {
    /// Every supported mode.
    pub const ALL: [Mode; 3] = [Mode::Cbc, Mode::Ecb, Mode::Gcm];

    /// Canonical name as written to the account metadata.
    pub fn name(&self) -> &'static str {
        match self {
            Mode::Cbc => "CBC",
            Mode::Ecb => "ECB",
            Mode::Gcm => "GCM",
        }
    }

    /// Whether the mode authenticates its ciphertext.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Mode::Gcm)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "CBC" => Ok(Mode::Cbc),
            "ECB" => Ok(Mode::Ecb),
            "GCM" => Ok(Mode::Gcm),
            _ => Err(Error::UnsupportedMode(s.to_string())),
        }
    }
}
