use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::cell::CellState;

/// SHA-256 of a board position. Hex-encoded on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BoardHash([u8; 32]);

impl BoardHash {
    pub fn of(cells: &[CellState]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update((cells.len() as u64).to_le_bytes());
        let codes: Vec<u8> = cells.iter().map(|c| c.code()).collect();
        hasher.update(&codes);
        BoardHash(hasher.finalize().into())
    }
}

impl fmt::Display for BoardHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for BoardHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First 8 bytes are plenty to tell positions apart in logs.
        write!(f, "BoardHash(")?;
        for b in &self.0[..8] {
            write!(f, "{b:02x}")?;
        }
        write!(f, ")")
    }
}

impl FromStr for BoardHash {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.is_ascii() {
            return Err(format!("invalid board hash: {s}"));
        }
        let mut bytes = [0u8; 32];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16)
                .map_err(|_| format!("invalid board hash: {s}"))?;
        }
        Ok(BoardHash(bytes))
    }
}

impl From<BoardHash> for String {
    fn from(hash: BoardHash) -> Self {
        hash.to_string()
    }
}

impl TryFrom<String> for BoardHash {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
