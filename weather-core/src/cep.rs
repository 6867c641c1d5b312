use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Number of digits in a Brazilian postal code.
pub const CEP_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CepError {
    #[error("invalid zipcode")]
    Invalid,
}

/// A validated Brazilian postal code: exactly eight ASCII digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cep(String);

impl Cep {
    /// Strict parse: the input must already be eight ASCII digits.
    pub fn parse(raw: &str) -> Result<Self, CepError> {
        if is_valid(raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(CepError::Invalid)
        }
    }

    /// Lenient parse: hyphens are removed before validation, so `01001-000`
    /// yields `01001000`.
    pub fn parse_lenient(raw: &str) -> Result<Self, CepError> {
        let digits: String = raw.chars().filter(|c| *c != '-').collect();
        Self::parse(&digits)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid(candidate: &str) -> bool {
    candidate.len() == CEP_LEN && candidate.bytes().all(|b| b.is_ascii_digit())
}

impl FromStr for Cep {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cep {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for Cep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
