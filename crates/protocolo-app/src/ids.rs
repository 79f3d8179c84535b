// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

const ID_SEPARATOR: char = '/';
const ROW_KEY_SEPARATOR: char = '-';

/// Protocol identifier in `YEAR/NUMBER` form, for example `2024/00017`.
///
/// Both components are non-empty and free of `/` and `-`, so the hyphenated
/// row key produced by [`ProtocolId::row_key`] maps back to exactly one id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProtocolId(String);

impl ProtocolId {
    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_parts(raw, ID_SEPARATOR)
    }

    pub fn from_row_key(key: &str) -> Result<Self> {
        Self::from_parts(key, ROW_KEY_SEPARATOR)
    }

    fn from_parts(raw: &str, separator: char) -> Result<Self> {
        let Some((year, number)) = raw.split_once(separator) else {
            bail!("protocol id {raw:?} must look like YEAR{separator}NUMBER");
        };
        for part in [year, number] {
            if part.is_empty() {
                bail!("protocol id {raw:?} has an empty component");
            }
            if part.contains(ID_SEPARATOR) || part.contains(ROW_KEY_SEPARATOR) {
                bail!("protocol id {raw:?} must contain exactly one separator and no hyphens");
            }
        }
        Ok(Self(format!("{year}{ID_SEPARATOR}{number}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn year_part(&self) -> &str {
        self.split().0
    }

    pub fn number_part(&self) -> &str {
        self.split().1
    }

    pub fn row_key(&self) -> String {
        self.0.replace(ID_SEPARATOR, "-")
    }

    fn split(&self) -> (&str, &str) {
        self.0.split_once(ID_SEPARATOR).unwrap_or((self.0.as_str(), ""))
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ProtocolId {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ProtocolId> for String {
    fn from(value: ProtocolId) -> Self {
        value.0
    }
}
