// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod server;

pub use server::MockServer;

use anyhow::{Context, Result};
use protocolo_app::{ProtocolId, RecordSummary};

/// Phrase the server uses to decide a protocol is archived.
pub const ARCHIVE_MARKER: &str = "arquiva-se o protocolo";
pub const AMABRE_MARKER: &str = "amabre";

const SUBJECTS: [&str; 10] = [
    "Solicita poda de árvore na via pública",
    "Requer segunda via de alvará",
    "Reclamação sobre iluminação pública",
    "Pedido de isenção de taxa de lixo",
    "Denúncia de obra irregular",
    "Solicita vistoria em imóvel",
    "Recurso contra multa de trânsito",
    "Pedido de certidão negativa",
    "Solicita limpeza de terreno baldio",
    "Requer parcelamento de débito",
];

const KEYWORDS: [&str; 6] = [
    "enchente",
    "desabamento",
    "interdição",
    "calçada",
    "esgoto",
    "vazamento",
];

const DISPATCHES: [&str; 5] = [
    "Encaminhe-se ao setor competente.",
    "Aguardando documentação complementar.",
    "Deferido conforme parecer técnico.",
    "Indeferido por falta de amparo legal.",
    "Notifique-se o requerente.",
];

/// A protocol as the mock server stores it: summary fields plus raw content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRecord {
    pub year: i32,
    pub number: u32,
    pub content: String,
}

impl MockRecord {
    pub fn new(year: i32, number: u32, content: impl Into<String>) -> Self {
        Self {
            year,
            number,
            content: content.into(),
        }
    }

    pub fn id(&self) -> String {
        format!("{}/{:05}", self.year, self.number)
    }

    pub fn is_archived(&self) -> bool {
        self.content.to_lowercase().contains(ARCHIVE_MARKER)
    }

    pub fn is_amabre(&self) -> bool {
        self.content.to_lowercase().contains(AMABRE_MARKER)
    }

    pub fn matches_any(&self, keywords: &[String]) -> bool {
        let content = self.content.to_lowercase();
        keywords
            .iter()
            .any(|keyword| content.contains(&keyword.to_lowercase()))
    }

    pub fn summary(&self) -> Result<RecordSummary> {
        let id = self.id();
        Ok(RecordSummary {
            id: ProtocolId::parse(&id).with_context(|| format!("mock record id {id}"))?,
            year: self.year,
            number: format!("{:05}", self.number),
            archived: self.is_archived(),
        })
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, one_in: usize) -> bool {
        self.int_n(one_in) == 0
    }
}

#[derive(Debug, Clone)]
pub struct ProtocolFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ProtocolFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// `count` records for `year`, numbered from 1 in ascending order.
    pub fn records(&mut self, year: i32, count: u32) -> Vec<MockRecord> {
        (1..=count).map(|number| self.record(year, number)).collect()
    }

    pub fn record(&mut self, year: i32, number: u32) -> MockRecord {
        let mut content = format!("{}.", self.pick(&SUBJECTS));
        if self.rng.chance(3) {
            content.push_str(&format!(" Relata {} no local.", self.pick(&KEYWORDS)));
        }
        if self.rng.chance(5) {
            content.push_str(" Encaminhado à AMABRE para análise.");
        }
        content.push(' ');
        content.push_str(self.pick(&DISPATCHES));
        if self.rng.chance(3) {
            content.push_str(" Arquiva-se o protocolo.");
        }
        MockRecord::new(year, number, content)
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.rng.int_n(values.len())]
    }
}

pub fn keywords() -> Vec<String> {
    KEYWORDS.iter().map(|keyword| (*keyword).to_owned()).collect()
}

pub fn temp_export_dir() -> Result<tempfile::TempDir> {
    tempfile::tempdir().context("create temp export dir")
}

#[cfg(test)]
mod tests {
    use super::{MockRecord, ProtocolFaker, keywords};
    use anyhow::Result;

    #[test]
    fn new_deterministic_seed() {
        let mut left = ProtocolFaker::new(42);
        let mut right = ProtocolFaker::new(42);
        assert_eq!(left.records(2024, 5), right.records(2024, 5));
    }

    #[test]
    fn zero_seed_is_normalized() {
        assert_eq!(ProtocolFaker::new(0).seed(), 1);
    }

    #[test]
    fn records_are_numbered_in_order() -> Result<()> {
        let mut faker = ProtocolFaker::new(7);
        let records = faker.records(2023, 12);
        assert_eq!(records.len(), 12);
        assert_eq!(records[0].id(), "2023/00001");
        assert_eq!(records[11].summary()?.number, "00012");
        assert!(records.iter().all(|record| !record.content.is_empty()));
        Ok(())
    }

    #[test]
    fn markers_drive_flags() -> Result<()> {
        let archived = MockRecord::new(2024, 3, "Deferido. Arquiva-se o protocolo.");
        assert!(archived.is_archived());
        assert!(archived.summary()?.archived);
        assert!(!archived.is_amabre());

        let amabre = MockRecord::new(2024, 4, "Encaminhado à AMABRE.");
        assert!(amabre.is_amabre());
        assert!(!amabre.matches_any(&keywords()));

        let flooded = MockRecord::new(2024, 5, "Relata ENCHENTE na rua.");
        assert!(flooded.matches_any(&keywords()));
        Ok(())
    }
}
