// src/config.rs

use std::{path::PathBuf, time::Duration};

use crate::export::DEFAULT_OUTPUT_PATH;

/// SIDRA table holding the IPCA monthly series.
pub const IPCA_TABLE_ID: u32 = 1737;

const SIDRA_TABLE_BASE: &str = "https://sidra.ibge.gov.br/Ajax/JSon/Tabela/1";

/// Run settings. There are no flags; `Default` is what the binary uses.
#[derive(Debug, Clone)]
pub struct Config {
    pub table_id: u32,
    pub output: PathBuf,
    /// `None` lets a stalled server block forever.
    pub timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_id: IPCA_TABLE_ID,
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            timeout: Some(Duration::from_secs(60)),
        }
    }
}

impl Config {
    /// Metadata URL for the configured table, latest version.
    pub fn endpoint(&self) -> String {
        format!("{}/{}?versao=-1", SIDRA_TABLE_BASE, self.table_id)
    }
}
