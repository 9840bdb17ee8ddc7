use std::io::{self, Write};

use serde::Serialize;

use crate::app::{CrawlResult, PedResult, SummaryResult};

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(result: &SummaryResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_crawl(result: &CrawlResult<'_>) -> io::Result<()> {
        Self::print_json(result)
    }

    /// Report of a PED run; only printed when the pedigrees went to a file.
    pub fn print_ped(result: &PedResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}
