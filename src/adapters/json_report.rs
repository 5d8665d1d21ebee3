//! JSON report for machine consumers.

use std::io::Write;

use crate::domain::error::MacrossError;
use crate::ports::report_port::{BacktestReport, ReportPort};

#[derive(Debug, Clone, Default)]
pub struct JsonReport {
    pub include_trades: bool,
}

impl JsonReport {
    pub fn new(include_trades: bool) -> Self {
        Self { include_trades }
    }
}

impl ReportPort for JsonReport {
    fn write(&self, report: &BacktestReport, out: &mut dyn Write) -> Result<(), MacrossError> {
        let mut value = serde_json::to_value(report).map_err(|e| MacrossError::Report {
            reason: e.to_string(),
        })?;
        if !self.include_trades {
            if let Some(obj) = value.as_object_mut() {
                obj.remove("trades");
            }
        }

        serde_json::to_writer_pretty(&mut *out, &value).map_err(|e| MacrossError::Report {
            reason: e.to_string(),
        })?;
        writeln!(out)?;
        Ok(())
    }
}
