use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

use super::{decode_items, ReportBuilder};
use crate::models::{AssemblyLine, AssemblyLineSource, AssemblyRecord, Row};
use crate::utils::WeekWindow;

pub const COMPLETED_STATUS: &str = "Completed";

/// Completed assemblies over a trailing window of whole weeks, one row per
/// (assembly, line) pair
pub struct AssembliesReport {
    name: String,
    weeks: u32,
    range: String,
    line_source: AssemblyLineSource,
}

impl AssembliesReport {
    pub fn new(name: &str, weeks: u32, range: &str, line_source: AssemblyLineSource) -> Self {
        Self {
            name: name.to_string(),
            weeks,
            range: range.to_string(),
            line_source,
        }
    }

    pub fn window(&self, today: NaiveDate) -> WeekWindow {
        WeekWindow::trailing_weeks(today, self.weeks)
    }

    /// One row per (assembly, line). Lines come from each assembly unless
    /// `paired_lines` is given, in which case every assembly gets those.
    pub fn flatten(
        &self,
        assemblies: &[AssemblyRecord],
        paired_lines: Option<&[AssemblyLine]>,
    ) -> Vec<Row> {
        assemblies
            .iter()
            .flat_map(|assembly| {
                paired_lines
                    .unwrap_or_else(|| assembly.lines())
                    .iter()
                    .map(move |line| line.to_row(&assembly.assembly_number))
            })
            .collect()
    }

    /// The first listed assembly, read before any item is dropped
    fn first_assembly(&self, first: Option<&Value>) -> AssemblyRecord {
        let Some(item) = first else {
            return AssemblyRecord::default();
        };
        match serde_json::from_value(item.clone()) {
            Ok(record) => record,
            Err(e) => {
                warn!("{}: first assembly has no usable lines: {}", self.name, e);
                AssemblyRecord::default()
            }
        }
    }
}

impl ReportBuilder for AssembliesReport {
    fn name(&self) -> &str {
        &self.name
    }

    fn endpoint(&self) -> &str {
        "Assemblies"
    }

    fn query(&self, today: NaiveDate) -> String {
        let window = self.window(today);
        format!(
            "startDate={}&endDate={}&assemblyStatus={}",
            window.start_param(),
            window.end_param(),
            COMPLETED_STATUS
        )
    }

    fn target_range(&self) -> &str {
        &self.range
    }

    fn build_rows(&self, items: Vec<Value>) -> Vec<Row> {
        let first = match self.line_source {
            AssemblyLineSource::Own => None,
            AssemblyLineSource::First => Some(self.first_assembly(items.first())),
        };

        let assemblies = decode_items::<AssemblyRecord>(self.endpoint(), items);
        if let Some(first) = &first {
            if !assemblies.is_empty() {
                warn!(
                    "{}: pairing every assembly with the first assembly's {} lines",
                    self.name,
                    first.lines().len()
                );
            }
        }
        self.flatten(&assemblies, first.as_ref().map(AssemblyRecord::lines))
    }
}
