//! Call report shown on the customer dashboard once onboarding is done.

pub mod table;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use table::{Alignment, Table, TableColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    Answered,
    Missed,
    Voicemail,
}

impl fmt::Display for CallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CallOutcome::Answered => "Answered",
            CallOutcome::Missed => "Missed",
            CallOutcome::Voicemail => "Voicemail",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    pub started_at: DateTime<Utc>,
    pub caller: String,
    #[serde(default)]
    pub duration_secs: u64,
    pub outcome: CallOutcome,
}

impl CallRecord {
    /// Minutes billed for the call; partial minutes round up.
    pub fn billed_minutes(&self) -> u64 {
        (self.duration_secs + 59) / 60
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageSummary {
    pub total_calls: usize,
    pub answered: usize,
    pub missed: usize,
    pub voicemail: usize,
    pub total_minutes: u64,
    pub per_day: BTreeMap<NaiveDate, usize>,
}

impl UsageSummary {
    pub fn from_records(records: &[CallRecord]) -> Self {
        records.iter().fold(Self::default(), |mut summary, record| {
            summary.total_calls += 1;
            summary.total_minutes += record.billed_minutes();
            match record.outcome {
                CallOutcome::Answered => summary.answered += 1,
                CallOutcome::Missed => summary.missed += 1,
                CallOutcome::Voicemail => summary.voicemail += 1,
            }
            *summary
                .per_day
                .entry(record.started_at.date_naive())
                .or_default() += 1;
            summary
        })
    }

    pub fn headline(&self) -> String {
        format!(
            "Calls: {}  Answered: {}  Missed: {}  Voicemail: {}  Minutes: {}",
            self.total_calls, self.answered, self.missed, self.voicemail, self.total_minutes
        )
    }
}

fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Oldest call first, followed by the usage headline.
pub fn render_call_report(records: &[CallRecord]) -> String {
    if records.is_empty() {
        return "No calls recorded yet.".to_string();
    }

    let mut sorted: Vec<&CallRecord> = records.iter().collect();
    sorted.sort_by_key(|record| record.started_at);

    let mut table = Table::new(vec![
        TableColumn::new("When", Alignment::Left),
        TableColumn::new("Caller", Alignment::Left).max_width(24),
        TableColumn::new("Duration", Alignment::Right),
        TableColumn::new("Outcome", Alignment::Left),
    ]);
    for record in sorted {
        table.push_row(vec![
            record.started_at.format("%Y-%m-%d %H:%M").to_string(),
            record.caller.clone(),
            format_duration(record.duration_secs),
            record.outcome.to_string(),
        ]);
    }

    let summary = UsageSummary::from_records(records);
    format!("{}\n\n{}", table.render(), summary.headline())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn call(day: u32, hour: u32, caller: &str, secs: u64, outcome: CallOutcome) -> CallRecord {
        CallRecord {
            started_at: Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap(),
            caller: caller.into(),
            duration_secs: secs,
            outcome,
        }
    }

    #[test]
    fn summary_counts_outcomes_and_rounds_minutes_up() {
        let records = vec![
            call(4, 9, "+1 555 010 2000", 61, CallOutcome::Answered),
            call(4, 13, "+1 555 010 2001", 0, CallOutcome::Missed),
            call(5, 10, "+1 555 010 2002", 30, CallOutcome::Voicemail),
        ];
        let summary = UsageSummary::from_records(&records);
        assert_eq!(summary.total_calls, 3);
        assert_eq!(summary.total_minutes, 3);
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.per_day.len(), 2);
        assert_eq!(
            summary.per_day[&NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()],
            2
        );
    }

    #[test]
    fn empty_report_has_placeholder() {
        assert_eq!(render_call_report(&[]), "No calls recorded yet.");
    }

    #[test]
    fn report_lists_calls_oldest_first() {
        let records = vec![
            call(5, 10, "Reyes Dental front desk", 125, CallOutcome::Answered),
            call(4, 9, "+1 555 010 2000", 0, CallOutcome::Missed),
        ];
        insta::assert_snapshot!(render_call_report(&records), @r###"
         When               Caller                    Duration   Outcome
        ------------------------------------------------------------------
         2024-03-04 09:00   +1 555 010 2000               0:00   Missed
         2024-03-05 10:00   Reyes Dental front desk       2:05   Answered

        Calls: 2  Answered: 1  Missed: 1  Voicemail: 0  Minutes: 3
        "###);
    }
}
