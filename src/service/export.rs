use std::io::Write;

use csv::Writer;

use crate::error::Result;
use crate::models::{money, AgingSummary};

/// Write aging summaries as CSV, monetary fields as fixed 2-decimal strings
pub fn write_aging_csv<W: Write>(summaries: &[AgingSummary], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);

    writer.write_record([
        "party_id",
        "current",
        "days_0_30",
        "days_31_60",
        "days_61_90",
        "days_90_plus",
        "total",
        "oldest_document_date",
        "average_days_outstanding",
        "document_count",
    ])?;

    for s in summaries {
        writer.write_record(&[
            s.party_id.clone(),
            money(&s.current).to_string(),
            money(&s.days_0_30).to_string(),
            money(&s.days_31_60).to_string(),
            money(&s.days_61_90).to_string(),
            money(&s.days_90_plus).to_string(),
            money(&s.total).to_string(),
            s.oldest_document_date.to_string(),
            s.average_days_outstanding.to_string(),
            s.document_count.to_string(),
        ])?;
    }

    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}
