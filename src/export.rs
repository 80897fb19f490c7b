//! CSV export.

use std::io;

use chrono::{DateTime, SecondsFormat, Utc};
use csv::Writer;

use cleanslate_core::{ExtStat, FileRecord};

const RECORD_HEADER: [&str; 9] = [
    "name",
    "path",
    "size_bytes",
    "modified",
    "size_score",
    "age_score",
    "extension_bias",
    "score",
    "duplicate_group",
];

/// Write ranked records, one row each, with their score terms.
pub fn write_records<W: io::Write>(out: W, records: &[&FileRecord]) -> csv::Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(RECORD_HEADER)?;

    for record in records {
        let modified = DateTime::<Utc>::from(record.modified_at);
        let group = record
            .duplicate_group_size
            .map(|n| n.to_string())
            .unwrap_or_default();
        writer.write_record([
            record.name(),
            record.path.display().to_string(),
            record.size_bytes.to_string(),
            modified.to_rfc3339_opts(SecondsFormat::Secs, true),
            record.terms.size.to_string(),
            record.terms.age.to_string(),
            record.terms.bias.to_string(),
            record.score.to_string(),
            group,
        ])?;
    }

    writer.flush()?;
    Ok(())
}

/// Write per-extension stats.
pub fn write_stats<W: io::Write>(out: W, stats: &[ExtStat]) -> csv::Result<()> {
    let mut writer = Writer::from_writer(out);
    for stat in stats {
        writer.serialize(stat)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanslate_core::{Action, ScoreTerms};
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_records_csv() {
        let mut record = FileRecord::new(
            "/data/old, report.pdf",
            2048,
            UNIX_EPOCH + Duration::from_secs(86_400),
        );
        record.set_terms(ScoreTerms {
            size: 1,
            age: 10,
            bias: -3,
        });
        record.duplicate_group_size = Some(2);
        let unique = FileRecord::new("/data/a.txt", 0, UNIX_EPOCH);

        let mut out = Vec::new();
        write_records(&mut out, &[&record, &unique]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("name,path,size_bytes,modified"));
        assert_eq!(
            lines[1],
            "\"old, report.pdf\",\"/data/old, report.pdf\",2048,1970-01-02T00:00:00Z,1,10,-3,8,2"
        );
        assert!(lines[2].ends_with(",0,0,0,0,"));
    }

    #[test]
    fn test_stats_csv() {
        let mut stat = ExtStat::new(".tmp");
        stat.apply(Action::Delete);

        let mut out = Vec::new();
        write_stats(&mut out, &[stat]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "extension,delete_count,keep_count,bias\n.tmp,1,0,10\n"
        );
    }
}
