use anyhow::{anyhow, bail, Context, Result};
use csv::{ReaderBuilder, StringRecord};

use crate::metadata::{FeatureTable, SampleMetadata};

const FEATURE_HEADER: &str = "#OTU ID";
const METADATA_DIRECTIVE: &str = "#q2:";

/// Feature table exported by `biom convert --to-tsv`.
pub fn parse_feature_table(raw: &str) -> Result<FeatureTable> {
    // The header itself starts with '#', so only leading comments are skipped.
    let body = raw
        .lines()
        .skip_while(|line| line.starts_with('#') && !line.starts_with(FEATURE_HEADER))
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = tsv_reader(&body, false);
    let header = reader.headers().context("missing header row")?.clone();
    let samples: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();
    if samples.is_empty() {
        bail!("header row lists no samples");
    }

    let mut table = FeatureTable::new(samples);
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed row {}", row + 2))?;
        let (id, values) = split_record(&record)?;
        let counts = values
            .iter()
            .map(|value| {
                value
                    .trim()
                    .parse::<f64>()
                    .with_context(|| format!("observation {id}: invalid count {value:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        table.add_observation(id, counts);
    }

    Ok(table)
}

/// QIIME 2 sample metadata; `#q2:` directive rows and comment rows are skipped.
pub fn parse_sample_metadata(raw: &str) -> Result<SampleMetadata> {
    let mut reader = tsv_reader(raw, true);
    let header = reader.headers().context("missing header row")?.clone();
    let columns: Vec<String> = header.iter().skip(1).map(|s| s.trim().to_string()).collect();

    let mut metadata = SampleMetadata::new(columns);
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("malformed row {}", row + 2))?;
        let (id, values) = split_record(&record)?;
        if id.starts_with(METADATA_DIRECTIVE) || id.starts_with('#') {
            continue;
        }
        metadata.insert(id, values);
    }

    Ok(metadata)
}

fn tsv_reader(raw: &str, flexible: bool) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(flexible)
        .from_reader(raw.as_bytes())
}

fn split_record(record: &StringRecord) -> Result<(String, Vec<String>)> {
    let mut fields = record.iter();
    let id = fields
        .next()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| anyhow!("row without an identifier"))?;
    Ok((id, fields.map(|value| value.trim().to_string()).collect()))
}
