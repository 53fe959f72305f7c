//! Oscilloscope CSV reader and writer.
//!
//! Exports start with an instrument preamble followed by a column header and
//! then rows of `time; ch1; ch2; ...`. The preamble is skipped line by line
//! before the remaining text is handed to the `csv` reader, since preamble
//! lines rarely share the data column count.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use crate::config::RecordingConfig;
use crate::error::SignalError;
use crate::recording::SignalRecord;

/// Load a recording from disk
pub fn load_csv<P: AsRef<Path>>(
    path: P,
    config: &RecordingConfig,
) -> Result<SignalRecord, SignalError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| SignalError::Io {
        details: format!("{}: {}", path.display(), err),
    })?;
    let record = parse_csv(file, config)?.with_source(path);
    tracing::debug!(
        "[Recording] Loaded {} samples x {} channels from {}",
        record.len(),
        record.channel_count(),
        path.display()
    );
    Ok(record)
}

/// Parse a recording from any reader
pub fn parse_csv<R: Read>(reader: R, config: &RecordingConfig) -> Result<SignalRecord, SignalError> {
    let delimiter = delimiter_byte(config.delimiter)?;
    let mut reader = BufReader::new(reader);

    let skipped = config.preamble_lines + usize::from(config.has_header);
    let mut line = String::new();
    for _ in 0..skipped {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Err(SignalError::Empty);
        }
    }

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut time_s = Vec::new();
    let mut channels: Vec<Vec<f64>> = Vec::new();
    let mut width = None;

    for row in csv_reader.records() {
        if time_s.len() >= config.max_samples {
            break;
        }
        let row = row?;
        let line = row
            .position()
            .map(|pos| pos.line() + skipped as u64)
            .unwrap_or_default();

        let fields = trimmed_fields(&row);
        if fields.is_empty() {
            continue;
        }

        let expected = *width.get_or_insert(fields.len());
        if fields.len() != expected {
            return Err(SignalError::RaggedRow {
                line,
                expected,
                found: fields.len(),
            });
        }
        if expected < 2 {
            return Err(SignalError::ChannelOutOfRange {
                channel: 1,
                available: 0,
            });
        }
        if channels.is_empty() {
            channels = vec![Vec::new(); expected - 1];
        }

        for (column, field) in fields.iter().enumerate() {
            let value = parse_value(field).ok_or_else(|| SignalError::Parse {
                line,
                column: column + 1,
                value: field.to_string(),
            })?;
            if column == 0 {
                time_s.push(value);
            } else {
                channels[column - 1].push(value);
            }
        }
    }

    if time_s.is_empty() {
        return Err(SignalError::Empty);
    }

    SignalRecord::new(time_s, channels)
}

/// Write a recording in the oscilloscope layout read by [`parse_csv`]
pub fn write_csv<W: Write>(
    record: &SignalRecord,
    writer: W,
    config: &RecordingConfig,
) -> Result<(), SignalError> {
    let delimiter = delimiter_byte(config.delimiter)?;
    let mut writer = std::io::BufWriter::new(writer);

    for idx in 0..config.preamble_lines {
        writeln!(writer, "# shpb_gauge_factor synthetic export line {}", idx + 1)?;
    }

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    if config.has_header {
        let mut header = vec!["Time".to_string()];
        header.extend((1..=record.channel_count()).map(|ch| format!("Ch{}", ch)));
        csv_writer.write_record(&header)?;
    }

    for (idx, time) in record.time().iter().enumerate() {
        let mut row = vec![format!("{:e}", time)];
        for ch in 1..=record.channel_count() {
            row.push(format!("{:.6}", record.channel(ch)?[idx]));
        }
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn delimiter_byte(delimiter: char) -> Result<u8, SignalError> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| SignalError::Io {
            details: format!("delimiter {:?} is not a single ASCII character", delimiter),
        })
}

/// Fields of a row without trailing empty cells left by a trailing delimiter
fn trimmed_fields(row: &csv::StringRecord) -> Vec<&str> {
    let mut fields: Vec<&str> = row.iter().collect();
    while fields.last().is_some_and(|field| field.is_empty()) {
        fields.pop();
    }
    fields
}

fn parse_value(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|value| value.is_finite())
}
