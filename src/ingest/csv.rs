//! Upload CSV contract: header resolution and row-to-record assembly.
//!
//! One row is one observation at one `itemoffset` for one patient. Rows are
//! grouped by `patientunitstayid`; each row appends one point to every
//! channel of that patient, so all channels of a record share offsets.

use std::collections::BTreeMap;

use tracing::debug;
use vitalwatch_types::{Admission, ChannelKind, Offset, PatientId, PatientRecord, RiskScores};

use super::IngestError;

/// Required column: unit stay id.
pub const ID_COLUMN: &str = "patientunitstayid";
/// Required column: observation offset in minutes.
pub const OFFSET_COLUMN: &str = "itemoffset";

/// The header row documented for uploads.
pub const CSV_FORMAT: &str = "patientunitstayid,hospitalid,apacheadmissiondx,admissionweight,\
admissionheight,itemoffset,Heart Rate,MAP (mmHg),Respiratory Rate,O2 Saturation,FiO2,\
Temperature (C),glucose,pH,admissiontime";

/// Result of parsing one upload.
#[derive(Debug, Clone, Default)]
pub struct ParsedUpload {
    /// One record per distinct patient id, ordered by id.
    pub patients: Vec<PatientRecord>,
    /// Data rows read (excluding the header and blank lines).
    pub rows: usize,
    /// Rows dropped for lacking a patient id or a numeric offset.
    pub skipped_rows: usize,
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    id: usize,
    offset: usize,
    hospital: Option<usize>,
    diagnosis: Option<usize>,
    weight: Option<usize>,
    height: Option<usize>,
    admission_time: Option<usize>,
    age: Option<usize>,
    gender: Option<usize>,
    mortality: Option<usize>,
    decompensation: Option<usize>,
    los: Option<usize>,
    channels: Vec<(ChannelKind, Option<usize>)>,
}

impl Columns {
    fn resolve(header: &[String]) -> Result<Self, IngestError> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |name: &str| names.iter().position(|n| n == &name.to_lowercase());

        Ok(Self {
            id: find(ID_COLUMN).ok_or(IngestError::MissingColumn(ID_COLUMN))?,
            offset: find(OFFSET_COLUMN).ok_or(IngestError::MissingColumn(OFFSET_COLUMN))?,
            hospital: find("hospitalid").or_else(|| find("hospitalname")),
            diagnosis: find("apacheadmissiondx"),
            weight: find("admissionweight"),
            height: find("admissionheight"),
            admission_time: find("admissiontime"),
            age: find("age"),
            gender: find("gender"),
            mortality: find("mortalityrisk"),
            decompensation: find("decompensationrisk"),
            los: find("losestimate"),
            channels: ChannelKind::ALL.iter().map(|k| (*k, find(k.csv_header()))).collect(),
        })
    }
}

/// Parse a complete upload into patient records.
///
/// The whole text is parsed before anything is returned, so a caller can
/// apply the result atomically. Channels are stably sorted by offset.
pub fn parse_upload(text: &str) -> Result<ParsedUpload, IngestError> {
    let mut lines = split_records(text)
        .into_iter()
        .filter(|l| !l.trim().is_empty());
    let header = lines.next().ok_or(IngestError::Empty)?;
    let columns = Columns::resolve(&split_fields(header))?;

    let mut patients: BTreeMap<PatientId, PatientRecord> = BTreeMap::new();
    let mut rows = 0;
    let mut skipped_rows = 0;

    for line in lines {
        rows += 1;
        let fields = split_fields(line);
        let field = |idx: Option<usize>| idx.and_then(|i| fields.get(i)).map(|s| s.trim());
        let text_field =
            |idx: Option<usize>| field(idx).filter(|s| !s.is_empty()).map(str::to_string);
        let number = |idx: Option<usize>| field(idx).and_then(parse_number);

        let Some(id) = text_field(Some(columns.id)) else {
            skipped_rows += 1;
            continue;
        };
        let Some(offset) = number(Some(columns.offset)) else {
            skipped_rows += 1;
            continue;
        };
        let offset = Offset(offset.round() as i64);

        let row_admission = Admission {
            hospital_id: text_field(columns.hospital),
            age: number(columns.age).filter(|a| *a >= 0.0).map(|a| a as u32),
            gender: text_field(columns.gender),
            diagnosis: text_field(columns.diagnosis),
            admission_time: text_field(columns.admission_time),
            weight_kg: number(columns.weight),
            height_cm: number(columns.height),
        };

        let record = patients
            .entry(PatientId::new(id.clone()))
            .or_insert_with(|| PatientRecord::new(id));
        record.admission.fill_from(&row_admission);
        apply_risk(
            &mut record.risk,
            number(columns.mortality),
            number(columns.decompensation),
            number(columns.los),
        );

        for (kind, idx) in &columns.channels {
            record.channel_mut(*kind).push(offset, number(*idx));
        }
    }

    let patients: Vec<PatientRecord> = patients
        .into_values()
        .map(|mut p| {
            p.sort_channels();
            p
        })
        .collect();

    debug!(
        patients = patients.len(),
        rows, skipped_rows, "Parsed upload"
    );

    Ok(ParsedUpload {
        patients,
        rows,
        skipped_rows,
    })
}

/// Later rows override earlier ones where they carry a value.
fn apply_risk(
    risk: &mut RiskScores,
    mortality: Option<f64>,
    decompensation: Option<f64>,
    los: Option<f64>,
) {
    if let Some(v) = mortality {
        risk.mortality = v;
    }
    if let Some(v) = decompensation {
        risk.decompensation = v;
    }
    if let Some(v) = los {
        risk.los_days = v;
    }
}

/// Parse a numeric field. Empty, non-numeric and non-finite values are missing.
fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split text into records on line breaks outside double quotes.
///
/// A quoted field may span lines; its line break stays in the field.
fn split_records(text: &str) -> Vec<&str> {
    let mut records = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;

    for (i, b) in text.bytes().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                records.push(text[start..i].trim_end_matches('\r'));
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        records.push(text[start..].trim_end_matches('\r'));
    }
    records
}

/// Split one CSV record, honouring double quotes and `""` escapes.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(rows: &[&str]) -> String {
        let mut text = String::from(CSV_FORMAT);
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn groups_rows_by_patient() {
        let text = upload(&[
            "141168,59,Sepsis,84.3,162.6,0,90,75,18,97,0.21,37.0,120,7.40,2014-01-01 08:00",
            "141168,59,Sepsis,84.3,162.6,60,95,70,22,95,0.30,37.4,,7.38,2014-01-01 08:00",
            "141203,73,CHF,72.0,170.0,0,110,60,28,91,0.40,38.2,140,7.31,2014-01-02 10:00",
        ]);
        let parsed = parse_upload(&text).unwrap();
        assert_eq!(parsed.rows, 3);
        assert_eq!(parsed.skipped_rows, 0);
        assert_eq!(parsed.patients.len(), 2);

        let p = &parsed.patients[0];
        assert_eq!(p.id.as_str(), "141168");
        assert_eq!(p.admission.diagnosis.as_deref(), Some("Sepsis"));
        assert_eq!(p.admission.weight_kg, Some(84.3));
        assert_eq!(p.channel(ChannelKind::HeartRate).unwrap().len(), 2);
        assert_eq!(p.latest(ChannelKind::RespiratoryRate), Some(22.0));
        // Empty glucose is missing, not zero
        assert_eq!(p.latest(ChannelKind::Glucose), None);
    }

    #[test]
    fn rows_without_id_are_skipped() {
        let text = upload(&[
            ",59,Sepsis,84.3,162.6,0,90,75,18,97,0.21,37.0,120,7.40,x",
            "141168,59,Sepsis,84.3,162.6,0,90,75,18,97,0.21,37.0,120,7.40,x",
        ]);
        let parsed = parse_upload(&text).unwrap();
        assert_eq!(parsed.rows, 2);
        assert_eq!(parsed.skipped_rows, 1);
        assert_eq!(parsed.patients.len(), 1);
    }

    #[test]
    fn rows_without_offset_are_skipped() {
        let text = upload(&["141168,59,Sepsis,84.3,162.6,later,90,75,18,97,0.21,37.0,120,7.40,x"]);
        let parsed = parse_upload(&text).unwrap();
        assert_eq!(parsed.skipped_rows, 1);
        assert!(parsed.patients.is_empty());
    }

    #[test]
    fn nan_and_text_are_missing() {
        let text = upload(&["1,59,Sepsis,NaN,162.6,0,abc,75,18,97,0.21,37.0,120,7.40,x"]);
        let parsed = parse_upload(&text).unwrap();
        let p = &parsed.patients[0];
        assert_eq!(p.admission.weight_kg, None);
        assert_eq!(p.latest(ChannelKind::HeartRate), None);
        assert_eq!(p.latest(ChannelKind::MeanArterialPressure), Some(75.0));
    }

    #[test]
    fn zero_is_kept_as_observation() {
        let text = upload(&["1,59,Sepsis,80,160,0,0,75,18,97,0.21,37.0,120,7.40,x"]);
        let parsed = parse_upload(&text).unwrap();
        assert_eq!(parsed.patients[0].latest(ChannelKind::HeartRate), Some(0.0));
    }

    #[test]
    fn channels_sorted_by_offset() {
        let text = upload(&[
            "1,59,Sepsis,80,160,120,100,75,18,97,0.21,37.0,120,7.40,x",
            "1,59,Sepsis,80,160,0,80,75,18,97,0.21,37.0,120,7.40,x",
        ]);
        let parsed = parse_upload(&text).unwrap();
        let hr = parsed.patients[0].channel(ChannelKind::HeartRate).unwrap();
        assert!(hr.is_ordered());
        assert_eq!(hr.latest_value(), Some(100.0));
    }

    #[test]
    fn quoted_fields_may_contain_commas() {
        let text = upload(&[r#"1,59,"Sepsis, pulmonary",80,160,0,80,75,18,97,0.21,37.0,120,7.40,x"#]);
        let parsed = parse_upload(&text).unwrap();
        assert_eq!(
            parsed.patients[0].admission.diagnosis.as_deref(),
            Some("Sepsis, pulmonary")
        );
        assert_eq!(parsed.patients[0].latest(ChannelKind::HeartRate), Some(80.0));
    }

    #[test]
    fn missing_required_column() {
        let err = parse_upload("hospitalid,itemoffset\n59,0").unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn(ID_COLUMN)));
    }

    #[test]
    fn empty_upload() {
        assert!(matches!(parse_upload("").unwrap_err(), IngestError::Empty));
        assert!(matches!(parse_upload("\n\n").unwrap_err(), IngestError::Empty));
    }

    #[test]
    fn absent_channel_columns_are_all_missing() {
        let parsed = parse_upload("patientunitstayid,itemoffset,O2 Saturation\n1,0,96\n1,5,94").unwrap();
        let p = &parsed.patients[0];
        assert_eq!(p.latest(ChannelKind::O2Saturation), Some(94.0));
        let hr = p.channel(ChannelKind::HeartRate).unwrap();
        assert_eq!(hr.len(), 2);
        assert_eq!(hr.observed_count(), 0);
    }

    #[test]
    fn optional_risk_and_demographic_columns() {
        let text = "patientunitstayid,itemoffset,age,gender,mortalityrisk,decompensationrisk,losestimate\n\
                    7,0,68,Male,0.32,0.45,12.3";
        let parsed = parse_upload(text).unwrap();
        let p = &parsed.patients[0];
        assert_eq!(p.admission.age, Some(68));
        assert_eq!(p.admission.gender.as_deref(), Some("Male"));
        assert_eq!(p.risk, RiskScores::new(0.32, 0.45, 12.3));
    }

    #[test]
    fn header_matching_ignores_case_and_padding() {
        let parsed = parse_upload(" PatientUnitStayID , ItemOffset , heart rate \n9,0,88").unwrap();
        assert_eq!(parsed.patients[0].latest(ChannelKind::HeartRate), Some(88.0));
    }

    #[test]
    fn crlf_line_endings() {
        let parsed = parse_upload("patientunitstayid,itemoffset,pH\r\n3,0,7.41\r\n").unwrap();
        assert_eq!(parsed.patients[0].latest(ChannelKind::Ph), Some(7.41));
    }

    #[test]
    fn quoted_field_spans_lines() {
        let text = "patientunitstayid,itemoffset,apacheadmissiondx,Heart Rate\n\
                    5,0,\"Sepsis, pulmonary\nsource\",90\n\
                    5,60,\"CHF\",95\n";
        let parsed = parse_upload(text).unwrap();
        assert_eq!(parsed.rows, 2);
        assert_eq!(parsed.skipped_rows, 0);
        let p = &parsed.patients[0];
        assert_eq!(
            p.admission.diagnosis.as_deref(),
            Some("Sepsis, pulmonary\nsource")
        );
        assert_eq!(p.channel(ChannelKind::HeartRate).unwrap().len(), 2);
        assert_eq!(p.latest(ChannelKind::HeartRate), Some(95.0));
    }
}
