//! GPS extraction through `exiftool`

use std::{path::Path, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;

use super::{run, Coordinates, LocationExtractor, ToolError, DEFAULT_TIMEOUT};

/// Signed decimal degrees, enough digits to never lose precision.
const COORD_FORMAT: &str = "%+.24f";

#[derive(Debug, Clone)]
pub struct ExifTool {
    program: String,
    timeout: Duration,
}

impl ExifTool {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }
}

impl Default for ExifTool {
    fn default() -> Self {
        Self::new("exiftool", DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl LocationExtractor for ExifTool {
    async fn extract_location(&self, path: &Path) -> Result<Option<Coordinates>, ToolError> {
        let mut command = Command::new(&self.program);
        command.arg("-c").arg(COORD_FORMAT).arg("-j").arg(path);
        let stdout = run(command, self.timeout).await?;
        parse_location(&self.program, &stdout)
    }
}

/// One element of `exiftool -j` output; everything but GPS is ignored.
#[derive(Deserialize)]
struct Record {
    #[serde(rename = "GPSLatitude")]
    latitude: Option<String>,
    #[serde(rename = "GPSLongitude")]
    longitude: Option<String>,
}

fn parse_location(program: &str, stdout: &[u8]) -> Result<Option<Coordinates>, ToolError> {
    let output_error = |reason: String| ToolError::Output {
        program: program.to_string(),
        reason,
    };

    let records: Vec<Record> =
        serde_json::from_slice(stdout).map_err(|e| output_error(e.to_string()))?;
    let [record] = <[Record; 1]>::try_from(records)
        .map_err(|records| output_error(format!("expected 1 record, got {}", records.len())))?;

    match (record.latitude, record.longitude) {
        (None, None) => Ok(None),
        (Some(latitude), Some(longitude)) => Ok(Some(Coordinates {
            latitude: parse_degrees("latitude", latitude)?,
            longitude: parse_degrees("longitude", longitude)?,
        })),
        (Some(_), None) => Err(output_error("GPSLongitude missing".into())),
        (None, Some(_)) => Err(output_error("GPSLatitude missing".into())),
    }
}

fn parse_degrees(field: &'static str, value: String) -> Result<f64, ToolError> {
    value
        .trim()
        .parse()
        .map_err(|source| ToolError::Coordinate {
            field,
            value,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_signed_decimal_degrees() {
        let out = br#"[{
            "SourceFile": "/pics/a.png",
            "GPSLatitude": "+48.858370000000000000000000",
            "GPSLongitude": "-2.294481000000000000000000"
        }]"#;

        let coords = parse_location("exiftool", out).unwrap().unwrap();
        assert!((coords.latitude - 48.85837).abs() < 1e-9);
        assert!((coords.longitude + 2.294481).abs() < 1e-9);
    }

    #[test]
    fn no_gps_fields_means_no_position() {
        let out = br#"[{"SourceFile": "/pics/b.png", "ImageWidth": 640}]"#;
        assert_eq!(parse_location("exiftool", out).unwrap(), None);
    }

    #[test]
    fn half_a_position_is_rejected() {
        let out = br#"[{"GPSLatitude": "+1.5"}]"#;
        assert!(matches!(
            parse_location("exiftool", out),
            Err(ToolError::Output { .. })
        ));
    }

    #[test]
    fn exactly_one_record_is_required() {
        assert!(parse_location("exiftool", b"[]").is_err());
        assert!(parse_location(
            "exiftool",
            br#"[{"GPSLatitude": "1", "GPSLongitude": "2"}, {"GPSLatitude": "1", "GPSLongitude": "2"}]"#
        )
        .is_err());
    }

    #[test]
    fn garbage_output_is_rejected() {
        assert!(matches!(
            parse_location("exiftool", b"Error: File not found"),
            Err(ToolError::Output { .. })
        ));
    }

    #[test]
    fn unparsable_coordinate_names_the_field() {
        let out = br#"[{"GPSLatitude": "+1.5", "GPSLongitude": "51 deg 30' 0.00\" W"}]"#;
        match parse_location("exiftool", out) {
            Err(ToolError::Coordinate { field, .. }) => assert_eq!(field, "longitude"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
