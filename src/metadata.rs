use exif::{In, Reader, Tag, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Capture metadata pulled out of the embedded EXIF block, already split the
/// way the report wants it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifSummary {
    /// Allow-listed camera tags (Model, Make, Software).
    pub camera_info: BTreeMap<String, String>,
    /// All tags from the GPS namespace, values rendered as raw strings
    /// (rational triples stay in `num/denom` form for the resolver).
    pub gps_raw: BTreeMap<String, String>,
    /// `DateTimeOriginal`, verbatim.
    pub capture_time: Option<String>,
}

const CAMERA_TAGS: [Tag; 3] = [Tag::Model, Tag::Make, Tag::Software];

/// Reads the EXIF tag set of `path` and classifies it by tag name.
///
/// Tags outside the GPS namespace, the camera allow-list and the original
/// capture timestamp are discarded. This never fails: a corrupt file or a
/// missing tag block yields an all-empty [`ExifSummary`], keeping metadata
/// failures out of the rest of the pipeline.
pub fn extract_metadata(path: &Path) -> ExifSummary {
    let Ok(file) = File::open(path) else {
        return ExifSummary::default();
    };
    let mut reader = BufReader::new(file);
    let Ok(exif) = Reader::new().read_from_container(&mut reader) else {
        return ExifSummary::default();
    };

    let mut summary = ExifSummary::default();
    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let name = field.tag.to_string();
        if name.starts_with("GPS") {
            summary
                .gps_raw
                .insert(name, render_value(&field.value, field.tag));
        } else if CAMERA_TAGS.contains(&field.tag) {
            summary
                .camera_info
                .insert(name, render_value(&field.value, field.tag));
        } else if field.tag == Tag::DateTimeOriginal {
            summary.capture_time = Some(render_value(&field.value, field.tag));
        }
    }
    summary
}

/// Renders a tag value as a plain string. Rational vectors keep their
/// `num/denom` form so DMS coordinates stay parseable downstream; ASCII
/// values are decoded directly instead of going through the quoted
/// `Display` form.
fn render_value(value: &Value, tag: Tag) -> String {
    match value {
        Value::Ascii(parts) => parts
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string(),
        Value::Rational(rationals) => rationals
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .collect::<Vec<_>>()
            .join(", "),
        Value::SRational(rationals) => rationals
            .iter()
            .map(|r| format!("{}/{}", r.num, r.denom))
            .collect::<Vec<_>>()
            .join(", "),
        other => other.display_as(tag).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_yields_empty_summary() {
        let summary = extract_metadata(Path::new("/definitely/not/here.jpg"));
        assert_eq!(summary, ExifSummary::default());
    }

    #[test]
    fn garbage_bytes_yield_empty_summary() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not an image at all").unwrap();

        let summary = extract_metadata(file.path());
        assert!(summary.camera_info.is_empty());
        assert!(summary.gps_raw.is_empty());
        assert!(summary.capture_time.is_none());
    }

    #[test]
    fn plain_jpeg_without_exif_yields_empty_summary() {
        // A real JPEG, but with no EXIF segment.
        let file = tempfile::NamedTempFile::with_suffix(".jpg").unwrap();
        let img = image::GrayImage::from_pixel(8, 8, image::Luma([128u8]));
        img.save_with_format(file.path(), image::ImageFormat::Jpeg)
            .unwrap();

        let summary = extract_metadata(file.path());
        assert_eq!(summary, ExifSummary::default());
    }

    #[test]
    fn renders_rationals_as_fraction_triples() {
        let value = Value::Rational(vec![
            exif::Rational { num: 40, denom: 1 },
            exif::Rational { num: 26, denom: 1 },
            exif::Rational { num: 4600, denom: 100 },
        ]);
        assert_eq!(
            render_value(&value, Tag::GPSLatitude),
            "40/1, 26/1, 4600/100"
        );
    }

    #[test]
    fn renders_ascii_without_quoting() {
        let value = Value::Ascii(vec![b"Pixel 7".to_vec()]);
        assert_eq!(render_value(&value, Tag::Model), "Pixel 7");
    }
}
