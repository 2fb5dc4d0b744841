use crate::classify::RawImageType;
use crate::error::Error;
use dicom::dictionary_std::tags;
use dicom::object::{InMemDicomObject, OpenFileOptions};
use dicom::transfer_syntax::entries::IMPLICIT_VR_LITTLE_ENDIAN;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Header fields the inventory needs from one acquisition file.
///
/// Every text field is optional; extraction decides the fallbacks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRecord {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub patient_id: Option<String>,
    pub study_description: Option<String>,
    pub study_name: Option<String>,
    pub series_description: Option<String>,
    pub series_instance_uid: Option<String>,
    pub image_type: RawImageType,
    pub acquisition_time: Option<String>,
    pub patient_sex: Option<String>,
    pub patient_age: Option<String>,
}

/// Reads a `HeaderRecord` from a file on disk.
///
/// Called concurrently from the decode worker pool.
pub trait HeaderDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<HeaderRecord, Error>;
}

/// Decoder backed by the `dicom` crate. Stops reading at the pixel data.
#[derive(Debug, Default, Clone, Copy)]
pub struct DicomDecoder;

impl HeaderDecoder for DicomDecoder {
    fn decode(&self, path: &Path) -> Result<HeaderRecord, Error> {
        match OpenFileOptions::new()
            .read_until(tags::PIXEL_DATA)
            .open_file(path)
        {
            Ok(object) => Ok(header_from(&object)),
            Err(err) => match read_bare_dataset(path) {
                Some(object) => {
                    debug!("Read {} without file meta group", path.display());
                    Ok(header_from(&object))
                }
                None => Err(Error::Decode {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                }),
            },
        }
    }
}

/// Fallback for files written without preamble and file meta group: the
/// dataset is read as implicit VR little endian and kept only if it carries
/// a series or instance UID.
fn read_bare_dataset(path: &Path) -> Option<InMemDicomObject> {
    let file = File::open(path).ok()?;
    let ts = IMPLICIT_VR_LITTLE_ENDIAN.erased();
    let object = InMemDicomObject::read_dataset_with_ts(BufReader::new(file), &ts).ok()?;
    let identified = object.element(tags::SERIES_INSTANCE_UID).is_ok()
        || object.element(tags::SOP_INSTANCE_UID).is_ok();
    identified.then_some(object)
}

fn header_from(object: &InMemDicomObject) -> HeaderRecord {
    let (family_name, given_name) = match attribute_text(object, "PatientName") {
        Some(name) => split_person_name(&name),
        None => (None, None),
    };

    let image_type = match object.element_by_name("ImageType") {
        Ok(element) => match element.to_multi_str() {
            Ok(values) => RawImageType::Sequence(
                values.iter().map(|v| trim_padding(v).to_string()).collect(),
            ),
            Err(_) => element
                .to_str()
                .map(|text| RawImageType::Text(text.into_owned()))
                .unwrap_or_default(),
        },
        Err(_) => RawImageType::Missing,
    };

    HeaderRecord {
        given_name,
        family_name,
        patient_id: attribute_text(object, "PatientID"),
        study_description: attribute_text(object, "StudyDescription"),
        study_name: attribute_text(object, "StudyName"),
        series_description: attribute_text(object, "SeriesDescription"),
        series_instance_uid: attribute_text(object, "SeriesInstanceUID"),
        image_type,
        acquisition_time: attribute_text(object, "AcquisitionTime"),
        patient_sex: attribute_text(object, "PatientSex"),
        patient_age: attribute_text(object, "PatientAge"),
    }
}

fn attribute_text(object: &InMemDicomObject, name: &str) -> Option<String> {
    object
        .element_by_name(name)
        .ok()
        .and_then(|element| element.to_str().ok())
        .map(|value| trim_padding(&value).to_string())
        .filter(|value| !value.is_empty())
}

/// Strip whitespace and the NUL padding used by UI values.
fn trim_padding(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '\0')
}

/// Split a DICOM person name (`Family^Given^Middle^Prefix^Suffix`) into
/// family and given components.
pub fn split_person_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.split('^').map(str::trim);
    let family = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
    let given = parts.next().filter(|p| !p.is_empty()).map(str::to_string);
    (family, given)
}
