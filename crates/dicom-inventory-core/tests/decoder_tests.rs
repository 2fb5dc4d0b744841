use std::fs::{self, File};
use std::path::Path;
use tempfile::tempdir;

use dicom::core::{DataElement, PrimitiveValue, VR};
use dicom::dictionary_std::{tags, uids};
use dicom::object::{FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries::IMPLICIT_VR_LITTLE_ENDIAN;

use dicom_inventory_core::classify::{image_type_tag, RawImageType};
use dicom_inventory_core::{DicomDecoder, HeaderDecoder};

fn mr_dataset(with_image_type: bool) -> InMemDicomObject {
    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(tags::PATIENT_NAME, VR::PN, PrimitiveValue::from("Doe^Jane")));
    obj.put(DataElement::new(tags::PATIENT_ID, VR::LO, PrimitiveValue::from("P042")));
    obj.put(DataElement::new(tags::PATIENT_SEX, VR::CS, PrimitiveValue::from("F")));
    obj.put(DataElement::new(tags::PATIENT_AGE, VR::AS, PrimitiveValue::from("032Y")));
    obj.put(DataElement::new(tags::STUDY_DESCRIPTION, VR::LO, PrimitiveValue::from("Memory^Pilot")));
    obj.put(DataElement::new(tags::SERIES_DESCRIPTION, VR::LO, PrimitiveValue::from("gre_field_mapping ")));
    obj.put(DataElement::new(tags::SERIES_INSTANCE_UID, VR::UI, PrimitiveValue::from("1.2.826.0.1.42")));
    obj.put(DataElement::new(tags::ACQUISITION_TIME, VR::TM, PrimitiveValue::from("101500.250000")));
    obj.put(DataElement::new(tags::SOP_INSTANCE_UID, VR::UI, PrimitiveValue::from("1.2.826.0.1.42.1")));
    obj.put(DataElement::new(tags::SOP_CLASS_UID, VR::UI, PrimitiveValue::from(uids::MR_IMAGE_STORAGE)));
    if with_image_type {
        let values = ["ORIGINAL", "PRIMARY", "M", "ND", "NORM"]
            .iter()
            .map(|v| v.to_string())
            .collect();
        obj.put(DataElement::new(tags::IMAGE_TYPE, VR::CS, PrimitiveValue::Strs(values)));
    }
    obj
}

fn write_mr_file(path: &Path, with_image_type: bool) {
    let file_obj = mr_dataset(with_image_type)
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                .media_storage_sop_instance_uid("1.2.826.0.1.42.1"),
        )
        .unwrap();
    file_obj.write_to_file(path).unwrap();
}

#[test]
fn test_decode_written_dicom_file() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("img.dcm");
    write_mr_file(&path, true);

    let header = DicomDecoder.decode(&path).unwrap();
    assert_eq!(header.given_name.as_deref(), Some("Jane"));
    assert_eq!(header.family_name.as_deref(), Some("Doe"));
    assert_eq!(header.patient_id.as_deref(), Some("P042"));
    assert_eq!(header.patient_sex.as_deref(), Some("F"));
    assert_eq!(header.patient_age.as_deref(), Some("032Y"));
    assert_eq!(header.study_description.as_deref(), Some("Memory^Pilot"));
    assert_eq!(header.study_name, None);
    assert_eq!(header.series_description.as_deref(), Some("gre_field_mapping"));
    assert_eq!(header.series_instance_uid.as_deref(), Some("1.2.826.0.1.42"));
    assert!(header
        .acquisition_time
        .as_deref()
        .is_some_and(|t| t.starts_with("101500")));
    assert!(matches!(header.image_type, RawImageType::Sequence(_)));
    assert_eq!(image_type_tag(&header.image_type), "M");
}

#[test]
fn test_decode_without_image_type() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("img.dcm");
    write_mr_file(&path, false);

    let header = DicomDecoder.decode(&path).unwrap();
    assert_eq!(header.image_type, RawImageType::Missing);
    assert_eq!(image_type_tag(&header.image_type), "");
}

#[test]
fn test_decode_dataset_without_file_meta() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("bare.dcm");
    let ts = IMPLICIT_VR_LITTLE_ENDIAN.erased();
    mr_dataset(true)
        .write_dataset_with_ts(File::create(&path).unwrap(), &ts)
        .unwrap();

    let header = DicomDecoder.decode(&path).unwrap();
    assert_eq!(header.patient_id.as_deref(), Some("P042"));
    assert_eq!(header.series_instance_uid.as_deref(), Some("1.2.826.0.1.42"));
    assert_eq!(image_type_tag(&header.image_type), "M");
}

#[test]
fn test_decode_dataset_without_uids_is_error() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("anonymous.dcm");
    let mut obj = InMemDicomObject::new_empty();
    obj.put(DataElement::new(tags::PATIENT_ID, VR::LO, PrimitiveValue::from("P042")));
    let ts = IMPLICIT_VR_LITTLE_ENDIAN.erased();
    obj.write_dataset_with_ts(File::create(&path).unwrap(), &ts)
        .unwrap();
    assert!(fs::metadata(&path).unwrap().len() > 0);

    assert!(DicomDecoder.decode(&path).is_err());
}
