//! File handle tests.
//!
//! Tests verify:
//! - Opening validates the signature chunk, version and label map
//! - Opening reads no metadata section
//! - Container errors are reported on open
//! - Local files work end to end through FileRangeReader

use std::io::Write;

use nd2_metadata::{FileRangeReader, IoError, Nd2Error, Nd2Reader, Section};

use super::test_utils::{full_file, Nd2FileBuilder, TrackingMockReader};

fn mock(data: Vec<u8>) -> TrackingMockReader {
    TrackingMockReader::new(data, "mock://test.nd2")
}

#[tokio::test]
async fn test_open_reads_structure() {
    let reader = Nd2Reader::open(mock(full_file())).await.unwrap();

    assert_eq!(reader.version(), (3, 0));
    assert_eq!(reader.image_count(), 4);
    assert_eq!(reader.identifier(), "mock://test.nd2");

    let present: Vec<Section> = reader.sections().map(|(s, _)| s).collect();
    assert!(present.contains(&Section::ImageAttributes));
    assert!(present.contains(&Section::RoiMetadata));
    assert!(present.contains(&Section::AppInfo));
    assert!(!present.contains(&Section::LutData));
    assert!(reader.label_map().image_chunk_offset(3).is_some());
}

#[tokio::test]
async fn test_open_reads_no_sections() {
    let source = mock(full_file());
    let reader = Nd2Reader::open(source.clone()).await.unwrap();

    // Version probe, trailer, label map header and label map data
    assert_eq!(source.request_count(), 4);
    assert_eq!(reader.raw().decode_count(), 0);

    let requests = source.get_requests().await;
    assert_eq!(requests[0].0, 0);
}

#[tokio::test]
async fn test_newer_minor_version() {
    let data = Nd2FileBuilder::new().version("Ver3.1").build();
    let reader = Nd2Reader::open(mock(data)).await.unwrap();
    assert_eq!(reader.version(), (3, 1));
}

#[tokio::test]
async fn test_old_version_rejected() {
    let data = Nd2FileBuilder::new().version("Ver2.2").build();
    let result = Nd2Reader::open(mock(data)).await;

    assert!(matches!(
        result,
        Err(Nd2Error::UnsupportedVersion { major: 2, minor: 2 })
    ));
}

#[tokio::test]
async fn test_missing_version() {
    let data = Nd2FileBuilder::new().version("").build();
    let result = Nd2Reader::open(mock(data)).await;
    assert!(matches!(result, Err(Nd2Error::MissingVersion)));
}

#[tokio::test]
async fn test_not_an_nd2_file() {
    let result = Nd2Reader::open(mock(vec![0u8; 256])).await;
    assert!(matches!(
        result,
        Err(Nd2Error::InvalidChunkMagic { offset: 0, .. })
    ));
}

#[tokio::test]
async fn test_file_too_small() {
    let result = Nd2Reader::open(mock(vec![0xDA, 0xCE, 0xBE])).await;
    assert!(matches!(result, Err(Nd2Error::FileTooSmall { .. })));
}

#[tokio::test]
async fn test_invalid_label_map_offset() {
    let mut data = Nd2FileBuilder::new().build();
    let trailer = data.len() - 8;
    data[trailer..].copy_from_slice(&u64::MAX.to_le_bytes());

    let result = Nd2Reader::open(mock(data)).await;
    assert!(matches!(result, Err(Nd2Error::InvalidLabelMapOffset(u64::MAX))));
}

#[tokio::test]
async fn test_label_map_offset_not_a_chunk() {
    let mut data = Nd2FileBuilder::new().build();
    let trailer = data.len() - 8;
    // Points inside the signature chunk's data
    data[trailer..].copy_from_slice(&20u64.to_le_bytes());

    let result = Nd2Reader::open(mock(data)).await;
    assert!(matches!(result, Err(Nd2Error::InvalidChunkMagic { offset: 20, .. })));
}

// =============================================================================
// Local Files
// =============================================================================

#[tokio::test]
async fn test_local_file_end_to_end() {
    let mut tmp = tempfile::NamedTempFile::new().unwrap();
    tmp.write_all(&full_file()).unwrap();
    tmp.flush().unwrap();

    let source = FileRangeReader::open(tmp.path()).await.unwrap();
    let reader = Nd2Reader::open(source).await.unwrap();
    let metadata = reader.metadata().await;

    assert_eq!(metadata.channels, vec!["DAPI".to_string(), "GFP".to_string()]);
    assert_eq!(metadata.experiment.loops.len(), 3);
}

#[tokio::test]
async fn test_local_file_missing() {
    let result = FileRangeReader::open("/no/such/acquisition.nd2").await;
    assert!(matches!(result, Err(IoError::NotFound(_))));
}
