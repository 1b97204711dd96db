//! Channel labels.
//!
//! Channels are the user-defined plane descriptions (e.g. "bright field",
//! "GFP") stored under `SLxPictureMetadata/sPicturePlanes/sPlaneNew` as
//! entries keyed `a0`, `a1`, ... . Channels deleted in NIS Elements stay in
//! that map; a validity bitmap deep in the experiment tree marks which ones
//! are still live. Files where nothing was deleted have no bitmap at all.

use tracing::debug;

use crate::format::{Field, Step, Variant};

/// Location of the channel validity bitmap inside the image metadata section.
const VALIDITY_PATH: [Step; 8] = [
    Step::Field(Field::Experiment),
    Step::Field(Field::NextLevel),
    Step::Field(Field::Unnamed),
    Step::Index(0),
    Step::Field(Field::NextLevel),
    Step::Field(Field::Unnamed),
    Step::Index(0),
    Step::Field(Field::ItemValid),
];

const PLANES_PATH: [Step; 3] = [
    Step::Field(Field::PictureMetadata),
    Step::Field(Field::PicturePlanes),
    Step::Field(Field::PlaneNew),
];

/// Ordered labels of the valid channels.
///
/// `metadata_sequence` is the image metadata sequence section, `image_metadata`
/// the image metadata section (which holds the validity bitmap). Planes are
/// ordered by sorting their keys as strings.
pub fn parse_channels(
    metadata_sequence: Option<&Variant>,
    image_metadata: Option<&Variant>,
) -> Vec<String> {
    let Some(planes) = metadata_sequence
        .and_then(|seq| seq.lookup(&PLANES_PATH))
        .and_then(Variant::entries)
    else {
        debug!("No picture planes found, channel list is empty");
        return Vec::new();
    };

    let mut planes: Vec<&(String, Variant)> = planes.iter().collect();
    // Lexicographic: "a10" sorts before "a2"
    planes.sort_by(|a, b| a.0.cmp(&b.0));

    let validity = image_metadata.and_then(validity_flags);
    let flags: Box<dyn Iterator<Item = bool>> = match validity {
        Some(flags) => Box::new(flags.into_iter()),
        None => Box::new(std::iter::repeat(true)),
    };

    planes
        .into_iter()
        .zip(flags)
        .filter(|(_, valid)| *valid)
        .filter_map(|((key, plane), _)| {
            let label = plane.field(Field::Description).and_then(Variant::as_str);
            if label.is_none() {
                debug!(plane = %key, "Picture plane has no description, skipping");
            }
            label.map(str::to_string)
        })
        .collect()
}

/// Read the validity bitmap, or `None` if it is missing or has an unexpected shape.
fn validity_flags(image_metadata: &Variant) -> Option<Vec<bool>> {
    match image_metadata.lookup(&VALIDITY_PATH)? {
        Variant::Bytes(bytes) => Some(bytes.iter().map(|&b| b != 0).collect()),
        Variant::List(items) => items.iter().map(Variant::as_bool).collect(),
        _ => None,
    }
}
