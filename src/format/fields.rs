//! Named variant-tree labels.
//!
//! Parsers address tree nodes through [`Field`] rather than spelling raw
//! labels, so every label the crate depends on is listed here once.

use super::variant::Variant;

/// Labels read from ND2 variant trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Image attributes
    ImageAttributes,
    Width,
    Height,
    SequenceCount,

    // Text info
    ImageTextInfo,

    // Picture planes (channels)
    PictureMetadata,
    PicturePlanes,
    PlaneNew,
    Description,

    // Experiment
    Experiment,
    NextLevel,
    /// The empty label used for repeated child entries
    Unnamed,
    ItemValid,
    ApplicationDescription,
    LoopParameters,
    PeriodCount,
    Periods,
    Duration,
    LoopType,
    AveragePeriodDiff,

    // Calibration
    Calibration,
    CalibrationValue,

    // ROIs
    RoiMetadata,
    GlobalRoiCount,
    GlobalRoi,
    AnimationCount,
    Animation,
    RoiInfo,
    ShapeType,
    InterpretationType,
    TimeMs,
    CenterX,
    CenterY,
    CenterZ,
    BoxShape,
    SizeX,
    SizeY,
    SizeZ,
}

impl Field {
    /// The literal label stored in the file.
    pub const fn label(self) -> &'static str {
        match self {
            Field::ImageAttributes => "SLxImageAttributes",
            Field::Width => "uiWidth",
            Field::Height => "uiHeight",
            Field::SequenceCount => "uiSequenceCount",
            Field::ImageTextInfo => "SLxImageTextInfo",
            Field::PictureMetadata => "SLxPictureMetadata",
            Field::PicturePlanes => "sPicturePlanes",
            Field::PlaneNew => "sPlaneNew",
            Field::Description => "sDescription",
            Field::Experiment => "SLxExperiment",
            Field::NextLevel => "ppNextLevelEx",
            Field::Unnamed => "",
            Field::ItemValid => "pItemValid",
            Field::ApplicationDescription => "wsApplicationDesc",
            Field::LoopParameters => "uLoopPars",
            Field::PeriodCount => "uiPeriodCount",
            Field::Periods => "pPeriod",
            Field::Duration => "dDuration",
            Field::LoopType => "uiLoopType",
            Field::AveragePeriodDiff => "dAvgPeriodDiff",
            Field::Calibration => "SLxCalibration",
            Field::CalibrationValue => "dCalibration",
            Field::RoiMetadata => "RoiMetadata_v1",
            Field::GlobalRoiCount => "m_vectGlobal_Size",
            Field::GlobalRoi => "m_vectGlobal",
            Field::AnimationCount => "m_vectAnimParams_Size",
            Field::Animation => "m_vectAnimParams",
            Field::RoiInfo => "m_sInfo",
            Field::ShapeType => "m_uiShapeType",
            Field::InterpretationType => "m_uiInterpType",
            Field::TimeMs => "m_dTimeMs",
            Field::CenterX => "m_dCenterX",
            Field::CenterY => "m_dCenterY",
            Field::CenterZ => "m_dCenterZ",
            Field::BoxShape => "m_sBoxShape",
            Field::SizeX => "m_dSizeX",
            Field::SizeY => "m_dSizeY",
            Field::SizeZ => "m_dSizeZ",
        }
    }

    /// Label of the `index`-th element of an indexed field (`<label>_<index>`).
    pub fn indexed_label(self, index: usize) -> String {
        format!("{}_{}", self.label(), index)
    }
}

impl Variant {
    /// Look up a named field in a map node.
    pub fn field(&self, field: Field) -> Option<&Variant> {
        self.get(field.label())
    }

    /// Look up the `index`-th element of an indexed field.
    pub fn indexed(&self, field: Field, index: usize) -> Option<&Variant> {
        self.get(&field.indexed_label(index))
    }

    /// Look up a named numeric field as f64.
    pub fn f64_field(&self, field: Field) -> Option<f64> {
        self.field(field)?.as_f64()
    }

    /// Look up a named integer field as u64.
    pub fn u64_field(&self, field: Field) -> Option<u64> {
        self.field(field)?.as_u64()
    }

    /// Walk a path of field and index steps.
    pub fn lookup(&self, path: &[Step]) -> Option<&Variant> {
        path.iter().try_fold(self, |node, step| match *step {
            Step::Field(field) => node.field(field),
            Step::Index(index) => node.at(index),
        })
    }
}

/// One step of a [`Variant::lookup`] path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Enter a map node by label
    Field(Field),
    /// Enter a list node by position
    Index(usize),
}
