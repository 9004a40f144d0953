//! Static tag and format tables.
//!
//! Tag numbers are only unique within a directory group: `0x0001` is
//! `GPSLatitudeRef` inside the GPS directory and `InteroperabilityIndex`
//! inside the interoperability directory. Lookups are therefore always keyed
//! by `(TagGroup, number)`; the group travels with the cursor during the walk.
//!
//! Only the tags a camera commonly writes are listed. Anything else decodes
//! as an unnamed entry and sorts after the named ones.

use std::fmt;

/// Directory scope used to resolve tag numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagGroup {
    /// IFD0 and any chained top-level directory (e.g. the thumbnail IFD1).
    Image,
    /// The Exif sub-IFD (`ExifOffset`).
    Exif,
    /// The GPS sub-IFD (`GPSInfo`).
    Gps,
    /// The interoperability sub-IFD (`InteroperabilityOffset`).
    Interop,
}

impl TagGroup {
    pub fn name(self) -> &'static str {
        match self {
            TagGroup::Image => "IFD0",
            TagGroup::Exif => "Exif",
            TagGroup::Gps => "GPSInfo",
            TagGroup::Interop => "Iop",
        }
    }

    fn table(self) -> &'static [TagDescriptor] {
        match self {
            TagGroup::Image => IMAGE_TAGS,
            TagGroup::Exif => EXIF_TAGS,
            TagGroup::Gps => GPS_TAGS,
            TagGroup::Interop => INTEROP_TAGS,
        }
    }
}

impl fmt::Display for TagGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Formats
// ============================================================================

pub const BYTE: u16 = 1;
pub const ASCII: u16 = 2;
pub const SHORT: u16 = 3;
pub const LONG: u16 = 4;
pub const RATIONAL: u16 = 5;
pub const SBYTE: u16 = 6;
pub const UNDEFINED: u16 = 7;
pub const SSHORT: u16 = 8;
pub const SLONG: u16 = 9;
pub const SRATIONAL: u16 = 10;
pub const FLOAT: u16 = 11;
pub const DOUBLE: u16 = 12;

/// How the bytes of one item are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    Unsigned,
    Signed,
    /// Whole value is one zero-terminated string.
    Ascii,
    /// Two u32: numerator, denominator.
    URational,
    /// Two i32: numerator, denominator.
    Rational,
    Undefined,
    /// IEEE floats are not interpreted, they render as hex like `Undefined`.
    Float,
}

/// TIFF field type: id, item width and rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Format {
    pub id: u16,
    pub name: &'static str,
    /// Bytes per item.
    pub width: u32,
    pub kind: FormatKind,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{} bytes:{} {}", self.id, self.width, self.name)
    }
}

const fn format(id: u16, name: &'static str, width: u32, kind: FormatKind) -> Format {
    Format {
        id,
        name,
        width,
        kind,
    }
}

static FORMATS: [Format; 12] = [
    format(BYTE, "Uint8", 1, FormatKind::Unsigned),
    format(ASCII, "ASCII", 1, FormatKind::Ascii),
    format(SHORT, "Uint16", 2, FormatKind::Unsigned),
    format(LONG, "Uint32", 4, FormatKind::Unsigned),
    format(RATIONAL, "URational", 8, FormatKind::URational),
    format(SBYTE, "Int8", 1, FormatKind::Signed),
    format(UNDEFINED, "Undefined", 1, FormatKind::Undefined),
    format(SSHORT, "Int16", 2, FormatKind::Signed),
    format(SLONG, "Int32", 4, FormatKind::Signed),
    format(SRATIONAL, "Rational", 8, FormatKind::Rational),
    format(FLOAT, "Float", 4, FormatKind::Float),
    format(DOUBLE, "Double", 8, FormatKind::Float),
];

/// Format for a TIFF field type id, `None` for ids outside 1..=12.
pub fn lookup_format(id: u16) -> Option<&'static Format> {
    FORMATS.iter().find(|f| f.id == id)
}

pub(super) fn undefined_format() -> &'static Format {
    &FORMATS[UNDEFINED as usize - 1]
}

// ============================================================================
// Tags
// ============================================================================

/// Static description of one tag within a group.
#[derive(Debug, PartialEq, Eq)]
pub struct TagDescriptor {
    pub number: u16,
    pub name: &'static str,
    pub description: &'static str,
    /// Declared formats; the first is used when a file stores `Undefined`.
    pub formats: &'static [u16],
    /// Set when the value is an offset to a sub-directory of that group.
    pub sub_dir: Option<TagGroup>,
}

const fn t(
    number: u16,
    name: &'static str,
    formats: &'static [u16],
    description: &'static str,
) -> TagDescriptor {
    TagDescriptor {
        number,
        name,
        description,
        formats,
        sub_dir: None,
    }
}

const fn dir(number: u16, name: &'static str, group: TagGroup, description: &'static str) -> TagDescriptor {
    TagDescriptor {
        number,
        name,
        description,
        formats: &[LONG],
        sub_dir: Some(group),
    }
}

static IMAGE_TAGS: &[TagDescriptor] = &[
    t(0x00FE, "NewSubfileType", &[LONG], "Kind of data in this subfile."),
    t(0x0100, "ImageWidth", &[SHORT, LONG], "Number of columns of image data."),
    t(0x0101, "ImageLength", &[SHORT, LONG], "Number of rows of image data."),
    t(0x0102, "BitsPerSample", &[SHORT], "Number of bits per image component."),
    t(0x0103, "Compression", &[SHORT], "Compression scheme used for the image data."),
    t(0x0106, "PhotometricInterpretation", &[SHORT], "Pixel composition."),
    t(0x010E, "ImageDescription", &[ASCII], "Title of the image."),
    t(0x010F, "Make", &[ASCII], "Manufacturer of the recording equipment."),
    t(0x0110, "Model", &[ASCII], "Model name or number of the equipment."),
    t(0x0111, "StripOffsets", &[SHORT, LONG], "Byte offset of each strip."),
    t(0x0112, "Orientation", &[SHORT], "Orientation of the image with respect to rows and columns."),
    t(0x0115, "SamplesPerPixel", &[SHORT], "Number of components per pixel."),
    t(0x0116, "RowsPerStrip", &[SHORT, LONG], "Number of rows per strip."),
    t(0x0117, "StripByteCounts", &[SHORT, LONG], "Bytes in each strip after compression."),
    t(0x011A, "XResolution", &[RATIONAL], "Pixels per ResolutionUnit in the ImageWidth direction."),
    t(0x011B, "YResolution", &[RATIONAL], "Pixels per ResolutionUnit in the ImageLength direction."),
    t(0x011C, "PlanarConfiguration", &[SHORT], "Chunky or planar component storage."),
    t(0x0128, "ResolutionUnit", &[SHORT], "Unit of XResolution and YResolution."),
    t(0x012D, "TransferFunction", &[SHORT], "Transfer function in tabular style."),
    t(0x0131, "Software", &[ASCII], "Software used to generate the image."),
    t(0x0132, "DateTime", &[ASCII], "Date and time the file was last changed."),
    t(0x013B, "Artist", &[ASCII], "Person who created the image."),
    t(0x013E, "WhitePoint", &[RATIONAL], "Chromaticity of the white point."),
    t(0x013F, "PrimaryChromaticities", &[RATIONAL], "Chromaticity of the three primary colors."),
    t(0x0201, "JPEGInterchangeFormat", &[LONG], "Offset to the JPEG SOI of the thumbnail."),
    t(0x0202, "JPEGInterchangeFormatLength", &[LONG], "Bytes of thumbnail JPEG data."),
    t(0x0211, "YCbCrCoefficients", &[RATIONAL], "Color space transformation matrix coefficients."),
    t(0x0212, "YCbCrSubSampling", &[SHORT], "Chrominance subsampling ratio."),
    t(0x0213, "YCbCrPositioning", &[SHORT], "Position of chrominance relative to luminance samples."),
    t(0x0214, "ReferenceBlackWhite", &[RATIONAL], "Reference black and white point values."),
    t(0x8298, "Copyright", &[ASCII], "Copyright notice."),
    dir(0x8769, "ExifOffset", TagGroup::Exif, "Offset to the Exif sub-IFD."),
    dir(0x8825, "GPSInfo", TagGroup::Gps, "Offset to the GPS sub-IFD."),
];

static EXIF_TAGS: &[TagDescriptor] = &[
    t(0x829A, "ExposureTime", &[RATIONAL], "Exposure time in seconds."),
    t(0x829D, "FNumber", &[RATIONAL], "The F number."),
    t(0x8822, "ExposureProgram", &[SHORT], "Class of program used to set exposure."),
    t(0x8824, "SpectralSensitivity", &[ASCII], "Spectral sensitivity of each channel."),
    t(0x8827, "ISOSpeedRatings", &[SHORT], "ISO speed."),
    t(0x8830, "SensitivityType", &[SHORT], "Which sensitivity parameter ISOSpeedRatings holds."),
    t(0x9000, "ExifVersion", &[ASCII], "Exif version, four ASCII digits."),
    t(0x9003, "DateTimeOriginal", &[ASCII], "Date and time the original image was taken."),
    t(0x9004, "DateTimeDigitized", &[ASCII], "Date and time the image was stored as digital data."),
    t(0x9010, "OffsetTime", &[ASCII], "UTC offset of DateTime."),
    t(0x9011, "OffsetTimeOriginal", &[ASCII], "UTC offset of DateTimeOriginal."),
    t(0x9012, "OffsetTimeDigitized", &[ASCII], "UTC offset of DateTimeDigitized."),
    t(0x9101, "ComponentsConfiguration", &[UNDEFINED], "Channel order of compressed data."),
    t(0x9102, "CompressedBitsPerPixel", &[RATIONAL], "Compression mode used for the image."),
    t(0x9201, "ShutterSpeedValue", &[SRATIONAL], "Shutter speed, APEX units."),
    t(0x9202, "ApertureValue", &[RATIONAL], "Lens aperture, APEX units."),
    t(0x9203, "BrightnessValue", &[SRATIONAL], "Brightness, APEX units."),
    t(0x9204, "ExposureBiasValue", &[SRATIONAL], "Exposure bias, APEX units."),
    t(0x9205, "MaxApertureValue", &[RATIONAL], "Smallest F number of the lens."),
    t(0x9206, "SubjectDistance", &[RATIONAL], "Distance to the subject in meters."),
    t(0x9207, "MeteringMode", &[SHORT], "Metering mode."),
    t(0x9208, "LightSource", &[SHORT], "Kind of light source."),
    t(0x9209, "Flash", &[SHORT], "Flash status."),
    t(0x920A, "FocalLength", &[RATIONAL], "Focal length of the lens in millimeters."),
    t(0x927C, "MakerNote", &[UNDEFINED], "Manufacturer specific information."),
    t(0x9286, "UserComment", &[ASCII], "User comment."),
    t(0x9290, "SubSecTime", &[ASCII], "Fractions of seconds for DateTime."),
    t(0x9291, "SubSecTimeOriginal", &[ASCII], "Fractions of seconds for DateTimeOriginal."),
    t(0x9292, "SubSecTimeDigitized", &[ASCII], "Fractions of seconds for DateTimeDigitized."),
    t(0xA000, "FlashPixVersion", &[ASCII], "Supported Flashpix version."),
    t(0xA001, "ColorSpace", &[SHORT], "Color space information."),
    t(0xA002, "ExifImageWidth", &[SHORT, LONG], "Valid width of the meaningful image."),
    t(0xA003, "ExifImageHeight", &[SHORT, LONG], "Valid height of the meaningful image."),
    t(0xA004, "RelatedSoundFile", &[ASCII], "Name of an audio file related to the image."),
    dir(0xA005, "InteroperabilityOffset", TagGroup::Interop, "Offset to the interoperability sub-IFD."),
    t(0xA20E, "FocalPlaneXResolution", &[RATIONAL], "Pixels per unit in the focal plane width direction."),
    t(0xA20F, "FocalPlaneYResolution", &[RATIONAL], "Pixels per unit in the focal plane height direction."),
    t(0xA210, "FocalPlaneResolutionUnit", &[SHORT], "Unit of the focal plane resolutions."),
    t(0xA215, "ExposureIndex", &[RATIONAL], "Exposure index selected on the camera."),
    t(0xA217, "SensingMethod", &[SHORT], "Image sensor type."),
    t(0xA300, "FileSource", &[UNDEFINED], "Image source."),
    t(0xA301, "SceneType", &[UNDEFINED], "Type of scene."),
    t(0xA302, "CFAPattern", &[UNDEFINED], "Color filter array geometric pattern."),
    t(0xA401, "CustomRendered", &[SHORT], "Special processing applied to the image."),
    t(0xA402, "ExposureMode", &[SHORT], "Exposure mode set when shot."),
    t(0xA403, "WhiteBalance", &[SHORT], "White balance mode set when shot."),
    t(0xA404, "DigitalZoomRatio", &[RATIONAL], "Digital zoom ratio when shot."),
    t(0xA405, "FocalLengthIn35mmFilm", &[SHORT], "Equivalent focal length for 35mm film."),
    t(0xA406, "SceneCaptureType", &[SHORT], "Type of scene that was shot."),
    t(0xA407, "GainControl", &[SHORT], "Degree of overall image gain adjustment."),
    t(0xA408, "Contrast", &[SHORT], "Contrast processing applied by the camera."),
    t(0xA409, "Saturation", &[SHORT], "Saturation processing applied by the camera."),
    t(0xA40A, "Sharpness", &[SHORT], "Sharpness processing applied by the camera."),
    t(0xA40C, "SubjectDistanceRange", &[SHORT], "Distance to the subject."),
    t(0xA420, "ImageUniqueID", &[ASCII], "Unique identifier assigned to the image."),
    t(0xA430, "CameraOwnerName", &[ASCII], "Owner of the camera."),
    t(0xA431, "BodySerialNumber", &[ASCII], "Serial number of the camera body."),
    t(0xA432, "LensSpecification", &[RATIONAL], "Minimum and maximum focal length and F number."),
    t(0xA433, "LensMake", &[ASCII], "Lens manufacturer."),
    t(0xA434, "LensModel", &[ASCII], "Lens model name and number."),
];

static GPS_TAGS: &[TagDescriptor] = &[
    t(0x0000, "GPSVersionID", &[BYTE], "Version of the GPS IFD."),
    t(0x0001, "GPSLatitudeRef", &[ASCII], "North or south latitude."),
    t(0x0002, "GPSLatitude", &[RATIONAL], "Latitude as degrees, minutes, seconds."),
    t(0x0003, "GPSLongitudeRef", &[ASCII], "East or west longitude."),
    t(0x0004, "GPSLongitude", &[RATIONAL], "Longitude as degrees, minutes, seconds."),
    t(0x0005, "GPSAltitudeRef", &[BYTE], "Altitude reference, 0 is above sea level."),
    t(0x0006, "GPSAltitude", &[RATIONAL], "Altitude in meters relative to GPSAltitudeRef."),
    t(0x0007, "GPSTimeStamp", &[RATIONAL], "UTC time as hour, minute, second."),
    t(0x0008, "GPSSatellites", &[ASCII], "Satellites used for measurement."),
    t(0x0009, "GPSStatus", &[ASCII], "Receiver status."),
    t(0x000A, "GPSMeasureMode", &[ASCII], "Measurement mode."),
    t(0x000B, "GPSDOP", &[RATIONAL], "Data degree of precision."),
    t(0x000C, "GPSSpeedRef", &[ASCII], "Unit of GPSSpeed."),
    t(0x000D, "GPSSpeed", &[RATIONAL], "Speed of the receiver."),
    t(0x000E, "GPSTrackRef", &[ASCII], "Reference for GPSTrack."),
    t(0x000F, "GPSTrack", &[RATIONAL], "Direction of movement."),
    t(0x0010, "GPSImgDirectionRef", &[ASCII], "Reference for GPSImgDirection."),
    t(0x0011, "GPSImgDirection", &[RATIONAL], "Direction of the image when captured."),
    t(0x0012, "GPSMapDatum", &[ASCII], "Geodetic survey data used."),
    t(0x0013, "GPSDestLatitudeRef", &[ASCII], "Reference for latitude of destination."),
    t(0x0014, "GPSDestLatitude", &[RATIONAL], "Latitude of destination."),
    t(0x0015, "GPSDestLongitudeRef", &[ASCII], "Reference for longitude of destination."),
    t(0x0016, "GPSDestLongitude", &[RATIONAL], "Longitude of destination."),
    t(0x0017, "GPSDestBearingRef", &[ASCII], "Reference for bearing to destination."),
    t(0x0018, "GPSDestBearing", &[RATIONAL], "Bearing to destination."),
    t(0x0019, "GPSDestDistanceRef", &[ASCII], "Unit of GPSDestDistance."),
    t(0x001A, "GPSDestDistance", &[RATIONAL], "Distance to destination."),
    t(0x001B, "GPSProcessingMethod", &[UNDEFINED], "Name of the positioning method."),
    t(0x001C, "GPSAreaInformation", &[UNDEFINED], "Name of the GPS area."),
    t(0x001D, "GPSDateStamp", &[ASCII], "UTC date as YYYY:MM:DD."),
    t(0x001E, "GPSDifferential", &[SHORT], "Whether differential correction was applied."),
];

static INTEROP_TAGS: &[TagDescriptor] = &[
    t(0x0001, "InteroperabilityIndex", &[ASCII], "Interoperability rule, e.g. R98."),
    t(0x0002, "InteroperabilityVersion", &[ASCII], "Interoperability version."),
    t(0x1000, "RelatedImageFileFormat", &[ASCII], "File format of the related image."),
    t(0x1001, "RelatedImageWidth", &[SHORT, LONG], "Width of the related image."),
    t(0x1002, "RelatedImageLength", &[SHORT, LONG], "Height of the related image."),
];

/// Descriptor for a tag number within a group.
pub fn lookup_tag(group: TagGroup, number: u16) -> Option<&'static TagDescriptor> {
    group.table().iter().find(|d| d.number == number)
}

/// A tag as found in a directory: scope, number and descriptor if known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagRef {
    pub group: TagGroup,
    pub number: u16,
    pub descriptor: Option<&'static TagDescriptor>,
}

impl TagRef {
    pub fn resolve(group: TagGroup, number: u16) -> Self {
        Self {
            group,
            number,
            descriptor: lookup_tag(group, number),
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor.map_or("Unknown", |d| d.name)
    }

    pub fn description(&self) -> &'static str {
        self.descriptor.map_or("", |d| d.description)
    }

    pub fn is_known(&self) -> bool {
        self.descriptor.is_some()
    }

    pub fn sub_dir(&self) -> Option<TagGroup> {
        self.descriptor.and_then(|d| d.sub_dir)
    }

    /// Format to use when the file stores `Undefined` or an unknown id.
    pub(super) fn fallback_format(&self) -> Option<&'static Format> {
        self.descriptor
            .and_then(|d| d.formats.first())
            .and_then(|&id| lookup_format(id))
    }
}
