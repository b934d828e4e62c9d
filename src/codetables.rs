use std::fmt::{self, Display, Formatter};

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// HRIT spacecraft code reported for an unknown satellite.
pub const HRIT_SPACECRAFT_UNKNOWN: u16 = 0;

/// WMO Common Code Table C-5 value for a missing satellite identifier.
pub const WMO_SPACECRAFT_UNKNOWN: u16 = 1023;

/// Pairs of (HRIT spacecraft code, WMO Common Code Table C-5 code).
pub const SPACECRAFT_CODES: &[(u16, u16)] = &[
    (321, 55), // MSG-1, Meteosat-8
    (322, 56), // MSG-2, Meteosat-9
    (323, 57), // MSG-3, Meteosat-10
    (324, 70), // MSG-4, Meteosat-11
];

/// Maps an HRIT spacecraft code to WMO Common Code Table C-5.
///
/// Undocumented codes map to [`WMO_SPACECRAFT_UNKNOWN`].
pub fn spacecraft_id_from_hrit(id: u16) -> u16 {
    SPACECRAFT_CODES
        .iter()
        .find(|(hrit, _)| *hrit == id)
        .map_or(WMO_SPACECRAFT_UNKNOWN, |(_, wmo)| *wmo)
}

/// Maps a WMO Common Code Table C-5 code back to the HRIT spacecraft code.
///
/// Undocumented codes map to [`HRIT_SPACECRAFT_UNKNOWN`].
pub fn spacecraft_id_to_hrit(id: u16) -> u16 {
    SPACECRAFT_CODES
        .iter()
        .find(|(_, wmo)| *wmo == id)
        .map_or(HRIT_SPACECRAFT_UNKNOWN, |(hrit, _)| *hrit)
}

/// Returns the common name of a satellite given its WMO code.
pub fn spacecraft_name(wmo_id: u16) -> &'static str {
    match wmo_id {
        55 => "Meteosat-8",
        56 => "Meteosat-9",
        57 => "Meteosat-10",
        70 => "Meteosat-11",
        _ => "unknown",
    }
}

/// SEVIRI spectral channels as numbered in the segment identification record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Channel {
    Vis006 = 1,
    Vis008 = 2,
    Ir016 = 3,
    Ir039 = 4,
    Wv062 = 5,
    Wv073 = 6,
    Ir087 = 7,
    Ir097 = 8,
    Ir108 = 9,
    Ir120 = 10,
    Ir134 = 11,
    Hrv = 12,
}

impl Channel {
    /// Name used for the channel in xRIT file names.
    pub fn product_name(&self) -> &'static str {
        match self {
            Self::Vis006 => "VIS006",
            Self::Vis008 => "VIS008",
            Self::Ir016 => "IR_016",
            Self::Ir039 => "IR_039",
            Self::Wv062 => "WV_062",
            Self::Wv073 => "WV_073",
            Self::Ir087 => "IR_087",
            Self::Ir097 => "IR_097",
            Self::Ir108 => "IR_108",
            Self::Ir120 => "IR_120",
            Self::Ir134 => "IR_134",
            Self::Hrv => "HRV",
        }
    }

    /// Whether the channel measures reflected solar radiation, as opposed
    /// to thermal emission.
    pub fn is_reflective(&self) -> bool {
        matches!(self, Self::Vis006 | Self::Vis008 | Self::Ir016 | Self::Hrv)
    }

    /// Baseline subtracted from calibrated values before they are stored.
    pub fn calibration_base(&self) -> f32 {
        if self.is_reflective() { 0.0 } else { 145.0 }
    }

    /// Unit of the calibrated physical value.
    pub fn unit(&self) -> &'static str {
        if self.is_reflective() {
            "mW m-2 sr-1 (cm-1)-1"
        } else {
            "K"
        }
    }

    pub(crate) fn index(&self) -> usize {
        usize::from(u8::from(*self)) - 1
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.product_name())
    }
}
