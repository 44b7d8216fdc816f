use core::fmt;

/// Interpreter generations, ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SciVersion {
    Sci0Early = 0,
    Sci0Late = 1,
    Sci01 = 2,
    Sci1Early = 3,
    Sci1Middle = 4,
    Sci1Late = 5,
    Sci11 = 6,
    Sci2 = 7,
    Sci21 = 8,
    Sci3 = 9,
}

impl SciVersion {
    pub const OLDEST: SciVersion = SciVersion::Sci0Early;
    pub const NEWEST: SciVersion = SciVersion::Sci3;

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(SciVersion::Sci0Early),
            1 => Some(SciVersion::Sci0Late),
            2 => Some(SciVersion::Sci01),
            3 => Some(SciVersion::Sci1Early),
            4 => Some(SciVersion::Sci1Middle),
            5 => Some(SciVersion::Sci1Late),
            6 => Some(SciVersion::Sci11),
            7 => Some(SciVersion::Sci2),
            8 => Some(SciVersion::Sci21),
            9 => Some(SciVersion::Sci3),
            _ => None,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "sci0early" | "sci0-early" => Some(SciVersion::Sci0Early),
            "sci0" | "sci0late" | "sci0-late" => Some(SciVersion::Sci0Late),
            "sci01" => Some(SciVersion::Sci01),
            "sci1early" | "sci1-early" => Some(SciVersion::Sci1Early),
            "sci1middle" | "sci1-middle" => Some(SciVersion::Sci1Middle),
            "sci1" | "sci1late" | "sci1-late" => Some(SciVersion::Sci1Late),
            "sci11" | "sci1.1" => Some(SciVersion::Sci11),
            "sci2" => Some(SciVersion::Sci2),
            "sci21" | "sci2.1" => Some(SciVersion::Sci21),
            "sci3" => Some(SciVersion::Sci3),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SciVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SciVersion::Sci0Early => "sci0-early",
            SciVersion::Sci0Late => "sci0-late",
            SciVersion::Sci01 => "sci01",
            SciVersion::Sci1Early => "sci1-early",
            SciVersion::Sci1Middle => "sci1-middle",
            SciVersion::Sci1Late => "sci1-late",
            SciVersion::Sci11 => "sci1.1",
            SciVersion::Sci2 => "sci2",
            SciVersion::Sci21 => "sci2.1",
            SciVersion::Sci3 => "sci3",
        };
        f.write_str(name)
    }
}

/// Inclusive range of interpreter versions a kernel variant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: SciVersion,
    pub max: SciVersion,
}

impl VersionRange {
    pub const ALL: VersionRange = VersionRange::new(SciVersion::OLDEST, SciVersion::NEWEST);

    pub const fn new(min: SciVersion, max: SciVersion) -> Self {
        Self { min, max }
    }

    pub const fn only(version: SciVersion) -> Self {
        Self::new(version, version)
    }

    pub const fn from(min: SciVersion) -> Self {
        Self::new(min, SciVersion::NEWEST)
    }

    pub const fn until(max: SciVersion) -> Self {
        Self::new(SciVersion::OLDEST, max)
    }

    pub fn contains(&self, version: SciVersion) -> bool {
        self.min <= version && version <= self.max
    }

    /// Number of versions covered; smaller is more specific.
    pub fn width(&self) -> u8 {
        (self.max as u8).saturating_sub(self.min as u8) + 1
    }
}

/// Host platforms a game release can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Dos,
    Amiga,
    Macintosh,
    Windows,
    FmTowns,
}

impl Platform {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "dos" | "pc" => Some(Platform::Dos),
            "amiga" => Some(Platform::Amiga),
            "mac" | "macintosh" => Some(Platform::Macintosh),
            "windows" | "win" => Some(Platform::Windows),
            "fmtowns" | "fm-towns" => Some(Platform::FmTowns),
            _ => None,
        }
    }

    pub const fn bit(self) -> u8 {
        match self {
            Platform::Dos => PlatformMask::DOS,
            Platform::Amiga => PlatformMask::AMIGA,
            Platform::Macintosh => PlatformMask::MAC,
            Platform::Windows => PlatformMask::WINDOWS,
            Platform::FmTowns => PlatformMask::FM_TOWNS,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Dos => "dos",
            Platform::Amiga => "amiga",
            Platform::Macintosh => "mac",
            Platform::Windows => "windows",
            Platform::FmTowns => "fmtowns",
        };
        f.write_str(name)
    }
}

/// Set of platforms, one bit per [`Platform`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformMask(pub u8);

impl PlatformMask {
    pub const DOS: u8 = 1 << 0;
    pub const AMIGA: u8 = 1 << 1;
    pub const MAC: u8 = 1 << 2;
    pub const WINDOWS: u8 = 1 << 3;
    pub const FM_TOWNS: u8 = 1 << 4;

    pub const ALL: PlatformMask = PlatformMask(
        Self::DOS | Self::AMIGA | Self::MAC | Self::WINDOWS | Self::FM_TOWNS,
    );

    pub const fn only(platform: Platform) -> Self {
        PlatformMask(platform.bit())
    }

    pub fn contains(&self, platform: Platform) -> bool {
        self.0 & platform.bit() != 0
    }

    /// Number of platforms covered; smaller is more specific.
    pub fn width(&self) -> u32 {
        self.0.count_ones()
    }
}
