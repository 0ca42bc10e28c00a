//! Dial and surface positions that together identify a render target.

use std::fmt;
use std::str::FromStr;

use super::error::BindingError;

/// Mode-selector dial position on a radio panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DialPosition {
    UpperCOM1,
    UpperCOM2,
    UpperNAV1,
    UpperNAV2,
    UpperADF,
    UpperDME,
    UpperXPDR,
    LowerCOM1,
    LowerCOM2,
    LowerNAV1,
    LowerNAV2,
    LowerADF,
    LowerDME,
    LowerXPDR,
}

impl DialPosition {
    /// All dial positions.
    pub const ALL: [DialPosition; 14] = [
        DialPosition::UpperCOM1,
        DialPosition::UpperCOM2,
        DialPosition::UpperNAV1,
        DialPosition::UpperNAV2,
        DialPosition::UpperADF,
        DialPosition::UpperDME,
        DialPosition::UpperXPDR,
        DialPosition::LowerCOM1,
        DialPosition::LowerCOM2,
        DialPosition::LowerNAV1,
        DialPosition::LowerNAV2,
        DialPosition::LowerADF,
        DialPosition::LowerDME,
        DialPosition::LowerXPDR,
    ];

    /// Token used in binding definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            DialPosition::UpperCOM1 => "UpperCOM1",
            DialPosition::UpperCOM2 => "UpperCOM2",
            DialPosition::UpperNAV1 => "UpperNAV1",
            DialPosition::UpperNAV2 => "UpperNAV2",
            DialPosition::UpperADF => "UpperADF",
            DialPosition::UpperDME => "UpperDME",
            DialPosition::UpperXPDR => "UpperXPDR",
            DialPosition::LowerCOM1 => "LowerCOM1",
            DialPosition::LowerCOM2 => "LowerCOM2",
            DialPosition::LowerNAV1 => "LowerNAV1",
            DialPosition::LowerNAV2 => "LowerNAV2",
            DialPosition::LowerADF => "LowerADF",
            DialPosition::LowerDME => "LowerDME",
            DialPosition::LowerXPDR => "LowerXPDR",
        }
    }
}

impl fmt::Display for DialPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DialPosition {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|dial| dial.as_str() == s)
            .ok_or_else(|| BindingError::UnknownDial(s.to_string()))
    }
}

/// Display position on a radio panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SurfacePosition {
    UpperActive,
    UpperStandby,
    LowerActive,
    LowerStandby,
}

impl SurfacePosition {
    /// All surface positions.
    pub const ALL: [SurfacePosition; 4] = [
        SurfacePosition::UpperActive,
        SurfacePosition::UpperStandby,
        SurfacePosition::LowerActive,
        SurfacePosition::LowerStandby,
    ];

    /// Token used in binding definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfacePosition::UpperActive => "UpperActive",
            SurfacePosition::UpperStandby => "UpperStandby",
            SurfacePosition::LowerActive => "LowerActive",
            SurfacePosition::LowerStandby => "LowerStandby",
        }
    }
}

impl fmt::Display for SurfacePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SurfacePosition {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|position| position.as_str() == s)
            .ok_or_else(|| BindingError::UnknownSurfacePosition(s.to_string()))
    }
}

/// Key the renderer uses to locate a binding's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub dial: DialPosition,
    pub position: SurfacePosition,
}

impl TargetKey {
    pub fn new(dial: DialPosition, position: SurfacePosition) -> Self {
        Self { dial, position }
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dial, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_tokens_parse_back() {
        for dial in DialPosition::ALL {
            assert_eq!(dial.as_str().parse::<DialPosition>().unwrap(), dial);
        }
    }

    #[test]
    fn test_surface_tokens_parse_back() {
        for position in SurfacePosition::ALL {
            assert_eq!(position.as_str().parse::<SurfacePosition>().unwrap(), position);
        }
    }

    #[test]
    fn test_unknown_tokens_are_named_errors() {
        assert_eq!(
            "COM1".parse::<DialPosition>().unwrap_err(),
            BindingError::UnknownDial("COM1".to_string())
        );
        assert_eq!(
            "upperactive".parse::<SurfacePosition>().unwrap_err(),
            BindingError::UnknownSurfacePosition("upperactive".to_string())
        );
    }

    #[test]
    fn test_target_key_display() {
        let key = TargetKey::new(DialPosition::LowerNAV2, SurfacePosition::LowerStandby);
        assert_eq!(key.to_string(), "LowerNAV2/LowerStandby");
    }
}
