// SPDX-License-Identifier: GPL-3.0-only

//! Makeup parameter store
//!
//! Holds the per-region color/intensity configuration and the makeup type
//! that decides which regions are active. All mutation goes through the
//! setters on [`ParameterStore`], which enforce the constraints of a bound
//! product and report whether anything actually changed so the session can
//! decide whether a new render generation is due.

use super::product::BoundProduct;
use crate::constants::{defaults, intensity};
use crate::errors::ParameterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// A facial zone the render service can apply color to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Lips,
    Cheeks,
}

impl Region {
    pub const ALL: [Region; 2] = [Region::Lips, Region::Cheeks];

    /// The other region
    pub fn partner(&self) -> Region {
        match self {
            Region::Lips => Region::Cheeks,
            Region::Cheeks => Region::Lips,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Lips => "lips",
            Region::Cheeks => "cheeks",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lips" => Ok(Region::Lips),
            "cheeks" => Ok(Region::Cheeks),
            other => Err(ParameterError::UnknownRegion(other.to_string())),
        }
    }
}

/// 24-bit color, written as `#RRGGBB`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB`, `RRGGBB` or the short `#RGB` form
    pub fn parse_hex(value: &str) -> Result<Self, ParameterError> {
        let invalid = || ParameterError::InvalidColor(value.to_string());
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);

        if !hex.is_ascii() {
            return Err(invalid());
        }

        let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Self::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                // #RGB expands each nibble: #A0F -> #AA00FF
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rgb({})", self.to_hex())
    }
}

impl FromStr for Rgb {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl TryFrom<String> for Rgb {
    type Error = ParameterError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgb> for String {
    fn from(color: Rgb) -> Self {
        color.to_hex()
    }
}

/// Application strength of a region, 0..=100
///
/// Out-of-range inputs are clamped to the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub const ZERO: Intensity = Intensity(intensity::MIN);
    pub const MAX: Intensity = Intensity(intensity::MAX);

    pub fn new(value: u8) -> Self {
        Self(value.min(intensity::MAX))
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for Intensity {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(value: Intensity) -> Self {
        value.0
    }
}

/// User-facing makeup selection; determines the active region set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MakeupType {
    #[default]
    Lips,
    Cheeks,
    Both,
}

impl MakeupType {
    pub const ALL: [MakeupType; 3] = [MakeupType::Lips, MakeupType::Cheeks, MakeupType::Both];

    /// The makeup type that activates only `region`
    pub fn only(region: Region) -> Self {
        match region {
            Region::Lips => MakeupType::Lips,
            Region::Cheeks => MakeupType::Cheeks,
        }
    }

    /// Whether `region` is in the active set
    pub fn includes(&self, region: Region) -> bool {
        match self {
            MakeupType::Lips => region == Region::Lips,
            MakeupType::Cheeks => region == Region::Cheeks,
            MakeupType::Both => true,
        }
    }

    /// Active regions in a stable order
    pub fn active_regions(&self) -> Vec<Region> {
        Region::ALL
            .into_iter()
            .filter(|region| self.includes(*region))
            .collect()
    }

    /// Wire name understood by the render service
    pub fn as_str(&self) -> &'static str {
        match self {
            MakeupType::Lips => "lips",
            MakeupType::Cheeks => "cheeks",
            MakeupType::Both => "both",
        }
    }
}

impl fmt::Display for MakeupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MakeupType {
    type Err = ParameterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lips" => Ok(MakeupType::Lips),
            "cheeks" => Ok(MakeupType::Cheeks),
            "both" => Ok(MakeupType::Both),
            other => Err(ParameterError::UnknownMakeupType(other.to_string())),
        }
    }
}

/// Color and intensity of one region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionParams {
    pub color: Rgb,
    pub intensity: Intensity,
}

impl RegionParams {
    pub fn new(color: Rgb, intensity: u8) -> Self {
        Self {
            color,
            intensity: Intensity::new(intensity),
        }
    }
}

/// Both region entries; neither is ever absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionConfig {
    pub lips: RegionParams,
    pub cheeks: RegionParams,
}

impl RegionConfig {
    pub fn get(&self, region: Region) -> &RegionParams {
        match region {
            Region::Lips => &self.lips,
            Region::Cheeks => &self.cheeks,
        }
    }

    fn get_mut(&mut self, region: Region) -> &mut RegionParams {
        match region {
            Region::Lips => &mut self.lips,
            Region::Cheeks => &mut self.cheeks,
        }
    }
}

/// Defaults restored on session creation and reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterDefaults {
    pub makeup_type: MakeupType,
    /// Makeup type an explicit reset switches to
    pub reset_makeup_type: MakeupType,
    pub lips: RegionParams,
    pub cheeks: RegionParams,
}

impl ParameterDefaults {
    pub fn regions(&self) -> RegionConfig {
        RegionConfig {
            lips: self.lips,
            cheeks: self.cheeks,
        }
    }

    /// Intensity a governed region starts at; never zero
    fn governed_intensity(&self, region: Region) -> Intensity {
        let configured = self.regions().get(region).intensity;
        if !configured.is_zero() {
            return configured;
        }
        match region {
            Region::Lips => Intensity::new(defaults::LIPS_INTENSITY),
            Region::Cheeks => Intensity::new(defaults::CHEEKS_INTENSITY),
        }
    }
}

impl Default for ParameterDefaults {
    fn default() -> Self {
        Self {
            makeup_type: MakeupType::default(),
            reset_makeup_type: MakeupType::Both,
            lips: RegionParams::new(
                Rgb::parse_hex(defaults::LIPS_COLOR).unwrap_or(Rgb::new(0xDC, 0x14, 0x3C)),
                defaults::LIPS_INTENSITY,
            ),
            cheeks: RegionParams::new(
                Rgb::parse_hex(defaults::CHEEKS_COLOR).unwrap_or(Rgb::new(0xFF, 0x69, 0xB4)),
                defaults::CHEEKS_INTENSITY,
            ),
        }
    }
}

/// Why a mutation was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The region's color is fixed by the bound product
    LockedColor(Region),
    /// The makeup type is fixed while a product is bound
    MakeupTypeFixed,
}

/// Result of a setter call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// State changed; a new render generation is due
    Applied,
    /// Accepted, but the value was already in effect
    Unchanged,
    /// Refused; state untouched
    Rejected(RejectReason),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }
}

/// Current makeup configuration of a session
#[derive(Debug, Clone)]
pub struct ParameterStore {
    defaults: ParameterDefaults,
    regions: RegionConfig,
    makeup_type: MakeupType,
    bound: Option<BoundProduct>,
}

impl ParameterStore {
    pub fn new(defaults: ParameterDefaults) -> Self {
        Self {
            defaults,
            regions: defaults.regions(),
            makeup_type: defaults.makeup_type,
            bound: None,
        }
    }

    pub fn regions(&self) -> &RegionConfig {
        &self.regions
    }

    pub fn region(&self, region: Region) -> &RegionParams {
        self.regions.get(region)
    }

    pub fn makeup_type(&self) -> MakeupType {
        self.makeup_type
    }

    pub fn active_regions(&self) -> Vec<Region> {
        self.makeup_type.active_regions()
    }

    pub fn bound_product(&self) -> Option<&BoundProduct> {
        self.bound.as_ref()
    }

    /// Whether `region`'s color is fixed by the bound product
    pub fn is_color_locked(&self, region: Region) -> bool {
        self.bound
            .as_ref()
            .is_some_and(|bound| bound.locked_region == region)
    }

    /// Bind a catalog product and apply its constraints
    ///
    /// The governed region takes the product color and a nonzero intensity,
    /// the partner region is silenced (intensity 0) and the active set is
    /// narrowed to the governed region. These constraints win over any
    /// configured defaults.
    pub fn bind_product(&mut self, product: BoundProduct) -> Mutation {
        let before = (self.regions, self.makeup_type);
        self.bound = Some(product);
        self.apply_binding();

        if before == (self.regions, self.makeup_type) {
            Mutation::Unchanged
        } else {
            Mutation::Applied
        }
    }

    pub fn set_makeup_type(&mut self, makeup_type: MakeupType) -> Mutation {
        if self.bound.is_some() {
            warn!(requested = %makeup_type, "Makeup type is fixed by the bound product");
            return Mutation::Rejected(RejectReason::MakeupTypeFixed);
        }
        if self.makeup_type == makeup_type {
            return Mutation::Unchanged;
        }

        debug!(from = %self.makeup_type, to = %makeup_type, "Makeup type changed");
        self.makeup_type = makeup_type;
        Mutation::Applied
    }

    pub fn set_region_color(&mut self, region: Region, color: Rgb) -> Mutation {
        if self.is_color_locked(region) {
            warn!(%region, requested = %color, "Color is locked by the bound product");
            return Mutation::Rejected(RejectReason::LockedColor(region));
        }

        let params = self.regions.get_mut(region);
        if params.color == color {
            return Mutation::Unchanged;
        }

        debug!(%region, %color, "Region color changed");
        params.color = color;
        Mutation::Applied
    }

    pub fn set_region_intensity(&mut self, region: Region, value: u8) -> Mutation {
        let intensity = Intensity::new(value);
        if intensity.get() != value {
            debug!(%region, value, clamped = intensity.get(), "Intensity clamped");
        }

        let params = self.regions.get_mut(region);
        if params.intensity == intensity {
            return Mutation::Unchanged;
        }

        debug!(%region, intensity = intensity.get(), "Region intensity changed");
        params.intensity = intensity;
        Mutation::Applied
    }

    /// Restore defaults, then re-apply any product constraints
    pub fn reset(&mut self) {
        self.regions = self.defaults.regions();
        self.makeup_type = self.defaults.reset_makeup_type;
        self.apply_binding();
    }

    fn apply_binding(&mut self) {
        let Some(bound) = self.bound.as_ref() else {
            return;
        };

        let governed = bound.locked_region;
        let partner = governed.partner();

        self.makeup_type = MakeupType::only(governed);

        let governed_params = self.regions.get_mut(governed);
        governed_params.color = bound.locked_color;
        governed_params.intensity = self.defaults.governed_intensity(governed);

        let partner_params = self.regions.get_mut(partner);
        partner_params.color = self.defaults.regions().get(partner).color;
        partner_params.intensity = Intensity::ZERO;
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new(ParameterDefaults::default())
    }
}
