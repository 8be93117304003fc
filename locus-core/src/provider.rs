//! Identifiers for the external geocoding services.
//!
//! # Examples
//! ```
//! use locus_core::ProviderKind;
//!
//! assert_eq!(ProviderKind::Osm.as_str(), "osm");
//! assert_eq!("nominatim".parse::<ProviderKind>(), Ok(ProviderKind::Osm));
//! ```

/// An external geocoding service, or `Unknown` for hand-built coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum ProviderKind {
    /// ArcGIS World Geocoding Service.
    Esri,
    /// Google Maps Geocoding API.
    Google,
    /// MapQuest Geocoding API.
    MapQuest,
    /// Geoapify Geocoding API.
    Geoapify,
    /// OpenStreetMap Nominatim.
    Osm,
    /// Geocodio.
    Geocodio,
    /// Coordinate not produced by any provider.
    #[default]
    Unknown,
}

impl ProviderKind {
    /// Every real provider, in the order the CLI lists them.
    pub const ALL: [Self; 6] = [
        Self::Esri,
        Self::Google,
        Self::MapQuest,
        Self::Geoapify,
        Self::Osm,
        Self::Geocodio,
    ];

    /// Return the provider as a lowercase `&str`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Esri => "esri",
            Self::Google => "google",
            Self::MapQuest => "mapquest",
            Self::Geoapify => "geoapify",
            Self::Osm => "osm",
            Self::Geocodio => "geocodio",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "esri" | "arcgis" => Ok(Self::Esri),
            "google" => Ok(Self::Google),
            "mapquest" => Ok(Self::MapQuest),
            "geoapify" => Ok(Self::Geoapify),
            "osm" | "openstreetmap" | "nominatim" => Ok(Self::Osm),
            "geocodio" => Ok(Self::Geocodio),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("unknown provider '{s}'")),
        }
    }
}
