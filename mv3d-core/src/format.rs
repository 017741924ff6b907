/// Geometry file formats the viewer can decode
use crate::error::DecodeError;
use crate::node::LoadedGeometry;
use crate::{stl, vrml};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryFormat {
    Stl,
    Vrml,
}

impl GeometryFormat {
    /// Map a lowercased file extension to a format
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "stl" => Some(Self::Stl),
            "wrl" | "vrml" => Some(Self::Vrml),
            _ => None,
        }
    }

    /// Extension the format is registered under by default
    pub fn kind(self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Vrml => "wrl",
        }
    }

    /// STL yields bare triangles; VRML yields an assembled node.
    pub fn decode(self, bytes: &[u8]) -> Result<LoadedGeometry, DecodeError> {
        match self {
            Self::Stl => Ok(LoadedGeometry::Raw(stl::parse_stl(bytes)?)),
            Self::Vrml => Ok(LoadedGeometry::Prebuilt(vrml::parse_vrml(bytes)?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_kind() {
        assert_eq!(GeometryFormat::from_kind("stl"), Some(GeometryFormat::Stl));
        assert_eq!(GeometryFormat::from_kind("wrl"), Some(GeometryFormat::Vrml));
        assert_eq!(GeometryFormat::from_kind("obj"), None);
    }

    #[test]
    fn test_decode_picks_branch() {
        let mut stl = vec![0u8; 84];
        stl[80..84].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(
            GeometryFormat::Stl.decode(&stl),
            Ok(LoadedGeometry::Raw(_))
        ));
        assert!(GeometryFormat::Vrml.decode(&stl).is_err());
    }
}
