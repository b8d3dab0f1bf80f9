// Raster Asset Header Check
//
// Boundary with the asset-validation collaborator. The core never parses
// image pixel data; it is handed a fixed-size binary header and performs
// structural checks only. The validator maps a failed result to
// asset-format diagnostics.

use crate::limits;

/// Fixed header layout: 4-byte signature, then u16 little-endian width and
/// height, then mapper-private bytes the core does not interpret.
pub const HEADER_SIZE: usize = 16;
pub const SIGNATURE: &[u8; 4] = b"VC8I";

/// Structural result for a raster asset, as consumed from the collaborator.
#[derive(Debug, Clone, Default)]
pub struct AssetCheck {
    pub valid: bool,
    pub errors: Vec<String>,
    pub width: u32,
    pub height: u32,
}

impl AssetCheck {
    /// A result the authoring layer can use for sprites without a backing
    /// file (procedural tiles).
    pub fn ok(width: u32, height: u32) -> AssetCheck {
        AssetCheck {
            valid: true,
            errors: Vec::new(),
            width,
            height,
        }
    }
}

/// Check the fixed-size header of a raster asset. Never reads past
/// HEADER_SIZE; all failures are reported together.
pub fn check_raster_header(header: &[u8]) -> AssetCheck {
    let mut errors = Vec::new();

    if header.len() < HEADER_SIZE {
        errors.push(format!(
            "header is {} bytes, expected at least {}",
            header.len(),
            HEADER_SIZE
        ));
        return AssetCheck {
            valid: false,
            errors,
            width: 0,
            height: 0,
        };
    }

    if &header[0..4] != SIGNATURE {
        errors.push(format!(
            "bad signature {:02x}{:02x}{:02x}{:02x}, expected 'VC8I'",
            header[0], header[1], header[2], header[3]
        ));
    }

    let width = u16::from_le_bytes([header[4], header[5]]) as u32;
    let height = u16::from_le_bytes([header[6], header[7]]) as u32;

    for (label, dim) in [("width", width), ("height", height)] {
        if dim == 0 || dim % limits::TILE_SIZE != 0 {
            errors.push(format!(
                "{} {} is not a positive multiple of the {}-pixel tile size",
                label,
                dim,
                limits::TILE_SIZE
            ));
        } else if dim > limits::MAX_ASSET_DIM {
            errors.push(format!(
                "{} {} exceeds the maximum of {}",
                label,
                dim,
                limits::MAX_ASSET_DIM
            ));
        }
    }

    AssetCheck {
        valid: errors.is_empty(),
        errors,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(sig: &[u8; 4], width: u16, height: u16) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_SIZE);
        bytes.extend_from_slice(sig);
        bytes.extend_from_slice(&width.to_le_bytes());
        bytes.extend_from_slice(&height.to_le_bytes());
        bytes.resize(HEADER_SIZE, 0);
        bytes
    }

    #[test]
    fn accepts_well_formed_header() {
        let check = check_raster_header(&header(SIGNATURE, 16, 24));
        assert!(check.valid, "{:?}", check.errors);
        assert_eq!(check.width, 16);
        assert_eq!(check.height, 24);
    }

    #[test]
    fn rejects_bad_signature() {
        let check = check_raster_header(&header(b"PNG!", 16, 16));
        assert!(!check.valid);
        assert!(check.errors[0].contains("signature"));
    }

    #[test]
    fn rejects_non_tile_multiple_dimensions() {
        let check = check_raster_header(&header(SIGNATURE, 12, 16));
        assert!(!check.valid);
        assert!(check.errors[0].contains("12"));
    }

    #[test]
    fn rejects_zero_and_oversize_dimensions() {
        let check = check_raster_header(&header(SIGNATURE, 0, 512));
        assert!(!check.valid);
        assert_eq!(check.errors.len(), 2);
        assert!(check.errors[1].contains("512"));
    }

    #[test]
    fn rejects_truncated_header() {
        let check = check_raster_header(&[0u8; 7]);
        assert!(!check.valid);
        assert!(check.errors[0].contains("7 bytes"));
    }
}
