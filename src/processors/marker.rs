use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

use crate::utils::PathExt;

/// Payloads of the form `PATIENT_ID:<rest>` carry the subject id in `<rest>`;
/// any other payload is taken verbatim.
pub const SUBJECT_PAYLOAD_PREFIX: &'static str = "PATIENT_ID:";

/// Seam around the visual-code recognition capability. Returns the first
/// decoded payload when an image carries several codes.
pub trait MarkerDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Option<String>>;
}

/// QR decoder over a grayscale decode of the image.
pub struct QrDecoder;

impl MarkerDecoder for QrDecoder {
    fn decode(&self, path: &Path) -> Result<Option<String>> {
        let luma = image::open(path)
            .with_context(|| format!("failed to decode image {:?}", path))?
            .to_luma8();

        let (width, height) = luma.dimensions();
        let mut prepared =
            rqrr::PreparedImage::prepare_from_greyscale(width as usize, height as usize, |x, y| {
                luma.get_pixel(x as u32, y as u32).0[0]
            });

        let grids = prepared.detect_grids();
        let Some(grid) = grids.first() else {
            return Ok(None);
        };

        match grid.decode() {
            Ok((_, payload)) => Ok(Some(payload)),
            Err(err) => {
                warn!("Undecodable code in {}: {}", path.name_lossy(), err);
                Ok(None)
            }
        }
    }
}

/// Run detection on one image and normalize the payload into a subject id.
/// An unreadable image is logged and yields no detection.
pub fn detect(decoder: &dyn MarkerDecoder, path: &Path) -> Option<String> {
    match decoder.decode(path) {
        Ok(Some(payload)) => {
            info!("Code detected in {}: {}", path.name_lossy(), payload);
            parse_subject_id(&payload)
        }
        Ok(None) => None,
        Err(err) => {
            warn!("Could not read image {}: {err:#}", path.name_lossy());
            None
        }
    }
}

fn parse_subject_id(payload: &str) -> Option<String> {
    let subject = payload
        .strip_prefix(SUBJECT_PAYLOAD_PREFIX)
        .unwrap_or(payload)
        .trim();

    (!subject.is_empty()).then(|| subject.to_string())
}
