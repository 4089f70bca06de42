//! QR reference construction for uploaded media.
//!
//! Each uploaded medium gets a QR reference pairing its original file name
//! with the public URL the code encodes. Rasterizing the code into an image
//! is an external concern at the rendering boundary; this stage owns payload
//! construction only.

use crate::files::StoredImage;
use crate::task::QrCodeRef;

/// Build one QR reference per stored medium.
pub fn build_qr_refs(images: &[StoredImage]) -> Vec<QrCodeRef> {
    images
        .iter()
        .map(|image| QrCodeRef {
            file_name: image.file_name.clone(),
            media_url: image.public_url.clone(),
        })
        .collect()
}
