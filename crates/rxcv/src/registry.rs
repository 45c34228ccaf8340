//! Process-wide registries, one per handle kind.

use lazy_static::lazy_static;
use rxcv_ffi_common::HandleRegistry;

use crate::bytes::ByteBuffer;
use crate::contours::{Contour, Contours};
use crate::mat::Mat;

const MAT_KIND: u8 = 1;
const BYTES_KIND: u8 = 2;
const CONTOURS_KIND: u8 = 3;
const CONTOUR_KIND: u8 = 4;

lazy_static! {
    pub static ref MATS: HandleRegistry<Mat> = HandleRegistry::new(MAT_KIND, "matrix");
    pub static ref BYTES: HandleRegistry<ByteBuffer> =
        HandleRegistry::new(BYTES_KIND, "byte buffer");
    pub static ref CONTOURS: HandleRegistry<Contours> =
        HandleRegistry::new(CONTOURS_KIND, "contour collection");
    pub static ref CONTOUR: HandleRegistry<Contour> =
        HandleRegistry::new(CONTOUR_KIND, "contour");
}
