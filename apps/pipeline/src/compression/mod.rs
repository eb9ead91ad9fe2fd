// Both directions of the profile mapping: child tables -> document
// (compress) and document -> child tables (decompress).

pub mod compress;
pub mod decompress;

pub use compress::{build_profile, run_compression};
pub use decompress::{reconcile_applicant, run_decompression};
