//! DWARF support. We only need enough to walk the call frame information that
//! .eh_frame and .eh_frame_hdr contain (see the "Exception Frames" chapter of the LSB and
//! section 6.4 of https://dwarfstd.org/doc/DWARF5.pdf). Debug info proper is not handled.
pub mod eh_frame;
pub mod eh_frame_hdr;
pub mod encoding;
pub mod leb128;

pub use eh_frame::{CieGroup, EhFrame};
pub use eh_frame_hdr::EhFrameHdr;
