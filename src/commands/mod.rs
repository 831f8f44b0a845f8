//! Renders the decoder's results for the command line.
pub mod elf;
pub mod frames;
pub mod report;
pub mod tables;

pub use elf::*;
pub use frames::*;
pub use report::*;

/// A small 64-bit little endian image with one of everything the commands render.
#[cfg(test)]
pub fn test_decoded() -> crate::decoder::Decoded {
    use crate::decoder::{Limits, decode};
    use crate::dwarf::leb128;
    use crate::elf::synth::{ElfBuilder, SynthSection, SynthSegment};
    use crate::elf::{Endianness, FileClass};

    fn with_length(body: Vec<u8>) -> Vec<u8> {
        let mut bytes = (body.len() as u32).to_le_bytes().to_vec();
        bytes.extend(body);
        bytes
    }

    let mut b = ElfBuilder::new(FileClass::SixtyFour, Endianness::Little);
    b.machine = 62;
    b.entry = 0x1000;
    b.sections.push(SynthSection::new(".text", 1, vec![0xc3; 16]));

    let mut cie = vec![0, 0, 0, 0, 1, 0];
    cie.extend(leb128::encode_u64(1));
    cie.extend(leb128::encode_i64(-8));
    cie.extend(leb128::encode_u64(16));
    cie.extend([0x0c, 0x07, 0x08]);
    let mut frame = with_length(cie);
    let mut fde = Vec::new();
    fde.extend((frame.len() as u32 + 4).to_le_bytes());
    fde.extend(0x1000u32.to_le_bytes());
    fde.extend(0x10u32.to_le_bytes());
    fde.extend([0x41, 0x0e, 0x10]);
    frame.extend(with_length(fde));
    frame.extend([0, 0, 0, 0]);
    b.sections.push(SynthSection::new(".eh_frame", 1, frame));

    b.sections.push(SynthSection::new(".dynstr", 3, b"\0libc.so.6\0puts\0".to_vec()));

    let mut symbols = b.symbol(0, 0, 0, 0, 0, 0);
    symbols.extend(b.symbol(11, 0, 0, 0x12, 0, 0));
    let mut dynsym = SynthSection::new(".dynsym", 11, symbols);
    dynsym.link = 3;
    dynsym.entsize = b.symbol_size();
    b.sections.push(dynsym);

    let mut dynamic = b.dynamic(1, 1);
    dynamic.extend(b.dynamic(0, 0));
    b.sections.push(SynthSection::new(".dynamic", 6, dynamic));

    let mut hdr = vec![1, 0x1b, 0x03, 0x3b];
    hdr.extend((-0x40i32).to_le_bytes());
    hdr.extend(1u32.to_le_bytes());
    hdr.extend((-0x100i32).to_le_bytes());
    hdr.extend((-0x30i32).to_le_bytes());
    b.sections.push(SynthSection::new(".eh_frame_hdr", 1, hdr));

    b.segments.push(SynthSegment {
        ptype: 1,
        flags: 5,
        offset: 0,
        filesz: b.data_offset(1),
        memsz: b.data_offset(1),
    });
    let bytes = b.build();
    decode(&bytes, &Limits::default()).unwrap()
}
