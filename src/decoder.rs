//! Runs the whole pass over one buffer: header, program headers, section headers (and
//! the sections they describe), then the layout check.
use crate::dwarf::{EhFrame, EhFrameHdr};
use crate::elf::{
    DynamicEntry, ElfHeader, ProgramHeader, Reader, SectionHeader, SectionIndex, StringEntry, SymbolTable,
    identify, walk_sections, walk_segments,
};
use crate::error::Result;
use crate::layout::{LayoutReport, analyze};
use crate::output::{Diagnostic, Field, Output, Severity};
use tracing::{debug, info_span};

/// Bounds on how much work a file can make us do.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    /// Most entries read from any one table (program headers, section headers, symbols,
    /// CFI entries, etc).
    pub max_entries: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits { max_entries: 1 << 20 }
    }
}

pub struct Decoded {
    pub header: ElfHeader,
    pub fields: Vec<Field>,
    pub diagnostics: Vec<Diagnostic>,
    pub segments: Vec<ProgramHeader>,
    pub sections: Vec<SectionHeader>,
    pub symbols: Vec<SymbolTable>,
    pub dynamic: Vec<DynamicEntry>,
    pub strings: Vec<(SectionIndex, Vec<StringEntry>)>,
    pub eh_frames: Vec<EhFrame>,
    pub eh_frame_hdrs: Vec<EhFrameHdr>,
    pub layout: LayoutReport,

    /// End of the furthest extent, clipped to the buffer.
    pub consumed: u64,
}

impl Decoded {
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics.iter().filter(|d| d.severity == severity).count()
    }

    pub fn section(&self, index: SectionIndex) -> Option<&SectionHeader> {
        self.sections.get(index.0 as usize)
    }
}

/// Decodes an ELF file. Only a buffer that isn't ELF at all is an error: problems after
/// the header show up as diagnostics.
pub fn decode(bytes: &[u8], limits: &Limits) -> Result<Decoded> {
    let (class, endian) = identify(bytes)?;
    let _span = info_span!("decode", len = bytes.len(), %class, %endian).entered();

    let reader = Reader::new(bytes, class, endian);
    let mut out = Output::new();
    let header = ElfHeader::new(&reader, &mut out)?;
    let segments = walk_segments(&reader, &header, limits.max_entries, &mut out);
    let sections = walk_sections(&reader, &header, limits.max_entries, &mut out);
    let extents = std::mem::take(&mut out.extents);
    let layout = analyze(&extents, reader.len(), &mut out);
    out.extents = extents;

    let consumed = out
        .extents
        .iter()
        .map(|e| e.end())
        .max()
        .unwrap_or(0)
        .min(reader.len());
    debug!(
        fields = out.fields.len(),
        diagnostics = out.diagnostics.len(),
        consumed,
        "decoded"
    );

    Ok(Decoded {
        header,
        fields: out.fields,
        diagnostics: out.diagnostics,
        segments,
        sections: sections.headers,
        symbols: sections.symbols,
        dynamic: sections.dynamic,
        strings: sections.strings,
        eh_frames: sections.eh_frames,
        eh_frame_hdrs: sections.eh_frame_hdrs,
        layout,
        consumed,
    })
}
