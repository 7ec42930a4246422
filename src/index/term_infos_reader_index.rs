//! In-memory form of the sampled terms index (`.tii`).
//!
//! Every kept sample is serialized into one paged byte arena; a bit-packed
//! table maps sample ordinals to arena offsets. Binary search decodes only
//! the field and text of a probed sample.

use crate::error::{Error, Result};
use crate::index::segment_term_enum::SegmentTermEnum;
use crate::index::types::{FieldKey, TermInfo, TermRef};
use crate::utils::{PagedBytes, PagedBytesReader, PagedBytesWriter, compare_utf8_as_utf16, estimate_page_bits};
use std::cmp::Ordering;
use tantivy_bitpacker::{BitPacker, BitUnpacker, compute_num_bits};

pub struct TermInfosReaderIndex {
    total_index_interval: i64,
    skip_interval: u32,
    /// Field of each run of samples, indexed by the ordinal stored per sample
    fields: Vec<FieldKey>,
    data: PagedBytes,
    offsets: Vec<u8>,
    offset_unpacker: BitUnpacker,
    len: usize,
    ram_bytes_used: usize,
}

impl TermInfosReaderIndex {
    /// Load every `index_divisor`-th entry of the index cursor.
    ///
    /// `tii_file_length` sizes the arena pages; `total_index_interval` is the
    /// dictionary distance between two kept samples.
    pub fn build(
        index_enum: &mut SegmentTermEnum,
        index_divisor: u32,
        tii_file_length: u64,
        total_index_interval: i64,
    ) -> Result<Self> {
        let index_divisor = index_divisor.max(1);
        let skip_interval = index_enum.skip_interval();
        let expected = if index_enum.size() > 0 {
            1 + ((index_enum.size() - 1) / index_divisor as i64) as usize
        } else {
            0
        };

        let mut writer = PagedBytesWriter::new(estimate_page_bits(tii_file_length));
        let mut fields: Vec<FieldKey> = Vec::new();
        // Every entry takes several bytes, so a damaged size cannot exceed the file
        let mut offsets: Vec<u64> = Vec::with_capacity(expected.min(tii_file_length as usize));

        while index_enum.next()? {
            let Some(term) = index_enum.term() else {
                break;
            };
            if fields.last() != Some(&term.field) {
                fields.push(term.field);
            }
            offsets.push(writer.position());

            writer.write_vint((fields.len() - 1) as i32);
            writer.write_vint(term.bytes.len() as i32);
            writer.write_bytes(term.bytes);

            let info = index_enum.term_info();
            writer.write_vint(info.doc_freq as i32);
            if info.doc_freq >= skip_interval {
                writer.write_vint(info.skip_offset as i32);
            }
            writer.write_vlong(info.freq_pointer as i64);
            writer.write_vlong(info.prox_pointer as i64);
            writer.write_vlong(index_enum.index_pointer() as i64);

            for _ in 1..index_divisor {
                if !index_enum.next()? {
                    break;
                }
            }
        }

        let data = writer.freeze();
        let num_bits = compute_num_bits(offsets.last().copied().unwrap_or(0));
        let mut packed = Vec::with_capacity((offsets.len() * num_bits as usize).div_ceil(8));
        let mut packer = BitPacker::new();
        for &offset in &offsets {
            packer
                .write(offset, num_bits, &mut packed)
                .map_err(|e| Error::io("terms index offsets", e))?;
        }
        packer
            .close(&mut packed)
            .map_err(|e| Error::io("terms index offsets", e))?;

        let ram_bytes_used = data.ram_bytes_used()
            + packed.capacity()
            + fields.capacity() * std::mem::size_of::<FieldKey>()
            + std::mem::size_of::<Self>();

        Ok(Self {
            total_index_interval,
            skip_interval,
            fields,
            data,
            offsets: packed,
            offset_unpacker: BitUnpacker::new(num_bits),
            len: offsets.len(),
            ram_bytes_used,
        })
    }

    /// Number of samples held.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn ram_bytes_used(&self) -> usize {
        self.ram_bytes_used
    }

    fn reader(&self, index: usize) -> Result<PagedBytesReader<'_>> {
        if index >= self.len {
            return Err(Error::corrupt(
                "terms index",
                format!("sample {index} out of {}", self.len),
            ));
        }
        let offset = self.offset_unpacker.get(index as u32, &self.offsets);
        Ok(self.data.reader_at(offset))
    }

    fn read_field(&self, reader: &mut PagedBytesReader<'_>) -> Result<FieldKey> {
        let id = reader.read_vint()?;
        usize::try_from(id)
            .ok()
            .and_then(|id| self.fields.get(id).copied())
            .ok_or_else(|| Error::corrupt("terms index", format!("bad field ordinal {id}")))
    }

    fn read_text(&self, reader: &mut PagedBytesReader<'_>, out: &mut Vec<u8>) -> Result<()> {
        let len = reader.read_vint()?;
        if len < 0 {
            return Err(Error::corrupt("terms index", format!("negative term length {len}")));
        }
        reader.read_bytes_into(len as usize, out)
    }

    fn compare_with(&self, term: TermRef<'_>, index: usize, scratch: &mut Vec<u8>) -> Result<Ordering> {
        let mut reader = self.reader(index)?;
        let field = self.read_field(&mut reader)?;
        match term.field.cmp(&field) {
            Ordering::Equal => {
                self.read_text(&mut reader, scratch)?;
                Ok(compare_utf8_as_utf16(term.bytes, scratch))
            }
            other => Ok(other),
        }
    }

    /// Order of `term` relative to the sample at `index`.
    pub fn compare_to(&self, term: TermRef<'_>, index: usize) -> Result<Ordering> {
        self.compare_with(term, index, &mut Vec::new())
    }

    /// Ordinal of the last sample at or before `term`.
    pub fn index_offset(&self, term: TermRef<'_>) -> Result<usize> {
        let mut scratch = Vec::new();
        let mut lo = 0i64;
        let mut hi = self.len as i64 - 1;
        while hi >= lo {
            let mid = (lo + hi) >> 1;
            match self.compare_with(term, mid as usize, &mut scratch)? {
                Ordering::Less => hi = mid - 1,
                Ordering::Greater => lo = mid + 1,
                Ordering::Equal => return Ok(mid as usize),
            }
        }
        // The "" pseudo-term heads every index, so this only clamps for
        // damaged input
        Ok(hi.max(0) as usize)
    }

    /// Position `enumerator` on the sample at `index`.
    pub fn seek_enum(&self, enumerator: &mut SegmentTermEnum, index: usize) -> Result<()> {
        let mut reader = self.reader(index)?;
        let field = self.read_field(&mut reader)?;
        let mut text = Vec::new();
        self.read_text(&mut reader, &mut text)?;

        let doc_freq = reader.read_vint()? as u32;
        let skip_offset = if doc_freq >= self.skip_interval {
            reader.read_vint()? as u32
        } else {
            0
        };
        let info = TermInfo {
            doc_freq,
            freq_pointer: reader.read_vlong()? as u64,
            prox_pointer: reader.read_vlong()? as u64,
            skip_offset,
        };
        let pointer = reader.read_vlong()? as u64;

        let position = index as i64 * self.total_index_interval - 1;
        enumerator.seek(pointer, position, TermRef::new(field, &text), info)
    }
}
