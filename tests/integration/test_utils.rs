//! Test utilities for integration tests.
//!
//! Builds synthetic `.flim` files: a TIFF whose first directory carries the
//! session header text and whose later directories each hold one frame of
//! uncompressed 16-bit photon counts.

use std::path::{Path, PathBuf};

// =============================================================================
// Header and Frame Text
// =============================================================================

/// Shape of a synthetic acquisition.
#[derive(Debug, Clone, Copy)]
pub struct Acquisition {
    pub z_stack: bool,
    pub slices: usize,
    pub channels: usize,
    pub rows: usize,
    pub cols: usize,
    pub bins: usize,
    pub resolution_ps: f64,
}

impl Acquisition {
    pub fn new(channels: usize, rows: usize, cols: usize, bins: usize) -> Self {
        Self {
            z_stack: false,
            slices: 1,
            channels,
            rows,
            cols,
            bins,
            resolution_ps: 250.0,
        }
    }

    pub fn with_slices(mut self, slices: usize) -> Self {
        self.z_stack = true;
        self.slices = slices;
        self
    }

    pub fn frame_len(&self) -> usize {
        self.slices * self.channels * self.rows * self.cols * self.bins
    }

    /// Header description text in acquisition-software layout.
    pub fn header_text(&self) -> String {
        let resolution = vec![format!("{}", self.resolution_ps); self.channels].join(", ");
        [
            "FLIMimage parameters".to_string(),
            "State.Files.baseName = 'synthetic';".to_string(),
            format!("State.Acq.ZStack = {};", if self.z_stack { "True" } else { "False" }),
            format!("State.Acq.nSlices = {};", self.slices),
            format!("State.Acq.nChannels = {};", self.channels),
            format!("State.Acq.linesPerFrame = {};", self.rows),
            format!("State.Acq.pixelsPerLine = {};", self.cols),
            "State.Acq.zoom = 12.5;".to_string(),
            format!("State.Spc.spcData.n_dataPoint = {};", self.bins),
            format!("State.Spc.spcData.resolution = [{}];", resolution),
            "State.Spc.spcData.acq_mode = 'histogram';".to_string(),
            "State.Uncaging.pulseWidth = 6;".to_string(),
            "State.Motor.motorPosition = [100.5, -20.25, 3000];".to_string(),
            String::new(),
        ]
        .join("\r\n")
    }
}

/// Frame description carrying an acquisition timestamp.
pub fn frame_description(frame: usize, timestamp: &str) -> String {
    format!("Acquired_Time = {};\r\nFrame = {};\r\n", timestamp, frame)
}

/// Deterministic photon counts for frame `seed`.
pub fn pattern_frame(len: usize, seed: u16) -> Vec<u16> {
    (0..len)
        .map(|i| ((i as u16).wrapping_mul(31).wrapping_add(seed * 7)) % 97)
        .collect()
}

// =============================================================================
// TIFF File Builder
// =============================================================================

#[derive(Clone, Copy)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

struct FrameSpec {
    description: String,
    samples: Vec<u16>,
    strips: usize,
}

/// Builder for synthetic `.flim` files.
pub struct FlimFileBuilder {
    byte_order: ByteOrderType,
    is_bigtiff: bool,
    header: String,
    frames: Vec<FrameSpec>,
}

impl FlimFileBuilder {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            is_bigtiff: false,
            header: header.into(),
            frames: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    pub fn with_bigtiff(mut self, is_bigtiff: bool) -> Self {
        self.is_bigtiff = is_bigtiff;
        self
    }

    pub fn add_frame(self, description: impl Into<String>, samples: Vec<u16>) -> Self {
        self.add_frame_in_strips(description, samples, 1)
    }

    /// Add a frame whose samples are split across `strips` strips.
    pub fn add_frame_in_strips(
        mut self,
        description: impl Into<String>,
        samples: Vec<u16>,
        strips: usize,
    ) -> Self {
        self.frames.push(FrameSpec {
            description: description.into(),
            samples,
            strips: strips.max(1),
        });
        self
    }

    /// Build the file bytes.
    ///
    /// Each directory is followed by its strip data and then by any tag
    /// values too large to store inline.
    pub fn build(self) -> Vec<u8> {
        let mut data = Vec::new();
        match self.byte_order {
            ByteOrderType::LittleEndian => data.extend(b"II"),
            ByteOrderType::BigEndian => data.extend(b"MM"),
        }
        if self.is_bigtiff {
            self.write_value(&mut data, 43, 2);
            self.write_value(&mut data, 8, 2);
            self.write_value(&mut data, 0, 2);
        } else {
            self.write_value(&mut data, 42, 2);
        }

        // Position of the pointer to the next directory, patched as we go.
        let mut next_pointer_at = data.len();
        self.write_value(&mut data, 0, self.offset_size());

        let header_entries = vec![
            self.long(256, 1),
            self.long(257, 1),
            self.ascii(270, &self.header),
        ];
        next_pointer_at = self.write_directory(&mut data, next_pointer_at, header_entries, &[]);

        for frame in &self.frames {
            let bytes: Vec<u8> = frame
                .samples
                .iter()
                .flat_map(|&s| self.encode(s as u64, 2))
                .collect();
            let per_strip = (frame.samples.len() + frame.strips - 1) / frame.strips.max(1) * 2;
            let strips: Vec<&[u8]> = if bytes.is_empty() {
                vec![&bytes[..]]
            } else {
                bytes.chunks(per_strip.max(2)).collect()
            };

            let entries = vec![
                self.long(256, frame.samples.len() as u64),
                self.long(257, 1),
                self.short(258, 16),
                self.short(259, 1),
                self.ascii(270, &frame.description),
                // StripOffsets are filled in by write_directory
                (273u16, 4u16, strips.len() as u64, Vec::new()),
                self.short(277, 1),
                self.long(278, 1),
                (
                    279,
                    4,
                    strips.len() as u64,
                    strips
                        .iter()
                        .flat_map(|s| self.encode(s.len() as u64, 4))
                        .collect(),
                ),
            ];
            next_pointer_at = self.write_directory(&mut data, next_pointer_at, entries, &strips);
        }

        data
    }

    /// Write `path` in `dir` with the built bytes and return the full path.
    pub fn write_to(self, dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, self.build()).unwrap();
        path
    }

    fn offset_size(&self) -> usize {
        if self.is_bigtiff {
            8
        } else {
            4
        }
    }

    fn write_directory(
        &self,
        data: &mut Vec<u8>,
        pointer_at: usize,
        mut entries: Vec<(u16, u16, u64, Vec<u8>)>,
        strips: &[&[u8]],
    ) -> usize {
        if data.len() % 2 == 1 {
            data.push(0);
        }
        let ifd_at = data.len() as u64;
        let patched = self.encode(ifd_at, self.offset_size());
        data[pointer_at..pointer_at + patched.len()].copy_from_slice(&patched);

        let (count_size, entry_size) = if self.is_bigtiff { (8, 20) } else { (2, 12) };
        let inline = self.offset_size();
        let ifd_size = count_size + entries.len() * entry_size + self.offset_size();

        // Strip data goes right after the directory
        let mut cursor = ifd_at + ifd_size as u64;
        let mut strip_offsets = Vec::new();
        for strip in strips {
            strip_offsets.extend(self.encode(cursor, 4));
            cursor += strip.len() as u64;
        }
        for entry in entries.iter_mut() {
            if entry.0 == 273 {
                entry.3 = strip_offsets.clone();
            }
        }
        entries.sort_by_key(|e| e.0);

        let mut external = Vec::new();
        self.write_value(data, entries.len() as u64, count_size);
        for (tag, field_type, count, payload) in &entries {
            self.write_value(data, *tag as u64, 2);
            self.write_value(data, *field_type as u64, 2);
            self.write_value(data, *count, if self.is_bigtiff { 8 } else { 4 });
            if payload.len() <= inline {
                let mut field = payload.clone();
                field.resize(inline, 0);
                data.extend(field);
            } else {
                let at = cursor + external.len() as u64;
                self.write_value(data, at, inline);
                external.extend(payload);
                if external.len() % 2 == 1 {
                    external.push(0);
                }
            }
        }
        let next_pointer_at = data.len();
        self.write_value(data, 0, self.offset_size());

        for strip in strips {
            data.extend(*strip);
        }
        data.extend(external);
        next_pointer_at
    }

    fn long(&self, tag: u16, value: u64) -> (u16, u16, u64, Vec<u8>) {
        (tag, 4, 1, self.encode(value, 4))
    }

    fn short(&self, tag: u16, value: u64) -> (u16, u16, u64, Vec<u8>) {
        (tag, 3, 1, self.encode(value, 2))
    }

    fn ascii(&self, tag: u16, text: &str) -> (u16, u16, u64, Vec<u8>) {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        (tag, 2, bytes.len() as u64, bytes)
    }

    fn encode(&self, value: u64, size: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(size);
        write_value(&mut out, self.byte_order, value, size);
        out
    }

    fn write_value(&self, data: &mut Vec<u8>, value: u64, size: usize) {
        write_value(data, self.byte_order, value, size);
    }
}

fn write_value(data: &mut Vec<u8>, byte_order: ByteOrderType, value: u64, size: usize) {
    match byte_order {
        ByteOrderType::LittleEndian => match size {
            1 => data.push(value as u8),
            2 => data.extend(&(value as u16).to_le_bytes()),
            4 => data.extend(&(value as u32).to_le_bytes()),
            8 => data.extend(&value.to_le_bytes()),
            _ => {}
        },
        ByteOrderType::BigEndian => match size {
            1 => data.push(value as u8),
            2 => data.extend(&(value as u16).to_be_bytes()),
            4 => data.extend(&(value as u32).to_be_bytes()),
            8 => data.extend(&value.to_be_bytes()),
            _ => {}
        },
    }
}

/// A small two-channel acquisition with three timestamped frames.
pub fn standard_file() -> (Acquisition, FlimFileBuilder) {
    let acq = Acquisition::new(2, 4, 4, 8);
    let builder = FlimFileBuilder::new(acq.header_text())
        .add_frame(
            frame_description(0, "2023-05-02T14:30:00.000"),
            pattern_frame(acq.frame_len(), 1),
        )
        .add_frame(
            frame_description(1, "2023-05-02T14:30:01.500"),
            pattern_frame(acq.frame_len(), 2),
        )
        .add_frame_in_strips(
            frame_description(2, "2023-05-02T14:30:04.250"),
            pattern_frame(acq.frame_len(), 3),
            4,
        );
    (acq, builder)
}
