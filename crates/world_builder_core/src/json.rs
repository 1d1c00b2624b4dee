//! Pretty JSON output with scalar arrays kept on one line
//!
//! Level files are mostly arrays of numbers (tile rows, decoration tuples,
//! positions). Standard pretty printing puts every number on its own line,
//! which makes a tilemap unreadable in a diff.

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, Serializer};
use std::io::{self, Write};

const INDENT: &[u8] = b"    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    Inline,
    Multiline,
}

#[derive(Debug)]
enum Frame {
    /// Layout is fixed by the first element
    Array {
        layout: Option<Layout>,
        first: bool,
        pending: bool,
    },
    Object {
        has_value: bool,
    },
}

/// Indenting formatter that writes an array on one line when its first
/// element is a scalar
#[derive(Debug, Default)]
pub struct ReadableFormatter {
    frames: Vec<Frame>,
    in_key: bool,
}

impl ReadableFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent<W: ?Sized + Write>(&self, writer: &mut W) -> io::Result<()> {
        for _ in 0..self.frames.len() {
            writer.write_all(INDENT)?;
        }
        Ok(())
    }

    /// Write the separator that places a value inside its parent array
    fn before_value<W: ?Sized + Write>(&mut self, writer: &mut W, composite: bool) -> io::Result<()> {
        if self.in_key {
            return Ok(());
        }
        let Some(Frame::Array {
            layout,
            first,
            pending,
        }) = self.frames.last_mut()
        else {
            return Ok(());
        };
        if !std::mem::take(pending) {
            return Ok(());
        }
        let first = *first;
        let layout = *layout.get_or_insert(if composite {
            Layout::Multiline
        } else {
            Layout::Inline
        });

        match layout {
            Layout::Inline if first => Ok(()),
            Layout::Inline => writer.write_all(b", "),
            Layout::Multiline => {
                let separator: &[u8] = if first { b"\n" } else { b",\n" };
                writer.write_all(separator)?;
                self.indent(writer)
            }
        }
    }
}

macro_rules! scalar_methods {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(
            fn $method<W: ?Sized + Write>(&mut self, writer: &mut W, value: $ty) -> io::Result<()> {
                self.before_value(writer, false)?;
                CompactFormatter.$method(writer, value)
            }
        )*
    };
}

impl Formatter for ReadableFormatter {
    fn write_null<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.before_value(writer, false)?;
        CompactFormatter.write_null(writer)
    }

    scalar_methods! {
        write_bool(bool),
        write_i8(i8),
        write_i16(i16),
        write_i32(i32),
        write_i64(i64),
        write_u8(u8),
        write_u16(u16),
        write_u32(u32),
        write_u64(u64),
        write_f32(f32),
        write_f64(f64),
        write_number_str(&str),
    }

    fn begin_string<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.before_value(writer, false)?;
        CompactFormatter.begin_string(writer)
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.before_value(writer, true)?;
        self.frames.push(Frame::Array {
            layout: None,
            first: true,
            pending: false,
        });
        writer.write_all(b"[")
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let multiline = matches!(
            self.frames.pop(),
            Some(Frame::Array {
                layout: Some(Layout::Multiline),
                ..
            })
        );
        if multiline {
            writer.write_all(b"\n")?;
            self.indent(writer)?;
        }
        writer.write_all(b"]")
    }

    fn begin_array_value<W: ?Sized + Write>(&mut self, _writer: &mut W, first: bool) -> io::Result<()> {
        if let Some(Frame::Array {
            first: is_first,
            pending,
            ..
        }) = self.frames.last_mut()
        {
            *is_first = first;
            *pending = true;
        }
        Ok(())
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        Ok(())
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.before_value(writer, true)?;
        self.frames.push(Frame::Object { has_value: false });
        writer.write_all(b"{")
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let has_value = matches!(self.frames.pop(), Some(Frame::Object { has_value: true }));
        if has_value {
            writer.write_all(b"\n")?;
            self.indent(writer)?;
        }
        writer.write_all(b"}")
    }

    fn begin_object_key<W: ?Sized + Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.in_key = true;
        let separator: &[u8] = if first { b"\n" } else { b",\n" };
        writer.write_all(separator)?;
        self.indent(writer)
    }

    fn end_object_key<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        self.in_key = false;
        Ok(())
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, _writer: &mut W) -> io::Result<()> {
        if let Some(Frame::Object { has_value }) = self.frames.last_mut() {
            *has_value = true;
        }
        Ok(())
    }
}

/// Serialize as indented JSON with a trailing newline, collapsing arrays
/// that hold scalars
pub fn to_readable_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    let mut out = Vec::with_capacity(256);
    let mut serializer = Serializer::with_formatter(&mut out, ReadableFormatter::new());
    value.serialize(&mut serializer)?;
    out.push(b'\n');
    // serde_json only emits UTF-8
    Ok(String::from_utf8_lossy(&out).into_owned())
}
