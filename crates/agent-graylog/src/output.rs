//! Agent section writer.
//!
//! ```text
//! <<<graylog_<name>:sep(0)>>>
//! {"json": "line"}
//! <<<<piggyback-host>>>>
//! <<<graylog_<name>:sep(0)>>>
//! {"json": "line"}
//! <<<<>>>>
//! ```

use std::io::{self, Write};

use serde_json::Value;

use crate::catalog::SectionKind;
use crate::transform::{Emission, Payload};

/// Marker that ends a piggyback region.
pub const PIGGYBACK_CLOSE: &str = "<<<<>>>>";

pub fn section_header(kind: SectionKind) -> String {
    format!("<<<graylog_{}:sep(0)>>>", kind.name())
}

pub fn piggyback_open(host: &str) -> String {
    format!("<<<<{host}>>>>")
}

/// Write one emission. Piggyback regions are always closed.
pub fn write_emission<W: Write>(out: &mut W, emission: &Emission) -> io::Result<()> {
    match emission {
        Emission::Section { kind, payload } => write_section(out, *kind, payload),
        Emission::Piggyback {
            host,
            kind,
            payload,
        } => {
            writeln!(out, "{}", piggyback_open(host))?;
            write_section(out, *kind, payload)?;
            writeln!(out, "{PIGGYBACK_CLOSE}")
        }
    }
}

pub fn write_section<W: Write>(out: &mut W, kind: SectionKind, payload: &Payload) -> io::Result<()> {
    writeln!(out, "{}", section_header(kind))?;
    match payload {
        Payload::Single(value) => write_json_line(out, value),
        Payload::Records(records) => records.iter().try_for_each(|r| write_json_line(out, r)),
    }
}

fn write_json_line<W: Write>(out: &mut W, value: &Value) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")
}
