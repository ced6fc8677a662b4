//! Minimal NumPy `.npy` codec for one-dimensional little-endian `f64` arrays.
//!
//! Files written here load with `numpy.load` and are what `numpy.save`
//! produces for a list of floats.

use crate::prelude::{SignalError, SignalResult};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGNMENT: usize = 64;
const PREAMBLE_V1: usize = MAGIC.len() + 2 + 2;

pub fn write_npy<W: Write>(writer: &mut W, values: &[f64]) -> io::Result<()> {
    let dict = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({},), }}",
        values.len()
    );
    // data starts on an aligned offset; the header ends with a newline
    let unpadded = PREAMBLE_V1 + dict.len() + 1;
    let padding = (ALIGNMENT - unpadded % ALIGNMENT) % ALIGNMENT;
    let header_len = dict.len() + padding + 1;
    let header_len = u16::try_from(header_len)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "npy header too long"))?;

    writer.write_all(MAGIC)?;
    writer.write_u8(1)?;
    writer.write_u8(0)?;
    writer.write_u16::<LittleEndian>(header_len)?;
    writer.write_all(dict.as_bytes())?;
    writer.write_all(&vec![b' '; padding])?;
    writer.write_u8(b'\n')?;
    for &value in values {
        writer.write_f64::<LittleEndian>(value)?;
    }
    Ok(())
}

pub fn read_npy<R: Read>(reader: &mut R) -> SignalResult<Vec<f64>> {
    let mut magic = [0u8; 6];
    reader.read_exact(&mut magic).map_err(truncated)?;
    if &magic != MAGIC {
        return Err(SignalError::Format("missing npy magic".into()));
    }

    let major = reader.read_u8().map_err(truncated)?;
    let _minor = reader.read_u8().map_err(truncated)?;
    let header_len = match major {
        1 => reader.read_u16::<LittleEndian>().map_err(truncated)? as usize,
        2 | 3 => reader.read_u32::<LittleEndian>().map_err(truncated)? as usize,
        other => {
            return Err(SignalError::Format(format!(
                "unsupported npy version {}",
                other
            )))
        }
    };

    let mut header = vec![0u8; header_len];
    reader.read_exact(&mut header).map_err(truncated)?;
    let header = String::from_utf8_lossy(&header);

    let descr = header_field(&header, "descr")?.trim_matches(|c| c == '\'' || c == '"');
    if descr != "<f8" {
        return Err(SignalError::Format(format!(
            "unsupported dtype {}, expected <f8",
            descr
        )));
    }
    if header_field(&header, "fortran_order")? != "False" {
        return Err(SignalError::Format("fortran-ordered arrays are not supported".into()));
    }
    let count = parse_shape(header_field(&header, "shape")?)?;

    // the declared shape is untrusted; only bytes actually present are buffered
    let expected = count
        .checked_mul(8)
        .ok_or_else(|| SignalError::Format(format!("npy shape ({},) is too large", count)))?;
    let mut payload = Vec::new();
    reader
        .by_ref()
        .take(expected as u64)
        .read_to_end(&mut payload)
        .map_err(truncated)?;
    if payload.len() != expected {
        return Err(SignalError::Format(format!(
            "truncated npy data: expected {} bytes, found {}",
            expected,
            payload.len()
        )));
    }

    let mut values = vec![0.0; count];
    LittleEndian::read_f64_into(&payload, &mut values);
    Ok(values)
}

fn truncated(err: io::Error) -> SignalError {
    SignalError::Format(format!("truncated npy data: {}", err))
}

fn header_field<'a>(header: &'a str, key: &str) -> SignalResult<&'a str> {
    let marker = format!("'{}':", key);
    let start = header
        .find(&marker)
        .ok_or_else(|| SignalError::Format(format!("npy header missing {}", key)))?
        + marker.len();
    let rest = header[start..].trim_start();
    let end = if rest.starts_with('(') {
        rest.find(')').map(|idx| idx + 1)
    } else {
        rest.find(',').or_else(|| rest.find('}'))
    };
    end.map(|idx| rest[..idx].trim())
        .ok_or_else(|| SignalError::Format(format!("unterminated npy field {}", key)))
}

fn parse_shape(shape: &str) -> SignalResult<usize> {
    let dims = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|_| SignalError::Format(format!("bad npy dimension {}", dim)))
        })
        .collect::<SignalResult<Vec<_>>>()?;

    match dims.as_slice() {
        [count] => Ok(*count),
        _ => Err(SignalError::Format(format!(
            "expected a one-dimensional array, got shape {}",
            shape
        ))),
    }
}
