//! Binary parameter stream.
//!
//! One record per layer, in network order, with no file header:
//!
//! ```text
//! bytes 0-3:   input_count   (i32, little-endian)
//! bytes 4-7:   output_count  (i32, little-endian)
//! bytes 8..:   (input_count + 1) * output_count f32 values, little-endian,
//!              in per-neuron blocks (weights, then bias)
//! ```
//!
//! Since the stream carries no layer count or checksum, readers validate
//! each record against what the caller expects and reject trailing bytes.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};

use tracing::info;

use crate::{
    activation::activation::Activation,
    error::{Error, Result},
    layers::dense::Layer,
    math::params::Parameters,
    network::network::Network,
    network::spec::NetworkSpec,
};

impl Layer {
    /// Writes this layer's record: dimensions, then parameters.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let input_count = dimension_to_i32(self.input_count())?;
        let output_count = dimension_to_i32(self.output_count())?;
        writer.write_all(&input_count.to_le_bytes())?;
        writer.write_all(&output_count.to_le_bytes())?;
        for value in self.parameters().as_slice() {
            writer.write_all(&value.to_le_bytes())?;
        }
        Ok(())
    }

    /// Reads one layer record. `index` is only used in error reports.
    pub fn read_from<R: Read>(reader: &mut R, activation: Activation, index: usize) -> Result<Layer> {
        let header = read_header(reader, index)?.ok_or(Error::TruncatedStream { layer: index })?;
        read_body(reader, header, activation, index)
    }
}

impl Network {
    /// Writes every layer record in order.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        for layer in self.layers() {
            layer.write_to(writer)?;
        }
        Ok(())
    }

    /// Reads exactly `spec.layers.len()` records, each of which must match
    /// the spec's dimensions, and requires the stream to end afterwards.
    pub fn read_from<R: Read>(reader: &mut R, spec: &NetworkSpec) -> Result<Network> {
        spec.validate()?;

        let mut layers = Vec::with_capacity(spec.layers.len());
        for (index, expected) in spec.layers.iter().enumerate() {
            let header = read_header(reader, index)?.ok_or(Error::TruncatedStream { layer: index })?;
            let expected_dims = (expected.input_count, expected.output_count);
            if header != expected_dims {
                return Err(Error::DimensionMismatch {
                    layer: index,
                    expected: expected_dims,
                    found: header,
                });
            }
            layers.push(read_body(reader, header, spec.activation, index)?);
        }

        if !at_end(reader)? {
            return Err(Error::TrailingData { layers: layers.len() });
        }

        Network::from_layers(layers)
    }

    /// Reads records until the stream ends cleanly, for files whose
    /// architecture is not known in advance.
    pub fn read_records<R: Read>(reader: &mut R, activation: Activation) -> Result<Network> {
        let mut layers = Vec::new();
        while let Some(header) = read_header(reader, layers.len())? {
            let index = layers.len();
            layers.push(read_body(reader, header, activation, index)?);
        }
        Network::from_layers(layers)
    }

    /// Saves the parameters to `path`.
    pub fn save(&self, path: &str) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write_to(&mut writer)?;
        writer.flush()?;
        info!(path, layers = self.layers().len(), "saved network parameters");
        Ok(())
    }

    /// Loads parameters from `path`, validated against `spec`.
    pub fn load(path: &str, spec: &NetworkSpec) -> Result<Network> {
        let mut reader = BufReader::new(File::open(path)?);
        let network = Network::read_from(&mut reader, spec)?;
        info!(path, layers = network.layers().len(), "loaded network parameters");
        Ok(network)
    }
}

fn dimension_to_i32(value: usize) -> Result<i32> {
    i32::try_from(value).map_err(|_| {
        Error::Io(io::Error::new(
            ErrorKind::InvalidInput,
            format!("layer dimension {} does not fit in an i32 record field", value),
        ))
    })
}

/// Reads a record header. `Ok(None)` means the stream ended exactly at a
/// record boundary.
fn read_header<R: Read>(reader: &mut R, index: usize) -> Result<Option<(usize, usize)>> {
    let mut bytes = [0u8; 8];
    let filled = read_fully(reader, &mut bytes)?;
    if filled == 0 {
        return Ok(None);
    }
    if filled < bytes.len() {
        return Err(Error::TruncatedStream { layer: index });
    }

    let input_count = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let output_count = i32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let invalid = || Error::InvalidDimensions {
        layer: index,
        input_count: input_count as i64,
        output_count: output_count as i64,
    };

    if input_count <= 0 || output_count <= 0 {
        return Err(invalid());
    }
    let dims = (input_count as usize, output_count as usize);
    // The parameter byte count must be addressable.
    (dims.0 + 1)
        .checked_mul(dims.1)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(invalid)?;

    Ok(Some(dims))
}

fn read_body<R: Read>(
    reader: &mut R,
    (input_count, output_count): (usize, usize),
    activation: Activation,
    index: usize,
) -> Result<Layer> {
    let byte_len = Parameters::len_for(input_count, output_count) * 4;
    // Grows with the data actually present, so a corrupt header cannot
    // force a huge allocation.
    let mut bytes = Vec::new();
    reader.by_ref().take(byte_len as u64).read_to_end(&mut bytes)?;
    if bytes.len() < byte_len {
        return Err(Error::TruncatedStream { layer: index });
    }

    let data = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    Ok(Layer::from_parameters(
        Parameters::from_data(input_count, output_count, data),
        activation,
    ))
}

fn at_end<R: Read>(reader: &mut R) -> Result<bool> {
    let mut probe = [0u8; 1];
    Ok(read_fully(reader, &mut probe)? == 0)
}

/// Like `read_exact`, but reports how many bytes were read before the end
/// of the stream instead of failing.
fn read_fully<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_layout_is_little_endian() {
        let layer = Layer::from_parameters(
            Parameters::from_data(1, 1, vec![1.0, -2.0]),
            Activation::Sigmoid,
        );
        let mut bytes = Vec::new();
        layer.write_to(&mut bytes).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&[1, 0, 0, 0]);
        expected.extend_from_slice(&[1, 0, 0, 0]);
        expected.extend_from_slice(&1.0f32.to_le_bytes());
        expected.extend_from_slice(&(-2.0f32).to_le_bytes());
        assert_eq!(bytes, expected);
    }

    #[test]
    fn header_rejects_negative_dimensions() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i32).to_le_bytes());
        bytes.extend_from_slice(&2i32.to_le_bytes());
        let err = Layer::read_from(&mut bytes.as_slice(), Activation::Sigmoid, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { layer: 0, input_count: -1, output_count: 2 }));
    }

    #[test]
    fn empty_stream_is_truncated_for_a_single_layer() {
        let err = Layer::read_from(&mut io::empty(), Activation::Sigmoid, 3).unwrap_err();
        assert!(matches!(err, Error::TruncatedStream { layer: 3 }));
    }
}
