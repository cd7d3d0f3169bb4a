//! Message Decoding Engine
//!
//! Extracts physical signal values from raw CAN payloads based on DBC
//! signal definitions. Handles bit extraction, endianness, sign extension
//! and multiplexing.

use crate::signals::database::{ByteOrder, MessageDefinition, SignalDefinition, ValueType};

/// Message decoder - extracts signals from CAN payloads
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode every applicable signal of a message
    ///
    /// Returns `(signal index in message_def.signals, physical value)` pairs.
    /// Multiplexed signals are only decoded when the multiplexer value
    /// selects them; signals that do not fit the payload are skipped.
    pub fn decode(data: &[u8], message_def: &MessageDefinition) -> Vec<(usize, f64)> {
        let multiplexer_value = message_def
            .multiplexer_signal
            .as_ref()
            .and_then(|name| message_def.signals.iter().find(|s| &s.name == name))
            .and_then(|mux| Self::extract_raw(data, mux))
            .map(|raw| raw as u64);

        message_def
            .signals
            .iter()
            .enumerate()
            .filter(|(_, signal)| match (&signal.multiplexer_info, multiplexer_value) {
                (None, _) => true,
                (Some(info), Some(current)) => info.multiplexer_values.contains(&current),
                (Some(_), None) => false,
            })
            .filter_map(|(i, signal)| {
                let raw = Self::extract_raw(data, signal)?;
                Some((i, signal.offset + signal.factor * raw as f64))
            })
            .collect()
    }

    /// Extract the raw (unscaled) value of a signal
    fn extract_raw(data: &[u8], signal: &SignalDefinition) -> Option<i64> {
        let start_bit = signal.start_bit as usize;
        let length = signal.length as usize;
        if length == 0 || length > 64 {
            return None;
        }

        let raw = match signal.byte_order {
            ByteOrder::LittleEndian => Self::extract_little_endian(data, start_bit, length),
            ByteOrder::BigEndian => Self::extract_big_endian(data, start_bit, length),
        };

        let Some(raw) = raw else {
            log::trace!(
                "Signal '{}' does not fit a {} byte payload",
                signal.name,
                data.len()
            );
            return None;
        };

        Some(match signal.value_type {
            ValueType::Unsigned => raw as i64,
            ValueType::Signed => Self::sign_extend(raw, length),
        })
    }

    /// Little-endian (Intel): start bit is the LSB, bits count upwards
    fn extract_little_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let mut result: u64 = 0;
        for i in 0..length {
            let bit_pos = start_bit + i;
            let byte = data.get(bit_pos / 8)?;
            let bit_value = (byte >> (bit_pos % 8)) & 0x01;
            result |= (bit_value as u64) << i;
        }
        Some(result)
    }

    /// Big-endian (Motorola): start bit is the MSB in DBC sawtooth numbering.
    /// Bits run from bit 7 down to bit 0 of a byte, then continue at bit 7
    /// of the next byte.
    fn extract_big_endian(data: &[u8], start_bit: usize, length: usize) -> Option<u64> {
        let mut result: u64 = 0;
        let mut bit_pos = start_bit;
        for _ in 0..length {
            let byte = data.get(bit_pos / 8)?;
            let bit_in_byte = bit_pos % 8;
            result = (result << 1) | ((byte >> bit_in_byte) & 0x01) as u64;
            bit_pos = if bit_in_byte == 0 { bit_pos + 15 } else { bit_pos - 1 };
        }
        Some(result)
    }

    /// Sign-extend a value from N bits to 64 bits
    fn sign_extend(value: u64, bit_length: usize) -> i64 {
        if bit_length >= 64 {
            return value as i64;
        }

        let sign_bit = 1u64 << (bit_length - 1);
        if (value & sign_bit) != 0 {
            let mask = !0u64 << bit_length;
            (value | mask) as i64
        } else {
            value as i64
        }
    }
}
